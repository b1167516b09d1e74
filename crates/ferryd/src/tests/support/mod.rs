//! Test harness utilities for the supervisor suites.

mod backend;
mod link;
mod reporter;
mod world;

pub use backend::{FailurePoint, RecordingBackend};
pub use catalog::CountingCatalog;
pub use link::TestLink;
pub use reporter::HealthEvent;
pub use rig::SupervisorRig;
pub use world::{TestWorld, world};
