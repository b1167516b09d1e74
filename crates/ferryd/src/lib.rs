//! Lifecycle supervisor for the bundled message-bus router.
//!
//! A client library that finds no standalone router reachable can fall back
//! to a router bundled into its own process. This crate owns that router's
//! lifetime: the first client to attach builds the runtime, later clients
//! share it, and the last client to leave tears it down. A client arriving
//! while a teardown is still in flight waits for it and then builds a fresh
//! runtime, so at most one runtime is ever alive.
//!
//! The router itself is external. Embedding applications supply a
//! [`RouterBackend`] that builds the bus core and its controller, a
//! [`TransportCatalog`] of transport factories, and a [`ConfigLoader`]. The
//! supervisor is published to client code through a [`LauncherRegistry`]:
//!
//! ```rust,ignore
//! let registry = LauncherRegistry::new();
//! let router = BundledRouter::install(
//!     &registry,
//!     LifecycleSupervisor::new(SystemConfigLoader, backend, catalog),
//! );
//!
//! // Client side.
//! let attachment = registry.attach(link)?;
//! attachment.detach()?;
//!
//! router.shutdown();
//! ```
//!
//! Lifecycle events are surfaced through a [`HealthReporter`];
//! [`telemetry::initialise`] installs a structured `tracing` subscriber for
//! hosts that do not bring their own.

mod auth;
mod bundled;
mod health;
mod launcher;
mod link;
mod loader;
mod runtime;
mod supervisor;
pub mod telemetry;
mod transports;

pub use auth::{CredentialMask, CredentialProvider, Credentials, PasswordCredentialProvider};
pub use bundled::BundledRouter;
pub use health::{HealthReporter, StructuredHealthReporter};
pub use launcher::{AttachError, Attachment, LauncherRegistry, RouterLauncher};
pub use link::{ClientLink, LinkId};
pub use loader::{ConfigError, ConfigLoader, StaticConfigLoader, SystemConfigLoader};
pub use runtime::{
    BusController, BusCore, RouterBackend, RouterError, RouterRuntime, RuntimeError,
};
pub use supervisor::{LifecycleSupervisor, SupervisorError, SupervisorPhase, SupervisorSnapshot};
pub use telemetry::{TelemetryError, TelemetryHandle};
pub use transports::{
    TransportCatalog, TransportEndpoint, TransportFactory, TransportFactoryRegistry,
};
