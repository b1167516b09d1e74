//! Client links: the connecting endpoints that attach to the router.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::runtime::{BusCore, RouterError};

static NEXT_LINK_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identity of a client link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LinkId(u64);

impl LinkId {
    /// Wraps a caller-chosen identifier.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Allocates an identifier unique within this process.
    #[must_use]
    pub fn allocate() -> Self {
        Self(NEXT_LINK_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for LinkId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "link-{}", self.0)
    }
}

/// A client endpoint that attaches to the bundled router.
///
/// The supervisor never owns a link. It records a weak reference for
/// membership and only calls back into the link to bind it to the bus core
/// and, during shutdown, to force it to disconnect.
pub trait ClientLink: Send + Sync {
    /// Stable identity used for membership.
    fn id(&self) -> LinkId;

    /// Binds the link to the router's bus core.
    fn link_bus(&self, core: &Arc<dyn BusCore>) -> Result<(), RouterError>;

    /// Drops the client side of the connection.
    ///
    /// Implementations typically call back into the launcher's `stop`; the
    /// supervisor has already forgotten the link by then, so that call is a
    /// no-op.
    fn disconnect(&self);
}
