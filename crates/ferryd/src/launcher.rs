//! Launcher registry through which client links find the bundled router.
//!
//! Client code does not know whether a bundled router exists. It asks the
//! [`LauncherRegistry`] for the current [`RouterLauncher`] and, when one is
//! registered, attaches through it. The registry is an explicit handle that
//! the embedding application clones into whatever needs it.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use thiserror::Error;
use tracing::{debug, warn};

use crate::link::{ClientLink, LinkId};
use crate::supervisor::{LifecycleSupervisor, SupervisorError};

const LAUNCHER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::launcher");

/// Start/stop/join capability exposed to client links.
#[cfg_attr(test, mockall::automock)]
pub trait RouterLauncher: Send + Sync {
    /// Attaches `link`, starting the router if needed.
    fn start(&self, link: &Arc<dyn ClientLink>) -> Result<(), SupervisorError>;

    /// Detaches the link identified by `link`.
    fn stop(&self, link: LinkId) -> Result<(), SupervisorError>;

    /// Waits for a stopped router to be torn down.
    fn join(&self);
}

impl RouterLauncher for LifecycleSupervisor {
    fn start(&self, link: &Arc<dyn ClientLink>) -> Result<(), SupervisorError> {
        LifecycleSupervisor::start(self, link)
    }

    fn stop(&self, link: LinkId) -> Result<(), SupervisorError> {
        LifecycleSupervisor::stop(self, link)
    }

    fn join(&self) {
        LifecycleSupervisor::join(self);
    }
}

/// Errors raised by [`LauncherRegistry::attach`].
#[derive(Debug, Error)]
pub enum AttachError {
    /// No launcher is registered.
    #[error("no router launcher is registered")]
    NoLauncher,
    /// The launcher refused the link.
    #[error(transparent)]
    Start(#[from] SupervisorError),
}

/// Holder of the process's current router launcher.
///
/// Clones share the same slot. Registration is last-writer-wins.
#[derive(Clone, Default)]
pub struct LauncherRegistry {
    slot: Arc<RwLock<Option<Arc<dyn RouterLauncher>>>>,
}

impl fmt::Debug for LauncherRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LauncherRegistry")
            .field("registered", &self.is_registered())
            .finish()
    }
}

impl LauncherRegistry {
    /// Builds an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `launcher`, returning the launcher it replaced.
    pub fn register(&self, launcher: Arc<dyn RouterLauncher>) -> Option<Arc<dyn RouterLauncher>> {
        let previous = self
            .slot
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(launcher);
        debug!(
            target: LAUNCHER_TARGET,
            replaced = previous.is_some(),
            "router launcher registered"
        );
        previous
    }

    /// The current launcher, if any.
    #[must_use]
    pub fn resolve(&self) -> Option<Arc<dyn RouterLauncher>> {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether a launcher is registered.
    #[must_use]
    pub fn is_registered(&self) -> bool {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Removes whatever launcher is registered.
    pub fn clear(&self) -> Option<Arc<dyn RouterLauncher>> {
        self.slot
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Removes `launcher` if it is still the registered one.
    ///
    /// A launcher registered later is left in place.
    pub fn unregister(&self, launcher: &Arc<dyn RouterLauncher>) -> bool {
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        let matches = slot
            .as_ref()
            .is_some_and(|current| std::ptr::addr_eq(Arc::as_ptr(current), Arc::as_ptr(launcher)));
        if matches {
            *slot = None;
        }
        matches
    }

    /// Starts `link` through the current launcher.
    ///
    /// The returned [`Attachment`] keeps using the launcher it started with
    /// even if the registry changes afterwards.
    pub fn attach(&self, link: Arc<dyn ClientLink>) -> Result<Attachment, AttachError> {
        let launcher = self.resolve().ok_or(AttachError::NoLauncher)?;
        launcher.start(&link)?;
        Ok(Attachment {
            launcher: Some(launcher),
            link: link.id(),
        })
    }
}

/// A link attached through a [`LauncherRegistry`].
///
/// Detaches on drop; call [`Attachment::detach`] to observe the stop result.
#[must_use = "dropping an attachment detaches the link immediately"]
pub struct Attachment {
    launcher: Option<Arc<dyn RouterLauncher>>,
    link: LinkId,
}

impl fmt::Debug for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attachment")
            .field("link", &self.link)
            .field("attached", &self.launcher.is_some())
            .finish()
    }
}

impl Attachment {
    /// The attached link.
    #[must_use]
    pub fn link(&self) -> LinkId {
        self.link
    }

    /// Stops the link and waits for a resulting teardown.
    ///
    /// The join runs even when the stop request failed.
    pub fn detach(mut self) -> Result<(), SupervisorError> {
        self.release()
    }

    fn release(&mut self) -> Result<(), SupervisorError> {
        let Some(launcher) = self.launcher.take() else {
            return Ok(());
        };
        let stopped = launcher.stop(self.link);
        launcher.join();
        stopped
    }
}

impl Drop for Attachment {
    fn drop(&mut self) {
        if let Err(error) = self.release() {
            warn!(
                target: LAUNCHER_TARGET,
                link = %self.link,
                error = %error,
                "detaching link failed"
            );
        }
    }
}
