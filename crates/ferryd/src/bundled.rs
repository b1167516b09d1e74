//! The bundled router installed into a host process.

use std::sync::Arc;

use tracing::info;

use crate::launcher::{LauncherRegistry, RouterLauncher};
use crate::supervisor::LifecycleSupervisor;

const BUNDLED_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::bundled");

/// Owns the process's bundled router and its launcher registration.
///
/// Installing registers the supervisor as the current launcher. Shutting
/// down, explicitly or on drop, withdraws that registration, force-detaches
/// any remaining clients and joins the runtime.
#[derive(Debug)]
pub struct BundledRouter {
    registry: LauncherRegistry,
    supervisor: Arc<LifecycleSupervisor>,
    installed: bool,
}

impl BundledRouter {
    /// Registers `supervisor` with `registry`.
    ///
    /// A launcher registered earlier is replaced.
    #[must_use]
    pub fn install(registry: &LauncherRegistry, supervisor: LifecycleSupervisor) -> Self {
        let supervisor = Arc::new(supervisor);
        let launcher: Arc<dyn RouterLauncher> = supervisor.clone();
        if registry.register(launcher).is_some() {
            info!(
                target: BUNDLED_TARGET,
                "bundled router replaced an existing launcher"
            );
        }
        Self {
            registry: registry.clone(),
            supervisor,
            installed: true,
        }
    }

    /// The supervisor behind this router.
    #[must_use]
    pub fn supervisor(&self) -> &Arc<LifecycleSupervisor> {
        &self.supervisor
    }

    /// Unregisters the launcher and tears down the runtime.
    pub fn shutdown(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if !self.installed {
            return;
        }
        self.installed = false;
        let launcher: Arc<dyn RouterLauncher> = self.supervisor.clone();
        self.registry.unregister(&launcher);
        self.supervisor.shutdown();
    }
}

impl Drop for BundledRouter {
    fn drop(&mut self) {
        self.release();
    }
}
