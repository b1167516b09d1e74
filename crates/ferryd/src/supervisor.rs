//! Lifecycle supervisor owning the single router runtime.
//!
//! The supervisor tracks which client links are attached and owns at most one
//! [`RouterRuntime`]. The first attach builds the runtime, later attaches
//! reuse it, and the last detach opens a stopping window that lasts until
//! [`LifecycleSupervisor::join`] has torn the runtime down.
//!
//! ```text
//!            start (first link)           stop (last link)
//!   Idle ─────────────────────▶ Running ─────────────────▶ Stopping
//!    ▲                                                        │
//!    └────────────────────────── join ────────────────────────┘
//! ```
//!
//! Every transition happens under one mutex. A `start` that arrives during the
//! stopping window waits on a condition variable that `join` signals once the
//! old runtime is gone, so two runtimes never coexist.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, Weak};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::health::{HealthReporter, StructuredHealthReporter};
use crate::link::{ClientLink, LinkId};
use crate::loader::{ConfigError, ConfigLoader, load_resolved};
use crate::runtime::{RouterBackend, RouterError, RouterRuntime, RuntimeError};
use crate::transports::{TransportCatalog, TransportFactoryRegistry};

const SUPERVISOR_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::supervisor");

/// Errors reported by the lifecycle operations.
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// The configuration could not be loaded or resolved.
    #[error("bad router configuration: {source}")]
    BadConfig {
        /// Underlying configuration error.
        #[source]
        source: ConfigError,
    },
    /// The router runtime could not be built or initialised.
    #[error("router initialisation failed: {source}")]
    InitFailed {
        /// Underlying runtime error.
        #[source]
        source: RuntimeError,
    },
    /// The client link could not be bound to the bus core.
    #[error("failed to link {link} to the router: {source}")]
    LinkFailed {
        /// Link that failed to bind.
        link: LinkId,
        /// Error reported by the link.
        #[source]
        source: RouterError,
    },
    /// The controller rejected the stop request. The detach still happened.
    #[error("router stop request failed: {source}")]
    StopFailed {
        /// Error reported by the controller.
        #[source]
        source: RouterError,
    },
}

/// Coarse lifecycle phase of the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorPhase {
    /// No runtime and no clients.
    Idle,
    /// A runtime serves at least one client.
    Running,
    /// The last client left; the runtime awaits `join`.
    Stopping,
}

/// Point-in-time view of the supervisor state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupervisorSnapshot {
    /// Current phase.
    pub phase: SupervisorPhase,
    /// Attached links in ascending id order.
    pub attached: Vec<LinkId>,
    /// Whether a runtime currently exists.
    pub runtime_present: bool,
    /// Whether the stopping window is open.
    pub stopping: bool,
    /// Runtimes successfully initialised over the supervisor's lifetime.
    pub runtimes_created: u64,
    /// Whether transport factories have been registered.
    pub transports_registered: bool,
}

struct SupervisorState {
    attached: BTreeMap<LinkId, Weak<dyn ClientLink>>,
    runtime: Option<RouterRuntime>,
    stopping: bool,
    transports: TransportFactoryRegistry,
    runtimes_created: u64,
}

impl SupervisorState {
    fn phase(&self) -> SupervisorPhase {
        if self.stopping {
            SupervisorPhase::Stopping
        } else if self.runtime.is_some() {
            SupervisorPhase::Running
        } else {
            SupervisorPhase::Idle
        }
    }
}

/// Owns the router runtime and serialises start, stop and join.
pub struct LifecycleSupervisor {
    loader: Box<dyn ConfigLoader>,
    backend: Box<dyn RouterBackend>,
    catalog: Box<dyn TransportCatalog>,
    reporter: Arc<dyn HealthReporter>,
    state: Mutex<SupervisorState>,
    teardown_complete: Condvar,
}

impl fmt::Debug for LifecycleSupervisor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleSupervisor")
            .field("state", &self.snapshot())
            .finish_non_exhaustive()
    }
}

impl LifecycleSupervisor {
    /// Builds an idle supervisor over its collaborators.
    ///
    /// Nothing is loaded or constructed until the first [`Self::start`].
    #[must_use]
    pub fn new(
        loader: impl ConfigLoader + 'static,
        backend: impl RouterBackend + 'static,
        catalog: impl TransportCatalog + 'static,
    ) -> Self {
        Self {
            loader: Box::new(loader),
            backend: Box::new(backend),
            catalog: Box::new(catalog),
            reporter: Arc::new(StructuredHealthReporter::new()),
            state: Mutex::new(SupervisorState {
                attached: BTreeMap::new(),
                runtime: None,
                stopping: false,
                transports: TransportFactoryRegistry::new(),
                runtimes_created: 0,
            }),
            teardown_complete: Condvar::new(),
        }
    }

    /// Replaces the health reporter.
    #[must_use]
    pub fn with_reporter(mut self, reporter: Arc<dyn HealthReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Attaches `link`, building the router runtime if none exists.
    ///
    /// Blocks while a previous runtime is still being torn down. Errors leave
    /// no partial state behind: a runtime built by this call is destroyed
    /// again unless the link attached successfully.
    pub fn start(&self, link: &Arc<dyn ClientLink>) -> Result<(), SupervisorError> {
        let id = link.id();
        let mut state = self.lock_state();
        while state.stopping {
            debug!(
                target: SUPERVISOR_TARGET,
                link = %id,
                "waiting for router teardown before starting"
            );
            state = self
                .teardown_complete
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }

        let runtime = match state.runtime.take() {
            Some(runtime) => runtime,
            None => {
                let runtime = self.launch_runtime(&mut state.transports).map_err(|error| {
                    self.reporter.runtime_failed(&error);
                    error
                })?;
                state.runtimes_created += 1;
                runtime
            }
        };

        if let Err(source) = link.link_bus(runtime.core()) {
            let error = SupervisorError::LinkFailed { link: id, source };
            if state.attached.is_empty() {
                Self::discard_runtime(runtime);
            } else {
                state.runtime = Some(runtime);
            }
            self.reporter.link_failed(&error);
            return Err(error);
        }

        state.runtime = Some(runtime);
        state.attached.insert(id, Arc::downgrade(link));
        self.reporter.client_attached(id, state.attached.len());
        Ok(())
    }

    /// Detaches `link`.
    ///
    /// Unknown links are ignored. When the last link leaves, the stopping
    /// window opens and the controller is asked to stop; a failed stop request
    /// is returned but the detach stands.
    pub fn stop(&self, link: LinkId) -> Result<(), SupervisorError> {
        let mut state = self.lock_state();
        if state.attached.remove(&link).is_none() {
            debug!(
                target: SUPERVISOR_TARGET,
                link = %link,
                "ignoring stop for a link that is not attached"
            );
            return Ok(());
        }
        let remaining = state.attached.len();
        self.reporter.client_detached(link, remaining);
        if remaining > 0 {
            return Ok(());
        }
        self.begin_stopping(&mut state)
    }

    /// Tears down the runtime once no links remain, then closes the stopping
    /// window.
    ///
    /// Does nothing while links are attached. The controller join runs with
    /// the supervisor lock held, so concurrent starts wait for it.
    pub fn join(&self) {
        let mut state = self.lock_state();
        if !state.attached.is_empty() {
            return;
        }
        if let Some(runtime) = state.runtime.take() {
            debug!(target: SUPERVISOR_TARGET, "joining router runtime");
            runtime.teardown();
            self.reporter.runtime_stopped();
        }
        state.stopping = false;
        drop(state);
        self.teardown_complete.notify_all();
    }

    /// Force-detaches every link and tears the runtime down.
    ///
    /// Each link is removed from the attached set before it is asked to
    /// disconnect, with the lock released so the link may call back into
    /// [`Self::stop`]. The stopping window opens in the same critical section
    /// that empties the set, so a concurrent [`Self::start`] waits for the
    /// teardown instead of adopting the runtime being shut down.
    pub fn shutdown(&self) {
        info!(target: SUPERVISOR_TARGET, "shutting down router supervisor");
        loop {
            let (next, stop_result) = {
                let mut state = self.lock_state();
                let next = state.attached.pop_first();
                let stop_result = if state.attached.is_empty()
                    && state.runtime.is_some()
                    && !state.stopping
                {
                    Some(self.begin_stopping(&mut state))
                } else {
                    None
                };
                let remaining = state.attached.len();
                (next.map(|(id, link)| (id, link, remaining)), stop_result)
            };
            if let Some(Err(error)) = stop_result {
                warn!(
                    target: SUPERVISOR_TARGET,
                    error = %error,
                    "stop request failed during shutdown"
                );
            }
            let Some((id, link, remaining)) = next else {
                break;
            };
            self.reporter.client_detached(id, remaining);
            if let Some(link) = link.upgrade() {
                link.disconnect();
            }
        }
        self.join();
    }

    /// Captures the current state.
    #[must_use]
    pub fn snapshot(&self) -> SupervisorSnapshot {
        let state = self.lock_state();
        SupervisorSnapshot {
            phase: state.phase(),
            attached: state.attached.keys().copied().collect(),
            runtime_present: state.runtime.is_some(),
            stopping: state.stopping,
            runtimes_created: state.runtimes_created,
            transports_registered: state.transports.is_initialized(),
        }
    }

    /// Whether `link` is currently attached.
    #[must_use]
    pub fn is_attached(&self, link: LinkId) -> bool {
        self.lock_state().attached.contains_key(&link)
    }

    fn lock_state(&self) -> MutexGuard<'_, SupervisorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn launch_runtime(
        &self,
        transports: &mut TransportFactoryRegistry,
    ) -> Result<RouterRuntime, SupervisorError> {
        let config = load_resolved(self.loader.as_ref())
            .map_err(|source| SupervisorError::BadConfig { source })?;
        self.reporter.runtime_starting(&config);

        if transports.register_once(self.catalog.as_ref()) {
            info!(
                target: SUPERVISOR_TARGET,
                transports = ?transports.names(),
                default = transports.default_factory().map(|factory| factory.name()),
                "registered transport factories"
            );
        }

        let runtime = RouterRuntime::launch(self.backend.as_ref(), &config, transports)
            .map_err(|source| SupervisorError::InitFailed { source })?;
        self.reporter.runtime_ready(&config);
        Ok(runtime)
    }

    fn begin_stopping(&self, state: &mut SupervisorState) -> Result<(), SupervisorError> {
        let Some(runtime) = state.runtime.as_ref() else {
            return Ok(());
        };
        state.stopping = true;
        self.reporter.runtime_stopping();
        runtime.request_stop().map_err(|source| {
            let error = SupervisorError::StopFailed { source };
            self.reporter.stop_failed(&error);
            error
        })
    }

    fn discard_runtime(runtime: RouterRuntime) {
        if let Err(error) = runtime.request_stop() {
            warn!(
                target: SUPERVISOR_TARGET,
                error = %error,
                "stop request failed while discarding router runtime"
            );
        }
        runtime.teardown();
    }
}
