//! Router backend double that tracks live cores, teardown order and injected
//! failures.

use std::sync::{Arc, Condvar, Mutex};

use ferry_config::{ListenSpec, ResolvedConfig, join_listen_list};

use crate::auth::CredentialProvider;
use crate::runtime::{BusController, BusCore, RouterBackend, RouterError};
use crate::transports::TransportEndpoint;

/// Failure points the backend can be told to hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePoint {
    /// `create_core` returns an error.
    Core,
    /// `BusController::initialize` returns an error.
    Initialize,
    /// `BusController::request_stop` returns an error.
    Stop,
}

/// Blocks controller joins until released.
#[derive(Debug, Default)]
pub struct JoinGate {
    state: Mutex<GateState>,
    changed: Condvar,
}

#[derive(Debug, Default)]
struct GateState {
    entered: bool,
    released: bool,
}

impl JoinGate {
    /// Blocks until a controller join reached the gate.
    pub fn wait_entered(&self) {
        let mut state = self.state.lock().expect("gate mutex poisoned");
        while !state.entered {
            state = self.changed.wait(state).expect("gate mutex poisoned");
        }
    }

    /// Lets every pending and future join through.
    pub fn release(&self) {
        self.state.lock().expect("gate mutex poisoned").released = true;
        self.changed.notify_all();
    }

    fn pass(&self) {
        let mut state = self.state.lock().expect("gate mutex poisoned");
        state.entered = true;
        self.changed.notify_all();
        while !state.released {
            state = self.changed.wait(state).expect("gate mutex poisoned");
        }
    }
}

#[derive(Default)]
struct BackendState {
    cores_created: usize,
    live_cores: usize,
    max_live_cores: usize,
    stop_requests: usize,
    joins: usize,
    teardown: Vec<&'static str>,
    listen: Vec<String>,
    endpoint_transports: Vec<Vec<String>>,
    credentials_supplied: Vec<bool>,
    failures: Vec<FailurePoint>,
    gate: Option<Arc<JoinGate>>,
}

/// Backend that records how runtimes are built and torn down.
#[derive(Clone, Default)]
pub struct RecordingBackend {
    state: Arc<Mutex<BackendState>>,
}

impl RecordingBackend {
    /// Makes every later call hit `point` until [`Self::clear_failures`].
    pub fn fail_at(&self, point: FailurePoint) {
        self.lock().failures.push(point);
    }

    /// Removes injected failures.
    pub fn clear_failures(&self) {
        self.lock().failures.clear();
    }

    /// Installs a gate that controller joins wait on.
    pub fn gate_joins(&self) -> Arc<JoinGate> {
        let gate = Arc::new(JoinGate::default());
        self.lock().gate = Some(Arc::clone(&gate));
        gate
    }

    /// Cores built so far.
    #[must_use]
    pub fn cores_created(&self) -> usize {
        self.lock().cores_created
    }

    /// Cores currently alive.
    #[must_use]
    pub fn live_cores(&self) -> usize {
        self.lock().live_cores
    }

    /// Highest number of simultaneously alive cores.
    #[must_use]
    pub fn max_live_cores(&self) -> usize {
        self.lock().max_live_cores
    }

    /// Stop requests received by controllers.
    #[must_use]
    pub fn stop_requests(&self) -> usize {
        self.lock().stop_requests
    }

    /// Controller joins performed.
    #[must_use]
    pub fn joins(&self) -> usize {
        self.lock().joins
    }

    /// Drop events in the order they happened.
    #[must_use]
    pub fn teardown_order(&self) -> Vec<&'static str> {
        self.lock().teardown.clone()
    }

    /// Joined listen lists passed to `initialize`.
    #[must_use]
    pub fn initialized_listen(&self) -> Vec<String> {
        self.lock().listen.clone()
    }

    /// Transport names of the endpoints handed to each core.
    #[must_use]
    pub fn endpoint_transports(&self) -> Vec<Vec<String>> {
        self.lock().endpoint_transports.clone()
    }

    /// Whether each controller received a credential provider.
    #[must_use]
    pub fn credentials_supplied(&self) -> Vec<bool> {
        self.lock().credentials_supplied.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BackendState> {
        self.state.lock().expect("backend state mutex poisoned")
    }

    fn fails_at(&self, point: FailurePoint) -> bool {
        self.lock().failures.contains(&point)
    }
}

impl RouterBackend for RecordingBackend {
    fn create_core(
        &self,
        config: &ResolvedConfig,
        endpoints: Vec<Box<dyn TransportEndpoint>>,
    ) -> Result<Arc<dyn BusCore>, RouterError> {
        if self.fails_at(FailurePoint::Core) {
            return Err(RouterError::new("core construction refused"));
        }
        let mut state = self.lock();
        state.cores_created += 1;
        state.live_cores += 1;
        state.max_live_cores = state.max_live_cores.max(state.live_cores);
        state.endpoint_transports.push(
            endpoints
                .iter()
                .map(|endpoint| endpoint.spec().transport().to_owned())
                .collect(),
        );
        Ok(Arc::new(TestCore {
            name: config.router_name().to_owned(),
            backend: self.clone(),
        }))
    }

    fn create_controller(
        &self,
        _core: Arc<dyn BusCore>,
        credentials: Option<Arc<dyn CredentialProvider>>,
    ) -> Result<Box<dyn BusController>, RouterError> {
        self.lock().credentials_supplied.push(credentials.is_some());
        Ok(Box::new(TestController {
            backend: self.clone(),
        }))
    }
}

struct TestCore {
    name: String,
    backend: RecordingBackend,
}

impl BusCore for TestCore {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for TestCore {
    fn drop(&mut self) {
        let mut state = self.backend.lock();
        state.live_cores -= 1;
        state.teardown.push("core");
    }
}

struct TestController {
    backend: RecordingBackend,
}

impl BusController for TestController {
    fn initialize(&mut self, listen: &[ListenSpec]) -> Result<(), RouterError> {
        if self.backend.fails_at(FailurePoint::Initialize) {
            return Err(RouterError::new("controller refused to initialise"));
        }
        self.backend.lock().listen.push(join_listen_list(listen));
        Ok(())
    }

    fn request_stop(&self) -> Result<(), RouterError> {
        self.backend.lock().stop_requests += 1;
        if self.backend.fails_at(FailurePoint::Stop) {
            return Err(RouterError::new("controller refused to stop"));
        }
        Ok(())
    }

    fn join(&mut self) {
        let gate = self.backend.lock().gate.clone();
        if let Some(gate) = gate {
            gate.pass();
        }
        self.backend.lock().joins += 1;
    }
}

impl Drop for TestController {
    fn drop(&mut self) {
        self.backend.lock().teardown.push("controller");
    }
}
