//! Test double for [`HealthReporter`] that records structured events for assertions.

use std::sync::Mutex;

use ferry_config::ResolvedConfig;

use crate::health::HealthReporter;
use crate::link::LinkId;
use crate::supervisor::SupervisorError;

/// Structured health events tracked during scenarios.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthEvent {
    /// Configuration resolved; runtime construction begins.
    RuntimeStarting,
    /// Runtime initialised.
    RuntimeReady,
    /// Runtime construction failed with an error description.
    RuntimeFailed(String),
    /// Link attached; carries the attached count afterwards.
    ClientAttached { link: LinkId, attached: usize },
    /// Link could not be bound.
    LinkFailed(String),
    /// Link detached; carries the remaining count.
    ClientDetached { link: LinkId, remaining: usize },
    /// Stop requested on the controller.
    RuntimeStopping,
    /// Stop request failed.
    StopFailed(String),
    /// Runtime joined and destroyed.
    RuntimeStopped,
}

/// Records health events for assertions.
#[derive(Debug, Default)]
pub struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    /// Captures a copy of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .clone()
    }

    /// Counts events matching `predicate`.
    pub fn count(&self, predicate: impl Fn(&HealthEvent) -> bool) -> usize {
        self.events().iter().filter(|event| predicate(event)).count()
    }

    fn record(&self, event: HealthEvent) {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .push(event);
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn runtime_starting(&self, _config: &ResolvedConfig) {
        self.record(HealthEvent::RuntimeStarting);
    }

    fn runtime_ready(&self, _config: &ResolvedConfig) {
        self.record(HealthEvent::RuntimeReady);
    }

    fn runtime_failed(&self, error: &SupervisorError) {
        self.record(HealthEvent::RuntimeFailed(error.to_string()));
    }

    fn client_attached(&self, link: LinkId, attached: usize) {
        self.record(HealthEvent::ClientAttached { link, attached });
    }

    fn link_failed(&self, error: &SupervisorError) {
        self.record(HealthEvent::LinkFailed(error.to_string()));
    }

    fn client_detached(&self, link: LinkId, remaining: usize) {
        self.record(HealthEvent::ClientDetached { link, remaining });
    }

    fn runtime_stopping(&self) {
        self.record(HealthEvent::RuntimeStopping);
    }

    fn stop_failed(&self, error: &SupervisorError) {
        self.record(HealthEvent::StopFailed(error.to_string()));
    }

    fn runtime_stopped(&self) {
        self.record(HealthEvent::RuntimeStopped);
    }
}
