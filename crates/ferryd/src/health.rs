//! Structured health reporting for router lifecycle events.

use std::sync::Arc;

use ferry_config::ResolvedConfig;

use crate::link::LinkId;
use crate::supervisor::SupervisorError;

/// Observer trait used to surface lifecycle events to telemetry sinks.
///
/// The supervisor invokes these hooks while holding its state lock, so
/// implementations must not call back into the supervisor.
pub trait HealthReporter: Send + Sync {
    /// Invoked once the configuration resolved and before the runtime is built.
    fn runtime_starting(&self, config: &ResolvedConfig);

    /// Invoked after the controller initialised.
    fn runtime_ready(&self, config: &ResolvedConfig);

    /// Invoked when the runtime could not be built.
    fn runtime_failed(&self, error: &SupervisorError);

    /// Invoked after a link was bound to the bus core.
    fn client_attached(&self, link: LinkId, attached: usize);

    /// Invoked when a link could not be bound to the bus core.
    fn link_failed(&self, error: &SupervisorError);

    /// Invoked after a link left the attached set.
    fn client_detached(&self, link: LinkId, remaining: usize);

    /// Invoked when the last link left and the controller is asked to stop.
    fn runtime_stopping(&self);

    /// Invoked when the controller rejected the stop request.
    fn stop_failed(&self, error: &SupervisorError);

    /// Invoked after the runtime was joined and destroyed.
    fn runtime_stopped(&self);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter,
{
    fn runtime_starting(&self, config: &ResolvedConfig) {
        (**self).runtime_starting(config);
    }

    fn runtime_ready(&self, config: &ResolvedConfig) {
        (**self).runtime_ready(config);
    }

    fn runtime_failed(&self, error: &SupervisorError) {
        (**self).runtime_failed(error);
    }

    fn client_attached(&self, link: LinkId, attached: usize) {
        (**self).client_attached(link, attached);
    }

    fn link_failed(&self, error: &SupervisorError) {
        (**self).link_failed(error);
    }

    fn client_detached(&self, link: LinkId, remaining: usize) {
        (**self).client_detached(link, remaining);
    }

    fn runtime_stopping(&self) {
        (**self).runtime_stopping();
    }

    fn stop_failed(&self, error: &SupervisorError) {
        (**self).stop_failed(error);
    }

    fn runtime_stopped(&self) {
        (**self).runtime_stopped();
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn runtime_starting(&self, config: &ResolvedConfig) {
        tracing::info!(
            target: "ferryd::health",
            event = "runtime_starting",
            router = config.router_name(),
            listen = %config.joined_listen(),
            authenticated = config.password_auth().is_some(),
            "starting router runtime"
        );
    }

    fn runtime_ready(&self, config: &ResolvedConfig) {
        tracing::info!(
            target: "ferryd::health",
            event = "runtime_ready",
            router = config.router_name(),
            limits = ?config.limits(),
            "router runtime ready"
        );
    }

    fn runtime_failed(&self, error: &SupervisorError) {
        tracing::error!(
            target: "ferryd::health",
            event = "runtime_failed",
            error = %error,
            "router runtime failed to start"
        );
    }

    fn client_attached(&self, link: LinkId, attached: usize) {
        tracing::info!(
            target: "ferryd::health",
            event = "client_attached",
            link = %link,
            attached,
            "client linked to router"
        );
    }

    fn link_failed(&self, error: &SupervisorError) {
        tracing::warn!(
            target: "ferryd::health",
            event = "link_failed",
            error = %error,
            "client could not be linked to router"
        );
    }

    fn client_detached(&self, link: LinkId, remaining: usize) {
        tracing::info!(
            target: "ferryd::health",
            event = "client_detached",
            link = %link,
            remaining,
            "client detached from router"
        );
    }

    fn runtime_stopping(&self) {
        tracing::info!(
            target: "ferryd::health",
            event = "runtime_stopping",
            "last client left; stopping router runtime"
        );
    }

    fn stop_failed(&self, error: &SupervisorError) {
        tracing::error!(
            target: "ferryd::health",
            event = "stop_failed",
            error = %error,
            "router runtime rejected stop request"
        );
    }

    fn runtime_stopped(&self) {
        tracing::info!(
            target: "ferryd::health",
            event = "runtime_stopped",
            "router runtime stopped"
        );
    }
}
