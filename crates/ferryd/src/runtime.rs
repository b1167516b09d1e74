//! The router runtime: a bus core paired with the controller that drives it.
//!
//! Both halves come from a [`RouterBackend`] supplied by the embedding
//! application. [`RouterRuntime`] owns the pair and fixes their teardown
//! order: the controller holds a handle into the core, so it is always joined
//! and dropped before the core is released.

use std::fmt;
use std::sync::Arc;

use ferry_config::{ListenSpec, ResolvedConfig};
use thiserror::Error;
use tracing::debug;

use crate::auth::{CredentialProvider, PasswordCredentialProvider};
use crate::transports::{TransportEndpoint, TransportFactoryRegistry};

const RUNTIME_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::runtime");

/// Failure reported by a router collaborator.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct RouterError {
    message: String,
    /// Optional source error reported by the collaborator.
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl RouterError {
    /// Builds an error without an underlying source.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Builds an error that wraps an underlying source.
    #[must_use]
    pub fn with_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Human-readable message describing the failure.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_str()
    }
}

/// Errors raised while constructing or initialising a [`RouterRuntime`].
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// A listen spec names a transport without a registered factory.
    #[error("no transport factory registered for '{transport}'")]
    UnknownTransport {
        /// Transport named by the listen spec.
        transport: String,
    },
    /// A transport factory failed to create its endpoint.
    #[error("failed to create endpoint for '{spec}': {source}")]
    Endpoint {
        /// Listen spec being served.
        spec: String,
        /// Factory error.
        #[source]
        source: RouterError,
    },
    /// The backend failed to build the bus core.
    #[error("failed to create bus core: {0}")]
    Core(#[source] RouterError),
    /// The backend failed to build the controller.
    #[error("failed to create bus controller: {0}")]
    Controller(#[source] RouterError),
    /// The controller rejected initialisation.
    #[error("failed to initialise bus controller: {0}")]
    Initialize(#[source] RouterError),
}

/// The message-bus core clients are linked to.
pub trait BusCore: Send + Sync {
    /// Name of the routing node.
    fn name(&self) -> &str;
}

/// Controller that brings a bus core up and down.
pub trait BusController: Send {
    /// Starts listening on `listen` and begins routing.
    fn initialize(&mut self, listen: &[ListenSpec]) -> Result<(), RouterError>;

    /// Asks the controller to stop. Must not block.
    fn request_stop(&self) -> Result<(), RouterError>;

    /// Blocks until the controller has stopped.
    fn join(&mut self);
}

/// Builds the two halves of a router runtime.
pub trait RouterBackend: Send + Sync {
    /// Creates the bus core, handing it the endpoints built for its listen
    /// specs.
    fn create_core(
        &self,
        config: &ResolvedConfig,
        endpoints: Vec<Box<dyn TransportEndpoint>>,
    ) -> Result<Arc<dyn BusCore>, RouterError>;

    /// Creates the controller for `core`.
    fn create_controller(
        &self,
        core: Arc<dyn BusCore>,
        credentials: Option<Arc<dyn CredentialProvider>>,
    ) -> Result<Box<dyn BusController>, RouterError>;
}

/// An initialised bus core and its controller.
pub struct RouterRuntime {
    // Field order matters: drop glue releases the controller first.
    controller: Box<dyn BusController>,
    core: Arc<dyn BusCore>,
}

impl fmt::Debug for RouterRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterRuntime")
            .field("core", &self.core.name())
            .finish_non_exhaustive()
    }
}

impl RouterRuntime {
    /// Builds endpoints, core and controller, then initialises the controller.
    ///
    /// A credential provider is attached only when `config` carries password
    /// credentials. On failure nothing built so far survives: the partially
    /// built pair is dropped controller first.
    pub fn launch(
        backend: &dyn RouterBackend,
        config: &ResolvedConfig,
        transports: &TransportFactoryRegistry,
    ) -> Result<Self, RuntimeError> {
        let endpoints = transports.build_endpoints(config.listen())?;
        let core = backend
            .create_core(config, endpoints)
            .map_err(RuntimeError::Core)?;

        let credentials = config.password_auth().map(|auth| {
            Arc::new(PasswordCredentialProvider::new(auth.clone())) as Arc<dyn CredentialProvider>
        });
        let controller = backend
            .create_controller(Arc::clone(&core), credentials)
            .map_err(RuntimeError::Controller)?;

        let mut runtime = Self { controller, core };
        runtime
            .controller
            .initialize(config.listen())
            .map_err(RuntimeError::Initialize)?;
        debug!(
            target: RUNTIME_TARGET,
            router = runtime.core.name(),
            listen = %config.joined_listen(),
            "router runtime initialised"
        );
        Ok(runtime)
    }

    /// The bus core clients are linked to.
    #[must_use]
    pub fn core(&self) -> &Arc<dyn BusCore> {
        &self.core
    }

    /// Signals the controller to stop without waiting.
    pub fn request_stop(&self) -> Result<(), RouterError> {
        self.controller.request_stop()
    }

    /// Waits for the controller to stop, then destroys the controller and
    /// finally the core.
    pub fn teardown(self) {
        let Self {
            mut controller,
            core,
        } = self;
        controller.join();
        drop(controller);
        debug!(
            target: RUNTIME_TARGET,
            router = core.name(),
            "router runtime joined"
        );
        drop(core);
    }
}
