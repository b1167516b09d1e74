//! Registry of router-side transport factories.
//!
//! Factories are supplied by the embedding application through a
//! [`TransportCatalog`]. The supervisor asks the catalogue for its factories
//! the first time a router runtime is built and never again, so factories
//! survive every stop/start cycle of the runtime.

use std::fmt;
use std::sync::Arc;

use ferry_config::ListenSpec;
use tracing::debug;

use crate::runtime::{RouterError, RuntimeError};

const TRANSPORTS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transports");

/// A listening endpoint created for one listen spec.
pub trait TransportEndpoint: Send + Sync {
    /// The listen spec this endpoint serves.
    fn spec(&self) -> &ListenSpec;
}

/// Named constructor for a router-side transport endpoint.
pub trait TransportFactory: Send + Sync {
    /// Transport name matched against [`ListenSpec::transport`].
    fn name(&self) -> &str;

    /// Whether this transport is the router's default local transport.
    fn is_default(&self) -> bool {
        false
    }

    /// Builds an endpoint listening on `spec`.
    fn create(&self, spec: &ListenSpec) -> Result<Box<dyn TransportEndpoint>, RouterError>;
}

/// Source of the transport factories registered with a supervisor.
pub trait TransportCatalog: Send + Sync {
    /// Produces the factories to register.
    fn factories(&self) -> Vec<Arc<dyn TransportFactory>>;
}

impl TransportCatalog for Vec<Arc<dyn TransportFactory>> {
    fn factories(&self) -> Vec<Arc<dyn TransportFactory>> {
        self.clone()
    }
}

/// Name-indexed transport factories, populated once.
#[derive(Default)]
pub struct TransportFactoryRegistry {
    factories: Vec<Arc<dyn TransportFactory>>,
    initialized: bool,
}

impl fmt::Debug for TransportFactoryRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportFactoryRegistry")
            .field("names", &self.names())
            .field("initialized", &self.initialized)
            .finish()
    }
}

impl TransportFactoryRegistry {
    /// Builds an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers every factory from `catalog` unless registration already ran.
    ///
    /// Returns `true` when this call performed the registration.
    pub fn register_once(&mut self, catalog: &dyn TransportCatalog) -> bool {
        if self.initialized {
            return false;
        }
        for factory in catalog.factories() {
            self.register(factory);
        }
        self.initialized = true;
        true
    }

    /// Adds a single factory. The first factory registered under a name wins.
    pub fn register(&mut self, factory: Arc<dyn TransportFactory>) -> bool {
        if self.get(factory.name()).is_some() {
            debug!(
                target: TRANSPORTS_TARGET,
                transport = factory.name(),
                "ignoring duplicate transport factory"
            );
            return false;
        }
        debug!(
            target: TRANSPORTS_TARGET,
            transport = factory.name(),
            default = factory.is_default(),
            "registered transport factory"
        );
        self.factories.push(factory);
        true
    }

    /// Looks up a factory by transport name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<dyn TransportFactory>> {
        self.factories.iter().find(|factory| factory.name() == name)
    }

    /// The factory flagged as the default transport, if any.
    #[must_use]
    pub(crate) fn default_factory(&self) -> Option<&Arc<dyn TransportFactory>> {
        self.factories.iter().find(|factory| factory.is_default())
    }

    /// Registered transport names in registration order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.factories.iter().map(|factory| factory.name()).collect()
    }

    /// Whether [`Self::register_once`] has run.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Creates one endpoint per listen spec, preserving order.
    pub fn build_endpoints(
        &self,
        listen: &[ListenSpec],
    ) -> Result<Vec<Box<dyn TransportEndpoint>>, RuntimeError> {
        listen
            .iter()
            .map(|spec| {
                let factory =
                    self.get(spec.transport())
                        .ok_or_else(|| RuntimeError::UnknownTransport {
                            transport: spec.transport().to_owned(),
                        })?;
                factory
                    .create(spec)
                    .map_err(|source| RuntimeError::Endpoint {
                        spec: spec.to_string(),
                        source,
                    })
            })
            .collect()
    }
}
