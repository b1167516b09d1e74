//! Configuration loading for the router supervisor.

use std::sync::Arc;

use ferry_config::{ResolveError, ResolvedConfig, RouterConfig};
use ortho_config::OrthoError;
use thiserror::Error;

/// Trait abstracting configuration loading for testability.
pub trait ConfigLoader: Send + Sync {
    /// Loads the router configuration.
    fn load(&self) -> Result<RouterConfig, Arc<OrthoError>>;
}

/// Loader that reads the configuration file and `FERRY_*` environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<RouterConfig, Arc<OrthoError>> {
        RouterConfig::resolve()
    }
}

/// Loader that always returns the same configuration.
///
/// The default instance returns the bundled in-memory configuration.
#[derive(Debug, Default, Clone)]
pub struct StaticConfigLoader {
    config: RouterConfig,
}

impl StaticConfigLoader {
    /// Builds a loader returning `config`.
    #[must_use]
    pub fn new(config: RouterConfig) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<RouterConfig, Arc<OrthoError>> {
        Ok(self.config.clone())
    }
}

/// Reasons the router configuration could not be used.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The loader failed.
    #[error("failed to load configuration: {0}")]
    Load(#[source] Arc<OrthoError>),
    /// The configuration loaded but is not usable.
    #[error("invalid configuration: {0}")]
    Resolve(#[from] ResolveError),
}

/// Loads and validates the configuration in one step.
pub(crate) fn load_resolved(loader: &dyn ConfigLoader) -> Result<ResolvedConfig, ConfigError> {
    let config = loader.load().map_err(ConfigError::Load)?;
    Ok(ResolvedConfig::from_config(&config)?)
}
