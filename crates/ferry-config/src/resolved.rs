//! Configuration resolved into the shape the router runtime is built from.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::RouterConfig;
use crate::listen::{ListenSpec, ListenSpecParseError, join_listen_list};

/// Password credentials offered to peers during authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordAuth {
    mechanism: String,
    password: String,
    max_attempts: u16,
}

impl PasswordAuth {
    /// Builds password credentials for the named mechanism.
    #[must_use]
    pub fn new(mechanism: impl Into<String>, password: impl Into<String>, max_attempts: u16) -> Self {
        Self {
            mechanism: mechanism.into(),
            password: password.into(),
            max_attempts,
        }
    }

    /// Authentication mechanism the password answers.
    #[must_use]
    pub fn mechanism(&self) -> &str {
        self.mechanism.as_str()
    }

    /// The configured password.
    #[must_use]
    pub fn password(&self) -> &str {
        self.password.as_str()
    }

    /// Highest attempt number that is still answered.
    #[must_use]
    pub fn max_attempts(&self) -> u16 {
        self.max_attempts
    }
}

/// Router settings after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    router_name: String,
    listen: Vec<ListenSpec>,
    limits: BTreeMap<String, u32>,
    properties: BTreeMap<String, String>,
    password_auth: Option<PasswordAuth>,
}

impl ResolvedConfig {
    /// Validates `config` and resolves its listen list.
    pub fn from_config(config: &RouterConfig) -> Result<Self, ResolveError> {
        let listen = config.resolve_listen_specs()?;
        if listen.is_empty() {
            return Err(ResolveError::NoListenSpecs);
        }
        Ok(Self {
            router_name: config.router_name().to_owned(),
            listen,
            limits: config.limits(),
            properties: config.properties(),
            password_auth: config.password_auth(),
        })
    }

    /// Name given to the routing node.
    #[must_use]
    pub fn router_name(&self) -> &str {
        self.router_name.as_str()
    }

    /// Listen specs in priority order.
    #[must_use]
    pub fn listen(&self) -> &[ListenSpec] {
        self.listen.as_slice()
    }

    /// Listen specs joined with `;`.
    #[must_use]
    pub fn joined_listen(&self) -> String {
        join_listen_list(&self.listen)
    }

    /// Numeric limits, passed through to the router untouched.
    #[must_use]
    pub fn limits(&self) -> &BTreeMap<String, u32> {
        &self.limits
    }

    /// Advertised router properties.
    #[must_use]
    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    /// Password credentials when a non-anonymous mechanism is configured.
    #[must_use]
    pub fn password_auth(&self) -> Option<&PasswordAuth> {
        self.password_auth.as_ref()
    }
}

/// Errors raised while resolving a [`RouterConfig`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// A listen spec could not be parsed.
    #[error(transparent)]
    ListenSpec(#[from] ListenSpecParseError),
    /// The listen list was empty.
    #[error("configuration does not declare any listen specs")]
    NoListenSpecs,
}
