//! Shared configuration for the Ferry bundled router.
//!
//! [`RouterConfig`] is loaded in layers by `ortho_config`: the built-in
//! bundled defaults, then a configuration file (`--config-path` or
//! `FERRY_CONFIG_PATH`), then `FERRY_*` environment variables, then command
//! line flags. The defaults alone describe a working router, so an embedding
//! process that ships no configuration file still gets one.
//!
//! The supervisor does not consume [`RouterConfig`] directly. It resolves it
//! into a [`ResolvedConfig`], which validates the listen list and gathers the
//! limits and credentials the router runtime is constructed from.

mod defaults;
mod listen;
mod logging;
mod resolved;

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError};
use serde::{Deserialize, Serialize};

pub use defaults::{
    ANONYMOUS_MECHANISM, DEFAULT_AUTH_TIMEOUT, DEFAULT_LISTEN, DEFAULT_LOG_FILTER,
    DEFAULT_MAX_AUTH_ATTEMPTS, DEFAULT_MAX_COMPLETED_CONNECTIONS,
    DEFAULT_MAX_INCOMPLETE_CONNECTIONS, DEFAULT_MAX_REMOTE_CLIENTS_TCP,
    DEFAULT_MAX_REMOTE_CLIENTS_UDP, DEFAULT_ROUTER_AVAILABILITY, DEFAULT_ROUTER_MOBILITY,
    DEFAULT_ROUTER_NAME, DEFAULT_ROUTER_NODE_CONNECTION, DEFAULT_ROUTER_POWER_SOURCE,
    default_listen, default_log_filter, default_log_format,
};
pub use listen::{
    LISTEN_SEPARATOR, ListenSpec, ListenSpecParseError, join_listen_list, parse_listen_list,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use resolved::{PasswordAuth, ResolveError, ResolvedConfig};

/// Program name used when loading without the host process's arguments.
const LOADER_PROGRAM_NAME: &str = "ferry";

/// Layered configuration for the bundled router.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "FERRY")]
pub struct RouterConfig {
    /// Name given to the routing node.
    #[ortho_config(default = DEFAULT_ROUTER_NAME.to_owned())]
    pub router_name: String,
    /// `;`-separated listen specs in priority order.
    #[ortho_config(default = default_listen())]
    pub listen: String,
    /// Authentication timeout in milliseconds.
    #[ortho_config(default = DEFAULT_AUTH_TIMEOUT)]
    pub auth_timeout: u32,
    /// Connections that may be mid-handshake at once.
    #[ortho_config(default = DEFAULT_MAX_INCOMPLETE_CONNECTIONS)]
    pub max_incomplete_connections: u32,
    /// Connections that may be fully established at once.
    #[ortho_config(default = DEFAULT_MAX_COMPLETED_CONNECTIONS)]
    pub max_completed_connections: u32,
    /// Remote clients accepted over stream sockets.
    #[ortho_config(default = DEFAULT_MAX_REMOTE_CLIENTS_TCP)]
    pub max_remote_clients_tcp: u32,
    /// Remote clients accepted over datagram sockets.
    #[ortho_config(default = DEFAULT_MAX_REMOTE_CLIENTS_UDP)]
    pub max_remote_clients_udp: u32,
    /// Advertised power source.
    #[ortho_config(default = DEFAULT_ROUTER_POWER_SOURCE.to_owned())]
    pub router_power_source: String,
    /// Advertised mobility class.
    #[ortho_config(default = DEFAULT_ROUTER_MOBILITY.to_owned())]
    pub router_mobility: String,
    /// Advertised availability window.
    #[ortho_config(default = DEFAULT_ROUTER_AVAILABILITY.to_owned())]
    pub router_availability: String,
    /// Advertised network attachment.
    #[ortho_config(default = DEFAULT_ROUTER_NODE_CONNECTION.to_owned())]
    pub router_node_connection: String,
    /// Authentication mechanism offered to peers.
    #[ortho_config(default = ANONYMOUS_MECHANISM.to_owned())]
    pub auth_mechanism: String,
    /// Password answered for `auth_mechanism`; empty disables it.
    #[ortho_config(default = String::new())]
    pub password: String,
    /// Credential requests beyond this attempt count are refused.
    #[ortho_config(default = DEFAULT_MAX_AUTH_ATTEMPTS)]
    pub max_auth_attempts: u16,
    /// `tracing` filter expression.
    #[ortho_config(default = DEFAULT_LOG_FILTER.to_owned())]
    pub log_filter: String,
    /// Telemetry output format.
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            router_name: DEFAULT_ROUTER_NAME.to_owned(),
            listen: default_listen(),
            auth_timeout: DEFAULT_AUTH_TIMEOUT,
            max_incomplete_connections: DEFAULT_MAX_INCOMPLETE_CONNECTIONS,
            max_completed_connections: DEFAULT_MAX_COMPLETED_CONNECTIONS,
            max_remote_clients_tcp: DEFAULT_MAX_REMOTE_CLIENTS_TCP,
            max_remote_clients_udp: DEFAULT_MAX_REMOTE_CLIENTS_UDP,
            router_power_source: DEFAULT_ROUTER_POWER_SOURCE.to_owned(),
            router_mobility: DEFAULT_ROUTER_MOBILITY.to_owned(),
            router_availability: DEFAULT_ROUTER_AVAILABILITY.to_owned(),
            router_node_connection: DEFAULT_ROUTER_NODE_CONNECTION.to_owned(),
            auth_mechanism: ANONYMOUS_MECHANISM.to_owned(),
            password: String::new(),
            max_auth_attempts: DEFAULT_MAX_AUTH_ATTEMPTS,
            log_filter: DEFAULT_LOG_FILTER.to_owned(),
            log_format: default_log_format(),
        }
    }
}

impl RouterConfig {
    /// Loads the file and environment layers without reading the host
    /// process's command line.
    ///
    /// The router is embedded in client processes whose arguments belong to
    /// the host application, so only the program name is forwarded.
    pub fn resolve() -> Result<Self, Arc<OrthoError>> {
        Self::resolve_from_iter([OsString::from(LOADER_PROGRAM_NAME)])
    }

    /// Loads every layer, treating `args` as the command line.
    pub fn resolve_from_iter<I, T>(args: I) -> Result<Self, Arc<OrthoError>>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as OrthoConfig>::load_from_iter(args)
    }

    /// Name given to the routing node.
    #[must_use]
    pub fn router_name(&self) -> &str {
        self.router_name.as_str()
    }

    /// The listen list in its joined textual form.
    #[must_use]
    pub fn listen(&self) -> &str {
        self.listen.as_str()
    }

    /// Parses the listen list, keeping its order.
    pub fn resolve_listen_specs(&self) -> Result<Vec<ListenSpec>, ListenSpecParseError> {
        parse_listen_list(&self.listen)
    }

    /// Numeric limits keyed by their router-facing names.
    #[must_use]
    pub fn limits(&self) -> BTreeMap<String, u32> {
        [
            ("auth_timeout", self.auth_timeout),
            ("max_incomplete_connections", self.max_incomplete_connections),
            ("max_completed_connections", self.max_completed_connections),
            ("max_remote_clients_tcp", self.max_remote_clients_tcp),
            ("max_remote_clients_udp", self.max_remote_clients_udp),
        ]
        .into_iter()
        .map(|(name, value)| (name.to_owned(), value))
        .collect()
    }

    /// Advertised router properties keyed by their router-facing names.
    #[must_use]
    pub fn properties(&self) -> BTreeMap<String, String> {
        [
            ("router_power_source", &self.router_power_source),
            ("router_mobility", &self.router_mobility),
            ("router_availability", &self.router_availability),
            ("router_node_connection", &self.router_node_connection),
        ]
        .into_iter()
        .map(|(name, value)| (name.to_owned(), value.clone()))
        .collect()
    }

    /// Password credentials, present only for a named mechanism with a
    /// non-empty password.
    #[must_use]
    pub fn password_auth(&self) -> Option<PasswordAuth> {
        if self.auth_mechanism == ANONYMOUS_MECHANISM || self.password.is_empty() {
            return None;
        }
        Some(PasswordAuth::new(
            self.auth_mechanism.clone(),
            self.password.clone(),
            self.max_auth_attempts,
        ))
    }

    /// Log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Telemetry output format.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }
}
