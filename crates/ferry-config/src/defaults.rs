//! Built-in values for the bundled router configuration.
//!
//! These mirror the in-memory configuration the bundled router falls back to
//! when no configuration file is present.

/// Name given to the bundled routing node.
pub const DEFAULT_ROUTER_NAME: &str = "bundled-router";

/// Listen specs used by the bundled router, in the order the controller
/// brings them up: the serial link first, then the local socket.
pub const DEFAULT_LISTEN: &str = "slap:type=uart,dev=/dev/ttyUSB1,baud=115200;unix:abstract=ferry";

/// Authentication timeout in milliseconds.
pub const DEFAULT_AUTH_TIMEOUT: u32 = 20_000;

/// Connections that may be mid-handshake at once.
pub const DEFAULT_MAX_INCOMPLETE_CONNECTIONS: u32 = 48;

/// Connections that may be fully established at once.
pub const DEFAULT_MAX_COMPLETED_CONNECTIONS: u32 = 64;

/// Remote clients accepted over stream sockets.
pub const DEFAULT_MAX_REMOTE_CLIENTS_TCP: u32 = 48;

/// Remote clients accepted over datagram sockets.
pub const DEFAULT_MAX_REMOTE_CLIENTS_UDP: u32 = 48;

/// Advertised power source of the routing node.
pub const DEFAULT_ROUTER_POWER_SOURCE: &str = "Battery powered and chargeable";

/// Advertised mobility class of the routing node.
pub const DEFAULT_ROUTER_MOBILITY: &str = "Intermediate mobility";

/// Advertised availability window of the routing node.
pub const DEFAULT_ROUTER_AVAILABILITY: &str = "3-6 hr";

/// Advertised network attachment of the routing node.
pub const DEFAULT_ROUTER_NODE_CONNECTION: &str = "Wireless";

/// Mechanism that disables credential exchange.
pub const ANONYMOUS_MECHANISM: &str = "ANONYMOUS";

/// Credential requests beyond this attempt count are refused.
pub const DEFAULT_MAX_AUTH_ATTEMPTS: u16 = 2;

/// Default log filter expression.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default log filter expression.
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Default logging format.
pub fn default_log_format() -> crate::logging::LogFormat {
    crate::logging::LogFormat::Json
}

/// Default listen spec list in its joined textual form.
pub fn default_listen() -> String {
    DEFAULT_LISTEN.to_owned()
}
