use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Output formats understood by the router telemetry layer.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// One JSON object per event, for log shippers.
    #[default]
    Json,
    /// Single-line human-readable events.
    Compact,
}

/// Error produced when a [`LogFormat`] name is not recognised.
pub type LogFormatParseError = strum::ParseError;
