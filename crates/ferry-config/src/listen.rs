//! Listen specs naming the transports the router accepts connections on.
//!
//! A listen spec has the form `transport:key=value,key=value`, for example
//! `unix:abstract=ferry` or `slap:type=uart,dev=/dev/ttyUSB1,baud=115200`.
//! Lists of specs are joined with `;` in configuration, which is also the form
//! handed to the router controller.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Separator between specs in a joined listen list.
pub const LISTEN_SEPARATOR: char = ';';

/// One transport endpoint the router should listen on.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ListenSpec {
    transport: String,
    options: Vec<(String, String)>,
}

impl ListenSpec {
    /// Builds a spec for the named transport with no options.
    #[must_use]
    pub fn new(transport: impl Into<String>) -> Self {
        Self {
            transport: transport.into(),
            options: Vec::new(),
        }
    }

    /// Appends an option, keeping insertion order.
    #[must_use]
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.push((key.into(), value.into()));
        self
    }

    /// Transport name used to look up the transport factory.
    #[must_use]
    pub fn transport(&self) -> &str {
        self.transport.as_str()
    }

    /// Options in the order they were written.
    pub fn options(&self) -> impl Iterator<Item = (&str, &str)> {
        self.options
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Returns the value recorded for `key`, if any.
    #[must_use]
    pub fn option(&self, key: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|(candidate, _)| candidate == key)
            .map(|(_, value)| value.as_str())
    }
}

impl fmt::Display for ListenSpec {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}:", self.transport)?;
        for (index, (key, value)) in self.options.iter().enumerate() {
            if index > 0 {
                formatter.write_str(",")?;
            }
            write!(formatter, "{key}={value}")?;
        }
        Ok(())
    }
}

impl FromStr for ListenSpec {
    type Err = ListenSpecParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        let Some((transport, rest)) = trimmed.split_once(':') else {
            return Err(ListenSpecParseError::MissingTransport(trimmed.to_owned()));
        };
        let transport = transport.trim();
        if transport.is_empty() {
            return Err(ListenSpecParseError::MissingTransport(trimmed.to_owned()));
        }

        let mut spec = Self::new(transport);
        for option in rest.split(',').map(str::trim).filter(|part| !part.is_empty()) {
            let Some((key, value)) = option.split_once('=') else {
                return Err(ListenSpecParseError::MalformedOption {
                    spec: trimmed.to_owned(),
                    option: option.to_owned(),
                });
            };
            let key = key.trim();
            if key.is_empty() {
                return Err(ListenSpecParseError::MalformedOption {
                    spec: trimmed.to_owned(),
                    option: option.to_owned(),
                });
            }
            if spec.option(key).is_some() {
                return Err(ListenSpecParseError::DuplicateOption {
                    spec: trimmed.to_owned(),
                    key: key.to_owned(),
                });
            }
            spec = spec.with_option(key, value.trim());
        }
        Ok(spec)
    }
}

/// Parses a `;`-separated listen list, preserving order and skipping blanks.
pub fn parse_listen_list(input: &str) -> Result<Vec<ListenSpec>, ListenSpecParseError> {
    input
        .split(LISTEN_SEPARATOR)
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(str::parse)
        .collect()
}

/// Joins specs back into the `;`-separated form consumed by the controller.
#[must_use]
pub fn join_listen_list(specs: &[ListenSpec]) -> String {
    specs
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(";")
}

/// Errors encountered while parsing a [`ListenSpec`] from text.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ListenSpecParseError {
    /// The `transport:` prefix was missing or empty.
    #[error("listen spec '{0}' does not name a transport")]
    MissingTransport(String),
    /// An option was not written as `key=value`.
    #[error("listen spec '{spec}' has malformed option '{option}'")]
    MalformedOption { spec: String, option: String },
    /// The same option key appeared twice.
    #[error("listen spec '{spec}' repeats option '{key}'")]
    DuplicateOption { spec: String, key: String },
}
