//! Credential provider handed to the bus controller.
//!
//! The controller runs the authentication exchange; this module only answers
//! its requests for credentials and observes the outcome.

use std::fmt;
use std::ops::BitOr;

use ferry_config::PasswordAuth;
use tracing::{debug, info};

const AUTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::auth");

/// Bit set of the credential kinds a peer requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CredentialMask(u16);

impl CredentialMask {
    /// A password or PIN.
    pub const PASSWORD: Self = Self(0x0001);
    /// A user or account name.
    pub const USER_NAME: Self = Self(0x0002);
    /// A chain of certificates.
    pub const CERT_CHAIN: Self = Self(0x0004);
    /// A private key.
    pub const PRIVATE_KEY: Self = Self(0x0008);
    /// A logon entry for verifying a password.
    pub const LOGON_ENTRY: Self = Self(0x0010);
    /// An expiration time for the credentials.
    pub const EXPIRATION: Self = Self(0x0020);

    /// Builds a mask from raw bits.
    #[must_use]
    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    /// Raw bits.
    #[must_use]
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Whether every bit of `other` is set.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for CredentialMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

/// Credentials returned to the controller.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    password: Option<String>,
    user_name: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("user_name", &self.user_name)
            .finish()
    }
}

impl Credentials {
    /// Sets the password.
    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Sets the user name.
    #[must_use]
    pub fn with_user_name(mut self, user_name: impl Into<String>) -> Self {
        self.user_name = Some(user_name.into());
        self
    }

    /// The password, if supplied.
    #[must_use]
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    /// The user name, if supplied.
    #[must_use]
    pub fn user_name(&self) -> Option<&str> {
        self.user_name.as_deref()
    }
}

/// Answers credential requests raised during peer authentication.
pub trait CredentialProvider: Send + Sync {
    /// Returns credentials for `peer`, or `None` to refuse.
    ///
    /// `attempt` counts from one for each authentication conversation.
    fn request_credentials(
        &self,
        mechanism: &str,
        peer: &str,
        attempt: u16,
        mask: CredentialMask,
    ) -> Option<Credentials>;

    /// Observes the outcome of an authentication conversation.
    fn authentication_complete(&self, mechanism: &str, peer: &str, success: bool);
}

/// Provider answering a single password mechanism.
#[derive(Debug, Clone)]
pub struct PasswordCredentialProvider {
    auth: PasswordAuth,
}

impl PasswordCredentialProvider {
    /// Builds a provider over the configured password credentials.
    #[must_use]
    pub fn new(auth: PasswordAuth) -> Self {
        Self { auth }
    }
}

impl CredentialProvider for PasswordCredentialProvider {
    fn request_credentials(
        &self,
        mechanism: &str,
        peer: &str,
        attempt: u16,
        mask: CredentialMask,
    ) -> Option<Credentials> {
        if attempt > self.auth.max_attempts() {
            debug!(
                target: AUTH_TARGET,
                mechanism,
                peer,
                attempt,
                max_attempts = self.auth.max_attempts(),
                "refusing credentials after too many attempts"
            );
            return None;
        }

        info!(
            target: AUTH_TARGET,
            mechanism,
            peer,
            attempt,
            "credentials requested"
        );

        if mechanism != self.auth.mechanism() {
            return None;
        }
        let credentials = Credentials::default();
        if mask.contains(CredentialMask::PASSWORD) {
            return Some(credentials.with_password(self.auth.password()));
        }
        Some(credentials)
    }

    fn authentication_complete(&self, mechanism: &str, peer: &str, success: bool) {
        debug!(
            target: AUTH_TARGET,
            mechanism,
            peer,
            success,
            "authentication complete"
        );
    }
}
