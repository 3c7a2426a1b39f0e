//! Credential provider contract.
//!
//! A provider turns configured security properties into the username/password
//! pair a caller presents before reaching a server that hosts the counter
//! cache. The counter core never calls a provider itself.

use std::collections::HashMap;
use std::fmt;

use crate::error::Result;

/// Property key holding the username.
pub const USER_NAME: &str = "security-username";
/// Property key holding the password.
pub const PASSWORD: &str = "security-password";

/// Fixed identity used when properties name none.
pub const DEFAULT_USERNAME: &str = "test";
pub const DEFAULT_PASSWORD: &str = DEFAULT_USERNAME;

/// Configured security properties (string key/value pairs).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecurityProperties(HashMap<String, String>);

impl SecurityProperties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Builder-style `set`.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }
}

impl From<HashMap<String, String>> for SecurityProperties {
    fn from(map: HashMap<String, String>) -> Self {
        Self(map)
    }
}

/// The server or peer credentials are being produced for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerIdentity {
    pub name: String,
    /// `true` for peer-to-peer membership, `false` for client -> server.
    pub is_peer: bool,
}

impl PeerIdentity {
    pub fn server(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_peer: false,
        }
    }

    pub fn peer(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_peer: true,
        }
    }
}

/// Username/password pair. `Debug` never prints the password.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Produces credentials for a target server or peer.
///
/// Implementations that contact a real backend report rejection as
/// `TallyError::AuthenticationFailed`.
pub trait CredentialProvider: Send + Sync {
    /// Called once before the first `credentials` call.
    fn init(&self) -> Result<()> {
        Ok(())
    }

    fn credentials(
        &self,
        props: &SecurityProperties,
        target: &PeerIdentity,
    ) -> Result<Credentials>;

    fn close(&self) {}
}

/// Returns the username/password found in the properties, each defaulting to
/// `"test"`. Performs no I/O and never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct TestCredentialProvider;

impl TestCredentialProvider {
    pub fn new() -> Self {
        Self
    }
}

impl CredentialProvider for TestCredentialProvider {
    fn credentials(
        &self,
        props: &SecurityProperties,
        target: &PeerIdentity,
    ) -> Result<Credentials> {
        let creds = Credentials::new(
            props.get_or(USER_NAME, DEFAULT_USERNAME),
            props.get_or(PASSWORD, DEFAULT_PASSWORD),
        );
        tracing::debug!(
            target_name = %target.name,
            is_peer = target.is_peer,
            username = %creds.username,
            "credentials resolved"
        );
        Ok(creds)
    }
}
