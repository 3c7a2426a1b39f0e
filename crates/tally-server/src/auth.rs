//! Request authentication.
//!
//! The accepted identity is resolved once at startup by asking a
//! [`CredentialProvider`] for the credentials matching `security.properties`.
//! Callers then present the same pair in the `x-tally-username` and
//! `x-tally-password` headers on every HTTP request and on the WebSocket
//! upgrade.

use axum::http::{HeaderMap, HeaderValue};

use tally_core::credentials::{CredentialProvider, Credentials, PeerIdentity, SecurityProperties};
use tally_core::error::{Result, TallyError};

use crate::config::SecuritySection;

pub const USERNAME_HEADER: &str = "x-tally-username";
pub const PASSWORD_HEADER: &str = "x-tally-password";

/// Identity the server asks the provider about.
pub const SERVER_IDENTITY: &str = "tally-server";

/// User reported for requests when security is disabled.
pub const ANONYMOUS: &str = "anonymous";

#[derive(Debug)]
pub struct Authenticator {
    accepted: Option<Credentials>,
}

impl Authenticator {
    /// Build from config. With security disabled the provider is not consulted.
    pub fn from_config(sec: &SecuritySection, provider: &dyn CredentialProvider) -> Result<Self> {
        if !sec.enabled {
            tracing::warn!("security disabled; all requests are accepted");
            return Ok(Self::disabled());
        }

        provider.init()?;
        let props = SecurityProperties::from(sec.properties.clone());
        let creds = provider.credentials(&props, &PeerIdentity::server(SERVER_IDENTITY));
        provider.close();
        let creds = creds?;

        tracing::info!(username = %creds.username, "authenticator ready");
        Ok(Self {
            accepted: Some(creds),
        })
    }

    pub fn disabled() -> Self {
        Self { accepted: None }
    }

    pub fn enabled(&self) -> bool {
        self.accepted.is_some()
    }

    /// Check presented credentials. Returns the authenticated username.
    pub fn verify(&self, presented: Option<&Credentials>) -> Result<String> {
        let Some(expected) = &self.accepted else {
            return Ok(ANONYMOUS.to_string());
        };
        match presented {
            Some(c) if c == expected => Ok(c.username.clone()),
            _ => Err(TallyError::AuthenticationFailed),
        }
    }

    pub fn verify_headers(&self, headers: &HeaderMap) -> Result<String> {
        self.verify(credentials_from_headers(headers).as_ref())
    }
}

/// Extract credentials from request headers. Both headers must be present.
pub fn credentials_from_headers(headers: &HeaderMap) -> Option<Credentials> {
    let user = headers.get(USERNAME_HEADER)?.to_str().ok()?;
    let pass = headers.get(PASSWORD_HEADER)?.to_str().ok()?;
    Some(Credentials::new(user, pass))
}

/// Attach credentials to outgoing request headers.
pub fn apply_credentials(headers: &mut HeaderMap, creds: &Credentials) -> Result<()> {
    let user = HeaderValue::from_str(&creds.username)
        .map_err(|e| TallyError::BadRequest(format!("username not header-safe: {e}")))?;
    let mut pass = HeaderValue::from_str(&creds.password)
        .map_err(|e| TallyError::BadRequest(format!("password not header-safe: {e}")))?;
    pass.set_sensitive(true);
    headers.insert(USERNAME_HEADER, user);
    headers.insert(PASSWORD_HEADER, pass);
    Ok(())
}
