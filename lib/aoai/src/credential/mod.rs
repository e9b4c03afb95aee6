//! Token credentials for Microsoft Entra ID authentication.
//!
//! A [`TokenCredential`] issues an [`AccessToken`] for a set of scopes. The
//! bearer token middleware asks for a token on every request; caching is the
//! credential's job, see [`CachedCredential`].
//!
//! | Credential | Token source |
//! |------------|--------------|
//! | [`StaticTokenCredential`] | a fixed token |
//! | [`ClientSecretCredential`] | OAuth2 client-credentials grant (`AZURE_TENANT_ID`, `AZURE_CLIENT_ID`, `AZURE_CLIENT_SECRET`) |
//! | [`ManagedIdentityCredential`] | instance metadata endpoint |
//! | [`AzureCliCredential`] | `az account get-access-token` |
//! | [`ChainedTokenCredential`] | first source that succeeds |
//! | [`DefaultAzureCredential`] | cached chain of the three sources above |

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use secrecy::SecretString;

use crate::Result;

mod azure_cli;
mod cache;
mod chain;
mod client_secret;
mod default;
mod managed_identity;
mod static_token;

pub use azure_cli::AzureCliCredential;
pub use cache::{CachedCredential, DEFAULT_REFRESH_WINDOW};
pub use chain::ChainedTokenCredential;
pub use client_secret::ClientSecretCredential;
pub use default::DefaultAzureCredential;
pub use managed_identity::ManagedIdentityCredential;
pub use static_token::StaticTokenCredential;

/// Scope of Azure AI services (Azure OpenAI included).
pub const COGNITIVE_SERVICES_SCOPE: &str = "https://cognitiveservices.azure.com/.default";

/// Boxed future returned by [`TokenCredential::get_token`].
pub type TokenFuture<'a> = Pin<Box<dyn Future<Output = Result<AccessToken>> + Send + 'a>>;

/// A bearer token and the instant it stops being valid.
#[derive(Clone)]
pub struct AccessToken {
    token: SecretString,
    expires_on: SystemTime,
}

impl AccessToken {
    /// Create a token expiring at `expires_on`.
    pub fn new(token: impl Into<String>, expires_on: SystemTime) -> Self {
        Self {
            token: SecretString::from(token.into()),
            expires_on,
        }
    }

    /// Create a token valid for `lifetime` from now.
    pub fn expiring_in(token: impl Into<String>, lifetime: Duration) -> Self {
        Self::new(token, SystemTime::now() + lifetime)
    }

    /// Create a token expiring at a Unix timestamp (seconds).
    pub fn expiring_at_unix(token: impl Into<String>, expires_on: u64) -> Self {
        Self::new(token, UNIX_EPOCH + Duration::from_secs(expires_on))
    }

    /// The secret token value.
    #[must_use]
    pub const fn token(&self) -> &SecretString {
        &self.token
    }

    /// When the token expires.
    #[must_use]
    pub const fn expires_on(&self) -> SystemTime {
        self.expires_on
    }

    /// Returns `true` once the token has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_within(Duration::ZERO)
    }

    /// Returns `true` if the token expires within `window` from now.
    #[must_use]
    pub fn expires_within(&self, window: Duration) -> bool {
        SystemTime::now() + window >= self.expires_on
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"[REDACTED]")
            .field("expires_on", &self.expires_on)
            .finish()
    }
}

/// A source of bearer tokens.
///
/// Implementations may block on network or process I/O, or answer from a
/// cache. They must be safe to call from many concurrent requests.
///
/// The trait is object safe so that credentials can be chained as
/// `Arc<dyn TokenCredential>`.
pub trait TokenCredential: Send + Sync {
    /// Get a token valid for `scopes`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Auth`] when the source cannot issue a token
    /// (not configured, not logged in, rejected by the identity endpoint).
    fn get_token<'a>(&'a self, scopes: &'a [&'a str]) -> TokenFuture<'a>;

    /// Short name used in diagnostics.
    fn name(&self) -> &'static str;
}

impl<C: TokenCredential + ?Sized> TokenCredential for Arc<C> {
    fn get_token<'a>(&'a self, scopes: &'a [&'a str]) -> TokenFuture<'a> {
        (**self).get_token(scopes)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// The single scope of a request, for sources that only support one.
fn single_scope<'a>(credential: &str, scopes: &[&'a str]) -> Result<&'a str> {
    match scopes {
        [scope] => Ok(*scope),
        _ => Err(crate::Error::auth(format!(
            "{credential} requires exactly one scope, got {}",
            scopes.len()
        ))),
    }
}

/// Remaining lifetime of a token, for logs.
fn lifetime(token: &AccessToken) -> Duration {
    token
        .expires_on()
        .duration_since(SystemTime::now())
        .unwrap_or_default()
}
