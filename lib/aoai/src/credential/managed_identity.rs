use std::fmt;
use std::time::Duration;

use aoai_core::{HttpClient, Method, Request};
use bytes::Bytes;
use serde::Deserialize;
use url::Url;

use super::{AccessToken, TokenCredential, TokenFuture, single_scope};
use crate::{Error, HyperClient, Result};

/// Instance metadata token endpoint.
pub const IMDS_ENDPOINT: &str = "http://169.254.169.254/metadata/identity/oauth2/token";

const IMDS_API_VERSION: &str = "2018-02-01";

/// Authentication with the managed identity of an Azure host.
///
/// Asks the instance metadata service (IMDS) for a token. Off Azure the
/// endpoint is unreachable; the probe client uses short timeouts so that a
/// credential chain moves on quickly.
pub struct ManagedIdentityCredential<C = HyperClient> {
    http: C,
    endpoint: Url,
    client_id: Option<String>,
}

impl ManagedIdentityCredential {
    /// Use the system-assigned identity, probing IMDS with short timeouts.
    #[must_use]
    pub fn new() -> Self {
        let http = HyperClient::builder()
            .timeout(Duration::from_secs(2))
            .connect_timeout(Duration::from_secs(1))
            .build();
        Self::with_client(http)
    }
}

impl Default for ManagedIdentityCredential {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> ManagedIdentityCredential<C> {
    /// Use `http` to reach the identity endpoint.
    pub fn with_client(http: C) -> Self {
        Self {
            http,
            endpoint: imds_endpoint(),
            client_id: None,
        }
    }

    /// Select a user-assigned identity.
    #[must_use]
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Ask another token endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: Url) -> Self {
        self.endpoint = endpoint;
        self
    }

    fn token_request(&self, scope: &str) -> Request<Bytes> {
        // IMDS speaks v1 resources, not v2 scopes
        let resource = scope.strip_suffix("/.default").unwrap_or(scope);

        let mut builder = Request::builder(Method::Get, self.endpoint.clone())
            .query("api-version", IMDS_API_VERSION)
            .query("resource", resource)
            .header("Metadata", "true");
        if let Some(client_id) = &self.client_id {
            builder = builder.query("client_id", client_id);
        }
        builder.build()
    }
}

fn imds_endpoint() -> Url {
    #[allow(clippy::expect_used)]
    Url::parse(IMDS_ENDPOINT).expect("IMDS endpoint is a valid URL")
}

impl<C> fmt::Debug for ManagedIdentityCredential<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagedIdentityCredential")
            .field("endpoint", &self.endpoint.as_str())
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

/// IMDS returns `expires_on` as a string of seconds.
#[derive(Deserialize)]
#[serde(untagged)]
enum UnixSeconds {
    Number(u64),
    Text(String),
}

impl UnixSeconds {
    fn value(&self) -> Result<u64> {
        match self {
            Self::Number(n) => Ok(*n),
            Self::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| Error::auth(format!("invalid token expiry '{s}'"))),
        }
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_on: UnixSeconds,
}

impl<C: HttpClient> TokenCredential for ManagedIdentityCredential<C> {
    fn get_token<'a>(&'a self, scopes: &'a [&'a str]) -> TokenFuture<'a> {
        Box::pin(async move {
            let scope = single_scope(self.name(), scopes)?;

            let response = self
                .http
                .execute(self.token_request(scope))
                .await
                .map_err(|e| Error::auth(format!("managed identity endpoint unavailable: {e}")))?;

            if !response.is_success() {
                return Err(Error::auth(format!(
                    "managed identity endpoint returned {}: {}",
                    response.status(),
                    response.body_snippet(200)
                )));
            }

            let token: TokenResponse = response.json()?;
            Ok(AccessToken::expiring_at_unix(
                token.access_token,
                token.expires_on.value()?,
            ))
        })
    }

    fn name(&self) -> &'static str {
        "ManagedIdentityCredential"
    }
}
