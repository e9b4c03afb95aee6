use std::fmt;
use std::time::Duration;

use aoai_core::{HttpClient, Method, Request};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use url::Url;

use super::{AccessToken, TokenCredential, TokenFuture};
use crate::{Error, HyperClient, Result};

/// Default Microsoft Entra authority.
pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com/";

const TENANT_ID_ENV: &str = "AZURE_TENANT_ID";
const CLIENT_ID_ENV: &str = "AZURE_CLIENT_ID";
const CLIENT_SECRET_ENV: &str = "AZURE_CLIENT_SECRET";
const AUTHORITY_HOST_ENV: &str = "AZURE_AUTHORITY_HOST";

/// Service principal authentication with a client secret.
///
/// Performs the OAuth2 client-credentials grant against
/// `{authority}/{tenant}/oauth2/v2.0/token`.
pub struct ClientSecretCredential<C = HyperClient> {
    http: C,
    authority: Url,
    tenant_id: String,
    client_id: String,
    client_secret: SecretString,
}

impl<C> ClientSecretCredential<C> {
    /// Create a credential for a service principal.
    pub fn new(
        http: C,
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<SecretString>,
    ) -> Self {
        Self {
            http,
            authority: default_authority(),
            tenant_id: tenant_id.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Use another authority host (sovereign clouds, tests).
    #[must_use]
    pub fn with_authority(mut self, authority: Url) -> Self {
        self.authority = authority;
        self
    }

    /// Read `AZURE_TENANT_ID`, `AZURE_CLIENT_ID`, `AZURE_CLIENT_SECRET` and the
    /// optional `AZURE_AUTHORITY_HOST` through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when a variable is missing or the authority is not a URL.
    pub fn from_lookup(http: C, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let require = |name: &str| {
            lookup(name)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| Error::config(format!("missing {name} environment variable")))
        };

        let credential = Self::new(
            http,
            require(TENANT_ID_ENV)?,
            require(CLIENT_ID_ENV)?,
            require(CLIENT_SECRET_ENV)?,
        );

        match lookup(AUTHORITY_HOST_ENV).filter(|value| !value.is_empty()) {
            Some(host) => {
                let host = format!("{}/", host.trim_end_matches('/'));
                let authority = Url::parse(&host).map_err(|e| {
                    Error::config(format!("invalid {AUTHORITY_HOST_ENV} '{host}': {e}"))
                })?;
                Ok(credential.with_authority(authority))
            }
            None => Ok(credential),
        }
    }

    /// Read the service principal from the process environment.
    ///
    /// # Errors
    ///
    /// See [`Self::from_lookup`].
    pub fn from_env(http: C) -> Result<Self> {
        Self::from_lookup(http, |name| std::env::var(name).ok())
    }

    fn token_url(&self) -> Result<Url> {
        let mut url = self.authority.clone();
        url.path_segments_mut()
            .map_err(|()| Error::config(format!("authority '{}' cannot be a base", self.authority)))?
            .pop_if_empty()
            .extend([self.tenant_id.as_str(), "oauth2", "v2.0", "token"]);
        Ok(url)
    }
}

fn default_authority() -> Url {
    // The constant is a valid absolute URL
    #[allow(clippy::expect_used)]
    Url::parse(DEFAULT_AUTHORITY_HOST).expect("default authority is a valid URL")
}

impl<C> fmt::Debug for ClientSecretCredential<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientSecretCredential")
            .field("authority", &self.authority.as_str())
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    grant_type: &'static str,
    scope: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Deserialize)]
struct TokenError {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

impl<C: HttpClient> TokenCredential for ClientSecretCredential<C> {
    fn get_token<'a>(&'a self, scopes: &'a [&'a str]) -> TokenFuture<'a> {
        Box::pin(async move {
            let form = TokenRequest {
                client_id: &self.client_id,
                client_secret: self.client_secret.expose_secret(),
                grant_type: "client_credentials",
                scope: scopes.join(" "),
            };
            let request = Request::builder(Method::Post, self.token_url()?)
                .header("Accept", "application/json")
                .form(&form)?
                .build();

            let response = self
                .http
                .execute(request)
                .await
                .map_err(|e| Error::auth(format!("token request failed: {e}")))?;

            if !response.is_success() {
                let status = response.status();
                let reason = aoai_core::from_json::<TokenError>(response.body()).map_or_else(
                    |_| response.body_snippet(200),
                    |err| err.error_description.unwrap_or(err.error),
                );
                return Err(Error::auth(format!(
                    "token endpoint returned {status}: {reason}"
                )));
            }

            let token: TokenResponse = response.json()?;
            Ok(AccessToken::expiring_in(
                token.access_token,
                Duration::from_secs(token.expires_in),
            ))
        })
    }

    fn name(&self) -> &'static str {
        "ClientSecretCredential"
    }
}
