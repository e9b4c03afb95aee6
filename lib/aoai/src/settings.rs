//! Service settings read once at startup.
//!
//! [`Settings`] holds everything needed to reach an Azure OpenAI resource.
//! It is built from an injected lookup function (the process environment in
//! production, a map in tests) and passed by reference to
//! [`AzureOpenAi::connect`](crate::AzureOpenAi::connect).

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::credential::COGNITIVE_SERVICES_SCOPE;
use crate::{Error, Result};

/// Base URL of the resource, e.g. `https://my-resource.openai.azure.com/`.
pub const ENDPOINT_ENV: &str = "AZURE_OPENAI_ENDPOINT";
/// Resource key, required in API key mode.
pub const API_KEY_ENV: &str = "AZURE_OPENAI_API_KEY";
/// Model deployment name.
pub const MODEL_ENV: &str = "AZURE_OPENAI_MODEL";

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "gpt-5-mini";
/// Output token cap used when none is configured.
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 1000;
/// Retries used when none are configured.
pub const DEFAULT_RETRIES: u32 = 2;

const API_SUFFIX: &str = "openai/v1/";

/// Turn a resource endpoint into the base URL of the v1 API.
///
/// Every trailing `/` is dropped before `/openai/v1/` is appended, so
/// `https://x.openai.azure.com`, `https://x.openai.azure.com/` and
/// `https://x.openai.azure.com//` all give `https://x.openai.azure.com/openai/v1/`.
///
/// # Errors
///
/// Returns [`Error::Config`] when the endpoint is empty or not a URL.
pub fn normalize_base_url(endpoint: &str) -> Result<Url> {
    let endpoint = endpoint.trim();
    if endpoint.is_empty() {
        return Err(Error::config(format!("{ENDPOINT_ENV} is empty")));
    }

    let base = format!("{}/{API_SUFFIX}", endpoint.trim_end_matches('/'));
    Url::parse(&base).map_err(|e| Error::config(format!("invalid {ENDPOINT_ENV} '{endpoint}': {e}")))
}

/// How requests are authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    /// Resource key in the `api-key` header.
    #[default]
    ApiKey,
    /// Microsoft Entra ID bearer tokens.
    Entra,
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ApiKey => "api-key",
            Self::Entra => "entra",
        })
    }
}

impl FromStr for AuthMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "api-key" | "apikey" | "key" => Ok(Self::ApiKey),
            "entra" | "entra-id" | "aad" | "token" => Ok(Self::Entra),
            other => Err(Error::config(format!(
                "unknown auth mode '{other}' (expected 'api-key' or 'entra')"
            ))),
        }
    }
}

/// Resolved authentication settings.
#[derive(Debug, Clone)]
pub enum Auth {
    /// Send a resource key.
    ApiKey(SecretString),
    /// Send bearer tokens for `scope`.
    Entra {
        /// Token scope.
        scope: String,
        /// Permit tokens over plaintext `http`.
        allow_insecure_http: bool,
    },
}

impl Auth {
    /// The mode these settings belong to.
    #[must_use]
    pub const fn mode(&self) -> AuthMode {
        match self {
            Self::ApiKey(_) => AuthMode::ApiKey,
            Self::Entra { .. } => AuthMode::Entra,
        }
    }
}

/// Everything needed to call an Azure OpenAI resource.
#[derive(Debug, Clone)]
pub struct Settings {
    base_url: Url,
    auth: Auth,
    model: String,
    max_output_tokens: u32,
    retries: u32,
    timeout: Option<Duration>,
}

impl Settings {
    /// Start from a base URL and an authentication mode, with defaults for the rest.
    #[must_use]
    pub fn builder(base_url: Url, auth: Auth) -> SettingsBuilder {
        SettingsBuilder {
            settings: Self {
                base_url,
                auth,
                model: DEFAULT_MODEL.to_string(),
                max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
                retries: DEFAULT_RETRIES,
                timeout: None,
            },
        }
    }

    /// Read settings through `lookup` for the given auth mode.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the variable when
    /// `AZURE_OPENAI_ENDPOINT` is missing or invalid, or when
    /// `AZURE_OPENAI_API_KEY` is missing in API key mode.
    pub fn from_lookup(mode: AuthMode, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let endpoint = lookup(ENDPOINT_ENV)
            .ok_or_else(|| Error::config(format!("missing {ENDPOINT_ENV} environment variable")))?;
        let base_url = normalize_base_url(&endpoint)?;

        let auth = match mode {
            AuthMode::ApiKey => {
                let key = lookup(API_KEY_ENV)
                    .filter(|key| !key.trim().is_empty())
                    .ok_or_else(|| {
                        Error::config(format!("missing {API_KEY_ENV} environment variable"))
                    })?;
                Auth::ApiKey(SecretString::from(key))
            }
            AuthMode::Entra => Auth::Entra {
                scope: COGNITIVE_SERVICES_SCOPE.to_string(),
                allow_insecure_http: false,
            },
        };

        let mut builder = Self::builder(base_url, auth);
        if let Some(model) = lookup(MODEL_ENV).filter(|model| !model.trim().is_empty()) {
            builder = builder.model(model);
        }
        Ok(builder.build())
    }

    /// Read settings from the process environment.
    ///
    /// # Errors
    ///
    /// See [`Self::from_lookup`].
    pub fn from_env(mode: AuthMode) -> Result<Self> {
        Self::from_lookup(mode, |name| std::env::var(name).ok())
    }

    /// Adjust these settings.
    #[must_use]
    pub fn into_builder(self) -> SettingsBuilder {
        SettingsBuilder { settings: self }
    }

    /// Base URL of the v1 API, ending with `/`.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Authentication settings.
    #[must_use]
    pub const fn auth(&self) -> &Auth {
        &self.auth
    }

    /// Model deployment name.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Output token cap for requests built from these settings.
    #[must_use]
    pub const fn max_output_tokens(&self) -> u32 {
        self.max_output_tokens
    }

    /// Retries after the first attempt.
    #[must_use]
    pub const fn retries(&self) -> u32 {
        self.retries
    }

    /// Per-call timeout, covering token fetch, retries and transport.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

/// Builder for [`Settings`].
#[derive(Debug, Clone)]
pub struct SettingsBuilder {
    settings: Settings,
}

impl SettingsBuilder {
    /// Model deployment name.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.settings.model = model.into();
        self
    }

    /// Output token cap.
    #[must_use]
    pub const fn max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.settings.max_output_tokens = max_output_tokens;
        self
    }

    /// Retries after the first attempt.
    #[must_use]
    pub const fn retries(mut self, retries: u32) -> Self {
        self.settings.retries = retries;
        self
    }

    /// Per-call timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.settings.timeout = Some(timeout);
        self
    }

    /// Permit bearer tokens over plaintext `http`. No effect in API key mode.
    #[must_use]
    pub fn allow_insecure_http(mut self, allow: bool) -> Self {
        if let Auth::Entra {
            allow_insecure_http,
            ..
        } = &mut self.settings.auth
        {
            *allow_insecure_http = allow;
        }
        self
    }

    /// Finish.
    #[must_use]
    pub fn build(self) -> Settings {
        self.settings
    }
}
