//! Assembles a ready-to-use client from [`Settings`].

use std::sync::Arc;

use tower::retry::RetryLayer;
use tracing::info;

use crate::credential::{DefaultAzureCredential, TokenCredential};
use crate::middleware::{ApiKeyLayer, BearerTokenLayer, BearerTokenPolicy, LoggingLayer, RetryPolicy};
use crate::responses::ResponsesClient;
use crate::settings::{Auth, Settings};
use crate::{ApiClient, HyperClient, HyperClientBuilder};

/// Responses API client over the hyper transport.
pub type AzureOpenAi = ResponsesClient<ApiClient<HyperClient>>;

impl ResponsesClient<ApiClient<HyperClient>> {
    /// Connect with the settings' auth mode.
    ///
    /// Entra mode uses [`DefaultAzureCredential`]. The middleware stack,
    /// innermost first, is authentication, retry, logging.
    #[must_use]
    pub fn connect(settings: &Settings) -> Self {
        Self::assemble(settings, || {
            Arc::new(DefaultAzureCredential::new()) as Arc<dyn TokenCredential>
        })
    }

    /// Connect, using `credential` when the settings select Entra mode.
    #[must_use]
    pub fn connect_with(settings: &Settings, credential: Arc<dyn TokenCredential>) -> Self {
        Self::assemble(settings, move || credential)
    }

    fn assemble(
        settings: &Settings,
        credential: impl FnOnce() -> Arc<dyn TokenCredential>,
    ) -> Self {
        let http = authenticate(HyperClient::builder(), settings.auth(), credential)
            .layer(RetryLayer::new(RetryPolicy::new(settings.retries())))
            .layer(LoggingLayer::new())
            .build();

        info!(
            base_url = %settings.base_url(),
            auth = %settings.auth().mode(),
            retries = settings.retries(),
            "Azure OpenAI client ready"
        );

        let client = Self::new(ApiClient::with_url(http, settings.base_url().clone()));
        match settings.timeout() {
            Some(timeout) => client.with_timeout(timeout),
            None => client,
        }
    }
}

fn authenticate(
    builder: HyperClientBuilder,
    auth: &Auth,
    credential: impl FnOnce() -> Arc<dyn TokenCredential>,
) -> HyperClientBuilder {
    match auth {
        Auth::ApiKey(key) => builder.layer(ApiKeyLayer::new(key.clone())),
        Auth::Entra {
            scope,
            allow_insecure_http,
        } => builder.layer(BearerTokenLayer::new(
            BearerTokenPolicy::new(credential(), [scope.as_str()])
                .allow_insecure_http(*allow_insecure_http),
        )),
    }
}
