//! HTTP client implementation using hyper-util.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;

use aoai_core::Deadline;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper_rustls::HttpsConnector;
use hyper_util::{
    client::legacy::{Client, connect::HttpConnector},
    rt::TokioExecutor,
};
use secrecy::SecretString;
use tower::Layer;
use tower::retry::RetryLayer;
use tower::util::BoxCloneService;
use tower_service::Service;

use crate::{
    Error, Request, Response, Result,
    config::{ClientConfig, ClientConfigBuilder},
    connector::https_connector,
    credential::TokenCredential,
    middleware::{
        ApiKeyLayer, BearerTokenLayer, BearerTokenPolicy, InterceptLayer, Interceptor,
        LoggingLayer, RetryPolicy,
    },
};

// ============================================================================
// Type-Erased Service for Middleware Composition
// ============================================================================

/// Type-erased service for middleware composition.
///
/// This type allows storing and composing arbitrary Tower layers without
/// exposing complex generic types to users.
pub type BoxedService = BoxCloneService<Request<Bytes>, Response<Bytes>, Error>;

/// Future type for Tower Service implementation.
pub type ServiceFuture = Pin<Box<dyn Future<Output = Result<Response<Bytes>>> + Send + 'static>>;

/// Thread-safe wrapper for `BoxedService`.
///
/// This wrapper uses a Mutex to make the service Sync, which is required
/// by the `HttpClient` trait.
#[derive(Clone)]
struct SyncService {
    inner: Arc<Mutex<BoxedService>>,
}

impl SyncService {
    fn new(service: BoxedService) -> Self {
        Self {
            inner: Arc::new(Mutex::new(service)),
        }
    }

    fn call(&self, request: Request<Bytes>) -> ServiceFuture {
        // Lock, clone the service, and release the lock immediately
        let service = self
            .inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone();

        Box::pin(async move {
            use tower::ServiceExt;
            service.oneshot(request).await
        })
    }
}

// ============================================================================
// Raw Client (internal, used for direct hyper access)
// ============================================================================

/// Raw HTTP client using hyper-util (internal implementation).
#[derive(Clone)]
struct RawHyperClient {
    inner: Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
    config: ClientConfig,
}

impl RawHyperClient {
    fn new(config: ClientConfig) -> Self {
        let connector = https_connector(&config);

        let inner = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_idle_per_host)
            .build(connector);

        Self { inner, config }
    }

    /// Build a hyper request from an aoai request.
    fn build_hyper_request(
        request: Request<Bytes>,
        user_agent: &str,
    ) -> Result<http::Request<Full<Bytes>>> {
        let has_user_agent = request.header("user-agent").is_some();
        let (method, url, headers, body, extensions) = request.into_parts();

        let mut builder = http::Request::builder()
            .method(http::Method::from(method))
            .uri(url.as_str());

        for (name, value) in &headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !has_user_agent {
            builder = builder.header(http::header::USER_AGENT, user_agent);
        }

        let body = body.map_or_else(Full::default, Full::new);
        let mut http_request = builder
            .body(body)
            .map_err(|e| Error::invalid_request(e.to_string()))?;

        *http_request.extensions_mut() = extensions;

        Ok(http_request)
    }

    /// Extract response headers as a `HashMap`.
    fn extract_headers(headers: &http::HeaderMap) -> HashMap<String, String> {
        headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.to_string(), v.to_string()))
            })
            .collect()
    }

    /// The configured timeout, shortened to what is left of the request deadline.
    fn effective_timeout(&self, deadline: Option<Deadline>) -> Duration {
        deadline.map_or(self.config.timeout, |deadline| {
            deadline.remaining().min(self.config.timeout)
        })
    }

    async fn execute(&self, request: Request<Bytes>) -> Result<Response<Bytes>> {
        let timeout = self.effective_timeout(request.extensions().get::<Deadline>().copied());
        let hyper_request = Self::build_hyper_request(request, &self.config.user_agent)?;

        let exchange = async {
            let response = self
                .inner
                .request(hyper_request)
                .await
                .map_err(Self::map_hyper_error)?;

            let status = response.status().as_u16();
            let response_headers = Self::extract_headers(response.headers());

            let body = response
                .into_body()
                .collect()
                .await
                .map_err(|e| Error::connection(e.to_string()))?
                .to_bytes();

            Ok::<_, Error>(Response::new(status, response_headers, body))
        };

        tokio::time::timeout(timeout, exchange)
            .await
            .map_err(|_| Error::Timeout)?
    }

    #[allow(clippy::needless_pass_by_value)]
    fn map_hyper_error(err: hyper_util::client::legacy::Error) -> Error {
        let msg = format!("{err:?}");

        if err.is_connect() {
            return Error::connection(msg);
        }

        if msg.contains("ssl") || msg.contains("tls") || msg.contains("certificate") {
            return Error::tls(msg);
        }

        Error::connection(msg)
    }
}

impl Service<Request<Bytes>> for RawHyperClient {
    type Response = Response<Bytes>;
    type Error = Error;
    type Future = ServiceFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request<Bytes>) -> Self::Future {
        let client = self.clone();
        Box::pin(async move { client.execute(request).await })
    }
}

// ============================================================================
// Public Client
// ============================================================================

/// HTTP client using hyper-util with connection pooling, TLS, and middleware support.
///
/// # Example
///
/// ```ignore
/// use aoai::HyperClient;
///
/// let client = HyperClient::builder()
///     .with_api_key(api_key)
///     .with_retry(2)
///     .with_logging()
///     .build();
/// ```
#[derive(Clone)]
pub struct HyperClient {
    service: SyncService,
    config: ClientConfig,
}

impl std::fmt::Debug for HyperClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl HyperClient {
    /// Create a new client with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ClientConfig::default())
    }

    /// Create a new client with custom configuration (no middleware).
    #[must_use]
    pub fn with_config(config: ClientConfig) -> Self {
        let raw = RawHyperClient::new(config.clone());
        Self::with_service(BoxCloneService::new(raw), config)
    }

    /// Create a client with a pre-configured service (used by builder).
    fn with_service(service: BoxedService, config: ClientConfig) -> Self {
        Self {
            service: SyncService::new(service),
            config,
        }
    }

    /// Create a new client builder.
    #[must_use]
    pub fn builder() -> HyperClientBuilder {
        HyperClientBuilder::default()
    }

    /// Get the client configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }
}

impl Default for HyperClient {
    fn default() -> Self {
        Self::new()
    }
}

impl aoai_core::HttpClient for HyperClient {
    async fn execute(&self, request: Request<Bytes>) -> Result<Response<Bytes>> {
        self.service.call(request).await
    }
}

impl Service<Request<Bytes>> for HyperClient {
    type Response = Response<Bytes>;
    type Error = Error;
    type Future = ServiceFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        // The wrapped stack is driven to readiness inside `SyncService::call`
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request<Bytes>) -> Self::Future {
        self.service.call(request)
    }
}

/// Builder for [`HyperClient`].
///
/// Each added layer wraps everything added before it: the **last** layer
/// added is the outermost one and sees the request first. To attach the
/// bearer token on every retry attempt, add the authentication layer before
/// the retry layer:
///
/// ```ignore
/// let client = HyperClient::builder()
///     .with_bearer_token(credential, [COGNITIVE_SERVICES_SCOPE])
///     .with_retry(2)
///     .with_logging()
///     .build();
/// // request -> logging -> retry -> bearer token -> transport
/// ```
#[derive(Default)]
pub struct HyperClientBuilder {
    config: ClientConfigBuilder,
    layers: Vec<Arc<dyn Fn(BoxedService) -> BoxedService + Send + Sync>>,
}

impl std::fmt::Debug for HyperClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperClientBuilder")
            .field("config", &self.config)
            .field("layers_count", &self.layers.len())
            .finish()
    }
}

impl HyperClientBuilder {
    // ========================================================================
    // Core Configuration
    // ========================================================================

    /// Set the request timeout (applied at the connection level, not middleware).
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.timeout(timeout);
        self
    }

    /// Set the connection timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.connect_timeout(timeout);
        self
    }

    /// Set the `User-Agent` header value.
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config = self.config.user_agent(user_agent);
        self
    }

    /// Replace the whole transport configuration.
    #[must_use]
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = ClientConfigBuilder::default()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_per_host(config.pool_idle_per_host)
            .pool_idle_timeout(config.pool_idle_timeout)
            .user_agent(config.user_agent);
        self
    }

    // ========================================================================
    // Generic Middleware API
    // ========================================================================

    /// Add a Tower layer to the client.
    ///
    /// The layer wraps every layer added before it.
    #[must_use]
    pub fn layer<L>(mut self, layer: L) -> Self
    where
        L: Layer<BoxedService> + Send + Sync + 'static,
        L::Service: Service<Request<Bytes>, Response = Response<Bytes>, Error = Error>
            + Clone
            + Send
            + 'static,
        <L::Service as Service<Request<Bytes>>>::Future: Send,
    {
        self.layers.push(Arc::new(move |service| {
            BoxCloneService::new(layer.layer(service))
        }));
        self
    }

    /// Add a policy-shaped [`Interceptor`] to the client.
    #[must_use]
    pub fn with_interceptor<I: Interceptor>(self, interceptor: I) -> Self {
        self.layer(InterceptLayer::new(interceptor))
    }

    // ========================================================================
    // Helper Methods
    // ========================================================================

    /// Add retry middleware with the given number of retries.
    ///
    /// Uses the default retry policy: retries on 5xx, 429, connection errors, timeouts.
    #[must_use]
    pub fn with_retry(self, max_retries: u32) -> Self {
        self.layer(RetryLayer::new(RetryPolicy::new(max_retries)))
    }

    /// Authenticate with a bearer token issued by `credential` for `scopes`.
    ///
    /// Tokens are only sent over `https`; build the layer with
    /// [`BearerTokenPolicy::allow_insecure_http`] and pass it to
    /// [`Self::layer`] to opt into plaintext.
    #[must_use]
    pub fn with_bearer_token<C, S>(self, credential: Arc<C>, scopes: S) -> Self
    where
        C: TokenCredential + ?Sized + 'static,
        S: IntoIterator,
        S::Item: Into<String>,
    {
        self.layer(BearerTokenLayer::new(BearerTokenPolicy::new(
            credential, scopes,
        )))
    }

    /// Authenticate with a static key sent in the `api-key` header.
    #[must_use]
    pub fn with_api_key(self, api_key: impl Into<SecretString>) -> Self {
        self.layer(ApiKeyLayer::new(api_key))
    }

    /// Add request/response logging.
    #[must_use]
    pub fn with_logging(self) -> Self {
        self.layer(LoggingLayer::new())
    }

    /// Add debug-level logging (includes redacted headers).
    #[must_use]
    pub fn with_debug_logging(self) -> Self {
        self.layer(LoggingLayer::debug())
    }

    // ========================================================================
    // Build
    // ========================================================================

    /// Build the client with all configured middleware.
    #[must_use]
    pub fn build(self) -> HyperClient {
        let config = self.config.build();
        let mut service: BoxedService = BoxCloneService::new(RawHyperClient::new(config.clone()));

        for layer_fn in self.layers {
            service = layer_fn(service);
        }

        HyperClient::with_service(service, config)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn client_default() {
        let client = HyperClient::new();
        assert_eq!(client.config().timeout, Duration::from_secs(60));
    }

    #[test]
    fn client_builder() {
        let client = HyperClient::builder()
            .timeout(Duration::from_secs(5))
            .user_agent("azopenai-starter-kit")
            .build();

        assert_eq!(client.config().timeout, Duration::from_secs(5));
        assert_eq!(client.config().user_agent, "azopenai-starter-kit");
    }

    #[test]
    fn deadline_shortens_timeout() {
        let raw = RawHyperClient::new(ClientConfig::default());

        assert_eq!(raw.effective_timeout(None), Duration::from_secs(60));

        let soon = Deadline::after(Duration::from_millis(200));
        assert!(raw.effective_timeout(Some(soon)) <= Duration::from_millis(200));

        let late = Deadline::after(Duration::from_secs(3600));
        assert_eq!(raw.effective_timeout(Some(late)), Duration::from_secs(60));
    }

    #[test]
    fn user_agent_is_defaulted_but_not_overridden() {
        let url = url::Url::parse("https://example.openai.azure.com/").expect("url");

        let request = Request::<Bytes>::builder(aoai_core::Method::Get, url.clone()).build();
        let hyper_request =
            RawHyperClient::build_hyper_request(request, "aoai/test").expect("request");
        assert_eq!(
            hyper_request.headers().get(http::header::USER_AGENT),
            Some(&http::HeaderValue::from_static("aoai/test"))
        );

        let request = Request::<Bytes>::builder(aoai_core::Method::Get, url)
            .header("User-Agent", "custom")
            .build();
        let hyper_request =
            RawHyperClient::build_hyper_request(request, "aoai/test").expect("request");
        assert_eq!(
            hyper_request.headers().get(http::header::USER_AGENT),
            Some(&http::HeaderValue::from_static("custom"))
        );
    }

    #[test]
    fn client_is_debug() {
        let client = HyperClient::new();
        let debug = format!("{client:?}");
        assert!(debug.contains("HyperClient"));
    }
}
