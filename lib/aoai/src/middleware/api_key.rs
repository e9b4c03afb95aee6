//! API key authentication middleware.
//!
//! Azure OpenAI accepts a resource key in the `api-key` header as an
//! alternative to Entra ID tokens.

use std::fmt;
use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::Bytes;
use secrecy::{ExposeSecret, SecretString};
use tower::{Layer, Service};

use crate::{Error, Request, Response, Result};

/// Header carrying the key.
pub const API_KEY_HEADER: &str = "api-key";

/// Layer that adds the `api-key` header to every request.
///
/// # Example
///
/// ```ignore
/// use aoai::middleware::ApiKeyLayer;
///
/// let client = HyperClient::builder()
///     .layer(ApiKeyLayer::new(key))
///     .build();
/// ```
#[derive(Clone)]
pub struct ApiKeyLayer {
    key: Arc<SecretString>,
}

impl ApiKeyLayer {
    /// Create a layer sending `key`.
    pub fn new(key: impl Into<SecretString>) -> Self {
        Self {
            key: Arc::new(key.into()),
        }
    }
}

impl fmt::Debug for ApiKeyLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKeyLayer").finish_non_exhaustive()
    }
}

impl<S> Layer<S> for ApiKeyLayer {
    type Service = ApiKey<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ApiKey {
            inner,
            key: Arc::clone(&self.key),
        }
    }
}

/// Service that adds the `api-key` header.
#[derive(Clone)]
pub struct ApiKey<S> {
    inner: S,
    key: Arc<SecretString>,
}

impl<S: fmt::Debug> fmt::Debug for ApiKey<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKey")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

impl<S> Service<Request<Bytes>> for ApiKey<S>
where
    S: Service<Request<Bytes>, Response = Response<Bytes>, Error = Error>,
{
    type Response = Response<Bytes>;
    type Error = Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<()>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<Bytes>) -> Self::Future {
        request.set_header(API_KEY_HEADER, self.key.expose_secret());
        self.inner.call(request)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use aoai_core::Method;
    use tower::ServiceExt;

    use super::*;

    #[tokio::test]
    async fn sets_the_header() {
        let echo = tower::service_fn(|request: Request<Bytes>| {
            let mut headers = HashMap::new();
            if let Some(key) = request.header("api-key") {
                headers.insert("x-seen-key".to_string(), key.to_string());
            }
            async move { Ok::<_, Error>(Response::new(200, headers, Bytes::new())) }
        });
        let url = url::Url::parse("https://example.openai.azure.com/").expect("url");
        let request = Request::builder(Method::Get, url)
            .header("API-Key", "stale")
            .build();

        let response = ApiKeyLayer::new("k")
            .layer(echo)
            .oneshot(request)
            .await
            .expect("response");

        assert_eq!(response.header("x-seen-key"), Some("k"));
    }

    #[test]
    fn debug_hides_the_key() {
        let layer = ApiKeyLayer::new("super-secret");
        assert!(!format!("{layer:?}").contains("super-secret"));
    }
}
