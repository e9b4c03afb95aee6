//! Bearer token authentication backed by a [`TokenCredential`].

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use aoai_core::Deadline;
use bytes::Bytes;
use secrecy::ExposeSecret;
use tower::Service;

use super::{InterceptLayer, Interceptor, Next};
use crate::credential::TokenCredential;
use crate::{Error, Request, Response, Result};

/// Layer adding `Authorization: Bearer <token>` from a credential.
pub type BearerTokenLayer<C> = InterceptLayer<BearerTokenPolicy<C>>;

/// Fetches a token for every request and sets the `Authorization` header.
///
/// The credential decides whether the token comes from a cache. The fetch
/// is bounded by the request [`Deadline`] when there is one.
///
/// Tokens are never sent over plaintext HTTP unless
/// [`allow_insecure_http`](Self::allow_insecure_http) is set: such requests
/// fail with [`Error::Auth`] before the credential is asked for anything.
///
/// Add this layer before the retry layer so that each attempt is
/// authenticated on its own.
pub struct BearerTokenPolicy<C: ?Sized> {
    credential: Arc<C>,
    scopes: Arc<[String]>,
    allow_insecure_http: bool,
}

impl<C: ?Sized> BearerTokenPolicy<C> {
    /// Authenticate with tokens from `credential` for `scopes`.
    pub fn new<S>(credential: Arc<C>, scopes: S) -> Self
    where
        S: IntoIterator,
        S::Item: Into<String>,
    {
        Self {
            credential,
            scopes: scopes.into_iter().map(Into::into).collect(),
            allow_insecure_http: false,
        }
    }

    /// Permit sending tokens to `http` URLs (local proxies, test servers).
    #[must_use]
    pub const fn allow_insecure_http(mut self, allow: bool) -> Self {
        self.allow_insecure_http = allow;
        self
    }

    /// The requested scopes.
    #[must_use]
    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }
}

impl<C: ?Sized> Clone for BearerTokenPolicy<C> {
    fn clone(&self) -> Self {
        Self {
            credential: Arc::clone(&self.credential),
            scopes: Arc::clone(&self.scopes),
            allow_insecure_http: self.allow_insecure_http,
        }
    }
}

impl<C: ?Sized> fmt::Debug for BearerTokenPolicy<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerTokenPolicy")
            .field("scopes", &self.scopes)
            .field("allow_insecure_http", &self.allow_insecure_http)
            .finish_non_exhaustive()
    }
}

impl<C> Interceptor for BearerTokenPolicy<C>
where
    C: TokenCredential + ?Sized + 'static,
{
    fn intercept<S>(
        &self,
        mut request: Request<Bytes>,
        next: Next<S>,
    ) -> impl Future<Output = Result<Response<Bytes>>> + Send + 'static
    where
        S: Service<Request<Bytes>, Response = Response<Bytes>, Error = Error> + Send + 'static,
        S::Future: Send + 'static,
    {
        let credential = Arc::clone(&self.credential);
        let scopes = Arc::clone(&self.scopes);
        let allow_insecure_http = self.allow_insecure_http;

        async move {
            if !allow_insecure_http && request.url().scheme() != "https" {
                return Err(Error::auth(format!(
                    "refusing to send a bearer token over {}",
                    request.url().scheme()
                )));
            }

            let scopes: Vec<&str> = scopes.iter().map(String::as_str).collect();
            let fetch = credential.get_token(&scopes);
            let token = match request.extensions().get::<Deadline>() {
                Some(deadline) => {
                    let until = tokio::time::Instant::from_std(deadline.instant());
                    tokio::time::timeout_at(until, fetch)
                        .await
                        .map_err(|_| Error::Timeout)??
                }
                None => fetch.await?,
            };

            request.set_header(
                "Authorization",
                format!("Bearer {}", token.token().expose_secret()),
            );
            next.run(request).await
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use aoai_core::Method;
    use tower::{Layer, ServiceExt};

    use super::*;
    use crate::credential::{
        AccessToken, COGNITIVE_SERVICES_SCOPE, StaticTokenCredential, TokenFuture,
    };

    /// Echoes the `Authorization` header back and counts calls.
    fn echo_auth(
        calls: Arc<AtomicUsize>,
    ) -> tower::util::BoxCloneService<Request<Bytes>, Response<Bytes>, Error> {
        tower::util::BoxCloneService::new(tower::service_fn(move |request: Request<Bytes>| {
            calls.fetch_add(1, Ordering::SeqCst);
            let mut headers = HashMap::new();
            if let Some(auth) = request.header("authorization") {
                headers.insert("x-seen-auth".to_string(), auth.to_string());
            }
            async move { Ok::<_, Error>(Response::new(200, headers, Bytes::new())) }
        }))
    }

    fn request(url: &str) -> Request<Bytes> {
        Request::builder(Method::Get, url::Url::parse(url).expect("url")).build()
    }

    fn static_credential() -> Arc<StaticTokenCredential> {
        Arc::new(StaticTokenCredential::new(AccessToken::expiring_in(
            "abc",
            Duration::from_secs(3600),
        )))
    }

    struct Slow;

    impl TokenCredential for Slow {
        fn get_token<'a>(&'a self, _scopes: &'a [&'a str]) -> TokenFuture<'a> {
            Box::pin(async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(AccessToken::expiring_in("late", Duration::from_secs(3600)))
            })
        }

        fn name(&self) -> &'static str {
            "Slow"
        }
    }

    #[tokio::test]
    async fn sets_the_authorization_header() {
        let calls = Arc::new(AtomicUsize::new(0));
        let policy = BearerTokenPolicy::new(static_credential(), [COGNITIVE_SERVICES_SCOPE]);
        let service = InterceptLayer::new(policy).layer(echo_auth(Arc::clone(&calls)));

        let response = service
            .oneshot(request("https://example.openai.azure.com/openai/v1/responses"))
            .await
            .expect("response");

        assert_eq!(response.header("x-seen-auth"), Some("Bearer abc"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn refuses_plaintext_by_default() {
        let calls = Arc::new(AtomicUsize::new(0));
        let policy = BearerTokenPolicy::new(static_credential(), [COGNITIVE_SERVICES_SCOPE]);
        let service = InterceptLayer::new(policy).layer(echo_auth(Arc::clone(&calls)));

        let err = service
            .oneshot(request("http://localhost:8080/openai/v1/responses"))
            .await
            .expect_err("plaintext");

        assert!(err.is_auth());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn plaintext_allowed_when_opted_in() {
        let calls = Arc::new(AtomicUsize::new(0));
        let policy = BearerTokenPolicy::new(static_credential(), [COGNITIVE_SERVICES_SCOPE])
            .allow_insecure_http(true);
        let service = InterceptLayer::new(policy).layer(echo_auth(Arc::clone(&calls)));

        let response = service
            .oneshot(request("http://localhost:8080/openai/v1/responses"))
            .await
            .expect("response");

        assert_eq!(response.header("x-seen-auth"), Some("Bearer abc"));
    }

    #[tokio::test]
    async fn credential_failure_skips_the_transport() {
        let calls = Arc::new(AtomicUsize::new(0));
        let expired = Arc::new(StaticTokenCredential::new(AccessToken::expiring_at_unix(
            "old", 0,
        )));
        let policy = BearerTokenPolicy::new(expired, [COGNITIVE_SERVICES_SCOPE]);
        let service = InterceptLayer::new(policy).layer(echo_auth(Arc::clone(&calls)));

        let err = service
            .oneshot(request("https://example.openai.azure.com/"))
            .await
            .expect_err("expired");

        assert!(err.is_auth());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn token_fetch_stops_at_the_deadline() {
        let calls = Arc::new(AtomicUsize::new(0));
        let credential: Arc<dyn TokenCredential> = Arc::new(Slow);
        let policy = BearerTokenPolicy::new(credential, [COGNITIVE_SERVICES_SCOPE]);
        let service = InterceptLayer::new(policy).layer(echo_auth(Arc::clone(&calls)));

        let mut request = request("https://example.openai.azure.com/");
        request
            .extensions_mut()
            .insert(Deadline::after(Duration::from_millis(50)));

        let err = service.oneshot(request).await.expect_err("deadline");

        assert!(err.is_timeout());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn debug_lists_scopes() {
        let policy = BearerTokenPolicy::new(static_credential(), [COGNITIVE_SERVICES_SCOPE]);
        assert!(format!("{policy:?}").contains("cognitiveservices"));
        assert_eq!(policy.scopes(), [COGNITIVE_SERVICES_SCOPE]);
    }
}
