use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use super::{AccessToken, TokenCredential, TokenFuture, lifetime};

/// Tokens are refreshed once they expire within this window.
pub const DEFAULT_REFRESH_WINDOW: Duration = Duration::from_secs(5 * 60);

/// Caches the tokens of an inner credential until they near expiry.
///
/// Tokens are keyed by their scope set. Reads are concurrent; a refresh is
/// coordinated so that any number of callers hitting a cold or stale cache
/// at the same time produce a single call to the inner credential.
///
/// When a refresh fails while the cached token is still valid (inside the
/// refresh window but not expired), the cached token is returned.
#[derive(Debug)]
pub struct CachedCredential<C> {
    inner: C,
    refresh_window: Duration,
    tokens: RwLock<HashMap<String, AccessToken>>,
    refresh: Mutex<()>,
}

impl<C> CachedCredential<C> {
    /// Cache the tokens of `inner` with the default refresh window.
    pub fn new(inner: C) -> Self {
        Self::with_refresh_window(inner, DEFAULT_REFRESH_WINDOW)
    }

    /// Cache the tokens of `inner`, refreshing them `refresh_window` before expiry.
    pub fn with_refresh_window(inner: C, refresh_window: Duration) -> Self {
        Self {
            inner,
            refresh_window,
            tokens: RwLock::new(HashMap::new()),
            refresh: Mutex::new(()),
        }
    }

    /// The wrapped credential.
    pub const fn inner(&self) -> &C {
        &self.inner
    }

    /// Drop every cached token.
    pub async fn clear(&self) {
        self.tokens.write().await.clear();
    }

    async fn cached(&self, key: &str) -> Option<AccessToken> {
        self.tokens.read().await.get(key).cloned()
    }

    fn is_fresh(&self, token: &AccessToken) -> bool {
        !token.expires_within(self.refresh_window)
    }
}

impl<C: TokenCredential> TokenCredential for CachedCredential<C> {
    fn get_token<'a>(&'a self, scopes: &'a [&'a str]) -> TokenFuture<'a> {
        Box::pin(async move {
            let key = scopes.join(" ");

            if let Some(token) = self.cached(&key).await
                && self.is_fresh(&token)
            {
                return Ok(token);
            }

            let _refresh = self.refresh.lock().await;

            // Another caller may have refreshed while we waited
            let stale = self.cached(&key).await;
            if let Some(token) = &stale
                && self.is_fresh(token)
            {
                return Ok(token.clone());
            }

            debug!(credential = self.inner.name(), scopes = %key, "refreshing token");
            match self.inner.get_token(scopes).await {
                Ok(token) => {
                    debug!(
                        credential = self.inner.name(),
                        expires_in_secs = lifetime(&token).as_secs(),
                        "token refreshed"
                    );
                    self.tokens.write().await.insert(key, token.clone());
                    Ok(token)
                }
                Err(err) => match stale {
                    Some(token) if !token.is_expired() => {
                        warn!(
                            credential = self.inner.name(),
                            error = %err,
                            "token refresh failed, using cached token"
                        );
                        Ok(token)
                    }
                    _ => Err(err),
                },
            }
        })
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use futures_util::future::join_all;
    use secrecy::ExposeSecret;

    use super::*;
    use crate::Error;
    use crate::credential::COGNITIVE_SERVICES_SCOPE;

    /// Issues `token-<n>` with a fixed lifetime and counts fetches.
    #[derive(Debug)]
    struct Counting {
        fetches: AtomicUsize,
        lifetime: Duration,
        fail_from: Option<usize>,
    }

    impl Counting {
        fn new(lifetime: Duration) -> Self {
            Self {
                fetches: AtomicUsize::new(0),
                lifetime,
                fail_from: None,
            }
        }

        fn fetches(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    impl TokenCredential for Counting {
        fn get_token<'a>(&'a self, _scopes: &'a [&'a str]) -> TokenFuture<'a> {
            Box::pin(async move {
                let n = self.fetches.fetch_add(1, Ordering::SeqCst) + 1;
                // Give concurrent callers a chance to pile up behind the refresh
                tokio::time::sleep(Duration::from_millis(20)).await;
                if self.fail_from.is_some_and(|from| n >= from) {
                    return Err(Error::auth("identity endpoint unavailable"));
                }
                Ok(AccessToken::expiring_in(format!("token-{n}"), self.lifetime))
            })
        }

        fn name(&self) -> &'static str {
            "Counting"
        }
    }

    const SCOPES: &[&str] = &[COGNITIVE_SERVICES_SCOPE];

    #[tokio::test]
    async fn concurrent_callers_share_one_fetch() {
        let credential = Arc::new(CachedCredential::new(Counting::new(Duration::from_secs(3600))));

        let calls = (0..16).map(|_| {
            let credential = Arc::clone(&credential);
            tokio::spawn(async move { credential.get_token(SCOPES).await })
        });
        let tokens = join_all(calls).await;

        for token in tokens {
            let token = token.expect("join").expect("token");
            assert_eq!(token.token().expose_secret(), "token-1");
        }
        assert_eq!(credential.inner().fetches(), 1);
    }

    #[tokio::test]
    async fn fresh_token_is_reused() {
        let credential = CachedCredential::new(Counting::new(Duration::from_secs(3600)));

        credential.get_token(SCOPES).await.expect("first");
        credential.get_token(SCOPES).await.expect("second");

        assert_eq!(credential.inner().fetches(), 1);
    }

    #[tokio::test]
    async fn token_inside_refresh_window_is_refetched() {
        // Every issued token already sits inside the 5 minute window
        let credential = CachedCredential::new(Counting::new(Duration::from_secs(60)));

        let first = credential.get_token(SCOPES).await.expect("first");
        let second = credential.get_token(SCOPES).await.expect("second");

        assert_eq!(first.token().expose_secret(), "token-1");
        assert_eq!(second.token().expose_secret(), "token-2");
        assert_eq!(credential.inner().fetches(), 2);
    }

    #[tokio::test]
    async fn scopes_are_cached_separately() {
        let credential = CachedCredential::new(Counting::new(Duration::from_secs(3600)));

        credential.get_token(&["api://one/.default"]).await.expect("one");
        credential.get_token(&["api://two/.default"]).await.expect("two");
        credential.get_token(&["api://one/.default"]).await.expect("one again");

        assert_eq!(credential.inner().fetches(), 2);
    }

    #[tokio::test]
    async fn failed_refresh_falls_back_to_valid_token() {
        let mut inner = Counting::new(Duration::from_secs(60));
        inner.fail_from = Some(2);
        let credential = CachedCredential::new(inner);

        credential.get_token(SCOPES).await.expect("first");
        let token = credential.get_token(SCOPES).await.expect("stale but valid");

        assert_eq!(token.token().expose_secret(), "token-1");
    }

    #[tokio::test]
    async fn failure_without_cached_token_surfaces() {
        let mut inner = Counting::new(Duration::from_secs(3600));
        inner.fail_from = Some(1);
        let credential = CachedCredential::new(inner);

        let err = credential.get_token(SCOPES).await.expect_err("no token");
        assert!(err.is_auth());
    }

    #[tokio::test]
    async fn clear_forces_a_fetch() {
        let credential = CachedCredential::new(Counting::new(Duration::from_secs(3600)));

        credential.get_token(SCOPES).await.expect("first");
        credential.clear().await;
        credential.get_token(SCOPES).await.expect("second");

        assert_eq!(credential.inner().fetches(), 2);
    }
}
