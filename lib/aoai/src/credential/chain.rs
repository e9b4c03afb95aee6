use std::fmt;
use std::sync::{Arc, OnceLock};

use tracing::{debug, info};

use super::{TokenCredential, TokenFuture};
use crate::Error;

/// Tries a list of credentials in order; the first one to issue a token wins.
///
/// The winning source is remembered and used alone for every later call, so
/// a working setup does not pay for probing unavailable sources again. When
/// every source fails, the returned [`Error::Auth`] lists each failure.
pub struct ChainedTokenCredential {
    sources: Vec<Arc<dyn TokenCredential>>,
    selected: OnceLock<usize>,
}

impl ChainedTokenCredential {
    /// Chain `sources`, tried in order.
    #[must_use]
    pub fn new(sources: Vec<Arc<dyn TokenCredential>>) -> Self {
        Self {
            sources,
            selected: OnceLock::new(),
        }
    }

    /// Names of the chained sources, in order.
    #[must_use]
    pub fn source_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|source| source.name()).collect()
    }
}

impl fmt::Debug for ChainedTokenCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainedTokenCredential")
            .field("sources", &self.source_names())
            .field("selected", &self.selected.get())
            .finish()
    }
}

impl TokenCredential for ChainedTokenCredential {
    fn get_token<'a>(&'a self, scopes: &'a [&'a str]) -> TokenFuture<'a> {
        Box::pin(async move {
            if let Some(source) = self
                .selected
                .get()
                .and_then(|&index| self.sources.get(index))
            {
                return source.get_token(scopes).await;
            }

            let mut failures = Vec::with_capacity(self.sources.len());
            for (index, source) in self.sources.iter().enumerate() {
                match source.get_token(scopes).await {
                    Ok(token) => {
                        info!(credential = source.name(), "selected credential source");
                        // A concurrent caller may win the race; its index names a working source too
                        let _ = self.selected.set(index);
                        return Ok(token);
                    }
                    Err(err) => {
                        debug!(credential = source.name(), error = %err, "credential source unavailable");
                        failures.push(format!("{}: {err}", source.name()));
                    }
                }
            }

            if failures.is_empty() {
                return Err(Error::auth("no credential source configured"));
            }
            Err(Error::auth(format!(
                "no credential source could issue a token ({})",
                failures.join("; ")
            )))
        })
    }

    fn name(&self) -> &'static str {
        "ChainedTokenCredential"
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use secrecy::ExposeSecret;

    use super::*;
    use crate::credential::{AccessToken, COGNITIVE_SERVICES_SCOPE};

    #[derive(Debug)]
    struct Source {
        name: &'static str,
        token: Option<&'static str>,
        calls: AtomicUsize,
    }

    impl Source {
        fn ok(name: &'static str, token: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                token: Some(token),
                calls: AtomicUsize::new(0),
            })
        }

        fn unavailable(name: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                token: None,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl TokenCredential for Source {
        fn get_token<'a>(&'a self, _scopes: &'a [&'a str]) -> TokenFuture<'a> {
            Box::pin(async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                self.token
                    .map(|token| AccessToken::expiring_in(token, Duration::from_secs(3600)))
                    .ok_or_else(|| Error::auth("not logged in"))
            })
        }

        fn name(&self) -> &'static str {
            self.name
        }
    }

    const SCOPES: &[&str] = &[COGNITIVE_SERVICES_SCOPE];

    #[tokio::test]
    async fn skips_unavailable_sources() {
        let first = Source::unavailable("first");
        let second = Source::ok("second", "from-second");
        let third = Source::ok("third", "from-third");
        let chain = ChainedTokenCredential::new(vec![first.clone(), second.clone(), third.clone()]);

        let token = chain.get_token(SCOPES).await.expect("token");

        assert_eq!(token.token().expose_secret(), "from-second");
        assert_eq!(third.calls(), 0);
    }

    #[tokio::test]
    async fn remembers_the_winning_source() {
        let first = Source::unavailable("first");
        let second = Source::ok("second", "from-second");
        let chain = ChainedTokenCredential::new(vec![first.clone(), second.clone()]);

        chain.get_token(SCOPES).await.expect("first call");
        chain.get_token(SCOPES).await.expect("second call");

        assert_eq!(first.calls(), 1);
        assert_eq!(second.calls(), 2);
    }

    #[tokio::test]
    async fn lists_every_failure() {
        let chain = ChainedTokenCredential::new(vec![
            Source::unavailable("EnvironmentCredential"),
            Source::unavailable("AzureCliCredential"),
        ]);

        let err = chain.get_token(SCOPES).await.expect_err("all fail");
        let msg = err.to_string();

        assert!(err.is_auth());
        assert!(msg.contains("EnvironmentCredential: authentication error: not logged in"));
        assert!(msg.contains("AzureCliCredential"));
    }

    #[tokio::test]
    async fn empty_chain_is_an_auth_error() {
        let chain = ChainedTokenCredential::new(Vec::new());
        assert!(chain.get_token(SCOPES).await.expect_err("empty").is_auth());
    }
}
