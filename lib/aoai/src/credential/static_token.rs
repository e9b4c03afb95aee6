use secrecy::ExposeSecret;

use super::{AccessToken, TokenCredential, TokenFuture};

/// A credential that always returns the same token.
///
/// Useful when the token is managed outside this process, and in tests.
/// Once the token has expired every call fails: there is nothing to refresh it from.
#[derive(Debug, Clone)]
pub struct StaticTokenCredential {
    token: AccessToken,
}

impl StaticTokenCredential {
    /// Create a credential returning `token`.
    #[must_use]
    pub const fn new(token: AccessToken) -> Self {
        Self { token }
    }
}

impl TokenCredential for StaticTokenCredential {
    fn get_token<'a>(&'a self, _scopes: &'a [&'a str]) -> TokenFuture<'a> {
        Box::pin(async move {
            if self.token.is_expired() || self.token.token().expose_secret().is_empty() {
                return Err(crate::Error::auth("static token is empty or expired"));
            }
            Ok(self.token.clone())
        })
    }

    fn name(&self) -> &'static str {
        "StaticTokenCredential"
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::credential::COGNITIVE_SERVICES_SCOPE;

    #[tokio::test]
    async fn returns_the_token() {
        let credential =
            StaticTokenCredential::new(AccessToken::expiring_in("t", Duration::from_secs(60)));

        let token = credential
            .get_token(&[COGNITIVE_SERVICES_SCOPE])
            .await
            .expect("token");
        assert_eq!(token.token().expose_secret(), "t");
    }

    #[tokio::test]
    async fn expired_token_is_an_auth_error() {
        let credential = StaticTokenCredential::new(AccessToken::expiring_at_unix("t", 0));

        let err = credential
            .get_token(&[COGNITIVE_SERVICES_SCOPE])
            .await
            .expect_err("expired");
        assert!(err.is_auth());
    }
}
