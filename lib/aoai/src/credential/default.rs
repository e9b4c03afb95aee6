use std::sync::Arc;

use tracing::debug;

use super::{
    AzureCliCredential, CachedCredential, ChainedTokenCredential, ClientSecretCredential,
    ManagedIdentityCredential, TokenCredential, TokenFuture,
};
use crate::HyperClient;

/// The usual credential chain for code that runs both on a laptop and on Azure.
///
/// Sources are tried in this order, the first success being kept:
///
/// 1. [`ClientSecretCredential`] when `AZURE_TENANT_ID`, `AZURE_CLIENT_ID`
///    and `AZURE_CLIENT_SECRET` are set
/// 2. [`ManagedIdentityCredential`]
/// 3. [`AzureCliCredential`]
///
/// Tokens are cached and refreshed ahead of expiry.
#[derive(Debug)]
pub struct DefaultAzureCredential {
    inner: CachedCredential<ChainedTokenCredential>,
}

impl DefaultAzureCredential {
    /// Build the chain from the process environment.
    #[must_use]
    pub fn new() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the chain, reading environment variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut sources: Vec<Arc<dyn TokenCredential>> = Vec::with_capacity(3);

        match ClientSecretCredential::from_lookup(HyperClient::new(), lookup) {
            Ok(credential) => sources.push(Arc::new(credential)),
            Err(err) => debug!(error = %err, "client secret credential not configured"),
        }
        sources.push(Arc::new(ManagedIdentityCredential::new()));
        sources.push(Arc::new(AzureCliCredential::new()));

        Self {
            inner: CachedCredential::new(ChainedTokenCredential::new(sources)),
        }
    }

    /// Names of the chained sources, in order.
    #[must_use]
    pub fn source_names(&self) -> Vec<&'static str> {
        self.inner.inner().source_names()
    }
}

impl Default for DefaultAzureCredential {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenCredential for DefaultAzureCredential {
    fn get_token<'a>(&'a self, scopes: &'a [&'a str]) -> TokenFuture<'a> {
        self.inner.get_token(scopes)
    }

    fn name(&self) -> &'static str {
        "DefaultAzureCredential"
    }
}
