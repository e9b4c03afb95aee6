//! Binds an [`HttpClient`] to a service base URL.

use std::future::Future;

use bytes::Bytes;
use url::Url;

use crate::{EndpointClient, Error, HttpClient, Request, Response, Result};

/// An [`HttpClient`] together with the base URL of the service it talks to.
///
/// Cloning is cheap when the client is: [`HyperClient`](crate::HyperClient)
/// clones share one connection pool and middleware stack.
///
/// # Example
///
/// ```ignore
/// use aoai::{ApiClient, HyperClient};
///
/// let http = HyperClient::builder().with_api_key(key).build();
/// let api = ApiClient::new(http, "https://my-resource.openai.azure.com/openai/v1/")?;
/// ```
#[derive(Debug, Clone)]
pub struct ApiClient<C> {
    client: C,
    base_url: Url,
}

impl<C> ApiClient<C> {
    /// Parse `base_url` and bind `client` to it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if the URL cannot be parsed.
    pub fn new(client: C, base_url: impl AsRef<str>) -> Result<Self> {
        let base_url = Url::parse(base_url.as_ref()).map_err(Error::InvalidUrl)?;
        Ok(Self::with_url(client, base_url))
    }

    /// Bind `client` to an already parsed URL.
    ///
    /// A trailing `/` is added to the path if missing, so that relative
    /// paths resolve below it.
    #[must_use]
    pub fn with_url(client: C, mut base_url: Url) -> Self {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self { client, base_url }
    }

    /// The wrapped HTTP client.
    #[must_use]
    pub const fn inner(&self) -> &C {
        &self.client
    }

    /// Consume the wrapper and return the HTTP client.
    #[must_use]
    pub fn into_inner(self) -> C {
        self.client
    }
}

impl<C> EndpointClient for ApiClient<C>
where
    C: HttpClient + Clone,
{
    fn execute(
        &self,
        request: Request<Bytes>,
    ) -> impl Future<Output = Result<Response<Bytes>>> + Send {
        self.client.execute(request)
    }

    fn base_url(&self) -> &Url {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_added() {
        let api = ApiClient::new((), "https://example.openai.azure.com/openai/v1").expect("url");
        assert_eq!(
            api.base_url.as_str(),
            "https://example.openai.azure.com/openai/v1/"
        );
        assert_eq!(
            api.base_url.join("responses").expect("join").as_str(),
            "https://example.openai.azure.com/openai/v1/responses"
        );
    }

    #[test]
    fn invalid_url_is_rejected() {
        let err = ApiClient::new((), "not a url").expect_err("invalid");
        assert!(matches!(err, Error::InvalidUrl(_)));
    }
}
