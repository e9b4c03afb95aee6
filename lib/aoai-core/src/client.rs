//! HTTP client traits.
//!
//! - [`HttpClient`] - Low-level HTTP execution
//! - [`EndpointClient`] - HTTP execution bound to a service base URL
//!
//! The transport and every middleware stack built on it implement
//! [`HttpClient`]; the Responses API client only needs an [`EndpointClient`],
//! which makes it easy to swap in a recording client in tests.

use std::future::Future;

use bytes::Bytes;
use url::Url;

use crate::{Request, Response, Result};

/// Core HTTP client trait.
///
/// This trait defines the interface for executing HTTP requests.
/// Implementations should be async-first and support connection pooling.
pub trait HttpClient: Send + Sync {
    /// Execute an HTTP request and return the response.
    ///
    /// Non-2xx statuses are returned as responses, not errors; turning them
    /// into [`crate::Error::Http`] is up to the caller.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails for any reason:
    /// - Authentication (token could not be obtained)
    /// - Network errors
    /// - TLS errors
    /// - Timeouts
    fn execute(
        &self,
        request: Request<Bytes>,
    ) -> impl Future<Output = Result<Response<Bytes>>> + Send;
}

/// An [`HttpClient`] bound to a service base URL.
///
/// # Example
///
/// ```ignore
/// use aoai_core::{EndpointClient, Request, Response, Result};
/// use bytes::Bytes;
/// use url::Url;
///
/// #[derive(Clone)]
/// struct Recording {
///     base_url: Url,
///     sent: Arc<Mutex<Vec<Request>>>,
/// }
///
/// impl EndpointClient for Recording {
///     async fn execute(&self, request: Request<Bytes>) -> Result<Response<Bytes>> {
///         self.sent.lock().unwrap().push(request);
///         Ok(Response::new(200, HashMap::new(), Bytes::from_static(b"{}")))
///     }
///
///     fn base_url(&self) -> &Url {
///         &self.base_url
///     }
/// }
/// ```
pub trait EndpointClient: Clone + Send + Sync {
    /// Execute an HTTP request and return the response.
    ///
    /// # Errors
    ///
    /// Same as [`HttpClient::execute`].
    fn execute(
        &self,
        request: Request<Bytes>,
    ) -> impl Future<Output = Result<Response<Bytes>>> + Send;

    /// Get the base URL for this client.
    ///
    /// All API paths are resolved relative to this URL, which always ends
    /// with a `/`.
    fn base_url(&self) -> &Url;
}
