use std::time::Duration;

use aoai_core::{Deadline, EndpointClient, Method, Request, Response};
use bytes::Bytes;
use http::StatusCode;
use tracing::debug;
use url::Url;

use super::types::{CreateResponse, DeletedResponse, ErrorEnvelope, ResponseObject};
use crate::{Error, Result};

/// Client of the Responses API.
///
/// Generic over the [`EndpointClient`] so that tests can substitute the
/// transport; in production this is an [`ApiClient`](crate::ApiClient) over a
/// [`HyperClient`](crate::HyperClient), see [`AzureOpenAi`](crate::AzureOpenAi).
///
/// Non-2xx replies become [`Error::Http`] carrying the service's error
/// message and the raw body.
#[derive(Debug, Clone)]
pub struct ResponsesClient<C> {
    client: C,
    timeout: Option<Duration>,
}

impl<C: EndpointClient> ResponsesClient<C> {
    /// Call the Responses API through `client`.
    pub const fn new(client: C) -> Self {
        Self {
            client,
            timeout: None,
        }
    }

    /// Bound every call by `timeout`, token fetch and retries included.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The underlying endpoint client.
    pub const fn endpoint(&self) -> &C {
        &self.client
    }

    /// Generate a response.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] for a non-2xx reply, [`Error::Auth`] when no
    /// credential is available, [`Error::Timeout`] when the per-call timeout
    /// passes, and transport or decoding errors otherwise.
    pub async fn create(&self, request: &CreateResponse) -> Result<ResponseObject> {
        let request = self
            .request(Method::Post, &["responses"])?
            .header("Accept", "application/json")
            .json(request)?
            .build();
        self.send(request).await?.json()
    }

    /// Fetch a stored response by id.
    ///
    /// # Errors
    ///
    /// Same as [`Self::create`]; an unknown id gives a 404 [`Error::Http`].
    pub async fn retrieve(&self, id: &str) -> Result<ResponseObject> {
        let request = self
            .request(Method::Get, &["responses", id])?
            .header("Accept", "application/json")
            .build();
        self.send(request).await?.json()
    }

    /// Delete a stored response.
    ///
    /// # Errors
    ///
    /// Same as [`Self::retrieve`].
    pub async fn delete(&self, id: &str) -> Result<DeletedResponse> {
        let request = self
            .request(Method::Delete, &["responses", id])?
            .header("Accept", "application/json")
            .build();
        self.send(request).await?.json()
    }

    fn url(&self, segments: &[&str]) -> Result<Url> {
        let base = self.client.base_url();
        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|()| Error::invalid_request(format!("base URL '{base}' cannot be a base")))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<aoai_core::RequestBuilder<Bytes>> {
        let mut builder = Request::builder(method, self.url(segments)?);
        if let Some(timeout) = self.timeout {
            builder = builder.extension(Deadline::after(timeout));
        }
        Ok(builder)
    }

    async fn send(&self, request: Request<Bytes>) -> Result<Response<Bytes>> {
        let method = request.method();
        let response = self.client.execute(request).await?;
        if response.is_success() {
            return Ok(response);
        }

        let status = response.status();
        let message = remote_message(&response).unwrap_or_else(|| canonical_reason(status));
        debug!(%method, status, %message, "responses API returned an error");
        Err(Error::http_with_body(status, message, response.into_body()))
    }
}

fn remote_message(response: &Response<Bytes>) -> Option<String> {
    serde_json::from_slice::<ErrorEnvelope>(response.body())
        .ok()
        .map(|envelope| envelope.error.message)
}

fn canonical_reason(status: u16) -> String {
    StatusCode::from_u16(status)
        .ok()
        .and_then(|status| status.canonical_reason())
        .unwrap_or("unexpected status")
        .to_string()
}
