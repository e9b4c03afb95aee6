//! Tower middleware layers for the aoai HTTP client.
//!
//! Layers are applied in the order they are added to the
//! [`HyperClientBuilder`](crate::HyperClientBuilder): the last layer added
//! is the outermost and sees a request first. The usual stack, innermost
//! first, is authentication, then retry, then logging, so that every
//! attempt carries its own credentials and the log records one line per call.
//!
//! # Available Layers
//!
//! - [`ApiKeyLayer`] - Adds the `api-key` header
//! - [`BearerTokenLayer`] - Adds `Authorization: Bearer <token>` from a [`TokenCredential`](crate::credential::TokenCredential)
//! - [`LoggingLayer`] - Logs requests/responses using `tracing`, credentials redacted
//! - [`RetryPolicy`] - Retry policy for [`RetryLayer`]
//! - [`InterceptLayer`] - Turns a policy-shaped [`Interceptor`] into a layer
//!
//! # Example
//!
//! ```ignore
//! use aoai::HyperClient;
//!
//! let client = HyperClient::builder()
//!     .with_api_key(key)
//!     .with_retry(3)
//!     .with_logging()
//!     .build();
//! ```

mod api_key;
mod bearer_token;
mod intercept;
mod logging;
mod retry;

pub use api_key::{API_KEY_HEADER, ApiKey, ApiKeyLayer};
pub use bearer_token::{BearerTokenLayer, BearerTokenPolicy};
pub use intercept::{Intercept, InterceptLayer, Interceptor, Next};
pub use logging::{LogLevel, Logging, LoggingLayer};
pub use retry::{DEFAULT_BASE_DELAY, RetryPolicy};

pub use tower::retry::RetryLayer;
pub use tower::{Layer, ServiceBuilder};
