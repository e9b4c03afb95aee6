//! Azure OpenAI Responses API client with pluggable Tower authentication.
//!
//! Requests go through a Tower middleware stack on top of a hyper/rustls
//! transport. Authentication is one more layer in that stack: either a
//! static resource key ([`middleware::ApiKeyLayer`]) or bearer tokens from a
//! [`credential::TokenCredential`] ([`middleware::BearerTokenPolicy`]).
//!
//! # Example
//!
//! ```ignore
//! use aoai::prelude::*;
//!
//! let settings = Settings::from_env(AuthMode::Entra)?;
//! let client = AzureOpenAi::connect(&settings);
//!
//! let request = CreateResponse::new(settings.model(), "ping")
//!     .max_output_tokens(settings.max_output_tokens());
//! let response = client.create(&request).await?;
//! println!("{}", response.output_text());
//! ```
//!
//! Building the stack by hand:
//!
//! ```ignore
//! use std::sync::Arc;
//! use aoai::{ApiClient, HyperClient};
//! use aoai::credential::{COGNITIVE_SERVICES_SCOPE, DefaultAzureCredential};
//! use aoai::responses::ResponsesClient;
//!
//! let http = HyperClient::builder()
//!     .with_bearer_token(Arc::new(DefaultAzureCredential::new()), [COGNITIVE_SERVICES_SCOPE])
//!     .with_retry(3)
//!     .with_logging()
//!     .build();
//! let client = ResponsesClient::new(ApiClient::new(http, "https://my-resource.openai.azure.com/openai/v1/")?);
//! ```

mod api_client;
mod client;
mod config;
mod connect;
mod connector;
pub mod credential;
pub mod middleware;
pub mod prelude;
pub mod responses;
pub mod settings;

pub use api_client::ApiClient;
pub use client::{BoxedService, HyperClient, HyperClientBuilder, ServiceFuture};
pub use config::{ClientConfig, ClientConfigBuilder, DEFAULT_USER_AGENT};
pub use connect::AzureOpenAi;

// Re-export tower for middleware composition
pub use tower;

pub use aoai_core::{
    ContentType, Deadline, EndpointClient, Error, HttpClient, Method, Request, RequestBuilder,
    Response, Result, StatusCode, from_json, header, to_form, to_json,
};
pub use url;
