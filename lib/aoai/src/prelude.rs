//! Commonly used types, for glob importing:
//!
//! ```ignore
//! use aoai::prelude::*;
//! ```

pub use crate::credential::{
    AccessToken, COGNITIVE_SERVICES_SCOPE, DefaultAzureCredential, StaticTokenCredential,
    TokenCredential,
};
pub use crate::responses::{CreateResponse, Input, InputMessage, ResponseObject, ResponsesClient, Role};
pub use crate::settings::{AuthMode, Settings};
pub use crate::{
    ApiClient, AzureOpenAi, ClientConfig, Deadline, EndpointClient, Error, HttpClient,
    HyperClient, Result,
};
