//! The Responses API: `POST /responses`, `GET /responses/{id}`, `DELETE /responses/{id}`.

mod client;
mod types;

pub use client::ResponsesClient;
pub use types::{
    ContentPart, CreateResponse, DeletedResponse, IncompleteDetails, Input, InputMessage,
    InputTokensDetails, OutputItem, OutputTokensDetails, ResponseError, ResponseObject,
    ResponseStatus, Role, Usage,
};
