//! Core types and traits for the aoai Azure OpenAI client.
//!
//! This crate provides the transport-agnostic types used by `aoai`:
//! - [`Method`] - HTTP method enum
//! - [`Request`] and [`RequestBuilder`] - HTTP request types
//! - [`Response`] - HTTP response type
//! - [`Error`] and [`Result`] - Error handling
//! - [`HttpClient`] - Core client trait for HTTP execution
//! - [`EndpointClient`] - Client trait with base URL support
//! - [`Deadline`] - Per-call deadline propagated as a request extension
//! - [`StatusCode`] - HTTP status codes (re-exported from `http` crate)
//! - [`header`] - HTTP header names (re-exported from `http` crate)

mod body;
mod client;
mod deadline;
mod error;
mod method;
pub mod prelude;
mod request;
mod response;

pub use body::{ContentType, from_json, to_form, to_json};
pub use client::{EndpointClient, HttpClient};
pub use deadline::Deadline;
pub use error::{Error, Result};
pub use method::Method;
pub use request::{Request, RequestBuilder};
pub use response::Response;

// Re-export http crate types for status codes and headers
pub use http::{StatusCode, header};
