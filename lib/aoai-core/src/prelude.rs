//! Prelude module for convenient imports.
//!
//! ```ignore
//! use aoai_core::prelude::*;
//! ```

pub use crate::{
    ContentType, Deadline, EndpointClient, Error, HttpClient, Method, Request, RequestBuilder,
    Response, Result, from_json, to_form, to_json,
};
