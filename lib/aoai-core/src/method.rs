//! HTTP method types.

use derive_more::Display;

/// HTTP request method.
///
/// Only the methods spoken by the Responses API and the identity endpoints
/// are modelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Method {
    /// GET method - retrieve a resource (stored responses, managed identity tokens).
    #[display("GET")]
    Get,
    /// POST method - create a response, request a token.
    #[display("POST")]
    Post,
    /// DELETE method - remove a stored response.
    #[display("DELETE")]
    Delete,
}

impl Method {
    /// Returns `true` if replaying the request cannot create a second resource.
    #[must_use]
    pub const fn is_idempotent(&self) -> bool {
        matches!(self, Self::Get | Self::Delete)
    }
}

impl From<Method> for http::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => Self::GET,
            Method::Post => Self::POST,
            Method::Delete => Self::DELETE,
        }
    }
}

impl TryFrom<http::Method> for Method {
    type Error = crate::Error;

    fn try_from(method: http::Method) -> Result<Self, Self::Error> {
        match method {
            http::Method::GET => Ok(Self::Get),
            http::Method::POST => Ok(Self::Post),
            http::Method::DELETE => Ok(Self::Delete),
            other => Err(crate::Error::invalid_request(format!(
                "unsupported HTTP method: {other}"
            ))),
        }
    }
}
