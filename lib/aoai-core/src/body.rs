//! Body serialization utilities.

use bytes::Bytes;

use crate::Result;

/// Content type for request bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    /// JSON content type (`application/json`), used by the Responses API.
    Json,
    /// Form URL-encoded content type (`application/x-www-form-urlencoded`),
    /// used by OAuth2 token endpoints.
    FormUrlEncoded,
}

impl ContentType {
    /// Get the MIME type string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::FormUrlEncoded => "application/x-www-form-urlencoded",
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Serialize a value to JSON bytes.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
///
/// # Example
///
/// ```
/// use aoai_core::to_json;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Prompt { input: String }
///
/// let prompt = Prompt { input: "ping".to_string() };
/// let bytes = to_json(&prompt).expect("serialize");
/// assert_eq!(bytes.as_ref(), br#"{"input":"ping"}"#);
/// ```
pub fn to_json<T: serde::Serialize>(value: &T) -> Result<Bytes> {
    serde_json::to_vec(value)
        .map(Bytes::from)
        .map_err(Into::into)
}

/// Serialize a value to form URL-encoded bytes.
///
/// # Errors
///
/// Returns an error if form serialization fails.
///
/// # Example
///
/// ```
/// use aoai_core::to_form;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Grant<'a> { grant_type: &'a str, scope: &'a str }
///
/// let grant = Grant { grant_type: "client_credentials", scope: "api://x/.default" };
/// let bytes = to_form(&grant).expect("serialize");
/// assert_eq!(bytes.as_ref(), b"grant_type=client_credentials&scope=api%3A%2F%2Fx%2F.default");
/// ```
pub fn to_form<T: serde::Serialize>(value: &T) -> Result<Bytes> {
    serde_html_form::to_string(value)
        .map(|s| Bytes::from(s.into_bytes()))
        .map_err(Into::into)
}

/// Deserialize JSON bytes to a value with path-aware error messages.
///
/// Uses `serde_path_to_error` so that a failure deep inside a response
/// (e.g. `usage.output_tokens_details.reasoning_tokens`) names the field.
///
/// # Errors
///
/// Returns an error if JSON deserialization fails.
pub fn from_json<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let mut deserializer = serde_json::Deserializer::from_slice(bytes);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
        crate::Error::json_deserialization(e.path().to_string(), e.inner().to_string())
    })
}
