//! Request and response bodies of the Responses API.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ============================================================================
// Request
// ============================================================================

/// Body of `POST /responses`.
///
/// ```ignore
/// let request = CreateResponse::new("gpt-5-mini", "ping").max_output_tokens(1000);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateResponse {
    model: String,
    input: Input,
    #[serde(skip_serializing_if = "Option::is_none")]
    instructions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    previous_response_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    store: Option<bool>,
}

impl CreateResponse {
    /// Ask `model` to respond to `input`.
    pub fn new(model: impl Into<String>, input: impl Into<Input>) -> Self {
        Self {
            model: model.into(),
            input: input.into(),
            instructions: None,
            max_output_tokens: None,
            temperature: None,
            previous_response_id: None,
            store: None,
        }
    }

    /// System-level instructions for this response.
    #[must_use]
    pub fn instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    /// Upper bound on generated tokens, reasoning included.
    #[must_use]
    pub const fn max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = Some(max_output_tokens);
        self
    }

    /// Sampling temperature.
    #[must_use]
    pub const fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Continue the conversation of an earlier stored response.
    #[must_use]
    pub fn previous_response_id(mut self, id: impl Into<String>) -> Self {
        self.previous_response_id = Some(id.into());
        self
    }

    /// Whether the service keeps the response for later retrieval.
    #[must_use]
    pub const fn store(mut self, store: bool) -> Self {
        self.store = Some(store);
        self
    }

    /// The model deployment.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// The input.
    #[must_use]
    pub const fn input(&self) -> &Input {
        &self.input
    }
}

/// Model input: a prompt or a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Input {
    /// A single free-text prompt.
    Text(String),
    /// Role-tagged messages, in conversation order.
    Messages(Vec<InputMessage>),
}

impl From<&str> for Input {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for Input {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Vec<InputMessage>> for Input {
    fn from(messages: Vec<InputMessage>) -> Self {
        Self::Messages(messages)
    }
}

/// One turn of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputMessage {
    /// Who is speaking.
    pub role: Role,
    /// What they say.
    pub content: String,
}

impl InputMessage {
    /// A message with any role.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// A `system` message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// A `user` message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// An `assistant` message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// A `developer` message.
    pub fn developer(content: impl Into<String>) -> Self {
        Self::new(Role::Developer, content)
    }
}

/// Message author. Unknown roles pass through as [`Role::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Role {
    /// `system`
    System,
    /// `user`
    User,
    /// `assistant`
    Assistant,
    /// `developer`
    Developer,
    /// Any other role, sent verbatim.
    Other(String),
}

impl Role {
    /// The wire name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Developer => "developer",
            Self::Other(role) => role,
        }
    }
}

impl From<&str> for Role {
    fn from(role: &str) -> Self {
        match role {
            "system" => Self::System,
            "user" => Self::User,
            "assistant" => Self::Assistant,
            "developer" => Self::Developer,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let role = String::deserialize(deserializer)?;
        Ok(Self::from(role.as_str()))
    }
}

// ============================================================================
// Response
// ============================================================================

/// A response object as returned by create and retrieve.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResponseObject {
    /// Response id, usable with retrieve, delete and `previous_response_id`.
    pub id: String,
    /// Model that produced it.
    #[serde(default)]
    pub model: String,
    /// Generation status.
    pub status: ResponseStatus,
    /// Output items, in order.
    #[serde(default)]
    pub output: Vec<OutputItem>,
    /// Token counters.
    #[serde(default)]
    pub usage: Option<Usage>,
    /// Set when `status` is `failed`.
    #[serde(default)]
    pub error: Option<ResponseError>,
    /// Set when `status` is `incomplete`.
    #[serde(default)]
    pub incomplete_details: Option<IncompleteDetails>,
}

impl ResponseObject {
    /// Every `output_text` part of every message, concatenated in order.
    #[must_use]
    pub fn output_text(&self) -> String {
        self.output
            .iter()
            .filter_map(|item| match item {
                OutputItem::Message { content, .. } => Some(content),
                _ => None,
            })
            .flatten()
            .filter_map(|part| match part {
                ContentPart::OutputText { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Refusals given instead of an answer, if any.
    #[must_use]
    pub fn refusals(&self) -> Vec<&str> {
        self.output
            .iter()
            .filter_map(|item| match item {
                OutputItem::Message { content, .. } => Some(content),
                _ => None,
            })
            .flatten()
            .filter_map(|part| match part {
                ContentPart::Refusal { refusal } => Some(refusal.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// Generation status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    /// Finished normally.
    Completed,
    /// Failed; see [`ResponseObject::error`].
    Failed,
    /// Still generating.
    InProgress,
    /// Stopped early; see [`ResponseObject::incomplete_details`].
    Incomplete,
    /// Cancelled by the caller.
    Cancelled,
    /// Waiting to start.
    Queued,
    /// A status this client does not know.
    #[serde(other)]
    Unknown,
}

impl ResponseStatus {
    /// The wire name; `unknown` for statuses this client does not know.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::InProgress => "in_progress",
            Self::Incomplete => "incomplete",
            Self::Cancelled => "cancelled",
            Self::Queued => "queued",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ResponseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One output item.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputItem {
    /// An assistant message.
    Message {
        /// Item id.
        #[serde(default)]
        id: Option<String>,
        /// Author, normally `assistant`.
        #[serde(default = "assistant")]
        role: Role,
        /// Content parts, in order.
        #[serde(default)]
        content: Vec<ContentPart>,
    },
    /// Reasoning performed by the model; its content is usually withheld.
    Reasoning {
        /// Item id.
        #[serde(default)]
        id: Option<String>,
    },
    /// Tool calls and other item kinds.
    #[serde(other)]
    Other,
}

fn assistant() -> Role {
    Role::Assistant
}

/// One part of a message.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    /// Generated text.
    OutputText {
        /// The text.
        text: String,
    },
    /// The model declined to answer.
    Refusal {
        /// The explanation.
        refusal: String,
    },
    /// Any other part kind.
    #[serde(other)]
    Other,
}

/// Token counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub struct Usage {
    /// Prompt tokens.
    #[serde(default)]
    pub input_tokens: u64,
    /// Generated tokens, reasoning included.
    #[serde(default)]
    pub output_tokens: u64,
    /// Sum of both.
    #[serde(default)]
    pub total_tokens: u64,
    /// Breakdown of input tokens.
    #[serde(default)]
    pub input_tokens_details: InputTokensDetails,
    /// Breakdown of output tokens.
    #[serde(default)]
    pub output_tokens_details: OutputTokensDetails,
}

/// Breakdown of input tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub struct InputTokensDetails {
    /// Tokens served from the prompt cache.
    #[serde(default)]
    pub cached_tokens: u64,
}

/// Breakdown of output tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub struct OutputTokensDetails {
    /// Tokens spent reasoning.
    #[serde(default)]
    pub reasoning_tokens: u64,
}

/// Why a response failed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResponseError {
    /// Machine-readable code.
    #[serde(default)]
    pub code: Option<String>,
    /// Human-readable message.
    pub message: String,
}

/// Why a response stopped early.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IncompleteDetails {
    /// E.g. `max_output_tokens`.
    pub reason: String,
}

/// Body of `DELETE /responses/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeletedResponse {
    /// Id of the deleted response.
    pub id: String,
    /// Whether it was deleted.
    pub deleted: bool,
}

/// Error payload of a non-2xx reply: `{"error": {"message": ...}}`.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub(crate) error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub(crate) message: String,
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};
    use serde_json::json;

    use super::*;

    #[test]
    fn conversation_preserves_order_and_content() {
        let request = CreateResponse::new(
            "gpt-5-mini",
            vec![
                InputMessage::system("You are an Azure cloud architect."),
                InputMessage::user("Design a scalable web application architecture."),
            ],
        )
        .max_output_tokens(1000);

        let body = serde_json::to_value(&request).expect("serialize");

        check!(
            body == json!({
                "model": "gpt-5-mini",
                "input": [
                    {"role": "system", "content": "You are an Azure cloud architect."},
                    {"role": "user", "content": "Design a scalable web application architecture."}
                ],
                "max_output_tokens": 1000
            })
        );
    }

    #[test]
    fn text_input_is_a_string() {
        let body = serde_json::to_value(CreateResponse::new("m", "ping")).expect("serialize");
        check!(body == json!({"model": "m", "input": "ping"}));
    }

    #[test]
    fn unknown_roles_pass_through() {
        let message = InputMessage::new(Role::from("tool"), "x");
        let body = serde_json::to_value(&message).expect("serialize");
        check!(body["role"] == "tool");
        check!(Role::from("user") == Role::User);
    }

    #[test]
    fn output_text_concatenates_message_parts() {
        let response: ResponseObject = serde_json::from_value(json!({
            "id": "resp_1",
            "model": "gpt-5-mini",
            "status": "completed",
            "output": [
                {"type": "reasoning", "id": "rs_1", "summary": []},
                {"type": "message", "id": "msg_1", "role": "assistant", "content": [
                    {"type": "output_text", "text": "po", "annotations": []},
                    {"type": "output_text", "text": "ng", "annotations": []}
                ]},
                {"type": "function_call", "name": "f", "arguments": "{}"}
            ],
            "usage": {
                "input_tokens": 5,
                "output_tokens": 70,
                "total_tokens": 75,
                "input_tokens_details": {"cached_tokens": 0},
                "output_tokens_details": {"reasoning_tokens": 64}
            }
        }))
        .expect("deserialize");

        check!(response.output_text() == "pong");
        check!(response.status == ResponseStatus::Completed);
        check!(response.output.len() == 3);
        check!(response.output[2] == OutputItem::Other);
        let_assert!(Some(usage) = response.usage);
        check!(usage.output_tokens_details.reasoning_tokens == 64);
    }

    #[test]
    fn unknown_status_is_tolerated() {
        let response: ResponseObject =
            serde_json::from_value(json!({"id": "r", "status": "paused"})).expect("deserialize");
        check!(response.status == ResponseStatus::Unknown);
        check!(response.output_text().is_empty());
    }

    #[test]
    fn status_displays_its_wire_name() {
        let response: ResponseObject =
            serde_json::from_value(json!({"id": "r", "status": "in_progress"})).expect("deserialize");
        check!(response.status.to_string() == "in_progress");
        check!(ResponseStatus::Completed.to_string() == "completed");
        check!(ResponseStatus::Unknown.as_str() == "unknown");
    }

    #[test]
    fn refusals_are_collected() {
        let response: ResponseObject = serde_json::from_value(json!({
            "id": "r",
            "status": "completed",
            "output": [{"type": "message", "role": "assistant", "content": [
                {"type": "refusal", "refusal": "no"}
            ]}]
        }))
        .expect("deserialize");
        check!(response.refusals() == ["no"]);
    }
}
