use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Tag under which endpoints without tags are listed
pub const DEFAULT_TAG: &str = "Default";

/// One documented endpoint as served by the endpoint registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointDefinition {
    /// Channel the procedure is registered on
    pub channel: String,
    /// Procedure topic (its URI)
    pub topic: String,
    #[serde(default)]
    pub title: String,
    /// Tag labels in the order they were received
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub description: String,
    /// JSON Schema of the payload
    #[serde(default = "unconstrained_schema")]
    pub payload_json_schema: Value,
    /// JSON Schema of the return value, absent for procedures returning nothing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_json_schema: Option<Value>,
}

fn unconstrained_schema() -> Value {
    Value::Bool(true)
}

impl EndpointDefinition {
    /// Create an endpoint with an unconstrained payload and no return value
    pub fn new(channel: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            topic: topic.into(),
            title: String::new(),
            tags: Vec::new(),
            description: String::new(),
            payload_json_schema: unconstrained_schema(),
            return_json_schema: None,
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_schemas(mut self, payload: Value, returns: Option<Value>) -> Self {
        self.payload_json_schema = payload;
        self.return_json_schema = returns.filter(|schema| !schema.is_null());
        self
    }

    /// `topic/channel`, the form routes are announced in
    pub fn route(&self) -> String {
        format!("{}/{}", self.topic, self.channel)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        if self.tags.is_empty() {
            return tag == DEFAULT_TAG;
        }
        self.tags.iter().any(|t| t == tag)
    }

    /// Tags used for grouping: the received tags, or [`DEFAULT_TAG`] when there are none
    pub fn display_tags(&self) -> Vec<&str> {
        if self.tags.is_empty() {
            vec![DEFAULT_TAG]
        } else {
            self.tags.iter().map(String::as_str).collect()
        }
    }
}
