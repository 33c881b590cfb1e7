//! Model responses arrive in several shapes depending on provider and API
//! version. `ModelResponse::into_text` picks the generated text out of any of
//! them in a fixed priority order.

use serde_json::Value as JsonValue;

#[derive(Debug, Clone, PartialEq)]
pub enum ModelResponse {
    /// Already plain text.
    Text(String),
    /// A decoded JSON body.
    Json(JsonValue),
}

impl ModelResponse {
    /// Extract the generated text.
    ///
    /// Priority: plain string, top-level `text`, the first candidate's
    /// content parts (concatenated), the first candidate's `content` or
    /// `output` string, and finally the raw JSON.
    pub fn into_text(self) -> String {
        match self {
            ModelResponse::Text(text) => text,
            ModelResponse::Json(body) => text_from_json(&body),
        }
    }
}

impl From<String> for ModelResponse {
    fn from(text: String) -> Self {
        ModelResponse::Text(text)
    }
}

impl From<JsonValue> for ModelResponse {
    fn from(body: JsonValue) -> Self {
        ModelResponse::Json(body)
    }
}

fn text_from_json(body: &JsonValue) -> String {
    if let Some(text) = body.as_str() {
        return text.to_string();
    }

    if let Some(text) = non_empty_str(body.get("text")) {
        return text.to_string();
    }

    if let Some(first) = body
        .get("candidates")
        .and_then(JsonValue::as_array)
        .and_then(|c| c.first())
    {
        let parts: String = first
            .pointer("/content/parts")
            .and_then(JsonValue::as_array)
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|p| p.get("text").and_then(JsonValue::as_str))
                    .collect()
            })
            .unwrap_or_default();
        if !parts.is_empty() {
            return parts;
        }

        if let Some(text) = non_empty_str(first.get("content")) {
            return text.to_string();
        }
        if let Some(text) = non_empty_str(first.get("output")) {
            return text.to_string();
        }
    }

    body.to_string()
}

fn non_empty_str(value: Option<&JsonValue>) -> Option<&str> {
    value
        .and_then(JsonValue::as_str)
        .filter(|s| !s.is_empty())
}
