//! Normalization of model-server payloads into answer text.

use serde_json::Value;
use std::fmt;

/// Payload shape a response was recognized as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    /// `{"message": {"content": "..."}}`
    ChatMessage,
    /// `{"response": "..."}`
    GeneratedText,
    /// `{"content": "..."}`
    FlatContent,
    /// `{"choices": [{"message": {"content": "..."}}]}`
    Choices,
}

impl fmt::Display for ResponseShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseShape::ChatMessage => write!(f, "chat_message"),
            ResponseShape::GeneratedText => write!(f, "generated_text"),
            ResponseShape::FlatContent => write!(f, "flat_content"),
            ResponseShape::Choices => write!(f, "choices"),
        }
    }
}

/// Extract answer text from a decoded payload.
///
/// Shapes are tried in a fixed order and the first one carrying a non-empty
/// string wins. `None` means the payload is unusable and the attempt counts
/// as failed.
pub fn extract_content(data: &Value) -> Option<(ResponseShape, String)> {
    let candidates = [
        (ResponseShape::ChatMessage, data.pointer("/message/content")),
        (ResponseShape::GeneratedText, data.get("response")),
        (ResponseShape::FlatContent, data.get("content")),
        (ResponseShape::Choices, data.pointer("/choices/0/message/content")),
    ];

    candidates.into_iter().find_map(|(shape, value)| {
        value
            .and_then(Value::as_str)
            .filter(|text| !text.is_empty())
            .map(|text| (shape, text.to_string()))
    })
}

/// Decode a raw body and extract its content
pub fn parse_body(body: &str) -> Option<(ResponseShape, String)> {
    let data: Value = serde_json::from_str(body).ok()?;
    extract_content(&data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_chat_shape() {
        let data = json!({"model": "llama3", "message": {"role": "assistant", "content": "hi"}});
        assert_eq!(
            extract_content(&data),
            Some((ResponseShape::ChatMessage, "hi".to_string()))
        );
    }

    #[test]
    fn test_generate_shape() {
        let data = json!({"response": "generated", "done": true});
        assert_eq!(
            extract_content(&data),
            Some((ResponseShape::GeneratedText, "generated".to_string()))
        );
    }

    #[test]
    fn test_flat_content_shape() {
        let data = json!({"content": "flat"});
        assert_eq!(
            extract_content(&data),
            Some((ResponseShape::FlatContent, "flat".to_string()))
        );
    }

    #[test]
    fn test_choices_shape() {
        let data = json!({"choices": [{"message": {"role": "assistant", "content": "openai"}}]});
        assert_eq!(
            extract_content(&data),
            Some((ResponseShape::Choices, "openai".to_string()))
        );
    }

    #[test]
    fn test_empty_chat_content_falls_through() {
        let data = json!({"message": {"content": ""}, "response": "fallback text"});
        assert_eq!(
            extract_content(&data),
            Some((ResponseShape::GeneratedText, "fallback text".to_string()))
        );
    }

    #[test]
    fn test_unrecognized_shapes() {
        assert!(extract_content(&json!({"error": "model not found"})).is_none());
        assert!(extract_content(&json!({"message": {"content": 42}})).is_none());
        assert!(extract_content(&json!(["content"])).is_none());
        assert!(extract_content(&json!({"content": ""})).is_none());
    }

    #[test]
    fn test_parse_body_rejects_invalid_json() {
        assert!(parse_body("<html>502</html>").is_none());
        assert!(parse_body("").is_none());
        assert_eq!(
            parse_body(r#"{"response":"ok"}"#).map(|(_, text)| text),
            Some("ok".to_string())
        );
    }
}
