//! Chat Completions wire types
//!
//! Shared by backends speaking the OpenAI-compatible chat shape (Azure
//! deployments and Ollama's `/v1` endpoint): an explicit two-message list,
//! system first.

use serde::{Deserialize, Serialize};

use super::GenerationRequest;
use crate::types::{ErrorCategory, LlmError, Result};

pub(super) fn build_request(request: &GenerationRequest, include_model: bool) -> ChatCompletionRequest {
    ChatCompletionRequest {
        model: include_model.then(|| request.model.clone()),
        messages: vec![
            ChatMessage {
                role: "system".to_string(),
                content: request.system_instruction.clone(),
            },
            ChatMessage {
                role: "user".to_string(),
                content: request.user_prompt.clone(),
            },
        ],
        temperature: request.temperature,
        stream: false,
    }
}

pub(super) fn extract_text(response: ChatCompletionResponse, provider: &str) -> Result<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| {
            LlmError::with_provider(
                ErrorCategory::ParseError,
                format!("No content in {} response", provider),
                provider,
            )
            .into()
        })
}

// Request/Response types

#[derive(Debug, Serialize)]
pub(super) struct ChatCompletionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<String>,
    messages: Vec<ChatMessage>,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_message_first() {
        let request = GenerationRequest::new("gpt-4o", "sys", "user").with_temperature(0.3);
        let body = serde_json::to_value(build_request(&request, true)).unwrap();
        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], "sys");
        assert_eq!(body["messages"][1]["role"], "user");
        assert!((body["temperature"].as_f64().unwrap() - 0.3).abs() < 1e-6);

        let without_model = serde_json::to_value(build_request(&request, false)).unwrap();
        assert!(without_model.get("model").is_none());
    }

    #[test]
    fn test_extract_text_empty_choices() {
        let response: ChatCompletionResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(extract_text(response, "ollama").is_err());
    }
}
