use async_trait::async_trait;
use serde_json::json;
use switchboard_types::{Result, SwitchboardError};

use crate::http::{normalize_base_url, send_json};
use crate::{
    AttachmentFragment, ChatModel, ClientParams, ContentPart, FinishReason, Message, Provider,
    Request, Response, Role,
};

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

// ---------------------------------------------------------------------------
// GeminiAdapter
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct GeminiAdapter {
    api_key: String,
    client: reqwest::Client,
    base_url: String,
    params: ClientParams,
}

impl GeminiAdapter {
    pub fn new(api_key: String, params: ClientParams) -> Self {
        Self {
            api_key,
            client: reqwest::Client::new(),
            base_url: GEMINI_BASE_URL.to_string(),
            params,
        }
    }

    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = normalize_base_url(url);
        self
    }

    pub fn from_env_with<F>(lookup: F, params: ClientParams) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let key = lookup("GOOGLE_API_KEY")
            .or_else(|| lookup("GEMINI_API_KEY"))
            .ok_or_else(|| SwitchboardError::AuthError {
                provider: Provider::Google.to_string(),
            })?;
        Ok(Self::new(key, params))
    }

    pub(crate) fn build_request_body(&self, request: &Request) -> serde_json::Value {
        // 1. System messages go to systemInstruction
        let system_texts: Vec<String> = request
            .messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(Message::text)
            .collect();

        // 2. Everything else becomes contents
        let contents: Vec<serde_json::Value> = request
            .messages
            .iter()
            .filter(|m| m.role != Role::System)
            .map(convert_message)
            .collect();

        let mut body = json!({
            "contents": contents,
        });

        if !system_texts.is_empty() {
            let parts: Vec<serde_json::Value> =
                system_texts.iter().map(|t| json!({ "text": t })).collect();
            body["systemInstruction"] = json!({ "parts": parts });
        }

        // 3. Generation config
        let mut gen_config = json!({});
        if let Some(max_tokens) = request.max_tokens {
            gen_config["maxOutputTokens"] = json!(max_tokens);
        }
        if let Some(temp) = request.temperature {
            gen_config["temperature"] = json!(temp);
        }
        if let Some(ref reasoning) = self.params.reasoning {
            gen_config["thinkingConfig"] = json!({
                "thinkingLevel": reasoning.effort,
                "includeThoughts": reasoning.summary == "auto",
            });
        }
        if gen_config.as_object().is_some_and(|o| !o.is_empty()) {
            body["generationConfig"] = gen_config;
        }

        body
    }

    pub(crate) fn parse_response(&self, json: serde_json::Value) -> Result<Response> {
        let candidate = json["candidates"]
            .as_array()
            .and_then(|c| c.first())
            .ok_or_else(|| SwitchboardError::ProviderError {
                provider: Provider::Google.to_string(),
                status: 0,
                message: "Missing candidates in response".into(),
            })?;

        let finish_reason = match candidate["finishReason"].as_str() {
            Some("MAX_TOKENS") => FinishReason::MaxTokens,
            Some("SAFETY") | Some("PROHIBITED_CONTENT") => FinishReason::ContentFilter,
            Some("STOP_SEQUENCE") => FinishReason::StopSequence,
            _ => FinishReason::EndTurn,
        };

        let mut text_parts: Vec<String> = Vec::new();
        let mut thought_parts: Vec<String> = Vec::new();

        if let Some(parts) = candidate["content"]["parts"].as_array() {
            for part in parts {
                if let Some(text) = part["text"].as_str() {
                    if part["thought"].as_bool() == Some(true) {
                        thought_parts.push(text.to_string());
                    } else {
                        text_parts.push(text.to_string());
                    }
                }
            }
        }

        let id = json["responseId"]
            .as_str()
            .map(String::from)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let model = json["modelVersion"]
            .as_str()
            .unwrap_or(&self.params.model)
            .to_string();

        Ok(Response {
            id,
            text: text_parts.join(""),
            reasoning: (!thought_parts.is_empty()).then(|| thought_parts.join("\n\n")),
            model,
            finish_reason,
        })
    }
}

// ---------------------------------------------------------------------------
// Message conversion helpers
// ---------------------------------------------------------------------------

fn convert_message(msg: &Message) -> serde_json::Value {
    let role = match msg.role {
        Role::Assistant => "model",
        Role::User | Role::System => "user",
    };

    let parts: Vec<serde_json::Value> = msg
        .content
        .iter()
        .map(|p| match p {
            ContentPart::Text { text } => json!({ "text": text }),
            ContentPart::Attachment { fragment } => convert_attachment(fragment),
        })
        .collect();

    json!({
        "role": role,
        "parts": parts
    })
}

fn convert_attachment(fragment: &AttachmentFragment) -> serde_json::Value {
    match fragment.inline_data() {
        Some((mime_type, data)) => json!({
            "inlineData": {
                "mimeType": mime_type,
                "data": data,
            }
        }),
        None => json!({ "text": "[unsupported attachment]" }),
    }
}

// ---------------------------------------------------------------------------
// ChatModel implementation
// ---------------------------------------------------------------------------

#[async_trait]
impl ChatModel for GeminiAdapter {
    async fn complete(&self, request: &Request) -> Result<Response> {
        let body = self.build_request_body(request);
        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url, self.params.model
        );

        let http_request = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key);

        let json = send_json(Provider::Google, http_request, &body).await?;
        self.parse_response(json)
    }

    fn provider(&self) -> Provider {
        Provider::Google
    }

    fn params(&self) -> &ClientParams {
        &self.params
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter(params: ClientParams) -> GeminiAdapter {
        GeminiAdapter::new("test-key".into(), params)
    }

    #[test]
    fn from_env_falls_back_to_gemini_key() {
        let params = ClientParams::new("gemini-3-flash-preview", true);
        let adapter = GeminiAdapter::from_env_with(
            |k| (k == "GEMINI_API_KEY").then(|| "g-key".to_string()),
            params.clone(),
        )
        .unwrap();
        assert_eq!(adapter.api_key, "g-key");

        let err = GeminiAdapter::from_env_with(|_| None, params).unwrap_err();
        assert!(matches!(err, SwitchboardError::AuthError { provider } if provider == "google"));
    }

    #[test]
    fn build_request_body_splits_system_and_sets_thinking() {
        let adapter = adapter(ClientParams::new("gemini-3-flash-preview", true).with_reasoning("minimal"));
        let body = adapter.build_request_body(&Request::new(vec![
            Message::system("You are terse."),
            Message::user("Hello"),
            Message::assistant("Hi"),
        ]));

        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "You are terse.");
        let contents = body["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 2);
        assert_eq!(contents[0]["role"], "user");
        assert_eq!(contents[0]["parts"][0]["text"], "Hello");
        assert_eq!(contents[1]["role"], "model");

        let thinking = &body["generationConfig"]["thinkingConfig"];
        assert_eq!(thinking["thinkingLevel"], "minimal");
        assert_eq!(thinking["includeThoughts"], true);
    }

    #[test]
    fn build_request_body_without_options_has_no_generation_config() {
        let adapter = adapter(ClientParams::new("gemini-2.5-flash", false));
        let body = adapter.build_request_body(&Request::new(vec![Message::user("Hi")]));
        assert!(body.get("generationConfig").is_none());
        assert!(body.get("systemInstruction").is_none());
    }

    #[test]
    fn media_attachment_becomes_inline_data() {
        let adapter = adapter(ClientParams::new("gemini-2.5-flash", true));
        let msg = Message::user("Describe").with_attachment(AttachmentFragment::Media {
            mime_type: "application/pdf".into(),
            data: "JVBE".into(),
        });
        let body = adapter.build_request_body(&Request::new(vec![msg]));
        let part = &body["contents"][0]["parts"][1];
        assert_eq!(part["inlineData"]["mimeType"], "application/pdf");
        assert_eq!(part["inlineData"]["data"], "JVBE");
    }

    #[test]
    fn parse_response_separates_thoughts() {
        let adapter = adapter(ClientParams::new("gemini-3-flash-preview", true));
        let resp = adapter
            .parse_response(json!({
                "responseId": "abc",
                "modelVersion": "gemini-3-flash-preview",
                "candidates": [{
                    "content": {
                        "role": "model",
                        "parts": [
                            { "text": "Thinking about greetings.", "thought": true },
                            { "text": "Hello" }
                        ]
                    },
                    "finishReason": "STOP"
                }]
            }))
            .unwrap();
        assert_eq!(resp.id, "abc");
        assert_eq!(resp.text, "Hello");
        assert_eq!(resp.reasoning.as_deref(), Some("Thinking about greetings."));
        assert_eq!(resp.model, "gemini-3-flash-preview");
        assert_eq!(resp.finish_reason, FinishReason::EndTurn);
    }

    #[test]
    fn parse_response_maps_finish_reasons() {
        let adapter = adapter(ClientParams::new("gemini-2.5-flash", true));
        for (raw, expected) in [
            ("MAX_TOKENS", FinishReason::MaxTokens),
            ("SAFETY", FinishReason::ContentFilter),
            ("STOP_SEQUENCE", FinishReason::StopSequence),
        ] {
            let resp = adapter
                .parse_response(json!({
                    "candidates": [{ "content": { "parts": [] }, "finishReason": raw }]
                }))
                .unwrap();
            assert_eq!(resp.finish_reason, expected);
            assert_eq!(resp.model, "gemini-2.5-flash");
            assert!(resp.reasoning.is_none());
        }
    }

    #[test]
    fn parse_response_without_candidates_is_error() {
        let adapter = adapter(ClientParams::new("gemini-2.5-flash", true));
        let err = adapter.parse_response(json!({})).unwrap_err();
        assert!(err.to_string().contains("Missing candidates"));
    }
}
