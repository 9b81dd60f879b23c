use async_trait::async_trait;
use serde_json::json;
use switchboard_types::{Result, SwitchboardError};

use crate::http::{normalize_base_url, send_json};
use crate::{
    AttachmentFragment, ChatModel, ClientParams, ContentPart, FinishReason, Message, Provider,
    Request, Response,
};

pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const MISTRAL_BASE_URL: &str = "https://api.mistral.ai/v1";

// ---------------------------------------------------------------------------
// ChatCompletionsAdapter
// ---------------------------------------------------------------------------

/// Client for vendors speaking the OpenAI-compatible `/chat/completions`
/// dialect (Groq, Mistral).
#[derive(Debug)]
pub struct ChatCompletionsAdapter {
    provider: Provider,
    api_key: String,
    client: reqwest::Client,
    base_url: String,
    params: ClientParams,
}

impl ChatCompletionsAdapter {
    pub fn groq(api_key: String, params: ClientParams) -> Self {
        Self::new(Provider::Groq, GROQ_BASE_URL, api_key, params)
    }

    pub fn mistral(api_key: String, params: ClientParams) -> Self {
        Self::new(Provider::MistralAi, MISTRAL_BASE_URL, api_key, params)
    }

    fn new(provider: Provider, base_url: &str, api_key: String, params: ClientParams) -> Self {
        Self {
            provider,
            api_key,
            client: reqwest::Client::new(),
            base_url: base_url.to_string(),
            params,
        }
    }

    /// Read the vendor's API key variable (`GROQ_API_KEY` or `MISTRAL_API_KEY`).
    pub fn from_env_with<F>(provider: Provider, lookup: F, params: ClientParams) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let (var, constructor): (&str, fn(String, ClientParams) -> Self) = match provider {
            Provider::Groq => ("GROQ_API_KEY", Self::groq),
            Provider::MistralAi => ("MISTRAL_API_KEY", Self::mistral),
            other => {
                return Err(SwitchboardError::invalid(format!(
                    "Provider {other} does not use the chat completions API"
                )))
            }
        };
        let key = lookup(var).ok_or_else(|| SwitchboardError::AuthError {
            provider: provider.to_string(),
        })?;
        Ok(constructor(key, params))
    }

    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = normalize_base_url(url);
        self
    }

    pub(crate) fn build_request_body(&self, request: &Request) -> serde_json::Value {
        let messages: Vec<serde_json::Value> =
            request.messages.iter().map(convert_message).collect();

        let mut body = json!({
            "model": self.params.model,
            "messages": messages,
        });

        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }

        if let Some(temp) = request.temperature {
            body["temperature"] = json!(temp);
        }

        // Mistral rejects unknown fields; only Groq takes an effort level.
        if let (Provider::Groq, Some(reasoning)) = (self.provider, &self.params.reasoning) {
            body["reasoning_effort"] = json!(reasoning.effort);
        }

        body
    }

    pub(crate) fn parse_response(&self, body: serde_json::Value) -> Result<Response> {
        let choice = body["choices"]
            .as_array()
            .and_then(|c| c.first())
            .ok_or_else(|| SwitchboardError::ProviderError {
                provider: self.provider.to_string(),
                status: 0,
                message: "Missing choices in response".into(),
            })?;

        let finish_reason = match choice["finish_reason"].as_str() {
            Some("length") | Some("model_length") => FinishReason::MaxTokens,
            Some("content_filter") => FinishReason::ContentFilter,
            _ => FinishReason::EndTurn,
        };

        let message = &choice["message"];
        let text = match &message["content"] {
            serde_json::Value::String(s) => s.clone(),
            // Mistral may return typed chunks
            serde_json::Value::Array(chunks) => chunks
                .iter()
                .filter(|c| c["type"] == "text")
                .filter_map(|c| c["text"].as_str())
                .collect::<Vec<_>>()
                .join(""),
            _ => String::new(),
        };
        let reasoning = message["reasoning"].as_str().map(String::from);

        Ok(Response {
            id: body["id"].as_str().unwrap_or("").to_string(),
            text,
            reasoning,
            model: body["model"].as_str().unwrap_or("").to_string(),
            finish_reason,
        })
    }
}

// ---------------------------------------------------------------------------
// Message conversion helpers
// ---------------------------------------------------------------------------

fn convert_message(msg: &Message) -> serde_json::Value {
    let has_attachments = msg
        .content
        .iter()
        .any(|p| matches!(p, ContentPart::Attachment { .. }));

    if !has_attachments {
        return json!({
            "role": msg.role.as_str(),
            "content": msg.text(),
        });
    }

    let parts: Vec<serde_json::Value> = msg
        .content
        .iter()
        .map(|p| match p {
            ContentPart::Text { text } => json!({ "type": "text", "text": text }),
            ContentPart::Attachment { fragment } => convert_attachment(fragment),
        })
        .collect();

    json!({
        "role": msg.role.as_str(),
        "content": parts,
    })
}

fn convert_attachment(fragment: &AttachmentFragment) -> serde_json::Value {
    if let Some((filename, file_data)) = fragment.file_parts() {
        return json!({
            "type": "document_url",
            "document_url": file_data,
            "document_name": filename,
        });
    }
    match fragment.inline_data() {
        Some((mime_type, data)) => json!({
            "type": "document_url",
            "document_url": format!("data:{mime_type};base64,{data}"),
        }),
        None => json!({ "type": "text", "text": "[unsupported attachment]" }),
    }
}

// ---------------------------------------------------------------------------
// ChatModel implementation
// ---------------------------------------------------------------------------

#[async_trait]
impl ChatModel for ChatCompletionsAdapter {
    async fn complete(&self, request: &Request) -> Result<Response> {
        let body = self.build_request_body(request);

        let http_request = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key));

        let json = send_json(self.provider, http_request, &body).await?;
        self.parse_response(json)
    }

    fn provider(&self) -> Provider {
        self.provider
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
