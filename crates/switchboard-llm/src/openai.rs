use async_trait::async_trait;
use serde_json::json;
use switchboard_types::{Result, SwitchboardError};

use crate::http::{normalize_base_url, send_json};
use crate::{
    AttachmentFragment, ChatModel, ClientParams, ContentPart, FinishReason, Message, Provider,
    Request, Response, Role,
};

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

// ---------------------------------------------------------------------------
// OpenAiAdapter
// ---------------------------------------------------------------------------

/// Responses API client. Serves both `openai` and `azure`; the latter only
/// differs in base URL and credentials.
#[derive(Debug)]
pub struct OpenAiAdapter {
    provider: Provider,
    api_key: String,
    client: reqwest::Client,
    base_url: String,
    params: ClientParams,
}

impl OpenAiAdapter {
    pub fn new(api_key: String, params: ClientParams) -> Self {
        Self {
            provider: Provider::OpenAi,
            api_key,
            client: reqwest::Client::new(),
            base_url: OPENAI_BASE_URL.to_string(),
            params,
        }
    }

    /// An Azure OpenAI deployment reached through its v1-compatible endpoint.
    pub fn azure(base_url: String, api_key: String, params: ClientParams) -> Self {
        Self {
            provider: Provider::Azure,
            ..Self::new(api_key, params).with_base_url(base_url)
        }
    }

    pub fn from_env_with<F>(lookup: F, params: ClientParams) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let key = lookup("OPENAI_API_KEY").ok_or_else(|| SwitchboardError::AuthError {
            provider: Provider::OpenAi.to_string(),
        })?;
        Ok(Self::new(key, params))
    }

    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = normalize_base_url(url);
        self
    }

    pub(crate) fn build_request_body(&self, request: &Request) -> serde_json::Value {
        let input: Vec<serde_json::Value> = request.messages.iter().map(convert_message).collect();

        let mut body = json!({
            "model": self.params.model,
            "input": input,
        });

        if let Some(max_tokens) = request.max_tokens {
            body["max_output_tokens"] = json!(max_tokens);
        }

        if let Some(temp) = request.temperature {
            body["temperature"] = json!(temp);
        }

        if let Some(ref reasoning) = self.params.reasoning {
            body["reasoning"] = json!({
                "effort": reasoning.effort,
                "summary": reasoning.summary,
            });
        }

        body
    }

    pub(crate) fn parse_response(&self, body: serde_json::Value) -> Result<Response> {
        let id = body["id"].as_str().unwrap_or("").to_string();
        let model = body["model"].as_str().unwrap_or("").to_string();

        let finish_reason = match body["status"].as_str() {
            Some("incomplete") => match body["incomplete_details"]["reason"].as_str() {
                Some("content_filter") => FinishReason::ContentFilter,
                _ => FinishReason::MaxTokens,
            },
            _ => FinishReason::EndTurn,
        };

        let mut text_parts: Vec<String> = Vec::new();
        let mut summary_parts: Vec<String> = Vec::new();
        let mut saw_reasoning = false;

        if let Some(output) = body["output"].as_array() {
            for item in output {
                match item["type"].as_str() {
                    Some("message") => {
                        if let Some(content) = item["content"].as_array() {
                            for block in content {
                                if block["type"] == "output_text" {
                                    if let Some(t) = block["text"].as_str() {
                                        text_parts.push(t.to_string());
                                    }
                                }
                            }
                        }
                    }
                    Some("reasoning") => {
                        saw_reasoning = true;
                        if let Some(summary) = item["summary"].as_array() {
                            for block in summary {
                                if let Some(t) = block["text"].as_str() {
                                    summary_parts.push(t.to_string());
                                }
                            }
                        }
                    }
                    _ => {}
                }
            }
        }

        let reasoning = saw_reasoning.then(|| summary_parts.join("\n\n"));

        Ok(Response {
            id,
            text: text_parts.join(""),
            reasoning,
            model,
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

    let text_type = match msg.role {
        Role::Assistant => "output_text",
        Role::System | Role::User => "input_text",
    };

    let parts: Vec<serde_json::Value> = msg
        .content
        .iter()
        .map(|p| match p {
            ContentPart::Text { text } => json!({ "type": text_type, "text": text }),
            ContentPart::Attachment { fragment } => convert_attachment(fragment),
        })
        .collect();

    json!({
        "role": msg.role.as_str(),
        "content": parts,
    })
}

fn convert_attachment(fragment: &AttachmentFragment) -> serde_json::Value {
    match fragment {
        AttachmentFragment::InputFile {
            filename,
            file_data,
        } => json!({ "type": "input_file", "filename": filename, "file_data": file_data }),
        AttachmentFragment::File { file } => json!({
            "type": "input_file",
            "filename": file.filename,
            "file_data": file.file_data,
        }),
        AttachmentFragment::Media { mime_type, data } => json!({
            "type": "input_file",
            "filename": "attachment",
            "file_data": format!("data:{mime_type};base64,{data}"),
        }),
    }
}

// ---------------------------------------------------------------------------
// ChatModel implementation
// ---------------------------------------------------------------------------

#[async_trait]
impl ChatModel for OpenAiAdapter {
    async fn complete(&self, request: &Request) -> Result<Response> {
        let body = self.build_request_body(request);

        let http_request = self
            .client
            .post(format!("{}/responses", self.base_url))
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
