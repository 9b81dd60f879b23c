use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use switchboard_types::Result;

use crate::{Provider, Request, Response};

// ---------------------------------------------------------------------------
// ClientParams
// ---------------------------------------------------------------------------

pub const OUTPUT_VERSION: &str = "responses/v1";

/// Provider-side deliberation settings, present only when the model string has
/// a reasoning segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReasoningConfig {
    pub effort: String,
    pub summary: String,
}

impl ReasoningConfig {
    pub fn new(effort: impl Into<String>) -> Self {
        Self {
            effort: effort.into(),
            summary: "auto".to_string(),
        }
    }
}

/// Parameters shared by every adapter constructor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientParams {
    pub model: String,
    pub streaming: bool,
    pub output_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<ReasoningConfig>,
}

impl ClientParams {
    pub fn new(model: impl Into<String>, streaming: bool) -> Self {
        Self {
            model: model.into(),
            streaming,
            output_version: OUTPUT_VERSION.to_string(),
            reasoning: None,
        }
    }

    pub fn with_reasoning(mut self, effort: impl Into<String>) -> Self {
        self.reasoning = Some(ReasoningConfig::new(effort));
        self
    }
}

// ---------------------------------------------------------------------------
// ChatModel
// ---------------------------------------------------------------------------

#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, request: &Request) -> Result<Response>;
    fn provider(&self) -> Provider;
    fn params(&self) -> &ClientParams;
    fn base_url(&self) -> &str;
}

// ---------------------------------------------------------------------------
// DynChatModel
// ---------------------------------------------------------------------------

/// Type-erased client handle returned by [`get_llm`](crate::get_llm).
pub struct DynChatModel(Box<dyn ChatModel>);

impl DynChatModel {
    pub fn new(model: impl ChatModel + 'static) -> Self {
        Self(Box::new(model))
    }

    pub async fn complete(&self, request: &Request) -> Result<Response> {
        self.0.complete(request).await
    }

    pub fn provider(&self) -> Provider {
        self.0.provider()
    }

    pub fn params(&self) -> &ClientParams {
        self.0.params()
    }

    pub fn model(&self) -> &str {
        &self.0.params().model
    }

    pub fn streaming(&self) -> bool {
        self.0.params().streaming
    }

    pub fn base_url(&self) -> &str {
        self.0.base_url()
    }
}

impl std::fmt::Debug for DynChatModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynChatModel")
            .field("provider", &self.provider())
            .field("params", self.params())
            .field("base_url", &self.base_url())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FinishReason, Message};
    use std::collections::HashMap;

    struct MockModel {
        params: ClientParams,
    }

    #[async_trait]
    impl ChatModel for MockModel {
        async fn complete(&self, request: &Request) -> Result<Response> {
            Ok(Response {
                id: "mock-resp-1".into(),
                text: format!("echo: {}", request.messages[0].text()),
                reasoning: None,
                model: self.params.model.clone(),
                finish_reason: FinishReason::EndTurn,
            })
        }

        fn provider(&self) -> Provider {
            Provider::Groq
        }

        fn params(&self) -> &ClientParams {
            &self.params
        }

        fn base_url(&self) -> &str {
            "http://mock"
        }
    }

    fn mock() -> DynChatModel {
        DynChatModel::new(MockModel {
            params: ClientParams::new("mock-model", true),
        })
    }

    #[tokio::test]
    async fn dyn_model_complete() {
        let model = mock();
        let resp = model
            .complete(&Request::new(vec![Message::user("hi")]))
            .await
            .unwrap();
        assert_eq!(resp.id, "mock-resp-1");
        assert_eq!(resp.text, "echo: hi");
        assert_eq!(resp.model, "mock-model");
    }

    #[test]
    fn dyn_model_accessors() {
        let model = mock();
        assert_eq!(model.provider(), Provider::Groq);
        assert_eq!(model.model(), "mock-model");
        assert!(model.streaming());
        assert_eq!(model.base_url(), "http://mock");
        assert_eq!(model.params().output_version, OUTPUT_VERSION);
    }

    #[test]
    fn dyn_model_in_hashmap() {
        let mut models: HashMap<Provider, DynChatModel> = HashMap::new();
        models.insert(Provider::Groq, mock());
        assert_eq!(models[&Provider::Groq].model(), "mock-model");
    }

    #[test]
    fn params_serialize_without_reasoning_by_default() {
        let json = serde_json::to_value(ClientParams::new("gpt-4", false)).unwrap();
        assert_eq!(json["model"], "gpt-4");
        assert_eq!(json["streaming"], false);
        assert_eq!(json["output_version"], "responses/v1");
        assert!(json.get("reasoning").is_none());

        let json = serde_json::to_value(ClientParams::new("gpt-5.1", true).with_reasoning("low"))
            .unwrap();
        assert_eq!(json["reasoning"]["effort"], "low");
        assert_eq!(json["reasoning"]["summary"], "auto");
    }
}
