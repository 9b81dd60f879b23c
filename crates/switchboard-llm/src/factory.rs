use switchboard_types::{Result, SwitchboardError};

use crate::{
    parse_model_string_with, process_env, ChatCompletionsAdapter, ClientParams, DynChatModel,
    GeminiAdapter, ModelSelector, ModelSpec, OpenAiAdapter, Provider,
};

pub const AZURE_BASE_URL_VAR: &str = "AZURE_BASE_URL";
pub const AZURE_API_KEY_VAR: &str = "AZURE_OPENAI_API_KEY";

/// Build a configured chat client for the model `selector` names.
///
/// Returns the client together with the provider it was built for, so the
/// caller can format attachments for the same provider.
pub fn get_llm(selector: &ModelSelector, streaming: bool) -> Result<(DynChatModel, Provider)> {
    get_llm_with(selector, streaming, process_env)
}

/// Like [`get_llm`], reading every variable through `lookup`.
pub fn get_llm_with<F>(
    selector: &ModelSelector,
    streaming: bool,
    lookup: F,
) -> Result<(DynChatModel, Provider)>
where
    F: Fn(&str) -> Option<String>,
{
    let spec = parse_model_string_with(selector, &lookup)?;
    let provider = spec.provider;
    let client = build_client(&spec, streaming, &lookup)?;

    tracing::info!(
        source = ?selector.model_env,
        provider = %provider,
        model = %spec.model,
        streaming,
        "Using LLM model"
    );

    Ok((client, provider))
}

/// Parameters shared by every provider constructor.
pub fn client_params(spec: &ModelSpec, streaming: bool) -> ClientParams {
    let params = ClientParams::new(spec.model.clone(), streaming);
    match spec.reasoning_effort {
        Some(ref effort) => params.with_reasoning(effort.clone()),
        None => params,
    }
}

fn build_client<F>(spec: &ModelSpec, streaming: bool, lookup: &F) -> Result<DynChatModel>
where
    F: Fn(&str) -> Option<String>,
{
    let params = client_params(spec, streaming);

    let client = match spec.provider {
        Provider::Azure => {
            let base_url = require(lookup, AZURE_BASE_URL_VAR)?;
            let api_key = require(lookup, AZURE_API_KEY_VAR)?;
            DynChatModel::new(OpenAiAdapter::azure(base_url, api_key, params))
        }
        Provider::OpenAi => DynChatModel::new(OpenAiAdapter::from_env_with(lookup, params)?),
        Provider::Groq | Provider::MistralAi => DynChatModel::new(
            ChatCompletionsAdapter::from_env_with(spec.provider, lookup, params)?,
        ),
        Provider::Google => DynChatModel::new(GeminiAdapter::from_env_with(lookup, params)?),
    };

    Ok(client)
}

fn require<F>(lookup: &F, name: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name).ok_or_else(|| SwitchboardError::MissingEnvVar {
        name: name.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
