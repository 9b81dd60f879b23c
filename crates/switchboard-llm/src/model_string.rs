use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use switchboard_types::{Result, SwitchboardError};

use crate::{Provider, DEFAULT_MODEL_STRING};

// ---------------------------------------------------------------------------
// ModelSpec
// ---------------------------------------------------------------------------

/// A validated `provider:model[:reasoning]` triple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSpec {
    pub provider: Provider,
    pub model: String,
    pub reasoning_effort: Option<String>,
}

impl FromStr for ModelSpec {
    type Err = SwitchboardError;

    fn from_str(s: &str) -> Result<Self> {
        let segments: Vec<&str> = s.split(':').collect();
        let (provider, model, reasoning_effort) = match segments.as_slice() {
            [provider, model] => (*provider, *model, None),
            [provider, model, reasoning] => (*provider, *model, Some(reasoning.to_string())),
            _ => {
                return Err(SwitchboardError::invalid(format!(
                    "Model string {s} is not valid. It must be in the format \
                     'provider:model_name[:reasoning]', e.g., 'openai:gpt-5.1:none' \
                     e.g. 'azure:gpt-5-chat'."
                )))
            }
        };

        Ok(Self {
            provider: provider.parse()?,
            model: model.to_string(),
            reasoning_effort,
        })
    }
}

impl fmt::Display for ModelSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.provider, self.model)?;
        if let Some(ref effort) = self.reasoning_effort {
            write!(f, ":{effort}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ModelSelector
// ---------------------------------------------------------------------------

/// Where a model string comes from. At most one source may be set; an empty
/// selector resolves to [`DEFAULT_MODEL_STRING`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelSelector {
    pub model_string: Option<String>,
    pub model_env: Option<String>,
    pub provider: Option<Provider>,
}

impl ModelSelector {
    pub fn string(model_string: impl Into<String>) -> Self {
        Self::default().with_string(model_string)
    }

    pub fn env(var_name: impl Into<String>) -> Self {
        Self::default().with_env(var_name)
    }

    pub fn provider(provider: Provider) -> Self {
        Self::default().with_provider(provider)
    }

    pub fn with_string(mut self, model_string: impl Into<String>) -> Self {
        self.model_string = Some(model_string.into());
        self
    }

    pub fn with_env(mut self, var_name: impl Into<String>) -> Self {
        self.model_env = Some(var_name.into());
        self
    }

    pub fn with_provider(mut self, provider: Provider) -> Self {
        self.provider = Some(provider);
        self
    }

    fn source_count(&self) -> usize {
        [
            self.model_string.is_some(),
            self.model_env.is_some(),
            self.provider.is_some(),
        ]
        .into_iter()
        .filter(|set| *set)
        .count()
    }

    /// Pick the raw model string, reading variables through `lookup`.
    pub fn resolve_with<F>(&self, lookup: F) -> Result<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        if self.source_count() > 1 {
            return Err(SwitchboardError::invalid(
                "At most one of model_env, model_string, or provider must be provided",
            ));
        }

        let resolved = if let Some(ref s) = self.model_string {
            s.clone()
        } else if let Some(ref var) = self.model_env {
            lookup(var.as_str()).unwrap_or_else(|| {
                tracing::debug!(var = %var, default = DEFAULT_MODEL_STRING, "Model variable unset, using default");
                DEFAULT_MODEL_STRING.to_string()
            })
        } else if let Some(provider) = self.provider {
            provider.default_model_string().to_string()
        } else {
            DEFAULT_MODEL_STRING.to_string()
        };

        Ok(resolved)
    }
}

/// Reads a variable from the process environment. Non-UTF-8 values count as unset.
pub fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

// ---------------------------------------------------------------------------
// parse_model_string
// ---------------------------------------------------------------------------

/// Resolve `selector` against the process environment and validate the result.
pub fn parse_model_string(selector: &ModelSelector) -> Result<ModelSpec> {
    parse_model_string_with(selector, process_env)
}

/// Like [`parse_model_string`], reading variables through `lookup`.
pub fn parse_model_string_with<F>(selector: &ModelSelector, lookup: F) -> Result<ModelSpec>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = selector.resolve_with(lookup)?;
    let spec: ModelSpec = raw.parse()?;
    tracing::debug!(
        provider = %spec.provider,
        model = %spec.model,
        reasoning = ?spec.reasoning_effort,
        "Parsed model string"
    );
    Ok(spec)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn parse(s: &str) -> Result<ModelSpec> {
        parse_model_string_with(&ModelSelector::string(s), no_env)
    }

    fn assert_invalid(result: Result<ModelSpec>, needle: &str) {
        match result {
            Err(SwitchboardError::InvalidSpecification(msg)) => {
                assert!(msg.contains(needle), "message {msg:?} lacks {needle:?}")
            }
            other => panic!("expected InvalidSpecification, got {other:?}"),
        }
    }

    #[test]
    fn two_segments_have_no_reasoning() {
        let spec = parse("openai:gpt-4").unwrap();
        assert_eq!(spec.provider, Provider::OpenAi);
        assert_eq!(spec.model, "gpt-4");
        assert_eq!(spec.reasoning_effort, None);
    }

    #[test]
    fn three_segments_carry_reasoning() {
        let spec = parse("openai:gpt-5.1:low").unwrap();
        assert_eq!(spec.provider, Provider::OpenAi);
        assert_eq!(spec.model, "gpt-5.1");
        assert_eq!(spec.reasoning_effort.as_deref(), Some("low"));

        let spec = parse("openai:gpt-5.1:none").unwrap();
        assert_eq!(spec.reasoning_effort.as_deref(), Some("none"));
    }

    #[test]
    fn every_provider_parses_from_string() {
        for provider in Provider::ALL {
            let spec = parse(&format!("{provider}:test-model")).unwrap();
            assert_eq!(spec.provider, provider);
            assert_eq!(spec.model, "test-model");
            assert!(spec.reasoning_effort.is_none());
        }
    }

    #[test]
    fn model_names_may_contain_slashes_and_dots() {
        let spec = parse("groq:openai/gpt-oss-120b").unwrap();
        assert_eq!(spec.model, "openai/gpt-oss-120b");

        let spec = parse("openai:gpt-4-turbo-preview:high").unwrap();
        assert_eq!(spec.model, "gpt-4-turbo-preview");
        assert_eq!(spec.reasoning_effort.as_deref(), Some("high"));
    }

    #[test]
    fn empty_reasoning_segment_is_kept() {
        let spec = parse("openai:gpt-4:").unwrap();
        assert_eq!(spec.model, "gpt-4");
        assert_eq!(spec.reasoning_effort.as_deref(), Some(""));
    }

    #[test]
    fn reads_named_environment_variable() {
        let env: HashMap<&str, &str> = [("TEST_MODEL_ENV", "azure:gpt-4-turbo")].into();
        let spec = parse_model_string_with(&ModelSelector::env("TEST_MODEL_ENV"), |k| {
            env.get(k).map(|v| v.to_string())
        })
        .unwrap();
        assert_eq!(spec.provider, Provider::Azure);
        assert_eq!(spec.model, "gpt-4-turbo");
        assert!(spec.reasoning_effort.is_none());
    }

    #[test]
    fn unset_environment_variable_falls_back_to_default() {
        let spec = parse_model_string_with(&ModelSelector::env("NONEXISTENT_ENV"), no_env).unwrap();
        assert_eq!(spec.provider, Provider::OpenAi);
        assert_eq!(spec.model, "gpt-5.1");
        assert_eq!(spec.reasoning_effort.as_deref(), Some("none"));
    }

    #[test]
    fn empty_environment_variable_is_parsed_as_given() {
        let result =
            parse_model_string_with(&ModelSelector::env("EMPTY_ENV"), |_| Some(String::new()));
        assert_invalid(result, "is not valid");
    }

    #[test]
    fn process_environment_is_consulted() {
        std::env::set_var("SWITCHBOARD_TEST_PROCESS_MODEL", "mistralai:mistral-small-latest");
        let spec = parse_model_string(&ModelSelector::env("SWITCHBOARD_TEST_PROCESS_MODEL")).unwrap();
        assert_eq!(spec.provider, Provider::MistralAi);
        assert_eq!(spec.model, "mistral-small-latest");
    }

    #[test]
    fn provider_selects_its_default() {
        let spec = parse_model_string_with(&ModelSelector::provider(Provider::Azure), no_env).unwrap();
        assert_eq!(spec.provider, Provider::Azure);
        assert_eq!(spec.model, "gpt-5-chat");
        assert!(spec.reasoning_effort.is_none());
    }

    #[test]
    fn every_provider_default_matches_table() {
        for provider in Provider::ALL {
            let spec = parse_model_string_with(&ModelSelector::provider(provider), no_env).unwrap();
            assert_eq!(spec.provider, provider);
            let expected = provider.default_model_string().split(':').nth(1).unwrap();
            assert_eq!(spec.model, expected);
        }
    }

    #[test]
    fn empty_selector_uses_global_default() {
        let spec = parse_model_string_with(&ModelSelector::default(), no_env).unwrap();
        assert_eq!(spec.provider, Provider::OpenAi);
        assert_eq!(spec.model, "gpt-5.1");
        assert_eq!(spec.reasoning_effort.as_deref(), Some("none"));
    }

    #[test]
    fn multiple_sources_are_rejected() {
        let msg = "At most one of model_env, model_string, or provider must be provided";
        let selectors = [
            ModelSelector::string("openai:gpt-4").with_env("TEST_ENV"),
            ModelSelector::string("openai:gpt-4").with_provider(Provider::OpenAi),
            ModelSelector::env("TEST_ENV").with_provider(Provider::OpenAi),
            ModelSelector::string("openai:gpt-4")
                .with_env("TEST_ENV")
                .with_provider(Provider::OpenAi),
        ];
        for selector in &selectors {
            assert_invalid(parse_model_string_with(selector, no_env), msg);
        }
    }

    #[test]
    fn wrong_segment_counts_are_rejected() {
        for s in ["openai", "openai-gpt-4", "", "openai:gpt-4:low:extra", "a:b:c:d:e"] {
            assert_invalid(parse(s), "is not valid");
        }
    }

    #[test]
    fn unknown_provider_is_rejected() {
        assert_invalid(parse("invalid:some-model"), "Provider invalid is not supported");
        assert_invalid(parse("anthropic:claude:high"), "Provider anthropic is not supported");
    }

    #[test]
    fn display_writes_canonical_form() {
        for s in ["openai:gpt-5.1:none", "azure:gpt-5-chat", "openai:gpt-4:"] {
            assert_eq!(parse(s).unwrap().to_string(), s);
        }
    }
}
