use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use switchboard_types::SwitchboardError;

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

/// The closed set of LLM vendors a model string may name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAi,
    Azure,
    Groq,
    MistralAi,
    Google,
}

impl Provider {
    pub const ALL: [Provider; 5] = [
        Provider::OpenAi,
        Provider::Azure,
        Provider::Groq,
        Provider::MistralAi,
        Provider::Google,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Azure => "azure",
            Provider::Groq => "groq",
            Provider::MistralAi => "mistralai",
            Provider::Google => "google",
        }
    }

    /// Human-facing vendor name used in error messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            Provider::OpenAi => "OpenAI",
            Provider::Azure => "Azure",
            Provider::Groq => "Groq",
            Provider::MistralAi => "Mistral AI",
            Provider::Google => "Google",
        }
    }

    /// The model string used when only the provider is requested.
    pub fn default_model_string(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai:gpt-5.1:none",
            Provider::Azure => "azure:gpt-5-chat",
            Provider::Groq => "groq:openai/gpt-oss-120b",
            Provider::MistralAi => "mistralai:mistral-large-latest",
            Provider::Google => "google:gemini-3-flash-preview:minimal",
        }
    }

    /// Comma-separated list of every supported tag, for error messages.
    pub fn supported_list() -> String {
        Self::ALL
            .iter()
            .map(|p| format!("'{}'", p.as_str()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for Provider {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl FromStr for Provider {
    type Err = SwitchboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| {
                SwitchboardError::invalid(format!(
                    "Provider {s} is not supported. Supported providers are: {}",
                    Self::supported_list()
                ))
            })
    }
}

// ---------------------------------------------------------------------------
// Default table
// ---------------------------------------------------------------------------

/// Model string used when no source is given, or when the named environment
/// variable is unset.
pub const DEFAULT_MODEL_STRING: &str = "openai:gpt-5.1:none";

/// Every provider paired with its default model string.
pub fn default_model_strings() -> impl Iterator<Item = (Provider, &'static str)> {
    Provider::ALL
        .into_iter()
        .map(|p| (p, p.default_model_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_tags_round_trip_through_from_str() {
        for provider in Provider::ALL {
            let parsed: Provider = provider.as_str().parse().unwrap();
            assert_eq!(parsed, provider);
            assert_eq!(provider.to_string(), provider.as_str());
        }
    }

    #[test]
    fn unknown_provider_is_invalid_specification() {
        let err = "invalid".parse::<Provider>().unwrap_err();
        assert!(matches!(err, SwitchboardError::InvalidSpecification(_)));
        assert!(err.to_string().contains("Provider invalid is not supported"));
        assert!(err.to_string().contains("'mistralai'"));
    }

    #[test]
    fn provider_tags_are_case_sensitive() {
        assert!("OpenAI".parse::<Provider>().is_err());
    }

    #[test]
    fn default_table_has_one_entry_per_provider() {
        let table: Vec<_> = default_model_strings().collect();
        assert_eq!(table.len(), Provider::ALL.len());
        for (provider, spec) in table {
            let prefix = spec.split(':').next().unwrap();
            assert_eq!(prefix, provider.as_str(), "default for {provider} names another provider");
        }
    }

    #[test]
    fn global_default_is_the_openai_entry() {
        assert_eq!(DEFAULT_MODEL_STRING, Provider::OpenAi.default_model_string());
    }

    #[test]
    fn provider_serializes_as_lowercase_tag() {
        assert_eq!(
            serde_json::to_string(&Provider::MistralAi).unwrap(),
            "\"mistralai\""
        );
        let p: Provider = serde_json::from_str("\"openai\"").unwrap();
        assert_eq!(p, Provider::OpenAi);
    }
}
