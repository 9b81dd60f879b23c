//! Model-string parsing and a multi-provider chat client factory.
//!
//! A string like `openai:gpt-5.1:low` names a provider, a model and an
//! optional reasoning level. `parse_model_string` validates it, `get_llm`
//! turns it into a `DynChatModel` for that provider, and `file_to_message`
//! formats uploads the way the same provider expects.

mod attachment;
mod catalog;
mod chat_completions;
mod factory;
mod gemini;
mod http;
mod model_string;
mod openai;
mod provider;
mod types;

pub use attachment::*;
pub use catalog::*;
pub use chat_completions::{ChatCompletionsAdapter, GROQ_BASE_URL, MISTRAL_BASE_URL};
pub use factory::*;
pub use gemini::{GeminiAdapter, GEMINI_BASE_URL};
pub use model_string::*;
pub use openai::{OpenAiAdapter, OPENAI_BASE_URL};
pub use provider::*;
pub use types::*;

pub use switchboard_types::{Result, SwitchboardError};
