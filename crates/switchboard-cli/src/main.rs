//! CLI binary for resolving model strings and talking to the configured provider.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use switchboard_llm::{
    default_model_strings, file_to_message, get_llm, parse_model_string, LocalFile, Message,
    ModelSelector, Provider, Request,
};

#[derive(Parser)]
#[command(name = "switchboard", version, about = "Resolve LLM model strings and talk to providers")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// The three ways to pick a model. Passing more than one is an error.
#[derive(Args)]
struct SelectorArgs {
    /// Model string, e.g. openai:gpt-5.1:low
    #[arg(short, long)]
    model: Option<String>,

    /// Name of an environment variable holding the model string
    #[arg(short, long)]
    env: Option<String>,

    /// Use this provider's default model
    #[arg(short, long)]
    provider: Option<String>,
}

impl SelectorArgs {
    fn to_selector(&self) -> anyhow::Result<ModelSelector> {
        let provider = self
            .provider
            .as_deref()
            .map(str::parse::<Provider>)
            .transpose()?;
        Ok(ModelSelector {
            model_string: self.model.clone(),
            model_env: self.env.clone(),
            provider,
        })
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Parse and validate a model selection
    Resolve {
        #[command(flatten)]
        selector: SelectorArgs,
    },

    /// List the default model string for every provider
    Defaults,

    /// Print the message fragment a provider expects for a file
    Attach {
        /// File to embed
        file: PathBuf,

        /// Provider tag to format for
        #[arg(short, long)]
        provider: String,

        /// Override the guessed MIME type
        #[arg(long)]
        content_type: Option<String>,
    },

    /// Send one prompt to the selected model
    Ask {
        /// Prompt text
        prompt: String,

        #[command(flatten)]
        selector: SelectorArgs,

        /// Attach a file to the prompt
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Optional system instruction
        #[arg(long)]
        system: Option<String>,

        /// Cap on generated tokens
        #[arg(long)]
        max_tokens: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Resolve { selector } => {
            cmd_resolve(&selector)?;
        }
        Commands::Defaults => {
            cmd_defaults();
        }
        Commands::Attach {
            file,
            provider,
            content_type,
        } => {
            cmd_attach(&file, &provider, content_type.as_deref()).await?;
        }
        Commands::Ask {
            prompt,
            selector,
            file,
            system,
            max_tokens,
        } => {
            cmd_ask(&prompt, &selector, file.as_deref(), system.as_deref(), max_tokens).await?;
        }
    }

    Ok(())
}

fn cmd_resolve(args: &SelectorArgs) -> anyhow::Result<()> {
    let spec = parse_model_string(&args.to_selector()?)?;
    println!("provider:  {}", spec.provider);
    println!("model:     {}", spec.model);
    println!(
        "reasoning: {}",
        spec.reasoning_effort.as_deref().unwrap_or("(none)")
    );
    Ok(())
}

fn cmd_defaults() {
    for (provider, spec) in default_model_strings() {
        println!("{:<10} {}", provider, spec);
    }
}

fn open_file(path: &Path, content_type: Option<&str>) -> anyhow::Result<LocalFile> {
    if !path.is_file() {
        anyhow::bail!("{} is not a readable file", path.display());
    }
    let file = LocalFile::new(path);
    Ok(match content_type {
        Some(ct) => file.with_content_type(ct),
        None => file,
    })
}

async fn cmd_attach(path: &Path, provider: &str, content_type: Option<&str>) -> anyhow::Result<()> {
    let mut file = open_file(path, content_type)?;
    let fragment = file_to_message(&mut file, provider).await?;
    println!("{}", serde_json::to_string_pretty(&fragment)?);
    Ok(())
}

async fn cmd_ask(
    prompt: &str,
    args: &SelectorArgs,
    file: Option<&Path>,
    system: Option<&str>,
    max_tokens: Option<u32>,
) -> anyhow::Result<()> {
    let (llm, provider) = get_llm(&args.to_selector()?, false).inspect_err(|e| {
        if e.is_configuration() {
            tracing::error!("Check the model string and the provider's environment variables");
        }
    })?;

    let mut user = Message::user(prompt);
    if let Some(path) = file {
        let mut upload = open_file(path, None)?;
        user = user.with_attachment(file_to_message(&mut upload, provider).await?);
    }

    let mut messages = Vec::new();
    if let Some(system) = system {
        messages.push(Message::system(system));
    }
    messages.push(user);

    let mut request = Request::new(messages);
    request.max_tokens = max_tokens;

    let response = llm.complete(&request).await?;
    tracing::debug!(id = %response.id, finish = ?response.finish_reason, "Response received");

    if let Some(reasoning) = response.reasoning.as_deref().filter(|r| !r.is_empty()) {
        println!("--- reasoning ---\n{reasoning}\n--- answer ---");
    }
    println!("{}", response.text);
    Ok(())
}
