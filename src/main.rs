//! cerebras - command-line client for Cerebras Cloud inference
//!
//! Environment Variables:
//!     CEREBRAS_API_KEY: API key (required unless given with --api-key or in the config file)
//!     CEREBRAS_MODEL: Model name (default: glm-4.7)
//!     RUST_LOG: Log filter (default: warn)

use anyhow::{bail, Context, Result};
use cerebras_client::{CerebrasClient, Error, GenerationOptions, Preset};
use clap::{Parser, Subcommand};
use futures_util::StreamExt;
use std::io::{self, Write};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Cerebras inference client
#[derive(Parser)]
#[command(name = "cerebras")]
#[command(about = "Cerebras inference client")]
#[command(after_help = r#"Examples:
    cerebras complete "Explain ownership in Rust" --stream
    cerebras chat "Why does this fail?" --context "$(cat error.log)"
    cerebras code "parse an ISO 8601 date" --language rust
    cerebras preset refactor --context "$(cat src/lib.rs)"
    cat app.py | cerebras preset translate --target-lang Go
"#)]
struct Cli {
    /// API key (overrides CEREBRAS_API_KEY and the config file)
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Model to use (overrides CEREBRAS_MODEL and the config file)
    #[arg(long, global = true)]
    model: Option<String>,

    /// Log request details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

// Keep the key out of logs and panic messages.
impl std::fmt::Debug for Cli {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cli")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("verbose", &self.verbose)
            .field("command", &self.command)
            .finish()
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Simple completion
    Complete {
        /// Prompt text
        prompt: String,
        /// System prompt
        #[arg(long)]
        system: Option<String>,
        /// Print chunks as they arrive
        #[arg(long)]
        stream: bool,
    },
    /// Ask a question, optionally with extra context
    Chat {
        /// User message
        message: String,
        /// Additional context
        #[arg(long)]
        context: Option<String>,
        /// System prompt
        #[arg(long)]
        system: Option<String>,
    },
    /// Generate code
    Code {
        /// Task description
        task: String,
        /// Existing code the task refers to
        #[arg(long)]
        context: Option<String>,
        /// Programming language
        #[arg(long, default_value = "python")]
        language: String,
    },
    /// Run a preset task: refactor, test, docs, types, translate, explain
    Preset {
        /// Preset name
        name: String,
        /// Code to process (read from stdin when omitted)
        #[arg(long)]
        context: Option<String>,
        /// Target language for `translate` (default: TypeScript)
        #[arg(long = "target-lang")]
        target_lang: Option<String>,
    },
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "cerebras_client=debug,warn"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn read_stdin_context() -> Result<String> {
    let context = io::read_to_string(io::stdin()).context("failed to read context from stdin")?;
    if context.trim().is_empty() {
        bail!("no context given; pass --context or pipe code on stdin");
    }
    Ok(context)
}

async fn run(cli: Cli) -> Result<()> {
    // Validate the preset before touching credentials or the network.
    let preset = match &cli.command {
        Command::Preset { name, .. } => Some(name.parse::<Preset>()?),
        _ => None,
    };

    let client = CerebrasClient::new(cli.api_key, cli.model)?;
    tracing::debug!(model = client.model(), "client ready");

    let output = match cli.command {
        Command::Complete {
            prompt,
            system,
            stream: true,
        } => {
            let mut chunks = client
                .stream(&prompt, system.as_deref(), GenerationOptions::default())
                .await?;
            let mut stdout = io::stdout();
            while let Some(chunk) = chunks.next().await {
                let chunk = chunk?;
                stdout.write_all(chunk.as_bytes())?;
                stdout.flush()?;
            }
            String::new()
        }
        Command::Complete { prompt, system, .. } => {
            client
                .complete(&prompt, system.as_deref(), GenerationOptions::default())
                .await?
        }
        Command::Chat {
            message,
            context,
            system,
        } => {
            let prompt = match context {
                Some(context) => format!("Context:\n{context}\n\n{message}"),
                None => message,
            };
            client
                .complete(&prompt, system.as_deref(), GenerationOptions::default())
                .await?
        }
        Command::Code {
            task,
            context,
            language,
        } => client.code(&task, context.as_deref(), &language).await?,
        Command::Preset {
            context,
            target_lang,
            ..
        } => {
            let context = match context {
                Some(context) => context,
                None => read_stdin_context()?,
            };
            let preset = preset.context("preset was validated above")?;
            client
                .preset(preset, &context, target_lang.as_deref())
                .await?
        }
    };

    println!("{output}");
    Ok(())
}

/// Turn an error into the message shown to the user.
fn describe(err: &anyhow::Error) -> String {
    match err.downcast_ref::<Error>() {
        Some(e) if e.is_auth_error() => {
            format!("Invalid API key: the server rejected the credentials (HTTP 401).\n{e}")
        }
        Some(e) if e.is_rate_limited() => {
            format!("Rate limited: too many requests (HTTP 429). Wait and retry.\n{e}")
        }
        _ => format!("{err:#}"),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {}", describe(&err));
            ExitCode::FAILURE
        }
    }
}
