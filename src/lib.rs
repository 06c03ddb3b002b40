//! A small client for Cerebras Cloud inference.
//!
//! Resolves an API key and model from arguments, the environment or
//! `~/.config/cerebras/config`, then sends chat completions to the
//! OpenAI-compatible endpoint, either buffered or streamed chunk by chunk.
//!
//! ```no_run
//! use cerebras_client::{CerebrasClient, GenerationOptions};
//!
//! # async fn run() -> Result<(), cerebras_client::Error> {
//! let client = CerebrasClient::new(None, None)?;
//! let answer = client
//!     .complete("What is the capital of France?", None, GenerationOptions::default())
//!     .await?;
//! println!("{answer}");
//! # Ok(())
//! # }
//! ```

pub mod accumulator;
pub mod client;
pub mod config;
pub mod error;
pub mod presets;
pub mod provider;
pub mod providers;
pub mod response;
pub mod sse_stream;
pub mod types;

// Re-export core types for easy usage
pub use client::CerebrasClient;
pub use config::{ClientConfig, ConfigSources, FileConfig};
pub use error::Error;
pub use presets::{expand_preset, Preset, PresetPrompt};
pub use provider::CompletionProvider;
pub use providers::CerebrasProvider;
pub use response::{CompleteResponse, Response, TextStream};
pub use sse_stream::SseEvent;
pub use types::*;
