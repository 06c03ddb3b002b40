//! Client configuration resolution.
//!
//! The API key and model are resolved from, in order of precedence: an
//! explicit argument, the `CEREBRAS_API_KEY` / `CEREBRAS_MODEL` environment
//! variables, and the config file at `~/.config/cerebras/config`. A missing
//! key is an error; a missing model falls back to [`DEFAULT_MODEL`].
//!
//! [`resolve`] is pure. Only [`ConfigSources::from_process`] reads the
//! environment and filesystem.

use crate::Error;
use std::env;
use std::path::{Path, PathBuf};

pub const API_KEY_VAR: &str = "CEREBRAS_API_KEY";
pub const MODEL_VAR: &str = "CEREBRAS_MODEL";
pub const DEFAULT_MODEL: &str = "glm-4.7";
pub const DEFAULT_BASE_URL: &str = "https://api.cerebras.ai/v1";

/// Resolved, immutable client configuration.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

impl ClientConfig {
    /// Configuration with the default model and endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Point the client at a different OpenAI-compatible endpoint, e.g. a local mock.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Resolve from explicit arguments, the process environment and the default config file.
    pub fn resolve(api_key: Option<String>, model: Option<String>) -> Result<Self, Error> {
        resolve(&ConfigSources::from_process(api_key, model)?)
    }
}

// Keep the key out of logs and panic messages.
impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Values read from the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileConfig {
    pub api_key: Option<String>,
    pub model: Option<String>,
}

impl FileConfig {
    /// Parse `KEY=value` lines. Keys are matched case-insensitively and
    /// surrounding quotes are stripped; values are otherwise taken literally.
    /// Blank lines, `#` comments and unknown keys are ignored, and lines
    /// without `=` are skipped.
    pub fn parse(content: &str) -> Self {
        let mut config = FileConfig::default();

        for (index, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                tracing::warn!(line = index + 1, "skipping malformed config line");
                continue;
            };

            let key = key.trim();
            let value = value.trim().trim_matches(|c: char| c == '"' || c == '\'').to_string();

            if key.eq_ignore_ascii_case(API_KEY_VAR) {
                config.api_key = Some(value);
            } else if key.eq_ignore_ascii_case(MODEL_VAR) {
                config.model = Some(value);
            }
        }

        config
    }

    /// Load the config file at `path`. A file that does not exist yields an empty config.
    pub fn load(path: &Path) -> Result<Self, Error> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                tracing::debug!(path = %path.display(), "loaded config file");
                Ok(Self::parse(&content))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(Error::config(format!(
                "failed to read {}: {e}",
                path.display()
            ))),
        }
    }
}

/// The well-known config file location, `~/.config/cerebras/config`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".config").join("cerebras").join("config"))
}

/// Every input to configuration resolution, gathered up front.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    pub explicit_api_key: Option<String>,
    pub explicit_model: Option<String>,
    pub env_api_key: Option<String>,
    pub env_model: Option<String>,
    pub file: FileConfig,
}

impl ConfigSources {
    /// Gather sources from the process environment and the default config file.
    pub fn from_process(
        explicit_api_key: Option<String>,
        explicit_model: Option<String>,
    ) -> Result<Self, Error> {
        let file = match default_config_path() {
            Some(path) => FileConfig::load(&path)?,
            None => FileConfig::default(),
        };

        Ok(Self {
            explicit_api_key,
            explicit_model,
            env_api_key: env::var(API_KEY_VAR).ok(),
            env_model: env::var(MODEL_VAR).ok(),
            file,
        })
    }
}

/// First value that is present and not blank.
fn first_set<'a>(candidates: [Option<&'a String>; 3]) -> Option<&'a str> {
    candidates
        .into_iter()
        .flatten()
        .map(|value| value.trim())
        .find(|value| !value.is_empty())
}

/// Resolve a [`ClientConfig`]: explicit > environment > config file.
pub fn resolve(sources: &ConfigSources) -> Result<ClientConfig, Error> {
    let api_key = first_set([
        sources.explicit_api_key.as_ref(),
        sources.env_api_key.as_ref(),
        sources.file.api_key.as_ref(),
    ])
    .ok_or(Error::MissingCredential)?;

    let model = first_set([
        sources.explicit_model.as_ref(),
        sources.env_model.as_ref(),
        sources.file.model.as_ref(),
    ])
    .unwrap_or(DEFAULT_MODEL);

    Ok(ClientConfig::new(api_key).with_model(model))
}
