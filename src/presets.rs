//! Prompt presets for common coding tasks.

use crate::Error;
use std::fmt;
use std::str::FromStr;

/// Target language used by [`Preset::Translate`] when none is given.
pub const DEFAULT_TARGET_LANGUAGE: &str = "TypeScript";

/// The closed set of presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Preset {
    Refactor,
    Test,
    Docs,
    Types,
    Translate,
    Explain,
}

/// A preset expanded into the two prompts sent to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresetPrompt {
    pub system: String,
    pub user: String,
}

impl Preset {
    pub const ALL: [Preset; 6] = [
        Preset::Refactor,
        Preset::Test,
        Preset::Docs,
        Preset::Types,
        Preset::Translate,
        Preset::Explain,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Preset::Refactor => "refactor",
            Preset::Test => "test",
            Preset::Docs => "docs",
            Preset::Types => "types",
            Preset::Translate => "translate",
            Preset::Explain => "explain",
        }
    }

    fn system_template(self) -> &'static str {
        match self {
            Preset::Explain => {
                "You are an expert software engineer. Explain code clearly and precisely, \
                 step by step, for a reader who has not seen it before."
            }
            _ => {
                "You are an expert software engineer. Output only code, no explanations \
                 unless asked. Follow best practices and preserve existing behavior."
            }
        }
    }

    fn instruction(self, target_language: &str) -> String {
        match self {
            Preset::Refactor => {
                "Refactor this code to be cleaner and more maintainable:".to_string()
            }
            Preset::Test => "Write comprehensive pytest tests for this code:".to_string(),
            Preset::Docs => "Write docstrings and comments for this code:".to_string(),
            Preset::Types => "Add type hints to this Python code:".to_string(),
            Preset::Translate => format!("Translate this code to {target_language}:"),
            Preset::Explain => "Explain what this code does step by step:".to_string(),
        }
    }

    /// Substitute `context` (and, for `Translate`, the target language) into the templates.
    ///
    /// `target_language` is ignored by every preset except `Translate`, which
    /// falls back to [`DEFAULT_TARGET_LANGUAGE`].
    pub fn expand(self, context: &str, target_language: Option<&str>) -> PresetPrompt {
        let target_language = target_language
            .map(str::trim)
            .filter(|lang| !lang.is_empty())
            .unwrap_or(DEFAULT_TARGET_LANGUAGE);

        PresetPrompt {
            system: self.system_template().to_string(),
            user: format!(
                "{}\n\n```\n{context}\n```",
                self.instruction(target_language)
            ),
        }
    }
}

impl FromStr for Preset {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Preset::ALL
            .into_iter()
            .find(|preset| preset.name() == name)
            .ok_or_else(|| Error::UnknownPreset(name.to_string()))
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Look up a preset by name and expand it.
pub fn expand_preset(
    name: &str,
    context: &str,
    target_language: Option<&str>,
) -> Result<PresetPrompt, Error> {
    Ok(name.parse::<Preset>()?.expand(context, target_language))
}
