use crate::error::Result;
use crate::format::Registry;
use crate::paths;
use crate::tokens::{self, DEFAULT_USER_PROMPT_TOKENS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// User settings from `<state dir>/config.yaml`. Every field has a default so
/// a missing or partial file is fine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Where context modules live. Overridden by `--modules`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modules_dir: Option<PathBuf>,
    #[serde(default = "default_formatter")]
    pub default_formatter: String,
    #[serde(default = "default_model")]
    pub default_model: String,
    #[serde(default = "default_user_prompt_tokens")]
    pub user_prompt_tokens: usize,
    /// Project reported for pushes when the active context has no tag of its own.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
}

fn default_formatter() -> String {
    "claude".to_string()
}

fn default_model() -> String {
    "claude-3-sonnet".to_string()
}

fn default_user_prompt_tokens() -> usize {
    DEFAULT_USER_PROMPT_TOKENS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            modules_dir: None,
            default_formatter: default_formatter(),
            default_model: default_model(),
            user_prompt_tokens: default_user_prompt_tokens(),
            project: None,
        }
    }
}

impl Config {
    /// Load from the state directory; a missing file yields defaults.
    pub fn load(state_dir: &Path) -> Result<Self> {
        let path = paths::config_path(state_dir);
        match crate::io::read_if_exists(&path)? {
            Some(data) => Ok(serde_yaml::from_str(&data)?),
            None => Ok(Self::default()),
        }
    }

    pub fn save(&self, state_dir: &Path) -> Result<()> {
        let path = paths::config_path(state_dir);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self, registry: &Registry) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if !registry.contains(&self.default_formatter) {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!(
                    "unknown default_formatter '{}' (available: {})",
                    self.default_formatter,
                    registry
                        .list()
                        .iter()
                        .map(|f| f.id)
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            });
        }

        if !tokens::is_known_model(&self.default_model) {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "unknown default_model '{}': token limit falls back to {}",
                    self.default_model,
                    tokens::DEFAULT_MODEL_LIMIT
                ),
            });
        }

        let check = tokens::check_limit("", &self.default_model, self.user_prompt_tokens);
        if check.available_tokens <= 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "user_prompt_tokens={} leaves no room for context in '{}' ({} tokens)",
                    self.user_prompt_tokens, self.default_model, check.model_limit
                ),
            });
        }

        if let Some(dir) = &self.modules_dir {
            if !dir.is_dir() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!("modules_dir '{}' does not exist", dir.display()),
                });
            }
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
