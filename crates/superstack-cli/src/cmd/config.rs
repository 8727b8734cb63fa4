use crate::cmd::Env;
use crate::output::{print_fields, print_json};
use anyhow::Context;
use clap::Subcommand;
use std::path::{Path, PathBuf};
use superstack_core::{
    config::{Config, ConfigWarning, WarnLevel},
    format::Registry,
    paths,
};

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show the effective configuration and where it came from
    Show,

    /// Validate the config for common mistakes
    Validate,

    /// Set one config value (an empty value unsets optional keys)
    Set {
        /// default_formatter, default_model, user_prompt_tokens, modules_dir or project
        key: String,
        value: String,
    },
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(
    env: &Env,
    state_dir: &Path,
    subcmd: ConfigSubcommand,
    json: bool,
) -> anyhow::Result<()> {
    match subcmd {
        ConfigSubcommand::Show => show(env, state_dir, json),
        ConfigSubcommand::Validate => validate(env, json),
        ConfigSubcommand::Set { key, value } => set(state_dir, &key, &value, json),
    }
}

// ---------------------------------------------------------------------------
// show
// ---------------------------------------------------------------------------

fn show(env: &Env, state_dir: &Path, json: bool) -> anyhow::Result<()> {
    let config_file = paths::config_path(state_dir);

    if json {
        let value = serde_json::json!({
            "config": env.config,
            "config_file": config_file,
            "config_file_exists": config_file.is_file(),
            "state_dir": state_dir,
            "modules_root": env.modules_root,
        });
        return print_json(&value);
    }

    print_fields(&[
        ("State dir", state_dir.display().to_string()),
        (
            "Config file",
            if config_file.is_file() {
                config_file.display().to_string()
            } else {
                format!("{} (not present, using defaults)", config_file.display())
            },
        ),
        ("Modules root", env.modules_root.display().to_string()),
    ]);
    println!();
    print!("{}", serde_yaml::to_string(env.config)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

fn validate(env: &Env, json: bool) -> anyhow::Result<()> {
    let warnings = env.config.validate(&Registry::default());

    if json {
        let value = serde_json::json!({
            "warnings": warnings,
        });
        print_json(&value)?;
    } else if warnings.is_empty() {
        println!("Config is valid. No warnings.");
    } else {
        print_warnings(&warnings);
    }

    let has_errors = warnings.iter().any(|w| w.level == WarnLevel::Error);
    if has_errors {
        anyhow::bail!("config validation found errors");
    }

    Ok(())
}

fn print_warnings(warnings: &[ConfigWarning]) {
    for w in warnings {
        let prefix = match w.level {
            WarnLevel::Warning => "warning",
            WarnLevel::Error => "error",
        };
        println!("[{prefix}] {}", w.message);
    }
}

// ---------------------------------------------------------------------------
// set
// ---------------------------------------------------------------------------

fn set(state_dir: &Path, key: &str, value: &str, json: bool) -> anyhow::Result<()> {
    let mut config = Config::load(state_dir).context("failed to load config")?;
    let optional = |v: &str| Some(v.to_string()).filter(|v| !v.is_empty());
    match key {
        "default_formatter" => config.default_formatter = value.to_string(),
        "default_model" => config.default_model = value.to_string(),
        "user_prompt_tokens" => {
            config.user_prompt_tokens = value
                .parse()
                .with_context(|| format!("user_prompt_tokens expects a number, got '{value}'"))?
        }
        "modules_dir" => config.modules_dir = optional(value).map(PathBuf::from),
        "project" => config.project = optional(value),
        other => anyhow::bail!(
            "unknown config key '{other}'; valid: default_formatter, default_model, \
             user_prompt_tokens, modules_dir, project"
        ),
    }

    let warnings = config.validate(&Registry::default());
    if let Some(err) = warnings.iter().find(|w| w.level == WarnLevel::Error) {
        anyhow::bail!("refusing to save config: {}", err.message);
    }
    config.save(state_dir).context("failed to save config")?;

    if json {
        let value = serde_json::json!({
            "config": config,
            "warnings": warnings,
        });
        return print_json(&value);
    }
    print_warnings(&warnings);
    println!("Set {key}.");
    Ok(())
}
