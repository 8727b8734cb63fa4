use crate::cmd::Env;
use crate::output::print_json;
use anyhow::Context;
use clap::Args;
use serde::Serialize;
use superstack_core::{
    active::get_active_context,
    catalog::resolve_modules,
    clipboard::copy_to_clipboard,
    format::{FormatOptions, Registry, TokenBudget},
    tokens::{check_limit, LimitCheck},
};

#[derive(Args)]
pub struct PushArgs {
    /// Formatter id (default: config default_formatter)
    #[arg(long = "format", short = 'f')]
    format: Option<String>,

    /// Formatter option as key=value (repeatable)
    #[arg(long = "option", short = 'o', value_name = "KEY=VALUE")]
    options: Vec<String>,

    /// Model used for the limit check (default: config default_model)
    #[arg(long)]
    model: Option<String>,

    /// Print to stdout instead of copying to the clipboard
    #[arg(long)]
    stdout: bool,

    /// Trim module contents so the formatted output stays within this many tokens
    #[arg(long, value_name = "N")]
    max_tokens: Option<usize>,

    /// Keep sections mentioning this keyword first when trimming (repeatable)
    #[arg(long = "priority", value_name = "KEYWORD")]
    priority: Vec<String>,
}

#[derive(Serialize)]
struct PushReport {
    formatter: String,
    modules: usize,
    missing: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    project: Option<String>,
    destination: String,
    truncated: bool,
    limit: LimitCheck,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
}

pub fn run(env: &Env, args: PushArgs, json: bool) -> anyhow::Result<()> {
    let ctx = get_active_context(env.store).context("failed to load active context")?;
    if ctx.modules.is_empty() {
        anyhow::bail!("active context is empty; add modules with `dev context add <path>`");
    }

    let registry = Registry::default();
    let formatter_id = args
        .format
        .unwrap_or_else(|| env.config.default_formatter.clone());
    let formatter = registry.get(&formatter_id)?;
    let opts = FormatOptions::from_pairs(&formatter.info, &args.options)?;

    let modules = resolve_modules(env.modules_root, &ctx.modules);
    let missing: Vec<String> = modules
        .iter()
        .filter(|m| m.missing)
        .map(|m| m.path.clone())
        .collect();

    let budget = args.max_tokens.map(|max_tokens| TokenBudget {
        max_tokens,
        prioritize: args.priority,
    });
    let fitted = registry.fit(&formatter_id, &modules, &opts, budget.as_ref())?;
    if fitted.output.is_empty() {
        match args.max_tokens {
            Some(max) => anyhow::bail!(
                "nothing to push: --max-tokens {max} leaves no room for module content"
            ),
            None => anyhow::bail!("nothing to push: every active module was filtered out"),
        }
    }
    let text = fitted.output.render()?;
    let truncated = fitted.truncated();
    if truncated {
        tracing::warn!(
            trimmed = ?fitted.trimmed,
            dropped = ?fitted.dropped,
            "module content cut to fit --max-tokens"
        );
    }
    let project = ctx
        .project_or(env.config.project.as_deref())
        .map(str::to_string);

    let model = args
        .model
        .unwrap_or_else(|| env.config.default_model.clone());
    let limit = check_limit(&text, &model, env.config.user_prompt_tokens);

    let destination = if args.stdout {
        "stdout".to_string()
    } else {
        copy_to_clipboard(&text)?;
        "clipboard".to_string()
    };

    if json {
        let report = PushReport {
            formatter: formatter_id,
            modules: fitted.modules,
            missing,
            project,
            destination,
            truncated,
            limit,
            content: args.stdout.then_some(text),
        };
        return print_json(&report);
    }

    if args.stdout {
        println!("{text}");
    }
    for m in &missing {
        eprintln!("warning: module not found, pushed a placeholder: {m}");
    }
    if !limit.fits {
        eprintln!(
            "warning: {} tokens exceeds the {} available for {} ({} over)",
            limit.content_tokens, limit.available_tokens, limit.model, -limit.remaining_tokens
        );
    }
    if !args.stdout {
        let scope = project
            .map(|p| format!(" for project '{p}'"))
            .unwrap_or_default();
        println!(
            "Pushed {} module(s) as '{formatter_id}'{scope} to {destination}: ~{} tokens ({}% of {}).",
            fitted.modules,
            limit.content_tokens,
            limit.usage_percent,
            limit.model
        );
    }
    Ok(())
}
