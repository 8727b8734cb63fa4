use crate::cmd::Env;
use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use superstack_core::{
    active::get_active_context,
    catalog::resolve_modules,
    tokens::{check_limit, detailed_estimate, LimitCheck, TokenEstimate},
};

#[derive(Args)]
pub struct TokensArgs {
    /// Files to measure (default: the active context)
    files: Vec<PathBuf>,

    /// Model to check against (default: config default_model)
    #[arg(long)]
    model: Option<String>,

    /// Tokens reserved for your own prompt (default: config user_prompt_tokens)
    #[arg(long, value_name = "N")]
    prompt_tokens: Option<usize>,
}

#[derive(Serialize)]
struct SourceEstimate {
    source: String,
    estimate: TokenEstimate,
}

#[derive(Serialize)]
struct TokensReport {
    sources: Vec<SourceEstimate>,
    total: TokenEstimate,
    limit: LimitCheck,
}

pub fn run(env: &Env, args: TokensArgs, json: bool) -> anyhow::Result<()> {
    let texts = if args.files.is_empty() {
        active_texts(env)?
    } else {
        args.files
            .iter()
            .map(|f| {
                std::fs::read_to_string(f)
                    .with_context(|| format!("failed to read {}", f.display()))
                    .map(|t| (f.display().to_string(), t))
            })
            .collect::<anyhow::Result<Vec<_>>>()?
    };

    let combined = texts
        .iter()
        .map(|(_, t)| t.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    let model = args
        .model
        .unwrap_or_else(|| env.config.default_model.clone());
    let prompt_tokens = args
        .prompt_tokens
        .unwrap_or(env.config.user_prompt_tokens);

    let report = TokensReport {
        sources: texts
            .iter()
            .map(|(source, t)| SourceEstimate {
                source: source.clone(),
                estimate: detailed_estimate(t),
            })
            .collect(),
        total: detailed_estimate(&combined),
        limit: check_limit(&combined, &model, prompt_tokens),
    };

    if json {
        return print_json(&report);
    }

    let mut rows: Vec<Vec<String>> = report
        .sources
        .iter()
        .map(|s| estimate_row(&s.source, &s.estimate))
        .collect();
    if report.sources.len() > 1 {
        rows.push(estimate_row("total", &report.total));
    }
    print_table(&["SOURCE", "CHARS/4", "WORDS", "LINES", "ESTIMATE"], rows);

    let l = &report.limit;
    println!();
    println!(
        "{}: {} tokens, {} overhead, {} reserved for prompt, {} available",
        l.model, l.model_limit, l.overhead_tokens, l.user_prompt_tokens, l.available_tokens
    );
    if l.fits {
        println!(
            "Fits: {} tokens ({}% of window), {} to spare.",
            l.content_tokens, l.usage_percent, l.remaining_tokens
        );
    } else {
        println!(
            "Does not fit: {} tokens, {} over.",
            l.content_tokens, -l.remaining_tokens
        );
    }
    Ok(())
}

fn active_texts(env: &Env) -> anyhow::Result<Vec<(String, String)>> {
    let ctx = get_active_context(env.store).context("failed to load active context")?;
    Ok(resolve_modules(env.modules_root, &ctx.modules)
        .into_iter()
        .map(|m| (m.path, m.content))
        .collect())
}

fn estimate_row(source: &str, e: &TokenEstimate) -> Vec<String> {
    vec![
        source.to_string(),
        e.by_chars.to_string(),
        e.by_words.to_string(),
        e.by_lines.to_string(),
        e.recommended.to_string(),
    ]
}
