use crate::cmd::Env;
use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Args;
use std::collections::HashSet;
use std::io::Read;
use std::path::PathBuf;
use superstack_core::{
    catalog::list_modules,
    recommend::{recommend, RecommendOptions},
};

#[derive(Args)]
pub struct RecommendArgs {
    /// File to analyze (default: stdin)
    file: Option<PathBuf>,

    /// Analyze this text instead of a file
    #[arg(long, conflicts_with = "file")]
    text: Option<String>,

    #[arg(long, default_value_t = 5)]
    max_modules: usize,

    #[arg(long, default_value_t = 2)]
    max_groups: usize,

    /// Ignore domains scoring below this
    #[arg(long, default_value_t = 1)]
    min_score: usize,

    /// Include per-domain scores and matches
    #[arg(long)]
    analysis: bool,
}

pub fn run(env: &Env, args: RecommendArgs, json: bool) -> anyhow::Result<()> {
    let content = match (&args.text, &args.file) {
        (Some(t), _) => t.clone(),
        (None, Some(f)) => std::fs::read_to_string(f)
            .with_context(|| format!("failed to read {}", f.display()))?,
        (None, None) => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            buf
        }
    };

    let rec = recommend(
        &content,
        &RecommendOptions {
            max_modules: args.max_modules,
            max_groups: args.max_groups,
            min_score: args.min_score,
            include_analysis: args.analysis,
        },
    );

    if json {
        return print_json(&rec);
    }

    if rec.modules.is_empty() && rec.groups.is_empty() {
        println!("No recommendations for this content.");
        return Ok(());
    }

    // Suggestions come from a fixed table; flag the ones this catalog lacks.
    let available: HashSet<String> = list_modules(env.modules_root)
        .map(|ms| ms.into_iter().map(|m| m.path).collect())
        .unwrap_or_default();

    println!("Modules:");
    for m in &rec.modules {
        let note = if available.contains(m) { "" } else { "  (not installed)" };
        println!("  {m}{note}");
    }
    if !rec.groups.is_empty() {
        println!("Groups:");
        for g in &rec.groups {
            println!("  {g}");
        }
    }

    if let Some(analysis) = &rec.domain_analysis {
        println!();
        let rows = analysis
            .iter()
            .map(|d| vec![d.domain.clone(), d.score.to_string(), d.matches.join(", ")])
            .collect();
        print_table(&["DOMAIN", "SCORE", "MATCHES"], rows);
    }
    Ok(())
}
