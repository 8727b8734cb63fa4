use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Args;
use std::path::PathBuf;
use superstack_core::split::{split_by_heading, write_chunks, DEFAULT_MAX_TOKENS};

#[derive(Args)]
pub struct SplitArgs {
    /// Markdown document to split
    input: PathBuf,

    /// Directory for the generated module files
    out_dir: PathBuf,

    /// Heading level that starts a new file
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=6))]
    level: u8,

    /// Warn about files larger than this many tokens
    #[arg(long, default_value_t = DEFAULT_MAX_TOKENS)]
    max_tokens: usize,
}

pub fn run(args: SplitArgs, json: bool) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    let chunks = split_by_heading(&text, args.level as usize);
    if chunks.is_empty() {
        anyhow::bail!(
            "no level-{} headings found in {}",
            args.level,
            args.input.display()
        );
    }

    let report = write_chunks(&args.out_dir, &chunks, args.max_tokens)
        .with_context(|| format!("failed to write chunks to {}", args.out_dir.display()))?;

    if json {
        return print_json(&report);
    }

    let rows = report
        .written
        .iter()
        .zip(&chunks)
        .map(|(path, chunk)| {
            let flag = if chunk.tokens > args.max_tokens { "over" } else { "" };
            vec![
                path.display().to_string(),
                chunk.tokens.to_string(),
                flag.to_string(),
            ]
        })
        .collect();
    print_table(&["FILE", "TOKENS", ""], rows);
    println!("\nWrote {} file(s).", report.written.len());
    if !report.oversized.is_empty() {
        println!(
            "{} file(s) exceed {} tokens; consider splitting them further.",
            report.oversized.len(),
            args.max_tokens
        );
    }
    Ok(())
}
