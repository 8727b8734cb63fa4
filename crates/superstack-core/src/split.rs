//! Break a long markdown document into module-sized files, one per heading.

use crate::error::Result;
use crate::tokens::estimate_token_count;
use serde::Serialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_MAX_TOKENS: usize = 3500;
const MAX_SLUG_LEN: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chunk {
    /// Zero-based position in the source document.
    pub index: usize,
    pub heading: String,
    pub text: String,
    pub tokens: usize,
}

/// One chunk per heading line of exactly `level` hashes. Anything before the
/// first such heading is dropped.
pub fn split_by_heading(text: &str, level: usize) -> Vec<Chunk> {
    let prefix = format!("{} ", "#".repeat(level.max(1)));
    let mut sections: Vec<(String, Vec<&str>)> = Vec::new();

    for line in text.lines() {
        if line.starts_with(&prefix) {
            sections.push((line.trim().to_string(), Vec::new()));
        } else if let Some((_, body)) = sections.last_mut() {
            body.push(line);
        }
    }

    sections
        .into_iter()
        .enumerate()
        .map(|(index, (heading, body))| {
            let text = format!("{heading}\n{}", body.join("\n").trim());
            Chunk {
                index,
                tokens: estimate_token_count(&text),
                heading,
                text,
            }
        })
        .collect()
}

/// `NN-<slug>.md`: 1-based, zero-padded position plus the lowercased heading
/// with spaces turned into dashes, capped at 50 characters.
pub fn chunk_filename(index: usize, heading: &str) -> String {
    let slug: String = heading
        .trim_matches(|c| c == '#' || c == ' ')
        .to_lowercase()
        .replace([' ', '/', '\\'], "-")
        .chars()
        .take(MAX_SLUG_LEN)
        .collect();
    format!("{:02}-{slug}.md", index + 1)
}

#[derive(Debug, Clone, Serialize)]
pub struct SplitReport {
    pub written: Vec<PathBuf>,
    /// Chunks over the token budget. They are still written.
    pub oversized: Vec<Chunk>,
}

pub fn write_chunks(out_dir: &Path, chunks: &[Chunk], max_tokens: usize) -> Result<SplitReport> {
    crate::io::ensure_dir(out_dir)?;
    let mut written = Vec::with_capacity(chunks.len());
    let mut oversized = Vec::new();

    for chunk in chunks {
        if chunk.tokens > max_tokens {
            tracing::warn!(
                index = chunk.index,
                tokens = chunk.tokens,
                max_tokens,
                "chunk exceeds token budget, consider splitting it by hand"
            );
            oversized.push(chunk.clone());
        }
        let path = out_dir.join(chunk_filename(chunk.index, &chunk.heading));
        crate::io::atomic_write(&path, chunk.text.as_bytes())?;
        written.push(path);
    }

    Ok(SplitReport { written, oversized })
}
