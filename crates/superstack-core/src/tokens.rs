//! Approximate token accounting.
//!
//! Nothing here tokenizes. The estimates are fixed heuristics kept stable so
//! numbers printed by earlier versions stay comparable: 4 characters per
//! token, 0.75 tokens per word, 5 tokens per line, blended 2:1:1 in favor of
//! the character count. All arithmetic is integer so results are exact.

use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

pub const DEFAULT_MODEL_LIMIT: usize = 4096;
pub const DEFAULT_USER_PROMPT_TOKENS: usize = 500;
pub const TRUNCATION_MARKER: &str = "[... content truncated to fit token limit ...]";

/// Context window sizes by model name.
pub const MODEL_LIMITS: &[(&str, usize)] = &[
    ("gpt-3.5-turbo", 4096),
    ("gpt-3.5-turbo-16k", 16384),
    ("gpt-4", 8192),
    ("gpt-4-32k", 32768),
    ("gpt-4-turbo", 128000),
    ("gpt-4o", 128000),
    ("claude-instant", 100000),
    ("claude-2", 100000),
    ("claude-3-haiku", 200000),
    ("claude-3-sonnet", 200000),
    ("claude-3-opus", 200000),
    ("claude-3-5-sonnet", 200000),
    ("gemini-pro", 32768),
    ("gemini-1.5-pro", 1000000),
    ("default", DEFAULT_MODEL_LIMIT),
];

// ---------------------------------------------------------------------------
// Estimates
// ---------------------------------------------------------------------------

/// `ceil(chars / 4)`.
pub fn estimate_token_count(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TokenEstimate {
    pub by_chars: usize,
    pub by_words: usize,
    pub by_lines: usize,
    pub recommended: usize,
}

pub fn detailed_estimate(text: &str) -> TokenEstimate {
    let by_chars = estimate_token_count(text);
    let words = text.split_whitespace().count();
    let lines = if text.is_empty() {
        0
    } else {
        text.split('\n').count()
    };
    let by_words = (words * 3).div_ceil(4);
    let by_lines = lines * 5;
    let recommended = (2 * by_chars + by_words + by_lines).div_ceil(4);
    TokenEstimate {
        by_chars,
        by_words,
        by_lines,
        recommended,
    }
}

// ---------------------------------------------------------------------------
// Model limits
// ---------------------------------------------------------------------------

pub fn model_limit(model: &str) -> usize {
    MODEL_LIMITS
        .iter()
        .find(|(name, _)| *name == model)
        .map(|(_, limit)| *limit)
        .unwrap_or(DEFAULT_MODEL_LIMIT)
}

pub fn is_known_model(model: &str) -> bool {
    MODEL_LIMITS.iter().any(|(name, _)| *name == model)
}

#[derive(Debug, Clone, Serialize)]
pub struct LimitCheck {
    pub model: String,
    pub fits: bool,
    pub content_tokens: usize,
    /// Negative when the prompt reservation and overhead exceed the window.
    pub available_tokens: i64,
    pub remaining_tokens: i64,
    pub model_limit: usize,
    pub overhead_tokens: usize,
    pub user_prompt_tokens: usize,
    /// Content as a share of the whole window, one decimal place.
    pub usage_percent: f64,
}

/// Whether `content` fits in `model`'s window after reserving room for the
/// user's prompt and a 10% response/formatting overhead.
pub fn check_limit(content: &str, model: &str, user_prompt_tokens: usize) -> LimitCheck {
    let limit = model_limit(model);
    let content_tokens = estimate_token_count(content);
    let overhead_tokens = limit / 10;
    let available_tokens = limit as i64 - user_prompt_tokens as i64 - overhead_tokens as i64;
    let usage_percent = (content_tokens as f64 / limit as f64 * 1000.0).round() / 10.0;

    LimitCheck {
        model: model.to_string(),
        fits: content_tokens as i64 <= available_tokens,
        content_tokens,
        available_tokens,
        remaining_tokens: available_tokens - content_tokens as i64,
        model_limit: limit,
        overhead_tokens,
        user_prompt_tokens,
        usage_percent,
    }
}

// ---------------------------------------------------------------------------
// Fitting content to a budget
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct OptimizeOptions {
    /// Keep whole blank-line-separated sections instead of cutting mid-text.
    pub preserve_structure: bool,
    /// Sections mentioning these keywords (case-insensitive) go first.
    pub prioritize_sections: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Optimized {
    pub content: String,
    pub truncated: bool,
    pub original_tokens: usize,
    pub final_tokens: usize,
    pub sections_included: usize,
    pub sections_total: usize,
}

static SECTION_BREAK_RE: OnceLock<Regex> = OnceLock::new();

fn section_break_re() -> &'static Regex {
    SECTION_BREAK_RE.get_or_init(|| Regex::new(r"\n\s*\n").unwrap())
}

pub fn optimize_for_limit(content: &str, target_tokens: usize, opts: &OptimizeOptions) -> Optimized {
    let original_tokens = estimate_token_count(content);
    if original_tokens <= target_tokens {
        return Optimized {
            content: content.to_string(),
            truncated: false,
            original_tokens,
            final_tokens: original_tokens,
            sections_included: 1,
            sections_total: 1,
        };
    }

    if !opts.preserve_structure {
        let chars = content.chars().count();
        let keep = chars * target_tokens / original_tokens;
        let head: String = content.chars().take(keep).collect();
        let out = format!("{head}\n\n{TRUNCATION_MARKER}");
        return Optimized {
            final_tokens: estimate_token_count(&out),
            content: out,
            truncated: true,
            original_tokens,
            sections_included: 0,
            sections_total: 1,
        };
    }

    let mut sections: Vec<&str> = section_break_re()
        .split(content)
        .filter(|s| !s.trim().is_empty())
        .collect();
    let sections_total = sections.len();

    if !opts.prioritize_sections.is_empty() {
        let keywords: Vec<String> = opts
            .prioritize_sections
            .iter()
            .map(|k| k.to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        // sort_by_key is stable: equal scores keep document order.
        sections.sort_by_key(|s| std::cmp::Reverse(section_score(s, &keywords)));
    }

    let mut kept = String::new();
    let mut sections_included = 0;
    for section in &sections {
        let candidate = if kept.is_empty() {
            section.to_string()
        } else {
            format!("{kept}\n\n{section}")
        };
        if estimate_token_count(&candidate) > target_tokens {
            break;
        }
        kept = candidate;
        sections_included += 1;
    }

    let truncated = sections_included < sections_total;
    if truncated {
        if !kept.is_empty() {
            kept.push_str("\n\n");
        }
        kept.push_str(TRUNCATION_MARKER);
    }

    Optimized {
        final_tokens: estimate_token_count(&kept),
        content: kept,
        truncated,
        original_tokens,
        sections_included,
        sections_total,
    }
}

fn section_score(section: &str, keywords: &[String]) -> usize {
    let lower = section.to_lowercase();
    keywords.iter().map(|k| lower.matches(k.as_str()).count()).sum()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
