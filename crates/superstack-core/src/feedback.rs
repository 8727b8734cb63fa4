//! Feedback on how well modules served a model, and the reports built from it.
//!
//! Every rating is appended to a single `module-feedback` record. Reports are
//! computed from the full log on each call; nothing is cached.

use crate::error::{Result, SuperstackError};
use crate::paths::MODULE_FEEDBACK_KEY;
use crate::store::JsonStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// FeedbackKind / FeedbackEntry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackKind {
    Positive,
    Negative,
    Suggestion,
}

impl FeedbackKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackKind::Positive => "positive",
            FeedbackKind::Negative => "negative",
            FeedbackKind::Suggestion => "suggestion",
        }
    }
}

impl fmt::Display for FeedbackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeedbackKind {
    type Err = SuperstackError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "positive" | "+" => Ok(FeedbackKind::Positive),
            "negative" | "-" => Ok(FeedbackKind::Negative),
            "suggestion" => Ok(FeedbackKind::Suggestion),
            _ => Err(SuperstackError::InvalidFeedbackKind(s.to_string())),
        }
    }
}

/// One rating of one module as used with one model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackEntry {
    pub module: String,
    pub model: String,
    #[serde(rename = "type")]
    pub kind: FeedbackKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<String>,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

/// The whole feedback log, oldest first. Missing or corrupt records read as
/// an empty log.
pub fn get_feedback(store: &dyn JsonStore) -> Result<Vec<FeedbackEntry>> {
    let Some(data) = store.read(MODULE_FEEDBACK_KEY)? else {
        return Ok(Vec::new());
    };
    match serde_json::from_str::<Vec<FeedbackEntry>>(&data) {
        Ok(entries) => Ok(entries),
        Err(e) => {
            tracing::warn!(error = %e, "feedback record is corrupt, starting empty");
            Ok(Vec::new())
        }
    }
}

/// Append `entries` in one write. Returns the log length afterwards.
pub fn record_feedback(store: &dyn JsonStore, entries: Vec<FeedbackEntry>) -> Result<usize> {
    if let Some(bad) = entries.iter().find(|e| e.module.trim().is_empty()) {
        return Err(SuperstackError::InvalidModulePath(bad.module.clone()));
    }
    let mut log = get_feedback(store)?;
    log.extend(entries);
    let data = serde_json::to_string_pretty(&log)?;
    store.write(MODULE_FEEDBACK_KEY, &data)?;
    Ok(log.len())
}

pub fn add_feedback(
    store: &dyn JsonStore,
    module: &str,
    model: &str,
    kind: FeedbackKind,
    detail: Option<&str>,
    session: Option<&str>,
) -> Result<FeedbackEntry> {
    let entry = FeedbackEntry {
        module: module.to_string(),
        model: model.to_string(),
        kind,
        detail: detail.map(str::to_string),
        session: session.map(str::to_string),
        timestamp: Utc::now(),
    };
    record_feedback(store, vec![entry.clone()])?;
    tracing::info!(module, kind = %kind, "recorded feedback");
    Ok(entry)
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModulePerformance {
    pub module: String,
    pub total: usize,
    pub positive: usize,
    pub negative: usize,
    pub suggestions: usize,
    /// `negative / total`, 0 when there is no feedback.
    pub negative_ratio: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_feedback: Option<DateTime<Utc>>,
}

impl ModulePerformance {
    fn empty(module: &str) -> Self {
        Self {
            module: module.to_string(),
            total: 0,
            positive: 0,
            negative: 0,
            suggestions: 0,
            negative_ratio: 0.0,
            last_feedback: None,
        }
    }

    fn count(&mut self, entry: &FeedbackEntry) {
        self.total += 1;
        match entry.kind {
            FeedbackKind::Positive => self.positive += 1,
            FeedbackKind::Negative => self.negative += 1,
            FeedbackKind::Suggestion => self.suggestions += 1,
        }
        self.negative_ratio = self.negative as f64 / self.total as f64;
        if self.last_feedback.map_or(true, |t| entry.timestamp > t) {
            self.last_feedback = Some(entry.timestamp);
        }
    }
}

/// Per-module tallies, sorted by module path.
fn tally(entries: &[FeedbackEntry]) -> Vec<ModulePerformance> {
    let mut by_module: BTreeMap<&str, ModulePerformance> = BTreeMap::new();
    for entry in entries {
        by_module
            .entry(entry.module.as_str())
            .or_insert_with(|| ModulePerformance::empty(&entry.module))
            .count(entry);
    }
    by_module.into_values().collect()
}

/// Tallies for one module; all zero when it has never been rated.
pub fn get_module_performance(store: &dyn JsonStore, module: &str) -> Result<ModulePerformance> {
    let mut perf = ModulePerformance::empty(module);
    for entry in get_feedback(store)?.iter().filter(|e| e.module == module) {
        perf.count(entry);
    }
    Ok(perf)
}

/// When a module counts as underperforming.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttentionCriteria {
    /// Minimum `negative_ratio`, inclusive.
    pub threshold: f64,
    /// Modules with fewer ratings than this are not judged yet.
    pub min_feedback: usize,
    pub limit: usize,
}

impl Default for AttentionCriteria {
    fn default() -> Self {
        Self {
            threshold: 0.3,
            min_feedback: 3,
            limit: 10,
        }
    }
}

/// Modules whose negative share meets the threshold, worst first. Ties go
/// to the module with more feedback, then to path order.
pub fn modules_needing_attention(
    store: &dyn JsonStore,
    criteria: &AttentionCriteria,
) -> Result<Vec<ModulePerformance>> {
    let mut flagged: Vec<ModulePerformance> = tally(&get_feedback(store)?)
        .into_iter()
        .filter(|p| p.total >= criteria.min_feedback && p.negative_ratio >= criteria.threshold)
        .collect();
    flagged.sort_by(|a, b| {
        b.negative_ratio
            .partial_cmp(&a.negative_ratio)
            .unwrap_or(Ordering::Equal)
            .then(b.total.cmp(&a.total))
    });
    flagged.truncate(criteria.limit);
    Ok(flagged)
}

#[derive(Debug, Clone, Serialize)]
pub struct PerformanceReport {
    pub generated_at: DateTime<Utc>,
    pub total_modules: usize,
    pub total_feedback: usize,
    /// Most negative ratings first.
    pub top_negative: Vec<ModulePerformance>,
    /// Most positive ratings first.
    pub top_positive: Vec<ModulePerformance>,
}

pub const REPORT_TOP_N: usize = 10;

pub fn generate_performance_report(store: &dyn JsonStore) -> Result<PerformanceReport> {
    let entries = get_feedback(store)?;
    let tallies = tally(&entries);

    let top_by = |key: fn(&ModulePerformance) -> usize| {
        let mut ranked: Vec<ModulePerformance> =
            tallies.iter().filter(|p| key(p) > 0).cloned().collect();
        // Stable: equal counts stay in path order.
        ranked.sort_by_key(|p| std::cmp::Reverse(key(p)));
        ranked.truncate(REPORT_TOP_N);
        ranked
    };

    Ok(PerformanceReport {
        generated_at: Utc::now(),
        total_modules: tallies.len(),
        total_feedback: entries.len(),
        top_negative: top_by(|p| p.negative),
        top_positive: top_by(|p| p.positive),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use FeedbackKind::{Negative as N, Positive as P, Suggestion as S};

    fn rate(store: &MemoryStore, module: &str, kinds: &[FeedbackKind]) {
        for kind in kinds {
            add_feedback(store, module, "claude-3-sonnet", *kind, None, None).unwrap();
        }
    }

    #[test]
    fn kind_parses_names_and_shorthand() {
        assert_eq!("Positive".parse::<FeedbackKind>().unwrap(), P);
        assert_eq!("-".parse::<FeedbackKind>().unwrap(), N);
        assert_eq!("suggestion".parse::<FeedbackKind>().unwrap(), S);
        assert!(matches!(
            "meh".parse::<FeedbackKind>(),
            Err(SuperstackError::InvalidFeedbackKind(_))
        ));
    }

    #[test]
    fn add_appends_to_the_log() {
        let store = MemoryStore::new();
        add_feedback(&store, "react/hooks.md", "gpt-4", N, Some("outdated"), Some("s1")).unwrap();
        add_feedback(&store, "react/hooks.md", "gpt-4", P, None, None).unwrap();
        let log = get_feedback(&store).unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].detail.as_deref(), Some("outdated"));
        assert_eq!(log[0].session.as_deref(), Some("s1"));
        assert_eq!(log[1].kind, P);
    }

    #[test]
    fn blank_module_is_rejected() {
        let store = MemoryStore::new();
        assert!(add_feedback(&store, "  ", "gpt-4", P, None, None).is_err());
        assert!(get_feedback(&store).unwrap().is_empty());
    }

    #[test]
    fn corrupt_log_reads_empty_and_is_replaced() {
        let store = MemoryStore::new();
        store.insert(MODULE_FEEDBACK_KEY, "{oops");
        assert!(get_feedback(&store).unwrap().is_empty());
        rate(&store, "a/b.md", &[P]);
        assert_eq!(get_feedback(&store).unwrap().len(), 1);
    }

    #[test]
    fn wire_format_uses_type_key_and_tolerates_missing_timestamp() {
        let store = MemoryStore::new();
        store.insert(
            MODULE_FEEDBACK_KEY,
            r#"[{"module":"a/b.md","model":"gpt-4","type":"negative"}]"#,
        );
        let log = get_feedback(&store).unwrap();
        assert_eq!(log[0].kind, N);

        rate(&store, "a/b.md", &[P]);
        let raw = store.read(MODULE_FEEDBACK_KEY).unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value[1]["type"], "positive");
        assert!(value[1].get("detail").is_none());
    }

    #[test]
    fn performance_counts_one_module() {
        let store = MemoryStore::new();
        rate(&store, "a/b.md", &[P, N, N, S]);
        rate(&store, "c/d.md", &[N]);
        let perf = get_module_performance(&store, "a/b.md").unwrap();
        assert_eq!((perf.total, perf.positive, perf.negative, perf.suggestions), (4, 1, 2, 1));
        assert!((perf.negative_ratio - 0.5).abs() < f64::EPSILON);
        assert!(perf.last_feedback.is_some());
    }

    #[test]
    fn unrated_module_has_zero_performance() {
        let store = MemoryStore::new();
        let perf = get_module_performance(&store, "a/b.md").unwrap();
        assert_eq!(perf.total, 0);
        assert_eq!(perf.negative_ratio, 0.0);
        assert!(perf.last_feedback.is_none());
    }

    #[test]
    fn attention_applies_threshold_and_minimum() {
        let store = MemoryStore::new();
        rate(&store, "bad/all.md", &[N, N, N]);
        rate(&store, "bad/half.md", &[N, N, P, P]);
        rate(&store, "bad/edge.md", &[N, P, P, S, S, S, P, P, P, P]);
        rate(&store, "good/fine.md", &[P, P, P, P]);
        rate(&store, "new/few.md", &[N, N]);

        let flagged = modules_needing_attention(&store, &AttentionCriteria::default()).unwrap();
        let names: Vec<&str> = flagged.iter().map(|p| p.module.as_str()).collect();
        assert_eq!(names, vec!["bad/all.md", "bad/half.md"]);
    }

    #[test]
    fn attention_ties_prefer_more_feedback_and_respect_limit() {
        let store = MemoryStore::new();
        rate(&store, "a/small.md", &[N, N, N]);
        rate(&store, "b/large.md", &[N, N, N, N]);
        rate(&store, "c/other.md", &[N, N, N]);
        let criteria = AttentionCriteria {
            limit: 2,
            ..AttentionCriteria::default()
        };
        let flagged = modules_needing_attention(&store, &criteria).unwrap();
        let names: Vec<&str> = flagged.iter().map(|p| p.module.as_str()).collect();
        assert_eq!(names, vec!["b/large.md", "a/small.md"]);
    }

    #[test]
    fn report_summarizes_and_ranks() {
        let store = MemoryStore::new();
        rate(&store, "a/b.md", &[N, N, P]);
        rate(&store, "c/d.md", &[P, P, P, N]);
        rate(&store, "e/f.md", &[S]);

        let report = generate_performance_report(&store).unwrap();
        assert_eq!(report.total_modules, 3);
        assert_eq!(report.total_feedback, 8);
        let neg: Vec<&str> = report.top_negative.iter().map(|p| p.module.as_str()).collect();
        assert_eq!(neg, vec!["a/b.md", "c/d.md"]);
        let pos: Vec<&str> = report.top_positive.iter().map(|p| p.module.as_str()).collect();
        assert_eq!(pos, vec!["c/d.md", "a/b.md"]);
    }

    #[test]
    fn empty_report() {
        let report = generate_performance_report(&MemoryStore::new()).unwrap();
        assert_eq!(report.total_modules, 0);
        assert!(report.top_negative.is_empty());
    }
}
