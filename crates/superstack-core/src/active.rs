use crate::error::Result;
use crate::paths::ACTIVE_CONTEXT_KEY;
use crate::store::JsonStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ActiveContext
// ---------------------------------------------------------------------------

/// The modules selected for the next push.
///
/// `modules` never holds the same path twice. Paths are not checked against
/// the catalog here; stale entries surface as placeholders when formatted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveContext {
    #[serde(default)]
    pub modules: Vec<String>,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
}

impl Default for ActiveContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ActiveContext {
    pub fn new() -> Self {
        Self {
            modules: Vec::new(),
            timestamp: Utc::now(),
            project: None,
        }
    }

    /// The context's own project tag, else `fallback` (the configured default).
    pub fn project_or<'a>(&'a self, fallback: Option<&'a str>) -> Option<&'a str> {
        self.project.as_deref().or(fallback)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.modules.iter().any(|m| m == path)
    }

    /// Append paths not already present. Returns how many were added.
    pub fn add(&mut self, paths: &[String]) -> usize {
        let before = self.modules.len();
        for p in paths {
            if !self.contains(p) {
                self.modules.push(p.clone());
            }
        }
        self.modules.len() - before
    }

    /// Drop every path listed. Returns how many were removed.
    pub fn remove(&mut self, paths: &[String]) -> usize {
        let before = self.modules.len();
        self.modules.retain(|m| !paths.contains(m));
        before - self.modules.len()
    }
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

/// Load the active context. A missing or unparseable record yields a fresh
/// empty one so the CLI keeps working on first run or after a manual delete.
pub fn get_active_context(store: &dyn JsonStore) -> Result<ActiveContext> {
    let Some(data) = store.read(ACTIVE_CONTEXT_KEY)? else {
        return Ok(ActiveContext::new());
    };
    match serde_json::from_str::<ActiveContext>(&data) {
        Ok(mut ctx) => {
            dedup_in_place(&mut ctx.modules);
            Ok(ctx)
        }
        Err(e) => {
            tracing::warn!(error = %e, "active context record is corrupt, starting empty");
            Ok(ActiveContext::new())
        }
    }
}

/// Persist `ctx`, stamping its timestamp with the current time.
pub fn save_active_context(store: &dyn JsonStore, ctx: &mut ActiveContext) -> Result<()> {
    ctx.timestamp = Utc::now();
    let data = serde_json::to_string_pretty(ctx)?;
    store.write(ACTIVE_CONTEXT_KEY, &data)
}

pub fn add_modules_to_active_context(
    store: &dyn JsonStore,
    paths: &[String],
) -> Result<ActiveContext> {
    let mut ctx = get_active_context(store)?;
    ctx.add(paths);
    save_active_context(store, &mut ctx)?;
    Ok(ctx)
}

/// Remove paths. Persists even when nothing matched.
pub fn remove_modules_from_active_context(
    store: &dyn JsonStore,
    paths: &[String],
) -> Result<ActiveContext> {
    let mut ctx = get_active_context(store)?;
    ctx.remove(paths);
    save_active_context(store, &mut ctx)?;
    Ok(ctx)
}

pub fn clear_active_context(store: &dyn JsonStore) -> Result<ActiveContext> {
    let mut ctx = ActiveContext::new();
    save_active_context(store, &mut ctx)?;
    Ok(ctx)
}

/// Set or clear the project scope tag.
pub fn set_active_project(store: &dyn JsonStore, project: Option<&str>) -> Result<ActiveContext> {
    let mut ctx = get_active_context(store)?;
    ctx.project = project.map(str::to_string);
    save_active_context(store, &mut ctx)?;
    Ok(ctx)
}

/// Hand-edited records can contain repeats; keep first occurrences.
fn dedup_in_place(paths: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::new();
    paths.retain(|p| seen.insert(p.clone()));
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
