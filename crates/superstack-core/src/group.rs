use crate::active::{get_active_context, save_active_context};
use crate::error::Result;
use crate::paths::{self, CONTEXT_GROUPS_KEY};
use crate::store::JsonStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// ContextGroup
// ---------------------------------------------------------------------------

/// A named, ordered bundle of module paths. Order is kept as given because
/// formatters render modules in this order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextGroup {
    #[serde(default)]
    pub modules: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "Utc::now")]
    pub created: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated: DateTime<Utc>,
}

impl ContextGroup {
    pub fn new(modules: &[String], description: Option<&str>) -> Self {
        let now = Utc::now();
        let mut ordered: Vec<String> = Vec::with_capacity(modules.len());
        for m in modules {
            if !ordered.contains(m) {
                ordered.push(m.clone());
            }
        }
        Self {
            modules: ordered,
            description: description.map(str::to_string),
            created: now,
            updated: now,
        }
    }
}

/// Group name → group. Sorted by name so listings are stable.
pub type ContextGroups = BTreeMap<String, ContextGroup>;

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

/// All groups; empty when none were ever saved or the record is corrupt.
pub fn get_context_groups(store: &dyn JsonStore) -> Result<ContextGroups> {
    let Some(data) = store.read(CONTEXT_GROUPS_KEY)? else {
        return Ok(ContextGroups::new());
    };
    match serde_json::from_str::<ContextGroups>(&data) {
        Ok(groups) => Ok(groups),
        Err(e) => {
            tracing::warn!(error = %e, "context groups record is corrupt, starting empty");
            Ok(ContextGroups::new())
        }
    }
}

fn save_context_groups(store: &dyn JsonStore, groups: &ContextGroups) -> Result<()> {
    let data = serde_json::to_string_pretty(groups)?;
    store.write(CONTEXT_GROUPS_KEY, &data)
}

pub fn get_context_group(store: &dyn JsonStore, name: &str) -> Result<Option<ContextGroup>> {
    Ok(get_context_groups(store)?.remove(name))
}

/// Create or replace `name`. An existing group is overwritten with fresh
/// timestamps; refusing to overwrite is the caller's decision.
pub fn create_context_group(
    store: &dyn JsonStore,
    name: &str,
    modules: &[String],
    description: Option<&str>,
) -> Result<ContextGroup> {
    paths::validate_group_name(name)?;
    let mut groups = get_context_groups(store)?;
    let group = ContextGroup::new(modules, description);
    groups.insert(name.to_string(), group.clone());
    save_context_groups(store, &groups)?;
    Ok(group)
}

/// Returns `false` when no such group exists.
pub fn delete_context_group(store: &dyn JsonStore, name: &str) -> Result<bool> {
    let mut groups = get_context_groups(store)?;
    if groups.remove(name).is_none() {
        return Ok(false);
    }
    save_context_groups(store, &groups)?;
    Ok(true)
}

/// Union the group's modules into the active context. Returns `false` when
/// no such group exists, leaving the active context untouched.
pub fn add_group_to_active_context(store: &dyn JsonStore, name: &str) -> Result<bool> {
    let Some(group) = get_context_group(store, name)? else {
        return Ok(false);
    };
    let mut ctx = get_active_context(store)?;
    ctx.add(&group.modules);
    save_active_context(store, &mut ctx)?;
    Ok(true)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
