use crate::error::{Result, SuperstackError};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::Path;
use walkdir::WalkDir;

/// Files whose name contains any of these (case-sensitive) are meta-docs,
/// not modules.
pub const EXCLUDED_NAMES: &[&str] = &["README", "CONTRIBUTING", "WORKFLOW", "IMPLEMENTATION"];

/// Title and description are only looked for in this many leading lines.
const HEADER_SCAN_LINES: usize = 10;

// ---------------------------------------------------------------------------
// ContextModule
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextModule {
    pub path: String,
    pub title: String,
    pub description: String,
    pub domain: String,
    #[serde(rename = "type")]
    pub module_type: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default = "default_active")]
    pub active: bool,
    /// Set on placeholders standing in for a path that could not be loaded.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub missing: bool,
    #[serde(skip)]
    pub content: String,
}

fn default_active() -> bool {
    true
}

/// Optional YAML block at the very top of a module.
#[derive(Debug, Default, Deserialize)]
struct Frontmatter {
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    active: Option<bool>,
}

impl ContextModule {
    /// Build a module from its identifier and raw markdown.
    pub fn from_content(path: &str, content: String) -> Self {
        let (title, description) = scan_header(&content);
        let segments: Vec<&str> = path.split('/').collect();
        let domain = segments.first().copied().unwrap_or_default().to_string();
        let module_type = segments.get(1).copied().unwrap_or("unknown").to_string();
        let frontmatter = parse_frontmatter(path, &content);

        Self {
            path: path.to_string(),
            title,
            description,
            domain,
            module_type,
            tags: frontmatter.tags,
            active: frontmatter.active.unwrap_or(true),
            missing: false,
            content,
        }
    }

    /// Visible stand-in for a path that no longer resolves.
    pub fn missing(path: &str) -> Self {
        Self {
            path: path.to_string(),
            title: path.to_string(),
            description: String::new(),
            domain: path.split('/').next().unwrap_or_default().to_string(),
            module_type: "unknown".to_string(),
            tags: Vec::new(),
            active: true,
            missing: true,
            content: format!("*Module not found: {path}*"),
        }
    }

    /// Display name: the title, else the file stem.
    pub fn name(&self) -> String {
        if !self.title.is_empty() {
            return self.title.clone();
        }
        Path::new(&self.path)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.clone())
    }
}

fn scan_header(content: &str) -> (String, String) {
    let mut title = None;
    let mut description = None;
    for line in content.lines().take(HEADER_SCAN_LINES) {
        if title.is_none() {
            if let Some(rest) = line.strip_prefix("# ") {
                title = Some(rest.trim().to_string());
            }
        }
        if description.is_none() {
            if let Some(rest) = line.strip_prefix("> ") {
                description = Some(rest.trim().to_string());
            }
        }
    }
    (title.unwrap_or_default(), description.unwrap_or_default())
}

fn parse_frontmatter(path: &str, content: &str) -> Frontmatter {
    let Some(rest) = content.strip_prefix("---\n") else {
        return Frontmatter::default();
    };
    let Some(end) = rest.find("\n---") else {
        return Frontmatter::default();
    };
    match serde_yaml::from_str::<Frontmatter>(&rest[..end]) {
        Ok(fm) => fm,
        Err(e) => {
            tracing::debug!(path, error = %e, "ignoring unparseable frontmatter");
            Frontmatter::default()
        }
    }
}

fn is_excluded(file_name: &str) -> bool {
    EXCLUDED_NAMES.iter().any(|x| file_name.contains(x))
}

/// A `.md` file whose name is not on the exclusion list. Scanning and direct
/// lookup share this so they agree on what counts as a module.
fn is_module_file(file: &Path) -> bool {
    if file.extension().and_then(|e| e.to_str()) != Some("md") {
        return false;
    }
    file.file_name()
        .map(|n| !is_excluded(&n.to_string_lossy()))
        .unwrap_or(false)
}

// ---------------------------------------------------------------------------
// Catalog operations
// ---------------------------------------------------------------------------

/// Every module under `root`, sorted by path.
///
/// Reads the filesystem on each call. Fails as a whole if any file or
/// directory cannot be read: callers rely on the list being complete.
pub fn list_modules(root: &Path) -> Result<Vec<ContextModule>> {
    if !root.is_dir() {
        return Err(SuperstackError::ModulesRootNotFound(
            root.display().to_string(),
        ));
    }

    let mut modules = Vec::new();
    for entry in WalkDir::new(root).follow_links(true) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let file = entry.path();
        if !is_module_file(file) {
            continue;
        }
        let content = std::fs::read_to_string(file)?;
        modules.push(ContextModule::from_content(
            &paths::module_id(root, file),
            content,
        ));
    }

    modules.sort_by(|a, b| a.path.cmp(&b.path));
    tracing::debug!(root = %root.display(), count = modules.len(), "scanned modules");
    Ok(modules)
}

/// Load one module by identifier. Files the catalog would skip are reported
/// as not found.
pub fn load_module(root: &Path, module_path: &str) -> Result<ContextModule> {
    let file = paths::module_file(root, module_path)?;
    if !file.is_file() || !is_module_file(&file) {
        return Err(SuperstackError::ModuleNotFound(module_path.to_string()));
    }
    let content = std::fs::read_to_string(&file)?;
    Ok(ContextModule::from_content(module_path, content))
}

/// Load modules in the given order, substituting a placeholder for any that
/// fail so one stale reference does not sink the rest.
pub fn resolve_modules(root: &Path, module_paths: &[String]) -> Vec<ContextModule> {
    module_paths
        .iter()
        .map(|p| match load_module(root, p) {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!(path = %p, error = %e, "using placeholder for unresolved module");
                ContextModule::missing(p)
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
