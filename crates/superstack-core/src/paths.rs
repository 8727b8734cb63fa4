use crate::error::{Result, SuperstackError};
use regex::Regex;
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const STATE_DIR: &str = ".superstack";
pub const MODULES_DIR: &str = "context-modules";
pub const CONFIG_FILE: &str = "config.yaml";

/// Store keys. `FileStore` maps each to `<key>.json` in the state directory.
pub const ACTIVE_CONTEXT_KEY: &str = "active-context";
pub const CONTEXT_GROUPS_KEY: &str = "context-groups";
pub const MODULE_FEEDBACK_KEY: &str = "module-feedback";

pub const HOME_ENV: &str = "SUPERSTACK_HOME";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

/// Resolve the per-user state directory.
///
/// `SUPERSTACK_HOME` wins; otherwise `~/.superstack`.
pub fn state_dir() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    let home = home::home_dir().ok_or(SuperstackError::HomeNotFound)?;
    Ok(home.join(STATE_DIR))
}

pub fn config_path(state_dir: &Path) -> PathBuf {
    state_dir.join(CONFIG_FILE)
}

pub fn record_path(state_dir: &Path, key: &str) -> PathBuf {
    state_dir.join(format!("{key}.json"))
}

/// Join a module identifier onto the modules root, refusing anything that
/// could escape it (absolute paths, `..`, drive prefixes).
pub fn module_file(root: &Path, module_path: &str) -> Result<PathBuf> {
    let rel = Path::new(module_path);
    if module_path.is_empty()
        || rel
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
    {
        return Err(SuperstackError::InvalidModulePath(module_path.to_string()));
    }
    Ok(root.join(rel))
}

/// Module identifier for a file under `root`: relative, `/`-separated.
pub fn module_id(root: &Path, file: &Path) -> String {
    let rel = file.strip_prefix(root).unwrap_or(file);
    rel.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

// ---------------------------------------------------------------------------
// Group name validation
// ---------------------------------------------------------------------------

static GROUP_NAME_RE: OnceLock<Regex> = OnceLock::new();

fn group_name_re() -> &'static Regex {
    GROUP_NAME_RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_\-]+$").unwrap())
}

pub fn validate_group_name(name: &str) -> Result<()> {
    if name.is_empty() || name.len() > 64 || !group_name_re().is_match(name) {
        return Err(SuperstackError::InvalidGroupName(name.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_group_names() {
        for name in ["frontend", "a", "react_stack", "API-v2", "x1"] {
            validate_group_name(name).unwrap_or_else(|_| panic!("expected valid: {name}"));
        }
    }

    #[test]
    fn invalid_group_names() {
        let long = "a".repeat(65);
        for name in ["", "has spaces", "slash/name", "dot.name", long.as_str()] {
            assert!(validate_group_name(name).is_err(), "expected invalid: {name}");
        }
    }

    #[test]
    fn module_file_rejects_escapes() {
        let root = Path::new("/tmp/modules");
        assert!(module_file(root, "../secrets.md").is_err());
        assert!(module_file(root, "/etc/passwd").is_err());
        assert!(module_file(root, "react/../../x.md").is_err());
        assert!(module_file(root, "").is_err());
        assert_eq!(
            module_file(root, "react/hooks.md").unwrap(),
            PathBuf::from("/tmp/modules/react/hooks.md")
        );
    }

    #[test]
    fn module_id_uses_forward_slashes() {
        let root = Path::new("/tmp/modules");
        let file = root.join("react").join("patterns").join("hooks.md");
        assert_eq!(module_id(root, &file), "react/patterns/hooks.md");
    }

    #[test]
    fn path_helpers() {
        let dir = Path::new("/home/me/.superstack");
        assert_eq!(
            config_path(dir),
            PathBuf::from("/home/me/.superstack/config.yaml")
        );
        assert_eq!(
            record_path(dir, ACTIVE_CONTEXT_KEY),
            PathBuf::from("/home/me/.superstack/active-context.json")
        );
    }
}
