use std::path::{Path, PathBuf};
use superstack_core::{config::Config, paths::MODULES_DIR};

/// Resolve the context modules directory.
///
/// Priority:
/// 1. `--modules` flag / `SUPERSTACK_MODULES` env var (passed in as `explicit`)
/// 2. `modules_dir` from config.yaml
/// 3. Walk upward from `cwd` looking for `context-modules/`
/// 4. Fall back to `cwd/context-modules`
pub fn resolve_modules_root(explicit: Option<&Path>, config: &Config) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }
    if let Some(p) = &config.modules_dir {
        return p.clone();
    }

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    find_upward(&cwd).unwrap_or_else(|| cwd.join(MODULES_DIR))
}

fn find_upward(start: &Path) -> Option<PathBuf> {
    let mut dir = start.to_path_buf();
    loop {
        let candidate = dir.join(MODULES_DIR);
        if candidate.is_dir() {
            return Some(candidate);
        }
        if !dir.pop() {
            return None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn explicit_root_wins() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            modules_dir: Some(PathBuf::from("/elsewhere")),
            ..Config::default()
        };
        let result = resolve_modules_root(Some(dir.path()), &config);
        assert_eq!(result, dir.path());
    }

    #[test]
    fn config_beats_detection() {
        let config = Config {
            modules_dir: Some(PathBuf::from("/from/config")),
            ..Config::default()
        };
        assert_eq!(
            resolve_modules_root(None, &config),
            PathBuf::from("/from/config")
        );
    }

    #[test]
    fn finds_modules_dir_in_ancestor() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(MODULES_DIR)).unwrap();
        let subdir = dir.path().join("src/deep");
        std::fs::create_dir_all(&subdir).unwrap();

        assert_eq!(find_upward(&subdir), Some(dir.path().join(MODULES_DIR)));
    }
}
