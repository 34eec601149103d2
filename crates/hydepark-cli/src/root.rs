use std::path::{Path, PathBuf};

/// File whose presence marks an application source tree.
const SOURCE_MARKER: &str = "main.py";

/// Resolve the application source directory.
///
/// Priority:
/// 1. `--source` flag (passed in as `explicit`)
/// 2. Walk upward from `cwd` looking for `main.py`
/// 3. Fall back to `cwd`
pub fn resolve_source(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    find_upward(&cwd).unwrap_or(cwd)
}

fn find_upward(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(SOURCE_MARKER).is_file())
        .map(Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn explicit_source_wins() {
        let dir = TempDir::new().unwrap();
        let result = resolve_source(Some(dir.path()));
        assert_eq!(result, dir.path());
    }

    #[test]
    fn finds_source_above_subdirectory() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("main.py"), "").unwrap();
        let subdir = dir.path().join("api/routes");
        std::fs::create_dir_all(&subdir).unwrap();

        assert_eq!(find_upward(&subdir).as_deref(), Some(dir.path()));
    }

    #[test]
    fn no_marker_means_none() {
        let dir = TempDir::new().unwrap();
        let subdir = dir.path().join("empty");
        std::fs::create_dir_all(&subdir).unwrap();
        // Guard against a main.py somewhere above the temp dir.
        if dir.path().ancestors().any(|d| d.join("main.py").is_file()) {
            return;
        }
        assert_eq!(find_upward(&subdir), None);
    }
}
