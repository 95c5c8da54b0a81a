use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Version control, dependency caches and virtual environments.
pub const IGNORED_DIRS: [&str; 9] = [
    ".git",
    ".hg",
    ".svn",
    "node_modules",
    "__pycache__",
    ".venv",
    "venv",
    ".tox",
    ".mypy_cache",
];

/// Build output skipped when collecting source files.
pub const BUILD_DIRS: [&str; 4] = ["target", "build", "dist", "vendor"];

fn is_pruned(entry: &DirEntry, extra: &[&str]) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    IGNORED_DIRS.iter().chain(extra).any(|dir| *dir == name)
        || name.ends_with(".egg-info")
}

/// Files under `root`, sorted, skipping [`IGNORED_DIRS`] and `extra`.
/// `max_depth` counts the file itself, so 1 means files directly in `root`.
pub fn list_files(root: &Path, max_depth: Option<usize>, extra: &[&str]) -> Vec<PathBuf> {
    let mut walker = WalkDir::new(root).sort_by_file_name();
    if let Some(depth) = max_depth {
        walker = walker.max_depth(depth);
    }
    walker
        .into_iter()
        .filter_entry(|entry| !is_pruned(entry, extra))
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.path().to_path_buf())
        .collect()
}

pub fn source_files(root: &Path, extensions: &[&str]) -> Vec<PathBuf> {
    list_files(root, None, &BUILD_DIRS)
        .into_iter()
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| extensions.iter().any(|wanted| *wanted == ext))
        })
        .collect()
}

pub fn read_to_string_if_exists(path: &Path) -> Option<String> {
    std::fs::read_to_string(path).ok()
}

/// `path` relative to `root` with `/` separators.
pub fn relative_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("parent dirs should be created");
        }
        fs::write(path, "").expect("file should be written");
    }

    #[test]
    fn list_files_prunes_ignored_dirs() {
        let dir = TempDir::new().expect("temp dir should exist");
        touch(dir.path(), "src/main.rs");
        touch(dir.path(), "node_modules/left-pad/index.js");
        touch(dir.path(), ".git/HEAD");
        touch(dir.path(), "pkg.egg-info/PKG-INFO");

        let files = list_files(dir.path(), None, &[])
            .iter()
            .map(|path| relative_path(dir.path(), path))
            .collect::<Vec<_>>();
        assert_eq!(files, vec!["src/main.rs"]);
    }

    #[test]
    fn depth_limit_stops_descent() {
        let dir = TempDir::new().expect("temp dir should exist");
        touch(dir.path(), "a/b/c/shallow.txt");
        touch(dir.path(), "a/b/c/d/deep.txt");

        let files = list_files(dir.path(), Some(4), &[]);
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("shallow.txt"));
    }

    #[test]
    fn source_files_filter_extensions_and_build_dirs() {
        let dir = TempDir::new().expect("temp dir should exist");
        touch(dir.path(), "app/main.py");
        touch(dir.path(), "app/types.pyi");
        touch(dir.path(), "build/lib/app/main.py");
        touch(dir.path(), "README.md");

        let files = source_files(dir.path(), &["py", "pyi"])
            .iter()
            .map(|path| relative_path(dir.path(), path))
            .collect::<Vec<_>>();
        assert_eq!(files, vec!["app/main.py", "app/types.pyi"]);
    }
}
