//! Manifest readers. Each returns package names without version
//! specifiers; a manifest that is missing or malformed contributes nothing.

use regex::Regex;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;
use tracing::debug;

static INSTALL_REQUIRES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)install_requires\s*=\s*\[(.*?)\]")
        .expect("install_requires pattern should compile")
});

static QUOTED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"["']([^"']+)["']"#).expect("quoted string pattern should compile")
});

static GO_REQUIRE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:require\s+)?([A-Za-z0-9][\w.\-/~]*)\s+v\S+")
        .expect("go require pattern should compile")
});

const CARGO_TABLES: [&str; 3] = ["dependencies", "dev-dependencies", "build-dependencies"];
const NODE_TABLES: [&str; 4] = [
    "dependencies",
    "devDependencies",
    "peerDependencies",
    "optionalDependencies",
];

fn read_manifest(path: &Path) -> Option<String> {
    if !path.is_file() {
        return None;
    }
    match fs::read_to_string(path) {
        Ok(content) => Some(content),
        Err(err) => {
            debug!(path = %path.display(), error = %err, "manifest unreadable");
            None
        }
    }
}

fn read_toml(path: &Path) -> Option<toml::Value> {
    let content = read_manifest(path)?;
    match toml::from_str(&content) {
        Ok(value) => Some(value),
        Err(err) => {
            debug!(path = %path.display(), error = %err, "manifest is not valid TOML");
            None
        }
    }
}

/// Package name of a PEP 508 requirement: `requests[socks]>=2; python_version<'3'`
/// becomes `requests`.
pub fn requirement_name(spec: &str) -> Option<String> {
    let name = spec
        .split(|c: char| matches!(c, '<' | '>' | '=' | '!' | '~' | ';' | '[' | '@' | ' '))
        .next()?
        .trim();
    (!name.is_empty()).then(|| name.to_string())
}

fn finish(names: BTreeSet<String>) -> Vec<String> {
    names.into_iter().collect()
}

pub fn python(root: &Path) -> Vec<String> {
    let mut names = BTreeSet::new();

    if let Some(content) = read_manifest(&root.join("requirements.txt")) {
        names.extend(
            content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with('-'))
                .filter_map(requirement_name),
        );
    }

    if let Some(pyproject) = read_toml(&root.join("pyproject.toml")) {
        let arrays = [
            pyproject.get("project").and_then(|p| p.get("dependencies")),
            pyproject.get("build-system").and_then(|b| b.get("requires")),
        ];
        for array in arrays.into_iter().flatten().filter_map(toml::Value::as_array) {
            names.extend(array.iter().filter_map(toml::Value::as_str).filter_map(requirement_name));
        }
        if let Some(poetry) = pyproject
            .get("tool")
            .and_then(|tool| tool.get("poetry"))
            .and_then(|poetry| poetry.get("dependencies"))
            .and_then(toml::Value::as_table)
        {
            names.extend(poetry.keys().filter(|name| *name != "python").cloned());
        }
    }

    if let Some(content) = read_manifest(&root.join("setup.py")) {
        if let Some(caps) = INSTALL_REQUIRES.captures(&content) {
            names.extend(
                QUOTED
                    .captures_iter(&caps[1])
                    .filter_map(|quoted| requirement_name(&quoted[1])),
            );
        }
    }

    finish(names)
}

pub fn node(root: &Path) -> Vec<String> {
    let Some(content) = read_manifest(&root.join("package.json")) else {
        return Vec::new();
    };
    let manifest: serde_json::Value = match serde_json::from_str(&content) {
        Ok(value) => value,
        Err(err) => {
            debug!(error = %err, "package.json is not valid JSON");
            return Vec::new();
        }
    };

    let names = NODE_TABLES
        .iter()
        .filter_map(|table| manifest.get(table).and_then(serde_json::Value::as_object))
        .flat_map(|deps| deps.keys().cloned())
        .collect();
    finish(names)
}

pub fn go(root: &Path) -> Vec<String> {
    let Some(content) = read_manifest(&root.join("go.mod")) else {
        return Vec::new();
    };

    let mut names = BTreeSet::new();
    let mut in_block = false;
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("require (") || trimmed == "require(" {
            in_block = true;
            continue;
        }
        if in_block && trimmed.starts_with(')') {
            in_block = false;
            continue;
        }
        if !(in_block || trimmed.starts_with("require ")) {
            continue;
        }
        if let Some(caps) = GO_REQUIRE_LINE.captures(trimmed) {
            names.insert(caps[1].to_string());
        }
    }
    finish(names)
}

pub fn cargo(root: &Path) -> Vec<String> {
    let Some(manifest) = read_toml(&root.join("Cargo.toml")) else {
        return Vec::new();
    };

    let mut tables = CARGO_TABLES
        .iter()
        .filter_map(|table| manifest.get(table))
        .collect::<Vec<_>>();
    if let Some(workspace) = manifest
        .get("workspace")
        .and_then(|workspace| workspace.get("dependencies"))
    {
        tables.push(workspace);
    }
    if let Some(targets) = manifest.get("target").and_then(toml::Value::as_table) {
        for target in targets.values() {
            tables.extend(CARGO_TABLES.iter().filter_map(|table| target.get(table)));
        }
    }

    let names = tables
        .into_iter()
        .filter_map(toml::Value::as_table)
        .flat_map(|table| table.keys().cloned())
        .collect();
    finish(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) {
        fs::write(dir.path().join(name), content).expect("manifest should be written");
    }

    #[test]
    fn requirement_names_drop_specifiers_and_extras() {
        assert_eq!(requirement_name("requests>=2.31").as_deref(), Some("requests"));
        assert_eq!(requirement_name("uvicorn[standard]==0.23").as_deref(), Some("uvicorn"));
        assert_eq!(requirement_name("numpy ; python_version>'3.8'").as_deref(), Some("numpy"));
        assert_eq!(requirement_name(">=1.0"), None);
    }

    #[test]
    fn python_merges_every_manifest() {
        let dir = TempDir::new().expect("temp dir should exist");
        write(&dir, "requirements.txt", "# pinned\nflask==3.0\n-r dev.txt\nrequests>=2\n\n");
        write(
            &dir,
            "pyproject.toml",
            "[project]\ndependencies = [\"requests>=2\", \"pydantic~=2.0\"]\n\n[build-system]\nrequires = [\"setuptools>=61\"]\n\n[tool.poetry.dependencies]\npython = \"^3.11\"\nhttpx = \"*\"\n",
        );
        write(&dir, "setup.py", "setup(\n    install_requires=[\n        'click>=8',\n        \"rich\",\n    ],\n)\n");

        assert_eq!(
            python(dir.path()),
            vec!["click", "flask", "httpx", "pydantic", "requests", "rich", "setuptools"]
        );
    }

    #[test]
    fn malformed_manifest_does_not_block_others() {
        let dir = TempDir::new().expect("temp dir should exist");
        write(&dir, "pyproject.toml", "[project\nthis is not toml");
        write(&dir, "requirements.txt", "django\n");
        assert_eq!(python(dir.path()), vec!["django"]);
    }

    #[test]
    fn node_reads_every_dependency_table() {
        let dir = TempDir::new().expect("temp dir should exist");
        write(
            &dir,
            "package.json",
            r#"{"dependencies": {"react": "^18"}, "devDependencies": {"vitest": "^1", "react": "^18"}}"#,
        );
        assert_eq!(node(dir.path()), vec!["react", "vitest"]);
    }

    #[test]
    fn go_reads_single_and_block_requires() {
        let dir = TempDir::new().expect("temp dir should exist");
        write(
            &dir,
            "go.mod",
            "module example.com/svc\n\ngo 1.22\n\nrequire github.com/google/uuid v1.6.0\n\nrequire (\n\tgithub.com/gin-gonic/gin v1.9.1\n\tgolang.org/x/net v0.20.0 // indirect\n)\n",
        );
        assert_eq!(
            go(dir.path()),
            vec!["github.com/gin-gonic/gin", "github.com/google/uuid", "golang.org/x/net"]
        );
    }

    #[test]
    fn cargo_reads_all_dependency_kinds() {
        let dir = TempDir::new().expect("temp dir should exist");
        write(
            &dir,
            "Cargo.toml",
            "[package]\nname = \"demo\"\n\n[dependencies]\nserde = \"1\"\ntokio = { version = \"1\", features = [\"full\"] }\n\n[dev-dependencies]\ntempfile = \"3\"\n\n[build-dependencies]\ncc = \"1\"\n\n[workspace.dependencies]\nanyhow = \"1\"\n\n[target.'cfg(unix)'.dependencies]\nlibc = \"0.2\"\n",
        );
        assert_eq!(
            cargo(dir.path()),
            vec!["anyhow", "cc", "libc", "serde", "tempfile", "tokio"]
        );
    }

    #[test]
    fn missing_manifests_yield_nothing() {
        let dir = TempDir::new().expect("temp dir should exist");
        assert!(python(dir.path()).is_empty());
        assert!(node(dir.path()).is_empty());
        assert!(go(dir.path()).is_empty());
        assert!(cargo(dir.path()).is_empty());
    }
}
