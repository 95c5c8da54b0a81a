use super::{GoAdapter, LanguageAdapter, PythonAdapter, RustAdapter, TypeScriptAdapter};
use std::sync::Arc;
use tracing::debug;

const KNOWN_LANGUAGES: [&str; 5] = ["python", "typescript", "javascript", "go", "rust"];

const NODE_HINTS: [&str; 4] = ["typescript", "javascript", "node", "react"];

pub fn known_languages() -> &'static [&'static str] {
    &KNOWN_LANGUAGES
}

/// Exact, case-insensitive membership; callers that must reject unknown
/// names check this before [`resolve`].
pub fn is_known_language(name: &str) -> bool {
    let name = name.trim().to_lowercase();
    KNOWN_LANGUAGES.iter().any(|known| *known == name)
}

fn exact(name: &str) -> Option<Arc<dyn LanguageAdapter>> {
    let adapter: Arc<dyn LanguageAdapter> = match name {
        "python" => Arc::new(PythonAdapter),
        "typescript" | "javascript" => Arc::new(TypeScriptAdapter),
        "go" => Arc::new(GoAdapter),
        "rust" => Arc::new(RustAdapter),
        _ => return None,
    };
    Some(adapter)
}

/// Never fails: an exact match, then a substring match, then Python.
pub fn resolve(name: &str) -> Arc<dyn LanguageAdapter> {
    let name = name.trim().to_lowercase();
    if let Some(adapter) = exact(&name) {
        return adapter;
    }

    let adapter: Arc<dyn LanguageAdapter> = if name.contains("python") {
        Arc::new(PythonAdapter)
    } else if NODE_HINTS.iter().any(|hint| name.contains(hint)) {
        Arc::new(TypeScriptAdapter)
    } else if name.contains("go") {
        Arc::new(GoAdapter)
    } else if name.contains("rust") {
        Arc::new(RustAdapter)
    } else {
        Arc::new(PythonAdapter)
    };
    debug!(requested = %name, resolved = adapter.language(), "no exact adapter match");
    adapter
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_names_ignore_case() {
        assert_eq!(resolve("Rust").language(), "rust");
        assert_eq!(resolve("  GO ").language(), "go");
        assert_eq!(resolve("javascript").language(), "typescript");
    }

    #[test]
    fn substring_fallback_order() {
        assert_eq!(resolve("python3.12").language(), "python");
        assert_eq!(resolve("react-native").language(), "typescript");
        assert_eq!(resolve("nodejs").language(), "typescript");
        assert_eq!(resolve("golang").language(), "go");
        assert_eq!(resolve("rustlang").language(), "rust");
    }

    #[test]
    fn unknown_names_fall_back_to_python() {
        assert_eq!(resolve("cobol").language(), "python");
        assert_eq!(resolve("").language(), "python");
        assert!(!is_known_language("cobol"));
        assert!(is_known_language("TypeScript"));
    }

    #[test]
    fn known_languages_resolve_exactly() {
        for name in known_languages() {
            let adapter = resolve(name);
            let expected = if *name == "javascript" { "typescript" } else { *name };
            assert_eq!(adapter.language(), expected);
        }
    }
}
