//! Built-in project templates: detection signals plus the configuration
//! document `init` writes for each project type.

use crate::adapters;
use crate::error::{GateError, Result};
use crate::types::config::{MetricCatalog, MetricPolicy, OrchestratorConfig, Standards, ToolRole};
use crate::tools::ToolSpec;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

pub const DEFAULT_TEMPLATE: &str = "python_api";

#[derive(Debug, Clone)]
pub struct ProjectTemplate {
    pub name: &'static str,
    pub description: &'static str,
    /// File names, or root-relative paths when they contain `/`.
    pub indicators: &'static [&'static str],
    /// Searched case-insensitively in the root manifests.
    pub keywords: &'static [&'static str],
    pub language: &'static str,
    pub project_type: &'static str,
    pub tools: &'static [(ToolRole, &'static str)],
    pub metrics: MetricCatalog,
}

fn performance(entries: &[(&str, MetricPolicy)]) -> MetricCatalog {
    let policies = entries
        .iter()
        .map(|(name, policy)| (name.to_string(), policy.clone()))
        .collect();
    BTreeMap::from([("performance".to_string(), policies)])
}

static CATALOG: LazyLock<Vec<ProjectTemplate>> = LazyLock::new(|| {
    let mut python_ml_metrics = performance(&[
        ("training_time", MetricPolicy::relative(-10.0, 20.0)),
        ("inference_latency", MetricPolicy::relative(-5.0, 15.0)),
        ("memory_usage", MetricPolicy::relative(0.0, 20.0)),
    ]);
    python_ml_metrics.insert(
        "quality".to_string(),
        BTreeMap::from([
            ("test_coverage".to_string(), MetricPolicy::absolute(80.0, "%")),
            ("model_accuracy".to_string(), MetricPolicy::absolute(0.85, "score")),
        ]),
    );

    let mut react_metrics = performance(&[
        ("bundle_size", MetricPolicy::relative(0.0, 5.0)),
        ("first_contentful_paint", MetricPolicy::relative(-10.0, 10.0)),
    ]);
    if let Some(performance) = react_metrics.get_mut("performance") {
        performance.insert(
            "lighthouse_performance".to_string(),
            MetricPolicy::absolute(90.0, "score"),
        );
    }

    vec![
        ProjectTemplate {
            name: "python_ml",
            description: "Python ML/AI project with scikit-learn, tensorflow, etc.",
            indicators: &["requirements.txt", "setup.py", "pyproject.toml"],
            keywords: &["tensorflow", "torch", "sklearn", "numpy", "pandas", "jupyter"],
            language: "python",
            project_type: "ml",
            tools: &[
                (ToolRole::Lint, "ruff check ."),
                (ToolRole::Format, "ruff format ."),
                (ToolRole::Test, "pytest --cov=src tests/"),
                (ToolRole::Security, "bandit -r src/ -f json"),
                (ToolRole::Dependencies, "safety check"),
                (ToolRole::Typecheck, "mypy src/"),
            ],
            metrics: python_ml_metrics,
        },
        ProjectTemplate {
            name: "python_api",
            description: "Python API/web service (FastAPI, Django, Flask)",
            indicators: &["requirements.txt", "app.py", "main.py", "manage.py"],
            keywords: &["fastapi", "django", "flask", "uvicorn", "gunicorn"],
            language: "python",
            project_type: "api",
            tools: &[
                (ToolRole::Lint, "ruff check ."),
                (ToolRole::Format, "ruff format ."),
                (ToolRole::Test, "pytest --cov=. tests/"),
                (ToolRole::Security, "bandit -r . -f json"),
                (ToolRole::Dependencies, "safety check"),
                (ToolRole::Typecheck, "mypy ."),
            ],
            metrics: performance(&[
                ("response_time", MetricPolicy::relative(-5.0, 10.0)),
                ("throughput", MetricPolicy::relative(5.0, -10.0)),
                ("memory_usage", MetricPolicy::relative(0.0, 15.0)),
            ]),
        },
        ProjectTemplate {
            name: "typescript_node",
            description: "TypeScript/Node.js project (API, CLI, library)",
            indicators: &["package.json", "tsconfig.json"],
            keywords: &["typescript", "node", "express", "nestjs"],
            language: "typescript",
            project_type: "node",
            tools: &[
                (ToolRole::Lint, "eslint . --max-warnings 0"),
                (ToolRole::Format, "prettier --write ."),
                (ToolRole::Test, "vitest --run --coverage"),
                (ToolRole::Security, "npm audit --json"),
                (ToolRole::Typecheck, "tsc --noEmit"),
                (ToolRole::Build, "npm run build"),
            ],
            metrics: performance(&[
                ("response_time", MetricPolicy::relative(-5.0, 10.0)),
                ("memory_usage", MetricPolicy::relative(0.0, 15.0)),
                ("bundle_size", MetricPolicy::relative(0.0, 5.0)),
            ]),
        },
        ProjectTemplate {
            name: "react_frontend",
            description: "React frontend application",
            indicators: &["package.json", "src/App.tsx", "src/App.jsx", "public/index.html"],
            keywords: &["react", "next", "vite", "webpack"],
            language: "typescript",
            project_type: "frontend",
            tools: &[
                (ToolRole::Lint, "eslint . --max-warnings 0"),
                (ToolRole::Format, "prettier --write ."),
                (ToolRole::Test, "vitest --run --coverage"),
                (ToolRole::Security, "npm audit --json"),
                (ToolRole::Typecheck, "tsc --noEmit"),
                (ToolRole::Build, "npm run build"),
            ],
            metrics: react_metrics,
        },
        ProjectTemplate {
            name: "go_service",
            description: "Go microservice or CLI application",
            indicators: &["go.mod", "main.go"],
            keywords: &["gin", "echo", "chi", "gorilla", "grpc"],
            language: "go",
            project_type: "service",
            tools: &[
                (ToolRole::Lint, "golangci-lint run"),
                (ToolRole::Format, "gofmt -w ."),
                (ToolRole::Test, "go test -v -race -cover ./..."),
                (ToolRole::Security, "gosec -fmt=json ./..."),
                (ToolRole::Build, "go build -o bin/ ./..."),
            ],
            metrics: performance(&[
                ("response_time", MetricPolicy::relative(-5.0, 10.0)),
                ("memory_usage", MetricPolicy::relative(0.0, 15.0)),
                ("binary_size", MetricPolicy::relative(0.0, 10.0)),
            ]),
        },
        ProjectTemplate {
            name: "rust_project",
            description: "Rust application or library",
            indicators: &["Cargo.toml", "src/main.rs", "src/lib.rs"],
            keywords: &["tokio", "serde", "clap", "actix", "warp"],
            language: "rust",
            project_type: "application",
            tools: &[
                (ToolRole::Lint, "cargo clippy -- -D warnings"),
                (ToolRole::Format, "cargo fmt"),
                (ToolRole::Test, "cargo test"),
                (ToolRole::Security, "cargo audit --json"),
                (ToolRole::Build, "cargo build --release"),
            ],
            metrics: performance(&[
                ("compile_time", MetricPolicy::relative(-5.0, 20.0)),
                ("binary_size", MetricPolicy::relative(0.0, 10.0)),
                ("memory_usage", MetricPolicy::relative(-10.0, 5.0)),
            ]),
        },
    ]
});

pub fn catalog() -> &'static [ProjectTemplate] {
    &CATALOG
}

pub fn find(name: &str) -> Option<&'static ProjectTemplate> {
    catalog().iter().find(|template| template.name == name)
}

pub fn require(name: &str) -> Result<&'static ProjectTemplate> {
    find(name).ok_or_else(|| {
        let known = catalog()
            .iter()
            .map(|template| template.name)
            .collect::<Vec<_>>()
            .join(", ");
        GateError::UnknownTemplate(format!("{name} (known: {known})"))
    })
}

fn default_gates() -> BTreeMap<String, String> {
    [
        ("build", "All code compiles without errors"),
        ("test", "All tests pass, coverage >= 80%"),
        ("review", "Code follows standards, functions <= 30 lines"),
        ("security", "No high severity issues, no hardcoded secrets"),
        ("performance", "Metrics within acceptable bounds"),
    ]
    .into_iter()
    .map(|(gate, description)| (gate.to_string(), description.to_string()))
    .collect()
}

fn project_name(root: &Path) -> String {
    let canonical = root.canonicalize().ok();
    canonical
        .as_deref()
        .unwrap_or(root)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "project".to_string())
}

/// Configuration document for `template`. The adapter's defaults form the
/// base; the template's tools and policies replace entries of the same name.
pub fn create_config(
    template: &ProjectTemplate,
    root: &Path,
    name: Option<&str>,
) -> OrchestratorConfig {
    let adapter = adapters::resolve(template.language);

    let mut tools = adapter
        .default_tools()
        .into_iter()
        .map(|(role, command)| (role.as_str().to_string(), ToolSpec::Line(command)))
        .collect::<BTreeMap<_, _>>();
    for (role, command) in template.tools {
        tools.insert(role.as_str().to_string(), ToolSpec::from(*command));
    }

    let mut metrics = adapter.default_metrics();
    for (category, policies) in &template.metrics {
        metrics
            .entry(category.clone())
            .or_default()
            .extend(policies.iter().map(|(metric, policy)| (metric.clone(), policy.clone())));
    }

    OrchestratorConfig {
        project_name: name
            .map(ToString::to_string)
            .unwrap_or_else(|| project_name(root)),
        project_type: template.name.to_string(),
        language: template.language.to_string(),
        orchestrator_version: Some(env!("CARGO_PKG_VERSION").to_string()),
        tools,
        metrics,
        gates: default_gates(),
        standards: Standards {
            documentation_required: true,
            ..Standards::default()
        },
    }
}
