use regex::Regex;
use std::sync::LazyLock;

static COVERAGE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // pytest-cov summary table
        r"(?i)TOTAL.*?(\d+(?:\.\d+)?)%",
        // go test, generic "coverage: N%"
        r"(?i)coverage:\s*(\d+(?:\.\d+)?)%",
        // tarpaulin "85.50% coverage"
        r"(?i)(\d+(?:\.\d+)?)%\s*coverage",
        // istanbul text table
        r"(?i)All files\s*\|\s*(\d+(?:\.\d+)?)",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("coverage pattern should compile"))
    .collect()
});

static GO_PACKAGE_COVERAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"coverage:\s*(\d+(?:\.\d+)?)% of statements")
        .expect("go coverage pattern should compile")
});

/// First pattern that matches wins; `None` when the output reports no
/// percentage at all.
pub fn extract_coverage(output: &str) -> Option<f64> {
    COVERAGE_PATTERNS.iter().find_map(|pattern| {
        pattern
            .captures(output)
            .and_then(|caps| caps.get(1))
            .and_then(|value| value.as_str().parse::<f64>().ok())
    })
}

/// `go test -cover ./...` prints one line per package; the project figure is
/// their mean.
pub fn mean_package_coverage(output: &str) -> Option<f64> {
    let values = GO_PACKAGE_COVERAGE
        .captures_iter(output)
        .filter_map(|caps| caps.get(1)?.as_str().parse::<f64>().ok())
        .collect::<Vec<_>>();
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_pytest_cov_total() {
        let output = "Name    Stmts   Miss  Cover\nsrc/app.py  120  30  75%\nTOTAL   120     30    75%\n";
        assert_eq!(extract_coverage(output), Some(75.0));
    }

    #[test]
    fn extracts_decimal_coverage_line() {
        assert_eq!(extract_coverage("coverage: 81.4% of statements"), Some(81.4));
        assert_eq!(
            extract_coverage("85.50% coverage, 171/200 lines covered"),
            Some(85.5)
        );
    }

    #[test]
    fn extracts_istanbul_table() {
        let output = "File      | % Stmts | % Branch\nAll files |   91.3 |    80.1\n";
        assert_eq!(extract_coverage(output), Some(91.3));
    }

    #[test]
    fn returns_none_without_percentage() {
        assert_eq!(extract_coverage(""), None);
        assert_eq!(extract_coverage("5 passed in 0.12s"), None);
    }

    #[test]
    fn averages_go_packages() {
        let output = "ok  \tsvc/a\t0.01s\tcoverage: 80.0% of statements\nok  \tsvc/b\t0.02s\tcoverage: 60.0% of statements\n";
        assert_eq!(mean_package_coverage(output), Some(70.0));
        assert_eq!(mean_package_coverage("ok svc 0.1s"), None);
    }
}
