//! Marker-and-indentation function length check. Functions are found by a
//! start pattern per language and closed by indentation or a closing brace;
//! unconventional formatting skews the result.

use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;

pub const DEFAULT_MAX_LINES: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockEnd {
    /// Closed by the next non-blank line at the same or shallower indentation.
    Indentation,
    /// Closed by a `}` at the start indentation, or by shallower code. An
    /// arrow header without `{` has an expression body, closed by the first
    /// line ending in `;` or by the next line at the header's indentation.
    ClosingBrace,
    /// Closed only by the next function start or end of file.
    NextMarker,
}

#[derive(Debug)]
pub struct FunctionSyntax {
    start: Regex,
    end: BlockEnd,
}

impl FunctionSyntax {
    /// `start` must match a function header; its first participating capture
    /// group, if any, is the function name.
    pub fn new(start: &str, end: BlockEnd) -> Self {
        Self {
            start: Regex::new(start).expect("function start pattern should compile"),
            end,
        }
    }

    fn function_name(&self, line: &str) -> Option<String> {
        let caps = self.start.captures(line)?;
        let name = caps
            .iter()
            .skip(1)
            .flatten()
            .map(|group| group.as_str())
            .find(|name| !name.is_empty())
            .unwrap_or("<anonymous>");
        Some(name.to_string())
    }
}

pub static GENERIC: LazyLock<FunctionSyntax> = LazyLock::new(|| {
    FunctionSyntax::new(r"\b(?:def|function|func)\s+(\w+)", BlockEnd::NextMarker)
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionSpan {
    pub name: String,
    /// 1-based line of the function header.
    pub line: usize,
    pub length: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionLengthViolation {
    pub file: String,
    pub line: usize,
    pub name: String,
    pub length: usize,
    pub max: usize,
}

impl fmt::Display for FunctionLengthViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} - {} exceeds {} lines ({} lines)",
            self.file, self.line, self.name, self.max, self.length
        )
    }
}

struct Open {
    name: String,
    start: usize,
    indent: usize,
    /// Arrow function whose body is a bare expression.
    expression: bool,
}

fn indentation(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

pub fn function_spans(source: &str, syntax: &FunctionSyntax) -> Vec<FunctionSpan> {
    let lines = source.lines().collect::<Vec<_>>();
    let mut open: Vec<Open> = Vec::new();
    let mut spans = Vec::new();
    let close = |function: Open, end: usize, spans: &mut Vec<FunctionSpan>| {
        spans.push(FunctionSpan {
            name: function.name,
            line: function.start + 1,
            length: end.saturating_sub(function.start),
        });
    };

    for (i, line) in lines.iter().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let indent = indentation(line);

        if let Some(name) = syntax.function_name(line) {
            while open
                .last()
                .is_some_and(|top| syntax.end == BlockEnd::NextMarker || top.indent >= indent)
            {
                if let Some(function) = open.pop() {
                    close(function, i, &mut spans);
                }
            }

            let trimmed = line.trim_end();
            let has_brace = trimmed.contains('{');
            let arrow = trimmed.contains("=>");
            if syntax.end == BlockEnd::ClosingBrace {
                // Bodiless declarations (trait methods, prototypes).
                if trimmed.ends_with(';') && !has_brace && !arrow {
                    continue;
                }
                let balanced = trimmed.matches('{').count() == trimmed.matches('}').count();
                if (has_brace && balanced) || (!has_brace && trimmed.ends_with(';')) {
                    spans.push(FunctionSpan {
                        name,
                        line: i + 1,
                        length: 1,
                    });
                    continue;
                }
            }
            open.push(Open {
                name,
                start: i,
                indent,
                expression: syntax.end == BlockEnd::ClosingBrace && arrow && !has_brace,
            });
            continue;
        }

        match syntax.end {
            BlockEnd::NextMarker => {}
            BlockEnd::Indentation => {
                while open.last().is_some_and(|top| indent <= top.indent) {
                    if let Some(function) = open.pop() {
                        close(function, i, &mut spans);
                    }
                }
            }
            BlockEnd::ClosingBrace => {
                while open.last().is_some_and(|top| indent < top.indent) {
                    if let Some(function) = open.pop() {
                        close(function, i, &mut spans);
                    }
                }
                let expression_end = match open.last_mut() {
                    Some(top) if top.expression => {
                        if indent == top.indent && line.contains('{') {
                            top.expression = false;
                            None
                        } else if indent <= top.indent {
                            Some(i)
                        } else if line.trim_end().ends_with(';') {
                            Some(i + 1)
                        } else {
                            None
                        }
                    }
                    _ => None,
                };
                if let Some(end) = expression_end {
                    if let Some(function) = open.pop() {
                        close(function, end, &mut spans);
                    }
                }
                let closes_top = open
                    .last()
                    .is_some_and(|top| indent == top.indent && line.trim_start().starts_with('}'));
                if closes_top {
                    if let Some(function) = open.pop() {
                        close(function, i + 1, &mut spans);
                    }
                }
            }
        }
    }

    while let Some(function) = open.pop() {
        close(function, lines.len(), &mut spans);
    }
    spans.sort_by_key(|span| span.line);
    spans
}

pub fn violations(
    file_name: &str,
    source: &str,
    syntax: &FunctionSyntax,
    max_lines: usize,
) -> Vec<FunctionLengthViolation> {
    function_spans(source, syntax)
        .into_iter()
        .filter(|span| span.length > max_lines)
        .map(|span| FunctionLengthViolation {
            file: file_name.to_string(),
            line: span.line,
            name: span.name,
            length: span.length,
            max: max_lines,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn python() -> FunctionSyntax {
        FunctionSyntax::new(r"^\s*(?:async\s+)?def\s+(\w+)", BlockEnd::Indentation)
    }

    fn braces() -> FunctionSyntax {
        FunctionSyntax::new(r"^\s*func\s+(\w+)", BlockEnd::ClosingBrace)
    }

    fn python_function(name: &str, body_lines: usize) -> String {
        let mut source = format!("def {name}():\n");
        for i in 0..body_lines {
            source.push_str(&format!("    x{i} = {i}\n"));
        }
        source
    }

    #[test]
    fn indentation_closes_python_functions() {
        let source = format!(
            "{}{}print('done')\n",
            python_function("short", 3),
            python_function("long", 35)
        );
        let spans = function_spans(&source, &python());
        assert_eq!(spans.len(), 2);
        assert_eq!((spans[0].name.as_str(), spans[0].length), ("short", 4));
        assert_eq!((spans[1].name.as_str(), spans[1].length), ("long", 36));

        let found = violations("app.py", &source, &python(), DEFAULT_MAX_LINES);
        assert_eq!(found.len(), 1);
        assert_eq!(
            found[0].to_string(),
            "app.py:5 - long exceeds 30 lines (36 lines)"
        );
    }

    #[test]
    fn nested_python_functions_do_not_close_outer() {
        let source = "def outer():\n    def inner():\n        return 1\n    return inner\nx = 1\n";
        let spans = function_spans(source, &python());
        let outer = spans.iter().find(|span| span.name == "outer").expect("outer span");
        let inner = spans.iter().find(|span| span.name == "inner").expect("inner span");
        assert_eq!(outer.length, 4);
        assert_eq!(inner.length, 2);
    }

    #[test]
    fn closing_brace_ends_function_inclusively() {
        let source = "func a() {\n\tx := 1\n\t_ = x\n}\n\nfunc b() { return }\n";
        let spans = function_spans(source, &braces());
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].length, 4);
        assert_eq!(spans[1].length, 1);
    }

    #[test]
    fn generic_syntax_runs_to_next_marker() {
        let source = "function a() {\n  one();\n}\nfunction b() {\n}\n";
        let spans = function_spans(source, &GENERIC);
        assert_eq!(spans[0].length, 3);
        assert_eq!(spans[1].length, 2);
    }

    #[test]
    fn expression_arrow_ends_at_statement_terminator() {
        let arrows = FunctionSyntax::new(r"^\s*const\s+(\w+)\s*=.*=>", BlockEnd::ClosingBrace);
        let source = "\
const total = (items) =>
  items
    .map((item) => item.price)
    .reduce((a, b) => a + b, 0);

const double = (x) => x * 2;

const loose = (x) =>
  x + 1
const after = 1;
";
        let spans = function_spans(source, &arrows);
        let lengths = spans
            .iter()
            .map(|span| (span.name.as_str(), span.length))
            .collect::<Vec<_>>();
        assert_eq!(lengths, vec![("total", 4), ("double", 1), ("loose", 2)]);
    }

    #[test]
    fn multi_line_signature_waits_for_body_brace() {
        let rust = FunctionSyntax::new(r"^\s*fn\s+(\w+)", BlockEnd::ClosingBrace);
        let source = "fn clone_all<T>(items: &[T]) -> Vec<T>\nwhere\n    T: Clone,\n{\n    items.to_vec()\n}\n";
        let spans = function_spans(source, &rust);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].length, 6);
    }

    #[test]
    fn unterminated_function_runs_to_end_of_file() {
        let spans = function_spans("def a():\n    x = 1\n    y = 2\n", &python());
        assert_eq!(spans[0].length, 3);
    }
}
