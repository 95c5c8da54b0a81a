//! Textual cyclomatic-complexity proxy: start at 1 and add one for every
//! control-flow keyword token and branching operator on each line. Comments
//! and string literals are not excluded, so this is an approximation.

#[derive(Debug, Clone, Copy)]
pub struct ComplexityRules {
    pub keywords: &'static [&'static str],
    pub operators: &'static [&'static str],
}

pub const GENERIC: ComplexityRules = ComplexityRules {
    keywords: &[
        "if", "elif", "else", "for", "while", "try", "except", "switch", "case",
    ],
    operators: &[],
};

pub fn estimate(source: &str, rules: &ComplexityRules) -> u32 {
    let mut complexity = 1u32;
    for line in source.lines() {
        let keyword_hits = line
            .split(|c: char| !(c.is_alphanumeric() || c == '_'))
            .filter(|token| rules.keywords.iter().any(|keyword| keyword == token))
            .count();
        let operator_hits: usize = rules
            .operators
            .iter()
            .map(|operator| line.matches(operator).count())
            .sum();
        complexity = complexity.saturating_add((keyword_hits + operator_hits) as u32);
    }
    complexity
}
