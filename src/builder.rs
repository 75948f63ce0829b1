//! Rule list assembly.
//!
//! Processes whole filter texts line-by-line through the parser,
//! accumulating rules and diagnostics independently, and enforces the
//! all-or-nothing import policy: a partially-valid filter list is never
//! accepted.

use crate::error::{FilterError, Result};
use crate::parser::{parse_line, LineOutcome};
use crate::types::{ParseDiagnostic, Rule, RuleKind};

/// Parsed rules from one filter text, split by polarity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSet {
    pub block_rules: Vec<Rule>,
    pub exception_rules: Vec<Rule>,
}

impl RuleSet {
    pub fn rule_count(&self) -> usize {
        self.block_rules.len() + self.exception_rules.len()
    }

    /// Flattened block-rule domains, in source order.
    pub fn block_domains(&self) -> Vec<String> {
        self.block_rules.iter().map(|r| r.domain.clone()).collect()
    }

    /// Flattened exception-rule domains, in source order.
    pub fn exception_domains(&self) -> Vec<String> {
        self.exception_rules
            .iter()
            .map(|r| r.domain.clone())
            .collect()
    }

    /// Re-export the retained raw lines in original order.
    pub fn to_filter_text(&self) -> String {
        let mut rules: Vec<&Rule> = self
            .block_rules
            .iter()
            .chain(self.exception_rules.iter())
            .collect();
        rules.sort_by_key(|r| r.line_number);
        rules
            .iter()
            .map(|r| r.raw_line.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Raw outcome of building a rule list: rules and diagnostics accumulate
/// independently; a diagnosed line never contributes to the rule count.
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    pub rules: RuleSet,
    pub errors: Vec<ParseDiagnostic>,
}

/// Build a rule list from full filter text.
pub fn build_rules(text: &str) -> BuildReport {
    let mut report = BuildReport::default();

    for (index, line) in text.lines().enumerate() {
        match parse_line(line, index + 1) {
            LineOutcome::Rule(rule) => match rule.kind {
                RuleKind::Block => report.rules.block_rules.push(rule),
                RuleKind::Exception => report.rules.exception_rules.push(rule),
            },
            LineOutcome::Invalid(diag) => report.errors.push(diag),
            LineOutcome::Skip => {}
        }
    }

    report
}

/// Build a rule list, rejecting the whole text on any malformed line and
/// on texts that yield no rules at all (e.g. comments only).
pub fn compile_rules(text: &str) -> Result<RuleSet> {
    let report = build_rules(text);

    if !report.errors.is_empty() {
        return Err(FilterError::Syntax {
            diagnostics: report.errors,
        });
    }
    if report.rules.rule_count() == 0 {
        return Err(FilterError::EmptyPolicy);
    }

    Ok(report.rules)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_block_rules() {
        let report = build_rules("||example.com^\n||test.com^");
        assert_eq!(report.rules.rule_count(), 2);
        assert_eq!(report.rules.block_rules.len(), 2);
        assert!(report.rules.exception_rules.is_empty());
        assert!(report.errors.is_empty());
        assert_eq!(report.rules.block_domains(), vec!["example.com", "test.com"]);
    }

    #[test]
    fn test_mixed_polarity() {
        let text = "||ads.net^\n@@||cdn.ads.net^\n||tracker.io^";
        let report = build_rules(text);
        assert_eq!(report.rules.block_rules.len(), 2);
        assert_eq!(report.rules.exception_rules.len(), 1);
        assert_eq!(report.rules.exception_domains(), vec!["cdn.ads.net"]);
    }

    #[test]
    fn test_invalid_line_rejects_whole_import() {
        let report = build_rules("invalid line without caret");
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].line_number, 1);
        assert_eq!(report.rules.rule_count(), 0);

        let result = compile_rules("invalid line without caret");
        assert!(matches!(result, Err(FilterError::Syntax { .. })));
    }

    #[test]
    fn test_one_bad_line_among_good_ones_rejects() {
        let text = "||good.com^\nbroken\n||also-good.com^";
        let result = compile_rules(text);
        match result {
            Err(FilterError::Syntax { diagnostics }) => {
                assert_eq!(diagnostics.len(), 1);
                assert_eq!(diagnostics[0].line_number, 2);
            }
            other => panic!("expected syntax error, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_comments_only_rejects_with_empty_policy() {
        let report = build_rules("! comment only");
        assert!(report.errors.is_empty());
        assert_eq!(report.rules.rule_count(), 0);

        let result = compile_rules("! comment only");
        assert!(matches!(result, Err(FilterError::EmptyPolicy)));
    }

    #[test]
    fn test_blank_text_rejects_with_empty_policy() {
        assert!(matches!(compile_rules("\n\n  \n"), Err(FilterError::EmptyPolicy)));
    }

    #[test]
    fn test_comments_and_blanks_interleaved() {
        let text = "! header\n\n||a.com^\n! middle\n@@||b.com^\n\n";
        let rules = compile_rules(text).unwrap();
        assert_eq!(rules.rule_count(), 2);
    }

    #[test]
    fn test_round_trip_preserves_domain_sets() {
        let text = "||example.com^$3p\n@@||cdn.example.com^\n||test.org^";
        let rules = compile_rules(text).unwrap();
        let exported = rules.to_filter_text();
        let reparsed = compile_rules(&exported).unwrap();
        assert_eq!(reparsed.block_domains(), rules.block_domains());
        assert_eq!(reparsed.exception_domains(), rules.exception_domains());
    }

    #[test]
    fn test_export_keeps_original_order() {
        let text = "@@||first.com^\n||second.com^\n@@||third.com^";
        let rules = compile_rules(text).unwrap();
        assert_eq!(
            rules.to_filter_text(),
            "@@||first.com^\n||second.com^\n@@||third.com^"
        );
    }
}
