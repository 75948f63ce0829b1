use once_cell::sync::Lazy;
use regex::Regex;

use crate::options::parse_options;
use crate::types::{ParseDiagnostic, Rule, RuleKind};

/// Full rule shape: `||<domain>^[$options]`, exception variant prefixed `@@`.
/// The domain sits between the prefix and the first of `$` or `^`.
static RULE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(@@)?\|\|([^\^$\s]+)\^(?:\$(.*))?$")
        .expect("RULE_PATTERN: hardcoded regex is invalid")
});

/// Prefix check on its own, for targeted diagnostics.
static RULE_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(@@)?\|\|").expect("RULE_PREFIX: hardcoded regex is invalid"));

/// Comment marker for filter-list lines.
const COMMENT_MARKER: char = '!';

/// Outcome of parsing one filter-list line.
///
/// A line is exactly one of these: a rule, a diagnostic, or nothing
/// (comments and blank lines).
#[derive(Debug, Clone, PartialEq)]
pub enum LineOutcome {
    Rule(Rule),
    Invalid(ParseDiagnostic),
    Skip,
}

/// True for lines that are empty after trimming.
pub fn is_empty_line(line: &str) -> bool {
    line.trim().is_empty()
}

/// True for lines that start with the comment marker after trimming.
pub fn is_comment_line(line: &str) -> bool {
    line.trim_start().starts_with(COMMENT_MARKER)
}

/// Parse a single filter-list line.
///
/// `line_number` is 1-based and is carried into both rules and diagnostics.
pub fn parse_line(line: &str, line_number: usize) -> LineOutcome {
    if is_empty_line(line) || is_comment_line(line) {
        return LineOutcome::Skip;
    }

    let trimmed = line.trim();

    let captures = match RULE_PATTERN.captures(trimmed) {
        Some(captures) => captures,
        None => {
            return LineOutcome::Invalid(ParseDiagnostic {
                line_number,
                line: trimmed.to_string(),
                message: diagnose(trimmed),
            });
        }
    };

    let kind = if captures.get(1).is_some() {
        RuleKind::Exception
    } else {
        RuleKind::Block
    };
    let domain = captures.get(2).map(|m| m.as_str()).unwrap_or_default();
    let options = captures
        .get(3)
        .map(|m| parse_options(m.as_str()))
        .unwrap_or_default();

    LineOutcome::Rule(Rule {
        id: Rule::make_id(kind, domain, line_number),
        kind,
        domain: domain.to_string(),
        options,
        raw_line: trimmed.to_string(),
        line_number,
    })
}

/// Name the first failed structural check for a malformed candidate line.
fn diagnose(line: &str) -> String {
    if !RULE_PREFIX.is_match(line) {
        "missing rule prefix (expected '||' or '@@||')".to_string()
    } else if !line.contains('^') {
        "missing domain terminator '^'".to_string()
    } else {
        "invalid domain in rule".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_pattern_regex_compiles() {
        // Forces Lazy evaluation; if the pattern is invalid, this panics
        // with the expect message rather than an opaque unwrap.
        assert!(RULE_PATTERN.is_match("||example.com^"));
    }

    #[test]
    fn test_line_classification() {
        assert!(is_comment_line("! x"));
        assert!(!is_comment_line("||a.com^"));
        assert!(is_empty_line("   "));
        assert!(is_empty_line(""));
    }

    #[test]
    fn test_parse_block_rule() {
        let outcome = parse_line("||example.com^", 1);
        match outcome {
            LineOutcome::Rule(rule) => {
                assert_eq!(rule.kind, RuleKind::Block);
                assert_eq!(rule.domain, "example.com");
                assert!(rule.options.is_empty());
                assert_eq!(rule.raw_line, "||example.com^");
                assert_eq!(rule.id, "block:example.com:1");
            }
            other => panic!("expected rule, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_exception_rule() {
        let outcome = parse_line("@@||ads.example.com^", 4);
        match outcome {
            LineOutcome::Rule(rule) => {
                assert_eq!(rule.kind, RuleKind::Exception);
                assert_eq!(rule.domain, "ads.example.com");
                assert_eq!(rule.line_number, 4);
            }
            other => panic!("expected rule, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_rule_with_options() {
        let outcome = parse_line("||tracker.net^$3p,domain=news.com|~blog.news.com", 2);
        match outcome {
            LineOutcome::Rule(rule) => {
                assert!(rule.options.third_party);
                assert_eq!(rule.options.domains, vec!["news.com"]);
                assert_eq!(rule.options.negated_domains, vec!["blog.news.com"]);
            }
            other => panic!("expected rule, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_wildcard_domain() {
        let outcome = parse_line("||*.cdn.example.com^", 1);
        match outcome {
            LineOutcome::Rule(rule) => assert_eq!(rule.domain, "*.cdn.example.com"),
            other => panic!("expected rule, got {:?}", other),
        }
    }

    #[test]
    fn test_comments_and_blanks_are_skipped() {
        assert_eq!(parse_line("! a comment", 1), LineOutcome::Skip);
        assert_eq!(parse_line("", 2), LineOutcome::Skip);
        assert_eq!(parse_line("   ", 3), LineOutcome::Skip);
    }

    #[test]
    fn test_missing_prefix_is_diagnosed() {
        let outcome = parse_line("example.com^", 5);
        match outcome {
            LineOutcome::Invalid(diag) => {
                assert_eq!(diag.line_number, 5);
                assert!(diag.message.contains("prefix"), "got: {}", diag.message);
            }
            other => panic!("expected diagnostic, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_suffix_is_diagnosed() {
        let outcome = parse_line("||example.com", 1);
        match outcome {
            LineOutcome::Invalid(diag) => {
                assert!(diag.message.contains('^'), "got: {}", diag.message);
                assert_eq!(diag.line, "||example.com");
            }
            other => panic!("expected diagnostic, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_domain_is_diagnosed() {
        let outcome = parse_line("||^", 1);
        assert!(matches!(outcome, LineOutcome::Invalid(_)));
    }

    #[test]
    fn test_never_rule_and_error_for_same_line() {
        // Every line lands in exactly one bucket.
        for (line, expect_rule) in [
            ("||a.com^", true),
            ("@@||a.com^$1p", true),
            ("a.com", false),
            ("@@a.com^", false),
        ] {
            match parse_line(line, 1) {
                LineOutcome::Rule(_) => assert!(expect_rule, "line: {}", line),
                LineOutcome::Invalid(_) => assert!(!expect_rule, "line: {}", line),
                LineOutcome::Skip => panic!("unexpected skip for {}", line),
            }
        }
    }
}
