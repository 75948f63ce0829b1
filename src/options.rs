//! Rule option parsing.
//!
//! Decodes the trailing `$opt1,opt2,...` segment of a filter rule into a
//! structured [`OptionSet`]. Unknown tokens are dropped without error so
//! that future filter-list syntax keeps parsing.

use crate::types::OptionSet;

/// One classified option token.
///
/// Tokens matching no known syntax become `Unknown` and are ignored when
/// folding into an [`OptionSet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionToken {
    /// `domain=a|b|~c` — per-entry negation via a leading `~`
    Domains {
        include: Vec<String>,
        exclude: Vec<String>,
    },
    /// `3p`
    ThirdParty,
    /// `1p`
    FirstParty,
    /// `important` / `~important`
    Important(bool),
    /// `match-case` / `~match-case`
    MatchCase(bool),
    Unknown(String),
}

/// Classify a single trimmed option token.
pub fn classify_token(token: &str) -> OptionToken {
    match token {
        "3p" => return OptionToken::ThirdParty,
        "1p" => return OptionToken::FirstParty,
        "important" => return OptionToken::Important(true),
        "~important" => return OptionToken::Important(false),
        "match-case" => return OptionToken::MatchCase(true),
        "~match-case" => return OptionToken::MatchCase(false),
        _ => {}
    }

    if let Some(value) = token.strip_prefix("domain=") {
        let (include, exclude) = split_domain_list(value, false);
        return OptionToken::Domains { include, exclude };
    }
    // Negated option form: every entry lands in the excluded set.
    if let Some(value) = token.strip_prefix("~domain=") {
        let (include, exclude) = split_domain_list(value, true);
        return OptionToken::Domains { include, exclude };
    }

    OptionToken::Unknown(token.to_string())
}

/// Split a `|`-separated domain list, dropping empty entries.
///
/// A leading `~` on an entry negates it; `negate_all` forces every entry
/// into the excluded set regardless of its own prefix.
fn split_domain_list(value: &str, negate_all: bool) -> (Vec<String>, Vec<String>) {
    let mut include = Vec::new();
    let mut exclude = Vec::new();

    for entry in value.split('|') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        match entry.strip_prefix('~') {
            Some(negated) => {
                if !negated.is_empty() {
                    exclude.push(negated.to_string());
                }
            }
            None if negate_all => exclude.push(entry.to_string()),
            None => include.push(entry.to_string()),
        }
    }

    (include, exclude)
}

/// Parse the text after the option delimiter into an [`OptionSet`].
///
/// An empty or whitespace-only segment yields the empty set.
pub fn parse_options(segment: &str) -> OptionSet {
    let mut set = OptionSet::default();
    if segment.trim().is_empty() {
        return set;
    }

    for token in segment.split(',') {
        match classify_token(token.trim()) {
            OptionToken::Domains { include, exclude } => {
                set.domains.extend(include);
                set.negated_domains.extend(exclude);
            }
            OptionToken::ThirdParty => set.third_party = true,
            OptionToken::FirstParty => set.first_party = true,
            OptionToken::Important(v) => set.important = v,
            OptionToken::MatchCase(v) => set.match_case = v,
            OptionToken::Unknown(_) => {}
        }
    }

    set
}
