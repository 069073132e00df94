//! Header lookup by ordered matcher rules.
//!
//! A matcher is a list of rules evaluated in order against the full header
//! list; the first rule that yields a column wins. Lookups are pure so they
//! can be tested without a table.

use crate::conf::TUP_MEMBERSHIP_HEADERS;

/// One header lookup rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumColumnRule {
    /// Case-sensitive exact names, tried in list order.
    Exact(Vec<String>),
    /// Headers scanned in table order; a header matches when its normalized
    /// form contains every fragment of at least one group.
    NormalizedContainsAll(Vec<Vec<String>>),
}

impl EnumColumnRule {
    fn find(&self, headers: &[String]) -> Option<usize> {
        match self {
            Self::Exact(l_names) => l_names
                .iter()
                .find_map(|c_name| headers.iter().position(|h| h == c_name)),
            Self::NormalizedContainsAll(l_groups) => headers.iter().position(|h| {
                let c_norm = normalize_header(h);
                l_groups.iter().any(|l_fragments| {
                    l_fragments
                        .iter()
                        .all(|c_fragment| c_norm.contains(c_fragment.as_str()))
                })
            }),
        }
    }
}

/// Trim, lowercase and strip spaces.
pub fn normalize_header(header: &str) -> String {
    header
        .trim()
        .to_lowercase()
        .chars()
        .filter(|chr| *chr != ' ')
        .collect()
}

/// Index of the first header satisfying `rules` (rules evaluated in order).
pub fn find_column(headers: &[String], rules: &[EnumColumnRule]) -> Option<usize> {
    rules.iter().find_map(|rule| rule.find(headers))
}

/// Rules locating the membership column on month sheets.
pub fn derive_membership_rules() -> Vec<EnumColumnRule> {
    vec![EnumColumnRule::Exact(
        TUP_MEMBERSHIP_HEADERS.iter().map(ToString::to_string).collect(),
    )]
}

/// Rules locating the correspondence language column.
pub fn derive_correspondence_language_rules() -> Vec<EnumColumnRule> {
    let group = |l_fragments: &[&str]| l_fragments.iter().map(ToString::to_string).collect();
    vec![EnumColumnRule::NormalizedContainsAll(vec![
        group(&["korrespondenzsprache"]),
        group(&["korrespsprache"]),
        group(&["korresp", "sprache"]),
    ])]
}

/// Header name located by `rules`, if any.
pub fn find_column_name(headers: &[String], rules: &[EnumColumnRule]) -> Option<String> {
    find_column(headers, rules).map(|n_idx| headers[n_idx].clone())
}
