//! `RuleParser` (spec.md §4.1): turns raw EasyList-style lines and
//! user-authored rule objects into canonical `Rule` records, rejecting
//! procedural selectors at parse time (spec.md §1 Non-goals).

use guard_types::{Confidence, DomainSpec, GuardError, Rule, RuleCategory, RuleSourceKind};
use serde::Deserialize;
use tracing::debug;

/// Extended/procedural pseudo-selector tokens rejected at parse time
/// (spec.md §4.1, closed list).
const PROCEDURAL_TOKENS: &[&str] = &[
    ":has-text(",
    ":contains(",
    ":xpath(",
    ":matches-css(",
    ":min-text-length(",
    ":watch-attr(",
    ":-abp-",
    ":upward(",
    ":remove(",
    ":style(",
    ":matches-path(",
    ":matches-media(",
];

fn contains_procedural_token(selector: &str) -> bool {
    PROCEDURAL_TOKENS.iter().any(|token| selector.contains(token))
}

/// Summary of a `parseCosmetic` run (SPEC_FULL.md §2 supplement) so callers
/// and tests can assert on drop counts without re-parsing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseReport {
    pub accepted: usize,
    pub rejected_procedural: usize,
    pub rejected_malformed: usize,
}

/// Parse newline-delimited EasyList-style cosmetic lines (spec.md §4.1).
/// Comments (`!`), section headers (`[`), and non-cosmetic lines are
/// silently skipped; procedural selectors are silently dropped (spec.md
/// §1/§4.1: "fails silently (log + drop) for cosmetic lines").
pub fn parse_cosmetic(lines: &[&str]) -> (Vec<Rule>, ParseReport) {
    let mut rules = Vec::new();
    let mut report = ParseReport::default();

    for line in lines {
        let line = line.trim();
        if line.is_empty() || line.starts_with('!') || line.starts_with('[') {
            continue;
        }
        let Some(selector) = line.strip_prefix("##") else {
            continue;
        };
        if selector.is_empty() {
            report.rejected_malformed += 1;
            continue;
        }
        if contains_procedural_token(selector) {
            debug!(target: "parser", selector, "dropped procedural cosmetic rule");
            report.rejected_procedural += 1;
            continue;
        }

        let id = format!("easylist-{}", report.accepted);
        rules.push(Rule {
            id,
            selector: selector.to_string(),
            domains: DomainSpec::All,
            enabled: true,
            category: RuleCategory::Easylist,
            confidence: Confidence::High,
            source: RuleSourceKind::Easylist,
        });
        report.accepted += 1;
    }

    (rules, report)
}

/// Wire shape for a user-authored rule object (spec.md §4.1).
#[derive(Debug, Clone, Deserialize)]
pub struct UserRuleInput {
    pub id: Option<String>,
    pub selector: String,
    pub domains: UserDomainInput,
    #[serde(default = "UserRuleInput::default_enabled")]
    pub enabled: bool,
}

impl UserRuleInput {
    fn default_enabled() -> bool {
        true
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum UserDomainInput {
    All(UserDomainAll),
    List(Vec<String>),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserDomainAll {
    All,
}

/// Validate and canonicalize a user-authored rule (spec.md §4.1).
/// Fails with `InvalidRule` when the selector is empty, contains a
/// procedural pseudo-token, or parses as standard CSS but with an empty
/// `domains` list.
pub fn parse_user_rule(input: UserRuleInput, next_id: impl FnOnce() -> String) -> Result<Rule, GuardError> {
    let selector = input.selector.trim();
    if selector.is_empty() {
        return Err(GuardError::InvalidRule("selector must be non-empty".into()));
    }
    if contains_procedural_token(selector) {
        return Err(GuardError::InvalidRule(format!(
            "selector `{selector}` uses an unsupported procedural pseudo-class"
        )));
    }

    let domains = match input.domains {
        UserDomainInput::All(UserDomainAll::All) => DomainSpec::All,
        UserDomainInput::List(patterns) => {
            if patterns.is_empty() {
                return Err(GuardError::InvalidRule("domains list must be non-empty".into()));
            }
            DomainSpec::Patterns(patterns)
        }
    };

    Ok(Rule {
        id: input.id.unwrap_or_else(next_id),
        selector: selector.to_string(),
        domains,
        enabled: input.enabled,
        category: RuleCategory::Custom,
        confidence: Confidence::Medium,
        source: RuleSourceKind::Custom,
    })
}
