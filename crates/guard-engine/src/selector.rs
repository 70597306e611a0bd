//! `SelectorExecutor` (spec.md §4.9): the lightweight domain-scoped path
//! used by the default/custom rule sources. No token index; each rule's
//! selector is evaluated directly against the live document.

use guard_dom::DomDocument;
use guard_types::{Host, Rule};
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tracing::warn;

#[derive(Debug, Clone, Copy)]
pub struct SelectorOpts {
    pub time_slicing: bool,
    pub budget_ms: u64,
}

impl Default for SelectorOpts {
    fn default() -> Self {
        Self { time_slicing: false, budget_ms: 16 }
    }
}

/// Cooperative yield shared with `RuleCoordinator` (spec.md §4.10): if the
/// elapsed time since `start` has reached `budget`, defer to the next
/// scheduler tick and reset `start`.
pub async fn yield_if_needed(start: &mut Instant, budget: Duration) {
    if start.elapsed() >= budget {
        tokio::task::yield_now().await;
        *start = Instant::now();
    }
}

pub struct SelectorExecutor;

impl SelectorExecutor {
    /// Iterates `rules` in input order; for each whose `DomainSpec` matches
    /// `current_domain`, runs `querySelectorAll` and removes every match.
    /// Invalid selectors are logged once and skipped, never aborting the
    /// pass (spec.md §4.9, §7).
    pub async fn execute(
        document: &dyn DomDocument,
        rules: &[Rule],
        current_domain: &Host,
        opts: SelectorOpts,
    ) -> u64 {
        let mut removed = 0u64;
        let mut start = Instant::now();
        let mut logged_invalid = HashSet::new();
        let budget = Duration::from_millis(opts.budget_ms);

        for rule in rules.iter().filter(|r| r.enabled && !r.is_inert()) {
            if !rule.domains.matches(current_domain) {
                continue;
            }
            match document.query_selector_all(&rule.selector) {
                Ok(elements) => {
                    for element in &elements {
                        element.remove();
                    }
                    removed += elements.len() as u64;
                }
                Err(_) => {
                    if logged_invalid.insert(rule.selector.clone()) {
                        warn!(target: "selector_executor", selector = rule.selector, "invalid selector, skipping");
                    }
                }
            }

            if opts.time_slicing {
                yield_if_needed(&mut start, budget).await;
            }
        }

        removed
    }
}
