//! Sample page trees used by the demo binary and the end-to-end tests
//! (spec.md §8's scenarios all exercise one of these shapes).

use crate::memory::MemoryElement;
use guard_types::{Confidence, DomainSpec, Rule, RuleCategory, RuleSourceKind};

/// A page with an ad banner, a first-party iframe, and a cross-origin
/// third-party iframe — the shape scenario 2 (tiered removal) needs.
pub fn page_with_third_party_iframe(current_host: &str, iframe_host: &str) -> MemoryElement {
    MemoryElement::new("body")
        .with_child(MemoryElement::new("div").with_class("ads-banner"))
        .with_child(MemoryElement::new("main").with_id("content"))
        .with_child(
            MemoryElement::new("iframe").with_class("ad-frame").with_attr(
                "src",
                &format!("https://{iframe_host}/ad.html"),
            ),
        )
        .with_child(MemoryElement::new("iframe").with_attr("src", &format!("https://{current_host}/widget.html")))
}

/// A framework-managed ad container (scenario 3: downgrade to hide rather
/// than remove).
pub fn page_with_framework_managed_ad() -> MemoryElement {
    MemoryElement::new("body")
        .with_child(MemoryElement::new("div").with_class("ads-banner").with_framework_key("__vue__"))
        .with_child(MemoryElement::new("main").with_id("content"))
}

/// A plain page with one cosmetic target and nothing else interesting.
pub fn plain_page() -> MemoryElement {
    MemoryElement::new("body")
        .with_child(MemoryElement::new("div").with_class("ads-banner"))
        .with_child(MemoryElement::new("main").with_id("content"))
}

fn rule(selector: &str, source: RuleSourceKind) -> Rule {
    Rule {
        id: format!("seed-{selector}"),
        selector: selector.to_string(),
        domains: DomainSpec::All,
        enabled: true,
        category: RuleCategory::Advertising,
        confidence: Confidence::High,
        source,
    }
}

pub fn seed_default_rules() -> Vec<Rule> {
    vec![rule(".ads-banner", RuleSourceKind::Default), rule(".ad-frame", RuleSourceKind::Default)]
}

pub fn seed_custom_rules() -> Vec<Rule> {
    vec![rule(".promo-tile", RuleSourceKind::Custom)]
}
