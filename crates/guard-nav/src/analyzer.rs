//! `UrlThreatAnalyzer` (spec.md §4.11): pure, stateless scoring of a
//! navigation target. No I/O, no mutable state — safe to call from any
//! context, including inside the arbitration hot path.

use guard_types::{Host, Recommendation, ThreatLevel, ThreatReport, ThreatSignal, ThreatWeights};

const UNSAFE_PROTOCOLS: &[&str] = &["javascript", "vbscript"];

/// Host substrings for a closed list of known ad-exchange, cryptojacking,
/// and telemetry domains (spec.md §4.11). Illustrative, not exhaustive —
/// real deployments would source this from a maintained feed.
const KNOWN_BAD_SUBSTRINGS: &[&str] = &["adexchange.", "cryptojack", "telemetry-collect"];

/// TLDs with a disproportionate history of abuse (spec.md §4.11).
const SUSPICIOUS_TLDS: &[&str] = &[".zip", ".mov", ".top", ".xyz", ".click"];

fn protocol_of(url: &str) -> String {
    url.split(':').next().unwrap_or_default().trim().to_ascii_lowercase()
}

fn is_unsafe_protocol(url: &str, protocol: &str) -> bool {
    UNSAFE_PROTOCOLS.contains(&protocol)
        || (protocol == "data" && (url.contains("javascript") || url.contains("text/html")))
}

/// Cyrillic and Greek code points, the two scripts most often used for
/// Latin-confusable homograph hosts (spec.md §4.11).
fn is_homograph_suspect(host: &str) -> bool {
    host.chars().any(|c| matches!(c, '\u{0370}'..='\u{03FF}' | '\u{0400}'..='\u{04FF}'))
}

fn matches_known_bad_pattern(host: &str) -> bool {
    KNOWN_BAD_SUBSTRINGS.iter().any(|pattern| host.contains(pattern))
}

fn has_suspicious_tld(host: &str) -> bool {
    SUSPICIOUS_TLDS.iter().any(|tld| host.ends_with(tld))
}

#[derive(Debug, Clone, Copy)]
pub struct UrlThreatAnalyzer {
    weights: ThreatWeights,
}

impl Default for UrlThreatAnalyzer {
    fn default() -> Self {
        Self { weights: ThreatWeights::default() }
    }
}

impl UrlThreatAnalyzer {
    pub fn new(weights: ThreatWeights) -> Self {
        Self { weights }
    }

    /// `has_user_gesture` is reported by the navigation call site; its
    /// absence on a `window.open`-style call is the pop-under signal
    /// (spec.md §4.11).
    pub fn analyze(&self, url: &str, has_user_gesture: bool) -> ThreatReport {
        let protocol = protocol_of(url);
        let host = Host::parse(url);
        let mut score = 0;
        let mut threats = Vec::new();

        let unsafe_protocol = is_unsafe_protocol(url, &protocol);
        if unsafe_protocol {
            score += self.weights.unsafe_protocol;
            threats.push(ThreatSignal { kind: "unsafe_protocol".to_string(), score: self.weights.unsafe_protocol });
        }
        if is_homograph_suspect(host.as_str()) {
            score += self.weights.homograph;
            threats.push(ThreatSignal { kind: "homograph".to_string(), score: self.weights.homograph });
        }
        if matches_known_bad_pattern(host.as_str()) {
            score += self.weights.known_bad_pattern;
            threats.push(ThreatSignal {
                kind: "known_bad_pattern".to_string(),
                score: self.weights.known_bad_pattern,
            });
        }
        let is_pop_under = !has_user_gesture;
        if is_pop_under {
            score += self.weights.pop_under;
            threats.push(ThreatSignal { kind: "pop_under".to_string(), score: self.weights.pop_under });
        }
        if has_suspicious_tld(host.as_str()) {
            score += self.weights.suspicious_tld;
            threats.push(ThreatSignal { kind: "suspicious_tld".to_string(), score: self.weights.suspicious_tld });
        }

        let level = self.weights.level_for(score);
        let recommendation = recommend(level, is_pop_under, unsafe_protocol);

        ThreatReport { risk_score: score, threats, is_pop_under, level, recommendation }
    }
}

fn recommend(level: ThreatLevel, is_pop_under: bool, unsafe_protocol: bool) -> Recommendation {
    if unsafe_protocol {
        return Recommendation::Block;
    }
    match level {
        ThreatLevel::High => Recommendation::Block,
        ThreatLevel::Medium => Recommendation::Prompt,
        ThreatLevel::Low if is_pop_under => Recommendation::Prompt,
        ThreatLevel::Low => Recommendation::Allow,
    }
}
