//! `ThreatReport` (spec.md §3, §4.11) and the configurable scoring weights
//! (SPEC_FULL.md §2 / spec.md §9 open question: the per-signal weights and
//! level thresholds are product knobs, not hard-coded constants).

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ThreatSignal {
    pub kind: String,
    pub score: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ThreatLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Recommendation {
    Allow,
    Prompt,
    Block,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ThreatReport {
    pub risk_score: i32,
    pub threats: Vec<ThreatSignal>,
    pub is_pop_under: bool,
    pub level: ThreatLevel,
    pub recommendation: Recommendation,
}

/// Per-signal weights and level thresholds (spec.md §4.11, §9). Exposed as a
/// single configuration record rather than hard-coded throughout
/// `UrlThreatAnalyzer`, per the open question in spec.md §9.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ThreatWeights {
    pub unsafe_protocol: i32,
    pub homograph: i32,
    pub known_bad_pattern: i32,
    pub pop_under: i32,
    pub suspicious_tld: i32,
    pub medium_threshold: i32,
    pub high_threshold: i32,
}

impl Default for ThreatWeights {
    fn default() -> Self {
        Self {
            unsafe_protocol: 10,
            homograph: 5,
            known_bad_pattern: 7,
            pop_under: 3,
            suspicious_tld: 2,
            medium_threshold: 4,
            high_threshold: 8,
        }
    }
}

impl ThreatWeights {
    /// `level` is a pure function of `riskScore` (spec.md §3): HIGH >= high
    /// threshold, MEDIUM >= medium threshold, else LOW.
    pub fn level_for(&self, risk_score: i32) -> ThreatLevel {
        if risk_score >= self.high_threshold {
            ThreatLevel::High
        } else if risk_score >= self.medium_threshold {
            ThreatLevel::Medium
        } else {
            ThreatLevel::Low
        }
    }
}
