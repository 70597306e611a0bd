//! Host name newtype shared by rule domain matching, whitelist checks, and
//! navigation threat scoring.

use std::fmt;

/// A bare hostname, stored without scheme or port (matches the `whitelist`
/// store contract in spec.md §6: "Hosts stored without scheme.").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct Host(String);

impl Host {
    /// Build a `Host` from a raw string, lowercasing and stripping any
    /// scheme/port/path a caller forgot to trim. Never fails: an empty or
    /// malformed input simply yields an empty host, which matches nothing.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        let without_scheme = raw.split("://").next_back().unwrap_or(raw);
        let without_path = without_scheme.split('/').next().unwrap_or("");
        let without_port = without_path.rsplit_once(':').map_or(without_path, |(h, _)| h);
        Host(without_port.to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Host {
    fn from(raw: &str) -> Self {
        Host::parse(raw)
    }
}

impl From<String> for Host {
    fn from(raw: String) -> Self {
        Host::parse(&raw)
    }
}
