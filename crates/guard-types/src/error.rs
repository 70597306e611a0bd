//! Semantic error kinds (spec.md §7). These are leaf errors: rule processing
//! and DOM scanning catch and log them rather than letting them escape a scan
//! boundary. Navigation arbitration is the one place a `GuardError` directly
//! drives behavior (fail-secure deny).

use thiserror::Error;

/// The navigation primitive a page-world override intercepted, used to key
/// `errorsByType` (spec.md §4.12, §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum NavType {
    WindowOpen,
    LocationAssign,
    LocationReplace,
    LocationHref,
}

impl NavType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NavType::WindowOpen => "window.open",
            NavType::LocationAssign => "location.assign",
            NavType::LocationReplace => "location.replace",
            NavType::LocationHref => "location.href",
        }
    }
}

impl std::fmt::Display for NavType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum GuardError {
    #[error("host context invalidated")]
    HostContextInvalidated,

    #[error("network failure fetching rules: {0}")]
    NetworkFailure(String),

    #[error("failed to parse rule source: {0}")]
    ParseFailure(String),

    #[error("invalid selector: {0}")]
    InvalidSelector(String),

    #[error("page-world bridge unavailable")]
    BridgeUnavailable,

    #[error("arbitration timed out waiting for a navigation decision")]
    ArbitrationTimeout,

    #[error("failed to write to persistent store: {0}")]
    StoreWriteFailure(String),

    #[error("host exhibits homograph suspicion")]
    HomographSuspicion,

    #[error("unsafe protocol: {0}")]
    UnsafeProtocol(String),

    #[error("user rule is invalid: {0}")]
    InvalidRule(String),
}

impl GuardError {
    /// User-visible reason text for a blocked navigation (spec.md §7): never
    /// echoes raw error text from untrusted sources, only a fixed phrase per
    /// error kind.
    pub fn toast_reason(&self) -> &'static str {
        match self {
            GuardError::ArbitrationTimeout | GuardError::BridgeUnavailable => {
                "Navigation blocked due to security check error"
            }
            GuardError::UnsafeProtocol(_) => "Navigation blocked: unsafe protocol",
            GuardError::HomographSuspicion => "Navigation blocked: suspicious domain",
            _ => "Navigation blocked due to security check error",
        }
    }
}
