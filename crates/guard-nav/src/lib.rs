//! Navigation threat analysis and cross-origin interception (spec.md
//! §4.11–§4.12).

mod analyzer;
mod guardian;

pub use analyzer::UrlThreatAnalyzer;
pub use guardian::{
    IpcChannel, NavCheckRequest, NavDecision, NavGuardianError, NavigationGuardian,
    NavigationStatsSink, PromptContext, PromptUi,
};
