//! External-collaborator fakes for the harness binary and its integration
//! tests: a canned `Fetcher`, a logging `IpcChannel`, and a scripted
//! `PromptUi`. None of these model a real network or a real page bridge —
//! they exist only to exercise the core against deterministic inputs.

use async_trait::async_trait;
use guard_nav::{IpcChannel, NavCheckRequest, NavDecision, NavGuardianError, PromptContext, PromptUi};
use guard_sources::Fetcher;
use guard_types::GuardError;
use std::sync::Mutex;
use tracing::warn;

/// Serves a fixed body, or fails every call when `should_fail` is set —
/// used to exercise the EasyList stale-cache fallback path.
pub struct CannedFetcher {
    body: String,
    should_fail: bool,
}

impl CannedFetcher {
    pub fn ok(body: impl Into<String>) -> Self {
        Self { body: body.into(), should_fail: false }
    }

    pub fn failing() -> Self {
        Self { body: String::new(), should_fail: true }
    }
}

#[async_trait]
impl Fetcher for CannedFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, GuardError> {
        if self.should_fail {
            return Err(GuardError::NetworkFailure(format!("unreachable: {url}")));
        }
        Ok(self.body.clone())
    }
}

/// Logs reported navigation errors via `tracing` and keeps them for
/// assertions; `request_nav_check` is the page-world bridge's outbound call
/// surface (spec.md §6) and is never invoked by `NavigationGuardian` itself,
/// which arbitrates directly.
#[derive(Default)]
pub struct LoggingIpc {
    reported: Mutex<Vec<NavGuardianError>>,
}

impl LoggingIpc {
    pub fn reported(&self) -> Vec<NavGuardianError> {
        self.reported.lock().expect("ipc log poisoned").clone()
    }
}

#[async_trait]
impl IpcChannel for LoggingIpc {
    async fn request_nav_check(&self, _request: NavCheckRequest) -> Result<NavDecision, GuardError> {
        Err(GuardError::BridgeUnavailable)
    }

    fn report_error(&self, error: NavGuardianError) {
        warn!(target: "guard_host.ipc", nav_type = %error.nav_type, kind = %error.kind, is_high_risk = error.is_high_risk, "navigation error reported");
        self.reported.lock().expect("ipc log poisoned").push(error);
    }
}

/// A scripted confirmation dialog: always answers with the same fixed
/// decision, recording every prompt it was shown.
pub struct ScriptedPrompt {
    answer: bool,
    shown: Mutex<Vec<PromptContext>>,
}

impl ScriptedPrompt {
    pub fn always(answer: bool) -> Self {
        Self { answer, shown: Mutex::new(Vec::new()) }
    }

    pub fn shown(&self) -> Vec<PromptContext> {
        self.shown.lock().expect("prompt log poisoned").clone()
    }
}

#[async_trait]
impl PromptUi for ScriptedPrompt {
    async fn confirm(&self, ctx: PromptContext) -> bool {
        self.shown.lock().expect("prompt log poisoned").push(ctx);
        self.answer
    }
}
