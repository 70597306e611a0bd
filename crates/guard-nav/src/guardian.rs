//! `NavigationGuardian` (spec.md §4.12): cross-origin navigation
//! interception. One arbitration flow serves both the DOM-event capture
//! layer (clicks/submits) and the page-world bridge layer (`window.open`,
//! `location.*`); the bridge's own fail-secure wrapping lives here too,
//! since Rust has no first-class way to monkey-patch the page's own
//! globals — that half lives in the host embedding (spec.md §9).

use crate::analyzer::UrlThreatAnalyzer;
use async_trait::async_trait;
use guard_types::{is_whitelisted, GuardError, Host, NavType, Recommendation, ThreatReport};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::warn;

const MAX_ERROR_RECORDS_PER_TYPE: usize = 10;
const DEFAULT_ARBITRATION_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum NavDecision {
    Allow,
    Deny,
}

/// Crosses the `IpcChannel` boundary (spec.md §6), hence `Serialize`/
/// `Deserialize` per SPEC_FULL.md §3.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct NavCheckRequest {
    pub url: String,
    pub nav_type: NavType,
    pub has_user_gesture: bool,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PromptContext {
    pub url: String,
    pub threat_report: ThreatReport,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct NavGuardianError {
    pub nav_type: NavType,
    pub kind: String,
    pub is_high_risk: bool,
}

/// The page-world bridge's outbound call surface, as seen from the content
/// context (spec.md §6). `request_nav_check` is the stub a host embedding
/// wires its injected `window.open`/`location.*` replacements to; it is not
/// called by `NavigationGuardian` itself, which already runs in the content
/// context and arbitrates directly.
#[async_trait]
pub trait IpcChannel: Send + Sync {
    async fn request_nav_check(&self, request: NavCheckRequest) -> Result<NavDecision, GuardError>;
    fn report_error(&self, error: NavGuardianError);
}

#[async_trait]
pub trait PromptUi: Send + Sync {
    async fn confirm(&self, ctx: PromptContext) -> bool;
}

pub trait NavigationStatsSink: Send + Sync {
    fn increment(&self, allowed: bool);
}

#[derive(Debug, Clone)]
struct ErrorRecord {
    kind: String,
    is_high_risk: bool,
}

struct Slot {
    url: String,
    waiters: Vec<oneshot::Sender<NavDecision>>,
}

/// Owns its error log and the single in-flight arbitration slot (spec.md
/// §3). Cross-origin interception's DOM listener set and page-world bridge
/// itself live in the host embedding; this models the arbitration flow and
/// fail-secure error bookkeeping spec.md actually specifies invariants for.
pub struct NavigationGuardian {
    current_host: Host,
    whitelist: Vec<Host>,
    analyzer: UrlThreatAnalyzer,
    prompt_ui: Arc<dyn PromptUi>,
    ipc: Arc<dyn IpcChannel>,
    stats_sink: Arc<dyn NavigationStatsSink>,
    arbitration_timeout: Duration,
    slot: Mutex<Option<Slot>>,
    errors_by_type: Mutex<HashMap<NavType, VecDeque<ErrorRecord>>>,
}

impl NavigationGuardian {
    pub fn new(
        current_host: Host,
        whitelist: Vec<Host>,
        analyzer: UrlThreatAnalyzer,
        prompt_ui: Arc<dyn PromptUi>,
        ipc: Arc<dyn IpcChannel>,
        stats_sink: Arc<dyn NavigationStatsSink>,
    ) -> Self {
        Self {
            current_host,
            whitelist,
            analyzer,
            prompt_ui,
            ipc,
            stats_sink,
            arbitration_timeout: DEFAULT_ARBITRATION_TIMEOUT,
            slot: Mutex::new(None),
            errors_by_type: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_arbitration_timeout(mut self, timeout: Duration) -> Self {
        self.arbitration_timeout = timeout;
        self
    }

    /// Single entry point for both interception layers (spec.md §4.12).
    /// Whitelist bypass happens before anything else touches stats or the
    /// arbitration slot (spec.md §7).
    pub async fn arbitrate(&self, request: NavCheckRequest) -> NavDecision {
        if is_whitelisted(&self.whitelist, &self.current_host) {
            return NavDecision::Allow;
        }

        let mut is_leader = false;
        let follower_rx = {
            let mut slot = self.slot.lock().expect("guardian slot poisoned");
            match slot.as_mut() {
                Some(inflight) if inflight.url == request.url => {
                    let (tx, rx) = oneshot::channel();
                    inflight.waiters.push(tx);
                    Some(rx)
                }
                Some(_) => None,
                None => {
                    *slot = Some(Slot { url: request.url.clone(), waiters: Vec::new() });
                    is_leader = true;
                    None
                }
            }
        };

        if !is_leader {
            return match follower_rx {
                Some(rx) => rx.await.unwrap_or_else(|_| self.fail_secure(request.nav_type, "follower channel dropped")),
                // A different URL is already being arbitrated: deny for safety
                // without waiting (spec.md §4.12).
                None => {
                    self.stats_sink.increment(false);
                    NavDecision::Deny
                }
            };
        }

        let decision = match tokio::time::timeout(self.arbitration_timeout, self.decide(&request)).await {
            Ok(decision) => decision,
            Err(_) => self.fail_secure(request.nav_type, "arbitration timed out"),
        };

        if let Some(slot) = self.slot.lock().expect("guardian slot poisoned").take() {
            for waiter in slot.waiters {
                let _ = waiter.send(decision);
            }
        }

        self.stats_sink.increment(decision == NavDecision::Allow);
        decision
    }

    async fn decide(&self, request: &NavCheckRequest) -> NavDecision {
        let report = self.analyzer.analyze(&request.url, request.has_user_gesture);
        if matches!(report.recommendation, Recommendation::Allow) && !report.is_pop_under {
            return NavDecision::Allow;
        }

        let ctx = PromptContext { url: request.url.clone(), threat_report: report };
        if self.prompt_ui.confirm(ctx).await {
            NavDecision::Allow
        } else {
            NavDecision::Deny
        }
    }

    /// Any `BridgeUnavailable`, timeout, or analyzer failure denies the
    /// navigation, records the error (last 10 kept per nav type), and posts
    /// a high-risk notification (spec.md §7, §4.12).
    fn fail_secure(&self, nav_type: NavType, reason: &str) -> NavDecision {
        warn!(target: "nav_guardian", nav_type = %nav_type, reason, "fail-secure deny");
        let record = ErrorRecord { kind: reason.to_string(), is_high_risk: true };
        {
            let mut errors = self.errors_by_type.lock().expect("error log poisoned");
            let bucket = errors.entry(nav_type).or_default();
            bucket.push_back(record);
            while bucket.len() > MAX_ERROR_RECORDS_PER_TYPE {
                bucket.pop_front();
            }
        }
        self.ipc.report_error(NavGuardianError { nav_type, kind: reason.to_string(), is_high_risk: true });
        NavDecision::Deny
    }

    pub fn error_count_for(&self, nav_type: NavType) -> usize {
        self.errors_by_type.lock().expect("error log poisoned").get(&nav_type).map_or(0, VecDeque::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use guard_types::ThreatWeights;
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::sync::Mutex as StdMutex;

    struct AlwaysConfirm(bool);
    #[async_trait]
    impl PromptUi for AlwaysConfirm {
        async fn confirm(&self, _ctx: PromptContext) -> bool {
            self.0
        }
    }

    struct HangingPrompt;
    #[async_trait]
    impl PromptUi for HangingPrompt {
        async fn confirm(&self, _ctx: PromptContext) -> bool {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            true
        }
    }

    #[derive(Default)]
    struct RecordingIpc {
        reported: StdMutex<Vec<NavGuardianError>>,
    }
    #[async_trait]
    impl IpcChannel for RecordingIpc {
        async fn request_nav_check(&self, _request: NavCheckRequest) -> Result<NavDecision, GuardError> {
            Ok(NavDecision::Allow)
        }
        fn report_error(&self, error: NavGuardianError) {
            self.reported.lock().unwrap().push(error);
        }
    }

    #[derive(Default)]
    struct CountingStats {
        allowed: AtomicI64,
        blocked: AtomicI64,
    }
    impl NavigationStatsSink for CountingStats {
        fn increment(&self, allowed: bool) {
            if allowed {
                self.allowed.fetch_add(1, Ordering::SeqCst);
            } else {
                self.blocked.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    fn guardian(
        prompt: Arc<dyn PromptUi>,
        ipc: Arc<dyn IpcChannel>,
        stats: Arc<CountingStats>,
    ) -> NavigationGuardian {
        NavigationGuardian::new(
            Host::parse("example.com"),
            vec![],
            UrlThreatAnalyzer::new(ThreatWeights::default()),
            prompt,
            ipc,
            stats,
        )
    }

    #[tokio::test]
    async fn whitelisted_host_allows_without_touching_stats() {
        let stats = Arc::new(CountingStats::default());
        let g = NavigationGuardian::new(
            Host::parse("trusted.org"),
            vec![Host::parse("trusted.org")],
            UrlThreatAnalyzer::new(ThreatWeights::default()),
            Arc::new(AlwaysConfirm(false)),
            Arc::new(RecordingIpc::default()),
            stats.clone(),
        );
        let decision = g
            .arbitrate(NavCheckRequest {
                url: "https://malicious.example".into(),
                nav_type: NavType::LocationHref,
                has_user_gesture: true,
            })
            .await;
        assert_eq!(decision, NavDecision::Allow);
        assert_eq!(stats.allowed.load(Ordering::SeqCst), 0);
        assert_eq!(stats.blocked.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn benign_navigation_allows_silently() {
        let stats = Arc::new(CountingStats::default());
        let g = guardian(Arc::new(AlwaysConfirm(false)), Arc::new(RecordingIpc::default()), stats.clone());
        let decision = g
            .arbitrate(NavCheckRequest {
                url: "https://docs.example.com".into(),
                nav_type: NavType::WindowOpen,
                has_user_gesture: true,
            })
            .await;
        assert_eq!(decision, NavDecision::Allow);
        assert_eq!(stats.allowed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn prompt_rejection_denies_and_counts_blocked() {
        let stats = Arc::new(CountingStats::default());
        let g = guardian(Arc::new(AlwaysConfirm(false)), Arc::new(RecordingIpc::default()), stats.clone());
        let decision = g
            .arbitrate(NavCheckRequest {
                url: "https://adexchange.example".into(),
                nav_type: NavType::WindowOpen,
                has_user_gesture: false,
            })
            .await;
        assert_eq!(decision, NavDecision::Deny);
        assert_eq!(stats.blocked.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_prompt_times_out_fail_secure() {
        let stats = Arc::new(CountingStats::default());
        let ipc = Arc::new(RecordingIpc::default());
        let g = guardian(Arc::new(HangingPrompt), ipc.clone(), stats.clone())
            .with_arbitration_timeout(Duration::from_secs(1));

        let handle = tokio::spawn(async move {
            g.arbitrate(NavCheckRequest {
                url: "https://malicious.example".into(),
                nav_type: NavType::LocationHref,
                has_user_gesture: false,
            })
            .await
        });
        tokio::time::advance(Duration::from_secs(2)).await;
        let decision = handle.await.unwrap();
        assert_eq!(decision, NavDecision::Deny);
        assert_eq!(stats.blocked.load(Ordering::SeqCst), 1);
        assert_eq!(ipc.reported.lock().unwrap().len(), 1);
        assert!(ipc.reported.lock().unwrap()[0].is_high_risk);
    }

    #[tokio::test]
    async fn concurrent_request_for_different_url_is_denied_for_safety() {
        let stats = Arc::new(CountingStats::default());
        let g = Arc::new(guardian(Arc::new(HangingPrompt), Arc::new(RecordingIpc::default()), stats.clone()));
        let g2 = g.clone();

        let first = tokio::spawn(async move {
            g.arbitrate(NavCheckRequest {
                url: "https://a.example".into(),
                nav_type: NavType::WindowOpen,
                has_user_gesture: false,
            })
            .await
        });
        tokio::task::yield_now().await;
        let second = g2
            .arbitrate(NavCheckRequest {
                url: "https://b.example".into(),
                nav_type: NavType::WindowOpen,
                has_user_gesture: true,
            })
            .await;
        assert_eq!(second, NavDecision::Deny);
        first.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn error_count_caps_at_ten_per_nav_type() {
        let stats = Arc::new(CountingStats::default());
        let g = Arc::new(
            guardian(Arc::new(HangingPrompt), Arc::new(RecordingIpc::default()), stats)
                .with_arbitration_timeout(Duration::from_millis(10)),
        );

        for i in 0..15 {
            let g = g.clone();
            let url = format!("https://malicious-{i}.example");
            let handle = tokio::spawn(async move {
                g.arbitrate(NavCheckRequest {
                    url,
                    nav_type: NavType::LocationAssign,
                    has_user_gesture: false,
                })
                .await
            });
            tokio::time::advance(Duration::from_millis(20)).await;
            assert_eq!(handle.await.unwrap(), NavDecision::Deny);
        }
        assert_eq!(g.error_count_for(NavType::LocationAssign), MAX_ERROR_RECORDS_PER_TYPE);
    }
}
