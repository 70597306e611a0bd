//! Reference harness binary: runs one cosmetic-filter pass and one
//! navigation-arbitration check against an in-memory page, using the
//! fakes in this crate for every external collaborator spec.md §1 names.

use anyhow::Result;
use clap::Parser;
use guard_cleanup::CleanupRegistry;
use guard_engine::RuleCoordinator;
use guard_host::{CannedFetcher, LoggingIpc, MemoryDocument, ScriptedPrompt};
use guard_nav::{NavCheckRequest, NavigationGuardian, UrlThreatAnalyzer};
use guard_sources::{CustomSource, DefaultSource, EasyListDomSource, Fetcher, RuleSource};
use guard_types::{Clock, Host, NavType, Store, StoreExt, SystemClock, ThreatWeights};
use std::path::PathBuf;
use std::sync::{Arc, Once};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;

/// CLI arguments for the reference harness.
#[derive(Parser, Debug)]
#[command(name = "guard-host", version, about = "Cosmetic filter engine reference harness")]
struct Args {
    /// Persistent settings/rule-store file (created on first run).
    #[arg(long, default_value = "guard-host.toml")]
    config: PathBuf,

    /// Domain to simulate the page as being loaded on.
    #[arg(long, default_value = "example.com")]
    domain: String,

    /// Host used for the page's cross-origin third-party iframe.
    #[arg(long, default_value = "thirdparty.example")]
    iframe_host: String,

    /// URL to run through the navigation guardian.
    #[arg(long, default_value = "https://adexchange.example/click")]
    nav_url: String,

    /// Whether the simulated navigation carries a user gesture.
    #[arg(long)]
    user_gesture: bool,

    /// Auto-answer "allow" when the navigation guardian would prompt.
    #[arg(long)]
    auto_allow: bool,

    /// Force the EasyList fetch to fail, exercising the stale-cache path.
    #[arg(long)]
    easylist_offline: bool,
}

struct AppStartup {
    log_guard: Option<WorkerGuard>,
}

impl AppStartup {
    fn new() -> Self {
        Self { log_guard: None }
    }

    fn configure_logging(&mut self) -> Result<()> {
        let log_dir = std::path::Path::new(".");
        let log_path = log_dir.join("guard-host.log");
        if log_path.exists() {
            let _ = std::fs::remove_file(&log_path);
        }

        let file_appender = tracing_appender::rolling::never(log_dir, "guard-host.log");
        let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
        match tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_writer(nb_writer)
            .try_init()
        {
            Ok(_) => self.log_guard = Some(guard),
            Err(_err) => {
                // A global subscriber is already installed (e.g. under test); drop
                // the guard so its writer thread shuts down cleanly.
            }
        }
        Ok(())
    }

    fn install_panic_hook() {
        static HOOK: Once = Once::new();
        HOOK.call_once(|| {
            let default_panic = std::panic::take_hook();
            std::panic::set_hook(Box::new(move |info| {
                tracing::error!(target: "runtime.panic", ?info, "panic");
                default_panic(info);
            }));
        });
    }
}

fn seed_rules_if_missing(store: &dyn Store) {
    if store.get("defaultRules").is_none() {
        let _ = store.set_typed("defaultRules", &guard_host::fixtures::seed_default_rules());
    }
    if store.get("customRules").is_none() {
        let _ = store.set_typed("customRules", &guard_host::fixtures::seed_custom_rules());
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut startup = AppStartup::new();
    startup.configure_logging()?;
    AppStartup::install_panic_hook();
    info!(target: "runtime", "startup");

    let args = Args::parse();
    let registry = CleanupRegistry::new();

    let store: Arc<dyn Store> = Arc::new(guard_host::TomlStore::load(args.config.clone()));
    seed_rules_if_missing(store.as_ref());

    let app_state = guard_config::load_snapshot(store.as_ref());
    let current_host = Host::parse(&args.domain);

    if app_state.is_inert_for(&current_host) {
        info!(target: "runtime", domain = %current_host, "host is inert (inactive or whitelisted), nothing to do");
        return Ok(());
    }

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let fetcher: Arc<dyn Fetcher> =
        if args.easylist_offline { Arc::new(CannedFetcher::failing()) } else { Arc::new(CannedFetcher::ok("! demo easylist\n##.sponsored-widget")) };

    let sources: Vec<Arc<dyn RuleSource>> = vec![
        Arc::new(DefaultSource::new(store.clone(), clock.clone())),
        Arc::new(CustomSource::new(store.clone(), clock.clone())),
        Arc::new(EasyListDomSource::new("https://example/easylist-dom.txt", fetcher, store.clone(), clock.clone())),
    ];
    let coordinator = Arc::new(RuleCoordinator::new(sources));

    let stats = Arc::new(guard_stats::StatsStore::new(store.clone()));

    let document = Arc::new(MemoryDocument::new(guard_host::fixtures::page_with_third_party_iframe(
        &args.domain,
        &args.iframe_host,
    )));

    let scan_stats = coordinator
        .execute(document.clone(), current_host.clone(), &app_state.whitelist, app_state.rule_coordinator_settings(), stats.as_ref())
        .await;
    info!(target: "runtime", removed = scan_stats.removed, hidden = scan_stats.hidden, "cosmetic pass complete");

    {
        let coordinator = coordinator.clone();
        registry.register("rule_coordinator", move || coordinator.cleanup());
    }

    if app_state.navigation_guard_enabled {
        let guardian = NavigationGuardian::new(
            current_host.clone(),
            app_state.whitelist.clone(),
            UrlThreatAnalyzer::new(ThreatWeights::default()),
            Arc::new(ScriptedPrompt::always(args.auto_allow)),
            Arc::new(LoggingIpc::default()),
            stats.clone(),
        );
        let decision = guardian
            .arbitrate(NavCheckRequest {
                url: args.nav_url.clone(),
                nav_type: NavType::LocationHref,
                has_user_gesture: args.user_gesture,
            })
            .await;
        info!(target: "runtime", url = %args.nav_url, ?decision, "navigation arbitration complete");
    }

    {
        let stats = stats.clone();
        registry.register("stats_store", move || stats.flush());
    }
    registry.cleanup();

    let nav_snapshot = stats.navigation_snapshot();
    let domain_snapshot = stats.domain_snapshot(&current_host);
    info!(
        target: "runtime",
        allowed = nav_snapshot.allowed_count,
        blocked = nav_snapshot.blocked_count,
        default_removed = domain_snapshot.default_rules_removed,
        custom_removed = domain_snapshot.custom_rules_removed,
        "final stats snapshot"
    );

    Ok(())
}
