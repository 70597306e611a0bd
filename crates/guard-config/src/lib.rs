//! `AppState` (spec.md §4.16, §9): a settings snapshot read from `Store`
//! exactly once per refresh, never mid-scan. `load_snapshot` is the only
//! function in the workspace that reads the raw keys in spec.md §6 —
//! `RuleCoordinator`/`NavigationGuardian` are handed the derived snapshot
//! instead, keeping raw store data and context-applied settings separate.

use guard_engine::RuleCoordinatorSettings;
use guard_types::{is_whitelisted, Host, Store, StoreExt};
use tracing::debug;

/// `Store` key names, matching spec.md §6's table verbatim.
pub mod keys {
    pub const IS_ACTIVE: &str = "isActive";
    pub const WHITELIST: &str = "whitelist";
    pub const DEFAULT_RULES: &str = "defaultRules";
    pub const CUSTOM_RULES: &str = "customRules";
    pub const DEFAULT_RULES_ENABLED: &str = "defaultRulesEnabled";
    pub const CUSTOM_RULES_ENABLED: &str = "customRulesEnabled";
    pub const NAVIGATION_GUARD_ENABLED: &str = "navigationGuardEnabled";
    pub const DEFAULT_BLOCK_REQUEST_ENABLED: &str = "defaultBlockRequestEnabled";
    pub const NAVIGATION_STATS: &str = "navigationStats";
    pub const DOMAIN_STATS: &str = "domainStats";
    pub const EASYLIST_DOM_RULES: &str = "easylistDomRules";
    pub const EASYLIST_BUNDLED_UNDER_DEFAULT: &str = "easylistBundledUnderDefault";
    pub const EASYLIST_ENABLED: &str = "easylistEnabled";
}

/// Global mutable settings snapshot (spec.md §9: "treat as a single
/// `AppState` injected into components; mutations go through `Store`
/// writers"). `easylist_bundled_under_default` resolves spec.md §9's open
/// question: when true (the default), EasyList rides along with
/// `default_rules_enabled`; when false, `easylist_enabled` is its own
/// independent toggle.
#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub is_active: bool,
    pub whitelist: Vec<Host>,
    pub default_rules_enabled: bool,
    pub custom_rules_enabled: bool,
    pub navigation_guard_enabled: bool,
    pub default_block_request_enabled: bool,
    pub easylist_bundled_under_default: bool,
    pub easylist_enabled: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            is_active: true,
            whitelist: Vec::new(),
            default_rules_enabled: true,
            custom_rules_enabled: true,
            navigation_guard_enabled: true,
            default_block_request_enabled: true,
            easylist_bundled_under_default: true,
            easylist_enabled: true,
        }
    }
}

impl AppState {
    /// Whitelist and master-switch semantics take precedence over every
    /// other check (spec.md §7): when this is true, neither the rule engine
    /// nor the guardian act on `host`.
    pub fn is_inert_for(&self, host: &Host) -> bool {
        !self.is_active || is_whitelisted(&self.whitelist, host)
    }

    /// Projects the rule-source toggles `RuleCoordinator` needs. Kept as a
    /// narrow projection rather than handing the coordinator the whole
    /// snapshot, so it never grows an implicit dependency on fields (like
    /// `navigation_guard_enabled`) it has no business reading.
    pub fn rule_coordinator_settings(&self) -> RuleCoordinatorSettings {
        RuleCoordinatorSettings {
            default_rules_enabled: self.default_rules_enabled,
            custom_rules_enabled: self.custom_rules_enabled,
            easylist_bundled_under_default: self.easylist_bundled_under_default,
            easylist_enabled: self.easylist_enabled,
        }
    }
}

/// Reads every key in spec.md §6's table relevant to runtime toggles and
/// produces a validated snapshot. A missing or malformed value falls back to
/// `AppState::default()`'s corresponding field rather than panicking — store
/// unavailability must never crash the core (spec.md §4.2, §7).
pub fn load_snapshot(store: &dyn Store) -> AppState {
    let defaults = AppState::default();

    let whitelist: Vec<Host> = store
        .get_typed::<Vec<String>>(keys::WHITELIST)
        .unwrap_or_default()
        .iter()
        .map(|raw| Host::parse(raw))
        .collect();

    let snapshot = AppState {
        is_active: store.get_typed(keys::IS_ACTIVE).unwrap_or(defaults.is_active),
        whitelist,
        default_rules_enabled: store
            .get_typed(keys::DEFAULT_RULES_ENABLED)
            .unwrap_or(defaults.default_rules_enabled),
        custom_rules_enabled: store
            .get_typed(keys::CUSTOM_RULES_ENABLED)
            .unwrap_or(defaults.custom_rules_enabled),
        navigation_guard_enabled: store
            .get_typed(keys::NAVIGATION_GUARD_ENABLED)
            .unwrap_or(defaults.navigation_guard_enabled),
        default_block_request_enabled: store
            .get_typed(keys::DEFAULT_BLOCK_REQUEST_ENABLED)
            .unwrap_or(defaults.default_block_request_enabled),
        easylist_bundled_under_default: store
            .get_typed(keys::EASYLIST_BUNDLED_UNDER_DEFAULT)
            .unwrap_or(defaults.easylist_bundled_under_default),
        easylist_enabled: store.get_typed(keys::EASYLIST_ENABLED).unwrap_or(defaults.easylist_enabled),
    };

    debug!(
        target: "app_state",
        is_active = snapshot.is_active,
        whitelist_len = snapshot.whitelist.len(),
        default_rules_enabled = snapshot.default_rules_enabled,
        custom_rules_enabled = snapshot.custom_rules_enabled,
        easylist_bundled_under_default = snapshot.easylist_bundled_under_default,
        easylist_enabled = snapshot.easylist_enabled,
        "loaded settings snapshot"
    );
    snapshot
}
