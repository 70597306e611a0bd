//! Shared data model for the cosmetic filter engine.
//!
//! Every other crate in the workspace depends on these types instead of
//! redefining them; this keeps `Rule`, `DomainSpec`, `TokenIndex` and friends
//! identical across the parser, cache, sources, index, scanner and
//! coordinator. See the component sections of `SPEC_FULL.md` for the
//! contract each type is meant to satisfy.

pub mod cache;
pub mod domain;
pub mod error;
pub mod host;
pub mod rule;

pub mod snapshot;
pub mod stats;
pub mod store;
pub mod threat;
pub mod token;

pub use cache::{CacheEntry, Clock, SchemaVersion, SystemClock, Timestamp};
pub use domain::{is_whitelisted, pattern_matches, DomainSpec};
pub use error::{GuardError, NavType};
pub use host::Host;
pub use rule::{Confidence, Rule, RuleCategory, RuleSet, RuleSourceKind};
pub use snapshot::ElementSnapshot;
pub use stats::{DomainCounterKind, DomainCounters, DomainStats, NavigationStats};
pub use store::{Store, StoreExt};
pub use threat::{Recommendation, ThreatLevel, ThreatReport, ThreatSignal, ThreatWeights};
pub use token::{Selector, Token, TokenIndex};
