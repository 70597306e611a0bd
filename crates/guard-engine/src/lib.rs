//! Rule-execution layer (spec.md §4.8–§4.10): `HybridExecutor` for the
//! declarative + procedural DOM path, `SelectorExecutor` for the
//! lightweight domain-scoped path, and `RuleCoordinator` composing sources
//! into both.

mod coordinator;
mod hybrid;
mod selector;

pub use coordinator::{DomainStatsSink, RuleCoordinator, RuleCoordinatorSettings};
pub use hybrid::HybridExecutor;
pub use selector::{yield_if_needed, SelectorExecutor, SelectorOpts};
