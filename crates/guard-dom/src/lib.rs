//! Procedural DOM filtering path (spec.md §4.5, §4.6): declarative CSS
//! injection plus a fallback scanner that validates candidates against the
//! host's real selector engine before acting.

pub mod host;
pub mod scanner;
pub mod style;

pub use host::{is_framework_managed, DomDocument, DomElement, MARKER_ATTR};
pub use scanner::{DomScanner, ScanStats};
pub use style::{StyleInjector, STYLE_ELEMENT_ID};
