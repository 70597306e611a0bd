//! Reference host embedding: wires every core crate together behind plain
//! in-memory/TOML-backed fakes for the external collaborators spec.md §1
//! lists (DOM, persistent storage, network fetch, the page-world bridge,
//! the confirmation prompt). Not a browser extension — a harness that lets
//! the core run end to end without one.

pub mod fakes;
pub mod fixtures;
pub mod memory;
pub mod toml_store;

pub use fakes::{CannedFetcher, LoggingIpc, ScriptedPrompt};
pub use memory::{MemoryDocument, MemoryElement};
pub use toml_store::TomlStore;
