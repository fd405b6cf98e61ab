//! # inistore-core
//!
//! Persistent, typed configuration tables backed by INI-style text files.
//!
//! # Architecture overview
//!
//! A configuration is a plain Rust struct ("settings table") whose fields are
//! persisted as `key = value` lines in one `[section]` of a text file.  The
//! crate is layered bottom-up:
//!
//! - **`document`** – The INI document model plus a recovering, line-oriented
//!   parser and a writer.  A malformed line is reported and skipped; it never
//!   aborts the load.
//!
//! - **`storage`** – The [`BackingStore`] seam the reader and writer go
//!   through.  [`FileStore`] talks to the real file system,
//!   [`MemoryStore`] keeps files in memory for tests.
//!
//! - **`field`** – Per-field descriptors: name, persisted key, text and boxed
//!   conversions.  [`settings_schema!`] generates a field-id enum, typed keys
//!   and a static descriptor table from one field list.
//!
//! - **`settings`** – [`SettingsStore`]: the current values plus a changed
//!   bitmap and the update-transaction flag.
//!
//! - **`manager`** – [`ConfigManager`]: load with defaults, store, and the
//!   scoped [`UpdateScope`] transaction that batches changes into one store
//!   and one observer notification.
//!
//! ```rust
//! use inistore_core::{settings_schema, ConfigManager, MemoryStore, Origin};
//!
//! #[derive(Debug, Clone, PartialEq)]
//! pub struct Radio {
//!     pub channel: u8,
//!     pub enabled: bool,
//! }
//!
//! settings_schema! {
//!     pub enum RadioField, mod radio for Radio in "radio" {
//!         Channel(channel: u8) = "@hw:radio:channel",
//!         Enabled(enabled: bool) = "@hw:radio:enabled",
//!     }
//! }
//!
//! let files = MemoryStore::new();
//! let mut config = ConfigManager::with_backend(
//!     "/etc/radio.ini",
//!     Radio { channel: 6, enabled: true },
//!     files.clone(),
//! );
//! config.load();
//!
//! config
//!     .with_update(Origin::Local, |scope| {
//!         scope.update(radio::Channel, 11u8);
//!     })
//!     .unwrap();
//!
//! assert_eq!(
//!     files.contents("/etc/radio.ini").as_deref(),
//!     Some("[radio]\nchannel = 11\nenabled = true\n"),
//! );
//! ```

pub mod document;
pub mod error;
pub mod field;
pub mod manager;
pub mod settings;
pub mod storage;

#[cfg(test)]
mod testing;

// Re-export the most-used types at the crate root so callers can write
// `inistore_core::ConfigManager` instead of `inistore_core::manager::ConfigManager`.
pub use document::{parse, scan, Document, ParseDiagnostic, ParseOutcome, Section, WriteMode};
pub use error::ConfigError;
pub use field::{
    Access, BoxedValue, Field, FieldDescriptor, FieldId, FieldValue, FixedString, Schema,
    UnboxResult,
};
pub use manager::{ChangeObserver, ConfigManager, Origin, UpdateScope};
pub use settings::{ChangeSet, SettingsStore};
pub use storage::memory::MemoryStore;
pub use storage::{BackingStore, FileStore};
