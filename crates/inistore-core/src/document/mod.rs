//! INI document model, parser and writer.
//!
//! The document is only materialized while loading or storing a
//! configuration: `text → parser → Document` on load and
//! `Document → writer → file` on store.  Nothing keeps it alive in between.

pub mod model;
pub mod parser;
pub mod writer;

pub use model::{Document, KeyValuePair, Section};
pub use parser::{parse, scan, ParseDiagnostic, ParseErrorKind, ParseOutcome};
pub use writer::{write, WriteMode};
