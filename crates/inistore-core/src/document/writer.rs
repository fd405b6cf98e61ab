//! Serializes a [`Document`] and commits it to a [`BackingStore`].
//!
//! Output format, one line per item:
//! ```text
//! [First]
//! key1 = value1
//! empty =
//! [Second]
//! ```
//! Sections and pairs come out in stored order.  An empty value keeps the
//! space after `=`.
//!
//! # Failure behaviour
//!
//! [`WriteMode::Truncate`] (the default) writes the target in place.  If a
//! write fails after the file was opened, the partial file is deleted and an
//! error returned, so the previous contents are gone.  If the file cannot be
//! opened at all, it is left as it was.  [`WriteMode::Replace`] writes a sibling
//! `<name>.tmp` and renames it over the target only once everything has been
//! written, so a failed write leaves the previous file untouched.

use std::ffi::OsString;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, error, warn};

use crate::document::model::Document;
use crate::error::ConfigError;
use crate::storage::BackingStore;

/// How [`write`] commits the new contents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WriteMode {
    /// Truncate and rewrite the target file directly.
    #[default]
    Truncate,
    /// Write a temporary sibling file and rename it over the target.
    Replace,
}

/// Writes `document` to `path` through `backend`.
///
/// # Errors
///
/// Returns [`ConfigError::Write`] if the file cannot be created or written
/// (the partial file is removed), or [`ConfigError::Replace`] if the final
/// rename of [`WriteMode::Replace`] fails.
pub fn write<B: BackingStore + ?Sized>(
    backend: &B,
    document: &Document,
    path: &Path,
    mode: WriteMode,
) -> Result<(), ConfigError> {
    match mode {
        WriteMode::Truncate => write_file(backend, document, path),
        WriteMode::Replace => {
            let temp = temp_path(path);
            write_file(backend, document, &temp)?;
            backend.rename(&temp, path).map_err(|source| {
                error!(path = %path.display(), "failed to move {} into place: {source}", temp.display());
                discard(backend, &temp);
                ConfigError::Replace {
                    path: path.to_path_buf(),
                    source,
                }
            })
        }
    }
}

/// Streams `document` into `out` in the backing-file format.
///
/// # Errors
///
/// Propagates the first I/O error from `out`.
pub fn serialize_into(document: &Document, out: &mut dyn Write) -> io::Result<()> {
    for section in document.sections() {
        writeln!(out, "[{}]", section.name())?;
        for pair in section.pairs() {
            writeln!(out, "{} = {}", pair.key(), pair.value())?;
        }
    }
    Ok(())
}

fn write_file<B: BackingStore + ?Sized>(
    backend: &B,
    document: &Document,
    path: &Path,
) -> Result<(), ConfigError> {
    let fail = |source: io::Error| {
        error!(path = %path.display(), "failed to write config: {source}");
        ConfigError::Write {
            path: path.to_path_buf(),
            source,
        }
    };

    // Nothing was opened, so there is nothing to roll back.
    let mut out = backend.create(path).map_err(fail)?;

    let written = serialize_into(document, &mut out).and_then(|()| out.flush());
    drop(out);
    if let Err(source) = written {
        discard(backend, path);
        return Err(fail(source));
    }

    debug!(path = %path.display(), sections = document.len(), "config written");
    Ok(())
}

/// Best-effort removal of a partially written file.
fn discard<B: BackingStore + ?Sized>(backend: &B, path: &Path) {
    if let Err(e) = backend.remove(path) {
        if e.kind() != io::ErrorKind::NotFound {
            warn!(path = %path.display(), "failed to remove partial config file: {e}");
        }
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
