//! Storage seam between the configuration core and the file system.
//!
//! The core never touches `std::fs` directly.  Everything goes through the
//! [`BackingStore`] trait, which exposes exactly the primitives the load and
//! store paths need:
//!
//! - `read` the whole backing file into memory (any error means "absent");
//! - `create` (or truncate) a file and stream text into it;
//! - `remove` a file, used to roll back a half-written file;
//! - `rename` a file, used by [`crate::document::writer::WriteMode::Replace`].
//!
//! [`FileStore`] is the production implementation.  [`memory::MemoryStore`]
//! keeps files in a shared map and can inject write failures, so tests can
//! exercise the rollback paths without a real disk.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

pub mod memory;

/// File primitives consumed by the reader and writer.
pub trait BackingStore {
    /// Reads the entire file at `path`.
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Creates `path`, truncating any existing file, and returns a writer for
    /// its contents.  Dropping the writer closes the file; callers flush it
    /// explicitly to observe late write errors.
    fn create<'a>(&'a self, path: &Path) -> io::Result<Box<dyn Write + 'a>>;

    /// Deletes the file at `path`.
    fn remove(&self, path: &Path) -> io::Result<()>;

    /// Renames `from` to `to`, replacing `to` if it exists.
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;
}

/// [`BackingStore`] backed by the real file system.
///
/// `create` makes any missing parent directories first, so a configuration
/// can be stored on first run before its directory exists.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileStore;

impl BackingStore for FileStore {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    fn create<'a>(&'a self, path: &Path) -> io::Result<Box<dyn Write + 'a>> {
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        Ok(Box::new(BufWriter::new(File::create(path)?)))
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to)
    }
}

impl<B: BackingStore + ?Sized> BackingStore for &B {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        (**self).read(path)
    }

    fn create<'a>(&'a self, path: &Path) -> io::Result<Box<dyn Write + 'a>> {
        (**self).create(path)
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        (**self).remove(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        (**self).rename(from, to)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
