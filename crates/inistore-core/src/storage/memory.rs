//! In-memory [`BackingStore`] for tests.
//!
//! Allows tests to inspect what was written, count store operations, and
//! make the next writes fail part-way through without touching a disk.
//! Clones share the same underlying files, so a test can hand one clone to a
//! [`crate::ConfigManager`] and keep another for assertions.

use std::collections::HashMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use super::BackingStore;

#[derive(Debug, Default)]
struct Inner {
    files: HashMap<PathBuf, Vec<u8>>,
    /// When set, writers created from now on fail once this many bytes have
    /// been accepted.
    fail_after: Option<usize>,
    /// When set, `create` itself fails and leaves the files untouched.
    deny_create: bool,
    creates: usize,
    removes: usize,
}

/// A shared, in-memory file map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panic while holding the lock cannot leave the map half-updated,
        // so a poisoned lock is still usable.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Seeds (or replaces) a file.
    pub fn insert(&self, path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) {
        self.lock().files.insert(path.into(), contents.into());
    }

    /// Returns the file contents as text, if the file exists.
    pub fn contents(&self, path: impl AsRef<Path>) -> Option<String> {
        self.lock()
            .files
            .get(path.as_ref())
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    /// Returns `true` if a file exists at `path`.
    pub fn exists(&self, path: impl AsRef<Path>) -> bool {
        self.lock().files.contains_key(path.as_ref())
    }

    /// Makes every writer created after this call fail once `bytes` bytes
    /// have been written.  `0` fails the very first write.
    pub fn fail_writes_after(&self, bytes: usize) {
        self.lock().fail_after = Some(bytes);
    }

    /// Makes every `create` call fail with `PermissionDenied` before the
    /// target is opened.
    pub fn deny_creates(&self) {
        self.lock().deny_create = true;
    }

    /// Clears a previous [`Self::fail_writes_after`] or [`Self::deny_creates`].
    pub fn stop_failing(&self) {
        let mut inner = self.lock();
        inner.fail_after = None;
        inner.deny_create = false;
    }

    /// Number of `create` calls so far (one per store attempt).
    pub fn create_count(&self) -> usize {
        self.lock().creates
    }

    /// Number of successful `remove` calls so far.
    pub fn remove_count(&self) -> usize {
        self.lock().removes
    }
}

impl BackingStore for MemoryStore {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.lock()
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such file"))
    }

    fn create<'a>(&'a self, path: &Path) -> io::Result<Box<dyn Write + 'a>> {
        let budget = {
            let mut inner = self.lock();
            inner.creates += 1;
            if inner.deny_create {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "create denied"));
            }
            inner.files.insert(path.to_path_buf(), Vec::new());
            inner.fail_after
        };
        Ok(Box::new(MemoryWriter {
            store: self,
            path: path.to_path_buf(),
            budget,
        }))
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        let mut inner = self.lock();
        match inner.files.remove(path) {
            Some(_) => {
                inner.removes += 1;
                Ok(())
            }
            None => Err(io::Error::new(io::ErrorKind::NotFound, "no such file")),
        }
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        let mut inner = self.lock();
        let contents = inner
            .files
            .remove(from)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such file"))?;
        inner.files.insert(to.to_path_buf(), contents);
        Ok(())
    }
}

/// Writer appending to one file of a [`MemoryStore`].
struct MemoryWriter<'a> {
    store: &'a MemoryStore,
    path: PathBuf,
    budget: Option<usize>,
}

impl Write for MemoryWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let accepted = match self.budget {
            Some(0) => return Err(io::Error::new(io::ErrorKind::Other, "injected write failure")),
            Some(left) => buf.len().min(left),
            None => buf.len(),
        };
        if let Some(left) = self.budget.as_mut() {
            *left -= accepted;
        }

        let mut inner = self.store.lock();
        inner
            .files
            .entry(self.path.clone())
            .or_default()
            .extend_from_slice(&buf[..accepted]);
        Ok(accepted)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
