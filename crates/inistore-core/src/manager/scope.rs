//! Scoped, single-writer update transaction.
//!
//! An [`UpdateScope`] is the only way to change tracked values.  While it is
//! alive the store's transaction flag is set; closing it (explicitly with
//! [`UpdateScope::commit`] or implicitly on drop) clears the flag and, if any
//! field actually changed, stores the file and notifies the observer once for
//! the whole batch.
//!
//! ```text
//! begin_update ──► update / unbox ... ──► commit or drop
//!                                            │
//!                      no changes ◄──────────┤
//!                                            ▼
//!                                 store() → observer → clear bitmap
//! ```

use tracing::error;

use super::observer::Origin;
use super::ConfigManager;
use crate::error::ConfigError;
use crate::field::{BoxedValue, Field, Schema, UnboxResult};
use crate::storage::BackingStore;

/// Handle to an open update transaction on a [`ConfigManager`].
#[must_use = "changes are committed when the scope is dropped or committed"]
pub struct UpdateScope<'a, V: Schema, B: BackingStore> {
    manager: &'a mut ConfigManager<V, B>,
    origin: Origin,
    closed: bool,
}

impl<'a, V: Schema, B: BackingStore> UpdateScope<'a, V, B> {
    pub(super) fn open(manager: &'a mut ConfigManager<V, B>, origin: Origin) -> Self {
        manager.settings.begin_update();
        Self {
            manager,
            origin,
            closed: false,
        }
    }

    /// Who opened this transaction.
    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    /// Current values, including changes made in this transaction.
    pub fn values(&self) -> &V {
        self.manager.settings.values()
    }

    /// Sets field `F` to `value`.  Returns `true` if the value changed.
    ///
    /// ```rust,ignore
    /// scope.update(keys::Port, 8080u16);
    /// scope.update(keys::Hostname, "gateway");
    /// ```
    pub fn update<F>(&mut self, _field: F, value: impl Into<F::Value>) -> bool
    where
        F: Field<Settings = V>,
    {
        self.manager.settings.update::<F>(value.into())
    }

    /// Writes a boxed value into the field with fully qualified `name`.
    pub fn unbox(&mut self, name: &str, value: &BoxedValue) -> UnboxResult {
        match V::descriptor(name) {
            Some(descriptor) => descriptor.unbox(&mut self.manager.settings, value),
            None => UnboxResult::KeyUnknown,
        }
    }

    /// `true` if something changed in this transaction so far.
    pub fn has_pending_changes(&self) -> bool {
        self.manager.settings.has_pending_changes()
    }

    /// Closes the transaction now.
    ///
    /// Returns `Ok(true)` if changes were stored and notified, `Ok(false)` if
    /// nothing changed.
    ///
    /// # Errors
    ///
    /// Returns the store error if writing the backing file failed.  The
    /// in-memory values keep the update and the observer has still been
    /// notified.
    pub fn commit(mut self) -> Result<bool, ConfigError> {
        self.close()
    }

    fn close(&mut self) -> Result<bool, ConfigError> {
        self.closed = true;
        self.manager.finish_update(&self.origin)
    }
}

impl<V: Schema, B: BackingStore> Drop for UpdateScope<'_, V, B> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(e) = self.close() {
            error!(origin = %self.origin, "config update could not be stored: {e}");
        }
    }
}
