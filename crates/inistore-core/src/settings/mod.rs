//! Current values of one settings table plus change tracking.
//!
//! [`SettingsStore`] holds exactly one instance of the settings struct, a
//! validity flag, a transaction-open flag and the [`ChangeSet`] of fields
//! modified inside the current transaction.  Tracked mutation is only legal
//! while a transaction is open; the manager opens and closes transactions.
//!
//! The "has pending changes" state is derived from the bitmap itself, so the
//! two can never disagree.

pub mod changes;

pub use changes::ChangeSet;

use crate::field::{Field, Schema};

/// Values of a settings table and the fields changed since the last
/// notification.
#[derive(Debug, Clone)]
pub struct SettingsStore<V: Schema> {
    values: V,
    valid: bool,
    updating: bool,
    changes: ChangeSet<V::Field>,
}

impl<V: Schema> SettingsStore<V> {
    /// Creates a store holding `initial`, not yet valid.
    pub fn new(initial: V) -> Self {
        Self {
            values: initial,
            valid: false,
            updating: false,
            changes: ChangeSet::new(),
        }
    }

    /// Current values.
    pub fn values(&self) -> &V {
        &self.values
    }

    /// `false` until the first [`Self::put`].
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// `true` while an update transaction is open.
    pub fn is_updating(&self) -> bool {
        self.updating
    }

    /// Fields changed since the last [`Self::changes_processed_notification`].
    pub fn changes(&self) -> &ChangeSet<V::Field> {
        &self.changes
    }

    pub fn has_pending_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    /// Replaces every value and marks the store valid.  The changed bitmap is
    /// left alone: this is the load/reset path, not a tracked update.
    pub fn put(&mut self, values: V) {
        self.values = values;
        self.valid = true;
    }

    /// Sets field `F` to `value` if it differs from the current value.
    ///
    /// Returns `true` and marks the field changed when the value was
    /// different.
    ///
    /// # Panics
    ///
    /// Panics if no update transaction is open.
    pub fn update<F: Field<Settings = V>>(&mut self, value: F::Value) -> bool {
        assert!(
            self.updating,
            "settings field updated outside of an update transaction"
        );
        let slot = F::get_mut(&mut self.values);
        if *slot == value {
            return false;
        }
        *slot = value;
        self.changes.insert(F::ID);
        true
    }

    /// Clears the changed bitmap once observers have seen it.
    ///
    /// # Panics
    ///
    /// Panics if there are no pending changes.
    pub fn changes_processed_notification(&mut self) {
        assert!(
            self.has_pending_changes(),
            "change notification processed with no pending changes"
        );
        self.changes.clear();
    }

    /// Opens a transaction.
    ///
    /// # Panics
    ///
    /// Panics if one is already open.
    pub(crate) fn begin_update(&mut self) {
        assert!(!self.updating, "an update transaction is already open");
        self.updating = true;
    }

    /// Closes the open transaction.
    ///
    /// # Panics
    ///
    /// Panics if none is open.
    pub(crate) fn end_update(&mut self) {
        assert!(self.updating, "no update transaction is open");
        self.updating = false;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
