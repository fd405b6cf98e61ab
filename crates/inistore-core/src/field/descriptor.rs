//! Per-field behaviour bundle.
//!
//! A [`FieldDescriptor`] binds one field of a settings struct to its name and
//! to four monomorphized conversion functions.  Descriptors are built by a
//! `const fn` and live in a `static` table generated by
//! [`crate::settings_schema!`], so the binding is resolved once, at compile
//! time, rather than on each call.
//!
//! # Names
//!
//! A full name may carry a namespace: `@owner:section:local`.  Only the part
//! after the last `:` is written to the backing file.  The prefix exists so
//! several settings tables can share one RPC surface without name clashes.

use std::fmt;

use super::boxed::{BoxedValue, UnboxResult};
use super::value::FieldValue;
use super::{Field, Schema};
use crate::settings::SettingsStore;

/// Whether boxed writes may change a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Access {
    ReadWrite,
    /// Loaded and stored normally, but `unbox` reports
    /// [`UnboxResult::PermissionDenied`].
    ReadOnly,
}

/// Static binding of one field of `V`.
pub struct FieldDescriptor<V: Schema> {
    id: V::Field,
    name: &'static str,
    key_offset: usize,
    access: Access,
    read: fn(&V, &mut String),
    write: fn(&mut V, &str) -> bool,
    to_boxed: fn(&V) -> BoxedValue,
    unbox: fn(&mut SettingsStore<V>, &BoxedValue) -> UnboxResult,
}

impl<V: Schema> FieldDescriptor<V> {
    /// Builds the descriptor for field `F`.
    ///
    /// # Panics
    ///
    /// Panics (at compile time when used in a `static`) if `name` does not
    /// end with a non-empty local key.
    pub const fn new<F: Field<Settings = V>>(name: &'static str, access: Access) -> Self {
        let key_offset = local_key_offset(name);
        assert!(
            key_offset < name.len(),
            "field name must end with a non-empty key"
        );
        Self {
            id: F::ID,
            name,
            key_offset,
            access,
            read: read_field::<F>,
            write: write_field::<F>,
            to_boxed: box_field::<F>,
            unbox: unbox_field::<F>,
        }
    }

    /// Field identifier.
    pub fn id(&self) -> V::Field {
        self.id
    }

    /// Fully qualified name, including any namespace.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Persisted key: the part of the name after the last `:`.
    pub fn key(&self) -> &'static str {
        &self.name[self.key_offset..]
    }

    /// Byte offset of [`Self::key`] inside [`Self::name`].
    pub fn key_offset(&self) -> usize {
        self.key_offset
    }

    /// Namespace prefix without the trailing `:` (`@owner:section`), or `""`.
    pub fn namespace(&self) -> &'static str {
        match self.key_offset {
            0 => "",
            offset => &self.name[..offset - 1],
        }
    }

    pub fn access(&self) -> Access {
        self.access
    }

    /// Appends the field's text form to `out`.
    pub fn read(&self, values: &V, out: &mut String) {
        (self.read)(values, out)
    }

    /// Returns the field's text form.
    pub fn text(&self, values: &V) -> String {
        let mut out = String::new();
        self.read(values, &mut out);
        out
    }

    /// Parses `text` into the field.  Returns `false` and leaves the field
    /// untouched if the text is not a valid value.
    pub fn write(&self, values: &mut V, text: &str) -> bool {
        (self.write)(values, text)
    }

    /// Returns the field's boxed form.
    pub fn to_boxed(&self, values: &V) -> BoxedValue {
        (self.to_boxed)(values)
    }

    /// Writes a boxed value into the field through the store's tracked update
    /// path.
    ///
    /// # Panics
    ///
    /// Panics if no update transaction is open on `store` and the value
    /// would be applied.
    pub fn unbox(&self, store: &mut SettingsStore<V>, boxed: &BoxedValue) -> UnboxResult {
        if self.access == Access::ReadOnly {
            return UnboxResult::PermissionDenied;
        }
        (self.unbox)(store, boxed)
    }
}

impl<V: Schema> fmt::Debug for FieldDescriptor<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("access", &self.access)
            .finish_non_exhaustive()
    }
}

/// Offset just past the last `:` of `name`, or 0 without a namespace.
const fn local_key_offset(name: &str) -> usize {
    let bytes = name.as_bytes();
    let mut i = bytes.len();
    while i > 0 {
        if bytes[i - 1] == b':' {
            return i;
        }
        i -= 1;
    }
    0
}

fn read_field<F: Field>(values: &F::Settings, out: &mut String) {
    F::get(values).format_text(out);
}

fn write_field<F: Field>(values: &mut F::Settings, text: &str) -> bool {
    match F::Value::parse_text(text) {
        Some(value) => {
            *F::get_mut(values) = value;
            true
        }
        None => false,
    }
}

fn box_field<F: Field>(values: &F::Settings) -> BoxedValue {
    F::get(values).to_boxed()
}

fn unbox_field<F: Field>(store: &mut SettingsStore<F::Settings>, boxed: &BoxedValue) -> UnboxResult {
    match F::Value::from_boxed(boxed) {
        Ok(value) => {
            if store.update::<F>(value) {
                UnboxResult::Updated
            } else {
                UnboxResult::Unchanged
            }
        }
        Err(e) => e.into(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldId;
    use crate::testing::{keys, TestField, TestSettings};

    fn descriptor(name: &str) -> &'static FieldDescriptor<TestSettings> {
        TestSettings::descriptor(name).unwrap_or_else(|| panic!("no descriptor {name}"))
    }

    #[test]
    fn test_local_key_offset() {
        assert_eq!(local_key_offset("plain"), 0);
        assert_eq!(local_key_offset("@owner:section:key"), 15);
        assert_eq!(local_key_offset("a:b"), 2);
    }

    #[test]
    fn test_key_and_namespace_split_at_last_colon() {
        let d = descriptor("@net:test:port");
        assert_eq!(d.key(), "port");
        assert_eq!(d.namespace(), "@net:test");
        assert_eq!(d.id(), TestField::Port);
    }

    #[test]
    fn test_name_without_namespace_is_its_own_key() {
        let d = descriptor("label");
        assert_eq!(d.key(), "label");
        assert_eq!(d.namespace(), "");
        assert_eq!(d.key_offset(), 0);
    }

    #[test]
    fn test_lookup_by_name_is_exact() {
        assert!(TestSettings::descriptor("port").is_none(), "local key is not a full name");
        assert!(TestSettings::descriptor("@net:test:port").is_some());
    }

    #[test]
    fn test_descriptors_follow_declaration_order() {
        let ids: Vec<TestField> = TestSettings::descriptors().iter().map(|d| d.id()).collect();
        assert_eq!(ids, TestField::ALL);
        for (index, d) in TestSettings::descriptors().iter().enumerate() {
            assert_eq!(d.id().index(), index);
        }
    }

    #[test]
    fn test_read_and_write_text() {
        // Arrange
        let mut values = TestSettings::default();
        let d = descriptor("@net:test:port");

        // Act
        let accepted = d.write(&mut values, "9000");
        let rejected = d.write(&mut values, "nope");

        // Assert
        assert!(accepted);
        assert!(!rejected);
        assert_eq!(values.port, 9000, "rejected text must not change the field");
        assert_eq!(d.text(&values), "9000");
    }

    #[test]
    fn test_to_boxed() {
        let values = TestSettings::default();
        assert_eq!(
            descriptor("@net:test:enabled").to_boxed(&values),
            BoxedValue::Bool(values.enabled)
        );
    }

    #[test]
    fn test_unbox_results() {
        // Arrange
        let mut store = SettingsStore::new(TestSettings::default());
        store.begin_update();
        let port = descriptor("@net:test:port");

        // Act / Assert
        assert_eq!(port.unbox(&mut store, &BoxedValue::Unsigned(1)), UnboxResult::Updated);
        assert_eq!(port.unbox(&mut store, &BoxedValue::Unsigned(1)), UnboxResult::Unchanged);
        assert_eq!(
            port.unbox(&mut store, &BoxedValue::Unsigned(70_000)),
            UnboxResult::ValueInvalid
        );
        assert_eq!(
            port.unbox(&mut store, &BoxedValue::Text("1".into())),
            UnboxResult::ValueTypeInvalid
        );
        assert_eq!(store.values().port, 1);
        assert!(store.changes().contains(TestField::Port));
    }

    #[test]
    fn test_unbox_read_only_is_denied_before_type_check() {
        let mut store = SettingsStore::new(TestSettings::default());
        store.begin_update();
        let serial = descriptor("@sys:test:serial");

        assert_eq!(serial.access(), Access::ReadOnly);
        assert_eq!(
            serial.unbox(&mut store, &BoxedValue::Bool(true)),
            UnboxResult::PermissionDenied
        );
        assert!(!store.has_pending_changes());
    }

    #[test]
    fn test_typed_keys_resolve_to_their_descriptor() {
        let d = TestSettings::descriptor_for(<keys::Label as Field>::ID);
        assert_eq!(d.name(), "label");
    }
}
