//! Persistent configuration manager.
//!
//! [`ConfigManager`] owns one settings table, the path of its backing file and
//! the defaults used when the file (or its section) is missing.
//!
//! # Life cycle
//!
//! ```text
//! new ──► load ──► begin_update ─► update ... ─► commit ─► store + notify
//!           ▲                                                   │
//!           └──────────────── (next process start) ◄────────────┘
//! ```
//!
//! - `load` parses the whole file, picks the table's section and applies
//!   every entry whose key matches a descriptor to a copy of the current
//!   values.  Missing keys and unparsable values keep the current value;
//!   unknown keys are ignored.
//! - `store` writes a fresh document containing only the table's section.
//! - Changes go through [`UpdateScope`], which batches them into a single
//!   store and a single observer notification.

pub mod observer;
pub mod scope;

use std::path::{Path, PathBuf};

use tracing::{info, warn};

pub use observer::{ChangeObserver, Origin};
pub use scope::UpdateScope;

use crate::document::{parser, writer, Document, WriteMode};
use crate::error::ConfigError;
use crate::field::{BoxedValue, FieldDescriptor, Schema};
use crate::settings::{ChangeSet, SettingsStore};
use crate::storage::{BackingStore, FileStore};
use observer::FnObserver;

type BoxedObserver<V> = Box<dyn ChangeObserver<<V as Schema>::Field> + Send>;

/// A settings table bound to its backing file.
pub struct ConfigManager<V: Schema, B: BackingStore = FileStore> {
    path: PathBuf,
    defaults: V,
    settings: SettingsStore<V>,
    backend: B,
    write_mode: WriteMode,
    observer: Option<BoxedObserver<V>>,
}

impl<V: Schema> ConfigManager<V> {
    /// Creates a manager for the file at `path` on the real file system.
    ///
    /// Nothing is read until [`Self::load`].
    pub fn new(path: impl Into<PathBuf>, defaults: V) -> Self {
        Self::with_backend(path, defaults, FileStore)
    }
}

impl<V: Schema, B: BackingStore> ConfigManager<V, B> {
    /// Creates a manager that reads and writes through `backend`.
    pub fn with_backend(path: impl Into<PathBuf>, defaults: V, backend: B) -> Self {
        Self {
            path: path.into(),
            settings: SettingsStore::new(defaults.clone()),
            defaults,
            backend,
            write_mode: WriteMode::default(),
            observer: None,
        }
    }

    /// Selects how [`Self::store`] commits the file.
    pub fn with_write_mode(mut self, mode: WriteMode) -> Self {
        self.write_mode = mode;
        self
    }

    /// Installs the change observer, replacing any previous one.
    pub fn set_observer(&mut self, observer: impl ChangeObserver<V::Field> + Send + 'static) {
        self.observer = Some(Box::new(observer));
    }

    /// Installs a closure as the change observer.
    pub fn on_change<C>(&mut self, callback: C)
    where
        C: FnMut(&Origin, &ChangeSet<V::Field>) + Send + 'static,
    {
        self.set_observer(FnObserver(callback));
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn defaults(&self) -> &V {
        &self.defaults
    }

    pub fn write_mode(&self) -> WriteMode {
        self.write_mode
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Current values.
    pub fn values(&self) -> &V {
        self.settings.values()
    }

    /// The underlying store, for change-tracking inspection.
    pub fn settings(&self) -> &SettingsStore<V> {
        &self.settings
    }

    /// `true` once [`Self::load`] or [`Self::reset`] has run.
    pub fn is_valid(&self) -> bool {
        self.settings.is_valid()
    }

    pub fn is_updating(&self) -> bool {
        self.settings.is_updating()
    }

    // ── Load / store ──────────────────────────────────────────────────────────

    /// Loads the backing file, falling back to defaults.
    ///
    /// Never fails: an unreadable file or a missing section yields the
    /// defaults, and each missing or rejected value keeps its current value.
    /// Returns whether the table is valid afterwards, which is always the case.
    ///
    /// # Panics
    ///
    /// Panics if an update transaction is open.
    pub fn load(&mut self) -> bool {
        assert!(
            !self.settings.is_updating(),
            "config loaded while an update transaction is open"
        );
        let source = self.path.display().to_string();

        let bytes = match self.backend.read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) => {
                info!(path = %source, "config not readable ({e}), using defaults");
                self.reset();
                return self.is_valid();
            }
        };

        let text = String::from_utf8_lossy(&bytes);
        let outcome = parser::parse(&source, &text);
        let Some(section) = outcome.document.section(V::SECTION) else {
            info!(path = %source, "no [{}] section, using defaults", V::SECTION);
            self.reset();
            return self.is_valid();
        };

        let mut values = self.settings.values().clone();
        let mut applied = 0usize;
        for descriptor in V::descriptors() {
            let Some(text) = section.get(descriptor.key()) else {
                continue;
            };
            if descriptor.write(&mut values, text) {
                applied += 1;
            } else {
                warn!(
                    path = %source,
                    field = descriptor.name(),
                    "ignoring invalid value {text:?}"
                );
            }
        }

        self.settings.put(values);
        info!(
            path = %source,
            section = V::SECTION,
            applied,
            diagnostics = outcome.diagnostics.len(),
            "config loaded"
        );
        self.is_valid()
    }

    /// Replaces every value with the defaults.  Tracked changes are left
    /// alone.
    pub fn reset(&mut self) {
        self.settings.put(self.defaults.clone());
    }

    /// Writes the current values to the backing file.
    ///
    /// # Errors
    ///
    /// Returns the writer's error; see [`writer::write`] for what is left on
    /// disk in each [`WriteMode`].
    pub fn store(&self) -> Result<(), ConfigError> {
        writer::write(&self.backend, &self.to_document(), &self.path, self.write_mode)
    }

    /// Builds the document [`Self::store`] would write.
    pub fn to_document(&self) -> Document {
        let mut document = Document::new();
        let section = document.section_mut_or_insert(V::SECTION);
        let values = self.settings.values();
        let mut text = String::new();
        for descriptor in V::descriptors() {
            text.clear();
            descriptor.read(values, &mut text);
            section.set(descriptor.key(), text.as_str());
        }
        document
    }

    // ── Name-based access ─────────────────────────────────────────────────────

    /// Looks a field up by fully qualified name.
    pub fn descriptor(&self, name: &str) -> Option<&'static FieldDescriptor<V>> {
        V::descriptor(name)
    }

    /// Boxed value of the field with fully qualified `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownField`] if no such field exists.
    pub fn boxed(&self, name: &str) -> Result<BoxedValue, ConfigError> {
        V::descriptor(name)
            .map(|descriptor| descriptor.to_boxed(self.settings.values()))
            .ok_or_else(|| ConfigError::UnknownField(name.to_string()))
    }

    /// Text form of the field with fully qualified `name`, as it would be
    /// stored.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownField`] if no such field exists.
    pub fn text(&self, name: &str) -> Result<String, ConfigError> {
        V::descriptor(name)
            .map(|descriptor| descriptor.text(self.settings.values()))
            .ok_or_else(|| ConfigError::UnknownField(name.to_string()))
    }

    // ── Transactions ──────────────────────────────────────────────────────────

    /// Opens an update transaction.
    ///
    /// The scope borrows the manager mutably, so a second transaction cannot
    /// be opened until this one is committed or dropped.
    pub fn begin_update(&mut self, origin: Origin) -> UpdateScope<'_, V, B> {
        UpdateScope::open(self, origin)
    }

    /// Runs `apply` inside a transaction and commits it.
    ///
    /// The transaction is committed even if `apply` panics.
    ///
    /// # Errors
    ///
    /// Returns the store error of the commit.  The in-memory values keep the
    /// changes either way.
    pub fn with_update<R>(
        &mut self,
        origin: Origin,
        apply: impl FnOnce(&mut UpdateScope<'_, V, B>) -> R,
    ) -> Result<R, ConfigError> {
        let mut scope = self.begin_update(origin);
        let result = apply(&mut scope);
        scope.commit()?;
        Ok(result)
    }

    /// Closes the open transaction: store and notify if anything changed.
    fn finish_update(&mut self, origin: &Origin) -> Result<bool, ConfigError> {
        self.settings.end_update();
        if !self.settings.has_pending_changes() {
            return Ok(false);
        }

        let stored = self.store();
        if let Some(observer) = self.observer.as_mut() {
            observer.settings_changed(origin, self.settings.changes());
        }
        self.settings.changes_processed_notification();
        stored.map(|()| true)
    }
}

impl<V, B> std::fmt::Debug for ConfigManager<V, B>
where
    V: Schema + std::fmt::Debug,
    B: BackingStore + std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigManager")
            .field("path", &self.path)
            .field("settings", &self.settings)
            .field("backend", &self.backend)
            .field("write_mode", &self.write_mode)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::field::UnboxResult;
    use crate::storage::memory::MemoryStore;
    use crate::testing::{keys, TestField, TestSettings};

    const PATH: &str = "/cfg/device.ini";

    type Notifications = Arc<Mutex<Vec<(Origin, Vec<TestField>)>>>;

    fn manager(store: &MemoryStore) -> ConfigManager<TestSettings, MemoryStore> {
        ConfigManager::with_backend(PATH, TestSettings::default(), store.clone())
    }

    fn recording(manager: &mut ConfigManager<TestSettings, MemoryStore>) -> Notifications {
        let seen: Notifications = Arc::default();
        let sink = Arc::clone(&seen);
        manager.on_change(move |origin, changes| {
            sink.lock()
                .expect("lock")
                .push((origin.clone(), changes.iter().collect()));
        });
        seen
    }

    #[test]
    fn test_load_missing_file_yields_defaults() {
        // Arrange
        let store = MemoryStore::new();
        let mut manager = manager(&store);
        assert!(!manager.is_valid());

        // Act
        let valid = manager.load();

        // Assert
        assert!(valid);
        assert_eq!(manager.values(), &TestSettings::default());
        assert!(!store.exists(PATH), "load must not create the file");
    }

    #[test]
    fn test_load_applies_matching_keys_and_ignores_the_rest() {
        // Arrange
        let store = MemoryStore::new();
        store.insert(
            PATH,
            "[other]\nport = 1\n[test]\nport = 9000\nlabel = edge\nunknown = x\n",
        );
        let mut manager = manager(&store);

        // Act
        manager.load();

        // Assert
        assert_eq!(manager.values().port, 9000);
        assert_eq!(manager.values().label, "edge");
        assert_eq!(manager.values().enabled, TestSettings::default().enabled);
    }

    #[test]
    fn test_load_invalid_value_keeps_default() {
        let store = MemoryStore::new();
        store.insert(PATH, "[test]\nport = abc\nenabled = false\n");
        let mut manager = manager(&store);

        manager.load();

        assert_eq!(manager.values().port, 8080);
        assert!(!manager.values().enabled);
    }

    #[test]
    fn test_reload_keeps_current_value_for_missing_keys() {
        // Arrange
        let store = MemoryStore::new();
        let mut manager = manager(&store);
        manager.load();
        manager
            .with_update(Origin::Local, |scope| {
                scope.update(keys::Enabled, false);
            })
            .expect("commit");
        store.insert(PATH, "[test]\nport = 5\n");

        // Act
        manager.load();

        // Assert
        assert_eq!(manager.values().port, 5);
        assert!(!manager.values().enabled);
    }

    #[test]
    fn test_load_without_section_yields_defaults() {
        let store = MemoryStore::new();
        store.insert(PATH, "[unrelated]\nport = 1\n");
        let mut manager = manager(&store);

        assert!(manager.load());
        assert_eq!(manager.values(), &TestSettings::default());
    }

    #[test]
    fn test_store_writes_only_own_section_with_local_keys() {
        // Arrange
        let store = MemoryStore::new();
        store.insert(PATH, "[other]\nx = 1\n[test]\nport = 1\n");
        let mut manager = manager(&store);
        manager.load();

        // Act
        manager.store().expect("store");

        // Assert
        assert_eq!(
            store.contents(PATH).as_deref(),
            Some("[test]\nport = 1\nenabled = true\nlabel = node\nserial = SN-0001\n")
        );
    }

    #[test]
    fn test_no_op_transaction_neither_stores_nor_notifies() {
        // Arrange
        let store = MemoryStore::new();
        let mut manager = manager(&store);
        manager.load();
        let seen = recording(&mut manager);

        // Act
        let committed = {
            let mut scope = manager.begin_update(Origin::Local);
            assert!(!scope.update(keys::Port, 8080u16));
            scope.commit().expect("commit")
        };

        // Assert
        assert!(!committed);
        assert_eq!(store.create_count(), 0);
        assert!(seen.lock().expect("lock").is_empty());
        assert!(!manager.is_updating());
    }

    #[test]
    fn test_changed_transaction_stores_and_notifies_once() {
        // Arrange
        let store = MemoryStore::new();
        let mut manager = manager(&store);
        manager.load();
        let seen = recording(&mut manager);

        // Act
        {
            let mut scope = manager.begin_update(Origin::Remote("peer-1".into()));
            scope.update(keys::Port, 1u16);
            scope.update(keys::Port, 2u16);
            scope.update(keys::Label, "gw");
        }

        // Assert
        assert_eq!(store.create_count(), 1);
        assert_eq!(
            *seen.lock().expect("lock"),
            vec![(
                Origin::Remote("peer-1".into()),
                vec![TestField::Port, TestField::Label]
            )]
        );
        assert!(!manager.settings().has_pending_changes());
        assert!(store.contents(PATH).is_some_and(|text| text.contains("port = 2\n")));
    }

    #[test]
    fn test_store_failure_still_notifies_and_clears() {
        // Arrange
        let store = MemoryStore::new();
        let mut manager = manager(&store);
        manager.load();
        let seen = recording(&mut manager);
        store.fail_writes_after(3);

        // Act
        let result = manager.with_update(Origin::Local, |scope| {
            scope.update(keys::Enabled, false);
        });

        // Assert
        assert!(matches!(result, Err(ConfigError::Write { .. })));
        assert_eq!(seen.lock().expect("lock").len(), 1);
        assert!(!manager.settings().has_pending_changes());
        assert!(!manager.values().enabled, "in-memory value keeps the update");
        assert!(!store.exists(PATH), "partial file is removed");
    }

    #[test]
    fn test_unbox_through_scope() {
        let store = MemoryStore::new();
        let mut manager = manager(&store);
        manager.load();

        let results = manager
            .with_update(Origin::Local, |scope| {
                [
                    scope.unbox("@net:test:port", &BoxedValue::Unsigned(81)),
                    scope.unbox("@net:test:nope", &BoxedValue::Unsigned(81)),
                    scope.unbox("@sys:test:serial", &BoxedValue::Text("x".into())),
                ]
            })
            .expect("commit");

        assert_eq!(
            results,
            [
                UnboxResult::Updated,
                UnboxResult::KeyUnknown,
                UnboxResult::PermissionDenied
            ]
        );
        assert_eq!(manager.values().port, 81);
    }

    #[test]
    fn test_unbox_rejects_text_the_file_cannot_hold() {
        // Arrange
        let store = MemoryStore::new();
        let mut manager = manager(&store);
        manager.load();

        // Act
        let results = manager
            .with_update(Origin::Remote("peer-1".into()), |scope| {
                [
                    scope.unbox("label", &BoxedValue::Text("a\nport=9".into())),
                    scope.unbox("label", &BoxedValue::Text(" pad".into())),
                ]
            })
            .expect("commit");

        // Assert
        assert_eq!(results, [UnboxResult::ValueInvalid, UnboxResult::ValueInvalid]);
        assert_eq!(manager.values(), &TestSettings::default());
        assert_eq!(store.create_count(), 0);
    }

    #[test]
    fn test_text_field_survives_store_and_reload() {
        // Arrange
        let store = MemoryStore::new();
        let mut manager = manager(&store);
        manager.load();

        // Act
        let result = manager
            .with_update(Origin::Local, |scope| {
                scope.unbox("label", &BoxedValue::Text("a = [b]".into()))
            })
            .expect("commit");
        let mut reloaded = self::manager(&store);
        reloaded.load();

        // Assert
        assert_eq!(result, UnboxResult::Updated);
        assert_eq!(reloaded.values(), manager.values());
        assert_eq!(reloaded.values().label, "a = [b]");
    }

    #[test]
    fn test_with_update_commits_when_closure_panics() {
        // Arrange
        let store = MemoryStore::new();
        let mut manager = manager(&store);
        manager.load();
        let seen = recording(&mut manager);

        // Act
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            manager.with_update(Origin::Local, |scope| {
                if scope.update(keys::Port, 5u16) {
                    panic!("handler failed after updating");
                }
            })
        }));

        // Assert
        assert!(outcome.is_err(), "panic must propagate");
        assert_eq!(store.create_count(), 1);
        assert!(store.contents(PATH).is_some_and(|text| text.contains("port = 5\n")));
        assert_eq!(
            *seen.lock().expect("lock"),
            vec![(Origin::Local, vec![TestField::Port])]
        );
        assert!(!manager.is_updating());
        assert!(!manager.settings().has_pending_changes());
    }

    #[test]
    fn test_boxed_and_text_by_name() {
        let store = MemoryStore::new();
        let mut manager = manager(&store);
        manager.load();

        assert_eq!(manager.boxed("@net:test:port").expect("boxed"), BoxedValue::Unsigned(8080));
        assert_eq!(manager.text("@net:test:enabled").expect("text"), "true");
        assert!(matches!(
            manager.text("port"),
            Err(ConfigError::UnknownField(name)) if name == "port"
        ));
    }

    #[test]
    fn test_reset_restores_defaults() {
        let store = MemoryStore::new();
        store.insert(PATH, "[test]\nport = 1\n");
        let mut manager = manager(&store);
        manager.load();

        manager.reset();

        assert_eq!(manager.values(), &TestSettings::default());
    }

    #[test]
    #[should_panic(expected = "update transaction is open")]
    fn test_load_inside_leaked_transaction_panics() {
        let store = MemoryStore::new();
        let mut manager = manager(&store);
        std::mem::forget(manager.begin_update(Origin::Local));
        manager.load();
    }
}
