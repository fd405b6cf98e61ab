//! Implementations of the `inistore` subcommands.
//!
//! Each command takes an already constructed [`ConfigManager`] and writes its
//! human-readable output to `out`, so the commands can be exercised against a
//! [`inistore_core::MemoryStore`] in tests.  Commands are generic over the
//! schema; the binary instantiates them with
//! [`crate::schema::DeviceSettings`].

use std::io::Write;

use anyhow::{bail, Context};
use inistore_core::{
    scan, Access, BackingStore, BoxedValue, ConfigError, ConfigManager, Origin, Schema,
    UnboxResult,
};
use serde::Serialize;

/// One row of `show --json`.
#[derive(Debug, Serialize)]
pub struct FieldReport {
    pub name: &'static str,
    pub key: &'static str,
    pub read_only: bool,
    pub value: BoxedValue,
}

/// Collects every field of the table in declaration order.
pub fn report<V: Schema, B: BackingStore>(manager: &ConfigManager<V, B>) -> Vec<FieldReport> {
    V::descriptors()
        .iter()
        .map(|d| FieldReport {
            name: d.name(),
            key: d.key(),
            read_only: d.access() == Access::ReadOnly,
            value: d.to_boxed(manager.values()),
        })
        .collect()
}

/// `show`: prints every field, as `name = text` lines or as JSON.
pub fn show<V: Schema, B: BackingStore>(
    manager: &ConfigManager<V, B>,
    json: bool,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    if json {
        serde_json::to_writer_pretty(&mut *out, &report(manager))?;
        writeln!(out)?;
        return Ok(());
    }

    for d in V::descriptors() {
        let marker = match d.access() {
            Access::ReadOnly => " (read-only)",
            Access::ReadWrite => "",
        };
        writeln!(out, "{} = {}{marker}", d.name(), d.text(manager.values()))?;
    }
    Ok(())
}

/// `get`: prints one field's stored text, or its boxed JSON form.
pub fn get<V: Schema, B: BackingStore>(
    manager: &ConfigManager<V, B>,
    name: &str,
    json: bool,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    if json {
        serde_json::to_writer(&mut *out, &manager.boxed(name)?)?;
        writeln!(out)?;
    } else {
        writeln!(out, "{}", manager.text(name)?)?;
    }
    Ok(())
}

/// `set`: converts `text` to the field's boxed type, applies it in one
/// transaction and stores the file if it changed.
///
/// # Errors
///
/// Fails if the field is unknown, `text` does not convert, the field rejects
/// the value, or the file cannot be stored.
pub fn set<V: Schema, B: BackingStore>(
    manager: &mut ConfigManager<V, B>,
    name: &str,
    text: &str,
) -> anyhow::Result<UnboxResult> {
    let current = manager.boxed(name)?;
    let boxed = parse_boxed(&current, text).with_context(|| format!("invalid value for {name}"))?;

    let path = manager.path().display().to_string();
    let result = manager
        .with_update(Origin::Local, |scope| scope.unbox(name, &boxed))
        .with_context(|| format!("failed to store {path}"))?;

    if !result.is_accepted() {
        bail!("cannot set {name}: {result}");
    }
    Ok(result)
}

/// `reset`: writes the defaults to the file.
pub fn reset<V: Schema, B: BackingStore>(manager: &mut ConfigManager<V, B>) -> anyhow::Result<()> {
    manager.reset();
    manager
        .store()
        .with_context(|| format!("failed to store {}", manager.path().display()))
}

/// `check`: lists every parse diagnostic, unknown key and rejected value in
/// the backing file without changing it.  Returns the number of problems.
///
/// # Errors
///
/// Fails if the file cannot be read or `out` cannot be written.
pub fn check<V: Schema, B: BackingStore>(
    manager: &ConfigManager<V, B>,
    out: &mut dyn Write,
) -> anyhow::Result<usize> {
    let source = manager.path().display().to_string();
    let bytes = manager
        .backend()
        .read(manager.path())
        .with_context(|| format!("cannot read {source}"))?;
    // Diagnostics go to `out` only, not to the log as well.
    let outcome = scan(&String::from_utf8_lossy(&bytes));

    let mut problems = 0;
    for diagnostic in &outcome.diagnostics {
        writeln!(out, "{source}:{}: {}", diagnostic.line, diagnostic.kind)?;
        problems += 1;
    }

    let Some(section) = outcome.document.section(V::SECTION) else {
        writeln!(out, "{source}: no [{}] section, defaults apply", V::SECTION)?;
        return Ok(problems + 1);
    };

    let mut scratch = manager.defaults().clone();
    for pair in section.pairs() {
        match V::descriptors().iter().find(|d| d.key() == pair.key()) {
            None => {
                writeln!(out, "{source}: [{}] unknown key {:?}", V::SECTION, pair.key())?;
                problems += 1;
            }
            Some(d) if !d.write(&mut scratch, pair.value()) => {
                writeln!(out, "{source}: invalid value {:?} for {}", pair.value(), d.name())?;
                problems += 1;
            }
            Some(_) => {}
        }
    }
    Ok(problems)
}

/// Converts command-line text to the boxed variant of `current`.
fn parse_boxed(current: &BoxedValue, text: &str) -> anyhow::Result<BoxedValue> {
    Ok(match current {
        BoxedValue::Bool(_) => match text {
            "true" => BoxedValue::Bool(true),
            "false" => BoxedValue::Bool(false),
            _ => bail!("expected `true` or `false`, got {text:?}"),
        },
        BoxedValue::Unsigned(_) => BoxedValue::Unsigned(
            text.parse()
                .with_context(|| format!("expected an unsigned integer, got {text:?}"))?,
        ),
        BoxedValue::Text(_) => BoxedValue::Text(text.to_string()),
    })
}

/// `true` if `error` (or its cause chain) is an unknown-field error.
pub fn is_unknown_field(error: &anyhow::Error) -> bool {
    error
        .chain()
        .any(|cause| matches!(
            cause.downcast_ref::<ConfigError>(),
            Some(ConfigError::UnknownField(_))
        ))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::DeviceSettings;
    use inistore_core::MemoryStore;

    const PATH: &str = "/etc/device.ini";

    fn loaded(files: &MemoryStore) -> ConfigManager<DeviceSettings, MemoryStore> {
        let mut manager =
            ConfigManager::with_backend(PATH, DeviceSettings::default(), files.clone());
        manager.load();
        manager
    }

    fn output(run: impl FnOnce(&mut Vec<u8>) -> anyhow::Result<()>) -> String {
        let mut out = Vec::new();
        run(&mut out).expect("command must succeed");
        String::from_utf8(out).expect("utf-8")
    }

    #[test]
    fn test_show_lists_fields_in_order() {
        let files = MemoryStore::new();
        let manager = loaded(&files);

        let text = output(|out| show(&manager, false, out));

        assert_eq!(
            text,
            "@net:device:hostname = inistore\n\
             @net:device:port = 8080\n\
             @net:device:dhcp = true\n\
             @net:device:mtu = 1500\n\
             @sys:device:serial = UNSET (read-only)\n"
        );
    }

    #[test]
    fn test_show_json_carries_boxed_values() {
        let files = MemoryStore::new();
        let manager = loaded(&files);

        let text = output(|out| show(&manager, true, out));
        let rows: serde_json::Value = serde_json::from_str(&text).expect("json");

        assert_eq!(rows[1]["name"], "@net:device:port");
        assert_eq!(rows[1]["value"]["type"], "unsigned");
        assert_eq!(rows[1]["value"]["value"], 8080);
        assert_eq!(rows[4]["read_only"], true);
    }

    #[test]
    fn test_get_text_and_json() {
        let files = MemoryStore::new();
        files.insert(PATH, "[device]\ndhcp = false\n");
        let manager = loaded(&files);

        assert_eq!(output(|out| get(&manager, "@net:device:dhcp", false, out)), "false\n");
        assert_eq!(
            output(|out| get(&manager, "@net:device:dhcp", true, out)),
            "{\"type\":\"bool\",\"value\":false}\n"
        );
    }

    #[test]
    fn test_get_unknown_field_is_reported() {
        let files = MemoryStore::new();
        let manager = loaded(&files);

        let err = get(&manager, "port", false, &mut Vec::new()).expect_err("unknown");

        assert!(is_unknown_field(&err));
    }

    #[test]
    fn test_set_unknown_field_is_reported() {
        let files = MemoryStore::new();
        let mut manager = loaded(&files);

        let err = set(&mut manager, "@net:device:colour", "blue").expect_err("unknown");

        assert!(is_unknown_field(&err));
        assert!(!is_unknown_field(
            &set(&mut manager, "@net:device:port", "x").expect_err("bad number")
        ));
    }

    #[test]
    fn test_set_stores_converted_value() {
        // Arrange
        let files = MemoryStore::new();
        let mut manager = loaded(&files);

        // Act
        let result = set(&mut manager, "@net:device:mtu", "9000").expect("set");

        // Assert
        assert_eq!(result, UnboxResult::Updated);
        assert!(files
            .contents(PATH)
            .is_some_and(|text| text.contains("mtu = 9000\n")));
    }

    #[test]
    fn test_set_same_value_does_not_store() {
        let files = MemoryStore::new();
        let mut manager = loaded(&files);

        let result = set(&mut manager, "@net:device:dhcp", "true").expect("set");

        assert_eq!(result, UnboxResult::Unchanged);
        assert_eq!(files.create_count(), 0);
    }

    #[test]
    fn test_set_rejections() {
        let files = MemoryStore::new();
        let mut manager = loaded(&files);

        assert!(set(&mut manager, "@net:device:port", "70000").is_err(), "out of range");
        assert!(set(&mut manager, "@net:device:port", "http").is_err(), "not a number");
        assert!(set(&mut manager, "@net:device:dhcp", "yes").is_err(), "strict bool");
        assert!(set(&mut manager, "@sys:device:serial", "X").is_err(), "read-only");
        assert_eq!(manager.values(), &DeviceSettings::default());
        assert_eq!(files.create_count(), 0);
    }

    #[test]
    fn test_reset_writes_defaults() {
        let files = MemoryStore::new();
        files.insert(PATH, "[device]\nport = 1\n");
        let mut manager = loaded(&files);

        reset(&mut manager).expect("reset");

        assert_eq!(manager.values(), &DeviceSettings::default());
        assert!(files
            .contents(PATH)
            .is_some_and(|text| text.contains("port = 8080\n")));
    }

    #[test]
    fn test_check_reports_every_problem() {
        // Arrange
        let files = MemoryStore::new();
        files.insert(
            PATH,
            "orphan = 1\n[device]\nport = eighty\ncolour = blue\nmtu = 1400\n[]\n",
        );
        let manager = loaded(&files);
        let mut out = Vec::new();

        // Act
        let problems = check(&manager, &mut out).expect("check");

        // Assert
        let text = String::from_utf8(out).expect("utf-8");
        assert_eq!(problems, 4, "{text}");
        assert!(text.contains("/etc/device.ini:1: expected begin of section"));
        assert!(text.contains("/etc/device.ini:6: empty section name"));
        assert!(text.contains("unknown key \"colour\""));
        assert!(text.contains("invalid value \"eighty\" for @net:device:port"));
    }

    #[test]
    fn test_check_clean_file() {
        let files = MemoryStore::new();
        let mut manager = loaded(&files);
        manager.store().expect("store");

        assert_eq!(check(&manager, &mut Vec::new()).expect("check"), 0);
    }

    #[test]
    fn test_check_missing_file_fails() {
        let files = MemoryStore::new();
        let manager = loaded(&files);

        assert!(check(&manager, &mut Vec::new()).is_err());
    }
}
