//! Small schema shared by the unit tests of this crate.

use crate::field::FixedString;

#[derive(Debug, Clone, PartialEq)]
pub struct TestSettings {
    pub port: u16,
    pub enabled: bool,
    pub label: FixedString<8>,
    pub serial: String,
}

impl Default for TestSettings {
    fn default() -> Self {
        Self {
            port: 8080,
            enabled: true,
            label: "node".into(),
            serial: "SN-0001".to_string(),
        }
    }
}

crate::settings_schema! {
    pub enum TestField, mod keys for TestSettings in "test" {
        Port(port: u16) = "@net:test:port",
        Enabled(enabled: bool) = "@net:test:enabled",
        Label(label: FixedString<8>) = "label",
        Serial(serial: String) = "@sys:test:serial" [read_only],
    }
}
