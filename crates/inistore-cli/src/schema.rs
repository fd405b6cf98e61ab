//! The device settings table managed by the `inistore` tool.
//!
//! Persisted as the `[device]` section:
//!
//! ```text
//! [device]
//! hostname = inistore
//! port = 8080
//! dhcp = true
//! mtu = 1500
//! serial = UNSET
//! ```

use inistore_core::{settings_schema, FixedString};

/// Network identity of a device.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceSettings {
    pub hostname: FixedString<32>,
    pub port: u16,
    pub dhcp: bool,
    pub mtu: u32,
    /// Factory-programmed; not writable through boxed updates.
    pub serial: String,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            hostname: "inistore".into(),
            port: 8080,
            dhcp: true,
            mtu: 1500,
            serial: "UNSET".to_string(),
        }
    }
}

settings_schema! {
    /// Fields of [`DeviceSettings`].
    pub enum DeviceField, mod device for DeviceSettings in "device" {
        Hostname(hostname: FixedString<32>) = "@net:device:hostname",
        Port(port: u16) = "@net:device:port",
        Dhcp(dhcp: bool) = "@net:device:dhcp",
        Mtu(mtu: u32) = "@net:device:mtu",
        Serial(serial: String) = "@sys:device:serial" [read_only],
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use inistore_core::{Access, FieldId, Schema};

    #[test]
    fn test_schema_declares_one_descriptor_per_field() {
        let names: Vec<&str> = DeviceSettings::descriptors().iter().map(|d| d.name()).collect();
        assert_eq!(
            names,
            [
                "@net:device:hostname",
                "@net:device:port",
                "@net:device:dhcp",
                "@net:device:mtu",
                "@sys:device:serial",
            ]
        );
        assert_eq!(DeviceField::count(), names.len());
    }

    #[test]
    fn test_only_serial_is_read_only() {
        let read_only: Vec<DeviceField> = DeviceSettings::descriptors()
            .iter()
            .filter(|d| d.access() == Access::ReadOnly)
            .map(|d| d.id())
            .collect();
        assert_eq!(read_only, [DeviceField::Serial]);
    }

    #[test]
    fn test_persisted_keys_drop_the_namespace() {
        let keys: Vec<&str> = DeviceSettings::descriptors().iter().map(|d| d.key()).collect();
        assert_eq!(keys, ["hostname", "port", "dhcp", "mtu", "serial"]);
        assert_eq!(DeviceSettings::SECTION, "device");
    }
}
