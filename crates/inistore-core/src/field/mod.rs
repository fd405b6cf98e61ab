//! Typed binding between a settings struct and its persisted entries.
//!
//! A settings schema is three things kept in lock-step:
//!
//! - a field-id enum ([`FieldId`]) whose discriminants index the changed
//!   bitmap;
//! - one zero-sized key type per field ([`Field`]) carrying the value type and
//!   accessors, used for typed updates (`scope.update(keys::Port, 8080)`);
//! - a static table of [`FieldDescriptor`]s, in the same order, used for
//!   name-based text and boxed access.
//!
//! All three are generated from one field list by [`crate::settings_schema!`],
//! so the enum, the bitmap indices and the table cannot drift apart.

use std::fmt::Debug;
use std::hash::Hash;

pub mod boxed;
pub mod descriptor;
pub mod value;

pub use boxed::{BoxedValue, UnboxError, UnboxResult};
pub use descriptor::{Access, FieldDescriptor};
pub use value::{FieldValue, FixedString};

/// Identifier of one field within a schema.
pub trait FieldId: Copy + Eq + Hash + Debug + Send + Sync + 'static {
    /// Every field, in declaration order.  `ALL[i].index() == i`.
    const ALL: &'static [Self];

    /// Position of the field in declaration order.
    fn index(self) -> usize;

    /// Number of fields in the schema.
    fn count() -> usize {
        Self::ALL.len()
    }
}

/// Typed key for one field of [`Self::Settings`].
pub trait Field: Copy + Debug + 'static {
    type Settings: Schema;
    type Value: FieldValue;

    const ID: <Self::Settings as Schema>::Field;

    fn get(settings: &Self::Settings) -> &Self::Value;
    fn get_mut(settings: &mut Self::Settings) -> &mut Self::Value;
}

/// A settings struct with a declared section and descriptor table.
pub trait Schema: Clone + Send + 'static {
    type Field: FieldId;

    /// Section of the backing file holding this table.
    const SECTION: &'static str;

    /// Descriptor table, in [`FieldId::ALL`] order.
    fn descriptors() -> &'static [FieldDescriptor<Self>];

    /// Looks a descriptor up by exact fully qualified name.
    fn descriptor(name: &str) -> Option<&'static FieldDescriptor<Self>> {
        Self::descriptors().iter().find(|d| d.name() == name)
    }

    /// Returns the descriptor of `id`.
    fn descriptor_for(id: Self::Field) -> &'static FieldDescriptor<Self> {
        &Self::descriptors()[id.index()]
    }
}

/// Declares the field-id enum, typed keys and [`Schema`] impl for a settings
/// struct.
///
/// ```rust
/// use inistore_core::{settings_schema, FixedString, Schema};
///
/// #[derive(Debug, Clone, PartialEq)]
/// pub struct Network {
///     pub hostname: FixedString<32>,
///     pub port: u16,
///     pub dhcp: bool,
///     pub serial: String,
/// }
///
/// settings_schema! {
///     /// Fields of [`Network`].
///     pub enum NetworkField, mod network for Network in "network" {
///         Hostname(hostname: FixedString<32>) = "@net:network:hostname",
///         Port(port: u16) = "@net:network:port",
///         Dhcp(dhcp: bool) = "@net:network:dhcp",
///         Serial(serial: String) = "@sys:network:serial" [read_only],
///     }
/// }
///
/// assert_eq!(Network::SECTION, "network");
/// assert_eq!(Network::descriptors()[1].key(), "port");
/// ```
///
/// A field marked `[read_only]` rejects boxed updates with
/// [`UnboxResult::PermissionDenied`].
#[macro_export]
macro_rules! settings_schema {
    (
        $(#[$enum_meta:meta])*
        $vis:vis enum $fields:ident, mod $keys:ident for $settings:ident in $section:literal {
            $(
                $(#[$field_meta:meta])*
                $variant:ident ( $member:ident : $value:ty ) = $name:literal $( [$access:ident] )?
            ),+ $(,)?
        }
    ) => {
        $(#[$enum_meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        $vis enum $fields {
            $( $(#[$field_meta])* $variant, )+
        }

        impl $crate::field::FieldId for $fields {
            const ALL: &'static [Self] = &[ $( $fields::$variant ),+ ];

            fn index(self) -> usize {
                self as usize
            }
        }

        /// Typed field keys.
        $vis mod $keys {
            $(
                $(#[$field_meta])*
                #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
                pub struct $variant;
            )+
        }

        $(
            impl $crate::field::Field for $keys::$variant {
                type Settings = $settings;
                type Value = $value;

                const ID: $fields = $fields::$variant;

                fn get(settings: &$settings) -> &$value {
                    &settings.$member
                }

                fn get_mut(settings: &mut $settings) -> &mut $value {
                    &mut settings.$member
                }
            }
        )+

        impl $crate::field::Schema for $settings {
            type Field = $fields;

            const SECTION: &'static str = $section;

            fn descriptors() -> &'static [$crate::field::FieldDescriptor<Self>] {
                static DESCRIPTORS: &[$crate::field::FieldDescriptor<$settings>] = &[
                    $(
                        $crate::field::FieldDescriptor::new::<$keys::$variant>(
                            $name,
                            $crate::__field_access!($($access)?),
                        ),
                    )+
                ];
                DESCRIPTORS
            }
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __field_access {
    () => {
        $crate::field::Access::ReadWrite
    };
    (read_only) => {
        $crate::field::Access::ReadOnly
    };
}
