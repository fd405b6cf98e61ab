//! Native field types and their text / boxed conversions.
//!
//! | type              | text form                       | boxed form  |
//! |-------------------|---------------------------------|-------------|
//! | `String`          | verbatim                        | `Text`      |
//! | `FixedString<N>`  | verbatim, truncated to `N` bytes | `Text`     |
//! | `u8`..`u64`       | decimal digits only              | `Unsigned` |
//! | `bool`            | `true` / anything else is false  | `Bool`     |
//!
//! Text parsing of integers is strict: the whole string must be ASCII digits
//! and fit the width.  `"+1"`, `" 1"`, `"1x"` and `""` are all rejected.
//!
//! Boxed text is only accepted if the backing file can hold it unchanged: no
//! line breaks, and no leading or trailing blanks (the parser trims them).

use std::fmt::{self, Write as _};
use std::ops::Deref;

use super::boxed::{BoxedValue, UnboxError};

/// A type that can be stored in a configuration field.
pub trait FieldValue: Clone + PartialEq + Send + Sync + 'static {
    /// Appends the backing-file text for `self` to `out`.
    fn format_text(&self, out: &mut String);

    /// Parses backing-file text.  `None` leaves the field untouched.
    fn parse_text(text: &str) -> Option<Self>;

    /// Converts to the dynamic representation.
    fn to_boxed(&self) -> BoxedValue;

    /// Converts from the dynamic representation.
    fn from_boxed(boxed: &BoxedValue) -> Result<Self, UnboxError>;
}

macro_rules! impl_unsigned_field_value {
    ($($t:ty),+) => {
        $(
            impl FieldValue for $t {
                fn format_text(&self, out: &mut String) {
                    // Writing into a String cannot fail.
                    let _ = write!(out, "{self}");
                }

                fn parse_text(text: &str) -> Option<Self> {
                    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
                        return None;
                    }
                    text.parse().ok()
                }

                fn to_boxed(&self) -> BoxedValue {
                    BoxedValue::Unsigned(u64::from(*self))
                }

                fn from_boxed(boxed: &BoxedValue) -> Result<Self, UnboxError> {
                    match boxed {
                        BoxedValue::Unsigned(n) => {
                            <$t>::try_from(*n).map_err(|_| UnboxError::OutOfRange)
                        }
                        _ => Err(UnboxError::TypeMismatch),
                    }
                }
            }
        )+
    };
}

impl_unsigned_field_value!(u8, u16, u32, u64);

impl FieldValue for bool {
    fn format_text(&self, out: &mut String) {
        out.push_str(if *self { "true" } else { "false" });
    }

    fn parse_text(text: &str) -> Option<Self> {
        Some(text == "true")
    }

    fn to_boxed(&self) -> BoxedValue {
        BoxedValue::Bool(*self)
    }

    fn from_boxed(boxed: &BoxedValue) -> Result<Self, UnboxError> {
        match boxed {
            BoxedValue::Bool(b) => Ok(*b),
            _ => Err(UnboxError::TypeMismatch),
        }
    }
}

/// `true` if `text` survives a store/load cycle as one `key = value` line.
fn is_storable_text(text: &str) -> bool {
    const BLANKS: &[char] = &[' ', '\t', '\r'];
    !text.contains(['\n', '\r']) && text.trim_matches(BLANKS).len() == text.len()
}

impl FieldValue for String {
    fn format_text(&self, out: &mut String) {
        out.push_str(self);
    }

    fn parse_text(text: &str) -> Option<Self> {
        Some(text.to_string())
    }

    fn to_boxed(&self) -> BoxedValue {
        BoxedValue::Text(self.clone())
    }

    fn from_boxed(boxed: &BoxedValue) -> Result<Self, UnboxError> {
        match boxed {
            BoxedValue::Text(s) if is_storable_text(s) => Ok(s.clone()),
            BoxedValue::Text(_) => Err(UnboxError::OutOfRange),
            _ => Err(UnboxError::TypeMismatch),
        }
    }
}

/// A UTF-8 string holding at most `N` bytes.
///
/// Models a fixed-size text buffer in the settings struct.  Text loaded from
/// the backing file is truncated to fit, at a character boundary so the
/// result stays valid UTF-8.  Boxed updates that do not fit are rejected
/// instead, since the caller can be told.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FixedString<const N: usize> {
    text: String,
}

impl<const N: usize> FixedString<N> {
    /// Maximum length in bytes.
    pub const CAPACITY: usize = N;

    /// Creates an empty string.
    pub fn new() -> Self {
        Self {
            text: String::new(),
        }
    }

    /// Copies as much of `text` as fits, cutting at a char boundary.
    pub fn truncated(text: &str) -> Self {
        let mut end = text.len().min(N);
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        Self {
            text: text[..end].to_string(),
        }
    }

    /// Copies `text` if it fits, `None` otherwise.
    pub fn try_new(text: &str) -> Option<Self> {
        (text.len() <= N).then(|| Self {
            text: text.to_string(),
        })
    }

    /// Returns the contents.
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl<const N: usize> Deref for FixedString<N> {
    type Target = str;

    fn deref(&self) -> &str {
        &self.text
    }
}

impl<const N: usize> fmt::Display for FixedString<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl<const N: usize> From<&str> for FixedString<N> {
    fn from(text: &str) -> Self {
        Self::truncated(text)
    }
}

impl<const N: usize> PartialEq<&str> for FixedString<N> {
    fn eq(&self, other: &&str) -> bool {
        self.text == *other
    }
}

impl<const N: usize> FieldValue for FixedString<N> {
    fn format_text(&self, out: &mut String) {
        out.push_str(&self.text);
    }

    fn parse_text(text: &str) -> Option<Self> {
        Some(Self::truncated(text))
    }

    fn to_boxed(&self) -> BoxedValue {
        BoxedValue::Text(self.text.clone())
    }

    fn from_boxed(boxed: &BoxedValue) -> Result<Self, UnboxError> {
        match boxed {
            BoxedValue::Text(s) if is_storable_text(s) => {
                Self::try_new(s).ok_or(UnboxError::OutOfRange)
            }
            BoxedValue::Text(_) => Err(UnboxError::OutOfRange),
            _ => Err(UnboxError::TypeMismatch),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
