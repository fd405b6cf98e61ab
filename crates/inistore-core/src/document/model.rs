//! In-memory INI document.
//!
//! A [`Document`] is an ordered list of [`Section`]s, each holding an ordered
//! list of [`KeyValuePair`]s.  Both levels keep insertion order so that a
//! parse → serialize round trip reproduces the file layout exactly.
//!
//! # Uniqueness rules
//!
//! - Section names are unique within a document.  [`Document::section_mut_or_insert`]
//!   returns the existing section when the name is already present.
//! - Keys are unique within a section.  [`Section::set`] overwrites an existing
//!   key in place (its position does not move) and appends new keys.
//!
//! The structures own all of their data; nothing hands out references that
//! outlive a load or store round trip.

use std::fmt;

/// One `key = value` entry of a section.
///
/// The key is never empty.  The value may be empty, which is a valid state
/// distinct from the key being absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValuePair {
    key: String,
    value: String,
}

impl KeyValuePair {
    /// Returns the key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the value (possibly empty).
    pub fn value(&self) -> &str {
        &self.value
    }
}

/// A named `[section]` and its entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    name: String,
    pairs: Vec<KeyValuePair>,
}

impl Section {
    fn new(name: String) -> Self {
        Self {
            name,
            pairs: Vec::new(),
        }
    }

    /// Returns the section name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the value stored for `key`, if any.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|pair| pair.key == key)
            .map(|pair| pair.value.as_str())
    }

    /// Returns `true` if an entry for `key` exists (even with an empty value).
    pub fn contains_key(&self, key: &str) -> bool {
        self.pairs.iter().any(|pair| pair.key == key)
    }

    /// Stores `value` under `key`.
    ///
    /// An existing entry is overwritten in place; a new key is appended.
    ///
    /// # Panics
    ///
    /// Panics if `key` is empty.  The parser never produces empty keys, so an
    /// empty key here is a caller bug.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        assert!(!key.is_empty(), "section keys must not be empty");
        let value = value.into();

        match self.pairs.iter_mut().find(|pair| pair.key == key) {
            Some(pair) => pair.value = value,
            None => self.pairs.push(KeyValuePair { key, value }),
        }
    }

    /// Removes the entry for `key`, returning its value if it was present.
    ///
    /// The relative order of the remaining entries is preserved.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let index = self.pairs.iter().position(|pair| pair.key == key)?;
        Some(self.pairs.remove(index).value)
    }

    /// Iterates the entries in insertion order.
    pub fn pairs(&self) -> impl Iterator<Item = &KeyValuePair> {
        self.pairs.iter()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Returns `true` if the section has no entries.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// An ordered collection of uniquely named sections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    sections: Vec<Section>,
}

impl Document {
    /// Creates an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the section called `name`, if present.
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|section| section.name == name)
    }

    /// Returns a mutable reference to the section called `name`, if present.
    pub fn section_mut(&mut self, name: &str) -> Option<&mut Section> {
        self.sections.iter_mut().find(|section| section.name == name)
    }

    /// Returns the section called `name`, creating an empty one at the end of
    /// the document if it does not exist yet.
    pub fn section_mut_or_insert(&mut self, name: &str) -> &mut Section {
        let index = self.section_index_or_insert(name);
        &mut self.sections[index]
    }

    /// Index-returning variant of [`Self::section_mut_or_insert`], used by the
    /// parser to remember its current section without holding a borrow.
    pub(crate) fn section_index_or_insert(&mut self, name: &str) -> usize {
        match self.sections.iter().position(|section| section.name == name) {
            Some(index) => index,
            None => {
                self.sections.push(Section::new(name.to_string()));
                self.sections.len() - 1
            }
        }
    }

    pub(crate) fn section_at_mut(&mut self, index: usize) -> &mut Section {
        &mut self.sections[index]
    }

    /// Iterates sections in creation order.
    pub fn sections(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter()
    }

    /// Number of sections.
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Returns `true` if the document has no sections.
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Renders the document in the backing-file format.
    ///
    /// This is the same text [`crate::document::writer::write`] commits to
    /// storage.
    pub fn to_ini_string(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for section in &self.sections {
            writeln!(f, "[{}]", section.name)?;
            for pair in &section.pairs {
                // An empty value still leaves the separator's trailing space.
                writeln!(f, "{} = {}", pair.key, pair.value)?;
            }
        }
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
