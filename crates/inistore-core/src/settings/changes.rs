//! Per-field changed bitmap.
//!
//! One bit per field of the schema, indexed by [`FieldId::index`], packed into
//! 64-bit words.  The set is sized once from [`FieldId::count`] and never
//! grows.

use std::fmt;
use std::marker::PhantomData;

use crate::field::FieldId;

const WORD_BITS: usize = u64::BITS as usize;

/// Set of fields modified since the bitmap was last cleared.
#[derive(Clone, PartialEq, Eq)]
pub struct ChangeSet<F: FieldId> {
    words: Box<[u64]>,
    _fields: PhantomData<F>,
}

impl<F: FieldId> ChangeSet<F> {
    /// Creates an empty set sized for every field of `F`.
    pub fn new() -> Self {
        let words = F::count().div_ceil(WORD_BITS);
        Self {
            words: vec![0; words].into_boxed_slice(),
            _fields: PhantomData,
        }
    }

    /// Marks `field`.  Returns `true` if it was not marked before.
    pub fn insert(&mut self, field: F) -> bool {
        let (word, mask) = Self::locate(field);
        let fresh = self.words[word] & mask == 0;
        self.words[word] |= mask;
        fresh
    }

    /// Returns `true` if `field` is marked.
    pub fn contains(&self, field: F) -> bool {
        let (word, mask) = Self::locate(field);
        self.words[word] & mask != 0
    }

    /// Number of marked fields.
    pub fn len(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Returns `true` if no field is marked.
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Unmarks every field.
    pub fn clear(&mut self) {
        self.words.fill(0);
    }

    /// Iterates marked fields in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = F> + '_ {
        F::ALL.iter().copied().filter(move |&field| self.contains(field))
    }

    fn locate(field: F) -> (usize, u64) {
        let index = field.index();
        (index / WORD_BITS, 1u64 << (index % WORD_BITS))
    }
}

impl<F: FieldId> Default for ChangeSet<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: FieldId> fmt::Debug for ChangeSet<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
