//! Adaptive set of non-negative integers.
//!
//! The set keeps one of two physical forms and re-evaluates the choice on
//! every insertion:
//!
//! - **Hashed**: a `HashSet<u32>`, cheap for sparse values.
//! - **Bitmap**: 32-bit words covering `offset..=max`, cheap for dense values.
//!   The offset lets a dense cluster of large values live in a small bitmap.
//!
//! Memory is compared in 32-bit words. A hashed element costs
//! [`HASH_WORDS_PER_ENTRY`] words; a bitmap costs `((max - offset) >> 5) + 1`
//! words. The form only changes when the other one wins by more than
//! [`HYSTERESIS`] words, except for the first insertion into an empty set,
//! which picks the cheaper form outright.

use std::collections::HashSet;

/// Bits per bitmap word
const WORD_BITS: u32 = 32;

/// log2 of [`WORD_BITS`]
const WORD_SHIFT: u32 = 5;

/// Distance kept between the first value and the offset
pub const OFFSET_MARGIN: u32 = 64;

/// Words charged for each element of the hashed form
pub const HASH_WORDS_PER_ENTRY: usize = 4;

/// Words one form must win by before the set switches away from the other
pub const HYSTERESIS: usize = 28;

/// Physical form currently used by an [`AdaptiveIntSet`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Representation {
    /// Hash set of values
    Hashed,
    /// Bitmap with additive offset
    Bitmap,
}

/// Bitmap storing `value - offset` as bit positions
#[derive(Debug, Clone, Default)]
struct OffsetBitmap {
    words: Vec<u32>,
    offset: u32,
}

impl OffsetBitmap {
    fn with_offset(offset: u32) -> Self {
        Self {
            words: Vec::new(),
            offset,
        }
    }

    fn locate(&self, value: u32) -> Option<(usize, u32)> {
        let rel = value.checked_sub(self.offset)?;
        Some(((rel >> WORD_SHIFT) as usize, 1u32 << (rel & (WORD_BITS - 1))))
    }

    fn insert(&mut self, value: u32) -> bool {
        let (word, mask) = match self.locate(value) {
            Some(slot) => slot,
            None => return false,
        };
        if word >= self.words.len() {
            self.words.resize(word + 1, 0);
        }
        let fresh = self.words[word] & mask == 0;
        self.words[word] |= mask;
        fresh
    }

    fn remove(&mut self, value: u32) -> bool {
        match self.locate(value) {
            Some((word, mask)) if word < self.words.len() && self.words[word] & mask != 0 => {
                self.words[word] &= !mask;
                true
            }
            _ => false,
        }
    }

    fn contains(&self, value: u32) -> bool {
        match self.locate(value) {
            Some((word, mask)) => self.words.get(word).is_some_and(|w| w & mask != 0),
            None => false,
        }
    }

    fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        let offset = self.offset;
        self.words.iter().enumerate().flat_map(move |(index, &word)| {
            let base = offset + ((index as u32) << WORD_SHIFT);
            BitIter { word }.map(move |bit| base + bit)
        })
    }
}

/// Iterates the set bit positions of one word in increasing order
struct BitIter {
    word: u32,
}

impl Iterator for BitIter {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        if self.word == 0 {
            return None;
        }
        let bit = self.word.trailing_zeros();
        self.word &= self.word - 1;
        Some(bit)
    }
}

#[derive(Debug, Clone)]
enum Storage {
    Hashed(HashSet<u32>),
    Bitmap(OffsetBitmap),
}

/// Set of non-negative integers that picks its own physical form.
///
/// `min`/`max` are bounds of every value inserted since the last
/// [`clear`](Self::clear); removals do not shrink them.
#[derive(Debug, Clone)]
pub struct AdaptiveIntSet {
    storage: Storage,
    len: usize,
    min: u32,
    max: u32,
    use_offset: bool,
}

impl Default for AdaptiveIntSet {
    fn default() -> Self {
        Self::new()
    }
}

impl AdaptiveIntSet {
    /// Create an empty set in hashed form
    pub fn new() -> Self {
        Self {
            storage: Storage::Hashed(HashSet::new()),
            len: 0,
            min: u32::MAX,
            max: 0,
            use_offset: true,
        }
    }

    /// Number of values in the set
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if the set holds no values
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Physical form currently in use
    pub fn representation(&self) -> Representation {
        match self.storage {
            Storage::Hashed(_) => Representation::Hashed,
            Storage::Bitmap(_) => Representation::Bitmap,
        }
    }

    /// False once a value below the offset cancelled offsetting for this set
    pub fn uses_offset(&self) -> bool {
        self.use_offset
    }

    /// Current bitmap offset, zero in hashed form
    pub fn offset(&self) -> u32 {
        match &self.storage {
            Storage::Bitmap(bits) => bits.offset,
            Storage::Hashed(_) => 0,
        }
    }

    /// Membership test
    pub fn contains(&self, value: u32) -> bool {
        match &self.storage {
            Storage::Hashed(set) => set.contains(&value),
            Storage::Bitmap(bits) => bits.contains(value),
        }
    }

    /// Insert a value. Returns false if it was already present.
    pub fn add(&mut self, value: u32) -> bool {
        if self.contains(value) {
            return false;
        }

        if self.len == 0 {
            return self.add_first(value);
        }

        self.min = self.min.min(value);
        self.max = self.max.max(value);
        self.len += 1;

        match &mut self.storage {
            Storage::Bitmap(bits) if value < bits.offset => {
                // Offsetting is one-directional until the next clear
                self.use_offset = false;
                tracing::trace!(value, offset = bits.offset, "int set offset cancelled");
                if self.bitmap_words(0) > self.hashed_words() + HYSTERESIS {
                    self.rebuild_hashed(Some(value));
                } else {
                    self.rebuild_bitmap(0, Some(value));
                }
            }
            Storage::Bitmap(bits) => {
                // Decide before growing the bitmap to cover `value`
                let offset = bits.offset;
                if self.bitmap_words(offset) > self.hashed_words() + HYSTERESIS {
                    self.rebuild_hashed(Some(value));
                } else if let Storage::Bitmap(bits) = &mut self.storage {
                    bits.insert(value);
                }
            }
            Storage::Hashed(set) => {
                set.insert(value);
                let offset = self.candidate_offset();
                if self.bitmap_words(offset) + HYSTERESIS < self.hashed_words() {
                    self.rebuild_bitmap(offset, None);
                }
            }
        }
        true
    }

    /// Remove a value. Returns false if it was absent. Never changes the form.
    pub fn remove(&mut self, value: u32) -> bool {
        let removed = match &mut self.storage {
            Storage::Hashed(set) => set.remove(&value),
            Storage::Bitmap(bits) => bits.remove(value),
        };
        if removed {
            self.len -= 1;
        }
        removed
    }

    /// Remove every value and return to the hashed form.
    ///
    /// A cancelled offset stays cancelled.
    pub fn clear(&mut self) {
        self.storage = Storage::Hashed(HashSet::new());
        self.len = 0;
        self.min = u32::MAX;
        self.max = 0;
    }

    /// Values in strictly increasing order
    pub fn to_ordered_vec(&self) -> Vec<u32> {
        match &self.storage {
            Storage::Bitmap(bits) => bits.iter().collect(),
            Storage::Hashed(set) => {
                let mut values: Vec<u32> = set.iter().copied().collect();
                values.sort_unstable();
                values
            }
        }
    }

    /// Values in whatever order the current form yields them cheapest
    pub fn to_unordered_vec(&self) -> Vec<u32> {
        match &self.storage {
            Storage::Bitmap(bits) => bits.iter().collect(),
            Storage::Hashed(set) => set.iter().copied().collect(),
        }
    }

    /// Iterate values in strictly increasing order
    pub fn ordered_iter(&self) -> Box<dyn Iterator<Item = u32> + '_> {
        match &self.storage {
            Storage::Bitmap(bits) => Box::new(bits.iter()),
            Storage::Hashed(_) => Box::new(self.to_ordered_vec().into_iter()),
        }
    }

    fn add_first(&mut self, value: u32) -> bool {
        self.min = value;
        self.max = value;
        self.len = 1;

        let offset = self.candidate_offset();
        if self.bitmap_words(offset) <= self.hashed_words() {
            let mut bits = OffsetBitmap::with_offset(offset);
            bits.insert(value);
            self.storage = Storage::Bitmap(bits);
        } else {
            let mut set = HashSet::new();
            set.insert(value);
            self.storage = Storage::Hashed(set);
        }
        true
    }

    fn candidate_offset(&self) -> u32 {
        if self.use_offset && self.min > OFFSET_MARGIN {
            self.min - OFFSET_MARGIN
        } else {
            0
        }
    }

    fn bitmap_words(&self, offset: u32) -> usize {
        (((self.max - offset) >> WORD_SHIFT) + 1) as usize
    }

    fn hashed_words(&self) -> usize {
        self.len * HASH_WORDS_PER_ENTRY
    }

    fn rebuild_hashed(&mut self, extra: Option<u32>) {
        let mut set: HashSet<u32> = self.to_unordered_vec().into_iter().collect();
        set.extend(extra);
        tracing::trace!(len = self.len, "int set switched to hashed form");
        self.storage = Storage::Hashed(set);
    }

    fn rebuild_bitmap(&mut self, offset: u32, extra: Option<u32>) {
        let mut bits = OffsetBitmap::with_offset(offset);
        for value in self.to_unordered_vec().into_iter().chain(extra) {
            bits.insert(value);
        }
        tracing::trace!(len = self.len, offset, "int set switched to bitmap form");
        self.storage = Storage::Bitmap(bits);
    }
}

impl FromIterator<u32> for AdaptiveIntSet {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        let mut set = AdaptiveIntSet::new();
        set.extend(iter);
        set
    }
}

impl Extend<u32> for AdaptiveIntSet {
    fn extend<I: IntoIterator<Item = u32>>(&mut self, iter: I) {
        for value in iter {
            self.add(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spread_values_leave_bitmap() {
        let mut s = AdaptiveIntSet::new();
        s.add(128);
        assert_eq!(s.representation(), Representation::Bitmap);
        s.add(128128);
        assert_eq!(s.representation(), Representation::Hashed);
        assert_eq!(s.to_ordered_vec(), vec![128, 128128]);
    }

    #[test]
    fn test_offset_cancelled_into_hashed() {
        let bb = 300_000;
        let mut s = AdaptiveIntSet::new();
        assert!(s.uses_offset());
        s.add(bb);
        s.add(bb);
        s.add(bb + 1);
        s.add(bb + 2);

        assert_eq!(s.len(), 3);
        assert_eq!(s.representation(), Representation::Bitmap);
        assert!(s.uses_offset());
        assert_eq!(s.offset(), bb - OFFSET_MARGIN);

        s.add(bb - 66);
        assert_eq!(s.len(), 4);
        assert_eq!(s.representation(), Representation::Hashed);
        assert_eq!(s.to_ordered_vec(), vec![bb - 66, bb, bb + 1, bb + 2]);
    }

    #[test]
    fn test_offset_cancelled_into_plain_bitmap() {
        let bb = 67;
        let mut s = AdaptiveIntSet::new();
        s.add(bb);
        s.add(bb);
        s.add(bb + 1);
        s.add(bb + 2);
        assert_eq!(s.len(), 3);
        assert_eq!(s.representation(), Representation::Bitmap);
        assert!(s.uses_offset());

        s.add(bb - 66);
        assert_eq!(s.len(), 4);
        assert_eq!(s.representation(), Representation::Bitmap);
        assert!(!s.uses_offset());
        assert_eq!(s.offset(), 0);
        assert_eq!(s.to_ordered_vec(), vec![1, 67, 68, 69]);

        // clear keeps the offset cancelled
        s.clear();
        assert!(!s.uses_offset());
        assert!(s.is_empty());
        s.add(767 - 64);
        assert_eq!(s.representation(), Representation::Hashed);

        for i in 1..13 {
            s.add(i);
            if i < 12 {
                assert_eq!(s.representation(), Representation::Hashed, "i is {}", i);
            } else {
                assert_eq!(s.representation(), Representation::Bitmap, "i is {}", i);
            }
        }
        let mut expected: Vec<u32> = (1..13).collect();
        expected.push(767 - 64);
        assert_eq!(s.to_ordered_vec(), expected);

        let mut reached = false;
        let mut i = 10;
        while i < 5122 {
            s.add(i);
            reached = i >= 5120;
            if reached {
                assert_eq!(s.representation(), Representation::Hashed);
            } else {
                assert_eq!(s.representation(), Representation::Bitmap, "i is {}", i);
            }
            i <<= 1;
        }
        assert!(reached);
    }

    #[test]
    fn test_traversals() {
        let mut s: AdaptiveIntSet = [123, 987, 789].into_iter().collect();
        assert_eq!(s.representation(), Representation::Bitmap);
        assert_eq!(s.to_unordered_vec(), vec![123, 789, 987]);

        s.clear();
        s.extend([125, 987, 1_500_000]);
        assert_eq!(s.representation(), Representation::Hashed);
        let mut unordered = s.to_unordered_vec();
        unordered.sort_unstable();
        assert_eq!(unordered, vec![125, 987, 1_500_000]);
        assert_eq!(s.to_ordered_vec(), vec![125, 987, 1_500_000]);
        assert_eq!(s.ordered_iter().collect::<Vec<_>>(), vec![125, 987, 1_500_000]);
    }

    #[test]
    fn test_remove_and_contains() {
        let mut s = AdaptiveIntSet::new();
        assert!(!s.remove(5));
        assert!(s.add(5));
        assert!(!s.add(5));
        assert!(s.contains(5));
        assert!(!s.contains(6));
        assert!(s.remove(5));
        assert!(!s.contains(5));
        assert!(s.is_empty());
        assert_eq!(s.representation(), Representation::Bitmap);
        assert!(s.to_ordered_vec().is_empty());
    }

    #[test]
    fn test_zero_is_storable() {
        let mut s = AdaptiveIntSet::new();
        s.add(0);
        s.add(31);
        s.add(32);
        assert_eq!(s.to_ordered_vec(), vec![0, 31, 32]);
    }
}
