//! Text spans and the interval relations between them.
//!
//! Offsets count Unicode code points. All predicates take `self` as the
//! left-hand span `(b1, e1)` and `other` as `(b2, e2)`.

use serde::{Deserialize, Serialize};

/// Half-open `[begin, end)` range of code point offsets
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    /// First covered code point
    pub begin: i32,
    /// One past the last covered code point
    pub end: i32,
}

impl Span {
    /// Create a span
    pub fn new(begin: i32, end: i32) -> Self {
        Self { begin, end }
    }

    /// Number of covered code points (zero if inverted)
    pub fn len(&self) -> usize {
        (i64::from(self.end) - i64::from(self.begin)).max(0) as usize
    }

    /// True if `begin == end`
    pub fn is_empty(&self) -> bool {
        self.begin >= self.end
    }

    /// True if `0 <= begin <= end <= length`
    pub fn is_valid_for(&self, length: usize) -> bool {
        self.begin >= 0 && self.begin <= self.end && (self.end as i64) <= length as i64
    }

    /// `b1 <= b2 && e2 <= e1`
    pub fn covers(&self, other: &Span) -> bool {
        self.begin <= other.begin && other.end <= self.end
    }

    /// Inverse of [`covers`](Self::covers)
    pub fn covered_by(&self, other: &Span) -> bool {
        other.covers(self)
    }

    /// Non-empty half-open intersection: `b1 < e2 && b2 < e1`
    pub fn overlaps(&self, other: &Span) -> bool {
        self.begin < other.end && other.begin < self.end
    }

    /// Overlaps and overhangs on the left: `b1 <= b2 && e1 <= e2`
    pub fn overlaps_left(&self, other: &Span) -> bool {
        self.overlaps(other) && self.begin <= other.begin && self.end <= other.end
    }

    /// Overlaps and overhangs on the right: `b1 >= b2 && e1 >= e2`
    pub fn overlaps_right(&self, other: &Span) -> bool {
        self.overlaps(other) && self.begin >= other.begin && self.end >= other.end
    }

    /// Starts at or after the end of `other`
    pub fn right_of(&self, other: &Span) -> bool {
        self.begin >= other.end
    }

    /// Ends at or before the start of `other`
    pub fn left_of(&self, other: &Span) -> bool {
        self.end <= other.begin
    }

    /// Shrink the span over leading and trailing code points of `text`
    /// matching `predicate`.
    ///
    /// Offsets outside `text` are clamped. The result never inverts: a span
    /// made only of matching code points collapses to an empty span at its
    /// original begin.
    pub fn trim<P>(&self, text: &str, mut predicate: P) -> Span
    where
        P: FnMut(char) -> bool,
    {
        if self.is_empty() || self.begin < 0 {
            return *self;
        }
        let covered: Vec<char> = text
            .chars()
            .skip(self.begin as usize)
            .take(self.len())
            .collect();

        let mut begin = 0usize;
        let mut end = covered.len();
        while begin < end && predicate(covered[begin]) {
            begin += 1;
        }
        while end > begin && predicate(covered[end - 1]) {
            end -= 1;
        }
        if begin == end {
            return Span::new(self.begin, self.begin);
        }
        Span::new(self.begin + begin as i32, self.begin + end as i32)
    }

    /// [`trim`](Self::trim) with the whitespace predicate
    pub fn trim_whitespace(&self, text: &str) -> Span {
        self.trim(text, char::is_whitespace)
    }

    /// Code points `[begin, end)` of `text`
    pub fn covered_text(&self, text: &str) -> String {
        if self.begin < 0 {
            return String::new();
        }
        text.chars()
            .skip(self.begin as usize)
            .take(self.len())
            .collect()
    }
}

impl From<(i32, i32)> for Span {
    fn from((begin, end): (i32, i32)) -> Self {
        Span::new(begin, end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relations() {
        let outer = Span::new(0, 10);
        let inner = Span::new(2, 5);
        let tail = Span::new(5, 12);

        assert!(outer.covers(&inner));
        assert!(inner.covered_by(&outer));
        assert!(!inner.covers(&outer));

        assert!(outer.overlaps(&tail));
        assert!(outer.overlaps_left(&tail));
        assert!(tail.overlaps_right(&outer));
        assert!(!inner.overlaps(&tail));

        assert!(tail.right_of(&inner));
        assert!(inner.left_of(&tail));
    }

    #[test]
    fn test_len_of_extreme_and_inverted_spans() {
        assert_eq!(Span::new(i32::MIN, i32::MAX).len(), u32::MAX as usize);
        assert_eq!(Span::new(i32::MAX, i32::MIN).len(), 0);
        assert_eq!(Span::new(3, 7).len(), 4);
    }

    #[test]
    fn test_empty_span_at_boundary() {
        let point = Span::new(5, 5);
        let left = Span::new(0, 5);
        assert!(!point.overlaps(&left));
        assert!(point.right_of(&left));
        assert!(point.left_of(&Span::new(5, 9)));
        assert!(left.covers(&point));
    }

    #[test]
    fn test_trim_whitespace() {
        let text = "  hi  ";
        let trimmed = Span::new(0, 6).trim_whitespace(text);
        assert_eq!(trimmed, Span::new(2, 4));
        assert_eq!(trimmed.covered_text(text), "hi");
    }

    #[test]
    fn test_trim_counts_code_points() {
        let text = "\u{1F600} \u{00E9}t\u{00E9}\u{3000}";
        let span = Span::new(1, 6);
        let trimmed = span.trim_whitespace(text);
        assert_eq!(trimmed, Span::new(2, 5));
        assert_eq!(trimmed.covered_text(text), "\u{00E9}t\u{00E9}");
    }

    #[test]
    fn test_trim_all_matching_collapses() {
        let text = "a    b";
        assert_eq!(Span::new(1, 5).trim_whitespace(text), Span::new(1, 1));
        assert_eq!(Span::new(3, 3).trim_whitespace(text), Span::new(3, 3));
    }

    #[test]
    fn test_trim_custom_predicate() {
        let text = "--abc--";
        assert_eq!(Span::new(0, 7).trim(text, |c| c == '-'), Span::new(2, 5));
    }

    #[test]
    fn test_validity() {
        assert!(Span::new(0, 3).is_valid_for(3));
        assert!(!Span::new(0, 4).is_valid_for(3));
        assert!(!Span::new(2, 1).is_valid_for(3));
        assert!(!Span::new(-1, 1).is_valid_for(3));
    }
}
