//! Byte spans into a unit's source buffer.

use std::fmt;
use std::ops::Range;

/// `start..end` in bytes. Offsets are `u32`: a unit larger than 4 GiB
/// saturates rather than wrapping.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    /// Used for nodes with no source text of their own, such as calls made
    /// from Rust through `Interpreter::call`.
    pub const DUMMY: Span = Span::point(0);

    pub const fn new(start: u32, end: u32) -> Self {
        Span { start, end }
    }

    pub const fn point(offset: u32) -> Self {
        Span::new(offset, offset)
    }

    pub fn from_range(range: Range<usize>) -> Self {
        let clamp = |offset: usize| u32::try_from(offset).unwrap_or(u32::MAX);
        Span::new(clamp(range.start), clamp(range.end))
    }

    pub fn to_range(self) -> Range<usize> {
        self.start as usize..self.end as usize
    }

    pub const fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `offset` falls inside; `end` is exclusive.
    pub fn contains(&self, offset: u32) -> bool {
        (self.start..self.end).contains(&offset)
    }

    /// Covers both `self` and `other` and anything between them.
    #[must_use]
    pub fn merge(self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[cfg(target_pointer_width = "64")]
crate::static_assert_size!(Span, 8);
