//! Byte ranges in the normalized input stream.
//!
//! Offsets count bytes of the logical document after carriage returns
//! have been stripped, independent of how the input was chunked.

/// A byte range `[start, end)` in the logical input stream.
///
/// Offsets saturate at `u32::MAX`; positions in inputs past 4 GiB are
/// reported as that value.
///
/// # Example
///
/// ```rust
/// use chunkmark_core::span::Span;
///
/// assert!(Span::at(7).is_empty());
/// assert!(!Span::new(4, 10).is_empty());
/// assert_eq!(Span::from_offsets(3, usize::MAX).end, u32::MAX);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// Starting byte offset (inclusive).
    pub start: u32,
    /// Ending byte offset (exclusive).
    pub end: u32,
}

impl Span {
    #[inline]
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Span between two `usize` offsets, saturating each.
    #[inline]
    pub fn from_offsets(start: usize, end: usize) -> Self {
        Self::new(saturate(start), saturate(end))
    }

    /// Empty span at a single offset.
    #[inline]
    pub const fn at(offset: u32) -> Self {
        Self {
            start: offset,
            end: offset,
        }
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// Convert a byte offset to the `u32` carried by [`Span`].
#[inline]
pub fn saturate(offset: usize) -> u32 {
    u32::try_from(offset).unwrap_or(u32::MAX)
}
