//! Chunked input feeder with a checkpointable cursor.
//!
//! The feeder pulls text fragments from any iterator on demand, strips
//! carriage returns, and presents the result as one logical character
//! stream. Lookahead that runs off the end of the buffered text pulls the
//! next fragment, so a token may straddle any number of fragment
//! boundaries without the consumer noticing.
//!
//! Consumed text is retained until the feeder is dropped, which lets a
//! [`Checkpoint`] taken anywhere in the stream be restored later. Block
//! rules use this to try an alternative and back out of it without having
//! consumed input.
//!
//! # Example
//!
//! ```rust
//! use chunkmark_core::feeder::ChunkFeeder;
//!
//! let mut feeder = ChunkFeeder::new(["# Hea", "ding\r\n", "body"]);
//! assert_eq!(feeder.next_line().as_deref(), Some("# Heading"));
//!
//! let mark = feeder.checkpoint();
//! assert_eq!(feeder.take(2), "bo");
//! feeder.restore(mark);
//! assert_eq!(feeder.peek_line(), Some("body"));
//! ```

use std::iter::Fuse;

use log::trace;
use memchr::memchr;

use crate::span::saturate;

/// A saved stream position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint(usize);

impl Checkpoint {
    /// Byte offset of the saved position in the logical stream.
    #[inline]
    pub fn offset(self) -> u32 {
        saturate(self.0)
    }

    /// Unsaturated byte offset of the saved position.
    #[inline]
    pub fn position(self) -> usize {
        self.0
    }
}

/// Pull-based cursor over a sequence of text fragments.
pub struct ChunkFeeder<I: Iterator> {
    /// Remaining fragments, fused so exhaustion is sticky.
    chunks: Fuse<I>,
    /// Every character pulled so far, carriage returns removed.
    buffer: String,
    /// Byte offset of the cursor in `buffer`.
    pos: usize,
}

impl<'a> ChunkFeeder<std::iter::Once<&'a str>> {
    /// Feeder over a single fragment.
    pub fn from_text(text: &'a str) -> Self {
        Self::new(std::iter::once(text))
    }
}

impl<I> ChunkFeeder<I>
where
    I: Iterator,
    I::Item: AsRef<str>,
{
    /// Create a feeder over an ordered sequence of fragments.
    ///
    /// Nothing is read until the first lookahead.
    pub fn new(chunks: impl IntoIterator<IntoIter = I>) -> Self {
        Self {
            chunks: chunks.into_iter().fuse(),
            buffer: String::new(),
            pos: 0,
        }
    }

    /// Byte offset of the cursor in the logical stream.
    #[inline]
    pub fn offset(&self) -> u32 {
        saturate(self.pos)
    }

    /// Save the current position.
    #[inline]
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.pos)
    }

    /// Rewind (or fast-forward) to a saved position.
    #[inline]
    pub fn restore(&mut self, checkpoint: Checkpoint) {
        self.pos = checkpoint.0;
    }

    /// Check if the stream is exhausted, pulling a fragment if needed.
    pub fn at_end(&mut self) -> bool {
        while self.pos >= self.buffer.len() {
            if !self.pull() {
                return true;
            }
        }
        false
    }

    /// Longest prefix of the remaining stream whose characters all satisfy
    /// `pred`. Nothing is consumed.
    pub fn peek_while(&mut self, pred: impl FnMut(char) -> bool) -> &str {
        let end = self.scan_while(pred);
        &self.buffer[self.pos..end]
    }

    /// Consume and return up to `n` characters.
    ///
    /// Returns fewer than `n` characters only at end of stream.
    pub fn take(&mut self, n: usize) -> String {
        let mut seen = 0;
        let end = self.scan_while(|_| {
            seen += 1;
            seen <= n
        });
        let taken = self.buffer[self.pos..end].to_owned();
        self.pos = end;
        taken
    }

    /// Skip characters up to (not including) the first one that satisfies
    /// `pred`, or to end of stream. Returns the number of bytes skipped.
    pub fn advance_until(&mut self, mut pred: impl FnMut(char) -> bool) -> usize {
        let end = self.scan_while(|c| !pred(c));
        let skipped = end - self.pos;
        self.pos = end;
        skipped
    }

    /// Check whether the remaining stream begins with `prefix`.
    pub fn starts_with(&mut self, prefix: &str) -> bool {
        while self.buffer.len() - self.pos < prefix.len() {
            if !self.pull() {
                break;
            }
        }
        self.buffer[self.pos..].starts_with(prefix)
    }

    /// The current line without its terminating newline, or `None` at end
    /// of stream. Nothing is consumed.
    pub fn peek_line(&mut self) -> Option<&str> {
        if self.at_end() {
            return None;
        }
        Some(self.peek_while(|c| c != '\n'))
    }

    /// Consume the current line and its newline, if any.
    pub fn next_line(&mut self) -> Option<String> {
        let line = self.peek_line()?.to_owned();
        self.pos += line.len();
        self.skip_newline();
        Some(line)
    }

    /// Consume the current line without copying it.
    pub fn skip_line(&mut self) -> bool {
        if self.at_end() {
            return false;
        }
        self.advance_until(|c| c == '\n');
        self.skip_newline();
        true
    }

    #[inline]
    fn skip_newline(&mut self) {
        if self.buffer.as_bytes().get(self.pos) == Some(&b'\n') {
            self.pos += 1;
        }
    }

    /// Byte offset just past the longest run of characters matching `pred`
    /// starting at the cursor. Each character is tested exactly once.
    fn scan_while(&mut self, mut pred: impl FnMut(char) -> bool) -> usize {
        let mut end = self.pos;
        loop {
            match self.buffer[end..].char_indices().find(|&(_, c)| !pred(c)) {
                Some((i, _)) => return end + i,
                None => {
                    end = self.buffer.len();
                    if !self.pull() {
                        return end;
                    }
                }
            }
        }
    }

    /// Append the next non-empty fragment to the buffer.
    ///
    /// Returns `false` once the source is exhausted.
    fn pull(&mut self) -> bool {
        let before = self.buffer.len();
        while let Some(chunk) = self.chunks.next() {
            push_without_cr(&mut self.buffer, chunk.as_ref());
            if self.buffer.len() > before {
                trace!(
                    "pulled {} bytes, buffer at {} bytes",
                    self.buffer.len() - before,
                    self.buffer.len()
                );
                return true;
            }
        }
        false
    }
}

/// Append `chunk` with every `\r` removed.
fn push_without_cr(buffer: &mut String, mut chunk: &str) {
    while let Some(i) = memchr(b'\r', chunk.as_bytes()) {
        buffer.push_str(&chunk[..i]);
        chunk = &chunk[i + 1..];
    }
    buffer.push_str(chunk);
}
