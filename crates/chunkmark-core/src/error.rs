use crate::span::Span;
use std::fmt;

/// Categories of parse failure.
///
/// The grammar is total: every inline alternative degrades to literal
/// text and the paragraph rule accepts any remaining line. Both kinds
/// therefore mark an invariant violation in the grammar itself rather
/// than malformed input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// No block alternative matched while input remained.
    GrammarGap,
    /// A block alternative succeeded without consuming any input.
    Stalled,
}

/// A parse failure with its location in the logical input stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// Human-readable error message
    pub message: String,
    /// Where the parser was positioned when it gave up
    pub span: Option<Span>,
    pub kind: ParseErrorKind,
}

impl ParseError {
    /// Create a new parse error.
    pub fn new(kind: ParseErrorKind, message: impl Into<String>, span: Option<Span>) -> Self {
        Self {
            message: message.into(),
            span,
            kind,
        }
    }

    /// No alternative of the block grammar accepted the input at `span`.
    pub fn grammar_gap(line: &str, span: Span) -> Self {
        Self::new(
            ParseErrorKind::GrammarGap,
            format!("no block rule matched line {:?}", line),
            Some(span),
        )
    }

    /// A block rule returned without advancing past `offset`.
    pub fn stalled(rule: &str, offset: u32) -> Self {
        Self::new(
            ParseErrorKind::Stalled,
            format!("{} rule made no progress", rule),
            Some(Span::at(offset)),
        )
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        match self.span {
            Some(span) if span.is_empty() => write!(f, " at byte {}", span.start)?,
            Some(span) => write!(f, " at bytes {}..{}", span.start, span.end)?,
            None => {}
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}
