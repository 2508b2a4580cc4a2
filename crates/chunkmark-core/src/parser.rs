//! Public entry point: settings plus a sanitizer, applied to a stream of
//! input fragments.

use crate::ast::Document;
use crate::block::BlockParser;
use crate::error::ParseError;
use crate::feeder::ChunkFeeder;
use crate::sanitize::{AmmoniaSanitizer, Sanitizer};

/// Parser configuration.
///
/// Passed by value into every recursive parse, so nested content always
/// sees the same policy as the document that contains it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    /// Run raw HTML blocks through the sanitizer. Defaults to `true`.
    pub xss_protect_raw_html: bool,
}

impl Settings {
    pub const fn new() -> Self {
        Self {
            xss_protect_raw_html: true,
        }
    }

    /// Enable or disable raw HTML sanitization.
    pub const fn with_xss_protection(mut self, enabled: bool) -> Self {
        self.xss_protect_raw_html = enabled;
        self
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::new()
    }
}

/// Markdown parser with fixed settings and a raw HTML sanitizer.
///
/// A `Parser` holds no per-document state; one value can parse any number
/// of documents, one call per document.
#[derive(Debug, Clone)]
pub struct Parser<S = AmmoniaSanitizer> {
    settings: Settings,
    sanitizer: S,
}

impl Parser {
    /// Create a parser using the default `ammonia` sanitizer.
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            sanitizer: AmmoniaSanitizer,
        }
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl<S: Sanitizer> Parser<S> {
    /// Create a parser with a custom sanitizer.
    pub fn with_sanitizer(settings: Settings, sanitizer: S) -> Self {
        Self {
            settings,
            sanitizer,
        }
    }

    pub fn settings(&self) -> Settings {
        self.settings
    }

    /// Parse a document delivered as an ordered sequence of fragments.
    ///
    /// Fragment boundaries may fall anywhere, including inside a token.
    pub fn parse<I>(&self, chunks: I) -> Result<Document, ParseError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut feeder = ChunkFeeder::new(chunks);
        self.parse_feeder(&mut feeder)
    }

    /// Parse a document held in one string.
    pub fn parse_str(&self, input: &str) -> Result<Document, ParseError> {
        self.parse(std::iter::once(input))
    }

    /// Parse the remainder of an existing feeder.
    pub fn parse_feeder<I>(&self, feeder: &mut ChunkFeeder<I>) -> Result<Document, ParseError>
    where
        I: Iterator,
        I::Item: AsRef<str>,
    {
        self.block_parser().parse_document(feeder)
    }

    /// Parse and serialize in one step.
    pub fn to_html<I>(&self, chunks: I) -> Result<String, ParseError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        self.parse(chunks).map(|doc| doc.to_html())
    }

    fn block_parser(&self) -> BlockParser<'_> {
        BlockParser::new(self.settings, &self.sanitizer)
    }
}
