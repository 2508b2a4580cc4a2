//! # Chunkmark Core
//!
//! A small markdown-to-HTML renderer that accepts its input in arbitrary
//! pieces and sanitizes raw HTML by default.
//!
//! ## Quick Start
//!
//! ```rust
//! use chunkmark_core::{Parser, Settings};
//!
//! let parser = Parser::new(Settings::default());
//! let doc = parser.parse_str("# Hello\n\nSome **bold** text.").unwrap();
//!
//! assert_eq!(
//!     doc.to_html(),
//!     "<h1>Hello</h1>\n<p>Some <strong>bold</strong> text.</p>"
//! );
//! ```
//!
//! ## Chunked Input
//!
//! Fragments can split the document anywhere, even inside a token:
//!
//! ```rust
//! use chunkmark_core::{to_html, Settings};
//!
//! let chunks = ["> quo", "ted *emph", "asis*\r\n"];
//! let html = to_html(chunks, Settings::default()).unwrap();
//! assert_eq!(html, "<blockquote>\n<p>quoted <em>emphasis</em></p>\n</blockquote>");
//! ```
//!
//! ## Raw HTML
//!
//! Lines starting with `<` are passed through as raw HTML. With
//! `xss_protect_raw_html` on (the default) they are cleaned first:
//!
//! ```rust
//! use chunkmark_core::{to_html, Settings};
//!
//! let safe = to_html(["<script>alert(1)</script>"], Settings::default()).unwrap();
//! assert!(!safe.contains("<script>"));
//!
//! let trusted = Settings::default().with_xss_protection(false);
//! let raw = to_html(["<script>alert(1)</script>"], trusted).unwrap();
//! assert_eq!(raw, "<script>alert(1)</script>");
//! ```

pub mod ast;
pub mod block;
pub mod error;
pub mod feeder;
pub mod html;
pub mod inline;
pub mod parser;
pub mod sanitize;
pub mod span;

pub use ast::{Block, Document, DocumentStats, Inline};
pub use error::{ParseError, ParseErrorKind};
pub use feeder::ChunkFeeder;
pub use parser::{Parser, Settings};
pub use sanitize::{AmmoniaSanitizer, PassThrough, Sanitizer};

/// Parse `chunks` with the default sanitizer and serialize the result.
pub fn to_html<I>(chunks: I, settings: Settings) -> Result<String, ParseError>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    Parser::new(settings).to_html(chunks)
}
