//! Block grammar and document assembly.
//!
//! A block is recognized by trying each rule below in order against the
//! current position of the stream. The first rule that matches wins; a
//! rule that fails is rewound to its checkpoint, so no alternative ever
//! consumes input it does not keep.
//!
//! | # | rule            | recognizes                                        |
//! |---|-----------------|---------------------------------------------------|
//! | 1 | raw html        | line starting with `<`, up to a blank line        |
//! | 2 | rule            | `***`, `* * *`, `*****`, `- - -`, or 5+ dashes    |
//! | 3 | atx heading     | `#`..`######` prefix                              |
//! | 4 | setext heading  | text line over `==` or `--`                       |
//! | 5 | code block      | lines indented by four spaces                     |
//! | 6 | block quote     | lines prefixed by `> ` or exactly `>`             |
//! | 7 | image           | a line that is only `![alt](src)`                 |
//! | 8 | bullet list     | lines starting with `* `, `- ` or `+ `            |
//! | 9 | numbered list   | lines starting with `1. ` or `1) `                |
//! | 10| paragraph       | anything else, up to a blank line                 |
//!
//! The paragraph rule accepts any remaining input, so the grammar only
//! runs out of alternatives at end of stream.
//!
//! Block quotes strip their prefix and feed the remainder to a fresh
//! [`BlockParser::parse_document`] call with the same settings. Nesting
//! depth is bounded only by the call stack.

use log::{debug, trace};

use crate::ast::{Block, Document, Inline};
use crate::error::ParseError;
use crate::feeder::ChunkFeeder;
use crate::inline::{parse_image_line, parse_phrase};
use crate::parser::Settings;
use crate::sanitize::Sanitizer;
use crate::span::Span;

type Attempt = Result<Option<Block>, ParseError>;

/// Parses blocks from a [`ChunkFeeder`] under fixed settings.
///
/// The settings and sanitizer are immutable for the lifetime of the
/// parser, and nested block quotes are parsed by the same value, so a
/// quote can never weaken the raw HTML policy of its parent.
#[derive(Clone, Copy)]
pub struct BlockParser<'s> {
    settings: Settings,
    sanitizer: &'s dyn Sanitizer,
}

impl<'s> BlockParser<'s> {
    pub fn new(settings: Settings, sanitizer: &'s dyn Sanitizer) -> Self {
        Self {
            settings,
            sanitizer,
        }
    }

    /// Parse blocks until the stream is exhausted.
    ///
    /// Every block produced is kept, including [`Block::Empty`].
    pub fn parse_document<I>(&self, feeder: &mut ChunkFeeder<I>) -> Result<Document, ParseError>
    where
        I: Iterator,
        I::Item: AsRef<str>,
    {
        let mut blocks = Vec::with_capacity(16);

        while !feeder.at_end() {
            let start = feeder.checkpoint();
            let Some(block) = self.parse_block(feeder)? else {
                let line = feeder.peek_line().unwrap_or_default().to_owned();
                let span = Span::from_offsets(start.position(), start.position() + line.len());
                return Err(ParseError::grammar_gap(&line, span));
            };
            if feeder.checkpoint() == start {
                return Err(ParseError::stalled(block_kind(&block), start.offset()));
            }
            blocks.push(block);
        }

        debug!("document complete with {} blocks", blocks.len());
        Ok(Document::new(blocks))
    }

    /// Parse one block at the current position.
    ///
    /// Returns `Ok(None)` only when no rule matches, which happens at end
    /// of stream.
    pub fn parse_block<I>(&self, feeder: &mut ChunkFeeder<I>) -> Attempt
    where
        I: Iterator,
        I::Item: AsRef<str>,
    {
        if feeder.at_end() {
            return Ok(None);
        }
        BlockRules {
            parser: self,
            feeder,
        }
        .dispatch()
    }
}

/// One block-parsing attempt over a borrowed feeder.
struct BlockRules<'a, 's, I: Iterator> {
    parser: &'a BlockParser<'s>,
    feeder: &'a mut ChunkFeeder<I>,
}

impl<I> BlockRules<'_, '_, I>
where
    I: Iterator,
    I::Item: AsRef<str>,
{
    fn dispatch(&mut self) -> Attempt {
        let rules: [(&str, fn(&mut Self) -> Attempt); 10] = [
            ("raw html", Self::raw_html),
            ("rule", Self::rule),
            ("atx heading", Self::atx_heading),
            ("setext heading", Self::setext_heading),
            ("code block", Self::code_block),
            ("block quote", Self::block_quote),
            ("image", Self::image),
            ("bullet list", Self::bullet_list),
            ("numbered list", Self::number_list),
            ("paragraph", Self::paragraph),
        ];

        for (name, rule) in rules {
            let mark = self.feeder.checkpoint();
            match rule(self)? {
                Some(block) => {
                    debug!("{} at byte {}", name, mark.offset());
                    return Ok(Some(block));
                }
                None => {
                    self.feeder.restore(mark);
                    trace!("{} rejected at byte {}", name, self.feeder.offset());
                }
            }
        }

        Ok(None)
    }

    fn raw_html(&mut self) -> Attempt {
        if !self.feeder.starts_with("<") {
            return Ok(None);
        }

        let lines = self.collect_lines(|line| (!is_blank(line)).then(|| line.to_owned()));
        self.feeder.skip_line();

        let raw = lines.join("\n");
        let content = if self.parser.settings.xss_protect_raw_html {
            self.parser.sanitizer.sanitize(&raw)
        } else {
            raw
        };
        Ok(Some(Block::RawHtml { content }))
    }

    fn rule(&mut self) -> Attempt {
        if !self.feeder.peek_line().is_some_and(is_rule) {
            return Ok(None);
        }
        self.feeder.skip_line();
        Ok(Some(Block::Rule))
    }

    fn atx_heading(&mut self) -> Attempt {
        let heading = match self.feeder.peek_line() {
            Some(line) if line.starts_with('#') => {
                let hashes = line.bytes().take_while(|&b| b == b'#').count();
                let text = line[hashes..]
                    .trim_start_matches(' ')
                    .trim_end()
                    .trim_end_matches('#')
                    .trim_end();
                Block::Heading {
                    level: hashes.min(6) as u8,
                    content: parse_phrase(text),
                }
            }
            _ => return Ok(None),
        };

        self.feeder.skip_line();
        Ok(Some(heading))
    }

    fn setext_heading(&mut self) -> Attempt {
        let Some(text) = self.feeder.next_line() else {
            return Ok(None);
        };
        if is_blank(&text) {
            return Ok(None);
        }

        let Some(level) = self.feeder.peek_line().and_then(underline_level) else {
            return Ok(None);
        };

        self.feeder.skip_line();
        Ok(Some(Block::Heading {
            level,
            content: parse_phrase(text.trim()),
        }))
    }

    fn code_block(&mut self) -> Attempt {
        let opens = self
            .feeder
            .peek_line()
            .is_some_and(|line| line.starts_with("    ") && !is_blank(line));
        if !opens {
            return Ok(None);
        }

        let lines = self.collect_lines(|line| line.strip_prefix("    ").map(str::to_owned));
        Ok(Some(Block::CodeBlock { lines }))
    }

    fn block_quote(&mut self) -> Attempt {
        let lines = self.collect_lines(|line| strip_quote(line).map(str::to_owned));
        if lines.is_empty() {
            return Ok(None);
        }

        let mut inner = ChunkFeeder::new(std::iter::once(lines.join("\n")));
        let document = self.parser.parse_document(&mut inner)?;
        Ok(Some(Block::BlockQuote { document }))
    }

    fn image(&mut self) -> Attempt {
        let Some(image) = self.feeder.peek_line().and_then(parse_image_line) else {
            return Ok(None);
        };

        self.feeder.skip_line();
        Ok(Some(Block::Paragraph {
            lines: vec![vec![image]],
        }))
    }

    fn bullet_list(&mut self) -> Attempt {
        let items = self.collect_items(strip_bullet);
        Ok((!items.is_empty()).then_some(Block::BulletList { items }))
    }

    fn number_list(&mut self) -> Attempt {
        let items = self.collect_items(strip_number);
        Ok((!items.is_empty()).then_some(Block::NumberList { items }))
    }

    fn paragraph(&mut self) -> Attempt {
        let lines = self.collect_lines(|line| (!is_blank(line)).then(|| parse_phrase(line)));
        self.feeder.skip_line();

        if lines.is_empty() {
            return Ok(Some(Block::Empty));
        }
        Ok(Some(Block::Paragraph { lines }))
    }

    /// One item per consecutive line accepted by `marker`, which returns
    /// the text after the list marker.
    fn collect_items(&mut self, marker: fn(&str) -> Option<&str>) -> Vec<Vec<Inline>> {
        self.collect_lines(|line| marker(line).map(parse_phrase))
    }

    /// Consume lines while `accept` maps them to a value.
    fn collect_lines<T>(&mut self, mut accept: impl FnMut(&str) -> Option<T>) -> Vec<T> {
        let mut out = Vec::new();
        while let Some(line) = self.feeder.peek_line() {
            match accept(line) {
                Some(item) => out.push(item),
                None => break,
            }
            self.feeder.skip_line();
        }
        out
    }
}

#[inline]
fn is_blank(line: &str) -> bool {
    line.bytes().all(|b| b == b' ' || b == b'\t')
}

fn is_rule(line: &str) -> bool {
    matches!(line, "* * *" | "***" | "*****" | "- - -")
        || (line.len() >= 5 && line.bytes().all(|b| b == b'-'))
}

fn underline_level(line: &str) -> Option<u8> {
    let first = *line.as_bytes().first()?;
    let level = match first {
        b'=' => 1,
        b'-' => 2,
        _ => return None,
    };
    (line.len() >= 2 && line.bytes().all(|b| b == first)).then_some(level)
}

fn strip_quote(line: &str) -> Option<&str> {
    if line == ">" {
        return Some("");
    }
    line.strip_prefix("> ")
}

fn strip_bullet(line: &str) -> Option<&str> {
    ["* ", "- ", "+ "]
        .iter()
        .find_map(|marker| line.strip_prefix(marker))
}

fn strip_number(line: &str) -> Option<&str> {
    let digits = line.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let rest = &line[digits..];
    rest.strip_prefix(". ")
        .or_else(|| rest.strip_prefix(") "))
}

fn block_kind(block: &Block) -> &'static str {
    match block {
        Block::Heading { .. } => "heading",
        Block::Rule => "rule",
        Block::Paragraph { .. } => "paragraph",
        Block::CodeBlock { .. } => "code block",
        Block::BlockQuote { .. } => "block quote",
        Block::BulletList { .. } => "bullet list",
        Block::NumberList { .. } => "numbered list",
        Block::RawHtml { .. } => "raw html",
        Block::Empty => "empty",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sanitize::PassThrough;

    fn parse(input: &str) -> Vec<Block> {
        let parser = BlockParser::new(Settings::default(), &PassThrough);
        parser
            .parse_document(&mut ChunkFeeder::from_text(input))
            .map(|doc| doc.blocks)
            .unwrap_or_else(|e| panic!("parse failed: {e}"))
    }

    fn t(s: &str) -> Inline {
        Inline::text(s)
    }

    #[test]
    fn rule_patterns() {
        for line in ["***", "* * *", "*****", "- - -", "-----", "----------"] {
            assert_eq!(parse(line), vec![Block::Rule], "{line:?}");
        }
    }

    #[test]
    fn four_dashes_are_not_a_rule() {
        assert_eq!(
            parse("----"),
            vec![Block::Paragraph {
                lines: vec![vec![t("----")]]
            }]
        );
    }

    #[test]
    fn atx_levels() {
        for (hashes, level) in [(1, 1), (2, 2), (3, 3), (4, 4), (5, 5), (6, 6), (7, 6), (9, 6)] {
            let input = format!("{} Title", "#".repeat(hashes));
            assert_eq!(
                parse(&input),
                vec![Block::Heading {
                    level,
                    content: vec![t("Title")]
                }],
                "{input:?}"
            );
        }
    }

    #[test]
    fn atx_strips_closing_hashes() {
        assert_eq!(
            parse("## Title ##   \n"),
            vec![Block::Heading {
                level: 2,
                content: vec![t("Title")]
            }]
        );
    }

    #[test]
    fn atx_space_is_optional() {
        assert_eq!(
            parse("#Title"),
            vec![Block::Heading {
                level: 1,
                content: vec![t("Title")]
            }]
        );
    }

    #[test]
    fn setext_headings() {
        assert_eq!(
            parse("Title\n=====\nSub\n--\n"),
            vec![
                Block::Heading {
                    level: 1,
                    content: vec![t("Title")]
                },
                Block::Heading {
                    level: 2,
                    content: vec![t("Sub")]
                },
            ]
        );
    }

    #[test]
    fn setext_needs_two_underline_chars() {
        assert_eq!(
            parse("Title\n=\n"),
            vec![Block::Paragraph {
                lines: vec![vec![t("Title")], vec![t("=")]]
            }]
        );
    }

    #[test]
    fn code_block_is_verbatim() {
        assert_eq!(
            parse("    let x = *y*;\n      indented\nafter"),
            vec![
                Block::CodeBlock {
                    lines: vec!["let x = *y*;".into(), "  indented".into()]
                },
                Block::Paragraph {
                    lines: vec![vec![t("after")]]
                },
            ]
        );
    }

    #[test]
    fn block_quote_recurses() {
        assert_eq!(
            parse("> # Title\n> text\n"),
            vec![Block::BlockQuote {
                document: Document::new(vec![
                    Block::Heading {
                        level: 1,
                        content: vec![t("Title")]
                    },
                    Block::Paragraph {
                        lines: vec![vec![t("text")]]
                    },
                ])
            }]
        );
    }

    #[test]
    fn nested_block_quotes() {
        let blocks = parse("> > deep\n>\n> shallow");
        let Block::BlockQuote { document } = &blocks[0] else {
            panic!("expected quote, got {blocks:?}");
        };
        assert_eq!(
            document.blocks,
            vec![
                Block::BlockQuote {
                    document: Document::new(vec![Block::Paragraph {
                        lines: vec![vec![t("deep")]]
                    }])
                },
                Block::Empty,
                Block::Paragraph {
                    lines: vec![vec![t("shallow")]]
                },
            ]
        );
    }

    #[test]
    fn image_line_is_its_own_block() {
        assert_eq!(
            parse("![alt](a.png)\ntext"),
            vec![
                Block::Paragraph {
                    lines: vec![vec![Inline::Image {
                        alt: "alt".into(),
                        src: "a.png".into()
                    }]]
                },
                Block::Paragraph {
                    lines: vec![vec![t("text")]]
                },
            ]
        );
    }

    #[test]
    fn bullet_list_items_are_isolated() {
        assert_eq!(
            parse("* a\n* b\n"),
            vec![Block::BulletList {
                items: vec![vec![t("a")], vec![t("b")]]
            }]
        );
        assert_eq!(
            parse("- *x\n+ y*"),
            vec![Block::BulletList {
                items: vec![
                    vec![Inline::LiteralRun { ch: '*', count: 1 }, t("x")],
                    vec![t("y"), Inline::LiteralRun { ch: '*', count: 1 }],
                ]
            }]
        );
    }

    #[test]
    fn numbered_list() {
        assert_eq!(
            parse("1. one\n22) two\n3.three"),
            vec![
                Block::NumberList {
                    items: vec![vec![t("one")], vec![t("two")]]
                },
                Block::Paragraph {
                    lines: vec![vec![t("3.three")]]
                },
            ]
        );
    }

    #[test]
    fn raw_html_until_blank_line() {
        assert_eq!(
            parse("<div>\n*not parsed*\n</div>\n\npara"),
            vec![
                Block::RawHtml {
                    content: "<div>\n*not parsed*\n</div>".into()
                },
                Block::Paragraph {
                    lines: vec![vec![t("para")]]
                },
            ]
        );
    }

    #[test]
    fn raw_html_is_sanitized_when_enabled() {
        let scrub = |s: &str| s.replace("<script>", "");
        let parser = BlockParser::new(Settings::default(), &scrub);
        let doc = parser
            .parse_document(&mut ChunkFeeder::from_text("<script>x"))
            .unwrap();
        assert_eq!(
            doc.blocks,
            vec![Block::RawHtml {
                content: "x".into()
            }]
        );
    }

    #[test]
    fn raw_html_untouched_when_disabled() {
        let scrub = |_: &str| String::from("scrubbed");
        let settings = Settings::default().with_xss_protection(false);
        let parser = BlockParser::new(settings, &scrub);
        let doc = parser
            .parse_document(&mut ChunkFeeder::from_text("<i>x</i>"))
            .unwrap();
        assert_eq!(
            doc.blocks,
            vec![Block::RawHtml {
                content: "<i>x</i>".into()
            }]
        );
    }

    #[test]
    fn quoted_raw_html_keeps_parent_policy() {
        let scrub = |_: &str| String::from("scrubbed");
        let parser = BlockParser::new(Settings::default(), &scrub);
        let doc = parser
            .parse_document(&mut ChunkFeeder::from_text("> > <b>x</b>"))
            .unwrap();
        let Block::BlockQuote { document } = &doc.blocks[0] else {
            panic!("expected quote");
        };
        let Block::BlockQuote { document } = &document.blocks[0] else {
            panic!("expected nested quote");
        };
        assert_eq!(
            document.blocks,
            vec![Block::RawHtml {
                content: "scrubbed".into()
            }]
        );
    }

    #[test]
    fn paragraph_lines_are_parsed_separately() {
        assert_eq!(
            parse("a *b\nc* d"),
            vec![Block::Paragraph {
                lines: vec![
                    vec![t("a "), Inline::LiteralRun { ch: '*', count: 1 }, t("b")],
                    vec![t("c"), Inline::LiteralRun { ch: '*', count: 1 }, t(" d")],
                ]
            }]
        );
    }

    #[test]
    fn blank_lines_become_empty_blocks() {
        let blocks = parse("\n\n  \n");
        assert!(blocks.iter().all(|b| *b == Block::Empty), "{blocks:?}");
        assert!(parse("").is_empty());
    }

    #[test]
    fn paragraph_consumes_its_blank_line() {
        assert_eq!(
            parse("one\n\ntwo"),
            vec![
                Block::Paragraph {
                    lines: vec![vec![t("one")]]
                },
                Block::Paragraph {
                    lines: vec![vec![t("two")]]
                },
            ]
        );
    }

    #[test]
    fn heading_followed_by_blank_line() {
        assert_eq!(
            parse("# A\n\nbody"),
            vec![
                Block::Heading {
                    level: 1,
                    content: vec![t("A")]
                },
                Block::Empty,
                Block::Paragraph {
                    lines: vec![vec![t("body")]]
                },
            ]
        );
    }

    #[test]
    fn chunk_boundaries_are_invisible() {
        let parser = BlockParser::new(Settings::default(), &PassThrough);
        let input = "# Ti\ntle\n> quo\nted\n\n* a\n* b";
        let whole = parser
            .parse_document(&mut ChunkFeeder::from_text(input))
            .unwrap();
        for size in 1..input.len() {
            let pieces: Vec<&str> = input
                .as_bytes()
                .chunks(size)
                .map(|c| std::str::from_utf8(c).unwrap())
                .collect();
            let chunked = parser
                .parse_document(&mut ChunkFeeder::new(pieces))
                .unwrap();
            assert_eq!(chunked, whole, "chunk size {size}");
        }
    }
}
