//! Inline phrase parser.
//!
//! Parses one line of text into inline nodes. At each position the
//! alternatives are tried in a fixed order and the first match wins:
//!
//! 1. `**x**` / `__x__` bold, `*x*` / `_x_` italic, else a literal run
//! 2. `` `x` `` code, else a literal run
//! 3. backslash escape of `` ` `` `*` `_` `\`, else a literal backslash
//! 4. `[text](href "title")` link, else a literal run of `[`
//! 5. plain text up to the next special character
//!
//! Delimited spans close at the *first* matching delimiter after a
//! non-empty interior, and the interior is parsed with the same grammar.
//! Parsing is total: an opener that never closes degrades to
//! [`Inline::LiteralRun`].

use log::trace;
use memchr::{memchr, memchr2, memchr3};

use crate::ast::Inline;

/// Parse a phrase into inline nodes. Never fails.
pub fn parse_phrase(text: &str) -> Vec<Inline> {
    if text.is_empty() {
        return Vec::new();
    }

    PhraseParser::new(text).parse()
}

/// Recognize a line consisting solely of `![alt](src)`.
///
/// The source may contain backslash escapes and ends at an unescaped space
/// or `)`. Anything but spaces between the source and the closing paren,
/// or anything after it, rejects the line.
pub fn parse_image_line(line: &str) -> Option<Inline> {
    let rest = line.strip_prefix("![")?;
    let alt_end = memchr(b']', rest.as_bytes())?;
    let alt = &rest[..alt_end];
    let after_alt = &rest[alt_end + 1..];
    let target = after_alt.strip_prefix('(')?;

    let (src, stop) = scan_escaped(target, 0, [b' ', b')'])?;
    let tail = target[stop..].trim_start_matches(' ');
    if tail != ")" {
        return None;
    }

    Some(Inline::Image {
        alt: alt.to_string(),
        src,
    })
}

struct PhraseParser<'a> {
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
    /// A link whose label starts before this offset cannot match. Every
    /// such label ends at the same `]` as an attempt that already failed.
    links_fail_before: usize,
    /// Scans for an href or title end that start at or after these
    /// offsets run off the end of the text.
    open_href_from: usize,
    open_title_from: usize,
}

impl<'a> PhraseParser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            bytes: text.as_bytes(),
            pos: 0,
            links_fail_before: 0,
            open_href_from: usize::MAX,
            open_title_from: usize::MAX,
        }
    }

    fn parse(&mut self) -> Vec<Inline> {
        let mut inlines = Vec::with_capacity(8);

        while self.pos < self.bytes.len() {
            let inline = match self.bytes[self.pos] {
                d @ (b'*' | b'_') => self.emphasis(d),
                b'`' => self.code_span(),
                b'\\' => self.escape(),
                b'[' => self.link_or_bracket(),
                _ => self.text_run(),
            };
            inlines.push(inline);
        }

        inlines
    }

    fn emphasis(&mut self, delim: u8) -> Inline {
        let double = [delim, delim];
        if self.bytes[self.pos..].starts_with(&double) {
            if let Some(bold) = self.enclosed(&double, Inline::Bold) {
                return bold;
            }
        }
        if let Some(italic) = self.enclosed(&[delim], Inline::Italic) {
            return italic;
        }
        self.literal_run(delim)
    }

    fn code_span(&mut self) -> Inline {
        match self.enclosed(b"`", Inline::Code) {
            Some(code) => code,
            None => self.literal_run(b'`'),
        }
    }

    /// Match `delim interior delim` at the cursor, where the interior is at
    /// least one byte and the closer is the first unescaped `delim` after it.
    fn enclosed(&mut self, delim: &[u8], wrap: fn(Vec<Inline>) -> Inline) -> Option<Inline> {
        let start = self.pos + delim.len();
        let close = find_closer(self.bytes, start, delim)?;

        // Delimiters are ASCII, so `close` always lands on a char boundary.
        let interior = &self.text[start..close];
        self.pos = close + delim.len();

        Some(wrap(parse_phrase(interior)))
    }

    fn literal_run(&mut self, ch: u8) -> Inline {
        let count = self.bytes[self.pos..]
            .iter()
            .take_while(|&&b| b == ch)
            .count();
        trace!(
            "unmatched run of {} {:?} at byte {}",
            count,
            ch as char,
            self.pos
        );
        self.pos += count;
        Inline::LiteralRun {
            ch: ch as char,
            count,
        }
    }

    fn escape(&mut self) -> Inline {
        match self.bytes.get(self.pos + 1) {
            Some(&c @ (b'`' | b'*' | b'_' | b'\\')) => {
                self.pos += 2;
                Inline::Text((c as char).to_string())
            }
            // The next character is scanned normally.
            _ => {
                self.pos += 1;
                Inline::text("\\")
            }
        }
    }

    fn link_or_bracket(&mut self) -> Inline {
        match self.link() {
            Some(link) => link,
            None => self.literal_run(b'['),
        }
    }

    fn link(&mut self) -> Option<Inline> {
        let label_start = self.pos + 1;
        if label_start < self.links_fail_before {
            return None;
        }

        let Some(found) = memchr(b']', &self.bytes[label_start..]) else {
            self.links_fail_before = usize::MAX;
            return None;
        };
        let label_end = label_start + found;

        // What follows `]` alone decides the outcome, so a failure here also
        // rules out every later `[` before the same `]`.
        match self.link_target(label_end + 1) {
            Some((href, title, end)) => {
                self.pos = end;
                Some(Inline::Link {
                    text: parse_phrase(&self.text[label_start..label_end]),
                    href,
                    title,
                })
            }
            None => {
                self.links_fail_before = label_end + 1;
                None
            }
        }
    }

    /// Parse `(href "title")` at `cur`, returning the byte offset past `)`.
    fn link_target(&mut self, mut cur: usize) -> Option<(String, Option<String>, usize)> {
        if self.bytes.get(cur) != Some(&b'(') {
            return None;
        }
        cur += 1;

        if cur >= self.open_href_from {
            return None;
        }
        let Some((href, stop)) = scan_escaped(self.text, cur, [b' ', b')']) else {
            self.open_href_from = cur;
            return None;
        };
        cur = self.skip_spaces(stop);

        let mut title = None;
        if self.bytes.get(cur) == Some(&b'"') {
            cur += 1;
            if cur >= self.open_title_from {
                return None;
            }
            let Some((t, close)) = scan_escaped(self.text, cur, [b'"', b'"']) else {
                self.open_title_from = cur;
                return None;
            };
            title = Some(t);
            cur = self.skip_spaces(close + 1);
        }

        if self.bytes.get(cur) != Some(&b')') {
            return None;
        }
        Some((href, title, cur + 1))
    }

    fn skip_spaces(&self, from: usize) -> usize {
        from + self.bytes[from..]
            .iter()
            .take_while(|&&b| b == b' ')
            .count()
    }

    fn text_run(&mut self) -> Inline {
        let rest = &self.bytes[self.pos..];
        let next = match (memchr3(b'*', b'_', b'`', rest), memchr2(b'\\', b'[', rest)) {
            (Some(a), Some(b)) => a.min(b),
            (Some(a), None) | (None, Some(a)) => a,
            (None, None) => rest.len(),
        };

        let start = self.pos;
        self.pos += next;
        Inline::text(&self.text[start..self.pos])
    }
}

/// First unescaped occurrence of `delim` at or after `from + 1`, so the
/// interior before it is never empty.
fn find_closer(bytes: &[u8], from: usize, delim: &[u8]) -> Option<usize> {
    let mut cur = from;
    while cur < bytes.len() {
        let i = cur + memchr2(b'\\', delim[0], &bytes[cur..])?;
        if bytes[i] == b'\\' {
            cur = match bytes.get(i + 1) {
                Some(&(b'`' | b'*' | b'_' | b'\\')) => i + 2,
                _ => i + 1,
            };
            continue;
        }
        if i > from && bytes[i..].starts_with(delim) {
            return Some(i);
        }
        cur = i + 1;
    }
    None
}

/// Collect `text` from byte `from`, unescaping `\x` to `x`, up to the first
/// unescaped byte in `stops`.
///
/// Returns the collected text and the byte offset of the stop byte, or
/// `None` if the text ends first. Nothing is allocated on failure.
fn scan_escaped(text: &str, from: usize, stops: [u8; 2]) -> Option<(String, usize)> {
    let bytes = text.as_bytes();
    let mut cur = from;
    let stop = loop {
        let i = cur + memchr3(b'\\', stops[0], stops[1], &bytes[cur..])?;
        if bytes[i] != b'\\' {
            break i;
        }
        if i + 1 >= bytes.len() {
            return None;
        }
        cur = i + 2;
    };

    let mut out = String::with_capacity(stop - from);
    let mut chars = text[from..stop].chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.extend(chars.next()),
            _ => out.push(c),
        }
    }
    Some((out, stop))
}
