//! HTML serialization.
//!
//! [`HtmlWriter`] is a minimal element builder: a tag name, attributes and
//! children go in, well-formed markup comes out. Text and attribute values
//! are always escaped; [`HtmlWriter::raw`] is the only way to emit markup
//! verbatim and is used solely for raw HTML blocks, which the parser has
//! already sanitized when asked to.

use crate::ast::{Block, Document, Inline};

/// Accumulates serialized markup.
#[derive(Debug, Default)]
pub struct HtmlWriter {
    out: String,
}

impl HtmlWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit `<tag attrs>children</tag>`.
    pub fn element(
        &mut self,
        tag: &str,
        attrs: &[(&str, &str)],
        children: impl FnOnce(&mut Self),
    ) {
        self.open_tag(tag, attrs);
        self.out.push('>');
        children(self);
        self.out.push_str("</");
        self.out.push_str(tag);
        self.out.push('>');
    }

    /// Emit a self-closing `<tag attrs />`.
    pub fn void_element(&mut self, tag: &str, attrs: &[(&str, &str)]) {
        self.open_tag(tag, attrs);
        self.out.push_str(" />");
    }

    /// Emit escaped text.
    pub fn text(&mut self, text: &str) {
        html_escape::encode_text_to_string(text, &mut self.out);
    }

    /// Emit markup verbatim.
    pub fn raw(&mut self, markup: &str) {
        self.out.push_str(markup);
    }

    pub fn newline(&mut self) {
        self.out.push('\n');
    }

    pub fn finish(self) -> String {
        self.out
    }

    fn open_tag(&mut self, tag: &str, attrs: &[(&str, &str)]) {
        self.out.push('<');
        self.out.push_str(tag);
        for (name, value) in attrs {
            self.out.push(' ');
            self.out.push_str(name);
            self.out.push_str("=\"");
            html_escape::encode_double_quoted_attribute_to_string(value, &mut self.out);
            self.out.push('"');
        }
    }
}

impl Document {
    /// Serialize the document as an HTML fragment.
    pub fn to_html(&self) -> String {
        let mut w = HtmlWriter::new();
        write_document(&mut w, self);
        w.finish()
    }
}

/// Blocks are separated by a newline; [`Block::Empty`] contributes nothing.
pub fn write_document(w: &mut HtmlWriter, doc: &Document) {
    for (i, block) in doc.content_blocks().enumerate() {
        if i > 0 {
            w.newline();
        }
        write_block(w, block);
    }
}

pub fn write_block(w: &mut HtmlWriter, block: &Block) {
    match block {
        Block::Heading { level, content } => {
            let tag = HEADING_TAGS[usize::from((*level).clamp(1, 6) - 1)];
            w.element(tag, &[], |w| write_inlines(w, content));
        }
        Block::Rule => w.void_element("hr", &[]),
        Block::Paragraph { lines } => w.element("p", &[], |w| {
            for (i, line) in lines.iter().enumerate() {
                if i > 0 {
                    w.void_element("br", &[]);
                }
                write_inlines(w, line);
            }
        }),
        Block::CodeBlock { lines } => w.element("pre", &[], |w| {
            w.element("code", &[], |w| w.text(&lines.join("\n")))
        }),
        Block::BlockQuote { document } => w.element("blockquote", &[], |w| {
            w.newline();
            write_document(w, document);
            w.newline();
        }),
        Block::BulletList { items } => write_list(w, "ul", items),
        Block::NumberList { items } => write_list(w, "ol", items),
        Block::RawHtml { content } => w.raw(content),
        Block::Empty => {}
    }
}

const HEADING_TAGS: [&str; 6] = ["h1", "h2", "h3", "h4", "h5", "h6"];

fn write_list(w: &mut HtmlWriter, tag: &str, items: &[Vec<Inline>]) {
    w.element(tag, &[], |w| {
        for item in items {
            w.element("li", &[], |w| write_inlines(w, item));
        }
    });
}

pub fn write_inlines(w: &mut HtmlWriter, inlines: &[Inline]) {
    for inline in inlines {
        write_inline(w, inline);
    }
}

fn write_inline(w: &mut HtmlWriter, inline: &Inline) {
    match inline {
        Inline::Text(text) => w.text(text),
        Inline::Bold(children) => w.element("strong", &[], |w| write_inlines(w, children)),
        Inline::Italic(children) => w.element("em", &[], |w| write_inlines(w, children)),
        Inline::Code(children) => w.element("code", &[], |w| write_inlines(w, children)),
        Inline::Link { text, href, title } => {
            let mut attrs = vec![("href", href.as_str())];
            if let Some(title) = title {
                attrs.push(("title", title.as_str()));
            }
            w.element("a", &attrs, |w| write_inlines(w, text));
        }
        Inline::Image { alt, src } => {
            w.void_element("img", &[("src", src.as_str()), ("alt", alt.as_str())])
        }
        Inline::LiteralRun { ch, count } => {
            let run: String = std::iter::repeat(*ch).take(*count).collect();
            w.text(&run);
        }
    }
}
