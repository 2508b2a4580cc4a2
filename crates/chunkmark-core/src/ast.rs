//! Document tree produced by the parser.
//!
//! All nodes are owned values built bottom-up during a single parse and
//! never mutated afterwards. Block order is input order.

/// A parsed document: an ordered sequence of blocks.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    /// Blocks in input order, including [`Block::Empty`] placeholders.
    pub blocks: Vec<Block>,
}

impl Document {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }

    /// Blocks that produce output, skipping [`Block::Empty`].
    pub fn content_blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter().filter(|b| !matches!(b, Block::Empty))
    }

    /// True if no block produces output.
    pub fn is_blank(&self) -> bool {
        self.content_blocks().next().is_none()
    }

    /// Count block kinds, descending into block quotes.
    pub fn stats(&self) -> DocumentStats {
        let mut stats = DocumentStats::default();
        stats.count(&self.blocks);
        stats
    }
}

/// Block-level nodes.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// ATX or setext heading.
    Heading {
        /// Heading level, always in `1..=6`.
        level: u8,
        content: Vec<Inline>,
    },
    /// Horizontal rule.
    Rule,
    /// Consecutive non-blank lines, each parsed independently and joined
    /// by line breaks when rendered.
    Paragraph { lines: Vec<Vec<Inline>> },
    /// Indented code, verbatim.
    CodeBlock { lines: Vec<String> },
    /// Quoted content, parsed as a complete nested document.
    BlockQuote { document: Document },
    /// `*`, `-` or `+` items, one physical line each.
    BulletList { items: Vec<Vec<Inline>> },
    /// `1.` or `1)` items, one physical line each.
    NumberList { items: Vec<Vec<Inline>> },
    /// Raw HTML, already sanitized if the settings asked for it.
    RawHtml { content: String },
    /// Produces no output.
    Empty,
}

/// Inline-level nodes.
#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    /// Literal text.
    Text(String),
    /// `**strong**` or `__strong__`.
    Bold(Vec<Inline>),
    /// `*emphasis*` or `_emphasis_`.
    Italic(Vec<Inline>),
    /// `` `code` ``. The interior is phrase-parsed like any other span.
    Code(Vec<Inline>),
    /// `[text](href "title")`.
    Link {
        text: Vec<Inline>,
        href: String,
        title: Option<String>,
    },
    /// `![alt](src)`, only produced for image-only lines.
    Image { alt: String, src: String },
    /// A run of delimiter characters that opened nothing.
    LiteralRun { ch: char, count: usize },
}

impl Inline {
    /// Convenience constructor for text nodes.
    pub fn text(s: impl Into<String>) -> Self {
        Inline::Text(s.into())
    }
}

/// Block counts for a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DocumentStats {
    pub headings: usize,
    pub paragraphs: usize,
    pub code_blocks: usize,
    pub quotes: usize,
    pub bullet_lists: usize,
    pub number_lists: usize,
    pub list_items: usize,
    pub rules: usize,
    pub raw_html: usize,
    /// Deepest block quote nesting seen; 0 for none.
    pub max_quote_depth: usize,
}

impl DocumentStats {
    fn count(&mut self, blocks: &[Block]) {
        self.count_at(blocks, 0);
    }

    fn count_at(&mut self, blocks: &[Block], depth: usize) {
        for block in blocks {
            match block {
                Block::Heading { .. } => self.headings += 1,
                Block::Rule => self.rules += 1,
                Block::Paragraph { .. } => self.paragraphs += 1,
                Block::CodeBlock { .. } => self.code_blocks += 1,
                Block::BlockQuote { document } => {
                    self.quotes += 1;
                    self.max_quote_depth = self.max_quote_depth.max(depth + 1);
                    self.count_at(&document.blocks, depth + 1);
                }
                Block::BulletList { items } => {
                    self.bullet_lists += 1;
                    self.list_items += items.len();
                }
                Block::NumberList { items } => {
                    self.number_lists += 1;
                    self.list_items += items.len();
                }
                Block::RawHtml { .. } => self.raw_html += 1,
                Block::Empty => {}
            }
        }
    }

    /// Total number of blocks counted.
    pub fn total(&self) -> usize {
        self.headings
            + self.paragraphs
            + self.code_blocks
            + self.quotes
            + self.bullet_lists
            + self.number_lists
            + self.rules
            + self.raw_html
    }
}
