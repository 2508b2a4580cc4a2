//! Chunkmark CLI - Render markdown documents to HTML
//!
//! Usage:
//!   chunkmark [OPTIONS] [COMMAND] <FILE|->
//!
//! Commands:
//!   html      Render the document as HTML (default)
//!   ast       Dump the parsed document as JSON
//!   stats     Show document statistics

use std::env;
use std::fs;
use std::io::{self, Read};
use std::process;

use chunkmark_core::{Block, Document, Inline, Parser, Settings};
use log::{debug, LevelFilter};
use serde::Serialize;

fn main() {
    let args: Vec<String> = env::args().collect();

    match run(&args) {
        Ok(()) => {}
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    }
}

fn run(args: &[String]) -> Result<(), String> {
    let config = parse_args(args)?;
    init_logging(config.verbose);

    let input = read_input(&config.file)?;
    let chunks = split_chunks(&input, config.chunk_size);
    debug!(
        "read {} bytes from {} as {} chunk(s)",
        input.len(),
        config.file,
        chunks.len()
    );

    let parser = Parser::new(Settings::default().with_xss_protection(!config.unsafe_html));
    debug!(
        "raw html sanitizing {}",
        if parser.settings().xss_protect_raw_html {
            "on"
        } else {
            "off"
        }
    );
    let doc = parser
        .parse(chunks)
        .map_err(|e| format!("failed to parse '{}': {}", config.file, e))?;

    match config.command {
        Command::Html => cmd_html(&doc),
        Command::Ast => cmd_ast(&doc),
        Command::Stats => cmd_stats(&doc, &input),
    }
}

#[derive(Debug, PartialEq)]
struct Config {
    command: Command,
    file: String,
    unsafe_html: bool,
    chunk_size: Option<usize>,
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Command {
    Html,
    Ast,
    Stats,
}

fn parse_args(args: &[String]) -> Result<Config, String> {
    let mut command = Command::Html;
    let mut unsafe_html = false;
    let mut chunk_size = None;
    let mut verbose = false;
    let mut file = None;

    let mut i = 1;
    while i < args.len() {
        let arg = &args[i];
        match arg.as_str() {
            "-h" | "--help" => {
                print_help();
                process::exit(0);
            }
            "-V" | "--version" => {
                println!("chunkmark {}", env!("CARGO_PKG_VERSION"));
                process::exit(0);
            }
            "-v" | "--verbose" => verbose = true,
            "--unsafe-html" => unsafe_html = true,
            "--chunk-size" => {
                i += 1;
                let value = args
                    .get(i)
                    .ok_or_else(|| "--chunk-size requires a value".to_string())?;
                chunk_size = Some(parse_chunk_size(value)?);
            }
            "html" => command = Command::Html,
            "ast" => command = Command::Ast,
            "stats" => command = Command::Stats,
            "-" => file = Some(set_file(file, arg)?),
            _ if arg.starts_with('-') => {
                return Err(format!("unknown option: {}", arg));
            }
            _ => file = Some(set_file(file, arg)?),
        }
        i += 1;
    }

    let file = file.ok_or_else(|| "no input file specified".to_string())?;

    Ok(Config {
        command,
        file,
        unsafe_html,
        chunk_size,
        verbose,
    })
}

fn set_file(current: Option<String>, arg: &str) -> Result<String, String> {
    match current {
        Some(_) => Err("multiple files specified".to_string()),
        None => Ok(arg.to_string()),
    }
}

fn parse_chunk_size(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("--chunk-size must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(format!("invalid --chunk-size '{}': {}", value, e)),
    }
}

fn init_logging(verbose: bool) {
    let mut builder = env_logger::Builder::from_default_env();
    if verbose {
        builder.filter_level(LevelFilter::Debug);
    }
    builder.init();
}

fn read_input(file: &str) -> Result<String, String> {
    if file == "-" {
        let mut input = String::new();
        io::stdin()
            .read_to_string(&mut input)
            .map_err(|e| format!("failed to read stdin: {}", e))?;
        return Ok(input);
    }
    fs::read_to_string(file).map_err(|e| format!("failed to read '{}': {}", file, e))
}

/// Split `input` into pieces of at least `size` bytes, extending each
/// piece to the next character boundary. `None` yields a single piece.
fn split_chunks(input: &str, size: Option<usize>) -> Vec<&str> {
    let Some(size) = size else {
        return vec![input];
    };

    let mut chunks = Vec::with_capacity(input.len() / size + 1);
    let mut rest = input;
    while !rest.is_empty() {
        let mut end = size.min(rest.len());
        while !rest.is_char_boundary(end) {
            end += 1;
        }
        let (head, tail) = rest.split_at(end);
        chunks.push(head);
        rest = tail;
    }
    chunks
}

fn print_help() {
    eprintln!(
        r#"chunkmark - markdown to HTML renderer

USAGE:
    chunkmark [OPTIONS] [COMMAND] <FILE|->

COMMANDS:
    html        Render the document as HTML (default)
    ast         Dump the parsed document as JSON
    stats       Show document statistics

OPTIONS:
        --unsafe-html     Emit raw HTML blocks without sanitizing them
        --chunk-size <N>  Feed the input to the parser in N-byte pieces
    -v, --verbose         Log parser decisions (same as RUST_LOG=debug)
    -h, --help            Print help information
    -V, --version         Print version information

EXAMPLES:
    chunkmark README.md                Render a file to HTML
    cat README.md | chunkmark -        Render standard input
    chunkmark ast README.md            Output the AST as JSON
    chunkmark stats README.md          Show document statistics
    chunkmark --chunk-size 7 doc.md    Render with 7-byte input chunks
"#
    );
}

// =============================================================================
// HTML Command
// =============================================================================

fn cmd_html(doc: &Document) -> Result<(), String> {
    let html = doc.to_html();
    if !html.is_empty() {
        println!("{}", html);
    }
    Ok(())
}

// =============================================================================
// AST Command
// =============================================================================

fn cmd_ast(doc: &Document) -> Result<(), String> {
    let json = serde_json::to_string_pretty(&convert_document(doc))
        .map_err(|e| format!("failed to serialize document: {}", e))?;
    println!("{}", json);
    Ok(())
}

#[derive(Serialize)]
struct JsonDocument<'a> {
    blocks: Vec<JsonBlock<'a>>,
}

#[derive(Serialize)]
#[serde(tag = "type")]
enum JsonBlock<'a> {
    Heading {
        level: u8,
        content: Vec<JsonInline<'a>>,
    },
    Rule,
    Paragraph {
        lines: Vec<Vec<JsonInline<'a>>>,
    },
    CodeBlock {
        lines: &'a [String],
    },
    BlockQuote {
        blocks: Vec<JsonBlock<'a>>,
    },
    BulletList {
        items: Vec<Vec<JsonInline<'a>>>,
    },
    NumberList {
        items: Vec<Vec<JsonInline<'a>>>,
    },
    RawHtml {
        content: &'a str,
    },
    Empty,
}

#[derive(Serialize)]
#[serde(tag = "type")]
enum JsonInline<'a> {
    Text {
        content: &'a str,
    },
    Bold {
        content: Vec<JsonInline<'a>>,
    },
    Italic {
        content: Vec<JsonInline<'a>>,
    },
    Code {
        content: Vec<JsonInline<'a>>,
    },
    Link {
        text: Vec<JsonInline<'a>>,
        href: &'a str,
        #[serde(skip_serializing_if = "Option::is_none")]
        title: Option<&'a str>,
    },
    Image {
        alt: &'a str,
        src: &'a str,
    },
    LiteralRun {
        ch: char,
        count: usize,
    },
}

fn convert_document(doc: &Document) -> JsonDocument<'_> {
    JsonDocument {
        blocks: doc.blocks.iter().map(convert_block).collect(),
    }
}

fn convert_inlines(inlines: &[Inline]) -> Vec<JsonInline<'_>> {
    inlines.iter().map(convert_inline).collect()
}

fn convert_lines(lines: &[Vec<Inline>]) -> Vec<Vec<JsonInline<'_>>> {
    lines.iter().map(|line| convert_inlines(line)).collect()
}

fn convert_block(block: &Block) -> JsonBlock<'_> {
    match block {
        Block::Heading { level, content } => JsonBlock::Heading {
            level: *level,
            content: convert_inlines(content),
        },
        Block::Rule => JsonBlock::Rule,
        Block::Paragraph { lines } => JsonBlock::Paragraph {
            lines: convert_lines(lines),
        },
        Block::CodeBlock { lines } => JsonBlock::CodeBlock { lines },
        Block::BlockQuote { document } => JsonBlock::BlockQuote {
            blocks: document.blocks.iter().map(convert_block).collect(),
        },
        Block::BulletList { items } => JsonBlock::BulletList {
            items: convert_lines(items),
        },
        Block::NumberList { items } => JsonBlock::NumberList {
            items: convert_lines(items),
        },
        Block::RawHtml { content } => JsonBlock::RawHtml { content },
        Block::Empty => JsonBlock::Empty,
    }
}

fn convert_inline(inline: &Inline) -> JsonInline<'_> {
    match inline {
        Inline::Text(content) => JsonInline::Text { content },
        Inline::Bold(children) => JsonInline::Bold {
            content: convert_inlines(children),
        },
        Inline::Italic(children) => JsonInline::Italic {
            content: convert_inlines(children),
        },
        Inline::Code(children) => JsonInline::Code {
            content: convert_inlines(children),
        },
        Inline::Link { text, href, title } => JsonInline::Link {
            text: convert_inlines(text),
            href,
            title: title.as_deref(),
        },
        Inline::Image { alt, src } => JsonInline::Image { alt, src },
        Inline::LiteralRun { ch, count } => JsonInline::LiteralRun {
            ch: *ch,
            count: *count,
        },
    }
}

// =============================================================================
// Stats Command
// =============================================================================

fn cmd_stats(doc: &Document, input: &str) -> Result<(), String> {
    let stats = doc.stats();

    println!("Document Statistics");
    println!("-------------------");
    println!("Content:");
    println!("  Total blocks:   {}", stats.total());
    println!("  Headings:       {}", stats.headings);
    println!("  Paragraphs:     {}", stats.paragraphs);
    println!("  Code blocks:    {}", stats.code_blocks);
    println!("  Block quotes:   {}", stats.quotes);
    println!("  Bullet lists:   {}", stats.bullet_lists);
    println!("  Number lists:   {}", stats.number_lists);
    println!("  List items:     {}", stats.list_items);
    println!("  Rules:          {}", stats.rules);
    println!("  Raw HTML:       {}", stats.raw_html);
    println!("  Quote depth:    {}", stats.max_quote_depth);
    println!();
    println!("Size:");
    println!("  Bytes:          {}", input.len());
    println!("  Words (est.):   {}", input.split_whitespace().count());
    println!("  Lines:          {}", input.lines().count());

    Ok(())
}
