//! Malformed and arbitrarily chunked input must always parse.
//!
//! Documents are mutated with a seeded generator so failures reproduce.

use chunkmark_core::{Document, DocumentStats, Parser, Settings};
use pulldown_cmark::{Event, Options, Parser as MdParser, Tag, TagEnd};
use std::time::{Duration, Instant};

const SAMPLE: &str = "\
# Release notes

Intro with **bold**, _italic_ and `code` spans.
A second line with a [link](https://example.com \"Example\").

    fn main() {
        println!(\"héllo\");
    }

> Quoted text
> > nested *quote*

* first item
* second **item**

1. one
2) two

-----

![diagram](img/diagram.png)

<div class=\"note\">raw <b>html</b></div>

Closing paragraph.
";

const SEED: u64 = 0x5eed;
const VARIANT_COUNT: usize = 64;
const MAX_MUTATION_STEPS: usize = 4;

const MUTATIONS: &[&str] = &[
    "drop_blank_line",
    "truncate_tail",
    "strip_list_marker",
    "unclose_span",
    "break_link",
    "insert_cr",
    "deepen_quote",
    "inject_script",
    "delimiter_noise",
];

struct Lcg {
    state: u64,
}

impl Lcg {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.state >> 32) as u32
    }

    fn choose(&mut self, max: usize) -> usize {
        if max == 0 {
            return 0;
        }
        (self.next_u32() as usize) % max
    }
}

fn floor_char_boundary(s: &str, mut at: usize) -> usize {
    while !s.is_char_boundary(at) {
        at -= 1;
    }
    at
}

fn apply_mutations(mut input: String, rng: &mut Lcg) -> String {
    for _ in 0..MAX_MUTATION_STEPS {
        match MUTATIONS[rng.choose(MUTATIONS.len())] {
            "drop_blank_line" => {
                if let Some(pos) = input.find("\n\n") {
                    input.replace_range(pos..pos + 2, "\n");
                }
            }
            "truncate_tail" => {
                let len = input.len();
                if len > 8 {
                    let cut = rng.choose(len / 3).max(1);
                    let at = floor_char_boundary(&input, len - cut);
                    input.truncate(at);
                }
            }
            "strip_list_marker" => {
                if let Some(pos) = input.find("* ") {
                    input.replace_range(pos..pos + 2, "");
                }
            }
            "unclose_span" => {
                if let Some(pos) = input.rfind("**") {
                    input.replace_range(pos..pos + 2, "");
                }
            }
            "break_link" => {
                if let Some(pos) = input.find("](") {
                    input.replace_range(pos..pos + 2, "] (");
                }
            }
            "insert_cr" => {
                input = input.replace('\n', "\r\n");
            }
            "deepen_quote" => {
                input = input.replace("> ", "> > ");
            }
            "inject_script" => {
                let at = floor_char_boundary(&input, rng.choose(input.len()));
                input.insert_str(at, "\n<script>alert(1)</script>\n");
            }
            "delimiter_noise" => {
                let at = floor_char_boundary(&input, rng.choose(input.len()));
                input.insert_str(at, "*_`[\\");
            }
            _ => {}
        }
    }
    input
}

fn variants() -> Vec<String> {
    let mut rng = Lcg::new(SEED);
    (0..VARIANT_COUNT)
        .map(|_| apply_mutations(SAMPLE.to_string(), &mut rng))
        .collect()
}

/// Split `input` into pieces of random length, cutting only on character
/// boundaries.
fn random_chunks(input: &str, rng: &mut Lcg) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut start = 0;
    while start < input.len() {
        let mut end = (start + 1 + rng.choose(12)).min(input.len());
        while !input.is_char_boundary(end) {
            end += 1;
        }
        chunks.push(input[start..end].to_string());
        start = end;
    }
    chunks
}

fn parse(input: &str) -> Document {
    Parser::default()
        .parse_str(input)
        .unwrap_or_else(|e| panic!("parse failed: {e}\ninput: {input:?}"))
}

// ============================================================================
// Totality
// ============================================================================

#[test]
fn mutated_documents_always_parse() {
    for variant in variants() {
        let doc = parse(&variant);
        let _ = doc.to_html();
    }
}

#[test]
fn pathological_inputs_parse() {
    let inputs = [
        "*",
        "**",
        "****",
        "_*_*_*",
        "`",
        "``````",
        "\\",
        "[",
        "[](",
        "[a](b \"unterminated",
        "![",
        "![a](b",
        "<",
        ">",
        "> ",
        "#",
        "#######",
        "=",
        "--",
        "1.",
        "* ",
        "\r",
        "\r\n\r\n",
        "\t\t",
        "\u{0}",
        "日本語 *テキスト",
    ];
    for input in inputs {
        parse(input);
    }
}

#[test]
fn long_lines_of_broken_links_parse_in_linear_time() {
    let inputs = [
        "[a](b".repeat(40_000),
        "[a".repeat(100_000),
        "[a](b \"t".repeat(25_000),
        "*a\\".repeat(60_000),
    ];
    for input in &inputs {
        let started = Instant::now();
        let doc = parse(input);
        let elapsed = started.elapsed();

        assert_eq!(doc.stats().paragraphs, 1);
        assert!(
            elapsed < Duration::from_secs(5),
            "{} bytes took {:?}",
            input.len(),
            elapsed
        );
    }
}

#[test]
fn sanitizer_applies_to_every_variant() {
    for variant in variants() {
        let html = parse(&variant).to_html();
        assert!(!html.contains("<script>"), "script survived in {variant:?}");
    }
}

// ============================================================================
// Chunk Invariance
// ============================================================================

#[test]
fn random_chunking_matches_single_chunk() {
    let parser = Parser::new(Settings::default());
    let mut rng = Lcg::new(SEED ^ 0xc0ffee);

    for variant in variants() {
        let whole = parser.parse_str(&variant).unwrap();
        for _ in 0..4 {
            let chunks = random_chunks(&variant, &mut rng);
            let chunked = parser.parse(&chunks).unwrap();
            assert_eq!(chunked, whole, "chunks: {chunks:?}");
        }
    }
}

#[test]
fn every_single_split_matches_single_chunk() {
    let parser = Parser::default();
    let whole = parser.parse_str(SAMPLE).unwrap();

    for at in (0..=SAMPLE.len()).filter(|&i| SAMPLE.is_char_boundary(i)) {
        let (head, tail) = SAMPLE.split_at(at);
        assert_eq!(parser.parse([head, tail]).unwrap(), whole, "split at {at}");
    }
}

#[test]
fn one_character_chunks_match_single_chunk() {
    let parser = Parser::default();
    let chars: Vec<String> = SAMPLE.chars().map(String::from).collect();
    assert_eq!(
        parser.parse(&chars).unwrap(),
        parser.parse_str(SAMPLE).unwrap()
    );
}

#[test]
fn crlf_matches_lf() {
    let crlf = SAMPLE.replace('\n', "\r\n");
    assert_eq!(parse(&crlf), parse(SAMPLE));
}

// ============================================================================
// Reference Comparison
// ============================================================================

const COMMON_SUBSET: &str = "\
# Title

Intro paragraph.

    code line

> quoted paragraph

* a
* b

1. one
2. two
";

#[derive(Debug, Default, PartialEq)]
struct Counts {
    headings: usize,
    paragraphs: usize,
    lists: usize,
    list_items: usize,
    code_blocks: usize,
}

impl From<DocumentStats> for Counts {
    fn from(stats: DocumentStats) -> Self {
        Self {
            headings: stats.headings,
            paragraphs: stats.paragraphs,
            lists: stats.bullet_lists + stats.number_lists,
            list_items: stats.list_items,
            code_blocks: stats.code_blocks,
        }
    }
}

fn count_markdown(input: &str) -> Counts {
    let mut counts = Counts::default();
    let mut list_depth = 0u32;
    for event in MdParser::new_ext(input, Options::empty()) {
        match event {
            Event::Start(tag) => match tag {
                Tag::Heading { .. } => counts.headings += 1,
                Tag::Paragraph => {
                    if list_depth == 0 {
                        counts.paragraphs += 1;
                    }
                }
                Tag::List(_) => {
                    counts.lists += 1;
                    list_depth += 1;
                }
                Tag::Item => counts.list_items += 1,
                Tag::CodeBlock(_) => counts.code_blocks += 1,
                _ => {}
            },
            Event::End(TagEnd::List(_)) => {
                list_depth = list_depth.saturating_sub(1);
            }
            _ => {}
        }
    }
    counts
}

#[test]
fn block_counts_agree_with_pulldown_on_common_subset() {
    let ours = Counts::from(parse(COMMON_SUBSET).stats());
    assert_eq!(ours, count_markdown(COMMON_SUBSET));
}
