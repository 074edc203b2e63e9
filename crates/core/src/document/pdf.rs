//! Minimal Markdown to PDF rendering with the built-in Helvetica fonts.
//!
//! Headings are set in bold at a larger size, everything else is wrapped into
//! paragraphs. Inline Markdown markers are stripped and links keep their URL
//! in parentheses. Text is written in the built-in fonts' WinAnsi encoding,
//! which covers Latin-1 and common typographic punctuation. Characters outside
//! it are transliterated where an equivalent exists, or replaced by `?`.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference};
use regex::Regex;

use super::{DocumentConverter, ensure_parent, read_sources};
use crate::{BlinkpressError, Result};

static LINK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"!?\[([^\]]*)\]\(([^)\s]*)[^)]*\)").unwrap());
static EMPHASIS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*|\*|`").unwrap());
static UNDERSCORE_EMPHASIS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^|\W)_{1,2}([^_\s](?:[^_]*[^_\s])?)_{1,2}(\W|$)").unwrap());
static LIST_MARKER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\s*)([-*+]|\d+\.)\s+").unwrap());

/// Page geometry and type sizes, in millimetres and points.
#[derive(Debug, Clone)]
pub struct PdfConverter {
    pub page_width: f32,
    pub page_height: f32,
    pub margin: f32,
    pub body_size: f32,
    pub heading_sizes: [f32; 3],
}

impl Default for PdfConverter {
    fn default() -> Self {
        Self { page_width: 210.0, page_height: 297.0, margin: 20.0, body_size: 11.0, heading_sizes: [20.0, 16.0, 13.0] }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Block {
    Heading(usize, String),
    Paragraph(String),
}

impl DocumentConverter for PdfConverter {
    fn extension(&self) -> &'static str {
        "pdf"
    }

    fn concat_to_document(&self, title: &str, sources: &[PathBuf], target: &Path) -> Result<PathBuf> {
        let markdown = read_sources(sources)?;
        let blocks = parse_blocks(&markdown);

        ensure_parent(target)?;
        self.render(title, &blocks, target)?;

        Ok(target.to_path_buf())
    }
}

impl PdfConverter {
    fn render(&self, title: &str, blocks: &[Block], target: &Path) -> Result<()> {
        let (doc, page, layer) = PdfDocument::new(title, Mm(self.page_width), Mm(self.page_height), "Layer 1");
        let regular = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_error)?;
        let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(pdf_error)?;

        {
            let mut cursor = Cursor {
                doc: &doc,
                layer: doc.get_page(page).get_layer(layer),
                y: self.page_height - self.margin,
                converter: self,
            };

            for block in blocks {
                match block {
                    Block::Heading(level, text) => {
                        let size = self.heading_sizes[(level - 1).min(self.heading_sizes.len() - 1)];
                        cursor.gap(size * 0.4);
                        cursor.write_wrapped(text, size, &bold);
                        cursor.gap(size * 0.2);
                    }
                    Block::Paragraph(text) => {
                        cursor.write_wrapped(text, self.body_size, &regular);
                        cursor.gap(self.body_size * 0.5);
                    }
                }
            }
        }

        let file = File::create(target)
            .map_err(|e| BlinkpressError::ConversionError(format!("cannot write {}: {}", target.display(), e)))?;
        doc.save(&mut BufWriter::new(file)).map_err(pdf_error)
    }
}

/// Tracks the write position and starts new pages as needed.
struct Cursor<'a> {
    doc: &'a PdfDocumentReference,
    layer: PdfLayerReference,
    y: f32,
    converter: &'a PdfConverter,
}

impl Cursor<'_> {
    fn gap(&mut self, points: f32) {
        self.y -= points_to_mm(points);
    }

    fn write_wrapped(&mut self, text: &str, size: f32, font: &IndirectFontRef) {
        let line_height = points_to_mm(size) * 1.4;
        // Helvetica averages roughly half an em per character.
        let char_width = points_to_mm(size) * 0.5;
        let usable = self.converter.page_width - 2.0 * self.converter.margin;
        let max_chars = ((usable / char_width) as usize).max(10);

        for line in wrap(text, max_chars) {
            if self.y - line_height < self.converter.margin {
                let (page, layer) = self.doc.add_page(
                    Mm(self.converter.page_width),
                    Mm(self.converter.page_height),
                    "Layer 1",
                );
                self.layer = self.doc.get_page(page).get_layer(layer);
                self.y = self.converter.page_height - self.converter.margin;
            }
            self.y -= line_height;
            self.layer.use_text(line, size, Mm(self.converter.margin), Mm(self.y), font);
        }
    }
}

fn points_to_mm(points: f32) -> f32 {
    points * 0.352_778
}

fn pdf_error(err: printpdf::Error) -> BlinkpressError {
    BlinkpressError::ConversionError(format!("PDF rendering: {}", err))
}

/// Groups Markdown lines into headings and paragraphs.
fn parse_blocks(markdown: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut paragraph: Vec<String> = Vec::new();

    let flush = |paragraph: &mut Vec<String>, blocks: &mut Vec<Block>| {
        if !paragraph.is_empty() {
            blocks.push(Block::Paragraph(paragraph.join(" ")));
            paragraph.clear();
        }
    };

    for line in markdown.lines() {
        let trimmed = line.trim();

        if trimmed.is_empty() {
            flush(&mut paragraph, &mut blocks);
            continue;
        }

        let hashes = trimmed.chars().take_while(|&c| c == '#').count();
        if (1..=6).contains(&hashes) && trimmed[hashes..].starts_with(' ') {
            flush(&mut paragraph, &mut blocks);
            blocks.push(Block::Heading(hashes, clean_inline(&trimmed[hashes..])));
            continue;
        }

        if trimmed.chars().all(|c| c == '-' || c == '*' || c == '_') && trimmed.len() >= 3 {
            flush(&mut paragraph, &mut blocks);
            continue;
        }

        if LIST_MARKER.is_match(trimmed) {
            flush(&mut paragraph, &mut blocks);
            let item = LIST_MARKER.replace(trimmed, "- ");
            paragraph.push(clean_inline(&item));
            flush(&mut paragraph, &mut blocks);
            continue;
        }

        let text = trimmed.trim_start_matches('>').trim();
        if !text.is_empty() {
            paragraph.push(clean_inline(text));
        }
    }

    flush(&mut paragraph, &mut blocks);
    blocks
}

/// Strips inline Markdown and maps text onto the WinAnsi range of the built-in fonts.
fn clean_inline(text: &str) -> String {
    let linked = LINK.replace_all(text, |caps: &regex::Captures| {
        let label = &caps[1];
        let url = &caps[2];
        if url.is_empty() || label == url { label.to_string() } else { format!("{} ({})", label, url) }
    });
    let plain = EMPHASIS.replace_all(&linked, "");
    let plain = UNDERSCORE_EMPHASIS.replace_all(&plain, "$1$2$3");
    let plain = plain.replace('\\', "");

    let mut encoded = String::with_capacity(plain.len());
    for c in plain.trim().chars() {
        match c {
            '\u{00A0}' => encoded.push(' '),
            c if is_win_ansi(c) => encoded.push(c),
            '\u{2010}' | '\u{2011}' | '\u{2212}' => encoded.push('-'),
            '\u{201B}' | '\u{2032}' => encoded.push('\''),
            '\u{201F}' | '\u{2033}' => encoded.push('"'),
            '\u{2190}' => encoded.push_str("<-"),
            '\u{2192}' => encoded.push_str("->"),
            _ => encoded.push('?'),
        }
    }
    encoded
}

/// Characters the built-in fonts can show through WinAnsiEncoding.
fn is_win_ansi(c: char) -> bool {
    matches!(c, ' '..='~' | '\u{00A1}'..='\u{00FF}')
        || matches!(
            c,
            '\u{20AC}' | '\u{201A}' | '\u{0192}' | '\u{201E}' | '\u{2026}' | '\u{2020}' | '\u{2021}'
                | '\u{02C6}' | '\u{2030}' | '\u{0160}' | '\u{2039}' | '\u{0152}' | '\u{017D}' | '\u{2018}'
                | '\u{2019}' | '\u{201C}' | '\u{201D}' | '\u{2022}' | '\u{2013}' | '\u{2014}' | '\u{02DC}'
                | '\u{2122}' | '\u{0161}' | '\u{203A}' | '\u{0153}' | '\u{017E}' | '\u{0178}'
        )
}

/// Greedy word wrap to at most `width` characters per line.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_width = 0;

    for word in text.split_whitespace() {
        let word_width = word.chars().count();
        if !current.is_empty() && current_width + 1 + word_width > width {
            lines.push(std::mem::take(&mut current));
            current_width = 0;
        }
        if !current.is_empty() {
            current.push(' ');
            current_width += 1;
        }
        current.push_str(word);
        current_width += word_width;
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}
