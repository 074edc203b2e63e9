//! Chapter extraction from reader pages.
//!
//! A reader page holds one `div.chapter` block per key idea. Each block is
//! turned into a [`Section`]: its `h1` is relabelled as a smaller, title-cased
//! `h2`, the block is converted to Markdown, and the heading is normalised
//! into the section's file name.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use blinkpress_core::{ContentExtractor, ExtractConfig, Item, PlainTextConverter};
//!
//! let html = r#"<div class="chapter chapter"><h1>key idea 1</h1><p>Focus.</p></div>"#;
//! let extractor = ContentExtractor::new(ExtractConfig::default(), Arc::new(PlainTextConverter));
//! let sections = extractor.extract(&Item::new("deep-work").unwrap(), html).unwrap();
//!
//! assert_eq!(sections.len(), 1);
//! assert_eq!(sections[0].path.to_str(), Some("books/deep-work/key_idea_1.md"));
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use lol_html::html_content::ContentType;
use scraper::{Html, Selector};
use tracing::{debug, warn};

use crate::formatters::TextConverter;
use crate::item::{Item, Section};
use crate::naming::{SectionNamer, heading_case};
use crate::{BlinkpressError, Result};

/// Selectors and output location used by the extractor.
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    /// Container the book title heading is inserted into.
    pub container_selector: String,
    /// One match per chapter block.
    pub chapter_selector: String,
    /// Heading element inside a chapter block.
    pub heading_selector: String,
    /// Root directory for section files.
    pub output_dir: PathBuf,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            container_selector: "article .shared__reader__blink .reader__container__content".to_string(),
            chapter_selector: r#"div[class="chapter chapter"]"#.to_string(),
            heading_selector: "h1".to_string(),
            output_dir: PathBuf::from("books"),
        }
    }
}

/// Splits reader pages into Markdown sections.
pub struct ContentExtractor {
    config: ExtractConfig,
    converter: Arc<dyn TextConverter>,
}

impl ContentExtractor {
    pub fn new(config: ExtractConfig, converter: Arc<dyn TextConverter>) -> Self {
        Self { config, converter }
    }

    pub fn config(&self) -> &ExtractConfig {
        &self.config
    }

    /// Title shown at the top of the item's document.
    pub fn title(&self, item: &Item) -> String {
        item.title()
    }

    /// Extracts the chapter sections of `html` in document order.
    ///
    /// A page without chapter blocks yields an empty list. The HTML parser is
    /// error tolerant, so only invalid selectors or a converter failure make
    /// this fail.
    pub fn extract(&self, item: &Item, html: &str) -> Result<Vec<Section>> {
        let chapter_selector = parse_selector(&self.config.chapter_selector)?;
        let heading_selector = parse_selector(&self.config.heading_selector)?;
        validate_rewrite_selector(&self.config.container_selector)?;
        validate_rewrite_selector(&self.config.heading_selector)?;

        let page = insert_title(html, &self.config.container_selector, &self.title(item));
        let document = Html::parse_document(&page);

        let section_dir = item.section_dir(&self.config.output_dir);
        let mut namer = SectionNamer::new();
        let mut sections = Vec::new();

        for chapter in document.select(&chapter_selector) {
            let raw_heading = chapter
                .select(&heading_selector)
                .flat_map(|heading| heading.text())
                .collect::<String>();
            let heading = raw_heading.split_whitespace().collect::<Vec<_>>().join(" ");

            let relabelled = relabel_headings(&chapter.inner_html(), &self.config.heading_selector, &heading_case(&heading));
            let content = self.converter.to_formatted_text(&relabelled)?;
            let path = section_dir.join(format!("{}.md", namer.next_stem(&heading)));

            debug!(item = %item, heading = %heading, path = %path.display(), "extracted section");
            sections.push(Section { path, heading, content });
        }

        if sections.is_empty() {
            warn!(item = %item, "no chapter blocks found on reader page");
        }

        Ok(sections)
    }
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| BlinkpressError::ParseError(format!("Invalid selector '{}': {}", selector, e)))
}

fn validate_rewrite_selector(selector: &str) -> Result<()> {
    selector
        .parse::<lol_html::Selector>()
        .map(|_| ())
        .map_err(|e| BlinkpressError::ParseError(format!("Unsupported selector '{}': {}", selector, e)))
}

/// Prepends `<h1>{title}</h1>` to the content container, if the page has one.
fn insert_title(html: &str, container_selector: &str, title: &str) -> String {
    let heading = format!("<h1>{}</h1><br/><br/>", escape_html(title));
    let mut inserted = false;
    let mut output = Vec::new();
    let mut rewriter = lol_html::HtmlRewriter::new(
        lol_html::Settings {
            element_content_handlers: vec![lol_html::element!(container_selector, |el| {
                if !inserted {
                    el.prepend(&heading, ContentType::Html);
                    inserted = true;
                }
                Ok(())
            })],
            ..Default::default()
        },
        |c: &[u8]| output.extend_from_slice(c),
    );

    if rewriter.write(html.as_bytes()).is_err() || rewriter.end().is_err() {
        return html.to_string();
    }

    String::from_utf8(output).unwrap_or_else(|_| html.to_string())
}

/// Replaces every heading in a chapter fragment with a demoted `h2`.
fn relabel_headings(fragment: &str, heading_selector: &str, heading: &str) -> String {
    let replacement = format!("<br/><h2>{}</h2>", escape_html(heading));
    let mut output = Vec::new();
    let mut rewriter = lol_html::HtmlRewriter::new(
        lol_html::Settings {
            element_content_handlers: vec![lol_html::element!(heading_selector, |el| {
                el.replace(&replacement, ContentType::Html);
                Ok(())
            })],
            ..Default::default()
        },
        |c: &[u8]| output.extend_from_slice(c),
    );

    if rewriter.write(fragment.as_bytes()).is_err() || rewriter.end().is_err() {
        return fragment.to_string();
    }

    String::from_utf8(output).unwrap_or_else(|_| fragment.to_string())
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}
