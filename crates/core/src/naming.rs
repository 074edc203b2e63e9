//! Case conversion and deterministic section file names.

use std::collections::HashSet;

/// Splits an identifier or heading into words.
///
/// Word boundaries are any non-alphanumeric character, a lowercase letter or
/// digit followed by an uppercase letter (`deepWork`), and the last capital of
/// an acronym that starts a new word (`HTMLParser` → `HTML`, `Parser`).
pub fn split_words(input: &str) -> Vec<String> {
    let chars: Vec<char> = input.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }

        if let Some(prev) = current.chars().last() {
            let camel = (prev.is_lowercase() || prev.is_numeric()) && c.is_uppercase();
            let acronym_end =
                prev.is_uppercase() && c.is_uppercase() && chars.get(i + 1).is_some_and(|next| next.is_lowercase());
            if camel || acronym_end {
                words.push(std::mem::take(&mut current));
            }
        }

        current.push(c);
    }

    if !current.is_empty() {
        words.push(current);
    }

    words
}

/// Capitalises every word, splitting only on whitespace, `-` and `_`.
///
/// The remainder of each word keeps its original case so acronyms survive:
/// `"deep-work"` → `"Deep Work"`, `"the DNA of habits"` → `"The DNA Of Habits"`.
pub fn title_case(input: &str) -> String {
    input
        .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .filter(|word| !word.is_empty())
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Capitalises every whitespace-separated word of a heading.
///
/// Punctuation inside words is kept, so `"Self-control and well_being"`
/// becomes `"Self-control And Well_being"`. Runs of whitespace collapse to
/// one space.
pub fn heading_case(input: &str) -> String {
    input.split_whitespace().map(capitalize).collect::<Vec<_>>().join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Lowercase, underscore-joined form of the input's words.
///
/// ```rust
/// use blinkpress_core::naming::snake_case;
///
/// assert_eq!(snake_case("Key Idea 1"), "key_idea_1");
/// assert_eq!(snake_case("the big idea"), snake_case("The Big Idea"));
/// ```
pub fn snake_case(input: &str) -> String {
    split_words(input)
        .iter()
        .map(|word| word.to_lowercase())
        .collect::<Vec<_>>()
        .join("_")
}

/// Hands out file stems for the sections of one item.
///
/// Headings that normalise to a stem already handed out get a numeric suffix
/// (`the_big_idea`, `the_big_idea_2`), so no section overwrites another.
/// Headings without any usable character become `section_<position>`.
#[derive(Debug, Default)]
pub struct SectionNamer {
    used: HashSet<String>,
    position: usize,
}

impl SectionNamer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the unique file stem for the next heading in document order.
    pub fn next_stem(&mut self, heading: &str) -> String {
        self.position += 1;

        let mut base = snake_case(heading);
        if base.is_empty() {
            base = format!("section_{}", self.position);
        }

        let mut candidate = base.clone();
        let mut suffix = 2;
        while self.used.contains(&candidate) {
            candidate = format!("{base}_{suffix}");
            suffix += 1;
        }

        self.used.insert(candidate.clone());
        candidate
    }
}
