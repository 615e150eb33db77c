//! Splitting recipe bodies into `## Heading` sections and putting base and
//! fork sections back together.

use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Name under which content before the first heading is collected
pub const PREAMBLE: &str = "_preamble";

/// A named block of recipe content delimited by a level-2 heading
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub name: String,
    pub content: String,
}

impl Section {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Section {
            name: name.into(),
            content: content.into(),
        }
    }

    pub fn is_preamble(&self) -> bool {
        self.name == PREAMBLE
    }
}

/// Frontmatter written at the top of a fork file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForkHeader {
    /// Slug of the base recipe
    pub forked_from: String,
    /// Display name of the fork
    pub fork_name: String,
    pub author: Option<String>,
    /// ISO date the fork was created
    pub date_added: String,
    /// Base recipe commit the fork was taken from
    pub forked_at_commit: Option<String>,
}

fn heading_name(line: &str) -> Option<&str> {
    let rest = line.strip_prefix("##")?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let name = rest.trim();
    (!name.is_empty()).then_some(name)
}

fn push_section(sections: &mut Vec<Section>, name: &str, lines: &[&str]) {
    let content = lines.join("\n");
    let content = content.trim();
    if !content.is_empty() {
        sections.push(Section::new(name, content));
    }
}

/// Split a markdown body into its sections, in source order.
///
/// Content before the first heading is returned under [`PREAMBLE`];
/// sections whose content is blank are omitted.
pub fn parse_sections(markdown: &str) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut current_name = PREAMBLE;
    let mut current_lines: Vec<&str> = Vec::new();

    for line in markdown.split('\n') {
        match heading_name(line) {
            Some(name) => {
                push_section(&mut sections, current_name, &current_lines);
                current_name = name;
                current_lines.clear();
            }
            None => current_lines.push(line),
        }
    }
    push_section(&mut sections, current_name, &current_lines);

    debug!("Parsed {} sections", sections.len());
    sections
}

/// Section contents by name; a repeated heading keeps its last content.
fn section_map(sections: &[Section]) -> HashMap<&str, &str> {
    sections
        .iter()
        .map(|s| (s.name.as_str(), s.content.as_str()))
        .collect()
}

fn push_rendered(lines: &mut Vec<String>, name: &str, content: &str) {
    lines.push(String::new());
    lines.push(format!("## {name}"));
    lines.push(String::new());
    lines.push(content.to_string());
}

/// Overlay a fork onto its base for display.
///
/// Walks the base's sections in order and takes the fork's content for any
/// section the fork defines. Sections that exist only in the fork are not
/// included; use [`merge_fork_into_base`] when writing a merge back.
pub fn merge_content(base_markdown: &str, fork_markdown: &str) -> String {
    let base_sections = parse_sections(base_markdown);
    let fork_sections = parse_sections(fork_markdown);
    let fork_map = section_map(&fork_sections);

    let mut lines = Vec::new();
    for section in &base_sections {
        let content = fork_map
            .get(section.name.as_str())
            .copied()
            .unwrap_or(section.content.as_str());
        if section.is_preamble() {
            lines.push(content.to_string());
        } else {
            push_rendered(&mut lines, &section.name, content);
        }
    }

    lines.join("\n")
}

/// Merge a fork's changes back into the base recipe body.
///
/// Keeps the base preamble, substitutes fork content section by section,
/// then appends the sections only the fork has. Ends with a newline.
pub fn merge_fork_into_base(base_markdown: &str, fork_markdown: &str) -> String {
    let base_sections = parse_sections(base_markdown);
    let fork_sections = parse_sections(fork_markdown);
    let fork_map = section_map(&fork_sections);

    let mut lines = Vec::new();
    if let Some(preamble) = base_sections.iter().find(|s| s.is_preamble()) {
        lines.push(preamble.content.clone());
    }

    let mut seen = BTreeSet::new();
    for section in base_sections.iter().filter(|s| !s.is_preamble()) {
        seen.insert(section.name.as_str());
        let content = fork_map
            .get(section.name.as_str())
            .copied()
            .unwrap_or(section.content.as_str());
        push_rendered(&mut lines, &section.name, content);
    }

    for section in fork_sections.iter().filter(|s| !s.is_preamble()) {
        if seen.insert(section.name.as_str()) {
            let content = fork_map[section.name.as_str()];
            push_rendered(&mut lines, &section.name, content);
        }
    }

    lines.push(String::new());
    lines.join("\n")
}

/// Names of the sections a fork overrides (never the preamble).
pub fn get_modified_sections(fork_markdown: &str) -> BTreeSet<String> {
    parse_sections(fork_markdown)
        .into_iter()
        .filter(|s| !s.is_preamble())
        .map(|s| s.name)
        .collect()
}

/// Build the standard sections from structured recipe data.
///
/// Ingredients and notes become `- ` bullets, instructions are numbered.
pub fn sections_from_recipe_data(
    ingredients: &[String],
    instructions: &[String],
    notes: &[String],
) -> Vec<Section> {
    let mut sections = Vec::new();
    if !ingredients.is_empty() {
        let content = ingredients
            .iter()
            .map(|item| format!("- {item}"))
            .collect::<Vec<_>>()
            .join("\n");
        sections.push(Section::new("Ingredients", content));
    }
    if !instructions.is_empty() {
        let content = instructions
            .iter()
            .enumerate()
            .map(|(i, step)| format!("{}. {step}", i + 1))
            .collect::<Vec<_>>()
            .join("\n");
        sections.push(Section::new("Instructions", content));
    }
    if !notes.is_empty() {
        let content = notes
            .iter()
            .map(|note| format!("- {note}"))
            .collect::<Vec<_>>()
            .join("\n");
        sections.push(Section::new("Notes", content));
    }
    sections
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Sections of fork data that differ from the base recipe.
///
/// Only Ingredients, Instructions and Notes are compared, ignoring
/// whitespace differences. A section the fork empties comes back with
/// blank content so the caller can record the removal.
pub fn changed_sections(
    base_markdown: &str,
    ingredients: &[String],
    instructions: &[String],
    notes: &[String],
) -> Vec<Section> {
    let base_sections = parse_sections(base_markdown);
    let base_map = section_map(&base_sections);
    let fork_sections = sections_from_recipe_data(ingredients, instructions, notes);
    let fork_map = section_map(&fork_sections);

    let mut changed = Vec::new();
    for name in ["Ingredients", "Instructions", "Notes"] {
        let base_text = collapse_whitespace(base_map.get(name).copied().unwrap_or(""));
        let fork_content = fork_map.get(name).copied().unwrap_or("");
        let fork_text = collapse_whitespace(fork_content);
        if fork_text == base_text {
            continue;
        }
        if !fork_text.is_empty() {
            changed.push(Section::new(name, fork_content));
        } else if !base_text.is_empty() {
            changed.push(Section::new(name, ""));
        }
    }
    changed
}

/// Render a fork file: frontmatter followed by its non-empty sections.
pub fn generate_fork_markdown(header: &ForkHeader, changed: &[Section]) -> String {
    let mut lines = vec!["---".to_string()];
    lines.push(format!("forked_from: {}", header.forked_from));
    lines.push(format!("fork_name: {}", header.fork_name));
    if let Some(author) = header.author.as_deref().filter(|a| !a.is_empty()) {
        lines.push(format!("author: {author}"));
    }
    lines.push(format!("date_added: {}", header.date_added));
    if let Some(commit) = header.forked_at_commit.as_deref().filter(|c| !c.is_empty()) {
        lines.push(format!("forked_at_commit: {commit}"));
    }
    lines.push("---".to_string());

    for section in changed.iter().filter(|s| !s.content.is_empty()) {
        push_rendered(&mut lines, &section.name, &section.content);
    }

    lines.push(String::new());
    lines.join("\n")
}
