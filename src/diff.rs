//! Line-level diffs between a fork and its base, section by section.
//!
//! Ingredient sections are matched by ingredient key so a quantity change
//! shows up as a modification rather than a remove/add pair. Every other
//! section is aligned positionally with a longest common subsequence.

use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::ingredients::{
    display_unit, format_quantity, ingredient_key, parse_ingredient, ParsedIngredient,
};
use crate::sections::{parse_sections, PREAMBLE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineStatus {
    Unchanged,
    Added,
    Removed,
    Modified,
}

/// One line of a section diff
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineDiff {
    pub status: LineStatus,
    pub fork_line: Option<String>,
    pub base_line: Option<String>,
    /// For `Modified` ingredient lines, what the base quantity was
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,
}

impl LineDiff {
    fn unchanged(fork_line: &str, base_line: &str) -> Self {
        LineDiff {
            status: LineStatus::Unchanged,
            fork_line: Some(fork_line.to_string()),
            base_line: Some(base_line.to_string()),
            annotation: None,
        }
    }

    fn added(fork_line: &str) -> Self {
        LineDiff {
            status: LineStatus::Added,
            fork_line: Some(fork_line.to_string()),
            base_line: None,
            annotation: None,
        }
    }

    fn removed(base_line: &str) -> Self {
        LineDiff {
            status: LineStatus::Removed,
            fork_line: None,
            base_line: Some(base_line.to_string()),
            annotation: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionDiff {
    pub section_name: String,
    pub lines: Vec<LineDiff>,
    pub has_changes: bool,
}

impl SectionDiff {
    fn new(section_name: &str, lines: Vec<LineDiff>) -> Self {
        let has_changes = lines.iter().any(|l| l.status != LineStatus::Unchanged);
        SectionDiff {
            section_name: section_name.to_string(),
            lines,
            has_changes,
        }
    }
}

struct IngredientLine<'a> {
    line: &'a str,
    parsed: ParsedIngredient,
    key: String,
}

fn ingredient_lines(content: &str) -> Vec<IngredientLine<'_>> {
    content
        .split('\n')
        .map(str::trim)
        .filter(|l| l.starts_with("- "))
        .map(|line| {
            let parsed = parse_ingredient(line);
            let key = ingredient_key(&parsed);
            IngredientLine { line, parsed, key }
        })
        .collect()
}

fn content_lines(content: &str) -> Vec<&str> {
    content
        .split('\n')
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect()
}

/// What a modified ingredient used to be, e.g. `was 2 cups`
fn previous_amount(base: &ParsedIngredient) -> Option<String> {
    let quantity = base.quantity?;
    Some(match base.unit.as_deref() {
        Some(unit) => format!(
            "was {} {}",
            format_quantity(quantity),
            display_unit(unit, quantity)
        ),
        None => format!("was {}", format_quantity(quantity)),
    })
}

/// Diff two ingredient lists by ingredient key.
///
/// Each fork line claims the first unclaimed base line with the same key,
/// in base order. Duplicates therefore pair up in order. Unclaimed base
/// lines are reported as removed at their original position relative to
/// the matched lines around them.
pub fn diff_ingredients(base_content: &str, fork_content: &str) -> Vec<LineDiff> {
    let base = ingredient_lines(base_content);
    let fork = ingredient_lines(fork_content);

    let mut consumed = vec![false; base.len()];
    let mut fork_to_base: Vec<Option<usize>> = vec![None; fork.len()];
    for (fi, fork_line) in fork.iter().enumerate() {
        let matched = base
            .iter()
            .enumerate()
            .find(|(bi, base_line)| !consumed[*bi] && base_line.key == fork_line.key)
            .map(|(bi, _)| bi);
        if let Some(bi) = matched {
            consumed[bi] = true;
            fork_to_base[fi] = Some(bi);
            debug!("Matched fork ingredient {} to base line {}", fi, bi);
        }
    }

    let mut result = Vec::with_capacity(base.len().max(fork.len()));
    let mut emitted = vec![false; base.len()];
    let mut next_base = 0;

    for (fork_line, matched) in fork.iter().zip(&fork_to_base) {
        let Some(bi) = *matched else {
            result.push(LineDiff::added(fork_line.line));
            continue;
        };

        for ri in next_base..bi {
            if !consumed[ri] && !emitted[ri] {
                result.push(LineDiff::removed(base[ri].line));
                emitted[ri] = true;
            }
        }
        next_base = bi + 1;

        let base_line = &base[bi];
        if base_line.parsed.quantity == fork_line.parsed.quantity {
            result.push(LineDiff::unchanged(fork_line.line, base_line.line));
        } else {
            result.push(LineDiff {
                status: LineStatus::Modified,
                fork_line: Some(fork_line.line.to_string()),
                base_line: Some(base_line.line.to_string()),
                annotation: previous_amount(&base_line.parsed),
            });
        }
    }

    for (ri, base_line) in base.iter().enumerate() {
        if !consumed[ri] && !emitted[ri] {
            result.push(LineDiff::removed(base_line.line));
        }
    }

    result
}

/// Drop a leading `N. ` or `- ` list marker for comparison
fn strip_list_marker(line: &str) -> &str {
    let digits = line.len() - line.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    let line = match line[digits..].strip_prefix('.') {
        Some(rest)
            if digits > 0 && (rest.is_empty() || rest.starts_with(char::is_whitespace)) =>
        {
            rest.trim_start()
        }
        _ => line,
    };
    match line.strip_prefix('-') {
        Some(rest) => rest.trim_start(),
        None => line,
    }
}

/// Diff free-text lines by longest common subsequence.
///
/// List numbering and bullets are ignored when comparing. When two
/// alignments are equally long the fork's insertion is preferred over a
/// base deletion while backtracking.
pub fn diff_positional(base_content: &str, fork_content: &str) -> Vec<LineDiff> {
    let base = content_lines(base_content);
    let fork = content_lines(fork_content);
    let base_norm: Vec<&str> = base.iter().map(|l| strip_list_marker(l)).collect();
    let fork_norm: Vec<&str> = fork.iter().map(|l| strip_list_marker(l)).collect();

    let m = base.len();
    let n = fork.len();
    let mut dp = vec![vec![0usize; n + 1]; m + 1];
    for i in 1..=m {
        for j in 1..=n {
            dp[i][j] = if base_norm[i - 1] == fork_norm[j - 1] {
                dp[i - 1][j - 1] + 1
            } else {
                dp[i - 1][j].max(dp[i][j - 1])
            };
        }
    }

    let mut reversed = Vec::with_capacity(m + n);
    let (mut i, mut j) = (m, n);
    while i > 0 || j > 0 {
        if i > 0 && j > 0 && base_norm[i - 1] == fork_norm[j - 1] {
            reversed.push(LineDiff::unchanged(fork[j - 1], base[i - 1]));
            i -= 1;
            j -= 1;
        } else if j > 0 && (i == 0 || dp[i][j - 1] >= dp[i - 1][j]) {
            reversed.push(LineDiff::added(fork[j - 1]));
            j -= 1;
        } else {
            reversed.push(LineDiff::removed(base[i - 1]));
            i -= 1;
        }
    }

    reversed.reverse();
    reversed
}

/// Diff every section the fork defines against the base.
///
/// Sections the fork does not touch are absent from the result. The
/// preamble is never diffed.
pub fn compute_section_diffs(
    base_markdown: &str,
    fork_markdown: &str,
) -> IndexMap<String, SectionDiff> {
    let base_map: IndexMap<String, String> = parse_sections(base_markdown)
        .into_iter()
        .map(|s| (s.name, s.content))
        .collect();
    let fork_map: IndexMap<String, String> = parse_sections(fork_markdown)
        .into_iter()
        .map(|s| (s.name, s.content))
        .collect();

    let mut result = IndexMap::new();
    for (name, fork_content) in &fork_map {
        if name == PREAMBLE {
            continue;
        }

        let lines = match base_map.get(name) {
            None => content_lines(fork_content)
                .into_iter()
                .map(LineDiff::added)
                .collect(),
            Some(base_content) if name.eq_ignore_ascii_case("ingredients") => {
                diff_ingredients(base_content, fork_content)
            }
            Some(base_content) => diff_positional(base_content, fork_content),
        };

        let diff = SectionDiff::new(name, lines);
        debug!(
            "Section {:?}: {} lines, has_changes={}",
            name,
            diff.lines.len(),
            diff.has_changes
        );
        result.insert(name.clone(), diff);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn statuses(lines: &[LineDiff]) -> Vec<LineStatus> {
        lines.iter().map(|l| l.status).collect()
    }

    #[test]
    fn test_ingredient_quantity_change_is_modified() {
        let lines = diff_ingredients(
            "- 2 cups flour\n- 1 egg",
            "- 3 cups flour\n- 1 egg\n- 1 tsp vanilla",
        );
        assert_eq!(
            statuses(&lines),
            vec![LineStatus::Modified, LineStatus::Unchanged, LineStatus::Added]
        );
        assert_eq!(lines[0].annotation.as_deref(), Some("was 2 cups"));
        assert_eq!(lines[0].base_line.as_deref(), Some("- 2 cups flour"));
        assert_eq!(lines[2].fork_line.as_deref(), Some("- 1 tsp vanilla"));
    }

    #[test]
    fn test_ingredient_removed_keeps_base_position() {
        let lines = diff_ingredients(
            "- 1 egg\n- 1 cup milk\n- 2 cups flour",
            "- 1 egg\n- 2 cups flour",
        );
        assert_eq!(
            statuses(&lines),
            vec![LineStatus::Unchanged, LineStatus::Removed, LineStatus::Unchanged]
        );
        assert_eq!(lines[1].base_line.as_deref(), Some("- 1 cup milk"));
    }

    #[test]
    fn test_ingredient_trailing_removals() {
        let lines = diff_ingredients("- 1 egg\n- salt", "- 1 egg");
        assert_eq!(statuses(&lines), vec![LineStatus::Unchanged, LineStatus::Removed]);
    }

    #[test]
    fn test_ingredient_duplicates_consumed_in_order() {
        let lines = diff_ingredients("- 1 egg\n- 2 egg", "- 2 egg\n- 2 egg\n- 2 egg");
        assert_eq!(
            statuses(&lines),
            vec![LineStatus::Modified, LineStatus::Unchanged, LineStatus::Added]
        );
        assert_eq!(lines[0].annotation.as_deref(), Some("was 1"));
    }

    #[test]
    fn test_ingredient_reorder_reports_removal_once() {
        let lines = diff_ingredients("- 1 egg\n- 1 cup milk\n- salt", "- salt\n- 1 egg");
        let removed: Vec<_> = lines
            .iter()
            .filter(|l| l.status == LineStatus::Removed)
            .collect();
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].base_line.as_deref(), Some("- 1 cup milk"));
    }

    #[test]
    fn test_ingredient_lines_need_bullets() {
        let lines = diff_ingredients("- 1 egg\nsome prose", "- 1 egg");
        assert_eq!(statuses(&lines), vec![LineStatus::Unchanged]);
    }

    #[test]
    fn test_ingredient_quantity_added_has_no_annotation() {
        let lines = diff_ingredients("- salt", "- 1 tsp salt");
        // Different unit means different key
        assert_eq!(statuses(&lines), vec![LineStatus::Added, LineStatus::Removed]);

        let lines = diff_ingredients("- eggs", "- 3 eggs");
        assert_eq!(statuses(&lines), vec![LineStatus::Modified]);
        assert_eq!(lines[0].annotation, None);
    }

    #[test]
    fn test_positional_insertion() {
        let lines = diff_positional(
            "Preheat oven\nMix batter\nBake 30 min",
            "Preheat oven\nGrease pan\nMix batter\nBake 30 min",
        );
        assert_eq!(
            statuses(&lines),
            vec![
                LineStatus::Unchanged,
                LineStatus::Added,
                LineStatus::Unchanged,
                LineStatus::Unchanged
            ]
        );
        assert_eq!(lines[1].fork_line.as_deref(), Some("Grease pan"));
    }

    #[test]
    fn test_positional_ignores_numbering() {
        let lines = diff_positional("1. Mix\n2. Bake", "1. Preheat\n2. Mix\n3. Bake");
        assert_eq!(
            statuses(&lines),
            vec![LineStatus::Added, LineStatus::Unchanged, LineStatus::Unchanged]
        );
        assert_eq!(lines[1].fork_line.as_deref(), Some("2. Mix"));
        assert_eq!(lines[1].base_line.as_deref(), Some("1. Mix"));
    }

    #[test]
    fn test_positional_replacement_tie_break() {
        // Equal-length alignments: the fork line is reported before the base line
        let lines = diff_positional("A\nB", "A\nC");
        assert_eq!(
            statuses(&lines),
            vec![LineStatus::Unchanged, LineStatus::Removed, LineStatus::Added]
        );
        assert_eq!(lines[1].base_line.as_deref(), Some("B"));
        assert_eq!(lines[2].fork_line.as_deref(), Some("C"));
    }

    #[test]
    fn test_positional_swap() {
        let lines = diff_positional("A\nB", "B\nA");
        assert_eq!(
            statuses(&lines),
            vec![LineStatus::Removed, LineStatus::Unchanged, LineStatus::Added]
        );
    }

    #[test]
    fn test_strip_list_marker() {
        assert_eq!(strip_list_marker("12. Stir"), "Stir");
        assert_eq!(strip_list_marker("- Stir"), "Stir");
        assert_eq!(strip_list_marker("350 degrees"), "350 degrees");
        assert_eq!(strip_list_marker("Stir"), "Stir");
        assert_eq!(strip_list_marker("3."), "");
    }

    #[test]
    fn test_decimal_leading_lines_keep_whole_number() {
        assert_eq!(strip_list_marker("1.5 cups stock"), "1.5 cups stock");
        assert_eq!(
            statuses(&diff_positional("1.5 cups stock is enough", "2.5 cups stock is enough")),
            vec![LineStatus::Removed, LineStatus::Added]
        );

        let diffs = compute_section_diffs(
            "## Notes\n\n1.5 hours resting time",
            "## Notes\n\n3.5 hours resting time",
        );
        assert!(diffs["Notes"].has_changes);
    }

    #[test]
    fn test_compute_section_diffs() {
        let base = "# Cake\n\n## Ingredients\n\n- 2 cups flour\n\n## Instructions\n\n1. Mix\n2. Bake\n\n## Notes\n\nTasty";
        let fork = "---\nfork_name: Big\n---\n\n## Ingredients\n\n- 4 cups flour\n\n## Instructions\n\n1. Mix\n2. Bake\n\n## Storage\n\nFreeze it";
        let diffs = compute_section_diffs(base, fork);

        let names: Vec<&str> = diffs.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["Ingredients", "Instructions", "Storage"]);

        assert!(diffs["Ingredients"].has_changes);
        assert_eq!(diffs["Ingredients"].lines[0].status, LineStatus::Modified);
        assert!(!diffs["Instructions"].has_changes);
        assert_eq!(statuses(&diffs["Storage"].lines), vec![LineStatus::Added]);
        assert!(!diffs.contains_key("Notes"));
        assert!(!diffs.contains_key(PREAMBLE));
    }

    #[test]
    fn test_ingredients_heading_case_insensitive() {
        let diffs =
            compute_section_diffs("## INGREDIENTS\n- 1 cup milk", "## INGREDIENTS\n- 2 cups milk");
        assert_eq!(diffs["INGREDIENTS"].lines[0].status, LineStatus::Modified);
    }
}
