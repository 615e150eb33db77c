//! Rewrites scraped or typed ingredient strings into the shape the parser
//! reads best, before they are stored.

use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Number words and the digits they are rewritten to.
const WORD_NUMBERS: &[(&str, &str)] = &[
    ("a", "1"),
    ("an", "1"),
    ("half", "1/2"),
    ("one", "1"),
    ("two", "2"),
    ("three", "3"),
    ("four", "4"),
    ("five", "5"),
    ("six", "6"),
    ("seven", "7"),
    ("eight", "8"),
    ("nine", "9"),
    ("ten", "10"),
    ("eleven", "11"),
    ("twelve", "12"),
];

const CONTAINER_WORDS: &[&str] = &[
    "can",
    "bag",
    "box",
    "bottle",
    "jar",
    "package",
    "packet",
    "container",
    "carton",
    "pouch",
    "tube",
];

/// Alternation of the number words, longest first so `an` never shadows `one`.
fn word_number_pattern() -> String {
    let mut words: Vec<&str> = WORD_NUMBERS.iter().map(|(word, _)| *word).collect();
    words.sort_by_key(|word| std::cmp::Reverse(word.len()));
    words.join("|")
}

fn word_to_digits(word: &str) -> &'static str {
    WORD_NUMBERS
        .iter()
        .find(|(w, _)| w.eq_ignore_ascii_case(word))
        .map(|(_, digits)| *digits)
        .unwrap_or("1")
}

// "One 15-ounce can", "two 8.5-ounce bags", "a 12 oz bottle"
static COMPOUND_CONTAINER: LazyLock<Regex> = LazyLock::new(|| {
    let containers = CONTAINER_WORDS
        .iter()
        .map(|word| format!("{word}s?"))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(
        r"(?i)\b({})\s+([0-9]+(?:\.[0-9]+)?)[- ]?(?:ounces?|oz\.?)\s+({})\b",
        word_number_pattern(),
        containers
    ))
    .expect("valid compound container pattern")
});

// "1-1/2" but not the range "2-3"
static HYPHENATED_MIXED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([0-9]+)-([0-9]+/[0-9]+)\b").expect("valid hyphenated number pattern")
});

static LEADING_WORD_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)^({})\b(?:\s+(?:a|an)\b)?",
        word_number_pattern()
    ))
    .expect("valid leading word number pattern")
});

/// Normalize a single ingredient string.
///
/// Three passes, in order:
/// 1. `One 15-ounce can beans` becomes `1 (15 ounce) can beans`
/// 2. `1-1/2 cups` becomes `1 1/2 cups`
/// 3. `one cup flour` becomes `1 cup flour`, `half a cup` becomes `1/2 cup`
pub fn normalize_ingredient(s: &str) -> String {
    let s = s.trim();
    if s.is_empty() {
        return String::new();
    }

    let s = COMPOUND_CONTAINER.replace_all(s, |caps: &Captures| {
        format!("{} ({} ounce) {}", word_to_digits(&caps[1]), &caps[2], &caps[3])
    });

    let s = HYPHENATED_MIXED.replace_all(&s, "$1 $2");

    LEADING_WORD_NUMBER
        .replace(&s, |caps: &Captures| word_to_digits(&caps[1]).to_string())
        .into_owned()
}

/// Normalize a list of ingredient strings.
pub fn normalize_ingredients(items: &[String]) -> Vec<String> {
    items.iter().map(|item| normalize_ingredient(item)).collect()
}
