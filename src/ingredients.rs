//! Free-form ingredient line parsing.
//!
//! Turns lines such as `- 2 1/2 cups flour, sifted` into a quantity, a
//! canonical unit and a normalized name, and formats them back for display
//! with optional scaling.

use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// An ingredient line broken into its parts.
///
/// `name` is `display_text` with preparation phrases and parenthetical
/// asides removed, lowercased. It is what aggregation and matching key on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedIngredient {
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub name: String,
    pub display_text: String,
    pub original: String,
}

impl ParsedIngredient {
    /// Equality key used to match the same ingredient across versions
    pub fn key(&self) -> String {
        ingredient_key(self)
    }
}

const UNIT_MAP: &[(&str, &str)] = &[
    ("cup", "cup"),
    ("cups", "cup"),
    ("c", "cup"),
    ("tablespoon", "tbsp"),
    ("tablespoons", "tbsp"),
    ("tbsp", "tbsp"),
    ("tbs", "tbsp"),
    ("teaspoon", "tsp"),
    ("teaspoons", "tsp"),
    ("tsp", "tsp"),
    ("ounce", "oz"),
    ("ounces", "oz"),
    ("oz", "oz"),
    ("pound", "lb"),
    ("pounds", "lb"),
    ("lb", "lb"),
    ("lbs", "lb"),
    ("gram", "g"),
    ("grams", "g"),
    ("g", "g"),
    ("kilogram", "kg"),
    ("kilograms", "kg"),
    ("kg", "kg"),
    ("liter", "l"),
    ("liters", "l"),
    ("l", "l"),
    ("milliliter", "ml"),
    ("milliliters", "ml"),
    ("ml", "ml"),
    ("pint", "pint"),
    ("pints", "pint"),
    ("quart", "quart"),
    ("quarts", "quart"),
    ("gallon", "gallon"),
    ("gallons", "gallon"),
    ("can", "can"),
    ("cans", "can"),
    ("clove", "clove"),
    ("cloves", "clove"),
    ("slice", "slice"),
    ("slices", "slice"),
    ("piece", "piece"),
    ("pieces", "piece"),
    ("bunch", "bunch"),
    ("bunches", "bunch"),
    ("head", "head"),
    ("heads", "head"),
    ("sprig", "sprig"),
    ("sprigs", "sprig"),
    ("pinch", "pinch"),
    ("dash", "dash"),
    ("stick", "stick"),
    ("sticks", "stick"),
];

const WORD_NUMBERS: &[(&str, f64)] = &[
    ("one", 1.0),
    ("two", 2.0),
    ("three", 3.0),
    ("four", 4.0),
    ("five", 5.0),
    ("six", 6.0),
    ("seven", 7.0),
    ("eight", 8.0),
    ("nine", 9.0),
    ("ten", 10.0),
    ("half", 0.5),
    ("a", 1.0),
    ("an", 1.0),
];

const UNICODE_FRACTIONS: &[(char, f64)] = &[
    ('\u{00BC}', 1.0 / 4.0),
    ('\u{00BD}', 1.0 / 2.0),
    ('\u{00BE}', 3.0 / 4.0),
    ('\u{2153}', 1.0 / 3.0),
    ('\u{2154}', 2.0 / 3.0),
    ('\u{2155}', 1.0 / 5.0),
    ('\u{2156}', 2.0 / 5.0),
    ('\u{2157}', 3.0 / 5.0),
    ('\u{2158}', 4.0 / 5.0),
    ('\u{2159}', 1.0 / 6.0),
    ('\u{215A}', 5.0 / 6.0),
    ('\u{215B}', 1.0 / 8.0),
    ('\u{215C}', 3.0 / 8.0),
    ('\u{215D}', 5.0 / 8.0),
    ('\u{215E}', 7.0 / 8.0),
];

/// Cooking fractions `format_quantity` snaps to, with their rendering.
const COMMON_FRACTIONS: &[(f64, &str)] = &[
    (0.125, "1/8"),
    (0.25, "1/4"),
    (0.333, "1/3"),
    (0.375, "3/8"),
    (0.5, "1/2"),
    (0.625, "5/8"),
    (0.667, "2/3"),
    (0.75, "3/4"),
    (0.875, "7/8"),
];

const FRACTION_TOLERANCE: f64 = 0.05;

/// Units that read naturally without a plural `s`.
const NO_PLURAL_UNITS: &[&str] = &["oz", "tsp", "tbsp"];

static PARENTHETICAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\([^)]*\)\s*").expect("valid parenthetical pattern"));

static WORD_QUANTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:one|two|three|four|five|six|seven|eight|nine|ten|half|a|an)\b")
        .expect("valid word quantity pattern")
});

// Alternatives are tried left to right: unicode fraction (with optional whole
// prefix), mixed number, simple fraction, range, plain decimal.
static NUMERIC_QUANTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:[0-9]+(?:\.[0-9]+)?\s*[¼½¾⅓⅔⅕⅖⅗⅘⅙⅚⅛⅜⅝⅞]|[¼½¾⅓⅔⅕⅖⅗⅘⅙⅚⅛⅜⅝⅞]|[0-9]+\s+[0-9]+/[0-9]+|[0-9]+/[0-9]+|[0-9]+(?:\.[0-9]+)?\s*-\s*[0-9]+(?:\.[0-9]+)?|[0-9]+(?:\.[0-9]+)?)",
    )
    .expect("valid numeric quantity pattern")
});

static PREP_WORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i),?\s*\b(?:diced|minced|chopped|sliced|thinly sliced|grated|shredded|crushed|ground|melted|softened|warmed|cooled|room temperature|to taste|for garnish|for serving|optional|divided|packed|sifted|peeled|seeded|trimmed|halved|quartered|cubed|julienned|roughly chopped|finely chopped|finely diced|finely minced)\b.*$",
    )
    .expect("valid preparation pattern")
});

fn canonical_unit(token: &str) -> Option<&'static str> {
    UNIT_MAP
        .iter()
        .find(|(alias, _)| *alias == token)
        .map(|(_, unit)| *unit)
}

fn word_number(word: &str) -> Option<f64> {
    WORD_NUMBERS
        .iter()
        .find(|(w, _)| w.eq_ignore_ascii_case(word))
        .map(|(_, value)| *value)
}

fn unicode_fraction(c: char) -> Option<f64> {
    UNICODE_FRACTIONS
        .iter()
        .find(|(ch, _)| *ch == c)
        .map(|(_, value)| *value)
}

/// Ingredient text with parenthetical asides blanked out.
///
/// Each byte of `text` remembers the byte of `source` it came from, so a
/// position reached while scanning `text` can be mapped back to the source
/// with the asides still in place.
struct ScanText<'a> {
    source: &'a str,
    text: String,
    origin: Vec<usize>,
}

impl<'a> ScanText<'a> {
    fn without_asides(source: &'a str) -> Self {
        let mut text = String::with_capacity(source.len());
        let mut origin = Vec::with_capacity(source.len() + 1);
        let mut last = 0;

        for aside in PARENTHETICAL.find_iter(source) {
            text.push_str(&source[last..aside.start()]);
            origin.extend(last..aside.start());
            text.push(' ');
            origin.push(aside.start());
            last = aside.end();
        }
        text.push_str(&source[last..]);
        origin.extend(last..source.len());
        origin.push(source.len());

        ScanText {
            source,
            text,
            origin,
        }
    }

    /// Source text from the position `pos` of the scan text onwards
    fn source_from(&self, pos: usize) -> &'a str {
        &self.source[self.origin[pos]..]
    }
}

fn skip_whitespace(text: &str, pos: usize) -> usize {
    let rest = &text[pos..];
    pos + (rest.len() - rest.trim_start().len())
}

fn parse_fraction(s: &str) -> Option<f64> {
    let (numerator, denominator) = s.split_once('/')?;
    let numerator: f64 = numerator.trim().parse().ok()?;
    let denominator: f64 = denominator.trim().parse().ok()?;
    if denominator == 0.0 {
        return None;
    }
    Some(numerator / denominator)
}

/// Value of a numeric quantity token already shaped by `NUMERIC_QUANTITY`.
fn parse_quantity_token(token: &str) -> Option<f64> {
    if let Some((idx, value)) = token
        .char_indices()
        .find_map(|(idx, c)| unicode_fraction(c).map(|value| (idx, value)))
    {
        let prefix = token[..idx].trim();
        let whole = if prefix.is_empty() {
            0.0
        } else {
            prefix.parse::<f64>().unwrap_or(0.0)
        };
        return Some(whole + value);
    }

    if let Some((_, upper)) = token.split_once('-') {
        return upper.trim().parse().ok();
    }

    if let Some((whole, fraction)) = token.split_once(char::is_whitespace) {
        let whole: f64 = whole.parse().ok()?;
        return Some(whole + parse_fraction(fraction.trim())?);
    }

    if token.contains('/') {
        return parse_fraction(token);
    }

    token.parse().ok()
}

fn is_trailing_junk(c: char) -> bool {
    c.is_whitespace() || matches!(c, ',' | '-' | '\u{2013}' | '\u{2014}')
}

/// Parse one ingredient line.
///
/// Never fails: a line without a recognizable quantity comes back with
/// `quantity == None` and its lowercased text as the name.
pub fn parse_ingredient(line: &str) -> ParsedIngredient {
    let original = line.trim();
    let text = original.strip_prefix('-').unwrap_or(original).trim_start();

    let scan = ScanText::without_asides(text);
    let parse_text = scan.text.as_str();

    let mut pos = skip_whitespace(parse_text, 0);
    // Where the display text starts; asides after this point survive
    let mut display_from = 0;
    let mut quantity = None;

    if let Some(word) = WORD_QUANTITY.find(&parse_text[pos..]) {
        if let Some(value) = word_number(word.as_str()) {
            quantity = Some(value);
            pos += word.end();
            display_from = pos;
            pos = skip_whitespace(parse_text, pos);
        }
    }

    if quantity.is_none() {
        if let Some(token) = NUMERIC_QUANTITY.find(&parse_text[pos..]) {
            if let Some(value) = parse_quantity_token(token.as_str().trim()) {
                quantity = Some(value);
                pos += token.end();
                display_from = pos;
                pos = skip_whitespace(parse_text, pos);
            }
        }
    }

    let mut unit = None;
    let rest = &parse_text[pos..];
    if let Some(end) = rest.find(char::is_whitespace) {
        let candidate = rest[..end].to_lowercase();
        let candidate = candidate.strip_suffix('.').unwrap_or(&candidate);
        if let Some(canonical) = canonical_unit(candidate) {
            unit = Some(canonical.to_string());
            pos += end;
            display_from = pos;
            pos = skip_whitespace(parse_text, pos);
        }
    }

    let rest = &parse_text[pos..];
    let has_connector = rest
        .get(..2)
        .is_some_and(|word| word.eq_ignore_ascii_case("of"))
        && rest[2..].starts_with(char::is_whitespace);
    if has_connector {
        pos += 2;
        display_from = pos;
        pos = skip_whitespace(parse_text, pos);
    }

    let display_text = scan.source_from(display_from).trim().to_string();

    let stripped = PREP_WORDS.replace(&parse_text[pos..], "");
    let stripped = stripped.trim_end_matches(is_trailing_junk).trim();
    let mut name = if stripped.is_empty() {
        display_text.to_lowercase()
    } else {
        stripped.to_lowercase()
    };
    if name.is_empty() {
        name = text.to_lowercase();
    }

    debug!(
        "Parsed ingredient {:?}: quantity={:?} unit={:?} name={:?}",
        original, quantity, unit, name
    );

    ParsedIngredient {
        quantity,
        unit,
        name,
        display_text,
        original: original.to_string(),
    }
}

/// Format a quantity for display, preferring common cooking fractions.
///
/// `2.5` renders as `2 1/2`, `0.5` as `1/2`, `3.0` as `3`; anything not
/// close to a known fraction gets one decimal place.
pub fn format_quantity(qty: f64) -> String {
    if qty == qty.floor() {
        return format!("{qty}");
    }

    let whole = qty.floor();
    let frac = qty - whole;

    for (value, display) in COMMON_FRACTIONS {
        if (frac - value).abs() < FRACTION_TOLERANCE {
            return if whole > 0.0 {
                format!("{whole} {display}")
            } else {
                display.to_string()
            };
        }
    }

    let formatted = format!("{qty:.1}");
    match formatted.strip_suffix(".0") {
        Some(trimmed) => trimmed.to_string(),
        None => formatted,
    }
}

/// Unit as it reads next to `quantity`: `cup` becomes `cups` above one.
pub fn display_unit(unit: &str, quantity: f64) -> String {
    if quantity > 1.0
        && !unit.is_empty()
        && !unit.ends_with('s')
        && !NO_PLURAL_UNITS.contains(&unit)
    {
        format!("{unit}s")
    } else {
        unit.to_string()
    }
}

/// Render a parsed ingredient with its quantity multiplied by `scale_factor`.
///
/// Lines without a quantity come back as their original text.
pub fn format_ingredient(parsed: &ParsedIngredient, scale_factor: f64) -> String {
    let Some(quantity) = parsed.quantity else {
        return parsed.original.clone();
    };

    let scaled = quantity * scale_factor;
    let qty_str = format_quantity(scaled);
    let display_unit = display_unit(parsed.unit.as_deref().unwrap_or(""), scaled);

    [qty_str.as_str(), display_unit.as_str(), parsed.display_text.as_str()]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Equality key for an ingredient: canonical unit (or `_`) and name.
///
/// Independent of quantity, so `2 cups flour` and `3 cups flour` share a key.
pub fn ingredient_key(parsed: &ParsedIngredient) -> String {
    format!("{}:{}", parsed.unit.as_deref().unwrap_or("_"), parsed.name)
}
