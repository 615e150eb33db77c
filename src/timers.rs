//! Finds cooking durations ("simmer 10-15 minutes", "an hour") in free text.

use log::debug;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// A duration found in text. Indices are byte offsets into the input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerMatch {
    pub start_index: usize,
    pub end_index: usize,
    pub original_text: String,
    pub total_seconds: u64,
    pub label: String,
}

static DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)([0-9]+(?:[./][0-9]+)?)\s*(?:-\s*([0-9]+(?:[./][0-9]+)?)\s*)?(seconds?|secs?|minutes?|mins?|hours?|hrs?)\b(?:\s+and\s+([0-9]+(?:[./][0-9]+)?)\s*(minutes?|mins?|seconds?|secs?)\b)?",
    )
    .expect("valid duration pattern")
});

static IMPLICIT_DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(half\s+)?(?:a|an|another|one)\s+(second|sec|minute|min|hour|hr)\b")
        .expect("valid implicit duration pattern")
});

fn parse_number(token: &str) -> f64 {
    match token.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.parse().unwrap_or(0.0);
            let den: f64 = den.parse().unwrap_or(0.0);
            if den == 0.0 {
                0.0
            } else {
                num / den
            }
        }
        None => token.parse().unwrap_or(0.0),
    }
}

fn unit_seconds(unit: &str) -> f64 {
    let unit = unit.to_lowercase();
    match unit.trim_end_matches('s') {
        "hour" | "hr" => 3600.0,
        "second" | "sec" => 1.0,
        _ => 60.0,
    }
}

/// Human label: `1 hr 30 min`, `45 min` or `30 sec`.
pub fn format_duration(total_seconds: u64) -> String {
    if total_seconds >= 3600 {
        let mut hours = total_seconds / 3600;
        let mut minutes = ((total_seconds % 3600) as f64 / 60.0).round() as u64;
        if minutes == 60 {
            hours += 1;
            minutes = 0;
        }
        return if minutes > 0 {
            format!("{hours} hr {minutes} min")
        } else {
            format!("{hours} hr")
        };
    }
    if total_seconds >= 60 {
        let minutes = (total_seconds as f64 / 60.0).round() as u64;
        return if minutes >= 60 {
            format_duration(3600)
        } else {
            format!("{minutes} min")
        };
    }
    format!("{total_seconds} sec")
}

fn explicit_seconds(caps: &Captures) -> f64 {
    // A range counts as its upper bound
    let amount = caps
        .get(2)
        .or_else(|| caps.get(1))
        .map(|m| parse_number(m.as_str()))
        .unwrap_or(0.0);
    let mut seconds = amount * unit_seconds(&caps[3]);
    if let (Some(extra), Some(unit)) = (caps.get(4), caps.get(5)) {
        seconds += parse_number(extra.as_str()) * unit_seconds(unit.as_str());
    }
    seconds
}

fn timer(start: usize, end: usize, text: &str, seconds: f64) -> Option<TimerMatch> {
    let total = seconds.round();
    if total <= 0.0 {
        return None;
    }
    let total_seconds = total as u64;
    Some(TimerMatch {
        start_index: start,
        end_index: end,
        original_text: text.to_string(),
        total_seconds,
        label: format_duration(total_seconds),
    })
}

/// Find every duration in `text`, ordered by start offset.
///
/// Explicit amounts are found first; implicit singular ones ("a minute",
/// "another hour", "half an hour") only where they do not overlap an
/// explicit match.
pub fn parse_timers(text: &str) -> Vec<TimerMatch> {
    let mut matches: Vec<TimerMatch> = DURATION
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            timer(whole.start(), whole.end(), whole.as_str(), explicit_seconds(&caps))
        })
        .collect();

    let implicit: Vec<TimerMatch> = IMPLICIT_DURATION
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let overlaps = matches
                .iter()
                .any(|m| whole.start() < m.end_index && m.start_index < whole.end());
            if overlaps {
                return None;
            }
            let share = if caps.get(1).is_some() { 0.5 } else { 1.0 };
            timer(whole.start(), whole.end(), whole.as_str(), share * unit_seconds(&caps[2]))
        })
        .collect();

    matches.extend(implicit);
    matches.sort_by_key(|m| m.start_index);
    debug!("Found {} timers", matches.len());
    matches
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_minutes() {
        let timers = parse_timers("Bake for 25 minutes.");
        assert_eq!(timers.len(), 1);
        assert_eq!(timers[0].total_seconds, 1500);
        assert_eq!(timers[0].label, "25 min");
        assert_eq!(timers[0].original_text, "25 minutes");
        assert_eq!(timers[0].start_index, 9);
        assert_eq!(timers[0].end_index, 19);
    }

    #[test]
    fn test_range_uses_upper_bound() {
        let timers = parse_timers("Simmer 10-15 mins");
        assert_eq!(timers[0].total_seconds, 900);
        assert_eq!(timers[0].original_text, "10-15 mins");
    }

    #[test]
    fn test_compound_duration() {
        let timers = parse_timers("Roast 1 hour and 30 minutes");
        assert_eq!(timers.len(), 1);
        assert_eq!(timers[0].total_seconds, 5400);
        assert_eq!(timers[0].label, "1 hr 30 min");
    }

    #[test]
    fn test_fractional_amounts() {
        assert_eq!(parse_timers("1.5 hours")[0].total_seconds, 5400);
        assert_eq!(parse_timers("1/2 hr")[0].label, "30 min");
    }

    #[test]
    fn test_seconds_and_hours_labels() {
        assert_eq!(parse_timers("30 seconds")[0].label, "30 sec");
        assert_eq!(parse_timers("2 hrs")[0].label, "2 hr");
    }

    #[test]
    fn test_implicit_durations() {
        let timers = parse_timers("Stir for a minute, then rest another hour.");
        assert_eq!(timers.len(), 2);
        assert_eq!(timers[0].total_seconds, 60);
        assert_eq!(timers[0].original_text, "a minute");
        assert_eq!(timers[1].total_seconds, 3600);
        assert_eq!(timers[1].label, "1 hr");
    }

    #[test]
    fn test_half_an_hour() {
        let timers = parse_timers("Let the dough rise for half an hour.");
        assert_eq!(timers.len(), 1);
        assert_eq!(timers[0].original_text, "half an hour");
        assert_eq!(timers[0].total_seconds, 1800);
        assert_eq!(timers[0].label, "30 min");

        let timers = parse_timers("Chill for half a minute");
        assert_eq!(timers[0].total_seconds, 30);
    }

    #[test]
    fn test_sorted_by_start() {
        let timers = parse_timers("Wait one minute, then bake 20 minutes.");
        let starts: Vec<usize> = timers.iter().map(|t| t.start_index).collect();
        assert_eq!(timers.len(), 2);
        assert!(starts[0] < starts[1]);
        assert_eq!(timers[0].total_seconds, 60);
    }

    #[test]
    fn test_zero_and_non_units_skipped() {
        assert!(parse_timers("0 minutes").is_empty());
        assert!(parse_timers("Add 2 minced cloves").is_empty());
        assert!(parse_timers("a mint leaf").is_empty());
    }

    #[test]
    fn test_label_rounding_carries() {
        assert_eq!(format_duration(7199), "2 hr");
        assert_eq!(format_duration(90), "2 min");
        assert_eq!(format_duration(3570), "1 hr");
    }
}
