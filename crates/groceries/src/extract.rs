//! Line item extraction from free-typed grocery text.
//!
//! Each non-blank line becomes at most one `(name, count)` pair. The parser is
//! deliberately forgiving: lines it cannot split are kept whole with a count of
//! one, and lines that normalize to nothing are dropped.
//!
//! Per line:
//! 1. Strip one leading bullet (`-`, `*`, `•` + whitespace) or numbering (`12.` / `3)`).
//! 2. Leading count: `3 Apples`, `3Apples`, `3x Apples`, `3 × Apples`.
//! 3. Otherwise trailing count: `Banana 5`, `Milk2`, `Milk - 2`, `Bread: 1`, `Eggs, 12`, `Milk x 2`.
//! 4. Otherwise the whole line is the name and the count is 1.
//!
//! The leading pattern always wins: `3 Apples 2` is three of `Apples 2`.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

// `[0-9]` rather than `\d`: counts are ASCII, other digits stay in the name.
static MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[-*•]\s+|[0-9]+[.)]\s*)").expect("valid marker regex"));

// A multiplier must stand alone (`3x Apples`) so `3 xylophones` keeps its `x`.
static LEADING_COUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<count>[0-9]+)(?:\s*[xX×](?:\s+|$)|\s*)(?P<name>.*)$")
        .expect("valid leading-count regex")
});

static TRAILING_COUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<name>.*?)(?:\s+[xX×]\s*|\s*[:,\-]\s*|\s*)(?P<count>[0-9]+)$")
        .expect("valid trailing-count regex")
});

/// One recognized grocery line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedLine {
    /// The input line exactly as received.
    pub raw_text: String,
    /// Normalized item name; never empty.
    pub name: String,
    /// Quantity; always >= 1.
    pub count: u32,
}

/// Parse a multi-line block into grocery lines, preserving input order.
pub fn extract(text: &str) -> Vec<ParsedLine> {
    text.lines().filter_map(extract_line).collect()
}

/// Parse a single line. Returns `None` for blank lines and lines with no usable name.
pub fn extract_line(line: &str) -> Option<ParsedLine> {
    let trimmed = line.trim_start();
    if trimmed.trim_end().is_empty() {
        return None;
    }

    let body = strip_marker(trimmed);
    if body.is_empty() {
        return None;
    }

    let (name, count) = split_count(body);
    let name = normalize_name(name);
    if name.is_empty() {
        return None;
    }

    Some(ParsedLine {
        raw_text: line.to_string(),
        name,
        count: coerce_count(count),
    })
}

/// Serialize parsed lines back into text that `extract` reads identically.
pub fn to_text(lines: &[ParsedLine]) -> String {
    lines
        .iter()
        .map(|l| format!("{} x {}", l.name, l.count))
        .collect::<Vec<_>>()
        .join("\n")
}

fn strip_marker(line: &str) -> &str {
    match MARKER.find(line) {
        Some(m) => line[m.end()..].trim(),
        None => line.trim(),
    }
}

/// Split a marker-free line into `(name, raw count digits)`.
fn split_count(body: &str) -> (&str, Option<&str>) {
    if let Some(caps) = LEADING_COUNT.captures(body) {
        let name = caps.name("name").map_or("", |m| m.as_str());
        let count = caps.name("count").map(|m| m.as_str());
        return (name, count);
    }

    if let Some(caps) = TRAILING_COUNT.captures(body) {
        let name = caps.name("name").map_or("", |m| m.as_str());
        let count = caps.name("count").map(|m| m.as_str());
        return (name, count);
    }

    (body, None)
}

/// Trim, drop one pair of matching surrounding quotes, trim again.
fn normalize_name(name: &str) -> String {
    let name = name.trim();
    let unquoted = ['"', '\'']
        .iter()
        .find_map(|q| {
            if name.len() >= 2 && name.starts_with(*q) && name.ends_with(*q) {
                Some(&name[1..name.len() - 1])
            } else {
                None
            }
        })
        .unwrap_or(name);
    unquoted.trim().to_string()
}

/// Zero, unparseable (e.g. overflowing) or missing counts become 1.
fn coerce_count(raw: Option<&str>) -> u32 {
    raw.and_then(|s| s.parse::<u32>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn pairs(text: &str) -> Vec<(String, u32)> {
        extract(text).into_iter().map(|l| (l.name, l.count)).collect()
    }

    fn one(line: &str) -> (String, u32) {
        let l = extract_line(line).unwrap_or_else(|| panic!("expected a parsed line for {line:?}"));
        (l.name, l.count)
    }

    #[test]
    fn leading_count_variants() {
        assert_eq!(one("3 Apples"), ("Apples".to_string(), 3));
        assert_eq!(one("3x Apples"), ("Apples".to_string(), 3));
        assert_eq!(one("3 X Apples"), ("Apples".to_string(), 3));
        assert_eq!(one("2 × Lemons"), ("Lemons".to_string(), 2));
    }

    #[test]
    fn trailing_count_variants() {
        assert_eq!(one("Banana 5"), ("Banana".to_string(), 5));
        assert_eq!(one("Milk - 2"), ("Milk".to_string(), 2));
        assert_eq!(one("Milk x 2"), ("Milk".to_string(), 2));
        assert_eq!(one("Milk ×2"), ("Milk".to_string(), 2));
        assert_eq!(one("Eggs, 12"), ("Eggs".to_string(), 12));
        assert_eq!(one("Cheese:4"), ("Cheese".to_string(), 4));
    }

    #[test]
    fn bullet_then_trailing_count() {
        assert_eq!(one("- Bread: 1"), ("Bread".to_string(), 1));
        assert_eq!(one("* Butter 2"), ("Butter".to_string(), 2));
        assert_eq!(one("• Rice"), ("Rice".to_string(), 1));
    }

    #[test]
    fn numbering_is_stripped_once() {
        assert_eq!(one("1. Flour"), ("Flour".to_string(), 1));
        assert_eq!(one("2) Sugar 3"), ("Sugar".to_string(), 3));
        assert_eq!(one("4.5 Carrots"), ("Carrots".to_string(), 5));
        assert_eq!(one("- - Milk"), ("- Milk".to_string(), 1));
    }

    #[test]
    fn no_digits_defaults_to_one() {
        assert_eq!(one("Yogurt"), ("Yogurt".to_string(), 1));
        assert_eq!(one("  Greek yogurt  "), ("Greek yogurt".to_string(), 1));
    }

    #[test]
    fn counts_glued_to_names_are_split() {
        assert_eq!(one("3Apples"), ("Apples".to_string(), 3));
        assert_eq!(one("Milk2"), ("Milk".to_string(), 2));
        assert_eq!(one("Banana5"), ("Banana".to_string(), 5));
        assert_eq!(one("Vitamin B12"), ("Vitamin B".to_string(), 12));
    }

    #[test]
    fn glued_multiplier_letter_stays_in_the_name() {
        assert_eq!(one("3 xylophones"), ("xylophones".to_string(), 3));
        assert_eq!(one("3xApples"), ("xApples".to_string(), 3));
    }

    #[test]
    fn non_ascii_digits_stay_in_the_name() {
        assert_eq!(one("٣ Apples"), ("٣ Apples".to_string(), 1));
        assert_eq!(one("Milk ٢"), ("Milk ٢".to_string(), 1));
        assert_eq!(one("٣. Rice"), ("٣. Rice".to_string(), 1));
    }

    #[test]
    fn leading_pattern_wins_over_trailing() {
        assert_eq!(one("3 Apples 2"), ("Apples 2".to_string(), 3));
    }

    #[test]
    fn zero_and_overflowing_counts_become_one() {
        assert_eq!(one("Milk x 0"), ("Milk".to_string(), 1));
        assert_eq!(one("0 Eggs"), ("Eggs".to_string(), 1));
        assert_eq!(one("Rice 99999999999999999999"), ("Rice".to_string(), 1));
    }

    #[test]
    fn surrounding_quotes_are_stripped_once() {
        assert_eq!(one("\"Oat milk\" 2"), ("Oat milk".to_string(), 2));
        assert_eq!(one("'Brie'"), ("Brie".to_string(), 1));
        assert_eq!(one("''Brie''"), ("'Brie'".to_string(), 1));
        assert_eq!(one("\"Brie'"), ("\"Brie'".to_string(), 1));
    }

    #[test]
    fn blank_and_empty_lines_are_dropped() {
        assert!(extract_line("").is_none());
        assert!(extract_line("   ").is_none());
        assert!(extract_line("- ").is_none());
        assert!(extract_line("3.").is_none());
        assert!(extract_line("\"\"").is_none());
        assert!(extract_line("12").is_none());
        assert!(extract_line("4 x").is_none());
    }

    #[test]
    fn multi_line_block_keeps_order_and_raw_text() {
        let text = "- Milk x 2\n\n3 Apples\n   \nYogurt\n";
        assert_eq!(
            pairs(text),
            vec![
                ("Milk".to_string(), 2),
                ("Apples".to_string(), 3),
                ("Yogurt".to_string(), 1),
            ]
        );
        assert_eq!(extract(text)[0].raw_text, "- Milk x 2");
    }

    #[test]
    fn handles_crlf_input() {
        assert_eq!(
            pairs("Milk 2\r\nBread\r\n"),
            vec![("Milk".to_string(), 2), ("Bread".to_string(), 1)]
        );
    }

    // Words avoid `x`/`X` so a name never starts or ends with a multiplier token.
    const WORDS: &str = "[A-Wa-w][a-w]{1,8}( [A-Wa-w][a-w]{1,8}){0,2}";

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        #[test]
        fn leading_count_is_recovered(name in WORDS, count in 1u32..10_000) {
            let l = extract_line(&format!("{count} {name}")).unwrap();
            prop_assert_eq!(l.name, name);
            prop_assert_eq!(l.count, count);
        }

        #[test]
        fn trailing_count_with_separator_is_recovered(
            name in WORDS,
            sep in prop::sample::select(vec![" - ", ": ", ", ", " x ", " × ", " "]),
            count in 1u32..10_000,
        ) {
            let l = extract_line(&format!("{name}{sep}{count}")).unwrap();
            prop_assert_eq!(l.name, name);
            prop_assert_eq!(l.count, count);
        }

        #[test]
        fn reparsing_serialized_lines_is_stable(
            items in prop::collection::vec((WORDS, 1u32..500), 0..8)
        ) {
            let text = items
                .iter()
                .map(|(n, c)| format!("{n} x {c}"))
                .collect::<Vec<_>>()
                .join("\n");
            let first = extract(&text);
            let second = extract(&to_text(&first));
            let a: Vec<_> = first.iter().map(|l| (l.name.clone(), l.count)).collect();
            let b: Vec<_> = second.iter().map(|l| (l.name.clone(), l.count)).collect();
            prop_assert_eq!(a, b);
        }

        #[test]
        fn emitted_lines_are_never_empty(text in "\\PC{0,80}") {
            for l in extract(&text) {
                prop_assert!(!l.name.is_empty());
                prop_assert!(l.count >= 1);
            }
        }
    }
}
