//! Parsing model output into grocery lines.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value as JsonValue;

use pantry_groceries::{GroceryLine, PerishWindow};

/// Greedy: first `[` through last `]`, across newlines.
static JSON_ARRAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\[.*\]").expect("valid array regex"));

/// Parse the model's answer into grocery lines.
///
/// Anything that is not a JSON array of objects with a `name` yields no
/// lines. Freshness bounds are attached only when both are present and form
/// a valid window.
pub fn parse_items(response_text: &str) -> Vec<GroceryLine> {
    let Some(array) = JSON_ARRAY.find(response_text) else {
        tracing::debug!("model output contained no JSON array");
        return Vec::new();
    };

    let parsed: JsonValue = match serde_json::from_str(array.as_str()) {
        Ok(v) => v,
        Err(e) => {
            tracing::debug!(error = %e, "model output array is not valid JSON");
            return Vec::new();
        }
    };

    let Some(elements) = parsed.as_array() else {
        return Vec::new();
    };

    elements.iter().filter_map(line_from_element).collect()
}

fn line_from_element(element: &JsonValue) -> Option<GroceryLine> {
    let object = element.as_object()?;
    let name = match object.get("name")? {
        JsonValue::String(s) => s.trim().to_string(),
        JsonValue::Null => return None,
        other => other.to_string(),
    };
    if name.is_empty() {
        return None;
    }

    let mut line = GroceryLine::new(name);

    if let Some(count) = object.get("count").and_then(lenient_int) {
        line = line.with_count(count);
    }

    let min = object.get("min_days").and_then(lenient_int);
    let max = object.get("max_days").and_then(lenient_int);
    if let (Some(min), Some(max)) = (min, max) {
        if let Ok(window) = PerishWindow::new(min, max) {
            line = line.with_perish(Some(window));
        }
    }

    Some(line)
}

/// Integers, floats (truncated) and numeric strings.
fn lenient_int(value: &JsonValue) -> Option<i64> {
    match value {
        JsonValue::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        JsonValue::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
        }
        _ => None,
    }
}
