//! Tech stack parser: turns one scraped tag cell into raw skill strings.
//!
//! Cells arrive in two shapes: structured JSON (a list of names, or an object keyed by
//! name with a proficiency value) and delimited text such as `"Java: Regular; Go: Junior"`.
//! Parsing is pure and never fails; anything unusable yields an empty list.

use serde_json::Value;

/// Raw strings this long are scraper noise, not skill names.
pub const MAX_RAW_SKILL_LEN: usize = 100;

/// Parses one raw tag cell into an ordered list of raw skill strings.
pub fn parse_tech_stack(cell: &str) -> Vec<String> {
    let text = cell.trim();
    if text.is_empty() {
        return Vec::new();
    }

    if text.starts_with('[') || text.starts_with('{') {
        if let Some(skills) = parse_structured(text) {
            if !skills.is_empty() {
                return skills;
            }
        }
    }

    parse_delimited(text)
}

/// Like [`parse_tech_stack`] but keeps only names short enough to be real skills.
pub fn parse_skill_names(cell: &str) -> Vec<String> {
    parse_tech_stack(cell)
        .into_iter()
        .filter(|s| s.chars().count() < MAX_RAW_SKILL_LEN)
        .collect()
}

fn parse_structured(text: &str) -> Option<Vec<String>> {
    let names: Vec<String> = match serde_json::from_str::<Value>(text).ok()? {
        Value::Array(items) => items.iter().filter_map(value_to_name).collect(),
        Value::Object(map) => map.keys().cloned().collect(),
        _ => return None,
    };

    Some(
        names
            .into_iter()
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .collect(),
    )
}

fn value_to_name(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn parse_delimited(text: &str) -> Vec<String> {
    let delimiter = if text.contains(';') { ';' } else { ',' };
    text.split(delimiter)
        .map(|part| match part.split_once(':') {
            // "Java: Regular" carries a proficiency after the colon.
            Some((name, _level)) => name,
            None => part,
        })
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(String::from)
        .collect()
}
