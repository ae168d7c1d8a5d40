//! Recovery for classifier output that is not quite JSON.
//!
//! The classifier answers with one JSON object. Two things go wrong in practice: prose around
//! the object, and output cut off at the token limit. The latter is repaired by cutting back to
//! the last separator between top-level members and closing the root container, so a partially
//! written member is dropped whole instead of being half-applied.

use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Recovered {
    /// Parsed as-is (after trimming any surrounding prose).
    Clean(Value),
    /// Parsed only after truncation repair; trailing members may be missing.
    Repaired(Value),
}

impl Recovered {
    pub fn into_value(self) -> Value {
        match self {
            Recovered::Clean(v) | Recovered::Repaired(v) => v,
        }
    }

    pub fn was_repaired(&self) -> bool {
        matches!(self, Recovered::Repaired(_))
    }
}

/// Parses `text` as JSON, falling back to prose trimming and then truncation repair.
///
/// Prose may itself contain brackets ("Merges [2]: {...}"), so every `{`/`[` is tried as the
/// start of the payload, objects before lists: first for a complete value, then for a
/// repairable one.
pub fn parse_with_repair(text: &str) -> Option<Recovered> {
    let text = text.trim();
    if let Ok(value) = serde_json::from_str::<Value>(text) {
        return Some(Recovered::Clean(value));
    }

    let end = text.rfind(['}', ']']);
    let starts: Vec<usize> = text
        .match_indices('{')
        .chain(text.match_indices('['))
        .map(|(i, _)| i)
        .collect();

    if let Some(end) = end {
        for &start in starts.iter().filter(|&&start| start < end) {
            if let Ok(value) = serde_json::from_str::<Value>(&text[start..=end]) {
                return Some(Recovered::Clean(value));
            }
        }
    }

    starts
        .iter()
        .find_map(|&start| repair_truncated(&text[start..]))
        .map(Recovered::Repaired)
}

/// Re-closes a truncated JSON container. `body` must start at its opening bracket.
pub fn repair_truncated(body: &str) -> Option<Value> {
    let scan = scan_structure(body)?;

    // Output that stopped right after a complete top-level member only lacks its closer.
    if !scan.in_string && scan.depth == 1 && !scan.ends_with_separator {
        let candidate = format!("{}{}", body.trim_end(), scan.root_closer);
        if let Ok(value) = serde_json::from_str::<Value>(&candidate) {
            return Some(value);
        }
    }

    let cut = scan.last_top_level_separator?;
    let candidate = format!("{}{}", body[..cut].trim_end(), scan.root_closer);
    serde_json::from_str::<Value>(&candidate).ok()
}

struct Scan {
    root_closer: char,
    depth: usize,
    in_string: bool,
    ends_with_separator: bool,
    /// Byte offset of the last `,` directly inside the root container.
    last_top_level_separator: Option<usize>,
}

fn scan_structure(body: &str) -> Option<Scan> {
    let root_closer = match body.chars().next()? {
        '{' => '}',
        '[' => ']',
        _ => return None,
    };

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    let mut last_top_level_separator = None;
    let mut last_significant = None;

    for (i, c) in body.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            last_significant = Some(c);
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' | '[' => depth += 1,
            '}' | ']' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    // Root already closed; whatever follows is not ours to fix.
                    return None;
                }
            }
            ',' if depth == 1 => last_top_level_separator = Some(i),
            _ => {}
        }
        if !c.is_whitespace() {
            last_significant = Some(c);
        }
    }

    Some(Scan {
        root_closer,
        depth,
        in_string,
        ends_with_separator: matches!(last_significant, Some(',') | Some(':')),
        last_top_level_separator,
    })
}
