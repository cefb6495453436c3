use std::collections::{HashMap, HashSet};

use lingopack_core::{EngineError, Result};
use lingopack_domain::PackShape;
use serde_json::{Map, Value};

/// Hard cap on raw pack size.
pub const MAX_PACK_BYTES: usize = 5 * 1024 * 1024;
/// Hard cap on leaf count, bounds transaction duration and memory.
pub const MAX_LEAF_KEYS: usize = 50_000;

/// One leaf of a language pack: the segment path, the dot-joined key and the
/// string value. Order follows the document.
#[derive(Debug, Clone)]
pub struct LeafDraft {
    pub path: Vec<String>,
    pub key: String,
    pub value: String,
}

/// Parsed language pack. `drafts` keeps document order (the order template
/// paths are accumulated in); `map` is the same data keyed for lookup.
#[derive(Debug, Clone)]
pub struct ParsedPack {
    pub shape: PackShape,
    pub drafts: Vec<LeafDraft>,
    pub map: HashMap<String, String>,
}

impl ParsedPack {
    pub fn is_empty(&self) -> bool {
        self.drafts.is_empty()
    }

    /// Dot-joined leaf paths in document order.
    pub fn key_paths(&self) -> Vec<String> {
        self.drafts.iter().map(|d| d.key.clone()).collect()
    }
}

/// Parse raw text as one locale's language pack.
///
/// Rules: the root must be a JSON object; every leaf must be a string; arrays
/// and non-string scalars are rejected anywhere; key segments are trimmed and
/// must be non-empty; two leaves must not collapse to the same dot-joined
/// key. Any violation rejects the whole document.
pub fn parse_language_pack(raw: &str) -> Result<ParsedPack> {
    if raw.len() > MAX_PACK_BYTES {
        return Err(EngineError::Validation(format!(
            "language pack exceeds {} bytes",
            MAX_PACK_BYTES
        )));
    }

    let value: Value = serde_json::from_str(raw)
        .map_err(|e| EngineError::Parse(format!("malformed JSON: {e}")))?;
    let root = match value {
        Value::Object(map) => map,
        other => {
            return Err(EngineError::Parse(format!(
                "root must be a JSON object, got {}",
                json_type_name(&other)
            )))
        }
    };

    // Flat means every immediate value is a string; a single object child
    // classifies the whole document as a tree.
    let shape = if root.values().all(Value::is_string) {
        PackShape::Flat
    } else {
        PackShape::Tree
    };

    let mut drafts = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut path: Vec<String> = Vec::new();
    walk(&root, &mut path, &mut drafts, &mut seen)?;

    let map = drafts
        .iter()
        .map(|d| (d.key.clone(), d.value.clone()))
        .collect();

    Ok(ParsedPack { shape, drafts, map })
}

fn walk(
    obj: &Map<String, Value>,
    path: &mut Vec<String>,
    drafts: &mut Vec<LeafDraft>,
    seen: &mut HashSet<String>,
) -> Result<()> {
    for (raw_key, value) in obj {
        let segment = raw_key.trim();
        if segment.is_empty() {
            return Err(EngineError::Parse(format!(
                "empty key segment under `{}`",
                path.join(".")
            )));
        }
        path.push(segment.to_string());
        match value {
            Value::String(s) => {
                let key = path.join(".");
                if !seen.insert(key.clone()) {
                    path.pop();
                    return Err(EngineError::Parse(format!("duplicate key `{key}`")));
                }
                drafts.push(LeafDraft {
                    path: path.clone(),
                    key,
                    value: s.clone(),
                });
                if drafts.len() > MAX_LEAF_KEYS {
                    path.pop();
                    return Err(EngineError::Validation(format!(
                        "language pack exceeds {} keys",
                        MAX_LEAF_KEYS
                    )));
                }
            }
            Value::Object(child) => walk(child, path, drafts, seen)?,
            Value::Array(_) => {
                let key = path.join(".");
                path.pop();
                return Err(EngineError::Parse(format!(
                    "arrays are not allowed (at `{key}`)"
                )));
            }
            other => {
                let key = path.join(".");
                path.pop();
                return Err(EngineError::Parse(format!(
                    "leaf values must be strings, got {} at `{key}`",
                    json_type_name(other)
                )));
            }
        }
        path.pop();
    }
    Ok(())
}

fn json_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
