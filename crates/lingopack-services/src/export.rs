use std::collections::HashMap;
use std::io::Write;

use lingopack_core::{EngineError, ProjectContext, QualityMode, Result};
use lingopack_domain::{ExportFile, PackShape, TranslationStatus, SCHEMA_VERSION};
use lingopack_store::{CatalogStore, CatalogTx, EntryRecord};
use serde_json::{Map, Value};
use tracing::debug;
use zip::write::SimpleFileOptions;

pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const ZIP_CONTENT_TYPE: &str = "application/zip";

/// What to emit for keys whose translation is missing or blank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillMode {
    /// Every key, blanks as `""`.
    #[default]
    Empty,
    /// Every key, blanks filled with the source text.
    Fallback,
    /// Only keys with a non-blank translation.
    Filled,
}

impl FillMode {
    pub fn as_str(self) -> &'static str {
        match self {
            FillMode::Empty => "empty",
            FillMode::Fallback => "fallback",
            FillMode::Filled => "filled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "empty" => Some(FillMode::Empty),
            "fallback" => Some(FillMode::Fallback),
            "filled" => Some(FillMode::Filled),
            _ => None,
        }
    }
}

/// A zip of one pack per locale, source first.
#[derive(Debug, Clone)]
pub struct ExportBundle {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

pub fn pack_file_name(project_id: i64, locale: &str) -> String {
    format!("project-{project_id}.{locale}.json")
}

/// Render one locale as a language-pack file in the project's stored shape.
/// Runs in a read-only transaction so the pack is a consistent snapshot.
pub fn export_locale<S: CatalogStore>(
    store: &S,
    project: &ProjectContext,
    locale: &str,
    fill: FillMode,
) -> Result<ExportFile> {
    store.with_tx(|tx| export_locale_tx(tx, project, locale, fill))
}

pub(crate) fn export_locale_tx(
    tx: &mut dyn CatalogTx,
    project: &ProjectContext,
    locale: &str,
    fill: FillMode,
) -> Result<ExportFile> {
    let is_source = locale == project.source_locale;
    if !is_source && !project.is_target(locale) {
        return Err(EngineError::Validation(format!(
            "locale `{locale}` is not configured for project {}",
            project.project_id
        )));
    }

    let entries = tx.list_entries(project.project_id)?;
    let map = if is_source {
        entries
            .iter()
            .map(|e| (e.key.clone(), Some(e.source_text.clone())))
            .collect()
    } else {
        target_texts(tx, project, locale, &entries)?
    };

    let mut rendered: Vec<(String, String)> = Vec::with_capacity(map.len());
    for e in &entries {
        let text = map.get(&e.key).cloned().flatten();
        match (fill, text) {
            (_, Some(t)) if !t.trim().is_empty() => rendered.push((e.key.clone(), t)),
            (FillMode::Empty, _) => rendered.push((e.key.clone(), String::new())),
            (FillMode::Fallback, _) => rendered.push((e.key.clone(), e.source_text.clone())),
            (FillMode::Filled, _) => {}
        }
    }

    let shape = tx
        .get_template(project.project_id)?
        .map(|t| t.shape)
        .unwrap_or(PackShape::Flat);
    let content = match shape {
        PackShape::Flat => render_flat(&rendered)?,
        PackShape::Tree => {
            let paths = tx
                .get_template(project.project_id)?
                .map(|t| t.paths)
                .unwrap_or_default();
            render_tree(&rendered, &paths)?
        }
    };

    Ok(ExportFile {
        schema_version: SCHEMA_VERSION,
        file_name: pack_file_name(project.project_id, locale),
        content_type: JSON_CONTENT_TYPE.to_string(),
        content,
    })
}

/// Translations for a target locale, gate-checked first when the project runs
/// in strict mode: one missing, blank or unapproved translation blocks the
/// whole export.
fn target_texts(
    tx: &mut dyn CatalogTx,
    project: &ProjectContext,
    locale: &str,
    entries: &[EntryRecord],
) -> Result<HashMap<String, Option<String>>> {
    let ids: Vec<i64> = entries.iter().map(|e| e.id).collect();
    let mut by_entry: HashMap<i64, (String, TranslationStatus)> = HashMap::new();
    for t in tx.translations_for_entries(&ids)? {
        if t.locale == locale {
            by_entry.insert(t.entry_id, (t.text, t.status));
        }
    }

    if project.quality_mode == QualityMode::Strict {
        let blocked = entries
            .iter()
            .filter(|e| match by_entry.get(&e.id) {
                Some((text, status)) => {
                    text.trim().is_empty() || *status != TranslationStatus::Approved
                }
                None => true,
            })
            .count();
        if blocked > 0 {
            return Err(EngineError::QualityGate {
                locale: locale.to_string(),
                blocked,
            });
        }
    }

    Ok(entries
        .iter()
        .map(|e| {
            let text = by_entry.get(&e.id).map(|(t, _)| t.clone());
            (e.key.clone(), text)
        })
        .collect())
}

fn render_flat(rendered: &[(String, String)]) -> Result<String> {
    let mut sorted: Vec<&(String, String)> = rendered.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));
    let mut root = Map::new();
    for (key, value) in sorted {
        root.insert(key.clone(), Value::String(value.clone()));
    }
    to_pretty(&Value::Object(root))
}

/// Rebuild the nested document: template paths first in their stored order,
/// then any keys the template has not seen yet, split on dots.
fn render_tree(rendered: &[(String, String)], paths: &[String]) -> Result<String> {
    let by_key: HashMap<&str, &str> = rendered
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    let mut root = Map::new();

    let mut covered: std::collections::HashSet<&str> = std::collections::HashSet::new();
    for path in paths {
        if let Some(&value) = by_key.get(path.as_str()) {
            insert_path(&mut root, path, value);
            covered.insert(path.as_str());
        }
    }
    for (key, value) in rendered {
        if !covered.contains(&key.as_str()) {
            insert_path(&mut root, key, value);
        }
    }
    to_pretty(&Value::Object(root))
}

fn insert_path(root: &mut Map<String, Value>, path: &str, value: &str) {
    let segments: Vec<&str> = path.split('.').collect();
    if !try_insert_path(root, &segments, value) {
        // a segment is already a string leaf; keep the dotted key at the root
        debug!(path, "nested slot taken, writing dotted key at root");
        root.insert(path.to_string(), Value::String(value.to_string()));
    }
}

fn try_insert_path(node: &mut Map<String, Value>, segments: &[&str], value: &str) -> bool {
    match segments {
        [] => false,
        [leaf] => match node.get(*leaf) {
            Some(Value::Object(_)) => false,
            _ => {
                node.insert(leaf.to_string(), Value::String(value.to_string()));
                true
            }
        },
        [head, rest @ ..] => {
            if !matches!(node.get(*head), Some(Value::Object(_)) | None) {
                return false;
            }
            let child = node
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            match child {
                Value::Object(map) => try_insert_path(map, rest, value),
                _ => false,
            }
        }
    }
}

fn to_pretty(value: &Value) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| EngineError::Storage(e.to_string()))
}

/// Zip every configured locale into one archive, source pack first.
pub fn export_bundle<S: CatalogStore>(
    store: &S,
    project: &ProjectContext,
    fill: FillMode,
) -> Result<ExportBundle> {
    store.with_tx(|tx| {
        let cursor = std::io::Cursor::new(Vec::new());
        let mut archive = zip::ZipWriter::new(cursor);
        let options = SimpleFileOptions::default();
        for locale in project.all_locales() {
            let file = export_locale_tx(tx, project, &locale, fill)?;
            archive
                .start_file(file.file_name.as_str(), options)
                .map_err(|e| EngineError::Storage(format!("zip: {e}")))?;
            archive
                .write_all(file.content.as_bytes())
                .map_err(|e| EngineError::Storage(format!("zip: {e}")))?;
        }
        let cursor = archive
            .finish()
            .map_err(|e| EngineError::Storage(format!("zip: {e}")))?;
        Ok(ExportBundle {
            file_name: format!("project-{}.packs.zip", project.project_id),
            content_type: ZIP_CONTENT_TYPE.to_string(),
            bytes: cursor.into_inner(),
        })
    })
}
