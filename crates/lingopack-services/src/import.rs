use std::collections::{HashMap, HashSet};

use lingopack_core::{EngineError, Operator, ProjectContext, Result};
use lingopack_domain::{
    ImportKind, ImportReport, ImportSummary, PackShape, PackageUpload, TranslationStatus,
    UpdatedKey, SCHEMA_VERSION,
};
use lingopack_parsers_json::{parse_language_pack, ParsedPack};
use lingopack_store::{CatalogStore, CatalogTx, TemplateRecord, BIND_CHUNK};
use tracing::{debug, info};

use crate::bind::{bind_entries, BindSpec};
use crate::util::now_epoch;

/// Keys kept per audit detail list. Counts stay exact regardless.
pub const AUDIT_DETAIL_CAP: usize = 200;

/// One import call: locale, raw pack text, optional binding, operator.
/// Everything the engine needs is here or in the [`ProjectContext`] — no
/// ambient state.
#[derive(Debug, Clone)]
pub struct ImportRequest {
    pub locale: String,
    pub raw_json: String,
    pub bind: Option<BindSpec>,
    pub operator: Operator,
}

/// Internal reconciliation result handed to the binder.
pub(crate) struct ReconcileOutcome {
    pub summary: ImportSummary,
    /// Entry ids of pre-existing keys present in the incoming file.
    pub matched_ids: Vec<i64>,
    /// Entry ids created by this import (source imports only).
    pub added_ids: Vec<i64>,
}

/// Import one language pack into the catalog. Parse and validation run
/// before any mutation; reconcile, bind and audit share one transaction, so
/// an import either fully succeeds or leaves no trace.
pub fn import_pack<S: CatalogStore>(
    store: &S,
    project: &ProjectContext,
    req: &ImportRequest,
) -> Result<ImportReport> {
    if !req.operator.can_edit {
        return Err(EngineError::Validation(format!(
            "operator `{}` is not allowed to modify the catalog",
            req.operator.name
        )));
    }

    let pack = parse_language_pack(&req.raw_json)?;
    let kind = if req.locale == project.source_locale {
        ImportKind::Source
    } else if project.is_target(&req.locale) {
        ImportKind::Target
    } else {
        return Err(EngineError::Validation(format!(
            "locale `{}` is not configured for project {}",
            req.locale, project.project_id
        )));
    };

    store.with_tx(|tx| {
        let outcome = match kind {
            ImportKind::Source => reconcile_source(tx, project, &pack)?,
            ImportKind::Target => reconcile_target(tx, project, &req.locale, &pack)?,
        };
        merge_template(tx, project.project_id, &pack)?;

        let bind = match &req.bind {
            Some(spec) => Some(bind_entries(tx, project, spec, kind, &outcome)?),
            None => None,
        };

        if !pack.is_empty() {
            record_upload(tx, project, kind, &req.locale, pack.shape, &req.operator, &outcome)?;
        }

        info!(
            project = project.project_id,
            locale = %req.locale,
            kind = kind.as_str(),
            added = outcome.summary.added,
            updated = outcome.summary.updated,
            ignored = outcome.summary.ignored,
            "import reconciled"
        );

        Ok(ImportReport {
            schema_version: SCHEMA_VERSION,
            kind,
            locale: req.locale.clone(),
            shape: pack.shape,
            summary: outcome.summary,
            bind,
        })
    })
}

/// Source-locale reconciliation: create missing entries, update changed
/// source texts and cascade `needs_update` onto stale translations. Keys in
/// the catalog but absent from the file are counted, never touched.
fn reconcile_source(
    tx: &mut dyn CatalogTx,
    project: &ProjectContext,
    pack: &ParsedPack,
) -> Result<ReconcileOutcome> {
    let existing = tx.list_entries(project.project_id)?;
    let by_key: HashMap<&str, (i64, &str)> = existing
        .iter()
        .map(|e| (e.key.as_str(), (e.id, e.source_text.as_str())))
        .collect();
    let incoming: HashSet<&str> = pack.drafts.iter().map(|d| d.key.as_str()).collect();
    let missing = existing
        .iter()
        .filter(|e| !incoming.contains(e.key.as_str()))
        .count();

    let mut matched_ids = Vec::new();
    let mut changed: Vec<(&str, i64, &str, &str)> = Vec::new();
    for d in &pack.drafts {
        if let Some(&(id, old)) = by_key.get(d.key.as_str()) {
            matched_ids.push(id);
            if old != d.value {
                changed.push((d.key.as_str(), id, old, d.value.as_str()));
            }
        }
    }

    // one batched read of every translation that might go stale
    let changed_ids: Vec<i64> = changed.iter().map(|c| c.1).collect();
    let mut per_entry: HashMap<i64, Vec<lingopack_store::TranslationRecord>> = HashMap::new();
    for t in tx.translations_for_entries(&changed_ids)? {
        per_entry.entry(t.entry_id).or_default().push(t);
    }

    let mut updated_keys = Vec::new();
    let mut marked_keys = Vec::new();
    for (key, id, old, new) in &changed {
        tx.update_entry_source(*id, new)?;
        let mut flipped = false;
        if let Some(translations) = per_entry.get(id) {
            for t in translations {
                // empty translations have nothing to go stale
                if !t.text.trim().is_empty() && t.status != TranslationStatus::NeedsUpdate {
                    tx.set_translation_status(t.entry_id, &t.locale, TranslationStatus::NeedsUpdate)?;
                    flipped = true;
                }
            }
        }
        if flipped {
            marked_keys.push(key.to_string());
        }
        updated_keys.push(UpdatedKey {
            key: key.to_string(),
            before: Some(old.to_string()),
            after: new.to_string(),
        });
    }

    let mut added_keys = Vec::new();
    let mut added_ids = Vec::new();
    for d in &pack.drafts {
        if !by_key.contains_key(d.key.as_str()) {
            let id = tx.insert_entry(project.project_id, &d.key, &d.value)?;
            for locale in &project.target_locales {
                tx.upsert_translation(id, locale, "", TranslationStatus::Pending)?;
            }
            added_keys.push(d.key.clone());
            added_ids.push(id);
        }
    }

    let summary = ImportSummary {
        added: added_keys.len(),
        updated: updated_keys.len(),
        missing,
        marked_needs_update: marked_keys.len(),
        added_keys,
        updated_keys,
        marked_needs_update_keys: marked_keys,
        ..Default::default()
    };
    Ok(ReconcileOutcome {
        summary,
        matched_ids,
        added_ids,
    })
}

/// Target-locale reconciliation: update translations for existing keys only.
/// Unknown keys are recorded and skipped; blank values never erase stored
/// text; any accepted value forces `needs_review`, even from `approved`.
fn reconcile_target(
    tx: &mut dyn CatalogTx,
    project: &ProjectContext,
    locale: &str,
    pack: &ParsedPack,
) -> Result<ReconcileOutcome> {
    let keys = pack.key_paths();
    let mut by_key: HashMap<String, i64> = HashMap::new();
    for chunk in keys.chunks(BIND_CHUNK) {
        for e in tx.find_entries_by_keys(project.project_id, chunk)? {
            by_key.insert(e.key, e.id);
        }
    }

    let mut matched_ids = Vec::new();
    let mut updated_keys = Vec::new();
    let mut ignored_keys = Vec::new();
    let mut skipped_empty_keys = Vec::new();

    for d in &pack.drafts {
        let Some(&entry_id) = by_key.get(&d.key) else {
            ignored_keys.push(d.key.clone());
            continue;
        };
        matched_ids.push(entry_id);

        if d.value.trim().is_empty() {
            skipped_empty_keys.push(d.key.clone());
            continue;
        }

        let before = tx.get_translation(entry_id, locale)?.map(|t| t.text);
        if before.as_deref() == Some(d.value.as_str()) {
            continue; // text equality is a no-op
        }
        tx.upsert_translation(entry_id, locale, &d.value, TranslationStatus::NeedsReview)?;
        updated_keys.push(UpdatedKey {
            key: d.key.clone(),
            before,
            after: d.value.clone(),
        });
    }

    let summary = ImportSummary {
        updated: updated_keys.len(),
        ignored: ignored_keys.len(),
        skipped_empty: skipped_empty_keys.len(),
        updated_keys,
        ignored_keys,
        skipped_empty_keys,
        ..Default::default()
    };
    Ok(ReconcileOutcome {
        summary,
        matched_ids,
        added_ids: Vec::new(),
    })
}

/// First import fixes the shape; later tree imports union new leaf paths in
/// first-seen order. Existing paths are never reordered or dropped.
fn merge_template(tx: &mut dyn CatalogTx, project_id: i64, pack: &ParsedPack) -> Result<()> {
    if pack.is_empty() {
        return Ok(());
    }
    match tx.get_template(project_id)? {
        None => {
            let paths = if pack.shape == PackShape::Tree {
                pack.key_paths()
            } else {
                Vec::new()
            };
            tx.upsert_template(
                project_id,
                &TemplateRecord {
                    shape: pack.shape,
                    paths,
                },
            )
        }
        Some(template) => {
            if pack.shape != PackShape::Tree {
                return Ok(());
            }
            let mut known: HashSet<String> = template.paths.iter().cloned().collect();
            let mut paths = template.paths.clone();
            for d in &pack.drafts {
                if known.insert(d.key.clone()) {
                    paths.push(d.key.clone());
                }
            }
            if paths.len() == template.paths.len() {
                return Ok(());
            }
            debug!(project = project_id, new_paths = paths.len() - template.paths.len(), "template paths extended");
            tx.upsert_template(
                project_id,
                &TemplateRecord {
                    shape: template.shape,
                    paths,
                },
            )
        }
    }
}

fn record_upload(
    tx: &mut dyn CatalogTx,
    project: &ProjectContext,
    kind: ImportKind,
    locale: &str,
    shape: PackShape,
    operator: &Operator,
    outcome: &ReconcileOutcome,
) -> Result<()> {
    let mut summary = outcome.summary.clone();
    summary.added_keys.truncate(AUDIT_DETAIL_CAP);
    summary.updated_keys.truncate(AUDIT_DETAIL_CAP);
    summary.ignored_keys.truncate(AUDIT_DETAIL_CAP);
    summary.skipped_empty_keys.truncate(AUDIT_DETAIL_CAP);
    summary.marked_needs_update_keys.truncate(AUDIT_DETAIL_CAP);

    tx.insert_upload(&PackageUpload {
        id: 0,
        project_id: project.project_id,
        kind,
        locale: locale.to_string(),
        shape,
        operator: operator.name.clone(),
        summary,
        created_at: now_epoch(),
    })?;
    Ok(())
}
