use color_eyre::eyre::Result;
use lingopack_core::{is_valid_locale, EngineError, ProjectContext, QualityMode};
use lingopack_store::CatalogStore;
use std::path::PathBuf;

use crate::ui;

pub fn run(
    db: Option<PathBuf>,
    project: i64,
    source: &str,
    targets: &str,
    strict: bool,
    format: &str,
) -> Result<()> {
    let store = super::open_store(db)?;
    let result = build_context(project, source, targets, strict).and_then(|context| {
        store.with_tx(|tx| tx.upsert_project(&context))?;
        Ok(context)
    });

    if let Some(context) = ui::finish(format, result)? {
        if format != "json" {
            println!(
                "✔ project {} configured: source {}, targets {}",
                context.project_id,
                context.source_locale,
                context.target_locales.join(", ")
            );
        }
    }
    Ok(())
}

fn build_context(
    project: i64,
    source: &str,
    targets: &str,
    strict: bool,
) -> lingopack_core::Result<ProjectContext> {
    let target_locales: Vec<String> = targets
        .split(',')
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();
    if target_locales.is_empty() {
        return Err(EngineError::Validation("at least one target locale is required".into()));
    }
    for code in std::iter::once(source).chain(target_locales.iter().map(String::as_str)) {
        if !is_valid_locale(code) {
            return Err(EngineError::Validation(format!("invalid locale code `{code}`")));
        }
    }
    if target_locales.iter().any(|t| t == source) {
        return Err(EngineError::Validation(format!(
            "source locale `{source}` cannot also be a target"
        )));
    }
    Ok(ProjectContext {
        project_id: project,
        source_locale: source.to_string(),
        target_locales,
        quality_mode: if strict { QualityMode::Strict } else { QualityMode::Open },
    })
}
