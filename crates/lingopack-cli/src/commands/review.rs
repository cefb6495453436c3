use color_eyre::eyre::Result;
use lingopack_core::{EngineError, Operator};
use lingopack_domain::TranslationStatus;
use lingopack_services::set_review_status;
use serde::Serialize;
use std::path::PathBuf;

use crate::ui;

#[derive(Serialize)]
struct Reviewed<'a> {
    key: &'a str,
    locale: &'a str,
    status: &'a str,
}

pub fn run(
    db: Option<PathBuf>,
    project_id: i64,
    key: &str,
    locale: &str,
    status: &str,
    operator: Option<&str>,
    format: &str,
) -> Result<()> {
    let store = super::open_store(db)?;
    let project = super::load_project(&store, project_id)?;
    let operator = Operator::new(super::resolve_operator(operator));

    let result = TranslationStatus::parse(status)
        .ok_or_else(|| EngineError::Validation(format!("unknown status `{status}`")))
        .and_then(|parsed| {
            set_review_status(&store, &project, &operator, key, locale, parsed)?;
            Ok(Reviewed {
                key,
                locale,
                status: parsed.as_str(),
            })
        });

    if let Some(done) = ui::finish(format, result)? {
        if format != "json" {
            println!("✔ {} [{}] set to {}", done.key, done.locale, done.status);
        }
    }
    Ok(())
}
