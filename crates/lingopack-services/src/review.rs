use lingopack_core::{EngineError, Operator, ProjectContext, Result};
use lingopack_domain::TranslationStatus;
use lingopack_store::CatalogStore;
use tracing::info;

/// Explicit review action on one translation. This is the only path that can
/// set `approved`; imports never do.
pub fn set_review_status<S: CatalogStore>(
    store: &S,
    project: &ProjectContext,
    operator: &Operator,
    key: &str,
    locale: &str,
    status: TranslationStatus,
) -> Result<()> {
    if !operator.can_edit {
        return Err(EngineError::Validation(format!(
            "operator `{}` is not allowed to modify the catalog",
            operator.name
        )));
    }
    if !project.is_target(locale) {
        return Err(EngineError::Validation(format!(
            "locale `{locale}` is not a target locale of project {}",
            project.project_id
        )));
    }
    if !matches!(
        status,
        TranslationStatus::NeedsReview | TranslationStatus::Ready | TranslationStatus::Approved
    ) {
        return Err(EngineError::Validation(format!(
            "status `{}` cannot be set by review, it is derived from imports",
            status.as_str()
        )));
    }

    store.with_tx(|tx| {
        let entry = tx
            .find_entries_by_keys(project.project_id, &[key.to_string()])?
            .into_iter()
            .next()
            .ok_or_else(|| EngineError::Validation(format!("unknown key `{key}`")))?;
        let translation = tx
            .get_translation(entry.id, locale)?
            .ok_or_else(|| {
                EngineError::Validation(format!("no `{locale}` translation for `{key}`"))
            })?;
        if status == TranslationStatus::Approved && translation.text.trim().is_empty() {
            return Err(EngineError::Validation(format!(
                "cannot approve `{key}` for `{locale}`: translation is empty"
            )));
        }
        tx.set_translation_status(entry.id, locale, status)?;
        info!(
            key,
            locale,
            status = status.as_str(),
            operator = %operator.name,
            "review status set"
        );
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::{import_pack, ImportRequest};
    use lingopack_core::QualityMode;
    use lingopack_store::{CatalogTx, MemoryStore};

    fn project() -> ProjectContext {
        ProjectContext {
            project_id: 1,
            source_locale: "zh-CN".into(),
            target_locales: vec!["en-US".into()],
            quality_mode: QualityMode::Open,
        }
    }

    fn seed(store: &MemoryStore) {
        for (locale, raw) in [("zh-CN", r#"{"k":"值"}"#), ("en-US", r#"{"k":"value"}"#)] {
            import_pack(
                store,
                &project(),
                &ImportRequest {
                    locale: locale.into(),
                    raw_json: raw.into(),
                    bind: None,
                    operator: Operator::new("tester"),
                },
            )
            .unwrap();
        }
    }

    fn status_of(store: &MemoryStore, key: &str, locale: &str) -> TranslationStatus {
        store
            .with_tx(|tx| {
                let id = tx.find_entries_by_keys(1, &[key.to_string()])?[0].id;
                tx.get_translation(id, locale)
            })
            .unwrap()
            .unwrap()
            .status
    }

    #[test]
    fn review_is_the_only_path_to_approved() {
        let store = MemoryStore::new();
        seed(&store);
        assert_eq!(status_of(&store, "k", "en-US"), TranslationStatus::NeedsReview);

        let op = Operator::new("reviewer");
        set_review_status(&store, &project(), &op, "k", "en-US", TranslationStatus::Approved)
            .unwrap();
        assert_eq!(status_of(&store, "k", "en-US"), TranslationStatus::Approved);
    }

    #[test]
    fn derived_statuses_cannot_be_set_by_review() {
        let store = MemoryStore::new();
        seed(&store);
        let op = Operator::new("reviewer");
        for status in [TranslationStatus::Pending, TranslationStatus::NeedsUpdate] {
            let err = set_review_status(&store, &project(), &op, "k", "en-US", status)
                .unwrap_err();
            assert_eq!(err.kind(), "validation");
        }
    }

    #[test]
    fn approving_an_empty_translation_fails() {
        let store = MemoryStore::new();
        import_pack(
            &store,
            &project(),
            &ImportRequest {
                locale: "zh-CN".into(),
                raw_json: r#"{"k":"值"}"#.into(),
                bind: None,
                operator: Operator::new("tester"),
            },
        )
        .unwrap();

        let op = Operator::new("reviewer");
        let err = set_review_status(
            &store,
            &project(),
            &op,
            "k",
            "en-US",
            TranslationStatus::Approved,
        )
        .unwrap_err();
        assert_eq!(err.kind(), "validation");
        assert_eq!(status_of(&store, "k", "en-US"), TranslationStatus::Pending);
    }

    #[test]
    fn source_locale_cannot_be_reviewed() {
        let store = MemoryStore::new();
        seed(&store);
        let op = Operator::new("reviewer");
        let err = set_review_status(
            &store,
            &project(),
            &op,
            "k",
            "zh-CN",
            TranslationStatus::Approved,
        )
        .unwrap_err();
        assert_eq!(err.kind(), "validation");
    }
}
