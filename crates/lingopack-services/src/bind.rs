use lingopack_core::{EngineError, ProjectContext, Result};
use lingopack_domain::{BindReport, ImportKind};
use lingopack_store::{CatalogTx, BIND_CHUNK, ROOT_MODULE};
use tracing::debug;

use crate::import::ReconcileOutcome;

/// Which of the imported keys to place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BindMode {
    #[default]
    All,
    /// Entries created by this very import. Meaningless for target imports,
    /// which never create entries; those are coerced to [`BindMode::All`].
    AddedOnly,
}

impl BindMode {
    pub fn as_str(self) -> &'static str {
        match self {
            BindMode::All => "all",
            BindMode::AddedOnly => "added_only",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "all" => Some(BindMode::All),
            "added_only" | "addedOnly" => Some(BindMode::AddedOnly),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum PageTarget {
    Existing(i64),
    Create {
        route: String,
        title: Option<String>,
        description: Option<String>,
    },
}

#[derive(Debug, Clone)]
pub enum ModuleTarget {
    Existing(i64),
    Create { name: String },
    /// Place directly on the page, under the reserved root module.
    Root,
}

#[derive(Debug, Clone)]
pub struct BindSpec {
    pub page: PageTarget,
    pub module: ModuleTarget,
    pub mode: BindMode,
}

/// Attach reconciled entries to a page/module. Re-binding already placed
/// entries is a no-op counted in `already_placed`.
pub(crate) fn bind_entries(
    tx: &mut dyn CatalogTx,
    project: &ProjectContext,
    spec: &BindSpec,
    kind: ImportKind,
    outcome: &ReconcileOutcome,
) -> Result<BindReport> {
    let mode = match (spec.mode, kind) {
        (BindMode::AddedOnly, ImportKind::Target) => {
            debug!("added_only has no meaning for target imports, binding all matched keys");
            BindMode::All
        }
        (mode, _) => mode,
    };

    let page = resolve_page(tx, project, &spec.page)?;
    let module = resolve_module(tx, page.id, &spec.module)?;

    let ids: Vec<i64> = match mode {
        BindMode::AddedOnly => outcome.added_ids.clone(),
        BindMode::All => {
            let mut ids = outcome.matched_ids.clone();
            ids.extend(&outcome.added_ids);
            ids
        }
    };

    let mut attached = 0usize;
    let mut already_placed = 0usize;
    for chunk in ids.chunks(BIND_CHUNK) {
        let placed = tx.placed_entries(page.id, module.id, chunk)?;
        let fresh: Vec<i64> = chunk.iter().copied().filter(|id| !placed.contains(id)).collect();
        already_placed += placed.len();
        if !fresh.is_empty() {
            tx.insert_placements(page.id, module.id, &fresh)?;
            attached += fresh.len();
        }
    }

    Ok(BindReport {
        page_id: page.id,
        module_id: module.id,
        attached,
        already_placed,
    })
}

fn resolve_page(
    tx: &mut dyn CatalogTx,
    project: &ProjectContext,
    target: &PageTarget,
) -> Result<lingopack_store::PageRecord> {
    match target {
        PageTarget::Existing(id) => {
            let page = tx
                .get_page(*id)?
                .ok_or_else(|| EngineError::Binding(format!("page {id} not found")))?;
            if page.project_id != project.project_id {
                return Err(EngineError::Binding(format!(
                    "page {id} belongs to another project"
                )));
            }
            Ok(page)
        }
        PageTarget::Create {
            route,
            title,
            description,
        } => {
            let route = route.trim();
            if route.is_empty() {
                return Err(EngineError::Validation("page route must not be blank".into()));
            }
            Ok(tx
                .create_or_get_page(
                    project.project_id,
                    route,
                    title.as_deref(),
                    description.as_deref(),
                )?
                .record)
        }
    }
}

fn resolve_module(
    tx: &mut dyn CatalogTx,
    page_id: i64,
    target: &ModuleTarget,
) -> Result<lingopack_store::ModuleRecord> {
    match target {
        ModuleTarget::Existing(id) => {
            let module = tx
                .get_module(*id)?
                .ok_or_else(|| EngineError::Binding(format!("module {id} not found")))?;
            if module.page_id != page_id {
                return Err(EngineError::Binding(format!(
                    "module {id} belongs to another page"
                )));
            }
            Ok(module)
        }
        ModuleTarget::Create { name } => {
            let name = name.trim();
            if name.is_empty() {
                return Err(EngineError::Validation("module name must not be blank".into()));
            }
            if name == ROOT_MODULE {
                return Err(EngineError::Validation(format!(
                    "module name `{ROOT_MODULE}` is reserved"
                )));
            }
            Ok(tx.create_or_get_module(page_id, name)?.record)
        }
        ModuleTarget::Root => Ok(tx.create_or_get_module(page_id, ROOT_MODULE)?.record),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::{import_pack, ImportRequest};
    use lingopack_core::{Operator, QualityMode};
    use lingopack_store::{CatalogStore, MemoryStore};

    fn project() -> ProjectContext {
        ProjectContext {
            project_id: 1,
            source_locale: "zh-CN".into(),
            target_locales: vec!["en-US".into()],
            quality_mode: QualityMode::Open,
        }
    }

    fn request(locale: &str, raw: &str, bind: Option<BindSpec>) -> ImportRequest {
        ImportRequest {
            locale: locale.into(),
            raw_json: raw.into(),
            bind,
            operator: Operator::new("tester"),
        }
    }

    fn create_route(route: &str, mode: BindMode) -> BindSpec {
        BindSpec {
            page: PageTarget::Create {
                route: route.into(),
                title: None,
                description: None,
            },
            module: ModuleTarget::Root,
            mode,
        }
    }

    #[test]
    fn import_with_bind_attaches_and_rebind_is_noop() {
        let store = MemoryStore::new();
        let raw = r#"{"a":"1","b":"2"}"#;
        let first = import_pack(
            &store,
            &project(),
            &request("zh-CN", raw, Some(create_route("/settings", BindMode::All))),
        )
        .unwrap();
        let bind = first.bind.expect("bind report");
        assert_eq!(bind.attached, 2);
        assert_eq!(bind.already_placed, 0);

        let second = import_pack(
            &store,
            &project(),
            &request("zh-CN", raw, Some(create_route("/settings", BindMode::All))),
        )
        .unwrap();
        let rebind = second.bind.expect("bind report");
        assert_eq!(rebind.attached, 0);
        assert_eq!(rebind.already_placed, 2);
        // page creation is idempotent on route
        assert_eq!(rebind.page_id, bind.page_id);
    }

    #[test]
    fn added_only_binds_only_new_entries() {
        let store = MemoryStore::new();
        import_pack(&store, &project(), &request("zh-CN", r#"{"a":"1"}"#, None)).unwrap();
        let report = import_pack(
            &store,
            &project(),
            &request(
                "zh-CN",
                r#"{"a":"1","b":"2"}"#,
                Some(create_route("/home", BindMode::AddedOnly)),
            ),
        )
        .unwrap();
        let bind = report.bind.unwrap();
        assert_eq!(bind.attached, 1);
    }

    #[test]
    fn added_only_coerced_to_all_for_target_imports() {
        let store = MemoryStore::new();
        import_pack(&store, &project(), &request("zh-CN", r#"{"a":"1","b":"2"}"#, None)).unwrap();
        let report = import_pack(
            &store,
            &project(),
            &request(
                "en-US",
                r#"{"a":"one","b":"two"}"#,
                Some(create_route("/home", BindMode::AddedOnly)),
            ),
        )
        .unwrap();
        let bind = report.bind.unwrap();
        assert_eq!(bind.attached, 2);
    }

    #[test]
    fn reserved_module_name_is_rejected() {
        let store = MemoryStore::new();
        let spec = BindSpec {
            page: PageTarget::Create {
                route: "/x".into(),
                title: None,
                description: None,
            },
            module: ModuleTarget::Create {
                name: "__root__".into(),
            },
            mode: BindMode::All,
        };
        let err = import_pack(
            &store,
            &project(),
            &request("zh-CN", r#"{"a":"1"}"#, Some(spec)),
        )
        .unwrap_err();
        assert_eq!(err.kind(), "validation");
    }

    #[test]
    fn failing_bind_rolls_back_reconciliation() {
        let store = MemoryStore::new();
        let spec = BindSpec {
            page: PageTarget::Existing(999),
            module: ModuleTarget::Root,
            mode: BindMode::All,
        };
        let err = import_pack(
            &store,
            &project(),
            &request("zh-CN", r#"{"a":"1"}"#, Some(spec)),
        )
        .unwrap_err();
        assert_eq!(err.kind(), "binding");

        // entries written before the bind step must not survive
        let entries = store.with_tx(|tx| tx.list_entries(1)).unwrap();
        assert!(entries.is_empty());
        let uploads = store.with_tx(|tx| tx.list_uploads(1, 10)).unwrap();
        assert!(uploads.is_empty());
    }

    #[test]
    fn named_module_is_created_under_the_page() {
        let store = MemoryStore::new();
        let spec = BindSpec {
            page: PageTarget::Create {
                route: "/checkout".into(),
                title: Some("Checkout".into()),
                description: Some("Order summary and payment".into()),
            },
            module: ModuleTarget::Create {
                name: "summary".into(),
            },
            mode: BindMode::All,
        };
        let report = import_pack(
            &store,
            &project(),
            &request("zh-CN", r#"{"a":"1"}"#, Some(spec)),
        )
        .unwrap();
        let bind = report.bind.unwrap();
        let module = store
            .with_tx(|tx| tx.get_module(bind.module_id))
            .unwrap()
            .unwrap();
        assert_eq!(module.name, "summary");
        assert_eq!(module.page_id, bind.page_id);
        let page = store
            .with_tx(|tx| tx.get_page(bind.page_id))
            .unwrap()
            .unwrap();
        assert_eq!(page.title.as_deref(), Some("Checkout"));
        assert_eq!(page.description.as_deref(), Some("Order summary and payment"));
    }
}
