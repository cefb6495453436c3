use color_eyre::eyre::Result;
use lingopack_core::{EngineError, Operator};
use lingopack_domain::ImportReport;
use lingopack_services::{import_pack, BindMode, BindSpec, ImportRequest, ModuleTarget, PageTarget};
use std::path::{Path, PathBuf};

use crate::ui;

#[allow(clippy::too_many_arguments)]
pub fn run(
    db: Option<PathBuf>,
    project_id: i64,
    locale: &str,
    file: &Path,
    page_id: Option<i64>,
    page_route: Option<&str>,
    page_title: Option<&str>,
    page_description: Option<&str>,
    module_id: Option<i64>,
    module_name: Option<&str>,
    bind_mode: &str,
    operator: Option<&str>,
    format: &str,
    use_color: bool,
) -> Result<()> {
    let store = super::open_store(db)?;
    let project = super::load_project(&store, project_id)?;
    let raw = std::fs::read_to_string(file)?;

    let result = build_bind(
        page_id,
        page_route,
        page_title,
        page_description,
        module_id,
        module_name,
        bind_mode,
    )
    .and_then(|bind| {
        import_pack(
            &store,
            &project,
            &ImportRequest {
                locale: locale.to_string(),
                raw_json: raw,
                bind,
                operator: Operator::new(super::resolve_operator(operator)),
            },
        )
    });

    if let Some(report) = ui::finish(format, result)? {
        if format != "json" {
            print_report(&report, use_color);
        }
    }
    Ok(())
}

fn build_bind(
    page_id: Option<i64>,
    page_route: Option<&str>,
    page_title: Option<&str>,
    page_description: Option<&str>,
    module_id: Option<i64>,
    module_name: Option<&str>,
    bind_mode: &str,
) -> lingopack_core::Result<Option<BindSpec>> {
    let page = match (page_id, page_route) {
        (Some(id), _) => PageTarget::Existing(id),
        (None, Some(route)) => PageTarget::Create {
            route: route.to_string(),
            title: page_title.map(String::from),
            description: page_description.map(String::from),
        },
        (None, None) => {
            if module_id.is_some() || module_name.is_some() {
                return Err(EngineError::Validation(
                    "--module-id/--module-name require --page-id or --page-route".into(),
                ));
            }
            return Ok(None);
        }
    };
    let module = match (module_id, module_name) {
        (Some(id), _) => ModuleTarget::Existing(id),
        (None, Some(name)) => ModuleTarget::Create {
            name: name.to_string(),
        },
        (None, None) => ModuleTarget::Root,
    };
    let mode = BindMode::parse(bind_mode)
        .ok_or_else(|| EngineError::Validation(format!("unknown bind mode `{bind_mode}`")))?;
    Ok(Some(BindSpec { page, module, mode }))
}

fn print_report(report: &ImportReport, use_color: bool) {
    let s = &report.summary;
    let line = format!(
        "{} import ({}): added {}, updated {}, missing {}, ignored {}, skipped empty {}, marked needs_update {}",
        report.kind.as_str(),
        report.locale,
        s.added,
        s.updated,
        s.missing,
        s.ignored,
        s.skipped_empty,
        s.marked_needs_update
    );
    if use_color {
        use owo_colors::OwoColorize;
        println!("✔ {}", line.green());
    } else {
        println!("✔ {line}");
    }
    if let Some(bind) = &report.bind {
        println!(
            "  bound to page {} module {}: attached {}, already placed {}",
            bind.page_id, bind.module_id, bind.attached, bind.already_placed
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_flags_without_a_page_are_rejected() {
        let err = build_bind(None, None, None, None, None, Some("header"), "all").unwrap_err();
        assert_eq!(err.kind(), "validation");
    }

    #[test]
    fn no_bind_flags_means_no_bind() {
        assert!(build_bind(None, None, None, None, None, None, "all")
            .unwrap()
            .is_none());
    }

    #[test]
    fn page_description_is_threaded_into_the_bind() {
        let spec = build_bind(
            None,
            Some("/home"),
            Some("Home"),
            Some("Landing page"),
            None,
            None,
            "all",
        )
        .unwrap()
        .unwrap();
        match spec.page {
            PageTarget::Create { description, .. } => {
                assert_eq!(description.as_deref(), Some("Landing page"));
            }
            PageTarget::Existing(_) => panic!("expected a create target"),
        }
    }

    #[test]
    fn unknown_bind_mode_is_rejected() {
        let err = build_bind(Some(1), None, None, None, None, None, "newest").unwrap_err();
        assert_eq!(err.kind(), "validation");
    }
}
