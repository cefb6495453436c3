use color_eyre::eyre::Result;
use lingopack_core::EngineError;
use lingopack_services::{export_bundle, export_locale, FillMode};
use serde::Serialize;
use std::path::PathBuf;

use crate::ui;

#[derive(Serialize)]
struct Written {
    file_name: String,
    path: String,
    bytes: usize,
}

pub fn run_locale(
    db: Option<PathBuf>,
    project_id: i64,
    locale: &str,
    fill: Option<&str>,
    out: Option<PathBuf>,
    format: &str,
) -> Result<()> {
    let store = super::open_store(db)?;
    let project = super::load_project(&store, project_id)?;

    let result = resolve_fill(fill).and_then(|fill| export_locale(&store, &project, locale, fill));
    let file = match result {
        Ok(f) => f,
        Err(e) if format == "json" => ui::fail_json(&e),
        Err(e) => return Err(e.into()),
    };

    let path = out_path(out, &file.file_name);
    std::fs::write(&path, &file.content)?;

    let written = Written {
        file_name: file.file_name,
        path: path.display().to_string(),
        bytes: file.content.len(),
    };
    if format == "json" {
        ui::print_ok(&written)?;
    } else {
        println!("✔ pack saved to {}", written.path);
    }
    Ok(())
}

pub fn run_bundle(
    db: Option<PathBuf>,
    project_id: i64,
    fill: Option<&str>,
    out: Option<PathBuf>,
    format: &str,
) -> Result<()> {
    let store = super::open_store(db)?;
    let project = super::load_project(&store, project_id)?;

    let result = resolve_fill(fill).and_then(|fill| export_bundle(&store, &project, fill));
    let bundle = match result {
        Ok(b) => b,
        Err(e) if format == "json" => ui::fail_json(&e),
        Err(e) => return Err(e.into()),
    };

    let path = out_path(out, &bundle.file_name);
    std::fs::write(&path, &bundle.bytes)?;

    let written = Written {
        file_name: bundle.file_name,
        path: path.display().to_string(),
        bytes: bundle.bytes.len(),
    };
    if format == "json" {
        ui::print_ok(&written)?;
    } else {
        println!("✔ bundle saved to {}", written.path);
    }
    Ok(())
}

/// `--fill` flag, then config `export.mode`, then `empty`.
fn resolve_fill(flag: Option<&str>) -> lingopack_core::Result<FillMode> {
    let name = match flag {
        Some(f) => f.to_string(),
        None => {
            let cfg = lingopack_config::load_config().unwrap_or_default();
            match cfg.export.and_then(|e| e.mode) {
                Some(mode) => mode,
                None => return Ok(FillMode::Empty),
            }
        }
    };
    FillMode::parse(&name)
        .ok_or_else(|| EngineError::Validation(format!("unknown fill mode `{name}`")))
}

fn out_path(out: Option<PathBuf>, file_name: &str) -> PathBuf {
    match out {
        Some(p) => p,
        None => {
            let cfg = lingopack_config::load_config().unwrap_or_default();
            let dir = cfg
                .export
                .and_then(|e| e.out_dir)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("."));
            dir.join(file_name)
        }
    }
}
