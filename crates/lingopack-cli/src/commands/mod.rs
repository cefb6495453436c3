pub mod export;
pub mod history;
pub mod import;
pub mod init_project;
pub mod review;
pub mod schema;

use color_eyre::eyre::{eyre, Result};
use lingopack_core::ProjectContext;
use lingopack_store::{CatalogStore, SqliteStore};
use std::path::PathBuf;

/// Open the catalog database: `--db` flag, then config `db_path`, then
/// `./lingopack.db`.
pub fn open_store(db: Option<PathBuf>) -> Result<SqliteStore> {
    let path = match db {
        Some(p) => p,
        None => {
            let cfg = lingopack_config::load_config().unwrap_or_default();
            PathBuf::from(cfg.db_path.unwrap_or_else(|| "lingopack.db".to_string()))
        }
    };
    Ok(SqliteStore::open(&path)?)
}

pub fn load_project(store: &SqliteStore, project_id: i64) -> Result<ProjectContext> {
    store
        .with_tx(|tx| tx.get_project(project_id))?
        .ok_or_else(|| eyre!("project {project_id} is not initialized, run init-project first"))
}

/// Operator name: `--operator` flag, then config `import.operator`, then the
/// OS user name.
pub fn resolve_operator(flag: Option<&str>) -> String {
    if let Some(name) = flag {
        return name.to_string();
    }
    let cfg = lingopack_config::load_config().unwrap_or_default();
    if let Some(name) = cfg.import.and_then(|i| i.operator) {
        return name;
    }
    std::env::var("USER").unwrap_or_else(|_| "cli".to_string())
}
