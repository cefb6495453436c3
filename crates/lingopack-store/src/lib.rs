//! Catalog store contract: entries, translations, pages, modules, placements,
//! template metadata and upload audit rows behind a unit-of-work boundary.
//!
//! Reconciliation code is storage-agnostic: it receives a `&mut dyn
//! CatalogTx` and never sees the backend. A closure passed to
//! [`CatalogStore::with_tx`] commits when it returns `Ok` and rolls back
//! fully on `Err` — partial imports are never observable.

use lingopack_core::{ProjectContext, Result};
use lingopack_domain::{PackShape, PackageUpload, TranslationStatus};
use serde::{Deserialize, Serialize};

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Reserved module name meaning "placed on the page, no named module".
/// Never shown to end users.
pub const ROOT_MODULE: &str = "__root__";

/// Batch size for placement existence checks and bulk inserts.
pub const BIND_CHUNK: usize = 1000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryRecord {
    pub id: i64,
    pub project_id: i64,
    pub key: String,
    pub source_text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationRecord {
    pub entry_id: i64,
    pub locale: String,
    pub text: String,
    pub status: TranslationStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRecord {
    pub id: i64,
    pub project_id: i64,
    pub route: String,
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleRecord {
    pub id: i64,
    pub page_id: i64,
    pub name: String,
}

/// Persisted template metadata: the shape fixed by the first import and the
/// ordered union of leaf key-paths seen across tree imports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateRecord {
    pub shape: PackShape,
    pub paths: Vec<String>,
}

/// Result of an idempotent create: either a fresh row or the one that was
/// already there. A create racing another create on the same unique key is
/// resolved here, not surfaced as an error.
#[derive(Debug, Clone)]
pub struct CreateOrGet<T> {
    pub record: T,
    pub created: bool,
}

/// Operations available inside one unit of work. Object-safe so the
/// reconciliation code can take `&mut dyn CatalogTx`.
pub trait CatalogTx {
    fn get_project(&mut self, project_id: i64) -> Result<Option<ProjectContext>>;
    fn upsert_project(&mut self, project: &ProjectContext) -> Result<()>;

    fn list_entries(&mut self, project_id: i64) -> Result<Vec<EntryRecord>>;
    fn find_entries_by_keys(&mut self, project_id: i64, keys: &[String])
        -> Result<Vec<EntryRecord>>;
    fn insert_entry(&mut self, project_id: i64, key: &str, source_text: &str) -> Result<i64>;
    fn update_entry_source(&mut self, entry_id: i64, source_text: &str) -> Result<()>;

    /// All locales for the given entries.
    fn translations_for_entries(&mut self, entry_ids: &[i64]) -> Result<Vec<TranslationRecord>>;
    fn get_translation(&mut self, entry_id: i64, locale: &str)
        -> Result<Option<TranslationRecord>>;
    fn upsert_translation(
        &mut self,
        entry_id: i64,
        locale: &str,
        text: &str,
        status: TranslationStatus,
    ) -> Result<()>;
    fn set_translation_status(
        &mut self,
        entry_id: i64,
        locale: &str,
        status: TranslationStatus,
    ) -> Result<()>;

    fn get_page(&mut self, page_id: i64) -> Result<Option<PageRecord>>;
    fn create_or_get_page(
        &mut self,
        project_id: i64,
        route: &str,
        title: Option<&str>,
        description: Option<&str>,
    ) -> Result<CreateOrGet<PageRecord>>;
    fn get_module(&mut self, module_id: i64) -> Result<Option<ModuleRecord>>;
    fn create_or_get_module(&mut self, page_id: i64, name: &str)
        -> Result<CreateOrGet<ModuleRecord>>;

    /// Which of `entry_ids` already have a placement for (page, module).
    fn placed_entries(
        &mut self,
        page_id: i64,
        module_id: i64,
        entry_ids: &[i64],
    ) -> Result<Vec<i64>>;
    fn insert_placements(&mut self, page_id: i64, module_id: i64, entry_ids: &[i64]) -> Result<()>;

    fn get_template(&mut self, project_id: i64) -> Result<Option<TemplateRecord>>;
    fn upsert_template(&mut self, project_id: i64, template: &TemplateRecord) -> Result<()>;

    fn insert_upload(&mut self, upload: &PackageUpload) -> Result<i64>;
    /// Most recent first.
    fn list_uploads(&mut self, project_id: i64, limit: usize) -> Result<Vec<PackageUpload>>;
}

pub trait CatalogStore {
    /// Run `f` inside one transaction. Commit on `Ok`, roll back on `Err`.
    fn with_tx<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut dyn CatalogTx) -> Result<T>;
}
