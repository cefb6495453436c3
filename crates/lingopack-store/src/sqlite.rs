//! SQLite-backed catalog store. Uniqueness constraints on entry keys, page
//! routes, module names, placement triples and translation (entry, locale)
//! pairs back the idempotent-create paths; `INSERT ... ON CONFLICT DO
//! NOTHING` plus a re-read implements create-or-get without surfacing the
//! conflict.

use std::path::Path;
use std::sync::Mutex;

use lingopack_core::{EngineError, ProjectContext, QualityMode, Result};
use lingopack_domain::{ImportKind, ImportSummary, PackShape, PackageUpload, TranslationStatus};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use tracing::debug;

use crate::{
    CatalogStore, CatalogTx, CreateOrGet, EntryRecord, ModuleRecord, PageRecord, TemplateRecord,
    TranslationRecord,
};

/// Keeps IN-list sizes well under the SQLite bind-parameter limit.
const IN_CHUNK: usize = 500;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS projects (
    project_id     INTEGER PRIMARY KEY,
    source_locale  TEXT NOT NULL,
    target_locales TEXT NOT NULL,
    quality_mode   TEXT NOT NULL DEFAULT 'open'
);
CREATE TABLE IF NOT EXISTS entries (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id  INTEGER NOT NULL,
    key         TEXT NOT NULL,
    source_text TEXT NOT NULL,
    UNIQUE (project_id, key)
);
CREATE TABLE IF NOT EXISTS translations (
    id       INTEGER PRIMARY KEY AUTOINCREMENT,
    entry_id INTEGER NOT NULL REFERENCES entries(id),
    locale   TEXT NOT NULL,
    text     TEXT NOT NULL DEFAULT '',
    status   TEXT NOT NULL,
    UNIQUE (entry_id, locale)
);
CREATE TABLE IF NOT EXISTS pages (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id  INTEGER NOT NULL,
    route       TEXT NOT NULL,
    title       TEXT,
    description TEXT,
    UNIQUE (project_id, route)
);
CREATE TABLE IF NOT EXISTS modules (
    id      INTEGER PRIMARY KEY AUTOINCREMENT,
    page_id INTEGER NOT NULL REFERENCES pages(id),
    name    TEXT NOT NULL,
    UNIQUE (page_id, name)
);
CREATE TABLE IF NOT EXISTS placements (
    id        INTEGER PRIMARY KEY AUTOINCREMENT,
    entry_id  INTEGER NOT NULL REFERENCES entries(id),
    page_id   INTEGER NOT NULL REFERENCES pages(id),
    module_id INTEGER NOT NULL REFERENCES modules(id),
    UNIQUE (entry_id, page_id, module_id)
);
CREATE TABLE IF NOT EXISTS templates (
    project_id INTEGER PRIMARY KEY,
    shape      TEXT NOT NULL,
    paths      TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS uploads (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id INTEGER NOT NULL,
    kind       TEXT NOT NULL,
    locale     TEXT NOT NULL,
    shape      TEXT NOT NULL,
    operator   TEXT NOT NULL,
    summary    TEXT NOT NULL,
    created_at INTEGER NOT NULL
);
"#;

fn storage(e: rusqlite::Error) -> EngineError {
    EngineError::Storage(e.to_string())
}

fn parse_status(s: &str) -> Result<TranslationStatus> {
    TranslationStatus::parse(s)
        .ok_or_else(|| EngineError::Storage(format!("unknown translation status `{s}`")))
}

#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(storage)?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(storage)?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.busy_timeout(std::time::Duration::from_millis(5_000))
            .map_err(storage)?;
        conn.pragma_update(None, "foreign_keys", "ON").map_err(storage)?;
        conn.execute_batch(SCHEMA).map_err(storage)?;
        Ok(SqliteStore {
            conn: Mutex::new(conn),
        })
    }
}

impl CatalogStore for SqliteStore {
    fn with_tx<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut dyn CatalogTx) -> Result<T>,
    {
        let mut conn = self
            .conn
            .lock()
            .map_err(|_| EngineError::Storage("sqlite connection lock poisoned".into()))?;
        let tx = conn.transaction().map_err(storage)?;
        let out = {
            let mut stx = SqliteTx { tx: &tx };
            f(&mut stx)
        };
        match out {
            Ok(v) => {
                tx.commit().map_err(storage)?;
                Ok(v)
            }
            Err(e) => {
                // dropping the transaction rolls back every write
                debug!("transaction rolled back: {e}");
                Err(e)
            }
        }
    }
}

struct SqliteTx<'t, 'c> {
    tx: &'t rusqlite::Transaction<'c>,
}

impl SqliteTx<'_, '_> {
    fn entries_where_keys(
        &self,
        project_id: i64,
        keys: &[String],
    ) -> Result<Vec<EntryRecord>> {
        let mut out = Vec::new();
        for chunk in keys.chunks(IN_CHUNK) {
            let marks = vec!["?"; chunk.len()].join(",");
            let sql = format!(
                "SELECT id, project_id, key, source_text FROM entries \
                 WHERE project_id = ? AND key IN ({marks})"
            );
            let mut stmt = self.tx.prepare(&sql).map_err(storage)?;
            let mut args: Vec<&dyn rusqlite::ToSql> = vec![&project_id];
            for k in chunk {
                args.push(k);
            }
            let rows = stmt
                .query_map(args.as_slice(), |r| {
                    Ok(EntryRecord {
                        id: r.get(0)?,
                        project_id: r.get(1)?,
                        key: r.get(2)?,
                        source_text: r.get(3)?,
                    })
                })
                .map_err(storage)?;
            for row in rows {
                out.push(row.map_err(storage)?);
            }
        }
        Ok(out)
    }
}

impl CatalogTx for SqliteTx<'_, '_> {
    fn get_project(&mut self, project_id: i64) -> Result<Option<ProjectContext>> {
        let row: Option<(String, String, String)> = self
            .tx
            .query_row(
                "SELECT source_locale, target_locales, quality_mode \
                 FROM projects WHERE project_id = ?1",
                params![project_id],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
            )
            .optional()
            .map_err(storage)?;
        match row {
            None => Ok(None),
            Some((source_locale, targets_json, quality)) => {
                let target_locales: Vec<String> = serde_json::from_str(&targets_json)
                    .map_err(|e| EngineError::Storage(format!("bad target_locales column: {e}")))?;
                let quality_mode = QualityMode::parse(&quality).ok_or_else(|| {
                    EngineError::Storage(format!("unknown quality mode `{quality}`"))
                })?;
                Ok(Some(ProjectContext {
                    project_id,
                    source_locale,
                    target_locales,
                    quality_mode,
                }))
            }
        }
    }

    fn upsert_project(&mut self, project: &ProjectContext) -> Result<()> {
        let targets = serde_json::to_string(&project.target_locales)
            .map_err(|e| EngineError::Storage(e.to_string()))?;
        self.tx
            .execute(
                "INSERT INTO projects (project_id, source_locale, target_locales, quality_mode) \
                 VALUES (?1, ?2, ?3, ?4) \
                 ON CONFLICT(project_id) DO UPDATE SET \
                   source_locale = excluded.source_locale, \
                   target_locales = excluded.target_locales, \
                   quality_mode = excluded.quality_mode",
                params![
                    project.project_id,
                    project.source_locale,
                    targets,
                    project.quality_mode.as_str()
                ],
            )
            .map_err(storage)?;
        Ok(())
    }

    fn list_entries(&mut self, project_id: i64) -> Result<Vec<EntryRecord>> {
        let mut stmt = self
            .tx
            .prepare(
                "SELECT id, project_id, key, source_text FROM entries \
                 WHERE project_id = ?1 ORDER BY id",
            )
            .map_err(storage)?;
        let rows = stmt
            .query_map(params![project_id], |r| {
                Ok(EntryRecord {
                    id: r.get(0)?,
                    project_id: r.get(1)?,
                    key: r.get(2)?,
                    source_text: r.get(3)?,
                })
            })
            .map_err(storage)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row.map_err(storage)?);
        }
        Ok(out)
    }

    fn find_entries_by_keys(
        &mut self,
        project_id: i64,
        keys: &[String],
    ) -> Result<Vec<EntryRecord>> {
        self.entries_where_keys(project_id, keys)
    }

    fn insert_entry(&mut self, project_id: i64, key: &str, source_text: &str) -> Result<i64> {
        self.tx
            .execute(
                "INSERT INTO entries (project_id, key, source_text) VALUES (?1, ?2, ?3)",
                params![project_id, key, source_text],
            )
            .map_err(storage)?;
        Ok(self.tx.last_insert_rowid())
    }

    fn update_entry_source(&mut self, entry_id: i64, source_text: &str) -> Result<()> {
        let n = self
            .tx
            .execute(
                "UPDATE entries SET source_text = ?2 WHERE id = ?1",
                params![entry_id, source_text],
            )
            .map_err(storage)?;
        if n == 0 {
            return Err(EngineError::Storage(format!("entry {entry_id} not found")));
        }
        Ok(())
    }

    fn translations_for_entries(&mut self, entry_ids: &[i64]) -> Result<Vec<TranslationRecord>> {
        let mut out = Vec::new();
        for chunk in entry_ids.chunks(IN_CHUNK) {
            let marks = vec!["?"; chunk.len()].join(",");
            let sql = format!(
                "SELECT entry_id, locale, text, status FROM translations \
                 WHERE entry_id IN ({marks}) ORDER BY entry_id, locale"
            );
            let mut stmt = self.tx.prepare(&sql).map_err(storage)?;
            let rows = stmt
                .query_map(params_from_iter(chunk.iter()), |r| {
                    Ok((
                        r.get::<_, i64>(0)?,
                        r.get::<_, String>(1)?,
                        r.get::<_, String>(2)?,
                        r.get::<_, String>(3)?,
                    ))
                })
                .map_err(storage)?;
            for row in rows {
                let (entry_id, locale, text, status) = row.map_err(storage)?;
                out.push(TranslationRecord {
                    entry_id,
                    locale,
                    text,
                    status: parse_status(&status)?,
                });
            }
        }
        Ok(out)
    }

    fn get_translation(
        &mut self,
        entry_id: i64,
        locale: &str,
    ) -> Result<Option<TranslationRecord>> {
        let row: Option<(String, String)> = self
            .tx
            .query_row(
                "SELECT text, status FROM translations WHERE entry_id = ?1 AND locale = ?2",
                params![entry_id, locale],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .optional()
            .map_err(storage)?;
        match row {
            None => Ok(None),
            Some((text, status)) => Ok(Some(TranslationRecord {
                entry_id,
                locale: locale.to_string(),
                text,
                status: parse_status(&status)?,
            })),
        }
    }

    fn upsert_translation(
        &mut self,
        entry_id: i64,
        locale: &str,
        text: &str,
        status: TranslationStatus,
    ) -> Result<()> {
        self.tx
            .execute(
                "INSERT INTO translations (entry_id, locale, text, status) \
                 VALUES (?1, ?2, ?3, ?4) \
                 ON CONFLICT(entry_id, locale) DO UPDATE SET \
                   text = excluded.text, status = excluded.status",
                params![entry_id, locale, text, status.as_str()],
            )
            .map_err(storage)?;
        Ok(())
    }

    fn set_translation_status(
        &mut self,
        entry_id: i64,
        locale: &str,
        status: TranslationStatus,
    ) -> Result<()> {
        let n = self
            .tx
            .execute(
                "UPDATE translations SET status = ?3 WHERE entry_id = ?1 AND locale = ?2",
                params![entry_id, locale, status.as_str()],
            )
            .map_err(storage)?;
        if n == 0 {
            return Err(EngineError::Storage(format!(
                "translation ({entry_id}, {locale}) not found"
            )));
        }
        Ok(())
    }

    fn get_page(&mut self, page_id: i64) -> Result<Option<PageRecord>> {
        self.tx
            .query_row(
                "SELECT id, project_id, route, title, description FROM pages WHERE id = ?1",
                params![page_id],
                |r| {
                    Ok(PageRecord {
                        id: r.get(0)?,
                        project_id: r.get(1)?,
                        route: r.get(2)?,
                        title: r.get(3)?,
                        description: r.get(4)?,
                    })
                },
            )
            .optional()
            .map_err(storage)
    }

    fn create_or_get_page(
        &mut self,
        project_id: i64,
        route: &str,
        title: Option<&str>,
        description: Option<&str>,
    ) -> Result<CreateOrGet<PageRecord>> {
        let inserted = self
            .tx
            .execute(
                "INSERT INTO pages (project_id, route, title, description) \
                 VALUES (?1, ?2, ?3, ?4) \
                 ON CONFLICT(project_id, route) DO NOTHING",
                params![project_id, route, title, description],
            )
            .map_err(storage)?;
        let record = self
            .tx
            .query_row(
                "SELECT id, project_id, route, title, description FROM pages \
                 WHERE project_id = ?1 AND route = ?2",
                params![project_id, route],
                |r| {
                    Ok(PageRecord {
                        id: r.get(0)?,
                        project_id: r.get(1)?,
                        route: r.get(2)?,
                        title: r.get(3)?,
                        description: r.get(4)?,
                    })
                },
            )
            .map_err(storage)?;
        Ok(CreateOrGet {
            record,
            created: inserted > 0,
        })
    }

    fn get_module(&mut self, module_id: i64) -> Result<Option<ModuleRecord>> {
        self.tx
            .query_row(
                "SELECT id, page_id, name FROM modules WHERE id = ?1",
                params![module_id],
                |r| {
                    Ok(ModuleRecord {
                        id: r.get(0)?,
                        page_id: r.get(1)?,
                        name: r.get(2)?,
                    })
                },
            )
            .optional()
            .map_err(storage)
    }

    fn create_or_get_module(
        &mut self,
        page_id: i64,
        name: &str,
    ) -> Result<CreateOrGet<ModuleRecord>> {
        let inserted = self
            .tx
            .execute(
                "INSERT INTO modules (page_id, name) VALUES (?1, ?2) \
                 ON CONFLICT(page_id, name) DO NOTHING",
                params![page_id, name],
            )
            .map_err(storage)?;
        let record = self
            .tx
            .query_row(
                "SELECT id, page_id, name FROM modules WHERE page_id = ?1 AND name = ?2",
                params![page_id, name],
                |r| {
                    Ok(ModuleRecord {
                        id: r.get(0)?,
                        page_id: r.get(1)?,
                        name: r.get(2)?,
                    })
                },
            )
            .map_err(storage)?;
        Ok(CreateOrGet {
            record,
            created: inserted > 0,
        })
    }

    fn placed_entries(
        &mut self,
        page_id: i64,
        module_id: i64,
        entry_ids: &[i64],
    ) -> Result<Vec<i64>> {
        let mut out = Vec::new();
        for chunk in entry_ids.chunks(IN_CHUNK) {
            let marks = vec!["?"; chunk.len()].join(",");
            let sql = format!(
                "SELECT entry_id FROM placements \
                 WHERE page_id = ? AND module_id = ? AND entry_id IN ({marks})"
            );
            let mut stmt = self.tx.prepare(&sql).map_err(storage)?;
            let mut args: Vec<&dyn rusqlite::ToSql> = vec![&page_id, &module_id];
            for id in chunk {
                args.push(id);
            }
            let rows = stmt
                .query_map(args.as_slice(), |r| r.get::<_, i64>(0))
                .map_err(storage)?;
            for row in rows {
                out.push(row.map_err(storage)?);
            }
        }
        Ok(out)
    }

    fn insert_placements(
        &mut self,
        page_id: i64,
        module_id: i64,
        entry_ids: &[i64],
    ) -> Result<()> {
        let mut stmt = self
            .tx
            .prepare(
                "INSERT INTO placements (entry_id, page_id, module_id) VALUES (?1, ?2, ?3) \
                 ON CONFLICT(entry_id, page_id, module_id) DO NOTHING",
            )
            .map_err(storage)?;
        for &entry_id in entry_ids {
            stmt.execute(params![entry_id, page_id, module_id])
                .map_err(storage)?;
        }
        Ok(())
    }

    fn get_template(&mut self, project_id: i64) -> Result<Option<TemplateRecord>> {
        let row: Option<(String, String)> = self
            .tx
            .query_row(
                "SELECT shape, paths FROM templates WHERE project_id = ?1",
                params![project_id],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .optional()
            .map_err(storage)?;
        match row {
            None => Ok(None),
            Some((shape, paths_json)) => {
                let shape = PackShape::parse(&shape)
                    .ok_or_else(|| EngineError::Storage(format!("unknown shape `{shape}`")))?;
                let paths: Vec<String> = serde_json::from_str(&paths_json)
                    .map_err(|e| EngineError::Storage(format!("bad paths column: {e}")))?;
                Ok(Some(TemplateRecord { shape, paths }))
            }
        }
    }

    fn upsert_template(&mut self, project_id: i64, template: &TemplateRecord) -> Result<()> {
        let paths = serde_json::to_string(&template.paths)
            .map_err(|e| EngineError::Storage(e.to_string()))?;
        self.tx
            .execute(
                "INSERT INTO templates (project_id, shape, paths) VALUES (?1, ?2, ?3) \
                 ON CONFLICT(project_id) DO UPDATE SET \
                   shape = excluded.shape, paths = excluded.paths",
                params![project_id, template.shape.as_str(), paths],
            )
            .map_err(storage)?;
        Ok(())
    }

    fn insert_upload(&mut self, upload: &PackageUpload) -> Result<i64> {
        let summary = serde_json::to_string(&upload.summary)
            .map_err(|e| EngineError::Storage(e.to_string()))?;
        self.tx
            .execute(
                "INSERT INTO uploads \
                 (project_id, kind, locale, shape, operator, summary, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    upload.project_id,
                    upload.kind.as_str(),
                    upload.locale,
                    upload.shape.as_str(),
                    upload.operator,
                    summary,
                    upload.created_at
                ],
            )
            .map_err(storage)?;
        Ok(self.tx.last_insert_rowid())
    }

    fn list_uploads(&mut self, project_id: i64, limit: usize) -> Result<Vec<PackageUpload>> {
        let mut stmt = self
            .tx
            .prepare(
                "SELECT id, kind, locale, shape, operator, summary, created_at \
                 FROM uploads WHERE project_id = ?1 ORDER BY id DESC LIMIT ?2",
            )
            .map_err(storage)?;
        let rows = stmt
            .query_map(params![project_id, limit as i64], |r| {
                Ok((
                    r.get::<_, i64>(0)?,
                    r.get::<_, String>(1)?,
                    r.get::<_, String>(2)?,
                    r.get::<_, String>(3)?,
                    r.get::<_, String>(4)?,
                    r.get::<_, String>(5)?,
                    r.get::<_, i64>(6)?,
                ))
            })
            .map_err(storage)?;
        let mut out = Vec::new();
        for row in rows {
            let (id, kind, locale, shape, operator, summary_json, created_at) =
                row.map_err(storage)?;
            let kind = ImportKind::parse(&kind)
                .ok_or_else(|| EngineError::Storage(format!("unknown import kind `{kind}`")))?;
            let shape = PackShape::parse(&shape)
                .ok_or_else(|| EngineError::Storage(format!("unknown shape `{shape}`")))?;
            let summary: ImportSummary = serde_json::from_str(&summary_json)
                .map_err(|e| EngineError::Storage(format!("bad summary column: {e}")))?;
            out.push(PackageUpload {
                id,
                project_id,
                kind,
                locale,
                shape,
                operator,
                summary,
                created_at,
            });
        }
        Ok(out)
    }
}
