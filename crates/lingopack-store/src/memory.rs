//! In-memory catalog store. Transaction semantics via copy-on-write: the
//! closure mutates a clone of the state, which replaces the original only on
//! commit. Used by unit tests and as the reference backend.

use std::sync::Mutex;

use lingopack_core::{EngineError, ProjectContext, Result};
use lingopack_domain::{PackageUpload, TranslationStatus};

use crate::{
    CatalogStore, CatalogTx, CreateOrGet, EntryRecord, ModuleRecord, PageRecord, TemplateRecord,
    TranslationRecord,
};

#[derive(Debug, Clone, Default)]
struct State {
    projects: Vec<ProjectContext>,
    entries: Vec<EntryRecord>,
    translations: Vec<TranslationRecord>,
    pages: Vec<PageRecord>,
    modules: Vec<ModuleRecord>,
    /// (entry_id, page_id, module_id)
    placements: Vec<(i64, i64, i64)>,
    templates: Vec<(i64, TemplateRecord)>,
    uploads: Vec<PackageUpload>,
    next_id: i64,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CatalogStore for MemoryStore {
    fn with_tx<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut dyn CatalogTx) -> Result<T>,
    {
        let mut guard = self
            .state
            .lock()
            .map_err(|_| EngineError::Storage("memory store lock poisoned".into()))?;
        let mut work = guard.clone();
        let out = f(&mut MemoryTx { state: &mut work })?;
        *guard = work;
        Ok(out)
    }
}

struct MemoryTx<'a> {
    state: &'a mut State,
}

impl CatalogTx for MemoryTx<'_> {
    fn get_project(&mut self, project_id: i64) -> Result<Option<ProjectContext>> {
        Ok(self
            .state
            .projects
            .iter()
            .find(|p| p.project_id == project_id)
            .cloned())
    }

    fn upsert_project(&mut self, project: &ProjectContext) -> Result<()> {
        match self
            .state
            .projects
            .iter_mut()
            .find(|p| p.project_id == project.project_id)
        {
            Some(p) => *p = project.clone(),
            None => self.state.projects.push(project.clone()),
        }
        Ok(())
    }

    fn list_entries(&mut self, project_id: i64) -> Result<Vec<EntryRecord>> {
        Ok(self
            .state
            .entries
            .iter()
            .filter(|e| e.project_id == project_id)
            .cloned()
            .collect())
    }

    fn find_entries_by_keys(
        &mut self,
        project_id: i64,
        keys: &[String],
    ) -> Result<Vec<EntryRecord>> {
        let wanted: std::collections::HashSet<&str> = keys.iter().map(String::as_str).collect();
        Ok(self
            .state
            .entries
            .iter()
            .filter(|e| e.project_id == project_id && wanted.contains(e.key.as_str()))
            .cloned()
            .collect())
    }

    fn insert_entry(&mut self, project_id: i64, key: &str, source_text: &str) -> Result<i64> {
        if self
            .state
            .entries
            .iter()
            .any(|e| e.project_id == project_id && e.key == key)
        {
            return Err(EngineError::Storage(format!(
                "entry key `{key}` already exists in project {project_id}"
            )));
        }
        let id = self.state.next_id();
        self.state.entries.push(EntryRecord {
            id,
            project_id,
            key: key.to_string(),
            source_text: source_text.to_string(),
        });
        Ok(id)
    }

    fn update_entry_source(&mut self, entry_id: i64, source_text: &str) -> Result<()> {
        let entry = self
            .state
            .entries
            .iter_mut()
            .find(|e| e.id == entry_id)
            .ok_or_else(|| EngineError::Storage(format!("entry {entry_id} not found")))?;
        entry.source_text = source_text.to_string();
        Ok(())
    }

    fn translations_for_entries(&mut self, entry_ids: &[i64]) -> Result<Vec<TranslationRecord>> {
        let wanted: std::collections::HashSet<i64> = entry_ids.iter().copied().collect();
        Ok(self
            .state
            .translations
            .iter()
            .filter(|t| wanted.contains(&t.entry_id))
            .cloned()
            .collect())
    }

    fn get_translation(
        &mut self,
        entry_id: i64,
        locale: &str,
    ) -> Result<Option<TranslationRecord>> {
        Ok(self
            .state
            .translations
            .iter()
            .find(|t| t.entry_id == entry_id && t.locale == locale)
            .cloned())
    }

    fn upsert_translation(
        &mut self,
        entry_id: i64,
        locale: &str,
        text: &str,
        status: TranslationStatus,
    ) -> Result<()> {
        match self
            .state
            .translations
            .iter_mut()
            .find(|t| t.entry_id == entry_id && t.locale == locale)
        {
            Some(t) => {
                t.text = text.to_string();
                t.status = status;
            }
            None => self.state.translations.push(TranslationRecord {
                entry_id,
                locale: locale.to_string(),
                text: text.to_string(),
                status,
            }),
        }
        Ok(())
    }

    fn set_translation_status(
        &mut self,
        entry_id: i64,
        locale: &str,
        status: TranslationStatus,
    ) -> Result<()> {
        let t = self
            .state
            .translations
            .iter_mut()
            .find(|t| t.entry_id == entry_id && t.locale == locale)
            .ok_or_else(|| {
                EngineError::Storage(format!(
                    "translation ({entry_id}, {locale}) not found"
                ))
            })?;
        t.status = status;
        Ok(())
    }

    fn get_page(&mut self, page_id: i64) -> Result<Option<PageRecord>> {
        Ok(self.state.pages.iter().find(|p| p.id == page_id).cloned())
    }

    fn create_or_get_page(
        &mut self,
        project_id: i64,
        route: &str,
        title: Option<&str>,
        description: Option<&str>,
    ) -> Result<CreateOrGet<PageRecord>> {
        if let Some(p) = self
            .state
            .pages
            .iter()
            .find(|p| p.project_id == project_id && p.route == route)
        {
            return Ok(CreateOrGet {
                record: p.clone(),
                created: false,
            });
        }
        let id = self.state.next_id();
        let page = PageRecord {
            id,
            project_id,
            route: route.to_string(),
            title: title.map(str::to_string),
            description: description.map(str::to_string),
        };
        self.state.pages.push(page.clone());
        Ok(CreateOrGet {
            record: page,
            created: true,
        })
    }

    fn get_module(&mut self, module_id: i64) -> Result<Option<ModuleRecord>> {
        Ok(self
            .state
            .modules
            .iter()
            .find(|m| m.id == module_id)
            .cloned())
    }

    fn create_or_get_module(
        &mut self,
        page_id: i64,
        name: &str,
    ) -> Result<CreateOrGet<ModuleRecord>> {
        if let Some(m) = self
            .state
            .modules
            .iter()
            .find(|m| m.page_id == page_id && m.name == name)
        {
            return Ok(CreateOrGet {
                record: m.clone(),
                created: false,
            });
        }
        let id = self.state.next_id();
        let module = ModuleRecord {
            id,
            page_id,
            name: name.to_string(),
        };
        self.state.modules.push(module.clone());
        Ok(CreateOrGet {
            record: module,
            created: true,
        })
    }

    fn placed_entries(
        &mut self,
        page_id: i64,
        module_id: i64,
        entry_ids: &[i64],
    ) -> Result<Vec<i64>> {
        let wanted: std::collections::HashSet<i64> = entry_ids.iter().copied().collect();
        Ok(self
            .state
            .placements
            .iter()
            .filter(|(e, p, m)| *p == page_id && *m == module_id && wanted.contains(e))
            .map(|(e, _, _)| *e)
            .collect())
    }

    fn insert_placements(
        &mut self,
        page_id: i64,
        module_id: i64,
        entry_ids: &[i64],
    ) -> Result<()> {
        for &entry_id in entry_ids {
            let triple = (entry_id, page_id, module_id);
            if !self.state.placements.contains(&triple) {
                self.state.placements.push(triple);
            }
        }
        Ok(())
    }

    fn get_template(&mut self, project_id: i64) -> Result<Option<TemplateRecord>> {
        Ok(self
            .state
            .templates
            .iter()
            .find(|(p, _)| *p == project_id)
            .map(|(_, t)| t.clone()))
    }

    fn upsert_template(&mut self, project_id: i64, template: &TemplateRecord) -> Result<()> {
        match self
            .state
            .templates
            .iter_mut()
            .find(|(p, _)| *p == project_id)
        {
            Some((_, t)) => *t = template.clone(),
            None => self.state.templates.push((project_id, template.clone())),
        }
        Ok(())
    }

    fn insert_upload(&mut self, upload: &PackageUpload) -> Result<i64> {
        let id = self.state.next_id();
        let mut row = upload.clone();
        row.id = id;
        self.state.uploads.push(row);
        Ok(id)
    }

    fn list_uploads(&mut self, project_id: i64, limit: usize) -> Result<Vec<PackageUpload>> {
        Ok(self
            .state
            .uploads
            .iter()
            .rev()
            .filter(|u| u.project_id == project_id)
            .take(limit)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lingopack_core::QualityMode;

    fn project() -> ProjectContext {
        ProjectContext {
            project_id: 1,
            source_locale: "zh-CN".into(),
            target_locales: vec!["en-US".into()],
            quality_mode: QualityMode::Open,
        }
    }

    #[test]
    fn rollback_discards_all_writes() {
        let store = MemoryStore::new();
        let err = store.with_tx(|tx| {
            tx.insert_entry(1, "common.save", "保存")?;
            Err::<(), _>(EngineError::Binding("boom".into()))
        });
        assert!(err.is_err());
        let entries = store.with_tx(|tx| tx.list_entries(1)).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn commit_persists_across_transactions() {
        let store = MemoryStore::new();
        store
            .with_tx(|tx| {
                tx.upsert_project(&project())?;
                tx.insert_entry(1, "common.save", "保存")
            })
            .unwrap();
        let entries = store.with_tx(|tx| tx.list_entries(1)).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].key, "common.save");
    }

    #[test]
    fn duplicate_entry_key_is_a_storage_error() {
        let store = MemoryStore::new();
        let err = store
            .with_tx(|tx| {
                tx.insert_entry(1, "k", "a")?;
                tx.insert_entry(1, "k", "b")
            })
            .unwrap_err();
        assert_eq!(err.kind(), "storage");
    }

    #[test]
    fn create_or_get_page_is_idempotent() {
        let store = MemoryStore::new();
        store
            .with_tx(|tx| {
                let first =
                    tx.create_or_get_page(1, "/settings", Some("Settings"), Some("Preferences"))?;
                assert!(first.created);
                let second = tx.create_or_get_page(1, "/settings", None, None)?;
                assert!(!second.created);
                assert_eq!(first.record.id, second.record.id);
                assert_eq!(second.record.title.as_deref(), Some("Settings"));
                assert_eq!(second.record.description.as_deref(), Some("Preferences"));
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn placements_never_duplicate() {
        let store = MemoryStore::new();
        store
            .with_tx(|tx| {
                tx.insert_placements(10, 20, &[1, 2])?;
                tx.insert_placements(10, 20, &[2, 3])?;
                let placed = tx.placed_entries(10, 20, &[1, 2, 3, 4])?;
                assert_eq!(placed.len(), 3);
                Ok(())
            })
            .unwrap();
    }
}
