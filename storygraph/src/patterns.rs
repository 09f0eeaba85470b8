//! Pattern list of the open project and the switching sequence around it.
//!
//! The manager only caches pattern metadata. Every switch goes through
//! [`GraphStore::load_pattern`], which flushes the outgoing pattern before
//! the incoming one is read.

use crate::clock::Clock;
use crate::error::StoreError;
use crate::model::{Pattern, PatternData, PatternId};
use crate::repository::PatternRepository;
use crate::store::GraphStore;

pub const DEFAULT_PATTERN_NAME: &str = "Main";

#[derive(Clone, Debug, Default)]
pub struct PatternManager {
    project_id: Option<String>,
    patterns: Vec<Pattern>,
}

impl PatternManager {
    pub fn new() -> Self {
        PatternManager::default()
    }

    pub fn project_id(&self) -> Option<&str> {
        self.project_id.as_deref()
    }

    /// Patterns of the open project, oldest first.
    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    pub fn get(&self, id: &str) -> Option<&Pattern> {
        self.patterns.iter().find(|p| p.id == id)
    }

    pub fn active<'a, R: PatternRepository, C: Clock>(&'a self, store: &GraphStore<R, C>) -> Option<&'a Pattern> {
        store.active_pattern().and_then(|id| self.get(id))
    }

    fn refresh<R: PatternRepository, C: Clock>(&mut self, store: &GraphStore<R, C>) -> Result<(), StoreError> {
        self.patterns = match &self.project_id {
            Some(p) => store.repo().list_patterns(p)?,
            None => Vec::new(),
        };
        Ok(())
    }

    /// Lists the project's patterns, creating "Main" when there are none,
    /// and activates the first one.
    pub fn open_project<R: PatternRepository, C: Clock>(
        &mut self,
        store: &mut GraphStore<R, C>,
        project_id: &str,
    ) -> Result<Option<PatternId>, StoreError> {
        store.flush()?;
        self.project_id = Some(project_id.to_string());
        self.refresh(store)?;
        if self.patterns.is_empty() {
            let now = store.now_ms();
            let main = store
                .repo_mut()
                .create_pattern(project_id, DEFAULT_PATTERN_NAME, PatternData::empty(), now)?;
            log::debug!("project {} had no patterns; created {}", project_id, main.id);
            self.refresh(store)?;
        }
        let Some(first) = self.patterns.first().map(|p| p.id.clone()) else {
            store.unload();
            return Ok(None);
        };
        store.load_pattern(&first)?;
        Ok(Some(first))
    }

    /// Creates an empty pattern and switches to it.
    pub fn create<R: PatternRepository, C: Clock>(
        &mut self,
        store: &mut GraphStore<R, C>,
        name: &str,
    ) -> Result<PatternId, StoreError> {
        let project = self.project_id.clone().ok_or(StoreError::NotLoaded)?;
        let now = store.now_ms();
        let p = store.repo_mut().create_pattern(&project, name.trim(), PatternData::empty(), now)?;
        self.refresh(store)?;
        store.load_pattern(&p.id)?;
        Ok(p.id)
    }

    /// Copies `source` under `name` and switches to the copy. When `source`
    /// is the active pattern its live graph is written first, so edits still
    /// waiting for autosave are carried over.
    pub fn duplicate<R: PatternRepository, C: Clock>(
        &mut self,
        store: &mut GraphStore<R, C>,
        source: &str,
        name: &str,
    ) -> Result<Option<PatternId>, StoreError> {
        let project = self.project_id.clone().ok_or(StoreError::NotLoaded)?;
        if self.get(source).is_none() {
            return Ok(None);
        }
        let data = if store.active_pattern() == Some(source) {
            store.save_now()?;
            store.encode()?
        } else {
            store.repo().load_pattern(source)?.unwrap_or_else(PatternData::empty)
        };
        let now = store.now_ms();
        let p = store.repo_mut().create_pattern(&project, name.trim(), data, now)?;
        self.refresh(store)?;
        store.load_pattern(&p.id)?;
        Ok(Some(p.id))
    }

    /// Deletes a pattern. Pending writes for it are dropped; if it was
    /// active the first remaining pattern is loaded, or the store is left
    /// empty.
    pub fn delete<R: PatternRepository, C: Clock>(
        &mut self,
        store: &mut GraphStore<R, C>,
        id: &str,
    ) -> Result<bool, StoreError> {
        if self.get(id).is_none() {
            return Ok(false);
        }
        let was_active = store.active_pattern() == Some(id);
        if was_active {
            store.unload();
        }
        store.repo_mut().delete_pattern(id)?;
        self.refresh(store)?;
        if was_active {
            if let Some(next) = self.patterns.first().map(|p| p.id.clone()) {
                store.load_pattern(&next)?;
            }
        }
        Ok(true)
    }

    pub fn rename<R: PatternRepository, C: Clock>(
        &mut self,
        store: &mut GraphStore<R, C>,
        id: &str,
        name: &str,
    ) -> Result<bool, StoreError> {
        let name = name.trim();
        if name.is_empty() || self.get(id).is_none() {
            return Ok(false);
        }
        let renamed = store.repo_mut().rename_pattern(id, name)?;
        self.refresh(store)?;
        Ok(renamed)
    }

    /// Switches the store to `id`. Unknown ids are ignored.
    pub fn select<R: PatternRepository, C: Clock>(
        &mut self,
        store: &mut GraphStore<R, C>,
        id: &str,
    ) -> Result<bool, StoreError> {
        if self.get(id).is_none() {
            return Ok(false);
        }
        if store.active_pattern() != Some(id) {
            store.load_pattern(id)?;
        }
        Ok(true)
    }
}
