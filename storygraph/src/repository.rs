//! Persistence collaborator interface and an in-memory implementation.

use crate::error::StoreError;
use crate::model::{Pattern, PatternData, PatternId};

/// Durable pattern storage. Implementations own retries and user-facing
/// failure reporting; the editor only propagates errors.
pub trait PatternRepository {
    /// Patterns of a project, oldest first.
    fn list_patterns(&self, project_id: &str) -> Result<Vec<Pattern>, StoreError>;
    fn create_pattern(
        &mut self,
        project_id: &str,
        name: &str,
        data: PatternData,
        created_at: f64,
    ) -> Result<Pattern, StoreError>;
    /// `Ok(None)` when the pattern does not exist.
    fn load_pattern(&self, id: &str) -> Result<Option<PatternData>, StoreError>;
    fn save_pattern(&mut self, id: &str, data: &PatternData) -> Result<(), StoreError>;
    fn rename_pattern(&mut self, id: &str, name: &str) -> Result<bool, StoreError>;
    /// Deletes the pattern and any rows scoped to it.
    fn delete_pattern(&mut self, id: &str) -> Result<bool, StoreError>;
}

/// Map-backed repository for tests and hosts without durable storage.
#[derive(Clone, Debug, Default)]
pub struct InMemoryRepository {
    patterns: Vec<Pattern>,
    next_id: u64,
    writes: usize,
    fail_writes: bool,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        InMemoryRepository::default()
    }

    /// Number of successful `save_pattern` calls.
    pub fn writes(&self) -> usize {
        self.writes
    }

    /// Makes every following save fail, to exercise error propagation.
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    pub fn get(&self, id: &str) -> Option<&Pattern> {
        self.patterns.iter().find(|p| p.id == id)
    }

    /// Inserts a pattern verbatim, e.g. data imported from an older build.
    pub fn insert(&mut self, pattern: Pattern) {
        self.patterns.retain(|p| p.id != pattern.id);
        self.patterns.push(pattern);
    }
}

impl PatternRepository for InMemoryRepository {
    fn list_patterns(&self, project_id: &str) -> Result<Vec<Pattern>, StoreError> {
        let mut out: Vec<Pattern> = self.patterns.iter().filter(|p| p.project_id == project_id).cloned().collect();
        out.sort_by(|a, b| a.created_at.total_cmp(&b.created_at));
        Ok(out)
    }

    fn create_pattern(
        &mut self,
        project_id: &str,
        name: &str,
        data: PatternData,
        created_at: f64,
    ) -> Result<Pattern, StoreError> {
        self.next_id += 1;
        let id: PatternId = format!("pattern-{}", self.next_id);
        let p = Pattern {
            id,
            project_id: project_id.to_string(),
            name: name.to_string(),
            nodes_data: data.nodes_data,
            edges_data: data.edges_data,
            created_at,
        };
        self.patterns.push(p.clone());
        Ok(p)
    }

    fn load_pattern(&self, id: &str) -> Result<Option<PatternData>, StoreError> {
        Ok(self.get(id).map(|p| PatternData {
            nodes_data: p.nodes_data.clone(),
            edges_data: p.edges_data.clone(),
        }))
    }

    fn save_pattern(&mut self, id: &str, data: &PatternData) -> Result<(), StoreError> {
        if self.fail_writes {
            return Err(StoreError::Persistence(format!("write to {} rejected", id)));
        }
        let Some(p) = self.patterns.iter_mut().find(|p| p.id == id) else {
            return Err(StoreError::Persistence(format!("pattern {} does not exist", id)));
        };
        p.nodes_data = data.nodes_data.clone();
        p.edges_data = data.edges_data.clone();
        self.writes += 1;
        Ok(())
    }

    fn rename_pattern(&mut self, id: &str, name: &str) -> Result<bool, StoreError> {
        match self.patterns.iter_mut().find(|p| p.id == id) {
            Some(p) => {
                p.name = name.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn delete_pattern(&mut self, id: &str) -> Result<bool, StoreError> {
        let before = self.patterns.len();
        self.patterns.retain(|p| p.id != id);
        Ok(self.patterns.len() != before)
    }
}
