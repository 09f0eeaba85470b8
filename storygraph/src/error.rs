use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The persistence collaborator rejected a read or write.
    #[error("persistence failed: {0}")]
    Persistence(String),
    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("no pattern is loaded")]
    NotLoaded,
}

impl StoreError {
    /// Stable machine-readable code, used by the wasm result envelope.
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::Persistence(_) => "persistence",
            StoreError::Serialize(_) => "invalid_json",
            StoreError::NotLoaded => "not_loaded",
        }
    }
}
