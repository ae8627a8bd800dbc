use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("translation error: {0}")]
    Translation(String),
}

impl ServiceError {
    pub fn not_found(path: &std::path::Path) -> Self { Self::NotFound(format!("{} does not exist", path.display())) }
}
