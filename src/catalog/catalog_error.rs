use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("could not load catalog for {key}: {message}")]
    Connection { key: String, message: String },
    #[error("catalog load for {key} timed out after {millis}ms")]
    Timeout { key: String, millis: u128 },
    #[error("migration {file} in {directory} failed: {message}")]
    Migration { directory: String, file: String, message: String },
    #[error("catalog snapshot {path}: {message}")]
    Snapshot { path: String, message: String },
}
