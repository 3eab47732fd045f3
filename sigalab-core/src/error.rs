/// Errors raised at the fallible edges of the tracker (storage, accounts, collaborator payloads).
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("input is missing the minimum required data")]
    MissingData,
    #[error("could not read data: {0}")]
    Parse(String),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("invalid username or password")]
    Authentication,
    #[error("already exists: {0}")]
    Conflict(String),
    #[error("not found: {0}")]
    NotFound(String),
}

pub type TrackerResult<T> = Result<T, TrackerError>;
