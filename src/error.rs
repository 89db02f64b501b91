#[derive(Debug, thiserror::Error)]
pub enum BhavcopyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Malformed report row at line {line}: expected at least 8 columns, found {columns}")]
    MalformedRow { line: u64, columns: usize },

    #[error("Corrupt cache entry '{key}': {source}")]
    CorruptEntry {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Backend error: {0}")]
    Backend(String),
}

pub type Result<T> = std::result::Result<T, BhavcopyError>;
