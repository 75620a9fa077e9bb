use std::path::{Path, PathBuf};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ReportError>;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not read csv {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("could not encode or decode json for {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("schema error in {path}: {message}")]
    Schema { path: PathBuf, message: String },
    #[error("no usable data: {0}")]
    NoUsableData(String),
    #[error("no results file found: {0}")]
    NoResultFile(String),
    #[error("invalid verse range: {0}")]
    InvalidRange(String),
}

impl ReportError {
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn csv(path: impl AsRef<Path>, source: csv::Error) -> Self {
        Self::Csv {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn json(path: impl AsRef<Path>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn schema(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::Schema {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
        }
    }

    pub fn no_usable_data(message: impl Into<String>) -> Self {
        Self::NoUsableData(message.into())
    }
}
