use std::io;
use std::path::PathBuf;

use thiserror::Error;
use tracing::subscriber::SetGlobalDefaultError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("terminal I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("failed to read config {}: {source}", .path.display())]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config {}: {source}", .path.display())]
    ParseConfig {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("cannot open log file {}: {source}", .path.display())]
    OpenLog {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot install log subscriber: {0}")]
    Logging(#[from] SetGlobalDefaultError),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("unknown shape `{0}`")]
    UnknownShape(String),
}
