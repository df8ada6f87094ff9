use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MchatError {
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("server rejected request: {0}")]
    Server(String),

    #[error("no response from server; is the chat server running?")]
    NoResponse,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("chat request failed: {0}")]
    ChatFailed(String),

    #[error("input is not valid UTF-8: {path}")]
    NonUtf8Input { path: PathBuf },

    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, MchatError>;
