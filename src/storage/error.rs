//! Store error taxonomy / 存储错误类型

use std::time::Duration;
use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Empty key supplied / 键为空
    #[error("invalid key")]
    InvalidKey,

    /// Remote object or bucket absent / 对象不存在
    #[error("not found: {0}")]
    NotFound(String),

    #[error("error connecting to store: {0}")]
    Connection(String),

    #[error("store is not connected")]
    NotConnected,

    /// Network, auth or remote status failures / 网络或远端错误
    #[error("transport error: {0}")]
    Transport(String),

    #[error("codec error: {0}")]
    Codec(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("init error: {0}")]
    Config(String),

    #[error("deadline exceeded after {0:?}")]
    DeadlineExceeded(Duration),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}
