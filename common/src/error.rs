//! エラー型定義

use thiserror::Error;

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    #[error("Unknown frame type: {0}")]
    UnknownFrameType(String),

    #[error("Missing token: {0}")]
    MissingToken(&'static str),

    #[error("Invalid timestamp '{token}': {source}")]
    InvalidTimestamp {
        token: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("Invalid exposure: {0}")]
    InvalidExposure(String),

    #[error("Unknown exposure unit: {0}")]
    UnknownExposureUnit(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;
