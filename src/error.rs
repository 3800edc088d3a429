use thiserror::Error;

#[derive(Error, Debug)]
pub enum AstroSortError {
    #[error(transparent)]
    Common(#[from] astro_sort_common::Error),

    #[error("設定エラー: {0}")]
    Config(String),

    #[error("フォルダが見つかりません: {0}")]
    FolderNotFound(String),

    #[error("フレームが見つかりません: {0}")]
    NoFramesFound(String),

    #[error("対話入力エラー: {0}")]
    Prompt(String),

    #[error("フォルダ走査エラー: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),
}

impl From<dialoguer::Error> for AstroSortError {
    fn from(e: dialoguer::Error) -> Self {
        AstroSortError::Prompt(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AstroSortError>;
