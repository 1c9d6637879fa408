use metric_checker_common::state::TransitionError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CheckerError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("HTTPクライアントエラー: {0}")]
    Http(#[from] reqwest::Error),

    #[error("状態遷移エラー: {0}")]
    Transition(#[from] TransitionError),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("入力エラー: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error("{0}")]
    Common(#[from] metric_checker_common::Error),
}

pub type Result<T> = std::result::Result<T, CheckerError>;
