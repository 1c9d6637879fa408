//! エラー型定義

use thiserror::Error;

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    #[error("Export error: {0}")]
    Export(String),
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;

/// 利用者に見せる失敗の分類
///
/// 空の結果はここに含まれない（正常な「結果なし」表示として扱う）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    MissingFiles,
    SizeExceeded,
    MalformedJson,
    ReadError,
    /// 通信失敗・非2xx応答
    TransportFailure,
    /// 2xx応答だがバックエンドが失敗を報告、または応答形式不正
    SemanticFailure,
    /// 送信前提（拡張子など）を満たさない
    InvalidUpload,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::MissingFiles => "missing_files",
            FailureKind::SizeExceeded => "size_exceeded",
            FailureKind::MalformedJson => "malformed_json",
            FailureKind::ReadError => "read_error",
            FailureKind::TransportFailure => "transport_failure",
            FailureKind::SemanticFailure => "semantic_failure",
            FailureKind::InvalidUpload => "invalid_upload",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
