//! アップロードファイルの検証
//!
//! 送信前にサイズとJSON構文をチェックする。内容の読み込みより先にサイズを見る。

use serde::de::IgnoredAny;
use std::fmt;
use std::io;
use std::sync::Arc;
use thiserror::Error;

/// 1ファイルあたりの上限（10 MiB）
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// 受け付ける拡張子
pub const ACCEPTED_EXTENSION: &str = ".json";

/// プラットフォーム境界のファイル
///
/// ディスク上のファイル、ブラウザのFile、メモリ上のバイト列などを同じ扱いにする。
pub trait UploadFile: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    /// メタデータ上のサイズ（読み込み前に判定に使う）
    fn size(&self) -> u64;

    fn read(&self) -> io::Result<Vec<u8>>;
}

/// 共有ファイルハンドル
pub type FileHandle = Arc<dyn UploadFile>;

/// メモリ上のファイル
#[derive(Debug, Clone)]
pub struct MemoryFile {
    name: String,
    bytes: Vec<u8>,
}

impl MemoryFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    pub fn handle(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> FileHandle {
        Arc::new(Self::new(name, bytes))
    }
}

impl UploadFile for MemoryFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    fn read(&self) -> io::Result<Vec<u8>> {
        Ok(self.bytes.clone())
    }
}

/// 検証エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("File is {size} bytes; each file must be smaller than {limit} bytes")]
    SizeExceeded { size: u64, limit: u64 },

    #[error("Invalid JSON format: {message}")]
    MalformedJson { message: String },

    #[error("Failed to read file: {message}")]
    ReadError { message: String },
}

/// ファイルを検証する
///
/// 同じファイルに対して何度呼んでも同じ判定になる。
pub fn validate(file: &dyn UploadFile) -> Result<(), ValidationError> {
    let size = file.size();
    if size > MAX_FILE_SIZE {
        return Err(ValidationError::SizeExceeded {
            size,
            limit: MAX_FILE_SIZE,
        });
    }

    let bytes = file.read().map_err(|e| ValidationError::ReadError {
        message: e.to_string(),
    })?;

    serde_json::from_slice::<IgnoredAny>(&bytes)
        .map(|_| ())
        .map_err(|e| ValidationError::MalformedJson {
            message: e.to_string(),
        })
}

/// ファイル名が `.json` で終わるか
pub fn has_json_extension(name: &str) -> bool {
    name.ends_with(ACCEPTED_EXTENSION)
}
