//! ディスク上のアップロードファイル

use crate::error::{CheckerError, Result};
use metric_checker_common::validator::{FileHandle, UploadFile};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// パスで指定されたJSONファイル
///
/// サイズはメタデータから取得し、内容は検証・送信のたびに読み込む。
#[derive(Debug, Clone)]
pub struct LocalFile {
    path: PathBuf,
    name: String,
    size: u64,
}

impl LocalFile {
    pub fn open(path: &Path) -> Result<Self> {
        let metadata = std::fs::metadata(path)
            .map_err(|_| CheckerError::FileNotFound(path.display().to_string()))?;
        if !metadata.is_file() {
            return Err(CheckerError::FileNotFound(path.display().to_string()));
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        Ok(Self {
            path: path.to_path_buf(),
            name,
            size: metadata.len(),
        })
    }

    pub fn handle(path: &Path) -> Result<FileHandle> {
        Ok(Arc::new(Self::open(path)?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl UploadFile for LocalFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn read(&self) -> io::Result<Vec<u8>> {
        std::fs::read(&self.path)
    }
}
