//! Excel生成（CLI版）
//!
//! 共通ライブラリの excel_core でブックを作り、ファイルに保存する。

use crate::error::Result;
use metric_checker_common::export::excel_core::generate_report_buffer;
use metric_checker_common::types::{MetricResult, TypeResults};
use std::path::Path;

pub fn generate_excel(general: &[MetricResult], types: &TypeResults, output_path: &Path) -> Result<()> {
    let buffer = generate_report_buffer(general, types)?;

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(output_path, buffer)?;
    Ok(())
}
