pub mod chart;
pub mod excel;

use crate::error::Result;
use metric_checker_common::chart::chart_file_stem;
use metric_checker_common::presenter::ViewSelection;
use metric_checker_common::state::ResultSet;
use std::path::{Path, PathBuf};

/// Excelレポートの既定ファイル名
pub const REPORT_STEM: &str = "metric-report";

/// ディレクトリ（または拡張子なし）ならその中に `{stem}.{extension}` を作る
pub fn output_path_for_format(output: &Path, stem: &str, extension: &str) -> PathBuf {
    if output.is_dir() || output.extension().is_none() {
        output.join(format!("{}.{}", stem, extension))
    } else {
        output.to_path_buf()
    }
}

/// 選択中ビューのファイル名（拡張子なし）
pub fn chart_stem(selection: &ViewSelection) -> String {
    match selection {
        ViewSelection::Comprehensive => chart_file_stem(None),
        other => chart_file_stem(Some(other.to_string().as_str())),
    }
}

/// チャート仕様JSONを書き出す（表示データがなければ None）
pub fn export_chart(set: &ResultSet, selection: &ViewSelection, output: &Path) -> Result<Option<PathBuf>> {
    let path = output_path_for_format(output, &chart_stem(selection), "json");
    let written = chart::write_chart_spec(set, selection, &path)?;
    Ok(written.then_some(path))
}

/// Excelレポートを書き出す
pub fn export_excel(set: &ResultSet, output: &Path) -> Result<PathBuf> {
    let path = output_path_for_format(output, REPORT_STEM, "xlsx");
    excel::generate_excel(&set.general, &set.by_type, &path)?;
    Ok(path)
}
