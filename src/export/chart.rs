//! チャート仕様JSONの出力
//!
//! 描画側（Chart.js互換）がそのまま読める `{data, options}` を書き出す。

use crate::error::Result;
use metric_checker_common::chart::{comprehensive_spec, single_type_spec, ChartSpec};
use metric_checker_common::presenter::{resolve, CurrentView, ViewSelection};
use metric_checker_common::state::ResultSet;
use std::path::Path;

/// ビューに対応するチャート仕様
pub fn chart_spec(set: &ResultSet, selection: &ViewSelection) -> Option<ChartSpec> {
    match resolve(set, selection) {
        CurrentView::Comprehensive => comprehensive_spec(&set.general, &set.by_type),
        CurrentView::Results(results) => single_type_spec(results, &selection.to_string()),
    }
}

/// 書き出した場合 true（データなしは何もしない）
pub fn write_chart_spec(set: &ResultSet, selection: &ViewSelection, path: &Path) -> Result<bool> {
    let Some(spec) = chart_spec(set, selection) else {
        return Ok(false);
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(&spec)?;
    std::fs::write(path, json)?;
    Ok(true)
}
