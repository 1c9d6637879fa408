//! Excel生成（共通ライブラリ）
//!
//! 比較結果をブック形式で出力する。
//! - Summary: ビューごとの集計
//! - Chart: 総合行列とネイティブ縦棒グラフ
//! - Details: 不一致・リスト詳細の一覧

use crate::chart::{comprehensive_matrix, series_rgb, COMPREHENSIVE_TITLE};
use crate::error::{Error, Result};
use crate::presenter::{SummaryStats, ViewSelection};
use crate::types::{MetricResult, TypeResults};
use rust_xlsxwriter::*;
use serde_json::Value;

pub const SUMMARY_SHEET: &str = "Summary";
pub const CHART_SHEET: &str = "Chart";
pub const DETAILS_SHEET: &str = "Details";

const DETAIL_HEADERS: [&str; 9] = [
    "View", "Metric", "Field", "Score %", "Record ID", "Item", "Predicted", "Real", "Match %",
];

type SheetResult = std::result::Result<(), String>;

struct Formats {
    title: Format,
    header: Format,
    percent: Format,
}

impl Formats {
    fn new() -> Self {
        Self {
            title: Format::new().set_bold().set_font_size(14.0),
            header: Format::new()
                .set_bold()
                .set_font_color(Color::RGB(0x555555))
                .set_background_color(Color::RGB(0xF5F5F5))
                .set_border(FormatBorder::Hair)
                .set_border_color(Color::RGB(0xAAAAAA)),
            percent: Format::new().set_num_format("0.0"),
        }
    }
}

type View<'a> = (ViewSelection, &'a [MetricResult], Option<u64>);

/// 全般 → タイプ順のビュー一覧
fn views<'a>(general: &'a [MetricResult], types: &'a TypeResults) -> Vec<View<'a>> {
    let mut list = vec![(ViewSelection::General, general, None)];
    list.extend(types.iter().map(|(name, t)| {
        (
            ViewSelection::Type(name.to_string()),
            t.detailed_results.as_slice(),
            Some(t.total_documents),
        )
    }));
    list
}

fn write_headers(worksheet: &mut Worksheet, row: u32, headers: &[&str], format: &Format) -> SheetResult {
    for (col, header) in headers.iter().enumerate() {
        worksheet
            .write_string_with_format(row, col as u16, *header, format)
            .map_err(|e| format!("ヘッダー書き込みエラー: {}", e))?;
    }
    Ok(())
}

fn write_summary_sheet(
    workbook: &mut Workbook,
    general: &[MetricResult],
    types: &TypeResults,
    formats: &Formats,
) -> SheetResult {
    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name(SUMMARY_SHEET)
        .map_err(|e| format!("シート名設定エラー: {}", e))?;
    worksheet
        .write_string_with_format(0, 0, "Metric Comparison Results", &formats.title)
        .map_err(|e| format!("タイトル書き込みエラー: {}", e))?;

    write_headers(
        worksheet,
        2,
        &["View", "Documents", "Total Metrics", "Avg. Exact Accuracy %", "Avg. List Match %"],
        &formats.header,
    )?;

    for (offset, (view, results, documents)) in views(general, types).into_iter().enumerate() {
        let row = 3 + offset as u32;
        let stats = SummaryStats::compute(results, documents);
        worksheet
            .write_string(row, 0, view.to_string())
            .map_err(|e| format!("集計書き込みエラー: {}", e))?;
        if let Some(count) = stats.total_documents {
            worksheet
                .write_number(row, 1, count as f64)
                .map_err(|e| format!("集計書き込みエラー: {}", e))?;
        }
        worksheet
            .write_number(row, 2, stats.total_metrics as f64)
            .map_err(|e| format!("集計書き込みエラー: {}", e))?;
        worksheet
            .write_number_with_format(row, 3, stats.avg_exact_accuracy * 100.0, &formats.percent)
            .map_err(|e| format!("集計書き込みエラー: {}", e))?;
        worksheet
            .write_number_with_format(row, 4, stats.avg_list_match * 100.0, &formats.percent)
            .map_err(|e| format!("集計書き込みエラー: {}", e))?;
    }

    worksheet
        .set_column_width(0, 24)
        .map_err(|e| format!("列幅設定エラー: {}", e))?;
    for col in 1..=4 {
        worksheet
            .set_column_width(col, 20)
            .map_err(|e| format!("列幅設定エラー: {}", e))?;
    }
    Ok(())
}

fn write_chart_sheet(
    workbook: &mut Workbook,
    general: &[MetricResult],
    types: &TypeResults,
    formats: &Formats,
) -> SheetResult {
    let matrix = comprehensive_matrix(general, types);
    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name(CHART_SHEET)
        .map_err(|e| format!("シート名設定エラー: {}", e))?;

    // 行列: A列がラベル、B列以降が系列
    worksheet
        .write_string_with_format(0, 0, "Metric", &formats.header)
        .map_err(|e| format!("行列書き込みエラー: {}", e))?;
    for (s, name) in matrix.series.iter().enumerate() {
        worksheet
            .write_string_with_format(0, s as u16 + 1, name, &formats.header)
            .map_err(|e| format!("行列書き込みエラー: {}", e))?;
    }
    for (l, label) in matrix.labels.iter().enumerate() {
        let row = l as u32 + 1;
        worksheet
            .write_string(row, 0, label)
            .map_err(|e| format!("行列書き込みエラー: {}", e))?;
        for (s, values) in matrix.values.iter().enumerate() {
            worksheet
                .write_number_with_format(row, s as u16 + 1, values[l], &formats.percent)
                .map_err(|e| format!("行列書き込みエラー: {}", e))?;
        }
    }
    worksheet
        .set_column_width(0, 32)
        .map_err(|e| format!("列幅設定エラー: {}", e))?;

    if matrix.labels.is_empty() {
        return Ok(());
    }

    let last_row = matrix.labels.len() as u32;
    let mut chart = Chart::new(ChartType::Column);
    for (s, _) in matrix.series.iter().enumerate() {
        let col = s as u16 + 1;
        chart
            .add_series()
            .set_categories((CHART_SHEET, 1, 0, last_row, 0))
            .set_values((CHART_SHEET, 1, col, last_row, col))
            .set_name((CHART_SHEET, 0, col))
            .set_format(ChartSolidFill::new().set_color(Color::RGB(series_rgb(s))));
    }
    chart.title().set_name(COMPREHENSIVE_TITLE);
    chart.y_axis().set_name("Accuracy Percentage").set_min(0.0).set_max(100.0);
    chart.legend().set_position(ChartLegendPosition::Top);

    worksheet
        .insert_chart(1, matrix.series.len() as u16 + 2, &chart)
        .map_err(|e| format!("グラフ挿入エラー: {}", e))?;
    Ok(())
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn write_details_sheet(
    workbook: &mut Workbook,
    general: &[MetricResult],
    types: &TypeResults,
    formats: &Formats,
) -> SheetResult {
    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name(DETAILS_SHEET)
        .map_err(|e| format!("シート名設定エラー: {}", e))?;
    write_headers(worksheet, 0, &DETAIL_HEADERS, &formats.header)?;

    let mut row: u32 = 1;
    for (view, results, _) in views(general, types) {
        let view_name = view.to_string();
        for result in results {
            let write_prefix = |worksheet: &mut Worksheet, row: u32| -> SheetResult {
                worksheet
                    .write_string(row, 0, view_name.as_str())
                    .and_then(|ws| ws.write_string(row, 1, result.metric_type()))
                    .and_then(|ws| ws.write_string(row, 2, result.display_field()))
                    .and_then(|ws| ws.write_number_with_format(row, 3, result.score() * 100.0, &formats.percent))
                    .map(|_| ())
                    .map_err(|e| format!("詳細書き込みエラー: {}", e))
            };

            match result {
                MetricResult::ExactEquality(r) if !r.mismatches.is_empty() => {
                    for mismatch in &r.mismatches {
                        for diff in mismatch.field_diffs() {
                            write_prefix(worksheet, row)?;
                            worksheet
                                .write_string(row, 4, mismatch.id.as_str())
                                .and_then(|ws| ws.write_string(row, 5, diff.field.as_str()))
                                .and_then(|ws| ws.write_string(row, 6, value_text(&diff.predicted)))
                                .and_then(|ws| ws.write_string(row, 7, value_text(&diff.real)))
                                .map_err(|e| format!("詳細書き込みエラー: {}", e))?;
                            row += 1;
                        }
                    }
                }
                MetricResult::ListPercentageMatch(r) if !r.details.is_empty() => {
                    for detail in &r.details {
                        write_prefix(worksheet, row)?;
                        worksheet
                            .write_string(row, 4, detail.id.as_str())
                            .and_then(|ws| ws.write_string(row, 5, r.field_name.as_deref().unwrap_or("")))
                            .and_then(|ws| ws.write_string(row, 6, detail.predicted_list.join(", ")))
                            .and_then(|ws| ws.write_string(row, 7, detail.real_list.join(", ")))
                            .and_then(|ws| {
                                ws.write_number_with_format(row, 8, detail.match_percentage * 100.0, &formats.percent)
                            })
                            .map_err(|e| format!("詳細書き込みエラー: {}", e))?;
                        row += 1;
                    }
                }
                _ => {
                    write_prefix(worksheet, row)?;
                    row += 1;
                }
            }
        }
    }

    for col in 0..DETAIL_HEADERS.len() as u16 {
        worksheet
            .set_column_width(col, 18)
            .map_err(|e| format!("列幅設定エラー: {}", e))?;
    }
    Ok(())
}

/// 比較結果のブックをバッファに生成
///
/// # Arguments
/// * `general` - 全般の結果
/// * `types` - タイプ別の結果（空でもよい）
pub fn generate_report_buffer(general: &[MetricResult], types: &TypeResults) -> Result<Vec<u8>> {
    let formats = Formats::new();
    let mut workbook = Workbook::new();

    write_summary_sheet(&mut workbook, general, types, &formats).map_err(Error::Export)?;
    write_chart_sheet(&mut workbook, general, types, &formats).map_err(Error::Export)?;
    write_details_sheet(&mut workbook, general, types, &formats).map_err(Error::Export)?;

    // バッファに書き出し
    workbook
        .save_to_buffer()
        .map_err(|e| Error::Export(format!("Excel保存エラー: {}", e)))
}
