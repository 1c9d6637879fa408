//! チャート用データ集計
//!
//! メトリクス結果を棒グラフ描画用のラベル×系列行列に変換する。
//! - 単一タイプ: 結果1件 = ラベル1つ、系列は "Accuracy %" のみ
//! - 総合: 全般結果と全タイプの結果のラベル和集合 × 系列（General + タイプ名）
//!
//! 描画側には Chart.js 互換の `{labels, datasets}` 形で渡す。

use crate::types::{MetricResult, TypeResults};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

pub const SINGLE_SERIES_LABEL: &str = "Accuracy %";
pub const GENERAL_SERIES: &str = "General";
pub const DEFAULT_SINGLE_TITLE: &str = "Metadata Accuracy Overview";
pub const COMPREHENSIVE_TITLE: &str = "Comprehensive Metadata Accuracy Comparison";

const TOOLTIP_FORMAT: &str = "{label}: {value:.1}%";

const BACKGROUND_OPACITY: f64 = 0.8;
const BORDER_OPACITY: f64 = 1.0;

/// 系列の配色（位置で決まる。12系列を超えたら先頭に戻る）
pub const PALETTE: [(u8, u8, u8); 12] = [
    (52, 152, 219),
    (231, 76, 60),
    (46, 204, 113),
    (155, 89, 182),
    (241, 196, 15),
    (230, 126, 34),
    (26, 188, 156),
    (243, 156, 18),
    (142, 68, 173),
    (39, 174, 96),
    (192, 57, 43),
    (41, 128, 185),
];

fn rgba((r, g, b): (u8, u8, u8), opacity: f64) -> String {
    format!("rgba({}, {}, {}, {})", r, g, b, opacity)
}

/// 系列位置から色を決める
pub fn series_color(index: usize, opacity: f64) -> String {
    rgba(PALETTE[index % PALETTE.len()], opacity)
}

/// 系列位置のRGB値（xlsx出力用）
pub fn series_rgb(index: usize) -> u32 {
    let (r, g, b) = PALETTE[index % PALETTE.len()];
    ((r as u32) << 16) | ((g as u32) << 8) | b as u32
}

/// スコア帯の色（0.8以上 / 0.6以上 / 0.4以上 / それ未満）
pub fn score_color(score: f64, opacity: f64) -> String {
    let rgb = if score >= 0.8 {
        (39, 174, 96)
    } else if score >= 0.6 {
        (243, 156, 18)
    } else if score >= 0.4 {
        (230, 126, 34)
    } else {
        (231, 76, 60)
    };
    rgba(rgb, opacity)
}

/// 単色または棒ごとの色
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Paint {
    Uniform(String),
    PerBar(Vec<String>),
}

/// 1系列
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub label: String,
    pub data: Vec<f64>,
    pub background_color: Paint,
    pub border_color: Paint,
    pub border_width: u32,
}

/// 描画面に渡すデータ
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

impl ChartData {
    pub fn dataset(&self, label: &str) -> Option<&Dataset> {
        self.datasets.iter().find(|d| d.label == label)
    }

    /// (ラベル, 系列) の値
    pub fn value(&self, label: &str, series: &str) -> Option<f64> {
        let index = self.labels.iter().position(|l| l == label)?;
        self.dataset(series).and_then(|d| d.data.get(index).copied())
    }
}

/// 軸・凡例・ツールチップの設定
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartOptions {
    pub title: String,
    pub legend_position: String,
    pub y_min: f64,
    pub y_max: f64,
    pub y_axis_title: String,
    pub x_min_rotation: u32,
    pub x_max_rotation: u32,
    /// `{label}` と `{value}` を置換するツールチップ書式
    pub tooltip_format: String,
}

impl ChartOptions {
    pub fn accuracy(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            legend_position: "top".into(),
            y_min: 0.0,
            y_max: 100.0,
            y_axis_title: "Accuracy Percentage".into(),
            x_min_rotation: 0,
            x_max_rotation: 45,
            tooltip_format: TOOLTIP_FORMAT.into(),
        }
    }

    /// 書式に系列名と値（小数1桁）を埋め込む
    pub fn tooltip_text(&self, label: &str, value: f64) -> String {
        self.tooltip_format
            .replace("{label}", label)
            .replace("{value:.1}", &format!("{:.1}", value))
    }
}

/// データ＋設定
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub data: ChartData,
    pub options: ChartOptions,
}

/// 単一タイプ表示のラベル（metric_type はそのまま）
pub fn single_label(result: &MetricResult) -> String {
    format!("{} ({})", result.display_field(), result.metric_type())
}

/// 総合表示のラベル（Exact / List Match）
pub fn comprehensive_label(result: &MetricResult) -> String {
    format!("{} ({})", result.display_field(), result.short_label())
}

/// スコアをパーセントに
pub fn percentage(result: &MetricResult) -> f64 {
    result.score() * 100.0
}

/// 単一タイプのチャート（結果がなければ None）
pub fn single_type_chart(results: &[MetricResult]) -> Option<ChartData> {
    if results.is_empty() {
        return None;
    }

    let labels = results.iter().map(single_label).collect();
    let data = results.iter().map(percentage).collect();
    let background = results
        .iter()
        .map(|r| score_color(r.score(), BACKGROUND_OPACITY))
        .collect();
    let border = results
        .iter()
        .map(|r| score_color(r.score(), BORDER_OPACITY))
        .collect();

    Some(ChartData {
        labels,
        datasets: vec![Dataset {
            label: SINGLE_SERIES_LABEL.to_string(),
            data,
            background_color: Paint::PerBar(background),
            border_color: Paint::PerBar(border),
            border_width: 1,
        }],
    })
}

/// 単一タイプのチャート仕様（タイトルは "{title} - {type}"）
pub fn single_type_spec(results: &[MetricResult], type_name: &str) -> Option<ChartSpec> {
    single_type_chart(results).map(|data| ChartSpec {
        data,
        options: ChartOptions::accuracy(format!("{} - {}", DEFAULT_SINGLE_TITLE, type_name)),
    })
}

/// 総合表示の密行列
#[derive(Debug, Clone, PartialEq)]
pub struct ComprehensiveMatrix {
    pub labels: Vec<String>,
    pub series: Vec<String>,
    /// `values[系列][ラベル]`
    pub values: Vec<Vec<f64>>,
}

/// 総合表示の系列順: General を先頭に、タイプ名を出現順で重複なく
pub fn series_order(types: &TypeResults) -> Vec<String> {
    let mut seen = HashSet::new();
    std::iter::once(GENERAL_SERIES)
        .chain(types.names())
        .filter(|name| seen.insert(*name))
        .map(str::to_string)
        .collect()
}

/// 総合表示の行列を2パスで作る
///
/// 1パス目でラベルと系列の順序を確定し、2パス目で0埋めの行列に値を書く。
/// 同じセルへの書き込みは後勝ち。
pub fn comprehensive_matrix(general: &[MetricResult], types: &TypeResults) -> ComprehensiveMatrix {
    let mut contributions: Vec<(&str, &MetricResult)> =
        general.iter().map(|r| (GENERAL_SERIES, r)).collect();
    for (name, type_result) in types.iter() {
        contributions.extend(type_result.detailed_results.iter().map(|r| (name, r)));
    }

    // パス1: ラベル（初出順）と系列
    let mut labels: Vec<String> = Vec::new();
    let mut label_index: HashMap<String, usize> = HashMap::new();
    for (_, result) in &contributions {
        let label = comprehensive_label(result);
        if !label_index.contains_key(&label) {
            label_index.insert(label.clone(), labels.len());
            labels.push(label);
        }
    }
    let series = series_order(types);
    let series_index: HashMap<&str, usize> = series
        .iter()
        .enumerate()
        .map(|(i, name)| (name.as_str(), i))
        .collect();

    // パス2: 0埋めの密行列に書き込む
    let mut values = vec![vec![0.0; labels.len()]; series.len()];
    for (series_name, result) in &contributions {
        let (Some(&s), Some(&l)) = (
            series_index.get(series_name),
            label_index.get(&comprehensive_label(result)),
        ) else {
            continue;
        };
        values[s][l] = percentage(result);
    }

    ComprehensiveMatrix {
        labels,
        series,
        values,
    }
}

/// 総合チャート（全般・タイプ別とも空なら None）
pub fn comprehensive_chart(general: &[MetricResult], types: &TypeResults) -> Option<ChartData> {
    if general.is_empty() && types.is_empty() {
        return None;
    }

    let matrix = comprehensive_matrix(general, types);
    let datasets = matrix
        .series
        .into_iter()
        .zip(matrix.values)
        .enumerate()
        .map(|(index, (label, data))| Dataset {
            label,
            data,
            background_color: Paint::Uniform(series_color(index, BACKGROUND_OPACITY)),
            border_color: Paint::Uniform(series_color(index, BORDER_OPACITY)),
            border_width: 1,
        })
        .collect();

    Some(ChartData {
        labels: matrix.labels,
        datasets,
    })
}

pub fn comprehensive_spec(general: &[MetricResult], types: &TypeResults) -> Option<ChartSpec> {
    comprehensive_chart(general, types).map(|data| ChartSpec {
        data,
        options: ChartOptions::accuracy(COMPREHENSIVE_TITLE),
    })
}

/// 出力ファイル名（拡張子なし）
pub fn chart_file_stem(type_name: Option<&str>) -> String {
    match type_name {
        Some(name) => {
            let slug = name
                .to_lowercase()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join("-");
            format!("metadata-chart-{}", slug)
        }
        None => "comprehensive-metadata-chart".to_string(),
    }
}
