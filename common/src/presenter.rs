//! 結果表示
//!
//! ビュー選択・集計値・詳細レポート文字列と、状態から画面への射影 `project`。
//! 描画そのものはフロントエンド（CLIは標準出力）が行う。

use crate::chart::{comprehensive_spec, single_type_spec, ChartSpec, GENERAL_SERIES};
use crate::state::{AppError, AppPhase, AppState, ResultSet};
use crate::types::{ExactEqualityResult, ListMatchResult, MetricResult, Mismatch};
use serde_json::Value;
use std::fmt::{self, Write};

pub const COMPREHENSIVE_VIEW: &str = "Comprehensive";

/// 詳細レポートの表示上限
pub const MAX_REPORTED_MISMATCHES: usize = 5;
pub const MAX_REPORTED_FIELDS: usize = 3;
pub const MAX_REPORTED_DETAILS: usize = 5;

/// ローディング中に表示する手順
pub const LOADING_STEPS: [&str; 4] = [
    "Files validated",
    "Running comparisons",
    "Calculating metrics",
    "Generating report",
];

/// 表示中のビュー
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ViewSelection {
    #[default]
    General,
    Type(String),
    Comprehensive,
}

impl ViewSelection {
    /// "General" / "Comprehensive"（大文字小文字は問わない）以外はタイプ名として扱う
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        if text.eq_ignore_ascii_case(GENERAL_SERIES) {
            ViewSelection::General
        } else if text.eq_ignore_ascii_case(COMPREHENSIVE_VIEW) {
            ViewSelection::Comprehensive
        } else {
            ViewSelection::Type(text.to_string())
        }
    }

    /// 結果に存在するビューか（タイプ名は完全一致）
    pub fn is_available(&self, set: &ResultSet) -> bool {
        match self {
            ViewSelection::General => true,
            ViewSelection::Type(name) => set.by_type.contains(name),
            ViewSelection::Comprehensive => !set.by_type.is_empty(),
        }
    }

    pub fn type_name(&self) -> Option<&str> {
        match self {
            ViewSelection::Type(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for ViewSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewSelection::General => f.write_str(GENERAL_SERIES),
            ViewSelection::Type(name) => f.write_str(name),
            ViewSelection::Comprehensive => f.write_str(COMPREHENSIVE_VIEW),
        }
    }
}

/// ビュー切り替えの選択肢
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    pub label: String,
    pub selection: ViewSelection,
    /// タイプ別の文書数
    pub documents: Option<u64>,
}

impl Selector {
    /// 一覧表示用（"Article (12 docs)"）
    pub fn display(&self) -> String {
        match self.documents {
            Some(count) => format!("{} ({} docs)", self.label, count),
            None => self.label.clone(),
        }
    }
}

/// General → 各タイプ → Comprehensive（タイプがある場合のみ）
///
/// バックエンドが "General" キーを返した場合は General の選択肢にまとめ、文書数だけ引き継ぐ。
pub fn selectors(set: &ResultSet) -> Vec<Selector> {
    let mut list = vec![Selector {
        label: GENERAL_SERIES.to_string(),
        selection: ViewSelection::General,
        documents: set.by_type.get(GENERAL_SERIES).map(|t| t.total_documents),
    }];

    list.extend(
        set.by_type
            .iter()
            .filter(|(name, _)| *name != GENERAL_SERIES)
            .map(|(name, result)| Selector {
                label: name.to_string(),
                selection: ViewSelection::Type(name.to_string()),
                documents: Some(result.total_documents),
            }),
    );

    if !set.by_type.is_empty() {
        list.push(Selector {
            label: COMPREHENSIVE_VIEW.to_string(),
            selection: ViewSelection::Comprehensive,
            documents: None,
        });
    }
    list
}

/// 選択に対応する表示内容
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CurrentView<'a> {
    Results(&'a [MetricResult]),
    Comprehensive,
}

/// 未知のタイプは空リストになる
pub fn resolve<'a>(set: &'a ResultSet, selection: &ViewSelection) -> CurrentView<'a> {
    match selection {
        ViewSelection::General => CurrentView::Results(&set.general),
        ViewSelection::Type(name) => CurrentView::Results(
            set.by_type
                .get(name)
                .map(|t| t.detailed_results.as_slice())
                .unwrap_or(&[]),
        ),
        ViewSelection::Comprehensive => CurrentView::Comprehensive,
    }
}

/// 集計値
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryStats {
    pub total_metrics: usize,
    /// 完全一致の平均 accuracy（0.0〜1.0）
    pub avg_exact_accuracy: f64,
    /// リスト一致の平均 average_percentage（0.0〜1.0）
    pub avg_list_match: f64,
    pub total_documents: Option<u64>,
}

impl SummaryStats {
    pub fn compute(results: &[MetricResult], total_documents: Option<u64>) -> Self {
        let exact: Vec<f64> = results
            .iter()
            .filter_map(|r| match r {
                MetricResult::ExactEquality(e) => Some(e.accuracy),
                _ => None,
            })
            .collect();
        let list: Vec<f64> = results
            .iter()
            .filter_map(|r| match r {
                MetricResult::ListPercentageMatch(l) => Some(l.average_percentage),
                _ => None,
            })
            .collect();

        Self {
            total_metrics: results.len(),
            avg_exact_accuracy: mean(&exact),
            avg_list_match: mean(&list),
            total_documents,
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// 0.0〜1.0 を "80.0%" 形式に
pub fn format_percentage(value: f64) -> String {
    format!("{:.1}%", value * 100.0)
}

fn more_line(out: &mut String, indent: &str, total: usize, shown: usize) {
    if total > shown {
        let _ = writeln!(out, "{}... and {} more", indent, total - shown);
    }
}

fn write_exact(out: &mut String, result: &ExactEqualityResult) {
    let _ = writeln!(out, "  Total Items: {}", result.total_items);
    let _ = writeln!(out, "  Exact Matches: {}", result.exact_matches);
    let _ = writeln!(out, "  Mismatches: {}", result.mismatches.len());

    for mismatch in result.mismatches.iter().take(MAX_REPORTED_MISMATCHES) {
        write_mismatch(out, mismatch);
    }
    more_line(out, "    ", result.mismatches.len(), MAX_REPORTED_MISMATCHES);
}

fn write_mismatch(out: &mut String, mismatch: &Mismatch) {
    let _ = writeln!(out, "    ID: {}", mismatch.id);
    let fields = mismatch.field_diffs();
    for diff in fields.iter().take(MAX_REPORTED_FIELDS) {
        let _ = writeln!(
            out,
            "      {}: Predicted: {} | Real: {}",
            diff.field,
            json_text(&diff.predicted),
            json_text(&diff.real)
        );
    }
    more_line(out, "      ", fields.len(), MAX_REPORTED_FIELDS);
}

fn write_list(out: &mut String, result: &ListMatchResult) {
    let _ = writeln!(out, "  Total Items: {}", result.total_items);
    let _ = writeln!(out, "  Perfect Matches: {}", result.perfect_matches);
    let _ = writeln!(out, "  Average Match: {}", format_percentage(result.average_percentage));
    let _ = writeln!(out, "  Details: {}", result.details.len());

    for detail in result.details.iter().take(MAX_REPORTED_DETAILS) {
        let _ = writeln!(
            out,
            "    ID: {} ({})",
            detail.id,
            format_percentage(detail.match_percentage)
        );
        let _ = writeln!(out, "      Predicted: {}", detail.predicted_list.join(", "));
        let _ = writeln!(out, "      Real: {}", detail.real_list.join(", "));
        for (mark, items) in [
            ("Matching", &detail.matching_elements),
            ("Missing", &detail.missing_elements),
            ("Extra", &detail.extra_elements),
        ] {
            if !items.is_empty() {
                let _ = writeln!(out, "      {}: {}", mark, items.join(", "));
            }
        }
    }
    more_line(out, "    ", result.details.len(), MAX_REPORTED_DETAILS);
}

fn json_text(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| value.to_string())
}

/// 結果ごとの詳細レポート（未対応の種類は載せない）
pub fn render_report(results: &[MetricResult]) -> String {
    let mut out = String::new();
    for result in results {
        if result.kind().is_none() {
            continue;
        }
        let _ = writeln!(
            out,
            "{} [{}] {}",
            result.title(),
            result.display_field(),
            format_percentage(result.score())
        );
        match result {
            MetricResult::ExactEquality(r) => write_exact(&mut out, r),
            MetricResult::ListPercentageMatch(r) => write_list(&mut out, r),
            MetricResult::Other(_) => {}
        }
        out.push('\n');
    }
    out
}

/// 結果画面の内容
#[derive(Debug, Clone, PartialEq)]
pub struct ResultsView {
    pub selectors: Vec<Selector>,
    pub selection: ViewSelection,
    pub results: Vec<MetricResult>,
    /// 総合表示では None
    pub summary: Option<SummaryStats>,
    pub chart: Option<ChartSpec>,
    /// "No Results" 表示
    pub is_empty: bool,
}

/// 画面
#[derive(Debug, Clone, PartialEq)]
pub enum Screen {
    Upload {
        predicted: Option<String>,
        real: Option<String>,
        can_compare: bool,
        notice: Option<AppError>,
    },
    Loading {
        steps: Vec<&'static str>,
    },
    Results(ResultsView),
    Error {
        title: String,
        details: Option<String>,
    },
}

fn results_view(set: &ResultSet, selection: &ViewSelection) -> ResultsView {
    let selectors = selectors(set);
    match resolve(set, selection) {
        CurrentView::Comprehensive => {
            let chart = comprehensive_spec(&set.general, &set.by_type);
            ResultsView {
                selectors,
                selection: selection.clone(),
                results: Vec::new(),
                summary: None,
                is_empty: chart.is_none(),
                chart,
            }
        }
        CurrentView::Results(results) => {
            let type_name = selection.type_name();
            let documents = type_name
                .or_else(|| (selection == &ViewSelection::General).then_some(GENERAL_SERIES))
                .and_then(|name| set.by_type.get(name))
                .map(|t| t.total_documents);
            ResultsView {
                selectors,
                selection: selection.clone(),
                results: results.to_vec(),
                summary: Some(SummaryStats::compute(results, documents)),
                chart: single_type_spec(results, type_name.unwrap_or(GENERAL_SERIES)),
                is_empty: results.is_empty(),
            }
        }
    }
}

/// 状態を画面に射影する（副作用なし）
pub fn project(state: &AppState, selection: &ViewSelection) -> Screen {
    match state.phase() {
        AppPhase::Upload { notice } => {
            let files = state.files();
            Screen::Upload {
                predicted: files.predicted.as_ref().map(|f| f.name().to_string()),
                real: files.real.as_ref().map(|f| f.name().to_string()),
                can_compare: files.is_complete(),
                notice: notice.clone(),
            }
        }
        AppPhase::Loading => Screen::Loading {
            steps: LOADING_STEPS.to_vec(),
        },
        AppPhase::Results(set) => Screen::Results(results_view(set, selection)),
        AppPhase::Error(error) => Screen::Error {
            title: error.message.clone(),
            details: error.details.clone(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ComparisonOutcome;
    use crate::mock::{mock_response, mock_results};
    use crate::state::{transition, Event, SubmitError};
    use crate::types::{ListDetail, MismatchDiff, TypeResults, TypeSpecificResult};
    use crate::validator::MemoryFile;
    use serde_json::json;

    fn exact(field: &str, accuracy: f64) -> MetricResult {
        MetricResult::ExactEquality(ExactEqualityResult {
            field_name: Some(field.into()),
            total_items: 10,
            exact_matches: (accuracy * 10.0) as u64,
            accuracy,
            mismatches: Vec::new(),
        })
    }

    fn typed(name: &str, docs: u64, results: Vec<MetricResult>) -> (String, TypeSpecificResult) {
        (
            name.to_string(),
            TypeSpecificResult {
                type_name: name.to_string(),
                total_documents: docs,
                detailed_results: results,
                summary: Value::Null,
            },
        )
    }

    fn result_set() -> ResultSet {
        ResultSet {
            general: vec![exact("title", 0.8)],
            by_type: TypeResults::from_iter([
                typed("Article", 12, vec![exact("title", 0.5)]),
                typed("Thesis", 3, Vec::new()),
            ]),
        }
    }

    fn results_state(outcome: ComparisonOutcome) -> AppState {
        let state = [
            Event::SelectPredicted(MemoryFile::handle("p.json", "{}")),
            Event::SelectReal(MemoryFile::handle("r.json", "{}")),
        ]
        .into_iter()
        .fold(AppState::new(), |s, e| transition(&s, e).expect("遷移失敗"));
        let pair = state.files().validate().expect("検証失敗");
        let state = transition(&state, Event::Submit(pair)).expect("遷移失敗");
        transition(&state, Event::Completed(outcome)).expect("遷移失敗")
    }

    #[test]
    fn test_view_selection_parse() {
        assert_eq!(ViewSelection::parse("General"), ViewSelection::General);
        assert_eq!(ViewSelection::parse("Comprehensive"), ViewSelection::Comprehensive);
        assert_eq!(ViewSelection::parse("Article"), ViewSelection::Type("Article".into()));
        assert_eq!(ViewSelection::Type("News".into()).to_string(), "News");
    }

    #[test]
    fn test_view_selection_parse_ignores_case() {
        assert_eq!(ViewSelection::parse("general"), ViewSelection::General);
        assert_eq!(ViewSelection::parse(" COMPREHENSIVE "), ViewSelection::Comprehensive);
        assert_eq!(ViewSelection::parse("article"), ViewSelection::Type("article".into()));
    }

    #[test]
    fn test_view_selection_is_available() {
        let set = result_set();
        assert!(ViewSelection::General.is_available(&set));
        assert!(ViewSelection::Comprehensive.is_available(&set));
        assert!(ViewSelection::Type("Article".into()).is_available(&set));
        assert!(!ViewSelection::Type("article".into()).is_available(&set));

        let general_only = ResultSet {
            general: mock_results(),
            by_type: TypeResults::new(),
        };
        assert!(!ViewSelection::Comprehensive.is_available(&general_only));
    }

    #[test]
    fn test_selectors_order() {
        let list = selectors(&result_set());
        let labels: Vec<_> = list.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["General", "Article", "Thesis", "Comprehensive"]);
        assert_eq!(list[1].documents, Some(12));
        assert_eq!(list[1].display(), "Article (12 docs)");
    }

    #[test]
    fn test_selectors_without_types() {
        let set = ResultSet {
            general: mock_results(),
            by_type: TypeResults::new(),
        };
        let list = selectors(&set);
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].selection, ViewSelection::General);
    }

    #[test]
    fn test_selectors_merge_backend_general_key() {
        let body = r#"{
            "detailed_results": [
                {"metric_type": "exact_equality", "field_name": "title", "accuracy": 0.8}
            ],
            "type_specific_results": {
                "General": {"type": "General", "total_documents": 5, "detailed_results": [
                    {"metric_type": "exact_equality", "field_name": "title", "accuracy": 0.8}
                ]},
                "Tesis": {"type": "Tesis", "total_documents": 2, "detailed_results": []}
            }
        }"#;
        let response = crate::api::normalize_backend_body(200, body).expect("正規化失敗");
        let set = ResultSet {
            general: response.results,
            by_type: response.type_specific_results.unwrap_or_default(),
        };

        let list = selectors(&set);
        let shown: Vec<String> = list.iter().map(Selector::display).collect();
        assert_eq!(shown, vec!["General (5 docs)", "Tesis (2 docs)", "Comprehensive"]);
        assert_eq!(list.iter().filter(|s| s.selection == ViewSelection::General).count(), 1);

        let chart = comprehensive_spec(&set.general, &set.by_type).expect("チャートなし");
        let series: Vec<&str> = chart.data.datasets.iter().map(|d| d.label.as_str()).collect();
        assert_eq!(series, vec!["General", "Tesis"]);
    }

    #[test]
    fn test_resolve_unknown_type_is_empty() {
        let set = result_set();
        assert_eq!(resolve(&set, &ViewSelection::General), CurrentView::Results(&set.general[..]));
        assert_eq!(resolve(&set, &ViewSelection::Type("Missing".into())), CurrentView::Results(&[]));
        assert_eq!(resolve(&set, &ViewSelection::Comprehensive), CurrentView::Comprehensive);
    }

    #[test]
    fn test_summary_stats_means() {
        let stats = SummaryStats::compute(&mock_results(), None);
        assert_eq!(stats.total_metrics, 3);
        assert!((stats.avg_exact_accuracy - 0.7).abs() < 1e-9);
        assert!((stats.avg_list_match - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_summary_stats_empty_subsets_default_to_zero() {
        let stats = SummaryStats::compute(&[exact("title", 0.9)], Some(4));
        assert_eq!(stats.avg_list_match, 0.0);
        assert_eq!(stats.total_documents, Some(4));

        let empty = SummaryStats::compute(&[], None);
        assert_eq!(empty.total_metrics, 0);
        assert_eq!(empty.avg_exact_accuracy, 0.0);
    }

    #[test]
    fn test_format_percentage() {
        assert_eq!(format_percentage(0.8), "80.0%");
        assert_eq!(format_percentage(0.0), "0.0%");
        assert_eq!(format_percentage(0.756), "75.6%");
    }

    #[test]
    fn test_render_report_mock() {
        let report = render_report(&mock_results());
        assert!(report.contains("Exact Equality Comparison [All Fields] 60.0%"));
        assert!(report.contains("ID: item2"));
        assert!(report.contains(r#"title: Predicted: "Machine Learning Analysis" | Real: "Deep Learning Analysis""#));
        assert!(report.contains("Average Match: 75.0%"));
        assert!(report.contains("Missing: Deep Learning"));
        assert!(!report.contains("more"));
    }

    #[test]
    fn test_render_report_skips_unknown_kinds() {
        let other: MetricResult =
            serde_json::from_value(json!({"metric_type": "f1_score", "field_name": "title", "f1_score": 0.9}))
                .expect("デシリアライズ失敗");
        let report = render_report(&[exact("title", 0.8), other.clone()]);
        assert!(report.contains("Exact Equality Comparison [title] 80.0%"));
        assert!(!report.contains("f1_score"));

        let stats = SummaryStats::compute(&[exact("title", 0.8), other], None);
        assert_eq!(stats.total_metrics, 2);
        assert!((stats.avg_exact_accuracy - 0.8).abs() < 1e-9);
        assert_eq!(stats.avg_list_match, 0.0);
    }

    #[test]
    fn test_render_report_truncates() {
        let mismatches = (0..7)
            .map(|i| Mismatch {
                id: format!("doc{}", i),
                diff: MismatchDiff::Fields {
                    mismatched_fields: (0..4)
                        .map(|f| crate::types::FieldDiff {
                            field: format!("f{}", f),
                            predicted: json!(1),
                            real: json!(2),
                        })
                        .collect(),
                },
            })
            .collect();
        let details = (0..6)
            .map(|i| ListDetail {
                id: format!("doc{}", i),
                ..Default::default()
            })
            .collect();
        let results = vec![
            MetricResult::ExactEquality(ExactEqualityResult {
                mismatches,
                ..Default::default()
            }),
            MetricResult::ListPercentageMatch(ListMatchResult {
                field_name: Some("keywords".into()),
                details,
                ..Default::default()
            }),
        ];

        let report = render_report(&results);
        assert!(report.contains("ID: doc4"));
        assert!(!report.contains("ID: doc5\n      f0"));
        assert!(report.contains("... and 2 more"));
        assert!(report.contains("... and 1 more"));
        assert!(!report.contains("f3:"));
    }

    #[test]
    fn test_project_upload_and_loading() {
        let state = transition(
            &AppState::new(),
            Event::SelectPredicted(MemoryFile::handle("p.json", "{}")),
        )
        .expect("遷移失敗");
        match project(&state, &ViewSelection::General) {
            Screen::Upload { predicted, real, can_compare, notice } => {
                assert_eq!(predicted.as_deref(), Some("p.json"));
                assert!(real.is_none());
                assert!(!can_compare);
                assert!(notice.is_none());
            }
            other => panic!("Uploadのはず: {:?}", other),
        }

        let state = transition(&state, Event::Rejected(SubmitError::MissingFiles)).expect("遷移失敗");
        assert!(matches!(
            project(&state, &ViewSelection::General),
            Screen::Upload { notice: Some(_), .. }
        ));
    }

    #[test]
    fn test_project_results_general() {
        let state = results_state(ComparisonOutcome::mock(mock_response()));
        let Screen::Results(view) = project(&state, &ViewSelection::General) else {
            panic!("Resultsのはず");
        };
        assert_eq!(view.results.len(), 3);
        assert!(!view.is_empty);
        assert!(view.summary.is_some());
        let chart = view.chart.expect("チャートなし");
        assert_eq!(chart.data.labels.len(), 3);
        assert_eq!(chart.options.title, "Metadata Accuracy Overview - General");
    }

    #[test]
    fn test_project_empty_results() {
        let outcome = ComparisonOutcome::backend(crate::types::ComparisonResponse::success(Vec::new(), None));
        let state = results_state(outcome);
        let Screen::Results(view) = project(&state, &ViewSelection::General) else {
            panic!("Resultsのはず");
        };
        assert!(view.is_empty);
        assert!(view.chart.is_none());
    }

    #[test]
    fn test_project_comprehensive_has_no_summary() {
        let response = crate::types::ComparisonResponse::success(
            result_set().general,
            Some(result_set().by_type),
        );
        let state = results_state(ComparisonOutcome::backend(response));
        let Screen::Results(view) = project(&state, &ViewSelection::Comprehensive) else {
            panic!("Resultsのはず");
        };
        assert!(view.summary.is_none());
        let chart = view.chart.expect("チャートなし");
        assert_eq!(chart.data.value("title (Exact)", "Article"), Some(50.0));

        let Screen::Results(view) = project(&state, &ViewSelection::Type("Article".into())) else {
            panic!("Resultsのはず");
        };
        assert_eq!(view.summary.and_then(|s| s.total_documents), Some(12));
    }

    #[test]
    fn test_project_error() {
        let outcome = ComparisonOutcome::failed(&crate::api::ClientError::Semantic("bad".into()));
        let state = results_state(outcome);
        assert_eq!(
            project(&state, &ViewSelection::General),
            Screen::Error {
                title: "Comparison failed".into(),
                details: Some("bad".into())
            }
        );
    }
}
