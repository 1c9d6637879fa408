//! モック比較結果
//!
//! バックエンドに接続できないときに返す固定データ。実応答と同じ形を持つ。

use crate::types::{
    ComparisonResponse, ExactEqualityResult, FieldDiff, ListDetail, ListMatchResult, MetricResult,
    Mismatch, MismatchDiff,
};
use serde_json::json;

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// 固定のモック結果（3件）
pub fn mock_results() -> Vec<MetricResult> {
    vec![
        MetricResult::ExactEquality(ExactEqualityResult {
            field_name: None,
            total_items: 10,
            exact_matches: 6,
            accuracy: 0.6,
            mismatches: vec![Mismatch {
                id: "item1".into(),
                diff: MismatchDiff::Fields {
                    mismatched_fields: vec![FieldDiff {
                        field: "title".into(),
                        predicted: json!("Predicted Title"),
                        real: json!("Real Title"),
                    }],
                },
            }],
        }),
        MetricResult::ExactEquality(ExactEqualityResult {
            field_name: Some("title".into()),
            total_items: 10,
            exact_matches: 8,
            accuracy: 0.8,
            mismatches: vec![Mismatch {
                id: "item2".into(),
                diff: MismatchDiff::Field {
                    field: "title".into(),
                    predicted: json!("Machine Learning Analysis"),
                    real: json!("Deep Learning Analysis"),
                },
            }],
        }),
        MetricResult::ListPercentageMatch(ListMatchResult {
            field_name: Some("keywords".into()),
            total_items: 10,
            perfect_matches: 4,
            average_percentage: 0.75,
            details: vec![ListDetail {
                id: "item1".into(),
                predicted_list: strings(&["AI", "Machine Learning", "Neural Networks"]),
                real_list: strings(&["AI", "Deep Learning", "Neural Networks"]),
                match_percentage: 0.75,
                matching_elements: strings(&["AI", "Neural Networks"]),
                missing_elements: strings(&["Deep Learning"]),
                extra_elements: strings(&["Machine Learning"]),
            }],
        }),
    ]
}

/// モック応答（タイプ別結果なし）
pub fn mock_response() -> ComparisonResponse {
    ComparisonResponse::success(mock_results(), None)
}
