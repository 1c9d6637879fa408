//! 比較結果の型定義
//!
//! 比較APIが返すメトリクス結果と、CLI/各フロントエンドで共有される型:
//! - MetricResult: 1つのメトリクス（完全一致 / リスト一致率）の結果
//! - TypeSpecificResult: 文書タイプ別の結果バンドル
//! - TypeResults: タイプ名 → 結果の順序付きマップ
//! - ComparisonResponse / BackendPayload: 正規化後 / 正規化前の応答

use serde::de::{self, MapAccess, Visitor};
use serde::ser::{self, SerializeMap};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

/// フィールド名なし（文書全体）の表示名
pub const ALL_FIELDS_LABEL: &str = "All Fields";

/// `null` を既定値として読む
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// メトリクスの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    ExactEquality,
    ListPercentageMatch,
}

impl MetricKind {
    /// ワイヤ上の `metric_type` 文字列
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::ExactEquality => "exact_equality",
            MetricKind::ListPercentageMatch => "list_percentage_match",
        }
    }

    /// 総合チャートのラベルで使う短縮名
    pub fn short_label(&self) -> &'static str {
        match self {
            MetricKind::ExactEquality => "Exact",
            MetricKind::ListPercentageMatch => "List Match",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            MetricKind::ExactEquality => "Exact Equality Comparison",
            MetricKind::ListPercentageMatch => "List Percentage Match",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// メトリクス結果（`metric_type` で判別）
///
/// 未対応の種類（`f1_score` など）は `Other` として受け取り、応答全体は失敗にしない。
#[derive(Debug, Clone, PartialEq)]
pub enum MetricResult {
    ExactEquality(ExactEqualityResult),
    ListPercentageMatch(ListMatchResult),
    Other(OtherMetricResult),
}

const METRIC_TYPE_KEY: &str = "metric_type";

impl<'de> Deserialize<'de> for MetricResult {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let metric_type = value
            .get(METRIC_TYPE_KEY)
            .and_then(Value::as_str)
            .ok_or_else(|| <D::Error as de::Error>::missing_field(METRIC_TYPE_KEY))?
            .to_string();

        let result = match metric_type.as_str() {
            "exact_equality" => ExactEqualityResult::deserialize(value).map(MetricResult::ExactEquality),
            "list_percentage_match" => ListMatchResult::deserialize(value).map(MetricResult::ListPercentageMatch),
            _ => OtherMetricResult::deserialize(value).map(MetricResult::Other),
        };
        result.map_err(de::Error::custom)
    }
}

impl Serialize for MetricResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let value = match self {
            MetricResult::ExactEquality(r) => serde_json::to_value(r),
            MetricResult::ListPercentageMatch(r) => serde_json::to_value(r),
            MetricResult::Other(r) => serde_json::to_value(r),
        };
        let mut value = value.map_err(<S::Error as ser::Error>::custom)?;
        if let Value::Object(map) = &mut value {
            map.insert(METRIC_TYPE_KEY.to_string(), Value::String(self.metric_type().to_string()));
        }
        value.serialize(serializer)
    }
}

/// 完全一致メトリクス
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExactEqualityResult {
    #[serde(default)]
    pub field_name: Option<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub total_items: u64,

    #[serde(default, deserialize_with = "null_as_default")]
    pub exact_matches: u64,

    /// 0.0〜1.0
    #[serde(default, deserialize_with = "null_as_default")]
    pub accuracy: f64,

    #[serde(default, deserialize_with = "null_as_default")]
    pub mismatches: Vec<Mismatch>,
}

/// リスト一致率メトリクス
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListMatchResult {
    #[serde(default)]
    pub field_name: Option<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub total_items: u64,

    #[serde(default, deserialize_with = "null_as_default")]
    pub perfect_matches: u64,

    /// 0.0〜1.0
    #[serde(default, deserialize_with = "null_as_default")]
    pub average_percentage: f64,

    #[serde(default, deserialize_with = "null_as_default")]
    pub details: Vec<ListDetail>,
}

/// 未対応の種類のメトリクス（残りのフィールドはそのまま保持）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OtherMetricResult {
    pub metric_type: String,

    #[serde(default)]
    pub field_name: Option<String>,

    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl OtherMetricResult {
    fn number(&self, key: &str) -> Option<f64> {
        self.fields.get(key).and_then(Value::as_f64)
    }

    /// accuracy → average_percentage の順に探し、なければ0
    pub fn score(&self) -> f64 {
        self.number("accuracy")
            .filter(|v| *v != 0.0)
            .or_else(|| self.number("average_percentage"))
            .unwrap_or(0.0)
    }

    pub fn total_items(&self) -> u64 {
        self.fields.get("total_items").and_then(Value::as_u64).unwrap_or(0)
    }
}

/// 完全一致の不一致1件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mismatch {
    pub id: String,

    #[serde(flatten)]
    pub diff: MismatchDiff,
}

/// 不一致の中身: 単一フィールド、または複数フィールドの一覧
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MismatchDiff {
    Fields {
        mismatched_fields: Vec<FieldDiff>,
    },
    Field {
        field: String,
        #[serde(default)]
        predicted: Value,
        #[serde(default)]
        real: Value,
    },
}

/// フィールド単位の差分
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDiff {
    pub field: String,
    #[serde(default)]
    pub predicted: Value,
    #[serde(default)]
    pub real: Value,
}

/// リスト比較の詳細1件
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListDetail {
    pub id: String,
    pub predicted_list: Vec<String>,
    pub real_list: Vec<String>,
    pub match_percentage: f64,
    pub matching_elements: Vec<String>,
    pub missing_elements: Vec<String>,
    pub extra_elements: Vec<String>,
}

impl MetricResult {
    /// 既知の種類（未対応なら None）
    pub fn kind(&self) -> Option<MetricKind> {
        match self {
            MetricResult::ExactEquality(_) => Some(MetricKind::ExactEquality),
            MetricResult::ListPercentageMatch(_) => Some(MetricKind::ListPercentageMatch),
            MetricResult::Other(_) => None,
        }
    }

    /// ワイヤ上の `metric_type`
    pub fn metric_type(&self) -> &str {
        match self {
            MetricResult::ExactEquality(_) => MetricKind::ExactEquality.as_str(),
            MetricResult::ListPercentageMatch(_) => MetricKind::ListPercentageMatch.as_str(),
            MetricResult::Other(r) => &r.metric_type,
        }
    }

    /// 総合チャート用の短縮名（未対応の種類は `metric_type`）
    pub fn short_label(&self) -> &str {
        match self.kind() {
            Some(kind) => kind.short_label(),
            None => self.metric_type(),
        }
    }

    pub fn title(&self) -> &str {
        match self.kind() {
            Some(kind) => kind.title(),
            None => self.metric_type(),
        }
    }

    pub fn field_name(&self) -> Option<&str> {
        match self {
            MetricResult::ExactEquality(r) => r.field_name.as_deref(),
            MetricResult::ListPercentageMatch(r) => r.field_name.as_deref(),
            MetricResult::Other(r) => r.field_name.as_deref(),
        }
    }

    /// 表示用フィールド名（なしは "All Fields"）
    pub fn display_field(&self) -> &str {
        self.field_name().unwrap_or(ALL_FIELDS_LABEL)
    }

    pub fn total_items(&self) -> u64 {
        match self {
            MetricResult::ExactEquality(r) => r.total_items,
            MetricResult::ListPercentageMatch(r) => r.total_items,
            MetricResult::Other(r) => r.total_items(),
        }
    }

    /// 完全一致数 / 完全リスト一致数
    pub fn matches(&self) -> u64 {
        match self {
            MetricResult::ExactEquality(r) => r.exact_matches,
            MetricResult::ListPercentageMatch(r) => r.perfect_matches,
            MetricResult::Other(_) => 0,
        }
    }

    /// スコア（accuracy または average_percentage、0.0〜1.0）
    pub fn score(&self) -> f64 {
        match self {
            MetricResult::ExactEquality(r) => r.accuracy,
            MetricResult::ListPercentageMatch(r) => r.average_percentage,
            MetricResult::Other(r) => r.score(),
        }
    }
}

impl Mismatch {
    /// 不一致フィールドを一覧で取得
    pub fn field_diffs(&self) -> Vec<FieldDiff> {
        match &self.diff {
            MismatchDiff::Fields { mismatched_fields } => mismatched_fields.clone(),
            MismatchDiff::Field { field, predicted, real } => vec![FieldDiff {
                field: field.clone(),
                predicted: predicted.clone(),
                real: real.clone(),
            }],
        }
    }
}

/// 文書タイプ別の結果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeSpecificResult {
    #[serde(rename = "type", default)]
    pub type_name: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub total_documents: u64,

    #[serde(default, deserialize_with = "null_as_default")]
    pub detailed_results: Vec<MetricResult>,

    /// バックエンド側の集計（内容は解釈しない）
    #[serde(default)]
    pub summary: Value,
}

/// タイプ名 → 結果の順序付きマップ
///
/// JSONオブジェクトの出現順を保持する。重複キーは最初の位置に後勝ちの値を置く。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeResults(Vec<(String, TypeSpecificResult)>);

impl TypeResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, result: TypeSpecificResult) {
        let name = name.into();
        match self.0.iter_mut().find(|(key, _)| *key == name) {
            Some(entry) => entry.1 = result,
            None => self.0.push((name, result)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&TypeSpecificResult> {
        self.0.iter().find(|(key, _)| key == name).map(|(_, r)| r)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(key, _)| key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TypeSpecificResult)> {
        self.0.iter().map(|(key, r)| (key.as_str(), r))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, TypeSpecificResult)> for TypeResults {
    fn from_iter<I: IntoIterator<Item = (String, TypeSpecificResult)>>(iter: I) -> Self {
        let mut map = TypeResults::new();
        for (name, result) in iter {
            map.insert(name, result);
        }
        map
    }
}

impl Serialize for TypeResults {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, result) in &self.0 {
            map.serialize_entry(name, result)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for TypeResults {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TypeResultsVisitor;

        impl<'de> Visitor<'de> for TypeResultsVisitor {
            type Value = TypeResults;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of document type to type-specific results")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut map = TypeResults::new();
                while let Some((name, result)) = access.next_entry::<String, TypeSpecificResult>()? {
                    map.insert(name, result);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(TypeResultsVisitor)
    }
}

/// 正規化後の比較結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResponse {
    pub success: bool,

    #[serde(default)]
    pub results: Vec<MetricResult>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_specific_results: Option<TypeResults>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ComparisonResponse {
    pub fn success(results: Vec<MetricResult>, type_specific_results: Option<TypeResults>) -> Self {
        Self {
            success: true,
            results,
            type_specific_results,
            error: None,
        }
    }

    /// 失敗応答（results は常に空）
    pub fn failure(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            success: false,
            results: Vec::new(),
            type_specific_results: None,
            error: Some(if message.is_empty() {
                "Comparison failed".to_string()
            } else {
                message
            }),
        }
    }
}

/// バックエンドの生の応答
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackendPayload {
    #[serde(default, deserialize_with = "null_as_default")]
    pub detailed_results: Vec<MetricResult>,

    #[serde(default)]
    pub summary: Value,

    #[serde(default)]
    pub type_specific_results: Option<TypeResults>,

    #[serde(default)]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_result_deserialize_exact() {
        let json = r#"{
            "metric_type": "exact_equality",
            "field_name": "title",
            "total_items": 10,
            "exact_matches": 8,
            "accuracy": 0.8,
            "mismatches": [
                {"id": "item2", "field": "title", "predicted": "A", "real": "B"}
            ]
        }"#;

        let result: MetricResult = serde_json::from_str(json).expect("デシリアライズ失敗");
        assert_eq!(result.kind(), Some(MetricKind::ExactEquality));
        assert_eq!(result.field_name(), Some("title"));
        assert_eq!(result.total_items(), 10);
        assert_eq!(result.matches(), 8);
        assert!((result.score() - 0.8).abs() < 1e-9);

        let MetricResult::ExactEquality(exact) = result else {
            panic!("完全一致として読めていない");
        };
        assert_eq!(exact.mismatches.len(), 1);
        let diffs = exact.mismatches[0].field_diffs();
        assert_eq!(diffs[0].field, "title");
        assert_eq!(diffs[0].predicted, Value::String("A".into()));
    }

    #[test]
    fn test_metric_result_deserialize_mismatched_fields() {
        let json = r#"{
            "metric_type": "exact_equality",
            "field_name": null,
            "total_items": 2,
            "exact_matches": 1,
            "accuracy": 0.5,
            "mismatches": [
                {"id": "doc1", "mismatched_fields": [
                    {"field": "title", "predicted": "x", "real": "y"},
                    {"field": "year", "predicted": 2020, "real": null}
                ]}
            ]
        }"#;

        let result: MetricResult = serde_json::from_str(json).expect("デシリアライズ失敗");
        assert_eq!(result.display_field(), ALL_FIELDS_LABEL);
        let MetricResult::ExactEquality(exact) = result else {
            panic!("完全一致として読めていない");
        };
        match &exact.mismatches[0].diff {
            MismatchDiff::Fields { mismatched_fields } => {
                assert_eq!(mismatched_fields.len(), 2);
                assert_eq!(mismatched_fields[1].real, Value::Null);
            }
            other => panic!("複数フィールド差分のはず: {:?}", other),
        }
    }

    #[test]
    fn test_metric_result_deserialize_list_match() {
        let json = r#"{
            "metric_type": "list_percentage_match",
            "field_name": "keywords",
            "total_items": 10,
            "perfect_matches": 4,
            "average_percentage": 0.75,
            "details": [{
                "id": "item1",
                "predicted_list": ["AI"],
                "real_list": ["AI", "ML"],
                "match_percentage": 0.5,
                "matching_elements": ["AI"],
                "missing_elements": ["ML"],
                "extra_elements": []
            }]
        }"#;

        let result: MetricResult = serde_json::from_str(json).expect("デシリアライズ失敗");
        assert_eq!(result.kind(), Some(MetricKind::ListPercentageMatch));
        assert_eq!(result.matches(), 4);
        assert!((result.score() - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_metric_result_missing_score_defaults_to_zero() {
        let json = r#"{"metric_type": "exact_equality", "field_name": "doi", "accuracy": null}"#;
        let result: MetricResult = serde_json::from_str(json).expect("デシリアライズ失敗");
        assert_eq!(result.score(), 0.0);
        assert_eq!(result.total_items(), 0);

        let json = r#"{"metric_type": "list_percentage_match", "field_name": "subjects"}"#;
        let result: MetricResult = serde_json::from_str(json).expect("デシリアライズ失敗");
        assert_eq!(result.score(), 0.0);
    }

    #[test]
    fn test_metric_result_unknown_type_is_kept() {
        let json = r#"{"metric_type": "f1_score", "field_name": "title", "f1_score": 0.9, "total_items": 4}"#;
        let result: MetricResult = serde_json::from_str(json).expect("デシリアライズ失敗");

        assert_eq!(result.kind(), None);
        assert_eq!(result.metric_type(), "f1_score");
        assert_eq!(result.short_label(), "f1_score");
        assert_eq!(result.field_name(), Some("title"));
        assert_eq!(result.total_items(), 4);
        assert_eq!(result.score(), 0.0);

        let MetricResult::Other(other) = &result else {
            panic!("未対応の種類として読めていない");
        };
        assert_eq!(other.fields.get("f1_score"), Some(&serde_json::json!(0.9)));
    }

    #[test]
    fn test_metric_result_unknown_type_uses_accuracy_when_present() {
        let json = r#"{"metric_type": "fuzzy_match", "accuracy": 0.4}"#;
        let result: MetricResult = serde_json::from_str(json).expect("デシリアライズ失敗");
        assert!((result.score() - 0.4).abs() < 1e-9);

        let json = r#"{"metric_type": "fuzzy_match", "accuracy": 0, "average_percentage": 0.3}"#;
        let result: MetricResult = serde_json::from_str(json).expect("デシリアライズ失敗");
        assert!((result.score() - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_metric_result_without_type_is_rejected() {
        let json = r#"{"field_name": "title", "accuracy": 0.4}"#;
        assert!(serde_json::from_str::<MetricResult>(json).is_err());
    }

    #[test]
    fn test_metric_result_unknown_type_serialize_once() {
        let json = r#"{"metric_type": "f1_score", "f1_score": 0.9}"#;
        let result: MetricResult = serde_json::from_str(json).expect("デシリアライズ失敗");
        let out = serde_json::to_string(&result).expect("シリアライズ失敗");
        assert_eq!(out.matches("metric_type").count(), 1);
        assert!(out.contains("\"f1_score\":0.9"));
    }

    #[test]
    fn test_metric_result_serialize_keeps_tag() {
        let result = MetricResult::ExactEquality(ExactEqualityResult {
            field_name: Some("title".into()),
            accuracy: 0.5,
            ..Default::default()
        });
        let json = serde_json::to_string(&result).expect("シリアライズ失敗");
        assert!(json.contains("\"metric_type\":\"exact_equality\""));
        assert!(json.contains("\"field_name\":\"title\""));
    }

    #[test]
    fn test_type_results_preserve_document_order() {
        let json = r#"{
            "Thesis": {"type": "Thesis", "total_documents": 3, "detailed_results": []},
            "Article": {"type": "Article", "total_documents": 5, "detailed_results": []},
            "Book": {"type": "Book", "total_documents": 1, "detailed_results": []}
        }"#;

        let types: TypeResults = serde_json::from_str(json).expect("デシリアライズ失敗");
        let names: Vec<&str> = types.names().collect();
        assert_eq!(names, vec!["Thesis", "Article", "Book"]);
        assert_eq!(types.get("Article").map(|t| t.total_documents), Some(5));
    }

    #[test]
    fn test_type_results_duplicate_key_keeps_first_position() {
        let mut types = TypeResults::new();
        types.insert("A", TypeSpecificResult { total_documents: 1, ..Default::default() });
        types.insert("B", TypeSpecificResult::default());
        types.insert("A", TypeSpecificResult { total_documents: 7, ..Default::default() });

        assert_eq!(types.len(), 2);
        assert_eq!(types.names().collect::<Vec<_>>(), vec!["A", "B"]);
        assert_eq!(types.get("A").map(|t| t.total_documents), Some(7));
    }

    #[test]
    fn test_comparison_response_wire_names() {
        let mut types = TypeResults::new();
        types.insert("News", TypeSpecificResult::default());
        let response = ComparisonResponse::success(Vec::new(), Some(types));

        let json = serde_json::to_string(&response).expect("シリアライズ失敗");
        assert!(json.contains("\"typeSpecificResults\""));
        assert!(!json.contains("\"error\""));
    }

    #[test]
    fn test_comparison_response_failure_invariant() {
        let response = ComparisonResponse::failure("");
        assert!(!response.success);
        assert!(response.results.is_empty());
        assert_eq!(response.error.as_deref(), Some("Comparison failed"));
    }
}
