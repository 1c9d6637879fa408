//! 比較APIの契約と応答の正規化
//!
//! 通信そのものは各フロントエンド（CLIはreqwest）が担当し、
//! ここではエンドポイント定義・応答の正規化・失敗分類だけを扱う。

use crate::error::FailureKind;
use crate::types::{BackendPayload, ComparisonResponse};
use crate::validator::has_json_extension;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub const METRICS_PATH: &str = "/api/metrics";
pub const HEALTH_PATH: &str = "/health";
pub const STATUS_PATH: &str = "/status";

/// multipartのパート名
pub const PREDICTED_PART: &str = "predicted_file";
pub const ORIGINAL_PART: &str = "original_file";

/// リクエストタイムアウト（秒）
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// バックエンド未接続時のモック待機（ミリ秒）
pub const MOCK_DELAY_MS: u64 = 2000;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// ベースURLとパスを結合
pub fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}

/// 比較クライアントの失敗
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// 接続失敗・タイムアウト・非2xx
    #[error("{0}")]
    Transport(String),

    /// 2xxだがバックエンドが失敗を報告した、または契約外の応答
    #[error("{0}")]
    Semantic(String),

    /// 送信前提を満たさない
    #[error("{0}")]
    InvalidUpload(String),
}

impl ClientError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ClientError::Transport(_) => FailureKind::TransportFailure,
            ClientError::Semantic(_) => FailureKind::SemanticFailure,
            ClientError::InvalidUpload(_) => FailureKind::InvalidUpload,
        }
    }

    /// モックへのフォールバック対象か
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Transport(_))
    }
}

/// 送信前のファイル名チェック
pub fn check_upload_names(predicted: &str, real: &str) -> Result<(), ClientError> {
    if predicted.is_empty() || real.is_empty() {
        return Err(ClientError::InvalidUpload(
            "Both predicted and real files are required".into(),
        ));
    }
    if !has_json_extension(predicted) || !has_json_extension(real) {
        return Err(ClientError::InvalidUpload("Both files must be JSON files".into()));
    }
    Ok(())
}

/// バックエンド応答を正規化する
///
/// 2xx以外はTransport、2xxで `error` がある・JSONでない・形式が違う場合はSemantic。
pub fn normalize_backend_body(status: u16, body: &str) -> Result<ComparisonResponse, ClientError> {
    let parsed: Option<Value> = serde_json::from_str(body).ok();

    if !(200..300).contains(&status) {
        let reported = parsed.as_ref().and_then(reported_error);
        return Err(ClientError::Transport(match reported {
            Some(message) => format!("HTTP error! status: {}: {}", status, message),
            None => format!("HTTP error! status: {}", status),
        }));
    }

    let value = parsed.ok_or_else(|| {
        ClientError::Semantic("Backend returned a response that is not JSON".into())
    })?;

    if let Some(message) = reported_error(&value) {
        return Err(ClientError::Semantic(message));
    }

    let payload: BackendPayload = serde_json::from_value(value)
        .map_err(|e| ClientError::Semantic(format!("Unexpected metrics payload: {}", e)))?;

    Ok(ComparisonResponse::success(
        payload.detailed_results,
        Some(payload.type_specific_results.unwrap_or_default()),
    ))
}

/// 応答中の `error` フィールドを取り出す（null は無視）
fn reported_error(value: &Value) -> Option<String> {
    match value.get("error")? {
        Value::Null => None,
        Value::String(message) if message.is_empty() => Some("Comparison failed".into()),
        Value::String(message) => Some(message.clone()),
        other => Some(other.to_string()),
    }
}

/// 結果の出所
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    Backend,
    Mock,
}

impl Provenance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provenance::Backend => "backend",
            Provenance::Mock => "mock",
        }
    }
}

/// 比較クライアントの戻り値（失敗しても必ず応答を持つ）
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonOutcome {
    pub response: ComparisonResponse,
    pub provenance: Provenance,
    pub failure: Option<FailureKind>,
}

impl ComparisonOutcome {
    pub fn backend(response: ComparisonResponse) -> Self {
        Self {
            response,
            provenance: Provenance::Backend,
            failure: None,
        }
    }

    pub fn mock(response: ComparisonResponse) -> Self {
        Self {
            response,
            provenance: Provenance::Mock,
            failure: None,
        }
    }

    pub fn failed(error: &ClientError) -> Self {
        Self {
            response: ComparisonResponse::failure(error.to_string()),
            provenance: Provenance::Backend,
            failure: Some(error.kind()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.response.success
    }
}

/// `GET /health`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub timestamp: String,
}

/// `GET /status`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiStatus {
    pub status: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub supported_formats: Vec<String>,
    #[serde(default)]
    pub max_file_size: u64,
}
