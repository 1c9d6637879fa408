//! 比較APIクライアント
//!
//! 2ファイルを multipart で `POST /api/metrics` に送り、応答を正規化する。
//! 送信ポリシーに応じて通信失敗時にモック結果へ切り替える。

use crate::cli::SubmissionPolicy;
use crate::error::Result;
use metric_checker_common::api::{
    check_upload_names, endpoint, normalize_backend_body, ApiStatus, ClientError, ComparisonOutcome,
    HealthStatus, HEALTH_PATH, METRICS_PATH, MOCK_DELAY_MS, ORIGINAL_PART, PREDICTED_PART,
    REQUEST_TIMEOUT_SECS, STATUS_PATH,
};
use metric_checker_common::mock::mock_response;
use metric_checker_common::types::ComparisonResponse;
use metric_checker_common::validator::UploadFile;
use reqwest::multipart::{Form, Part};
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct ComparisonClient {
    http: reqwest::Client,
    base_url: String,
    policy: SubmissionPolicy,
    mock_delay: Duration,
}

impl ComparisonClient {
    pub fn new(base_url: impl Into<String>, policy: SubmissionPolicy) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into(),
            policy,
            mock_delay: Duration::from_millis(MOCK_DELAY_MS),
        })
    }

    /// モック結果を返すまでの待機時間を変更（テスト用）
    pub fn with_mock_delay(mut self, delay: Duration) -> Self {
        self.mock_delay = delay;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn policy(&self) -> SubmissionPolicy {
        self.policy
    }

    /// 2ファイルを比較する（失敗も応答として返す）
    pub async fn compare(&self, predicted: &dyn UploadFile, real: &dyn UploadFile) -> ComparisonOutcome {
        if self.policy == SubmissionPolicy::Mock {
            info!(policy = %self.policy, "skipping backend, using mock results");
            return self.mock_outcome().await;
        }

        match self.submit(predicted, real).await {
            Ok(response) => {
                info!(results = response.results.len(), "backend comparison completed");
                ComparisonOutcome::backend(response)
            }
            Err(err) if err.is_transport() && self.policy == SubmissionPolicy::Fallback => {
                warn!(error = %err, "backend unreachable, falling back to mock results");
                self.mock_outcome().await
            }
            Err(err) => {
                warn!(error = %err, kind = %err.kind(), "comparison failed");
                ComparisonOutcome::failed(&err)
            }
        }
    }

    async fn mock_outcome(&self) -> ComparisonOutcome {
        tokio::time::sleep(self.mock_delay).await;
        ComparisonOutcome::mock(mock_response())
    }

    async fn submit(
        &self,
        predicted: &dyn UploadFile,
        real: &dyn UploadFile,
    ) -> std::result::Result<ComparisonResponse, ClientError> {
        check_upload_names(predicted.name(), real.name())?;

        let form = Form::new()
            .part(PREDICTED_PART, json_part(predicted)?)
            .part(ORIGINAL_PART, json_part(real)?);

        let url = endpoint(&self.base_url, METRICS_PATH);
        debug!(%url, predicted = predicted.name(), real = real.name(), "posting comparison request");

        let response = self
            .http
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        debug!(status, bytes = body.len(), "received comparison response");

        normalize_backend_body(status, &body)
    }

    /// `GET /health`
    pub async fn health(&self) -> Result<HealthStatus> {
        let url = endpoint(&self.base_url, HEALTH_PATH);
        debug!(%url, "checking backend health");
        let status = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json::<HealthStatus>()
            .await?;
        Ok(status)
    }

    /// `GET /status`
    pub async fn status(&self) -> Result<ApiStatus> {
        let url = endpoint(&self.base_url, STATUS_PATH);
        debug!(%url, "fetching backend status");
        let status = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json::<ApiStatus>()
            .await?;
        Ok(status)
    }
}

/// ファイル名を保ったJSONパート
fn json_part(file: &dyn UploadFile) -> std::result::Result<Part, ClientError> {
    let bytes = file
        .read()
        .map_err(|e| ClientError::InvalidUpload(format!("Failed to read {}: {}", file.name(), e)))?;

    Part::bytes(bytes)
        .file_name(file.name().to_string())
        .mime_str("application/json")
        .map_err(|e| ClientError::InvalidUpload(e.to_string()))
}
