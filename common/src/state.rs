//! アプリケーション状態機械
//!
//! `upload → loading → results | error` の遷移を純粋関数 `transition` で表す。
//! 副作用（検証・API呼び出し）は呼び出し側が行い、その結果をイベントとして渡す。

use crate::api::ComparisonOutcome;
use crate::error::FailureKind;
use crate::types::{MetricResult, TypeResults};
use crate::validator::{validate, FileHandle, ValidationError};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// 予測ファイル / 正解ファイル
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileRole {
    Predicted,
    GroundTruth,
}

impl FileRole {
    pub fn label(&self) -> &'static str {
        match self {
            FileRole::Predicted => "predicted",
            FileRole::GroundTruth => "ground truth",
        }
    }
}

/// 画面に出すエラー（タイトル＋詳細）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppError {
    pub kind: FailureKind,
    pub message: String,
    pub details: Option<String>,
}

impl AppError {
    pub fn new(kind: FailureKind, message: impl Into<String>, details: Option<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.details {
            Some(details) => write!(f, "{}: {}", self.message, details),
            None => f.write_str(&self.message),
        }
    }
}

/// 送信を受け付けられない理由
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("Please upload both predicted and ground truth JSON files")]
    MissingFiles,

    #[error("Invalid {} file: {error}", .role.label())]
    Invalid { role: FileRole, error: ValidationError },
}

impl SubmitError {
    pub fn kind(&self) -> FailureKind {
        match self {
            SubmitError::MissingFiles => FailureKind::MissingFiles,
            SubmitError::Invalid { error, .. } => match error {
                ValidationError::SizeExceeded { .. } => FailureKind::SizeExceeded,
                ValidationError::MalformedJson { .. } => FailureKind::MalformedJson,
                ValidationError::ReadError { .. } => FailureKind::ReadError,
            },
        }
    }

    pub fn to_app_error(&self) -> AppError {
        match self {
            SubmitError::MissingFiles => AppError::new(
                self.kind(),
                "Missing files",
                Some("Please upload both predicted and ground truth JSON files".into()),
            ),
            SubmitError::Invalid { error: ValidationError::SizeExceeded { .. }, .. } => AppError::new(
                self.kind(),
                "File size too large",
                Some("Each file must be smaller than 10MB".into()),
            ),
            SubmitError::Invalid { role, error } => AppError::new(
                self.kind(),
                format!("Invalid {} file", role.label()),
                Some(error.to_string()),
            ),
        }
    }
}

/// 選択中のファイル組
#[derive(Debug, Clone, Default)]
pub struct UploadPair {
    pub predicted: Option<FileHandle>,
    pub real: Option<FileHandle>,
}

impl UploadPair {
    pub fn is_complete(&self) -> bool {
        self.predicted.is_some() && self.real.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.predicted.is_none() && self.real.is_none()
    }

    /// 予測→正解の順に検証し、最初の失敗を返す
    pub fn validate(&self) -> Result<ValidatedPair, SubmitError> {
        let (Some(predicted), Some(real)) = (&self.predicted, &self.real) else {
            return Err(SubmitError::MissingFiles);
        };

        validate(predicted.as_ref()).map_err(|error| SubmitError::Invalid {
            role: FileRole::Predicted,
            error,
        })?;
        validate(real.as_ref()).map_err(|error| SubmitError::Invalid {
            role: FileRole::GroundTruth,
            error,
        })?;

        Ok(ValidatedPair {
            predicted: Arc::clone(predicted),
            real: Arc::clone(real),
        })
    }
}

/// 検証済みのファイル組（`UploadPair::validate` でのみ作られる）
#[derive(Debug, Clone)]
pub struct ValidatedPair {
    predicted: FileHandle,
    real: FileHandle,
}

impl ValidatedPair {
    pub fn predicted(&self) -> &FileHandle {
        &self.predicted
    }

    pub fn real(&self) -> &FileHandle {
        &self.real
    }

    fn matches(&self, pair: &UploadPair) -> bool {
        let same = |held: &Option<FileHandle>, checked: &FileHandle| {
            held.as_ref().is_some_and(|h| Arc::ptr_eq(h, checked))
        };
        same(&pair.predicted, &self.predicted) && same(&pair.real, &self.real)
    }
}

/// 最後に成功した比較結果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    pub general: Vec<MetricResult>,
    pub by_type: TypeResults,
}

/// 現在のフェーズ
#[derive(Debug, Clone, PartialEq)]
pub enum AppPhase {
    Upload { notice: Option<AppError> },
    Loading,
    Results(ResultSet),
    Error(AppError),
}

/// フェーズ名（ログ・エラー用）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseKind {
    Upload,
    Loading,
    Results,
    Error,
}

impl PhaseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseKind::Upload => "upload",
            PhaseKind::Loading => "loading",
            PhaseKind::Results => "results",
            PhaseKind::Error => "error",
        }
    }
}

impl fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AppPhase {
    pub fn kind(&self) -> PhaseKind {
        match self {
            AppPhase::Upload { .. } => PhaseKind::Upload,
            AppPhase::Loading => PhaseKind::Loading,
            AppPhase::Results(_) => PhaseKind::Results,
            AppPhase::Error(_) => PhaseKind::Error,
        }
    }
}

/// アプリケーション状態
#[derive(Debug, Clone)]
pub struct AppState {
    phase: AppPhase,
    files: UploadPair,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            phase: AppPhase::Upload { notice: None },
            files: UploadPair::default(),
        }
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> &AppPhase {
        &self.phase
    }

    pub fn kind(&self) -> PhaseKind {
        self.phase.kind()
    }

    pub fn files(&self) -> &UploadPair {
        &self.files
    }

    pub fn results(&self) -> Option<&ResultSet> {
        match &self.phase {
            AppPhase::Results(set) => Some(set),
            _ => None,
        }
    }

    /// ファイルを差し替えた upload 状態（通知は消える）
    fn with_files(&self, files: UploadPair) -> AppState {
        AppState {
            phase: AppPhase::Upload { notice: None },
            files,
        }
    }

    pub fn error(&self) -> Option<&AppError> {
        match &self.phase {
            AppPhase::Error(error) => Some(error),
            AppPhase::Upload { notice } => notice.as_ref(),
            _ => None,
        }
    }
}

/// 状態を動かすイベント
#[derive(Debug, Clone)]
pub enum Event {
    SelectPredicted(FileHandle),
    SelectReal(FileHandle),
    RemovePredicted,
    RemoveReal,
    Submit(ValidatedPair),
    Rejected(SubmitError),
    Completed(ComparisonOutcome),
    Reset,
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::SelectPredicted(_) => "select_predicted",
            Event::SelectReal(_) => "select_real",
            Event::RemovePredicted => "remove_predicted",
            Event::RemoveReal => "remove_real",
            Event::Submit(_) => "submit",
            Event::Rejected(_) => "rejected",
            Event::Completed(_) => "completed",
            Event::Reset => "reset",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("{event} is not accepted in the {phase} phase")]
    NotAccepted { event: &'static str, phase: PhaseKind },

    #[error("validated files no longer match the selected files")]
    StalePair,
}

/// 状態遷移
///
/// 受け付けないイベントは `TransitionError` を返し、元の状態は変わらない。
pub fn transition(state: &AppState, event: Event) -> Result<AppState, TransitionError> {
    let not_accepted = |event: &Event| TransitionError::NotAccepted {
        event: event.name(),
        phase: state.kind(),
    };

    match (&state.phase, event) {
        (AppPhase::Upload { .. }, Event::SelectPredicted(file)) => Ok(state.with_files(UploadPair {
            predicted: Some(file),
            ..state.files.clone()
        })),
        (AppPhase::Upload { .. }, Event::SelectReal(file)) => Ok(state.with_files(UploadPair {
            real: Some(file),
            ..state.files.clone()
        })),
        (AppPhase::Upload { .. }, Event::RemovePredicted) => Ok(state.with_files(UploadPair {
            predicted: None,
            ..state.files.clone()
        })),
        (AppPhase::Upload { .. }, Event::RemoveReal) => Ok(state.with_files(UploadPair {
            real: None,
            ..state.files.clone()
        })),

        (AppPhase::Upload { .. }, Event::Submit(pair)) => {
            if !pair.matches(&state.files) {
                return Err(TransitionError::StalePair);
            }
            Ok(AppState {
                phase: AppPhase::Loading,
                files: state.files.clone(),
            })
        }

        (AppPhase::Upload { .. }, Event::Rejected(rejection)) => {
            let error = rejection.to_app_error();
            let phase = match rejection {
                SubmitError::MissingFiles => AppPhase::Upload { notice: Some(error) },
                SubmitError::Invalid { .. } => AppPhase::Error(error),
            };
            Ok(AppState {
                phase,
                files: state.files.clone(),
            })
        }

        (AppPhase::Loading, Event::Completed(outcome)) => {
            let phase = if outcome.response.success {
                AppPhase::Results(ResultSet {
                    general: outcome.response.results,
                    by_type: outcome.response.type_specific_results.unwrap_or_default(),
                })
            } else {
                AppPhase::Error(AppError::new(
                    outcome.failure.unwrap_or(FailureKind::SemanticFailure),
                    "Comparison failed",
                    Some(
                        outcome
                            .response
                            .error
                            .unwrap_or_else(|| "Unknown error occurred".into()),
                    ),
                ))
            };
            Ok(AppState {
                phase,
                files: state.files.clone(),
            })
        }

        (AppPhase::Results(_) | AppPhase::Error(_), Event::Reset) => Ok(AppState::default()),

        (_, event) => Err(not_accepted(&event)),
    }
}
