//! Metric Checker Common Library
//!
//! CLIと各フロントエンドで共有される比較結果の型とロジック

pub mod types;
pub mod error;
pub mod validator;
pub mod api;
pub mod mock;
pub mod chart;
pub mod state;
pub mod presenter;
pub mod export;

pub use types::{ComparisonResponse, MetricKind, MetricResult, TypeResults, TypeSpecificResult};
pub use error::{Error, FailureKind, Result};
pub use validator::{validate, FileHandle, MemoryFile, UploadFile, ValidationError, MAX_FILE_SIZE};
pub use api::{ClientError, ComparisonOutcome, Provenance};
pub use mock::{mock_response, mock_results};
pub use chart::{comprehensive_spec, single_type_spec, ChartData, ChartSpec};
pub use state::{transition, AppError, AppPhase, AppState, Event, PhaseKind, ResultSet, SubmitError, TransitionError, UploadPair, ValidatedPair};
pub use presenter::{project, render_report, Screen, SummaryStats, ViewSelection};
