//! 比較セッション
//!
//! 状態機械 `AppState` を保持し、検証・送信・結果受信をイベントとして適用する。
//! 画面は毎回 `project` で状態から作り直す。

use crate::client::ComparisonClient;
use crate::error::Result;
use indicatif::{ProgressBar, ProgressStyle};
use metric_checker_common::api::Provenance;
use metric_checker_common::presenter::{project, Screen, ViewSelection};
use metric_checker_common::state::{transition, AppState, Event};
use metric_checker_common::validator::FileHandle;
use std::time::Duration;
use tracing::{info, warn};

pub struct Session {
    state: AppState,
    client: ComparisonClient,
    selection: ViewSelection,
    provenance: Option<Provenance>,
    show_progress: bool,
}

impl Session {
    pub fn new(client: ComparisonClient) -> Self {
        Self {
            state: AppState::new(),
            client,
            selection: ViewSelection::General,
            provenance: None,
            show_progress: false,
        }
    }

    /// 送信中にスピナーを表示する
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn selection(&self) -> &ViewSelection {
        &self.selection
    }

    /// 直近の結果の出所（バックエンド / モック）
    pub fn provenance(&self) -> Option<Provenance> {
        self.provenance
    }

    /// イベントを適用する（受け付けない場合は状態を変えずにエラー）
    pub fn dispatch(&mut self, event: Event) -> Result<()> {
        let name = event.name();
        let from = self.state.kind();
        let next = transition(&self.state, event)?;
        info!(%from, to = %next.kind(), event = name, "state transition");
        self.state = next;
        Ok(())
    }

    pub fn select_predicted(&mut self, file: FileHandle) -> Result<()> {
        self.dispatch(Event::SelectPredicted(file))
    }

    pub fn select_real(&mut self, file: FileHandle) -> Result<()> {
        self.dispatch(Event::SelectReal(file))
    }

    pub fn remove_predicted(&mut self) -> Result<()> {
        self.dispatch(Event::RemovePredicted)
    }

    pub fn remove_real(&mut self) -> Result<()> {
        self.dispatch(Event::RemoveReal)
    }

    /// 検証 → 送信 → 結果反映
    pub async fn submit(&mut self) -> Result<()> {
        let pair = match self.state.files().validate() {
            Ok(pair) => pair,
            Err(rejection) => {
                warn!(kind = %rejection.kind(), error = %rejection, "submission rejected");
                return self.dispatch(Event::Rejected(rejection));
            }
        };

        self.dispatch(Event::Submit(pair.clone()))?;

        let spinner = self.show_progress.then(spinner);
        let outcome = self
            .client
            .compare(pair.predicted().as_ref(), pair.real().as_ref())
            .await;
        if let Some(pb) = spinner {
            pb.finish_and_clear();
        }

        info!(provenance = outcome.provenance.as_str(), success = outcome.is_success(), "comparison finished");
        let provenance = outcome.provenance;
        self.dispatch(Event::Completed(outcome))?;
        self.provenance = Some(provenance);
        Ok(())
    }

    /// 結果/エラーから初期状態へ
    pub fn reset(&mut self) -> Result<()> {
        self.dispatch(Event::Reset)?;
        self.selection = ViewSelection::General;
        self.provenance = None;
        Ok(())
    }

    /// 表示ビューを切り替える（結果にないビューは警告のうえ "No Results" 表示）
    pub fn select_view(&mut self, selection: ViewSelection) {
        if let Some(set) = self.state.results() {
            if !selection.is_available(set) {
                warn!(view = %selection, "selected view is not present in the results");
            }
        }
        self.selection = selection;
    }

    pub fn screen(&self) -> Screen {
        project(&self.state, &self.selection)
    }
}

fn spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );
    pb.set_message("Comparing JSON Files...");
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}
