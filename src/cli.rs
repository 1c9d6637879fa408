use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "metric-checker")]
#[command(about = "予測JSONと正解JSONのメタデータ精度比較ツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 2つのJSONファイルを比較して結果を表示
    Compare {
        /// 予測JSONファイル
        #[arg(required = true)]
        predicted: PathBuf,

        /// 正解JSONファイル
        #[arg(required = true)]
        ground_truth: PathBuf,

        /// 表示するビュー (General / タイプ名 / Comprehensive)
        #[arg(long, default_value = "General")]
        view: String,

        /// 結果表示後に対話的にビューを切り替える
        #[arg(short, long)]
        interactive: bool,

        /// 送信ポリシー (live/fallback/mock)
        #[arg(long, default_value = "fallback")]
        policy: SubmissionPolicy,

        /// チャート仕様JSONの出力先（ファイルまたはディレクトリ）
        #[arg(long)]
        chart: Option<PathBuf>,

        /// Excelレポートの出力先（ファイルまたはディレクトリ）
        #[arg(long)]
        excel: Option<PathBuf>,

        /// 結果を正規化済みJSONで標準出力に出す
        #[arg(long)]
        json: bool,
    },

    /// バックエンドのヘルスチェック
    Health,

    /// バックエンドのAPI情報を表示
    Status,

    /// 設定を表示/編集
    Config {
        /// 比較APIのベースURLを設定
        #[arg(long)]
        set_base_url: Option<String>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}

/// 比較APIが使えないときの扱い
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SubmissionPolicy {
    /// 常にバックエンドの結果だけを使う
    Live,
    /// 通信失敗時のみモック結果に切り替える（デフォルト）
    #[default]
    Fallback,
    /// 通信せずモック結果を返す
    Mock,
}

impl std::str::FromStr for SubmissionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "live" => Ok(SubmissionPolicy::Live),
            "fallback" => Ok(SubmissionPolicy::Fallback),
            "mock" => Ok(SubmissionPolicy::Mock),
            _ => Err(format!("Unknown policy: {}. Use live, fallback, or mock", s)),
        }
    }
}

impl std::fmt::Display for SubmissionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubmissionPolicy::Live => write!(f, "live"),
            SubmissionPolicy::Fallback => write!(f, "fallback"),
            SubmissionPolicy::Mock => write!(f, "mock"),
        }
    }
}
