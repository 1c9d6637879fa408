//! metric-checker
//!
//! 予測JSONと正解JSONを比較APIに送り、フィールド別の精度を表示・出力する。

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod export;
pub mod files;
pub mod session;
