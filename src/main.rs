use anyhow::{bail, Result};
use clap::Parser;
use dialoguer::Select;
use metric_checker::cli::{Cli, Commands, SubmissionPolicy};
use metric_checker::client::ComparisonClient;
use metric_checker::config::Config;
use metric_checker::export;
use metric_checker::files::LocalFile;
use metric_checker::session::Session;
use metric_checker_common::api::Provenance;
use metric_checker_common::presenter::{
    format_percentage, render_report, selectors, ResultsView, Screen, ViewSelection,
};
use metric_checker_common::types::ComparisonResponse;
use std::path::PathBuf;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli).await {
        error!(error = %err, "command failed");
        for cause in err.chain().skip(1) {
            error!(cause = %cause, "caused by");
        }
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

struct CompareArgs {
    predicted: PathBuf,
    ground_truth: PathBuf,
    view: String,
    interactive: bool,
    policy: SubmissionPolicy,
    chart: Option<PathBuf>,
    excel: Option<PathBuf>,
    json: bool,
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load()?;

    match cli.command {
        Commands::Compare { predicted, ground_truth, view, interactive, policy, chart, excel, json } => {
            let args = CompareArgs { predicted, ground_truth, view, interactive, policy, chart, excel, json };
            compare(&config, args).await?;
        }

        Commands::Health => {
            let client = ComparisonClient::new(config.api_base_url(), SubmissionPolicy::Live)?;
            let health = client.health().await?;
            println!("✔ {} ({})", health.status, client.base_url());
            if !health.timestamp.is_empty() {
                println!("  サーバー時刻: {}", health.timestamp);
            }
            println!("  確認時刻: {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"));
        }

        Commands::Status => {
            let client = ComparisonClient::new(config.api_base_url(), SubmissionPolicy::Live)?;
            let status = client.status().await?;
            println!("API情報 ({}):", client.base_url());
            println!("  状態: {}", status.status);
            println!("  バージョン: {}", status.version);
            println!("  対応形式: {}", status.supported_formats.join(", "));
            println!("  最大ファイルサイズ: {} bytes", status.max_file_size);
        }

        Commands::Config { set_base_url, show } => {
            if let Some(url) = set_base_url {
                config.set_base_url(url)?;
                println!("✔ ベースURLを設定しました");
            }

            if show {
                println!("設定:");
                println!("  ベースURL: {}", config.base_url);
                println!("  実効URL: {}", config.api_base_url());
                println!("  設定ファイル: {}", Config::config_path()?.display());
            }
        }
    }

    Ok(())
}

async fn compare(config: &Config, args: CompareArgs) -> Result<()> {
    let client = ComparisonClient::new(config.api_base_url(), args.policy)?;
    let mut session = Session::new(client).with_progress(!args.json);

    session.select_predicted(LocalFile::handle(&args.predicted)?)?;
    session.select_real(LocalFile::handle(&args.ground_truth)?)?;
    session.submit().await?;
    session.select_view(ViewSelection::parse(&args.view));

    let Some(set) = session.state().results().cloned() else {
        print_screen(&session.screen(), session.provenance());
        bail!("comparison did not produce results");
    };

    if args.json {
        let response = ComparisonResponse::success(set.general.clone(), Some(set.by_type.clone()));
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        println!("📊 metric-checker - 比較結果 ({})\n", chrono::Local::now().format("%Y-%m-%d %H:%M"));
        print_screen(&session.screen(), session.provenance());
    }

    if args.interactive {
        let list = selectors(&set);
        let items: Vec<String> = list.iter().map(|s| s.display()).chain(["Exit".to_string()]).collect();
        loop {
            let current = list
                .iter()
                .position(|s| &s.selection == session.selection())
                .unwrap_or(0);
            let choice = Select::new()
                .with_prompt("表示するビュー")
                .items(&items)
                .default(current)
                .interact()?;
            let Some(selector) = list.get(choice) else {
                break;
            };
            session.select_view(selector.selection.clone());
            print_screen(&session.screen(), session.provenance());
        }
    }

    if let Some(output) = &args.chart {
        match export::export_chart(&set, session.selection(), output)? {
            Some(path) => println!("✔ チャート出力: {}", path.display()),
            None => println!("チャートに表示するデータがありません"),
        }
    }

    if let Some(output) = &args.excel {
        println!("- Excelを生成中...");
        let path = export::export_excel(&set, output)?;
        println!("✔ Excel出力: {}", path.display());
    }

    Ok(())
}

fn print_screen(screen: &Screen, provenance: Option<Provenance>) {
    match screen {
        Screen::Upload { predicted, real, notice, .. } => {
            println!("予測ファイル: {}", predicted.as_deref().unwrap_or("-"));
            println!("正解ファイル: {}", real.as_deref().unwrap_or("-"));
            if let Some(notice) = notice {
                println!("⚠ {}", notice);
            }
        }
        Screen::Loading { steps } => {
            for step in steps {
                println!("  {}", step);
            }
        }
        Screen::Results(view) => print_results(view, provenance),
        Screen::Error { title, details } => {
            println!("⚠ {}", title);
            if let Some(details) = details {
                println!("  Details: {}", details);
            }
        }
    }
}

fn print_results(view: &ResultsView, provenance: Option<Provenance>) {
    if provenance == Some(Provenance::Mock) {
        println!("(バックエンドに接続できないためモックデータを表示しています)\n");
    }

    let tabs: Vec<String> = view
        .selectors
        .iter()
        .map(|s| {
            if s.selection == view.selection {
                format!("[{}]", s.display())
            } else {
                s.display()
            }
        })
        .collect();
    println!("{}\n", tabs.join("  "));

    if view.is_empty {
        println!("No Results");
        println!("No metric results to display.");
        return;
    }

    if let Some(summary) = &view.summary {
        if let Some(docs) = summary.total_documents {
            println!("Total Documents: {}", docs);
        }
        println!("Total Metrics: {}", summary.total_metrics);
        println!("Avg. Exact Accuracy: {}", format_percentage(summary.avg_exact_accuracy));
        println!("Avg. List Match: {}\n", format_percentage(summary.avg_list_match));
    }

    if let Some(chart) = &view.chart {
        println!("{}", chart.options.title);
        for dataset in &chart.data.datasets {
            println!("  {}", dataset.label);
            for (label, value) in chart.data.labels.iter().zip(&dataset.data) {
                println!("    {:<40} {}", label, chart.options.tooltip_text(&dataset.label, *value));
            }
        }
        println!();
    }

    if !view.results.is_empty() {
        print!("{}", render_report(&view.results));
    }
}
