//! 해외주식 분봉 스윙 시그널 CLI.
//!
//! # 사용 예시
//!
//! ```bash
//! # TSLA 5분봉 4회 조회 후 시그널 계산
//! swing analyze -e NAS -s TSLA -i 5 -p 4
//!
//! # 분봉 데이터만 저장
//! swing fetch -e NYS -s KO -i 1 -o data
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use swing_cli::commands::{analyze, fetch};
use swing_core::{init_logging, AppConfig, LogConfig};

#[derive(Parser)]
#[command(name = "swing")]
#[command(
    about = "해외주식 분봉 스윙 시그널 - 한국투자증권 시세 기반",
    long_about = None
)]
#[command(version)]
struct Cli {
    /// 설정 파일 (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 분봉 조회 → 지표/시그널 계산 → 자금관리 → CSV 저장
    Analyze(analyze::AnalyzeArgs),

    /// 분봉 조회 후 CSV 저장만 수행
    Fetch(fetch::FetchArgs),
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref()).context("설정 로드 실패")?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("설정 검증 실패: {}", e))?;

    init_logging(LogConfig::from_settings(&config.logging))
        .map_err(|e| anyhow::anyhow!("로깅 초기화 실패: {}", e))?;

    match cli.command {
        Commands::Analyze(args) => analyze::run(&config, &args).await,
        Commands::Fetch(args) => fetch::run(&config, &args).await,
    }
}
