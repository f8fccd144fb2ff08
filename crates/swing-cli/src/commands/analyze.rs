//! `analyze` 명령: 조회 → 지표/시그널 → 자금관리 → CSV 저장.

use anyhow::Result;
use clap::Args;
use rust_decimal::Decimal;
use swing_core::{AppConfig, SwingError};
use swing_exchange::{MinutePageFetcher, TokenProvider};
use tracing::{error, info};

use super::{connect_kis, TargetArgs};
use crate::export::{fetched_data_path, signals_path, write_bars_csv, write_frame_csv};
use crate::pipeline::{AnalysisReport, Pipeline, PipelineOptions};

/// `analyze` 인자.
#[derive(Debug, Clone, Args)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// 자금관리 기준 자본금. 미지정 시 설정값 사용
    #[arg(long)]
    pub capital: Option<Decimal>,
}

impl AnalyzeArgs {
    /// 설정에 명령행 값을 덮어쓴 파이프라인 옵션.
    pub fn options(&self, config: &AppConfig) -> PipelineOptions {
        let mut options = PipelineOptions::from(config);
        if let Some(pages) = self.target.pages {
            options.max_pages = pages;
        }
        if let Some(capital) = self.capital {
            options.capital = capital;
        }
        options
    }
}

/// KIS에 연결해 분석 실행.
pub async fn run(config: &AppConfig, args: &AnalyzeArgs) -> Result<()> {
    let options = args.options(config);
    options.validate()?;

    let stack = connect_kis(config)?;
    let pipeline =
        Pipeline::new(stack.oauth, stack.client, options).with_rate_limiter(stack.limiter);

    execute(&pipeline, config, args).await
}

/// 주어진 파이프라인으로 분석 실행 및 결과 저장.
///
/// 조회 결과가 비어 있으면 안내만 출력하고 정상 종료합니다.
pub async fn execute<T, F>(
    pipeline: &Pipeline<T, F>,
    config: &AppConfig,
    args: &AnalyzeArgs,
) -> Result<()>
where
    T: TokenProvider,
    F: MinutePageFetcher,
{
    let request = args.target.to_request()?;
    let output_dir = args.target.output_dir(config);

    println!("===== 해외주식 분봉 데이터 & 스윙(단기) 전략 =====");

    let assembled = pipeline.fetch(&request).await.map_err(|e| {
        match &e {
            SwingError::AuthFailure(_) => error!("토큰 발급 실패: {}", e),
            _ => error!("조회 시작 불가: {}", e),
        }
        e
    })?;

    if assembled.pages_fetched > 0 {
        let path = fetched_data_path(&output_dir, &request.symbol);
        write_bars_csv(&path, &assembled.series)?;
        println!(
            "[완료] {} 분봉 데이터가 '{}'로 저장되었습니다.",
            request.symbol,
            path.display()
        );
    }

    let report = match pipeline.analyze(&assembled.series) {
        Ok(report) => report,
        Err(SwingError::EmptyResult) => {
            println!("[주의] 조회 결과가 없습니다. 종료.");
            info!(symbol = %request.symbol, "빈 결과로 분석 생략");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    println!("[확인] 조회된 데이터: {} rows", assembled.series.len());
    print_report(&report);

    let path = signals_path(&output_dir, &request.symbol, request.interval_minutes);
    write_frame_csv(&path, &report.frame)?;
    println!("[저장] {} 파일로 저장했습니다.", path.display());

    Ok(())
}

fn print_report(report: &AnalysisReport) {
    let latest = &report.latest;
    let time = latest
        .timestamp
        .map(|t| t.to_string())
        .unwrap_or_else(|| "-".to_string());
    println!("[{}] 최신 시그널: {}", time, latest.signal);

    if let (Some(sizing), Some(price), Some(atr)) = (&report.sizing, latest.close, latest.atr) {
        println!(
            "[BUY 시그널] 추천 매수 수량: {} 주 (현재가: {:.2}, ATR14: {:.2})",
            sizing.quantity, price, atr
        );
        println!(
            "[손절] 손절가: {:.2}, 주당 손실: {:.2}, 최대 손실: {:.2}",
            sizing.stop_loss, sizing.loss_per_share, sizing.max_loss
        );
    }
}
