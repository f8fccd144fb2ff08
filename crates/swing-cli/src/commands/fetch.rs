//! `fetch` 명령: 분봉 조회 후 CSV 저장만 수행.

use anyhow::Result;
use clap::Args;
use swing_core::AppConfig;

use super::{connect_kis, TargetArgs};
use crate::export::{fetched_data_path, write_bars_csv};
use crate::pipeline::{Pipeline, PipelineOptions};

/// `fetch` 인자.
#[derive(Debug, Clone, Args)]
pub struct FetchArgs {
    #[command(flatten)]
    pub target: TargetArgs,
}

/// 분봉 조회 및 저장.
pub async fn run(config: &AppConfig, args: &FetchArgs) -> Result<()> {
    let request = args.target.to_request()?;

    let mut options = PipelineOptions::from(config);
    if let Some(pages) = args.target.pages {
        options.max_pages = pages;
    }
    options.validate()?;

    let stack = connect_kis(config)?;
    let pipeline =
        Pipeline::new(stack.oauth, stack.client, options).with_rate_limiter(stack.limiter);

    let assembled = pipeline.fetch(&request).await?;
    if assembled.first_call_failed() {
        println!("[오류] 첫 API 호출 실패");
        return Ok(());
    }

    let path = fetched_data_path(&args.target.output_dir(config), &request.symbol);
    let rows = write_bars_csv(&path, &assembled.series)?;
    println!(
        "[완료] {} 분봉 {}개 ({}회 조회)를 '{}'로 저장했습니다.",
        request.symbol,
        rows,
        assembled.pages_fetched,
        path.display()
    );

    Ok(())
}
