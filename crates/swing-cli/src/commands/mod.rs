//! CLI 명령어 구현 모듈.

pub mod analyze;
pub mod fetch;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use swing_core::AppConfig;
use swing_exchange::{
    KisConfig, KisOAuth, KisOverseasClient, MinIntervalLimiter, MinuteChartRequest,
};

/// 조회 대상 공통 인자.
#[derive(Debug, Clone, Args)]
pub struct TargetArgs {
    /// 거래소 코드 (예: NAS, NYS, AMS)
    #[arg(short, long, default_value = "NAS")]
    pub exchange: String,

    /// 종목 심볼 (예: TSLA)
    #[arg(short, long)]
    pub symbol: String,

    /// 분봉 주기 (분)
    #[arg(short, long, default_value = "5")]
    pub interval: u32,

    /// 반복 조회 횟수 (첫 호출 포함, 1회당 최대 120봉). 미지정 시 설정값 사용
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
    pub pages: Option<u32>,

    /// CSV 저장 디렉토리. 미지정 시 설정값 사용
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
}

impl TargetArgs {
    /// 검증된 조회 요청으로 변환.
    pub fn to_request(&self) -> Result<MinuteChartRequest> {
        MinuteChartRequest::new(&self.exchange, &self.symbol, self.interval)
            .context("조회 요청 인자가 올바르지 않습니다")
    }

    /// CSV 저장 디렉토리.
    pub fn output_dir(&self, config: &AppConfig) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(&config.output.dir))
    }
}

/// KIS 연결 구성 요소.
pub struct KisStack {
    /// 토큰 제공자
    pub oauth: Arc<KisOAuth>,
    /// 분봉 조회 클라이언트
    pub client: KisOverseasClient,
    /// 토큰 발급과 조회가 공유하는 limiter
    pub limiter: Arc<MinIntervalLimiter>,
}

/// 환경 변수의 KIS 인증 정보로 연결 구성.
pub fn connect_kis(config: &AppConfig) -> Result<KisStack> {
    let kis_config = KisConfig::from_env().context(
        "KIS_APP_KEY, KIS_APP_SECRET 환경변수가 필요합니다 (.env 파일 사용 가능)",
    )?;

    let limiter = Arc::new(MinIntervalLimiter::from_millis(
        config.fetch.min_call_interval_ms,
    ));
    let oauth = Arc::new(KisOAuth::new(kis_config)?.with_rate_limiter(Arc::clone(&limiter)));
    let client = KisOverseasClient::with_shared_oauth(Arc::clone(&oauth))?;

    Ok(KisStack {
        oauth,
        client,
        limiter,
    })
}
