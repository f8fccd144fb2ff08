//! 요청 → 시그널 파이프라인.
//!
//! 0. 실행 옵션 검증 (명령행 덮어쓰기 포함, 실패 시 `InvalidInput`)
//! 1. 접근 토큰 발급 (실패 시 조회 없이 `AuthFailure`)
//! 2. 발급받은 토큰으로 페이지 조회해 분봉 시계열 조립 (중간 실패는 부분 결과로 진행)
//! 3. 빈 시계열이면 `EmptyResult`
//! 4. 지표 프레임 → 시그널 → BUY일 때 매수 수량 계산

use std::sync::Arc;

use rust_decimal::Decimal;
use swing_analytics::{IndicatorFrame, IndicatorSettings, LatestSignal, SignalEngine};
use swing_core::{
    pipeline_span, AppConfig, FetchConfig, Series, StrategyConfig, SwingError, SwingResult,
    TradeSignal,
};
use swing_exchange::{
    AssembledSeries, MinIntervalLimiter, MinuteChartRequest, MinutePageFetcher,
    PagedSeriesAssembler, TokenProvider,
};
use swing_risk::{PositionSizer, SizingResult};
use tracing::{info, warn, Instrument};

/// 파이프라인 실행 옵션.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// 최대 조회 호출 수 (첫 호출 포함)
    pub max_pages: u32,
    /// 연속 호출 최소 간격 (밀리초)
    pub min_call_interval_ms: u64,
    /// 추적 손절 ATR 배수
    pub atr_multiplier: Decimal,
    /// 자금관리 기준 자본
    pub capital: Decimal,
    /// 거래당 리스크 비율
    pub risk_fraction: Decimal,
}

impl PipelineOptions {
    /// 설정 파일과 같은 범위 규칙으로 검증.
    ///
    /// # Errors
    /// 범위를 벗어난 값이 있으면 `SwingError::InvalidInput`.
    pub fn validate(&self) -> SwingResult<()> {
        let fetch = FetchConfig {
            max_pages: self.max_pages,
            min_call_interval_ms: self.min_call_interval_ms,
        };
        let strategy = StrategyConfig {
            atr_multiplier: self.atr_multiplier,
            capital: self.capital,
            risk_fraction: self.risk_fraction,
        };
        fetch
            .validate()
            .and_then(|_| strategy.validate())
            .map_err(SwingError::InvalidInput)
    }
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for PipelineOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            max_pages: config.fetch.max_pages,
            min_call_interval_ms: config.fetch.min_call_interval_ms,
            atr_multiplier: config.strategy.atr_multiplier,
            capital: config.strategy.capital,
            risk_fraction: config.strategy.risk_fraction,
        }
    }
}

/// 분석 결과.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    /// 지표/시그널이 채워진 프레임
    pub frame: IndicatorFrame,
    /// 마지막 행 시그널
    pub latest: LatestSignal,
    /// BUY일 때 매수 수량 권고
    pub sizing: Option<SizingResult>,
}

/// 파이프라인.
///
/// 토큰 제공자와 페이지 조회 기능은 trait으로 주입받습니다.
pub struct Pipeline<T, F> {
    tokens: T,
    assembler: PagedSeriesAssembler<F>,
    options: PipelineOptions,
}

impl<T: TokenProvider, F: MinutePageFetcher> Pipeline<T, F> {
    /// 옵션의 호출 간격으로 limiter를 만들어 생성.
    pub fn new(tokens: T, fetcher: F, options: PipelineOptions) -> Self {
        let limiter = Arc::new(MinIntervalLimiter::from_millis(options.min_call_interval_ms));
        Self {
            tokens,
            assembler: PagedSeriesAssembler::new(fetcher).with_rate_limiter(limiter),
            options,
        }
    }

    /// 토큰 발급과 공유할 limiter 설정.
    pub fn with_rate_limiter(mut self, limiter: Arc<MinIntervalLimiter>) -> Self {
        self.assembler = self.assembler.with_rate_limiter(limiter);
        self
    }

    /// 실행 옵션.
    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// 옵션 검증, 토큰 발급 후 분봉 시계열 조립.
    ///
    /// 여기서 발급받은 토큰을 모든 페이지 호출에 그대로 넘기므로
    /// 조회 도중에는 토큰 요청이 끼어들지 않습니다.
    ///
    /// # Errors
    /// 옵션이 범위를 벗어나면 `SwingError::InvalidInput`, 토큰 발급 실패 시
    /// `SwingError::AuthFailure`. 조회 실패는 결과에 기록됩니다.
    pub async fn fetch(&self, request: &MinuteChartRequest) -> SwingResult<AssembledSeries> {
        let span = pipeline_span!(
            "fetch",
            request.symbol,
            request.exchange_code,
            request.interval_minutes
        );

        self.options.validate()?;

        async {
            let token = self
                .tokens
                .get_token()
                .await
                .map_err(|e| e.into_auth_failure())?;

            let assembled = self
                .assembler
                .assemble(request, &token, self.options.max_pages)
                .await;
            if let Some(failure) = &assembled.failure {
                if assembled.is_partial() {
                    warn!(
                        pages = assembled.pages_fetched,
                        bars = assembled.series.len(),
                        error = %failure,
                        "조회가 중간에 실패해 부분 데이터로 진행합니다"
                    );
                }
            }
            Ok::<_, SwingError>(assembled)
        }
        .instrument(span)
        .await
    }

    /// 조립된 시계열로 지표/시그널/자금관리 계산.
    ///
    /// # Errors
    /// 시계열이 비어 있으면 `SwingError::EmptyResult`.
    pub fn analyze(&self, series: &Series) -> SwingResult<AnalysisReport> {
        if series.is_empty() {
            return Err(SwingError::EmptyResult);
        }

        let frame = IndicatorFrame::compute(series, &IndicatorSettings::default())
            .map_err(|e| SwingError::InvalidInput(e.to_string()))?;
        let engine = SignalEngine::new(self.options.atr_multiplier);
        let frame = engine.compute(frame);
        let latest = engine.get_latest_signal(&frame);

        let sizing = match (latest.signal, latest.close, latest.atr) {
            (TradeSignal::Buy, Some(price), Some(atr)) => Some(PositionSizer::default().size(
                self.options.capital,
                price,
                atr,
                self.options.risk_fraction,
            )),
            _ => None,
        };

        info!(
            rows = frame.len(),
            signal = %latest.signal,
            "시그널 분석 완료"
        );

        Ok(AnalysisReport {
            frame,
            latest,
            sizing,
        })
    }

    /// 조회부터 분석까지 한 번에 실행.
    pub async fn run(&self, request: &MinuteChartRequest) -> SwingResult<AnalysisReport> {
        let assembled = self.fetch(request).await?;
        self.analyze(&assembled.series)
    }
}
