//! 기술적 지표 모듈.
//!
//! 모든 함수는 순수 함수이며 입력 위치마다 하나의 값을 반환합니다.
//! 워밍업 구간처럼 값을 정의할 수 없는 위치는 0이 아니라 `None`입니다.
//!
//! # 지원 지표
//!
//! ## 추세 지표
//! - **EMA**: 지수 이동평균 (첫 값으로 시작, SMA 시드 없음)
//! - **MACD**: 이동평균 수렴/확산
//!
//! ## 모멘텀 지표
//! - **RSI**: 상대강도지수 (단순 이동평균 방식)
//! - **Momentum**: N기간 변화율 (%)
//!
//! ## 변동성 지표
//! - **Bollinger Bands**: 볼린저 밴드 (표본 표준편차)
//! - **ATR**: 평균 실제 범위 (단순 이동평균 방식)
//!
//! # 사용 예시
//!
//! ```ignore
//! use swing_analytics::indicators::{IndicatorEngine, EmaParams, RsiParams};
//!
//! let engine = IndicatorEngine::new();
//! let ema = engine.ema(&closes, EmaParams { period: 20 })?;
//! let rsi = engine.rsi(&closes, RsiParams { period: 14 })?;
//! ```

pub mod momentum;
pub mod trend;
pub mod volatility;

use rust_decimal::Decimal;
use thiserror::Error;

pub use momentum::{MomentumIndicators, MomentumParams, RsiParams};
pub use trend::{EmaParams, MacdParams, MacdResult, TrendIndicators};
pub use volatility::{AtrParams, BollingerBandsParams, BollingerBandsResult, VolatilityIndicators};

/// 지표 계산 오류.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IndicatorError {
    /// 잘못된 파라미터
    #[error("잘못된 파라미터: {0}")]
    InvalidParameter(String),

    /// 입력 열 길이 불일치
    #[error("입력 길이 불일치: high {high}, low {low}, close {close}")]
    LengthMismatch { high: usize, low: usize, close: usize },
}

/// 지표 계산 결과 타입.
pub type IndicatorResult<T> = Result<T, IndicatorError>;

pub(crate) fn ensure_period(period: usize, min: usize) -> IndicatorResult<()> {
    if period < min {
        return Err(IndicatorError::InvalidParameter(format!(
            "기간은 {} 이상이어야 합니다 (입력: {})",
            min, period
        )));
    }
    Ok(())
}

/// 통합 지표 엔진.
#[derive(Debug, Default)]
pub struct IndicatorEngine {
    trend: TrendIndicators,
    momentum: MomentumIndicators,
    volatility: VolatilityIndicators,
}

impl IndicatorEngine {
    /// 새로운 지표 엔진 생성.
    pub fn new() -> Self {
        Self::default()
    }

    // ==================== 추세 지표 ====================

    /// 지수 이동평균 (EMA) 계산.
    pub fn ema(
        &self,
        prices: &[Decimal],
        params: EmaParams,
    ) -> IndicatorResult<Vec<Option<Decimal>>> {
        self.trend.ema(prices, params)
    }

    /// MACD 계산.
    pub fn macd(&self, prices: &[Decimal], params: MacdParams) -> IndicatorResult<Vec<MacdResult>> {
        self.trend.macd(prices, params)
    }

    // ==================== 모멘텀 지표 ====================

    /// RSI 계산 (0-100).
    pub fn rsi(
        &self,
        prices: &[Decimal],
        params: RsiParams,
    ) -> IndicatorResult<Vec<Option<Decimal>>> {
        self.momentum.rsi(prices, params)
    }

    /// 모멘텀(변화율 %) 계산.
    pub fn momentum(
        &self,
        prices: &[Decimal],
        params: MomentumParams,
    ) -> IndicatorResult<Vec<Option<Decimal>>> {
        self.momentum.momentum(prices, params)
    }

    // ==================== 변동성 지표 ====================

    /// 볼린저 밴드 계산.
    pub fn bollinger_bands(
        &self,
        prices: &[Decimal],
        params: BollingerBandsParams,
    ) -> IndicatorResult<Vec<BollingerBandsResult>> {
        self.volatility.bollinger_bands(prices, params)
    }

    /// ATR 계산.
    pub fn atr(
        &self,
        high: &[Decimal],
        low: &[Decimal],
        close: &[Decimal],
        params: AtrParams,
    ) -> IndicatorResult<Vec<Option<Decimal>>> {
        self.volatility.atr(high, low, close, params)
    }
}
