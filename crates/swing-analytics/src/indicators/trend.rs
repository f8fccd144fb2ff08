//! 추세 지표 (Trend Indicators).
//!
//! - EMA (Exponential Moving Average)
//! - MACD (Moving Average Convergence Divergence)

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::{ensure_period, IndicatorResult};

/// EMA 파라미터.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EmaParams {
    /// 이동평균 기간.
    pub period: usize,
}

impl Default for EmaParams {
    fn default() -> Self {
        Self { period: 20 }
    }
}

/// MACD 파라미터.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MacdParams {
    /// 단기 EMA 기간 (기본: 12).
    pub fast_period: usize,
    /// 장기 EMA 기간 (기본: 26).
    pub slow_period: usize,
    /// 시그널 라인 기간 (기본: 9).
    pub signal_period: usize,
}

impl Default for MacdParams {
    fn default() -> Self {
        Self {
            fast_period: 12,
            slow_period: 26,
            signal_period: 9,
        }
    }
}

/// MACD 결과.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacdResult {
    /// MACD 라인 (단기 EMA - 장기 EMA).
    pub macd: Option<Decimal>,
    /// 시그널 라인 (MACD의 EMA).
    pub signal: Option<Decimal>,
    /// 히스토그램 (MACD - 시그널).
    pub histogram: Option<Decimal>,
}

/// 추세 지표 계산기.
#[derive(Debug, Default)]
pub struct TrendIndicators;

impl TrendIndicators {
    /// 새로운 추세 지표 계산기 생성.
    pub fn new() -> Self {
        Self
    }

    /// 지수 이동평균 (EMA) 계산.
    ///
    /// EMA = (현재가 × k) + (이전 EMA × (1 - k)), k = 2 / (period + 1)
    ///
    /// 첫 EMA는 첫 가격 자체이므로 모든 위치에서 값이 정의됩니다.
    pub fn ema(
        &self,
        prices: &[Decimal],
        params: EmaParams,
    ) -> IndicatorResult<Vec<Option<Decimal>>> {
        ensure_period(params.period, 1)?;
        Ok(ema_values(prices, params.period).into_iter().map(Some).collect())
    }

    /// MACD 계산.
    ///
    /// MACD 라인 = 단기 EMA - 장기 EMA
    /// 시그널 라인 = MACD 라인의 EMA
    /// 히스토그램 = MACD 라인 - 시그널 라인
    pub fn macd(&self, prices: &[Decimal], params: MacdParams) -> IndicatorResult<Vec<MacdResult>> {
        ensure_period(params.fast_period, 1)?;
        ensure_period(params.slow_period, 1)?;
        ensure_period(params.signal_period, 1)?;

        let fast = ema_values(prices, params.fast_period);
        let slow = ema_values(prices, params.slow_period);

        let macd_line: Vec<Decimal> = fast.iter().zip(&slow).map(|(f, s)| f - s).collect();
        let signal_line = ema_values(&macd_line, params.signal_period);

        Ok(macd_line
            .iter()
            .zip(&signal_line)
            .map(|(&m, &s)| MacdResult {
                macd: Some(m),
                signal: Some(s),
                histogram: Some(m - s),
            })
            .collect())
    }
}

fn ema_values(prices: &[Decimal], period: usize) -> Vec<Decimal> {
    let multiplier = dec!(2) / Decimal::from(period + 1);
    let mut result = Vec::with_capacity(prices.len());

    let mut prev: Option<Decimal> = None;
    for &price in prices {
        let ema = match prev {
            None => price,
            Some(p) => (price * multiplier) + (p * (Decimal::ONE - multiplier)),
        };
        result.push(ema);
        prev = Some(ema);
    }

    result
}
