//! 모멘텀 지표 (Momentum Indicators).
//!
//! - RSI (Relative Strength Index, 단순 이동평균 방식)
//! - Momentum (N기간 변화율)

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::{ensure_period, IndicatorResult};

/// RSI 파라미터.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RsiParams {
    /// RSI 기간 (기본: 14).
    pub period: usize,
}

impl Default for RsiParams {
    fn default() -> Self {
        Self { period: 14 }
    }
}

/// 모멘텀 파라미터.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MomentumParams {
    /// 비교 기간 (기본: 10).
    pub period: usize,
}

impl Default for MomentumParams {
    fn default() -> Self {
        Self { period: 10 }
    }
}

/// 모멘텀 지표 계산기.
#[derive(Debug, Default)]
pub struct MomentumIndicators;

impl MomentumIndicators {
    /// 새로운 모멘텀 계산기 생성.
    pub fn new() -> Self {
        Self
    }

    /// RSI 계산.
    ///
    /// RSI = 100 - 100 / (1 + 평균상승 / 평균하락)
    ///
    /// 평균은 최근 `period`개 가격 변화의 단순 평균입니다.
    /// 변화량이 `period`개 미만인 위치(인덱스 < period)는 `None`.
    /// 평균하락이 0이면 평균상승 > 0일 때 100, 둘 다 0이면(횡보) `None`.
    pub fn rsi(
        &self,
        prices: &[Decimal],
        params: RsiParams,
    ) -> IndicatorResult<Vec<Option<Decimal>>> {
        let period = params.period;
        ensure_period(period, 1)?;

        let mut result = vec![None; prices.len()];
        if prices.len() <= period {
            return Ok(result);
        }

        // deltas[i] = prices[i + 1] - prices[i]
        let deltas: Vec<Decimal> = prices.windows(2).map(|w| w[1] - w[0]).collect();
        let period_decimal = Decimal::from(period);

        for (i, slot) in result.iter_mut().enumerate().skip(period) {
            let window = &deltas[i - period..i];
            let gain: Decimal = window.iter().filter(|d| **d > Decimal::ZERO).sum();
            let loss: Decimal = window
                .iter()
                .filter(|d| **d < Decimal::ZERO)
                .map(|d| d.abs())
                .sum();

            let avg_gain = gain / period_decimal;
            let avg_loss = loss / period_decimal;

            *slot = if avg_loss == Decimal::ZERO {
                if avg_gain > Decimal::ZERO {
                    Some(dec!(100))
                } else {
                    None
                }
            } else {
                let rs = avg_gain / avg_loss;
                Some(dec!(100) - (dec!(100) / (Decimal::ONE + rs)))
            };
        }

        Ok(result)
    }

    /// 모멘텀(변화율 %) 계산.
    ///
    /// MOM = (close[t] - close[t - period]) / close[t - period] × 100
    ///
    /// 처음 `period`개 위치와 기준가가 0인 위치는 `None`.
    pub fn momentum(
        &self,
        prices: &[Decimal],
        params: MomentumParams,
    ) -> IndicatorResult<Vec<Option<Decimal>>> {
        let period = params.period;
        ensure_period(period, 1)?;

        Ok((0..prices.len())
            .map(|i| {
                if i < period {
                    return None;
                }
                let base = prices[i - period];
                if base.is_zero() {
                    None
                } else {
                    Some((prices[i] - base) / base * dec!(100))
                }
            })
            .collect())
    }
}
