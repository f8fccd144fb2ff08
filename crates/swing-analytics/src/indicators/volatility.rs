//! 변동성 지표 (Volatility Indicators).
//!
//! - Bollinger Bands (볼린저 밴드, 표본 표준편차)
//! - ATR (Average True Range, 단순 이동평균)

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::{ensure_period, IndicatorError, IndicatorResult};

/// 볼린저 밴드 파라미터.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BollingerBandsParams {
    /// 이동평균 기간 (기본: 20).
    pub period: usize,
    /// 표준편차 배수 (기본: 2.0).
    pub std_dev_multiplier: Decimal,
}

impl Default for BollingerBandsParams {
    fn default() -> Self {
        Self {
            period: 20,
            std_dev_multiplier: dec!(2.0),
        }
    }
}

/// 볼린저 밴드 결과.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BollingerBandsResult {
    /// 상단 밴드 (MA + k × σ).
    pub upper: Option<Decimal>,
    /// 중간 밴드 (이동평균).
    pub middle: Option<Decimal>,
    /// 하단 밴드 (MA - k × σ).
    pub lower: Option<Decimal>,
}

/// ATR 파라미터.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AtrParams {
    /// ATR 기간 (기본: 14).
    pub period: usize,
}

impl Default for AtrParams {
    fn default() -> Self {
        Self { period: 14 }
    }
}

/// 변동성 지표 계산기.
#[derive(Debug, Default)]
pub struct VolatilityIndicators;

impl VolatilityIndicators {
    /// 새로운 변동성 지표 계산기 생성.
    pub fn new() -> Self {
        Self
    }

    /// 볼린저 밴드 계산.
    ///
    /// 중간 = period 이동평균, 상/하단 = 중간 ± k × 표본 표준편차(n-1).
    /// 처음 period-1개 위치는 `None`.
    pub fn bollinger_bands(
        &self,
        prices: &[Decimal],
        params: BollingerBandsParams,
    ) -> IndicatorResult<Vec<BollingerBandsResult>> {
        let period = params.period;
        ensure_period(period, 2)?;

        let period_decimal = Decimal::from(period);
        let dof = Decimal::from(period - 1);

        Ok((0..prices.len())
            .map(|i| {
                if i + 1 < period {
                    return BollingerBandsResult::default();
                }
                let window = &prices[i + 1 - period..=i];
                let mean = window.iter().sum::<Decimal>() / period_decimal;
                let variance = window
                    .iter()
                    .map(|p| (*p - mean) * (*p - mean))
                    .sum::<Decimal>()
                    / dof;
                let band = sqrt_decimal(variance) * params.std_dev_multiplier;

                BollingerBandsResult {
                    upper: Some(mean + band),
                    middle: Some(mean),
                    lower: Some(mean - band),
                }
            })
            .collect())
    }

    /// ATR 계산.
    ///
    /// TR[t] = max(고가-저가, |고가-전일종가|, |저가-전일종가|), TR[0] = 고가-저가.
    /// ATR = TR의 period 단순 이동평균. 처음 period-1개 위치는 `None`.
    pub fn atr(
        &self,
        high: &[Decimal],
        low: &[Decimal],
        close: &[Decimal],
        params: AtrParams,
    ) -> IndicatorResult<Vec<Option<Decimal>>> {
        let period = params.period;
        ensure_period(period, 1)?;

        if high.len() != low.len() || low.len() != close.len() {
            return Err(IndicatorError::LengthMismatch {
                high: high.len(),
                low: low.len(),
                close: close.len(),
            });
        }

        let true_ranges = true_range(high, low, close);
        let period_decimal = Decimal::from(period);

        Ok((0..true_ranges.len())
            .map(|i| {
                if i + 1 < period {
                    None
                } else {
                    let sum: Decimal = true_ranges[i + 1 - period..=i].iter().sum();
                    Some(sum / period_decimal)
                }
            })
            .collect())
    }
}

/// True Range 열.
fn true_range(high: &[Decimal], low: &[Decimal], close: &[Decimal]) -> Vec<Decimal> {
    (0..high.len())
        .map(|i| {
            let hl = high[i] - low[i];
            if i == 0 {
                return hl;
            }
            let hc = (high[i] - close[i - 1]).abs();
            let lc = (low[i] - close[i - 1]).abs();
            hl.max(hc).max(lc)
        })
        .collect()
}

/// Decimal 제곱근 (Newton-Raphson).
fn sqrt_decimal(value: Decimal) -> Decimal {
    if value <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    let tolerance = dec!(0.0000000000001);
    let two = dec!(2);
    let mut x = if value > Decimal::ONE { value / two } else { Decimal::ONE };

    for _ in 0..100 {
        let next = (x + value / x) / two;
        if (next - x).abs() < tolerance {
            return next;
        }
        x = next;
    }

    x
}
