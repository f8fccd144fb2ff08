//! 스윙 매매 시그널 엔진.
//!
//! 행마다 다음 우선순위로 시그널을 판정합니다:
//! 1. BUY: EMA10 > EMA20, RSI14 < 70, MACD > 시그널, MOM10 > 0 모두 충족
//! 2. SELL: EMA10 < EMA20, RSI14 > 70, MACD < 시그널, MOM10 < 0 중 하나라도 충족
//! 3. HOLD: 그 외
//!
//! 판정에 쓰는 값 중 하나라도 `None`이면 `INSUFFICIENT_DATA`입니다.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use swing_core::TradeSignal;
use tracing::debug;

use crate::frame::{IndicatorFrame, IndicatorRow};

/// RSI 과매수 경계.
pub const RSI_OVERBOUGHT: Decimal = dec!(70);

/// 최신 시그널 요약.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LatestSignal {
    /// 마지막 분봉 시각 (빈 프레임이면 `None`)
    pub timestamp: Option<NaiveDateTime>,
    /// 시그널
    pub signal: TradeSignal,
    /// 마지막 종가
    pub close: Option<Decimal>,
    /// 마지막 ATR14
    pub atr: Option<Decimal>,
    /// 마지막 추적 손절가
    pub trailing_stop: Option<Decimal>,
}

impl LatestSignal {
    fn no_data() -> Self {
        Self {
            timestamp: None,
            signal: TradeSignal::NoData,
            close: None,
            atr: None,
            trailing_stop: None,
        }
    }
}

/// 시그널 엔진.
#[derive(Debug, Clone, Copy)]
pub struct SignalEngine {
    atr_multiplier: Decimal,
}

impl Default for SignalEngine {
    fn default() -> Self {
        Self::new(dec!(2.0))
    }
}

impl SignalEngine {
    /// ATR 배수를 지정해 생성.
    pub fn new(atr_multiplier: Decimal) -> Self {
        Self { atr_multiplier }
    }

    /// 프레임 전체에 추적 손절가와 시그널을 채웁니다.
    pub fn compute(&self, mut frame: IndicatorFrame) -> IndicatorFrame {
        let mut counts = [0usize; 4];
        for row in frame.rows_mut() {
            row.trailing_stop = self.trailing_stop(row);
            row.signal = self.evaluate(row);
            match row.signal {
                TradeSignal::Buy => counts[0] += 1,
                TradeSignal::Sell => counts[1] += 1,
                TradeSignal::Hold => counts[2] += 1,
                _ => counts[3] += 1,
            }
        }

        debug!(
            buy = counts[0],
            sell = counts[1],
            hold = counts[2],
            insufficient = counts[3],
            "시그널 계산 완료"
        );
        frame
    }

    /// 추적 손절가 = 종가 - ATR14 × 배수.
    pub fn trailing_stop(&self, row: &IndicatorRow) -> Option<Decimal> {
        row.atr14.map(|atr| row.close() - atr * self.atr_multiplier)
    }

    /// 한 행의 시그널 판정.
    pub fn evaluate(&self, row: &IndicatorRow) -> TradeSignal {
        let (Some(ema10), Some(ema20), Some(rsi), Some(macd), Some(macd_signal), Some(mom)) = (
            row.ema10,
            row.ema20,
            row.rsi14,
            row.macd,
            row.macd_signal,
            row.mom10,
        ) else {
            return TradeSignal::InsufficientData;
        };

        let bullish =
            ema10 > ema20 && rsi < RSI_OVERBOUGHT && macd > macd_signal && mom > Decimal::ZERO;
        let bearish =
            ema10 < ema20 || rsi > RSI_OVERBOUGHT || macd < macd_signal || mom < Decimal::ZERO;

        if bullish {
            TradeSignal::Buy
        } else if bearish {
            TradeSignal::Sell
        } else {
            TradeSignal::Hold
        }
    }

    /// 마지막 행의 시그널 (빈 프레임이면 `NO_DATA`).
    pub fn get_latest_signal(&self, frame: &IndicatorFrame) -> LatestSignal {
        match frame.last() {
            Some(row) => LatestSignal {
                timestamp: Some(row.timestamp()),
                signal: row.signal,
                close: Some(row.close()),
                atr: row.atr14,
                trailing_stop: row.trailing_stop,
            },
            None => LatestSignal::no_data(),
        }
    }
}
