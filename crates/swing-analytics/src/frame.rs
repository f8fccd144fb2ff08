//! 지표 열이 추가된 분봉 프레임.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::Serialize;
use swing_core::{Bar, Series, TradeSignal};
use tracing::debug;

use crate::indicators::{
    AtrParams, BollingerBandsParams, EmaParams, IndicatorEngine, IndicatorResult, MacdParams,
    MomentumParams, RsiParams,
};

/// 프레임 계산에 쓰는 지표 파라미터.
#[derive(Debug, Clone, Copy)]
pub struct IndicatorSettings {
    /// 단기 EMA (EMA10)
    pub ema_short: EmaParams,
    /// 중기 EMA (EMA20)
    pub ema_mid: EmaParams,
    /// 장기 EMA (EMA50)
    pub ema_long: EmaParams,
    /// RSI14
    pub rsi: RsiParams,
    /// MOM10
    pub momentum: MomentumParams,
    /// BB(20, 2.0)
    pub bollinger: BollingerBandsParams,
    /// MACD(12, 26, 9)
    pub macd: MacdParams,
    /// ATR14
    pub atr: AtrParams,
}

impl Default for IndicatorSettings {
    fn default() -> Self {
        Self {
            ema_short: EmaParams { period: 10 },
            ema_mid: EmaParams { period: 20 },
            ema_long: EmaParams { period: 50 },
            rsi: RsiParams::default(),
            momentum: MomentumParams::default(),
            bollinger: BollingerBandsParams::default(),
            macd: MacdParams::default(),
            atr: AtrParams::default(),
        }
    }
}

/// 프레임의 한 행 (분봉 + 지표 + 시그널).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndicatorRow {
    /// 원본 분봉
    pub bar: Bar,
    pub ema10: Option<Decimal>,
    pub ema20: Option<Decimal>,
    pub ema50: Option<Decimal>,
    pub rsi14: Option<Decimal>,
    pub mom10: Option<Decimal>,
    pub bb_mid: Option<Decimal>,
    pub bb_upper: Option<Decimal>,
    pub bb_lower: Option<Decimal>,
    pub macd: Option<Decimal>,
    pub macd_signal: Option<Decimal>,
    pub macd_hist: Option<Decimal>,
    pub atr14: Option<Decimal>,
    /// 추적 손절가 (시그널 엔진이 채움)
    pub trailing_stop: Option<Decimal>,
    /// 행 시그널 (시그널 엔진이 채우기 전에는 `InsufficientData`)
    pub signal: TradeSignal,
}

impl IndicatorRow {
    /// 분봉 시각.
    pub fn timestamp(&self) -> NaiveDateTime {
        self.bar.timestamp
    }

    /// 종가.
    pub fn close(&self) -> Decimal {
        self.bar.close
    }
}

/// 시계열에 지표 열을 붙인 프레임.
///
/// 행 순서는 원본 시계열 순서(시각 오름차순)와 같습니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndicatorFrame {
    rows: Vec<IndicatorRow>,
}

impl IndicatorFrame {
    /// 시계열로 모든 지표 열 계산.
    pub fn compute(series: &Series, settings: &IndicatorSettings) -> IndicatorResult<Self> {
        let engine = IndicatorEngine::new();
        let closes = series.closes();
        let highs = series.highs();
        let lows = series.lows();

        let ema10 = engine.ema(&closes, settings.ema_short)?;
        let ema20 = engine.ema(&closes, settings.ema_mid)?;
        let ema50 = engine.ema(&closes, settings.ema_long)?;
        let rsi14 = engine.rsi(&closes, settings.rsi)?;
        let mom10 = engine.momentum(&closes, settings.momentum)?;
        let bands = engine.bollinger_bands(&closes, settings.bollinger)?;
        let macd = engine.macd(&closes, settings.macd)?;
        let atr14 = engine.atr(&highs, &lows, &closes, settings.atr)?;

        let rows = series
            .iter()
            .enumerate()
            .map(|(i, bar)| IndicatorRow {
                bar: bar.clone(),
                ema10: ema10[i],
                ema20: ema20[i],
                ema50: ema50[i],
                rsi14: rsi14[i],
                mom10: mom10[i],
                bb_mid: bands[i].middle,
                bb_upper: bands[i].upper,
                bb_lower: bands[i].lower,
                macd: macd[i].macd,
                macd_signal: macd[i].signal,
                macd_hist: macd[i].histogram,
                atr14: atr14[i],
                trailing_stop: None,
                signal: TradeSignal::InsufficientData,
            })
            .collect::<Vec<_>>();

        debug!(rows = rows.len(), "지표 프레임 계산 완료");
        Ok(Self { rows })
    }

    /// 행 목록으로 프레임 생성.
    pub fn from_rows(rows: Vec<IndicatorRow>) -> Self {
        Self { rows }
    }

    /// 행 슬라이스.
    pub fn rows(&self) -> &[IndicatorRow] {
        &self.rows
    }

    /// 행 가변 반복자.
    pub fn rows_mut(&mut self) -> std::slice::IterMut<'_, IndicatorRow> {
        self.rows.iter_mut()
    }

    /// 행 개수.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// 비어 있는지 확인.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 마지막 행.
    pub fn last(&self) -> Option<&IndicatorRow> {
        self.rows.last()
    }
}
