//! # Swing Analytics
//!
//! 분봉 시계열에 대한 기술적 지표 계산과 스윙 매매 시그널 산출.
//!
//! - `indicators` - EMA, RSI, 모멘텀, 볼린저 밴드, MACD, ATR
//! - `frame` - 시계열에 지표 열을 붙인 `IndicatorFrame`
//! - `signal` - 행 단위 BUY/SELL/HOLD 판정과 추적 손절가

pub mod frame;
pub mod indicators;
pub mod signal;

pub use frame::{IndicatorFrame, IndicatorRow, IndicatorSettings};
pub use indicators::{IndicatorEngine, IndicatorError, IndicatorResult};
pub use signal::{LatestSignal, SignalEngine, RSI_OVERBOUGHT};
