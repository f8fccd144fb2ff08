//! # Swing Risk
//!
//! ATR 기반 손절가와 고정 비율 리스크로 매수 수량을 계산합니다.

pub mod position_sizing;

pub use position_sizing::{PositionSizer, SizingConfig, SizingResult};
