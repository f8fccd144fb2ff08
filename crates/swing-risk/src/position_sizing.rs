//! 포지션 크기 계산.
//!
//! 손절가 = 현재가 - ATR × 배수(기본 2)
//! 수량 = floor(자본 × 리스크 비율 / (현재가 - 손절가)), 최소 1주
//!
//! 손절가가 0 이하이거나 주당 손실이 0 이하이면 1주를 반환합니다.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// 포지션 사이저 설정.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SizingConfig {
    /// 손절 거리 ATR 배수 (기본: 2)
    pub stop_atr_multiple: Decimal,
    /// 최소 수량 (기본: 1)
    pub min_quantity: u64,
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            stop_atr_multiple: dec!(2),
            min_quantity: 1,
        }
    }
}

/// 포지션 크기 계산 결과.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SizingResult {
    /// 손절가
    pub stop_loss: Decimal,
    /// 주당 손실 (현재가 - 손절가)
    pub loss_per_share: Decimal,
    /// 허용 최대 손실 (자본 × 리스크 비율)
    pub max_loss: Decimal,
    /// 권장 수량
    pub quantity: u64,
}

/// 포지션 사이저.
#[derive(Debug, Clone, Default)]
pub struct PositionSizer {
    config: SizingConfig,
}

impl PositionSizer {
    /// 주어진 설정으로 새 포지션 사이저를 생성.
    pub fn new(config: SizingConfig) -> Self {
        Self { config }
    }

    /// 매수 수량 계산.
    ///
    /// # 인자
    /// * `capital` - 총 자본
    /// * `price` - 현재가
    /// * `atr_value` - 현재 ATR
    /// * `risk_fraction` - 거래당 리스크 비율 (예: 0.01 = 1%)
    pub fn size(
        &self,
        capital: Decimal,
        price: Decimal,
        atr_value: Decimal,
        risk_fraction: Decimal,
    ) -> SizingResult {
        let stop_loss = price - self.config.stop_atr_multiple * atr_value;
        let loss_per_share = price - stop_loss;
        let max_loss = capital * risk_fraction;
        let min_quantity = self.config.min_quantity;

        let quantity = if stop_loss <= Decimal::ZERO || loss_per_share <= Decimal::ZERO {
            min_quantity
        } else {
            (max_loss / loss_per_share)
                .floor()
                .to_u64()
                .unwrap_or(0)
                .max(min_quantity)
        };

        debug!(
            %price,
            %atr_value,
            %stop_loss,
            %loss_per_share,
            quantity,
            "포지션 크기 계산"
        );

        SizingResult {
            stop_loss,
            loss_per_share,
            max_loss,
            quantity,
        }
    }
}
