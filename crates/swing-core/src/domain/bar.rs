//! 분봉 데이터와 시계열.
//!
//! - `Bar` - 분봉 OHLCV 레코드 (거래대금 포함)
//! - `Series` - 타임스탬프 오름차순, 중복 없는 분봉 시계열

use crate::error::SwingError;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 분봉 OHLCV 레코드.
///
/// 타임스탬프는 거래소 현지 시각이며 시계열 내에서 유일한 정렬 키입니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bar {
    /// 분봉 시각 (거래소 현지 시각)
    pub timestamp: NaiveDateTime,
    /// 시가
    pub open: Decimal,
    /// 고가
    pub high: Decimal,
    /// 저가
    pub low: Decimal,
    /// 종가 (API의 `last` 필드)
    pub close: Decimal,
    /// 체결량
    pub volume: Decimal,
    /// 체결대금
    pub amount: Decimal,
}

impl Bar {
    /// 새 분봉을 생성합니다.
    pub fn new(
        timestamp: NaiveDateTime,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
        volume: Decimal,
        amount: Decimal,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
            amount,
        }
    }
}

/// 타임스탬프 오름차순으로 정렬되고 중복이 없는 분봉 시계열.
///
/// 불변식: 모든 i에 대해 `bars[i].timestamp < bars[i + 1].timestamp`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Series {
    bars: Vec<Bar>,
}

impl Series {
    /// 빈 시계열을 생성합니다.
    pub fn empty() -> Self {
        Self::default()
    }

    /// 정렬되지 않은 분봉 목록으로 시계열을 만듭니다.
    ///
    /// 타임스탬프 기준 안정 정렬 후 같은 타임스탬프는 첫 번째 레코드만 남깁니다.
    /// 안정 정렬이므로 "먼저 입력된 레코드 우선" 규칙이 됩니다.
    pub fn from_unordered(mut bars: Vec<Bar>) -> Self {
        bars.sort_by_key(|bar| bar.timestamp);
        bars.dedup_by_key(|bar| bar.timestamp);
        Self { bars }
    }

    /// 이미 정렬된 분봉 목록으로 시계열을 만듭니다.
    ///
    /// # Errors
    /// 순서가 어긋나거나 중복 타임스탬프가 있으면 `SwingError::InvalidInput`.
    pub fn try_from_ordered(bars: Vec<Bar>) -> Result<Self, SwingError> {
        if let Some(pos) = bars
            .windows(2)
            .position(|w| w[0].timestamp >= w[1].timestamp)
        {
            return Err(SwingError::InvalidInput(format!(
                "시계열 순서 위반: index {} ({}) >= index {} ({})",
                pos,
                bars[pos].timestamp,
                pos + 1,
                bars[pos + 1].timestamp
            )));
        }
        Ok(Self { bars })
    }

    /// 분봉 개수.
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// 비어 있는지 확인.
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// 분봉 슬라이스.
    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    /// 분봉 반복자.
    pub fn iter(&self) -> std::slice::Iter<'_, Bar> {
        self.bars.iter()
    }

    /// 가장 오래된 분봉.
    pub fn first(&self) -> Option<&Bar> {
        self.bars.first()
    }

    /// 가장 최근 분봉.
    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    /// 종가 열.
    pub fn closes(&self) -> Vec<Decimal> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// 고가 열.
    pub fn highs(&self) -> Vec<Decimal> {
        self.bars.iter().map(|b| b.high).collect()
    }

    /// 저가 열.
    pub fn lows(&self) -> Vec<Decimal> {
        self.bars.iter().map(|b| b.low).collect()
    }

    /// 타임스탬프가 엄격히 증가하는지 확인.
    pub fn is_strictly_ordered(&self) -> bool {
        self.bars.windows(2).all(|w| w[0].timestamp < w[1].timestamp)
    }
}

impl<'a> IntoIterator for &'a Series {
    type Item = &'a Bar;
    type IntoIter = std::slice::Iter<'a, Bar>;

    fn into_iter(self) -> Self::IntoIter {
        self.bars.iter()
    }
}
