//! 매매 시그널 유형.

use serde::{Deserialize, Serialize};

/// 분봉 한 행에 대한 범주형 매매 시그널.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeSignal {
    /// 매수
    Buy,
    /// 매도
    Sell,
    /// 보유
    Hold,
    /// 지표 워밍업 구간이라 판단 불가
    InsufficientData,
    /// 데이터 없음 (빈 프레임)
    NoData,
}

impl TradeSignal {
    /// CSV/로그 출력용 문자열.
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeSignal::Buy => "BUY",
            TradeSignal::Sell => "SELL",
            TradeSignal::Hold => "HOLD",
            TradeSignal::InsufficientData => "INSUFFICIENT_DATA",
            TradeSignal::NoData => "NO_DATA",
        }
    }
}

impl std::fmt::Display for TradeSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TradeSignal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "BUY" => Ok(TradeSignal::Buy),
            "SELL" => Ok(TradeSignal::Sell),
            "HOLD" => Ok(TradeSignal::Hold),
            "INSUFFICIENT_DATA" => Ok(TradeSignal::InsufficientData),
            "NO_DATA" => Ok(TradeSignal::NoData),
            _ => Err(format!("Unknown signal: {}", s)),
        }
    }
}
