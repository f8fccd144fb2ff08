//! 한국투자증권(KIS) Open API 커넥터.
//!
//! 해외주식 분봉 조회에 필요한 부분만 제공합니다:
//! - OAuth 2.0 접근 토큰 발급 (`auth`)
//! - 해외주식 분봉 시세 조회 (`client_overseas`)

pub mod auth;
pub mod client_overseas;
pub mod config;

pub use auth::{KisOAuth, TokenState};
pub use client_overseas::KisOverseasClient;
pub use config::{KisConfig, KisEnvironment};

/// KIS API 거래 ID(tr_id).
pub mod tr_id {
    /// 해외주식 분봉 조회
    pub const OVERSEAS_MINUTE_CHART: &str = "HHDFS76950200";
}

/// 해외주식 시세 조회용 거래소 코드.
pub mod exchange_code {
    use crate::ExchangeError;

    /// 나스닥
    pub const NASDAQ: &str = "NAS";
    /// 뉴욕증권거래소
    pub const NYSE: &str = "NYS";
    /// 아멕스
    pub const AMEX: &str = "AMS";
    /// 홍콩
    pub const HONG_KONG: &str = "HKS";
    /// 도쿄
    pub const TOKYO: &str = "TSE";
    /// 상해
    pub const SHANGHAI: &str = "SHS";
    /// 심천
    pub const SHENZHEN: &str = "SZS";
    /// 호치민
    pub const HO_CHI_MINH: &str = "HSX";
    /// 하노이
    pub const HANOI: &str = "HNX";
    /// 나스닥 (주간거래)
    pub const NASDAQ_DAY: &str = "BAQ";
    /// 뉴욕 (주간거래)
    pub const NYSE_DAY: &str = "BAY";
    /// 아멕스 (주간거래)
    pub const AMEX_DAY: &str = "BAA";

    /// 허용되는 모든 거래소 코드.
    pub const ALL: &[&str] = &[
        NASDAQ,
        NYSE,
        AMEX,
        HONG_KONG,
        TOKYO,
        SHANGHAI,
        SHENZHEN,
        HO_CHI_MINH,
        HANOI,
        NASDAQ_DAY,
        NYSE_DAY,
        AMEX_DAY,
    ];

    /// 거래소 코드 검증 및 정규화 (대소문자 무시).
    ///
    /// # Errors
    /// 알 수 없는 코드면 `ExchangeError::InvalidRequest`.
    pub fn validate(code: &str) -> Result<&'static str, ExchangeError> {
        let upper = code.trim().to_ascii_uppercase();
        ALL.iter()
            .copied()
            .find(|c| *c == upper)
            .ok_or_else(|| {
                ExchangeError::InvalidRequest(format!(
                    "지원하지 않는 거래소 코드: '{}' (허용: {})",
                    code,
                    ALL.join(", ")
                ))
            })
    }

}
