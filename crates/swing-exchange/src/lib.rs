//! 거래소 연결 및 분봉 시계열 조립.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - 한국투자증권(KIS) OAuth 토큰 발급 및 해외주식 분봉 조회 커넥터
//! - `TokenProvider` / `MinutePageFetcher` trait: 외부 전송 계층 경계
//! - 연속 호출 간 최소 간격을 보장하는 rate limiter
//! - 커서 기반 페이지 조회를 하나의 정렬된 시계열로 조립하는 `PagedSeriesAssembler`

pub mod connector;
pub mod error;
pub mod historical;
pub mod rate_limit;
pub mod traits;

pub use connector::kis::{KisConfig, KisEnvironment, KisOAuth, KisOverseasClient, TokenState};
pub use error::*;
pub use historical::{
    AssembledSeries, MinuteChartRequest, MinuteRecord, PageCursor, PagedSeriesAssembler, RawPage,
};
pub use rate_limit::MinIntervalLimiter;
pub use traits::*;
