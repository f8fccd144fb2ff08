//! 외부 전송 계층 경계 trait.
//!
//! 조립 엔진과 오케스트레이터는 이 trait만 알고, 실제 HTTP 구현은
//! `connector::kis`가 제공합니다. 테스트에서는 mock 구현으로 대체합니다.

use async_trait::async_trait;

use crate::connector::kis::TokenState;
use crate::historical::{MinuteChartRequest, PageCursor, RawPage};
use crate::ExchangeError;

/// 거래소 작업을 위한 Result 타입.
pub type ExchangeResult<T> = Result<T, ExchangeError>;

/// 접근 토큰 제공자.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// 유효한 접근 토큰 반환 (필요시 발급).
    async fn get_token(&self) -> ExchangeResult<TokenState>;
}

/// 분봉 한 페이지 조회 기능.
#[async_trait]
pub trait MinutePageFetcher: Send + Sync {
    /// 커서가 가리키는 구간의 분봉 페이지 조회.
    ///
    /// 첫 호출에는 `PageCursor::initial()`을 전달합니다.
    /// `token`은 조회 전에 발급받은 토큰이며, 구현은 토큰을 다시 발급하지 않습니다.
    async fn fetch_minute_page(
        &self,
        request: &MinuteChartRequest,
        cursor: &PageCursor,
        token: &TokenState,
    ) -> ExchangeResult<RawPage>;
}

#[async_trait]
impl<T: TokenProvider + ?Sized> TokenProvider for std::sync::Arc<T> {
    async fn get_token(&self) -> ExchangeResult<TokenState> {
        (**self).get_token().await
    }
}

#[async_trait]
impl<T: MinutePageFetcher + ?Sized> MinutePageFetcher for std::sync::Arc<T> {
    async fn fetch_minute_page(
        &self,
        request: &MinuteChartRequest,
        cursor: &PageCursor,
        token: &TokenState,
    ) -> ExchangeResult<RawPage> {
        (**self).fetch_minute_page(request, cursor, token).await
    }
}
