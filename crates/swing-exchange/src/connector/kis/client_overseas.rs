//! KIS 해외주식 분봉 시세 클라이언트.
//!
//! `GET /uapi/overseas-price/v1/quotations/inquire-time-itemchartprice` (tr_id `HHDFS76950200`)
//! 한 번 호출에 최대 120개 분봉을 반환합니다.

use super::auth::{KisOAuth, TokenState};
use super::tr_id;
use crate::historical::{MinuteChartRequest, MinuteRecord, PageCursor, RawPage};
use crate::traits::{ExchangeResult, MinutePageFetcher};
use crate::ExchangeError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, error};

/// 한 페이지 요청 레코드 수 (API 최대값).
pub const PAGE_SIZE: u32 = 120;

const MINUTE_CHART_PATH: &str = "/uapi/overseas-price/v1/quotations/inquire-time-itemchartprice";

/// KIS 해외주식 분봉 응답.
#[derive(Debug, Clone, Deserialize)]
struct KisMinuteChartResponse {
    rt_cd: String,
    #[serde(default)]
    msg_cd: String,
    #[serde(default)]
    msg1: String,
    #[serde(default)]
    output1: Option<MinuteChartSummary>,
    #[serde(default)]
    output2: Vec<MinuteRecord>,
}

/// 분봉 응답 요약부 (`output1`).
#[derive(Debug, Clone, Default, Deserialize)]
struct MinuteChartSummary {
    /// 다음 조회 토큰
    #[serde(default)]
    next: String,
    /// 추가 데이터 존재 여부 ("1" = 있음)
    #[serde(default)]
    more: String,
}

/// KIS 해외주식 분봉 클라이언트.
///
/// 헤더 구성에 필요한 앱키 정보는 공유된 `KisOAuth`에서 가져옵니다.
pub struct KisOverseasClient {
    oauth: Arc<KisOAuth>,
    client: Client,
}

impl KisOverseasClient {
    /// 공유된 OAuth로 클라이언트 생성.
    ///
    /// # Errors
    /// HTTP 클라이언트 생성에 실패하면 `ExchangeError::NetworkError`를 반환합니다.
    pub fn with_shared_oauth(oauth: Arc<KisOAuth>) -> Result<Self, ExchangeError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(oauth.config().timeout_secs))
            .build()
            .map_err(|e| ExchangeError::NetworkError(format!("HTTP client 생성 실패: {}", e)))?;

        Ok(Self { oauth, client })
    }

        /// 해외주식 분봉 한 페이지 조회.
    ///
    /// # 인자
    /// * `request` - 거래소/심볼/간격
    /// * `cursor` - 첫 호출은 `PageCursor::initial()`, 이후는 직전 페이지에서 계산한 커서
    /// * `token` - 조회 전에 발급받은 접근 토큰 (여기서는 재발급하지 않음)
    pub async fn get_minute_chart(
        &self,
        request: &MinuteChartRequest,
        cursor: &PageCursor,
        token: &TokenState,
    ) -> Result<RawPage, ExchangeError> {
        let url = format!("{}{}", self.oauth.config().rest_base_url(), MINUTE_CHART_PATH);
        let headers = self.oauth.build_headers(token, tr_id::OVERSEAS_MINUTE_CHART)?;

        let nmin = request.interval_minutes.to_string();
        let nrec = PAGE_SIZE.to_string();
        let keyb = cursor.keyb_param();

        let response = self
            .client
            .get(&url)
            .headers(headers)
            .query(&[
                ("AUTH", ""),
                ("EXCD", request.exchange_code.as_str()),
                ("SYMB", request.symbol.as_str()),
                ("NMIN", nmin.as_str()),
                ("PINC", "1"), // 전일 포함
                ("NEXT", cursor.next_token.as_str()),
                ("NREC", nrec.as_str()),
                ("FILL", ""),
                ("KEYB", keyb.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status == reqwest::StatusCode::UNAUTHORIZED {
            error!("Minute chart unauthorized: {}", body);
            return Err(ExchangeError::Unauthorized(body));
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ExchangeError::RateLimited);
        }
        if !status.is_success() {
            error!("Minute chart inquiry failed: {} - {}", status, body);
            return Err(ExchangeError::ApiError {
                code: status.as_u16() as i32,
                message: body,
            });
        }

        let resp: KisMinuteChartResponse = serde_json::from_str(&body).map_err(|e| {
            ExchangeError::ParseError(format!("Failed to parse minute chart response: {}", e))
        })?;

        if resp.rt_cd != "0" {
            error!(
                "Minute chart API error: {} ({}) - {}",
                resp.rt_cd, resp.msg_cd, resp.msg1
            );
            return Err(ExchangeError::ApiError {
                code: resp.msg_cd.parse().unwrap_or(-1),
                message: resp.msg1,
            });
        }

        let summary = resp.output1.unwrap_or_default();
        debug!(
            symbol = %request.symbol,
            records = resp.output2.len(),
            next = %summary.next,
            more = %summary.more,
            "Minute chart page received"
        );

        Ok(RawPage::new(summary.next, resp.output2))
    }
}

#[async_trait]
impl MinutePageFetcher for KisOverseasClient {
    async fn fetch_minute_page(
        &self,
        request: &MinuteChartRequest,
        cursor: &PageCursor,
        token: &TokenState,
    ) -> ExchangeResult<RawPage> {
        self.get_minute_chart(request, cursor, token).await
    }
}
