//! 커서 기반 분봉 페이지를 하나의 시계열로 조립.
//!
//! KIS 해외주식 분봉 API는 한 번에 최대 120개 분봉을 최신 → 과거 방향으로 반환합니다.
//! 다음 페이지는 `NEXT` 토큰과 `KEYB`(직전 페이지 최소 시각 - 분봉 간격)로 요청합니다.
//!
//! 조립 규칙:
//! - 첫 호출은 빈 커서로 요청
//! - 전체 호출 수가 `max_pages`에 도달하거나 첫 실패 시 종료
//! - 빈 페이지를 받으면 더 이상 과거 데이터가 없는 것으로 보고 종료
//! - 종료 후 타임스탬프 기준 안정 정렬, 중복은 먼저 받은 레코드 우선

use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use rust_decimal::Decimal;
use serde::Deserialize;
use swing_core::{Bar, Series};
use tracing::{debug, error, info, warn};

use crate::connector::kis::{exchange_code, TokenState};
use crate::rate_limit::MinIntervalLimiter;
use crate::traits::MinutePageFetcher;
use crate::ExchangeError;

/// `KEYB` 파라미터 형식.
pub const KEYB_FORMAT: &str = "%Y%m%d%H%M%S";

/// 분봉 조회 요청 (페이지 간 공통 값).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinuteChartRequest {
    /// 거래소 코드 (예: "NAS")
    pub exchange_code: String,
    /// 종목 심볼 (예: "TSLA")
    pub symbol: String,
    /// 분봉 간격 (분)
    pub interval_minutes: u32,
}

impl MinuteChartRequest {
    /// 새 요청 생성.
    ///
    /// 거래소 코드와 심볼은 대문자로 정규화됩니다.
    ///
    /// # Errors
    /// 알 수 없는 거래소 코드, 빈 심볼, 0분 간격이면 `ExchangeError::InvalidRequest`.
    pub fn new(
        exchange_code: &str,
        symbol: &str,
        interval_minutes: u32,
    ) -> Result<Self, ExchangeError> {
        let exchange_code = exchange_code::validate(exchange_code)?;

        let symbol = symbol.trim().to_ascii_uppercase();
        if symbol.is_empty() {
            return Err(ExchangeError::InvalidRequest(
                "종목 심볼이 비어 있습니다".to_string(),
            ));
        }
        if interval_minutes == 0 {
            return Err(ExchangeError::InvalidRequest(
                "분봉 간격은 1분 이상이어야 합니다".to_string(),
            ));
        }

        Ok(Self {
            exchange_code: exchange_code.to_string(),
            symbol,
            interval_minutes,
        })
    }

    /// 분봉 간격.
    pub fn interval(&self) -> Duration {
        Duration::minutes(i64::from(self.interval_minutes))
    }
}

/// 페이지 조회 커서.
///
/// 첫 호출은 `NEXT`/`KEYB` 모두 비어 있는 초기 커서를 사용합니다.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageCursor {
    /// 직전 응답의 `output1.next`
    pub next_token: String,
    /// 다음 페이지의 기준 시각 (직전 페이지 최소 시각 - 간격)
    pub keyb: Option<NaiveDateTime>,
}

impl PageCursor {
    /// 첫 호출용 빈 커서.
    pub fn initial() -> Self {
        Self::default()
    }

    /// 첫 호출용 커서인지 확인.
    pub fn is_initial(&self) -> bool {
        self.next_token.is_empty() && self.keyb.is_none()
    }

    /// 페이지 결과로 다음 커서 계산.
    ///
    /// `keyb` = 페이지 최소 시각 - 간격, 분 단위로 절삭. 빈 페이지면 `keyb`는 없습니다.
    pub fn after_page(next_token: impl Into<String>, bars: &[Bar], interval: Duration) -> Self {
        let keyb = bars
            .iter()
            .map(|b| b.timestamp)
            .min()
            .map(|min_ts| truncate_to_minute(min_ts - interval));

        Self {
            next_token: next_token.into(),
            keyb,
        }
    }

    /// `KEYB` 쿼리 값 (`YYYYMMDDHHMMSS`, 없으면 빈 문자열).
    pub fn keyb_param(&self) -> String {
        self.keyb
            .map(|ts| ts.format(KEYB_FORMAT).to_string())
            .unwrap_or_default()
    }
}

fn truncate_to_minute(ts: NaiveDateTime) -> NaiveDateTime {
    ts.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(ts)
}

/// 분봉 원시 레코드 (`output2[]`).
///
/// 모든 값이 문자열로 전달되며, `to_bar()`에서 날짜/시각을 합쳐 타임스탬프로 만듭니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MinuteRecord {
    /// 현지 영업일자 (YYYYMMDD)
    #[serde(rename = "xymd", default)]
    pub date: String,
    /// 현지 시각 (HHMMSS)
    #[serde(rename = "xhms", default)]
    pub time: String,
    /// 시가
    #[serde(default)]
    pub open: String,
    /// 고가
    #[serde(default)]
    pub high: String,
    /// 저가
    #[serde(default)]
    pub low: String,
    /// 종가
    #[serde(rename = "last", default)]
    pub close: String,
    /// 체결량
    #[serde(rename = "evol", default)]
    pub volume: String,
    /// 체결대금
    #[serde(rename = "eamt", default)]
    pub amount: String,
}

impl MinuteRecord {
    /// 분봉으로 변환.
    ///
    /// 가격 필드가 비어 있거나 숫자가 아니면 에러. 체결량/대금의 빈 값은 0으로 봅니다.
    pub fn to_bar(&self) -> Result<Bar, ExchangeError> {
        let timestamp = combine_date_time(&self.date, &self.time)?;

        Ok(Bar::new(
            timestamp,
            parse_price("open", &self.open)?,
            parse_price("high", &self.high)?,
            parse_price("low", &self.low)?,
            parse_price("last", &self.close)?,
            parse_quantity("evol", &self.volume)?,
            parse_quantity("eamt", &self.amount)?,
        ))
    }
}

/// 영업일자(YYYYMMDD)와 시각(HHMMSS)을 하나의 타임스탬프로 결합.
pub fn combine_date_time(date: &str, time: &str) -> Result<NaiveDateTime, ExchangeError> {
    let d = NaiveDate::parse_from_str(date.trim(), "%Y%m%d")
        .map_err(|e| ExchangeError::ParseError(format!("잘못된 일자 '{}': {}", date, e)))?;
    let t = NaiveTime::parse_from_str(time.trim(), "%H%M%S")
        .map_err(|e| ExchangeError::ParseError(format!("잘못된 시각 '{}': {}", time, e)))?;
    Ok(d.and_time(t))
}

fn parse_price(field: &str, s: &str) -> Result<Decimal, ExchangeError> {
    let s = s.trim();
    s.parse::<Decimal>()
        .map_err(|_| ExchangeError::ParseError(format!("잘못된 {} 값: '{}'", field, s)))
}

fn parse_quantity(field: &str, s: &str) -> Result<Decimal, ExchangeError> {
    let s = s.trim();
    if s.is_empty() || s == "-" {
        return Ok(Decimal::ZERO);
    }
    parse_price(field, s)
}

/// 분봉 한 페이지 응답.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawPage {
    /// 다음 페이지 토큰 (`output1.next`)
    pub next_token: String,
    /// 분봉 레코드 (최신 → 과거 순서가 일반적)
    pub records: Vec<MinuteRecord>,
}

impl RawPage {
    /// 새 페이지 생성.
    pub fn new(next_token: impl Into<String>, records: Vec<MinuteRecord>) -> Self {
        Self {
            next_token: next_token.into(),
            records,
        }
    }
}

/// 조립 결과.
#[derive(Debug)]
pub struct AssembledSeries {
    /// 정렬/중복 제거된 시계열
    pub series: Series,
    /// 실제 fetch 호출 수 (실패 포함)
    pub calls_made: u32,
    /// 성공한 페이지 수
    pub pages_fetched: u32,
    /// 각 성공 페이지 뒤에 계산된 커서
    pub cursor_trail: Vec<PageCursor>,
    /// 변환에 실패해 버려진 레코드 수
    pub skipped_records: usize,
    /// 조회를 중단시킨 실패 (있다면)
    pub failure: Option<ExchangeError>,
}

impl AssembledSeries {
    /// 첫 호출이 실패해 아무것도 받지 못했는지 확인.
    pub fn first_call_failed(&self) -> bool {
        self.pages_fetched == 0 && self.failure.is_some()
    }

    /// 일부 페이지 이후 실패로 잘린 결과인지 확인.
    pub fn is_partial(&self) -> bool {
        self.pages_fetched > 0 && self.failure.is_some()
    }
}

/// 페이지 조회를 반복해 시계열을 조립하는 엔진.
pub struct PagedSeriesAssembler<F> {
    fetcher: F,
    limiter: Arc<MinIntervalLimiter>,
}

impl<F: MinutePageFetcher> PagedSeriesAssembler<F> {
    /// 기본 limiter(100ms)로 생성.
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            limiter: Arc::new(MinIntervalLimiter::default()),
        }
    }

    /// 토큰 발급 등 다른 호출과 공유할 limiter 설정.
    pub fn with_rate_limiter(mut self, limiter: Arc<MinIntervalLimiter>) -> Self {
        self.limiter = limiter;
        self
    }

    /// 최대 `max_pages`번 호출해 시계열 조립.
    ///
    /// 모든 페이지 호출에 같은 `token`을 사용하며, limiter는 각 호출 직전에만 대기합니다.
    /// 실패는 에러로 반환하지 않고 `AssembledSeries::failure`에 기록합니다.
    pub async fn assemble(
        &self,
        request: &MinuteChartRequest,
        token: &TokenState,
        max_pages: u32,
    ) -> AssembledSeries {
        let interval = request.interval();
        let mut cursor = PageCursor::initial();
        let mut collected: Vec<Bar> = Vec::new();
        let mut cursor_trail = Vec::new();
        let mut calls_made = 0u32;
        let mut pages_fetched = 0u32;
        let mut skipped_records = 0usize;
        let mut failure = None;

        for page_no in 1..=max_pages {
            self.limiter.acquire().await;
            calls_made += 1;

            let page = match self.fetcher.fetch_minute_page(request, &cursor, token).await {
                Ok(page) => page,
                Err(e) => {
                    if page_no == 1 {
                        error!(
                            symbol = %request.symbol,
                            error = %e,
                            "첫 페이지 조회 실패"
                        );
                    } else {
                        warn!(
                            symbol = %request.symbol,
                            page = page_no,
                            collected = collected.len(),
                            error = %e,
                            "페이지 조회 실패, 지금까지 받은 데이터로 진행"
                        );
                    }
                    failure = Some(e);
                    break;
                }
            };
            pages_fetched += 1;

            let mut bars = Vec::with_capacity(page.records.len());
            for record in &page.records {
                match record.to_bar() {
                    Ok(bar) => bars.push(bar),
                    Err(e) => {
                        skipped_records += 1;
                        debug!(error = %e, "분봉 레코드 변환 실패, 건너뜀");
                    }
                }
            }

            if bars.is_empty() {
                info!(
                    symbol = %request.symbol,
                    page = page_no,
                    "빈 페이지 수신, 조회 종료"
                );
                break;
            }

            let next = PageCursor::after_page(page.next_token, &bars, interval);
            debug!(
                page = page_no,
                bars = bars.len(),
                next = %next.next_token,
                keyb = %next.keyb_param(),
                "분봉 페이지 수신"
            );

            collected.extend(bars);
            cursor_trail.push(next.clone());
            cursor = next;
        }

        let raw_count = collected.len();
        let series = Series::from_unordered(collected);

        info!(
            symbol = %request.symbol,
            exchange = %request.exchange_code,
            calls = calls_made,
            pages = pages_fetched,
            raw = raw_count,
            bars = series.len(),
            "분봉 시계열 조립 완료"
        );

        AssembledSeries {
            series,
            calls_made,
            pages_fetched,
            cursor_trail,
            skipped_records,
            failure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn record(date: &str, time: &str, close: &str) -> MinuteRecord {
        MinuteRecord {
            date: date.to_string(),
            time: time.to_string(),
            open: close.to_string(),
            high: close.to_string(),
            low: close.to_string(),
            close: close.to_string(),
            volume: "100".to_string(),
            amount: String::new(),
        }
    }

    #[test]
    fn test_request_normalization() {
        let req = MinuteChartRequest::new("nas", " tsla ", 5).unwrap();
        assert_eq!(req.exchange_code, "NAS");
        assert_eq!(req.symbol, "TSLA");
        assert_eq!(req.interval(), Duration::minutes(5));

        assert!(MinuteChartRequest::new("NAS", "", 5).is_err());
        assert!(MinuteChartRequest::new("NAS", "TSLA", 0).is_err());
        assert!(MinuteChartRequest::new("XXX", "TSLA", 5).is_err());
    }

    #[test]
    fn test_record_to_bar() {
        let bar = record("20250110", "093500", "412.35").to_bar().unwrap();
        assert_eq!(bar.timestamp, ts("2025-01-10 09:35:00"));
        assert_eq!(bar.close, dec!(412.35));
        assert_eq!(bar.volume, dec!(100));
        assert_eq!(bar.amount, Decimal::ZERO);
    }

    #[test]
    fn test_record_with_bad_price_rejected() {
        let mut rec = record("20250110", "093500", "412.35");
        rec.close = String::new();
        assert!(rec.to_bar().is_err());

        let rec = record("2025011", "093500", "1");
        assert!(rec.to_bar().is_err());
    }

    #[test]
    fn test_cursor_after_page() {
        let bars = vec![
            record("20250110", "100000", "1").to_bar().unwrap(),
            record("20250110", "093000", "1").to_bar().unwrap(),
            record("20250110", "094500", "1").to_bar().unwrap(),
        ];

        let cursor = PageCursor::after_page("tok", &bars, Duration::minutes(5));
        assert_eq!(cursor.next_token, "tok");
        assert_eq!(cursor.keyb, Some(ts("2025-01-10 09:25:00")));
        assert_eq!(cursor.keyb_param(), "20250110092500");
    }

    #[test]
    fn test_cursor_truncates_seconds() {
        let bars = vec![record("20250110", "093017", "1").to_bar().unwrap()];
        let cursor = PageCursor::after_page("", &bars, Duration::minutes(1));
        assert_eq!(cursor.keyb, Some(ts("2025-01-10 09:29:00")));
    }

    #[test]
    fn test_initial_cursor() {
        let cursor = PageCursor::initial();
        assert!(cursor.is_initial());
        assert_eq!(cursor.keyb_param(), "");

        let empty = PageCursor::after_page("", &[], Duration::minutes(1));
        assert!(empty.keyb.is_none());
    }
}
