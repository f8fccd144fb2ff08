//! 페이지 조립 엔진 통합 테스트 (mock fetcher).

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, NaiveDateTime, Utc};
use rust_decimal_macros::dec;
use swing_exchange::{
    ExchangeError, ExchangeResult, MinIntervalLimiter, MinuteChartRequest, MinutePageFetcher,
    MinuteRecord, PageCursor, PagedSeriesAssembler, RawPage, TokenState,
};
use tokio::sync::Mutex;

/// 미리 준비된 응답을 순서대로 돌려주고 받은 커서를 기록하는 fetcher.
struct ScriptedFetcher {
    responses: Mutex<VecDeque<ExchangeResult<RawPage>>>,
    seen: Mutex<Vec<PageCursor>>,
    tokens: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    fn new(responses: Vec<ExchangeResult<RawPage>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            seen: Mutex::new(Vec::new()),
            tokens: Mutex::new(Vec::new()),
        }
    }

    async fn seen(&self) -> Vec<PageCursor> {
        self.seen.lock().await.clone()
    }
}

#[async_trait]
impl MinutePageFetcher for ScriptedFetcher {
    async fn fetch_minute_page(
        &self,
        _request: &MinuteChartRequest,
        cursor: &PageCursor,
        token: &TokenState,
    ) -> ExchangeResult<RawPage> {
        self.seen.lock().await.push(cursor.clone());
        self.tokens.lock().await.push(token.access_token.clone());
        self.responses
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Ok(RawPage::default()))
    }
}

fn ts(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
}

fn rec(at: &str, close: &str) -> MinuteRecord {
    let t = ts(at);
    MinuteRecord {
        date: t.format("%Y%m%d").to_string(),
        time: t.format("%H%M%S").to_string(),
        open: close.to_string(),
        high: close.to_string(),
        low: close.to_string(),
        close: close.to_string(),
        volume: "10".to_string(),
        amount: "100".to_string(),
    }
}

/// `start`부터 과거 방향으로 `count`개, `step`분 간격의 레코드 (최신 → 과거).
fn page_descending(start: &str, count: i64, step: i64) -> Vec<MinuteRecord> {
    let start = ts(start);
    (0..count)
        .map(|i| {
            let t = start - Duration::minutes(i * step);
            rec(&t.format("%Y-%m-%d %H:%M").to_string(), "100")
        })
        .collect()
}

fn request(interval: u32) -> MinuteChartRequest {
    MinuteChartRequest::new("NAS", "TSLA", interval).unwrap()
}

fn token() -> TokenState {
    TokenState::new("tok-run", "Bearer", Utc::now() + Duration::hours(20))
}

fn assembler(fetcher: Arc<ScriptedFetcher>) -> PagedSeriesAssembler<Arc<ScriptedFetcher>> {
    PagedSeriesAssembler::new(fetcher)
        .with_rate_limiter(Arc::new(MinIntervalLimiter::from_millis(0)))
}

#[tokio::test]
async fn test_keyb_is_one_interval_before_page_minimum() {
    let fetcher = Arc::new(ScriptedFetcher::new(vec![
        Ok(RawPage::new("1", page_descending("2025-01-10 12:00", 4, 5))),
        Ok(RawPage::new("1", page_descending("2025-01-10 11:40", 4, 5))),
        Ok(RawPage::new("1", page_descending("2025-01-10 11:20", 4, 5))),
    ]));

    let result = assembler(fetcher.clone()).assemble(&request(5), &token(), 3).await;

    let seen = fetcher.seen().await;
    assert_eq!(seen.len(), 3);
    assert!(seen[0].is_initial(), "첫 호출은 빈 커서");
    assert_eq!(seen[1].keyb, Some(ts("2025-01-10 11:40")));
    assert_eq!(seen[1].next_token, "1");
    assert_eq!(seen[2].keyb, Some(ts("2025-01-10 11:20")));

    // 이전 페이지 최소 시각 - 간격
    let minima = [ts("2025-01-10 11:45"), ts("2025-01-10 11:25")];
    for (cursor, min_ts) in seen[1..].iter().zip(minima) {
        assert_eq!(cursor.keyb, Some(min_ts - Duration::minutes(5)));
    }

    assert_eq!(result.series.len(), 12);
    assert!(result.series.is_strictly_ordered());
    assert_eq!(result.cursor_trail.len(), 3);
}

#[tokio::test]
async fn test_first_call_failure_returns_empty_series() {
    let fetcher = Arc::new(ScriptedFetcher::new(vec![Err(ExchangeError::NetworkError(
        "connection refused".to_string(),
    ))]));

    let result = assembler(fetcher.clone()).assemble(&request(1), &token(), 4).await;

    assert!(result.series.is_empty());
    assert!(result.first_call_failed());
    assert!(!result.is_partial());
    assert_eq!(result.calls_made, 1);
    assert_eq!(fetcher.seen().await.len(), 1, "실패 후 재시도 없음");
}

#[tokio::test]
async fn test_mid_run_failure_keeps_partial_result() {
    let fetcher = Arc::new(ScriptedFetcher::new(vec![
        Ok(RawPage::new("1", page_descending("2025-01-10 12:00", 3, 1))),
        Err(ExchangeError::ApiError {
            code: 500,
            message: "boom".to_string(),
        }),
        Ok(RawPage::new("1", page_descending("2025-01-10 11:00", 3, 1))),
    ]));

    let result = assembler(fetcher.clone()).assemble(&request(1), &token(), 4).await;

    assert!(result.is_partial());
    assert_eq!(result.pages_fetched, 1);
    assert_eq!(result.calls_made, 2);
    assert_eq!(result.series.len(), 3);
    assert_eq!(fetcher.seen().await.len(), 2);
}

#[tokio::test]
async fn test_overlapping_pages_keep_first_fetched_record() {
    let mut second = page_descending("2025-01-10 11:58", 3, 1);
    // 첫 페이지 최소 시각(11:58)과 겹치는 레코드, 다른 가격
    second.insert(0, rec("2025-01-10 11:58", "999"));

    let fetcher = Arc::new(ScriptedFetcher::new(vec![
        Ok(RawPage::new("1", page_descending("2025-01-10 12:00", 3, 1))),
        Ok(RawPage::new("1", second)),
    ]));

    let result = assembler(fetcher).assemble(&request(1), &token(), 2).await;

    let dupes: Vec<_> = result
        .series
        .iter()
        .filter(|b| b.timestamp == ts("2025-01-10 11:58"))
        .collect();
    assert_eq!(dupes.len(), 1);
    assert_eq!(dupes[0].close, dec!(100), "먼저 받은 레코드가 남아야 함");
    assert!(result.series.is_strictly_ordered());
}

#[tokio::test]
async fn test_call_budget_includes_first_call() {
    let fetcher = Arc::new(ScriptedFetcher::new(
        (0..10)
            .map(|i| {
                let start = ts("2025-01-10 12:00") - Duration::minutes(i * 10);
                Ok(RawPage::new(
                    "1",
                    page_descending(&start.format("%Y-%m-%d %H:%M").to_string(), 10, 1),
                ))
            })
            .collect(),
    ));

    let result = assembler(fetcher.clone()).assemble(&request(1), &token(), 4).await;

    assert_eq!(fetcher.seen().await.len(), 4);
    assert_eq!(result.calls_made, 4);
    assert_eq!(result.series.len(), 40);
    assert!(result.failure.is_none());
}

#[tokio::test]
async fn test_empty_page_stops_pagination() {
    let fetcher = Arc::new(ScriptedFetcher::new(vec![
        Ok(RawPage::new("1", page_descending("2025-01-10 12:00", 5, 1))),
        Ok(RawPage::new("", Vec::new())),
    ]));

    let result = assembler(fetcher.clone()).assemble(&request(1), &token(), 4).await;

    assert_eq!(fetcher.seen().await.len(), 2);
    assert_eq!(result.series.len(), 5);
    assert!(result.failure.is_none());
}

#[tokio::test]
async fn test_unparseable_records_are_skipped() {
    let mut records = page_descending("2025-01-10 12:00", 3, 1);
    records[1].close = "-".to_string();

    let fetcher = Arc::new(ScriptedFetcher::new(vec![Ok(RawPage::new("", records))]));
    let result = assembler(fetcher).assemble(&request(1), &token(), 1).await;

    assert_eq!(result.series.len(), 2);
    assert_eq!(result.skipped_records, 1);
}

#[tokio::test(start_paused = true)]
async fn test_calls_are_spaced_by_limiter() {
    let fetcher = Arc::new(ScriptedFetcher::new(vec![
        Ok(RawPage::new("1", page_descending("2025-01-10 12:00", 2, 1))),
        Ok(RawPage::new("1", page_descending("2025-01-10 11:58", 2, 1))),
        Ok(RawPage::new("1", page_descending("2025-01-10 11:56", 2, 1))),
    ]));
    let assembler = PagedSeriesAssembler::new(fetcher)
        .with_rate_limiter(Arc::new(MinIntervalLimiter::from_millis(100)));

    let start = tokio::time::Instant::now();
    assembler.assemble(&request(1), &token(), 3).await;

    assert!(start.elapsed() >= std::time::Duration::from_millis(200));
}

#[tokio::test]
async fn test_every_page_call_uses_the_issued_token() {
    let fetcher = Arc::new(ScriptedFetcher::new(vec![
        Ok(RawPage::new("1", page_descending("2025-01-10 12:00", 2, 1))),
        Ok(RawPage::new("1", page_descending("2025-01-10 11:58", 2, 1))),
    ]));

    assembler(fetcher.clone()).assemble(&request(1), &token(), 3).await;

    let tokens = fetcher.tokens.lock().await.clone();
    assert_eq!(tokens, vec!["tok-run"; 3]);
}
