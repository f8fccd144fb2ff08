//! 파이프라인 종단 테스트 (mock 전송 계층 및 mockito KIS 서버).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, NaiveDateTime, Utc};
use clap::Parser;
use rust_decimal_macros::dec;
use swing_analytics::{IndicatorFrame, SignalEngine};
use swing_cli::commands::analyze::{execute, AnalyzeArgs};
use swing_cli::commands::TargetArgs;
use swing_cli::{Pipeline, PipelineOptions};
use swing_core::{AppConfig, SwingError, TradeSignal};
use swing_exchange::{
    ExchangeError, ExchangeResult, KisConfig, KisOAuth, KisOverseasClient, MinuteChartRequest,
    MinutePageFetcher, PageCursor, RawPage, TokenProvider, TokenState,
};

const APP_KEY: &str = "PSabcdefghijklmnopqrstuvwxyz012345";
const APP_SECRET: &str = "secretabcdefghijklmnopqrstuvwxyz0123456789";

struct StaticToken {
    fail: bool,
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn get_token(&self) -> ExchangeResult<TokenState> {
        if self.fail {
            return Err(ExchangeError::Unauthorized("invalid app key".to_string()));
        }
        Ok(TokenState::new("tok", "Bearer", Utc::now() + Duration::hours(24)))
    }
}

/// 항상 실패하는 fetcher (호출 횟수 기록).
#[derive(Default)]
struct FailingFetcher {
    calls: AtomicUsize,
}

#[async_trait]
impl MinutePageFetcher for FailingFetcher {
    async fn fetch_minute_page(
        &self,
        _request: &MinuteChartRequest,
        _cursor: &PageCursor,
        _token: &TokenState,
    ) -> ExchangeResult<RawPage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ExchangeError::NetworkError("connection reset".to_string()))
    }
}

fn options() -> PipelineOptions {
    PipelineOptions {
        min_call_interval_ms: 0,
        ..PipelineOptions::default()
    }
}

fn analyze_args(symbol: &str, interval: u32, output_dir: &std::path::Path) -> AnalyzeArgs {
    AnalyzeArgs {
        target: TargetArgs {
            exchange: "NAS".to_string(),
            symbol: symbol.to_string(),
            interval,
            pages: None,
            output_dir: Some(output_dir.to_path_buf()),
        },
        capital: None,
    }
}

#[tokio::test]
async fn test_auth_failure_stops_before_fetch() {
    let fetcher = Arc::new(FailingFetcher::default());
    let pipeline = Pipeline::new(StaticToken { fail: true }, Arc::clone(&fetcher), options());
    let request = MinuteChartRequest::new("NAS", "TSLA", 5).unwrap();

    let err = pipeline.run(&request).await.unwrap_err();

    assert!(matches!(err, SwingError::AuthFailure(_)));
    assert!(err.is_fatal());
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_first_fetch_failure_reports_empty_result() {
    let fetcher = Arc::new(FailingFetcher::default());
    let pipeline = Pipeline::new(StaticToken { fail: false }, Arc::clone(&fetcher), options());
    let request = MinuteChartRequest::new("NAS", "TSLA", 5).unwrap();

    let assembled = pipeline.fetch(&request).await.unwrap();
    assert!(assembled.series.is_empty());
    assert!(assembled.first_call_failed());
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);

    let err = pipeline.analyze(&assembled.series).unwrap_err();
    assert!(err.is_empty_result());

    let latest = SignalEngine::default().get_latest_signal(&IndicatorFrame::default());
    assert_eq!(latest.signal, TradeSignal::NoData);
}

#[tokio::test]
async fn test_execute_with_empty_result_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::new(
        StaticToken { fail: false },
        FailingFetcher::default(),
        options(),
    );

    execute(&pipeline, &AppConfig::default(), &analyze_args("TSLA", 5, dir.path()))
        .await
        .unwrap();

    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_zero_pages_override_is_rejected_before_any_call() {
    let dir = tempfile::tempdir().unwrap();
    let mut args = analyze_args("TSLA", 5, dir.path());
    args.target.pages = Some(0);

    let fetcher = Arc::new(FailingFetcher::default());
    let options = args.options(&AppConfig::default());
    assert!(options.validate().is_err());

    let pipeline = Pipeline::new(StaticToken { fail: false }, Arc::clone(&fetcher), options);
    let err = execute(&pipeline, &AppConfig::default(), &args)
        .await
        .unwrap_err();

    match err.downcast_ref::<SwingError>() {
        Some(SwingError::InvalidInput(msg)) => assert!(msg.contains("max_pages")),
        other => panic!("InvalidInput 예상, 실제: {:?}", other),
    }
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_non_positive_capital_override_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut args = analyze_args("TSLA", 5, dir.path());
    args.capital = Some(dec!(-5));

    let fetcher = Arc::new(FailingFetcher::default());
    let pipeline = Pipeline::new(
        StaticToken { fail: false },
        Arc::clone(&fetcher),
        args.options(&AppConfig::default()),
    );
    let request = args.target.to_request().unwrap();

    let err = pipeline.fetch(&request).await.unwrap_err();

    assert!(matches!(err, SwingError::InvalidInput(ref msg) if msg.contains("capital")));
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
}

#[derive(Parser)]
struct AnalyzeCli {
    #[command(flatten)]
    args: AnalyzeArgs,
}

#[test]
fn test_pages_flag_requires_at_least_one_call() {
    assert!(AnalyzeCli::try_parse_from(["swing", "-s", "TSLA", "--pages", "0"]).is_err());

    let cli = AnalyzeCli::try_parse_from(["swing", "-s", "TSLA", "--pages", "2"]).unwrap();
    assert_eq!(cli.args.target.pages, Some(2));
    assert_eq!(cli.args.target.exchange, "NAS");
}

/// +2, -1 반복 상승 추세 레코드 (최신 → 과거 순서, API 응답과 동일).
fn zigzag_records(count: usize) -> Vec<serde_json::Value> {
    let start = NaiveDateTime::parse_from_str("2025-01-10 09:30:00", "%Y-%m-%d %H:%M:%S").unwrap();
    let mut px = dec!(100);
    let mut rows = Vec::with_capacity(count);
    for i in 0..count {
        if i > 0 {
            px += if i % 2 == 1 { dec!(2) } else { dec!(-1) };
        }
        let ts = start + Duration::minutes(i as i64);
        rows.push(serde_json::json!({
            "tymd": ts.format("%Y%m%d").to_string(),
            "xymd": ts.format("%Y%m%d").to_string(),
            "xhms": ts.format("%H%M%S").to_string(),
            "open": px.to_string(),
            "high": px.to_string(),
            "low": px.to_string(),
            "last": px.to_string(),
            "evol": "100",
            "eamt": (px * dec!(100)).to_string(),
        }));
    }
    rows.reverse();
    rows
}

#[tokio::test]
async fn test_end_to_end_against_mock_kis_server() {
    let mut server = mockito::Server::new_async().await;
    let _token = server
        .mock("POST", "/oauth2/tokenP")
        .with_status(200)
        .with_body(
            serde_json::json!({
                "access_token": "tok-e2e",
                "token_type": "Bearer",
                "expires_in": 86400,
                "access_token_token_expired": "2099-12-31 23:59:59",
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let path = "/uapi/overseas-price/v1/quotations/inquire-time-itemchartprice";
    let first_page = server
        .mock("GET", path)
        .match_query(mockito::Matcher::UrlEncoded("NEXT".into(), "".into()))
        .with_status(200)
        .with_body(
            serde_json::json!({
                "rt_cd": "0",
                "msg_cd": "MCA00000",
                "msg1": "정상처리 되었습니다.",
                "output1": { "next": "1", "more": "1" },
                "output2": zigzag_records(60),
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;
    let next_page = server
        .mock("GET", path)
        .match_query(mockito::Matcher::AllOf(vec![
            mockito::Matcher::UrlEncoded("NEXT".into(), "1".into()),
            mockito::Matcher::UrlEncoded("KEYB".into(), "20250110092900".into()),
        ]))
        .with_status(200)
        .with_body(r#"{"rt_cd":"0","msg_cd":"","msg1":"","output1":{"next":""},"output2":[]}"#)
        .expect(1)
        .create_async()
        .await;

    let config = KisConfig::new(APP_KEY, APP_SECRET).with_base_url(server.url());
    let oauth = Arc::new(KisOAuth::new(config).unwrap());
    let client = KisOverseasClient::with_shared_oauth(Arc::clone(&oauth)).unwrap();
    let pipeline = Pipeline::new(oauth, client, options());

    let dir = tempfile::tempdir().unwrap();
    let args = analyze_args("TSLA", 1, dir.path());

    let request = args.target.to_request().unwrap();
    let report = pipeline.run(&request).await.unwrap();

    assert_eq!(report.frame.len(), 60);
    assert_eq!(report.latest.signal, TradeSignal::Buy);
    assert_eq!(report.latest.close, Some(dec!(131)));
    assert_eq!(report.latest.atr, Some(dec!(1.5)));

    let sizing = report.sizing.expect("BUY 시그널이면 수량 권고가 있어야 함");
    assert_eq!(sizing.stop_loss, dec!(128));
    assert_eq!(sizing.quantity, 33333);

    first_page.assert_async().await;
    next_page.assert_async().await;

    // 같은 서버로 CSV 저장까지 (토큰은 캐시 재사용)
    execute(&pipeline, &AppConfig::default(), &args).await.unwrap();

    assert!(dir.path().join("TSLA_fetched_data.csv").exists());
    assert!(dir.path().join("TSLA_1min_signals.csv").exists());
}
