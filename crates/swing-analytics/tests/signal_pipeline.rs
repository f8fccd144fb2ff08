//! 시계열 → 지표 프레임 → 시그널 흐름 통합 테스트.

use chrono::{Duration, NaiveDateTime};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use swing_analytics::indicators::{MomentumIndicators, RsiParams};
use swing_analytics::{IndicatorFrame, IndicatorSettings, SignalEngine};
use swing_core::{Bar, Series, TradeSignal};

fn series_from_closes(closes: &[Decimal]) -> Series {
    let start = NaiveDateTime::parse_from_str("2025-01-10 09:30:00", "%Y-%m-%d %H:%M:%S").unwrap();
    let bars = closes
        .iter()
        .enumerate()
        .map(|(i, &c)| {
            Bar::new(
                start + Duration::minutes(i as i64),
                c,
                c + dec!(0.5),
                c - dec!(0.5),
                c,
                dec!(100),
                c * dec!(100),
            )
        })
        .collect();
    Series::try_from_ordered(bars).unwrap()
}

/// +2, -1 반복: 완만한 상승 추세, RSI ≈ 66.7
fn zigzag_uptrend(n: usize) -> Vec<Decimal> {
    let mut px = dec!(100);
    let mut closes = vec![px];
    for i in 1..n {
        px += if i % 2 == 1 { dec!(2) } else { dec!(-1) };
        closes.push(px);
    }
    closes
}

fn run(closes: &[Decimal]) -> IndicatorFrame {
    let frame = IndicatorFrame::compute(&series_from_closes(closes), &IndicatorSettings::default())
        .unwrap();
    SignalEngine::default().compute(frame)
}

#[test]
fn test_uptrend_emits_buy_on_latest_bar() {
    let frame = run(&zigzag_uptrend(60));
    let latest = SignalEngine::default().get_latest_signal(&frame);

    let last = frame.last().unwrap();
    let rsi = last.rsi14.unwrap();
    assert!(rsi > dec!(66) && rsi < dec!(67), "RSI: {}", rsi);
    assert_eq!(latest.signal, TradeSignal::Buy);
    assert_eq!(
        latest.trailing_stop.unwrap(),
        last.close() - last.atr14.unwrap() * dec!(2)
    );
}

#[test]
fn test_downtrend_emits_sell() {
    let closes: Vec<Decimal> = zigzag_uptrend(60).into_iter().map(|c| dec!(300) - c).collect();
    let frame = run(&closes);
    assert_eq!(frame.last().unwrap().signal, TradeSignal::Sell);
}

#[test]
fn test_warmup_rows_are_insufficient() {
    let frame = run(&zigzag_uptrend(30));

    // RSI14는 인덱스 14부터 정의
    for row in &frame.rows()[..14] {
        assert_eq!(row.signal, TradeSignal::InsufficientData);
    }
    assert_ne!(frame.rows()[14].signal, TradeSignal::InsufficientData);
}

#[test]
fn test_short_series_has_no_actionable_signal() {
    let frame = run(&zigzag_uptrend(5));
    assert_eq!(frame.len(), 5);
    assert!(frame.rows().iter().all(|r| r.signal == TradeSignal::InsufficientData));
    assert!(frame.rows().iter().all(|r| r.trailing_stop.is_none()));
}

#[test]
fn test_recompute_is_identical() {
    let closes = zigzag_uptrend(80);
    assert_eq!(run(&closes), run(&closes));
}

proptest! {
    #[test]
    fn prop_rsi_stays_in_range(raw in prop::collection::vec(1u32..10_000, 15..80)) {
        let prices: Vec<Decimal> = raw.into_iter().map(|v| Decimal::new(v as i64, 2)).collect();
        let rsi = MomentumIndicators::new().rsi(&prices, RsiParams::default()).unwrap();

        prop_assert_eq!(rsi.len(), prices.len());
        for value in rsi.into_iter().flatten() {
            prop_assert!(value >= Decimal::ZERO && value <= dec!(100));
        }
    }
}
