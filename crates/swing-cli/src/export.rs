//! 분봉/시그널 CSV 저장.
//!
//! 열 순서는 고정이며 정의되지 않은 지표 값은 빈 칸으로 기록합니다.

use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use swing_analytics::IndicatorFrame;
use swing_core::{Series, SwingError, SwingResult};
use tracing::info;

/// CSV 시각 형식.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 지표 값 기록 소수 자릿수.
const INDICATOR_DP: u32 = 6;

/// 분봉 CSV 열.
pub const BAR_COLUMNS: [&str; 7] = ["datetime", "open", "high", "low", "close", "volume", "amount"];

/// 시그널 CSV 열.
pub const SIGNAL_COLUMNS: [&str; 21] = [
    "datetime",
    "open",
    "high",
    "low",
    "close",
    "volume",
    "amount",
    "EMA10",
    "EMA20",
    "EMA50",
    "RSI14",
    "MOM10",
    "BB_MID",
    "BB_UPPER",
    "BB_LOWER",
    "MACD",
    "MACD_SIGNAL",
    "MACD_HIST",
    "ATR14",
    "trailing_stop",
    "signal",
];

/// 조회 분봉 파일 경로 (`{SYMBOL}_fetched_data.csv`).
pub fn fetched_data_path(dir: &Path, symbol: &str) -> PathBuf {
    dir.join(format!("{}_fetched_data.csv", symbol))
}

/// 시그널 파일 경로 (`{SYMBOL}_{N}min_signals.csv`).
pub fn signals_path(dir: &Path, symbol: &str, interval_minutes: u32) -> PathBuf {
    dir.join(format!("{}_{}min_signals.csv", symbol, interval_minutes))
}

fn csv_error(path: &Path, err: csv::Error) -> SwingError {
    SwingError::Io(format!("{}: {}", path.display(), err))
}

fn open_writer(path: &Path) -> SwingResult<csv::Writer<std::fs::File>> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    csv::Writer::from_path(path).map_err(|e| csv_error(path, e))
}

fn indicator_cell(value: Option<Decimal>) -> String {
    value
        .map(|v| v.round_dp(INDICATOR_DP).normalize().to_string())
        .unwrap_or_default()
}

/// 분봉 시계열 저장. 기록한 행 수를 반환합니다.
pub fn write_bars_csv(path: &Path, series: &Series) -> SwingResult<usize> {
    let mut wtr = open_writer(path)?;
    wtr.write_record(BAR_COLUMNS)
        .map_err(|e| csv_error(path, e))?;

    for bar in series {
        wtr.write_record([
            bar.timestamp.format(DATETIME_FORMAT).to_string(),
            bar.open.to_string(),
            bar.high.to_string(),
            bar.low.to_string(),
            bar.close.to_string(),
            bar.volume.to_string(),
            bar.amount.to_string(),
        ])
        .map_err(|e| csv_error(path, e))?;
    }

    wtr.flush()?;
    info!(rows = series.len(), path = %path.display(), "분봉 CSV 저장");
    Ok(series.len())
}

/// 지표/시그널 프레임 저장. 기록한 행 수를 반환합니다.
pub fn write_frame_csv(path: &Path, frame: &IndicatorFrame) -> SwingResult<usize> {
    let mut wtr = open_writer(path)?;
    wtr.write_record(SIGNAL_COLUMNS)
        .map_err(|e| csv_error(path, e))?;

    for row in frame.rows() {
        let bar = &row.bar;
        wtr.write_record([
            bar.timestamp.format(DATETIME_FORMAT).to_string(),
            bar.open.to_string(),
            bar.high.to_string(),
            bar.low.to_string(),
            bar.close.to_string(),
            bar.volume.to_string(),
            bar.amount.to_string(),
            indicator_cell(row.ema10),
            indicator_cell(row.ema20),
            indicator_cell(row.ema50),
            indicator_cell(row.rsi14),
            indicator_cell(row.mom10),
            indicator_cell(row.bb_mid),
            indicator_cell(row.bb_upper),
            indicator_cell(row.bb_lower),
            indicator_cell(row.macd),
            indicator_cell(row.macd_signal),
            indicator_cell(row.macd_hist),
            indicator_cell(row.atr14),
            indicator_cell(row.trailing_stop),
            row.signal.as_str().to_string(),
        ])
        .map_err(|e| csv_error(path, e))?;
    }

    wtr.flush()?;
    info!(rows = frame.len(), path = %path.display(), "시그널 CSV 저장");
    Ok(frame.len())
}
