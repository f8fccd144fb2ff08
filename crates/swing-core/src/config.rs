//! 설정 관리.
//!
//! 이 모듈은 애플리케이션 설정을 정의하고 관리합니다.
//! 기본값 → TOML 파일(선택) → `SWING__` 접두사 환경 변수 순으로 덮어씁니다.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 환경 변수 접두사 (예: `SWING__FETCH__MAX_PAGES=8`).
pub const ENV_PREFIX: &str = "SWING";

/// 애플리케이션 설정.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// 분봉 조회 설정
    pub fetch: FetchConfig,
    /// 시그널/자금관리 설정
    pub strategy: StrategyConfig,
    /// 로깅 설정
    pub logging: LoggingConfig,
    /// 결과 저장 설정
    pub output: OutputConfig,
}

/// 분봉 조회 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FetchConfig {
    /// 반복 조회 횟수 (첫 호출 포함, 1회당 최대 120봉)
    pub max_pages: u32,
    /// 연속 API 호출 사이 최소 간격 (밀리초)
    pub min_call_interval_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_pages: 4,
            min_call_interval_ms: 100,
        }
    }
}

/// 시그널 및 자금관리 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StrategyConfig {
    /// 트레일링 스탑 ATR 배수
    pub atr_multiplier: Decimal,
    /// 자금관리 기준 자본금
    pub capital: Decimal,
    /// 거래당 허용 손실 비율 (자본 대비)
    pub risk_fraction: Decimal,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            atr_multiplier: dec!(2.0),
            capital: dec!(10000000),
            risk_fraction: dec!(0.01),
        }
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
    /// 조회 span 진입/종료 이벤트 출력
    pub span_events: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "compact".to_string(),
            span_events: false,
        }
    }
}

/// 결과 저장 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    /// CSV 저장 디렉토리
    pub dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: ".".to_string(),
        }
    }
}

impl AppConfig {
    /// 파일(선택)과 환경 변수에서 설정을 로드합니다.
    ///
    /// 파일이 주어지지 않으면 기본값과 환경 변수만 사용합니다.
    pub fn load(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder()
            .set_default("fetch.max_pages", 4)?
            .set_default("fetch.min_call_interval_ms", 100)?;

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// 로드된 설정의 값 범위를 검증합니다.
    pub fn validate(&self) -> Result<(), String> {
        self.fetch.validate()?;
        self.strategy.validate()
    }
}

impl FetchConfig {
    /// 조회 횟수는 1 이상.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_pages == 0 {
            return Err("fetch.max_pages는 1 이상이어야 합니다".to_string());
        }
        Ok(())
    }
}

impl StrategyConfig {
    /// 자본금 > 0, 리스크 비율 (0, 1], ATR 배수 >= 0.
    pub fn validate(&self) -> Result<(), String> {
        if self.capital <= Decimal::ZERO {
            return Err("strategy.capital은 0보다 커야 합니다".to_string());
        }
        if self.risk_fraction <= Decimal::ZERO || self.risk_fraction > Decimal::ONE {
            return Err("strategy.risk_fraction은 (0, 1] 범위여야 합니다".to_string());
        }
        if self.atr_multiplier < Decimal::ZERO {
            return Err("strategy.atr_multiplier는 음수일 수 없습니다".to_string());
        }
        Ok(())
    }
}
