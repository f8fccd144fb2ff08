//! 한국투자증권 (KIS) API 설정.
//!
//! KIS API는 app_key와 app_secret을 사용한 OAuth 2.0 인증이 필요합니다.
//! 설정은 생성 후 변경되지 않으며 토큰 제공자와 시세 클라이언트 생성자에 전달됩니다.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// KIS API 환경 유형.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KisEnvironment {
    /// 실전투자
    #[default]
    Real,
    /// 모의투자
    Paper,
}

impl KisEnvironment {
    /// 이 환경의 REST API 기본 URL 반환.
    pub fn rest_base_url(&self) -> &'static str {
        match self {
            KisEnvironment::Real => "https://openapi.koreainvestment.com:9443",
            KisEnvironment::Paper => "https://openapivts.koreainvestment.com:29443",
        }
    }

    /// 문자열에서 파싱.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "real" | "prod" | "live" => Some(KisEnvironment::Real),
            "paper" | "mock" | "test" | "vts" => Some(KisEnvironment::Paper),
            _ => None,
        }
    }
}

/// KIS API 설정.
#[derive(Debug, Clone, Deserialize)]
pub struct KisConfig {
    /// 앱키
    pub app_key: String,
    /// 앱시크릿
    pub app_secret: SecretString,
    /// 환경 (실전/모의)
    #[serde(default)]
    pub environment: KisEnvironment,
    /// REST 기본 URL 재정의 (프록시, 테스트 서버 등)
    #[serde(default)]
    pub base_url: Option<String>,
    /// 요청 타임아웃 (초)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// 개인 고객 헤더(`custtype: P`) 포함 여부
    #[serde(default = "default_personalized")]
    pub personalized: bool,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_personalized() -> bool {
    true
}

impl KisConfig {
    /// 새로운 KIS 설정 생성.
    pub fn new(app_key: impl Into<String>, app_secret: impl Into<String>) -> Self {
        Self {
            app_key: app_key.into(),
            app_secret: SecretString::from(app_secret.into()),
            environment: KisEnvironment::default(),
            base_url: None,
            timeout_secs: default_timeout_secs(),
            personalized: default_personalized(),
        }
    }

    /// 환경 설정.
    pub fn with_environment(mut self, env: KisEnvironment) -> Self {
        self.environment = env;
        self
    }

    /// REST 기본 URL 재정의.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// 환경 변수에서 설정 생성.
    ///
    /// # 환경 변수
    /// - `KIS_APP_KEY`, `KIS_APP_SECRET` (필수)
    /// - `KIS_ENV`: "real" | "paper" (기본값: real)
    /// - `KIS_BASE_URL`: REST 기본 URL 재정의 (선택)
    ///
    /// 필수 값이 없으면 `None`을 반환합니다. `.env` 로드는 호출자 책임입니다.
    pub fn from_env() -> Option<Self> {
        let app_key = std::env::var("KIS_APP_KEY").ok()?;
        let app_secret = std::env::var("KIS_APP_SECRET").ok()?;
        let environment = std::env::var("KIS_ENV")
            .ok()
            .and_then(|s| KisEnvironment::parse(&s))
            .unwrap_or_default();

        let mut config = Self::new(app_key, app_secret).with_environment(environment);
        if let Ok(url) = std::env::var("KIS_BASE_URL") {
            if !url.trim().is_empty() {
                config = config.with_base_url(url.trim());
            }
        }
        Some(config)
    }

    /// REST API 기본 URL 반환.
    pub fn rest_base_url(&self) -> &str {
        match &self.base_url {
            Some(url) => url.trim_end_matches('/'),
            None => self.environment.rest_base_url(),
        }
    }

    /// 앱시크릿 원문 (요청 헤더/본문 작성용).
    pub(crate) fn app_secret_str(&self) -> &str {
        self.app_secret.expose_secret()
    }
}
