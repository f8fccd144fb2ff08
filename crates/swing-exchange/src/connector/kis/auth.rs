//! KIS OAuth 2.0 인증 모듈.
//!
//! 접근 토큰 발급 (POST /oauth2/tokenP) 및 캐싱을 처리합니다.
//! 발급된 토큰은 만료 임박 전까지 재사용됩니다.

use super::config::KisConfig;
use crate::rate_limit::MinIntervalLimiter;
use crate::traits::{ExchangeResult, TokenProvider};
use crate::ExchangeError;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

/// 토큰 갱신 임계값 (남은 시간이 이 값보다 적으면 갱신).
const TOKEN_REFRESH_THRESHOLD_HOURS: i64 = 1;

/// 앱키/앱시크릿 최소 길이.
const MIN_CREDENTIAL_LEN: usize = 20;

/// KIS OAuth 토큰 응답.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    /// 접근 토큰
    pub access_token: String,
    /// 토큰 타입 (항상 "Bearer")
    pub token_type: String,
    /// 토큰 만료 시간 (초)
    pub expires_in: i64,
    /// 접근 토큰 만료 시각 (KIS 형식: "YYYY-MM-DD HH:MM:SS")
    #[serde(default)]
    pub access_token_token_expired: String,
}

impl TokenResponse {
    /// 만료 시각은 `access_token_token_expired`(KST)를 우선, 없으면 `expires_in`.
    fn into_state(self) -> TokenState {
        let expires_at = parse_kis_datetime(&self.access_token_token_expired)
            .unwrap_or_else(|| Utc::now() + Duration::seconds(self.expires_in));
        TokenState::new(self.access_token, self.token_type, expires_at)
    }
}

/// KIS API 오류 응답.
#[derive(Debug, Clone, Deserialize)]
pub struct KisErrorResponse {
    /// 응답 코드 (0 = 성공)
    pub rt_cd: String,
    /// 메시지 코드
    pub msg_cd: String,
    /// 메시지 내용
    pub msg1: String,
}

/// KIS OAuth 오류 응답 (토큰 발급 실패 시).
#[derive(Debug, Clone, Deserialize)]
pub struct KisOAuthErrorResponse {
    /// 에러 코드 (예: "EGW00103")
    pub error_code: String,
    /// 에러 설명 (예: "유효하지 않은 AppKey입니다.")
    pub error_description: String,
}

/// 만료 추적이 포함된 토큰 상태.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenState {
    /// 접근 토큰
    pub access_token: String,
    /// 토큰 타입
    pub token_type: String,
    /// 만료 시각
    pub expires_at: DateTime<Utc>,
}

impl TokenState {
    /// 새 토큰 상태 생성.
    pub fn new(
        access_token: impl Into<String>,
        token_type: impl Into<String>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: token_type.into(),
            expires_at,
        }
    }

    /// 토큰이 만료되었거나 곧 만료되는지 확인.
    pub fn is_expired_or_expiring(&self) -> bool {
        let threshold = Utc::now() + Duration::hours(TOKEN_REFRESH_THRESHOLD_HOURS);
        self.expires_at <= threshold
    }

    /// 인증 헤더 값 반환.
    pub fn auth_header(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }
}

/// KIS OAuth 인증 관리자.
///
/// 토큰 발급 요청도 업스트림 호출이므로 시세 조회와 같은 limiter를 공유합니다.
pub struct KisOAuth {
    config: KisConfig,
    client: Client,
    token: Arc<RwLock<Option<TokenState>>>,
    limiter: Arc<MinIntervalLimiter>,
}

impl KisOAuth {
    /// 새로운 OAuth 관리자 생성.
    ///
    /// # Errors
    /// HTTP 클라이언트 생성에 실패하면 `ExchangeError::NetworkError`를 반환합니다.
    pub fn new(config: KisConfig) -> Result<Self, ExchangeError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ExchangeError::NetworkError(format!("HTTP client 생성 실패: {}", e)))?;

        Ok(Self {
            config,
            client,
            token: Arc::new(RwLock::new(None)),
            limiter: Arc::new(MinIntervalLimiter::default()),
        })
    }

    /// 공유 rate limiter 설정.
    pub fn with_rate_limiter(mut self, limiter: Arc<MinIntervalLimiter>) -> Self {
        self.limiter = limiter;
        self
    }

    /// 캐시된 토큰 (발급 요청 없음).
    pub async fn get_cached_token(&self) -> Option<TokenState> {
        self.token.read().await.clone()
    }

    /// 캐시된 토큰이 만료 임박 전이면 재사용, 아니면 새로 발급.
    pub async fn get_token(&self) -> Result<TokenState, ExchangeError> {
        match self.get_cached_token().await {
            Some(token) if !token.is_expired_or_expiring() => {
                debug!(expires_at = %token.expires_at, "캐시된 KIS 토큰 사용");
                return Ok(token);
            }
            Some(token) => {
                warn!(expires_at = %token.expires_at, "KIS 토큰 만료 임박, 재발급");
            }
            None => info!("캐시된 KIS 토큰 없음, 신규 발급 요청"),
        }

        self.refresh_token().await
    }

    /// 접근 토큰 강제 재발급.
    ///
    /// 모든 실패는 `ExchangeError::Unauthorized`로 보고됩니다.
    pub async fn refresh_token(&self) -> Result<TokenState, ExchangeError> {
        self.check_credentials()?;

        info!(app_key = %self.key_prefix(), "KIS 접근 토큰 발급 요청");

        #[derive(Serialize)]
        struct TokenRequest<'a> {
            grant_type: &'a str,
            appkey: &'a str,
            appsecret: &'a str,
        }

        let url = format!("{}/oauth2/tokenP", self.config.rest_base_url());
        let body = TokenRequest {
            grant_type: "client_credentials",
            appkey: &self.config.app_key,
            appsecret: self.config.app_secret_str(),
        };

        self.limiter.acquire().await;

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json; charset=utf-8")
            .json(&body)
            .send()
            .await
            .map_err(|e| unauthorized("토큰 요청 전송 실패", e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| unauthorized("토큰 응답 수신 실패", e))?;

        if !status.is_success() {
            let message = token_failure_message(status, &text);
            error!(%status, "KIS 토큰 발급 실패: {}", message);
            return Err(ExchangeError::Unauthorized(message));
        }

        let token = serde_json::from_str::<TokenResponse>(&text)
            .map_err(|e| unauthorized("토큰 응답 파싱 실패", e))?
            .into_state();

        *self.token.write().await = Some(token.clone());
        info!(expires_at = %token.expires_at, "KIS 접근 토큰 발급 완료");

        Ok(token)
    }

    fn check_credentials(&self) -> Result<(), ExchangeError> {
        let credentials = [
            ("KIS_APP_KEY", self.config.app_key.as_str()),
            ("KIS_APP_SECRET", self.config.app_secret_str()),
        ];
        for (name, value) in credentials {
            if value.len() < MIN_CREDENTIAL_LEN {
                error!(len = value.len(), "{} 길이가 너무 짧음", name);
                return Err(ExchangeError::Unauthorized(format!(
                    "{} 값이 올바르지 않습니다. \
                     한국투자증권에서 발급받은 값을 설정하세요.",
                    name
                )));
            }
        }
        Ok(())
    }

    fn key_prefix(&self) -> String {
        self.config.app_key.chars().take(8).collect()
    }

    /// 주어진 토큰으로 시세 조회 요청 헤더 구성.
    ///
    /// # Errors
    /// 헤더로 쓸 수 없는 문자가 있으면 `ExchangeError::ParseError`.
    pub fn build_headers(
        &self,
        token: &TokenState,
        tr_id: &str,
    ) -> Result<HeaderMap, ExchangeError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "content-type",
            HeaderValue::from_static("application/json; charset=utf-8"),
        );
        headers.insert("authorization", header_value("authorization", &token.auth_header())?);
        headers.insert("appkey", header_value("appkey", &self.config.app_key)?);
        headers.insert("appsecret", header_value("appsecret", self.config.app_secret_str())?);
        headers.insert("tr_id", header_value("tr_id", tr_id)?);
        if self.config.personalized {
            headers.insert("custtype", HeaderValue::from_static("P"));
        }

        Ok(headers)
    }

    /// 설정 반환.
    pub fn config(&self) -> &KisConfig {
        &self.config
    }
}

#[async_trait]
impl TokenProvider for KisOAuth {
    async fn get_token(&self) -> ExchangeResult<TokenState> {
        KisOAuth::get_token(self).await
    }
}

/// KIS 날짜시간 형식 파싱 ("YYYY-MM-DD HH:MM:SS", KST).
fn parse_kis_datetime(s: &str) -> Option<DateTime<Utc>> {
    use chrono::{NaiveDateTime, TimeZone};
    use chrono_tz::Asia::Seoul;

    let naive = NaiveDateTime::parse_from_str(s.trim(), "%Y-%m-%d %H:%M:%S").ok()?;
    let kst = Seoul.from_local_datetime(&naive).single()?;
    Some(kst.with_timezone(&Utc))
}

fn unauthorized(context: &str, err: impl std::fmt::Display) -> ExchangeError {
    ExchangeError::Unauthorized(format!("{}: {}", context, err))
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue, ExchangeError> {
    HeaderValue::from_str(value).map_err(|_| {
        ExchangeError::ParseError(format!("{} 헤더에 쓸 수 없는 문자 포함", name))
    })
}

/// 토큰 발급 실패 응답을 사용자 안내 문구로 변환.
fn token_failure_message(status: reqwest::StatusCode, body: &str) -> String {
    if let Ok(err) = serde_json::from_str::<KisOAuthErrorResponse>(body) {
        let hint = match err.error_code.as_str() {
            "EGW00101" => Some("AppSecret이 일치하지 않습니다."),
            "EGW00102" => Some("AppKey가 만료되었습니다."),
            "EGW00103" => Some("유효하지 않은 AppKey입니다."),
            "EGW00133" => Some("토큰 발급 요청이 너무 잦습니다. 1분 후 다시 시도하세요."),
            _ => None,
        };
        return match hint {
            Some(hint) => format!("{} ({})", hint, err.error_code),
            None => format!("{} ({})", err.error_description, err.error_code),
        };
    }

    if let Ok(err) = serde_json::from_str::<KisErrorResponse>(body) {
        return format!("{} ({})", err.msg1, err.msg_cd);
    }

    format!("HTTP {}: {}", status, body)
}
