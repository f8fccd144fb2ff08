//! 거래소 에러 타입.

use swing_core::SwingError;
use thiserror::Error;

/// 거래소 관련 에러.
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// 네트워크/연결 에러
    #[error("Network error: {0}")]
    NetworkError(String),

    /// 인증/권한 에러
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// 요청 한도 초과
    #[error("Rate limit exceeded")]
    RateLimited,

    /// API 에러 코드
    #[error("API error {code}: {message}")]
    ApiError { code: i32, message: String },

    /// 파싱/역직렬화 에러
    #[error("Parse error: {0}")]
    ParseError(String),

    /// 잘못된 요청 파라미터
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// 타임아웃
    #[error("Request timeout: {0}")]
    Timeout(String),
}

impl ExchangeError {
    /// 인증 에러인지 확인.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, ExchangeError::Unauthorized(_))
    }

    /// 토큰 발급 단계 에러를 파이프라인 에러로 변환.
    pub fn into_auth_failure(self) -> SwingError {
        SwingError::AuthFailure(self.to_string())
    }
}

impl From<reqwest::Error> for ExchangeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ExchangeError::Timeout(err.to_string())
        } else if err.is_connect() {
            ExchangeError::NetworkError(err.to_string())
        } else if err.is_decode() {
            ExchangeError::ParseError(err.to_string())
        } else {
            ExchangeError::NetworkError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ExchangeError {
    fn from(err: serde_json::Error) -> Self {
        ExchangeError::ParseError(err.to_string())
    }
}

impl From<ExchangeError> for SwingError {
    fn from(err: ExchangeError) -> Self {
        match err {
            ExchangeError::Unauthorized(msg) => SwingError::AuthFailure(msg),
            other => SwingError::FetchFailure(other.to_string()),
        }
    }
}
