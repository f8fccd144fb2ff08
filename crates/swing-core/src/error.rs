//! 파이프라인 에러 타입.
//!
//! 이 모듈은 시세 수집부터 시그널 산출까지 파이프라인 전반에서 사용되는 에러 타입을 정의합니다.

use thiserror::Error;

/// 핵심 파이프라인 에러.
#[derive(Debug, Error)]
pub enum SwingError {
    /// 접근 토큰 발급 실패 (조회 시작 전 중단)
    #[error("인증 실패: {0}")]
    AuthFailure(String),

    /// 분봉 페이지 조회 실패
    #[error("조회 실패: {0}")]
    FetchFailure(String),

    /// 조립된 시계열이 비어 있음
    #[error("조회 결과가 없습니다")]
    EmptyResult,

    /// 설정 에러
    #[error("설정 에러: {0}")]
    Config(String),

    /// 파일 입출력 에러
    #[error("입출력 에러: {0}")]
    Io(String),

    /// 직렬화 에러
    #[error("직렬화 에러: {0}")]
    Serialization(String),

    /// 잘못된 입력
    #[error("잘못된 입력: {0}")]
    InvalidInput(String),
}

/// 파이프라인 작업을 위한 Result 타입.
pub type SwingResult<T> = Result<T, SwingError>;

impl SwingError {
    /// 실행 전체를 중단해야 하는 치명적 에러인지 확인합니다.
    ///
    /// 첫 호출 이후의 조회 실패는 부분 결과로 이어지므로 치명적이지 않습니다.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SwingError::AuthFailure(_) | SwingError::Config(_))
    }

    /// 데이터가 없어 파이프라인이 조기 종료된 경우인지 확인합니다.
    pub fn is_empty_result(&self) -> bool {
        matches!(self, SwingError::EmptyResult)
    }
}

impl From<serde_json::Error> for SwingError {
    fn from(err: serde_json::Error) -> Self {
        SwingError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for SwingError {
    fn from(err: std::io::Error) -> Self {
        SwingError::Io(err.to_string())
    }
}

impl From<config::ConfigError> for SwingError {
    fn from(err: config::ConfigError) -> Self {
        SwingError::Config(err.to_string())
    }
}
