//! 해외주식 분봉 스윙 시그널 CLI.
//!
//! 이 crate는 다음 기능을 제공합니다:
//! - 토큰 발급 → 분봉 조립 → 지표/시그널 → 자금관리로 이어지는 파이프라인
//! - 분봉/시그널 CSV 저장
//! - `swing` 바이너리의 서브커맨드 구현

pub mod commands;
pub mod export;
pub mod pipeline;

pub use pipeline::{AnalysisReport, Pipeline, PipelineOptions};
