//! 시그널 파이프라인을 위한 도메인 모델.

mod bar;
mod signal;

pub use bar::*;
pub use signal::*;
