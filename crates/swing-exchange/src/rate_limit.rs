//! 연속 API 호출 간 최소 간격 보장.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::trace;

/// 기본 최소 호출 간격 (밀리초).
pub const DEFAULT_MIN_INTERVAL_MS: u64 = 100;

/// 최소 간격 rate limiter.
///
/// 같은 업스트림으로 향하는 모든 호출 직전에 `acquire()`를 await 합니다.
/// 마지막 호출 이후 `min_interval`이 지나지 않았으면 남은 시간만큼 대기합니다.
#[derive(Debug)]
pub struct MinIntervalLimiter {
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl MinIntervalLimiter {
    /// 새 limiter 생성.
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call: Mutex::new(None),
        }
    }

    /// 밀리초 단위 간격으로 생성.
    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    /// 설정된 최소 간격.
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// 다음 호출이 허용될 때까지 대기.
    pub async fn acquire(&self) {
        let mut last = self.last_call.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.min_interval {
                let wait = self.min_interval - elapsed;
                trace!(wait_ms = wait.as_millis() as u64, "rate limit 대기");
                tokio::time::sleep(wait).await;
            }
        }
        *last = Some(Instant::now());
    }
}

impl Default for MinIntervalLimiter {
    fn default() -> Self {
        Self::from_millis(DEFAULT_MIN_INTERVAL_MS)
    }
}
