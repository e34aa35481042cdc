//! Request pacing

use crate::config::CrawlerConfig;
use rand::Rng;
use std::time::Duration;

/// Longest wait between two attempts at the same request
pub const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Pacing knobs taken from the crawler configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    pub delay_ms: u64,
    pub jitter_ms: u64,
    pub backoff_ms: u64,
}

impl Pacing {
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            delay_ms: config.request_delay_ms,
            jitter_ms: config.request_jitter_ms,
            backoff_ms: config.retry_backoff_ms,
        }
    }

    /// Delay served before a worker gives its slot back
    pub fn politeness_delay(&self) -> Duration {
        politeness_delay(self.delay_ms, self.jitter_ms)
    }

    /// Wait before re-queueing a request whose `attempt` just failed
    pub fn retry_backoff(&self, attempt: u32) -> Duration {
        retry_backoff(self.backoff_ms, attempt)
    }
}

/// `base_ms` plus a uniform jitter in `[0, jitter_ms]`
pub fn politeness_delay(base_ms: u64, jitter_ms: u64) -> Duration {
    let jitter = if jitter_ms == 0 {
        0
    } else {
        rand::thread_rng().gen_range(0..=jitter_ms)
    };
    Duration::from_millis(base_ms.saturating_add(jitter))
}

/// Exponential backoff: `base_ms * 2^(attempt - 1)`, capped at [`MAX_BACKOFF`]
pub fn retry_backoff(base_ms: u64, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(32);
    let millis = base_ms.saturating_mul(1u64 << exponent);
    Duration::from_millis(millis).min(MAX_BACKOFF)
}
