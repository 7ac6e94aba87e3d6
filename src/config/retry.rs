use serde::Deserialize;
use serde::Serialize;

/// Basic retry policy template
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default)]
pub struct BackoffPolicy {
    /// Maximum number of retries (0 means unlimited retries)
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Single operation timeout (unit: milliseconds)
    #[serde(default = "default_op_timeout_ms")]
    pub timeout_ms: u64,

    /// Backoff base (unit: milliseconds)
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Maximum backoff time (unit: milliseconds)
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl BackoffPolicy {
    /// Exponential delay for the given 0-based attempt, capped at
    /// `max_delay_ms`.
    pub fn delay_for_attempt(
        &self,
        attempt: usize,
    ) -> std::time::Duration {
        let exp = attempt.min(32) as u32;
        let delay = self.base_delay_ms.saturating_mul(1u64 << exp.min(20));
        std::time::Duration::from_millis(delay.min(self.max_delay_ms))
    }
}

/// Divide strategies by protocol concern
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RetryPolicies {
    // Consensus message fan-out (pre-prepare/vote broadcast)
    #[serde(default)]
    pub consensus: BackoffPolicy,

    // View change vote broadcast (liveness critical)
    #[serde(default)]
    pub view_change: BackoffPolicy,

    // Cross-datacenter record delivery
    #[serde(default)]
    pub replication: BackoffPolicy,

    // Heartbeat delivery (high frequency, cheap to drop)
    #[serde(default)]
    pub heartbeat: BackoffPolicy,
}

impl Default for RetryPolicies {
    fn default() -> Self {
        Self {
            consensus: BackoffPolicy {
                max_retries: 3,
                timeout_ms: 100,
                base_delay_ms: 50,
                max_delay_ms: 1000,
            },
            view_change: BackoffPolicy {
                max_retries: 10,
                timeout_ms: 200,
                base_delay_ms: 100,
                max_delay_ms: 5000,
            },
            replication: BackoffPolicy {
                max_retries: 8,
                timeout_ms: 500,
                base_delay_ms: 200,
                max_delay_ms: 30000,
            },
            heartbeat: BackoffPolicy {
                max_retries: 0,
                timeout_ms: 100,
                base_delay_ms: 100,
                max_delay_ms: 1000,
            },
        }
    }
}

fn default_max_retries() -> usize {
    3
}
fn default_op_timeout_ms() -> u64 {
    100
}
fn default_base_delay_ms() -> u64 {
    50
}
fn default_max_delay_ms() -> u64 {
    1000
}
