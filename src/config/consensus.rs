use std::fmt::Debug;

use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Agreement protocol timing and batching parameters.
#[derive(Serialize, Deserialize, Clone)]
pub struct ConsensusConfig {
    /// Lower bound of the jittered view-change candidacy delay (ms).
    /// Randomizing the delay keeps partitioned members from racing into
    /// competing candidate views forever.
    #[serde(default = "default_election_timeout_min")]
    pub election_timeout_min_ms: u64,

    /// Upper bound of the jittered view-change candidacy delay (ms)
    #[serde(default = "default_election_timeout_max")]
    pub election_timeout_max_ms: u64,

    /// Missed-heartbeat window after which the current leader is presumed
    /// failed and a view change vote is broadcast (ms)
    #[serde(default = "default_failure_timeout")]
    pub failure_timeout_ms: u64,

    /// Leader heartbeat cadence (ms)
    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval_ms: u64,

    /// How long a proposal may sit without reaching the Prepared phase
    /// before this member casts a prepare-timeout view-change vote (ms)
    #[serde(default = "default_prepare_timeout")]
    pub prepare_timeout_ms: u64,

    /// How long `propose` awaits commit quorum before reporting the
    /// indeterminate outcome to the caller (ms)
    #[serde(default = "default_propose_timeout")]
    pub propose_timeout_ms: u64,

    /// Operation batching for proposal rounds
    #[serde(default)]
    pub batch: BatchConfig,
}

impl Debug for ConsensusConfig {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("ConsensusConfig").finish()
    }
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            election_timeout_min_ms: default_election_timeout_min(),
            election_timeout_max_ms: default_election_timeout_max(),
            failure_timeout_ms: default_failure_timeout(),
            heartbeat_interval_ms: default_heartbeat_interval(),
            prepare_timeout_ms: default_prepare_timeout(),
            propose_timeout_ms: default_propose_timeout(),
            batch: BatchConfig::default(),
        }
    }
}

impl ConsensusConfig {
    pub fn validate(&self) -> Result<()> {
        if self.election_timeout_min_ms >= self.election_timeout_max_ms {
            return Err(Error::Config(ConfigError::Message(
                "election_timeout_min_ms must be less than election_timeout_max_ms".into(),
            )));
        }

        if self.heartbeat_interval_ms == 0 {
            return Err(Error::Config(ConfigError::Message(
                "heartbeat_interval_ms cannot be 0".into(),
            )));
        }

        if self.failure_timeout_ms <= self.heartbeat_interval_ms {
            return Err(Error::Config(ConfigError::Message(
                "failure_timeout_ms must exceed heartbeat_interval_ms".into(),
            )));
        }

        if self.propose_timeout_ms == 0 {
            return Err(Error::Config(ConfigError::Message(
                "propose_timeout_ms must be at least 1ms".into(),
            )));
        }

        self.batch.validate()?;

        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BatchConfig {
    /// Maximum operations grouped into one proposal round
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Flush delay for a partially filled batch (ms)
    #[serde(default = "default_batch_timeout")]
    pub batch_timeout_ms: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            batch_timeout_ms: default_batch_timeout(),
        }
    }
}

impl BatchConfig {
    fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::Config(ConfigError::Message("batch_size cannot be 0".into())));
        }
        Ok(())
    }
}

fn default_election_timeout_min() -> u64 {
    150
}
fn default_election_timeout_max() -> u64 {
    300
}
fn default_failure_timeout() -> u64 {
    1000
}
fn default_heartbeat_interval() -> u64 {
    100
}
fn default_prepare_timeout() -> u64 {
    500
}
fn default_propose_timeout() -> u64 {
    3000
}
fn default_batch_size() -> usize {
    64
}
fn default_batch_timeout() -> u64 {
    5
}
