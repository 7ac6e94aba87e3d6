//! Configuration management for the consensus and replication engine.
//!
//! Settings load from layered sources with priority:
//! 1. Default values (hardcoded)
//! 2. Main config file
//! 3. Node-specific cluster config
//! 4. Environment variables (highest priority)

mod cluster;
mod consensus;
mod replication;
mod retry;
pub use cluster::*;
pub use consensus::*;
pub use replication::*;
pub use retry::*;

#[cfg(test)]
mod config_test;

//---
use config::Config;
use config::Environment;
use config::File;
use serde::Deserialize;

use crate::Result;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Settings {
    /// Cluster topology and node identity
    #[serde(default)]
    pub cluster: ClusterConfig,
    /// Core agreement protocol parameters
    #[serde(default)]
    pub consensus: ConsensusConfig,
    /// Cross-datacenter replication parameters
    #[serde(default)]
    pub replication: ReplicationConfig,
    /// Retry policies for distributed operations
    #[serde(default)]
    pub retry: RetryPolicies,
}

impl Settings {
    /// Load configuration with priority: base file, node-specific cluster
    /// file, then `BFT__`-prefixed environment variables.
    pub fn load(cluster_path: Option<&str>) -> Result<Self> {
        let mut builder = Config::builder().add_source(File::with_name("config/engine").required(false));

        if let Some(custom_cluster) = cluster_path {
            builder = builder.add_source(File::with_name(custom_cluster).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("BFT")
                .separator("__")
                .ignore_empty(true)
                .try_parsing(true),
        );

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validates every subsystem configuration.
    pub fn validate(&self) -> Result<()> {
        self.cluster.validate()?;
        self.consensus.validate()?;
        self.replication.validate()?;
        Ok(())
    }
}
