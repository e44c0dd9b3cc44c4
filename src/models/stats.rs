// Raw counter samples and the utilization figures derived from them.

use bollard::models::{ContainerBlkioStats, ContainerNetworkStats};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Cumulative counters read from one stats sample. The runtime's one-shot stats
/// response carries the current sample and the one immediately before it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatsSample {
    pub cpu_usage_total: u64,
    pub system_cpu_usage_total: u64,
    pub online_cpus: u32,
    pub memory_usage: u64,
    pub memory_limit: u64,
    pub networks: Option<HashMap<String, ContainerNetworkStats>>,
    pub block_io: Option<ContainerBlkioStats>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CpuUsage {
    pub percent: f64,
    /// Container CPU time consumed between the two samples (ns).
    pub usage: i64,
    /// System CPU time elapsed between the two samples (ns).
    pub system: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryUsage {
    pub usage: u64,
    pub limit: u64,
    /// `None` when the container has no memory limit.
    pub percent: Option<f64>,
    #[serde(rename = "usageMB")]
    pub usage_mb: f64,
    #[serde(rename = "limitMB")]
    pub limit_mb: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedStats {
    pub cpu: CpuUsage,
    pub memory: MemoryUsage,
    pub network: Option<HashMap<String, ContainerNetworkStats>>,
    #[serde(rename = "blockIO")]
    pub block_io: Option<ContainerBlkioStats>,
}
