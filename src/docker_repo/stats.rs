// Derive utilization figures from a one-shot Docker stats response.

use super::ContainerRuntime;
use crate::error::RuntimeError;
use crate::models::{CpuUsage, DerivedStats, MemoryUsage, StatsSample};
use bollard::models::{ContainerCpuStats, ContainerStatsResponse};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Fetch one stats response for `id` and derive percentages from it.
pub async fn container_stats(
    runtime: &dyn ContainerRuntime,
    id: &str,
) -> Result<DerivedStats, RuntimeError> {
    let response = runtime.stats_once(id).await?;
    let (current, previous) = samples(&response);
    Ok(derive_stats(&current, &previous))
}

/// Split a stats response into the current sample and the preceding one.
/// Docker only reports CPU counters for the preceding sample.
pub fn samples(s: &ContainerStatsResponse) -> (StatsSample, StatsSample) {
    let memory = s.memory_stats.as_ref();
    let current = StatsSample {
        memory_usage: memory.and_then(|m| m.usage).unwrap_or(0),
        memory_limit: memory.and_then(|m| m.limit).unwrap_or(0),
        networks: s.networks.clone(),
        block_io: s.blkio_stats.clone(),
        ..cpu_sample(s.cpu_stats.as_ref())
    };
    let previous = cpu_sample(s.precpu_stats.as_ref());
    (current, previous)
}

fn cpu_sample(cpu: Option<&ContainerCpuStats>) -> StatsSample {
    let Some(cpu) = cpu else {
        return StatsSample::default();
    };
    let usage = cpu.cpu_usage.as_ref();
    let per_cpu = usage
        .and_then(|u| u.percpu_usage.as_ref())
        .map_or(0, |v| v.len() as u32);
    let online_cpus = match cpu.online_cpus {
        Some(n) if n > 0 => n,
        _ if per_cpu > 0 => per_cpu,
        _ => 1,
    };
    StatsSample {
        cpu_usage_total: usage.and_then(|u| u.total_usage).unwrap_or(0),
        system_cpu_usage_total: cpu.system_cpu_usage.unwrap_or(0),
        online_cpus,
        ..Default::default()
    }
}

/// CPU percent is scaled to online CPUs (a fully busy 2-core container reads 200).
/// Zero elapsed system time gives 0, and an unlimited container has no memory percent.
/// A container counter that went backwards (reset) counts as no usage.
pub fn derive_stats(current: &StatsSample, previous: &StatsSample) -> DerivedStats {
    let cpu_delta = (current.cpu_usage_total as i64 - previous.cpu_usage_total as i64).max(0);
    let system_delta =
        current.system_cpu_usage_total as i64 - previous.system_cpu_usage_total as i64;
    let online = current.online_cpus as f64;
    let cpu_percent = if system_delta > 0 && online > 0.0 {
        (cpu_delta as f64 / system_delta as f64) * online * 100.0
    } else {
        0.0
    };

    let memory_percent = if current.memory_limit > 0 {
        Some(round2(
            current.memory_usage as f64 / current.memory_limit as f64 * 100.0,
        ))
    } else {
        None
    };

    DerivedStats {
        cpu: CpuUsage {
            percent: round2(cpu_percent),
            usage: cpu_delta,
            system: system_delta,
        },
        memory: MemoryUsage {
            usage: current.memory_usage,
            limit: current.memory_limit,
            percent: memory_percent,
            usage_mb: round2(current.memory_usage as f64 / BYTES_PER_MB),
            limit_mb: round2(current.memory_limit as f64 / BYTES_PER_MB),
        },
        network: current.networks.clone(),
        block_io: current.block_io.clone(),
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
