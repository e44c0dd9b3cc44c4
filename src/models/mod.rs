// Result shapes returned to API consumers. All of them are rebuilt per request.

mod container;
mod stats;
mod update;

pub use container::{ContainerConfigView, ContainerState, ContainerSummary, NetworkSettingsView};
pub use stats::{CpuUsage, DerivedStats, MemoryUsage, StatsSample};
pub use update::{NO_LOCAL_DIGEST, PINNED_BY_DIGEST, REGISTRY_UNAVAILABLE, UpdateCheckResult};
