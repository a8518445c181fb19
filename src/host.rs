// Host identity via sysinfo

use crate::config::SourceConfig;
use sysinfo::System;

/// Metric source label: the configured name, else the machine hostname,
/// optionally truncated at the first dot.
pub fn metric_source(config: &SourceConfig) -> String {
    let name = config
        .name
        .clone()
        .filter(|s| !s.trim().is_empty())
        .or_else(System::host_name)
        .unwrap_or_else(|| "unknown".into());
    let name = name.trim();
    let name = if config.partial_hostname {
        match name.split_once('.') {
            Some((first, _)) => first,
            None => name,
        }
    } else {
        name
    };
    name.to_string()
}

/// Logical CPU count; bounds the per-core report file probe.
pub fn logical_cpu_count() -> usize {
    let mut sys = System::new();
    sys.refresh_cpu_all();
    sys.cpus().len().max(1)
}
