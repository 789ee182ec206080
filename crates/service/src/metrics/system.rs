//! Host CPU and memory gauges.

use std::num::NonZeroUsize;
use std::thread;

use sysinfo::System;

/// Host utilisation at one instant, in percent.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SystemUsage {
    /// One-minute load average per logical CPU.
    pub cpu_percent: f64,
    /// Used share of physical memory.
    pub memory_percent: f64,
}

/// Reads host usage; keeps one `System` so memory refreshes are incremental.
pub struct SystemSampler {
    system: System,
    cpus: NonZeroUsize,
}

impl Default for SystemSampler {
    fn default() -> Self {
        Self {
            system: System::new(),
            cpus: thread::available_parallelism().unwrap_or(NonZeroUsize::MIN),
        }
    }
}

impl SystemSampler {
    pub fn sample(&mut self) -> SystemUsage {
        self.system.refresh_memory();
        let load = System::load_average().one;

        SystemUsage {
            cpu_percent: load_percent(load, self.cpus),
            memory_percent: percent(self.system.used_memory(), self.system.total_memory()),
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn load_percent(load: f64, cpus: NonZeroUsize) -> f64 {
    round2(load / cpus.get() as f64 * 100.0)
}

#[allow(clippy::cast_precision_loss)]
fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    round2(part as f64 / whole as f64 * 100.0)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
