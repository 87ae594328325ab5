//! Per-run phase timings and the peak resident memory of this process (`--monitor`).

use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq)]
pub struct PhaseTiming {
    pub phase: &'static str,
    pub elapsed: Duration,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub phases: Vec<PhaseTiming>,
    pub total: Duration,
    /// `None` when the process could not be sampled.
    pub peak_memory_kb: Option<u64>,
}

impl RunReport {
    pub fn slowest(&self) -> Option<&PhaseTiming> {
        self.phases.iter().max_by_key(|timing| timing.elapsed)
    }
}

#[cfg(feature = "cli")]
struct MemoryProbe {
    system: sysinfo::System,
    pid: Option<sysinfo::Pid>,
}

#[cfg(feature = "cli")]
impl MemoryProbe {
    fn new() -> Self {
        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => Some(pid),
            Err(e) => {
                tracing::warn!("⚠️ Cannot determine own PID, memory is not sampled: {}", e);
                None
            }
        };
        Self {
            system: sysinfo::System::new(),
            pid,
        }
    }

    /// Resident memory in KiB.
    fn sample(&mut self) -> Option<u64> {
        let pid = self.pid?;
        self.system
            .refresh_processes(sysinfo::ProcessesToUpdate::Some(&[pid]), true);
        self.system.process(pid).map(|process| process.memory() / 1024)
    }
}

// Without the cli feature only the timings are recorded.
#[cfg(not(feature = "cli"))]
struct MemoryProbe;

#[cfg(not(feature = "cli"))]
impl MemoryProbe {
    fn new() -> Self {
        Self
    }

    fn sample(&mut self) -> Option<u64> {
        None
    }
}

/// Created once per run. A disabled monitor records nothing and never touches the
/// process table.
pub struct RunMonitor {
    started: Instant,
    last_mark: Instant,
    phases: Vec<PhaseTiming>,
    peak_memory_kb: Option<u64>,
    probe: Option<MemoryProbe>,
}

impl RunMonitor {
    pub fn start(enabled: bool) -> Self {
        let now = Instant::now();
        let mut monitor = Self {
            started: now,
            last_mark: now,
            phases: Vec::new(),
            peak_memory_kb: None,
            probe: enabled.then(MemoryProbe::new),
        };
        monitor.sample_memory();
        monitor
    }

    pub fn is_enabled(&self) -> bool {
        self.probe.is_some()
    }

    fn sample_memory(&mut self) {
        if let Some(kb) = self.probe.as_mut().and_then(MemoryProbe::sample) {
            self.peak_memory_kb = Some(self.peak_memory_kb.map_or(kb, |peak| peak.max(kb)));
        }
    }

    /// Closes the phase that started at the previous mark.
    pub fn mark(&mut self, phase: &'static str) {
        if !self.is_enabled() {
            return;
        }
        let now = Instant::now();
        let elapsed = now - self.last_mark;
        self.last_mark = now;
        self.sample_memory();
        tracing::debug!("⏱️ {} took {:?}", phase, elapsed);
        self.phases.push(PhaseTiming { phase, elapsed });
    }

    /// Logs one summary line and hands the report back. `None` when disabled.
    pub fn finish(self) -> Option<RunReport> {
        if !self.is_enabled() {
            return None;
        }
        let report = RunReport {
            phases: self.phases,
            total: self.started.elapsed(),
            peak_memory_kb: self.peak_memory_kb,
        };

        let breakdown = report
            .phases
            .iter()
            .map(|timing| format!("{} {:?}", timing.phase, timing.elapsed))
            .collect::<Vec<_>>()
            .join(", ");
        match report.peak_memory_kb {
            Some(kb) => tracing::info!(
                "📊 Run took {:?} ({}), peak memory {} KiB",
                report.total,
                breakdown,
                kb
            ),
            None => tracing::info!("📊 Run took {:?} ({})", report.total, breakdown),
        }
        Some(report)
    }
}
