use std::sync::{Mutex, MutexGuard};

/// Counters of the scheduler since the process started
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchedulerStatsSnapshot {
    pub ticks: u64,
    pub total_processed: u64,
    pub delivered: u64,
    pub failed: u64,
    pub skipped: u64,
    pub is_running: bool,
    pub last_run_at: Option<i64>,
    pub last_run_duration_ms: Option<i64>,
}

/// Outcome counts of one scheduler tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickCounts {
    pub processed: u64,
    pub delivered: u64,
    pub failed: u64,
    pub skipped: u64,
}

#[derive(Debug, Default)]
pub struct SchedulerStats {
    inner: Mutex<SchedulerStatsSnapshot>,
}

impl SchedulerStats {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, SchedulerStatsSnapshot> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn tick_started(&self, now: i64) {
        let mut stats = self.lock();
        stats.is_running = true;
        stats.last_run_at = Some(now);
    }

    pub fn tick_finished(&self, now: i64, counts: &TickCounts) {
        let mut stats = self.lock();
        stats.ticks += 1;
        stats.total_processed += counts.processed;
        stats.delivered += counts.delivered;
        stats.failed += counts.failed;
        stats.skipped += counts.skipped;
        stats.is_running = false;
        stats.last_run_duration_ms = stats.last_run_at.map(|started| now - started);
    }

    pub fn snapshot(&self) -> SchedulerStatsSnapshot {
        self.lock().clone()
    }
}
