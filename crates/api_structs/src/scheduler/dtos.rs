use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerStatsDTO {
    pub ticks: u64,
    pub total_processed: u64,
    pub delivered: u64,
    pub failed: u64,
    pub skipped: u64,
    pub is_running: bool,
    pub last_run_at: Option<i64>,
    pub last_run_duration_ms: Option<i64>,
    pub next_run_at: Option<i64>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TickSummaryDTO {
    pub ran_at: i64,
    pub selected: usize,
    pub delivered: usize,
    pub failed: usize,
    pub skipped: usize,
    pub errors: usize,
}
