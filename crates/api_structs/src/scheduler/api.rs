use crate::dtos::{SchedulerStatsDTO, TickSummaryDTO};
use serde::{Deserialize, Serialize};

pub mod run_scheduler {
    use super::*;

    #[derive(Deserialize, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct APIResponse {
        pub tick: TickSummaryDTO,
    }
}

pub mod get_scheduler_stats {
    use super::*;

    #[derive(Deserialize, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct APIResponse {
        pub stats: SchedulerStatsDTO,
    }
}
