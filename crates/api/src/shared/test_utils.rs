use chrono::{TimeZone, Utc, Weekday};
use chrono_tz::Tz;
use nudge_domain::{Channel, EntityType, Reminder, ReminderKind, ID};
use nudge_infra::{
    ChannelError, Channels, INotificationChannel, ISys, NotificationPayload, NudgeContext,
    StaticTimeSys,
};
use std::sync::{Arc, Mutex};

pub struct TestContext {
    pub ctx: NudgeContext,
    pub sys: Arc<StaticTimeSys>,
}

pub fn utc_millis(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> i64 {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, 0)
        .unwrap()
        .timestamp_millis()
}

/// Inmemory context with a clock standing still at `now`, UTC as timezone
/// and short backoffs
pub fn setup_context(now: i64) -> TestContext {
    let mut ctx = NudgeContext::create_inmemory();
    let sys = Arc::new(StaticTimeSys::new(now));
    ctx.sys = sys.clone();
    ctx.config.timezone = Tz::UTC;
    ctx.config.scheduler_batch_size = 50;
    ctx.config.reminder_claim_ttl_ms = 5 * 60 * 1000;
    ctx.config.reminder_processing_timeout_ms = 5 * 1000;
    ctx.config.dispatch_max_attempts = 3;
    ctx.config.dispatch_backoff_ms = 1;
    ctx.config.dispatch_max_backoff_ms = 4;
    ctx.config.channel_timeout_ms = 1000;
    ctx.config.max_active_reminders_per_user = 100;
    TestContext { ctx, sys }
}

pub fn use_channels(ctx: &mut NudgeContext, providers: &[Arc<MockChannel>]) {
    let providers = providers
        .iter()
        .map(|provider| provider.clone() as Arc<dyn INotificationChannel>)
        .collect();
    ctx.channels = Channels::new(providers, 8);
}

pub fn recurring_reminder(entity_id: &ID, time: &str, days: Vec<Weekday>) -> Reminder {
    Reminder {
        id: Default::default(),
        user_id: Default::default(),
        entity_id: entity_id.clone(),
        entity_type: EntityType::Habit,
        kind: ReminderKind::Recurring,
        scheduled_time: Some(time.parse().unwrap()),
        reminder_date: None,
        days_of_week: days,
        minutes_before: None,
        interval: None,
        notification_types: vec![Channel::Push],
        message: Some("Time to stretch".into()),
        is_active: true,
        next_scheduled_at: None,
        last_attempt_at: None,
        last_success_at: None,
        version: 0,
        created: 0,
        updated: 0,
    }
}

pub struct MockChannel {
    channel: Channel,
    failure: Option<ChannelError>,
    sent: Mutex<Vec<NotificationPayload>>,
    /// Moves the clock forward on every send
    clock: Option<(Arc<StaticTimeSys>, i64)>,
    /// Never answers
    hangs: bool,
}

impl MockChannel {
    pub fn succeeding(channel: Channel) -> Self {
        Self {
            channel,
            failure: None,
            sent: Mutex::new(Vec::new()),
            clock: None,
            hangs: false,
        }
    }

    pub fn hanging(channel: Channel) -> Self {
        Self {
            hangs: true,
            ..Self::succeeding(channel)
        }
    }

    pub fn failing(channel: Channel, error: ChannelError) -> Self {
        Self {
            failure: Some(error),
            ..Self::succeeding(channel)
        }
    }

    pub fn advancing_clock(mut self, sys: Arc<StaticTimeSys>, step_millis: i64) -> Self {
        self.clock = Some((sys, step_millis));
        self
    }

    pub fn calls(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn sent(&self) -> Vec<NotificationPayload> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl INotificationChannel for MockChannel {
    fn channel(&self) -> Channel {
        self.channel
    }

    async fn send(&self, payload: &NotificationPayload) -> Result<(), ChannelError> {
        self.sent.lock().unwrap().push(payload.clone());
        if self.hangs {
            futures::future::pending::<()>().await;
        }
        // Lets other ticks run while this send is in flight
        tokio::task::yield_now().await;
        if let Some((sys, step)) = &self.clock {
            sys.set(sys.get_timestamp_millis() + step);
        }
        match &self.failure {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}
