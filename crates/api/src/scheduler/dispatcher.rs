use futures::future::join_all;
use nudge_domain::{Channel, Reminder};
use nudge_infra::{ChannelError, INotificationChannel, ISys, NotificationPayload, NudgeContext};
use std::{sync::Arc, time::Duration};
use tokio::{sync::Semaphore, time::Instant};
use tracing::{info, warn};

/// How sends through a single channel are retried
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Attempts including the first one
    pub max_attempts: u32,
    pub attempt_timeout: Duration,
    pub base_backoff: Duration,
    pub max_backoff: Duration,
}

impl RetryPolicy {
    pub fn from_context(ctx: &NudgeContext) -> Self {
        Self {
            max_attempts: ctx.config.dispatch_max_attempts.max(1),
            attempt_timeout: Duration::from_millis(ctx.config.channel_timeout_ms),
            base_backoff: Duration::from_millis(ctx.config.dispatch_backoff_ms),
            max_backoff: Duration::from_millis(ctx.config.dispatch_max_backoff_ms),
        }
    }

    /// Delay after the failed attempt number `attempt`: base, 2 * base, 4 * base, ...
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChannelOutcome {
    pub channel: Channel,
    pub attempts: u32,
    pub last_attempt_at: i64,
    pub result: Result<(), ChannelError>,
}

impl ChannelOutcome {
    pub fn is_delivered(&self) -> bool {
        self.result.is_ok()
    }

    /// False when the deadline passed before any send started
    pub fn is_attempted(&self) -> bool {
        self.attempts > 0
    }
}

/// Result of sending one occurrence through all the channels of a `Reminder`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DispatchReport {
    pub outcomes: Vec<ChannelOutcome>,
}

impl DispatchReport {
    /// At least one channel delivered the notification
    pub fn is_delivered(&self) -> bool {
        self.outcomes.iter().any(ChannelOutcome::is_delivered)
    }

    /// Whether any channel got to send, otherwise the occurrence is still pending
    pub fn is_attempted(&self) -> bool {
        self.outcomes.iter().any(ChannelOutcome::is_attempted)
    }

    pub fn last_attempt_at(&self) -> Option<i64> {
        self.outcomes
            .iter()
            .filter(|o| o.is_attempted())
            .map(|o| o.last_attempt_at)
            .max()
    }

    pub fn last_success_at(&self) -> Option<i64> {
        self.outcomes
            .iter()
            .filter(|o| o.is_delivered())
            .map(|o| o.last_attempt_at)
            .max()
    }

    pub fn get(&self, channel: Channel) -> Option<&ChannelOutcome> {
        self.outcomes.iter().find(|o| o.channel == channel)
    }
}

/// Sends the occurrence at `scheduled_for` through every channel of
/// `reminder` concurrently. A failing channel does not affect the others.
///
/// Every channel stops retrying at `deadline`, so the report always comes
/// back and includes the channels that delivered in the meantime.
pub async fn dispatch_reminder(
    reminder: &Reminder,
    scheduled_for: i64,
    deadline: Instant,
    ctx: &NudgeContext,
) -> DispatchReport {
    let payload = NotificationPayload::new(reminder, scheduled_for);
    let policy = RetryPolicy::from_context(ctx);
    let permits = ctx.channels.permits();

    let sends = reminder.notification_types.iter().map(|channel| {
        send_with_retry(
            ctx.channels.get(*channel),
            &payload,
            &policy,
            permits.as_ref(),
            deadline,
            ctx.sys.as_ref(),
        )
    });

    DispatchReport {
        outcomes: join_all(sends).await,
    }
}

/// One send, bounded by the attempt timeout and by `deadline`. Waiting for
/// a permit only counts against `deadline`. Returns `None` when the deadline
/// passed before the send could start.
async fn attempt_send(
    provider: &dyn INotificationChannel,
    payload: &NotificationPayload,
    policy: &RetryPolicy,
    permits: &Semaphore,
    deadline: Instant,
) -> Option<Result<(), ChannelError>> {
    let _permit = match tokio::time::timeout_at(deadline, permits.acquire()).await {
        Ok(Ok(permit)) => permit,
        Ok(Err(_)) => {
            return Some(Err(ChannelError::Transport(
                "Send permits are closed".into(),
            )))
        }
        Err(_) => return None,
    };
    if Instant::now() >= deadline {
        return None;
    }
    let limit = std::cmp::min(Instant::now() + policy.attempt_timeout, deadline);
    let result = tokio::time::timeout_at(limit, provider.send(payload))
        .await
        .unwrap_or(Err(ChannelError::Timeout));
    Some(result)
}

async fn send_with_retry(
    provider: Arc<dyn INotificationChannel>,
    payload: &NotificationPayload,
    policy: &RetryPolicy,
    permits: &Semaphore,
    deadline: Instant,
    sys: &dyn ISys,
) -> ChannelOutcome {
    let channel = provider.channel();
    let mut outcome = ChannelOutcome {
        channel,
        attempts: 0,
        last_attempt_at: sys.get_timestamp_millis(),
        result: Err(ChannelError::Timeout),
    };
    loop {
        let attempt_at = sys.get_timestamp_millis();
        match attempt_send(provider.as_ref(), payload, policy, permits, deadline).await {
            Some(result) => {
                outcome.attempts += 1;
                outcome.last_attempt_at = attempt_at;
                outcome.result = result;
            }
            None => {
                warn!(
                    "Ran out of time delivering reminder: {} through {} after {} attempt(s)",
                    payload.reminder_id, channel, outcome.attempts
                );
                return outcome;
            }
        }

        match &outcome.result {
            Ok(()) => {
                info!(
                    "Reminder: {} delivered through {} after {} attempt(s)",
                    payload.reminder_id, channel, outcome.attempts
                );
            }
            Err(e)
                if e.is_retryable()
                    && outcome.attempts < policy.max_attempts
                    && Instant::now() + policy.backoff(outcome.attempts) < deadline =>
            {
                let delay = policy.backoff(outcome.attempts);
                warn!(
                    "Attempt {} to deliver reminder: {} through {} failed: {}. Retrying in {:?}",
                    outcome.attempts, payload.reminder_id, channel, e, delay
                );
                tokio::time::sleep(delay).await;
                continue;
            }
            Err(e) => {
                warn!(
                    "Giving up delivering reminder: {} through {} after {} attempt(s): {}",
                    payload.reminder_id, channel, outcome.attempts, e
                );
            }
        }

        return outcome;
    }
}
