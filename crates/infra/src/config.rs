use chrono_tz::Tz;
use nudge_utils::create_random_secret;
use std::str::FromStr;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the application to run on
    pub port: usize,
    /// Timezone the wall clock times of all `Reminder`s are expressed in
    pub timezone: Tz,
    /// Whether the send reminders and cleanup jobs should be started
    pub scheduler_enabled: bool,
    /// Seconds between two scheduler ticks
    pub scheduler_tick_secs: u64,
    /// Maximum number of due `Reminder`s picked up by a single tick
    pub scheduler_batch_size: usize,
    /// Upper bound in millis for dispatching the due `Reminder`s of a tick.
    /// Raised to fit every retry of a channel, see `Config::enforce_timeouts`.
    pub reminder_processing_timeout_ms: u64,
    /// A claim that has not been completed within this many millis is
    /// considered abandoned and the occurrence becomes due again.
    pub reminder_claim_ttl_ms: i64,
    /// Number of send attempts per channel, including the first one
    pub dispatch_max_attempts: u32,
    pub dispatch_backoff_ms: u64,
    pub dispatch_max_backoff_ms: u64,
    /// Timeout for a single send attempt
    pub channel_timeout_ms: u64,
    /// Maximum number of concurrent sends across all channels
    pub dispatch_concurrency: usize,
    pub max_active_reminders_per_user: usize,
    /// Inactive or exhausted `Reminder`s untouched for this many days are deleted
    pub reminder_retention_days: i64,
    pub cleanup_interval_secs: u64,
    pub push_gateway_url: Option<String>,
    pub email_webhook_url: Option<String>,
    pub sms_webhook_url: Option<String>,
    /// Sent with every channel webhook so receivers can verify the sender
    pub channel_webhook_key: String,
}

impl Config {
    pub fn new() -> Self {
        let channel_webhook_key = match std::env::var("CHANNEL_WEBHOOK_KEY") {
            Ok(key) => key,
            Err(_) => {
                info!("Did not find CHANNEL_WEBHOOK_KEY environment variable. Going to create one.");
                let key = create_random_secret(24);
                info!("Channel webhook key was generated and set to: {}", key);
                key
            }
        };
        let timezone = match std::env::var("TIMEZONE") {
            Ok(tzid) => match tzid.parse::<Tz>() {
                Ok(tz) => tz,
                Err(_) => {
                    warn!(
                        "The given TIMEZONE: {} is not a valid IANA timezone, falling back to UTC.",
                        tzid
                    );
                    Tz::UTC
                }
            },
            Err(_) => Tz::UTC,
        };

        let mut config = Self {
            port: parse_env("PORT", 5000),
            timezone,
            scheduler_enabled: parse_env("SCHEDULER_ENABLED", true),
            scheduler_tick_secs: parse_env("SCHEDULER_TICK_SECS", 60),
            scheduler_batch_size: parse_env("SCHEDULER_BATCH_SIZE", 50),
            reminder_processing_timeout_ms: parse_env("REMINDER_PROCESSING_TIMEOUT_MS", 60 * 1000),
            reminder_claim_ttl_ms: parse_env("REMINDER_CLAIM_TTL_MS", 5 * 60 * 1000),
            dispatch_max_attempts: parse_env("DISPATCH_MAX_ATTEMPTS", 3),
            dispatch_backoff_ms: parse_env("DISPATCH_BACKOFF_MS", 500),
            dispatch_max_backoff_ms: parse_env("DISPATCH_MAX_BACKOFF_MS", 30 * 1000),
            channel_timeout_ms: parse_env("CHANNEL_TIMEOUT_MS", 10 * 1000),
            dispatch_concurrency: parse_env("DISPATCH_CONCURRENCY", 8),
            max_active_reminders_per_user: parse_env("MAX_ACTIVE_REMINDERS_PER_USER", 100),
            reminder_retention_days: parse_env("REMINDER_RETENTION_DAYS", 30),
            cleanup_interval_secs: parse_env("CLEANUP_INTERVAL_SECS", 60 * 60),
            push_gateway_url: optional_env("PUSH_GATEWAY_URL"),
            email_webhook_url: optional_env("EMAIL_WEBHOOK_URL"),
            sms_webhook_url: optional_env("SMS_WEBHOOK_URL"),
            channel_webhook_key,
        };
        config.enforce_timeouts();
        config
    }

    /// Delay in millis after the failed attempt number `attempt`
    pub fn dispatch_backoff_after(&self, attempt: u32) -> u64 {
        let factor = 2u64.saturating_pow(attempt.saturating_sub(1));
        self.dispatch_backoff_ms
            .saturating_mul(factor)
            .min(self.dispatch_max_backoff_ms)
    }

    /// Time one channel needs when every attempt runs into the timeout
    pub fn max_dispatch_duration_ms(&self) -> u64 {
        let attempts = self.dispatch_max_attempts.max(1);
        let backoff: u64 = (1..attempts)
            .map(|attempt| self.dispatch_backoff_after(attempt))
            .sum();
        u64::from(attempts)
            .saturating_mul(self.channel_timeout_ms)
            .saturating_add(backoff)
    }

    /// The processing budget must fit all retries of a channel plus one more
    /// attempt worth of waiting for a send permit, and a claim must outlive
    /// the processing of the occurrence it covers.
    pub fn enforce_timeouts(&mut self) {
        let required = self
            .max_dispatch_duration_ms()
            .saturating_add(self.channel_timeout_ms);
        if self.reminder_processing_timeout_ms < required {
            warn!(
                "REMINDER_PROCESSING_TIMEOUT_MS: {} does not fit {} attempts of {}ms with backoff, raising it to {}.",
                self.reminder_processing_timeout_ms,
                self.dispatch_max_attempts,
                self.channel_timeout_ms,
                required
            );
            self.reminder_processing_timeout_ms = required;
        }

        let min_claim_ttl = i64::try_from(self.reminder_processing_timeout_ms)
            .unwrap_or(i64::MAX / 2)
            .saturating_mul(2);
        if self.reminder_claim_ttl_ms < min_claim_ttl {
            warn!(
                "REMINDER_CLAIM_TTL_MS: {} is shorter than twice the processing timeout, raising it to {}.",
                self.reminder_claim_ttl_ms, min_claim_ttl
            );
            self.reminder_claim_ttl_ms = min_claim_ttl;
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
{
    match std::env::var(key) {
        Ok(value) => match value.parse::<T>() {
            Ok(parsed) => parsed,
            Err(_) => {
                warn!(
                    "The given {}: {} is not valid, falling back to the default: {}.",
                    key, value, default
                );
                default
            }
        },
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_falls_back_on_invalid_values() {
        std::env::set_var("NUDGE_TEST_BATCH_SIZE", "fifty");
        assert_eq!(parse_env("NUDGE_TEST_BATCH_SIZE", 50usize), 50);
        std::env::set_var("NUDGE_TEST_BATCH_SIZE", "20");
        assert_eq!(parse_env("NUDGE_TEST_BATCH_SIZE", 50usize), 20);
        assert_eq!(parse_env("NUDGE_TEST_UNSET_VARIABLE", 7u64), 7);
    }

    #[test]
    fn processing_timeout_fits_all_retries() {
        let mut config = Config::new();
        config.dispatch_max_attempts = 3;
        config.channel_timeout_ms = 10 * 1000;
        config.dispatch_backoff_ms = 500;
        config.dispatch_max_backoff_ms = 30 * 1000;
        config.reminder_processing_timeout_ms = 30 * 1000;
        config.reminder_claim_ttl_ms = 60 * 1000;

        assert_eq!(config.max_dispatch_duration_ms(), 31_500);
        config.enforce_timeouts();
        assert_eq!(config.reminder_processing_timeout_ms, 41_500);
        assert_eq!(config.reminder_claim_ttl_ms, 83_000);

        // Large enough values are kept
        config.reminder_processing_timeout_ms = 90 * 1000;
        config.reminder_claim_ttl_ms = 5 * 60 * 1000;
        config.enforce_timeouts();
        assert_eq!(config.reminder_processing_timeout_ms, 90 * 1000);
        assert_eq!(config.reminder_claim_ttl_ms, 5 * 60 * 1000);
    }

    #[test]
    fn default_timeouts_are_consistent() {
        let config = Config::new();
        assert!(
            config.reminder_processing_timeout_ms
                >= config.max_dispatch_duration_ms() + config.channel_timeout_ms
        );
        assert!(config.reminder_claim_ttl_ms >= 2 * config.reminder_processing_timeout_ms as i64);
    }

    #[test]
    fn blank_optional_values_are_ignored() {
        std::env::set_var("NUDGE_TEST_BLANK_URL", "  ");
        assert_eq!(optional_env("NUDGE_TEST_BLANK_URL"), None);
    }
}
