mod disabled;
mod push_gateway;
mod webhook;

use crate::{repos::Repos, Config};
pub use disabled::DisabledChannel;
use nudge_domain::{Channel, EntityType, Reminder, ReminderKind, ID};
pub use push_gateway::PushGatewayChannel;
use serde::Serialize;
use std::{collections::HashMap, sync::Arc, time::Duration};
use thiserror::Error;
use tokio::sync::Semaphore;
pub use webhook::WebhookChannel;

pub const WEBHOOK_KEY_HEADER: &str = "nudge-webhook-key";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChannelError {
    #[error("The {0} channel is not configured")]
    Disabled(Channel),
    #[error("No recipient registered for the {0} channel")]
    NoRecipient(Channel),
    #[error("The provider did not answer in time")]
    Timeout,
    #[error("The provider rejected the notification with status {0}")]
    Rejected(u16),
    #[error("Unable to reach the provider: {0}")]
    Transport(String),
}

impl ChannelError {
    /// Whether trying again later may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Disabled(_) | Self::NoRecipient(_) => false,
            Self::Timeout | Self::Transport(_) => true,
            Self::Rejected(status) => *status == 429 || *status >= 500,
        }
    }

    fn from_status(status: reqwest::StatusCode) -> Result<(), Self> {
        if status.is_success() {
            Ok(())
        } else {
            Err(Self::Rejected(status.as_u16()))
        }
    }
}

impl From<reqwest::Error> for ChannelError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(e.to_string())
        }
    }
}

/// What is sent to a notification provider for one occurrence of a `Reminder`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPayload {
    pub reminder_id: ID,
    pub user_id: ID,
    pub entity_id: ID,
    pub entity_type: EntityType,
    pub kind: ReminderKind,
    pub message: Option<String>,
    /// The occurrence this notification is sent for
    pub scheduled_for: i64,
}

impl NotificationPayload {
    pub fn new(reminder: &Reminder, scheduled_for: i64) -> Self {
        Self {
            reminder_id: reminder.id.clone(),
            user_id: reminder.user_id.clone(),
            entity_id: reminder.entity_id.clone(),
            entity_type: reminder.entity_type,
            kind: reminder.kind,
            message: reminder.message.clone(),
            scheduled_for,
        }
    }
}

/// A provider that can deliver a notification through one `Channel`
#[async_trait::async_trait]
pub trait INotificationChannel: Send + Sync {
    fn channel(&self) -> Channel;
    async fn send(&self, payload: &NotificationPayload) -> Result<(), ChannelError>;
}

/// The channel providers together with the permits that bound how many
/// sends may be in flight at the same time.
#[derive(Clone)]
pub struct Channels {
    providers: HashMap<Channel, Arc<dyn INotificationChannel>>,
    permits: Arc<Semaphore>,
}

impl Channels {
    pub fn new(providers: Vec<Arc<dyn INotificationChannel>>, concurrency: usize) -> Self {
        Self {
            providers: providers
                .into_iter()
                .map(|provider| (provider.channel(), provider))
                .collect(),
            permits: Arc::new(Semaphore::new(concurrency.max(1))),
        }
    }

    pub fn from_config(config: &Config, repos: &Repos) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.channel_timeout_ms))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        let mut providers: Vec<Arc<dyn INotificationChannel>> = Vec::new();
        if let Some(url) = &config.push_gateway_url {
            providers.push(Arc::new(PushGatewayChannel::new(
                client.clone(),
                url.clone(),
                config.channel_webhook_key.clone(),
                repos.push_subscriptions.clone(),
            )));
        }
        let webhooks = [
            (Channel::Email, &config.email_webhook_url),
            (Channel::Sms, &config.sms_webhook_url),
        ];
        for (channel, url) in webhooks {
            if let Some(url) = url {
                providers.push(Arc::new(WebhookChannel::new(
                    channel,
                    client.clone(),
                    url.clone(),
                    config.channel_webhook_key.clone(),
                )));
            }
        }

        Self::new(providers, config.dispatch_concurrency)
    }

    /// Channels without a configured provider are served by `DisabledChannel`
    pub fn get(&self, channel: Channel) -> Arc<dyn INotificationChannel> {
        match self.providers.get(&channel) {
            Some(provider) => provider.clone(),
            None => Arc::new(DisabledChannel::new(channel)),
        }
    }

    pub fn permits(&self) -> Arc<Semaphore> {
        self.permits.clone()
    }
}
