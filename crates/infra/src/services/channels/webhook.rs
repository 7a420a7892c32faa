use super::{ChannelError, INotificationChannel, NotificationPayload, WEBHOOK_KEY_HEADER};
use nudge_domain::Channel;
use tracing::debug;

/// Hands notifications to an external email or sms provider over a webhook.
/// The provider resolves the address of the user from `userId`.
pub struct WebhookChannel {
    channel: Channel,
    client: reqwest::Client,
    url: String,
    key: String,
}

impl WebhookChannel {
    pub fn new(channel: Channel, client: reqwest::Client, url: String, key: String) -> Self {
        Self {
            channel,
            client,
            url,
            key,
        }
    }
}

#[async_trait::async_trait]
impl INotificationChannel for WebhookChannel {
    fn channel(&self) -> Channel {
        self.channel
    }

    async fn send(&self, payload: &NotificationPayload) -> Result<(), ChannelError> {
        debug!(
            channel = %self.channel,
            reminder_id = %payload.reminder_id,
            "Posting notification webhook"
        );
        let res = self
            .client
            .post(&self.url)
            .header(WEBHOOK_KEY_HEADER, &self.key)
            .json(payload)
            .send()
            .await?;

        ChannelError::from_status(res.status())
    }
}
