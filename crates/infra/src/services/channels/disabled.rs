use super::{ChannelError, INotificationChannel, NotificationPayload};
use nudge_domain::Channel;

/// Stands in for a `Channel` that has no provider configured
pub struct DisabledChannel {
    channel: Channel,
}

impl DisabledChannel {
    pub fn new(channel: Channel) -> Self {
        Self { channel }
    }
}

#[async_trait::async_trait]
impl INotificationChannel for DisabledChannel {
    fn channel(&self) -> Channel {
        self.channel
    }

    async fn send(&self, _payload: &NotificationPayload) -> Result<(), ChannelError> {
        Err(ChannelError::Disabled(self.channel))
    }
}
