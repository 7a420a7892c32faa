use super::{ChannelError, INotificationChannel, NotificationPayload, WEBHOOK_KEY_HEADER};
use crate::repos::IPushSubscriptionRepo;
use nudge_domain::{Channel, PushSubscription};
use reqwest::StatusCode;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Delivers push notifications through a web push gateway, once for every
/// subscription the user has registered.
pub struct PushGatewayChannel {
    client: reqwest::Client,
    url: String,
    key: String,
    subscriptions: Arc<dyn IPushSubscriptionRepo>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PushKeys<'a> {
    p256dh: &'a str,
    auth: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PushRequest<'a> {
    endpoint: &'a str,
    keys: PushKeys<'a>,
    payload: &'a NotificationPayload,
}

impl PushGatewayChannel {
    pub fn new(
        client: reqwest::Client,
        url: String,
        key: String,
        subscriptions: Arc<dyn IPushSubscriptionRepo>,
    ) -> Self {
        Self {
            client,
            url,
            key,
            subscriptions,
        }
    }

    async fn push(
        &self,
        subscription: &PushSubscription,
        payload: &NotificationPayload,
    ) -> Result<(), ChannelError> {
        let body = PushRequest {
            endpoint: &subscription.endpoint,
            keys: PushKeys {
                p256dh: &subscription.p256dh,
                auth: &subscription.auth,
            },
            payload,
        };
        let res = self
            .client
            .post(&self.url)
            .header(WEBHOOK_KEY_HEADER, &self.key)
            .json(&body)
            .send()
            .await?;

        let status = res.status();
        if status == StatusCode::GONE || status == StatusCode::NOT_FOUND {
            info!(
                "Push subscription {} is gone, removing it",
                subscription.id
            );
            self.subscriptions.delete(&subscription.id).await;
        }
        ChannelError::from_status(status)
    }
}

#[async_trait::async_trait]
impl INotificationChannel for PushGatewayChannel {
    fn channel(&self) -> Channel {
        Channel::Push
    }

    async fn send(&self, payload: &NotificationPayload) -> Result<(), ChannelError> {
        let subscriptions = self.subscriptions.find_by_user(&payload.user_id).await;
        if subscriptions.is_empty() {
            return Err(ChannelError::NoRecipient(Channel::Push));
        }

        let mut last_error = None;
        let mut delivered = 0;
        for subscription in &subscriptions {
            match self.push(subscription, payload).await {
                Ok(_) => delivered += 1,
                Err(e) => {
                    warn!(
                        "Push to subscription {} failed. Err: {:?}",
                        subscription.id, e
                    );
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if delivered == 0 => Err(e),
            _ => Ok(()),
        }
    }
}
