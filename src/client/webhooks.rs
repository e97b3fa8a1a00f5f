//! `/webhook`: organization-scoped webhooks

use reqwest::StatusCode;

use super::{DockClient, Session};
use crate::error::DockResult;
use crate::models::{Webhook, WebhookInput};

impl DockClient {
    pub async fn list_webhooks(&self, session: &Session) -> DockResult<Vec<Webhook>> {
        self.get(session, "/webhook", &[]).await
    }

    /// Created unverified; Dock Health challenges the callback URL asynchronously
    pub async fn create_webhook(&self, session: &Session, webhook: &WebhookInput) -> DockResult<Webhook> {
        self.post(session, "/webhook", webhook).await
    }

    pub async fn get_webhook(&self, session: &Session, webhook_id: &str) -> DockResult<Webhook> {
        self.get(session, &format!("/webhook/{}", webhook_id), &[])
            .await
    }

    /// `PUT /webhook/{id}`; any update resets `verified` until the next challenge
    pub async fn update_webhook(
        &self,
        session: &Session,
        webhook_id: &str,
        webhook: &WebhookInput,
    ) -> DockResult<Webhook> {
        self.put(session, &format!("/webhook/{}", webhook_id), webhook)
            .await
    }

    pub async fn delete_webhook(&self, session: &Session, webhook_id: &str) -> DockResult<Webhook> {
        self.delete(session, &format!("/webhook/{}", webhook_id), StatusCode::OK)
            .await
    }
}
