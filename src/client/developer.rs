//! `/developer`: developer-account endpoints, called with developer headers only

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use reqwest::StatusCode;

use super::{DockClient, Session};
use crate::error::{DockError, DockResult};
use crate::models::{DeliveryAttempt, DeveloperAccount, Event, Organization, User, Webhook, WebhookInput};

/// Selects events or delivery attempts for an organization
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventFilter {
    /// A single event by identifier
    Event(String),
    /// Everything between two instants
    Range {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

impl EventFilter {
    /// The last `window` up to now
    pub fn last(window: Duration) -> Self {
        let end = Utc::now();
        EventFilter::Range {
            start: end - window,
            end,
        }
    }

    /// The last 24 hours
    pub fn today() -> Self {
        Self::last(Duration::days(1))
    }

    fn query(&self, organization_id: &str) -> Vec<(&'static str, String)> {
        let mut query = vec![("organization", organization_id.to_string())];
        match self {
            EventFilter::Event(id) => query.push(("event", id.clone())),
            EventFilter::Range { start, end } => {
                query.push(("startTs", iso_timestamp(start)));
                query.push(("endTs", iso_timestamp(end)));
            }
        }
        query
    }
}

/// `2024-05-22T07:00:00.000Z`
fn iso_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl DockClient {
    pub async fn developer_account(&self, session: &Session) -> DockResult<DeveloperAccount> {
        self.get(session, "/developer", &[]).await
    }

    /// Organizations associated with the developer account
    pub async fn developer_organizations(&self, session: &Session) -> DockResult<Vec<Organization>> {
        self.get(session, "/developer/organization", &[]).await
    }

    /// `GET /developer/user?organization={id}`
    pub async fn developer_users(
        &self,
        session: &Session,
        organization_id: &str,
    ) -> DockResult<Vec<User>> {
        self.get(session, "/developer/user", &[("organization", organization_id)])
            .await
    }

    pub async fn developer_events(
        &self,
        session: &Session,
        organization_id: &str,
        filter: &EventFilter,
    ) -> DockResult<Vec<Event>> {
        let query = filter.query(organization_id);
        let query: Vec<(&str, &str)> = query.iter().map(|(k, v)| (*k, v.as_str())).collect();
        self.get(session, "/developer/event", &query).await
    }

    pub async fn developer_event_deliveries(
        &self,
        session: &Session,
        organization_id: &str,
        filter: &EventFilter,
    ) -> DockResult<Vec<DeliveryAttempt>> {
        let query = filter.query(organization_id);
        let query: Vec<(&str, &str)> = query.iter().map(|(k, v)| (*k, v.as_str())).collect();
        self.get(session, "/developer/event/delivery", &query).await
    }

    pub async fn list_developer_webhooks(&self, session: &Session) -> DockResult<Vec<Webhook>> {
        self.get(session, "/developer/webhook", &[]).await
    }

    pub async fn create_developer_webhook(
        &self,
        session: &Session,
        webhook: &WebhookInput,
    ) -> DockResult<Webhook> {
        self.post(session, "/developer/webhook", webhook).await
    }

    pub async fn get_developer_webhook(&self, session: &Session, webhook_id: &str) -> DockResult<Webhook> {
        self.get(session, &format!("/developer/webhook/{}", webhook_id), &[])
            .await
    }

    pub async fn delete_developer_webhook(
        &self,
        session: &Session,
        webhook_id: &str,
    ) -> DockResult<Webhook> {
        self.delete(
            session,
            &format!("/developer/webhook/{}", webhook_id),
            StatusCode::OK,
        )
        .await
    }

    /// The organization whose domain matches the account's `DOMAIN`
    pub async fn find_default_organization(
        &self,
        session: &Session,
        domain: &str,
    ) -> DockResult<Organization> {
        self.developer_organizations(session)
            .await?
            .into_iter()
            .find(|org| org.domain.as_deref() == Some(domain))
            .ok_or_else(|| {
                DockError::Assertion(format!("Default organization not found: {}", domain))
            })
    }

    /// The user of `organization_id` whose email matches the account's `EMAIL`
    pub async fn find_default_user(
        &self,
        session: &Session,
        organization_id: &str,
        email: &str,
    ) -> DockResult<User> {
        self.developer_users(session, organization_id)
            .await?
            .into_iter()
            .find(|user| user.email.as_deref() == Some(email))
            .ok_or_else(|| DockError::Assertion(format!("Default user not found: {}", email)))
    }
}
