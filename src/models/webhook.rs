//! Webhooks, events and delivery attempts

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use super::Extra;

/// Event types a webhook subscribes to
///
/// Values the API adds later are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventType {
    CreateOrganization,
    UpdateOrganization,
    CreateUser,
    UpdateUser,
    DeleteUser,
    CreatePatient,
    UpdatePatient,
    DeletePatient,
    CreateTask,
    UpdateTask,
    DeleteTask,
    Other(String),
}

impl EventType {
    pub fn as_str(&self) -> &str {
        match self {
            EventType::CreateOrganization => "CREATE_ORGANIZATION",
            EventType::UpdateOrganization => "UPDATE_ORGANIZATION",
            EventType::CreateUser => "CREATE_USER",
            EventType::UpdateUser => "UPDATE_USER",
            EventType::DeleteUser => "DELETE_USER",
            EventType::CreatePatient => "CREATE_PATIENT",
            EventType::UpdatePatient => "UPDATE_PATIENT",
            EventType::DeletePatient => "DELETE_PATIENT",
            EventType::CreateTask => "CREATE_TASK",
            EventType::UpdateTask => "UPDATE_TASK",
            EventType::DeleteTask => "DELETE_TASK",
            EventType::Other(s) => s,
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "CREATE_ORGANIZATION" => EventType::CreateOrganization,
            "UPDATE_ORGANIZATION" => EventType::UpdateOrganization,
            "CREATE_USER" => EventType::CreateUser,
            "UPDATE_USER" => EventType::UpdateUser,
            "DELETE_USER" => EventType::DeleteUser,
            "CREATE_PATIENT" => EventType::CreatePatient,
            "UPDATE_PATIENT" => EventType::UpdatePatient,
            "DELETE_PATIENT" => EventType::DeletePatient,
            "CREATE_TASK" => EventType::CreateTask,
            "UPDATE_TASK" => EventType::UpdateTask,
            "DELETE_TASK" => EventType::DeleteTask,
            other => EventType::Other(other.to_string()),
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for EventType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EventType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(EventType::parse(&s))
    }
}

/// An organization webhook (`/webhook`) or developer webhook (`/developer/webhook`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Webhook {
    pub id: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub secret: Option<String>,
    /// Set asynchronously once the callback answers the challenge
    #[serde(default)]
    pub verified: Option<bool>,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default, deserialize_with = "super::null_as_empty")]
    pub events: Vec<EventType>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Webhook {
    pub fn is_verified(&self) -> bool {
        self.verified.unwrap_or(false)
    }
}

/// Body for creating or replacing a webhook
#[derive(Debug, Clone, Serialize)]
pub struct WebhookInput {
    pub url: String,
    pub secret: String,
    pub events: Vec<EventType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

/// An event recorded for an organization
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(default)]
    pub event_identifier: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// One attempt at delivering an event to a webhook
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryAttempt {
    #[serde(default)]
    pub event_identifier: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}
