//! Dock Health resource models
//!
//! Response models keep every field the API returns: the ones the scenarios
//! look at are typed, the rest land in the flattened `extra` map.
//! Request bodies are separate structs so optional fields can be omitted.

pub mod directory;
pub mod field;
pub mod patient;
pub mod profile;
pub mod task;
pub mod webhook;

pub use directory::{
    DeveloperAccount, NewOrganization, NewUser, Organization, OrganizationUpdate, User, UserUpdate,
};
pub use field::{
    CustomField, CustomFieldUpdate, DisplayOption, FieldCategoryType, FieldOption, FieldType,
    MetaData, NewCustomField, NewFieldOption, TargetType,
};
pub use patient::{NewPatientNote, Patient, PatientInput, PatientNote, PatientNoteUpdate};
pub use profile::{
    FieldIdentifier, NewProfile, NewProfileType, Profile, ProfileFieldValue, ProfileType,
    ProfileValue,
};
pub use task::{
    DeployWorkflow, DeployedWorkflow, IntentType, NewTask, NewTaskGroup, NewTaskLink,
    NewTaskList, NewTaskOutcome, NewWorkflowTemplate, Task, TaskGroup, TaskList, TaskOutcome,
    TaskStatus, TaskUpdate, TemplateType, WorkflowTemplate, WorkflowUpdate,
};
pub use webhook::{DeliveryAttempt, Event, EventType, Webhook, WebhookInput};

use serde::{Deserialize, Deserializer, Serialize};

/// Fields the typed model does not name
pub type Extra = serde_json::Map<String, serde_json::Value>;

/// `{ "id": ... }` reference to another resource
///
/// The id is serialized even when `None`: decision tasks are created with
/// `taskList: { id: null }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdRef {
    pub id: Option<String>,
}

impl IdRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: Some(id.into()) }
    }

    /// Explicit `{ "id": null }`
    pub fn null() -> Self {
        Self { id: None }
    }
}

/// Decode a list that the API may send as `null`
pub(crate) fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<Vec<T>>::deserialize(deserializer).map(Option::unwrap_or_default)
}
