//! Task lists, groups, tasks and workflows

use serde::{Deserialize, Serialize};

use super::{Extra, IdRef, MetaData};

/// Task completion status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskStatus {
    Complete,
    Incomplete,
    #[serde(other)]
    Unknown,
}

/// `DECISION` tasks branch through outcomes; everything else is `STANDARD`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IntentType {
    Standard,
    Decision,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TemplateType {
    Workflow,
    Smartflow,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskList {
    pub id: String,
    #[serde(default)]
    pub list_name: Option<String>,
    #[serde(default)]
    pub list_description: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTaskList {
    pub list_name: String,
    pub list_description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskGroup {
    pub id: String,
    #[serde(default)]
    pub group_name: Option<String>,
    #[serde(default)]
    pub task_list: Option<IdRef>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTaskGroup {
    pub task_list: IdRef,
    pub group_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub task_list: Option<IdRef>,
    #[serde(default)]
    pub task_group: Option<IdRef>,
    #[serde(default)]
    pub task_meta_data: Option<Vec<MetaData>>,
    /// Outcomes of a decision task
    #[serde(default, deserialize_with = "super::null_as_empty")]
    pub task_outcomes: Vec<TaskOutcome>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Task {
    pub fn task_list_id(&self) -> Option<&str> {
        self.task_list.as_ref().and_then(|r| r.id.as_deref())
    }

    /// Identifier of the outcome with the given name
    pub fn outcome_named(&self, name: &str) -> Option<&str> {
        self.task_outcomes
            .iter()
            .find(|o| o.name.as_deref() == Some(name))
            .and_then(|o| o.task_outcome_identifier.as_deref())
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_list: Option<IdRef>,
    /// A task group, or a deployed workflow id when adding a task under a workflow
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_group: Option<IdRef>,
    /// Workflow template the task belongs to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_workflow: Option<IdRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent_type: Option<IntentType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_identifier: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub task_meta_data: Vec<MetaData>,
}

impl NewTask {
    /// Task in a list and group
    pub fn in_group(
        description: impl Into<String>,
        task_list_id: impl Into<String>,
        task_group_id: impl Into<String>,
    ) -> Self {
        Self {
            description: description.into(),
            task_list: Some(IdRef::new(task_list_id)),
            task_group: Some(IdRef::new(task_group_id)),
            ..Default::default()
        }
    }

    /// Task attached to a workflow template rather than a list
    pub fn in_template(
        description: impl Into<String>,
        template_id: impl Into<String>,
        intent_type: IntentType,
    ) -> Self {
        Self {
            description: description.into(),
            task_list: Some(IdRef::null()),
            task_workflow: Some(IdRef::new(template_id)),
            intent_type: Some(intent_type),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowTemplate {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub template_type: Option<TemplateType>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWorkflowTemplate {
    pub name: String,
    pub template_type: TemplateType,
}

/// Body for renaming a template or a deployed workflow
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowUpdate {
    pub name: String,
}

/// Template instantiated into a task list and group
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployedWorkflow {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub task_list: Option<IdRef>,
    #[serde(default)]
    pub task_group: Option<IdRef>,
    #[serde(default, deserialize_with = "super::null_as_empty")]
    pub tasks: Vec<Task>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployWorkflow {
    pub task_list: IdRef,
    pub task_group: IdRef,
    pub task_workflow_template: IdRef,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskOutcome {
    #[serde(default)]
    pub task_outcome_identifier: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewTaskOutcome {
    pub name: String,
}

/// Dependency between two tasks, optionally gated on an outcome of the source
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTaskLink {
    pub source_task_identifier: String,
    pub target_task_identifier: String,
    pub is_dependent: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_outcome_identifier: Option<String>,
}
