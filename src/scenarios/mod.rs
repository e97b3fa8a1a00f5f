//! End-to-end lifecycle scenarios
//!
//! Each scenario acquires a token, builds the identity headers, walks a
//! resource through its lifecycle and checks every response on the way.
//! Fixtures are created before use and deleted after use; when a step fails
//! the fixtures still alive are deleted in reverse creation order and the
//! step's error is returned.

mod fields;
mod lifecycle;
mod profiles;
mod tasks;
mod webhooks;
mod workflows;

pub use fields::{multi_select_field, single_select_field};
pub use lifecycle::{lifecycle, organization};
pub use profiles::{profile, profile_type, profile_with_task};
pub use tasks::{custom_field_task, task};
pub use webhooks::{webhook, webhook_events};
pub use workflows::{workflow_crud, workflow_decision, workflow_deploy, workflow_mark_complete};

use serde::Serialize;
use std::fmt;
use std::fmt::Debug;

use crate::client::{DockClient, Session};
use crate::config::AppConfig;
use crate::error::{DockError, DockResult};
use crate::headers::Identity;
use crate::token::Scope;
use crate::utils;

/// Every scenario, in the order `run_scenario` runs them
pub const NAMES: &[&str] = &[
    "lifecycle",
    "organization",
    "task",
    "profile_type",
    "profile",
    "profile_with_task",
    "custom_field_task",
    "single_select_field",
    "multi_select_field",
    "workflow_crud",
    "workflow_deploy",
    "workflow_mark_complete",
    "workflow_decision",
    "webhook",
    "webhook_events",
];

/// Run a scenario by name
pub async fn run(name: &str, ctx: &ScenarioContext) -> DockResult<ScenarioReport> {
    match name {
        "lifecycle" => lifecycle(ctx).await,
        "organization" => organization(ctx).await,
        "task" => task(ctx).await,
        "profile_type" => profile_type(ctx).await,
        "profile" => profile(ctx).await,
        "profile_with_task" => profile_with_task(ctx).await,
        "custom_field_task" => custom_field_task(ctx).await,
        "single_select_field" => single_select_field(ctx).await,
        "multi_select_field" => multi_select_field(ctx).await,
        "workflow_crud" => workflow_crud(ctx).await,
        "workflow_deploy" => workflow_deploy(ctx).await,
        "workflow_mark_complete" => workflow_mark_complete(ctx).await,
        "workflow_decision" => workflow_decision(ctx).await,
        "webhook" => webhook(ctx).await,
        "webhook_events" => webhook_events(ctx).await,
        other => Err(DockError::Validation(format!("Unknown scenario: {}", other))),
    }
}

/// Everything a scenario needs
pub struct ScenarioContext {
    pub client: DockClient,
    pub config: AppConfig,
}

impl ScenarioContext {
    pub fn new(config: AppConfig) -> DockResult<Self> {
        let client = DockClient::new(&config)?;
        Ok(Self { client, config })
    }

    /// Session acting as the configured user inside the configured organization
    pub async fn user_session(&self, scopes: &[Scope]) -> DockResult<Session> {
        let identity = Identity::user_and_org(
            self.config.account.require_user()?,
            self.config.account.require_organization()?,
        );
        self.client.session(scopes, identity).await
    }

    /// Wait for asynchronous webhook verification or delivery
    pub async fn settle(&self) {
        utils::sleep(self.config.scenario.settle_delay_ms).await;
    }
}

/// Outcome of a successful scenario
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub name: &'static str,
    /// Completed steps, in order
    pub steps: Vec<String>,
    /// Every fixture created, as `kind:id`
    pub created: Vec<String>,
    /// Checks that could not run against this account
    pub notes: Vec<String>,
}

impl ScenarioReport {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            steps: Vec::new(),
            created: Vec::new(),
            notes: Vec::new(),
        }
    }
}

/// A resource created by a scenario
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fixture {
    Patient(String),
    PatientNote(String),
    User(String),
    Organization(String),
    Membership {
        organization_id: String,
        user_id: String,
    },
    TaskList(String),
    TaskGroup(String),
    Task(String),
    CustomField(String),
    ProfileType(String),
    Profile(String),
    WorkflowTemplate(String),
    Workflow(String),
    Webhook(String),
    DeveloperWebhook(String),
}

impl fmt::Display for Fixture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fixture::Patient(id) => write!(f, "patient:{}", id),
            Fixture::PatientNote(id) => write!(f, "patient_note:{}", id),
            Fixture::User(id) => write!(f, "user:{}", id),
            Fixture::Organization(id) => write!(f, "organization:{}", id),
            Fixture::Membership {
                organization_id,
                user_id,
            } => write!(f, "membership:{}/{}", organization_id, user_id),
            Fixture::TaskList(id) => write!(f, "task_list:{}", id),
            Fixture::TaskGroup(id) => write!(f, "task_group:{}", id),
            Fixture::Task(id) => write!(f, "task:{}", id),
            Fixture::CustomField(id) => write!(f, "custom_field:{}", id),
            Fixture::ProfileType(id) => write!(f, "profile_type:{}", id),
            Fixture::Profile(id) => write!(f, "profile:{}", id),
            Fixture::WorkflowTemplate(id) => write!(f, "workflow_template:{}", id),
            Fixture::Workflow(id) => write!(f, "workflow:{}", id),
            Fixture::Webhook(id) => write!(f, "webhook:{}", id),
            Fixture::DeveloperWebhook(id) => write!(f, "developer_webhook:{}", id),
        }
    }
}

impl Fixture {
    async fn delete(&self, client: &DockClient, session: &Session) -> DockResult<()> {
        match self {
            Fixture::Patient(id) => client.delete_patient(session, id).await.map(drop),
            Fixture::PatientNote(id) => client.delete_patient_note(session, id).await.map(drop),
            Fixture::User(id) => client.delete_user(session, id).await.map(drop),
            Fixture::Organization(id) => client.delete_organization(session, id).await.map(drop),
            Fixture::Membership {
                organization_id,
                user_id,
            } => client
                .remove_organization_member(session, organization_id, user_id)
                .await
                .map(drop),
            Fixture::TaskList(id) => client.delete_task_list(session, id).await.map(drop),
            Fixture::TaskGroup(id) => client.delete_task_group(session, id).await.map(drop),
            Fixture::Task(id) => client.delete_task(session, id).await,
            Fixture::CustomField(id) => client.delete_custom_field(session, id).await.map(drop),
            Fixture::ProfileType(id) => client.delete_profile_type(session, id).await.map(drop),
            Fixture::Profile(id) => client.delete_profile(session, id).await.map(drop),
            Fixture::WorkflowTemplate(id) => client.delete_workflow_template(session, id).await,
            Fixture::Workflow(id) => client.delete_workflow(session, id).await,
            Fixture::Webhook(id) => client.delete_webhook(session, id).await.map(drop),
            Fixture::DeveloperWebhook(id) => client
                .delete_developer_webhook(session, id)
                .await
                .map(drop),
        }
    }
}

/// A scenario in progress: its report and the fixtures still to delete
pub(crate) struct Run<'a> {
    pub ctx: &'a ScenarioContext,
    report: ScenarioReport,
    fixtures: Vec<(Fixture, Session)>,
}

impl<'a> Run<'a> {
    pub fn new(ctx: &'a ScenarioContext, name: &'static str) -> Self {
        tracing::info!(scenario = name, "Starting scenario");
        Self {
            ctx,
            report: ScenarioReport::new(name),
            fixtures: Vec::new(),
        }
    }

    pub fn client(&self) -> &'a DockClient {
        &self.ctx.client
    }

    pub fn config(&self) -> &'a AppConfig {
        &self.ctx.config
    }

    /// Record a completed step
    pub fn step(&mut self, step: impl Into<String>) {
        let step = step.into();
        tracing::info!(scenario = self.report.name, step = %step, "Step completed");
        self.report.steps.push(step);
    }

    /// Record a check that was skipped
    pub fn note(&mut self, note: impl Into<String>) {
        let note = note.into();
        tracing::warn!(scenario = self.report.name, note = %note, "Check skipped");
        self.report.notes.push(note);
    }

    /// Remember a fixture so it is deleted if a later step fails
    pub fn track(&mut self, fixture: Fixture, session: &Session) {
        tracing::debug!(scenario = self.report.name, fixture = %fixture, "Created fixture");
        self.report.created.push(fixture.to_string());
        self.fixtures.push((fixture, session.clone()));
    }

    /// The scenario deleted the fixture itself
    pub fn release(&mut self, fixture: &Fixture) {
        self.fixtures.retain(|(f, _)| f != fixture);
    }

    /// Delete remaining fixtures and settle the result
    ///
    /// A step error wins over a cleanup error.
    pub async fn finish(mut self, result: DockResult<()>) -> DockResult<ScenarioReport> {
        let name = self.report.name;
        let cleanup = self.cleanup().await;

        match (result, cleanup) {
            (Err(e), _) => {
                tracing::error!(scenario = name, error = %e, "Scenario failed");
                Err(e)
            }
            (Ok(()), Err(e)) => {
                tracing::error!(scenario = name, error = %e, "Scenario cleanup failed");
                Err(e)
            }
            (Ok(()), Ok(())) => {
                tracing::info!(
                    scenario = name,
                    steps = self.report.steps.len(),
                    "Scenario passed"
                );
                Ok(self.report)
            }
        }
    }

    async fn cleanup(&mut self) -> DockResult<()> {
        let mut first_error = None;

        while let Some((fixture, session)) = self.fixtures.pop() {
            match fixture.delete(self.client(), &session).await {
                Ok(()) => {
                    tracing::info!(scenario = self.report.name, fixture = %fixture, "Cleaned up fixture");
                }
                Err(e) => {
                    tracing::warn!(
                        scenario = self.report.name,
                        fixture = %fixture,
                        error = %e,
                        "Failed to clean up fixture"
                    );
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Fail the scenario unless `condition` holds
pub(crate) fn ensure(condition: bool, message: impl FnOnce() -> String) -> DockResult<()> {
    if condition {
        Ok(())
    } else {
        Err(DockError::Assertion(message()))
    }
}

/// Fail the scenario unless `actual == expected`
pub(crate) fn ensure_eq<T>(what: &str, actual: T, expected: T) -> DockResult<()>
where
    T: PartialEq + Debug,
{
    ensure(actual == expected, || {
        format!("{}: expected {:?}, got {:?}", what, expected, actual)
    })
}

/// Scopes used by most scenarios
pub(crate) const USER_SCOPES: &[Scope] = &[Scope::UserAllRead, Scope::UserAllWrite];

/// Confirm the configured user and organization, as every resource scenario starts with
pub(crate) async fn check_identity(run: &mut Run<'_>, session: &Session) -> DockResult<()> {
    let user_id = run.config().account.require_user()?;
    let organization_id = run.config().account.require_organization()?;

    let user = run.client().get_user(session, user_id).await?;
    ensure_eq("user id", user.id.as_str(), user_id)?;
    run.step("get user");

    let organization = run.client().current_organization(session).await?;
    ensure_eq("organization id", organization.id.as_str(), organization_id)?;
    run.step("get current organization");

    Ok(())
}
