//! `/taskWorkflowTemplate`, `/taskWorkflow`, outcomes and links

use reqwest::StatusCode;

use super::{DockClient, Session};
use crate::error::DockResult;
use crate::models::{
    DeployWorkflow, DeployedWorkflow, NewTaskLink, NewTaskOutcome, NewWorkflowTemplate,
    TaskOutcome, WorkflowTemplate, WorkflowUpdate,
};

impl DockClient {
    pub async fn create_workflow_template(
        &self,
        session: &Session,
        template: &NewWorkflowTemplate,
    ) -> DockResult<WorkflowTemplate> {
        self.post(session, "/taskWorkflowTemplate", template).await
    }

    pub async fn get_workflow_template(
        &self,
        session: &Session,
        template_id: &str,
    ) -> DockResult<WorkflowTemplate> {
        self.get(session, &format!("/taskWorkflowTemplate/{}", template_id), &[])
            .await
    }

    pub async fn update_workflow_template(
        &self,
        session: &Session,
        template_id: &str,
        update: &WorkflowUpdate,
    ) -> DockResult<WorkflowTemplate> {
        self.patch(session, &format!("/taskWorkflowTemplate/{}", template_id), update)
            .await
    }

    /// Templates answer `200` on delete, unlike deployed workflows; the body is ignored
    pub async fn delete_workflow_template(
        &self,
        session: &Session,
        template_id: &str,
    ) -> DockResult<()> {
        self.delete::<Option<serde_json::Value>>(
            session,
            &format!("/taskWorkflowTemplate/{}", template_id),
            StatusCode::OK,
        )
        .await?;
        Ok(())
    }

    /// `POST /taskWorkflow`: instantiate a template into a task list and group
    pub async fn deploy_workflow(
        &self,
        session: &Session,
        deploy: &DeployWorkflow,
    ) -> DockResult<DeployedWorkflow> {
        self.post(session, "/taskWorkflow", deploy).await
    }

    pub async fn update_workflow(
        &self,
        session: &Session,
        workflow_id: &str,
        update: &WorkflowUpdate,
    ) -> DockResult<DeployedWorkflow> {
        self.patch(session, &format!("/taskWorkflow/{}", workflow_id), update)
            .await
    }

    /// `DELETE /taskWorkflow/{id}` answers `204 No Content`
    pub async fn delete_workflow(&self, session: &Session, workflow_id: &str) -> DockResult<()> {
        self.delete::<Option<serde_json::Value>>(
            session,
            &format!("/taskWorkflow/{}", workflow_id),
            StatusCode::NO_CONTENT,
        )
        .await?;
        Ok(())
    }

    /// `POST /outcome/{taskId}`: add an outcome to a decision task
    pub async fn create_task_outcome(
        &self,
        session: &Session,
        task_id: &str,
        outcome: &NewTaskOutcome,
    ) -> DockResult<TaskOutcome> {
        self.post(session, &format!("/outcome/{}", task_id), outcome)
            .await
    }

    /// `POST /link/`
    pub async fn create_task_link(
        &self,
        session: &Session,
        link: &NewTaskLink,
    ) -> DockResult<serde_json::Value> {
        self.post(session, "/link/", link).await
    }

    /// `PATCH /select/{outcomeId}`: choose the outcome of a deployed decision task
    pub async fn select_task_outcome(
        &self,
        session: &Session,
        outcome_id: &str,
    ) -> DockResult<serde_json::Value> {
        self.patch_empty(session, &format!("/select/{}", outcome_id))
            .await
    }
}
