//! `/list`, `/task/group` and `/task`

use reqwest::StatusCode;

use super::{DockClient, Session};
use crate::error::DockResult;
use crate::models::{NewTask, NewTaskGroup, NewTaskList, Task, TaskGroup, TaskList, TaskUpdate};

impl DockClient {
    pub async fn create_task_list(&self, session: &Session, list: &NewTaskList) -> DockResult<TaskList> {
        self.post(session, "/list", list).await
    }

    pub async fn delete_task_list(&self, session: &Session, list_id: &str) -> DockResult<TaskList> {
        self.delete(session, &format!("/list/{}", list_id), StatusCode::OK)
            .await
    }

    pub async fn create_task_group(
        &self,
        session: &Session,
        group: &NewTaskGroup,
    ) -> DockResult<TaskGroup> {
        self.post(session, "/task/group", group).await
    }

    pub async fn delete_task_group(&self, session: &Session, group_id: &str) -> DockResult<TaskGroup> {
        self.delete(session, &format!("/task/group/{}", group_id), StatusCode::OK)
            .await
    }

    pub async fn create_task(&self, session: &Session, task: &NewTask) -> DockResult<Task> {
        self.post(session, "/task", task).await
    }

    pub async fn get_task(&self, session: &Session, task_id: &str) -> DockResult<Task> {
        self.get(session, &format!("/task/{}", task_id), &[]).await
    }

    pub async fn update_task(
        &self,
        session: &Session,
        task_id: &str,
        update: &TaskUpdate,
    ) -> DockResult<Task> {
        self.patch(session, &format!("/task/{}", task_id), update)
            .await
    }

    /// `DELETE /task/{id}` answers `204 No Content`
    pub async fn delete_task(&self, session: &Session, task_id: &str) -> DockResult<()> {
        self.delete::<Option<serde_json::Value>>(
            session,
            &format!("/task/{}", task_id),
            StatusCode::NO_CONTENT,
        )
        .await?;
        Ok(())
    }
}
