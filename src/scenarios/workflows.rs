//! Workflow templates, deployed workflows and decision tasks

use super::{ensure_eq, Fixture, Run, ScenarioContext, ScenarioReport, USER_SCOPES};
use crate::client::Session;
use crate::error::{DockError, DockResult};
use crate::models::{
    DeployWorkflow, DeployedWorkflow, IdRef, IntentType, NewTask, NewTaskGroup, NewTaskLink,
    NewTaskList, NewTaskOutcome, NewWorkflowTemplate, TaskStatus, TaskUpdate, TemplateType,
    WorkflowTemplate, WorkflowUpdate,
};
use crate::utils;

const TEMPLATE_TYPE: TemplateType = TemplateType::Smartflow;

fn unique(prefix: &str) -> String {
    format!("{} {}", prefix, utils::short_suffix(21))
}

async fn create_template(run: &mut Run<'_>, session: &Session, name: &str) -> DockResult<WorkflowTemplate> {
    let template = run
        .client()
        .create_workflow_template(
            session,
            &NewWorkflowTemplate {
                name: name.to_string(),
                template_type: TEMPLATE_TYPE,
            },
        )
        .await?;
    run.track(Fixture::WorkflowTemplate(template.id.clone()), session);
    ensure_eq("template name", template.name.as_deref(), Some(name))?;
    ensure_eq("template type", template.template_type, Some(TEMPLATE_TYPE))?;
    run.step("create workflow template");
    Ok(template)
}

async fn delete_template(run: &mut Run<'_>, session: &Session, template_id: &str) -> DockResult<()> {
    run.client().delete_workflow_template(session, template_id).await?;
    run.release(&Fixture::WorkflowTemplate(template_id.to_string()));
    run.step("delete workflow template");
    Ok(())
}

/// Deploy a template into a list and group
async fn deploy(
    run: &mut Run<'_>,
    session: &Session,
    template_id: &str,
    list_id: &str,
    group_id: &str,
) -> DockResult<DeployedWorkflow> {
    let workflow = run
        .client()
        .deploy_workflow(
            session,
            &DeployWorkflow {
                task_list: IdRef::new(list_id),
                task_group: IdRef::new(group_id),
                task_workflow_template: IdRef::new(template_id),
            },
        )
        .await?;
    run.track(Fixture::Workflow(workflow.id.clone()), session);
    ensure_eq(
        "workflow task list",
        workflow.task_list.as_ref().and_then(|r| r.id.as_deref()),
        Some(list_id),
    )?;
    ensure_eq(
        "workflow task group",
        workflow.task_group.as_ref().and_then(|r| r.id.as_deref()),
        Some(group_id),
    )?;
    run.step("deploy workflow");
    Ok(workflow)
}

async fn delete_workflow(run: &mut Run<'_>, session: &Session, workflow_id: &str) -> DockResult<()> {
    run.client().delete_workflow(session, workflow_id).await?;
    run.release(&Fixture::Workflow(workflow_id.to_string()));
    run.step("delete deployed workflow");
    Ok(())
}

/// Add a task under a deployed workflow; the workflow stands in for the group
async fn add_workflow_task(
    run: &mut Run<'_>,
    session: &Session,
    description: &str,
    list_id: &str,
    workflow_id: &str,
) -> DockResult<String> {
    let task = run
        .client()
        .create_task(session, &NewTask::in_group(description, list_id, workflow_id))
        .await?;
    run.track(Fixture::Task(task.id.clone()), session);
    ensure_eq("task description", task.description.as_deref(), Some(description))?;
    run.step("add task to workflow");
    Ok(task.id)
}

async fn delete_task(run: &mut Run<'_>, session: &Session, task_id: &str) -> DockResult<()> {
    run.client().delete_task(session, task_id).await?;
    run.release(&Fixture::Task(task_id.to_string()));
    run.step("delete task");
    Ok(())
}

/// Create, fetch, rename and delete a workflow template
pub async fn workflow_crud(ctx: &ScenarioContext) -> DockResult<ScenarioReport> {
    let mut run = Run::new(ctx, "workflow_crud");
    let result = crud_steps(&mut run).await;
    run.finish(result).await
}

async fn crud_steps(run: &mut Run<'_>) -> DockResult<()> {
    let session = run.ctx.user_session(USER_SCOPES).await?;
    let name = unique("Test Workflow");

    let template = create_template(run, &session, &name).await?;

    let fetched = run.client().get_workflow_template(&session, &template.id).await?;
    ensure_eq("template id", fetched.id.as_str(), template.id.as_str())?;
    ensure_eq("template name", fetched.name.as_deref(), Some(name.as_str()))?;
    run.step("get workflow template");

    let updated_name = format!("{}- updated", name);
    let updated = run
        .client()
        .update_workflow_template(
            &session,
            &template.id,
            &WorkflowUpdate {
                name: updated_name.clone(),
            },
        )
        .await?;
    ensure_eq("template name", updated.name.as_deref(), Some(updated_name.as_str()))?;
    run.step("rename workflow template");

    delete_template(run, &session, &template.id).await
}

/// Deploy into the configured list and group, then edit and tear down
pub async fn workflow_deploy(ctx: &ScenarioContext) -> DockResult<ScenarioReport> {
    let mut run = Run::new(ctx, "workflow_deploy");
    let result = deploy_steps(&mut run).await;
    run.finish(result).await
}

async fn deploy_steps(run: &mut Run<'_>) -> DockResult<()> {
    let account = &run.config().account;
    let list_id = account.require_task_list()?;
    let group_id = account.require_task_group()?;
    let session = run.ctx.user_session(USER_SCOPES).await?;

    let name = unique("Test Workflow");
    let task_name = unique("Test Task");

    let template = create_template(run, &session, &name).await?;
    let workflow = deploy(run, &session, &template.id, list_id, group_id).await?;
    let task_id = add_workflow_task(run, &session, &task_name, list_id, &workflow.id).await?;

    let updated_task = format!("{} - updated", task_name);
    let task = run
        .client()
        .update_task(
            &session,
            &task_id,
            &TaskUpdate {
                description: Some(updated_task.clone()),
                ..Default::default()
            },
        )
        .await?;
    ensure_eq("task description", task.description.as_deref(), Some(updated_task.as_str()))?;
    run.step("rename task");

    let updated_name = format!("{} - updated", name);
    let renamed = run
        .client()
        .update_workflow(
            &session,
            &workflow.id,
            &WorkflowUpdate {
                name: updated_name.clone(),
            },
        )
        .await?;
    ensure_eq("workflow name", renamed.name.as_deref(), Some(updated_name.as_str()))?;
    run.step("rename deployed workflow");

    delete_task(run, &session, &task_id).await?;
    delete_workflow(run, &session, &workflow.id).await?;
    delete_template(run, &session, &template.id).await
}

/// Deploy into a fresh list and group and complete a task
pub async fn workflow_mark_complete(ctx: &ScenarioContext) -> DockResult<ScenarioReport> {
    let mut run = Run::new(ctx, "workflow_mark_complete");
    let result = mark_complete_steps(&mut run).await;
    run.finish(result).await
}

async fn mark_complete_steps(run: &mut Run<'_>) -> DockResult<()> {
    let session = run.ctx.user_session(USER_SCOPES).await?;
    let client = run.client();

    let list_name = unique("Test Task List");
    let list = client
        .create_task_list(
            &session,
            &NewTaskList {
                list_name: list_name.clone(),
                list_description: unique("Test Task List Description"),
            },
        )
        .await?;
    run.track(Fixture::TaskList(list.id.clone()), &session);
    ensure_eq("list name", list.list_name.as_deref(), Some(list_name.as_str()))?;
    run.step("create task list");

    let group_name = unique("Test Task Group");
    let group = client
        .create_task_group(
            &session,
            &NewTaskGroup {
                task_list: IdRef::new(&list.id),
                group_name: group_name.clone(),
            },
        )
        .await?;
    run.track(Fixture::TaskGroup(group.id.clone()), &session);
    ensure_eq("group name", group.group_name.as_deref(), Some(group_name.as_str()))?;
    run.step("create task group");

    let template = create_template(run, &session, &unique("Test Workflow")).await?;
    let workflow = deploy(run, &session, &template.id, &list.id, &group.id).await?;
    let task_id = add_workflow_task(run, &session, &unique("Test Task"), &list.id, &workflow.id).await?;

    let task = client
        .update_task(
            &session,
            &task_id,
            &TaskUpdate {
                status: Some(TaskStatus::Complete),
                ..Default::default()
            },
        )
        .await?;
    ensure_eq("task status", task.status, Some(TaskStatus::Complete))?;
    run.step("mark task complete");

    delete_task(run, &session, &task_id).await?;
    delete_workflow(run, &session, &workflow.id).await?;
    delete_template(run, &session, &template.id).await?;

    client.delete_task_group(&session, &group.id).await?;
    run.release(&Fixture::TaskGroup(group.id.clone()));
    client.delete_task_list(&session, &list.id).await?;
    run.release(&Fixture::TaskList(list.id.clone()));
    run.step("delete task list and group");

    Ok(())
}

/// Decision task with two outcomes, each gating a child task; deploy and
/// select an outcome
pub async fn workflow_decision(ctx: &ScenarioContext) -> DockResult<ScenarioReport> {
    let mut run = Run::new(ctx, "workflow_decision");
    let result = decision_steps(&mut run).await;
    run.finish(result).await
}

async fn decision_steps(run: &mut Run<'_>) -> DockResult<()> {
    let account = &run.config().account;
    let list_id = account.require_task_list()?;
    let group_id = account.require_task_group()?;
    let session = run.ctx.user_session(USER_SCOPES).await?;
    let client = run.client();

    let template = create_template(run, &session, &unique("Test Workflow")).await?;

    let mut task_ids = Vec::with_capacity(3);
    for (description, intent) in [
        ("Parent task", IntentType::Decision),
        ("Child task 1", IntentType::Standard),
        ("Child task 2", IntentType::Standard),
    ] {
        let task = client
            .create_task(&session, &NewTask::in_template(description, &template.id, intent))
            .await?;
        ensure_eq("task description", task.description.as_deref(), Some(description))?;
        run.step(format!("add {} to template", description.to_lowercase()));
        task_ids.push(task.id);
    }
    let parent_id = &task_ids[0];

    let mut outcome_ids = Vec::with_capacity(2);
    for name in ["Task Outcome 1", "Task Outcome 2"] {
        let outcome = client
            .create_task_outcome(
                &session,
                parent_id,
                &NewTaskOutcome {
                    name: name.to_string(),
                },
            )
            .await?;
        let outcome_id = outcome.task_outcome_identifier.ok_or_else(|| {
            DockError::Assertion(format!("Outcome identifier missing for {}", name))
        })?;
        run.step(format!("create outcome {}", name));
        outcome_ids.push(outcome_id);
    }

    for (child_id, outcome_id) in task_ids[1..].iter().zip(&outcome_ids) {
        client
            .create_task_link(
                &session,
                &NewTaskLink {
                    source_task_identifier: parent_id.clone(),
                    target_task_identifier: child_id.clone(),
                    is_dependent: true,
                    task_outcome_identifier: Some(outcome_id.clone()),
                },
            )
            .await?;
        run.step("link child task to outcome");
    }

    let workflow = deploy(run, &session, &template.id, list_id, group_id).await?;

    // Outcome ids are reassigned on deployment; find ours again by name
    let selected = workflow
        .tasks
        .first()
        .and_then(|t| t.outcome_named("Task Outcome 1"))
        .ok_or_else(|| {
            DockError::Assertion("No Task Outcome with the name \"Task Outcome 1\" found".to_string())
        })?;
    client.select_task_outcome(&session, selected).await?;
    run.step("select task outcome");

    delete_workflow(run, &session, &workflow.id).await?;
    delete_template(run, &session, &template.id).await
}
