//! Task lists, groups, tasks and task custom fields

use serde_json::{json, Value};

use super::{check_identity, ensure_eq, Fixture, Run, ScenarioContext, ScenarioReport, USER_SCOPES};
use crate::client::Session;
use crate::error::DockResult;
use crate::models::{
    FieldCategoryType, FieldType, IdRef, MetaData, NewCustomField, NewTask, NewTaskGroup,
    NewTaskList, TargetType, TaskGroup, TaskList,
};

pub(crate) const LIST_NAME: &str = "TaskList lifecycle test";
pub(crate) const LIST_DESCRIPTION: &str = "TaskList lifecycle test description";
pub(crate) const GROUP_NAME: &str = "TaskGroup lifecycle test2";

/// Create a task list and a group in it
pub(crate) async fn create_list_and_group(
    run: &mut Run<'_>,
    session: &Session,
) -> DockResult<(TaskList, TaskGroup)> {
    let client = run.client();

    let list = client
        .create_task_list(
            session,
            &NewTaskList {
                list_name: LIST_NAME.to_string(),
                list_description: LIST_DESCRIPTION.to_string(),
            },
        )
        .await?;
    run.track(Fixture::TaskList(list.id.clone()), session);
    ensure_eq("list name", list.list_name.as_deref(), Some(LIST_NAME))?;
    ensure_eq(
        "list description",
        list.list_description.as_deref(),
        Some(LIST_DESCRIPTION),
    )?;
    run.step("create task list");

    let group = client
        .create_task_group(
            session,
            &NewTaskGroup {
                task_list: IdRef::new(&list.id),
                group_name: GROUP_NAME.to_string(),
            },
        )
        .await?;
    run.track(Fixture::TaskGroup(group.id.clone()), session);
    ensure_eq("group name", group.group_name.as_deref(), Some(GROUP_NAME))?;
    run.step("create task group");

    Ok((list, group))
}

/// Delete a group and then its list
pub(crate) async fn delete_list_and_group(
    run: &mut Run<'_>,
    session: &Session,
    list: &TaskList,
    group: &TaskGroup,
) -> DockResult<()> {
    run.client().delete_task_group(session, &group.id).await?;
    run.release(&Fixture::TaskGroup(group.id.clone()));
    run.step("delete task group");

    run.client().delete_task_list(session, &list.id).await?;
    run.release(&Fixture::TaskList(list.id.clone()));
    run.step("delete task list");

    Ok(())
}

/// Create a task custom field and check what came back
async fn create_task_field(
    run: &mut Run<'_>,
    session: &Session,
    field_type: FieldType,
    name: &str,
) -> DockResult<String> {
    let field = run
        .client()
        .create_custom_field(
            session,
            &NewCustomField::new(TargetType::Task, FieldCategoryType::TaskCore, field_type, name),
        )
        .await?;
    run.track(Fixture::CustomField(field.id.clone()), session);
    ensure_eq("target type", field.target_type, Some(TargetType::Task))?;
    ensure_eq(
        "field category",
        field.field_category_type,
        Some(FieldCategoryType::TaskCore),
    )?;
    ensure_eq("field type", field.field_type, Some(field_type))?;
    ensure_eq("field name", field.name.as_deref(), Some(name))?;
    run.step(format!("create {} custom field", name));
    Ok(field.id)
}

async fn delete_field(run: &mut Run<'_>, session: &Session, field_id: &str) -> DockResult<()> {
    run.client().delete_custom_field(session, field_id).await?;
    run.release(&Fixture::CustomField(field_id.to_string()));
    Ok(())
}

async fn delete_task(run: &mut Run<'_>, session: &Session, task_id: &str) -> DockResult<()> {
    run.client().delete_task(session, task_id).await?;
    run.release(&Fixture::Task(task_id.to_string()));
    run.step("delete task");
    Ok(())
}

/// A task in a new list and group, carrying one TEXT custom field value
pub async fn task(ctx: &ScenarioContext) -> DockResult<ScenarioReport> {
    let mut run = Run::new(ctx, "task");
    let result = task_steps(&mut run).await;
    run.finish(result).await
}

async fn task_steps(run: &mut Run<'_>) -> DockResult<()> {
    let session = run.ctx.user_session(USER_SCOPES).await?;
    check_identity(run, &session).await?;

    let (list, group) = create_list_and_group(run, &session).await?;
    let field_id = create_task_field(run, &session, FieldType::Text, "text field").await?;

    let description = "Task lifecycle test description";
    let value = "my custom field text value";
    let mut new_task = NewTask::in_group(description, &list.id, &group.id);
    new_task.task_meta_data = vec![MetaData::value(&field_id, value)];

    let created = run.client().create_task(&session, &new_task).await?;
    run.track(Fixture::Task(created.id.clone()), &session);
    ensure_eq("task list", created.task_list_id(), Some(list.id.as_str()))?;
    ensure_eq("description", created.description.as_deref(), Some(description))?;
    let meta = created
        .task_meta_data
        .as_ref()
        .and_then(|m| m.first());
    ensure_eq(
        "custom field",
        meta.map(|m| m.custom_field_identifier.as_str()),
        Some(field_id.as_str()),
    )?;
    ensure_eq(
        "custom field value",
        meta.and_then(|m| m.value.as_ref()),
        Some(&Value::from(value)),
    )?;
    run.step("create task");

    delete_task(run, &session, &created.id).await?;
    delete_field(run, &session, &field_id).await?;
    run.step("delete custom field");
    delete_list_and_group(run, &session, &list, &group).await
}

/// Field types a task can carry, with a sample value for each
fn task_field_samples() -> Vec<(FieldType, &'static str, Value)> {
    vec![
        (FieldType::Text, "Short Text Field", json!("my custom field text value")),
        (FieldType::LongText, "Rich Text Field", json!("my custom field rich text value")),
        (FieldType::Number, "Number", json!(123)),
        (FieldType::Date, "Calendar Date", json!("2024-05-22T07:00:00.000Z")),
        (FieldType::Hyperlink, "Link", json!("https://www.dock.health")),
        (FieldType::Boolean, "Yes/No", json!(true)),
    ]
}

/// A task carrying a value for every scalar custom field type
pub async fn custom_field_task(ctx: &ScenarioContext) -> DockResult<ScenarioReport> {
    let mut run = Run::new(ctx, "custom_field_task");
    let result = custom_field_task_steps(&mut run).await;
    run.finish(result).await
}

async fn custom_field_task_steps(run: &mut Run<'_>) -> DockResult<()> {
    let session = run.ctx.user_session(USER_SCOPES).await?;
    check_identity(run, &session).await?;

    let (list, group) = create_list_and_group(run, &session).await?;

    let mut field_ids = Vec::new();
    let mut meta_data = Vec::new();
    for (field_type, name, value) in task_field_samples() {
        let field_id = create_task_field(run, &session, field_type, name).await?;
        meta_data.push(MetaData::value(&field_id, value));
        field_ids.push(field_id);
    }

    let description = "Task lifecycle test description";
    let mut new_task = NewTask::in_group(description, &list.id, &group.id);
    new_task.task_meta_data = meta_data;

    let created = run.client().create_task(&session, &new_task).await?;
    run.track(Fixture::Task(created.id.clone()), &session);
    ensure_eq("task list", created.task_list_id(), Some(list.id.as_str()))?;
    ensure_eq("description", created.description.as_deref(), Some(description))?;
    run.step("create task");

    delete_task(run, &session, &created.id).await?;
    for field_id in &field_ids {
        delete_field(run, &session, field_id).await?;
    }
    run.step("delete custom fields");
    delete_list_and_group(run, &session, &list, &group).await
}
