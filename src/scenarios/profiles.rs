//! Profile types, profile fields and profiles

use super::tasks::{create_list_and_group, delete_list_and_group};
use super::{check_identity, ensure_eq, Fixture, Run, ScenarioContext, ScenarioReport, USER_SCOPES};
use crate::client::Session;
use crate::error::DockResult;
use crate::models::{
    FieldCategoryType, FieldType, IdRef, NewCustomField, NewProfile, NewProfileType, NewTask,
    ProfileFieldValue, ProfileType, TargetType,
};
use crate::utils;

const PROFILE_FIELD_NAME: &str = "text field for profile";

async fn create_profile_type(run: &mut Run<'_>, session: &Session) -> DockResult<ProfileType> {
    let profile_type = run
        .client()
        .create_profile_type(
            session,
            &NewProfileType {
                name: format!("ProfileType lifecycle test {}", utils::short_suffix(4)),
                description: format!(
                    "ProfileType lifecycle test description {}",
                    utils::short_suffix(4)
                ),
            },
        )
        .await?;
    run.track(Fixture::ProfileType(profile_type.id.clone()), session);
    run.step("create profile type");
    Ok(profile_type)
}

async fn delete_profile_type(run: &mut Run<'_>, session: &Session, type_id: &str) -> DockResult<()> {
    run.client().delete_profile_type(session, type_id).await?;
    run.release(&Fixture::ProfileType(type_id.to_string()));
    run.step("delete profile type");
    Ok(())
}

/// A TEXT field on profiles of `type_id`
async fn create_profile_field(run: &mut Run<'_>, session: &Session, type_id: &str) -> DockResult<String> {
    let mut new_field = NewCustomField::new(
        TargetType::Profile,
        FieldCategoryType::TaskCore,
        FieldType::Text,
        PROFILE_FIELD_NAME,
    );
    new_field.related_profile_type = Some(IdRef::new(type_id));

    let field = run.client().create_custom_field(session, &new_field).await?;
    run.track(Fixture::CustomField(field.id.clone()), session);
    ensure_eq("target type", field.target_type, Some(TargetType::Profile))?;
    ensure_eq(
        "field category",
        field.field_category_type,
        Some(FieldCategoryType::TaskCore),
    )?;
    ensure_eq("field type", field.field_type, Some(FieldType::Text))?;
    ensure_eq("field name", field.name.as_deref(), Some(PROFILE_FIELD_NAME))?;
    run.step("create profile custom field");
    Ok(field.id)
}

async fn delete_field(run: &mut Run<'_>, session: &Session, field_id: &str) -> DockResult<()> {
    run.client().delete_custom_field(session, field_id).await?;
    run.release(&Fixture::CustomField(field_id.to_string()));
    run.step("delete custom field");
    Ok(())
}

async fn create_profile(
    run: &mut Run<'_>,
    session: &Session,
    type_id: &str,
    field_id: &str,
) -> DockResult<String> {
    let profile = run
        .client()
        .create_profile(
            session,
            &NewProfile {
                profile_type_id: type_id.to_string(),
                fields: vec![ProfileFieldValue::text(
                    field_id,
                    format!("my custom field text value{}", utils::short_suffix(4)),
                )],
            },
        )
        .await?;
    run.track(Fixture::Profile(profile.id.clone()), session);
    run.step("create profile");
    Ok(profile.id)
}

async fn delete_profile(run: &mut Run<'_>, session: &Session, profile_id: &str) -> DockResult<()> {
    run.client().delete_profile(session, profile_id).await?;
    run.release(&Fixture::Profile(profile_id.to_string()));
    run.step("delete profile");
    Ok(())
}

/// Create, fetch and delete a profile type
pub async fn profile_type(ctx: &ScenarioContext) -> DockResult<ScenarioReport> {
    let mut run = Run::new(ctx, "profile_type");
    let result = profile_type_steps(&mut run).await;
    run.finish(result).await
}

async fn profile_type_steps(run: &mut Run<'_>) -> DockResult<()> {
    let session = run.ctx.user_session(USER_SCOPES).await?;
    check_identity(run, &session).await?;

    let profile_type = create_profile_type(run, &session).await?;

    let fetched = run.client().get_profile_type(&session, &profile_type.id).await?;
    ensure_eq("profile type id", fetched.id.as_str(), profile_type.id.as_str())?;
    run.step("get profile type");

    delete_profile_type(run, &session, &profile_type.id).await
}

/// A profile type with a TEXT field and three profiles
pub async fn profile(ctx: &ScenarioContext) -> DockResult<ScenarioReport> {
    let mut run = Run::new(ctx, "profile");
    let result = profile_steps(&mut run).await;
    run.finish(result).await
}

async fn profile_steps(run: &mut Run<'_>) -> DockResult<()> {
    let session = run.ctx.user_session(USER_SCOPES).await?;
    check_identity(run, &session).await?;

    let profile_type = create_profile_type(run, &session).await?;
    let field_id = create_profile_field(run, &session, &profile_type.id).await?;

    let mut profile_ids = Vec::with_capacity(3);
    for _ in 0..3 {
        profile_ids.push(create_profile(run, &session, &profile_type.id, &field_id).await?);
    }

    delete_field(run, &session, &field_id).await?;
    for profile_id in &profile_ids {
        delete_profile(run, &session, profile_id).await?;
    }
    delete_profile_type(run, &session, &profile_type.id).await
}

/// A task linked to a profile
pub async fn profile_with_task(ctx: &ScenarioContext) -> DockResult<ScenarioReport> {
    let mut run = Run::new(ctx, "profile_with_task");
    let result = profile_with_task_steps(&mut run).await;
    run.finish(result).await
}

async fn profile_with_task_steps(run: &mut Run<'_>) -> DockResult<()> {
    let session = run.ctx.user_session(USER_SCOPES).await?;
    check_identity(run, &session).await?;

    let profile_type = create_profile_type(run, &session).await?;
    let field_id = create_profile_field(run, &session, &profile_type.id).await?;
    let profile_id = create_profile(run, &session, &profile_type.id, &field_id).await?;
    let (list, group) = create_list_and_group(run, &session).await?;

    let description = "Profile lifecycle test description";
    let mut new_task = NewTask::in_group(description, &list.id, &group.id);
    new_task.profile_identifier = Some(profile_id.clone());

    let task = run.client().create_task(&session, &new_task).await?;
    run.track(Fixture::Task(task.id.clone()), &session);
    ensure_eq("task list", task.task_list_id(), Some(list.id.as_str()))?;
    ensure_eq("description", task.description.as_deref(), Some(description))?;
    run.step("create task");

    run.client().delete_task(&session, &task.id).await?;
    run.release(&Fixture::Task(task.id.clone()));
    run.step("delete task");

    delete_field(run, &session, &field_id).await?;
    delete_list_and_group(run, &session, &list, &group).await?;
    delete_profile(run, &session, &profile_id).await?;
    delete_profile_type(run, &session, &profile_type.id).await
}
