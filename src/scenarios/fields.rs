//! Select custom fields: option management and multi-select patient values

use super::{check_identity, ensure, ensure_eq, Fixture, Run, ScenarioContext, ScenarioReport, USER_SCOPES};
use crate::client::Session;
use crate::error::{DockError, DockResult};
use crate::models::{
    CustomField, CustomFieldUpdate, DisplayOption, FieldCategoryType, FieldType, MetaData,
    NewCustomField, NewFieldOption, PatientInput, TargetType,
};
use crate::token::Scope;
use crate::utils;

/// Patient select field with two options, shown in the header and search
fn patient_select_field(field_type: FieldType, name: &str) -> NewCustomField {
    let mut field = NewCustomField::new(
        TargetType::Patient,
        FieldCategoryType::PatientPersonal,
        field_type,
        name,
    );
    field.placeholder = Some("Placeholder".to_string());
    field.required = Some(false);
    field.sort_index = Some(1);
    field.options = vec![
        NewFieldOption::named("New Option #9A"),
        NewFieldOption::named("New Option #9B"),
    ];
    field.display_options = vec![DisplayOption::PatientHeader, DisplayOption::PatientSearch];
    field
}

async fn create_select_field(
    run: &mut Run<'_>,
    session: &Session,
    new_field: &NewCustomField,
) -> DockResult<CustomField> {
    let field = run.client().create_custom_field(session, new_field).await?;
    run.track(Fixture::CustomField(field.id.clone()), session);
    ensure_eq("target type", field.target_type, Some(new_field.target_type))?;
    ensure_eq(
        "field category",
        field.field_category_type,
        Some(new_field.field_category_type),
    )?;
    ensure_eq("field type", field.field_type, Some(new_field.field_type))?;
    ensure_eq("field name", field.name.as_deref(), Some(new_field.name.as_str()))?;
    ensure_eq("option count", field.options.len(), new_field.options.len())?;
    run.step("create select custom field");
    Ok(field)
}

/// Apply a patch and check the resulting option count
async fn patch_options(
    run: &mut Run<'_>,
    session: &Session,
    field_id: &str,
    update: &CustomFieldUpdate,
    expected: usize,
    step: &str,
) -> DockResult<CustomField> {
    let field = run.client().update_custom_field(session, field_id, update).await?;
    ensure_eq(step, field.options.len(), expected)?;
    run.step(step);
    Ok(field)
}

fn first_option_id(field: &CustomField) -> DockResult<String> {
    field
        .option_id(0)
        .map(str::to_string)
        .ok_or_else(|| DockError::Assertion("Option id missing from custom field".to_string()))
}

/// PICK_LIST field: add, replace, clear and delete options
pub async fn single_select_field(ctx: &ScenarioContext) -> DockResult<ScenarioReport> {
    let mut run = Run::new(ctx, "single_select_field");
    let result = single_select_steps(&mut run).await;
    run.finish(result).await
}

async fn single_select_steps(run: &mut Run<'_>) -> DockResult<()> {
    let session = run.ctx.user_session(USER_SCOPES).await?;
    check_identity(run, &session).await?;

    let new_field = patient_select_field(FieldType::PickList, "New Custom Field #1");
    let field = create_select_field(run, &session, &new_field).await?;
    let id = field.id.as_str();

    patch_options(
        run,
        &session,
        id,
        &CustomFieldUpdate::add(vec![NewFieldOption::named("Option 5555")]),
        3,
        "add option",
    )
    .await?;

    patch_options(run, &session, id, &CustomFieldUpdate::default(), 3, "empty patch").await?;

    patch_options(
        run,
        &session,
        id,
        &CustomFieldUpdate::replace(vec![
            NewFieldOption::named("New Option #11A"),
            NewFieldOption::named("New Option #11B"),
            NewFieldOption::named("New Option #11C"),
            NewFieldOption::named("New Option #11D"),
        ]),
        4,
        "replace options",
    )
    .await?;

    patch_options(run, &session, id, &CustomFieldUpdate::replace(Vec::new()), 0, "clear options").await?;

    let added = patch_options(
        run,
        &session,
        id,
        &CustomFieldUpdate::add(vec![NewFieldOption::named("Option 5555")]),
        1,
        "add option to empty field",
    )
    .await?;
    let option_5555 = first_option_id(&added)?;

    patch_options(
        run,
        &session,
        id,
        &CustomFieldUpdate::delete([option_5555]),
        0,
        "delete option",
    )
    .await?;

    let added = patch_options(
        run,
        &session,
        id,
        &CustomFieldUpdate::add(vec![NewFieldOption::named("Option 6666")]),
        1,
        "add another option",
    )
    .await?;
    let option_6666 = first_option_id(&added)?;

    let mut swap = CustomFieldUpdate::add(vec![NewFieldOption::named("Option 7777")]);
    swap.options_to_delete = CustomFieldUpdate::delete([option_6666]).options_to_delete;
    let swapped = patch_options(run, &session, id, &swap, 1, "add and delete in one patch").await?;
    ensure_eq(
        "remaining option",
        swapped.options.first().and_then(|o| o.name.as_deref()),
        Some("Option 7777"),
    )?;

    let fetched = run.client().get_custom_field(&session, id).await?;
    ensure_eq("option count", fetched.options.len(), 1)?;
    let option_7777 = first_option_id(&fetched)?;
    run.step("get custom field");

    patch_options(
        run,
        &session,
        id,
        &CustomFieldUpdate::delete([option_7777]),
        0,
        "delete last option",
    )
    .await?;

    run.client().delete_custom_field(&session, id).await?;
    run.release(&Fixture::CustomField(id.to_string()));
    run.step("delete custom field");

    Ok(())
}

/// MULTI_SELECT field and a patient holding both option values
pub async fn multi_select_field(ctx: &ScenarioContext) -> DockResult<ScenarioReport> {
    let mut run = Run::new(ctx, "multi_select_field");
    let result = multi_select_steps(&mut run).await;
    run.finish(result).await
}

async fn multi_select_steps(run: &mut Run<'_>) -> DockResult<()> {
    let session = run
        .ctx
        .user_session(&[
            Scope::UserAllRead,
            Scope::UserAllWrite,
            Scope::PatientAllRead,
            Scope::PatientAllWrite,
        ])
        .await?;
    check_identity(run, &session).await?;

    let new_field = patient_select_field(FieldType::MultiSelect, "New Multi Select Custom Field #1");
    let field = create_select_field(run, &session, &new_field).await?;

    let option_ids: Vec<String> = field
        .options
        .iter()
        .filter_map(|o| o.id.clone())
        .collect();
    ensure(option_ids.len() == 2, || {
        format!("Expected 2 option ids, got {}", option_ids.len())
    })?;

    let first_name = format!("John{}", utils::short_suffix(6));
    let last_name = format!("Doe{}", utils::short_suffix(6));
    let mrn = utils::short_suffix(12);
    let input = PatientInput::new(&first_name, &last_name, "1980-01-01", &mrn)
        .with_meta_data(MetaData::values(&field.id, option_ids));

    let patient = run.client().create_patient(&session, &input).await?;
    run.track(Fixture::Patient(patient.id.clone()), &session);
    ensure_eq("first name", patient.first_name.as_deref(), Some(first_name.as_str()))?;
    ensure_eq("last name", patient.last_name.as_deref(), Some(last_name.as_str()))?;
    ensure_eq("dob", patient.dob.as_deref(), Some("1980-01-01"))?;
    ensure_eq("mrn", patient.mrn.as_deref(), Some(mrn.as_str()))?;
    run.step("create patient with multi-select values");

    run.client().delete_patient(&session, &patient.id).await?;
    run.release(&Fixture::Patient(patient.id.clone()));
    run.step("delete patient");

    run.client().delete_custom_field(&session, &field.id).await?;
    run.release(&Fixture::CustomField(field.id.clone()));
    run.step("delete custom field");

    Ok(())
}
