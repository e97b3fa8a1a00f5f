//! User, organization and patient lifecycles

use super::{check_identity, ensure, ensure_eq, Fixture, Run, ScenarioContext, ScenarioReport};
use crate::error::{DockError, DockResult};
use crate::headers::Identity;
use crate::models::{
    IdRef, NewOrganization, NewPatientNote, NewUser, OrganizationUpdate, PatientInput,
};
use crate::token::Scope;
use crate::utils;

const PATIENT_SCOPES: &[Scope] = &[
    Scope::UserAllRead,
    Scope::UserAllWrite,
    Scope::PatientAllWrite,
    Scope::PatientAllRead,
];

/// Fetch the configured user and organization, then create, read, update
/// and delete a patient
pub async fn lifecycle(ctx: &ScenarioContext) -> DockResult<ScenarioReport> {
    let mut run = Run::new(ctx, "lifecycle");
    let result = lifecycle_steps(&mut run).await;
    run.finish(result).await
}

async fn lifecycle_steps(run: &mut Run<'_>) -> DockResult<()> {
    let client = run.client();
    let session = run.ctx.user_session(PATIENT_SCOPES).await?;

    check_identity(run, &session).await?;

    let suffix = utils::short_suffix(6);
    let input = PatientInput::new(
        format!("John {}", suffix),
        format!("Doe {}", suffix),
        "2000-01-01",
        suffix.clone(),
    );
    let patient = client.create_patient(&session, &input).await?;
    run.track(Fixture::Patient(patient.id.clone()), &session);
    ensure_eq("first name", patient.first_name.as_deref(), Some(input.first_name.as_str()))?;
    ensure_eq("last name", patient.last_name.as_deref(), Some(input.last_name.as_str()))?;
    ensure_eq("dob", patient.dob.as_deref(), Some("2000-01-01"))?;
    ensure_eq("mrn", patient.mrn.as_deref(), Some(input.mrn.as_str()))?;
    run.step("create patient");

    let fetched = client.get_patient(&session, &patient.id).await?;
    ensure_eq("patient id", fetched.id.as_str(), patient.id.as_str())?;
    run.step("get patient");

    let suffix = utils::short_suffix(6);
    let update = PatientInput::new(
        format!("John {}", suffix),
        format!("Doe {}", suffix),
        "2001-01-01",
        suffix.clone(),
    );
    let updated = client.update_patient(&session, &patient.id, &update).await?;
    ensure_eq("first name", updated.first_name.as_deref(), Some(update.first_name.as_str()))?;
    ensure_eq("last name", updated.last_name.as_deref(), Some(update.last_name.as_str()))?;
    ensure_eq("dob", updated.dob.as_deref(), Some("2001-01-01"))?;
    ensure_eq("mrn", updated.mrn.as_deref(), Some(update.mrn.as_str()))?;
    run.step("update patient");

    client.delete_patient(&session, &patient.id).await?;
    run.release(&Fixture::Patient(patient.id));
    run.step("delete patient");

    Ok(())
}

/// Walk a new organization, user, patient and note through their lifecycle
/// using the developer account
pub async fn organization(ctx: &ScenarioContext) -> DockResult<ScenarioReport> {
    let mut run = Run::new(ctx, "organization");
    let result = organization_steps(&mut run).await;
    run.finish(result).await
}

async fn organization_steps(run: &mut Run<'_>) -> DockResult<()> {
    let client = run.client();
    let account = &run.config().account;
    let domain = account.domain()?;
    let configured_org = account.require_organization()?;
    let configured_user = account.require_user()?;

    let session = client
        .session(
            &[
                Scope::SystemDeveloperRead,
                Scope::SystemDeveloperWrite,
                Scope::SystemOrgRead,
                Scope::SystemOrgWrite,
                Scope::SystemUserRead,
                Scope::SystemUserWrite,
                Scope::UserAllRead,
                Scope::UserAllWrite,
                Scope::PatientAllRead,
                Scope::PatientAllWrite,
            ],
            Identity::Developer,
        )
        .await?;

    client.developer_account(&session).await?;
    run.step("get developer account");

    let org_id = client
        .developer_organizations(&session)
        .await?
        .into_iter()
        .find(|org| org.id == configured_org)
        .map(|org| org.id)
        .ok_or_else(|| DockError::Assertion(format!("Organization not found: {}", configured_org)))?;
    run.step("find organization");

    let user_id = client
        .developer_users(&session, &org_id)
        .await?
        .into_iter()
        .find(|user| user.id == configured_user)
        .map(|user| user.id)
        .ok_or_else(|| DockError::Assertion(format!("User not found: {}", configured_user)))?;
    run.step("find user");

    // `/organization` calls name the acting user only
    let as_owner = session.with_identity(Identity::user(&user_id));

    let new_domain = utils::generate_domain(domain);
    let new_org = client
        .create_organization(
            &as_owner,
            &NewOrganization {
                domain: new_domain.clone(),
                name: format!("new-org-{}", new_domain),
            },
        )
        .await?;
    run.track(Fixture::Organization(new_org.id.clone()), &as_owner);
    ensure_eq("organization domain", new_org.domain.as_deref(), Some(new_domain.as_str()))?;
    run.step("create organization");

    let new_name = "new-org-updated";
    let renamed = client
        .update_organization(&as_owner, &new_org.id, &OrganizationUpdate::rename(new_name))
        .await?;
    ensure_eq("organization name", renamed.name.as_deref(), Some(new_name))?;
    let fetched = client.get_organization(&as_owner, &new_org.id).await?;
    ensure_eq("organization name", fetched.name.as_deref(), Some(new_name))?;
    run.step("update organization");

    let in_org = session.with_identity(Identity::user_and_org(&user_id, &org_id));
    let email = utils::generate_email(domain);
    let new_user = client
        .create_user(
            &in_org,
            &NewUser {
                email: email.clone(),
                first_name: "First".to_string(),
                last_name: "Last".to_string(),
            },
        )
        .await?;
    run.track(Fixture::User(new_user.id.clone()), &in_org);
    run.track(
        Fixture::Membership {
            organization_id: org_id.clone(),
            user_id: new_user.id.clone(),
        },
        &as_owner,
    );
    ensure_eq("user email", new_user.email.as_deref(), Some(email.as_str()))?;
    run.step("create user");

    client
        .add_organization_member(&as_owner, &new_org.id, &new_user.id)
        .await?;
    run.track(
        Fixture::Membership {
            organization_id: new_org.id.clone(),
            user_id: new_user.id.clone(),
        },
        &as_owner,
    );
    run.step("add user to organization");

    for organization_id in [&org_id, &new_org.id] {
        let member = client
            .get_user(
                &session.with_identity(Identity::user_and_org(&user_id, organization_id)),
                &new_user.id,
            )
            .await?;
        ensure_eq("member id", member.id.as_str(), new_user.id.as_str())?;
    }
    run.step("confirm membership");

    let as_new_user = session.with_identity(Identity::user_and_org(&new_user.id, &new_org.id));
    let mrn = utils::generate_mrn(domain);
    let patient = client
        .create_patient(
            &as_new_user,
            &PatientInput::new("First", "Last", "1970-01-01", mrn.clone()),
        )
        .await?;
    run.track(Fixture::Patient(patient.id.clone()), &as_new_user);
    ensure_eq("mrn", patient.mrn.as_deref(), Some(mrn.as_str()))?;
    let fetched = client.get_patient(&as_new_user, &patient.id).await?;
    ensure_eq("patient id", fetched.id.as_str(), patient.id.as_str())?;
    ensure_eq("mrn", fetched.mrn.as_deref(), Some(mrn.as_str()))?;
    run.step("create patient");

    let description = format!("This is a new note for patient: {}", mrn);
    let note = client
        .create_patient_note(
            &as_new_user,
            &NewPatientNote {
                patient: IdRef::new(&patient.id),
                description: description.clone(),
            },
        )
        .await?;
    run.track(Fixture::PatientNote(note.id.clone()), &as_new_user);
    ensure_eq("note", note.description.as_deref(), Some(description.as_str()))?;
    run.step("create patient note");

    let notes = client.list_patient_notes(&as_new_user, &patient.id).await?;
    ensure(notes.iter().any(|n| n.id == note.id), || {
        "Patient note not found.".to_string()
    })?;
    run.step("list patient notes");

    // Deletes are soft: the resource comes back inactive
    let deleted = client.delete_patient_note(&as_new_user, &note.id).await?;
    run.release(&Fixture::PatientNote(note.id.clone()));
    ensure_eq("note id", deleted.id.as_str(), note.id.as_str())?;
    ensure_eq("note active", deleted.active, Some(false))?;
    run.step("delete patient note");

    let deleted = client.delete_patient(&as_new_user, &patient.id).await?;
    run.release(&Fixture::Patient(patient.id.clone()));
    ensure_eq("patient id", deleted.id.as_str(), patient.id.as_str())?;
    ensure_eq("patient active", deleted.active, Some(false))?;
    run.step("delete patient");

    // A user must leave every organization before it can be deleted
    for organization_id in [&new_org.id, &org_id] {
        client
            .remove_organization_member(&as_owner, organization_id, &new_user.id)
            .await?;
        run.release(&Fixture::Membership {
            organization_id: organization_id.clone(),
            user_id: new_user.id.clone(),
        });
    }
    run.step("remove user from organizations");

    let deleted = client.delete_user(&in_org, &new_user.id).await?;
    run.release(&Fixture::User(new_user.id.clone()));
    ensure_eq("user id", deleted.id.as_str(), new_user.id.as_str())?;
    ensure_eq(
        "user organizations",
        deleted.organizations.as_ref().map(Vec::len),
        Some(0),
    )?;
    run.step("delete user");

    // Only the owner may remain before the organization is deleted
    let in_new_org = session.with_identity(Identity::user_and_org(&user_id, &new_org.id));
    let members = client.list_users(&in_new_org).await?;
    for member in members
        .iter()
        .filter(|m| m.active.unwrap_or(false) && m.id != user_id)
    {
        client
            .remove_organization_member(&in_new_org, &new_org.id, &member.id)
            .await?;
    }

    let deleted = client.delete_organization(&as_owner, &new_org.id).await?;
    run.release(&Fixture::Organization(new_org.id.clone()));
    ensure_eq("organization id", deleted.id.as_str(), new_org.id.as_str())?;
    run.step("delete organization");

    Ok(())
}
