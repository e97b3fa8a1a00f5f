//! Webhook verification and event delivery
//!
//! Both scenarios run the local callback server for their whole duration.
//! Dock Health reaches it through `CALLBACK_URL`, which must proxy to
//! `callback.host:callback.local_port`.

use super::{ensure, ensure_eq, Fixture, Run, ScenarioContext, ScenarioReport, USER_SCOPES};
use crate::client::{EventFilter, Session};
use crate::error::DockResult;
use crate::headers::Identity;
use crate::models::{EventType, NewUser, OrganizationUpdate, WebhookInput};
use crate::server::{CallbackHandle, CallbackServer};
use crate::token::Scope;
use crate::utils;

async fn start_server(run: &mut Run<'_>, secret: &str) -> DockResult<CallbackHandle> {
    let server = CallbackServer::start(&run.config().callback, vec![secret.to_string()]).await?;
    run.step("start callback server");
    Ok(server)
}

/// Stop the server whatever the steps returned; a step error wins
async fn stop_server(
    run: &mut Run<'_>,
    server: &mut CallbackHandle,
    result: DockResult<()>,
) -> DockResult<()> {
    let stopped = server.stop().await;
    if stopped.is_ok() {
        run.step("stop callback server");
    }
    result.and(stopped)
}

/// Create an organization webhook and watch it get verified, twice
pub async fn webhook(ctx: &ScenarioContext) -> DockResult<ScenarioReport> {
    let mut run = Run::new(ctx, "webhook");
    let secret = utils::generate_webhook_identifier();
    let result = match start_server(&mut run, &secret).await {
        Ok(mut server) => {
            let result = webhook_steps(&mut run, &server, &secret).await;
            stop_server(&mut run, &mut server, result).await
        }
        Err(e) => Err(e),
    };
    run.finish(result).await
}

async fn webhook_steps(run: &mut Run<'_>, server: &CallbackHandle, secret: &str) -> DockResult<()> {
    let client = run.client();
    let session = run.ctx.user_session(USER_SCOPES).await?;

    let existing = client.list_webhooks(&session).await?;
    tracing::debug!(count = existing.len(), "Existing webhooks");
    run.step("list webhooks");

    let url = run.config().callback.url()?.to_string();

    let mut input = WebhookInput {
        url: url.clone(),
        secret: secret.to_string(),
        events: vec![EventType::CreateOrganization],
        enabled: None,
    };

    // Verification happens asynchronously after create
    let created = client.create_webhook(&session, &input).await?;
    run.track(Fixture::Webhook(created.id.clone()), &session);
    ensure_eq("webhook url", created.url.as_deref(), Some(url.as_str()))?;
    ensure(!created.is_verified(), || {
        "Webhook verified before the challenge".to_string()
    })?;
    run.step("create webhook");

    run.ctx.settle().await;
    expect_verified(run, &session, &created.id, server).await?;

    // Any update requires verifying again
    input.events.push(EventType::UpdateOrganization);
    let updated = client.update_webhook(&session, &created.id, &input).await?;
    ensure_eq("webhook id", updated.id.as_str(), created.id.as_str())?;
    ensure(!updated.is_verified(), || {
        "Webhook still verified after update".to_string()
    })?;
    run.step("update webhook");

    run.ctx.settle().await;
    expect_verified(run, &session, &created.id, server).await?;

    let deleted = client.delete_webhook(&session, &created.id).await?;
    run.release(&Fixture::Webhook(created.id.clone()));
    ensure_eq("webhook id", deleted.id.as_str(), created.id.as_str())?;
    run.step("delete webhook");

    Ok(())
}

async fn expect_verified(
    run: &mut Run<'_>,
    session: &Session,
    webhook_id: &str,
    server: &CallbackHandle,
) -> DockResult<()> {
    let webhook = run.client().get_webhook(session, webhook_id).await?;
    ensure_eq("webhook id", webhook.id.as_str(), webhook_id)?;
    ensure(webhook.is_verified(), || {
        format!(
            "Webhook {} not verified ({} challenges answered)",
            webhook_id,
            server.challenge_count()
        )
    })?;
    run.step("webhook verified");
    Ok(())
}

/// Subscribe a developer webhook, generate events and watch the counts grow
pub async fn webhook_events(ctx: &ScenarioContext) -> DockResult<ScenarioReport> {
    let mut run = Run::new(ctx, "webhook_events");
    let secret = utils::generate_webhook_secret();
    let result = match start_server(&mut run, &secret).await {
        Ok(mut server) => {
            let result = webhook_events_steps(&mut run, &server, &secret).await;
            stop_server(&mut run, &mut server, result).await
        }
        Err(e) => Err(e),
    };
    run.finish(result).await
}

/// Today's events and delivery attempts
async fn today_counts(run: &Run<'_>, session: &Session, organization_id: &str) -> DockResult<(usize, usize)> {
    let filter = EventFilter::today();
    let events = run
        .client()
        .developer_events(session, organization_id, &filter)
        .await?;
    let attempts = run
        .client()
        .developer_event_deliveries(session, organization_id, &filter)
        .await?;
    tracing::debug!(events = events.len(), attempts = attempts.len(), "Today's event counts");
    Ok((events.len(), attempts.len()))
}

async fn expect_more_events(
    run: &mut Run<'_>,
    session: &Session,
    organization_id: &str,
    before: (usize, usize),
    step: &str,
) -> DockResult<()> {
    run.ctx.settle().await;
    let after = today_counts(run, session, organization_id).await?;
    ensure(after.0 > before.0, || {
        format!("Expected more than {} events, got {}", before.0, after.0)
    })?;
    ensure(after.1 > before.1, || {
        format!("Expected more than {} delivery attempts, got {}", before.1, after.1)
    })?;
    run.step(step);
    Ok(())
}

async fn webhook_events_steps(run: &mut Run<'_>, server: &CallbackHandle, secret: &str) -> DockResult<()> {
    let client = run.client();
    let account = &run.config().account;
    let domain = account.domain()?;
    let url = run.config().callback.url()?.to_string();

    let org_reader = client.session(&[Scope::SystemOrgRead], Identity::Developer).await?;
    let organization = client.find_default_organization(&org_reader, domain).await?;
    run.step("find default organization");

    let user_reader = client.session(&[Scope::SystemUserRead], Identity::Developer).await?;
    let user = client
        .find_default_user(&user_reader, &organization.id, account.email()?)
        .await?;
    run.step("find default user");

    let developer = client
        .session(
            &[Scope::SystemDeveloperRead, Scope::SystemDeveloperWrite],
            Identity::Developer,
        )
        .await?;

    for existing in client.list_developer_webhooks(&developer).await? {
        client.delete_developer_webhook(&developer, &existing.id).await?;
    }
    run.step("delete existing developer webhooks");

    let before = today_counts(run, &developer, &organization.id).await?;
    run.step("count today's events");

    let webhook = client
        .create_developer_webhook(
            &developer,
            &WebhookInput {
                url: url.clone(),
                secret: secret.to_string(),
                events: vec![
                    EventType::UpdateOrganization,
                    EventType::CreateUser,
                    EventType::UpdateUser,
                    EventType::DeleteUser,
                ],
                enabled: Some(true),
            },
        )
        .await?;
    run.track(Fixture::DeveloperWebhook(webhook.id.clone()), &developer);
    ensure_eq("webhook url", webhook.url.as_deref(), Some(url.as_str()))?;
    ensure_eq("webhook secret", webhook.secret.as_deref(), Some(secret))?;
    run.step("create developer webhook");

    let writer = client.session(&[Scope::UserAllWrite], Identity::user(&user.id)).await?;
    let name = utils::generate_domain(domain);
    client
        .update_organization(&writer, &organization.id, &OrganizationUpdate::rename(name))
        .await?;
    run.step("update organization");

    expect_more_events(run, &developer, &organization.id, before, "organization update delivered").await?;

    let in_org = writer.with_identity(Identity::user_and_org(&user.id, &organization.id));
    let email = utils::generate_email(domain);
    let new_user = client
        .create_user(
            &in_org,
            &NewUser {
                email: email.clone(),
                first_name: "John".to_string(),
                last_name: email,
            },
        )
        .await?;
    run.track(Fixture::User(new_user.id.clone()), &in_org);
    run.track(
        Fixture::Membership {
            organization_id: organization.id.clone(),
            user_id: new_user.id.clone(),
        },
        &writer,
    );
    run.step("create user");

    expect_more_events(run, &developer, &organization.id, before, "user creation delivered").await?;

    let latest = client
        .developer_events(&developer, &organization.id, &EventFilter::today())
        .await?
        .into_iter()
        .filter_map(|e| e.event_identifier)
        .last();
    if let Some(event_id) = latest {
        let events = client
            .developer_events(&developer, &organization.id, &EventFilter::Event(event_id.clone()))
            .await?;
        ensure(!events.is_empty(), || format!("Event {} not found", event_id))?;
        run.step("fetch latest event");
    } else {
        run.note(format!(
            "latest event lookup skipped: no event identifiers for organization {}",
            organization.id
        ));
    }

    tracing::info!(
        received = server.received_events().len(),
        challenges = server.challenge_count(),
        "Callback server activity"
    );

    if server.received_events().is_empty() {
        tracing::warn!("No events reached the callback server; check that CALLBACK_URL proxies to it");
    }

    Ok(())
}
