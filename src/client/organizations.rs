//! `/organization`

use reqwest::StatusCode;

use super::{DockClient, Session};
use crate::error::DockResult;
use crate::models::{NewOrganization, Organization, OrganizationUpdate};

impl DockClient {
    /// `GET /organization/current`: the organization named by `x-organization-id`
    pub async fn current_organization(&self, session: &Session) -> DockResult<Organization> {
        self.get(session, "/organization/current", &[]).await
    }

    pub async fn get_organization(
        &self,
        session: &Session,
        organization_id: &str,
    ) -> DockResult<Organization> {
        self.get(session, &format!("/organization/{}", organization_id), &[])
            .await
    }

    /// `POST /organization`; the session's user becomes the owner
    pub async fn create_organization(
        &self,
        session: &Session,
        organization: &NewOrganization,
    ) -> DockResult<Organization> {
        self.post(session, "/organization", organization).await
    }

    pub async fn update_organization(
        &self,
        session: &Session,
        organization_id: &str,
        update: &OrganizationUpdate,
    ) -> DockResult<Organization> {
        self.patch(session, &format!("/organization/{}", organization_id), update)
            .await
    }

    /// Only the owner can delete, and only once no other active members remain
    pub async fn delete_organization(
        &self,
        session: &Session,
        organization_id: &str,
    ) -> DockResult<Organization> {
        self.delete(
            session,
            &format!("/organization/{}", organization_id),
            StatusCode::OK,
        )
        .await
    }

    /// `PATCH /organization/{org}/user/{user}`: add a member (admin or owner only)
    pub async fn add_organization_member(
        &self,
        session: &Session,
        organization_id: &str,
        user_id: &str,
    ) -> DockResult<serde_json::Value> {
        self.patch_empty(
            session,
            &format!("/organization/{}/user/{}", organization_id, user_id),
        )
        .await
    }

    /// `DELETE /organization/{org}/user/{user}`
    pub async fn remove_organization_member(
        &self,
        session: &Session,
        organization_id: &str,
        user_id: &str,
    ) -> DockResult<serde_json::Value> {
        self.delete(
            session,
            &format!("/organization/{}/user/{}", organization_id, user_id),
            StatusCode::OK,
        )
        .await
    }
}
