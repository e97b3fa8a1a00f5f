//! `/profile/type` and `/profile`

use reqwest::StatusCode;

use super::{DockClient, Session};
use crate::error::DockResult;
use crate::models::{NewProfile, NewProfileType, Profile, ProfileType};

impl DockClient {
    pub async fn create_profile_type(
        &self,
        session: &Session,
        profile_type: &NewProfileType,
    ) -> DockResult<ProfileType> {
        self.post(session, "/profile/type", profile_type).await
    }

    pub async fn get_profile_type(&self, session: &Session, type_id: &str) -> DockResult<ProfileType> {
        self.get(session, &format!("/profile/type/{}", type_id), &[])
            .await
    }

    pub async fn delete_profile_type(
        &self,
        session: &Session,
        type_id: &str,
    ) -> DockResult<ProfileType> {
        self.delete(session, &format!("/profile/type/{}", type_id), StatusCode::OK)
            .await
    }

    pub async fn create_profile(&self, session: &Session, profile: &NewProfile) -> DockResult<Profile> {
        self.post(session, "/profile", profile).await
    }

    pub async fn get_profile(&self, session: &Session, profile_id: &str) -> DockResult<Profile> {
        self.get(session, &format!("/profile/{}", profile_id), &[])
            .await
    }

    pub async fn delete_profile(&self, session: &Session, profile_id: &str) -> DockResult<Profile> {
        self.delete(session, &format!("/profile/{}", profile_id), StatusCode::OK)
            .await
    }
}
