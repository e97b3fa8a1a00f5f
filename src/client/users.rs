//! `/user`

use reqwest::StatusCode;

use super::{DockClient, Session};
use crate::error::DockResult;
use crate::models::{NewUser, User, UserUpdate};

impl DockClient {
    /// `GET /user/{id}`; 404 when the user is not a member of the session's organization
    pub async fn get_user(&self, session: &Session, user_id: &str) -> DockResult<User> {
        self.get(session, &format!("/user/{}", user_id), &[]).await
    }

    /// `GET /user`: members of the session's organization
    pub async fn list_users(&self, session: &Session) -> DockResult<Vec<User>> {
        self.get(session, "/user", &[]).await
    }

    /// `POST /user`; the user joins the session's organization
    pub async fn create_user(&self, session: &Session, user: &NewUser) -> DockResult<User> {
        self.post(session, "/user", user).await
    }

    pub async fn update_user(
        &self,
        session: &Session,
        user_id: &str,
        update: &UserUpdate,
    ) -> DockResult<User> {
        self.patch(session, &format!("/user/{}", user_id), update)
            .await
    }

    /// `DELETE /user/{id}`; the user must first be removed from every organization
    pub async fn delete_user(&self, session: &Session, user_id: &str) -> DockResult<User> {
        self.delete(session, &format!("/user/{}", user_id), StatusCode::OK)
            .await
    }
}
