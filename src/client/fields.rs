//! `/configuration/field`

use reqwest::StatusCode;

use super::{DockClient, Session};
use crate::error::DockResult;
use crate::models::{CustomField, CustomFieldUpdate, NewCustomField};

impl DockClient {
    pub async fn create_custom_field(
        &self,
        session: &Session,
        field: &NewCustomField,
    ) -> DockResult<CustomField> {
        self.post(session, "/configuration/field", field).await
    }

    pub async fn get_custom_field(&self, session: &Session, field_id: &str) -> DockResult<CustomField> {
        self.get(session, &format!("/configuration/field/{}", field_id), &[])
            .await
    }

    /// Returns the field with its resulting option list
    pub async fn update_custom_field(
        &self,
        session: &Session,
        field_id: &str,
        update: &CustomFieldUpdate,
    ) -> DockResult<CustomField> {
        self.patch(session, &format!("/configuration/field/{}", field_id), update)
            .await
    }

    pub async fn delete_custom_field(
        &self,
        session: &Session,
        field_id: &str,
    ) -> DockResult<CustomField> {
        self.delete(
            session,
            &format!("/configuration/field/{}", field_id),
            StatusCode::OK,
        )
        .await
    }
}
