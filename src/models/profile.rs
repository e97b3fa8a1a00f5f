//! Profile types and profiles

use serde::{Deserialize, Serialize};

use super::Extra;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileType {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewProfileType {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    #[serde(default)]
    pub profile_type_id: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProfile {
    pub profile_type_id: String,
    pub fields: Vec<ProfileFieldValue>,
}

/// Values for one `PROFILE` custom field
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileFieldValue {
    pub profile_type_field: FieldIdentifier,
    pub values: Vec<ProfileValue>,
}

impl ProfileFieldValue {
    pub fn text(field_id: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            profile_type_field: FieldIdentifier {
                identifier: field_id.into(),
            },
            values: vec![ProfileValue {
                value: value.into(),
            }],
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldIdentifier {
    pub identifier: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileValue {
    pub value: String,
}
