//! Custom fields and the metadata values that reference them

use serde::{Deserialize, Serialize};

use super::{Extra, IdRef};

/// Resource kind a custom field attaches to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TargetType {
    Task,
    Patient,
    Profile,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldCategoryType {
    TaskCore,
    PatientPersonal,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldType {
    Text,
    LongText,
    Number,
    Date,
    Hyperlink,
    Boolean,
    /// Single select
    PickList,
    MultiSelect,
    #[serde(other)]
    Unknown,
}

impl FieldType {
    /// Field types whose values come from `options`
    pub fn has_options(&self) -> bool {
        matches!(self, FieldType::PickList | FieldType::MultiSelect)
    }
}

/// Where a patient field is surfaced in the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DisplayOption {
    PatientHeader,
    PatientSearch,
    #[serde(other)]
    Unknown,
}

/// A configured custom field
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomField {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub target_type: Option<TargetType>,
    #[serde(default)]
    pub field_category_type: Option<FieldCategoryType>,
    #[serde(default)]
    pub field_type: Option<FieldType>,
    /// Present for select fields, in creation order
    #[serde(default, deserialize_with = "super::null_as_empty")]
    pub options: Vec<FieldOption>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl CustomField {
    /// Id of the option at `index`
    pub fn option_id(&self, index: usize) -> Option<&str> {
        self.options.get(index).and_then(|o| o.id.as_deref())
    }
}

/// An option of a select field
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldOption {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewFieldOption {
    pub name: String,
    pub description: String,
}

impl NewFieldOption {
    /// Option whose description repeats its name
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            description: name.clone(),
            name,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCustomField {
    pub target_type: TargetType,
    pub field_category_type: FieldCategoryType,
    pub field_type: FieldType,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_index: Option<i32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<NewFieldOption>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub display_options: Vec<DisplayOption>,
    /// Required when `target_type` is `PROFILE`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_profile_type: Option<IdRef>,
}

impl NewCustomField {
    pub fn new(
        target_type: TargetType,
        field_category_type: FieldCategoryType,
        field_type: FieldType,
        name: impl Into<String>,
    ) -> Self {
        Self {
            target_type,
            field_category_type,
            field_type,
            name: name.into(),
            placeholder: None,
            required: None,
            sort_index: None,
            options: Vec::new(),
            display_options: Vec::new(),
            related_profile_type: None,
        }
    }
}

/// `PATCH /configuration/field/{id}`
///
/// - `options`: replaces the whole option list (`Some(vec![])` clears it)
/// - `options_to_add` / `options_to_delete`: incremental changes, may be combined
/// - all `None`: empty patch, options unchanged
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomFieldUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<NewFieldOption>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options_to_add: Option<Vec<NewFieldOption>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options_to_delete: Option<Vec<IdRef>>,
}

impl CustomFieldUpdate {
    pub fn replace(options: Vec<NewFieldOption>) -> Self {
        Self {
            options: Some(options),
            ..Default::default()
        }
    }

    pub fn add(options: Vec<NewFieldOption>) -> Self {
        Self {
            options_to_add: Some(options),
            ..Default::default()
        }
    }

    pub fn delete<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            options_to_delete: Some(ids.into_iter().map(IdRef::new).collect()),
            ..Default::default()
        }
    }
}

/// Custom field value carried by a task (`taskMetaData`) or patient (`patientMetaData`)
///
/// Scalar fields use `value`; multi-select fields use `values` (option ids).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaData {
    pub custom_field_identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,
}

impl MetaData {
    pub fn value(field_id: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self {
            custom_field_identifier: field_id.into(),
            value: Some(value.into()),
            values: None,
        }
    }

    pub fn values(field_id: impl Into<String>, option_ids: Vec<String>) -> Self {
        Self {
            custom_field_identifier: field_id.into(),
            value: None,
            values: Some(option_ids),
        }
    }
}
