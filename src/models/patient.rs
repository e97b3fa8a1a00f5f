//! Patients and patient notes

use serde::{Deserialize, Serialize};

use super::{Extra, IdRef, MetaData};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    /// `YYYY-MM-DD`
    #[serde(default)]
    pub dob: Option<String>,
    #[serde(default)]
    pub mrn: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub patient_meta_data: Option<Vec<MetaData>>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Body for both `POST /patient` and `PATCH /patient/{id}`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientInput {
    pub first_name: String,
    pub last_name: String,
    pub dob: String,
    pub mrn: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub patient_meta_data: Vec<MetaData>,
}

impl PatientInput {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        dob: impl Into<String>,
        mrn: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            dob: dob.into(),
            mrn: mrn.into(),
            patient_meta_data: Vec::new(),
        }
    }

    pub fn with_meta_data(mut self, meta_data: MetaData) -> Self {
        self.patient_meta_data.push(meta_data);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientNote {
    pub id: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub patient: Option<IdRef>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewPatientNote {
    pub patient: IdRef,
    pub description: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PatientNoteUpdate {
    pub description: String,
}
