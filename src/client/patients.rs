//! `/patient` and `/patient/note`

use reqwest::StatusCode;

use super::{DockClient, Session};
use crate::error::DockResult;
use crate::models::{NewPatientNote, Patient, PatientInput, PatientNote, PatientNoteUpdate};

impl DockClient {
    pub async fn create_patient(&self, session: &Session, patient: &PatientInput) -> DockResult<Patient> {
        self.post(session, "/patient", patient).await
    }

    pub async fn get_patient(&self, session: &Session, patient_id: &str) -> DockResult<Patient> {
        self.get(session, &format!("/patient/{}", patient_id), &[])
            .await
    }

    pub async fn update_patient(
        &self,
        session: &Session,
        patient_id: &str,
        patient: &PatientInput,
    ) -> DockResult<Patient> {
        self.patch(session, &format!("/patient/{}", patient_id), patient)
            .await
    }

    /// Soft delete: the returned patient has `active == false`
    pub async fn delete_patient(&self, session: &Session, patient_id: &str) -> DockResult<Patient> {
        self.delete(session, &format!("/patient/{}", patient_id), StatusCode::OK)
            .await
    }

    pub async fn create_patient_note(
        &self,
        session: &Session,
        note: &NewPatientNote,
    ) -> DockResult<PatientNote> {
        self.post(session, "/patient/note", note).await
    }

    /// `GET /patient/note?patient={id}`
    pub async fn list_patient_notes(
        &self,
        session: &Session,
        patient_id: &str,
    ) -> DockResult<Vec<PatientNote>> {
        self.get(session, "/patient/note", &[("patient", patient_id)])
            .await
    }

    pub async fn get_patient_note(&self, session: &Session, note_id: &str) -> DockResult<PatientNote> {
        self.get(session, &format!("/patient/note/{}", note_id), &[])
            .await
    }

    pub async fn update_patient_note(
        &self,
        session: &Session,
        note_id: &str,
        update: &PatientNoteUpdate,
    ) -> DockResult<PatientNote> {
        self.patch(session, &format!("/patient/note/{}", note_id), update)
            .await
    }

    pub async fn delete_patient_note(
        &self,
        session: &Session,
        note_id: &str,
    ) -> DockResult<PatientNote> {
        self.delete(session, &format!("/patient/note/{}", note_id), StatusCode::OK)
            .await
    }
}
