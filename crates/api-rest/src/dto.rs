//! Wire DTOs for the REST surface.
//!
//! These are the exact request/response shapes on the HTTP boundary, kept
//! separate from the domain types in `carebook-core`. Timestamps travel as
//! RFC 3339 strings and are parsed at the boundary.

use carebook_core::{AppointmentCounts, AppointmentRecord, PatientProfile, UserRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Field-scoped validation messages, mirrored from the form session.
#[derive(Debug, Serialize, ToSchema)]
pub struct ValidationRes {
    pub errors: BTreeMap<String, String>,
}

/// Generic failure body; internal detail never crosses this boundary.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorRes {
    pub message: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateUserReq {
    pub name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserRes {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub created_at: String,
}

impl From<UserRecord> for UserRes {
    fn from(user: UserRecord) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            phone: user.phone,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// Identification document attached to a registration, base64-encoded.
#[derive(Debug, Deserialize, ToSchema)]
pub struct DocumentUploadReq {
    pub file_name: String,
    pub data_base64: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterPatientReq {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    /// RFC 3339 timestamp.
    pub birth_date: String,
    pub gender: String,
    pub address: String,
    pub occupation: String,
    pub emergency_contact_name: String,
    pub emergency_contact_number: String,
    pub primary_physician: String,
    pub insurance_provider: String,
    pub insurance_policy_number: String,
    #[serde(default)]
    pub allergies: Option<String>,
    #[serde(default)]
    pub current_medications: Option<String>,
    #[serde(default)]
    pub family_medical_history: Option<String>,
    #[serde(default)]
    pub past_medical_history: Option<String>,
    #[serde(default)]
    pub identification_type: Option<String>,
    #[serde(default)]
    pub identification_number: Option<String>,
    #[serde(default)]
    pub identification_document: Option<DocumentUploadReq>,
    pub treatment_consent: bool,
    pub disclosure_consent: bool,
    pub privacy_consent: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PatientRes {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub birth_date: String,
    pub gender: String,
    pub address: String,
    pub occupation: String,
    pub emergency_contact_name: String,
    pub emergency_contact_number: String,
    pub primary_physician: String,
    pub insurance_provider: String,
    pub insurance_policy_number: String,
    pub allergies: Option<String>,
    pub current_medications: Option<String>,
    pub family_medical_history: Option<String>,
    pub past_medical_history: Option<String>,
    pub identification_type: Option<String>,
    pub identification_number: Option<String>,
    pub identification_document_id: Option<String>,
    pub identification_document_url: Option<String>,
    pub treatment_consent: bool,
    pub disclosure_consent: bool,
    pub privacy_consent: bool,
    pub created_at: String,
}

impl From<PatientProfile> for PatientRes {
    fn from(profile: PatientProfile) -> Self {
        Self {
            id: profile.id,
            user_id: profile.user_id,
            name: profile.name,
            email: profile.email,
            phone: profile.phone,
            birth_date: profile.birth_date.to_rfc3339(),
            gender: profile.gender.as_str().to_owned(),
            address: profile.address,
            occupation: profile.occupation,
            emergency_contact_name: profile.emergency_contact_name,
            emergency_contact_number: profile.emergency_contact_number,
            primary_physician: profile.primary_physician,
            insurance_provider: profile.insurance_provider,
            insurance_policy_number: profile.insurance_policy_number,
            allergies: profile.allergies,
            current_medications: profile.current_medications,
            family_medical_history: profile.family_medical_history,
            past_medical_history: profile.past_medical_history,
            identification_type: profile.identification_type,
            identification_number: profile.identification_number,
            identification_document_id: profile.identification_document_id,
            identification_document_url: profile.identification_document_url,
            treatment_consent: profile.treatment_consent,
            disclosure_consent: profile.disclosure_consent,
            privacy_consent: profile.privacy_consent,
            created_at: profile.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateAppointmentReq {
    pub user_id: String,
    pub patient_id: String,
    pub primary_physician: String,
    /// RFC 3339 timestamp.
    pub schedule: String,
    pub reason: String,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateAppointmentReq {
    pub user_id: String,
    /// `schedule` or `cancel`.
    pub mode: String,
    #[serde(default)]
    pub primary_physician: Option<String>,
    /// RFC 3339 timestamp.
    #[serde(default)]
    pub schedule: Option<String>,
    #[serde(default)]
    pub cancellation_reason: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AppointmentRes {
    pub id: String,
    pub user_id: String,
    pub patient_id: String,
    pub primary_physician: String,
    pub schedule: String,
    pub status: String,
    pub reason: Option<String>,
    pub note: Option<String>,
    pub cancellation_reason: Option<String>,
    pub created_at: String,
}

impl From<AppointmentRecord> for AppointmentRes {
    fn from(record: AppointmentRecord) -> Self {
        Self {
            id: record.id,
            user_id: record.user_id,
            patient_id: record.patient_id,
            primary_physician: record.primary_physician,
            schedule: record.schedule.to_rfc3339(),
            status: record.status.as_str().to_owned(),
            reason: record.reason,
            note: record.note,
            cancellation_reason: record.cancellation_reason,
            created_at: record.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TransitionRes {
    pub appointment: AppointmentRes,
    pub notification_delivered: bool,
}

/// The admin dashboard payload: summary tiles plus the recent list.
#[derive(Debug, Serialize, ToSchema)]
pub struct BoardRes {
    pub total_count: u64,
    pub scheduled_count: u64,
    pub pending_count: u64,
    pub cancelled_count: u64,
    pub appointments: Vec<AppointmentRes>,
}

impl BoardRes {
    pub fn new(counts: AppointmentCounts, appointments: Vec<AppointmentRecord>) -> Self {
        Self {
            total_count: counts.total_count,
            scheduled_count: counts.scheduled_count,
            pending_count: counts.pending_count,
            cancelled_count: counts.cancelled_count,
            appointments: appointments.into_iter().map(AppointmentRes::from).collect(),
        }
    }
}
