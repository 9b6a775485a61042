//! Patient identity and profile records.

use crate::error::CoreResult;
use carebook_forms::FileUpload;
use carebook_store::Document;
use carebook_types::{EmailAddress, PhoneNumber};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Gender as captured by the registration radio group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    /// Parses a gender from its string representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "male" => Some(Self::Male),
            "female" => Some(Self::Female),
            "other" => Some(Self::Other),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Other => "other",
        }
    }
}

/// A user identity created by the first intake step.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UserRecord {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct UserFieldsWire {
    name: String,
    email: String,
    phone: String,
}

impl UserRecord {
    /// Translates a stored document into a user record.
    pub fn from_document(doc: &Document) -> CoreResult<Self> {
        let wire: UserFieldsWire = serde_json::from_value(doc.fields.clone())?;
        Ok(Self {
            id: doc.id.clone(),
            name: wire.name,
            email: wire.email,
            phone: wire.phone,
            created_at: doc.created_at,
        })
    }
}

/// Payload for the first intake step. Email and phone arrive already
/// validated and normalised.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: EmailAddress,
    pub phone: PhoneNumber,
}

/// A registered patient profile.
///
/// Created once at registration. The identification-document reference is
/// set at most once — the first successful upload wins and there is no
/// update path for it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PatientProfile {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub birth_date: DateTime<Utc>,
    pub gender: Gender,
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
    pub identification_document_id: Option<String>,
    #[serde(default)]
    pub identification_document_url: Option<String>,
    pub treatment_consent: bool,
    pub disclosure_consent: bool,
    pub privacy_consent: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct ProfileFieldsWire {
    user_id: String,
    name: String,
    email: String,
    phone: String,
    birth_date: DateTime<Utc>,
    gender: Gender,
    address: String,
    occupation: String,
    emergency_contact_name: String,
    emergency_contact_number: String,
    primary_physician: String,
    insurance_provider: String,
    insurance_policy_number: String,
    #[serde(default)]
    allergies: Option<String>,
    #[serde(default)]
    current_medications: Option<String>,
    #[serde(default)]
    family_medical_history: Option<String>,
    #[serde(default)]
    past_medical_history: Option<String>,
    #[serde(default)]
    identification_type: Option<String>,
    #[serde(default)]
    identification_number: Option<String>,
    #[serde(default)]
    identification_document_id: Option<String>,
    #[serde(default)]
    identification_document_url: Option<String>,
    treatment_consent: bool,
    disclosure_consent: bool,
    privacy_consent: bool,
}

impl PatientProfile {
    /// Translates a stored document into a profile.
    pub fn from_document(doc: &Document) -> CoreResult<Self> {
        let wire: ProfileFieldsWire = serde_json::from_value(doc.fields.clone())?;
        Ok(Self {
            id: doc.id.clone(),
            user_id: wire.user_id,
            name: wire.name,
            email: wire.email,
            phone: wire.phone,
            birth_date: wire.birth_date,
            gender: wire.gender,
            address: wire.address,
            occupation: wire.occupation,
            emergency_contact_name: wire.emergency_contact_name,
            emergency_contact_number: wire.emergency_contact_number,
            primary_physician: wire.primary_physician,
            insurance_provider: wire.insurance_provider,
            insurance_policy_number: wire.insurance_policy_number,
            allergies: wire.allergies,
            current_medications: wire.current_medications,
            family_medical_history: wire.family_medical_history,
            past_medical_history: wire.past_medical_history,
            identification_type: wire.identification_type,
            identification_number: wire.identification_number,
            identification_document_id: wire.identification_document_id,
            identification_document_url: wire.identification_document_url,
            treatment_consent: wire.treatment_consent,
            disclosure_consent: wire.disclosure_consent,
            privacy_consent: wire.privacy_consent,
            created_at: doc.created_at,
        })
    }
}

/// Payload for the registration step.
#[derive(Clone, Debug)]
pub struct PatientRegistration {
    pub user_id: String,
    pub name: String,
    pub email: EmailAddress,
    pub phone: PhoneNumber,
    pub birth_date: DateTime<Utc>,
    pub gender: Gender,
    pub address: String,
    pub occupation: String,
    pub emergency_contact_name: String,
    pub emergency_contact_number: PhoneNumber,
    pub primary_physician: String,
    pub insurance_provider: String,
    pub insurance_policy_number: String,
    pub allergies: Option<String>,
    pub current_medications: Option<String>,
    pub family_medical_history: Option<String>,
    pub past_medical_history: Option<String>,
    pub identification_type: Option<String>,
    pub identification_number: Option<String>,
    pub identification_document: Option<FileUpload>,
    pub treatment_consent: bool,
    pub disclosure_consent: bool,
    pub privacy_consent: bool,
}

impl PatientRegistration {
    /// True when every consent flag is accepted.
    pub fn consented(&self) -> bool {
        self.treatment_consent && self.disclosure_consent && self.privacy_consent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn gender_parse_round_trips() {
        for gender in [Gender::Male, Gender::Female, Gender::Other] {
            assert_eq!(Gender::parse(gender.as_str()), Some(gender));
        }
        assert_eq!(Gender::parse("unknown"), None);
    }

    #[test]
    fn profile_translation_defaults_optional_fields() {
        let doc = Document {
            id: "p1".into(),
            created_at: Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 0).unwrap(),
            fields: serde_json::json!({
                "user_id": "u1",
                "name": "Ahmed Radi",
                "email": "ahmed@clinic.example",
                "phone": "+201019278438",
                "birth_date": "1994-06-12T00:00:00Z",
                "gender": "male",
                "address": "Helwan, Cairo",
                "occupation": "Engineer",
                "emergency_contact_name": "Guardian",
                "emergency_contact_number": "+201019278439",
                "primary_physician": "Leila Cameron",
                "insurance_provider": "BlueCross",
                "insurance_policy_number": "ABC145896",
                "treatment_consent": true,
                "disclosure_consent": true,
                "privacy_consent": true
            }),
        };

        let profile = PatientProfile::from_document(&doc).expect("translate");
        assert_eq!(profile.id, "p1");
        assert_eq!(profile.gender, Gender::Male);
        assert_eq!(profile.allergies, None);
        assert_eq!(profile.identification_document_id, None);
    }
}
