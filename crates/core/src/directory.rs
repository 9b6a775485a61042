//! Patient directory: user identities and registered profiles.
//!
//! User creation treats a duplicate-identity conflict as recoverable: the
//! existing record is looked up by its unique email and reused, invisibly to
//! the caller. Registration optionally stores an identification document
//! before the profile is written; absence of a document is a valid path.

use crate::constants::{IDENTIFICATION_BUCKET, PATIENTS_COLLECTION, USERS_COLLECTION};
use crate::error::{CoreError, CoreResult};
use crate::patient::{NewUser, PatientProfile, PatientRegistration, UserRecord};
use carebook_store::{DocumentStore, FileStore, Query, StoreError};
use std::sync::Arc;
use uuid::Uuid;

/// Service owning user and patient records.
pub struct PatientDirectory {
    store: Arc<dyn DocumentStore>,
    files: Arc<dyn FileStore>,
}

impl PatientDirectory {
    pub fn new(store: Arc<dyn DocumentStore>, files: Arc<dyn FileStore>) -> Self {
        Self { store, files }
    }

    /// Creates a user identity, reusing the existing record when the email
    /// is already registered.
    pub async fn create_user(&self, new: NewUser) -> CoreResult<UserRecord> {
        let id = Uuid::new_v4().to_string();
        let fields = serde_json::json!({
            "name": new.name,
            "email": new.email.as_str(),
            "phone": new.phone.as_str(),
        });

        match self.store.create(USERS_COLLECTION, &id, fields).await {
            Ok(doc) => {
                let user = UserRecord::from_document(&doc)?;
                tracing::info!(user_id = %user.id, "user created");
                Ok(user)
            }
            Err(StoreError::Conflict { .. }) => {
                tracing::info!(email = %new.email, "user already exists, reusing");
                let page = self
                    .store
                    .list(USERS_COLLECTION, &Query::new().equal("email", new.email.as_str()))
                    .await?;
                let doc = page.documents.first().ok_or_else(|| {
                    CoreError::Persistence(StoreError::Unknown(
                        "conflict reported but no user matched the email".into(),
                    ))
                })?;
                UserRecord::from_document(doc)
            }
            Err(other) => Err(other.into()),
        }
    }

    /// Fetches one user identity.
    pub async fn user(&self, id: &str) -> CoreResult<UserRecord> {
        let doc = self.store.get(USERS_COLLECTION, id).await?;
        UserRecord::from_document(&doc)
    }

    /// Registers a patient profile for an existing user.
    ///
    /// When an identification document is attached it is stored first; its
    /// reference is written with the profile and never updated afterwards.
    pub async fn register_patient(&self, registration: PatientRegistration) -> CoreResult<PatientProfile> {
        if !registration.consented() {
            return Err(CoreError::InvalidInput(
                "all consent flags must be accepted".into(),
            ));
        }

        let document_ref = match &registration.identification_document {
            Some(upload) => Some(
                self.files
                    .store_file(IDENTIFICATION_BUCKET, &upload.file_name, upload.bytes.clone())
                    .await?,
            ),
            None => None,
        };

        let id = Uuid::new_v4().to_string();
        let fields = serde_json::json!({
            "user_id": registration.user_id,
            "name": registration.name,
            "email": registration.email.as_str(),
            "phone": registration.phone.as_str(),
            "birth_date": registration.birth_date.to_rfc3339(),
            "gender": registration.gender.as_str(),
            "address": registration.address,
            "occupation": registration.occupation,
            "emergency_contact_name": registration.emergency_contact_name,
            "emergency_contact_number": registration.emergency_contact_number.as_str(),
            "primary_physician": registration.primary_physician,
            "insurance_provider": registration.insurance_provider,
            "insurance_policy_number": registration.insurance_policy_number,
            "allergies": registration.allergies,
            "current_medications": registration.current_medications,
            "family_medical_history": registration.family_medical_history,
            "past_medical_history": registration.past_medical_history,
            "identification_type": registration.identification_type,
            "identification_number": registration.identification_number,
            "identification_document_id": document_ref.as_ref().map(|file| file.id.clone()),
            "identification_document_url": document_ref.as_ref().map(|file| file.url.clone()),
            "treatment_consent": registration.treatment_consent,
            "disclosure_consent": registration.disclosure_consent,
            "privacy_consent": registration.privacy_consent,
        });

        let doc = self.store.create(PATIENTS_COLLECTION, &id, fields).await?;
        let profile = PatientProfile::from_document(&doc)?;
        tracing::info!(patient_id = %profile.id, user_id = %profile.user_id, "patient registered");
        Ok(profile)
    }

    /// The registered profile for a user, if any.
    pub async fn patient_for_user(&self, user_id: &str) -> CoreResult<Option<PatientProfile>> {
        let page = self
            .store
            .list(PATIENTS_COLLECTION, &Query::new().equal("user_id", user_id))
            .await?;
        page.documents
            .first()
            .map(PatientProfile::from_document)
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patient::Gender;
    use carebook_forms::FileUpload;
    use carebook_store::{MemoryFileStore, MemoryStore};
    use carebook_types::{EmailAddress, PhoneNumber};
    use chrono::TimeZone;

    fn directory() -> (Arc<MemoryStore>, Arc<MemoryFileStore>, PatientDirectory) {
        let store = Arc::new(MemoryStore::new().with_unique_key(USERS_COLLECTION, "email"));
        let files = Arc::new(MemoryFileStore::new("https://files.carebook.example"));
        let directory = PatientDirectory::new(store.clone(), files.clone());
        (store, files, directory)
    }

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Ahmed Radi".into(),
            email: EmailAddress::new(email).expect("email"),
            phone: PhoneNumber::new("+201019278438").expect("phone"),
        }
    }

    fn registration(user_id: &str) -> PatientRegistration {
        PatientRegistration {
            user_id: user_id.into(),
            name: "Ahmed Radi".into(),
            email: EmailAddress::new("ahmed@clinic.example").expect("email"),
            phone: PhoneNumber::new("+201019278438").expect("phone"),
            birth_date: chrono::Utc.with_ymd_and_hms(1994, 6, 12, 0, 0, 0).unwrap(),
            gender: Gender::Male,
            address: "Helwan, Cairo, Egypt".into(),
            occupation: "Engineer".into(),
            emergency_contact_name: "Guardian".into(),
            emergency_contact_number: PhoneNumber::new("+201019278439").expect("phone"),
            primary_physician: "Leila Cameron".into(),
            insurance_provider: "BlueCross".into(),
            insurance_policy_number: "ABC145896".into(),
            allergies: None,
            current_medications: None,
            family_medical_history: None,
            past_medical_history: None,
            identification_type: Some("Passport".into()),
            identification_number: Some("14789652".into()),
            identification_document: None,
            treatment_consent: true,
            disclosure_consent: true,
            privacy_consent: true,
        }
    }

    #[tokio::test]
    async fn duplicate_email_reuses_the_existing_user() {
        let (_store, _files, directory) = directory();
        let first = directory
            .create_user(new_user("pat@clinic.example"))
            .await
            .expect("create");
        let second = directory
            .create_user(new_user("pat@clinic.example"))
            .await
            .expect("conflict recovered");

        assert_eq!(first.id, second.id);
        assert_eq!(second.email, "pat@clinic.example");
    }

    #[tokio::test]
    async fn registration_without_document_is_valid() {
        let (_store, files, directory) = directory();
        let user = directory
            .create_user(new_user("ahmed@clinic.example"))
            .await
            .expect("create user");

        let profile = directory
            .register_patient(registration(&user.id))
            .await
            .expect("register");

        assert_eq!(profile.user_id, user.id);
        assert_eq!(profile.identification_document_id, None);
        assert_eq!(profile.identification_document_url, None);
        assert!(files.is_empty());
    }

    #[tokio::test]
    async fn registration_stores_the_identification_document_first() {
        let (_store, files, directory) = directory();
        let user = directory
            .create_user(new_user("ahmed@clinic.example"))
            .await
            .expect("create user");

        let mut reg = registration(&user.id);
        reg.identification_document = Some(FileUpload::new("passport.png", vec![7u8; 32]));
        let profile = directory.register_patient(reg).await.expect("register");

        let document_id = profile.identification_document_id.expect("document id");
        assert_eq!(files.len(), 1);
        assert!(profile
            .identification_document_url
            .expect("document url")
            .contains(&document_id));
    }

    #[tokio::test]
    async fn registration_rejects_missing_consent() {
        let (_store, files, directory) = directory();
        let mut reg = registration("u1");
        reg.privacy_consent = false;
        reg.identification_document = Some(FileUpload::new("passport.png", vec![7u8; 32]));

        let err = directory.register_patient(reg).await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));
        assert!(files.is_empty());
    }

    #[tokio::test]
    async fn patient_lookup_by_user() {
        let (_store, _files, directory) = directory();
        let user = directory
            .create_user(new_user("ahmed@clinic.example"))
            .await
            .expect("create user");
        assert!(directory
            .patient_for_user(&user.id)
            .await
            .expect("lookup")
            .is_none());

        directory
            .register_patient(registration(&user.id))
            .await
            .expect("register");

        let found = directory
            .patient_for_user(&user.id)
            .await
            .expect("lookup")
            .expect("profile");
        assert_eq!(found.primary_physician, "Leila Cameron");
    }
}
