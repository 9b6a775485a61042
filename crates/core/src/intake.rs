//! Declarative form definitions for every intake flow.
//!
//! Each function here pairs a field list with its schema into a ready
//! [`FormSession`]. The two fields the fixed variant set cannot express —
//! the gender radio group and the identification-document uploader — go
//! through the composite escape hatch with the render functions defined
//! below.

use crate::appointment::{AppointmentMode, AppointmentRecord};
use crate::constants::{GENDER_OPTIONS, IDENTIFICATION_TYPES, PHYSICIANS};
use crate::schema::{appointment_rules, registration_rules, user_rules};
use carebook_forms::{
    Control, FieldDescriptor, FieldValue, FieldVariant, FormSession, FormValues, SelectOption,
};
use chrono::{DateTime, Utc};

/// Roster options for the physician select, with avatars.
pub fn physician_options() -> Vec<SelectOption> {
    PHYSICIANS
        .iter()
        .map(|physician| {
            SelectOption::new(physician.name, format!("Dr. {}", physician.name))
                .with_image(physician.avatar)
        })
        .collect()
}

/// Options for the identification-type select.
pub fn identification_type_options() -> Vec<SelectOption> {
    IDENTIFICATION_TYPES
        .iter()
        .map(|kind| SelectOption::new(*kind, *kind))
        .collect()
}

/// Composite renderer for the gender radio group.
fn render_gender_group(descriptor: &FieldDescriptor, value: Option<&FieldValue>) -> Option<Control> {
    Some(Control::Custom {
        name: descriptor.name().to_owned(),
        kind: "radio_group".to_owned(),
        config: serde_json::json!({
            "options": GENDER_OPTIONS,
            "selected": value.and_then(FieldValue::as_text),
        }),
    })
}

/// Composite renderer for the identification-document uploader.
fn render_document_uploader(
    descriptor: &FieldDescriptor,
    value: Option<&FieldValue>,
) -> Option<Control> {
    let files: Vec<&str> = value
        .and_then(FieldValue::as_files)
        .map(|files| files.iter().map(|f| f.file_name.as_str()).collect())
        .unwrap_or_default();
    Some(Control::Custom {
        name: descriptor.name().to_owned(),
        kind: "file_upload".to_owned(),
        config: serde_json::json!({ "files": files }),
    })
}

fn name_field() -> FieldDescriptor {
    FieldDescriptor::new(FieldVariant::Text, "name")
        .with_label("Full name")
        .with_placeholder("Ahmed Radi")
        .with_icon("/assets/icons/user.svg")
}

fn email_field() -> FieldDescriptor {
    FieldDescriptor::new(FieldVariant::Text, "email")
        .with_label("Email")
        .with_placeholder("ahmedradi@example.com")
        .with_icon("/assets/icons/email.svg")
}

fn phone_field() -> FieldDescriptor {
    FieldDescriptor::new(FieldVariant::PhoneNumber, "phone")
        .with_label("Phone number")
        .with_placeholder("+201019278438")
}

/// The first intake step: name, email, phone.
pub fn user_form() -> Vec<FieldDescriptor> {
    vec![name_field(), email_field(), phone_field()]
}

/// The full registration form.
pub fn registration_form() -> Vec<FieldDescriptor> {
    vec![
        name_field(),
        email_field(),
        phone_field(),
        FieldDescriptor::new(FieldVariant::DatePicker, "birth_date").with_label("Date of birth"),
        FieldDescriptor::new(FieldVariant::Composite, "gender")
            .with_label("Gender")
            .with_composite(render_gender_group),
        FieldDescriptor::new(FieldVariant::Text, "address")
            .with_label("Address")
            .with_placeholder("Helwan, Cairo, Egypt"),
        FieldDescriptor::new(FieldVariant::Text, "occupation")
            .with_label("Occupation")
            .with_placeholder("Software Engineer"),
        FieldDescriptor::new(FieldVariant::Text, "emergency_contact_name")
            .with_label("Emergency contact name")
            .with_placeholder("Guardian's name"),
        FieldDescriptor::new(FieldVariant::PhoneNumber, "emergency_contact_number")
            .with_label("Emergency contact number")
            .with_placeholder("+201019278438"),
        FieldDescriptor::new(FieldVariant::Select, "primary_physician")
            .with_label("Primary physician")
            .with_placeholder("Select a physician")
            .with_options(physician_options()),
        FieldDescriptor::new(FieldVariant::Text, "insurance_provider")
            .with_label("Insurance provider")
            .with_placeholder("BlueCross BlueShield"),
        FieldDescriptor::new(FieldVariant::Text, "insurance_policy_number")
            .with_label("Insurance policy number")
            .with_placeholder("ABC145896"),
        FieldDescriptor::new(FieldVariant::TextArea, "allergies")
            .with_label("Allergies (if any)")
            .with_placeholder("Peanuts, Penicillin, Pollen"),
        FieldDescriptor::new(FieldVariant::TextArea, "current_medications")
            .with_label("Current medications (if any)")
            .with_placeholder("Ibuprofen, Paracetamol"),
        FieldDescriptor::new(FieldVariant::TextArea, "family_medical_history")
            .with_label("Family medical history (if any)")
            .with_placeholder("Mother: Diabetes, Father: Hypertension"),
        FieldDescriptor::new(FieldVariant::TextArea, "past_medical_history")
            .with_label("Past medical history")
            .with_placeholder("Appendectomy, Tonsillectomy"),
        FieldDescriptor::new(FieldVariant::Select, "identification_type")
            .with_label("Identification type")
            .with_placeholder("Select an identification type")
            .with_options(identification_type_options()),
        FieldDescriptor::new(FieldVariant::Text, "identification_number")
            .with_label("Identification number")
            .with_placeholder("14789652"),
        FieldDescriptor::new(FieldVariant::Composite, "identification_document")
            .with_label("Identification document")
            .with_composite(render_document_uploader),
        FieldDescriptor::new(FieldVariant::Checkbox, "treatment_consent")
            .with_label("I consent to treatment"),
        FieldDescriptor::new(FieldVariant::Checkbox, "disclosure_consent")
            .with_label("I consent to disclosure of information"),
        FieldDescriptor::new(FieldVariant::Checkbox, "privacy_consent")
            .with_label("I consent to privacy policy"),
    ]
}

/// The appointment form for a given mode. Cancel shows only the
/// cancellation reason; create and schedule share the physician, schedule,
/// reason, and note fields.
pub fn appointment_form(mode: AppointmentMode) -> Vec<FieldDescriptor> {
    match mode {
        AppointmentMode::Cancel => vec![FieldDescriptor::new(
            FieldVariant::TextArea,
            "cancellation_reason",
        )
        .with_label("Reason for cancellation")
        .with_placeholder("Enter reason for cancellation")],
        AppointmentMode::Create | AppointmentMode::Schedule => vec![
            FieldDescriptor::new(FieldVariant::Select, "primary_physician")
                .with_label("Doctor")
                .with_placeholder("Select a doctor")
                .with_options(physician_options()),
            FieldDescriptor::new(FieldVariant::DatePicker, "schedule")
                .with_label("Expected appointment date")
                .with_date_format("MM/dd/yyyy - h:mm aa")
                .with_time_select(),
            FieldDescriptor::new(FieldVariant::TextArea, "reason")
                .with_label("Reason for appointment")
                .with_placeholder("Enter reason for appointment"),
            FieldDescriptor::new(FieldVariant::TextArea, "note")
                .with_label("Notes")
                .with_placeholder("Enter notes"),
        ],
    }
}

/// Default values for an appointment form: taken from the record being
/// edited, or a fresh form anchored at `now`.
pub fn appointment_defaults(existing: Option<&AppointmentRecord>, now: DateTime<Utc>) -> FormValues {
    match existing {
        Some(record) => FormValues::new()
            .with("primary_physician", record.primary_physician.clone())
            .with("schedule", record.schedule)
            .with("reason", record.reason.clone().unwrap_or_default())
            .with("note", record.note.clone().unwrap_or_default())
            .with(
                "cancellation_reason",
                record.cancellation_reason.clone().unwrap_or_default(),
            ),
        None => FormValues::new()
            .with("primary_physician", "")
            .with("schedule", now)
            .with("reason", "")
            .with("note", ""),
    }
}

/// Session for the first intake step.
pub fn user_session() -> FormSession {
    FormSession::new(user_form(), user_rules())
}

/// Session for the registration form.
pub fn registration_session() -> FormSession {
    FormSession::new(registration_form(), registration_rules())
}

/// Session for an appointment form, prefilled from `existing` when an
/// operator is editing a record.
pub fn appointment_session(
    mode: AppointmentMode,
    existing: Option<&AppointmentRecord>,
    now: DateTime<Utc>,
) -> FormSession {
    FormSession::with_defaults(
        appointment_form(mode),
        appointment_rules(mode),
        appointment_defaults(existing, now),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appointment::{AppointmentStatus, NewAppointment};
    use crate::lifecycle::AppointmentService;
    use carebook_forms::{BeginSubmit, SubmitOutcome};
    use carebook_store::{MemorySender, MemoryStore};
    use chrono::{Duration, TimeZone};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn cancel_form_shows_only_the_cancellation_reason() {
        let fields = appointment_form(AppointmentMode::Cancel);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].name(), "cancellation_reason");
    }

    #[test]
    fn gender_composite_renders_the_radio_group() {
        let session = registration_session();
        let rendered = session.render();
        let gender = rendered
            .iter()
            .find(|field| field.name == "gender")
            .expect("gender field");
        match &gender.control {
            Some(Control::Custom { kind, config, .. }) => {
                assert_eq!(kind, "radio_group");
                assert_eq!(config["options"][0], "male");
            }
            other => panic!("expected Custom control, got {other:?}"),
        }
    }

    #[test]
    fn every_registration_field_renders() {
        let session = registration_session();
        for field in session.render() {
            assert!(field.control.is_some(), "field {} rendered nothing", field.name);
        }
    }

    #[test]
    fn defaults_prefill_from_an_existing_record() {
        let record = AppointmentRecord {
            id: "a1".into(),
            user_id: "u1".into(),
            patient_id: "p1".into(),
            primary_physician: "Jane Powell".into(),
            schedule: Utc.with_ymd_and_hms(2026, 4, 2, 15, 0, 0).unwrap(),
            status: AppointmentStatus::Pending,
            reason: Some("back pain".into()),
            note: None,
            cancellation_reason: None,
            created_at: now(),
        };

        let defaults = appointment_defaults(Some(&record), now());
        assert_eq!(defaults.text("primary_physician"), Some("Jane Powell"));
        assert_eq!(defaults.datetime("schedule"), Some(record.schedule));
        assert_eq!(defaults.text("reason"), Some("back pain"));

        let fresh = appointment_defaults(None, now());
        assert_eq!(fresh.datetime("schedule"), Some(now()));
        assert_eq!(fresh.text("primary_physician"), Some(""));
    }

    #[tokio::test]
    async fn a_double_click_creates_exactly_one_record() {
        let store = Arc::new(MemoryStore::new());
        let service =
            AppointmentService::new(store, Arc::new(MemorySender::new()), "CareBook");

        let mut session = appointment_session(AppointmentMode::Create, None, now());
        session.set_value("primary_physician", "Leila Cameron");
        session.set_value("schedule", now() + Duration::days(3));
        session.set_value("reason", "annual checkup");

        let payload = match session.begin_submit(now()) {
            BeginSubmit::Valid(payload) => payload,
            other => panic!("expected valid payload, got {other:?}"),
        };
        // The second click lands while the first submit is still in flight.
        assert_eq!(session.begin_submit(now()), BeginSubmit::Suppressed);

        service
            .create_appointment(NewAppointment {
                user_id: "u1".into(),
                patient_id: "p1".into(),
                primary_physician: payload
                    .text("primary_physician")
                    .unwrap_or_default()
                    .to_owned(),
                schedule: payload.datetime("schedule").expect("schedule"),
                reason: payload.text("reason").unwrap_or_default().to_owned(),
                note: None,
            })
            .await
            .expect("create");
        session.finish_submit();

        let board = service.recent_appointments().await.expect("board");
        assert_eq!(board.counts.total_count, 1);
        assert_eq!(board.counts.pending_count, 1);
    }

    #[tokio::test]
    async fn an_unconsented_registration_makes_zero_collaborator_calls() {
        let mut session = registration_session();
        session.set_value("name", "Ahmed Radi");
        session.set_value("email", "ahmed@clinic.example");
        session.set_value("phone", "+201019278438");
        session.set_value("birth_date", now() - Duration::days(11000));
        session.set_value("gender", "male");
        session.set_value("address", "Helwan, Cairo, Egypt");
        session.set_value("occupation", "Engineer");
        session.set_value("emergency_contact_name", "Guardian");
        session.set_value("emergency_contact_number", "+201019278439");
        session.set_value("primary_physician", "Leila Cameron");
        session.set_value("insurance_provider", "BlueCross");
        session.set_value("insurance_policy_number", "ABC145896");
        session.set_value("treatment_consent", true);
        session.set_value("disclosure_consent", false);
        session.set_value("privacy_consent", false);

        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        let outcome = session
            .submit(now(), |_payload| {
                seen.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, std::convert::Infallible>(()) }
            })
            .await;

        assert_eq!(outcome, SubmitOutcome::Rejected);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        let errors = session.state().errors();
        assert!(errors.contains_key("disclosure_consent"));
        assert!(errors.contains_key("privacy_consent"));
        assert!(!errors.contains_key("treatment_consent"));
    }

    #[test]
    fn physician_options_carry_avatars() {
        let options = physician_options();
        assert_eq!(options.len(), PHYSICIANS.len());
        assert!(options[0].image.is_some());
        assert!(options[0].label.starts_with("Dr. "));
    }
}
