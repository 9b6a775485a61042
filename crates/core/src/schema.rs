//! Mode-conditioned validation schemas.
//!
//! Each builder is a pure mapping from an operation context to a declarative
//! [`RuleSet`]; nothing here branches at submit time. The relationship
//! between a mode and its mandatory fields lives entirely in this module so
//! it can be read, and tested, in one place.

use crate::appointment::AppointmentMode;
use crate::constants::GENDER_OPTIONS;
use carebook_forms::{Rule, RuleSet};

/// Rules for the first intake step (name, email, phone).
pub fn user_rules() -> RuleSet {
    RuleSet::new()
        .field("name", &[Rule::Required, Rule::MinLength(2), Rule::MaxLength(50)])
        .field("email", &[Rule::Required, Rule::Email])
        .field("phone", &[Rule::Required, Rule::Phone])
}

/// Rules for the registration form: the intake fields plus demographics,
/// insurance, and the consent gate. All three consent flags must be true or
/// each unmet flag gets its own field-scoped error.
pub fn registration_rules() -> RuleSet {
    user_rules()
        .field("birth_date", &[Rule::Required])
        .field("gender", &[Rule::Required, Rule::OneOf(GENDER_OPTIONS)])
        .field("address", &[Rule::Required, Rule::MinLength(5), Rule::MaxLength(500)])
        .field("occupation", &[Rule::Required, Rule::MinLength(2), Rule::MaxLength(500)])
        .field(
            "emergency_contact_name",
            &[Rule::Required, Rule::MinLength(2), Rule::MaxLength(50)],
        )
        .field("emergency_contact_number", &[Rule::Required, Rule::Phone])
        .field("primary_physician", &[Rule::Required, Rule::MinLength(2)])
        .field(
            "insurance_provider",
            &[Rule::Required, Rule::MinLength(2), Rule::MaxLength(50)],
        )
        .field(
            "insurance_policy_number",
            &[Rule::Required, Rule::MinLength(2), Rule::MaxLength(50)],
        )
        .field(
            "treatment_consent",
            &[Rule::MustBeTrue("You must consent to treatment in order to proceed")],
        )
        .field(
            "disclosure_consent",
            &[Rule::MustBeTrue(
                "You must consent to disclosure of information in order to proceed",
            )],
        )
        .field(
            "privacy_consent",
            &[Rule::MustBeTrue("You must consent to the privacy policy in order to proceed")],
        )
}

/// Rules for an appointment form, conditioned on mode.
///
/// - `create`: physician, a future-or-present schedule, and a reason.
/// - `schedule`: physician and schedule only.
/// - `cancel`: a cancellation reason; everything else is optional.
pub fn appointment_rules(mode: AppointmentMode) -> RuleSet {
    match mode {
        AppointmentMode::Create => RuleSet::new()
            .field("primary_physician", &[Rule::Required, Rule::MinLength(2)])
            .field("schedule", &[Rule::Required, Rule::FutureOrPresent])
            .field("reason", &[Rule::Required, Rule::MinLength(2), Rule::MaxLength(500)])
            .field("note", &[Rule::MaxLength(500)]),
        AppointmentMode::Schedule => RuleSet::new()
            .field("primary_physician", &[Rule::Required, Rule::MinLength(2)])
            .field("schedule", &[Rule::Required, Rule::FutureOrPresent]),
        AppointmentMode::Cancel => RuleSet::new().field(
            "cancellation_reason",
            &[Rule::Required, Rule::MinLength(2), Rule::MaxLength(500)],
        ),
    }
}
