//! Declarative validation rules.
//!
//! A [`RuleSet`] is the output of a schema builder: a flat list of per-field
//! rules evaluated in one pass against the form's values. Evaluation is pure
//! (the clock is passed in) and produces either a normalized payload or a
//! mapping from field name to a single human-readable message, which becomes
//! the session's error state.

use crate::state::{FieldValue, FormValues};
use carebook_types::{is_e164, is_email_shaped};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Field-name → message mapping produced by a failed validation. At most one
/// message per field: the first failing rule wins.
pub type ValidationErrors = BTreeMap<String, String>;

/// One validation rule applied to a single field.
///
/// Rules other than [`Rule::Required`] and [`Rule::MustBeTrue`] are skipped
/// when the field is absent or blank; pairing them with `Required` is the
/// schema builder's choice, which keeps optional fields optional.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Rule {
    /// Must be present and non-blank.
    Required,
    /// Minimum text length (characters).
    MinLength(usize),
    /// Maximum text length (characters).
    MaxLength(usize),
    /// Must look like an email address.
    Email,
    /// Must be an E.164 phone number.
    Phone,
    /// Timestamp must not lie in the past relative to the evaluation clock.
    FutureOrPresent,
    /// Text must be one of the allowed values (a static roster).
    OneOf(&'static [&'static str]),
    /// Boolean must be `true`; carries its own field-scoped message, used by
    /// the consent gate.
    MustBeTrue(&'static str),
}

impl Rule {
    /// Evaluates this rule against one field value, returning the message on
    /// failure.
    fn check(&self, value: Option<&FieldValue>, now: DateTime<Utc>) -> Option<String> {
        let present = value.map(|v| !v.is_blank()).unwrap_or(false);

        match self {
            Rule::Required => {
                if present {
                    None
                } else {
                    Some("This field is required".to_owned())
                }
            }
            Rule::MustBeTrue(message) => match value.and_then(FieldValue::as_bool) {
                Some(true) => None,
                _ => Some((*message).to_owned()),
            },
            _ if !present => None,
            Rule::MinLength(min) => value.and_then(FieldValue::as_text).and_then(|s| {
                let len = s.trim().chars().count();
                (len < *min).then(|| format!("Must be at least {min} characters"))
            }),
            Rule::MaxLength(max) => value.and_then(FieldValue::as_text).and_then(|s| {
                let len = s.trim().chars().count();
                (len > *max).then(|| format!("Must be at most {max} characters"))
            }),
            Rule::Email => value.and_then(FieldValue::as_text).and_then(|s| {
                (!is_email_shaped(s.trim())).then(|| "Invalid email address".to_owned())
            }),
            Rule::Phone => value.and_then(FieldValue::as_text).and_then(|s| {
                (!is_e164(s.trim())).then(|| "Invalid phone number".to_owned())
            }),
            Rule::OneOf(allowed) => value.and_then(FieldValue::as_text).and_then(|s| {
                (!allowed.contains(&s.trim())).then(|| "Invalid selection".to_owned())
            }),
            Rule::FutureOrPresent => match value {
                Some(FieldValue::DateTime(dt)) => {
                    (*dt < now).then(|| "Date cannot be in the past".to_owned())
                }
                Some(_) => Some("Invalid date".to_owned()),
                None => None,
            },
        }
    }
}

/// Rules for one named field.
#[derive(Clone, Debug, PartialEq, Eq)]
struct FieldRules {
    name: String,
    rules: Vec<Rule>,
}

/// A validator produced by a schema builder: per-field rules evaluated in a
/// single pass over the form's values.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RuleSet {
    fields: Vec<FieldRules>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends rules for `name`. Builder-style so schema builders read as a
    /// declaration.
    pub fn field(mut self, name: impl Into<String>, rules: &[Rule]) -> Self {
        self.fields.push(FieldRules {
            name: name.into(),
            rules: rules.to_vec(),
        });
        self
    }

    /// Validates `values` against every field's rules.
    ///
    /// Returns the normalized payload (text trimmed) on success, or the
    /// field-scoped error mapping on failure. `now` anchors the
    /// [`Rule::FutureOrPresent`] check so evaluation stays pure.
    pub fn validate(
        &self,
        values: &FormValues,
        now: DateTime<Utc>,
    ) -> Result<ValidatedPayload, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        for field in &self.fields {
            let value = values.get(&field.name);
            for rule in &field.rules {
                if let Some(message) = rule.check(value, now) {
                    errors.entry(field.name.clone()).or_insert(message);
                    break;
                }
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        let mut normalized = FormValues::new();
        for (name, value) in values.iter() {
            let value = match value {
                FieldValue::Text(s) => FieldValue::Text(s.trim().to_owned()),
                other => other.clone(),
            };
            normalized.set(name.clone(), value);
        }
        Ok(ValidatedPayload { values: normalized })
    }
}

/// A payload that passed validation: the normalized form values, with typed
/// accessors for the domain layer.
#[derive(Clone, Debug, PartialEq)]
pub struct ValidatedPayload {
    values: FormValues,
}

impl ValidatedPayload {
    pub fn text(&self, name: &str) -> Option<&str> {
        self.values.text(name).filter(|s| !s.is_empty())
    }

    pub fn flag(&self, name: &str) -> Option<bool> {
        self.values.flag(name)
    }

    pub fn datetime(&self, name: &str) -> Option<DateTime<Utc>> {
        self.values.datetime(name)
    }

    pub fn files(&self, name: &str) -> Option<&[crate::state::FileUpload]> {
        self.values.files(name).filter(|files| !files.is_empty())
    }

    pub fn values(&self) -> &FormValues {
        &self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn required_rejects_missing_and_blank() {
        let rules = RuleSet::new().field("reason", &[Rule::Required]);

        let errors = rules.validate(&FormValues::new(), now()).unwrap_err();
        assert_eq!(errors["reason"], "This field is required");

        let values = FormValues::new().with("reason", "   ");
        let errors = rules.validate(&values, now()).unwrap_err();
        assert_eq!(errors["reason"], "This field is required");
    }

    #[test]
    fn optional_rules_skip_absent_fields() {
        let rules = RuleSet::new().field("note", &[Rule::MinLength(2), Rule::MaxLength(500)]);
        assert!(rules.validate(&FormValues::new(), now()).is_ok());
    }

    #[test]
    fn first_failing_rule_wins() {
        let rules = RuleSet::new().field("name", &[Rule::Required, Rule::MinLength(2)]);
        let values = FormValues::new().with("name", "A");
        let errors = rules.validate(&values, now()).unwrap_err();
        assert_eq!(errors["name"], "Must be at least 2 characters");
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn email_and_phone_shapes() {
        let rules = RuleSet::new()
            .field("email", &[Rule::Email])
            .field("phone", &[Rule::Phone]);

        let values = FormValues::new()
            .with("email", "pat@clinic.example")
            .with("phone", "+201019278438");
        assert!(rules.validate(&values, now()).is_ok());

        let values = FormValues::new()
            .with("email", "not-an-email")
            .with("phone", "12345");
        let errors = rules.validate(&values, now()).unwrap_err();
        assert_eq!(errors["email"], "Invalid email address");
        assert_eq!(errors["phone"], "Invalid phone number");
    }

    #[test]
    fn future_or_present_accepts_now_rejects_past() {
        let rules = RuleSet::new().field("schedule", &[Rule::FutureOrPresent]);

        let values = FormValues::new().with("schedule", now());
        assert!(rules.validate(&values, now()).is_ok());

        let past = now() - chrono::Duration::minutes(1);
        let values = FormValues::new().with("schedule", past);
        let errors = rules.validate(&values, now()).unwrap_err();
        assert_eq!(errors["schedule"], "Date cannot be in the past");
    }

    #[test]
    fn one_of_rejects_values_outside_the_roster() {
        let rules = RuleSet::new().field("gender", &[Rule::OneOf(&["male", "female", "other"])]);

        let values = FormValues::new().with("gender", "female");
        assert!(rules.validate(&values, now()).is_ok());

        let values = FormValues::new().with("gender", "unspecified");
        let errors = rules.validate(&values, now()).unwrap_err();
        assert_eq!(errors["gender"], "Invalid selection");
    }

    #[test]
    fn must_be_true_reports_its_own_message() {
        let rules = RuleSet::new().field(
            "privacy_consent",
            &[Rule::MustBeTrue(
                "You must consent to the privacy policy in order to proceed",
            )],
        );

        let values = FormValues::new().with("privacy_consent", false);
        let errors = rules.validate(&values, now()).unwrap_err();
        assert_eq!(
            errors["privacy_consent"],
            "You must consent to the privacy policy in order to proceed"
        );

        let errors = rules.validate(&FormValues::new(), now()).unwrap_err();
        assert!(errors.contains_key("privacy_consent"));
    }

    #[test]
    fn payload_normalises_text() {
        let rules = RuleSet::new().field("reason", &[Rule::Required]);
        let values = FormValues::new().with("reason", "  annual checkup  ");
        let payload = rules.validate(&values, now()).expect("valid");
        assert_eq!(payload.text("reason"), Some("annual checkup"));
    }
}
