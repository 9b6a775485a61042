//! The form session: validate → submit → react-to-result.
//!
//! A [`FormSession`] binds a field list and a rule set into the submit
//! lifecycle. Submits within one session are strictly serialized by the busy
//! flag: a second attempt while one is in flight is suppressed, never queued.
//! Validation failures halt before any collaborator call; action failures
//! leave the user's input intact.

use crate::control::{rendered, RenderedField};
use crate::descriptor::FieldDescriptor;
use crate::rules::{RuleSet, ValidatedPayload};
use crate::state::{FieldValue, FormState, FormValues};
use chrono::{DateTime, Utc};
use std::future::Future;

/// Result of one submit attempt.
#[derive(Clone, Debug, PartialEq)]
pub enum SubmitOutcome<T> {
    /// Validation passed and the external action succeeded.
    Completed(T),
    /// Validation failed; errors are on the session state, nothing was sent.
    Rejected,
    /// A submit was already in flight; this attempt was a no-op.
    Suppressed,
    /// The external action failed; values are preserved for a manual retry.
    Failed,
}

/// Result of [`FormSession::begin_submit`].
#[derive(Clone, Debug, PartialEq)]
pub enum BeginSubmit {
    /// Busy flag was already set; nothing happened.
    Suppressed,
    /// Validation failed; errors were written to the session state and the
    /// busy flag was cleared.
    Invalid,
    /// Validation passed; the busy flag stays set until
    /// [`FormSession::finish_submit`].
    Valid(ValidatedPayload),
}

/// One form's submit/validate/error lifecycle.
pub struct FormSession {
    fields: Vec<FieldDescriptor>,
    rules: RuleSet,
    defaults: FormValues,
    state: FormState,
}

impl FormSession {
    /// Creates a session with empty defaults.
    pub fn new(fields: Vec<FieldDescriptor>, rules: RuleSet) -> Self {
        Self::with_defaults(fields, rules, FormValues::new())
    }

    /// Creates a session whose values start from `defaults` (e.g. derived
    /// from the record being edited).
    pub fn with_defaults(fields: Vec<FieldDescriptor>, rules: RuleSet, defaults: FormValues) -> Self {
        Self {
            fields,
            rules,
            state: FormState::with_defaults(defaults.clone()),
            defaults,
        }
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Updates one field's value, as on a keystroke or selection.
    pub fn set_value(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.state.values_mut().set(name, value);
    }

    pub fn clear_value(&mut self, name: &str) {
        self.state.values_mut().remove(name);
    }

    /// Renders every field against the current values.
    pub fn render(&self) -> Vec<RenderedField> {
        self.fields
            .iter()
            .map(|field| rendered(field, self.state.values().get(field.name())))
            .collect()
    }

    /// Restores the session to its defaults, as when an in-place edit closes
    /// its modal after success.
    pub fn reset(&mut self) {
        self.state.replace_values(self.defaults.clone());
        self.state.clear_errors();
    }

    /// Starts a submit attempt: sets the busy flag and validates.
    ///
    /// When validation fails the errors land on the session state and the
    /// busy flag is cleared immediately; no collaborator call should be made.
    /// When it passes, the busy flag stays set until
    /// [`FormSession::finish_submit`], which is what suppresses a concurrent
    /// second attempt.
    pub fn begin_submit(&mut self, now: DateTime<Utc>) -> BeginSubmit {
        if self.state.is_busy() {
            return BeginSubmit::Suppressed;
        }
        self.state.set_busy(true);

        match self.rules.validate(self.state.values(), now) {
            Ok(payload) => {
                self.state.clear_errors();
                BeginSubmit::Valid(payload)
            }
            Err(errors) => {
                self.state.set_errors(errors);
                self.state.set_busy(false);
                BeginSubmit::Invalid
            }
        }
    }

    /// Ends an in-flight submit, clearing the busy flag. Values are left
    /// untouched either way; callers reset explicitly when they want a fresh
    /// form.
    pub fn finish_submit(&mut self) {
        self.state.set_busy(false);
    }

    /// Runs the full lifecycle: validate, hand the payload to `action`, and
    /// map the result. Action failures are logged and reduced to a generic
    /// [`SubmitOutcome::Failed`]; no field-level error is synthesized for
    /// them.
    pub async fn submit<T, E, F, Fut>(&mut self, now: DateTime<Utc>, action: F) -> SubmitOutcome<T>
    where
        F: FnOnce(ValidatedPayload) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let payload = match self.begin_submit(now) {
            BeginSubmit::Suppressed => return SubmitOutcome::Suppressed,
            BeginSubmit::Invalid => return SubmitOutcome::Rejected,
            BeginSubmit::Valid(payload) => payload,
        };

        let result = action(payload).await;
        self.finish_submit();

        match result {
            Ok(value) => SubmitOutcome::Completed(value),
            Err(err) => {
                tracing::warn!("form submission failed: {err}");
                SubmitOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{FieldDescriptor, FieldVariant};
    use crate::rules::Rule;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn reason_session() -> FormSession {
        FormSession::new(
            vec![FieldDescriptor::new(FieldVariant::TextArea, "reason")
                .with_label("Reason for appointment")],
            RuleSet::new().field("reason", &[Rule::Required, Rule::MinLength(2)]),
        )
    }

    #[tokio::test]
    async fn invalid_submit_halts_before_the_action() {
        let mut session = reason_session();
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
        assert_eq!(session.state().errors()["reason"], "This field is required");
        assert!(!session.state().is_busy());
    }

    #[tokio::test]
    async fn successful_submit_clears_busy_and_errors() {
        let mut session = reason_session();
        session.set_value("reason", "annual checkup");

        let outcome = session
            .submit(now(), |payload| async move {
                Ok::<_, std::convert::Infallible>(payload.text("reason").unwrap().to_owned())
            })
            .await;

        assert_eq!(outcome, SubmitOutcome::Completed("annual checkup".to_owned()));
        assert!(session.state().errors().is_empty());
        assert!(!session.state().is_busy());
    }

    #[tokio::test]
    async fn action_failure_preserves_values() {
        let mut session = reason_session();
        session.set_value("reason", "annual checkup");

        let outcome = session
            .submit(now(), |_payload| async { Err::<(), _>("backend down") })
            .await;

        assert_eq!(outcome, SubmitOutcome::Failed);
        assert_eq!(session.state().values().text("reason"), Some("annual checkup"));
        assert!(session.state().errors().is_empty());
        assert!(!session.state().is_busy());
    }

    #[test]
    fn second_begin_while_busy_is_suppressed() {
        let mut session = reason_session();
        session.set_value("reason", "annual checkup");

        let first = session.begin_submit(now());
        assert!(matches!(first, BeginSubmit::Valid(_)));
        assert!(session.state().is_busy());

        let second = session.begin_submit(now());
        assert_eq!(second, BeginSubmit::Suppressed);

        session.finish_submit();
        assert!(matches!(session.begin_submit(now()), BeginSubmit::Valid(_)));
    }

    #[test]
    fn reset_restores_defaults() {
        let defaults = FormValues::new().with("reason", "follow-up");
        let mut session = FormSession::with_defaults(
            vec![FieldDescriptor::new(FieldVariant::TextArea, "reason")],
            RuleSet::new().field("reason", &[Rule::Required]),
            defaults,
        );

        session.set_value("reason", "something else");
        session.reset();
        assert_eq!(session.state().values().text("reason"), Some("follow-up"));
    }

    #[test]
    fn render_uses_current_values() {
        let mut session = reason_session();
        session.set_value("reason", "annual checkup");

        let fields = session.render();
        assert_eq!(fields.len(), 1);
        match &fields[0].control {
            Some(crate::control::Control::TextArea { value, .. }) => {
                assert_eq!(value, "annual checkup")
            }
            other => panic!("expected TextArea, got {other:?}"),
        }
    }
}
