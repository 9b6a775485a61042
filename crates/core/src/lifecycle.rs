//! Appointment lifecycle controller.
//!
//! Owns every state transition an appointment record can make. A transition
//! is persisted first; only after the write commits is the patient notified
//! and the admin view marked stale. Persistence failure aborts the whole
//! transition. Notification failure after the commit is logged and surfaced
//! as a non-fatal flag on the outcome — the state change is never rolled
//! back for a lost message.

use crate::appointment::{
    AppointmentBoard, AppointmentCounts, AppointmentMode, AppointmentRecord, AppointmentTransition,
    NewAppointment,
};
use crate::constants::APPOINTMENTS_COLLECTION;
use crate::error::{CoreError, CoreResult};
use carebook_store::{DocumentStore, MessageSender, Query};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Staleness marker for the admin list view.
///
/// Marked on every committed transition; the view takes the flag when it
/// re-fetches. Cheap to clone — all clones share the flag.
#[derive(Clone, Debug, Default)]
pub struct AdminView {
    stale: Arc<AtomicBool>,
}

impl AdminView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_stale(&self) {
        self.stale.store(true, Ordering::SeqCst);
    }

    /// Returns whether the view was stale, clearing the flag.
    pub fn take_stale(&self) -> bool {
        self.stale.swap(false, Ordering::SeqCst)
    }

    pub fn is_stale(&self) -> bool {
        self.stale.load(Ordering::SeqCst)
    }
}

/// Outcome of a committed transition.
#[derive(Clone, Debug, PartialEq)]
pub struct TransitionOutcome {
    pub appointment: AppointmentRecord,
    /// False when the post-commit notification could not be delivered. The
    /// transition itself is committed either way.
    pub notification_delivered: bool,
}

/// Service owning the appointment state machine.
pub struct AppointmentService {
    store: Arc<dyn DocumentStore>,
    messages: Arc<dyn MessageSender>,
    admin_view: AdminView,
    clinic_name: String,
}

impl AppointmentService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        messages: Arc<dyn MessageSender>,
        clinic_name: impl Into<String>,
    ) -> Self {
        Self {
            store,
            messages,
            admin_view: AdminView::new(),
            clinic_name: clinic_name.into(),
        }
    }

    /// A handle to the admin view staleness flag.
    pub fn admin_view(&self) -> AdminView {
        self.admin_view.clone()
    }

    /// Creates a new appointment request. Always lands as `pending`; pure
    /// creation sends no notification.
    pub async fn create_appointment(&self, new: NewAppointment) -> CoreResult<AppointmentRecord> {
        let id = Uuid::new_v4().to_string();
        let fields = serde_json::json!({
            "user_id": new.user_id,
            "patient_id": new.patient_id,
            "primary_physician": new.primary_physician,
            "schedule": new.schedule.to_rfc3339(),
            "status": AppointmentMode::Create.outbound_status().as_str(),
            "reason": new.reason,
            "note": new.note,
        });

        let doc = self.store.create(APPOINTMENTS_COLLECTION, &id, fields).await?;
        let record = AppointmentRecord::from_document(&doc)?;
        tracing::info!(appointment_id = %record.id, "appointment requested");
        Ok(record)
    }

    /// Fetches one appointment record.
    pub async fn appointment(&self, id: &str) -> CoreResult<AppointmentRecord> {
        let doc = self.store.get(APPOINTMENTS_COLLECTION, id).await?;
        AppointmentRecord::from_document(&doc)
    }

    /// Applies an operator transition (schedule or cancel).
    ///
    /// The transition is checked against the state machine before anything is
    /// written: a terminal record is rejected untouched. The persistence
    /// write commits the transition; the notification and the admin-view
    /// staleness marker follow it.
    pub async fn update_appointment(
        &self,
        transition: AppointmentTransition,
    ) -> CoreResult<TransitionOutcome> {
        if transition.mode == AppointmentMode::Create {
            return Err(CoreError::InvalidInput(
                "create is not a transition; use create_appointment".into(),
            ));
        }

        let current = self.appointment(&transition.appointment_id).await?;
        let target = transition.mode.outbound_status();
        if !current.status.can_transition_to(target) {
            return Err(CoreError::InvalidTransition {
                from: current.status,
                to: target,
            });
        }

        let updates = match transition.mode {
            AppointmentMode::Schedule => {
                let physician = transition
                    .primary_physician
                    .as_deref()
                    .filter(|s| !s.trim().is_empty())
                    .ok_or_else(|| {
                        CoreError::InvalidInput("primary_physician is required to schedule".into())
                    })?;
                let schedule = transition.schedule.ok_or_else(|| {
                    CoreError::InvalidInput("schedule is required to schedule".into())
                })?;
                serde_json::json!({
                    "primary_physician": physician,
                    "schedule": schedule.to_rfc3339(),
                    "status": target.as_str(),
                })
            }
            AppointmentMode::Cancel => {
                let reason = transition
                    .cancellation_reason
                    .as_deref()
                    .filter(|s| !s.trim().is_empty())
                    .ok_or_else(|| {
                        CoreError::InvalidInput("cancellation_reason is required to cancel".into())
                    })?;
                serde_json::json!({
                    "cancellation_reason": reason,
                    "status": target.as_str(),
                })
            }
            AppointmentMode::Create => unreachable!("rejected above"),
        };

        let doc = self
            .store
            .update(APPOINTMENTS_COLLECTION, &transition.appointment_id, updates)
            .await?;
        let record = AppointmentRecord::from_document(&doc)?;

        let content = self.compose_notification(transition.mode, &record);
        let notification_delivered = match self
            .messages
            .send_message(&content, &[transition.user_id.clone()])
            .await
        {
            Ok(receipt) => {
                tracing::debug!(message_id = %receipt.id, appointment_id = %record.id, "patient notified");
                true
            }
            Err(err) => {
                tracing::warn!(appointment_id = %record.id, "notification failed: {err}");
                false
            }
        };

        self.admin_view.mark_stale();
        tracing::info!(
            appointment_id = %record.id,
            status = %record.status,
            "appointment transition committed"
        );

        Ok(TransitionOutcome {
            appointment: record,
            notification_delivered,
        })
    }

    /// The admin list view: recent appointments, newest first, with the
    /// dashboard counts. Records that fail to translate are logged and
    /// skipped rather than failing the whole view.
    pub async fn recent_appointments(&self) -> CoreResult<AppointmentBoard> {
        let page = self.store.list(APPOINTMENTS_COLLECTION, &Query::new()).await?;

        let mut appointments = Vec::with_capacity(page.documents.len());
        for doc in &page.documents {
            match AppointmentRecord::from_document(doc) {
                Ok(record) => appointments.push(record),
                Err(err) => tracing::warn!(document_id = %doc.id, "skipping unreadable appointment: {err}"),
            }
        }

        let mut counts = AppointmentCounts::tally(&appointments);
        counts.total_count = page.total;
        Ok(AppointmentBoard { appointments, counts })
    }

    fn compose_notification(&self, mode: AppointmentMode, record: &AppointmentRecord) -> String {
        match mode {
            AppointmentMode::Schedule => format!(
                "Hi, it's {}. Your appointment has been scheduled for {} with Dr. {}.",
                self.clinic_name,
                record.schedule.format("%B %-d, %Y at %-I:%M %p"),
                record.primary_physician,
            ),
            _ => format!(
                "Hi, it's {}. We regret to inform you that your appointment has been cancelled. Reason: {}.",
                self.clinic_name,
                record.cancellation_reason.as_deref().unwrap_or("not given"),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appointment::AppointmentStatus;
    use async_trait::async_trait;
    use carebook_store::{
        Document, DocumentPage, MemorySender, MemoryStore, StoreError, StoreResult,
    };
    use chrono::{DateTime, TimeZone, Utc};
    use serde_json::Value;

    fn schedule_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 10, 30, 0).unwrap()
    }

    fn service() -> (Arc<MemoryStore>, Arc<MemorySender>, AppointmentService) {
        let store = Arc::new(MemoryStore::new());
        let sender = Arc::new(MemorySender::new());
        let service = AppointmentService::new(store.clone(), sender.clone(), "CareBook");
        (store, sender, service)
    }

    fn new_appointment() -> NewAppointment {
        NewAppointment {
            user_id: "u1".into(),
            patient_id: "p1".into(),
            primary_physician: "Leila Cameron".into(),
            schedule: schedule_time(),
            reason: "annual checkup".into(),
            note: None,
        }
    }

    fn schedule_transition(id: &str) -> AppointmentTransition {
        AppointmentTransition {
            appointment_id: id.into(),
            user_id: "u1".into(),
            mode: AppointmentMode::Schedule,
            primary_physician: Some("Leila Cameron".into()),
            schedule: Some(schedule_time()),
            cancellation_reason: None,
        }
    }

    #[tokio::test]
    async fn create_lands_pending_without_notification() {
        let (_store, sender, service) = service();
        let record = service.create_appointment(new_appointment()).await.expect("create");

        assert_eq!(record.status, AppointmentStatus::Pending);
        assert_eq!(record.reason.as_deref(), Some("annual checkup"));
        assert!(sender.sent().is_empty());
        assert!(!service.admin_view().is_stale());
    }

    #[tokio::test]
    async fn scheduling_a_pending_record_commits_and_notifies_once() {
        let (_store, sender, service) = service();
        let record = service.create_appointment(new_appointment()).await.expect("create");

        let outcome = service
            .update_appointment(schedule_transition(&record.id))
            .await
            .expect("schedule");

        assert_eq!(outcome.appointment.status, AppointmentStatus::Scheduled);
        assert!(outcome.notification_delivered);

        let sent = sender.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].recipients, vec!["u1".to_owned()]);
        assert!(sent[0].content.contains("Dr. Leila Cameron"));
        assert!(sent[0].content.contains("March 14, 2026 at 10:30 AM"));

        assert!(service.admin_view().take_stale());
        assert!(!service.admin_view().is_stale());
    }

    #[tokio::test]
    async fn cancelling_requires_a_reason_and_notifies_with_it() {
        let (_store, sender, service) = service();
        let record = service.create_appointment(new_appointment()).await.expect("create");

        let missing_reason = AppointmentTransition {
            mode: AppointmentMode::Cancel,
            cancellation_reason: Some("   ".into()),
            ..schedule_transition(&record.id)
        };
        assert!(matches!(
            service.update_appointment(missing_reason).await,
            Err(CoreError::InvalidInput(_))
        ));
        assert!(sender.sent().is_empty());

        let outcome = service
            .update_appointment(AppointmentTransition {
                mode: AppointmentMode::Cancel,
                cancellation_reason: Some("patient request".into()),
                ..schedule_transition(&record.id)
            })
            .await
            .expect("cancel");

        assert_eq!(outcome.appointment.status, AppointmentStatus::Cancelled);
        assert_eq!(
            outcome.appointment.cancellation_reason.as_deref(),
            Some("patient request")
        );
        let sent = sender.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].content.contains("cancelled"));
        assert!(sent[0].content.contains("patient request"));
    }

    #[tokio::test]
    async fn a_cancelled_record_is_never_mutated() {
        let (_store, sender, service) = service();
        let record = service.create_appointment(new_appointment()).await.expect("create");
        service
            .update_appointment(AppointmentTransition {
                mode: AppointmentMode::Cancel,
                cancellation_reason: Some("patient request".into()),
                ..schedule_transition(&record.id)
            })
            .await
            .expect("cancel");
        let messages_after_cancel = sender.sent().len();

        let err = service
            .update_appointment(schedule_transition(&record.id))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidTransition {
                from: AppointmentStatus::Cancelled,
                to: AppointmentStatus::Scheduled,
            }
        ));

        let unchanged = service.appointment(&record.id).await.expect("fetch");
        assert_eq!(unchanged.status, AppointmentStatus::Cancelled);
        assert_eq!(
            unchanged.cancellation_reason.as_deref(),
            Some("patient request")
        );
        assert_eq!(sender.sent().len(), messages_after_cancel);
    }

    struct FailingSender;

    #[async_trait]
    impl MessageSender for FailingSender {
        async fn send_message(
            &self,
            _content: &str,
            _recipients: &[String],
        ) -> Result<carebook_store::MessageReceipt, carebook_store::NotifyError> {
            Err(carebook_store::NotifyError::Delivery("carrier offline".into()))
        }
    }

    #[tokio::test]
    async fn notification_failure_does_not_roll_back_the_transition() {
        let store = Arc::new(MemoryStore::new());
        let service = AppointmentService::new(store, Arc::new(FailingSender), "CareBook");
        let record = service.create_appointment(new_appointment()).await.expect("create");

        let outcome = service
            .update_appointment(schedule_transition(&record.id))
            .await
            .expect("transition still commits");

        assert!(!outcome.notification_delivered);
        assert_eq!(outcome.appointment.status, AppointmentStatus::Scheduled);
        let persisted = service.appointment(&record.id).await.expect("fetch");
        assert_eq!(persisted.status, AppointmentStatus::Scheduled);
        assert!(service.admin_view().is_stale());
    }

    struct BrokenUpdates {
        inner: MemoryStore,
    }

    #[async_trait]
    impl DocumentStore for BrokenUpdates {
        async fn create(&self, collection: &str, id: &str, fields: Value) -> StoreResult<Document> {
            self.inner.create(collection, id, fields).await
        }

        async fn update(&self, _collection: &str, _id: &str, _fields: Value) -> StoreResult<Document> {
            Err(StoreError::Unknown("write timed out".into()))
        }

        async fn get(&self, collection: &str, id: &str) -> StoreResult<Document> {
            self.inner.get(collection, id).await
        }

        async fn list(&self, collection: &str, query: &Query) -> StoreResult<DocumentPage> {
            self.inner.list(collection, query).await
        }
    }

    #[tokio::test]
    async fn persistence_failure_aborts_before_notification() {
        let store = Arc::new(BrokenUpdates { inner: MemoryStore::new() });
        let sender = Arc::new(MemorySender::new());
        let service = AppointmentService::new(store, sender.clone(), "CareBook");
        let record = service.create_appointment(new_appointment()).await.expect("create");

        let err = service
            .update_appointment(schedule_transition(&record.id))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Persistence(_)));
        assert!(sender.sent().is_empty());
        assert!(!service.admin_view().is_stale());

        let unchanged = service.appointment(&record.id).await.expect("fetch");
        assert_eq!(unchanged.status, AppointmentStatus::Pending);
    }

    #[tokio::test]
    async fn recent_appointments_counts_per_status() {
        let (_store, _sender, service) = service();
        let first = service.create_appointment(new_appointment()).await.expect("create");
        let _second = service.create_appointment(new_appointment()).await.expect("create");
        service
            .update_appointment(schedule_transition(&first.id))
            .await
            .expect("schedule");

        let board = service.recent_appointments().await.expect("board");
        assert_eq!(board.counts.total_count, 2);
        assert_eq!(board.counts.scheduled_count, 1);
        assert_eq!(board.counts.pending_count, 1);
        assert_eq!(board.counts.cancelled_count, 0);
        // Newest first: the untouched second request leads the list.
        assert_eq!(board.appointments[0].status, AppointmentStatus::Pending);
    }
}
