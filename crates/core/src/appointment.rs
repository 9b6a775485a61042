//! Appointment records, the status state machine, and aggregate counts.
//!
//! The status machine is deliberately small:
//!
//! ```text
//! (create) ──▶ pending ──▶ scheduled ──▶ cancelled
//!                 │            │  ▲ └ reschedule
//!                 └────────────┼──┘
//!                              ▼
//!                          cancelled (terminal)
//! ```
//!
//! `cancelled` has no outgoing transitions; re-requesting an appointment
//! means creating a new record. Statuses this crate does not know are parsed
//! leniently into [`AppointmentStatus::Unknown`] so that newer data cannot
//! break older readers; unknown records admit no transitions and are skipped
//! by the per-status counts.

use crate::error::CoreResult;
use carebook_store::Document;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Status and mode
// ============================================================================

/// Lifecycle state of an appointment record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppointmentStatus {
    /// Created on intake, awaiting an operator decision.
    Pending,
    /// Accepted by an operator.
    Scheduled,
    /// Terminal.
    Cancelled,
    /// A status this version does not know. Carried, never acted on.
    Unknown,
}

impl AppointmentStatus {
    /// Parses a status from its string representation. Unrecognised values
    /// become [`AppointmentStatus::Unknown`] rather than erroring.
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "pending" => Self::Pending,
            "scheduled" => Self::Scheduled,
            "cancelled" => Self::Cancelled,
            _ => Self::Unknown,
        }
    }

    /// Returns the string representation of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Scheduled => "scheduled",
            Self::Cancelled => "cancelled",
            Self::Unknown => "unknown",
        }
    }

    /// Statuses this one may transition to.
    pub fn valid_transitions(&self) -> &'static [AppointmentStatus] {
        match self {
            Self::Pending => &[Self::Scheduled, Self::Cancelled],
            Self::Scheduled => &[Self::Scheduled, Self::Cancelled],
            Self::Cancelled => &[],
            Self::Unknown => &[],
        }
    }

    pub fn can_transition_to(&self, next: AppointmentStatus) -> bool {
        self.valid_transitions().contains(&next)
    }
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for AppointmentStatus {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for AppointmentStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::parse(&s))
    }
}

/// The operation context an appointment form runs in. Selects both the
/// validation schema and the transition rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentMode {
    Create,
    Schedule,
    Cancel,
}

impl AppointmentMode {
    /// The status a record ends up in when this mode's submission commits.
    pub fn outbound_status(&self) -> AppointmentStatus {
        match self {
            Self::Create => AppointmentStatus::Pending,
            Self::Schedule => AppointmentStatus::Scheduled,
            Self::Cancel => AppointmentStatus::Cancelled,
        }
    }
}

// ============================================================================
// Records and drafts
// ============================================================================

/// One appointment record as the persistence collaborator holds it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AppointmentRecord {
    pub id: String,
    pub user_id: String,
    pub patient_id: String,
    pub primary_physician: String,
    pub schedule: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub reason: Option<String>,
    pub note: Option<String>,
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Wire shape of the stored fields (everything but id and creation time,
/// which the document itself carries).
#[derive(Debug, Deserialize)]
struct AppointmentFieldsWire {
    user_id: String,
    patient_id: String,
    primary_physician: String,
    schedule: DateTime<Utc>,
    status: AppointmentStatus,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    note: Option<String>,
    #[serde(default)]
    cancellation_reason: Option<String>,
}

impl AppointmentRecord {
    /// Translates a stored document into a record.
    pub fn from_document(doc: &Document) -> CoreResult<Self> {
        let wire: AppointmentFieldsWire = serde_json::from_value(doc.fields.clone())?;
        Ok(Self {
            id: doc.id.clone(),
            user_id: wire.user_id,
            patient_id: wire.patient_id,
            primary_physician: wire.primary_physician,
            schedule: wire.schedule,
            status: wire.status,
            reason: wire.reason,
            note: wire.note,
            cancellation_reason: wire.cancellation_reason,
            created_at: doc.created_at,
        })
    }
}

/// Payload for a create-mode submission. Always lands as `pending`.
#[derive(Clone, Debug, PartialEq)]
pub struct NewAppointment {
    pub user_id: String,
    pub patient_id: String,
    pub primary_physician: String,
    pub schedule: DateTime<Utc>,
    pub reason: String,
    pub note: Option<String>,
}

/// Payload for an operator transition (schedule or cancel).
#[derive(Clone, Debug, PartialEq)]
pub struct AppointmentTransition {
    pub appointment_id: String,
    pub user_id: String,
    pub mode: AppointmentMode,
    pub primary_physician: Option<String>,
    pub schedule: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
}

// ============================================================================
// Aggregate counts
// ============================================================================

/// Per-status counts for the dashboard summary tiles.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AppointmentCounts {
    pub scheduled_count: u64,
    pub pending_count: u64,
    pub cancelled_count: u64,
    pub total_count: u64,
}

impl AppointmentCounts {
    /// Folds the records into counts in a single pass. Unknown statuses
    /// count toward the total but land in no bucket; the partition is
    /// order-independent.
    pub fn tally<'a>(records: impl IntoIterator<Item = &'a AppointmentRecord>) -> Self {
        records
            .into_iter()
            .fold(Self::default(), |mut counts, record| {
                counts.total_count += 1;
                match record.status {
                    AppointmentStatus::Scheduled => counts.scheduled_count += 1,
                    AppointmentStatus::Pending => counts.pending_count += 1,
                    AppointmentStatus::Cancelled => counts.cancelled_count += 1,
                    AppointmentStatus::Unknown => {}
                }
                counts
            })
    }
}

/// The admin list view's data: recent records plus their counts.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AppointmentBoard {
    pub appointments: Vec<AppointmentRecord>,
    pub counts: AppointmentCounts,
}
