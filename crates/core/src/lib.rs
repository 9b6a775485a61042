//! # CareBook Core
//!
//! Domain logic for the CareBook clinic intake and appointment system.
//!
//! This crate contains the behaviour that is parameterized by data rather
//! than static:
//! - the appointment lifecycle controller and its state machine
//! - mode-conditioned validation schemas for every intake flow
//! - the declarative form definitions the renderer consumes
//! - the patient directory (user creation with conflict recovery,
//!   registration with identification-document upload)
//! - per-status aggregate counts for the admin dashboard
//!
//! **No API concerns**: HTTP routing, wire DTOs, and the admin-gate header
//! check belong in `carebook-rest`. The persistence, file-storage, and
//! messaging collaborators are consumed through the traits in
//! `carebook-store`.

pub mod appointment;
pub mod config;
pub mod constants;
pub mod directory;
pub mod error;
pub mod intake;
pub mod lifecycle;
pub mod patient;
pub mod schema;

pub use appointment::{
    AppointmentBoard, AppointmentCounts, AppointmentMode, AppointmentRecord, AppointmentStatus,
    AppointmentTransition, NewAppointment,
};
pub use config::AppConfig;
pub use directory::PatientDirectory;
pub use error::{CoreError, CoreResult};
pub use lifecycle::{AdminView, AppointmentService, TransitionOutcome};
pub use patient::{Gender, NewUser, PatientProfile, PatientRegistration, UserRecord};
