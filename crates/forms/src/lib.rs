//! # CareBook Forms
//!
//! Declarative form engine for the CareBook intake flows.
//!
//! This crate contains the pieces that turn a field description into an
//! interactive control and a submission into a validated payload:
//! - [`FieldDescriptor`]: declarative description of one input (variant,
//!   label, placeholder, icon, variant-specific constraints)
//! - [`render_field`]: exhaustive variant dispatch producing a [`Control`]
//! - [`RuleSet`]: declarative validation rules evaluated against form values
//! - [`FormSession`]: the submit/validate/error lifecycle with a busy flag
//!
//! **No domain concerns**: which fields a clinic form carries, and which rules
//! apply in which mode, belong to `carebook-core`. This crate only knows how
//! to render, validate, and serialize form state.

pub mod control;
pub mod descriptor;
pub mod rules;
pub mod session;
pub mod state;

pub use control::{render_field, Control, RenderedField, DEFAULT_DATE_FORMAT, DEFAULT_PHONE_REGION};
pub use descriptor::{CompositeRenderer, FieldDescriptor, FieldVariant, SelectOption};
pub use rules::{Rule, RuleSet, ValidatedPayload, ValidationErrors};
pub use session::{BeginSubmit, FormSession, SubmitOutcome};
pub use state::{FieldValue, FileUpload, FormState, FormValues};
