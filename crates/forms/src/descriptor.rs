//! Declarative field descriptors.
//!
//! A [`FieldDescriptor`] describes one form input: which kind of control it
//! is, the key it binds to in the form's value mapping, and optional display
//! metadata. Descriptors are data; rendering them is the job of
//! [`crate::control::render_field`].

use crate::control::Control;
use crate::state::FieldValue;
use serde::{Deserialize, Serialize};

/// The closed set of input kinds the field renderer understands.
///
/// Every match over this enum must be exhaustive. [`FieldVariant::Composite`]
/// is the single escape hatch for field shapes the fixed set cannot express;
/// its rendering is delegated entirely to a caller-supplied function.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldVariant {
    /// Single-line text input.
    Text,
    /// Multi-line text area.
    TextArea,
    /// International phone number input.
    PhoneNumber,
    /// Calendar picker, optionally with time selection.
    DatePicker,
    /// Boolean checkbox with an inline label.
    Checkbox,
    /// Dropdown over a fixed option list.
    Select,
    /// Caller-rendered field (radio groups, file uploaders, ...).
    Composite,
}

/// One entry in a [`FieldVariant::Select`] option list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    /// Value written into the form state when chosen.
    pub value: String,
    /// Human-readable option text.
    pub label: String,
    /// Optional image shown next to the label (e.g. a physician avatar).
    pub image: Option<String>,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            image: None,
        }
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }
}

/// Render function supplied by the caller for [`FieldVariant::Composite`]
/// fields.
///
/// Receives the descriptor and the field's current value and produces the
/// control to show, or `None` to render nothing.
pub type CompositeRenderer = fn(&FieldDescriptor, Option<&FieldValue>) -> Option<Control>;

/// Declarative description of one form input.
///
/// The variant and name are fixed at construction: changing either is a
/// structural edit to the form, not a value update, so neither is exposed
/// mutably. Display metadata is attached with the `with_*` builders.
#[derive(Clone, Debug)]
pub struct FieldDescriptor {
    variant: FieldVariant,
    name: String,
    label: Option<String>,
    placeholder: Option<String>,
    icon: Option<String>,
    disabled: bool,
    date_format: Option<String>,
    show_time_select: bool,
    options: Vec<SelectOption>,
    composite: Option<CompositeRenderer>,
}

impl FieldDescriptor {
    /// Creates a descriptor for the given variant, bound to `name` in the
    /// form's value mapping.
    pub fn new(variant: FieldVariant, name: impl Into<String>) -> Self {
        Self {
            variant,
            name: name.into(),
            label: None,
            placeholder: None,
            icon: None,
            disabled: false,
            date_format: None,
            show_time_select: false,
            options: Vec::new(),
            composite: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    /// Sets the display format for a [`FieldVariant::DatePicker`] field.
    pub fn with_date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = Some(format.into());
        self
    }

    /// Enables time selection on a [`FieldVariant::DatePicker`] field.
    pub fn with_time_select(mut self) -> Self {
        self.show_time_select = true;
        self
    }

    /// Sets the option list for a [`FieldVariant::Select`] field.
    pub fn with_options(mut self, options: Vec<SelectOption>) -> Self {
        self.options = options;
        self
    }

    /// Attaches the render function for a [`FieldVariant::Composite`] field.
    pub fn with_composite(mut self, renderer: CompositeRenderer) -> Self {
        self.composite = Some(renderer);
        self
    }

    pub fn variant(&self) -> FieldVariant {
        self.variant
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn placeholder(&self) -> Option<&str> {
        self.placeholder.as_deref()
    }

    pub fn icon(&self) -> Option<&str> {
        self.icon.as_deref()
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn date_format(&self) -> Option<&str> {
        self.date_format.as_deref()
    }

    pub fn show_time_select(&self) -> bool {
        self.show_time_select
    }

    pub fn options(&self) -> &[SelectOption] {
        &self.options
    }

    pub fn composite(&self) -> Option<CompositeRenderer> {
        self.composite
    }
}
