//! Field rendering: variant dispatch from descriptor to control.
//!
//! [`render_field`] is a pure function of the descriptor and the current
//! value. It knows nothing about the surrounding form layout, performs no
//! side effects, and never fails: a field that cannot be rendered (a
//! composite with no renderer supplied) simply renders nothing rather than
//! aborting the form session.

use crate::descriptor::{FieldDescriptor, FieldVariant, SelectOption};
use crate::state::FieldValue;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Display format used by date pickers when the descriptor does not set one.
pub const DEFAULT_DATE_FORMAT: &str = "MM/dd/yyyy";

/// Default dialling region for phone inputs.
pub const DEFAULT_PHONE_REGION: &str = "EG";

/// A concrete interactive control, ready for the layout layer to turn into
/// markup. Each case carries the field name it binds to and the current
/// value, so the client can wire its change handler back to the form's value
/// mapping.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "control", rename_all = "snake_case")]
pub enum Control {
    TextInput {
        name: String,
        value: String,
        placeholder: Option<String>,
        icon: Option<String>,
        disabled: bool,
    },
    TextArea {
        name: String,
        value: String,
        placeholder: Option<String>,
        disabled: bool,
    },
    PhoneInput {
        name: String,
        value: String,
        placeholder: Option<String>,
        default_region: String,
    },
    DatePicker {
        name: String,
        value: Option<DateTime<Utc>>,
        date_format: String,
        show_time_select: bool,
    },
    Checkbox {
        name: String,
        checked: bool,
        label: Option<String>,
    },
    Select {
        name: String,
        value: Option<String>,
        placeholder: Option<String>,
        options: Vec<SelectOption>,
    },
    /// Escape-hatch control emitted by composite renderers for shapes the
    /// fixed set cannot express (radio groups, file uploaders, ...).
    Custom {
        name: String,
        kind: String,
        config: serde_json::Value,
    },
}

/// A rendered field: the control plus the label shown above it.
///
/// Checkboxes fold their label into the control, so `label` is `None` there.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RenderedField {
    pub name: String,
    pub label: Option<String>,
    pub control: Option<Control>,
}

/// Maps a descriptor and the field's current value to its control.
///
/// A single exhaustive dispatch over the variant. `Composite` delegates
/// entirely to the descriptor's render function and produces `None` when no
/// function was supplied.
pub fn render_field(descriptor: &FieldDescriptor, value: Option<&FieldValue>) -> Option<Control> {
    let name = descriptor.name().to_owned();
    match descriptor.variant() {
        FieldVariant::Text => Some(Control::TextInput {
            name,
            value: text_value(value),
            placeholder: descriptor.placeholder().map(str::to_owned),
            icon: descriptor.icon().map(str::to_owned),
            disabled: descriptor.is_disabled(),
        }),
        FieldVariant::TextArea => Some(Control::TextArea {
            name,
            value: text_value(value),
            placeholder: descriptor.placeholder().map(str::to_owned),
            disabled: descriptor.is_disabled(),
        }),
        FieldVariant::PhoneNumber => Some(Control::PhoneInput {
            name,
            value: text_value(value),
            placeholder: descriptor.placeholder().map(str::to_owned),
            default_region: DEFAULT_PHONE_REGION.to_owned(),
        }),
        FieldVariant::DatePicker => Some(Control::DatePicker {
            name,
            value: value.and_then(FieldValue::as_datetime),
            date_format: descriptor
                .date_format()
                .unwrap_or(DEFAULT_DATE_FORMAT)
                .to_owned(),
            show_time_select: descriptor.show_time_select(),
        }),
        FieldVariant::Checkbox => Some(Control::Checkbox {
            name,
            checked: value.and_then(FieldValue::as_bool).unwrap_or(false),
            label: descriptor.label().map(str::to_owned),
        }),
        FieldVariant::Select => Some(Control::Select {
            name,
            value: value
                .and_then(FieldValue::as_text)
                .filter(|s| !s.is_empty())
                .map(str::to_owned),
            placeholder: descriptor.placeholder().map(str::to_owned),
            options: descriptor.options().to_vec(),
        }),
        FieldVariant::Composite => descriptor
            .composite()
            .and_then(|render| render(descriptor, value)),
    }
}

/// Renders a descriptor into a [`RenderedField`], folding the checkbox label
/// into its control.
pub fn rendered(descriptor: &FieldDescriptor, value: Option<&FieldValue>) -> RenderedField {
    let label = if descriptor.variant() == FieldVariant::Checkbox {
        None
    } else {
        descriptor.label().map(str::to_owned)
    };
    RenderedField {
        name: descriptor.name().to_owned(),
        label,
        control: render_field(descriptor, value),
    }
}

fn text_value(value: Option<&FieldValue>) -> String {
    value
        .and_then(FieldValue::as_text)
        .unwrap_or_default()
        .to_owned()
}
