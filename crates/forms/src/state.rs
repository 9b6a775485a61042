//! Form values and session state.
//!
//! A form session owns exactly one [`FormState`]: the current value for each
//! field, at most one validation message per field, and the busy flag that is
//! true exactly while a submit is in flight. The state is never shared across
//! sessions.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// An uploaded file held in form state before it is handed to the file
/// storage collaborator.
///
/// Serialisation deliberately omits the raw bytes; controls only ever show
/// the name and size.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FileUpload {
    pub file_name: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub size_bytes: u64,
}

impl FileUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let size_bytes = bytes.len() as u64;
        Self {
            file_name: file_name.into(),
            bytes,
            size_bytes,
        }
    }
}

/// The current value of one field. Which case applies depends on the field's
/// variant: text-like controls carry [`FieldValue::Text`], checkboxes
/// [`FieldValue::Bool`], date pickers [`FieldValue::DateTime`], and uploaders
/// [`FieldValue::Files`].
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Bool(bool),
    DateTime(DateTime<Utc>),
    Files(Vec<FileUpload>),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            FieldValue::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }

    pub fn as_files(&self) -> Option<&[FileUpload]> {
        match self {
            FieldValue::Files(files) => Some(files),
            _ => None,
        }
    }

    /// True when the value carries no usable content: whitespace-only text or
    /// an empty file list. Booleans and timestamps are never blank.
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::Files(files) => files.is_empty(),
            FieldValue::Bool(_) | FieldValue::DateTime(_) => false,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(dt: DateTime<Utc>) -> Self {
        FieldValue::DateTime(dt)
    }
}

impl From<Vec<FileUpload>> for FieldValue {
    fn from(files: Vec<FileUpload>) -> Self {
        FieldValue::Files(files)
    }
}

/// Mapping from field name to current value.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct FormValues(BTreeMap<String, FieldValue>);

impl FormValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.0.insert(name.into(), value.into());
    }

    /// Builder-style [`FormValues::set`], for assembling defaults.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.set(name, value);
        self
    }

    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        self.0.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.0.get(name)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(FieldValue::as_text)
    }

    pub fn flag(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(FieldValue::as_bool)
    }

    pub fn datetime(&self, name: &str) -> Option<DateTime<Utc>> {
        self.get(name).and_then(FieldValue::as_datetime)
    }

    pub fn files(&self, name: &str) -> Option<&[FileUpload]> {
        self.get(name).and_then(FieldValue::as_files)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.0.iter()
    }
}

/// State of one form session.
///
/// Owned exclusively by the session that created it; destroyed with the
/// session. The busy flag is only ever toggled by the session's submit
/// lifecycle.
#[derive(Clone, Debug, Default)]
pub struct FormState {
    values: FormValues,
    errors: BTreeMap<String, String>,
    busy: bool,
}

impl FormState {
    /// Creates state pre-populated with defaults (from a record being edited,
    /// or empty).
    pub fn with_defaults(values: FormValues) -> Self {
        Self {
            values,
            errors: BTreeMap::new(),
            busy: false,
        }
    }

    pub fn values(&self) -> &FormValues {
        &self.values
    }

    pub fn errors(&self) -> &BTreeMap<String, String> {
        &self.errors
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub(crate) fn values_mut(&mut self) -> &mut FormValues {
        &mut self.values
    }

    pub(crate) fn set_errors(&mut self, errors: BTreeMap<String, String>) {
        self.errors = errors;
    }

    pub(crate) fn clear_errors(&mut self) {
        self.errors.clear();
    }

    pub(crate) fn set_busy(&mut self, busy: bool) {
        self.busy = busy;
    }

    pub(crate) fn replace_values(&mut self, values: FormValues) {
        self.values = values;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn blank_detection_per_value_kind() {
        assert!(FieldValue::Text("   ".into()).is_blank());
        assert!(!FieldValue::Text("checkup".into()).is_blank());
        assert!(FieldValue::Files(vec![]).is_blank());
        assert!(!FieldValue::Bool(false).is_blank());
        let dt = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        assert!(!FieldValue::DateTime(dt).is_blank());
    }

    #[test]
    fn typed_accessors_reject_other_kinds() {
        let mut values = FormValues::new();
        values.set("reason", "checkup");
        values.set("treatment_consent", true);

        assert_eq!(values.text("reason"), Some("checkup"));
        assert_eq!(values.flag("reason"), None);
        assert_eq!(values.flag("treatment_consent"), Some(true));
        assert_eq!(values.datetime("treatment_consent"), None);
    }

    #[test]
    fn file_upload_serialises_without_bytes() {
        let upload = FileUpload::new("passport.png", vec![1, 2, 3]);
        let json = serde_json::to_value(&upload).expect("serialise");
        assert_eq!(json["file_name"], "passport.png");
        assert_eq!(json["size_bytes"], 3);
        assert!(json.get("bytes").is_none());
    }
}
