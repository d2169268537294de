//! Session label validation.
//!
//! Labels are checked before they leave the process: a request with a bad
//! label map is never sent.

use std::collections::HashMap;

/// Why a label map was rejected.
///
/// The `Display` text of each variant is the user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LabelError {
    #[error("Labels cannot be nil. Please provide a valid labels map.")]
    Nil,
    #[error("Labels cannot be empty. Please provide at least one label.")]
    Empty,
    #[error("Label keys cannot be empty. Please provide valid keys.")]
    EmptyKey,
    #[error("Label values cannot be empty. Please provide valid values.")]
    EmptyValue,
}

/// Validate a label map.
///
/// Checks run in order (missing map, no entries, any empty key, any empty
/// value) and the first violation is returned. Every key is checked before
/// any value, so `{"": "", "k": "v"}` reports [`LabelError::EmptyKey`].
pub fn validate_labels(labels: Option<&HashMap<String, String>>) -> Result<(), LabelError> {
    let labels = labels.ok_or(LabelError::Nil)?;

    if labels.is_empty() {
        return Err(LabelError::Empty);
    }

    if labels.keys().any(|k| k.is_empty()) {
        return Err(LabelError::EmptyKey);
    }

    if labels.values().any(|v| v.is_empty()) {
        return Err(LabelError::EmptyValue);
    }

    Ok(())
}
