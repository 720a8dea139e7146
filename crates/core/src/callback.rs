//! Callback request model, lifecycle status, and submission validation.
//!
//! A [`CallbackRequest`] is created from a validated [`NewCallback`], mutated
//! only through [`CallbackRequest::apply_patch`], and destroyed by the record
//! store. The JSON shape (camelCase keys, `null` file fields, omitted `note`
//! and `updatedAt` until set) is the persisted document format.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{RecordId, Timestamp};

/// Message returned when a submission is missing a required field.
pub const REQUIRED_FIELDS_MESSAGE: &str = "name and phone required";

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Lifecycle state an administrator assigns to a callback request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallbackStatus {
    #[default]
    New,
    InProgress,
    Completed,
    Cancelled,
}

impl CallbackStatus {
    pub const ALL: [CallbackStatus; 4] = [
        CallbackStatus::New,
        CallbackStatus::InProgress,
        CallbackStatus::Completed,
        CallbackStatus::Cancelled,
    ];

    /// Wire value, as stored in the document and rendered in CSV.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for CallbackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CallbackStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "Invalid status '{s}'. Must be one of: new, in_progress, completed, cancelled"
                ))
            })
    }
}

// ---------------------------------------------------------------------------
// Attachment reference
// ---------------------------------------------------------------------------

/// A stored attachment: its public reference path plus the uploader's
/// original filename (display only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRef {
    pub file: String,
    pub file_name: String,
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// One callback request. `file` and `file_name` are only ever set together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackRequest {
    pub id: RecordId,
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub product_type: String,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub status: CallbackStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub date: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

impl CallbackRequest {
    /// Build a fresh record with a generated id, `date = now`, status `new`.
    pub fn create(input: NewCallback, attachment: Option<AttachmentRef>) -> Self {
        let (file, file_name) = match attachment {
            Some(a) => (Some(a.file), Some(a.file_name)),
            None => (None, None),
        };

        Self {
            id: uuid::Uuid::now_v7().to_string(),
            name: input.name,
            phone: input.phone,
            email: input.email,
            product_type: input.product_type,
            comment: input.comment,
            file,
            file_name,
            status: CallbackStatus::New,
            note: None,
            date: chrono::Utc::now(),
            updated_at: None,
        }
    }

    /// The stored attachment, if the record has one.
    pub fn attachment(&self) -> Option<AttachmentRef> {
        match (&self.file, &self.file_name) {
            (Some(file), Some(file_name)) => Some(AttachmentRef {
                file: file.clone(),
                file_name: file_name.clone(),
            }),
            _ => None,
        }
    }

    /// Apply an admin update and stamp `updated_at`.
    ///
    /// `updated_at` is always strictly later than `date`, even if the wall
    /// clock stepped back.
    pub fn apply_patch(&mut self, patch: &CallbackPatch) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(note) = &patch.note {
            self.note = Some(note.clone());
        }
        let earliest = self.date + chrono::Duration::microseconds(1);
        self.updated_at = Some(chrono::Utc::now().max(earliest));
    }
}

/// Sort records newest first by creation date.
pub fn sort_newest_first(records: &mut [CallbackRequest]) {
    records.sort_by(|a, b| b.date.cmp(&a.date));
}

// ---------------------------------------------------------------------------
// Submission
// ---------------------------------------------------------------------------

/// Raw fields of a public form submission, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackSubmission {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub product_type: Option<String>,
    pub comment: Option<String>,
}

/// A validated, trimmed submission ready to become a [`CallbackRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCallback {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub product_type: String,
    pub comment: String,
}

fn trimmed(value: Option<&str>) -> String {
    value.map(str::trim).unwrap_or_default().to_string()
}

/// Validate a submission: `name` and `phone` must be non-empty after trimming.
/// Every other field is trimmed and otherwise accepted as-is.
pub fn validate_submission(input: &CallbackSubmission) -> Result<NewCallback, CoreError> {
    let name = trimmed(input.name.as_deref());
    let phone = trimmed(input.phone.as_deref());

    if name.is_empty() || phone.is_empty() {
        return Err(CoreError::Validation(REQUIRED_FIELDS_MESSAGE.to_string()));
    }

    Ok(NewCallback {
        name,
        phone,
        email: trimmed(input.email.as_deref()),
        product_type: trimmed(input.product_type.as_deref()),
        comment: trimmed(input.comment.as_deref()),
    })
}

// ---------------------------------------------------------------------------
// Update
// ---------------------------------------------------------------------------

/// Body of an admin update request, as received.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCallback {
    pub status: Option<String>,
    pub note: Option<String>,
}

/// A validated update. `note: Some("")` clears the note text but is still an
/// explicit change, distinct from `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallbackPatch {
    pub status: Option<CallbackStatus>,
    pub note: Option<String>,
}

impl TryFrom<UpdateCallback> for CallbackPatch {
    type Error = CoreError;

    /// An empty status string counts as "not provided".
    fn try_from(input: UpdateCallback) -> Result<Self, Self::Error> {
        let status = match input.status.as_deref() {
            None | Some("") => None,
            Some(s) => Some(s.parse::<CallbackStatus>()?),
        };
        Ok(Self {
            status,
            note: input.note,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn submission(name: &str, phone: &str) -> CallbackSubmission {
        CallbackSubmission {
            name: Some(name.to_string()),
            phone: Some(phone.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn empty_name_is_rejected() {
        let result = validate_submission(&submission("", "+7 900 000-00-00"));
        assert_matches!(result, Err(CoreError::Validation(msg)) if msg == REQUIRED_FIELDS_MESSAGE);
    }

    #[test]
    fn whitespace_phone_is_rejected() {
        let mut input = submission("Ivan", "   ");
        input.email = Some("ivan@example.com".into());
        input.comment = Some("please call".into());
        assert_matches!(validate_submission(&input), Err(CoreError::Validation(_)));
    }

    #[test]
    fn missing_fields_are_rejected() {
        assert_matches!(
            validate_submission(&CallbackSubmission::default()),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn fields_are_trimmed_and_optional_default_to_empty() {
        let mut input = submission("  Ivan ", " 123 ");
        input.comment = Some("  hello \n".into());
        let new = validate_submission(&input).unwrap();
        assert_eq!(new.name, "Ivan");
        assert_eq!(new.phone, "123");
        assert_eq!(new.comment, "hello");
        assert_eq!(new.email, "");
        assert_eq!(new.product_type, "");
    }

    #[test]
    fn email_is_not_format_checked() {
        let mut input = submission("Ivan", "123");
        input.email = Some("not-an-email".into());
        assert_eq!(validate_submission(&input).unwrap().email, "not-an-email");
    }

    #[test]
    fn created_record_defaults() {
        let new = validate_submission(&submission("Ivan", "123")).unwrap();
        let record = CallbackRequest::create(new, None);
        assert_eq!(record.status, CallbackStatus::New);
        assert!(record.file.is_none() && record.file_name.is_none());
        assert!(record.note.is_none());
        assert!(record.updated_at.is_none());
        assert!(!record.id.is_empty());
    }

    #[test]
    fn created_ids_are_unique() {
        let new = validate_submission(&submission("Ivan", "123")).unwrap();
        let ids: std::collections::HashSet<_> = (0..200)
            .map(|_| CallbackRequest::create(new.clone(), None).id)
            .collect();
        assert_eq!(ids.len(), 200);
    }

    #[test]
    fn attachment_sets_both_fields() {
        let new = validate_submission(&submission("Ivan", "123")).unwrap();
        let attachment = AttachmentRef {
            file: "/uploads/1-2.pdf".into(),
            file_name: "drawing.pdf".into(),
        };
        let record = CallbackRequest::create(new, Some(attachment.clone()));
        assert_eq!(record.file.as_deref(), Some("/uploads/1-2.pdf"));
        assert_eq!(record.file_name.as_deref(), Some("drawing.pdf"));
        assert_eq!(record.attachment(), Some(attachment));
    }

    #[test]
    fn serializes_with_camel_case_and_null_file() {
        let new = validate_submission(&submission("Ivan", "123")).unwrap();
        let record = CallbackRequest::create(new, None);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["status"], "new");
        assert_eq!(json["productType"], "");
        assert!(json["file"].is_null());
        assert!(json["fileName"].is_null());
        assert!(json.get("note").is_none());
        assert!(json.get("updatedAt").is_none());
    }

    #[test]
    fn status_parses_wire_values() {
        for status in CallbackStatus::ALL {
            assert_eq!(status.as_str().parse::<CallbackStatus>().unwrap(), status);
        }
        assert_matches!("done".parse::<CallbackStatus>(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn patch_rejects_unknown_status() {
        let input = UpdateCallback {
            status: Some("archived".into()),
            note: None,
        };
        assert_matches!(CallbackPatch::try_from(input), Err(CoreError::Validation(_)));
    }

    #[test]
    fn patch_treats_empty_status_as_absent_but_keeps_empty_note() {
        let input = UpdateCallback {
            status: Some(String::new()),
            note: Some(String::new()),
        };
        let patch = CallbackPatch::try_from(input).unwrap();
        assert_eq!(patch.status, None);
        assert_eq!(patch.note.as_deref(), Some(""));
    }

    #[test]
    fn apply_patch_stamps_updated_at() {
        let new = validate_submission(&submission("Ivan", "123")).unwrap();
        let mut record = CallbackRequest::create(new, None);
        record.note = Some("old".into());
        record.apply_patch(&CallbackPatch {
            status: Some(CallbackStatus::Completed),
            note: None,
        });
        assert_eq!(record.status, CallbackStatus::Completed);
        assert_eq!(record.note.as_deref(), Some("old"));
        assert!(record.updated_at.unwrap() > record.date);
    }

    #[test]
    fn updated_at_follows_date_when_clock_is_behind() {
        let new = validate_submission(&submission("Ivan", "123")).unwrap();
        let mut record = CallbackRequest::create(new, None);
        record.date = chrono::Utc::now() + chrono::Duration::hours(1);

        record.apply_patch(&CallbackPatch::default());

        assert!(record.updated_at.unwrap() > record.date);
    }

    #[test]
    fn sort_orders_newest_first() {
        let new = validate_submission(&submission("Ivan", "123")).unwrap();
        let mut older = CallbackRequest::create(new.clone(), None);
        older.date = older.date - chrono::Duration::hours(1);
        let newer = CallbackRequest::create(new, None);
        let mut records = vec![older.clone(), newer.clone()];
        sort_newest_first(&mut records);
        assert_eq!(records[0].id, newer.id);
        assert_eq!(records[1].id, older.id);
    }
}
