use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One uploaded row, keyed by column header.
///
/// Rows reach the service already split into cells, either as JSON objects or
/// from the CSV upload endpoint. Only the columns listed below are read.
pub type RawRow = HashMap<String, String>;

/// Column holding the value encoded in the attendee's QR image.
pub const COLUMN_CODE: &str = "QRLink";
pub const COLUMN_NAME: &str = "Name";
pub const COLUMN_ADMISSION_ID: &str = "RegistrationID";
pub const COLUMN_EMAIL: &str = "Email";
pub const COLUMN_PHONE: &str = "Phone";
pub const COLUMN_COURSE: &str = "Course";
pub const COLUMN_STATUS: &str = "Status";

/// The canonical fields of a roster row once it has passed validation.
///
/// `code`, `name` and `admission_id` are trimmed and never empty. The optional
/// fields are carried through untouched apart from trimming; a blank cell is `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub code: String,
    pub name: String,
    pub admission_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// A stored roster entry: one admitted person.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterRecord {
    /// Storage identity, referenced by scans as `roster_record_ref`.
    pub id: String,
    #[serde(flatten)]
    pub entry: RosterEntry,
    pub ingested_at: DateTime<Utc>,
}

/// Why a submitted row was left out of the roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    MissingCode,
    MissingName,
    MissingAdmissionId,
}

/// A dropped row and its 1-based position in the submitted sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowRejection {
    pub row: usize,
    pub reason: RejectReason,
}

/// Result of replacing the roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    /// Records actually inserted, not rows submitted.
    pub accepted_count: usize,
    pub rejected: Vec<RowRejection>,
    /// MD5 hex digest over the accepted records.
    pub digest: String,
    /// True when the previous ingestion produced the same digest.
    pub unchanged: bool,
}
