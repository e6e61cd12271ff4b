use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A recorded check-in. At most one exists per `code`.
///
/// `name` and `admission_id` are copied from the roster when the scan is
/// accepted, so replacing the roster later does not rewrite scan history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRecord {
    pub id: String,
    pub code: String,
    pub name: String,
    pub admission_id: String,
    pub scanned_at: DateTime<Utc>,
    pub roster_record_ref: String,
}

/// What the gate shows for a scanned code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanInfo {
    pub name: String,
    pub admission_id: String,
    /// For a duplicate, the time of the original check-in.
    pub scanned_at: DateTime<Utc>,
}

impl From<&ScanRecord> for ScanInfo {
    fn from(record: &ScanRecord) -> Self {
        ScanInfo {
            name: record.name.clone(),
            admission_id: record.admission_id.clone(),
            scanned_at: record.scanned_at,
        }
    }
}
