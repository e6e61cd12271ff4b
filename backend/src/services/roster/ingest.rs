use crate::error::AppError;
use crate::storage::Database;
use actix_web::{web, HttpResponse};
use chrono::Utc;
use common::model::roster::{
    IngestReport, RawRow, RejectReason, RosterEntry, RosterRecord, RowRejection, COLUMN_ADMISSION_ID,
    COLUMN_CODE, COLUMN_COURSE, COLUMN_EMAIL, COLUMN_NAME, COLUMN_PHONE, COLUMN_STATUS,
};
use log::{info, warn};
use md5::Context;
use uuid::Uuid;

/// Validation result for a single submitted row.
#[derive(Debug, PartialEq)]
pub enum RowOutcome {
    Valid(RosterEntry),
    Rejected(RejectReason),
}

pub(crate) async fn process(
    db: web::Data<Database>,
    rows: web::Json<Vec<RawRow>>,
) -> Result<HttpResponse, AppError> {
    let report = ingest(&db, &rows).await?;
    Ok(HttpResponse::Ok().json(report))
}

/// Trimmed cell value, `None` when the column is missing or blank.
fn cell(row: &RawRow, column: &str) -> Option<String> {
    row.get(column)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Maps a raw row onto the roster columns.
///
/// The row is rejected for the first of code, name or admission id that is
/// missing or blank after trimming.
pub fn validate_row(row: &RawRow) -> RowOutcome {
    let Some(code) = cell(row, COLUMN_CODE) else {
        return RowOutcome::Rejected(RejectReason::MissingCode);
    };
    let Some(name) = cell(row, COLUMN_NAME) else {
        return RowOutcome::Rejected(RejectReason::MissingName);
    };
    let Some(admission_id) = cell(row, COLUMN_ADMISSION_ID) else {
        return RowOutcome::Rejected(RejectReason::MissingAdmissionId);
    };

    RowOutcome::Valid(RosterEntry {
        code,
        name,
        admission_id,
        email: cell(row, COLUMN_EMAIL),
        phone: cell(row, COLUMN_PHONE),
        course: cell(row, COLUMN_COURSE),
        status: cell(row, COLUMN_STATUS),
    })
}

/// MD5 over the canonical fields of the accepted records, in submission order.
fn roster_digest(records: &[RosterRecord]) -> String {
    let mut hasher = Context::new();
    for record in records {
        let entry = &record.entry;
        let fields = [
            Some(entry.code.as_str()),
            Some(entry.name.as_str()),
            Some(entry.admission_id.as_str()),
            entry.email.as_deref(),
            entry.phone.as_deref(),
            entry.course.as_deref(),
            entry.status.as_deref(),
        ];
        for field in fields {
            hasher.consume(field.unwrap_or_default().as_bytes());
            // unit separator
            hasher.consume(b"\x1f");
        }
        // record separator
        hasher.consume(b"\x1e");
    }
    format!("{:x}", hasher.finalize())
}

/// Replaces the stored roster with the valid rows of `rows`.
///
/// The old roster is removed even when nothing valid is left, in which case the
/// call fails with `EmptyInput`.
pub async fn ingest(db: &Database, rows: &[RawRow]) -> Result<IngestReport, AppError> {
    let ingested_at = Utc::now();
    let mut records = Vec::with_capacity(rows.len());
    let mut rejected = Vec::new();

    for (index, row) in rows.iter().enumerate() {
        match validate_row(row) {
            RowOutcome::Valid(entry) => records.push(RosterRecord {
                id: Uuid::new_v4().to_string(),
                entry,
                ingested_at,
            }),
            RowOutcome::Rejected(reason) => rejected.push(RowRejection {
                row: index + 1,
                reason,
            }),
        }
    }

    let digest = roster_digest(&records);
    let previous = db.replace_roster(&records, &digest).await?;

    if records.is_empty() {
        warn!(
            "Roster ingestion of {} rows produced no valid records, roster cleared",
            rows.len()
        );
        return Err(AppError::EmptyInput);
    }

    info!(
        "Roster ingested: {} accepted, {} rejected",
        records.len(),
        rejected.len()
    );

    Ok(IngestReport {
        accepted_count: records.len(),
        rejected,
        unchanged: previous.as_deref() == Some(digest.as_str()),
        digest,
    })
}
