//! # Scan Validator
//!
//! Decides, for one scanned code, between three outcomes derived from the stored
//! collections on every call:
//!
//! 1. no roster record has this code: `NotFound`;
//! 2. the code is on the roster and has no scan yet: the scan is recorded and the
//!    caller gets the person's name and admission id;
//! 3. a scan already exists: `Duplicate`, carrying the same display fields and the
//!    time of the original scan.
//!
//! The first-scan decision is made by the storage insert itself (UNIQUE on the
//! scan code), not by a lookup beforehand, so concurrent scans of one code
//! record exactly one check-in.

use crate::error::AppError;
use crate::storage::{Database, ScanInsert};
use actix_web::{web, HttpResponse};
use chrono::Utc;
use common::model::scan::{ScanInfo, ScanRecord};
use common::requests::ScanRequest;
use common::responses::ScanAccepted;
use log::{debug, info, warn};
use uuid::Uuid;

pub(crate) async fn process(
    db: web::Data<Database>,
    payload: web::Json<ScanRequest>,
) -> Result<HttpResponse, AppError> {
    let info = validate_scan(&db, &payload.code).await?;
    Ok(HttpResponse::Ok().json(ScanAccepted::new(info)))
}

/// Validates `code` and records it on first sight.
///
/// Matching is exact and case-sensitive; the code is not trimmed. A blank code is
/// rejected before storage is touched.
pub async fn validate_scan(db: &Database, code: &str) -> Result<ScanInfo, AppError> {
    if code.trim().is_empty() {
        return Err(AppError::InvalidInput("QR code is required".to_string()));
    }

    let Some(person) = db.find_roster_record(code).await? else {
        debug!("Scanned code {:?} is not on the roster", code);
        return Err(AppError::NotFound);
    };

    let scan = ScanRecord {
        id: Uuid::new_v4().to_string(),
        code: person.entry.code.clone(),
        name: person.entry.name.clone(),
        admission_id: person.entry.admission_id.clone(),
        scanned_at: Utc::now(),
        roster_record_ref: person.id.clone(),
    };

    match db.insert_scan(&scan).await? {
        ScanInsert::Inserted => {
            info!("Admitted {} ({})", scan.name, scan.admission_id);
            Ok(ScanInfo::from(&scan))
        }
        ScanInsert::AlreadyExists(original) => {
            warn!(
                "Duplicate scan for {} ({}), first scanned at {}",
                person.entry.name, person.entry.admission_id, original.scanned_at
            );
            Err(AppError::Duplicate(ScanInfo {
                name: person.entry.name,
                admission_id: person.entry.admission_id,
                scanned_at: original.scanned_at,
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::roster::ingest::ingest;
    use common::model::roster::RawRow;
    use futures_util::future::join_all;

    async fn roster_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        let rows: Vec<RawRow> = vec![
            [("QRLink", "A1"), ("Name", "Jo"), ("RegistrationID", "R1")],
            [("QRLink", "B2"), ("Name", "Al"), ("RegistrationID", "R2")],
        ]
        .into_iter()
        .map(|cells| {
            cells
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect()
        })
        .collect();
        ingest(&db, &rows).await.unwrap();
        db
    }

    #[actix_web::test]
    async fn first_scan_accepted_then_duplicate_forever() {
        let db = roster_db().await;

        let accepted = validate_scan(&db, "A1").await.unwrap();
        assert_eq!(accepted.name, "Jo");
        assert_eq!(accepted.admission_id, "R1");

        for _ in 0..3 {
            match validate_scan(&db, "A1").await {
                Err(AppError::Duplicate(info)) => {
                    assert_eq!(info.name, "Jo");
                    assert_eq!(info.admission_id, "R1");
                    assert_eq!(info.scanned_at, accepted.scanned_at);
                }
                other => panic!("expected duplicate, got {:?}", other),
            }
        }

        assert_eq!(db.find_scans().await.unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn unknown_and_case_variant_codes_are_not_found() {
        let db = roster_db().await;
        validate_scan(&db, "A1").await.unwrap();

        assert!(matches!(validate_scan(&db, "a1").await, Err(AppError::NotFound)));
        assert!(matches!(validate_scan(&db, "Z9").await, Err(AppError::NotFound)));
        assert!(matches!(validate_scan(&db, " A1").await, Err(AppError::NotFound)));
    }

    #[actix_web::test]
    async fn blank_code_is_invalid() {
        let db = roster_db().await;
        assert!(matches!(validate_scan(&db, "").await, Err(AppError::InvalidInput(_))));
        assert!(matches!(validate_scan(&db, " \t ").await, Err(AppError::InvalidInput(_))));
        assert!(db.find_scans().await.unwrap().is_empty());
    }

    #[actix_web::test]
    async fn concurrent_scans_of_one_code_admit_once() {
        let db = roster_db().await;

        let results = join_all((0..8).map(|_| validate_scan(&db, "B2"))).await;
        let accepted = results.iter().filter(|r| r.is_ok()).count();
        let duplicates = results
            .iter()
            .filter(|r| matches!(r, Err(AppError::Duplicate(_))))
            .count();

        assert_eq!(accepted, 1);
        assert_eq!(duplicates, 7);
        assert_eq!(db.find_scans().await.unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn scan_history_survives_roster_replacement() {
        let db = roster_db().await;
        validate_scan(&db, "A1").await.unwrap();

        let rows: Vec<RawRow> = vec![[("QRLink", "C3"), ("Name", "Mo"), ("RegistrationID", "R3")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()];
        ingest(&db, &rows).await.unwrap();

        let scans = db.find_scans().await.unwrap();
        assert_eq!(scans.len(), 1);
        assert_eq!(scans[0].name, "Jo");
        assert!(matches!(validate_scan(&db, "A1").await, Err(AppError::NotFound)));
    }
}
