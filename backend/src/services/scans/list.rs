use crate::error::AppError;
use crate::storage::Database;
use actix_web::{web, HttpResponse};
use common::model::scan::ScanRecord;
use common::responses::ScanList;

pub(crate) async fn process(db: web::Data<Database>) -> Result<HttpResponse, AppError> {
    let mut items = list_scans(&db).await?;
    newest_first(&mut items);
    Ok(HttpResponse::Ok().json(ScanList { items }))
}

/// Every recorded scan. No ordering is guaranteed.
pub async fn list_scans(db: &Database) -> Result<Vec<ScanRecord>, AppError> {
    db.find_scans().await
}

pub(super) fn newest_first(scans: &mut [ScanRecord]) {
    scans.sort_by(|a, b| b.scanned_at.cmp(&a.scanned_at));
}
