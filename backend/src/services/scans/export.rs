use super::list::{list_scans, newest_first};
use crate::error::AppError;
use crate::storage::Database;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{web, HttpResponse};
use chrono::SecondsFormat;
use common::model::scan::ScanRecord;
use csv::Writer;

const EXPORT_FILENAME: &str = "scanned_qr_data.csv";
const EXPORT_HEADERS: [&str; 4] = ["Name", "Admission Number", "QR Code", "Scanned At"];

pub(crate) async fn process(db: web::Data<Database>) -> Result<HttpResponse, AppError> {
    let mut scans = list_scans(&db).await?;
    newest_first(&mut scans);
    let body = scans_to_csv(&scans)?;

    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(EXPORT_FILENAME.to_string())],
        })
        .body(body))
}

fn scans_to_csv(scans: &[ScanRecord]) -> Result<Vec<u8>, AppError> {
    let mut writer = Writer::from_writer(Vec::new());
    writer
        .write_record(EXPORT_HEADERS)
        .map_err(|e| AppError::Export(e.to_string()))?;

    for scan in scans {
        let scanned_at = scan.scanned_at.to_rfc3339_opts(SecondsFormat::Secs, true);
        writer
            .write_record([
                scan.name.as_str(),
                scan.admission_id.as_str(),
                scan.code.as_str(),
                scanned_at.as_str(),
            ])
            .map_err(|e| AppError::Export(e.to_string()))?;
    }

    writer
        .into_inner()
        .map_err(|e| AppError::Export(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono::Utc;

    #[test]
    fn quotes_fields_that_need_it() {
        let scans = vec![ScanRecord {
            id: "s-1".to_string(),
            code: "A1".to_string(),
            name: "Smith, \"Jo\"".to_string(),
            admission_id: "R1".to_string(),
            scanned_at: Utc.with_ymd_and_hms(2026, 10, 16, 9, 30, 0).unwrap(),
            roster_record_ref: "r-1".to_string(),
        }];

        let csv = String::from_utf8(scans_to_csv(&scans).unwrap()).unwrap();
        assert_eq!(
            csv,
            "Name,Admission Number,QR Code,Scanned At\n\
             \"Smith, \"\"Jo\"\"\",R1,A1,2026-10-16T09:30:00Z\n"
        );
    }

    #[test]
    fn empty_export_has_header_only() {
        let csv = String::from_utf8(scans_to_csv(&[]).unwrap()).unwrap();
        assert_eq!(csv, "Name,Admission Number,QR Code,Scanned At\n");
    }
}
