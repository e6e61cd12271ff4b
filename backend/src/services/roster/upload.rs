use super::ingest::ingest;
use crate::config::Config;
use crate::error::AppError;
use crate::storage::Database;
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use common::model::roster::RawRow;
use csv::{ReaderBuilder, StringRecord, Trim};
use std::collections::HashSet;
use futures_util::StreamExt;
use log::debug;

/// HTTP handler wrapper: reads the CSV part, then runs the regular ingestion.
pub(crate) async fn process(
    payload: Multipart,
    db: web::Data<Database>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    let bytes = read_csv_part(payload, config.body_limit).await?;
    let rows = parse_roster_csv(&bytes)?;
    debug!("Parsed {} rows from uploaded CSV", rows.len());

    let report = ingest(&db, &rows).await?;
    Ok(HttpResponse::Ok().json(report))
}

/// Collects the bytes of the `file` part, which must be named `*.csv`.
async fn read_csv_part(mut payload: Multipart, limit: usize) -> Result<Vec<u8>, AppError> {
    let mut file: Option<Vec<u8>> = None;

    while let Some(item) = payload.next().await {
        let mut field = item?;
        let field_name = field
            .content_disposition()
            .and_then(|cd| cd.get_name().map(|n| n.to_string()));

        if field_name.as_deref() != Some("file") {
            continue;
        }

        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename().map(|f| f.to_string()))
            .unwrap_or_default();
        if !filename.to_ascii_lowercase().ends_with(".csv") {
            return Err(AppError::InvalidInput("The file must end with .csv".to_string()));
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk?;
            if bytes.len() + chunk.len() > limit {
                return Err(AppError::InvalidInput(format!(
                    "Upload exceeds the {} byte limit",
                    limit
                )));
            }
            bytes.extend_from_slice(&chunk);
        }
        file = Some(bytes);
    }

    file.ok_or_else(|| AppError::InvalidInput("Missing file".to_string()))
}

/// Picks the candidate delimiter that occurs most often in the header line.
fn detect_delimiter(header_line: &str) -> u8 {
    [b',', b';', b'\t', b'|']
        .into_iter()
        .max_by_key(|&d| header_line.bytes().filter(|&b| b == d).count())
        .filter(|&d| header_line.as_bytes().contains(&d))
        .unwrap_or(b',')
}

/// Header cells must be non-empty and distinct, so that every cell of a row
/// lands under exactly one key. Their text is otherwise free; columns the roster
/// does not read are ignored later.
fn validate_header_cells(headers: &StringRecord) -> Result<(), AppError> {
    let mut seen = HashSet::new();
    for cell in headers.iter() {
        if cell.is_empty() {
            return Err(AppError::InvalidInput(
                "CSV header cells must not be empty".to_string(),
            ));
        }
        if !seen.insert(cell) {
            return Err(AppError::InvalidInput(format!(
                "CSV header '{}' appears more than once",
                cell
            )));
        }
    }
    Ok(())
}

/// Turns a CSV document into rows keyed by header.
///
/// Blank lines, and lines whose cells are all empty, are skipped. A document
/// without any data row yields an empty sequence.
pub fn parse_roster_csv(bytes: &[u8]) -> Result<Vec<RawRow>, AppError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|_| AppError::InvalidInput("CSV is not valid UTF-8".to_string()))?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let Some(header_line) = text.lines().find(|line| !line.trim().is_empty()) else {
        return Ok(Vec::new());
    };

    let mut reader = ReaderBuilder::new()
        .delimiter(detect_delimiter(header_line))
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    validate_header_cells(&headers)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(str::is_empty) {
            continue;
        }

        let row: RawRow = headers
            .iter()
            .zip(record.iter())
            .map(|(header, value)| (header.to_string(), value.to_string()))
            .collect();
        rows.push(row);
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::header::CONTENT_TYPE;
    use actix_web::App;
    use common::model::roster::IngestReport;
    use common::responses::{ErrorBody, ErrorKind};

    const BOUNDARY: &str = "gatecheck-boundary";

    fn multipart_body(filename: &str, contents: &str) -> String {
        format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
             Content-Type: text/csv\r\n\r\n\
             {contents}\r\n\
             --{BOUNDARY}--\r\n"
        )
    }

    fn test_config() -> Config {
        Config {
            host: "127.0.0.1".to_string(),
            port: 0,
            db_path: ":memory:".to_string(),
            body_limit: 64 * 1024,
        }
    }

    #[test]
    fn parses_rows_by_header() {
        let csv = "RegistrationID,QRLink,Name,Email\nR1, A1 ,Jo,jo@example.org\n\nR2,B2,\"Smith, Al\",\n";
        let rows = parse_roster_csv(csv.as_bytes()).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["QRLink"], "A1");
        assert_eq!(rows[1]["Name"], "Smith, Al");
        assert_eq!(rows[1]["Email"], "");
    }

    #[test]
    fn detects_semicolon_delimiter() {
        let csv = "QRLink;Name;RegistrationID\nA1;Jo;R1\n";
        let rows = parse_roster_csv(csv.as_bytes()).unwrap();
        assert_eq!(rows[0]["RegistrationID"], "R1");
        assert_eq!(detect_delimiter("Name"), b',');
    }

    #[test]
    fn rejects_empty_header_cell() {
        let err = parse_roster_csv(b"QRLink,,Name\nA1,x,Jo\n").unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn rejects_repeated_header() {
        let err = parse_roster_csv(b"QRLink,Name,RegistrationID,Name\nA1,Jo,R1,Al\n").unwrap_err();
        match err {
            AppError::InvalidInput(message) => assert!(message.contains("'Name'")),
            other => panic!("expected invalid input, got {:?}", other),
        }
    }

    #[test]
    fn unread_columns_with_punctuation_are_accepted() {
        let csv = "S.No,QRLink,Name,RegistrationID,Phone #,Guardian (opt.)\n1,A1,Jo,R1,555,n/a\n";
        let rows = parse_roster_csv(csv.as_bytes()).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["S.No"], "1");
        assert_eq!(rows[0]["QRLink"], "A1");
        assert_eq!(rows[0]["Phone #"], "555");
    }

    #[test]
    fn header_only_document_has_no_rows() {
        assert!(parse_roster_csv(b"QRLink,Name,RegistrationID\n").unwrap().is_empty());
        assert!(parse_roster_csv(b"").unwrap().is_empty());
    }

    #[actix_web::test]
    async fn upload_replaces_roster() {
        let db = Database::open_in_memory().unwrap();
        let app = actix_web::test::init_service(
            App::new()
                .app_data(web::Data::new(db.clone()))
                .app_data(web::Data::new(test_config()))
                .service(super::super::configure_routes()),
        )
        .await;

        let body = multipart_body(
            "roster.csv",
            "QRLink,Name,RegistrationID\nA1,Jo,R1\n,Bad,R2\nB2,Al,R3",
        );
        let req = actix_web::test::TestRequest::post()
            .uri("/api/roster/upload")
            .insert_header((
                CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            ))
            .set_payload(body)
            .to_request();

        let report: IngestReport = actix_web::test::call_and_read_body_json(&app, req).await;
        assert_eq!(report.accepted_count, 2);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(db.roster_len().await.unwrap(), 2);
    }

    #[actix_web::test]
    async fn upload_requires_csv_filename() {
        let db = Database::open_in_memory().unwrap();
        let app = actix_web::test::init_service(
            App::new()
                .app_data(web::Data::new(db))
                .app_data(web::Data::new(test_config()))
                .service(super::super::configure_routes()),
        )
        .await;

        let req = actix_web::test::TestRequest::post()
            .uri("/api/roster/upload")
            .insert_header((
                CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            ))
            .set_payload(multipart_body("roster.txt", "QRLink,Name,RegistrationID\nA1,Jo,R1"))
            .to_request();

        let resp = actix_web::test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
        let body: ErrorBody = actix_web::test::read_body_json(resp).await;
        assert_eq!(body.error, ErrorKind::InvalidInput);
    }
}
