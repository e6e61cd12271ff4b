//! Roster ingestion: replaces the set of people admitted at the gate.
//!
//! The provided routes are:
//! - `POST /api/roster`: takes a JSON array of rows (column header to cell value),
//!   validates each one and replaces the stored roster with the valid rows. Returns an
//!   `IngestReport` with the inserted count and the position and reason of every
//!   dropped row.
//!
//! - `POST /api/roster/upload`: the same ingestion for a `multipart/form-data` upload
//!   whose `file` part is a CSV document with a header row.
//!
//! Columns are matched by name: `QRLink` is the scanned code, `Name` and
//! `RegistrationID` are required alongside it, and `Email`, `Phone`, `Course` and
//! `Status` are stored if present.

use actix_web::web::{post, scope};
use actix_web::Scope;

pub mod ingest;
mod upload;

const API_PATH: &str = "/api/roster";

/// Configures and returns the Actix scope for roster routes.
pub fn configure_routes() -> Scope {
    scope(API_PATH)
        // Replace the roster from already-parsed rows.
        .route("", post().to(ingest::process))
        // Replace the roster from a CSV file.
        .route("/upload", post().to(upload::process))
}
