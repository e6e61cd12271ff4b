//! Gate-side scan handling.
//!
//! The provided routes are:
//! - `POST /api/scans/validate`: checks one decoded QR value against the roster and
//!   records the first scan of each code. `200` with the matched person on
//!   acceptance; `404` for a code that is not on the roster; `409` with the matched
//!   person for a code already scanned; `400` for a blank code.
//!
//! - `GET /api/scans`: every recorded scan, newest first.
//!
//! - `GET /api/scans/export`: the same list as a CSV attachment with the columns
//!   `Name`, `Admission Number`, `QR Code` and `Scanned At`.

use actix_web::web::{get, post, scope};
use actix_web::Scope;

mod export;
pub mod list;
pub mod validate;

const API_PATH: &str = "/api/scans";

/// Configures and returns the Actix scope for scan routes.
pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/validate", post().to(validate::process))
        .route("", get().to(list::process))
        .route("/export", get().to(export::process))
}
