pub mod roster;
pub mod scans;

use crate::error::AppError;
use actix_web::web;

/// JSON extractor settings shared by every route: a body limit, and payload
/// errors reported in the API's own error body.
pub fn json_config(limit: usize) -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(limit)
        .error_handler(|err, _req| AppError::InvalidInput(err.to_string()).into())
}
