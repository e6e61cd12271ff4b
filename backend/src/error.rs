use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use common::model::scan::ScanInfo;
use common::responses::{ErrorBody, ErrorKind};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("No valid records found in the uploaded roster")]
    EmptyInput,

    #[error("Code not found in the roster")]
    NotFound,

    #[error("This code has already been scanned")]
    Duplicate(ScanInfo),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Export failed: {0}")]
    Export(String),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::InvalidInput(_) => ErrorKind::InvalidInput,
            AppError::EmptyInput => ErrorKind::EmptyInput,
            AppError::NotFound => ErrorKind::NotFound,
            AppError::Duplicate(_) => ErrorKind::Duplicate,
            AppError::StorageUnavailable(_) => ErrorKind::StorageUnavailable,
            AppError::Export(_) => ErrorKind::Internal,
        }
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(err: rusqlite::Error) -> Self {
        log::error!("Storage error: {}", err);
        AppError::StorageUnavailable(err.to_string())
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::InvalidInput(format!("CSV could not be parsed: {}", err))
    }
}

impl From<actix_multipart::MultipartError> for AppError {
    fn from(err: actix_multipart::MultipartError) -> Self {
        AppError::InvalidInput(format!("Malformed upload: {}", err))
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) | AppError::EmptyInput => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Duplicate(_) => StatusCode::CONFLICT,
            AppError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let info = match self {
            AppError::Duplicate(info) => Some(info.clone()),
            _ => None,
        };

        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.kind(),
            message: self.to_string(),
            info,
        })
    }
}
