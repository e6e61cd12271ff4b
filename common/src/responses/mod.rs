use crate::model::scan::{ScanInfo, ScanRecord};
use serde::{Deserialize, Serialize};

/// Category of a failed request.
///
/// `NotFound` and `Duplicate` are ordinary gate outcomes; clients should render
/// them differently from `StorageUnavailable`, which is a fault worth retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    EmptyInput,
    NotFound,
    Duplicate,
    StorageUnavailable,
    Internal,
}

/// JSON body of every non-2xx API response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorKind,
    pub message: String,
    /// Who the code belongs to, present for `Duplicate`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<ScanInfo>,
}

/// Body of a successful `POST /api/scans/validate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanAccepted {
    pub status: String,
    pub info: ScanInfo,
}

impl ScanAccepted {
    pub fn new(info: ScanInfo) -> Self {
        ScanAccepted {
            status: "accepted".to_string(),
            info,
        }
    }
}

/// Body of `GET /api/scans`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanList {
    pub items: Vec<ScanRecord>,
}
