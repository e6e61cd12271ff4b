use serde::Deserialize;

#[derive(Deserialize)]
/// Request payload for the scan validation endpoint.
/// Contains the decoded QR value.
pub struct ScanRequest {
    pub code: String,
}
