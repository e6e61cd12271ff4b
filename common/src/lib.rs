//! Data shared between the gate service and its clients: roster and scan records,
//! request payloads and the JSON bodies returned by the HTTP API.

pub mod model;
pub mod requests;
pub mod responses;
