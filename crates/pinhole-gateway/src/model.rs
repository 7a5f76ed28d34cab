mod url;

pub use url::{CreateUrlRequest, RenameUrlRequest, UpdateUrlRequest, UrlResponse};

use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
