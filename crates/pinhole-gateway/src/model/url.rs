use jiff::Timestamp;
use pinhole_core::Mapping;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct CreateUrlRequest {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUrlRequest {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct RenameUrlRequest {
    pub new_code: String,
}

#[derive(Debug, Serialize)]
pub struct UrlResponse {
    pub code: String,
    pub short_url: String,
    pub target_url: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub access_count: u64,
}

impl UrlResponse {
    pub fn new(mapping: Mapping, base_url: &str) -> Self {
        Self {
            short_url: mapping.code.to_url(base_url),
            code: mapping.code.into_string(),
            target_url: mapping.target_url,
            created_at: mapping.created_at,
            updated_at: mapping.updated_at,
            access_count: mapping.access_count,
        }
    }
}
