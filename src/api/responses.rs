//! Shared API response types

use serde::{Deserialize, Serialize};

/// Success envelope: `{"data": ...}`
#[derive(Debug, Serialize, Deserialize)]
pub struct DataResponse<T> {
    pub data: T,
}

impl<T> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Payload of the descriptive root endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct TitleResponse {
    pub title: String,
}
