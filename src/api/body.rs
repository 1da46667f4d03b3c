//! Request body parsing
//!
//! JSON, urlencoded form and plain-text bodies are parsed into a
//! [`RequestBody`] according to `Content-Type`. Other content types are
//! treated as an empty body.
//!
//! Urlencoded input (form bodies and query strings) is decoded strictly:
//! percent-escapes that do not form valid UTF-8 are a validation error.

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::header,
    Json,
};

use crate::api::middleware::ApiError;
use crate::models::Credentials;

/// Parsed request body
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(serde_json::Value),
    Form(Vec<(String, String)>),
    Text(String),
}

fn media_type(request: &Request) -> String {
    request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|v| v.trim().to_ascii_lowercase())
        .unwrap_or_default()
}

fn has_empty_body(request: &Request) -> bool {
    request
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim() == "0")
}

impl<S> FromRequest<S> for RequestBody
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if has_empty_body(&req) {
            return Ok(RequestBody::Empty);
        }

        let media_type = media_type(&req);
        if media_type == "application/json" || media_type.ends_with("+json") {
            let Json(value) = Json::<serde_json::Value>::from_request(req, state)
                .await
                .map_err(|e| ApiError::new(e.status(), e.body_text()))?;
            Ok(RequestBody::Json(value))
        } else if media_type == "application/x-www-form-urlencoded" {
            let bytes = Bytes::from_request(req, state)
                .await
                .map_err(|e| ApiError::new(e.status(), e.body_text()))?;
            let raw = std::str::from_utf8(&bytes)
                .map_err(|_| ApiError::validation_error("Form body must be valid UTF-8"))?;
            Ok(RequestBody::Form(decode_pairs(raw)?))
        } else if media_type.starts_with("text/") {
            let text = String::from_request(req, state)
                .await
                .map_err(|e| ApiError::new(e.status(), e.body_text()))?;
            Ok(if text.is_empty() {
                RequestBody::Empty
            } else {
                RequestBody::Text(text)
            })
        } else {
            Ok(RequestBody::Empty)
        }
    }
}

/// Decode `application/x-www-form-urlencoded` pairs.
///
/// A key without `=` gets an empty value.
pub fn decode_pairs(raw: &str) -> Result<Vec<(String, String)>, ApiError> {
    raw.split('&')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let (key, value) = part.split_once('=').unwrap_or((part, ""));
            Ok((decode_component(key)?, decode_component(value)?))
        })
        .collect()
}

fn decode_component(raw: &str) -> Result<String, ApiError> {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|decoded| decoded.into_owned())
        .map_err(|_| ApiError::validation_error("Parameters must be valid UTF-8"))
}

/// Pick `name` and `password` out of decoded pairs; the last occurrence wins
pub fn credentials_from_pairs(pairs: Vec<(String, String)>) -> Credentials {
    let mut credentials = Credentials::default();
    for (key, value) in pairs {
        match key.as_str() {
            "name" => credentials.name = Some(value),
            "password" => credentials.password = Some(value),
            _ => {}
        }
    }
    credentials
}

impl RequestBody {
    /// Read `name` and `password` from a JSON object or form body
    pub fn credentials(self) -> Result<Credentials, ApiError> {
        match self {
            RequestBody::Empty => Ok(Credentials::default()),
            RequestBody::Json(value @ serde_json::Value::Object(_)) => {
                serde_json::from_value(value).map_err(|e| {
                    ApiError::validation_error("name and password must be strings")
                        .with_detail(e.to_string())
                })
            }
            RequestBody::Json(_) => Err(ApiError::validation_error(
                "JSON body must be an object",
            )),
            RequestBody::Form(pairs) => Ok(credentials_from_pairs(pairs)),
            RequestBody::Text(_) => Err(ApiError::validation_error(
                "Expected a JSON or form body",
            )),
        }
    }
}
