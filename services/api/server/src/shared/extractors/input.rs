use std::collections::HashMap;

use axum::extract::rejection::BytesRejection;
use axum::extract::{FromRequest, Request};
use axum::http::{HeaderMap, header};
use bytes::Bytes;
use serde_json::Value;
use thiserror::Error;

use crate::AppState;
use crate::shared::auth::Credentials;
use crate::shared::errors::{self, ApiError, codes};
use crate::shared::extractors::request_id::RequestId;
use crate::weight_api::error_recorder::{ErrorRecorder, IntoApiError};

const HANDLER_NAME: &str = "request_input";

/// Request fields gathered from both the body and the query string.
///
/// A field is looked up in the body first (JSON object or urlencoded form),
/// then in the query string, and is the empty string when neither carries a
/// non-empty value. Bodies of any other content type are ignored.
///
/// RequestInput consumes the request body and therefore should always appear
/// after extractors that implement FromRequestParts.
#[derive(Debug, Clone, Default)]
pub struct RequestInput {
    body: HashMap<String, String>,
    query: HashMap<String, String>,
}

impl RequestInput {
    pub fn field(&self, name: &str) -> &str {
        self.body
            .get(name)
            .filter(|value| !value.is_empty())
            .or_else(|| self.query.get(name).filter(|value| !value.is_empty()))
            .map(String::as_str)
            .unwrap_or_default()
    }

    pub fn credentials(&self) -> Credentials<'_> {
        Credentials {
            api_key: self.field("api_key"),
            esp_token: self.field("esp_token"),
        }
    }

    async fn parse<S>(req: Request, state: &S) -> Result<Self, Error>
    where
        S: Send + Sync,
    {
        let query = parse_form(req.uri().query().unwrap_or_default().as_bytes())?;
        let kind = BodyKind::of(req.headers());
        let bytes = Bytes::from_request(req, state).await?;

        let body = match kind {
            BodyKind::Json => parse_json(&bytes)?,
            BodyKind::Form => parse_form(&bytes)?,
            BodyKind::Other => HashMap::new(),
        };

        Ok(Self { body, query })
    }
}

impl FromRequest<AppState> for RequestInput {
    type Rejection = ApiError;

    async fn from_request(
        req: Request,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequestId(request_id) = RequestId::from_headers(req.headers());

        Self::parse(req, state).await.map_err(|e| {
            ErrorRecorder::new(&state.telemetry, HANDLER_NAME, &request_id)
                .record(e)
        })
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Bytes(#[from] BytesRejection),

    #[error(transparent)]
    Json(#[from] serde_path_to_error::Error<serde_json::Error>),

    #[error(transparent)]
    Form(#[from] serde_urlencoded::de::Error),
}

impl IntoApiError for Error {
    fn error_code(&self) -> &'static str {
        codes::INVALID_REQUEST
    }

    fn into_api_error(self) -> ApiError {
        errors::invalid_request("invalid request body")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyKind {
    Json,
    Form,
    Other,
}

impl BodyKind {
    fn of(headers: &HeaderMap) -> Self {
        let Some(mime) = headers
            .get(header::CONTENT_TYPE)
            .and_then(|content_type| content_type.to_str().ok())
            .and_then(|content_type| content_type.parse::<mime::Mime>().ok())
        else {
            return BodyKind::Other;
        };

        if mime.type_() != mime::APPLICATION {
            return BodyKind::Other;
        }

        if mime.subtype() == mime::JSON
            || mime.suffix().is_some_and(|name| name == mime::JSON)
        {
            BodyKind::Json
        } else if mime.subtype() == mime::WWW_FORM_URLENCODED {
            BodyKind::Form
        } else {
            BodyKind::Other
        }
    }
}

/// Repeated keys keep their first value.
fn parse_form(
    raw: &[u8],
) -> Result<HashMap<String, String>, serde_urlencoded::de::Error> {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(raw)?;

    let mut fields = HashMap::with_capacity(pairs.len());
    for (key, value) in pairs {
        fields.entry(key).or_insert(value);
    }
    Ok(fields)
}

/// Scalars are kept as text so `{"weight": 12.5}` and `{"weight": "12.5"}`
/// read the same; `null` counts as absent.
fn parse_json(raw: &[u8]) -> Result<HashMap<String, String>, Error> {
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Ok(HashMap::new());
    }

    let deserializer = &mut serde_json::Deserializer::from_slice(raw);
    let object: serde_json::Map<String, Value> =
        serde_path_to_error::deserialize(deserializer)?;

    Ok(object
        .into_iter()
        .filter_map(|(key, value)| match value {
            Value::Null => None,
            Value::String(text) => Some((key, text)),
            other => Some((key, other.to_string())),
        })
        .collect())
}
