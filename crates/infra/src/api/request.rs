//! Request description for [`ApiClient`](super::ApiClient)
//!
//! An [`ApiRequest`] is built once and never changes afterwards. The client
//! turns it into a fresh `reqwest` request for every attempt, so the retry
//! after a token refresh sends the same method, body and headers.

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, IntoHeaderName};
use reqwest::multipart::{Form, Part};
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

use super::errors::ApiError;

/// Body of an outgoing request
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Value),
    /// Multipart form; the transport sets `Content-Type` with the boundary
    Multipart(MultipartForm),
}

impl RequestBody {
    /// Whether the transport must set a multipart `Content-Type`
    pub fn is_multipart(&self) -> bool {
        matches!(self, Self::Multipart(_))
    }
}

/// Immutable description of one logical API call
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    url: String,
    body: RequestBody,
    headers: HeaderMap,
}

impl ApiRequest {
    /// Request with no body and no extra headers
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self { method, url: url.into(), body: RequestBody::Empty, headers: HeaderMap::new() }
    }

    /// `GET` request
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    /// `POST` request
    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    /// `PUT` request
    pub fn put(url: impl Into<String>) -> Self {
        Self::new(Method::PUT, url)
    }

    /// `PATCH` request
    pub fn patch(url: impl Into<String>) -> Self {
        Self::new(Method::PATCH, url)
    }

    /// `DELETE` request
    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::DELETE, url)
    }

    /// Attach a JSON body
    pub fn json(mut self, body: Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    /// Serialize `body` and attach it as JSON
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Encode` if `body` cannot be represented as JSON
    pub fn json_body<B: Serialize + ?Sized>(self, body: &B) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body).map_err(|e| ApiError::Encode(e.to_string()))?;
        Ok(self.json(value))
    }

    /// Attach a multipart form body
    pub fn multipart(mut self, form: MultipartForm) -> Self {
        self.body = RequestBody::Multipart(form);
        self
    }

    /// Add a caller header; applied after the client's defaults and wins
    /// over them
    pub fn header<K: IntoHeaderName>(mut self, name: K, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// HTTP method
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Absolute target URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Request body
    pub fn body(&self) -> &RequestBody {
        &self.body
    }

    /// Caller-supplied headers, applied after the defaults
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

/// Owned multipart form that can be rebuilt for each attempt.
///
/// `reqwest::multipart::Form` is consumed when sent, so the client keeps the
/// parts here and calls [`MultipartForm::to_form`] per attempt.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultipartForm {
    parts: Vec<MultipartPart>,
}

#[derive(Debug, Clone, PartialEq)]
struct MultipartPart {
    name: String,
    data: PartData,
}

#[derive(Debug, Clone, PartialEq)]
enum PartData {
    Text(String),
    File { bytes: Bytes, file_name: String, mime: Option<String> },
}

impl MultipartForm {
    /// Empty form
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a text field
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(MultipartPart { name: name.into(), data: PartData::Text(value.into()) });
        self
    }

    /// Add a file field
    pub fn file(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        bytes: impl Into<Bytes>,
        mime: Option<&str>,
    ) -> Self {
        self.parts.push(MultipartPart {
            name: name.into(),
            data: PartData::File {
                bytes: bytes.into(),
                file_name: file_name.into(),
                mime: mime.map(str::to_string),
            },
        });
        self
    }

    /// Number of parts
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Whether the form has no parts
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Build a sendable form from the owned parts
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Encode` if a part carries an invalid MIME type
    pub fn to_form(&self) -> Result<Form, ApiError> {
        self.parts.iter().try_fold(Form::new(), |form, part| {
            let name = part.name.clone();
            match &part.data {
                PartData::Text(value) => Ok(form.text(name, value.clone())),
                PartData::File { bytes, file_name, mime } => {
                    let mut file = Part::bytes(bytes.to_vec()).file_name(file_name.clone());
                    if let Some(mime) = mime {
                        file = file.mime_str(mime).map_err(|e| {
                            ApiError::Encode(format!("invalid MIME type '{mime}': {e}"))
                        })?;
                    }
                    Ok(form.part(name, file))
                }
            }
        })
    }
}
