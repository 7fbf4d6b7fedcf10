//! Request descriptor handed to the dispatcher
//!
//! An [`ApiRequest`] is plain data: it can be replayed any number of times,
//! which the retry and refresh paths rely on. Multipart bodies are kept as
//! parts and turned into a fresh `reqwest` form per attempt.

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use url::Url;

use super::errors::ApiError;

/// What the caller expects back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseShape {
    /// Parse JSON and unwrap the `{success, data}` envelope
    #[default]
    Json,
    /// Raw bytes, untouched
    Blob,
}

/// A single query parameter value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValue {
    /// Dropped when the query string is built
    Null,
    Scalar(String),
    /// Serialized as repeated keys: `tag=a&tag=b`
    List(Vec<String>),
}

impl QueryValue {
    /// Convert a JSON value; objects are sent as their JSON text
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Array(items) => {
                Self::List(items.iter().filter(|item| !item.is_null()).map(scalar_text).collect())
            }
            other => Self::Scalar(scalar_text(other)),
        }
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// One part of a multipart form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartPart {
    pub name: String,
    pub data: Bytes,
    pub file_name: Option<String>,
    pub mime: Option<String>,
}

/// Multipart form kept as data so each attempt can rebuild it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartForm {
    parts: Vec<MultipartPart>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a plain text field
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(MultipartPart {
            name: name.into(),
            data: Bytes::from(value.into()),
            file_name: None,
            mime: None,
        });
        self
    }

    /// Add a file field
    pub fn file(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        data: impl Into<Bytes>,
        mime: Option<&str>,
    ) -> Self {
        self.parts.push(MultipartPart {
            name: name.into(),
            data: data.into(),
            file_name: Some(file_name.into()),
            mime: mime.map(str::to_string),
        });
        self
    }

    pub fn parts(&self) -> &[MultipartPart] {
        &self.parts
    }

    /// Build a fresh reqwest form
    pub(crate) fn to_form(&self) -> Result<Form, ApiError> {
        let mut form = Form::new();
        for part in &self.parts {
            let mut body = Part::bytes(part.data.to_vec());
            if let Some(file_name) = &part.file_name {
                body = body.file_name(file_name.clone());
            }
            if let Some(mime) = &part.mime {
                body = body.mime_str(mime).map_err(|e| {
                    ApiError::InvalidRequest(format!("invalid mime type '{mime}': {e}"))
                })?;
            }
            form = form.part(part.name.clone(), body);
        }
        Ok(form)
    }
}

/// Request body variants
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    Json(Value),
    Raw(Bytes),
    Multipart(MultipartForm),
}

/// Everything the dispatcher needs to issue (and re-issue) a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub params: Vec<(String, QueryValue)>,
    pub body: Option<RequestBody>,
    pub headers: Vec<(String, String)>,
    pub skip_retry: bool,
    pub shape: ResponseShape,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: Vec::new(),
            body: None,
            headers: Vec::new(),
            skip_retry: false,
            shape: ResponseShape::Json,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Add a scalar query parameter
    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.push((key.into(), QueryValue::Scalar(value.to_string())));
        self
    }

    /// Add a query parameter that is dropped when `None`
    pub fn param_opt<V: ToString>(mut self, key: impl Into<String>, value: Option<V>) -> Self {
        let value = value.map_or(QueryValue::Null, |v| QueryValue::Scalar(v.to_string()));
        self.params.push((key.into(), value));
        self
    }

    /// Add an array parameter sent as repeated keys
    pub fn param_list<I, V>(mut self, key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: ToString,
    {
        let values = values.into_iter().map(|v| v.to_string()).collect();
        self.params.push((key.into(), QueryValue::List(values)));
        self
    }

    /// Add every field of a JSON object as a query parameter
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidRequest` when `params` does not serialize
    /// to a JSON object.
    pub fn params<P: Serialize + ?Sized>(mut self, params: &P) -> Result<Self, ApiError> {
        let value = serde_json::to_value(params)
            .map_err(|e| ApiError::InvalidRequest(format!("invalid query params: {e}")))?;
        match value {
            Value::Object(map) => {
                self.params
                    .extend(map.iter().map(|(key, value)| (key.clone(), QueryValue::from_json(value))));
                Ok(self)
            }
            Value::Null => Ok(self),
            other => Err(ApiError::InvalidRequest(format!(
                "query params must be an object, got {other}"
            ))),
        }
    }

    /// Attach a JSON body; a body serializing to `null` means no body
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidRequest` when the body cannot be serialized.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body)
            .map_err(|e| ApiError::InvalidRequest(format!("failed to serialize body: {e}")))?;
        self.body = if value.is_null() { None } else { Some(RequestBody::Json(value)) };
        Ok(self)
    }

    pub fn raw_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(RequestBody::Raw(body.into()));
        self
    }

    pub fn multipart(mut self, form: MultipartForm) -> Self {
        self.body = Some(RequestBody::Multipart(form));
        self
    }

    /// Override or add a header; applied after the defaults
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Make exactly one attempt
    pub fn skip_retry(mut self) -> Self {
        self.skip_retry = true;
        self
    }

    pub fn blob(mut self) -> Self {
        self.shape = ResponseShape::Blob;
        self
    }

    /// Whether the default JSON content type applies
    pub(crate) fn sends_json(&self) -> bool {
        matches!(self.body, None | Some(RequestBody::Json(_)))
    }

    /// Validated header overrides
    pub(crate) fn header_map(&self) -> Result<HeaderMap, ApiError> {
        let mut map = HeaderMap::new();
        for (name, value) in &self.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ApiError::InvalidRequest(format!("invalid header name '{name}': {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| ApiError::InvalidRequest(format!("invalid header value: {e}")))?;
            map.insert(name, value);
        }
        Ok(map)
    }

    /// Absolute URL with normalized path and query string
    pub(crate) fn url(&self, base_url: &str, prefix: &str) -> Result<Url, ApiError> {
        let path = self.path.trim();
        if path.is_empty() {
            return Err(ApiError::InvalidRequest("endpoint path must not be empty".to_string()));
        }

        let endpoint = normalize_endpoint(path, prefix);
        let raw = format!("{}{}", base_url.trim_end_matches('/'), endpoint);
        let mut url = Url::parse(&raw)
            .map_err(|e| ApiError::InvalidRequest(format!("invalid URL '{raw}': {e}")))?;
        append_query(&mut url, &self.params);
        Ok(url)
    }
}

/// Prepend the API prefix unless the endpoint already carries it
pub fn normalize_endpoint(endpoint: &str, prefix: &str) -> String {
    if endpoint.starts_with(prefix) {
        endpoint.to_string()
    } else if endpoint.starts_with('/') {
        format!("{prefix}{endpoint}")
    } else {
        format!("{prefix}/{endpoint}")
    }
}

/// Form-urlencode parameters onto `url`, skipping nulls and keeping order
pub fn append_query(url: &mut Url, params: &[(String, QueryValue)]) {
    let has_values = params.iter().any(|(_, value)| match value {
        QueryValue::Null => false,
        QueryValue::Scalar(_) => true,
        QueryValue::List(items) => !items.is_empty(),
    });
    if !has_values {
        return;
    }

    let mut pairs = url.query_pairs_mut();
    for (key, value) in params {
        match value {
            QueryValue::Null => {}
            QueryValue::Scalar(text) => {
                pairs.append_pair(key, text);
            }
            QueryValue::List(items) => {
                for item in items {
                    pairs.append_pair(key, item);
                }
            }
        }
    }
}
