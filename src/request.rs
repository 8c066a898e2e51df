//! Request building.
//!
//! Pure functions that turn a caller's method, path and [`RequestParams`]
//! into a [`RequestOptions`] ready for the transport: URL resolution, header
//! merging, request-type inference and body encoding.

use crate::headers::Headers;
use crate::listener::{RequestInterceptor, ResponseInterceptor};
use crate::metadata::RequestInfo;
use crate::response::ResponseEnvelope;
use http::Method;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// How the body is encoded, inferred from the merged `Content-Type` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestType {
    Text,
    FormData,
    Json,
    ArrayBuffer,
}

/// How the response body is decoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResponseType {
    #[default]
    Json,
    Text,
    Blob,
    ArrayBuffer,
    FormData,
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResponseType::Json => "json",
            ResponseType::Text => "text",
            ResponseType::Blob => "blob",
            ResponseType::ArrayBuffer => "arrayBuffer",
            ResponseType::FormData => "formData",
        };
        f.write_str(name)
    }
}

/// Credentials policy forwarded to the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Credentials {
    Omit,
    SameOrigin,
    Include,
}

/// Request mode forwarded to the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Cors,
    NoCors,
    SameOrigin,
    Navigate,
}

/// One part of a [`FormData`] body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormPart {
    Text(String),
    File {
        bytes: Vec<u8>,
        file_name: Option<String>,
        mime: Option<String>,
    },
}

/// An opaque multipart body.
///
/// The transport chooses the multipart boundary, so any caller-supplied
/// `Content-Type` is dropped when a `FormData` body is sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    parts: Vec<(String, FormPart)>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a text field.
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push((name.into(), FormPart::Text(value.into())));
        self
    }

    /// Appends a file field.
    pub fn file(
        mut self,
        name: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
        file_name: Option<String>,
        mime: Option<String>,
    ) -> Self {
        self.parts.push((
            name.into(),
            FormPart::File {
                bytes: bytes.into(),
                file_name,
                mime,
            },
        ));
        self
    }

    pub fn parts(&self) -> impl Iterator<Item = (&str, &FormPart)> {
        self.parts.iter().map(|(n, p)| (n.as_str(), p))
    }
}

/// A body as supplied by the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// A structured value, JSON-encoded when the request type is `json`.
    Json(Value),
    /// Text, sent as a JSON string when the request type is `json`.
    Text(String),
    /// Bytes sent as is.
    Bytes(Vec<u8>),
    /// A multipart body.
    Form(FormData),
}

impl From<Value> for Body {
    fn from(value: Value) -> Self {
        Body::Json(value)
    }
}

impl From<FormData> for Body {
    fn from(form: FormData) -> Self {
        Body::Form(form)
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Body::Text(text)
    }
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Body::Text(text.to_string())
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Body::Bytes(bytes)
    }
}

/// A body in the form it goes out on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireBody {
    Text(String),
    Bytes(Vec<u8>),
    Form(FormData),
}

/// A concrete request, as handed to the [`Transport`](crate::Transport).
///
/// Built fresh for every call and left untouched once the transport has it.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: Headers,
    pub body: Option<WireBody>,
    pub credentials: Option<Credentials>,
    pub mode: Option<Mode>,
    /// `0` on the first attempt, incremented by [`Client::retry`](crate::Client::retry).
    pub retry_count: u32,
}

impl RequestOptions {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            headers: Headers::new(),
            body: None,
            credentials: None,
            mode: None,
            retry_count: 0,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn body(mut self, body: WireBody) -> Self {
        self.body = Some(body);
        self
    }

    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = Some(mode);
        self
    }
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self::new(Method::GET)
    }
}

/// Per-call parameters for [`Client::call`](crate::Client::call) and friends.
///
/// When no explicit [`body`](RequestParams::body) is given, the fields added
/// with [`field`](RequestParams::field) form a JSON object that is sent as the
/// body instead.
///
/// # Examples
///
/// ```
/// use fetchwrap::{RequestParams, ResponseType};
/// use serde_json::json;
///
/// let params = RequestParams::new()
///     .header("X-Request-Id", "42")
///     .field("name", json!("Alice"))
///     .response_type(ResponseType::Text);
/// ```
#[derive(Clone, Default)]
pub struct RequestParams {
    pub(crate) headers: Headers,
    pub(crate) body: Option<Body>,
    pub(crate) fields: Map<String, Value>,
    pub(crate) credentials: Option<Credentials>,
    pub(crate) mode: Option<Mode>,
    pub(crate) response_type: Option<ResponseType>,
    pub(crate) on_request: Option<RequestInterceptor>,
    pub(crate) on_response: Option<ResponseInterceptor>,
}

impl RequestParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a per-call header. Per-call headers win over the defaults.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Merges several per-call headers at once.
    pub fn headers(mut self, headers: Headers) -> Self {
        self.headers.merge(&headers);
        self
    }

    /// Sets an explicit body. Takes precedence over any fields.
    pub fn body(mut self, body: impl Into<Body>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Adds a field to the implicit JSON object body.
    pub fn field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    /// Credentials policy for this call; overrides the client's.
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Request mode, forwarded to the transport untouched.
    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// How the success body is decoded. Defaults to [`ResponseType::Json`].
    pub fn response_type(mut self, response_type: ResponseType) -> Self {
        self.response_type = Some(response_type);
        self
    }

    /// Request interceptor for this call only; the client-level one is skipped.
    pub fn on_request<F>(mut self, f: F) -> Self
    where
        F: Fn(&RequestInfo) + Send + Sync + 'static,
    {
        self.on_request = Some(Arc::new(f));
        self
    }

    /// Response interceptor for this call only; the client-level one is skipped.
    pub fn on_response<F>(mut self, f: F) -> Self
    where
        F: Fn(&ResponseEnvelope) + Send + Sync + 'static,
    {
        self.on_response = Some(Arc::new(f));
        self
    }
}

impl fmt::Debug for RequestParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestParams")
            .field("headers", &self.headers)
            .field("body", &self.body)
            .field("fields", &self.fields)
            .field("credentials", &self.credentials)
            .field("mode", &self.mode)
            .field("response_type", &self.response_type)
            .field("on_request", &self.on_request.is_some())
            .field("on_response", &self.on_response.is_some())
            .finish()
    }
}

/// Joins a path onto the base path.
///
/// Absolute URLs (anything starting with `http`) are used verbatim.
pub fn resolve_url(base_path: &str, path: &str) -> String {
    if path.starts_with("http") {
        path.to_string()
    } else if path.starts_with('/') {
        format!("{}{}", base_path, path)
    } else {
        format!("{}/{}", base_path, path)
    }
}

/// Infers the request type from the `Content-Type` header, if any.
pub fn infer_request_type(headers: &Headers) -> RequestType {
    let content_type = headers
        .get_ignore_case("content-type")
        .unwrap_or_default()
        .to_ascii_lowercase();

    if content_type.contains("text") {
        RequestType::Text
    } else if content_type.contains("form") {
        RequestType::FormData
    } else if content_type.contains("json") {
        RequestType::Json
    } else {
        RequestType::ArrayBuffer
    }
}

/// Methods that send a body. `DELETE` is included.
pub fn method_carries_body(method: &Method) -> bool {
    *method == Method::POST
        || *method == Method::PUT
        || *method == Method::PATCH
        || *method == Method::DELETE
}

/// Encodes the body for the wire.
///
/// A multipart body passes through and strips `Content-Type` from `headers`.
/// Bytes pass through. Otherwise the explicit body, or the fields as a JSON
/// object, is JSON-encoded when `request_type` is `json`; a string under any
/// other request type goes out as plain text.
pub fn build_body(
    body: Option<Body>,
    fields: Map<String, Value>,
    request_type: RequestType,
    headers: &mut Headers,
) -> WireBody {
    let body = body.unwrap_or(Body::Json(Value::Object(fields)));

    match body {
        Body::Form(form) => {
            headers.remove_ignore_case("content-type");
            WireBody::Form(form)
        }
        Body::Bytes(bytes) => WireBody::Bytes(bytes),
        Body::Text(text) | Body::Json(Value::String(text))
            if request_type != RequestType::Json =>
        {
            WireBody::Text(text)
        }
        Body::Text(text) => WireBody::Text(Value::String(text).to_string()),
        Body::Json(value) => WireBody::Text(value.to_string()),
    }
}
