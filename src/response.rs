//! The uniform response envelope.
//!
//! Every call, whether it succeeds, gets an HTTP error, or never reaches the
//! server, ends in a [`ResponseEnvelope`]. Callers branch on
//! [`success`](ResponseEnvelope::success) and [`status`](ResponseEnvelope::status).

use crate::metadata::{Metadata, RequestInfo};
use crate::request::ResponseType;
use crate::transport::TransportResponse;
use crate::Error;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

/// A decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Data {
    Json(Value),
    Text(String),
    Bytes(Vec<u8>),
    /// Decoded `application/x-www-form-urlencoded` pairs, in order.
    Form(Vec<(String, String)>),
}

impl Data {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Data::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Data::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Data::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }
}

/// The outcome of a call.
///
/// # Examples
///
/// ```no_run
/// use fetchwrap::{Client, RequestParams};
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct User { name: String }
///
/// # async fn example() -> Result<(), fetchwrap::Error> {
/// let client = Client::builder().base_path("https://api.example.com").build()?;
///
/// let response = client.get("/users/1", RequestParams::new()).await;
/// if response.success {
///     let user = response.json::<User>();
///     println!("{:?}", user.data.map(|u| u.name));
/// } else {
///     eprintln!("{} {} after {:?}", response.status, response.message, response.metadata.processing_time);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseEnvelope<T = Data> {
    pub success: bool,
    /// The HTTP status, or `0` when no response was received.
    pub status: u16,
    /// The status text, or the failure description when no response was received.
    pub message: String,
    pub metadata: Metadata,
    pub data: Option<T>,
}

impl<T> ResponseEnvelope<T> {
    /// Maps the data to a different type, keeping everything else.
    pub fn map<U, F>(self, f: F) -> ResponseEnvelope<U>
    where
        F: FnOnce(T) -> U,
    {
        ResponseEnvelope {
            success: self.success,
            status: self.status,
            message: self.message,
            metadata: self.metadata,
            data: self.data.map(f),
        }
    }

    /// Returns `true` if the call was made through [`Client::retry`](crate::Client::retry).
    pub fn was_retried(&self) -> bool {
        self.metadata.retry_count > 0
    }

    /// Looks up a response header ignoring case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.metadata.headers.as_ref()?.get_ignore_case(name)
    }
}

impl ResponseEnvelope<Data> {
    /// Deserializes JSON data into `T`; `data` is `None` when it does not fit.
    pub fn json<T: DeserializeOwned>(self) -> ResponseEnvelope<T> {
        let ResponseEnvelope {
            success,
            status,
            message,
            metadata,
            data,
        } = self;

        let data = match data {
            Some(Data::Json(value)) => match serde_json::from_value(value) {
                Ok(typed) => Some(typed),
                Err(e) => {
                    tracing::debug!(error = %e, "Response data does not match the requested type");
                    None
                }
            },
            _ => None,
        };

        ResponseEnvelope {
            success,
            status,
            message,
            metadata,
            data,
        }
    }
}

/// Builds the envelope for a call whose transport failed.
pub(crate) fn from_transport_error(
    info: RequestInfo,
    error: &Error,
    processing_time: Duration,
) -> ResponseEnvelope {
    let message = error.to_string();
    tracing::warn!(
        error = %error,
        method = %info.method,
        url = %info.url,
        "Transport failed"
    );

    ResponseEnvelope {
        success: false,
        status: 0,
        message: message.clone(),
        metadata: info.finish(processing_time, 0, message, None),
        data: None,
    }
}

/// Builds the envelope for a received response.
///
/// Successful bodies are decoded with the requested reader; failed ones are
/// read as JSON if possible, else as text. Decode failures yield `None`.
pub(crate) fn from_transport_response(
    info: RequestInfo,
    response: TransportResponse,
    processing_time: Duration,
) -> ResponseEnvelope {
    let success = response.ok();
    let TransportResponse {
        status,
        status_text,
        headers,
        body,
    } = response;

    tracing::info!(
        status,
        latency_ms = processing_time.as_millis() as u64,
        retry_count = info.request_options.retry_count,
        "Received HTTP response"
    );

    let data = if success {
        decode(info.response_type, body)
    } else {
        if status >= 500 {
            tracing::warn!(status, request = %info.request_name, "Server error (5xx)");
        } else {
            tracing::debug!(status, request = %info.request_name, "Request failed");
        }
        decode_error_body(body)
    };

    ResponseEnvelope {
        success,
        status,
        message: status_text.clone(),
        metadata: info.finish(processing_time, status, status_text, Some(headers)),
        data,
    }
}

fn decode(response_type: ResponseType, body: Vec<u8>) -> Option<Data> {
    match response_type {
        ResponseType::Json => match serde_json::from_slice(&body) {
            Ok(value) => Some(Data::Json(value)),
            Err(e) => {
                tracing::debug!(error = %e, "Failed to decode JSON response body");
                None
            }
        },
        ResponseType::Text => match String::from_utf8(body) {
            Ok(text) => Some(Data::Text(text)),
            Err(e) => {
                tracing::debug!(error = %e, "Response body is not valid UTF-8");
                None
            }
        },
        ResponseType::Blob | ResponseType::ArrayBuffer => Some(Data::Bytes(body)),
        ResponseType::FormData => Some(Data::Form(
            url::form_urlencoded::parse(&body)
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect(),
        )),
    }
}

fn decode_error_body(body: Vec<u8>) -> Option<Data> {
    let text = String::from_utf8_lossy(&body).into_owned();
    if text.is_empty() {
        return None;
    }
    match serde_json::from_str(&text) {
        Ok(value) => Some(Data::Json(value)),
        Err(_) => Some(Data::Text(text)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::RequestOptions;
    use http::Method;
    use serde::Deserialize;
    use serde_json::json;

    fn info(response_type: ResponseType) -> RequestInfo {
        RequestInfo::new(
            "http://localhost/test".to_string(),
            RequestOptions::new(Method::GET),
            response_type,
        )
    }

    #[test]
    fn success_decodes_json() {
        let response = TransportResponse::new(200, r#"{"ok":true}"#)
            .with_header("X-Custom", "value");
        let envelope = from_transport_response(info(ResponseType::Json), response, Duration::ZERO);

        assert!(envelope.success);
        assert_eq!(envelope.status, 200);
        assert_eq!(envelope.message, "OK");
        assert_eq!(envelope.data, Some(Data::Json(json!({"ok": true}))));
        assert_eq!(envelope.header("x-custom"), Some("value"));
        assert_eq!(envelope.metadata.status, 200);
    }

    #[test]
    fn success_with_undecodable_body_keeps_success() {
        let response = TransportResponse::new(200, "not json");
        let envelope = from_transport_response(info(ResponseType::Json), response, Duration::ZERO);

        assert!(envelope.success);
        assert_eq!(envelope.data, None);
    }

    #[test]
    fn success_decodes_other_readers() {
        let text = from_transport_response(
            info(ResponseType::Text),
            TransportResponse::new(200, "hello"),
            Duration::ZERO,
        );
        assert_eq!(text.data, Some(Data::Text("hello".to_string())));

        let bytes = from_transport_response(
            info(ResponseType::ArrayBuffer),
            TransportResponse::new(200, vec![0u8, 1, 2]),
            Duration::ZERO,
        );
        assert_eq!(bytes.data, Some(Data::Bytes(vec![0, 1, 2])));

        let form = from_transport_response(
            info(ResponseType::FormData),
            TransportResponse::new(200, "key=value&type=form"),
            Duration::ZERO,
        );
        assert_eq!(
            form.data,
            Some(Data::Form(vec![
                ("key".to_string(), "value".to_string()),
                ("type".to_string(), "form".to_string()),
            ]))
        );
    }

    #[test]
    fn error_prefers_json_then_text_then_none() {
        let json_body = from_transport_response(
            info(ResponseType::Text),
            TransportResponse::new(404, r#"{"message":"Not found"}"#),
            Duration::ZERO,
        );
        assert!(!json_body.success);
        assert_eq!(json_body.status, 404);
        assert_eq!(json_body.message, "Not Found");
        assert_eq!(json_body.data, Some(Data::Json(json!({"message": "Not found"}))));

        let text_body = from_transport_response(
            info(ResponseType::Json),
            TransportResponse::new(500, "boom"),
            Duration::ZERO,
        );
        assert_eq!(text_body.data, Some(Data::Text("boom".to_string())));

        let empty = from_transport_response(
            info(ResponseType::Json),
            TransportResponse::new(503, ""),
            Duration::ZERO,
        );
        assert_eq!(empty.data, None);
    }

    #[test]
    fn transport_error_has_status_zero() {
        let error = Error::Transport("connection refused".to_string());
        let envelope = from_transport_error(info(ResponseType::Json), &error, Duration::ZERO);

        assert!(!envelope.success);
        assert_eq!(envelope.status, 0);
        assert_eq!(envelope.message, "Transport error: connection refused");
        assert_eq!(envelope.data, None);
        assert_eq!(envelope.metadata.headers, None);
    }

    #[test]
    fn json_projects_into_typed_data() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Status {
            ok: bool,
        }

        let envelope = from_transport_response(
            info(ResponseType::Json),
            TransportResponse::new(200, r#"{"ok":true}"#),
            Duration::ZERO,
        );
        assert_eq!(envelope.clone().json::<Status>().data, Some(Status { ok: true }));
        assert_eq!(envelope.json::<Vec<u8>>().data, None);
    }
}
