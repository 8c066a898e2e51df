//! The transport seam.
//!
//! A [`Transport`] sends one [`RequestOptions`] and returns the raw response,
//! or an [`Error`] when no response could be obtained at all. It is the only
//! place a call suspends on the network. [`ReqwestTransport`] is the default.

use crate::headers::Headers;
use crate::request::{FormData, FormPart, RequestOptions, WireBody};
use crate::{Error, Result};
use async_trait::async_trait;
use http::{HeaderName, HeaderValue};
use std::time::Duration;

/// A response as received from the transport, body fully read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: Headers,
    pub body: Vec<u8>,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            status_text: http::StatusCode::from_u16(status)
                .ok()
                .and_then(|s| s.canonical_reason())
                .unwrap_or_default()
                .to_string(),
            headers: Headers::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// `true` for 2xx statuses.
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends a built request.
///
/// Implementations must not retry or time out on their own; they report
/// what happened on the wire.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, url: &str, request: &RequestOptions) -> Result<TransportResponse>;
}

/// [`Transport`] backed by a `reqwest::Client`.
///
/// `credentials` and `mode` have no meaning outside a browser and are ignored.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    http_client: reqwest::Client,
    timeout: Option<Duration>,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an already configured `reqwest::Client`.
    pub fn from_client(http_client: reqwest::Client) -> Self {
        Self {
            http_client,
            timeout: None,
        }
    }

    /// Sets a per-request timeout. A timed-out request is a transport failure.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, url: &str, request: &RequestOptions) -> Result<TransportResponse> {
        let mut builder = self.http_client.request(request.method.clone(), url);

        // insert, not append: a later entry wins even when names differ in case
        let mut headers = http::HeaderMap::new();
        for (name, value) in request.headers.iter() {
            let name = HeaderName::try_from(name)
                .map_err(|e| Error::InvalidHeader(format!("{}: {}", name, e)))?;
            let value = HeaderValue::try_from(value)
                .map_err(|e| Error::InvalidHeader(format!("{}: {}", name, e)))?;
            headers.insert(name, value);
        }
        builder = builder.headers(headers);

        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        builder = match &request.body {
            Some(WireBody::Text(text)) => builder.body(text.clone()),
            Some(WireBody::Bytes(bytes)) => builder.body(bytes.clone()),
            Some(WireBody::Form(form)) => builder.multipart(multipart_form(form)?),
            None => builder,
        };

        let response = builder.send().await?;

        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();

        let body = match response.bytes().await {
            Ok(bytes) => bytes.to_vec(),
            Err(e) => {
                tracing::debug!(error = %e, "Failed to read response body");
                Vec::new()
            }
        };

        Ok(TransportResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body,
        })
    }
}

fn multipart_form(form: &FormData) -> Result<reqwest::multipart::Form> {
    let mut multipart = reqwest::multipart::Form::new();
    for (name, part) in form.parts() {
        let part = match part {
            FormPart::Text(value) => reqwest::multipart::Part::text(value.clone()),
            FormPart::File {
                bytes,
                file_name,
                mime,
            } => {
                let mut part = reqwest::multipart::Part::bytes(bytes.clone());
                if let Some(file_name) = file_name {
                    part = part.file_name(file_name.clone());
                }
                if let Some(mime) = mime {
                    part = part
                        .mime_str(mime)
                        .map_err(|e| Error::InvalidHeader(format!("{}: {}", mime, e)))?;
                }
                part
            }
        };
        multipart = multipart.part(name.to_string(), part);
    }
    Ok(multipart)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_covers_2xx_only() {
        assert!(TransportResponse::new(200, "").ok());
        assert!(TransportResponse::new(204, "").ok());
        assert!(!TransportResponse::new(304, "").ok());
        assert!(!TransportResponse::new(404, "").ok());
    }

    #[test]
    fn multipart_form_accepts_files_and_rejects_bad_mime() {
        let form = FormData::new().text("key", "value").file(
            "upload",
            vec![1u8, 2, 3],
            Some("data.bin".to_string()),
            Some("application/octet-stream".to_string()),
        );
        assert!(multipart_form(&form).is_ok());

        let bad = FormData::new().file("upload", vec![0u8], None, Some("not a mime".to_string()));
        assert!(matches!(
            multipart_form(&bad),
            Err(Error::InvalidHeader(message)) if message.starts_with("not a mime")
        ));
    }

    #[test]
    fn status_text_from_canonical_reason() {
        assert_eq!(TransportResponse::new(404, "").status_text, "Not Found");
        assert_eq!(TransportResponse::new(599, "").status_text, "");
    }
}
