//! Call metadata.
//!
//! Every envelope carries a [`Metadata`] record describing the request that
//! produced it. The record holds everything [`Client::retry`](crate::Client::retry)
//! needs to send the request again.

use crate::headers::Headers;
use crate::request::{RequestOptions, ResponseType};
use http::Method;
use std::time::Duration;

/// What a request interceptor sees: the call as it is about to be sent.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestInfo {
    pub url: String,
    pub method: Method,
    pub request_options: RequestOptions,
    pub request_name: String,
    pub response_type: ResponseType,
}

impl RequestInfo {
    pub(crate) fn new(
        url: String,
        request_options: RequestOptions,
        response_type: ResponseType,
    ) -> Self {
        let method = request_options.method.clone();
        Self {
            request_name: request_name(&method, &url),
            url,
            method,
            request_options,
            response_type,
        }
    }

    /// Completes the record once the call has an outcome.
    pub(crate) fn finish(
        self,
        processing_time: Duration,
        status: u16,
        message: String,
        headers: Option<Headers>,
    ) -> Metadata {
        let retry_count = self.request_options.retry_count;
        Metadata {
            processing_time,
            url: self.url,
            method: self.method,
            request_options: self.request_options,
            request_name: self.request_name,
            response_type: self.response_type,
            status,
            message,
            headers,
            retry_count,
        }
    }
}

/// Diagnostic and replay record attached to every envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct Metadata {
    /// Time from just before the transport call until the envelope was built.
    pub processing_time: Duration,
    /// The resolved URL.
    pub url: String,
    pub method: Method,
    /// The request exactly as it was handed to the transport.
    pub request_options: RequestOptions,
    /// `{method}:{url}` with the URL scheme removed, e.g. `get:localhost:3000/users`.
    pub request_name: String,
    pub response_type: ResponseType,
    pub status: u16,
    pub message: String,
    /// Response headers; `None` when no response was received.
    pub headers: Option<Headers>,
    pub retry_count: u32,
}

/// Builds the `{method}:{url}` name of a request.
pub fn request_name(method: &Method, url: &str) -> String {
    let without_scheme = url
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(url);
    format!("{}:{}", method.as_str().to_ascii_lowercase(), without_scheme)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_name_strips_scheme() {
        assert_eq!(
            request_name(&Method::GET, "http://localhost:3000/users"),
            "get:localhost:3000/users"
        );
        assert_eq!(
            request_name(&Method::DELETE, "https://api.example.com/x"),
            "delete:api.example.com/x"
        );
        assert_eq!(request_name(&Method::POST, "/relative"), "post:/relative");
    }

    #[test]
    fn finish_copies_retry_count() {
        let mut options = RequestOptions::new(Method::PUT);
        options.retry_count = 2;
        let info = RequestInfo::new(
            "http://localhost/a".to_string(),
            options,
            ResponseType::Json,
        );

        let metadata = info.finish(Duration::from_millis(5), 200, "OK".to_string(), None);
        assert_eq!(metadata.retry_count, 2);
        assert_eq!(metadata.method, Method::PUT);
        assert_eq!(metadata.request_name, "put:localhost/a");
    }
}
