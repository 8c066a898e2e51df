//! Interceptors and status listeners.
//!
//! Interceptors observe a call before the transport runs (`on_request`) and
//! after the envelope is final (`on_response`). Status listeners run between
//! the two, keyed by status code or the `*` wildcard, and a code-specific
//! listener may substitute the envelope the caller receives.
//!
//! None of these callbacks are guarded: a panicking callback unwinds through
//! the call that triggered it.

use crate::client::Client;
use crate::metadata::RequestInfo;
use crate::response::ResponseEnvelope;
use futures::future::{BoxFuture, FutureExt};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;

/// Callback run before the transport call.
pub type RequestInterceptor = Arc<dyn Fn(&RequestInfo) + Send + Sync>;

/// Callback run once the envelope is final.
pub type ResponseInterceptor = Arc<dyn Fn(&ResponseEnvelope) + Send + Sync>;

/// Callback keyed by status.
///
/// Receives a handle to the client so it can [`retry`](Client::retry) the
/// request. Returning `Some` replaces the envelope handed back to the caller;
/// the return value of the wildcard listener is ignored.
pub type StatusListener = Arc<
    dyn Fn(Client, ResponseEnvelope) -> BoxFuture<'static, Option<ResponseEnvelope>> + Send + Sync,
>;

pub(crate) fn status_listener<F, Fut>(f: F) -> StatusListener
where
    F: Fn(Client, ResponseEnvelope) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Option<ResponseEnvelope>> + Send + 'static,
{
    Arc::new(move |client: Client, envelope: ResponseEnvelope| f(client, envelope).boxed())
}

/// Key of the status listener table.
///
/// # Examples
///
/// ```
/// use fetchwrap::StatusKey;
///
/// assert_eq!("*".parse::<StatusKey>().unwrap(), StatusKey::Any);
/// assert_eq!("404".parse::<StatusKey>().unwrap(), StatusKey::Code(404));
/// assert_eq!(StatusKey::from(500u16), StatusKey::Code(500));
/// assert_eq!(StatusKey::from(http::StatusCode::NOT_FOUND), StatusKey::Code(404));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusKey {
    /// Matches every status.
    Any,
    Code(u16),
}

impl From<u16> for StatusKey {
    fn from(code: u16) -> Self {
        StatusKey::Code(code)
    }
}

impl From<http::StatusCode> for StatusKey {
    fn from(status: http::StatusCode) -> Self {
        StatusKey::Code(status.as_u16())
    }
}

impl FromStr for StatusKey {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "*" => Ok(StatusKey::Any),
            code => code.parse().map(StatusKey::Code),
        }
    }
}

impl fmt::Display for StatusKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusKey::Any => f.write_str("*"),
            StatusKey::Code(code) => write!(f, "{}", code),
        }
    }
}

/// At most one listener per key; registering again replaces the old one.
#[derive(Clone, Default)]
pub struct StatusListeners {
    listeners: HashMap<StatusKey, StatusListener>,
}

impl StatusListeners {
    pub fn insert(&mut self, key: StatusKey, listener: StatusListener) {
        self.listeners.insert(key, listener);
    }

    pub fn get(&self, key: StatusKey) -> Option<&StatusListener> {
        self.listeners.get(&key)
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Runs the wildcard listener, then the one for `envelope.status`.
    ///
    /// Returns the envelope to hand back to the caller.
    pub(crate) async fn dispatch(
        &self,
        client: &Client,
        envelope: ResponseEnvelope,
    ) -> ResponseEnvelope {
        if let Some(any) = self.get(StatusKey::Any) {
            tracing::trace!(status = envelope.status, "Dispatching wildcard status listener");
            any(client.clone(), envelope.clone()).await;
        }

        match self.get(StatusKey::Code(envelope.status)) {
            Some(listener) => {
                tracing::trace!(status = envelope.status, "Dispatching status listener");
                let status = envelope.status;
                match listener(client.clone(), envelope.clone()).await {
                    Some(replacement) => {
                        tracing::debug!(status, "Status listener replaced the response");
                        replacement
                    }
                    None => envelope,
                }
            }
            None => envelope,
        }
    }
}

impl fmt::Debug for StatusListeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.listeners.keys()).finish()
    }
}
