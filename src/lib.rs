//! # Fetchwrap - every HTTP outcome in one envelope
//!
//! Fetchwrap wraps a single "send a request, get a response" primitive and
//! turns whatever happens, whether a 2xx, an HTTP error, or a connection that
//! never got a response, into one [`ResponseEnvelope`]. On top of that it
//! layers auth header injection, header merging, body encoding, interceptors,
//! per-status listeners and manual request replay.
//!
//! ## Quick Start
//!
//! ```no_run
//! use fetchwrap::{Auth, Client, RequestParams};
//! use serde::Deserialize;
//! use serde_json::json;
//!
//! #[derive(Deserialize)]
//! struct User {
//!     id: u64,
//!     name: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), fetchwrap::Error> {
//!     let client = Client::builder()
//!         .base_path("https://api.example.com")
//!         .auth(Auth::bearer("secret-token"))
//!         .build()?;
//!
//!     let response = client.get("/users/123", RequestParams::new()).await;
//!     if response.success {
//!         let user = response.json::<User>();
//!         if let Some(user) = user.data {
//!             println!("User {}: {}", user.id, user.name);
//!         }
//!     } else {
//!         // status is 0 when the server was never reached
//!         eprintln!("{} {}", response.status, response.message);
//!     }
//!
//!     let created = client
//!         .post("/users", RequestParams::new().field("name", json!("Alice")))
//!         .await;
//!     println!("Created in {:?}", created.metadata.processing_time);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Call pipeline
//!
//! 1. The request interceptor runs: the call's own if it has one, the
//!    client's otherwise.
//! 2. The [`Transport`] sends the request; the outcome is normalized.
//! 3. On first attempts only, the `*` status listener runs, then the one
//!    registered for the exact status. The latter may replace the envelope.
//! 4. The response interceptor runs with the final envelope.
//!
//! [`Client::retry`] replays a request from its envelope's metadata with the
//! retry count incremented, so status listeners can retry without looping.
//!
//! ## Errors
//!
//! Calls never return an error. Listeners and interceptors are not guarded:
//! a panic inside one unwinds to whoever awaited the call.
//!
//! ```no_run
//! use fetchwrap::{Client, RequestParams, StatusKey};
//!
//! # async fn example() -> Result<(), fetchwrap::Error> {
//! let client = Client::builder().base_path("https://api.example.com").build()?;
//!
//! client.on_status(StatusKey::Any, |_, response| async move {
//!     tracing::info!(status = response.status, "response");
//!     None
//! });
//!
//! let response = client.get("/endpoint", RequestParams::new()).await;
//! match response.status {
//!     0 => eprintln!("Network failure: {}", response.message),
//!     200..=299 => println!("Success: {:?}", response.data),
//!     status => eprintln!("HTTP error {}: {:?}", status, response.data),
//! }
//! # Ok(())
//! # }
//! ```

mod auth;
mod client;
mod error;
mod headers;
pub mod listener;
pub mod metadata;
pub mod request;
mod response;
pub mod transport;

pub use auth::{Auth, CredentialStore, DEFAULT_AUTH_HEADER};
pub use client::{Client, ClientBuilder, ClientConfig};
pub use error::{Error, Result};
pub use headers::Headers;
pub use listener::StatusKey;
pub use metadata::{Metadata, RequestInfo};
pub use request::{
    Body, Credentials, FormData, Mode, RequestOptions, RequestParams, ResponseType, WireBody,
};
pub use response::{Data, ResponseEnvelope};
pub use transport::{ReqwestTransport, Transport, TransportResponse};
