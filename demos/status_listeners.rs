//! Status listeners, interceptors and manual retry.
//!
//! A 503 listener retries the request once. The retry re-sends the original
//! request and does not trigger the listener again, so a server that keeps
//! answering 503 ends the call after two attempts.
//!
//! Run with: `cargo run --example status_listeners`

use fetchwrap::{Auth, Client, Error, RequestParams, StatusKey};
use http::StatusCode;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter("fetchwrap=debug,status_listeners=info")
        .init();

    let client = Client::builder()
        .base_path("https://httpbin.org")
        .auth(Auth::bearer("demo-token"))
        .on_request(|info| println!("-> {} ({})", info.request_name, info.response_type))
        .on_response(|response| {
            println!(
                "<- {} {} in {:?} (retry {})",
                response.status,
                response.message,
                response.metadata.processing_time,
                response.metadata.retry_count
            )
        })
        .build()?;

    client.on_status(StatusKey::Any, |_, response| async move {
        println!("   any listener saw {}", response.status);
        None
    });

    client.on_status(StatusCode::SERVICE_UNAVAILABLE, |client: Client, response| async move {
        println!("   retrying {}", response.metadata.request_name);
        Some(client.retry(&response).await)
    });

    let response = client.get("/status/503", RequestParams::new()).await;
    println!(
        "final: success={} status={} retried={}",
        response.success,
        response.status,
        response.was_retried()
    );

    Ok(())
}
