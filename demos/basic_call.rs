//! Basic example demonstrating simple GET and POST requests.
//!
//! This example shows how to:
//! - Create a client with a base path
//! - Make GET requests and read typed data out of the envelope
//! - Make POST requests whose fields form the JSON body
//! - Tell transport failures from HTTP errors
//!
//! Run with: `cargo run --example basic_call`

use fetchwrap::{Client, Error, RequestParams};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct Post {
    #[serde(rename = "userId")]
    user_id: u32,
    id: u32,
    title: String,
    body: String,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_env_filter("fetchwrap=debug,basic_call=info")
        .init();

    let client = Client::builder()
        .base_path("https://jsonplaceholder.typicode.com")
        .build()?;

    println!("=== GET Request Example ===");
    let response = client.get("/posts/1", RequestParams::new()).await;
    println!("Status: {} {}", response.status, response.message);
    println!("Request name: {}", response.metadata.request_name);
    println!("Processing time: {:?}", response.metadata.processing_time);
    if let Some(post) = response.json::<Post>().data {
        println!("Title: {}", post.title);
    }
    println!();

    println!("=== POST Request Example ===");
    let response = client
        .post(
            "/posts",
            RequestParams::new()
                .field("title", json!("My New Post"))
                .field("body", json!("This is the content of my new post!"))
                .field("userId", json!(1)),
        )
        .await;
    println!("Status: {}", response.status);
    println!("Content-Type: {:?}", response.header("content-type"));
    println!("Data: {:?}", response.data);
    println!();

    println!("=== Transport Failure Example ===");
    let response = client
        .get("http://127.0.0.1:1/unreachable", RequestParams::new())
        .await;
    println!("success={} status={}", response.success, response.status);
    println!("message: {}", response.message);

    Ok(())
}
