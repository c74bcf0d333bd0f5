//! Run the webcam controller against a live endpoint.
//!
//! Usage: `cargo run --example webcam -- <host> [port]`

use std::sync::Arc;
use webcam_mode::{WebcamController, XapiGateway};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let mut args = std::env::args().skip(1);
    let host = args.next().unwrap_or_else(|| {
        eprintln!("Usage: webcam <host> [port]");
        std::process::exit(2);
    });
    let port: u16 = args.next().as_deref().unwrap_or("80").parse()?;

    let gateway = Arc::new(XapiGateway::connect(host, port).await?);
    gateway.subscribe_webcam_feedback().await?;

    let events = gateway.events();
    let mut controller = WebcamController::new(gateway);
    controller.run(events).await?;
    Ok(())
}
