//! Rust library that turns a video-conferencing endpoint into a dedicated
//! webcam source
//!
//! This library connects to an endpoint's JSON-RPC WebSocket API and runs a
//! reactive controller that pins full-screen self-view to the highest-numbered
//! video output, so an HDMI capture device on that output can be used as a
//! webcam in an online meeting. While the operator-enabled "Universal Join"
//! mode is active it also:
//!
//! - Re-asserts full-screen self-view whenever the device drifts away from it
//! - Starts/stops local presentation sharing with the PC input's signal state
//! - Starts presentation when a call connects, prompting for a conference id
//!   (sent as DTMF) when the call matches the operator's dialed number
//! - Periodically resets the standby timer so the unit never sleeps
//!
//! A small dial workflow lets the operator store a phone number from an
//! on-screen panel and place an audio call to it.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use webcam_mode::{WebcamController, XapiGateway};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let gateway = Arc::new(XapiGateway::connect("192.168.1.50", 80).await?);
//!     gateway.subscribe_webcam_feedback().await?;
//!
//!     let events = gateway.events();
//!     let mut controller = WebcamController::new(gateway);
//!     controller.run(events).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - **Controller**: the reactive core reacting to device events
//! - **Topology**: one-shot resolution of the presentation input and capture output
//! - **Gateway**: the device operations the controller invokes, as a trait
//! - **Events**: typed feedback notifications
//! - **Connection**: low-level JSON-RPC WebSocket handling
//! - **Protocol**: JSON-RPC message structures

mod connection;
mod controller;
mod error;
mod events;
mod gateway;
mod keepalive;
mod protocol;
mod topology;
mod types;

// Public exports
pub use controller::WebcamController;
pub use error::{Result, WebcamError};
pub use events::{DeviceEvent, EventReceiver};
pub use gateway::{DeviceGateway, XapiGateway};
pub use topology::resolve as resolve_topology;
pub use types::{CallInfo, ConnectorInfo, OutputRole, SignalState, Topology};
