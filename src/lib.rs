//! # Rect Client
//!
//! **Pure-Rust client library for the Rect embedded peripheral board.**
//!
//! A Rect board exposes its peripherals (GPIO, UART, SPI, I2C, ADC, PWM,
//! file storage, RTC) through a small HTTP-style command endpoint. This crate
//! builds validated peripheral actions, wraps them in an event envelope
//! (fire-now, scheduled, or pin-state-triggered), and exchanges the resulting
//! JSON payload with the board over a minimal blocking TCP transport.
//!
//! ## Quickstart
//!
//! ```no_run
//! use std::net::Ipv4Addr;
//!
//! use rect_client::{Action, Event, GpioDirection, GpioValue, RectClient};
//!
//! fn main() -> Result<(), rect_client::RectError> {
//!     let client = RectClient::new(Ipv4Addr::new(10, 0, 0, 100));
//!
//!     let mut event = Event::now();
//!     event.add_action(Action::gpio(0, GpioDirection::Output, GpioValue::High)?);
//!
//!     let reply = client.submit_hardware_operation(&event)?;
//!     println!("board replied: {reply}");
//!     Ok(())
//! }
//! ```
//!
//! Architecture layers:
//! - transport
//! - envelope
//! - command builders
//! - high-level client

#![warn(missing_docs)]

/// High-level blocking client and request/response convenience methods.
pub mod client;
/// Validated peripheral action builders and their wire encodings.
pub mod commands;
/// Event envelope, schedules, and return targets.
pub mod envelope;
/// Error types returned by this crate.
pub mod error;
/// Minimal request/response transport over raw TCP.
///
/// Most applications should not need to use this module directly.
pub mod transport;

pub use crate::client::{ClientBuilder, RectClient};
pub use crate::commands::{
    Action, AdcReference, BitOrder, GpioDirection, GpioValue, I2cSpeed, SpiMode, SpiSpeed,
    UartBaudRate, UartParity,
};
pub use crate::envelope::{
    DateTime, Event, Interval, ReturnTarget, Schedule, TimeUnit, Trigger,
};
pub use crate::error::RectError;
