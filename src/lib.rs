//! AM2301/DHT22 Sensor Driver for Embedded Rust
//!
//! This crate provides a platform-agnostic driver for AM2301/DHT22-class
//! (AM2302, DHT21) temperature and humidity sensors, built on top of the
//! [`embedded-hal`] traits.
//!
//! The sensor speaks a single-wire protocol with no UART or timer capture
//! assistance: the driver recovers each of the 40 data bits by busy-polling
//! the line and comparing the measured low and high pulse widths. Because the
//! timing margins are in the tens of microseconds, the handshake and bit
//! transfer run inside a [`critical_section`] scope so preemption cannot
//! corrupt the measurements.
//!
//! # Features
//! - Blocking synchronous API using `embedded-hal` traits
//! - Designed for `no_std` environments
//! - Typed errors identifying the failed handshake phase or bit index
//! - Optional logging support via `defmt`
//!
//! # Dependencies
//! This driver depends on the following `embedded-hal` traits:
//! - [`InputPin`] and [`OutputPin`] for GPIO access; the data line must be an
//!   open-drain pin with a pull-up, so that driving it high releases the line
//! - [`DelayNs`] for microsecond-accurate busy waits
//!
//! A [`critical_section`] implementation must be provided by the target
//! platform (for example by the HAL crate's `critical-section-impl` feature).
//!
//! # Optional Features
//! - `defmt`: Implements `defmt::Format` for logging support
//!
//! [`embedded-hal`]: https://docs.rs/embedded-hal
//! [`InputPin`]: embedded_hal::digital::InputPin
//! [`OutputPin`]: embedded_hal::digital::OutputPin
//! [`DelayNs`]: embedded_hal::delay::DelayNs

#![cfg_attr(not(test), no_std)]

pub mod am2301;
pub mod error;

pub use am2301::{
    Am2301, ChannelReading, Channels, MIN_SAMPLE_INTERVAL_MS, RawReading, Reading,
};
pub use error::{DhtError, HandshakePhase};
