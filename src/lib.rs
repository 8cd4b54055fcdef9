#![no_std]
//! RFM96 LoRa Radio Driver
//!
//! This crate drives the HopeRF RFM96 module, an SX1276-based sub-GHz LoRa
//! transceiver, over SPI, and carries the link-quality experiment built on it.
//!
//! # Features
//! - Typed registers for the LoRa page of the SX1276/7/8
//! - Blocking and async single-register access
//! - Mode state machine: sleep, standby, transmit, single receive
//! - Packet staging with truncation at the 255-byte FIFO limit
//! - RSSI/SNR series with mean, sample variance and standard deviation
//! - Receiver-side experiment controller with a six-glyph readout
//!
//! # Architecture
//! - [`device`]: register transaction protocol over an SPI device
//! - [`registers`]: register definitions for direct hardware access
//! - [`radio`]: initialization and the mode state machine
//! - [`link_quality`]: per-packet telemetry and its statistics
//! - [`display`]: readout formatting for the segment display
//! - [`experiment`]: experiment controller and sequence-numbered packets
//!
//! # Usage
//! Build a [`RadioConfig`], hand it to [`Radio::new`] together with the SPI
//! device, the reset line and a delay source, and call
//! [`Radio::initialize`]. The radio is then in [`Mode::Standby`].
//!
//! ```ignore
//! use rfm96::{Radio, RadioConfig, RxOutcome};
//!
//! let mut radio = Radio::new(spi, reset, delay, RadioConfig::default());
//! radio.initialize()?;
//!
//! radio.begin_transmit(b"ping")?;
//!
//! let mut buffer = [0u8; rfm96::MAX_PKT_LENGTH];
//! loop {
//!     if let RxOutcome::Delivered(length) = radio.poll_receive(&mut buffer)? {
//!         let telemetry = radio.packet_telemetry()?;
//!         // use &buffer[..length] and telemetry
//!     }
//! }
//! ```
//!
//! # Important Notes
//! - The LoRa register page is selected from sleep during initialization
//! - Transmit is only valid from standby
//! - The FIFO address pointer is shared between TX and RX; each operation sets
//!   it before touching the FIFO
//! - Completion is detected by polling IRQ flags; DIO lines are not used

pub mod config;
pub mod device;
pub mod display;
pub mod error;
pub mod experiment;
pub mod link_quality;
pub mod radio;
pub mod registers;

pub use config::RadioConfig;
pub use device::Device;
pub use display::{Display, Readout};
pub use error::Error;
pub use experiment::{
    run_receiver, ButtonInput, Confirmation, Experiment, Phase, Press, Report, ResultPage,
    SequenceNumber, SequenceTransmitter,
};
pub use link_quality::*;
pub use radio::{Mode, Radio, RxOutcome, WriteOutcome, MAX_PKT_LENGTH};
pub use registers::*;
