//! Driver error type

use embedded_hal::{digital, spi};

use crate::radio::Mode;

/// Errors reported by the register protocol and the radio state machine.
///
/// Nothing in the driver retries on its own; every variant is handed to the
/// caller to decide whether to continue, abort or restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The SPI transport failed to complete a register exchange
    Bus(spi::ErrorKind),
    /// The reset line or a confirmation input could not be driven or sampled
    Pin(digital::ErrorKind),
    /// A register held a reserved encoding
    Deserialization,
    /// A configuration register did not read back the value written during
    /// initialization
    ConfigurationFailure {
        /// Register address
        address: u8,
        /// Value written
        expected: u8,
        /// Value read back
        found: u8,
    },
    /// TX done was not raised within the configured transmit timeout
    TransmitTimeout,
    /// The operation is not valid from the current mode
    InvalidMode {
        /// Mode the operation requires
        expected: Mode,
        /// Mode the driver was in, `None` before initialization
        actual: Option<Mode>,
    },
    /// A delivered packet does not fit the receive buffer. The packet is
    /// dropped and the chip left in standby.
    BufferTooSmall {
        /// Reported payload length
        needed: usize,
        /// Receive buffer length
        available: usize,
    },
}
