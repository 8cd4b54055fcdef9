//! Sequence-numbered experiment packets
//!
//! The transmitter numbers its packets 1, 2, 3, ... and sends each number as a
//! two byte little-endian payload. The receiver uses the last number it saw to
//! estimate how many packets were sent.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiDevice;

use crate::{Error, Radio};

/// Payload length of an experiment packet
pub const SEQUENCE_PAYLOAD_LEN: usize = 2;

/// Sender-assigned packet number
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SequenceNumber(pub u16);

impl SequenceNumber {
    /// Wire encoding
    pub fn to_bytes(self) -> [u8; SEQUENCE_PAYLOAD_LEN] {
        self.0.to_le_bytes()
    }

    /// Decodes a payload. Anything other than exactly two bytes is not an
    /// experiment packet.
    pub fn from_payload(payload: &[u8]) -> Option<Self> {
        let bytes: [u8; SEQUENCE_PAYLOAD_LEN] = payload.try_into().ok()?;
        Some(Self(u16::from_le_bytes(bytes)))
    }
}

/// Transmitter half of the experiment
#[derive(Debug, Clone, Default)]
pub struct SequenceTransmitter {
    last: u16,
}

impl SequenceTransmitter {
    /// Transmitter whose first packet is number 1
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of the last packet sent, 0 before the first
    pub fn last(&self) -> u16 {
        self.last
    }

    /// Sends the next numbered packet and returns its number.
    ///
    /// The counter wraps after 65535 and only advances when the transmission
    /// completed.
    pub fn send_next<SPI, RESET, DELAY>(
        &mut self,
        radio: &mut Radio<SPI, RESET, DELAY>,
    ) -> Result<SequenceNumber, Error>
    where
        SPI: SpiDevice,
        RESET: OutputPin,
        DELAY: DelayNs,
    {
        let next = SequenceNumber(self.last.wrapping_add(1));

        radio.begin_transmit(&next.to_bytes())?;
        self.last = next.0;

        Ok(next)
    }
}
