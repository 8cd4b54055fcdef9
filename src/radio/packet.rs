//! Packet framing over the chip FIFO
//!
//! An outbound packet is assembled by [`Radio::begin_packet`] followed by any
//! number of [`Radio::write_packet`] calls. The payload length register is the
//! running total of staged bytes and is never allowed past [`MAX_PKT_LENGTH`].

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiDevice;

use super::Radio;
use crate::{Error, FifoAddrPtr, FifoData, PayloadLength};

/// Largest payload the chip will send, bounded by the one-byte length register
pub const MAX_PKT_LENGTH: usize = 255;

/// Number of bytes staged by one [`Radio::write_packet`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WriteOutcome {
    /// Every requested byte was staged
    Complete(usize),
    /// The FIFO filled up; only `written` of `requested` bytes were staged
    Truncated {
        /// Bytes staged
        written: usize,
        /// Bytes passed in
        requested: usize,
    },
}

impl WriteOutcome {
    /// Bytes actually staged
    pub fn written(&self) -> usize {
        match *self {
            Self::Complete(written) | Self::Truncated { written, .. } => written,
        }
    }

    /// True when part of the payload was dropped
    pub fn is_truncated(&self) -> bool {
        matches!(self, Self::Truncated { .. })
    }
}

impl<SPI, RESET, DELAY> Radio<SPI, RESET, DELAY>
where
    SPI: SpiDevice,
    RESET: OutputPin,
    DELAY: DelayNs,
{
    /// Starts a new outbound packet.
    ///
    /// Forces standby, then rewinds the FIFO pointer and clears the payload length.
    pub fn begin_packet(&mut self) -> Result<(), Error> {
        self.enter_standby()?;

        self.device.write_register(FifoAddrPtr { address: 0 })?;
        self.device.write_register(PayloadLength { length: 0 })
    }

    /// Appends `payload` to the packet being staged.
    ///
    /// Bytes that would take the packet past [`MAX_PKT_LENGTH`] are dropped and
    /// reported through [`WriteOutcome::Truncated`].
    pub fn write_packet(&mut self, payload: &[u8]) -> Result<WriteOutcome, Error> {
        let current = self.device.read_register::<PayloadLength>()?.length as usize;
        let room = MAX_PKT_LENGTH.saturating_sub(current);
        let count = payload.len().min(room);

        for &value in &payload[..count] {
            self.device.write_register(FifoData { value })?;
        }

        // current + count <= MAX_PKT_LENGTH
        self.device.write_register(PayloadLength {
            length: (current + count) as u8,
        })?;

        if count < payload.len() {
            #[cfg(feature = "defmt")]
            defmt::warn!(
                "packet truncated: {} of {} bytes staged",
                count,
                payload.len()
            );
            Ok(WriteOutcome::Truncated {
                written: count,
                requested: payload.len(),
            })
        } else {
            Ok(WriteOutcome::Complete(count))
        }
    }
}
