//! Operating mode, interrupt and identification registers
//!
//! This module contains the registers that describe the chip's state:
//! - Operating mode selection (LoRa page, sleep/standby/TX/RX)
//! - Interrupt request flags raised by the packet engine
//! - Silicon version
//!
//! The IRQ flag register is write-one-to-clear: writing back a value read from it
//! acknowledges exactly the flags that were observed.

use bitflags::bitflags;
use core::convert::Infallible;

use regiface::{register, FromByteArray, ReadableRegister, ToByteArray, WritableRegister};

/// Transceiver mode field of the operating mode register (bits 2:0)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceMode {
    /// Lowest power mode, only SPI and configuration registers accessible.
    /// FIFO content is lost when entering sleep.
    Sleep = 0x0,
    /// Crystal oscillator running, FIFO and configuration accessible
    Standby = 0x1,
    /// Frequency synthesis for transmit
    FsTx = 0x2,
    /// Transmit the FIFO content, then fall back to standby
    Tx = 0x3,
    /// Frequency synthesis for receive
    FsRx = 0x4,
    /// Receive continuously until told otherwise
    RxContinuous = 0x5,
    /// Receive a single packet
    RxSingle = 0x6,
    /// Channel activity detection
    Cad = 0x7,
}

impl From<u8> for DeviceMode {
    fn from(value: u8) -> Self {
        match value & 0x07 {
            0x0 => Self::Sleep,
            0x1 => Self::Standby,
            0x2 => Self::FsTx,
            0x3 => Self::Tx,
            0x4 => Self::FsRx,
            0x5 => Self::RxContinuous,
            0x6 => Self::RxSingle,
            _ => Self::Cad,
        }
    }
}

/// Operating mode register (address: 0x01)
///
/// Selects the modem page and the transceiver mode.
///
/// # Important Notes
/// - `long_range` (LoRa page) can only be changed while in [`DeviceMode::Sleep`]
/// - The reset value selects the FSK page with the low-frequency bit set (0x09)
/// - The driver always writes the LoRa page with the low-frequency bit cleared
#[register(0x01u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OpMode {
    /// LoRa modem page selected
    pub long_range: bool,
    /// Low frequency (below 525 MHz) register bank selected
    pub low_frequency: bool,
    /// Transceiver mode
    pub mode: DeviceMode,
}

impl OpMode {
    /// Operating mode value with the LoRa page selected
    pub fn lora(mode: DeviceMode) -> Self {
        Self {
            long_range: true,
            low_frequency: false,
            mode,
        }
    }
}

bitflags! {
    /// Interrupt request flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Irq: u8 {
        /// Receive timed out before a preamble was detected
        const RX_TIMEOUT = 1 << 7;
        /// Packet reception complete
        const RX_DONE = 1 << 6;
        /// Payload CRC check failed
        const PAYLOAD_CRC_ERROR = 1 << 5;
        /// Valid header received in explicit header mode
        const VALID_HEADER = 1 << 4;
        /// FIFO payload transmission complete
        const TX_DONE = 1 << 3;
        /// Channel activity detection finished
        const CAD_DONE = 1 << 2;
        /// Frequency hopping channel change
        const FHSS_CHANGE_CHANNEL = 1 << 1;
        /// Channel activity detected
        const CAD_DETECTED = 1;
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Irq {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "Irq({=u8:#04x})", self.bits())
    }
}

/// IRQ flags register (address: 0x12)
///
/// Flags are set by the packet engine and cleared by writing a one to the
/// corresponding bit.
#[register(0x12u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IrqFlags {
    /// Raised interrupt flags
    pub irq: Irq,
}

impl IrqFlags {
    /// True when a packet arrived and passed its CRC check
    pub fn rx_delivered(&self) -> bool {
        self.irq.contains(Irq::RX_DONE) && !self.irq.contains(Irq::PAYLOAD_CRC_ERROR)
    }

    /// True when a packet arrived with a failed CRC check
    pub fn rx_corrupted(&self) -> bool {
        self.irq.contains(Irq::RX_DONE | Irq::PAYLOAD_CRC_ERROR)
    }

    /// True when the FIFO content was transmitted
    pub fn tx_done(&self) -> bool {
        self.irq.contains(Irq::TX_DONE)
    }
}

/// Silicon version register (address: 0x42)
///
/// Reads 0x12 on production SX1276/7/8 based modules such as the RFM96.
#[register(0x42u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Version {
    /// Full revision in the high nibble, metal mask revision in the low nibble
    pub value: u8,
}

impl FromByteArray for OpMode {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            long_range: bytes[0] & 0x80 != 0,
            low_frequency: bytes[0] & 0x08 != 0,
            mode: DeviceMode::from(bytes[0]),
        })
    }
}

impl ToByteArray for OpMode {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        let mut value = self.mode as u8;
        if self.long_range {
            value |= 0x80;
        }
        if self.low_frequency {
            value |= 0x08;
        }
        Ok([value])
    }
}

impl FromByteArray for IrqFlags {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            irq: Irq::from_bits_retain(bytes[0]),
        })
    }
}

impl ToByteArray for IrqFlags {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([self.irq.bits()])
    }
}

impl FromByteArray for Version {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self { value: bytes[0] })
    }
}
