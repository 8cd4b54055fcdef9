//! LoRa modem configuration registers
//!
//! Bandwidth, coding rate and spreading factor are split across the three modem
//! configuration registers. Transmitter and receiver must agree on all three.
//!
//! Configuration 1 and 2 carry fields the driver does not manage (header mode,
//! CRC, symbol timeout) so they are updated read-modify-write.

use core::convert::Infallible;

use regiface::{register, FromByteArray, ReadableRegister, ToByteArray, WritableRegister};

/// Error type for modem configuration fields holding a reserved encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InvalidModemConfig(pub u8);

/// Signal bandwidth (ModemConfig1 bits 7:4)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Bandwidth {
    Khz7_8 = 0,
    Khz10_4 = 1,
    Khz15_6 = 2,
    Khz20_8 = 3,
    Khz31_25 = 4,
    Khz41_7 = 5,
    Khz62_5 = 6,
    Khz125 = 7,
    Khz250 = 8,
    Khz500 = 9,
}

impl Bandwidth {
    /// Bandwidth in Hz
    pub fn as_hz(self) -> u32 {
        match self {
            Self::Khz7_8 => 7_800,
            Self::Khz10_4 => 10_400,
            Self::Khz15_6 => 15_600,
            Self::Khz20_8 => 20_800,
            Self::Khz31_25 => 31_250,
            Self::Khz41_7 => 41_700,
            Self::Khz62_5 => 62_500,
            Self::Khz125 => 125_000,
            Self::Khz250 => 250_000,
            Self::Khz500 => 500_000,
        }
    }
}

impl TryFrom<u8> for Bandwidth {
    type Error = InvalidModemConfig;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Khz7_8),
            1 => Ok(Self::Khz10_4),
            2 => Ok(Self::Khz15_6),
            3 => Ok(Self::Khz20_8),
            4 => Ok(Self::Khz31_25),
            5 => Ok(Self::Khz41_7),
            6 => Ok(Self::Khz62_5),
            7 => Ok(Self::Khz125),
            8 => Ok(Self::Khz250),
            9 => Ok(Self::Khz500),
            invalid => Err(InvalidModemConfig(invalid)),
        }
    }
}

/// Error coding rate (ModemConfig1 bits 3:1)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CodingRate {
    /// 4/5
    Cr4_5 = 1,
    /// 4/6
    Cr4_6 = 2,
    /// 4/7
    Cr4_7 = 3,
    /// 4/8
    Cr4_8 = 4,
}

impl TryFrom<u8> for CodingRate {
    type Error = InvalidModemConfig;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Cr4_5),
            2 => Ok(Self::Cr4_6),
            3 => Ok(Self::Cr4_7),
            4 => Ok(Self::Cr4_8),
            invalid => Err(InvalidModemConfig(invalid)),
        }
    }
}

/// Spreading factor (ModemConfig2 bits 7:4), in chips per symbol as a power of two
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpreadingFactor {
    Sf6 = 6,
    Sf7 = 7,
    Sf8 = 8,
    Sf9 = 9,
    Sf10 = 10,
    Sf11 = 11,
    Sf12 = 12,
}

impl TryFrom<u8> for SpreadingFactor {
    type Error = InvalidModemConfig;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            6 => Ok(Self::Sf6),
            7 => Ok(Self::Sf7),
            8 => Ok(Self::Sf8),
            9 => Ok(Self::Sf9),
            10 => Ok(Self::Sf10),
            11 => Ok(Self::Sf11),
            12 => Ok(Self::Sf12),
            invalid => Err(InvalidModemConfig(invalid)),
        }
    }
}

/// Modem configuration 1 register (address: 0x1D)
///
/// Reset value 0x72: 125 kHz, coding rate 4/5, explicit header.
#[register(0x1Du8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ModemConfig1 {
    /// Signal bandwidth
    pub bandwidth: Bandwidth,
    /// Error coding rate
    pub coding_rate: CodingRate,
    /// Implicit header mode (no length/CR/CRC header on air)
    pub implicit_header: bool,
}

/// Modem configuration 2 register (address: 0x1E)
///
/// Reset value 0x70: SF7, normal packet mode, payload CRC off.
#[register(0x1Eu8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ModemConfig2 {
    /// Spreading factor
    pub spreading_factor: SpreadingFactor,
    /// Send the FIFO content continuously (spectral analysis only)
    pub tx_continuous: bool,
    /// Generate and check a payload CRC
    pub rx_payload_crc: bool,
    /// RX timeout most significant bits (bits 1:0)
    pub symb_timeout_msb: u8,
}

/// Modem configuration 3 register (address: 0x26)
#[register(0x26u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ReadableRegister, WritableRegister)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ModemConfig3 {
    /// Mandatory when the symbol length exceeds 16 ms
    pub low_data_rate_optimize: bool,
    /// LNA gain set by the internal AGC loop instead of [`Lna`](crate::Lna)
    pub agc_auto: bool,
}

impl FromByteArray for ModemConfig1 {
    type Error = InvalidModemConfig;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            bandwidth: Bandwidth::try_from(bytes[0] >> 4)?,
            coding_rate: CodingRate::try_from((bytes[0] >> 1) & 0x07)?,
            implicit_header: bytes[0] & 0x01 != 0,
        })
    }
}

impl ToByteArray for ModemConfig1 {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([(self.bandwidth as u8) << 4
            | (self.coding_rate as u8) << 1
            | self.implicit_header as u8])
    }
}

impl FromByteArray for ModemConfig2 {
    type Error = InvalidModemConfig;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            spreading_factor: SpreadingFactor::try_from(bytes[0] >> 4)?,
            tx_continuous: bytes[0] & 0x08 != 0,
            rx_payload_crc: bytes[0] & 0x04 != 0,
            symb_timeout_msb: bytes[0] & 0x03,
        })
    }
}

impl ToByteArray for ModemConfig2 {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([(self.spreading_factor as u8) << 4
            | (self.tx_continuous as u8) << 3
            | (self.rx_payload_crc as u8) << 2
            | (self.symb_timeout_msb & 0x03)])
    }
}

impl FromByteArray for ModemConfig3 {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            low_data_rate_optimize: bytes[0] & 0x08 != 0,
            agc_auto: bytes[0] & 0x04 != 0,
        })
    }
}

impl ToByteArray for ModemConfig3 {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([(self.low_data_rate_optimize as u8) << 3 | (self.agc_auto as u8) << 2])
    }
}
