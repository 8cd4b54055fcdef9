//! RF-related registers
//!
//! This module contains registers related to RF configuration including:
//! - Carrier frequency synthesis
//! - Power amplifier selection and output power
//! - Low noise amplifier gain and boost

use core::convert::Infallible;

use regiface::{register, FromByteArray, ReadableRegister, ToByteArray, WritableRegister};

/// Crystal oscillator frequency of the RFM96 module
pub const FXOSC_HZ: u64 = 32_000_000;

/// Carrier frequency registers (addresses: 0x06 - 0x08)
///
/// 24-bit synthesizer word, most significant byte first. The carrier
/// frequency is `frf * FXOSC / 2^19`.
///
/// # Important Notes
/// - Only written in sleep or standby mode
/// - The synthesizer latches the new value when the LSB (0x08) is written
#[register(0x06u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CarrierFrequency {
    /// Synthesizer word (24 significant bits)
    pub frf: u32,
}

impl CarrierFrequency {
    /// Synthesizer word for a carrier frequency in Hz
    pub fn from_hz(frequency_hz: u32) -> Self {
        Self {
            frf: (((frequency_hz as u64) << 19) / FXOSC_HZ) as u32 & 0x00FF_FFFF,
        }
    }

    /// Carrier frequency in Hz, rounded down to the synthesizer step
    pub fn to_hz(self) -> u32 {
        ((self.frf as u64 * FXOSC_HZ) >> 19) as u32
    }
}

/// Power amplifier configuration register (address: 0x09)
///
/// # Output Power
/// - RFO pin: Pout = Pmax - (15 - output_power), Pmax = 10.8 + 0.6 * max_power
/// - PA_BOOST pin: Pout = 17 - (15 - output_power)
///
/// RFM96 modules only route the PA_BOOST pin to the antenna.
#[register(0x09u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PaConfig {
    /// Output on the PA_BOOST pin instead of RFO
    pub pa_boost: bool,
    /// Maximum power selection for the RFO pin (bits 6:4)
    pub max_power: u8,
    /// Output power setting (bits 3:0)
    pub output_power: u8,
}

impl PaConfig {
    /// PA_BOOST configuration for the requested output power in dBm.
    ///
    /// The power is clamped to the 2..=17 dBm range of the PA_BOOST pin.
    pub fn pa_boost_dbm(power_dbm: u8) -> Self {
        Self {
            pa_boost: true,
            max_power: 0,
            output_power: power_dbm.clamp(2, 17) - 2,
        }
    }
}

/// Low noise amplifier register (address: 0x0C)
#[register(0x0Cu8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Lna {
    /// LNA gain setting (bits 7:5), 1 = maximum gain
    pub gain: u8,
    /// Low frequency port current adjustment (bits 4:3)
    pub boost_lf: u8,
    /// High frequency port current adjustment (bits 1:0), 0b11 = 150% current
    pub boost_hf: u8,
}

impl Lna {
    /// Same setting with the high frequency boost enabled
    pub fn with_boost(self) -> Self {
        Self {
            boost_hf: 0b11,
            ..self
        }
    }
}

impl FromByteArray for CarrierFrequency {
    type Error = Infallible;
    type Array = [u8; 3];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            frf: u32::from_be_bytes([0, bytes[0], bytes[1], bytes[2]]),
        })
    }
}

impl ToByteArray for CarrierFrequency {
    type Error = Infallible;
    type Array = [u8; 3];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        let bytes = self.frf.to_be_bytes();
        Ok([bytes[1], bytes[2], bytes[3]])
    }
}

impl FromByteArray for PaConfig {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            pa_boost: bytes[0] & 0x80 != 0,
            max_power: (bytes[0] >> 4) & 0x07,
            output_power: bytes[0] & 0x0F,
        })
    }
}

impl ToByteArray for PaConfig {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        let pa_select = if self.pa_boost { 0x80 } else { 0x00 };
        Ok([pa_select | (self.max_power & 0x07) << 4 | (self.output_power & 0x0F)])
    }
}

impl FromByteArray for Lna {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            gain: bytes[0] >> 5,
            boost_lf: (bytes[0] >> 3) & 0x03,
            boost_hf: bytes[0] & 0x03,
        })
    }
}

impl ToByteArray for Lna {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([(self.gain & 0x07) << 5 | (self.boost_lf & 0x03) << 3 | (self.boost_hf & 0x03)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frequency_word_for_433_mhz() {
        let frf = CarrierFrequency::from_hz(433_000_000);
        assert_eq!(frf.frf, 0x6C_4000);
        assert_eq!(frf.to_bytes(), Ok([0x6C, 0x40, 0x00]));
        assert_eq!(frf.to_hz(), 433_000_000);
    }

    #[test]
    fn pa_boost_power_is_offset_and_clamped() {
        assert_eq!(PaConfig::pa_boost_dbm(10).to_bytes(), Ok([0x88]));
        assert_eq!(PaConfig::pa_boost_dbm(0).output_power, 0);
        assert_eq!(PaConfig::pa_boost_dbm(20).output_power, 15);
    }

    #[test]
    fn lna_boost_preserves_gain() {
        let lna = Lna::from_bytes([0x20]).unwrap().with_boost();
        assert_eq!(lna.to_bytes(), Ok([0x23]));
    }
}
