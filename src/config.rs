//! Radio configuration
//!
//! [`RadioConfig`] holds every setting [`Radio::initialize`](crate::Radio::initialize)
//! programs into the chip. The defaults match the link-quality experiment: a long
//! range, low data rate link at 433 MHz.

use crate::{Bandwidth, CodingRate, SpreadingFactor};

/// Settings applied during initialization.
///
/// Transmitter and receiver must share frequency, bandwidth, coding rate and
/// spreading factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RadioConfig {
    /// Carrier frequency in Hz
    pub frequency_hz: u32,
    /// Output power on PA_BOOST in dBm, clamped to 2..=17
    pub tx_power_dbm: u8,
    /// Signal bandwidth
    pub bandwidth: Bandwidth,
    /// Error coding rate
    pub coding_rate: CodingRate,
    /// Spreading factor
    pub spreading_factor: SpreadingFactor,
    /// Raise LNA current on the high frequency port
    pub lna_boost: bool,
    /// Let the AGC loop pick the LNA gain
    pub agc_auto: bool,
    /// Upper bound for the TX done poll in milliseconds
    pub tx_timeout_ms: u32,
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            frequency_hz: 433_000_000,
            tx_power_dbm: 10,
            bandwidth: Bandwidth::Khz125,
            coding_rate: CodingRate::Cr4_8,
            spreading_factor: SpreadingFactor::Sf12,
            lna_boost: true,
            agc_auto: true,
            tx_timeout_ms: 5_000,
        }
    }
}
