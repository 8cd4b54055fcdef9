//! Confirmation input
//!
//! The experiment is driven by a single push button. A press is classified by
//! how long the button was held.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{Error as _, InputPin};

use crate::Error;

/// Hold time at which a press counts as long, in milliseconds
pub const LONG_PRESS_MS: u32 = 500;

const POLL_INTERVAL_MS: u32 = 1;

/// A completed confirmation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Press {
    Short,
    Long,
}

impl Press {
    /// Classifies a press by hold time.
    pub fn from_hold_ms(held_ms: u32) -> Self {
        if held_ms >= LONG_PRESS_MS {
            Self::Long
        } else {
            Self::Short
        }
    }
}

/// Source of confirmations for the experiment controller
pub trait Confirmation {
    /// Blocks until the next confirmation completes.
    fn wait_press(&mut self) -> Result<Press, Error>;
}

/// Active-high push button sampled once per millisecond
pub struct ButtonInput<PIN, DELAY> {
    pin: PIN,
    delay: DELAY,
}

impl<PIN, DELAY> ButtonInput<PIN, DELAY> {
    pub fn new(pin: PIN, delay: DELAY) -> Self {
        Self { pin, delay }
    }

    pub fn release(self) -> (PIN, DELAY) {
        (self.pin, self.delay)
    }
}

impl<PIN, DELAY> ButtonInput<PIN, DELAY>
where
    PIN: InputPin,
    DELAY: DelayNs,
{
    /// Waits for the button to reach `pressed` and returns the time it took.
    fn wait_level(&mut self, pressed: bool) -> Result<u32, Error> {
        let mut elapsed_ms: u32 = 0;

        while self.pin.is_high().map_err(|e| Error::Pin(e.kind()))? != pressed {
            self.delay.delay_ms(POLL_INTERVAL_MS);
            elapsed_ms = elapsed_ms.saturating_add(POLL_INTERVAL_MS);
        }

        Ok(elapsed_ms)
    }
}

impl<PIN, DELAY> Confirmation for ButtonInput<PIN, DELAY>
where
    PIN: InputPin,
    DELAY: DelayNs,
{
    /// Waits for release (a held button does not count), then press, then
    /// release again, and classifies the hold time.
    fn wait_press(&mut self) -> Result<Press, Error> {
        self.wait_level(false)?;
        self.wait_level(true)?;
        let held_ms = self.wait_level(false)?;

        Ok(Press::from_hold_ms(held_ms))
    }
}
