//! Radio mode state machine
//!
//! [`Radio`] owns the register interface, the hardware reset line and a delay
//! source, and sequences the chip between four modes:
//!
//! ```text
//!            initialize()
//!   (unknown) ----------> Standby <------------------------------+
//!                          |  ^  \                               |
//!          begin_transmit  |  |   \ poll_receive (no flags)      |
//!                          v  |    v                             |
//!                     Transmit    ReceiveSingle --(RX done)------+
//! ```
//!
//! `enter_sleep()` and `enter_standby()` are valid from any mode. Every transition
//! is a single write to the operating mode register, and the tracked [`Mode`]
//! always mirrors the register once a call returns, including on the error
//! paths of transmit and receive.
//!
//! Completion is detected by polling the IRQ flag register; no DIO interrupt
//! line is used.

mod packet;

use core::marker::PhantomData;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{Error as _, OutputPin};
use embedded_hal::spi::SpiDevice;

pub use packet::{WriteOutcome, MAX_PKT_LENGTH};

use crate::{
    CarrierFrequency, Device, DeviceMode, Error, FifoAddrPtr, FifoData, FifoRxBaseAddr,
    FifoRxCurrentAddr, FifoTxBaseAddr, Irq, IrqFlags, Lna, ModemConfig1, ModemConfig2,
    ModemConfig3, OpMode, PaConfig, PacketRssi, PacketSnr, PacketTelemetry, RadioConfig,
    RxNbBytes, Version,
};

/// Reset pulse and recovery time in milliseconds
const RESET_DELAY_MS: u32 = 10;

/// Interval between IRQ flag polls while waiting for TX done
const TX_POLL_INTERVAL_MS: u32 = 1;

/// Operating modes the driver moves the chip between
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// Lowest power, FIFO content lost
    Sleep,
    /// Idle with the oscillator running, FIFO accessible
    Standby,
    /// Sending the FIFO content
    Transmit,
    /// Waiting for a single packet
    ReceiveSingle,
}

impl Mode {
    fn device_mode(self) -> DeviceMode {
        match self {
            Self::Sleep => DeviceMode::Sleep,
            Self::Standby => DeviceMode::Standby,
            Self::Transmit => DeviceMode::Tx,
            Self::ReceiveSingle => DeviceMode::RxSingle,
        }
    }
}

/// Result of one non-blocking receive poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RxOutcome {
    /// No packet has arrived yet; the chip is listening
    Nothing,
    /// A packet arrived with a failed payload CRC and was discarded
    Corrupted,
    /// A packet of the given length was copied into the receive buffer
    Delivered(usize),
}

/// The single owned handle to an RFM96 transceiver.
///
/// The handle is neither `Send` nor `Sync`: the chip keeps one FIFO
/// pointer and one mode for all callers, so interleaved register access from
/// two contexts would corrupt both. Keep exactly one handle per chip and drive it
/// from one thread of control.
pub struct Radio<SPI, RESET, DELAY> {
    device: Device<SPI>,
    reset: RESET,
    delay: DELAY,
    config: RadioConfig,
    mode: Option<Mode>,
    _not_send: PhantomData<*const ()>,
}

impl<SPI, RESET, DELAY> Radio<SPI, RESET, DELAY> {
    /// Creates a handle. The chip is not touched until [`initialize`](Radio::initialize).
    ///
    /// # Arguments
    /// * `spi` - SPI device for the radio, owning the chip select line
    /// * `reset` - Output driving the active-low reset line
    /// * `delay` - Delay source used for reset timing and TX polling
    /// * `config` - Settings programmed during initialization
    pub fn new(spi: SPI, reset: RESET, delay: DELAY, config: RadioConfig) -> Self {
        Self {
            device: Device::new(spi),
            reset,
            delay,
            config,
            mode: None,
            _not_send: PhantomData,
        }
    }

    /// Current mode, `None` until the chip has been initialized
    pub fn mode(&self) -> Option<Mode> {
        self.mode
    }

    /// Settings the handle was created with
    pub fn config(&self) -> &RadioConfig {
        &self.config
    }

    /// Releases the SPI device, reset line and delay source.
    pub fn release(self) -> (SPI, RESET, DELAY) {
        (self.device.release(), self.reset, self.delay)
    }
}

impl<SPI, RESET, DELAY> Radio<SPI, RESET, DELAY>
where
    SPI: SpiDevice,
    RESET: OutputPin,
    DELAY: DelayNs,
{
    /// Resets and configures the chip, leaving it in [`Mode::Standby`].
    ///
    /// The sequence is: reset pulse, sleep (LoRa page), carrier frequency, FIFO
    /// base addresses, LNA boost, AGC, PA power, bandwidth and coding rate,
    /// spreading factor, standby. Both modem configuration registers are read
    /// back afterwards as the health check.
    ///
    /// # Errors
    /// * `Error::Pin` - The reset line could not be driven
    /// * `Error::Bus` - SPI communication failed
    /// * `Error::Deserialization` - A modem register held a reserved encoding
    /// * `Error::ConfigurationFailure` - The modem configuration did not read back
    pub fn initialize(&mut self) -> Result<(), Error> {
        self.mode = None;

        self.reset.set_low().map_err(|e| Error::Pin(e.kind()))?;
        self.delay.delay_ms(RESET_DELAY_MS);
        self.reset.set_high().map_err(|e| Error::Pin(e.kind()))?;
        self.delay.delay_ms(RESET_DELAY_MS);

        // The LoRa page can only be selected from sleep
        self.enter_sleep()?;

        let config = self.config;

        self.device.write_register(CarrierFrequency::from_hz(config.frequency_hz))?;

        self.device.write_register(FifoTxBaseAddr { address: 0 })?;
        self.device.write_register(FifoRxBaseAddr { address: 0 })?;

        if config.lna_boost {
            let lna: Lna = self.device.read_register()?;
            self.device.write_register(lna.with_boost())?;
        }

        self.device.write_register(ModemConfig3 {
            low_data_rate_optimize: false,
            agc_auto: config.agc_auto,
        })?;

        self.device.write_register(PaConfig::pa_boost_dbm(config.tx_power_dbm))?;

        let modem_config_1 = ModemConfig1 {
            bandwidth: config.bandwidth,
            coding_rate: config.coding_rate,
            ..self.device.read_register()?
        };
        self.device.write_register(modem_config_1)?;

        let modem_config_2 = ModemConfig2 {
            spreading_factor: config.spreading_factor,
            ..self.device.read_register()?
        };
        self.device.write_register(modem_config_2)?;

        if let Err(error) = self
            .device
            .verify_register(modem_config_1)
            .and_then(|_| self.device.verify_register(modem_config_2))
        {
            #[cfg(feature = "defmt")]
            defmt::error!("configuration read-back failed: {}", error);
            return Err(error);
        }

        self.enter_standby()
    }

    /// Puts the chip in standby. Valid from any mode.
    pub fn enter_standby(&mut self) -> Result<(), Error> {
        self.set_mode(Mode::Standby)
    }

    /// Puts the chip in sleep. Valid from any mode; the FIFO content is lost.
    pub fn enter_sleep(&mut self) -> Result<(), Error> {
        self.set_mode(Mode::Sleep)
    }

    fn set_mode(&mut self, mode: Mode) -> Result<(), Error> {
        self.device.write_register(OpMode::lora(mode.device_mode()))?;

        #[cfg(feature = "defmt")]
        defmt::debug!("mode {} -> {}", self.mode, mode);

        self.mode = Some(mode);
        Ok(())
    }

    fn require(&self, expected: Mode) -> Result<(), Error> {
        if self.mode == Some(expected) {
            Ok(())
        } else {
            Err(Error::InvalidMode {
                expected,
                actual: self.mode,
            })
        }
    }

    /// Stages `payload` as a new packet and transmits it, blocking until TX done.
    ///
    /// Only valid from [`Mode::Standby`]. Payloads longer than
    /// [`MAX_PKT_LENGTH`] are truncated and the outcome says so; the truncated
    /// packet is still sent.
    ///
    /// # Errors
    /// * `Error::InvalidMode` - The radio is not in standby
    /// * `Error::TransmitTimeout` - TX done was not observed in time
    /// * `Error::Bus` - SPI communication failed
    pub fn begin_transmit(&mut self, payload: &[u8]) -> Result<WriteOutcome, Error> {
        self.require(Mode::Standby)?;

        self.begin_packet()?;
        let outcome = self.write_packet(payload)?;
        self.transmit_staged()?;

        Ok(outcome)
    }

    /// Transmits the packet staged with [`begin_packet`](Radio::begin_packet) and
    /// [`write_packet`](Radio::write_packet), blocking until TX done.
    ///
    /// Clears any TX done flag left from an earlier transmission, then polls the
    /// IRQ flags once per millisecond for at most [`RadioConfig::tx_timeout_ms`].
    /// On success the TX done flag is cleared; on either outcome the radio is
    /// back in [`Mode::Standby`].
    ///
    /// # Errors
    /// * `Error::InvalidMode` - The radio is not in standby
    /// * `Error::TransmitTimeout` - TX done was not observed in time
    /// * `Error::Bus` - SPI communication failed
    pub fn transmit_staged(&mut self) -> Result<(), Error> {
        self.require(Mode::Standby)?;

        self.device.write_register(IrqFlags { irq: Irq::TX_DONE })?;
        self.set_mode(Mode::Transmit)?;

        let mut remaining_ms = self.config.tx_timeout_ms;
        loop {
            let flags: IrqFlags = self.device.read_register()?;

            if flags.tx_done() {
                self.device.write_register(IrqFlags { irq: Irq::TX_DONE })?;
                return self.enter_standby();
            }

            if remaining_ms == 0 {
                #[cfg(feature = "defmt")]
                defmt::warn!("TX done not raised within {} ms", self.config.tx_timeout_ms);
                self.enter_standby()?;
                return Err(Error::TransmitTimeout);
            }

            remaining_ms = remaining_ms.saturating_sub(TX_POLL_INTERVAL_MS);
            self.delay.delay_ms(TX_POLL_INTERVAL_MS);
        }
    }

    /// Checks for a received packet without blocking.
    ///
    /// Every poll acknowledges the IRQ flags it observed. Then:
    /// - RX done without CRC error: the payload is copied into `buffer` from the
    ///   chip-reported start address, the radio returns to standby and the
    ///   length is reported as [`RxOutcome::Delivered`].
    /// - Otherwise the radio is (re)armed for a single receive unless it is already
    ///   listening, and [`RxOutcome::Corrupted`] or [`RxOutcome::Nothing`] is
    ///   reported.
    ///
    /// # Errors
    /// * `Error::BufferTooSmall` - The packet does not fit `buffer`; it is dropped
    ///   and the radio left in standby
    /// * `Error::Bus` - SPI communication failed
    pub fn poll_receive(&mut self, buffer: &mut [u8]) -> Result<RxOutcome, Error> {
        let flags: IrqFlags = self.device.read_register()?;
        self.device.write_register(flags)?;

        if flags.rx_delivered() {
            let length = self.device.read_register::<RxNbBytes>()?.count as usize;
            let start: FifoRxCurrentAddr = self.device.read_register()?;
            self.device.write_register(FifoAddrPtr {
                address: start.address,
            })?;

            if length > buffer.len() {
                #[cfg(feature = "defmt")]
                defmt::warn!(
                    "dropping {} byte packet, buffer holds {}",
                    length,
                    buffer.len()
                );
                self.enter_standby()?;
                return Err(Error::BufferTooSmall {
                    needed: length,
                    available: buffer.len(),
                });
            }

            for byte in buffer[..length].iter_mut() {
                *byte = self.device.read_register::<FifoData>()?.value;
            }

            self.enter_standby()?;

            #[cfg(feature = "defmt")]
            defmt::debug!("received {} byte packet", length);

            return Ok(RxOutcome::Delivered(length));
        }

        let outcome = if flags.rx_corrupted() {
            #[cfg(feature = "defmt")]
            defmt::warn!("discarding packet with payload CRC error");
            RxOutcome::Corrupted
        } else {
            RxOutcome::Nothing
        };

        let current: OpMode = self.device.read_register()?;
        if current == OpMode::lora(DeviceMode::RxSingle) {
            self.mode = Some(Mode::ReceiveSingle);
        } else {
            self.device.write_register(FifoAddrPtr { address: 0 })?;
            self.set_mode(Mode::ReceiveSingle)?;
        }

        Ok(outcome)
    }

    /// Signal strength and SNR of the last received packet.
    ///
    /// Only meaningful directly after [`RxOutcome::Delivered`].
    pub fn packet_telemetry(&mut self) -> Result<PacketTelemetry, Error> {
        let rssi: PacketRssi = self.device.read_register()?;
        let snr: PacketSnr = self.device.read_register()?;

        Ok(PacketTelemetry::from_raw(rssi.raw, snr.raw))
    }

    /// Silicon version, 0x12 for production SX1276 dies
    pub fn version(&mut self) -> Result<u8, Error> {
        Ok(self.device.read_register::<Version>()?.value)
    }

    /// Switches continuous transmission on or off.
    ///
    /// With continuous mode on, a transmission repeats the FIFO content until
    /// the radio leaves [`Mode::Transmit`]. Used for spectral measurements only.
    pub fn set_continuous_transmit(&mut self, enabled: bool) -> Result<(), Error> {
        let modem_config_2 = ModemConfig2 {
            tx_continuous: enabled,
            ..self.device.read_register()?
        };
        self.device.write_register(modem_config_2)
    }

    /// Direct access to the register interface.
    ///
    /// Writing the operating mode through this handle desynchronizes
    /// [`mode`](Radio::mode) from the chip.
    pub fn device(&mut self) -> &mut Device<SPI> {
        &mut self.device
    }
}
