//! Link-quality experiment controller
//!
//! The receiver side of the experiment moves through four phases:
//!
//! 1. `ChooseCount`: short presses cycle the target through 10, 100 and 1000
//!    packets, a long press starts the run
//! 2. `Receiving`: the radio is polled; every delivered experiment packet
//!    contributes its telemetry until the target count is reached
//! 3. `Finalizing`: statistics are computed once over the full series
//! 4. `ShowingResults`: each press moves to the next result page, wrapping
//!    around until power-down
//!
//! [`Experiment`] holds all run state and is driven either step by step or by
//! [`run_receiver`].

mod input;
mod sequence;

use core::convert::Infallible;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiDevice;

pub use input::{ButtonInput, Confirmation, Press, LONG_PRESS_MS};
pub use sequence::{SequenceNumber, SequenceTransmitter, SEQUENCE_PAYLOAD_LEN};

use crate::{
    DeliveryRate, Display, Error, LinkQuality, LinkStatistics, PacketTelemetry, Radio, Readout,
    RxOutcome, StatisticsUndefined, MAX_PKT_LENGTH,
};

/// Selectable target packet counts, in menu order
pub const TARGET_MENU: [u16; 3] = [10, 100, 1000];

/// Largest selectable target, and the capacity of the telemetry series
pub const MAX_TARGET: usize = 1000;

/// Time a result label stays up before its value, in milliseconds
pub const DISPLAY_DELAY_MS: u32 = 800;

/// Experiment phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    ChooseCount,
    Receiving,
    Finalizing,
    ShowingResults,
}

/// Result pages, shown in declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ResultPage {
    LastSequence,
    DeliveryRate,
    RssiMean,
    RssiStdDev,
    SnrMean,
    SnrStdDev,
}

impl ResultPage {
    /// The page after this one, wrapping to the first
    pub fn next(self) -> Self {
        match self {
            Self::LastSequence => Self::DeliveryRate,
            Self::DeliveryRate => Self::RssiMean,
            Self::RssiMean => Self::RssiStdDev,
            Self::RssiStdDev => Self::SnrMean,
            Self::SnrMean => Self::SnrStdDev,
            Self::SnrStdDev => Self::LastSequence,
        }
    }

    /// Label shown before the value
    pub fn label(self) -> &'static str {
        match self {
            Self::LastSequence => "LASTNR",
            Self::DeliveryRate => "RATE",
            Self::RssiMean => "RSSI M",
            Self::RssiStdDev => "RSSI D",
            Self::SnrMean => "SNR M",
            Self::SnrStdDev => "SNR D",
        }
    }
}

/// Outcome of a finished run
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Report {
    /// Packets counted towards the target
    pub received: u16,
    /// Packets discarded for a CRC error
    pub corrupted: u16,
    /// Sequence number of the last counted packet
    pub last_sequence: SequenceNumber,
    /// Target count over last sequence number
    pub delivery: Result<DeliveryRate, StatisticsUndefined>,
    /// RSSI and SNR summaries over every counted packet
    pub statistics: Result<LinkStatistics, StatisticsUndefined>,
}

impl Report {
    /// True when more packets were counted than the sender numbered, which
    /// makes the delivery rate suspect
    pub fn delivery_suspect(&self) -> bool {
        self.delivery.is_ok_and(|rate| rate.is_anomalous())
    }
}

/// State of one experiment run on the receiver
#[derive(Debug, Clone)]
pub struct Experiment {
    phase: Phase,
    target_index: usize,
    received: u16,
    corrupted: u16,
    last_sequence: SequenceNumber,
    link: LinkQuality<MAX_TARGET>,
    report: Option<Report>,
    page: ResultPage,
}

impl Default for Experiment {
    fn default() -> Self {
        Self::new()
    }
}

impl Experiment {
    /// Fresh run waiting for the target count, 10 selected
    pub fn new() -> Self {
        Self {
            phase: Phase::ChooseCount,
            target_index: 0,
            received: 0,
            corrupted: 0,
            last_sequence: SequenceNumber(0),
            link: LinkQuality::new(),
            report: None,
            page: ResultPage::LastSequence,
        }
    }

    /// Current phase
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Selected target packet count
    pub fn target(&self) -> u16 {
        TARGET_MENU[self.target_index]
    }

    /// Packets counted so far in this run
    pub fn received(&self) -> u16 {
        self.received
    }

    /// Packets discarded for a CRC error so far in this run
    pub fn corrupted(&self) -> u16 {
        self.corrupted
    }

    /// Sequence number of the last counted packet, 0 before the first
    pub fn last_sequence(&self) -> SequenceNumber {
        self.last_sequence
    }

    /// Telemetry recorded so far
    pub fn link_quality(&self) -> &LinkQuality<MAX_TARGET> {
        &self.link
    }

    /// Outcome of the run, available once results are showing
    pub fn report(&self) -> Option<&Report> {
        self.report.as_ref()
    }

    /// Result page currently shown
    pub fn page(&self) -> ResultPage {
        self.page
    }

    /// Applies a confirmation.
    ///
    /// While choosing, a short press selects the next target and a long press
    /// starts the run. While showing results, any press moves to the next
    /// page. Presses in other phases are ignored.
    pub fn confirm(&mut self, press: Press) {
        match (self.phase, press) {
            (Phase::ChooseCount, Press::Short) => {
                self.target_index = (self.target_index + 1) % TARGET_MENU.len();
            }
            (Phase::ChooseCount, Press::Long) => {
                self.received = 0;
                self.corrupted = 0;
                self.last_sequence = SequenceNumber(0);
                self.link.clear();
                self.report = None;
                self.phase = Phase::Receiving;

                #[cfg(feature = "defmt")]
                defmt::info!("experiment started, target {} packets", self.target());
            }
            (Phase::ShowingResults, _) => self.page = self.page.next(),
            _ => {}
        }
    }

    /// Counts one delivered packet.
    ///
    /// Returns false, without counting, for payloads that are not experiment
    /// packets and outside the receiving phase. Reaching the target moves the
    /// run to `Finalizing`.
    pub fn record(&mut self, payload: &[u8], telemetry: PacketTelemetry) -> bool {
        if self.phase != Phase::Receiving {
            return false;
        }

        let Some(sequence) = SequenceNumber::from_payload(payload) else {
            #[cfg(feature = "defmt")]
            defmt::warn!("ignoring {} byte payload", payload.len());
            return false;
        };

        if self.link.record(telemetry).is_err() {
            self.phase = Phase::Finalizing;
            return false;
        }

        self.received += 1;
        self.last_sequence = sequence;

        #[cfg(feature = "defmt")]
        defmt::debug!(
            "packet {} ({}/{}): {}",
            sequence,
            self.received,
            self.target(),
            telemetry
        );

        if self.received >= self.target() {
            self.phase = Phase::Finalizing;
        }

        true
    }

    /// Counts one packet discarded for a CRC error.
    pub fn record_corrupted(&mut self) {
        if self.phase == Phase::Receiving {
            self.corrupted = self.corrupted.saturating_add(1);
        }
    }

    /// Polls the radio once and records what it delivers.
    ///
    /// Does not touch the radio outside the receiving phase.
    pub fn poll<SPI, RESET, DELAY>(
        &mut self,
        radio: &mut Radio<SPI, RESET, DELAY>,
        buffer: &mut [u8],
    ) -> Result<RxOutcome, Error>
    where
        SPI: SpiDevice,
        RESET: OutputPin,
        DELAY: DelayNs,
    {
        if self.phase != Phase::Receiving {
            return Ok(RxOutcome::Nothing);
        }

        let outcome = radio.poll_receive(buffer)?;
        match outcome {
            RxOutcome::Delivered(length) => {
                let telemetry = radio.packet_telemetry()?;
                self.record(&buffer[..length], telemetry);
            }
            RxOutcome::Corrupted => self.record_corrupted(),
            RxOutcome::Nothing => {}
        }

        Ok(outcome)
    }

    /// Computes the statistics over the full series and shows the first page.
    ///
    /// Does nothing outside the finalizing phase.
    pub fn finalize(&mut self) {
        if self.phase != Phase::Finalizing {
            return;
        }

        let report = Report {
            received: self.received,
            corrupted: self.corrupted,
            last_sequence: self.last_sequence,
            delivery: DeliveryRate::new(self.target(), self.last_sequence.0),
            statistics: self.link.statistics(),
        };

        #[cfg(feature = "defmt")]
        defmt::info!("experiment finished: {}", report);

        #[cfg(feature = "defmt")]
        if report.delivery_suspect() {
            defmt::warn!("delivery rate above 100%, sequence numbers are suspect");
        }

        self.report = Some(report);
        self.page = ResultPage::LastSequence;
        self.phase = Phase::ShowingResults;
    }

    /// What the display should show for the current phase
    pub fn readout(&self) -> Readout {
        match self.phase {
            Phase::ChooseCount => Readout::Int(self.target() as i32),
            Phase::Receiving if self.received == 0 => Readout::Text("RXMODE"),
            Phase::Receiving => Readout::Int(self.last_sequence.0 as i32),
            Phase::Finalizing => Readout::Text("CALC"),
            Phase::ShowingResults => self.page_value(),
        }
    }

    fn page_value(&self) -> Readout {
        let Some(report) = self.report.as_ref() else {
            return Readout::Text("NODATA");
        };

        let statistics = report.statistics.as_ref().ok();
        let value = match self.page {
            ResultPage::LastSequence => Some(Readout::Int(report.last_sequence.0 as i32)),
            ResultPage::DeliveryRate => report
                .delivery
                .as_ref()
                .ok()
                .map(|rate| Readout::Percentage(rate.ratio)),
            ResultPage::RssiMean => statistics.map(|s| Readout::Float(s.rssi.mean as f32)),
            ResultPage::RssiStdDev => statistics.map(|s| Readout::Float(s.rssi.std_dev as f32)),
            ResultPage::SnrMean => statistics.map(|s| Readout::Float(s.snr.mean as f32)),
            ResultPage::SnrStdDev => statistics.map(|s| Readout::Float(s.snr.std_dev as f32)),
        };

        value.unwrap_or(Readout::Text("UNDEF"))
    }
}

/// Runs the receiver side of the experiment until an error occurs.
///
/// Chooses the target count with `input`, receives until it is reached, then
/// pages through the results on each confirmation. Result pages show their
/// label for [`DISPLAY_DELAY_MS`] before the value. There is no regular exit;
/// every error is returned to the caller.
pub fn run_receiver<SPI, RESET, DELAY, INPUT, DISPLAY, WAIT>(
    radio: &mut Radio<SPI, RESET, DELAY>,
    experiment: &mut Experiment,
    input: &mut INPUT,
    display: &mut DISPLAY,
    delay: &mut WAIT,
) -> Result<Infallible, Error>
where
    SPI: SpiDevice,
    RESET: OutputPin,
    DELAY: DelayNs,
    INPUT: Confirmation,
    DISPLAY: Display,
    WAIT: DelayNs,
{
    let mut buffer = [0u8; MAX_PKT_LENGTH];

    loop {
        match experiment.phase() {
            Phase::ChooseCount => {
                display.show(&experiment.readout().render());
                let press = input.wait_press()?;
                experiment.confirm(press);
                if experiment.phase() == Phase::Receiving {
                    display.show(&experiment.readout().render());
                }
            }
            Phase::Receiving => {
                if let RxOutcome::Delivered(_) = experiment.poll(radio, &mut buffer)? {
                    display.show(&experiment.readout().render());
                }
            }
            Phase::Finalizing => {
                display.show(&experiment.readout().render());
                experiment.finalize();
            }
            Phase::ShowingResults => {
                display.show(experiment.page().label());
                delay.delay_ms(DISPLAY_DELAY_MS);
                display.show(&experiment.readout().render());
                let press = input.wait_press()?;
                experiment.confirm(press);
            }
        }
    }
}
