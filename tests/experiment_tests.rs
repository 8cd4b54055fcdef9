//! # Experiment Tests
//!
//! The sequence transmitter and the receiver controller driven through the
//! simulated chip.

mod common;

use std::collections::VecDeque;

use common::*;
use embedded_hal::digital::ErrorKind;
use rfm96::{
    run_receiver, Confirmation, Display, Error, Experiment, Phase, Press, RadioConfig,
    RxOutcome, SequenceNumber, SequenceTransmitter, StatisticsUndefined,
};

/// Replays presses, then fails like a disconnected button
struct ScriptedInput {
    presses: VecDeque<Press>,
}

impl ScriptedInput {
    fn new(presses: &[Press]) -> Self {
        Self {
            presses: presses.iter().copied().collect(),
        }
    }
}

impl Confirmation for ScriptedInput {
    fn wait_press(&mut self) -> Result<Press, Error> {
        self.presses.pop_front().ok_or(Error::Pin(ErrorKind::Other))
    }
}

#[derive(Default)]
struct Recorder {
    shown: Vec<String>,
}

impl Display for Recorder {
    fn show(&mut self, text: &str) {
        self.shown.push(text.to_string());
    }
}

mod transmitter {
    use super::*;

    #[test]
    fn test_sequence_numbers_start_at_one() {
        let (mut radio, chip, _) = standby_radio();
        let mut transmitter = SequenceTransmitter::new();
        assert_eq!(transmitter.last(), 0);

        for expected in 1..=3u16 {
            assert_eq!(
                transmitter.send_next(&mut radio),
                Ok(SequenceNumber(expected))
            );
            assert_eq!(&chip.state().fifo[..2], &expected.to_le_bytes());
        }

        assert_eq!(transmitter.last(), 3);
        assert_eq!(chip.state().register(REG_PAYLOAD_LENGTH), 2);
    }

    #[test]
    fn test_failed_send_does_not_advance() {
        let config = RadioConfig {
            tx_timeout_ms: 5,
            ..RadioConfig::default()
        };
        let (mut radio, chip, _, _) = radio(config);
        radio.initialize().unwrap();
        let mut transmitter = SequenceTransmitter::new();

        transmitter.send_next(&mut radio).unwrap();
        chip.state().tx_completes = false;

        assert_eq!(
            transmitter.send_next(&mut radio),
            Err(Error::TransmitTimeout)
        );
        assert_eq!(transmitter.last(), 1);

        chip.state().tx_completes = true;
        assert_eq!(transmitter.send_next(&mut radio), Ok(SequenceNumber(2)));
    }
}

mod receiver {
    use super::*;

    fn poll_until_delivered(
        experiment: &mut Experiment,
        radio: &mut SimRadio,
        buffer: &mut [u8],
    ) -> RxOutcome {
        for _ in 0..4 {
            let outcome = experiment.poll(radio, buffer).unwrap();
            if outcome != RxOutcome::Nothing {
                return outcome;
            }
        }
        panic!("no packet delivered");
    }

    #[test]
    fn test_lost_and_corrupted_packets() {
        let (mut radio, chip, _) = standby_radio();
        let mut experiment = Experiment::new();
        experiment.confirm(Press::Long);
        let mut buffer = [0u8; rfm96::MAX_PKT_LENGTH];

        // 3 and 7 never arrive, 5 arrives corrupted and is retransmitted as 6
        for sequence in (1..=12u16).filter(|s| *s != 3 && *s != 7) {
            chip.state()
                .queue_packet(&sequence.to_le_bytes(), 52, 24, sequence == 5);
        }

        let outcomes: Vec<RxOutcome> = (0..10)
            .map(|_| poll_until_delivered(&mut experiment, &mut radio, &mut buffer))
            .collect();

        assert_eq!(
            outcomes.iter().filter(|o| **o == RxOutcome::Corrupted).count(),
            1
        );
        assert_eq!(experiment.received(), 9);
        assert_eq!(experiment.corrupted(), 1);
        assert_eq!(experiment.phase(), Phase::Receiving);
    }

    #[test]
    fn test_run_reaches_target_and_reports() {
        let (mut radio, chip, _) = standby_radio();
        let mut experiment = Experiment::new();
        experiment.confirm(Press::Long);
        let mut buffer = [0u8; rfm96::MAX_PKT_LENGTH];

        for sequence in (1..=12u16).filter(|s| *s != 3 && *s != 7) {
            chip.state().queue_packet(&sequence.to_le_bytes(), 52, 24, false);
        }

        while experiment.phase() == Phase::Receiving {
            poll_until_delivered(&mut experiment, &mut radio, &mut buffer);
        }
        assert_eq!(experiment.phase(), Phase::Finalizing);

        experiment.finalize();

        let report = experiment.report().unwrap();
        assert_eq!(report.received, 10);
        assert_eq!(report.corrupted, 0);
        assert_eq!(report.last_sequence, SequenceNumber(12));
        assert_eq!(report.delivery.unwrap().ratio, 10.0 / 12.0);

        let statistics = report.statistics.unwrap();
        assert_eq!(statistics.rssi.mean, -85.0);
        assert_eq!(statistics.rssi.std_dev, 0.0);
        assert_eq!(statistics.snr.mean, 6.0);
        assert_eq!(radio.mode(), Some(rfm96::Mode::Standby));
    }

    #[test]
    fn test_foreign_payloads_are_not_counted() {
        let (mut radio, chip, _) = standby_radio();
        let mut experiment = Experiment::new();
        experiment.confirm(Press::Long);
        let mut buffer = [0u8; rfm96::MAX_PKT_LENGTH];

        chip.state().queue_packet(b"ping", 52, 24, false);

        assert_eq!(
            poll_until_delivered(&mut experiment, &mut radio, &mut buffer),
            RxOutcome::Delivered(4)
        );
        assert_eq!(experiment.received(), 0);
        assert!(experiment.link_quality().is_empty());
    }

    #[test]
    fn test_single_sample_leaves_spread_undefined() {
        let mut experiment = Experiment::new();
        experiment.confirm(Press::Long);
        let telemetry = rfm96::PacketTelemetry::from_raw(52, 24);

        experiment.record(&SequenceNumber(1).to_bytes(), telemetry);
        assert_eq!(experiment.link_quality().len(), 1);
        assert_eq!(
            experiment.link_quality().statistics(),
            Err(StatisticsUndefined::TooFewSamples(1))
        );
    }
}

mod controller {
    use super::*;

    #[test]
    fn test_run_receiver_end_to_end() {
        let (mut radio, chip, _) = standby_radio();
        for sequence in 1..=10u16 {
            chip.state().queue_packet(&sequence.to_le_bytes(), 52, 24, false);
        }

        let mut experiment = Experiment::new();
        let mut input = ScriptedInput::new(&[
            Press::Long,
            Press::Short,
            Press::Short,
            Press::Short,
            Press::Short,
            Press::Short,
            Press::Short,
        ]);
        let mut display = Recorder::default();
        let mut clock = Clock::default();

        let result = run_receiver(
            &mut radio,
            &mut experiment,
            &mut input,
            &mut display,
            &mut clock,
        );

        assert!(matches!(result, Err(Error::Pin(ErrorKind::Other))));
        assert_eq!(experiment.phase(), Phase::ShowingResults);
        assert_eq!(clock.elapsed_ms(), 7 * rfm96::experiment::DISPLAY_DELAY_MS as u64);

        let expected: Vec<&str> = [
            "10", "RXMODE", "1", "2", "3", "4", "5", "6", "7", "8", "9", "10", "CALC",
            "LASTNR", "10", "RATE", "100°/%", "RSSI M", "-85.0", "RSSI D", "0.0", "SNR M",
            "6.0", "SNR D", "0.0", "LASTNR", "10",
        ]
        .to_vec();
        assert_eq!(display.shown, expected);
    }

    #[test]
    fn test_menu_selection_before_start() {
        let (mut radio, _, _) = standby_radio();
        let mut experiment = Experiment::new();
        let mut input = ScriptedInput::new(&[Press::Short, Press::Short]);
        let mut display = Recorder::default();
        let mut clock = Clock::default();

        let result = run_receiver(
            &mut radio,
            &mut experiment,
            &mut input,
            &mut display,
            &mut clock,
        );

        assert!(result.is_err());
        assert_eq!(experiment.phase(), Phase::ChooseCount);
        assert_eq!(experiment.target(), 1000);
        assert_eq!(display.shown, ["10", "100", "1000"]);
    }
}
