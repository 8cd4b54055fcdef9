//! Link quality telemetry and statistics
//!
//! Each delivered packet yields a [`PacketTelemetry`] pair. Over an experiment run
//! the pairs are appended to two fixed-capacity [`Series`], and summary statistics
//! are computed once from the full series at the end of the run:
//!
//! - mean = Σx / n
//! - sample variance = Σ(x - mean)² / (n - 1)
//! - standard deviation = √variance
//!
//! Statistics over fewer than two samples, and delivery rates against a zero
//! sequence number, are rejected with [`StatisticsUndefined`].

/// Offset added to the packet RSSI register, in dBm
pub const RSSI_OFFSET_DBM: i16 = -137;

/// SNR register resolution in dB per LSB
pub const SNR_STEP_DB: f32 = 0.25;

/// Reasons a statistic cannot be computed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StatisticsUndefined {
    /// The series holds fewer samples than the statistic needs
    TooFewSamples(usize),
    /// Delivery rate against a zero sequence number
    ZeroSequenceNumber,
}

/// Returned when appending to a full [`Series`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SeriesFull;

/// Signal quality of one received packet
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PacketTelemetry {
    /// Packet signal strength in dBm
    pub rssi_dbm: i16,
    /// Packet signal-to-noise ratio in dB
    pub snr_db: f32,
}

impl PacketTelemetry {
    /// Converts the raw packet RSSI and SNR register values.
    pub fn from_raw(rssi: u8, snr: i8) -> Self {
        Self {
            rssi_dbm: RSSI_OFFSET_DBM + rssi as i16,
            snr_db: SNR_STEP_DB * snr as f32,
        }
    }
}

/// Append-only series of samples, indexed by receive order
#[derive(Debug, Clone, Default)]
pub struct Series<const N: usize> {
    values: heapless::Vec<f32, N>,
}

impl<const N: usize> Series<N> {
    /// Empty series
    pub fn new() -> Self {
        Self {
            values: heapless::Vec::new(),
        }
    }

    /// Appends a sample.
    ///
    /// # Errors
    /// * `SeriesFull` - The series already holds `N` samples
    pub fn push(&mut self, value: f32) -> Result<(), SeriesFull> {
        self.values.push(value).map_err(|_| SeriesFull)
    }

    /// Number of samples held
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True before the first sample
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Samples in receive order
    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    /// Drops every sample
    pub fn clear(&mut self) {
        self.values.clear()
    }

    /// Mean, sample variance and standard deviation of the full series
    pub fn summary(&self) -> Result<Summary, StatisticsUndefined> {
        Summary::of(&self.values)
    }
}

/// Summary statistics of one series
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Summary {
    /// Number of samples summarized
    pub count: usize,
    /// Arithmetic mean
    pub mean: f64,
    /// Sample variance, divided by `count - 1`
    pub variance: f64,
    /// Square root of the sample variance
    pub std_dev: f64,
}

impl Summary {
    /// Computes the summary of `values`.
    ///
    /// # Errors
    /// * `StatisticsUndefined::TooFewSamples` - Fewer than two values
    pub fn of(values: &[f32]) -> Result<Self, StatisticsUndefined> {
        let mean = mean(values)?;
        let variance = sample_variance(values, mean)?;

        Ok(Self {
            count: values.len(),
            mean,
            variance,
            std_dev: libm::sqrt(variance),
        })
    }
}

/// Arithmetic mean. Undefined for an empty slice.
pub fn mean(values: &[f32]) -> Result<f64, StatisticsUndefined> {
    if values.is_empty() {
        return Err(StatisticsUndefined::TooFewSamples(0));
    }

    let sum: f64 = values.iter().map(|&value| value as f64).sum();
    Ok(sum / values.len() as f64)
}

/// Sample variance around `mean`, with Bessel's correction. Needs two values.
pub fn sample_variance(values: &[f32], mean: f64) -> Result<f64, StatisticsUndefined> {
    if values.len() < 2 {
        return Err(StatisticsUndefined::TooFewSamples(values.len()));
    }

    let sum: f64 = values
        .iter()
        .map(|&value| {
            let diff = value as f64 - mean;
            diff * diff
        })
        .sum();
    Ok(sum / (values.len() - 1) as f64)
}

/// Sample standard deviation around `mean`. Needs two values.
pub fn std_dev(values: &[f32], mean: f64) -> Result<f64, StatisticsUndefined> {
    sample_variance(values, mean).map(libm::sqrt)
}

/// Statistics of both telemetry series at the end of a run
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkStatistics {
    /// Signal strength in dBm
    pub rssi: Summary,
    /// Signal-to-noise ratio in dB
    pub snr: Summary,
}

/// Accumulates per-packet telemetry into two parallel series of capacity `N`
#[derive(Debug, Clone, Default)]
pub struct LinkQuality<const N: usize> {
    rssi: Series<N>,
    snr: Series<N>,
}

impl<const N: usize> LinkQuality<N> {
    /// Accumulator with both series empty
    pub fn new() -> Self {
        Self {
            rssi: Series::new(),
            snr: Series::new(),
        }
    }

    /// Appends one packet's telemetry to both series.
    ///
    /// Both series always have the same length.
    pub fn record(&mut self, telemetry: PacketTelemetry) -> Result<(), SeriesFull> {
        if self.rssi.len() == N {
            return Err(SeriesFull);
        }

        self.rssi.push(telemetry.rssi_dbm as f32)?;
        self.snr.push(telemetry.snr_db)
    }

    /// Number of packets recorded
    pub fn len(&self) -> usize {
        self.rssi.len()
    }

    /// True before the first packet
    pub fn is_empty(&self) -> bool {
        self.rssi.is_empty()
    }

    /// Signal strength series in dBm
    pub fn rssi(&self) -> &Series<N> {
        &self.rssi
    }

    /// Signal-to-noise series in dB
    pub fn snr(&self) -> &Series<N> {
        &self.snr
    }

    /// Drops both series
    pub fn clear(&mut self) {
        self.rssi.clear();
        self.snr.clear();
    }

    /// Computes the statistics of both series.
    pub fn statistics(&self) -> Result<LinkStatistics, StatisticsUndefined> {
        Ok(LinkStatistics {
            rssi: self.rssi.summary()?,
            snr: self.snr.summary()?,
        })
    }
}

/// Ratio of the target packet count to the last sequence number seen.
///
/// With the sender numbering packets from one, this is the fraction of sent
/// packets that arrived. A ratio above one means more packets were counted than
/// the sender numbered and the measurement is suspect.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeliveryRate {
    /// Fraction of numbered packets that arrived, 1.0 for all of them
    pub ratio: f32,
}

impl DeliveryRate {
    /// Computes `target / last_sequence`.
    ///
    /// # Errors
    /// * `StatisticsUndefined::ZeroSequenceNumber` - `last_sequence` is zero
    pub fn new(target: u16, last_sequence: u16) -> Result<Self, StatisticsUndefined> {
        if last_sequence == 0 {
            return Err(StatisticsUndefined::ZeroSequenceNumber);
        }

        Ok(Self {
            ratio: target as f32 / last_sequence as f32,
        })
    }

    /// True when the ratio exceeds 100%
    pub fn is_anomalous(&self) -> bool {
        self.ratio > 1.0
    }
}
