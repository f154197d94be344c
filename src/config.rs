//! Run-time configuration for a retrieval batch.

use crate::retrieval::binning::BinningPolicy;
use crate::retrieval::error::RetrievalError;
use crate::utils::constants::{BANDWIDTH_HZ, CARRIER_FREQ_HZ};

/// Configuration record constructed once at batch start and passed by
/// reference into the segmenter, the window processor and the dispatcher.
#[derive(Debug, Clone)]
pub struct RsrConfig {
    /// Number of consecutive bins in a computing window (default: 1000)
    pub window_size: usize,

    /// Number of bins between consecutive window starts (default: 250)
    pub stride: usize,

    /// Number of worker threads in the batch pool (default: 8)
    pub workers: usize,

    /// Calibrated system gain in dB (default: -30)
    pub gain_db: f64,

    /// Round-trip attenuation rate in dB/km (default: -10)
    pub attenuation_rate: f64,

    /// Histogram binning policy for the distribution fit
    pub binning: BinningPolicy,

    /// Instrument carrier frequency in Hz
    pub carrier_freq: f64,

    /// Instrument bandwidth in Hz
    pub bandwidth: f64,
}

impl Default for RsrConfig {
    fn default() -> Self {
        RsrConfig {
            window_size: 1000,
            stride: 250,
            workers: 8,
            gain_db: -30.0,
            attenuation_rate: -10.0,
            binning: BinningPolicy::FreedmanDiaconis,
            carrier_freq: CARRIER_FREQ_HZ,
            bandwidth: BANDWIDTH_HZ,
        }
    }
}

impl RsrConfig {
    /// Checks the configuration before any processing starts.
    ///
    /// # Errors
    /// Will return `Err` if the window size, stride or worker count is zero,
    /// or an instrument constant is not positive.
    pub fn validate(&self) -> Result<(), RetrievalError> {
        if self.window_size == 0 {
            Err(RetrievalError::InvalidConfig(
                "window size must be positive".to_string(),
            ))?;
        }
        if self.stride == 0 {
            Err(RetrievalError::InvalidConfig(
                "stride must be positive".to_string(),
            ))?;
        }
        if self.workers == 0 {
            Err(RetrievalError::InvalidConfig(
                "worker count must be positive".to_string(),
            ))?;
        }
        if self.carrier_freq <= 0.0 || self.bandwidth <= 0.0 {
            Err(RetrievalError::InvalidConfig(
                "carrier frequency and bandwidth must be positive".to_string(),
            ))?;
        }
        Ok(())
    }
}
