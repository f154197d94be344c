//! Amplitude pre-scaling for numerically stable distribution fitting.

use crate::retrieval::binning::{BinningPolicy, Histogram};
use crate::retrieval::error::RetrievalError;

type Result<T> = std::result::Result<T, RetrievalError>;

/// Derives the multiplicative scale factor for one channel of one window.
///
/// The factor moves the histogram mode of the magnitudes to 0.1, keeping the
/// dominant echo population near unity regardless of absolute instrument
/// gain. The scale is compensated exactly when fit parameters are converted
/// back to received power.
///
/// # Errors
/// Will return `Err` if the sample is empty or all magnitudes are zero,
/// since the scale would be undefined.
pub fn mode_scale(mags: &[f64]) -> Result<f64> {
    if mags.is_empty() {
        Err(RetrievalError::DegenerateSample(
            "empty amplitude sample".to_string(),
        ))?;
    }
    if !mags.iter().any(|&m| m > 0.0) {
        Err(RetrievalError::DegenerateSample(
            "all magnitudes are zero".to_string(),
        ))?;
    }
    let mode = Histogram::build(mags, BinningPolicy::FreedmanDiaconis).mode();
    if mode <= 0.0 {
        Err(RetrievalError::DegenerateSample(format!(
            "histogram mode {mode} is not positive"
        )))?;
    }
    Ok(1.0 / (10.0 * mode))
}
