//! Conversion of fit parameters into calibrated received power levels.

use crate::retrieval::decompose::FitResult;
use crate::retrieval::error::RetrievalError;

type Result<T> = std::result::Result<T, RetrievalError>;

/// Calibrated received power levels for one channel of one window.
#[derive(Debug, Clone, Copy)]
pub struct ChannelPower {
    /// Coherent (specular) received power in dB
    pub coherent: f64,
    /// Incoherent (diffuse) received power in dB
    pub incoherent: f64,
}

/// Converts fit parameters into received powers, removing the amplitude
/// pre-scaling and applying the system gain.
///
/// The `-20 log10(scale)` term compensates the scaler exactly, so the output
/// power does not depend on the scale factor that was applied before
/// fitting.
///
/// # Errors
/// Will return `Err` if either fit parameter is not strictly positive, since
/// its logarithm is undefined and downstream inversion cannot recover from a
/// silent NaN.
pub fn calibrate(fit: &FitResult, scale: f64, gain_db: f64) -> Result<ChannelPower> {
    if fit.a <= 0.0 || fit.s <= 0.0 {
        Err(RetrievalError::NumericDomain(format!(
            "cannot take the log of fit parameters a = {}, s = {}",
            fit.a, fit.s
        )))?;
    }
    let descale = 20.0 * scale.log10();
    Ok(ChannelPower {
        coherent: 10.0 * (fit.a * fit.a).log10() - descale + gain_db,
        incoherent: 10.0 * (2.0 * fit.s * fit.s).log10() - descale + gain_db,
    })
}
