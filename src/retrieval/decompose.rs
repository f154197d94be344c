//! Statistical decomposition of echo magnitude distributions.
//!
//! The pipeline consumes the decomposition through the
//! [`StatisticalDecomposer`] trait so alternative models (or mocks) can be
//! substituted. [`RiceDecomposer`] is the built-in model: a Rice probability
//! density fitted to the magnitude histogram with a Levenberg-Marquardt
//! solver, seeded by the second/fourth-moment estimator.

use crate::retrieval::binning::{BinningPolicy, Histogram};
use crate::retrieval::error::RetrievalError;
use itertools::enumerate;
use rmpfit::{MPConfig, MPFitter, MPPar, MPResult};
use std::iter::zip;

type Result<T> = std::result::Result<T, RetrievalError>;

/// Smallest magnitude sample the binning policies meaningfully support.
pub const MIN_FIT_SAMPLES: usize = 16;

/// Fewest occupied histogram bins that still constrain a two-parameter fit.
const MIN_FIT_BINS: usize = 4;

/// Outputs of one per-channel distribution fit.
#[derive(Debug, Clone, Copy)]
pub struct FitResult {
    /// Coherent component amplitude
    pub a: f64,
    /// Incoherent component scale
    pub s: f64,
    /// Correlation between observed and fitted bin densities
    pub crl: f64,
}

/// Capability contract for the amplitude-distribution fitting engine.
pub trait StatisticalDecomposer: Sync {
    /// Decomposes a magnitude sample into a coherent amplitude, an
    /// incoherent scale and a goodness-of-fit correlation.
    ///
    /// # Errors
    /// Must return `Err` for degenerate input (empty, all-zero, or fewer
    /// samples than the binning policy supports) rather than produce NaN.
    fn decompose(&self, mags: &[f64], binning: BinningPolicy) -> Result<FitResult>;
}

/// Rice-distribution fit of the magnitude histogram.
#[derive(Debug, Default, Clone, Copy)]
pub struct RiceDecomposer;

impl StatisticalDecomposer for RiceDecomposer {
    fn decompose(&self, mags: &[f64], binning: BinningPolicy) -> Result<FitResult> {
        if mags.len() < MIN_FIT_SAMPLES {
            Err(RetrievalError::DegenerateSample(format!(
                "{} samples, need at least {MIN_FIT_SAMPLES}",
                mags.len()
            )))?;
        }
        if !mags.iter().any(|&m| m > 0.0) {
            Err(RetrievalError::DegenerateSample(
                "all magnitudes are zero".to_string(),
            ))?;
        }

        let (a0, s0) = moment_estimate(mags);
        let hist = Histogram::build(mags, binning);
        if hist.occupied() < MIN_FIT_BINS {
            // Too little spread to constrain the two-parameter fit
            return finalize(a0, s0, &hist);
        }

        let mut problem = RicePdfProblem::new(&hist);
        let mut params = vec![a0, s0];
        problem.mpfit(&mut params).map_err(|e| {
            RetrievalError::BadFit(format!("Levenberg-Marquardt solver failed: {e}"))
        })?;
        finalize(params[0], params[1], &hist)
    }
}

/// Second/fourth-moment Rice parameter estimate, used to seed the fit.
fn moment_estimate(mags: &[f64]) -> (f64, f64) {
    let n = mags.len() as f64;
    let m2 = mags.iter().map(|x| x * x).sum::<f64>() / n;
    let m4 = mags.iter().map(|x| x.powi(4)).sum::<f64>() / n;
    let a2 = (2.0 * m2 * m2 - m4).max(0.0).sqrt();
    let a = a2.sqrt();
    let s = (((m2 - a2) / 2.0).max(m2 * 1e-12)).sqrt();
    (a, s)
}

fn finalize(a: f64, s: f64, hist: &Histogram) -> Result<FitResult> {
    if !a.is_finite() || !s.is_finite() || a < 0.0 || s <= 0.0 {
        Err(RetrievalError::BadFit(format!(
            "fit produced a = {a}, s = {s}"
        )))?;
    }
    let observed = hist.density();
    let fitted: Vec<f64> = hist.centers.iter().map(|&x| rice_pdf(x, a, s)).collect();
    let crl = correlation(&observed, &fitted).unwrap_or(1.0);
    Ok(FitResult { a, s, crl })
}

/// Levenberg-Marquardt problem fitting a Rice density using the rmpfit crate
struct RicePdfProblem {
    /// Bin centers of the magnitude histogram
    x: Vec<f64>,

    /// Observed probability density per bin
    y: Vec<f64>,

    /// Uncertainty in the observed density, from Poisson counting
    ye: Vec<f64>,

    /// The actual parameters being optimized
    params: Vec<MPPar>,
}

impl RicePdfProblem {
    fn new(hist: &Histogram) -> RicePdfProblem {
        let norm = hist.samples as f64 * hist.width;
        let ye = hist
            .counts
            .iter()
            .map(|&c| (c.max(1) as f64).sqrt() / norm)
            .collect();

        let a_param = MPPar {
            limited_low: true,
            limit_low: 0.0,
            ..Default::default()
        };
        let s_param = MPPar {
            limited_low: true,
            limit_low: 1e-9,
            ..Default::default()
        };
        RicePdfProblem {
            x: hist.centers.clone(),
            y: hist.density(),
            ye,
            params: vec![a_param, s_param],
        }
    }
}

impl MPFitter for RicePdfProblem {
    fn eval(&mut self, params: &[f64], deviates: &mut [f64]) -> MPResult<()> {
        for (i, dev) in enumerate(deviates.iter_mut()) {
            *dev = (self.y[i] - rice_pdf(self.x[i], params[0], params[1])) / self.ye[i];
        }
        Ok(())
    }

    fn number_of_points(&self) -> usize {
        self.x.len()
    }

    fn config(&self) -> MPConfig {
        MPConfig {
            ftol: 1e-6,
            gtol: 1e-6,
            no_finite_check: false,
            max_fev: 200,
            ..Default::default()
        }
    }

    fn parameters(&self) -> Option<&[MPPar]> {
        Some(&*self.params)
    }
}

/// Rice probability density, evaluated in log space so large Bessel
/// arguments stay finite.
fn rice_pdf(x: f64, a: f64, s: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    let s2 = s * s;
    let ln_p = (x / s2).ln() - (x * x + a * a) / (2.0 * s2) + ln_bessel_i0(x * a / s2);
    ln_p.exp()
}

/// ln I0(z) from the Abramowitz & Stegun polynomial approximations.
fn ln_bessel_i0(z: f64) -> f64 {
    let az = z.abs();
    if az < 3.75 {
        let t = (az / 3.75).powi(2);
        (1.0 + t
            * (3.515_622_9
                + t * (3.089_942_4
                    + t * (1.206_749_2
                        + t * (0.265_973_2 + t * (0.036_076_8 + t * 0.004_581_3))))))
            .ln()
    } else {
        let t = 3.75 / az;
        let poly = 0.398_942_28
            + t * (0.013_285_92
                + t * (0.002_253_19
                    + t * (-0.001_575_65
                        + t * (0.009_162_81
                            + t * (-0.020_577_06
                                + t * (0.026_355_37
                                    + t * (-0.016_476_33 + t * 0.003_923_77)))))));
        az + poly.ln() - 0.5 * az.ln()
    }
}

/// Pearson correlation, `None` when either side carries no variance.
fn correlation(observed: &[f64], fitted: &[f64]) -> Option<f64> {
    if observed.len() < 2 {
        return None;
    }
    let n = observed.len() as f64;
    let mean_o = observed.iter().sum::<f64>() / n;
    let mean_f = fitted.iter().sum::<f64>() / n;
    let mut cov = 0.0;
    let mut var_o = 0.0;
    let mut var_f = 0.0;
    for (o, f) in zip(observed.iter(), fitted.iter()) {
        cov += (o - mean_o) * (f - mean_f);
        var_o += (o - mean_o) * (o - mean_o);
        var_f += (f - mean_f) * (f - mean_f);
    }
    let denom = (var_o * var_f).sqrt();
    if denom > 0.0 {
        Some(cov / denom)
    } else {
        None
    }
}
