//! Electromagnetic inversion of calibrated powers into interface
//! coefficients.
//!
//! The pipeline consumes the inversion through the [`CoefficientInverter`]
//! trait; [`SpmInverter`] is the built-in spherical-wave two-interface model
//! with a small-perturbation roughness closure. Bed inversion depends on the
//! surface outputs and is only valid after surface inversion has succeeded
//! for the same window.

use crate::retrieval::error::RetrievalError;
use crate::utils::constants::LIGHTSPEED;
use std::f64::consts::{LN_10, PI};

type Result<T> = std::result::Result<T, RetrievalError>;

/// Surface-interface outputs of the first inversion stage.
#[derive(Debug, Clone, Copy)]
pub struct SurfaceInversion {
    /// Surface reflection coefficient in dB
    pub rsc: f64,
    /// Surface scattering coefficient in dB
    pub rsn: f64,
    /// Refractive index of the propagation medium below the surface
    pub n1: f64,
    /// RMS roughness height of the surface in m
    pub sh: f64,
}

/// Bed-interface outputs of the second inversion stage.
#[derive(Debug, Clone, Copy)]
pub struct BedInversion {
    /// Bed reflection coefficient in dB
    pub rbc: f64,
    /// Bed scattering coefficient in dB
    pub rbn: f64,
}

/// Power levels, medium parameters and geometry feeding the bed inversion.
#[derive(Debug, Clone, Copy)]
pub struct BedInputs {
    pub psc: f64,
    pub psn: f64,
    pub pbc: f64,
    pub pbn: f64,
    /// Refractive index from the surface inversion
    pub n1: f64,
    /// RMS roughness height from the surface inversion, in m
    pub sh: f64,
    /// Mean range to the surface in m
    pub h0: f64,
    /// Mean medium thickness in m
    pub h1: f64,
    /// Two-way attenuation term in dB
    pub q1: f64,
}

/// Capability contract for the electromagnetic inversion model.
pub trait CoefficientInverter: Sync {
    /// Inverts surface powers into reflection/scattering coefficients and
    /// the propagation-medium parameters.
    ///
    /// # Errors
    /// Must return `Err` for physically inconsistent inputs instead of
    /// producing NaN.
    fn surface(&self, psc: f64, psn: f64, h0: f64, wf: f64, wb: f64)
        -> Result<SurfaceInversion>;

    /// Inverts bed powers into reflection/scattering coefficients. Only
    /// valid once [`CoefficientInverter::surface`] has succeeded for the
    /// same window.
    ///
    /// # Errors
    /// Must return `Err` for physically inconsistent inputs instead of
    /// producing NaN.
    fn bed(&self, inputs: &BedInputs, wf: f64, wb: f64) -> Result<BedInversion>;
}

/// Spherical-wave two-interface model with a small-perturbation roughness
/// closure.
#[derive(Debug, Default, Clone, Copy)]
pub struct SpmInverter;

impl CoefficientInverter for SpmInverter {
    fn surface(&self, psc: f64, psn: f64, h0: f64, wf: f64, wb: f64)
        -> Result<SurfaceInversion> {
        if h0 <= 0.0 {
            Err(RetrievalError::Inversion(format!(
                "mean surface range {h0} m is not positive"
            )))?;
        }
        let k = 2.0 * PI * wf / LIGHTSPEED;

        // Two-way spreading to the specular point, pulse-limited footprint
        // for the diffuse component.
        let rsc = psc + 20.0 * (2.0 * h0).log10();
        let rsn = psn + 40.0 * h0.log10() - 10.0 * (PI * LIGHTSPEED * h0 / wb).log10();

        // Rayleigh roughness parameter from the incoherent/coherent ratio.
        let g = (1.0 + 10_f64.powf((psn - psc) / 10.0)).ln();
        let sh = g.sqrt() / (2.0 * k);

        let fresnel = 10_f64.powf(rsc / 10.0) * g.exp();
        if fresnel >= 1.0 {
            Err(RetrievalError::Inversion(format!(
                "surface reflection {:.2} dB exceeds unity after roughness correction",
                10.0 * fresnel.log10()
            )))?;
        }
        let root = fresnel.sqrt();
        let n1 = (1.0 + root) / (1.0 - root);
        Ok(SurfaceInversion { rsc, rsn, n1, sh })
    }

    fn bed(&self, inputs: &BedInputs, wf: f64, wb: f64) -> Result<BedInversion> {
        let BedInputs {
            psc: _,
            psn: _,
            pbc,
            pbn,
            n1,
            sh,
            h0,
            h1,
            q1,
        } = *inputs;
        if !n1.is_finite() || n1 < 1.0 {
            Err(RetrievalError::Inversion(format!(
                "refractive index {n1} is below unity"
            )))?;
        }
        if h1 < 0.0 {
            Err(RetrievalError::Inversion(format!(
                "mean thickness {h1} m is negative"
            )))?;
        }
        let depth = h0 + h1 / n1;
        if depth <= 0.0 {
            Err(RetrievalError::Inversion(format!(
                "apparent bed range {depth} m is not positive"
            )))?;
        }
        let k = 2.0 * PI * wf / LIGHTSPEED;

        let fresnel = ((n1 - 1.0) / (n1 + 1.0)).powi(2);
        let transmission = 1.0 - fresnel;
        if transmission <= 0.0 {
            Err(RetrievalError::Inversion(format!(
                "surface transmission vanished for n1 = {n1}"
            )))?;
        }
        let trans_db = 10.0 * transmission.log10();
        // Two-way roughness loss crossing the surface.
        let rough_db = 2.0 * ((n1 - 1.0) * k * sh).powi(2) * 10.0 / LN_10;

        let rbc = pbc + 20.0 * (2.0 * depth).log10() - 2.0 * trans_db + rough_db - q1;
        let rbn = pbn + 40.0 * depth.log10() - 10.0 * (PI * LIGHTSPEED * depth / wb).log10()
            - 2.0 * trans_db
            + rough_db
            - q1;
        Ok(BedInversion { rbc, rbn })
    }
}
