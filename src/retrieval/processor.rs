//! Per-window retrieval orchestration.

use crate::config::RsrConfig;
use crate::retrieval::calibrate::calibrate;
use crate::retrieval::decompose::StatisticalDecomposer;
use crate::retrieval::error::RetrievalError;
use crate::retrieval::frames::Window;
use crate::retrieval::invert::{BedInputs, CoefficientInverter};
use crate::retrieval::record::WindowResult;
use crate::retrieval::scaling::mode_scale;
use crate::utils::constants::M_TO_KM;
use crate::utils::track::Track;
use num_complex::Complex64;
use tracing::debug;

type Result<T> = std::result::Result<T, RetrievalError>;

/// Runs the full retrieval for one window: amplitude scaling, statistical
/// decomposition and power calibration for the surface and bed channels,
/// then surface inversion followed by bed inversion.
///
/// Reads the track without mutating it; the only output is the returned
/// record. This is the unit of parallelism.
///
/// # Errors
/// Will return `Err` if either channel's sample is degenerate, the
/// distribution fit fails, a fit parameter leaves the calibration domain, or
/// the inverter rejects the power levels.
pub fn process_window<D, I>(
    track: &Track,
    window: Window,
    cfg: &RsrConfig,
    decomposer: &D,
    inverter: &I,
) -> Result<WindowResult>
where
    D: StatisticalDecomposer,
    I: CoefficientInverter,
{
    let nav = track.nav_means(window.start, window.end);

    let srf_mags = magnitudes(&track.srf[window.start..window.end]);
    let bed_mags = magnitudes(&track.bed[window.start..window.end]);
    let srf_scale = mode_scale(&srf_mags)?;
    let bed_scale = mode_scale(&bed_mags)?;

    let srf_fit = decomposer.decompose(&rescale(&srf_mags, srf_scale), cfg.binning)?;
    let bed_fit = decomposer.decompose(&rescale(&bed_mags, bed_scale), cfg.binning)?;

    let srf_power = calibrate(&srf_fit, srf_scale, cfg.gain_db)?;
    let bed_power = calibrate(&bed_fit, bed_scale, cfg.gain_db)?;

    let surface = inverter.surface(
        srf_power.coherent,
        srf_power.incoherent,
        nav.h0,
        cfg.carrier_freq,
        cfg.bandwidth,
    )?;
    let q1 = 2.0 * nav.h1 * M_TO_KM * cfg.attenuation_rate;
    let bed = inverter.bed(
        &BedInputs {
            psc: srf_power.coherent,
            psn: srf_power.incoherent,
            pbc: bed_power.coherent,
            pbn: bed_power.incoherent,
            n1: surface.n1,
            sh: surface.sh,
            h0: nav.h0,
            h1: nav.h1,
            q1,
        },
        cfg.carrier_freq,
        cfg.bandwidth,
    )?;
    debug!(xo = window.center(), "window retrieved");

    Ok(WindowResult {
        xo: window.center(),
        xa: window.start,
        xb: window.end - 1,
        lon: nav.lon,
        lat: nav.lat,
        roll: nav.roll,
        psc: srf_power.coherent,
        psn: srf_power.incoherent,
        pbc: bed_power.coherent,
        pbn: bed_power.incoherent,
        rsc: surface.rsc,
        rsn: surface.rsn,
        rbc: bed.rbc,
        rbn: bed.rbn,
        crls: srf_fit.crl,
        crlb: bed_fit.crl,
        e1: surface.n1 * surface.n1,
        sh: surface.sh,
        h0: nav.h0,
        h1: nav.h1,
        q1,
    })
}

fn magnitudes(echo: &[Complex64]) -> Vec<f64> {
    echo.iter().map(|z| z.norm()).collect()
}

fn rescale(mags: &[f64], scale: f64) -> Vec<f64> {
    mags.iter().map(|m| m * scale).collect()
}
