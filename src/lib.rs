//! Statistical reflectivity retrieval for ice-penetrating radar sounding
//! tracks.
//!
//! `procrsr` decomposes the echo amplitude distribution inside sliding
//! along-track windows into coherent and incoherent components, converts the
//! fitted parameters into calibrated received powers, and inverts those
//! powers into surface and bed reflection/scattering coefficients, relative
//! permittivity and RMS roughness height. Windows are processed concurrently
//! on a batch-scoped worker pool and aggregated in deterministic order.

use crate::config::RsrConfig;
use crate::error::ProcrsrError;
use crate::retrieval::decompose::RiceDecomposer;
use crate::retrieval::dispatch::par_retrieve_track;
use crate::retrieval::invert::SpmInverter;
use crate::utils::table::{output_path, write_table};
use crate::utils::track::Track;
use std::path::{Path, PathBuf};

pub mod config;
pub mod error;
pub mod retrieval;
pub mod utils;

/// Retrieves a whole track file with the built-in decomposer and inverter
/// and persists the ordered table alongside the input.
///
/// # Errors
/// Will return `Err` if the track cannot be read, any window fails to
/// retrieve, or the table cannot be written.
pub fn process_track_file(infile: &Path, cfg: &RsrConfig) -> Result<PathBuf, ProcrsrError> {
    let track = Track::from_path(infile)?;
    let results = par_retrieve_track(&track, cfg, &RiceDecomposer, &SpmInverter)?;
    let outfile = output_path(infile);
    write_table(&results, &outfile)?;
    Ok(outfile)
}
