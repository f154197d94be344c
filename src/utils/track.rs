//! Ingestion of delimited sounding-radar track files.

use num_complex::Complex64;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use thiserror::Error;

/// Column order of a track record.
const FIELD_NAMES: [&str; 9] = [
    "lat", "lon", "roll", "rng", "srfi", "srfq", "thick", "bedi", "bedq",
];

/// Enum of the possible error variants raised while reading a track file
#[derive(Error, Debug)]
pub enum TrackError {
    /// The track file could not be opened or read
    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// A record did not match the expected column schema
    #[error("line {line}: expected 9 comma-separated fields, found {found}")]
    Schema { line: usize, found: usize },

    /// A field could not be parsed as a float
    #[error("line {line}: cannot parse field `{field}` from `{value}`")]
    Parse {
        line: usize,
        field: &'static str,
        value: String,
    },

    /// The file contained no records
    #[error("track file contains no records")]
    Empty,
}

/// The full along-track sequence of navigation and echo samples, one record
/// per range bin. Immutable once loaded; shared read-only across workers.
#[derive(Debug, Clone)]
pub struct Track {
    pub lat: Vec<f64>,
    pub lon: Vec<f64>,
    pub roll: Vec<f64>,
    /// Range to the surface in m
    pub rng: Vec<f64>,
    /// Ice-thickness estimate in m
    pub thick: Vec<f64>,
    /// Surface echo, reconstructed from the in-phase and quadrature columns
    pub srf: Vec<Complex64>,
    /// Bed echo, reconstructed from the in-phase and quadrature columns
    pub bed: Vec<Complex64>,
}

/// Window means of the navigation fields.
#[derive(Debug, Clone, Copy)]
pub(crate) struct NavMeans {
    pub lon: f64,
    pub lat: f64,
    pub roll: f64,
    pub h0: f64,
    pub h1: f64,
}

impl Track {
    /// Reads a track from a delimited text file, one record per range bin,
    /// no header.
    ///
    /// # Errors
    /// Will return `Err` if the file cannot be read, a record does not match
    /// the column schema, or the file contains no records.
    pub fn from_path(path: &Path) -> Result<Track, TrackError> {
        let file = File::open(path)?;
        Track::from_reader(BufReader::new(file))
    }

    /// Reads a track from any buffered reader carrying the same schema.
    ///
    /// # Errors
    /// Will return `Err` if a record does not match the column schema or the
    /// input contains no records.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Track, TrackError> {
        let mut track = Track {
            lat: vec![],
            lon: vec![],
            roll: vec![],
            rng: vec![],
            thick: vec![],
            srf: vec![],
            bed: vec![],
        };
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let mut fields = [0.0_f64; 9];
            let mut found = 0;
            for (i, raw) in trimmed.split(',').enumerate() {
                if i < fields.len() {
                    fields[i] = raw.trim().parse().map_err(|_| TrackError::Parse {
                        line: idx + 1,
                        field: FIELD_NAMES[i],
                        value: raw.trim().to_string(),
                    })?;
                }
                found = i + 1;
            }
            if found != fields.len() {
                return Err(TrackError::Schema {
                    line: idx + 1,
                    found,
                });
            }
            track.lat.push(fields[0]);
            track.lon.push(fields[1]);
            track.roll.push(fields[2]);
            track.rng.push(fields[3]);
            track.srf.push(Complex64::new(fields[4], fields[5]));
            track.thick.push(fields[6]);
            track.bed.push(Complex64::new(fields[7], fields[8]));
        }
        if track.lat.is_empty() {
            return Err(TrackError::Empty);
        }
        Ok(track)
    }

    /// Number of range bins in the track.
    pub fn len(&self) -> usize {
        self.lat.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lat.is_empty()
    }

    pub(crate) fn nav_means(&self, start: usize, end: usize) -> NavMeans {
        NavMeans {
            lon: mean(&self.lon[start..end]),
            lat: mean(&self.lat[start..end]),
            roll: mean(&self.roll[start..end]),
            h0: mean(&self.rng[start..end]),
            h1: mean(&self.thick[start..end]),
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}
