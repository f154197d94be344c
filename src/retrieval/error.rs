//! Error type for the retrieval pipeline
use crate::retrieval::frames::Window;
use thiserror::Error;

/// Enum of the possible error variants that may be encountered during retrieval
#[derive(Error, Debug)]
pub enum RetrievalError {
    /// Invalid windowing or worker-pool configuration
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Amplitude sample unsuitable for distribution fitting
    #[error("degenerate sample: {0}")]
    DegenerateSample(String),

    /// A fit parameter left the domain of the power calibration
    #[error("numeric domain: {0}")]
    NumericDomain(String),

    /// Represents a bad fit of the amplitude distribution, for any reason
    #[error("bad fit: {0}")]
    BadFit(String),

    /// The inverter rejected physically inconsistent inputs
    #[error("inversion: {0}")]
    Inversion(String),

    /// A failure localized to one analysis window
    #[error("window {center} [{start}, {end}): {source}")]
    Window {
        center: usize,
        start: usize,
        end: usize,
        #[source]
        source: Box<RetrievalError>,
    },
}

impl RetrievalError {
    /// Attaches the identity of the window a failure occurred in.
    #[must_use]
    pub(crate) fn in_window(self, window: &Window) -> RetrievalError {
        RetrievalError::Window {
            center: window.center(),
            start: window.start,
            end: window.end,
            source: Box::new(self),
        }
    }
}
