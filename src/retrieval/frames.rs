//! Along-track analysis-window generation.

use crate::retrieval::error::RetrievalError;

type Result<T> = std::result::Result<T, RetrievalError>;

/// A half-open index range `[start, end)` into a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: usize,
    pub end: usize,
}

impl Window {
    /// Midpoint of the inclusive index range, used as the output abscissa.
    pub fn center(&self) -> usize {
        (self.start + self.end - 1) / 2
    }

    /// Number of track bins inside the window.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// Computes the analysis windows for a track of `track_len` bins.
///
/// Starting offsets advance by `stride` while a full-size window still fits;
/// when the remaining tail would otherwise stay uncovered, one clipped
/// (shorter) window ending at the track length is appended. A window size of
/// at least the track length yields a single window spanning the whole track.
///
/// # Errors
/// Will return `Err` if `window_size` or `stride` is zero, or the track is
/// empty.
pub fn segment(track_len: usize, window_size: usize, stride: usize) -> Result<Vec<Window>> {
    if window_size == 0 {
        Err(RetrievalError::InvalidConfig(
            "window size must be positive".to_string(),
        ))?;
    }
    if stride == 0 {
        Err(RetrievalError::InvalidConfig(
            "stride must be positive".to_string(),
        ))?;
    }
    if track_len == 0 {
        Err(RetrievalError::InvalidConfig("track is empty".to_string()))?;
    }

    if window_size >= track_len {
        return Ok(vec![Window {
            start: 0,
            end: track_len,
        }]);
    }

    let mut windows = vec![];
    let mut start = 0;
    while start + window_size <= track_len {
        windows.push(Window {
            start,
            end: start + window_size,
        });
        start += stride;
    }
    if let Some(last) = windows.last() {
        if last.end < track_len && start < track_len {
            windows.push(Window {
                start,
                end: track_len,
            });
        }
    }
    Ok(windows)
}
