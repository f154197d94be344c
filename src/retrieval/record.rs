//! Terminal per-window record and ordered aggregation.

/// Every retrieved quantity for one analysis window. Created once by the
/// window processor and never mutated.
#[derive(Debug, Clone, Copy)]
pub struct WindowResult {
    /// Window center index, the output abscissa
    pub xo: usize,
    /// First track index inside the window
    pub xa: usize,
    /// Last track index inside the window
    pub xb: usize,
    /// Window mean longitude
    pub lon: f64,
    /// Window mean latitude
    pub lat: f64,
    /// Window mean roll angle
    pub roll: f64,
    /// Surface coherent received power in dB
    pub psc: f64,
    /// Surface incoherent received power in dB
    pub psn: f64,
    /// Bed coherent received power in dB
    pub pbc: f64,
    /// Bed incoherent received power in dB
    pub pbn: f64,
    /// Surface reflection coefficient in dB
    pub rsc: f64,
    /// Surface scattering coefficient in dB
    pub rsn: f64,
    /// Bed reflection coefficient in dB
    pub rbc: f64,
    /// Bed scattering coefficient in dB
    pub rbn: f64,
    /// Surface fit correlation metric
    pub crls: f64,
    /// Bed fit correlation metric
    pub crlb: f64,
    /// Relative permittivity of the propagation medium
    pub e1: f64,
    /// RMS surface roughness height in m
    pub sh: f64,
    /// Mean surface range in m
    pub h0: f64,
    /// Mean medium thickness in m
    pub h1: f64,
    /// Two-way attenuation term in dB
    pub q1: f64,
}

/// Orders collected window results by center index.
///
/// Completion order of the parallel workers is unspecified, so the table is
/// sorted explicitly before persistence rather than relying on collection
/// order.
#[must_use]
pub fn aggregate(mut results: Vec<WindowResult>) -> Vec<WindowResult> {
    results.sort_by_key(|r| (r.xo, r.xa));
    results
}
