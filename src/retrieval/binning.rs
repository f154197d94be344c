//! Adaptive histogram binning for echo magnitude samples.

/// Rule used to choose the histogram bin count for a magnitude sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinningPolicy {
    /// Bin width balanced against interquartile spread and sample count
    FreedmanDiaconis,
    /// Bin count from the base-2 logarithm of the sample count
    Sturges,
    /// Bin count from the square root of the sample count
    SquareRoot,
}

const MAX_BINS: usize = 512;

/// Histogram of a magnitude sample.
#[derive(Debug, Clone)]
pub(crate) struct Histogram {
    pub centers: Vec<f64>,
    pub counts: Vec<usize>,
    pub width: f64,
    pub samples: usize,
}

impl Histogram {
    /// Builds a histogram of `mags` with a bin count chosen by `policy`.
    /// A sample without spread collapses to a single bin at its value.
    pub(crate) fn build(mags: &[f64], policy: BinningPolicy) -> Histogram {
        let lo = mags.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = mags.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if hi <= lo {
            return Histogram {
                centers: vec![lo],
                counts: vec![mags.len()],
                width: 1.0,
                samples: mags.len(),
            };
        }

        let bins = bin_count(mags, policy, hi - lo);
        let width = (hi - lo) / bins as f64;
        let mut counts = vec![0_usize; bins];
        for &m in mags {
            let idx = (((m - lo) / width) as usize).min(bins - 1);
            counts[idx] += 1;
        }
        let centers = (0..bins)
            .map(|i| lo + (i as f64 + 0.5) * width)
            .collect();
        Histogram {
            centers,
            counts,
            width,
            samples: mags.len(),
        }
    }

    /// Center of the maximal-count bin, the distribution mode.
    pub(crate) fn mode(&self) -> f64 {
        let mut best = 0;
        for (i, &count) in self.counts.iter().enumerate() {
            if count > self.counts[best] {
                best = i;
            }
        }
        self.centers[best]
    }

    /// Number of bins holding at least one sample.
    pub(crate) fn occupied(&self) -> usize {
        self.counts.iter().filter(|&&c| c > 0).count()
    }

    /// Per-bin probability density.
    pub(crate) fn density(&self) -> Vec<f64> {
        let norm = self.samples as f64 * self.width;
        self.counts.iter().map(|&c| c as f64 / norm).collect()
    }
}

fn bin_count(mags: &[f64], policy: BinningPolicy, range: f64) -> usize {
    let n = mags.len();
    let bins = match policy {
        BinningPolicy::FreedmanDiaconis => {
            let mut sorted = mags.to_vec();
            sorted.sort_by(|a, b| a.total_cmp(b));
            let iqr = quartile(&sorted, 0.75) - quartile(&sorted, 0.25);
            let width = 2.0 * iqr / (n as f64).cbrt();
            if width > 0.0 {
                (range / width).ceil() as usize
            } else {
                sturges(n)
            }
        }
        BinningPolicy::Sturges => sturges(n),
        BinningPolicy::SquareRoot => (n as f64).sqrt().ceil() as usize,
    };
    bins.clamp(1, MAX_BINS)
}

fn sturges(n: usize) -> usize {
    (n as f64).log2().ceil() as usize + 1
}

/// Linearly interpolated quantile of an ascending-sorted sample.
fn quartile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let below = pos.floor() as usize;
    let above = pos.ceil() as usize;
    let frac = pos - below as f64;
    sorted[below] * (1.0 - frac) + sorted[above] * frac
}
