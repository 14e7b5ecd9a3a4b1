use crate::error::{ForceError, Result};

// ── Descriptive statistics ────────────────────────────────────────────────────

/// Arithmetic mean. Returns `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (ddof = 1). Needs at least two values.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mu = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - mu).powi(2)).sum();
    Some((ss / (values.len() as f64 - 1.0)).sqrt())
}

pub fn min(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::min)
}

pub fn max(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::max)
}

// ── Histogram ─────────────────────────────────────────────────────────────────

/// Equal-width histogram over the data range.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    /// `bins + 1` ascending bin edges.
    pub edges: Vec<f64>,
    /// Count (or density) per bin.
    pub heights: Vec<f64>,
}

impl Histogram {
    pub fn bin_width(&self) -> f64 {
        match self.edges.as_slice() {
            [a, b, ..] => b - a,
            _ => 0.0,
        }
    }
}

/// Bin `values` into `bins` equal-width bins spanning `[min, max]`.
///
/// The last bin is closed on the right. With `density` the heights are
/// normalised so that the histogram integrates to one. A constant sample is
/// spread over `[v - 0.5, v + 0.5]`.
pub fn histogram(values: &[f64], bins: usize, density: bool) -> Result<Histogram> {
    if bins == 0 {
        return Err(ForceError::InvalidArgument(
            "histogram bin count must be positive".to_string(),
        ));
    }
    let (Some(lo), Some(hi)) = (min(values), max(values)) else {
        return Err(ForceError::InvalidArgument(
            "histogram input must not be empty".to_string(),
        ));
    };
    let (lo, hi) = if lo == hi { (lo - 0.5, hi + 0.5) } else { (lo, hi) };

    let edges = linspace(lo, hi, bins + 1);
    let width = (hi - lo) / bins as f64;
    let mut heights = vec![0.0; bins];
    for &v in values {
        let idx = (((v - lo) / width) as usize).min(bins - 1);
        heights[idx] += 1.0;
    }
    if density {
        let norm = values.len() as f64 * width;
        heights.iter_mut().for_each(|h| *h /= norm);
    }
    Ok(Histogram { edges, heights })
}

// ── Distributions ─────────────────────────────────────────────────────────────

/// `n` evenly spaced points from `start` to `end` inclusive.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n).map(|i| start + step * i as f64).collect()
        }
    }
}

/// Normal probability density.
pub fn normal_pdf(x: f64, mu: f64, sigma: f64) -> f64 {
    let z = (x - mu) / sigma;
    (-0.5 * z * z).exp() / (sigma * (2.0 * std::f64::consts::PI).sqrt())
}

/// Gaussian kernel density estimate with Scott's bandwidth.
#[derive(Debug, Clone)]
pub struct GaussianKde {
    samples: Vec<f64>,
    bandwidth: f64,
}

impl GaussianKde {
    /// Fit on `samples`; `bw_adjust` scales Scott's factor (0.5 draws a
    /// tighter curve than the default 1.0).
    ///
    /// Returns `None` for fewer than two samples or a zero-variance sample.
    pub fn fit(samples: &[f64], bw_adjust: f64) -> Option<Self> {
        let sigma = sample_std(samples)?;
        if sigma <= 0.0 || bw_adjust <= 0.0 {
            return None;
        }
        let scott = (samples.len() as f64).powf(-0.2);
        Some(Self {
            samples: samples.to_vec(),
            bandwidth: scott * bw_adjust * sigma,
        })
    }

    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    pub fn evaluate(&self, x: f64) -> f64 {
        let sum: f64 = self
            .samples
            .iter()
            .map(|s| normal_pdf(x, *s, self.bandwidth))
            .sum();
        sum / self.samples.len() as f64
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
