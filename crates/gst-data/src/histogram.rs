//! Fixed-binning count storage.
//!
//! One overflow policy for everything: a value below the axis minimum is an
//! underflow, a value at or above the maximum (or NaN) is an overflow, and
//! neither ever lands in a visible bin. 2-D storage keeps a single
//! out-of-range counter. Counts are integers, so accumulation is
//! commutative and two storages with equal binning merge by addition.

use serde::{Deserialize, Serialize};

// ── Axis ──────────────────────────────────────────────────────────────────────

/// A uniform axis with optional categorical labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Axis {
    pub bins: usize,
    pub min: f64,
    pub max: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
}

/// Where a value falls on an [`Axis`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinIndex {
    Underflow,
    Bin(usize),
    Overflow,
}

impl Axis {
    pub fn new(bins: usize, min: f64, max: f64) -> Self {
        Self {
            bins,
            min,
            max,
            labels: Vec::new(),
        }
    }

    /// An axis of `labels.len()` unit-width bins starting at zero.
    pub fn categorical(labels: Vec<String>) -> Self {
        Self {
            bins: labels.len(),
            min: 0.0,
            max: labels.len() as f64,
            labels,
        }
    }

    pub fn width(&self) -> f64 {
        (self.max - self.min) / self.bins as f64
    }

    pub fn find(&self, value: f64) -> BinIndex {
        if value.is_nan() || value >= self.max {
            return BinIndex::Overflow;
        }
        if value < self.min {
            return BinIndex::Underflow;
        }
        let bin = ((value - self.min) / (self.max - self.min) * self.bins as f64) as usize;
        // Rounding can push values just below max into `bins`.
        BinIndex::Bin(bin.min(self.bins - 1))
    }

    /// Lower edge of bin `i`.
    pub fn low_edge(&self, i: usize) -> f64 {
        self.min + i as f64 * self.width()
    }

    pub fn centre(&self, i: usize) -> f64 {
        self.low_edge(i) + 0.5 * self.width()
    }
}

// ── Hist1D ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hist1D {
    pub axis: Axis,
    pub counts: Vec<u64>,
    pub underflow: u64,
    pub overflow: u64,
    /// Number of fill calls, including under- and overflows.
    pub entries: u64,
}

impl Hist1D {
    pub fn new(axis: Axis) -> Self {
        let counts = vec![0; axis.bins];
        Self {
            axis,
            counts,
            underflow: 0,
            overflow: 0,
            entries: 0,
        }
    }

    pub fn fill(&mut self, value: f64) {
        self.entries += 1;
        match self.axis.find(value) {
            BinIndex::Underflow => self.underflow += 1,
            BinIndex::Overflow => self.overflow += 1,
            BinIndex::Bin(i) => self.counts[i] += 1,
        }
    }

    /// Sum of the visible bins.
    pub fn integral(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn max_count(&self) -> u64 {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    /// Add another histogram with identical binning.
    ///
    /// Returns `false` and leaves `self` untouched when the binning differs.
    pub fn merge(&mut self, other: &Hist1D) -> bool {
        if self.axis != other.axis {
            return false;
        }
        for (a, b) in self.counts.iter_mut().zip(&other.counts) {
            *a += b;
        }
        self.underflow += other.underflow;
        self.overflow += other.overflow;
        self.entries += other.entries;
        true
    }
}

// ── Hist2D ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hist2D {
    pub x_axis: Axis,
    pub y_axis: Axis,
    /// Row-major by y: `counts[iy * x_bins + ix]`.
    pub counts: Vec<u64>,
    pub out_of_range: u64,
    pub entries: u64,
}

impl Hist2D {
    pub fn new(x_axis: Axis, y_axis: Axis) -> Self {
        let counts = vec![0; x_axis.bins * y_axis.bins];
        Self {
            x_axis,
            y_axis,
            counts,
            out_of_range: 0,
            entries: 0,
        }
    }

    pub fn fill(&mut self, x: f64, y: f64) {
        self.entries += 1;
        match (self.x_axis.find(x), self.y_axis.find(y)) {
            (BinIndex::Bin(ix), BinIndex::Bin(iy)) => {
                self.counts[iy * self.x_axis.bins + ix] += 1;
            }
            _ => self.out_of_range += 1,
        }
    }

    pub fn get(&self, ix: usize, iy: usize) -> u64 {
        self.counts[iy * self.x_axis.bins + ix]
    }

    pub fn integral(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn max_count(&self) -> u64 {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    pub fn merge(&mut self, other: &Hist2D) -> bool {
        if self.x_axis != other.x_axis || self.y_axis != other.y_axis {
            return false;
        }
        for (a, b) in self.counts.iter_mut().zip(&other.counts) {
            *a += b;
        }
        self.out_of_range += other.out_of_range;
        self.entries += other.entries;
        true
    }
}

// ── Binned ────────────────────────────────────────────────────────────────────

/// Storage of either dimensionality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "dim", rename_all = "lowercase")]
pub enum Binned {
    #[serde(rename = "1d")]
    One(Hist1D),
    #[serde(rename = "2d")]
    Two(Hist2D),
}

impl Binned {
    pub fn entries(&self) -> u64 {
        match self {
            Binned::One(h) => h.entries,
            Binned::Two(h) => h.entries,
        }
    }

    pub fn integral(&self) -> u64 {
        match self {
            Binned::One(h) => h.integral(),
            Binned::Two(h) => h.integral(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
