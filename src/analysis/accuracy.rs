use super::TestLog;
use crate::util::{mean, quantile, rolling_mean, transform_by_group};
use itertools::Itertools;

/// Decile bins over the error-and-backspace rate. Quantile edges that
/// coincide are merged, so heavily skewed data yields fewer than ten bins.
#[derive(Debug, Clone, PartialEq)]
pub struct AccuracyBins {
    edges: Vec<f64>,
    assignments: Vec<usize>,
}

impl AccuracyBins {
    pub fn deciles(rates: &[f64]) -> Self {
        let sorted: Vec<f64> = rates.iter().copied().sorted_by(f64::total_cmp).collect();
        let edges: Vec<f64> = (0..=10)
            .filter_map(|q| quantile(&sorted, q as f64 / 10.0))
            .dedup()
            .collect();
        let assignments = rates.iter().map(|rate| bin_of(&edges, *rate)).collect();
        Self { edges, assignments }
    }

    pub fn len(&self) -> usize {
        match self.edges.len() {
            0 | 1 => self.edges.len(),
            n => n - 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Bin index per input row.
    pub fn assignments(&self) -> &[usize] {
        &self.assignments
    }

    /// The lowest bin is closed on both ends, the rest are left-open.
    pub fn label(&self, bin: usize) -> String {
        if self.edges.len() < 2 {
            let v = self.edges.first().copied().unwrap_or_default();
            return format!("[{v:.3}, {v:.3}]");
        }
        let (lo, hi) = (self.edges[bin], self.edges[bin + 1]);
        if bin == 0 {
            format!("[{lo:.3}, {hi:.3}]")
        } else {
            format!("({lo:.3}, {hi:.3}]")
        }
    }
}

fn bin_of(edges: &[f64], rate: f64) -> usize {
    if edges.len() < 2 {
        return 0;
    }
    edges[1..]
        .iter()
        .position(|hi| rate <= *hi)
        .unwrap_or(edges.len() - 2)
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinRollingPoint {
    pub chronological_number: usize,
    pub bin: usize,
    pub rolling_wpm: Option<f64>,
}

/// Trailing rolling mean WPM computed inside each bin independently,
/// while every point keeps its chronological position.
pub fn rolling_wpm_by_bin(log: &TestLog, bins: &AccuracyBins, window: usize) -> Vec<BinRollingPoint> {
    let indices: Vec<usize> = (0..log.len()).collect();
    let rolled = transform_by_group(
        &indices,
        |&i| bins.assignments()[i],
        |members| {
            let wpm: Vec<f64> = members.iter().map(|&i| log.records()[i].wpm).collect();
            rolling_mean(&wpm, window)
        },
    );
    log.chronological_numbers()
        .into_iter()
        .zip(bins.assignments())
        .zip(rolled)
        .map(|((chronological_number, bin), rolling_wpm)| BinRollingPoint {
            chronological_number,
            bin: *bin,
            rolling_wpm,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinSummary {
    pub label: String,
    pub mean_wpm: f64,
    pub tests: usize,
}

pub fn mean_wpm_by_bin(log: &TestLog, bins: &AccuracyBins) -> Vec<BinSummary> {
    (0..bins.len())
        .map(|bin| {
            let wpm: Vec<f64> = log
                .records()
                .iter()
                .zip(bins.assignments())
                .filter(|(_, b)| **b == bin)
                .map(|(r, _)| r.wpm)
                .collect();
            BinSummary {
                label: bins.label(bin),
                mean_wpm: mean(&wpm).unwrap_or_default(),
                tests: wpm.len(),
            }
        })
        .collect()
}
