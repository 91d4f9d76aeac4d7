use anyhow::{bail, Result};
use serde::Serialize;
use tracing::warn;

use crate::catalog::Catalog;
use crate::filter::FilteredView;
use crate::outcome::Outcome;

/// Right-closed bins `(e0, e1], (e1, e2], ..., (e_last, +inf)`.
///
/// The first edge is a sentinel below the smallest meaningful value (`-1`
/// for prices), so the first bin catches free titles. Values at or below it
/// fall outside every bin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketEdges {
    edges: Vec<f64>,
    labels: Vec<String>,
}

impl BucketEdges {
    /// Validate edges (finite, strictly increasing, at least one) and
    /// labels (one per bin). Missing labels are generated from the bounds.
    pub fn new(edges: Vec<f64>, labels: Option<Vec<String>>) -> Result<Self> {
        if edges.is_empty() {
            bail!("at least one bucket edge is required");
        }
        if edges.iter().any(|e| !e.is_finite()) {
            bail!("bucket edges must be finite numbers: {edges:?}");
        }
        if edges.windows(2).any(|w| w[0] >= w[1]) {
            bail!("bucket edges must be strictly increasing: {edges:?}");
        }
        let labels = match labels {
            Some(labels) if labels.len() != edges.len() => bail!(
                "expected {} bucket labels for {} edges, got {}",
                edges.len(),
                edges.len(),
                labels.len()
            ),
            Some(labels) => labels,
            None => generated_labels(&edges),
        };
        Ok(Self { edges, labels })
    }

    /// Price bins: free, $0-5, $5-10, $10-20, $20-40, $40+.
    pub fn price_default() -> Self {
        Self {
            edges: vec![-1.0, 0.0, 5.0, 10.0, 20.0, 40.0],
            labels: ["free", "$0-5", "$5-10", "$10-20", "$20-40", "$40+"]
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }

    /// Number of bins (equal to the number of edges; the last is open).
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Bin index for `value`, or `None` if it is at or below the sentinel.
    pub fn bucket_of(&self, value: f64) -> Option<usize> {
        if value <= self.edges[0] {
            return None;
        }
        let idx = self.edges.partition_point(|&edge| edge < value);
        Some(idx - 1)
    }

    fn bounds(&self, bucket: usize) -> (f64, Option<f64>) {
        (self.edges[bucket], self.edges.get(bucket + 1).copied())
    }
}

fn generated_labels(edges: &[f64]) -> Vec<String> {
    edges
        .iter()
        .enumerate()
        .map(|(i, lo)| match edges.get(i + 1) {
            Some(hi) => format!("({lo}, {hi}]"),
            None => format!("> {lo}"),
        })
        .collect()
}

/// One bin of a bucketed mean.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketStat {
    pub label: String,
    /// Exclusive lower bound.
    pub lower: f64,
    /// Inclusive upper bound; `None` for the open-ended top bin.
    pub upper: Option<f64>,
    /// Rows whose key fell into this bin.
    pub rows: usize,
    /// Mean of the target over rows with a numeric target. `None` means no
    /// data, which is different from a mean of zero.
    pub mean: Option<f64>,
}

/// Mean of `target` per bin of `key` over the rows of `view`.
pub fn bucketed_means(
    catalog: &Catalog,
    view: &FilteredView,
    key: &str,
    target: &str,
    edges: &BucketEdges,
) -> Outcome<Vec<BucketStat>> {
    let (key_col, target_col) = match (catalog.require_column(key), catalog.require_column(target)) {
        (Ok(k), Ok(t)) => (k, t),
        (Err(w), _) | (_, Err(w)) => {
            warn!(target = "aggregate", key, target_column = target, "bucketed means unavailable");
            return Outcome::unavailable(w.to_string());
        }
    };

    let mut rows = vec![0usize; edges.len()];
    let mut sums = vec![0.0f64; edges.len()];
    let mut samples = vec![0usize; edges.len()];
    for &row in view.rows() {
        let Some(bucket) = catalog.number(row, key_col).and_then(|v| edges.bucket_of(v)) else {
            continue;
        };
        rows[bucket] += 1;
        if let Some(value) = catalog.number(row, target_col) {
            sums[bucket] += value;
            samples[bucket] += 1;
        }
    }

    let stats = (0..edges.len())
        .map(|bucket| {
            let (lower, upper) = edges.bounds(bucket);
            BucketStat {
                label: edges.labels[bucket].clone(),
                lower,
                upper,
                rows: rows[bucket],
                mean: (samples[bucket] > 0).then(|| sums[bucket] / samples[bucket] as f64),
            }
        })
        .collect();
    Outcome::ready(stats)
}
