use serde::Serialize;
use tracing::{debug, warn};

use crate::catalog::Catalog;
use crate::filter::FilteredView;
use crate::outcome::{Outcome, Warning};

/// Symmetric Pearson correlation matrix.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    /// `values[i][j]` correlates `columns[i]` with `columns[j]`. `None`
    /// where a column has zero variance or there are fewer than two rows.
    pub values: Vec<Vec<Option<f64>>>,
    /// Rows with a numeric value in every selected column.
    pub observations: usize,
}

impl CorrelationMatrix {
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == a)?;
        let j = self.columns.iter().position(|c| c == b)?;
        self.values[i][j]
    }
}

/// Pearson coefficient of two equally long samples.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    let n = xs.len();
    if n < 2 || n != ys.len() {
        return None;
    }
    let mean_x = xs.iter().sum::<f64>() / n as f64;
    let mean_y = ys.iter().sum::<f64>() / n as f64;
    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x <= 0.0 || var_y <= 0.0 {
        return None;
    }
    Some((cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0))
}

/// Pairwise correlation of `columns` over the rows of `view` that have a
/// numeric value in all of them. Missing columns are dropped with a
/// warning; fewer than two usable columns makes the matrix unavailable.
pub fn correlation_matrix(
    catalog: &Catalog,
    view: &FilteredView,
    columns: &[&str],
) -> Outcome<CorrelationMatrix> {
    let mut warnings: Vec<Warning> = Vec::new();
    let mut resolved: Vec<(String, usize)> = Vec::new();
    for &column in columns {
        match catalog.require_column(column) {
            Ok(col) => resolved.push((catalog.columns()[col].clone(), col)),
            Err(w) => {
                warn!(target = "aggregate", column, "correlation column missing; dropped");
                warnings.push(w);
            }
        }
    }
    if resolved.len() < 2 {
        return Outcome::unavailable(format!(
            "correlation needs at least two numeric columns, found {}",
            resolved.len()
        ));
    }

    // column-major samples over complete rows only
    let mut samples: Vec<Vec<f64>> = vec![Vec::with_capacity(view.len()); resolved.len()];
    for &row in view.rows() {
        let values: Option<Vec<f64>> = resolved
            .iter()
            .map(|(_, col)| catalog.number(row, *col))
            .collect();
        if let Some(values) = values {
            for (sample, v) in samples.iter_mut().zip(values) {
                sample.push(v);
            }
        }
    }
    let observations = samples[0].len();
    debug!(target = "aggregate", observations, columns = resolved.len(), "correlation");

    let k = resolved.len();
    let mut values = vec![vec![None; k]; k];
    for i in 0..k {
        values[i][i] = pearson(&samples[i], &samples[i]).map(|_| 1.0);
        for j in (i + 1)..k {
            let r = pearson(&samples[i], &samples[j]);
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    Outcome::with_warnings(
        CorrelationMatrix {
            columns: resolved.into_iter().map(|(name, _)| name).collect(),
            values,
            observations,
        },
        warnings,
    )
}
