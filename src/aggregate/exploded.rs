//! Aggregation over multi-valued fields.
//!
//! Each row is exploded into one entry per token of its delimited field, so a title tagged `Action;Indie;RPG` counts towards three groups.
//! Group counts therefore add up to the number of (row, token) pairs, not to
//! the number of rows.

use std::cmp::Ordering;
use std::collections::HashMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::catalog::{Catalog, MultiValuedField};
use crate::filter::FilteredView;
use crate::normalization::split_tokens;
use crate::outcome::{Outcome, Warning};

/// Metric groups are sorted by, descending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by", content = "column", rename_all = "snake_case")]
pub enum GroupOrder {
    Count,
    Mean(String),
}

/// Statistics of one exploded group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupStat {
    pub key: String,
    pub count: usize,
    /// Mean of each target column over the group's rows with a numeric
    /// value; `None` when no row had one.
    pub means: IndexMap<String, Option<f64>>,
}

impl GroupStat {
    pub fn mean(&self, column: &str) -> Option<f64> {
        self.means.get(column).copied().flatten()
    }
}

struct Accumulator {
    count: usize,
    sums: Vec<f64>,
    samples: Vec<usize>,
}

/// Explode `field` over the rows of `view`, group by token, and compute the
/// count plus the mean of each target. Targets the catalog lacks are
/// dropped with a warning; a missing `field` makes the whole view
/// unavailable.
pub fn exploded_stats(
    catalog: &Catalog,
    view: &FilteredView,
    field: &MultiValuedField,
    targets: &[&str],
    order: &GroupOrder,
    top_n: Option<usize>,
) -> Outcome<Vec<GroupStat>> {
    let field_col = match catalog.require_column(&field.column) {
        Ok(col) => col,
        Err(w) => {
            warn!(target = "aggregate", column = %field.column, "exploded aggregation unavailable");
            return Outcome::unavailable(w.to_string());
        }
    };

    let mut warnings: Vec<Warning> = Vec::new();
    let mut resolved: Vec<(&str, usize)> = Vec::new();
    for &column in targets {
        match catalog.require_column(column) {
            Ok(col) => resolved.push((column, col)),
            Err(w) => {
                warn!(target = "aggregate", column, "target column missing; dropped");
                warnings.push(w);
            }
        }
    }

    let mut groups: HashMap<&str, Accumulator> = HashMap::new();
    for &row in view.rows() {
        let Some(cell) = catalog.text(row, field_col) else {
            continue;
        };
        let values: Vec<Option<f64>> = resolved
            .iter()
            .map(|(_, col)| catalog.number(row, *col))
            .collect();
        for token in split_tokens(cell, field.delimiter) {
            let acc = groups.entry(token).or_insert_with(|| Accumulator {
                count: 0,
                sums: vec![0.0; resolved.len()],
                samples: vec![0; resolved.len()],
            });
            acc.count += 1;
            for (i, value) in values.iter().enumerate() {
                if let Some(v) = value {
                    acc.sums[i] += v;
                    acc.samples[i] += 1;
                }
            }
        }
    }

    let mut stats: Vec<GroupStat> = groups
        .into_iter()
        .map(|(key, acc)| GroupStat {
            key: key.to_string(),
            count: acc.count,
            means: resolved
                .iter()
                .enumerate()
                .map(|(i, (name, _))| {
                    let mean = (acc.samples[i] > 0).then(|| acc.sums[i] / acc.samples[i] as f64);
                    (name.to_string(), mean)
                })
                .collect(),
        })
        .collect();

    let order = match order {
        GroupOrder::Mean(column) if !resolved.iter().any(|(name, _)| *name == column.as_str()) => {
            warnings.push(Warning::missing_column("group statistics", column));
            &GroupOrder::Count
        }
        other => other,
    };
    stats.sort_by(|a, b| {
        let by_metric = match order {
            GroupOrder::Count => b.count.cmp(&a.count),
            GroupOrder::Mean(column) => match (a.mean(column), b.mean(column)) {
                (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
        };
        by_metric.then_with(|| a.key.cmp(&b.key))
    });
    if let Some(n) = top_n {
        stats.truncate(n);
    }

    Outcome::with_warnings(stats, warnings)
}
