//! Left joins of auxiliary tables onto the primary catalog.
//!
//! Every primary row survives a join exactly once. Auxiliary tables that
//! carry several rows per key are never allowed to fan out: row-per-tag
//! tables are collapsed into one delimiter-joined cell per key first, and
//! one-to-one tables keep the first row of a repeated key.

use std::collections::HashMap;

use indexmap::IndexMap;
use itertools::Itertools;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::table::Table;
use crate::normalization::normalize_key;
use crate::outcome::{Warning, WarningKind};

/// How an auxiliary table relates to the primary catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum JoinShape {
    /// At most one row per key; every non-key column is copied over.
    OneToOne,
    /// One row per (key, value) pair; values are joined with `delimiter`
    /// into `output_column` before the join.
    Collapse {
        value_column: String,
        output_column: String,
        delimiter: char,
    },
}

/// A declared auxiliary join: which source, which key column in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JoinSpec {
    pub source: String,
    /// Key column in the auxiliary table; may differ from the primary key
    /// name (`steam_appid` vs `appid`).
    pub key: String,
    pub shape: JoinShape,
}

impl JoinSpec {
    pub fn one_to_one(source: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            key: key.into(),
            shape: JoinShape::OneToOne,
        }
    }

    pub fn collapse(
        source: impl Into<String>,
        key: impl Into<String>,
        value_column: impl Into<String>,
        output_column: impl Into<String>,
        delimiter: char,
    ) -> Self {
        Self {
            source: source.into(),
            key: key.into(),
            shape: JoinShape::Collapse {
                value_column: value_column.into(),
                output_column: output_column.into(),
                delimiter,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceState {
    Joined,
    Skipped,
    /// Source had no readable content (already reported by the loader).
    Empty,
}

/// What happened to one source during catalog construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceStatus {
    pub name: String,
    /// Rows read from the source (after collapsing, for collapse joins).
    pub rows: usize,
    /// Primary rows that found a partner in this source.
    pub matched: usize,
    pub state: SourceState,
}

impl SourceStatus {
    fn skipped(name: &str, rows: usize) -> Self {
        Self {
            name: name.to_string(),
            rows,
            matched: 0,
            state: SourceState::Skipped,
        }
    }
}

/// Join `aux` onto `target` (in place) using the primary key column
/// `primary_key`. Returns the per-source status and any warnings.
pub fn left_join(
    target: &mut Table,
    primary_key: usize,
    spec: &JoinSpec,
    aux: &Table,
) -> (SourceStatus, Vec<Warning>) {
    if aux.headers().is_empty() {
        return (
            SourceStatus {
                name: spec.source.clone(),
                rows: 0,
                matched: 0,
                state: SourceState::Empty,
            },
            Vec::new(),
        );
    }

    let Some(aux_key) = aux.column_index(&spec.key) else {
        warn!(
            target = "join",
            source = %spec.source,
            key = %spec.key,
            "join key column missing; skipping join"
        );
        let warning = Warning::new(
            WarningKind::JoinKeyMismatch,
            &spec.source,
            format!("no '{}' column to join on; its attributes are unavailable", spec.key),
        );
        return (SourceStatus::skipped(&spec.source, aux.len()), vec![warning]);
    };

    match &spec.shape {
        JoinShape::OneToOne => join_one_to_one(target, primary_key, &spec.source, aux, aux_key),
        JoinShape::Collapse {
            value_column,
            output_column,
            delimiter,
        } => {
            let Some(value_idx) = aux.column_index(value_column) else {
                warn!(
                    target = "join",
                    source = %spec.source,
                    column = %value_column,
                    "value column missing; skipping collapse join"
                );
                return (
                    SourceStatus::skipped(&spec.source, aux.len()),
                    vec![Warning::missing_column(spec.source.clone(), value_column)],
                );
            };
            let collapsed = collapse_values(aux, aux_key, value_idx, output_column, *delimiter);
            debug!(
                target = "join",
                source = %spec.source,
                input_rows = aux.len(),
                keys = collapsed.len(),
                "collapsed multi-row source"
            );
            join_one_to_one(target, primary_key, &spec.source, &collapsed, 0)
        }
    }
}

/// Group `(key, value)` rows by key and join each key's values with
/// `delimiter`. Keys keep first-seen order; null values and repeats of a
/// value under the same key are dropped. The result has two columns:
/// `key` and `output_column`.
pub fn collapse_values(
    aux: &Table,
    key_idx: usize,
    value_idx: usize,
    output_column: &str,
    delimiter: char,
) -> Table {
    let mut grouped: IndexMap<String, Vec<&str>> = IndexMap::new();
    for row in 0..aux.len() {
        let Some(key) = aux.cell(row, key_idx).and_then(normalize_key) else {
            continue;
        };
        let values = grouped.entry(key).or_default();
        if let Some(value) = aux.cell(row, value_idx) {
            if !values.contains(&value) {
                values.push(value);
            }
        }
    }

    let key_name = aux
        .headers()
        .get(key_idx)
        .cloned()
        .unwrap_or_else(|| "key".to_string());
    let mut out = Table::new(aux.name(), vec![key_name, output_column.to_string()]);
    let sep = delimiter.to_string();
    for (key, values) in grouped {
        let joined = if values.is_empty() {
            None
        } else {
            Some(values.iter().join(&sep))
        };
        out.push_row(vec![Some(key), joined]);
    }
    out
}

fn join_one_to_one(
    target: &mut Table,
    primary_key: usize,
    source: &str,
    aux: &Table,
    aux_key: usize,
) -> (SourceStatus, Vec<Warning>) {
    let mut warnings = Vec::new();

    let mut by_key: HashMap<String, usize> = HashMap::with_capacity(aux.len());
    let mut repeated = 0usize;
    for row in 0..aux.len() {
        if let Some(key) = aux.cell(row, aux_key).and_then(normalize_key) {
            if by_key.contains_key(&key) {
                repeated += 1;
            } else {
                by_key.insert(key, row);
            }
        }
    }
    if repeated > 0 {
        warn!(
            target = "join",
            source,
            repeated,
            "source has repeated keys; keeping the first row per key"
        );
        warnings.push(Warning::new(
            WarningKind::DuplicateKey,
            source,
            format!("{repeated} row(s) share a key with an earlier row and were ignored"),
        ));
    }

    // (aux column, target column) pairs; the auxiliary key is not copied
    let mut columns: Vec<(usize, usize)> = Vec::new();
    for (aux_col, header) in aux.headers().iter().enumerate() {
        if aux_col == aux_key {
            continue;
        }
        let name = if target.has_column(header) {
            format!("{source}_{header}")
        } else {
            header.clone()
        };
        if target.has_column(&name) {
            debug!(target = "join", source, column = %header, "column already present; not copied");
            continue;
        }
        columns.push((aux_col, target.add_column(&name)));
    }

    let mut matched = 0usize;
    for row in 0..target.len() {
        let Some(key) = target.cell(row, primary_key).and_then(normalize_key) else {
            continue;
        };
        let Some(&aux_row) = by_key.get(&key) else {
            continue;
        };
        matched += 1;
        for &(aux_col, target_col) in &columns {
            let value = aux.cell(aux_row, aux_col).map(str::to_string);
            target.set_cell(row, target_col, value);
        }
    }

    info!(
        target = "join",
        source,
        rows = aux.len(),
        matched,
        columns = columns.len(),
        "joined source"
    );

    (
        SourceStatus {
            name: source.to_string(),
            rows: aux.len(),
            matched,
            state: SourceState::Joined,
        },
        warnings,
    )
}
