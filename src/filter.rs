//! Predicate sets and the filtered views they produce.
//!
//! A [`FilterPredicates`] value is built fresh for every interaction and
//! applied against the shared catalog. Unset predicates (empty text, empty
//! selection, full numeric range) impose no constraint; the rest are ANDed.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::catalog::{Catalog, RecordDetail};
use crate::normalization::split_tokens;
use crate::outcome::{Outcome, Warning};

/// Inclusive numeric range `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumericRange {
    pub min: f64,
    pub max: f64,
}

impl NumericRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn at_least(min: f64) -> Self {
        Self::new(min, f64::INFINITY)
    }

    pub fn at_most(max: f64) -> Self {
        Self::new(f64::NEG_INFINITY, max)
    }

    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }

    /// Whether the range spans everything in `[lo, hi]`.
    pub fn covers(&self, lo: f64, hi: f64) -> bool {
        self.min <= lo && self.max >= hi
    }
}

/// Range constraint on an arbitrary numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangePredicate {
    pub column: String,
    pub range: NumericRange,
}

/// User-supplied constraints. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterPredicates {
    /// Case-insensitive substring of the title name.
    pub name: String,
    /// Exact developer names; a row matches if its developer is one of them.
    pub developers: BTreeSet<String>,
    /// Every listed genre must be present on the row.
    pub genres: BTreeSet<String>,
    /// Every listed tag must be present on the row.
    pub tags: BTreeSet<String>,
    pub price: Option<NumericRange>,
    pub ranges: Vec<RangePredicate>,
}

impl FilterPredicates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, query: impl Into<String>) -> Self {
        self.name = query.into();
        self
    }

    pub fn with_developers<I, S>(mut self, developers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.developers = developers.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_genres<I, S>(mut self, genres: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.genres = genres.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_price(mut self, range: NumericRange) -> Self {
        self.price = Some(range);
        self
    }

    pub fn with_range(mut self, column: impl Into<String>, range: NumericRange) -> Self {
        self.ranges.push(RangePredicate {
            column: column.into(),
            range,
        });
        self
    }
}

enum Predicate {
    NameContains { col: usize, needle: String },
    DeveloperIn { col: usize, allowed: HashSet<String> },
    AllOf { col: usize, delimiter: char, wanted: Vec<String> },
    InRange { col: usize, range: NumericRange },
}

impl Predicate {
    fn matches(&self, catalog: &Catalog, row: usize) -> bool {
        match self {
            Predicate::NameContains { col, needle } => catalog
                .text(row, *col)
                .is_some_and(|name| name.to_lowercase().contains(needle.as_str())),
            Predicate::DeveloperIn { col, allowed } => catalog
                .text(row, *col)
                .is_some_and(|dev| allowed.contains(dev)),
            Predicate::AllOf {
                col,
                delimiter,
                wanted,
            } => match catalog.text(row, *col) {
                Some(cell) => {
                    let present: HashSet<&str> = split_tokens(cell, *delimiter).collect();
                    wanted.iter().all(|w| present.contains(w.as_str()))
                }
                None => false,
            },
            Predicate::InRange { col, range } => catalog
                .number(row, *col)
                .is_some_and(|v| range.contains(v)),
        }
    }
}

fn trimmed_set(values: &BTreeSet<String>) -> Vec<String> {
    let set: BTreeSet<&str> = values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .collect();
    set.into_iter().map(str::to_string).collect()
}

/// Resolve the set predicates against the catalog's columns. Predicates on
/// missing columns are dropped and reported.
fn compile(catalog: &Catalog, predicates: &FilterPredicates) -> (Vec<Predicate>, Vec<Warning>) {
    let schema = catalog.schema();
    let mut compiled = Vec::new();
    let mut warnings = Vec::new();

    let require = |column: &str, warnings: &mut Vec<Warning>| match catalog.require_column(column) {
        Ok(col) => Some(col),
        Err(w) => {
            warn!(target = "filter", column, "predicate disabled; column missing");
            warnings.push(w);
            None
        }
    };

    // whitespace-only queries are unset; otherwise the query is matched as given
    let needle = predicates.name.to_lowercase();
    if !needle.trim().is_empty() {
        if let Some(col) = require(&schema.name, &mut warnings) {
            compiled.push(Predicate::NameContains { col, needle });
        }
    }

    let developers = trimmed_set(&predicates.developers);
    if !developers.is_empty() {
        if let Some(col) = require(&schema.developer, &mut warnings) {
            compiled.push(Predicate::DeveloperIn {
                col,
                allowed: developers.into_iter().collect(),
            });
        }
    }

    for (field, wanted) in [
        (&schema.genres, trimmed_set(&predicates.genres)),
        (&schema.tags, trimmed_set(&predicates.tags)),
    ] {
        if wanted.is_empty() {
            continue;
        }
        if let Some(col) = require(&field.column, &mut warnings) {
            compiled.push(Predicate::AllOf {
                col,
                delimiter: field.delimiter,
                wanted,
            });
        }
    }

    let ranges = predicates
        .price
        .map(|range| (schema.price.as_str(), range))
        .into_iter()
        .chain(predicates.ranges.iter().map(|r| (r.column.as_str(), r.range)));
    for (column, range) in ranges {
        let Some(col) = require(column, &mut warnings) else {
            continue;
        };
        let full_range = catalog
            .numeric_bounds(col)
            .is_some_and(|(lo, hi)| range.covers(lo, hi));
        if full_range {
            debug!(target = "filter", column, "range spans the whole catalog; ignored");
            continue;
        }
        compiled.push(Predicate::InRange { col, range });
    }

    (compiled, warnings)
}

/// Rows of the catalog matching every set predicate, in catalog order.
pub fn apply_filters(catalog: &Catalog, predicates: &FilterPredicates) -> Outcome<FilteredView> {
    let (compiled, warnings) = compile(catalog, predicates);
    let rows: Vec<usize> = (0..catalog.len())
        .filter(|&row| compiled.iter().all(|p| p.matches(catalog, row)))
        .collect();
    debug!(
        target = "filter",
        predicates = compiled.len(),
        matched = rows.len(),
        total = catalog.len(),
        "filter applied"
    );
    Outcome::with_warnings(FilteredView { rows }, warnings)
}

/// Row indices into the catalog that survived a filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilteredView {
    rows: Vec<usize>,
}

impl FilteredView {
    /// View over every catalog row.
    pub fn all(catalog: &Catalog) -> Self {
        Self {
            rows: (0..catalog.len()).collect(),
        }
    }

    pub fn rows(&self) -> &[usize] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The first `n` rows, in view order.
    pub fn head(&self, n: usize) -> FilteredView {
        Self {
            rows: self.rows.iter().copied().take(n).collect(),
        }
    }

    /// Default selection: the first row of the view, if any.
    pub fn first(&self) -> Option<usize> {
        self.rows.first().copied()
    }

    /// The `n` rows with the largest value of `column`, descending. Ties keep
    /// view order; rows without a numeric value sort last.
    pub fn top_n(&self, catalog: &Catalog, column: &str, n: usize) -> Outcome<FilteredView> {
        let col = match catalog.require_column(column) {
            Ok(col) => col,
            Err(w) => return Outcome::unavailable(w.to_string()),
        };
        let mut keyed: Vec<(usize, Option<f64>)> = self
            .rows
            .iter()
            .map(|&row| (row, catalog.number(row, col)))
            .collect();
        keyed.sort_by(|a, b| match (a.1, b.1) {
            (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
        keyed.truncate(n);
        Outcome::ready(FilteredView {
            rows: keyed.into_iter().map(|(row, _)| row).collect(),
        })
    }

    /// Requested columns of every row in the view. Unknown columns are left
    /// out and reported; if none of them exist the projection is unavailable.
    pub fn project(&self, catalog: &Catalog, columns: &[&str]) -> Outcome<TableProjection> {
        let mut warnings = Vec::new();
        let mut resolved: Vec<(String, usize)> = Vec::new();
        for column in columns {
            match catalog.require_column(column) {
                Ok(col) => resolved.push((catalog.columns()[col].clone(), col)),
                Err(w) => warnings.push(w),
            }
        }
        if resolved.is_empty() && !columns.is_empty() {
            return Outcome::unavailable("none of the requested columns exist in the catalog");
        }
        if columns.is_empty() {
            resolved = catalog
                .columns()
                .iter()
                .cloned()
                .enumerate()
                .map(|(i, name)| (name, i))
                .collect();
        }

        let rows = self
            .rows
            .iter()
            .map(|&row| {
                resolved
                    .iter()
                    .map(|(name, col)| (name.clone(), catalog.text(row, *col).map(str::to_string)))
                    .collect()
            })
            .collect();
        Outcome::with_warnings(
            TableProjection {
                columns: resolved.into_iter().map(|(name, _)| name).collect(),
                row_count: self.len(),
                rows,
            },
            warnings,
        )
    }

    /// Detail of the record with `id`, or of the view's first row when no id
    /// is given. Never indexes into an empty view.
    pub fn select(&self, catalog: &Catalog, id: Option<&str>) -> Selection {
        if self.is_empty() {
            return Selection::NoRows;
        }
        let row = match id {
            None => self.first(),
            Some(id) => catalog
                .row_for_id(id)
                .filter(|row| self.rows.contains(row)),
        };
        match row {
            Some(row) => Selection::Record {
                detail: catalog.record(row),
            },
            None => Selection::NotFound {
                id: id.unwrap_or_default().to_string(),
            },
        }
    }
}

/// Tabular slice of a filtered view, ready for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableProjection {
    pub columns: Vec<String>,
    pub row_count: usize,
    pub rows: Vec<IndexMap<String, Option<String>>>,
}

/// Outcome of picking one record out of a view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "selection", rename_all = "snake_case")]
pub enum Selection {
    Record { detail: RecordDetail },
    /// The view is empty; there is nothing to select.
    NoRows,
    /// The requested id is not part of the view.
    NotFound { id: String },
}

impl Selection {
    pub fn detail(&self) -> Option<&RecordDetail> {
        match self {
            Selection::Record { detail } => Some(detail),
            _ => None,
        }
    }
}
