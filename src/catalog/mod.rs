//! The joined, normalized catalog: one row per title.

pub mod join;
pub mod loader;
pub mod schema;
pub mod table;

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use tracing::{info, warn};

pub use join::{JoinShape, JoinSpec, SourceState, SourceStatus};
pub use schema::{CatalogSchema, MultiValuedField};
pub use table::Table;

use crate::normalization::{normalize_key, parse_number};
use crate::outcome::{Warning, WarningKind};

/// Ordered column -> value projection of one title.
pub type RecordDetail = IndexMap<String, Option<String>>;

/// Immutable catalog built once from the primary table plus its auxiliary
/// tables. All filtering and aggregation borrow it; nothing mutates it after
/// [`Catalog::build`] returns.
#[derive(Debug, Clone)]
pub struct Catalog {
    table: Table,
    schema: CatalogSchema,
    sources: Vec<SourceStatus>,
    warnings: Vec<Warning>,
    by_id: HashMap<String, usize>,
}

impl Catalog {
    /// Deduplicate the primary table on its identifier, then left-join every
    /// auxiliary table in order. Problems become warnings; the build itself
    /// cannot fail.
    pub fn build(
        primary: Table,
        auxiliaries: Vec<(JoinSpec, Table)>,
        schema: CatalogSchema,
    ) -> Self {
        let mut table = primary;
        let mut warnings = Vec::new();
        let mut sources = vec![SourceStatus {
            name: table.name().to_string(),
            rows: table.len(),
            matched: table.len(),
            state: if table.headers().is_empty() {
                SourceState::Empty
            } else {
                SourceState::Joined
            },
        }];

        let key_idx = table.column_index(&schema.id);
        match key_idx {
            Some(idx) => {
                let dropped = dedup_on_key(&mut table, idx);
                if dropped > 0 {
                    warn!(
                        target = "catalog",
                        column = %schema.id,
                        dropped,
                        "duplicate identifiers in primary table; kept first occurrence"
                    );
                    warnings.push(Warning::new(
                        WarningKind::DuplicateKey,
                        table.name().to_string(),
                        format!(
                            "{dropped} row(s) repeated an earlier '{}' and were dropped",
                            schema.id
                        ),
                    ));
                }
            }
            None if !table.headers().is_empty() => {
                warn!(
                    target = "catalog",
                    column = %schema.id,
                    "primary table has no identifier column; auxiliary joins skipped"
                );
                warnings.push(Warning::new(
                    WarningKind::JoinKeyMismatch,
                    table.name().to_string(),
                    format!(
                        "no '{}' column; auxiliary tables cannot be joined",
                        schema.id
                    ),
                ));
            }
            None => {}
        }

        for (spec, aux) in &auxiliaries {
            match key_idx {
                Some(idx) => {
                    let (status, join_warnings) = join::left_join(&mut table, idx, spec, aux);
                    sources.push(status);
                    warnings.extend(join_warnings);
                }
                None => sources.push(SourceStatus {
                    name: spec.source.clone(),
                    rows: aux.len(),
                    matched: 0,
                    state: SourceState::Skipped,
                }),
            }
        }

        let by_id = match key_idx {
            Some(idx) => (0..table.len())
                .filter_map(|row| Some((table.cell(row, idx).and_then(normalize_key)?, row)))
                .collect(),
            None => HashMap::new(),
        };

        info!(
            target = "catalog",
            rows = table.len(),
            columns = table.headers().len(),
            warnings = warnings.len(),
            "catalog ready"
        );

        Self {
            table,
            schema,
            sources,
            warnings,
            by_id,
        }
    }

    /// Catalog without auxiliary tables.
    pub fn from_table(primary: Table, schema: CatalogSchema) -> Self {
        Self::build(primary, Vec::new(), schema)
    }

    /// Fold warnings raised before the build (e.g. unreadable sources) into
    /// the catalog's own list.
    pub fn with_load_warnings(mut self, mut load: Vec<Warning>) -> Self {
        load.append(&mut self.warnings);
        self.warnings = load;
        self
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn schema(&self) -> &CatalogSchema {
        &self.schema
    }

    pub fn sources(&self) -> &[SourceStatus] {
        &self.sources
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        self.table.headers()
    }

    /// Index of `column`, or a `missing_column` warning naming it.
    pub fn require_column(&self, column: &str) -> Result<usize, Warning> {
        self.table
            .column_index(column)
            .ok_or_else(|| Warning::missing_column("catalog", column))
    }

    pub fn text(&self, row: usize, column: usize) -> Option<&str> {
        self.table.cell(row, column)
    }

    /// Numeric value of a cell; malformed values are `None`.
    pub fn number(&self, row: usize, column: usize) -> Option<f64> {
        self.text(row, column).and_then(parse_number)
    }

    /// Smallest and largest numeric value of a column, if it has any.
    pub fn numeric_bounds(&self, column: usize) -> Option<(f64, f64)> {
        (0..self.len())
            .filter_map(|row| self.number(row, column))
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    pub fn row_for_id(&self, id: &str) -> Option<usize> {
        self.by_id.get(&normalize_key(id)?).copied()
    }

    /// Identifier of a row, if the catalog has one.
    pub fn id_of(&self, row: usize) -> Option<&str> {
        let idx = self.table.column_index(&self.schema.id)?;
        self.text(row, idx)
    }

    /// Every column of one row, in catalog column order.
    pub fn record(&self, row: usize) -> RecordDetail {
        self.columns()
            .iter()
            .enumerate()
            .map(|(col, name)| (name.clone(), self.text(row, col).map(str::to_string)))
            .collect()
    }
}

/// Drop rows whose key repeats an earlier row's key. Rows without a key are
/// kept. Returns the number of dropped rows.
fn dedup_on_key(table: &mut Table, key_idx: usize) -> usize {
    let mut seen = HashSet::with_capacity(table.len());
    let keep: Vec<bool> = (0..table.len())
        .map(|row| match table.cell(row, key_idx).and_then(normalize_key) {
            Some(key) => seen.insert(key),
            None => true,
        })
        .collect();
    let dropped = keep.iter().filter(|k| !**k).count();
    if dropped > 0 {
        table.retain_rows(|row| keep[row]);
    }
    dropped
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn build_joins_and_indexes_ids() {
        let c = sample_catalog();
        assert_eq!(c.len(), 6);
        assert!(c.warnings().is_empty());
        let row = c.row_for_id("30").unwrap();
        assert_eq!(c.table().value(row, "tags"), Some("Farming Sim;Relaxing"));
        assert_eq!(c.id_of(row), Some("30"));
        assert_eq!(c.sources().len(), 2);
        assert_eq!(c.sources()[1].matched, 3);
    }

    #[test]
    fn duplicate_primary_ids_keep_first_row() {
        let primary = table("catalog", "appid,name\n1,First\n2,Other\n1,Second\n");
        let c = Catalog::from_table(primary, CatalogSchema::default());
        assert_eq!(c.len(), 2);
        assert_eq!(c.warnings()[0].kind, WarningKind::DuplicateKey);
        let row = c.row_for_id("1").unwrap();
        assert_eq!(c.table().value(row, "name"), Some("First"));
    }

    #[test]
    fn missing_primary_key_skips_joins() {
        let primary = table("catalog", "name\nFoo\n");
        let tags = table("tags", "appid,tag\n1,Action\n");
        let c = Catalog::build(
            primary,
            vec![(JoinSpec::collapse("tags", "appid", "tag", "tags", ';'), tags)],
            CatalogSchema::default(),
        );
        assert_eq!(c.len(), 1);
        assert_eq!(c.sources()[1].state, SourceState::Skipped);
        assert_eq!(c.warnings()[0].kind, WarningKind::JoinKeyMismatch);
        assert!(c.row_for_id("1").is_none());
    }

    #[test]
    fn numbers_and_bounds_ignore_malformed_cells() {
        let c = sample_catalog();
        let price = c.require_column("price").unwrap();
        assert_eq!(c.numeric_bounds(price), Some((0.0, 10.99)));
        let ratings = c.require_column("positive_ratings").unwrap();
        let hollow = c.row_for_id("50").unwrap();
        assert_eq!(c.number(hollow, ratings), None);
    }

    #[test]
    fn require_column_reports_missing() {
        let c = sample_catalog();
        let err = c.require_column("metacritic").unwrap_err();
        assert_eq!(err.kind, WarningKind::MissingColumn);
    }

    #[test]
    fn record_projection_follows_column_order() {
        let c = sample_catalog();
        let detail = c.record(c.row_for_id("10").unwrap());
        let keys: Vec<&str> = detail.keys().map(String::as_str).collect();
        assert_eq!(keys.first(), Some(&"appid"));
        assert_eq!(keys.last(), Some(&"tags"));
        assert_eq!(detail["developer"].as_deref(), Some("Valve"));
    }
}
