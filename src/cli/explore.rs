use anyhow::Result;
use serde::Serialize;
use tracing::{info, warn};

use crate::filter::{FilterPredicates, Selection, TableProjection};
use crate::outcome::{Outcome, Warning};
use crate::session::Session;

use super::emit;

#[derive(Debug, Clone, Default)]
pub struct FilterConfig {
    pub predicates: FilterPredicates,
    /// Columns to print; empty prints every column.
    pub columns: Vec<String>,
    /// Rank by this numeric column (descending) and keep `limit` rows.
    pub sort_by: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
struct FilterReport {
    total_rows: usize,
    matched_rows: usize,
    filter_warnings: Vec<Warning>,
    table: Outcome<TableProjection>,
}

#[derive(Debug, Clone, Default)]
pub struct DetailConfig {
    pub predicates: FilterPredicates,
    pub id: Option<String>,
}

pub fn overview(session: &Session) -> Result<()> {
    emit(&session.overview())
}

pub fn facets(session: &Session) -> Result<()> {
    emit(session.facets())
}

pub fn filter(session: &Session, cfg: FilterConfig) -> Result<()> {
    let filtered = session.filter(&cfg.predicates);
    let filter_warnings = filtered.warnings().to_vec();
    let view = filtered.into_data().unwrap_or_default();
    let matched_rows = view.len();

    let view = match (cfg.sort_by.as_deref(), cfg.limit) {
        (Some(column), limit) => {
            let n = limit.unwrap_or(matched_rows);
            match view.top_n(session.catalog(), column, n) {
                Outcome::Unavailable { reason } => {
                    warn!(target = "cli", %reason, "ranking skipped");
                    view
                }
                ranked => ranked.into_data().unwrap_or_default(),
            }
        }
        (None, Some(n)) => view.head(n),
        (None, None) => view,
    };

    let columns: Vec<&str> = cfg.columns.iter().map(String::as_str).collect();
    info!(target = "cli", matched_rows, shown = view.len(), "filter");
    emit(&FilterReport {
        total_rows: session.catalog().len(),
        matched_rows,
        filter_warnings,
        table: session.project(&view, &columns),
    })
}

pub fn detail(session: &Session, cfg: DetailConfig) -> Result<()> {
    let view = session
        .filter(&cfg.predicates)
        .into_data()
        .unwrap_or_default();
    let selection: Selection = session.select(&view, cfg.id.as_deref());
    emit(&selection)
}
