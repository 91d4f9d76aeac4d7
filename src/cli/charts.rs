use anyhow::Result;
use serde::Serialize;
use tracing::info;

use crate::aggregate::GroupOrder;
use crate::filter::{FilterPredicates, FilteredView};
use crate::outcome::{Outcome, Warning};
use crate::session::{GroupField, Session};

use super::emit;

/// A chart computed over a filtered view, with the filter's own warnings
/// kept next to the chart's.
#[derive(Debug, Serialize)]
struct ChartReport<T: Serialize> {
    matched_rows: usize,
    filter_warnings: Vec<Warning>,
    chart: Outcome<T>,
}

#[derive(Debug, Clone, Default)]
pub struct PriceBucketsConfig {
    pub predicates: FilterPredicates,
    /// Column averaged per bucket; defaults to the positive ratings column.
    pub target: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GroupStatsConfig {
    pub predicates: FilterPredicates,
    pub field: GroupField,
    /// Columns averaged per group; defaults to ratings and playtime.
    pub targets: Vec<String>,
    pub order: GroupOrder,
    pub top_n: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct CorrelationConfig {
    pub predicates: FilterPredicates,
    /// Empty means the schema's numeric columns.
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct DashboardConfig {
    pub predicates: FilterPredicates,
    pub id: Option<String>,
}

fn chart<T: Serialize>(
    session: &Session,
    predicates: &FilterPredicates,
    compute: impl FnOnce(&FilteredView) -> Outcome<T>,
) -> Result<()> {
    let filtered = session.filter(predicates);
    let filter_warnings = filtered.warnings().to_vec();
    let view = filtered.into_data().unwrap_or_default();
    let chart = compute(&view);
    info!(
        target = "cli",
        matched_rows = view.len(),
        available = chart.is_available(),
        "chart computed"
    );
    emit(&ChartReport {
        matched_rows: view.len(),
        filter_warnings,
        chart,
    })
}

pub fn price_buckets(session: &Session, cfg: PriceBucketsConfig) -> Result<()> {
    let target = cfg
        .target
        .unwrap_or_else(|| session.catalog().schema().positive_ratings.clone());
    chart(session, &cfg.predicates, |view| {
        session.price_buckets(view, &target)
    })
}

pub fn group_stats(session: &Session, cfg: GroupStatsConfig) -> Result<()> {
    let schema = session.catalog().schema();
    let targets: Vec<&str> = if cfg.targets.is_empty() {
        vec![
            schema.positive_ratings.as_str(),
            schema.average_playtime.as_str(),
        ]
    } else {
        cfg.targets.iter().map(String::as_str).collect()
    };
    chart(session, &cfg.predicates, |view| {
        session.group_stats(view, cfg.field, &targets, &cfg.order, cfg.top_n)
    })
}

pub fn correlation(session: &Session, cfg: CorrelationConfig) -> Result<()> {
    let columns: Vec<&str> = cfg.columns.iter().map(String::as_str).collect();
    chart(session, &cfg.predicates, |view| {
        session.correlation(view, &columns)
    })
}

pub fn years(session: &Session, predicates: FilterPredicates) -> Result<()> {
    chart(session, &predicates, |view| session.release_years(view))
}

pub fn dashboard(session: &Session, cfg: DashboardConfig) -> Result<()> {
    emit(&session.dashboard(&cfg.predicates, cfg.id.as_deref()))
}
