//! Explorer session: the catalog loaded and joined once, shared read-only by
//! every request.
//!
//! A [`Session`] is cheap to clone (it only holds `Arc`s) and every
//! operation takes `&self`, so concurrent callers each run an independent,
//! pure computation over the same catalog.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::aggregate::{
    bucketed_means, correlation_matrix, exploded_stats, release_years, BucketEdges, BucketStat,
    CorrelationMatrix, GroupOrder, GroupStat, ReleaseYears,
};
use crate::catalog::loader::load_source;
use crate::catalog::{Catalog, MultiValuedField, SourceStatus};
use crate::config::ExplorerConfig;
use crate::facets::FacetOptions;
use crate::filter::{apply_filters, FilterPredicates, FilteredView, Selection, TableProjection};
use crate::outcome::{Outcome, Warning};

/// Multi-valued field a grouped view explodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupField {
    Genres,
    Tags,
}

/// Summary of what was loaded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogOverview {
    pub rows: usize,
    pub columns: Vec<String>,
    pub sources: Vec<SourceStatus>,
    /// Role (`price`, `genres`, ...) -> whether its column is present.
    pub features: Vec<FeatureStatus>,
    pub warnings: Vec<Warning>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureStatus {
    pub role: String,
    pub column: String,
    pub available: bool,
}

/// Every output surface for one predicate set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub total_rows: usize,
    pub matched_rows: usize,
    pub filter_warnings: Vec<Warning>,
    pub table: Outcome<TableProjection>,
    pub selection: Selection,
    pub price_buckets: Outcome<Vec<BucketStat>>,
    pub genres: Outcome<Vec<GroupStat>>,
    pub tags: Outcome<Vec<GroupStat>>,
    pub correlation: Outcome<CorrelationMatrix>,
    pub release_years: Outcome<ReleaseYears>,
}

#[derive(Debug, Clone)]
pub struct Session {
    catalog: Arc<Catalog>,
    facets: Arc<FacetOptions>,
    price_edges: BucketEdges,
    top_n: usize,
}

impl Session {
    /// Load every configured source, join them and derive the facets. Read
    /// failures degrade into warnings, so this never fails.
    pub fn open(config: &ExplorerConfig) -> Self {
        let primary = load_source("catalog", &config.primary_path());
        let mut load_warnings: Vec<Warning> = primary.warning.into_iter().collect();

        let mut auxiliaries = Vec::with_capacity(config.auxiliaries.len());
        for aux in &config.auxiliaries {
            let loaded = load_source(&aux.join.source, &config.path_of(&aux.file));
            load_warnings.extend(loaded.warning);
            auxiliaries.push((aux.join.clone(), loaded.table));
        }

        let catalog = Catalog::build(primary.table, auxiliaries, config.schema.clone())
            .with_load_warnings(load_warnings);
        Self::from_catalog(catalog, config.price_edges.clone(), config.top_n)
    }

    pub fn from_catalog(catalog: Catalog, price_edges: BucketEdges, top_n: usize) -> Self {
        let facets = FacetOptions::from_catalog(&catalog);
        info!(
            target = "session",
            rows = catalog.len(),
            warnings = catalog.warnings().len(),
            "session ready"
        );
        Self {
            catalog: Arc::new(catalog),
            facets: Arc::new(facets),
            price_edges,
            top_n,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn facets(&self) -> &FacetOptions {
        &self.facets
    }

    pub fn overview(&self) -> CatalogOverview {
        let c = &self.catalog;
        CatalogOverview {
            rows: c.len(),
            columns: c.columns().to_vec(),
            sources: c.sources().to_vec(),
            features: c
                .schema()
                .roles()
                .into_iter()
                .map(|(role, column)| FeatureStatus {
                    role: role.to_string(),
                    column: column.to_string(),
                    available: c.table().has_column(column),
                })
                .collect(),
            warnings: c.warnings().to_vec(),
        }
    }

    pub fn filter(&self, predicates: &FilterPredicates) -> Outcome<FilteredView> {
        apply_filters(&self.catalog, predicates)
    }

    /// Filter, then rank by `column` descending and keep `n` rows.
    pub fn top(&self, predicates: &FilterPredicates, column: &str, n: usize) -> Outcome<FilteredView> {
        self.filter(predicates)
            .and_then(|view| view.top_n(&self.catalog, column, n))
    }

    pub fn select(&self, view: &FilteredView, id: Option<&str>) -> Selection {
        view.select(&self.catalog, id)
    }

    pub fn project(&self, view: &FilteredView, columns: &[&str]) -> Outcome<TableProjection> {
        view.project(&self.catalog, columns)
    }

    /// Mean of `target` per price bucket.
    pub fn price_buckets(&self, view: &FilteredView, target: &str) -> Outcome<Vec<BucketStat>> {
        bucketed_means(
            &self.catalog,
            view,
            &self.catalog.schema().price,
            target,
            &self.price_edges,
        )
    }

    pub fn group_stats(
        &self,
        view: &FilteredView,
        field: GroupField,
        targets: &[&str],
        order: &GroupOrder,
        top_n: Option<usize>,
    ) -> Outcome<Vec<GroupStat>> {
        exploded_stats(
            &self.catalog,
            view,
            self.field(field),
            targets,
            order,
            top_n.or(Some(self.top_n)),
        )
    }

    /// Correlation of `columns`, or of the schema's numeric columns when
    /// `columns` is empty.
    pub fn correlation(&self, view: &FilteredView, columns: &[&str]) -> Outcome<CorrelationMatrix> {
        if columns.is_empty() {
            correlation_matrix(&self.catalog, view, &self.catalog.schema().numeric_columns())
        } else {
            correlation_matrix(&self.catalog, view, columns)
        }
    }

    pub fn release_years(&self, view: &FilteredView) -> Outcome<ReleaseYears> {
        release_years(&self.catalog, view, &self.catalog.schema().release_date)
    }

    /// Every surface for `predicates`. Charts are computed over the filtered
    /// view; each one degrades independently of the others.
    pub fn dashboard(&self, predicates: &FilterPredicates, selected: Option<&str>) -> Dashboard {
        let schema = self.catalog.schema();
        let filtered = self.filter(predicates);
        let filter_warnings = filtered.warnings().to_vec();
        let view = filtered.into_data().unwrap_or_default();

        let table_columns = [
            schema.id.as_str(),
            schema.name.as_str(),
            schema.developer.as_str(),
            schema.release_date.as_str(),
            schema.price.as_str(),
            schema.genres.column.as_str(),
        ];
        let rating_targets = [
            schema.positive_ratings.as_str(),
            schema.average_playtime.as_str(),
        ];
        let by_rating = GroupOrder::Mean(schema.positive_ratings.clone());

        Dashboard {
            total_rows: self.catalog.len(),
            matched_rows: view.len(),
            filter_warnings,
            table: self.project(&view, &table_columns),
            selection: self.select(&view, selected),
            price_buckets: self.price_buckets(&view, &schema.positive_ratings),
            genres: self.group_stats(&view, GroupField::Genres, &rating_targets, &by_rating, None),
            tags: self.group_stats(&view, GroupField::Tags, &rating_targets, &GroupOrder::Count, None),
            correlation: self.correlation(&view, &[]),
            release_years: self.release_years(&view),
        }
    }

    fn field(&self, field: GroupField) -> &MultiValuedField {
        match field {
            GroupField::Genres => &self.catalog.schema().genres,
            GroupField::Tags => &self.catalog.schema().tags,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::test_support::{sample_catalog, table};
    use crate::catalog::CatalogSchema;
    use crate::filter::NumericRange;

    fn session(catalog: Catalog) -> Session {
        Session::from_catalog(catalog, BucketEdges::price_default(), 15)
    }

    #[test]
    fn end_to_end_scenario() {
        let primary = table(
            "catalog",
            "id,name,price,genres,positive_ratings\n1,Foo,0,Action;Indie,100\n2,Bar,10,RPG,50\n",
        );
        let schema = CatalogSchema {
            id: "id".into(),
            ..CatalogSchema::default()
        };
        let s = session(Catalog::from_table(primary, schema));

        let view = s
            .filter(&FilterPredicates::new().with_price(NumericRange::new(0.0, 0.0)))
            .into_data()
            .unwrap();
        assert_eq!(view.len(), 1);
        assert_eq!(s.catalog().id_of(view.rows()[0]), Some("1"));

        assert_eq!(
            s.facets().genres.data(),
            Some(&vec!["Action".to_string(), "Indie".to_string(), "RPG".to_string()])
        );

        let buckets = s
            .price_buckets(&FilteredView::all(s.catalog()), "positive_ratings")
            .into_data()
            .unwrap();
        let free = buckets.iter().find(|b| b.label == "free").unwrap();
        assert_eq!(free.mean, Some(100.0));
        assert_eq!(free.rows, 1);
    }

    #[test]
    fn clones_share_one_catalog() {
        let s = session(sample_catalog());
        let other = s.clone();
        assert!(std::ptr::eq(s.catalog(), other.catalog()));

        let before = s.catalog().len();
        let _ = other.filter(&FilterPredicates::new().with_name("dota"));
        assert_eq!(s.catalog().len(), before);
    }

    #[test]
    fn group_stats_default_to_configured_top_n() {
        let s = Session::from_catalog(sample_catalog(), BucketEdges::price_default(), 2);
        let view = FilteredView::all(s.catalog());
        let stats = s
            .group_stats(&view, GroupField::Genres, &[], &GroupOrder::Count, None)
            .into_data()
            .unwrap();
        assert_eq!(stats.len(), 2);
    }

    #[test]
    fn top_ranks_filtered_rows() {
        let s = session(sample_catalog());
        let top = s
            .top(&FilterPredicates::new().with_developers(["Valve"]), "average_playtime", 2)
            .into_data()
            .unwrap();
        let ids: Vec<&str> = top.rows().iter().filter_map(|&r| s.catalog().id_of(r)).collect();
        assert_eq!(ids, vec!["40", "10"]);
    }

    #[test]
    fn overview_reports_features() {
        let s = session(sample_catalog());
        let o = s.overview();
        assert_eq!(o.rows, 6);
        assert!(o.columns.contains(&"tags".to_string()));
        let ratings = o.features.iter().find(|f| f.role == "positive_ratings").unwrap();
        assert!(ratings.available);
    }

    #[test]
    fn dashboard_degrades_per_feature() {
        let primary = table("catalog", "appid,name,developer\n1,Foo,Acme\n2,Bar,Acme\n");
        let s = session(Catalog::from_table(primary, CatalogSchema::default()));
        let d = s.dashboard(&FilterPredicates::new().with_name("foo"), None);

        assert_eq!(d.total_rows, 2);
        assert_eq!(d.matched_rows, 1);
        assert!(d.table.is_available());
        assert!(!d.table.warnings().is_empty());
        assert!(d.selection.detail().is_some());
        assert!(!d.price_buckets.is_available());
        assert!(!d.genres.is_available());
        assert!(!d.correlation.is_available());
        assert!(!d.release_years.is_available());
    }

    #[test]
    fn dashboard_on_empty_result_is_explicit() {
        let s = session(sample_catalog());
        let d = s.dashboard(&FilterPredicates::new().with_name("zzz"), Some("10"));
        assert_eq!(d.matched_rows, 0);
        assert_eq!(d.selection, Selection::NoRows);
        assert_eq!(d.table.data().map(|t| t.row_count), Some(0));
        let buckets = d.price_buckets.into_data().unwrap();
        assert!(buckets.iter().all(|b| b.mean.is_none()));
    }
}
