use std::collections::BTreeMap;

use serde::Serialize;

use crate::catalog::Catalog;
use crate::filter::FilteredView;
use crate::normalization::release_year;
use crate::outcome::Outcome;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearCount {
    pub year: i32,
    pub titles: usize,
}

/// Titles per release year, oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseYears {
    pub years: Vec<YearCount>,
    /// Rows whose release date is missing or could not be parsed.
    pub unparsed: usize,
}

pub fn release_years(catalog: &Catalog, view: &FilteredView, column: &str) -> Outcome<ReleaseYears> {
    let col = match catalog.require_column(column) {
        Ok(col) => col,
        Err(w) => return Outcome::unavailable(w.to_string()),
    };
    let mut per_year: BTreeMap<i32, usize> = BTreeMap::new();
    let mut unparsed = 0usize;
    for &row in view.rows() {
        match catalog.text(row, col).and_then(release_year) {
            Some(year) => *per_year.entry(year).or_default() += 1,
            None => unparsed += 1,
        }
    }
    Outcome::ready(ReleaseYears {
        years: per_year
            .into_iter()
            .map(|(year, titles)| YearCount { year, titles })
            .collect(),
        unparsed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::test_support::sample_catalog;

    #[test]
    fn counts_titles_per_year() {
        let c = sample_catalog();
        let out = release_years(&c, &FilteredView::all(&c), "release_date")
            .into_data()
            .unwrap();
        let years: Vec<i32> = out.years.iter().map(|y| y.year).collect();
        assert_eq!(years, vec![1999, 2000, 2013, 2016, 2017]);
        assert!(out.years.iter().all(|y| y.titles == 1));
        assert_eq!(out.unparsed, 1);
    }

    #[test]
    fn missing_column_is_unavailable() {
        let c = sample_catalog();
        assert!(!release_years(&c, &FilteredView::all(&c), "released").is_available());
    }
}
