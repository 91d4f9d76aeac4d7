//! Filter option universes derived from the full catalog.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::warn;

use crate::catalog::{Catalog, MultiValuedField};
use crate::normalization::split_tokens;
use crate::outcome::Outcome;

/// Selectable values for each facet, sorted and duplicate-free.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FacetOptions {
    pub genres: Outcome<Vec<String>>,
    pub tags: Outcome<Vec<String>>,
    pub developers: Outcome<Vec<String>>,
}

impl FacetOptions {
    pub fn from_catalog(catalog: &Catalog) -> Self {
        let schema = catalog.schema();
        Self {
            genres: multi_valued_options(catalog, &schema.genres),
            tags: multi_valued_options(catalog, &schema.tags),
            developers: single_valued_options(catalog, &schema.developer),
        }
    }
}

/// Every distinct trimmed token of a delimited column. Null cells are
/// ignored.
pub fn multi_valued_options(catalog: &Catalog, field: &MultiValuedField) -> Outcome<Vec<String>> {
    let col = match catalog.require_column(&field.column) {
        Ok(col) => col,
        Err(w) => {
            warn!(target = "facets", column = %field.column, "facet unavailable");
            return Outcome::unavailable(w.to_string());
        }
    };
    let options: BTreeSet<&str> = (0..catalog.len())
        .filter_map(|row| catalog.text(row, col))
        .flat_map(|cell| split_tokens(cell, field.delimiter))
        .collect();
    Outcome::ready(options.into_iter().map(str::to_string).collect())
}

/// Every distinct value of a single-valued column. Null cells are ignored.
pub fn single_valued_options(catalog: &Catalog, column: &str) -> Outcome<Vec<String>> {
    let col = match catalog.require_column(column) {
        Ok(col) => col,
        Err(w) => {
            warn!(target = "facets", column, "facet unavailable");
            return Outcome::unavailable(w.to_string());
        }
    };
    let options: BTreeSet<&str> = (0..catalog.len())
        .filter_map(|row| catalog.text(row, col))
        .collect();
    Outcome::ready(options.into_iter().map(str::to_string).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::test_support::{sample_catalog, table};
    use crate::catalog::CatalogSchema;

    #[test]
    fn genre_options_cover_every_token_once() {
        let c = sample_catalog();
        let genres = multi_valued_options(&c, &c.schema().genres).into_data().unwrap();
        assert_eq!(
            genres,
            vec!["Action", "Free to Play", "Indie", "RPG", "Simulation", "Strategy"]
        );

        let genre_col = c.require_column("genres").unwrap();
        for row in 0..c.len() {
            if let Some(cell) = c.text(row, genre_col) {
                for token in split_tokens(cell, ';') {
                    assert!(genres.iter().any(|g| g == token), "{token} missing");
                }
            }
        }
    }

    #[test]
    fn developer_options_skip_nulls() {
        let c = sample_catalog();
        let devs = single_valued_options(&c, "developer").into_data().unwrap();
        assert_eq!(devs, vec!["ConcernedApe", "Team Cherry", "Valve"]);
    }

    #[test]
    fn delimiter_is_per_field() {
        let primary = table(
            "catalog",
            "appid,name,genres\n1,A,\"Action, Indie\"\n2,B,\" Indie ,RPG\"\n",
        );
        let c = Catalog::from_table(primary, CatalogSchema::default());
        let field = MultiValuedField::new("genres", ',');
        let genres = multi_valued_options(&c, &field).into_data().unwrap();
        assert_eq!(genres, vec!["Action", "Indie", "RPG"]);
    }

    #[test]
    fn missing_column_is_unavailable() {
        let primary = table("catalog", "appid,name\n1,A\n");
        let c = Catalog::from_table(primary, CatalogSchema::default());
        let facets = FacetOptions::from_catalog(&c);
        assert!(!facets.genres.is_available());
        assert!(!facets.tags.is_available());
        assert!(!facets.developers.is_available());
    }
}
