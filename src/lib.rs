pub mod aggregate;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod facets;
pub mod filter;
pub mod logging;
pub mod normalization;
pub mod outcome;
pub mod session;

pub mod util {
    pub mod env;
}

pub use catalog::{Catalog, CatalogSchema, RecordDetail};
pub use config::{ConfigOverrides, ExplorerConfig};
pub use filter::{FilterPredicates, FilteredView, NumericRange, Selection};
pub use outcome::{Outcome, Warning, WarningKind};
pub use session::{Dashboard, GroupField, Session};
