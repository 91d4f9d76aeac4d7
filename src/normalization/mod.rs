//! Text normalization shared by the loader, the join engine and the
//! predicate / aggregation code.

pub mod date;
pub mod header;
pub mod numeric;
pub mod tokens;

pub use date::{parse_release_date, release_year};
pub use header::normalize_header;
pub use numeric::{normalize_key, parse_number};
pub use tokens::split_tokens;
