//! Grouped statistics over a filtered (or full) view of the catalog.
//!
//! Every aggregate is recomputed from scratch per request and degrades on
//! its own: a missing column only disables the aggregate that needs it.

pub mod buckets;
pub mod correlation;
pub mod exploded;
pub mod timeline;

pub use buckets::{bucketed_means, BucketEdges, BucketStat};
pub use correlation::{correlation_matrix, pearson, CorrelationMatrix};
pub use exploded::{exploded_stats, GroupOrder, GroupStat};
pub use timeline::{release_years, ReleaseYears, YearCount};
