use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::debug;

use game_catalog_explorer::aggregate::GroupOrder;
use game_catalog_explorer::cli::charts::{
    self, CorrelationConfig, DashboardConfig, GroupStatsConfig, PriceBucketsConfig,
};
use game_catalog_explorer::cli::explore::{self, DetailConfig, FilterConfig};
use game_catalog_explorer::cli::open_session;
use game_catalog_explorer::config::ConfigOverrides;
use game_catalog_explorer::filter::{FilterPredicates, NumericRange};
use game_catalog_explorer::logging::init_tracing;
use game_catalog_explorer::session::GroupField;
use game_catalog_explorer::util::env;

#[derive(Parser, Debug)]
#[command(
    name = "catalog-explorer",
    version,
    about = "Explore a joined game catalog: facets, filters and grouped statistics"
)]
struct Cli {
    #[command(flatten)]
    source: SourceArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct SourceArgs {
    /// Directory holding the primary and auxiliary CSV files (env CATALOG_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    /// Primary catalog file name inside the data dir (env CATALOG_PRIMARY)
    #[arg(long, global = true)]
    primary: Option<String>,
    /// Delimiter of the genres column (env GENRE_DELIMITER, default ';')
    #[arg(long, global = true)]
    genre_delimiter: Option<String>,
    /// Delimiter of the tags column (env TAG_DELIMITER, default ';')
    #[arg(long, global = true)]
    tag_delimiter: Option<String>,
    /// Comma-separated price bucket edges, e.g. "-1,0,5,10,20,40"
    #[arg(long, global = true, allow_hyphen_values = true)]
    price_edges: Option<String>,
}

#[derive(Args, Debug, Default)]
struct FilterArgs {
    /// Case-insensitive substring of the title
    #[arg(long)]
    name: Option<String>,
    /// Developer to include (repeatable; any of)
    #[arg(long = "developer")]
    developers: Vec<String>,
    /// Genre every result must carry (repeatable; all of)
    #[arg(long = "genre")]
    genres: Vec<String>,
    /// Tag every result must carry (repeatable; all of)
    #[arg(long = "tag")]
    tags: Vec<String>,
    /// Lowest price to keep. Titles without a price are dropped, unless the
    /// range spans every observed price, in which case it filters nothing
    #[arg(long, allow_hyphen_values = true)]
    min_price: Option<f64>,
    /// Highest price to keep (same rule for titles without a price)
    #[arg(long)]
    max_price: Option<f64>,
}

impl FilterArgs {
    fn into_predicates(self) -> FilterPredicates {
        let mut p = FilterPredicates::new()
            .with_developers(self.developers)
            .with_genres(self.genres)
            .with_tags(self.tags);
        if let Some(name) = self.name {
            p = p.with_name(name);
        }
        let price = match (self.min_price, self.max_price) {
            (Some(lo), Some(hi)) => Some(NumericRange::new(lo, hi)),
            (Some(lo), None) => Some(NumericRange::at_least(lo)),
            (None, Some(hi)) => Some(NumericRange::at_most(hi)),
            (None, None) => None,
        };
        if let Some(range) = price {
            p = p.with_price(range);
        }
        p
    }
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum Field {
    Genres,
    Tags,
}

impl From<Field> for GroupField {
    fn from(f: Field) -> Self {
        match f {
            Field::Genres => GroupField::Genres,
            Field::Tags => GroupField::Tags,
        }
    }
}

#[derive(Subcommand, Debug)]
#[command(rename_all = "kebab-case")]
enum Commands {
    /// Row count, columns, per-source join status and load warnings
    Overview,
    /// Genre, tag and developer option lists
    Facets,
    /// Filtered table with its exact row count
    Filter {
        #[command(flatten)]
        filters: FilterArgs,
        /// Columns to print (comma-separated; default: all)
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,
        /// Rank by this numeric column, descending
        #[arg(long)]
        sort_by: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Full record of one title (default: first filtered row)
    Detail {
        #[command(flatten)]
        filters: FilterArgs,
        /// Identifier of the title to show
        #[arg(long)]
        id: Option<String>,
    },
    /// Mean of a column per price bucket
    PriceBuckets {
        #[command(flatten)]
        filters: FilterArgs,
        /// Column to average (default: positive_ratings)
        #[arg(long)]
        target: Option<String>,
    },
    /// Per-genre or per-tag counts and means
    GroupStats {
        #[command(flatten)]
        filters: FilterArgs,
        #[arg(long, value_enum, default_value = "genres")]
        field: Field,
        /// Columns to average (comma-separated)
        #[arg(long, value_delimiter = ',')]
        targets: Vec<String>,
        /// Sort by the mean of this column instead of by count
        #[arg(long)]
        sort_by_mean: Option<String>,
        /// Keep only the first N groups (env GROUP_TOP_N, default 15)
        #[arg(long)]
        top: Option<usize>,
    },
    /// Pairwise Pearson correlation of numeric columns
    Correlation {
        #[command(flatten)]
        filters: FilterArgs,
        /// Columns to correlate (comma-separated; default: price, ratings, playtime)
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,
    },
    /// Titles released per year
    Years {
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Every surface for one filter selection
    Dashboard {
        #[command(flatten)]
        filters: FilterArgs,
        #[arg(long)]
        id: Option<String>,
    },
}

fn main() -> Result<()> {
    env::init_env();
    init_tracing("info")?;

    let cli = Cli::parse();
    debug!(target = "cli", command = ?cli.command, "parsed");

    let session = open_session(ConfigOverrides {
        data_dir: cli.source.data_dir,
        primary_file: cli.source.primary,
        genre_delimiter: cli.source.genre_delimiter,
        tag_delimiter: cli.source.tag_delimiter,
        price_edges: cli.source.price_edges,
        top_n: None,
    })?;

    match cli.command {
        Commands::Overview => explore::overview(&session),
        Commands::Facets => explore::facets(&session),
        Commands::Filter {
            filters,
            columns,
            sort_by,
            limit,
        } => explore::filter(
            &session,
            FilterConfig {
                predicates: filters.into_predicates(),
                columns,
                sort_by,
                limit,
            },
        ),
        Commands::Detail { filters, id } => explore::detail(
            &session,
            DetailConfig {
                predicates: filters.into_predicates(),
                id,
            },
        ),
        Commands::PriceBuckets { filters, target } => charts::price_buckets(
            &session,
            PriceBucketsConfig {
                predicates: filters.into_predicates(),
                target,
            },
        ),
        Commands::GroupStats {
            filters,
            field,
            targets,
            sort_by_mean,
            top,
        } => charts::group_stats(
            &session,
            GroupStatsConfig {
                predicates: filters.into_predicates(),
                field: field.into(),
                targets,
                order: sort_by_mean.map_or(GroupOrder::Count, GroupOrder::Mean),
                top_n: top,
            },
        ),
        Commands::Correlation { filters, columns } => charts::correlation(
            &session,
            CorrelationConfig {
                predicates: filters.into_predicates(),
                columns,
            },
        ),
        Commands::Years { filters } => charts::years(&session, filters.into_predicates()),
        Commands::Dashboard { filters, id } => charts::dashboard(
            &session,
            DashboardConfig {
                predicates: filters.into_predicates(),
                id,
            },
        ),
    }
}
