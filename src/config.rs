//! Explorer configuration: where the sources live, how they join, and how
//! the aggregates are parameterized.
//!
//! Values resolve flag -> env -> default. Env keys:
//! `CATALOG_DATA_DIR`, `CATALOG_PRIMARY`, `CATALOG_ID_COLUMN`,
//! `GENRE_DELIMITER`, `TAG_DELIMITER`, `PRICE_BIN_EDGES`, `PRICE_BIN_LABELS`,
//! `GROUP_TOP_N`.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::aggregate::BucketEdges;
use crate::catalog::{CatalogSchema, JoinSpec};
use crate::util::env as env_util;

/// An auxiliary CSV file and how it joins onto the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct AuxiliarySource {
    pub file: String,
    pub join: JoinSpec,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExplorerConfig {
    pub data_dir: PathBuf,
    pub primary_file: String,
    pub auxiliaries: Vec<AuxiliarySource>,
    pub schema: CatalogSchema,
    pub price_edges: BucketEdges,
    /// Default truncation for genre / tag rankings.
    pub top_n: usize,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        let schema = CatalogSchema::default();
        Self {
            data_dir: PathBuf::from("data"),
            primary_file: "steam.csv".into(),
            auxiliaries: steam_auxiliaries(&schema),
            schema,
            price_edges: BucketEdges::price_default(),
            top_n: 15,
        }
    }
}

/// Auxiliary layout of the public Steam store export.
fn steam_auxiliaries(schema: &CatalogSchema) -> Vec<AuxiliarySource> {
    let one_to_one = |source: &str, file: &str| AuxiliarySource {
        file: file.into(),
        join: JoinSpec::one_to_one(source, "steam_appid"),
    };
    vec![
        one_to_one("description", "steam_description_data.csv"),
        one_to_one("media", "steam_media_data.csv"),
        one_to_one("support", "steam_support_info.csv"),
        one_to_one("requirements", "steam_requirements_data.csv"),
        AuxiliarySource {
            file: "steam_tags.csv".into(),
            join: JoinSpec::collapse(
                "tags",
                "appid",
                "tag",
                schema.tags.column.clone(),
                schema.tags.delimiter,
            ),
        },
    ]
}

/// Command-line overrides; `None` falls through to env / defaults.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub data_dir: Option<PathBuf>,
    pub primary_file: Option<String>,
    pub genre_delimiter: Option<String>,
    pub tag_delimiter: Option<String>,
    pub price_edges: Option<String>,
    pub top_n: Option<usize>,
}

impl ExplorerConfig {
    pub fn from_env() -> Result<Self> {
        Self::resolve(ConfigOverrides::default())
    }

    /// Build the configuration from overrides, then env, then defaults.
    pub fn resolve(overrides: ConfigOverrides) -> Result<Self> {
        env_util::init_env();
        let defaults = Self::default();

        let mut schema = defaults.schema.clone();
        if let Some(id) = env_util::env_opt("CATALOG_ID_COLUMN") {
            schema.id = id.trim().to_string();
        }
        if let Some(raw) = overrides
            .genre_delimiter
            .or_else(|| env_util::env_opt("GENRE_DELIMITER"))
        {
            schema.genres.delimiter = parse_delimiter(&raw).context("genre delimiter")?;
        }
        if let Some(raw) = overrides
            .tag_delimiter
            .or_else(|| env_util::env_opt("TAG_DELIMITER"))
        {
            schema.tags.delimiter = parse_delimiter(&raw).context("tag delimiter")?;
        }

        let edges = match overrides.price_edges {
            Some(raw) => Some(parse_edges(&raw)?),
            None => env_util::env_list("PRICE_BIN_EDGES")
                .map(|items| parse_edges(&items.join(",")))
                .transpose()?,
        };
        let labels = env_util::env_list("PRICE_BIN_LABELS");
        let price_edges = match (edges, labels) {
            (None, None) => defaults.price_edges,
            (Some(edges), labels) => BucketEdges::new(edges, labels).context("price buckets")?,
            (None, Some(_)) => bail!("PRICE_BIN_LABELS requires PRICE_BIN_EDGES"),
        };

        let data_dir = overrides
            .data_dir
            .or_else(|| env_util::env_opt("CATALOG_DATA_DIR").map(PathBuf::from))
            .unwrap_or(defaults.data_dir);
        let primary_file = overrides
            .primary_file
            .or_else(|| env_util::env_opt("CATALOG_PRIMARY"))
            .unwrap_or(defaults.primary_file);
        let top_n = overrides
            .top_n
            .unwrap_or_else(|| env_util::env_parse("GROUP_TOP_N", defaults.top_n));

        Ok(Self {
            data_dir,
            primary_file,
            auxiliaries: steam_auxiliaries(&schema),
            schema,
            price_edges,
            top_n,
        })
    }

    pub fn primary_path(&self) -> PathBuf {
        self.data_dir.join(&self.primary_file)
    }

    pub fn path_of(&self, file: &str) -> PathBuf {
        let p = Path::new(file);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.data_dir.join(p)
        }
    }
}

/// A delimiter is exactly one character; `tab` and `\t` mean a tab.
pub fn parse_delimiter(raw: &str) -> Result<char> {
    let raw = if raw.trim().is_empty() { raw } else { raw.trim() };
    if matches!(raw, "tab" | "\\t") {
        return Ok('\t');
    }
    let mut chars = raw.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => bail!("delimiter must be a single character, got {raw:?}"),
    }
}

/// Comma-separated, strictly increasing bin edges (`"-1,0,5,10"`).
pub fn parse_edges(raw: &str) -> Result<Vec<f64>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<f64>()
                .with_context(|| format!("invalid bucket edge {s:?}"))
        })
        .collect()
}
