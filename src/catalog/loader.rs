use std::{fs::File, io::BufReader, io::Read, path::Path};

use anyhow::{Context, Result};
use csv::{ByteRecord, ReaderBuilder};
use tracing::{info, warn};

use super::table::{clean_cell, Table};
use crate::outcome::{Warning, WarningKind};

/// A loaded source plus the warning raised when it could not be read.
#[derive(Debug, Clone)]
pub struct LoadedSource {
    pub table: Table,
    pub warning: Option<Warning>,
}

/// Parse CSV text (header row + data rows) into a [`Table`].
///
/// Ragged rows are accepted: short rows are padded with nulls and extra
/// cells are dropped. Cells that are not valid UTF-8 are decoded lossily
/// so one bad byte only affects its own cell.
pub fn load_table<R: Read>(name: &str, reader: R) -> Result<Table> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::None)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .byte_headers()
        .with_context(|| format!("reading header row of {name}"))?
        .iter()
        .map(|h| String::from_utf8_lossy(h).into_owned())
        .collect();
    let mut table = Table::new(name, headers);

    let mut rec = ByteRecord::new();
    let mut line = 1u64;
    let mut lossy = 0usize;
    while rdr
        .read_byte_record(&mut rec)
        .with_context(|| format!("reading {name} after line {line}"))?
    {
        line += 1;
        let row = rec
            .iter()
            .map(|raw| match std::str::from_utf8(raw) {
                Ok(text) => clean_cell(text),
                Err(_) => {
                    lossy += 1;
                    clean_cell(&String::from_utf8_lossy(raw))
                }
            })
            .collect();
        table.push_row(row);
    }
    if lossy > 0 {
        warn!(target = "loader", source = name, cells = lossy, "invalid utf-8 replaced");
    }
    Ok(table)
}

/// Load a CSV file. A missing or unreadable file yields an empty placeholder
/// table and a `missing_source` warning instead of an error.
pub fn load_source(name: &str, path: &Path) -> LoadedSource {
    let loaded = File::open(path)
        .with_context(|| format!("opening {}", path.display()))
        .and_then(|file| load_table(name, BufReader::with_capacity(1 << 20, file)));

    match loaded {
        Ok(table) => {
            info!(
                target = "loader",
                source = name,
                rows = table.len(),
                columns = table.headers().len(),
                "loaded source"
            );
            LoadedSource {
                table,
                warning: None,
            }
        }
        Err(e) => {
            warn!(
                target = "loader",
                source = name,
                path = %path.display(),
                error = %format!("{e:#}"),
                "source unavailable; continuing with an empty table"
            );
            LoadedSource {
                table: Table::empty(name),
                warning: Some(Warning::new(
                    WarningKind::MissingSource,
                    name,
                    format!("could not read {}: {e:#}", path.display()),
                )),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn normalizes_headers_and_cells() {
        let csv = "\u{feff}AppID , Name,Price\n10, Counter-Strike ,7.19\n20,,\n";
        let t = load_table("catalog", csv.as_bytes()).unwrap();
        assert_eq!(t.headers(), &["appid", "name", "price"]);
        assert_eq!(t.len(), 2);
        assert_eq!(t.value(0, "name"), Some("Counter-Strike"));
        assert_eq!(t.value(1, "name"), None);
        assert_eq!(t.value(1, "price"), None);
    }

    #[test]
    fn tolerates_ragged_rows() {
        let csv = "appid,name,price\n1,Foo\n2,Bar,9.99,extra\n";
        let t = load_table("catalog", csv.as_bytes()).unwrap();
        assert_eq!(t.len(), 2);
        assert_eq!(t.value(0, "price"), None);
        assert_eq!(t.value(1, "price"), Some("9.99"));
        assert_eq!(t.row(1).map(|r| r.len()), Some(3));
    }

    #[test]
    fn quoted_fields_keep_delimiters() {
        let csv = "appid,genres\n1,\"Action;Indie\"\n2,\"Strategy, Simulation\"\n";
        let t = load_table("catalog", csv.as_bytes()).unwrap();
        assert_eq!(t.value(0, "genres"), Some("Action;Indie"));
        assert_eq!(t.value(1, "genres"), Some("Strategy, Simulation"));
    }

    #[test]
    fn missing_file_degrades_to_empty_table() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_source("media", &dir.path().join("nope.csv"));
        assert!(loaded.table.headers().is_empty());
        assert!(loaded.table.is_empty());
        let warning = loaded.warning.unwrap();
        assert_eq!(warning.kind, WarningKind::MissingSource);
        assert_eq!(warning.source, "media");
    }

    #[test]
    fn reads_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("steam.csv");
        let mut f = File::create(&path).unwrap();
        writeln!(f, "appid,name").unwrap();
        writeln!(f, "10,Counter-Strike").unwrap();
        drop(f);

        let loaded = load_source("catalog", &path);
        assert!(loaded.warning.is_none());
        assert_eq!(loaded.table.value(0, "appid"), Some("10"));
    }

    #[test]
    fn invalid_utf8_only_touches_its_cell() {
        let mut bytes = b"appid,name,short_description\n1,Foo,fine\n2,Bar,caf".to_vec();
        bytes.push(0xE9);
        bytes.extend_from_slice(b"\n3,Baz,ok\n");

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("steam_description_data.csv");
        std::fs::write(&path, &bytes).unwrap();

        let loaded = load_source("description", &path);
        assert!(loaded.warning.is_none());
        assert_eq!(loaded.table.len(), 3);
        assert_eq!(loaded.table.value(1, "short_description"), Some("caf\u{fffd}"));
        assert_eq!(loaded.table.value(1, "name"), Some("Bar"));
        assert_eq!(loaded.table.value(2, "short_description"), Some("ok"));
    }
}
