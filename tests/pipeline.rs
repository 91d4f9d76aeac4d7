use std::fs;
use std::path::Path;

use game_catalog_explorer::aggregate::GroupOrder;
use game_catalog_explorer::catalog::{JoinSpec, SourceState};
use game_catalog_explorer::config::{AuxiliarySource, ExplorerConfig};
use game_catalog_explorer::{FilterPredicates, GroupField, NumericRange, Selection, Session, WarningKind};

fn write(dir: &Path, file: &str, body: &str) {
    fs::write(dir.join(file), body).unwrap();
}

fn config_for(dir: &Path) -> ExplorerConfig {
    ExplorerConfig {
        data_dir: dir.to_path_buf(),
        ..ExplorerConfig::default()
    }
}

#[test]
fn loads_joins_and_degrades_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    // BOM and padded, mixed-case headers
    write(
        dir.path(),
        "steam.csv",
        "\u{feff}AppID, Name ,developer,release_date,genres,price,positive_ratings,negative_ratings,average_playtime\n\
         1,Foo,Acme,2019-03-01,Action;Indie,0,100,10,30\n\
         2,Bar,Other,\"5 Jun, 2020\",RPG,10,50,5,60\n\
         3,Baz,Acme,soon,Action,4.99,,2,\n",
    );
    write(
        dir.path(),
        "steam_description_data.csv",
        "steam_appid,short_description\n1,A foo game\n2.0,A bar game\n",
    );
    write(dir.path(), "steam_media_data.csv", "appid,header_image\n1,foo.png\n");
    write(
        dir.path(),
        "steam_tags.csv",
        "appid,tag\n1,Roguelike\n1,Pixel Graphics\n1,Roguelike\n3,Roguelike\n",
    );
    // support and requirements files are absent

    let session = Session::open(&config_for(dir.path()));
    let catalog = session.catalog();
    assert_eq!(catalog.len(), 3);
    assert!(catalog.columns().iter().any(|c| c == "appid"));
    assert!(catalog.columns().iter().any(|c| c == "name"));

    let kinds: Vec<WarningKind> = catalog.warnings().iter().map(|w| w.kind).collect();
    assert_eq!(
        kinds.iter().filter(|k| **k == WarningKind::MissingSource).count(),
        2
    );
    assert!(kinds.contains(&WarningKind::JoinKeyMismatch));

    let states: Vec<(&str, SourceState)> = catalog
        .sources()
        .iter()
        .map(|s| (s.name.as_str(), s.state))
        .collect();
    assert!(states.contains(&("description", SourceState::Joined)));
    assert!(states.contains(&("media", SourceState::Skipped)));

    let row = catalog.row_for_id("2").unwrap();
    assert_eq!(catalog.table().value(row, "short_description"), Some("A bar game"));
    let row = catalog.row_for_id("1").unwrap();
    assert_eq!(catalog.table().value(row, "tags"), Some("Roguelike;Pixel Graphics"));

    let tags = session.facets().tags.data().unwrap();
    assert_eq!(tags, &vec!["Pixel Graphics".to_string(), "Roguelike".to_string()]);

    let view = session
        .filter(
            &FilterPredicates::new()
                .with_genres(["Action"])
                .with_price(NumericRange::at_most(5.0)),
        )
        .into_data()
        .unwrap();
    assert_eq!(view.len(), 2);

    let stats = session
        .group_stats(&view, GroupField::Tags, &[], &GroupOrder::Count, None)
        .into_data()
        .unwrap();
    assert_eq!(stats[0].key, "Roguelike");
    assert_eq!(stats[0].count, 2);

    let years = session.release_years(&view).into_data().unwrap();
    assert_eq!(years.unparsed, 1);
    assert_eq!(years.years.len(), 1);

    match session.select(&view, Some("2")) {
        Selection::NotFound { id } => assert_eq!(id, "2"),
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[test]
fn missing_primary_is_an_empty_session() {
    let dir = tempfile::tempdir().unwrap();
    let session = Session::open(&config_for(dir.path()));
    assert!(session.catalog().is_empty());

    let dashboard = session.dashboard(&FilterPredicates::new(), None);
    assert_eq!(dashboard.matched_rows, 0);
    assert_eq!(dashboard.selection, Selection::NoRows);
    assert!(!dashboard.genres.is_available());

    let overview = session.overview();
    assert!(overview
        .warnings
        .iter()
        .any(|w| w.kind == WarningKind::MissingSource && w.source == "catalog"));
}

#[test]
fn custom_auxiliary_layout() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "games.csv", "appid,name,price\n7,Seven,1\n8,Eight,2\n");
    write(dir.path(), "extra.csv", "game,studio_size\n7,12\n7,99\n");

    let config = ExplorerConfig {
        data_dir: dir.path().to_path_buf(),
        primary_file: "games.csv".into(),
        auxiliaries: vec![AuxiliarySource {
            file: "extra.csv".into(),
            join: JoinSpec::one_to_one("extra", "game"),
        }],
        ..ExplorerConfig::default()
    };
    let session = Session::open(&config);
    let catalog = session.catalog();
    assert_eq!(catalog.len(), 2);
    assert!(catalog
        .warnings()
        .iter()
        .any(|w| w.kind == WarningKind::DuplicateKey));
    let row = catalog.row_for_id("7").unwrap();
    assert_eq!(catalog.table().value(row, "studio_size"), Some("12"));
    let row = catalog.row_for_id("8").unwrap();
    assert_eq!(catalog.table().value(row, "studio_size"), None);
}
