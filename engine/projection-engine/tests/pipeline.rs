//! End-to-end: simulation CSV -> store -> projections -> export

use projection_engine::{
    ColumnConfig, CsvRecordSource, ProjectionBuilder, ProjectionConfig, ProjectionStore,
    StatsConfig, TailResolution,
};
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::time::{Duration, SystemTime};

const TABLE: &str = "player,team,position,total_score_full_ppr,total_score_full_ppr_median,player_pass_tds,chart_source_full_ppr
Lamar Jackson,BAL,QB,24.1,23.5,1.9,\"[{\"\"pts\"\": 10, \"\"pct\"\": 95}, {\"\"pts\"\": 20, \"\"pct\"\": 60}, {\"\"pts\"\": 30, \"\"pct\"\": 25}, {\"\"pts\"\": 40, \"\"pct\"\": 3}]\"
Puka Nacua,LAR,WR,17.3,16.8,,\"[{\"\"pts\"\": 10, \"\"pct\"\": 80}, {\"\"pts\"\": 20, \"\"pct\"\": 30}]\"
Broken Curve,NYJ,TE,8.0,7.5,,\"[{\"\"pts\"\": 10, \"\"pct\"\"\"
";

fn write_table(path: &Path, contents: &str, modified: SystemTime) {
    std::fs::write(path, contents).unwrap();
    let file = OpenOptions::new().write(true).open(path).unwrap();
    file.set_modified(modified).unwrap();
}

fn store_for(path: &Path) -> ProjectionStore<CsvRecordSource> {
    let config = ProjectionConfig::default();
    ProjectionStore::new(
        CsvRecordSource::new(path, ColumnConfig::default()),
        ProjectionBuilder::new(&config.stats),
    )
}

#[test]
fn projections_from_simulation_table() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("table_setup.csv");
    write_table(&path, TABLE, SystemTime::now());

    let store = store_for(&path);
    let snapshot = store.ensure_fresh().unwrap();
    assert_eq!(snapshot.players().len(), 3);

    let lamar = snapshot.projection("lamar-jackson").unwrap();
    assert_eq!(lamar.mean, Some(24.1));
    assert_eq!(lamar.median, Some(23.5));
    assert_eq!(lamar.curve.len(), 4);
    // 0.05 crossed between (30, 0.25) and (40, 0.03)
    let expected = 30.0 + (0.05 - 0.25) / (0.03 - 0.25) * 10.0;
    assert!((lamar.ceiling.unwrap() - expected).abs() < 1e-9);
    assert_eq!(lamar.ceiling_resolution, Some(TailResolution::Interpolated));
    assert_eq!(lamar.extras.get("player_pass_tds"), Some(&Some(1.9)));

    // Truncated curve never reaches 5%
    let puka = snapshot.projection("puka-nacua").unwrap();
    assert_eq!(puka.ceiling, Some(20.0));
    assert_eq!(puka.ceiling_resolution, Some(TailResolution::LastAboveTarget));

    // Unparseable curve: mean/median still served, no ceiling
    let broken = snapshot.projection("broken-curve").unwrap();
    assert!(broken.curve.is_empty());
    assert_eq!(broken.ceiling, None);
    assert_eq!(broken.mean, Some(8.0));
}

#[test]
fn store_reloads_only_when_table_changes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("table_setup.csv");
    let first = SystemTime::now() - Duration::from_secs(3600);
    write_table(&path, "player,ceiling\nJoe Burrow,30.0\n", first);

    let store = store_for(&path);
    assert!(store.reload().unwrap());
    assert!(!store.reload().unwrap());
    assert_eq!(store.projection("joe-burrow").unwrap().ceiling, Some(30.0));

    write_table(&path, "player,ceiling\nJoe Burrow,34.5\n", first + Duration::from_secs(60));
    assert!(store.reload().unwrap());
    assert_eq!(store.projection("joe-burrow").unwrap().ceiling, Some(34.5));
    assert!(store.loaded_at().is_some());
}

#[test]
fn floor_and_custom_tail_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("table_setup.csv");
    write_table(&path, TABLE, SystemTime::now());

    let stats = StatsConfig { ceiling_tail: 0.25, floor_tail: Some(0.95), ..Default::default() };
    let store = ProjectionStore::new(
        CsvRecordSource::new(&path, ColumnConfig::default()),
        ProjectionBuilder::new(&stats),
    );

    let lamar = store.projection("lamar-jackson").unwrap();
    assert!((lamar.ceiling.unwrap() - 30.0).abs() < 1e-9);
    assert!((lamar.floor.unwrap() - 10.0).abs() < 1e-9);
}

#[test]
fn missing_table_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_for(&dir.path().join("nope.csv"));
    assert!(store.ensure_fresh().is_err());
    drop(File::create(dir.path().join("nope.csv")).unwrap());
    assert!(store.ensure_fresh().is_err());
}
