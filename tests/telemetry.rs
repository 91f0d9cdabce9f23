// Installing the global subscriber; kept in its own test binary since it
// can only happen once per process.

use bookcase::telemetry;
use tracing::Level;

#[test]
fn test_logs_go_to_the_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let log = dir.path().join("bookcase.log");

    let installed = telemetry::init(Some(&log), Level::INFO).expect("subscriber installs");
    assert!(installed);

    tracing::info!(book = 7, "loaded book");
    tracing::debug!("below the level");

    let written = std::fs::read_to_string(&log).expect("log file exists");
    assert!(written.contains("loaded book"));
    assert!(written.contains("book=7"));
    assert!(!written.contains("below the level"));

    // A second install fails; the first one stays in place.
    assert!(telemetry::init(Some(&log), Level::INFO).is_err());
}
