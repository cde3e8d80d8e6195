use gpx_telemetry::parser::decode_str;
use std::path::Path;

fn load_fixture(path: &str) -> String {
    std::fs::read_to_string(format!("tests/fixtures/{path}")).unwrap()
}

fn decode_to_json(gpx: &str) -> serde_json::Value {
    serde_json::to_value(decode_str(gpx)).unwrap()
}

/// Compare decoded waypoints against the expected snapshot file.
/// When `UPDATE_SNAPSHOTS=1` is set, write/overwrite the expected file instead.
fn assert_snapshot(actual: &serde_json::Value, expected_path: &str) {
    let path = format!("tests/fixtures/expected/{expected_path}");

    if matches!(std::env::var("UPDATE_SNAPSHOTS").as_deref(), Ok("1")) {
        let dir = Path::new(&path).parent().unwrap();
        std::fs::create_dir_all(dir).unwrap();
        let pretty = serde_json::to_string_pretty(actual).unwrap();
        std::fs::write(&path, pretty.as_bytes()).unwrap();
        eprintln!("Updated snapshot: {path}");
        return;
    }

    let expected_str = std::fs::read_to_string(&path)
        .unwrap_or_else(|_| panic!("Expected file not found: {path}. Run with UPDATE_SNAPSHOTS=1 to generate."));
    let expected: serde_json::Value = serde_json::from_str(&expected_str)
        .unwrap_or_else(|e| panic!("Failed to parse {path}: {e}"));

    assert_eq!(
        *actual, expected,
        "Snapshot mismatch for {path}.\nRun with UPDATE_SNAPSHOTS=1 to update."
    );
}

fn assert_decoded_snapshot(fixture: &str, expected: &str) {
    let gpx = load_fixture(fixture);
    assert_snapshot(&decode_to_json(&gpx), expected);
}

// ---- basic/ ----

#[test]
fn snapshot_01_single_waypoint() {
    assert_decoded_snapshot(
        "basic/01_single_waypoint.gpx",
        "basic/01_single_waypoint.json",
    );
}

#[test]
fn snapshot_02_trace() {
    assert_decoded_snapshot("basic/02_trace.gpx", "basic/02_trace.json");
}

// ---- malformed/ ----

#[test]
fn snapshot_malformed_01_invalid_coordinates() {
    assert_decoded_snapshot(
        "malformed/01_invalid_coordinates.gpx",
        "malformed/01_invalid_coordinates.json",
    );
}

#[test]
fn snapshot_malformed_02_unclosed() {
    assert_decoded_snapshot("malformed/02_unclosed.gpx", "malformed/02_unclosed.json");
}
