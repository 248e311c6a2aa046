//! Integration tests for the qtiles CLI surface: search rewriting and the
//! tile store commands.

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command as AssertCommand;
use predicates::prelude::*;
use tempfile::TempDir;

// =============================================================================
// Test Helpers
// =============================================================================

/// Test environment with an isolated config and tile store
struct TestEnv {
    _temp_dir: TempDir,
    config_path: PathBuf,
    tiles_path: PathBuf,
}

impl TestEnv {
    fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        let tiles_path = temp_dir.path().join("tiles.json");

        fs::write(
            &config_path,
            format!("tiles_path = {:?}\n", tiles_path.to_str().unwrap()),
        )
        .unwrap();

        Self {
            _temp_dir: temp_dir,
            config_path,
            tiles_path,
        }
    }

    /// Seed the persisted tile list with raw JSON (the storage format)
    fn seed_tiles(&self, json: &str) {
        fs::write(&self.tiles_path, json).unwrap();
    }

    /// Run qtiles with this test env's config
    fn qtiles(&self) -> AssertCommand {
        let mut cmd = qtiles_cmd();
        cmd.args(["--config", self.config_path.to_str().unwrap()]);
        cmd
    }
}

/// Get the qtiles binary command
fn qtiles_cmd() -> AssertCommand {
    AssertCommand::cargo_bin("qtiles").unwrap()
}

const SEEDED_TILES: &str = r#"[
  {
    "key": "hl",
    "label": "Interface language",
    "value": "&hl=en",
    "rawValue": "en",
    "selectLabel": "English"
  },
  {
    "key": "num",
    "label": "Results per page",
    "value": "&num=20",
    "rawValue": "20"
  }
]"#;

// =============================================================================
// search
// =============================================================================

#[test]
fn test_search_appends_saved_fragments() {
    let env = TestEnv::new();
    env.seed_tiles(SEEDED_TILES);

    env.qtiles()
        .args(["search", "--print", "cats"])
        .assert()
        .success()
        .stdout("https://www.google.com/search?q=cats&hl=en&num=20\n");
}

#[test]
fn test_search_without_saved_tiles() {
    let env = TestEnv::new();

    env.qtiles()
        .args(["search", "--print", "cats"])
        .assert()
        .success()
        .stdout("https://www.google.com/search?q=cats\n");
}

#[test]
fn test_search_encodes_the_query() {
    let env = TestEnv::new();

    env.qtiles()
        .args(["search", "--print", "tabby cats"])
        .assert()
        .success()
        .stdout("https://www.google.com/search?q=tabby%20cats\n");
}

#[test]
fn test_search_blank_query_produces_no_navigation() {
    let env = TestEnv::new();
    env.seed_tiles(SEEDED_TILES);

    env.qtiles()
        .args(["search", "--print", "   "])
        .assert()
        .success()
        .stdout("");
}

#[test]
fn test_search_trims_the_query() {
    let env = TestEnv::new();

    env.qtiles()
        .args(["search", "--print", "  cats  "])
        .assert()
        .success()
        .stdout("https://www.google.com/search?q=cats\n");
}

// =============================================================================
// tiles / clear
// =============================================================================

#[test]
fn test_tiles_lists_saved_fragments() {
    let env = TestEnv::new();
    env.seed_tiles(SEEDED_TILES);

    env.qtiles()
        .arg("tiles")
        .assert()
        .success()
        .stdout(predicate::str::contains("2 saved tile(s)."))
        .stdout(predicate::str::contains("&hl=en"))
        .stdout(predicate::str::contains("&num=20"));
}

#[test]
fn test_tiles_with_empty_store() {
    let env = TestEnv::new();

    env.qtiles()
        .arg("tiles")
        .assert()
        .success()
        .stdout(predicate::str::contains("No saved tiles."));
}

#[test]
fn test_clear_overwrites_the_store_wholesale() {
    let env = TestEnv::new();
    env.seed_tiles(SEEDED_TILES);

    env.qtiles().arg("clear").assert().success();

    let raw = fs::read_to_string(&env.tiles_path).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(parsed, serde_json::json!([]));

    env.qtiles()
        .arg("tiles")
        .assert()
        .success()
        .stdout(predicate::str::contains("No saved tiles."));
}

// =============================================================================
// configuration
// =============================================================================

#[test]
fn test_missing_explicit_config_fails() {
    qtiles_cmd()
        .args(["--config", "/nonexistent/qtiles.toml", "tiles"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("configuration file not found"));
}

#[test]
fn test_corrupt_store_is_reported() {
    let env = TestEnv::new();
    env.seed_tiles("not json");

    env.qtiles()
        .arg("tiles")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not valid JSON"));
}

#[test]
fn test_colliding_key_bindings_are_rejected() {
    let env = TestEnv::new();
    fs::write(
        &env.config_path,
        "[keys.global]\napply = \"Tab\"\n",
    )
    .unwrap();

    env.qtiles()
        .arg("tiles")
        .assert()
        .failure()
        .stderr(predicate::str::contains("bound to both"));
}
