//! CLI integration tests using assert_cmd.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const OFFLINE_CONFIG: &str = r#"
data_dir = "data"

[generator]
type = "mock"

[game]
round_size = 2
countdown_ticks = 0
"#;

/// A scratch directory holding an offline `perlan.toml`.
fn workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("perlan.toml"), OFFLINE_CONFIG).unwrap();
    dir
}

fn perlan(dir: &Path) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("perlan").unwrap();
    cmd.current_dir(dir)
        .env_remove("PERLAN_REMOTE_URL")
        .env_remove("PERLAN_REMOTE_KEY")
        .env_remove("PERLAN_OPENAI_KEY");
    cmd
}

const PACK: &str = r#"
[pack]
name = "Harbour"

[[questions]]
id = "harbour-1"
category = "history"
text = "Year Reykjavik got its town charter?"
options = ["1786", "1874", "1918"]
correct_index = 0
fact = "Only about 170 people lived there."

[[questions]]
id = "harbour-2"
category = "water"
text = "Blue Lagoon water is heated by?"
options = ["A power plant", "The sun", "A volcano"]
correct_index = 0
fact = "Svartsengi runoff fills the lagoon."
"#;

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    perlan(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created perlan.toml"))
        .stdout(predicate::str::contains("Created content/example.toml"));

    assert!(dir.path().join("perlan.toml").exists());
    assert!(dir.path().join("content/example.toml").exists());

    perlan(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn init_pack_validates() {
    let dir = TempDir::new().unwrap();
    perlan(dir.path()).arg("init").assert().success();

    perlan(dir.path())
        .args(["validate", "content/example.toml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 questions, 1 modules"))
        .stdout(predicate::str::contains("All content packs valid"));
}

#[test]
fn offline_sync_reports_offline() {
    let dir = workspace();

    perlan(dir.path())
        .arg("sync")
        .assert()
        .success()
        .stdout(predicate::str::contains("offline"))
        .stdout(predicate::str::contains("questions: offline"));
}

#[test]
fn file_remote_is_seeded_on_first_sync() {
    let dir = workspace();
    std::fs::write(
        dir.path().join("perlan.toml"),
        "data_dir = \"data\"\n\n[remote]\ntype = \"file\"\ndir = \"remote\"\n",
    )
    .unwrap();

    perlan(dir.path())
        .arg("sync")
        .assert()
        .success()
        .stdout(predicate::str::contains("questions: seeded"))
        .stdout(predicate::str::contains("modules:   seeded"));
    assert!(dir.path().join("remote/questions.json").exists());

    perlan(dir.path())
        .arg("sync")
        .assert()
        .success()
        .stdout(predicate::str::contains("questions: pulled"));
}

#[test]
fn seed_questions_are_listed() {
    let dir = workspace();

    perlan(dir.path())
        .args(["questions", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("nl-1"))
        .stdout(predicate::str::contains("perlan-2"));

    perlan(dir.path())
        .args(["questions", "list", "--category", "glaciers"])
        .assert()
        .success()
        .stdout(predicate::str::contains("glac-1"))
        .stdout(predicate::str::contains("nl-1").not());
}

#[test]
fn add_then_delete_question() {
    let dir = workspace();

    perlan(dir.path())
        .args([
            "questions",
            "add",
            "--id",
            "custom-1",
            "--category",
            "perlan",
            "--text",
            "What is under the Perlan dome?",
            "--options",
            "Water tanks,A cave,A lake",
            "--correct-index",
            "0",
            "--fact",
            "Six tanks once held hot water.",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added question custom-1"));

    perlan(dir.path())
        .args(["questions", "list", "--category", "perlan"])
        .assert()
        .success()
        .stdout(predicate::str::contains("custom-1"));

    perlan(dir.path())
        .args(["questions", "delete", "custom-1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted question custom-1"));

    perlan(dir.path())
        .args(["questions", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("custom-1").not());
}

#[test]
fn add_question_with_two_options_fails() {
    let dir = workspace();

    perlan(dir.path())
        .args([
            "questions",
            "add",
            "--category",
            "perlan",
            "--text",
            "Too few?",
            "--options",
            "Yes,No",
            "--correct-index",
            "0",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected 3 options"));
}

#[test]
fn import_pack_adds_questions() {
    let dir = workspace();
    std::fs::write(dir.path().join("harbour.toml"), PACK).unwrap();

    perlan(dir.path())
        .args(["import", "harbour.toml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 2 questions and 0 modules"));

    perlan(dir.path())
        .args(["questions", "list", "--category", "history"])
        .assert()
        .success()
        .stdout(predicate::str::contains("harbour-1"));
}

#[test]
fn validate_reports_warnings() {
    let dir = workspace();
    let pack = PACK.replace("\"1874\"", "\"1786\"");
    std::fs::write(dir.path().join("dupes.toml"), pack).unwrap();

    perlan(dir.path())
        .args(["validate", "dupes.toml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[harbour-1] WARNING: options are not distinct"))
        .stdout(predicate::str::contains("1 warning(s) found"));
}

#[test]
fn validate_nonexistent_file() {
    let dir = workspace();

    perlan(dir.path())
        .args(["validate", "nonexistent.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn play_a_round_then_show_stats() {
    let dir = workspace();

    perlan(dir.path())
        .args(["stats"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No games played yet"));

    perlan(dir.path())
        .args(["play", "--user", "anna"])
        .write_stdin("1\n\n1\n\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Question 1/2"))
        .stdout(predicate::str::contains("Question 2/2"))
        .stdout(predicate::str::contains("Final score: "))
        .stdout(predicate::str::contains("anna: 1 games"));

    perlan(dir.path())
        .args(["stats"])
        .assert()
        .success()
        .stdout(predicate::str::contains("anna"));

    perlan(dir.path())
        .args(["stats", "--user", "anna"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Games played:  1"))
        .stdout(predicate::str::contains("/2 ("));
}

#[test]
fn cancelled_round_records_nothing() {
    let dir = workspace();

    perlan(dir.path())
        .args(["play", "--user", "bjorn", "--category", "volcanoes"])
        .write_stdin("q\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Round cancelled"));

    perlan(dir.path())
        .args(["stats", "--user", "bjorn"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no games recorded"));
}

#[test]
fn unknown_category_fails() {
    let dir = workspace();

    perlan(dir.path())
        .args(["play", "--user", "anna", "--category", "dragons"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown category"));
}

#[test]
fn learning_units_unlock_in_order() {
    let dir = workspace();

    perlan(dir.path())
        .args(["learn", "--user", "gudrun", "--module", "mod-aurora", "--complete", "unit-aurora-2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("locked"));

    perlan(dir.path())
        .args(["learn", "--user", "gudrun", "--module", "mod-aurora", "--complete", "unit-aurora-1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Completed unit-aurora-1"))
        .stdout(predicate::str::contains("1/3 complete"));

    perlan(dir.path())
        .args(["learn", "--user", "gudrun"])
        .assert()
        .success()
        .stdout(predicate::str::contains("mod-volcano"))
        .stdout(predicate::str::contains("1/3"));
}

#[test]
fn generate_with_mock_generator() {
    let dir = workspace();

    perlan(dir.path())
        .args(["generate", "--category", "wildlife", "--count", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wildlife & Birds question 1?"))
        .stdout(predicate::str::contains("Dry run"));

    perlan(dir.path())
        .args(["generate", "--category", "wildlife", "--count", "2", "--save"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved 2 questions"));

    perlan(dir.path())
        .args(["questions", "list", "--category", "wildlife"])
        .assert()
        .success()
        .stdout(predicate::str::contains("4 questions"));
}

#[test]
fn reset_requires_confirmation() {
    let dir = workspace();

    perlan(dir.path())
        .arg("reset")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--yes"));

    perlan(dir.path())
        .args(["reset", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cleared local data"));
}

#[test]
fn missing_config_path_fails() {
    let dir = workspace();

    perlan(dir.path())
        .args(["--config", "nope.toml", "sync"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("config file not found"));
}
