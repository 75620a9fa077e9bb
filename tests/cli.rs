mod common;

use assert_cmd::Command;
use std::fs;
use tempfile::tempdir;

fn tttb() -> Command {
    let mut cmd = Command::cargo_bin("tttb-reports").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn combine_then_chart_from_working_directory() {
    let dir = tempdir().unwrap();
    common::seed_combine_dir(&dir.path().join("Files").join("MP_Test_Result_Files_To_Combine"));
    let config = dir.path().join("config.json");

    tttb()
        .current_dir(dir.path())
        .args(["--config", config.to_str().unwrap(), "combine", "100_109"])
        .assert()
        .success();

    let combined = dir
        .path()
        .join("Files")
        .join("Multiplayer")
        .join("20250706T220000_CMR_test_results.csv");
    assert!(combined.exists());
    let charts = dir.path().join("Visualizations").join("Multiplayer");
    assert!(charts.join("index.html").exists());
    assert!(charts
        .join("20250706T220000_CMR_wins_by_player.html")
        .exists());

    // charting again by timestamp finds the same file
    fs::remove_dir_all(&charts).unwrap();
    tttb()
        .current_dir(dir.path())
        .args(["--config", config.to_str().unwrap(), "multiplayer", "20250706T22"])
        .assert()
        .success();
    assert!(charts
        .join("20250706T220000_CMR_highest_WPM_by_player.html")
        .exists());
}

#[test]
fn no_visualize_only_writes_the_combined_file() {
    let dir = tempdir().unwrap();
    common::seed_combine_dir(&dir.path().join("Files").join("MP_Test_Result_Files_To_Combine"));

    tttb()
        .current_dir(dir.path())
        .args(["--config", "absent.json", "combine", "y", "--no-visualize"])
        .assert()
        .success();
    assert!(dir.path().join("Files").join("Multiplayer").is_dir());
    assert!(!dir.path().join("Visualizations").exists());
}

#[test]
fn bad_range_is_rejected() {
    let dir = tempdir().unwrap();
    tttb()
        .current_dir(dir.path())
        .args(["--config", "absent.json", "combine", "109_100"])
        .assert()
        .failure();
}

#[test]
fn missing_results_file_fails_cleanly() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("Files").join("Multiplayer")).unwrap();
    tttb()
        .current_dir(dir.path())
        .args(["--config", "absent.json", "multiplayer", "y"])
        .assert()
        .failure();
}

#[test]
fn single_player_charts_default_files() {
    let dir = tempdir().unwrap();
    let files = dir.path().join("Files");
    fs::create_dir_all(&files).unwrap();
    let rows: Vec<String> = (0..40)
        .map(|i| common::headerless_row(i + 1, "Ada", 100 + i as i64, i as i64 * 90, 40.0 + i as f64))
        .collect();
    fs::write(files.join("test_results.csv"), rows.join("\n")).unwrap();
    fs::write(
        files.join("CPDB_for_TTTB.csv"),
        "Verse_ID,Book_Num,Book,Characters,Tests\n100,1,Genesis,120,1\n200,2,Exodus,80,0\n",
    )
    .unwrap();

    tttb()
        .current_dir(dir.path())
        .args(["--config", "absent.json", "single-player"])
        .assert()
        .success();

    let charts = dir.path().join("Visualizations").join("Single_Player");
    assert!(charts.join("WPM_by_test.html").exists());
    assert!(charts.join("progress_percentage.html").exists());
    // no word results file, so no word charts
    assert!(!charts.join("words_with_highest_WPM.html").exists());
}

#[test]
fn config_init_writes_defaults() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("nested").join("config.json");
    tttb()
        .args(["--config", config.to_str().unwrap(), "config", "--init"])
        .assert()
        .success();
    let written = fs::read_to_string(&config).unwrap();
    assert!(written.contains("MP_Test_Result_Files_To_Combine"));
}
