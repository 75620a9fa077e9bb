#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::fs;
use std::path::{Path, PathBuf};

const BASE_EPOCH: f64 = 1_751_839_200.0;

fn base_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 7, 6)
        .unwrap()
        .and_hms_opt(22, 0, 0)
        .unwrap()
}

/// One headerless 21-column result row starting `offset` seconds after
/// 2025-07-06T22:00:00.
pub fn headerless_row(n: usize, player: &str, verse_id: i64, offset: i64, wpm: f64) -> String {
    let start = base_time() + Duration::seconds(offset);
    let end = start + Duration::seconds(20);
    format!(
        "{n},{n},{unix_start},{local_start},{unix_end},{local_end},{verse_id},V_{verse_id},Some verse text,120,{wpm},20,0.01,0.02,0,{player},SP,,,,",
        unix_start = BASE_EPOCH + offset as f64,
        local_start = start.format("%Y-%m-%dT%H:%M:%S"),
        unix_end = BASE_EPOCH + offset as f64 + 20.0,
        local_end = end.format("%Y-%m-%dT%H:%M:%S"),
    )
}

/// A headerless file where each player types `verses` in order.
pub fn write_player_file(
    dir: &Path,
    name: &str,
    players: &[(&str, std::ops::RangeInclusive<i64>)],
    offset: i64,
) -> PathBuf {
    let mut lines = Vec::new();
    for (p, (player, verses)) in players.iter().enumerate() {
        for (i, verse) in verses.clone().enumerate() {
            let at = offset + (p as i64) * 5 + (i as i64) * 30;
            lines.push(headerless_row(lines.len() + 1, player, verse, at, 50.0 + i as f64));
        }
    }
    let path = dir.join(name);
    fs::write(&path, lines.join("\n") + "\n").unwrap();
    path
}

/// The three-file scenario: Sam appears in two files and Zed misses a verse.
pub fn seed_combine_dir(dir: &Path) {
    fs::create_dir_all(dir).unwrap();
    write_player_file(dir, "a_results.csv", &[("Sam", 100..=109)], 0);
    write_player_file(dir, "b_results.csv", &[("Lee", 100..=109), ("Zed", 100..=108)], 1000);
    write_player_file(dir, "c_results.csv", &[("Sam", 100..=109)], 2000);
}
