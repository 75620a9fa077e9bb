//! Merges per-player result files into one combined multiplayer dataset.
//!
//! Each input file is filtered to a verse range, players who did not type
//! every verse in that range are dropped, player names get a batch-wide
//! numeric prefix so two files can both contain "Alice", and the union is
//! renumbered chronologically as a single one-round session.

use crate::error::{ReportError, Result};
use crate::loader::{read_test_results, write_test_results};
use crate::record::{condensed_timestamp, TestRecord};
use itertools::Itertools;
use log::{debug, info, warn};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Suffix marking a combined multiplayer results file.
pub const COMBINED_SUFFIX: &str = "_CMR_test_results.csv";

/// Inclusive range of verse IDs every retained player must have typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerseRange {
    pub first: i64,
    pub last: i64,
}

impl VerseRange {
    pub fn new(first: i64, last: i64) -> Result<Self> {
        if first > last {
            return Err(ReportError::InvalidRange(format!(
                "first verse {first} is after last verse {last}"
            )));
        }
        let span = last.checked_sub(first).and_then(|d| d.checked_add(1));
        if span.and_then(|n| usize::try_from(n).ok()).is_none() {
            return Err(ReportError::InvalidRange(format!(
                "range {first}_{last} spans too many verses"
            )));
        }
        Ok(Self { first, last })
    }

    pub fn contains(&self, verse_id: i64) -> bool {
        (self.first..=self.last).contains(&verse_id)
    }

    /// Number of distinct verses in the range.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        usize::try_from(self.last.abs_diff(self.first))
            .map_or(usize::MAX, |n| n.saturating_add(1))
    }
}

impl fmt::Display for VerseRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.first, self.last)
    }
}

impl FromStr for VerseRange {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self> {
        let (first, last) = s
            .split_once('_')
            .ok_or_else(|| ReportError::InvalidRange(format!("expected FIRST_LAST, got {s:?}")))?;
        let parse = |part: &str| {
            part.trim()
                .parse::<i64>()
                .map_err(|_| ReportError::InvalidRange(format!("{part:?} is not a verse id")))
        };
        Self::new(parse(first)?, parse(last)?)
    }
}

/// How the comparison range is chosen for a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeSelection {
    Explicit(VerseRange),
    /// Take the first and last verse typed by the alphabetically first
    /// player of the first non-empty file, then reuse it for every file.
    AutoDetect,
}

impl FromStr for RangeSelection {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "y" | "Y" => Ok(Self::AutoDetect),
            other => other.parse().map(Self::Explicit),
        }
    }
}

/// A player dropped from one file for not covering the whole range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exclusion {
    pub player: String,
    pub file: String,
    pub verses_typed: usize,
}

#[derive(Debug, Clone)]
pub struct CombinedDataset {
    pub records: Vec<TestRecord>,
    pub range: VerseRange,
    pub range_was_detected: bool,
    pub exclusions: Vec<Exclusion>,
}

impl CombinedDataset {
    /// Condensed local start time of the earliest test.
    pub fn timestamp(&self) -> Option<String> {
        self.records
            .first()
            .map(|r| condensed_timestamp(&r.local_start))
    }

    pub fn output_filename(&self) -> Option<String> {
        self.timestamp().map(|ts| format!("{ts}{COMBINED_SUFFIX}"))
    }

    /// Write the dataset into `dir` under its derived filename.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        let name = self
            .output_filename()
            .ok_or_else(|| ReportError::no_usable_data("combined dataset is empty"))?;
        let path = dir.join(name);
        write_test_results(&path, &self.records)?;
        Ok(path)
    }
}

/// Accumulates file contributions for one combine run. Owns the player
/// prefix counter so numbering is unique across the whole batch.
#[derive(Debug)]
pub struct Combiner {
    selection: RangeSelection,
    range: Option<VerseRange>,
    next_player_id: usize,
    records: Vec<TestRecord>,
    exclusions: Vec<Exclusion>,
}

impl Combiner {
    pub fn new(selection: RangeSelection) -> Self {
        let range = match selection {
            RangeSelection::Explicit(range) => {
                info!("comparing players over verses {range}");
                Some(range)
            }
            RangeSelection::AutoDetect => None,
        };
        Self {
            selection,
            range,
            next_player_id: 1,
            records: Vec::new(),
            exclusions: Vec::new(),
        }
    }

    pub fn range(&self) -> Option<VerseRange> {
        self.range
    }

    /// Normalize one file's rows and add the survivors to the batch.
    /// Returns how many rows the file contributed.
    pub fn push_file(&mut self, file_name: &str, rows: Vec<TestRecord>) -> usize {
        let players: BTreeSet<String> = rows.iter().map(|r| r.player.clone()).collect();

        if self.range.is_none() {
            self.range = detect_range(&rows, &players);
            if let (Some(range), Some(player)) = (self.range, players.first()) {
                warn!(
                    "auto-detected verse range {range} from {player} in {file_name}; \
                     pass an explicit range if this is wrong"
                );
            }
        }
        let Some(range) = self.range else {
            debug!("{file_name} has no rows to detect a verse range from");
            return 0;
        };

        let in_range: Vec<TestRecord> = rows
            .into_iter()
            .filter(|r| range.contains(r.verse_id))
            .collect();

        let incomplete: HashSet<String> = {
            let mut verses_by_player: HashMap<&str, HashSet<i64>> = HashMap::new();
            for r in &in_range {
                verses_by_player
                    .entry(r.player.as_str())
                    .or_default()
                    .insert(r.verse_id);
            }
            players
                .iter()
                .filter_map(|player| {
                    let typed = verses_by_player.get(player.as_str()).map_or(0, HashSet::len);
                    (typed != range.len()).then(|| (player.clone(), typed))
                })
                .map(|(player, typed)| {
                    warn!(
                        "{player} within {file_name} did not complete all of the tests \
                         between {} and {}; excluding this player from the combined dataset",
                        range.first, range.last
                    );
                    self.exclusions.push(Exclusion {
                        player: player.clone(),
                        file: file_name.to_string(),
                        verses_typed: typed,
                    });
                    player
                })
                .collect()
        };

        let mut survivors: Vec<TestRecord> = in_range
            .into_iter()
            .filter(|r| !incomplete.contains(&r.player))
            .collect();
        survivors.sort_by(|a, b| a.unix_start.total_cmp(&b.unix_start));

        let labels: HashMap<String, String> = players
            .iter()
            .map(|player| {
                let label = format!("{}_{}", self.next_player_id, player);
                self.next_player_id += 1;
                (player.clone(), label)
            })
            .collect();

        let mut seen: HashMap<String, i64> = HashMap::new();
        for r in survivors.iter_mut() {
            if let Some(label) = labels.get(&r.player) {
                r.player = label.clone();
            }
            let count = seen.entry(r.player.clone()).or_insert(0);
            *count += 1;
            r.tag_1 = Some(1);
            r.tag_2 = Some(*count);
            r.tag_3 = Some(*count);
            r.notes = file_name.to_string();
        }

        let contributed = survivors.len();
        debug!("{file_name} contributed {contributed} tests");
        self.records.extend(survivors);
        contributed
    }

    /// Sort the union chronologically and renumber it as one session.
    pub fn finish(self) -> Result<CombinedDataset> {
        let range = self.range.ok_or_else(|| {
            ReportError::no_usable_data("no input rows to detect a verse range from")
        })?;
        if self.records.is_empty() {
            return Err(ReportError::no_usable_data(format!(
                "no player completed every verse between {} and {}",
                range.first, range.last
            )));
        }

        let records: Vec<TestRecord> = self
            .records
            .into_iter()
            .sorted_by(|a, b| a.unix_start.total_cmp(&b.unix_start))
            .enumerate()
            .map(|(idx, mut r)| {
                let n = idx as i64 + 1;
                r.test_number = n;
                r.within_session_test_number = Some(n);
                r.session_number = Some(1);
                r
            })
            .collect();

        Ok(CombinedDataset {
            records,
            range,
            range_was_detected: matches!(self.selection, RangeSelection::AutoDetect),
            exclusions: self.exclusions,
        })
    }
}

fn detect_range(rows: &[TestRecord], players: &BTreeSet<String>) -> Option<VerseRange> {
    let first_player = players.first()?;
    let (first, last) = rows
        .iter()
        .filter(|r| &r.player == first_player)
        .map(|r| r.verse_id)
        .minmax()
        .into_option()?;
    VerseRange::new(first, last).ok()
}

/// Combine every file in `dir`, processed in filename order.
pub fn combine_directory(dir: &Path, selection: RangeSelection) -> Result<CombinedDataset> {
    let entries = fs::read_dir(dir).map_err(|e| ReportError::io(dir, e))?;
    let mut files: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ReportError::io(dir, e))?;
        let path = entry.path();
        if path.is_file() {
            files.push(path);
        }
    }
    if files.is_empty() {
        return Err(ReportError::no_usable_data(format!(
            "{} contains no result files",
            dir.display()
        )));
    }
    files.sort();

    let mut combiner = Combiner::new(selection);
    for path in &files {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let rows = read_test_results(path)?;
        combiner.push_file(&file_name, rows);
    }
    let combined = combiner.finish()?;
    info!(
        "combined {} tests from {} files over verses {}",
        combined.records.len(),
        files.len(),
        combined.range
    );
    Ok(combined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn test(player: &str, verse_id: i64, unix_start: f64, wpm: f64) -> TestRecord {
        TestRecord {
            test_number: 0,
            session_number: None,
            within_session_test_number: Some(0),
            unix_start,
            local_start: format!("2025-07-06T22:{:02}:00", (unix_start as i64) % 60),
            unix_end: unix_start + 10.0,
            local_end: format!("2025-07-06T22:{:02}:10", (unix_start as i64) % 60),
            verse_id,
            verse_code: format!("V{verse_id}"),
            verse: "text".to_string(),
            characters: 40,
            wpm,
            test_seconds: 10.0,
            error_rate: 0.0,
            error_and_backspace_rate: 0.0,
            marathon_mode: Some(0),
            player: player.to_string(),
            mode: "SP".to_string(),
            tag_1: Some(7),
            tag_2: Some(7),
            tag_3: Some(7),
            notes: String::new(),
        }
    }

    fn full_run(player: &str, start: f64) -> Vec<TestRecord> {
        (100..=109)
            .map(|v| test(player, v, start + (v - 100) as f64, 60.0 + (v - 100) as f64))
            .collect()
    }

    fn range() -> RangeSelection {
        RangeSelection::Explicit(VerseRange::new(100, 109).unwrap())
    }

    #[test]
    fn parses_range_arguments() {
        assert_eq!(
            "30786_30795".parse::<RangeSelection>().unwrap(),
            RangeSelection::Explicit(VerseRange { first: 30786, last: 30795 })
        );
        assert_eq!("Y".parse::<RangeSelection>().unwrap(), RangeSelection::AutoDetect);
        assert_matches!("10-20".parse::<RangeSelection>(), Err(ReportError::InvalidRange(_)));
        assert_matches!("20_10".parse::<RangeSelection>(), Err(ReportError::InvalidRange(_)));
        assert_eq!(VerseRange::new(100, 109).unwrap().len(), 10);
    }

    #[test]
    fn rejects_ranges_too_wide_to_count() {
        assert_matches!(
            format!("{}_{}", i64::MIN, i64::MAX).parse::<RangeSelection>(),
            Err(ReportError::InvalidRange(_))
        );
        assert_matches!(VerseRange::new(0, i64::MAX), Err(ReportError::InvalidRange(_)));
        assert_eq!(VerseRange::new(-5, 5).unwrap().len(), 11);
    }

    #[test]
    fn same_name_in_two_files_gets_distinct_labels() {
        let mut combiner = Combiner::new(range());
        combiner.push_file("a.csv", full_run("Sam", 0.0));
        combiner.push_file("b.csv", full_run("Lee", 100.0));
        combiner.push_file("c.csv", full_run("Sam", 200.0));
        let combined = combiner.finish().unwrap();

        assert_eq!(combined.records.len(), 30);
        let players: BTreeSet<&str> = combined.records.iter().map(|r| r.player.as_str()).collect();
        assert_eq!(players, BTreeSet::from(["1_Sam", "2_Lee", "3_Sam"]));
        assert!(combined.records.iter().all(|r| r.tag_1 == Some(1)));

        for label in ["1_Sam", "3_Sam"] {
            let tags: Vec<i64> = combined
                .records
                .iter()
                .filter(|r| r.player == label)
                .map(|r| r.tag_3.unwrap())
                .collect();
            assert_eq!(tags, (1..=10).collect::<Vec<_>>());
        }
        assert!(combined.records.iter().all(|r| r.tag_2 == r.tag_3));
    }

    #[test]
    fn incomplete_player_is_dropped_and_complete_one_kept() {
        let mut rows = full_run("Ada", 0.0);
        rows.extend(full_run("Bo", 50.0).into_iter().filter(|r| r.verse_id != 109));

        let mut combiner = Combiner::new(range());
        assert_eq!(combiner.push_file("pair.csv", rows), 10);
        let combined = combiner.finish().unwrap();

        assert!(combined.records.iter().all(|r| r.player == "1_Ada"));
        assert_eq!(
            combined.exclusions,
            vec![Exclusion {
                player: "Bo".to_string(),
                file: "pair.csv".to_string(),
                verses_typed: 9
            }]
        );
    }

    #[test]
    fn rows_outside_range_are_filtered_and_duplicates_count_once() {
        let mut rows = full_run("Ada", 0.0);
        rows.push(test("Ada", 99, 500.0, 10.0));
        rows.push(test("Ada", 104, 600.0, 90.0));

        let mut combiner = Combiner::new(range());
        combiner.push_file("ada.csv", rows);
        let combined = combiner.finish().unwrap();

        assert_eq!(combined.records.len(), 11);
        assert!(combined.records.iter().all(|r| r.verse_id != 99));
    }

    #[test]
    fn union_is_renumbered_in_epoch_order() {
        let mut combiner = Combiner::new(range());
        combiner.push_file("late.csv", full_run("Zed", 5.5));
        combiner.push_file("early.csv", full_run("Amy", 0.0));
        let combined = combiner.finish().unwrap();

        let starts: Vec<f64> = combined.records.iter().map(|r| r.unix_start).collect();
        assert!(starts.windows(2).all(|w| w[0] <= w[1]));
        for (idx, r) in combined.records.iter().enumerate() {
            assert_eq!(r.test_number, idx as i64 + 1);
            assert_eq!(r.within_session_test_number, Some(idx as i64 + 1));
            assert_eq!(r.session_number, Some(1));
        }
        assert_eq!(combined.records[0].notes, "early.csv");
    }

    #[test]
    fn auto_detects_range_from_first_alphabetical_player() {
        let mut first = full_run("Bea", 0.0);
        first.extend((103..=106).map(|v| test("Abe", v, 100.0 + v as f64, 50.0)));

        let mut combiner = Combiner::new(RangeSelection::AutoDetect);
        combiner.push_file("one.csv", Vec::new());
        assert_eq!(combiner.range(), None);
        combiner.push_file("two.csv", first);
        assert_eq!(combiner.range(), Some(VerseRange { first: 103, last: 106 }));
        combiner.push_file("three.csv", full_run("Cy", 400.0));
        let combined = combiner.finish().unwrap();

        assert!(combined.range_was_detected);
        assert_eq!(combined.records.len(), 4 + 4 + 4);
        let players: BTreeSet<&str> = combined.records.iter().map(|r| r.player.as_str()).collect();
        assert_eq!(players, BTreeSet::from(["1_Abe", "2_Bea", "3_Cy"]));
    }

    #[test]
    fn all_players_excluded_is_fatal() {
        let mut combiner = Combiner::new(range());
        combiner.push_file("short.csv", full_run("Ada", 0.0).into_iter().take(3).collect());
        assert_matches!(combiner.finish(), Err(ReportError::NoUsableData(_)));
    }

    #[test]
    fn output_filename_uses_earliest_local_start() {
        let mut combiner = Combiner::new(range());
        combiner.push_file("a.csv", full_run("Ada", 0.0));
        let combined = combiner.finish().unwrap();
        assert_eq!(
            combined.output_filename().unwrap(),
            "20250706T220000_CMR_test_results.csv"
        );
    }
}
