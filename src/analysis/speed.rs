use super::TestLog;
use crate::record::TestRecord;
use crate::util::{cumulative_mean, mean, rolling_mean, transform_by_group};
use chrono::Timelike;
use itertools::Itertools;
use std::collections::BTreeMap;

/// Per-test WPM with trailing-window and cumulative means.
#[derive(Debug, Clone, PartialEq)]
pub struct WpmTrend {
    pub windows: Vec<usize>,
    pub rows: Vec<WpmTrendRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WpmTrendRow {
    pub chronological_number: usize,
    pub wpm: f64,
    /// One entry per window, in `WpmTrend::windows` order.
    pub rolling: Vec<Option<f64>>,
    pub cumulative_mean: f64,
}

pub fn wpm_trend(log: &TestLog, windows: &[usize]) -> WpmTrend {
    let wpm = log.wpm();
    let rolled: Vec<Vec<Option<f64>>> = windows.iter().map(|w| rolling_mean(&wpm, *w)).collect();
    let cumulative = cumulative_mean_by_player(log.records());

    let rows = log
        .chronological_numbers()
        .into_iter()
        .enumerate()
        .map(|(idx, chronological_number)| WpmTrendRow {
            chronological_number,
            wpm: wpm[idx],
            rolling: rolled.iter().map(|series| series[idx]).collect(),
            cumulative_mean: cumulative[idx],
        })
        .collect();

    WpmTrend {
        windows: windows.to_vec(),
        rows,
    }
}

/// Running mean WPM over each player's own tests, in row order.
pub fn cumulative_mean_by_player(records: &[TestRecord]) -> Vec<f64> {
    transform_by_group(
        records,
        |r| r.player.clone(),
        |indices| {
            let wpm: Vec<f64> = indices.iter().map(|&i| records[i].wpm).collect();
            cumulative_mean(&wpm)
        },
    )
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedTest {
    pub rank: usize,
    pub test_number: i64,
    pub local_start: String,
    pub verse_id: i64,
    pub verse_code: String,
    pub wpm: f64,
    pub error_and_backspace_rate: f64,
}

/// The `n` highest-WPM tests, fastest first.
pub fn fastest_tests(log: &TestLog, n: usize) -> Vec<RankedTest> {
    log.records()
        .iter()
        .sorted_by(|a, b| b.wpm.total_cmp(&a.wpm))
        .take(n)
        .enumerate()
        .map(|(idx, r)| RankedTest {
            rank: idx + 1,
            test_number: r.test_number,
            local_start: r.local_start.clone(),
            verse_id: r.verse_id,
            verse_code: r.verse_code.clone(),
            wpm: r.wpm,
            error_and_backspace_rate: r.error_and_backspace_rate,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct HourRow {
    pub hour: u32,
    pub characters: i64,
    pub mean_wpm: f64,
}

/// Characters typed and mean WPM by the hour each test started.
pub fn by_starting_hour(log: &TestLog) -> Vec<HourRow> {
    let mut hours: BTreeMap<u32, (i64, Vec<f64>)> = BTreeMap::new();
    for (idx, r) in log.records().iter().enumerate() {
        let entry = hours.entry(log.start(idx).hour()).or_default();
        entry.0 += r.characters;
        entry.1.push(r.wpm);
    }
    hours
        .into_iter()
        .map(|(hour, (characters, wpm))| HourRow {
            hour,
            characters,
            mean_wpm: mean(&wpm).unwrap_or_default(),
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum TagSlot {
    #[strum(serialize = "Tag_1")]
    Tag1,
    #[strum(serialize = "Tag_2")]
    Tag2,
    #[strum(serialize = "Tag_3")]
    Tag3,
}

impl TagSlot {
    pub const ALL: [TagSlot; 3] = [TagSlot::Tag1, TagSlot::Tag2, TagSlot::Tag3];

    pub fn value(&self, r: &TestRecord) -> Option<i64> {
        match self {
            TagSlot::Tag1 => r.tag_1,
            TagSlot::Tag2 => r.tag_2,
            TagSlot::Tag3 => r.tag_3,
        }
    }
}

/// Mean WPM and test count for one integer key.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyedMean {
    pub key: i64,
    pub mean_wpm: f64,
    pub tests: usize,
}

fn mean_wpm_by<F>(records: &[TestRecord], key: F) -> Vec<KeyedMean>
where
    F: Fn(&TestRecord) -> Option<i64>,
{
    let mut groups: BTreeMap<i64, Vec<f64>> = BTreeMap::new();
    for r in records {
        if let Some(k) = key(r) {
            groups.entry(k).or_default().push(r.wpm);
        }
    }
    groups
        .into_iter()
        .map(|(key, wpm)| KeyedMean {
            key,
            mean_wpm: mean(&wpm).unwrap_or_default(),
            tests: wpm.len(),
        })
        .collect()
}

/// Empty when no test carries a value in that slot.
pub fn mean_wpm_by_tag(log: &TestLog, slot: TagSlot) -> Vec<KeyedMean> {
    mean_wpm_by(log.records(), |r| slot.value(r))
}

pub fn mean_wpm_by_within_session_test_number(log: &TestLog) -> Vec<KeyedMean> {
    mean_wpm_by(log.records(), |r| r.within_session_test_number)
}

/// WPM by within-session test number, one series per session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSeries {
    pub session: usize,
    pub points: Vec<(i64, f64)>,
}

pub fn wpm_by_session(log: &TestLog) -> Vec<SessionSeries> {
    let sessions = log.session_numbers();
    let mut series: BTreeMap<usize, Vec<(i64, f64)>> = BTreeMap::new();
    for (r, session) in log.records().iter().zip(sessions) {
        if let Some(n) = r.within_session_test_number {
            series.entry(session).or_default().push((n, r.wpm));
        }
    }
    series
        .into_iter()
        .map(|(session, points)| SessionSeries { session, points })
        .collect()
}
