//! Derived tables computed from a test log. Each function returns its
//! own typed table and leaves the log untouched.

pub mod accuracy;
pub mod endurance;
pub mod multiplayer;
pub mod progress;
pub mod speed;
pub mod words;

use crate::error::{ReportError, Result};
use crate::record::TestRecord;
use chrono::NaiveDateTime;
use itertools::Itertools;
use std::path::Path;

/// Tests in ascending start-epoch order with parsed wall-clock times.
#[derive(Debug, Clone)]
pub struct TestLog {
    records: Vec<TestRecord>,
    starts: Vec<NaiveDateTime>,
    ends: Vec<NaiveDateTime>,
}

impl TestLog {
    /// Sort records chronologically. `source` is only used in diagnostics.
    pub fn from_records(records: Vec<TestRecord>, source: &Path) -> Result<Self> {
        if records.is_empty() {
            return Err(ReportError::no_usable_data(format!(
                "{} contains no tests",
                source.display()
            )));
        }
        let records: Vec<TestRecord> = records
            .into_iter()
            .sorted_by(|a, b| a.unix_start.total_cmp(&b.unix_start))
            .collect();

        let mut starts = Vec::with_capacity(records.len());
        let mut ends = Vec::with_capacity(records.len());
        for r in &records {
            let (Some(start), Some(end)) = (r.local_start_time(), r.local_end_time()) else {
                return Err(ReportError::schema(
                    source,
                    format!(
                        "test {} has unreadable local times {:?} / {:?}",
                        r.test_number, r.local_start, r.local_end
                    ),
                ));
            };
            starts.push(start);
            ends.push(end);
        }
        Ok(Self {
            records,
            starts,
            ends,
        })
    }

    pub fn records(&self) -> &[TestRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn start(&self, idx: usize) -> NaiveDateTime {
        self.starts[idx]
    }

    pub fn end(&self, idx: usize) -> NaiveDateTime {
        self.ends[idx]
    }

    pub fn wpm(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.wpm).collect()
    }

    /// Dense 1-based position in chronological order.
    pub fn chronological_numbers(&self) -> Vec<usize> {
        (1..=self.records.len()).collect()
    }

    /// Running count of within-session counter resets. Rows logged before
    /// the first reset stay at 0.
    pub fn session_numbers(&self) -> Vec<usize> {
        let mut session = 0;
        self.records
            .iter()
            .map(|r| {
                if r.within_session_test_number == Some(1) {
                    session += 1;
                }
                session
            })
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::record::TestRecord;

    /// A test starting `offset_secs` after 2025-01-01T00:00:00 local.
    pub fn record(offset_secs: i64, duration_secs: i64, wpm: f64) -> TestRecord {
        let base = chrono::NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let start = base + chrono::Duration::seconds(offset_secs);
        let end = start + chrono::Duration::seconds(duration_secs);
        TestRecord {
            test_number: 0,
            session_number: None,
            within_session_test_number: None,
            unix_start: 1_735_689_600.0 + offset_secs as f64,
            local_start: start.format("%Y-%m-%dT%H:%M:%S").to_string(),
            unix_end: 1_735_689_600.0 + (offset_secs + duration_secs) as f64,
            local_end: end.format("%Y-%m-%dT%H:%M:%S").to_string(),
            verse_id: 1,
            verse_code: "Gen_1_1".to_string(),
            verse: "In the beginning".to_string(),
            characters: 100,
            wpm,
            test_seconds: duration_secs as f64,
            error_rate: 0.0,
            error_and_backspace_rate: 0.0,
            marathon_mode: Some(0),
            player: "Ada".to_string(),
            mode: "SP".to_string(),
            tag_1: None,
            tag_2: None,
            tag_3: None,
            notes: String::new(),
        }
    }
}
