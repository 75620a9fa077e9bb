use super::TestLog;
use crate::util::mean;
use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use itertools::Itertools;
use std::collections::BTreeMap;
use std::fmt;

/// Fixed wall-clock windows used for endurance rankings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum TimeBucket {
    #[strum(serialize = "Hour")]
    Hour,
    #[strum(serialize = "30-Minute Block")]
    ThirtyMinutes,
    #[strum(serialize = "15-Minute Block")]
    FifteenMinutes,
    #[strum(serialize = "10-Minute Block")]
    TenMinutes,
}

impl TimeBucket {
    pub const ALL: [TimeBucket; 4] = [
        TimeBucket::Hour,
        TimeBucket::ThirtyMinutes,
        TimeBucket::FifteenMinutes,
        TimeBucket::TenMinutes,
    ];

    pub fn minutes(&self) -> u32 {
        match self {
            TimeBucket::Hour => 60,
            TimeBucket::ThirtyMinutes => 30,
            TimeBucket::FifteenMinutes => 15,
            TimeBucket::TenMinutes => 10,
        }
    }

    /// Used in chart file names.
    pub fn file_stem(&self) -> &'static str {
        match self {
            TimeBucket::Hour => "hour",
            TimeBucket::ThirtyMinutes => "30_minute_block",
            TimeBucket::FifteenMinutes => "15_minute_block",
            TimeBucket::TenMinutes => "10_minute_block",
        }
    }

    pub fn key(&self, at: NaiveDateTime) -> BucketKey {
        BucketKey {
            date: at.date(),
            hour: at.hour(),
            block: match self {
                TimeBucket::Hour => None,
                _ => Some(at.minute() / self.minutes() + 1),
            },
        }
    }
}

/// (date, hour, 1-based sub-hour block) identifying one bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BucketKey {
    pub date: NaiveDate,
    pub hour: u32,
    pub block: Option<u32>,
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.date, self.hour)?;
        if let Some(block) = self.block {
            write!(f, "_{block}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BucketTotal {
    pub rank: usize,
    pub key: BucketKey,
    pub characters: i64,
}

/// Buckets with the most characters typed, best first. A test counts only
/// when it starts and ends inside the same bucket.
pub fn top_buckets(log: &TestLog, bucket: TimeBucket, n: usize) -> Vec<BucketTotal> {
    let mut totals: BTreeMap<BucketKey, i64> = BTreeMap::new();
    for (idx, r) in log.records().iter().enumerate() {
        let start = bucket.key(log.start(idx));
        if start == bucket.key(log.end(idx)) {
            *totals.entry(start).or_default() += r.characters;
        }
    }
    totals
        .into_iter()
        .sorted_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)))
        .take(n)
        .enumerate()
        .map(|(idx, (key, characters))| BucketTotal {
            rank: idx + 1,
            key,
            characters,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct DateTotal {
    pub date: NaiveDate,
    pub characters: i64,
    pub rank: usize,
}

/// Characters per calendar date in date order, each with its rank by
/// volume. Tests spanning midnight are left out.
pub fn characters_by_date(log: &TestLog) -> Vec<DateTotal> {
    let mut totals: BTreeMap<NaiveDate, i64> = BTreeMap::new();
    for (idx, r) in log.records().iter().enumerate() {
        let date = log.start(idx).date();
        if date == log.end(idx).date() {
            *totals.entry(date).or_default() += r.characters;
        }
    }
    let ranks: BTreeMap<NaiveDate, usize> = totals
        .iter()
        .sorted_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)))
        .enumerate()
        .map(|(idx, (date, _))| (*date, idx + 1))
        .collect();
    totals
        .into_iter()
        .map(|(date, characters)| DateTotal {
            date,
            characters,
            rank: ranks[&date],
        })
        .collect()
}

/// The `n` highest-volume dates, best first.
pub fn top_dates(by_date: &[DateTotal], n: usize) -> Vec<DateTotal> {
    by_date
        .iter()
        .sorted_by_key(|d| d.rank)
        .take(n)
        .cloned()
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthRow {
    /// `YYYY-MM`
    pub month: String,
    pub characters: i64,
    pub mean_wpm: f64,
}

/// Characters and mean WPM per calendar month, months in order. Tests
/// spanning a month boundary are left out.
pub fn by_year_month(log: &TestLog) -> Vec<MonthRow> {
    let mut months: BTreeMap<(i32, u32), (i64, Vec<f64>)> = BTreeMap::new();
    for (idx, r) in log.records().iter().enumerate() {
        let (start, end) = (log.start(idx), log.end(idx));
        let key = (start.year(), start.month());
        if key == (end.year(), end.month()) {
            let entry = months.entry(key).or_default();
            entry.0 += r.characters;
            entry.1.push(r.wpm);
        }
    }
    months
        .into_iter()
        .map(|((year, month), (characters, wpm))| MonthRow {
            month: format!("{year}-{month:02}"),
            characters,
            mean_wpm: mean(&wpm).unwrap_or_default(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::record;
    use super::*;
    use std::path::Path;

    fn log(records: Vec<crate::record::TestRecord>) -> TestLog {
        TestLog::from_records(records, Path::new("t.csv")).unwrap()
    }

    #[test]
    fn bucket_keys_use_one_based_blocks() {
        let at = NaiveDate::from_ymd_opt(2025, 3, 4)
            .unwrap()
            .and_hms_opt(13, 44, 0)
            .unwrap();
        assert_eq!(TimeBucket::Hour.key(at).to_string(), "2025-03-04_13");
        assert_eq!(TimeBucket::ThirtyMinutes.key(at).to_string(), "2025-03-04_13_2");
        assert_eq!(TimeBucket::FifteenMinutes.key(at).block, Some(3));
        assert_eq!(TimeBucket::TenMinutes.key(at).block, Some(5));
        assert_eq!(TimeBucket::FifteenMinutes.to_string(), "15-Minute Block");
    }

    #[test]
    fn cross_bucket_tests_are_excluded() {
        // 00:00-00:01 and 00:05-00:06 stay inside the first 10-minute block,
        // 00:09:30-00:10:30 straddles into the second one.
        let records = vec![record(0, 60, 50.0), record(300, 60, 50.0), record(570, 60, 50.0)];
        let top = top_buckets(&log(records), TimeBucket::TenMinutes, 50);
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].characters, 200);
        assert_eq!(top[0].rank, 1);
    }

    #[test]
    fn buckets_ranked_descending_and_truncated() {
        let mut records = Vec::new();
        for hour in 0..5i64 {
            for i in 0..=hour {
                records.push(record(hour * 3600 + i * 120, 60, 40.0));
            }
        }
        let top = top_buckets(&log(records), TimeBucket::Hour, 3);
        let totals: Vec<i64> = top.iter().map(|b| b.characters).collect();
        assert_eq!(totals, vec![500, 400, 300]);
        assert_eq!(top[0].key.hour, 4);
        assert_eq!(top.iter().map(|b| b.rank).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn dates_keep_calendar_order_with_volume_rank() {
        let day = 86_400;
        let records = vec![
            record(0, 60, 40.0),
            record(day, 60, 40.0),
            record(day + 600, 60, 40.0),
            record(2 * day - 30, 60, 40.0),
        ];
        let by_date = characters_by_date(&log(records));
        assert_eq!(by_date.len(), 2);
        assert_eq!((by_date[0].characters, by_date[0].rank), (100, 2));
        assert_eq!((by_date[1].characters, by_date[1].rank), (200, 1));
        assert_eq!(top_dates(&by_date, 1)[0].characters, 200);
    }

    #[test]
    fn months_group_characters_and_wpm() {
        let records = vec![record(0, 60, 40.0), record(600, 60, 60.0)];
        assert_eq!(
            by_year_month(&log(records)),
            vec![MonthRow {
                month: "2025-01".to_string(),
                characters: 200,
                mean_wpm: 50.0
            }]
        );
    }
}
