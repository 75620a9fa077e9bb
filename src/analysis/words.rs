use crate::record::WordRecord;
use crate::util::mean;
use itertools::Itertools;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub struct WordStats {
    pub word: String,
    pub count: usize,
    pub mean_wpm: f64,
    /// Percentage of attempts typed without an error or backspace.
    pub error_free_pct: f64,
}

/// Per-word summary, words in alphabetical order. Stoplisted tokens are
/// dropped before grouping.
pub fn word_stats(records: &[WordRecord], stoplist: &[String]) -> Vec<WordStats> {
    let mut groups: BTreeMap<&str, Vec<&WordRecord>> = BTreeMap::new();
    for r in records {
        if !stoplist.iter().any(|s| s == &r.word) {
            groups.entry(r.word.as_str()).or_default().push(r);
        }
    }
    groups
        .into_iter()
        .map(|(word, rows)| {
            let wpm: Vec<f64> = rows.iter().map(|r| r.wpm).collect();
            let error_free = rows
                .iter()
                .filter(|r| r.error_and_backspace_rate == 0.0)
                .count();
            WordStats {
                word: word.to_string(),
                count: rows.len(),
                mean_wpm: mean(&wpm).unwrap_or_default(),
                error_free_pct: 100.0 * error_free as f64 / rows.len() as f64,
            }
        })
        .collect()
}

fn frequent(stats: &[WordStats], min_count: usize) -> impl Iterator<Item = &WordStats> {
    stats.iter().filter(move |s| s.count >= min_count)
}

pub fn highest_wpm(stats: &[WordStats], min_count: usize, n: usize) -> Vec<WordStats> {
    frequent(stats, min_count)
        .sorted_by(|a, b| b.mean_wpm.total_cmp(&a.mean_wpm))
        .take(n)
        .cloned()
        .collect()
}

pub fn lowest_wpm(stats: &[WordStats], min_count: usize, n: usize) -> Vec<WordStats> {
    frequent(stats, min_count)
        .sorted_by(|a, b| a.mean_wpm.total_cmp(&b.mean_wpm))
        .take(n)
        .cloned()
        .collect()
}

/// Ties on accuracy go to the more frequently typed word.
pub fn most_accurate(stats: &[WordStats], min_count: usize, n: usize) -> Vec<WordStats> {
    frequent(stats, min_count)
        .sorted_by(|a, b| {
            b.error_free_pct
                .total_cmp(&a.error_free_pct)
                .then(b.count.cmp(&a.count))
        })
        .take(n)
        .cloned()
        .collect()
}

pub fn least_accurate(stats: &[WordStats], min_count: usize, n: usize) -> Vec<WordStats> {
    frequent(stats, min_count)
        .sorted_by(|a, b| {
            a.error_free_pct
                .total_cmp(&b.error_free_pct)
                .then(b.count.cmp(&a.count))
        })
        .take(n)
        .cloned()
        .collect()
}

pub fn most_frequent(stats: &[WordStats], n: usize) -> Vec<WordStats> {
    stats
        .iter()
        .sorted_by(|a, b| b.count.cmp(&a.count).then_with(|| a.word.cmp(&b.word)))
        .take(n)
        .cloned()
        .collect()
}

/// Words eligible for the accuracy/speed scatter.
pub fn scatter_points(stats: &[WordStats], min_count: usize) -> Vec<WordStats> {
    frequent(stats, min_count).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed(word: &str, wpm: f64, rate: f64, times: usize) -> Vec<WordRecord> {
        (0..times)
            .map(|_| WordRecord {
                word: word.to_string(),
                wpm,
                error_and_backspace_rate: rate,
            })
            .collect()
    }

    fn sample() -> Vec<WordRecord> {
        let mut rows = typed("the", 90.0, 0.0, 12);
        rows.extend(typed("and", 80.0, 0.0, 10));
        rows.extend(typed("and", 60.0, 0.2, 10));
        rows.extend(typed("lord", 40.0, 0.0, 11));
        rows.extend(typed("s", 200.0, 0.0, 50));
        rows.extend(typed("rare", 150.0, 0.0, 3));
        rows
    }

    #[test]
    fn stoplist_and_stats() {
        let stats = word_stats(&sample(), &["s".to_string()]);
        assert!(stats.iter().all(|s| s.word != "s"));
        let and = stats.iter().find(|s| s.word == "and").unwrap();
        assert_eq!(and.count, 20);
        assert_eq!(and.mean_wpm, 70.0);
        assert_eq!(and.error_free_pct, 50.0);
    }

    #[test]
    fn rankings_respect_minimum_count() {
        let stats = word_stats(&sample(), &["s".to_string()]);
        assert_eq!(highest_wpm(&stats, 10, 50).len(), 3);
        assert_eq!(highest_wpm(&stats, 10, 1)[0].word, "the");
        assert_eq!(lowest_wpm(&stats, 10, 1)[0].word, "lord");
        assert_eq!(scatter_points(&stats, 10).len(), 3);
        assert_eq!(most_frequent(&stats, 1)[0].word, "and");
    }

    #[test]
    fn accuracy_ties_prefer_frequent_words() {
        let stats = word_stats(&sample(), &[]);
        let accurate: Vec<String> = most_accurate(&stats, 10, 3).into_iter().map(|s| s.word).collect();
        assert_eq!(accurate, vec!["s", "the", "lord"]);
        assert_eq!(least_accurate(&stats, 10, 1)[0].word, "and");
    }
}
