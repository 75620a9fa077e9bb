use super::{write_catalog, ReportSummary};
use crate::analysis::accuracy::{mean_wpm_by_bin, rolling_wpm_by_bin, AccuracyBins};
use crate::analysis::endurance::{
    by_year_month, characters_by_date, top_buckets, top_dates, TimeBucket,
};
use crate::analysis::progress::{progress_by_book, verse_grid, OVERALL};
use crate::analysis::speed::{
    by_starting_hour, fastest_tests, mean_wpm_by_tag, mean_wpm_by_within_session_test_number,
    wpm_by_session, wpm_trend, KeyedMean, TagSlot,
};
use crate::analysis::words::{
    highest_wpm, least_accurate, lowest_wpm, most_accurate, most_frequent, scatter_points,
    word_stats, WordStats,
};
use crate::analysis::TestLog;
use crate::chart::{ChartKind, ChartSpec, Series};
use crate::config::ReportConfig;
use crate::error::Result;
use crate::loader::{read_headered, read_test_results};
use crate::record::{VerseRecord, WordRecord};
use itertools::Itertools;
use log::info;
use std::path::Path;

const FASTEST_TESTS: usize = 100;
const ACCURACY_WORDS: usize = 100;
const FREQUENT_WORDS: usize = 200;
const ACCURACY_ROLLING_WINDOW: usize = 10;

/// Everything a single-player report can draw on. Word results and the
/// verse catalog are optional extras.
#[derive(Debug, Clone)]
pub struct SinglePlayerData {
    pub log: TestLog,
    pub words: Option<Vec<WordRecord>>,
    pub catalog: Option<Vec<VerseRecord>>,
}

fn keyed_label(m: &KeyedMean) -> String {
    format!("{} ({} tests)", m.key, m.tests)
}

fn speed_charts(log: &TestLog, cfg: &ReportConfig) -> Vec<ChartSpec> {
    let mut charts = Vec::new();

    let trend = wpm_trend(log, &cfg.rolling_windows);
    let mut by_test = ChartSpec::new("WPM_by_test.html", "WPM by test", ChartKind::Line)
        .axes("Test number", "WPM")
        .series(Series::new(
            "WPM",
            trend.rows.iter().map(|r| (r.chronological_number, r.wpm)),
        ));
    for (idx, window) in trend.windows.iter().enumerate() {
        by_test = by_test.series(Series::new(
            format!("{window}-test rolling mean"),
            trend.rows.iter().map(|r| (r.chronological_number, r.rolling[idx])),
        ));
    }
    charts.push(by_test.series(Series::new(
        "Cumulative mean",
        trend.rows.iter().map(|r| (r.chronological_number, r.cumulative_mean)),
    )));

    let fastest = fastest_tests(log, FASTEST_TESTS);
    charts.push(
        ChartSpec::new("fastest_tests.html", format!("{FASTEST_TESTS} fastest tests"), ChartKind::Bar)
            .axes("Rank", "WPM")
            .series(Series::new(
                "WPM",
                fastest.iter().map(|t| {
                    let day: String = t.local_start.chars().take(10).collect();
                    (format!("{}. {} ({day})", t.rank, t.verse_code), t.wpm)
                }),
            )),
    );

    let hours = by_starting_hour(log);
    charts.push(
        ChartSpec::new("chars_by_hour.html", "Characters typed by starting hour", ChartKind::Bar)
            .axes("Hour", "Characters")
            .series(Series::new(
                "Characters",
                hours.iter().map(|h| (h.hour, h.characters as f64)),
            )),
    );
    charts.push(
        ChartSpec::new("WPM_by_hour.html", "Mean WPM by starting hour", ChartKind::Bar)
            .axes("Hour", "Mean WPM")
            .series(Series::new("Mean WPM", hours.iter().map(|h| (h.hour, h.mean_wpm)))),
    );

    for slot in TagSlot::ALL {
        let means = mean_wpm_by_tag(log, slot);
        if means.is_empty() {
            continue;
        }
        let n = slot.to_string();
        charts.push(
            ChartSpec::new(
                format!("mean_WPM_by_{}.html", n.to_lowercase()),
                format!("Mean WPM by {n}"),
                ChartKind::Bar,
            )
            .axes(n.clone(), "Mean WPM")
            .series(Series::new(
                "Mean WPM",
                means.iter().map(|m| (keyed_label(m), m.mean_wpm)),
            )),
        );
    }

    let within = mean_wpm_by_within_session_test_number(log);
    charts.push(
        ChartSpec::new(
            "mean_WPM_by_within_session_test_number.html",
            "Mean WPM by within-session test number",
            ChartKind::Bar,
        )
        .axes("Within-session test number", "Mean WPM")
        .series(Series::new(
            "Mean WPM",
            within.iter().map(|m| (keyed_label(m), m.mean_wpm)),
        )),
    );
    let mut by_session = ChartSpec::new(
        "WPM_by_within_session_test_number.html",
        "WPM by within-session test number",
        ChartKind::Line,
    )
    .axes("Within-session test number", "WPM");
    for session in wpm_by_session(log) {
        by_session = by_session.series(Series::new(
            format!("Session {}", session.session),
            session.points,
        ));
    }
    charts.push(by_session);

    charts
}

fn endurance_charts(log: &TestLog, cfg: &ReportConfig) -> Vec<ChartSpec> {
    let mut charts = Vec::new();
    for bucket in TimeBucket::ALL {
        let top = top_buckets(log, bucket, cfg.top_n);
        charts.push(
            ChartSpec::new(
                format!("endurance_top_{}_clock_{}.html", cfg.top_n, bucket.file_stem()),
                format!("Most characters typed in one clock {bucket}"),
                ChartKind::Bar,
            )
            .axes(bucket.to_string(), "Characters")
            .series(Series::new(
                "Characters",
                top.iter().map(|b| (format!("{}. {}", b.rank, b.key), b.characters as f64)),
            )),
        );
    }

    let months = by_year_month(log);
    charts.push(
        ChartSpec::new(
            "characters_typed_by_year_and_month.html",
            "Characters typed by year and month",
            ChartKind::Bar,
        )
        .axes("Month", "Characters")
        .series(Series::new(
            "Characters",
            months.iter().map(|m| (m.month.clone(), m.characters as f64)),
        )),
    );
    charts.push(
        ChartSpec::new(
            "most_characters_typed_by_year_and_month.html",
            "Months with the most characters typed",
            ChartKind::Bar,
        )
        .axes("Month", "Characters")
        .series(Series::new(
            "Characters",
            months
                .iter()
                .sorted_by(|a, b| b.characters.cmp(&a.characters))
                .map(|m| (m.month.clone(), m.characters as f64)),
        )),
    );
    charts.push(
        ChartSpec::new(
            "avg_WPM_by_year_and_month.html",
            "Mean WPM by year and month",
            ChartKind::Bar,
        )
        .axes("Month", "Mean WPM")
        .series(Series::new(
            "Mean WPM",
            months.iter().map(|m| (m.month.clone(), m.mean_wpm)),
        )),
    );

    let dates = characters_by_date(log);
    charts.push(
        ChartSpec::new("keypresses_typed_by_date.html", "Characters typed by date", ChartKind::Bar)
            .axes("Date", "Characters")
            .series(Series::new(
                "Characters",
                dates.iter().map(|d| (d.date.to_string(), d.characters as f64)),
            )),
    );
    charts.push(
        ChartSpec::new(
            "top_dates_by_keypresses.html",
            format!("Top {} dates by characters typed", cfg.top_n),
            ChartKind::Bar,
        )
        .axes("Date", "Characters")
        .series(Series::new(
            "Characters",
            top_dates(&dates, cfg.top_n)
                .iter()
                .map(|d| (format!("{}. {}", d.rank, d.date), d.characters as f64)),
        )),
    );
    charts
}

fn accuracy_charts(log: &TestLog) -> Vec<ChartSpec> {
    let rates: Vec<f64> = log
        .records()
        .iter()
        .map(|r| r.error_and_backspace_rate)
        .collect();
    let bins = AccuracyBins::deciles(&rates);
    let points = rolling_wpm_by_bin(log, &bins, ACCURACY_ROLLING_WINDOW);

    let mut rolling = ChartSpec::new(
        "mean_rolling_WPM_by_accuracy_bin.html",
        format!("{ACCURACY_ROLLING_WINDOW}-test rolling WPM by error-and-backspace rate bin"),
        ChartKind::Line,
    )
    .axes("Test number", "Rolling WPM");
    for bin in 0..bins.len() {
        rolling = rolling.series(Series::new(
            bins.label(bin),
            points
                .iter()
                .filter(|p| p.bin == bin)
                .map(|p| (p.chronological_number, p.rolling_wpm)),
        ));
    }

    let summary = mean_wpm_by_bin(log, &bins);
    let means = ChartSpec::new(
        "mean_WPM_by_accuracy_bin.html",
        "Mean WPM by error-and-backspace rate bin",
        ChartKind::Bar,
    )
    .axes("Error-and-backspace rate", "Mean WPM")
    .series(Series::new(
        "Mean WPM",
        summary
            .iter()
            .map(|s| (format!("{} ({} tests)", s.label, s.tests), s.mean_wpm)),
    ));
    vec![rolling, means]
}

fn word_bar(
    file_name: &str,
    title: String,
    y_title: &str,
    words: &[WordStats],
    value: fn(&WordStats) -> f64,
) -> ChartSpec {
    ChartSpec::new(file_name, title, ChartKind::Bar)
        .axes("Word", y_title)
        .series(Series::new(
            y_title,
            words.iter().map(|w| (w.word.clone(), value(w))),
        ))
}

fn word_charts(words: &[WordRecord], cfg: &ReportConfig) -> Vec<ChartSpec> {
    let stats = word_stats(words, &cfg.word_stoplist);
    let min = cfg.min_word_count;
    let n = cfg.top_n;
    let wpm = |w: &WordStats| w.mean_wpm;
    let error_free = |w: &WordStats| w.error_free_pct;
    vec![
        word_bar(
            "words_with_highest_WPM.html",
            format!("{n} words with the highest mean WPM (typed at least {min} times)"),
            "Mean WPM",
            &highest_wpm(&stats, min, n),
            wpm,
        ),
        word_bar(
            "words_with_lowest_WPM.html",
            format!("{n} words with the lowest mean WPM (typed at least {min} times)"),
            "Mean WPM",
            &lowest_wpm(&stats, min, n),
            wpm,
        ),
        word_bar(
            "high_accuracy_words.html",
            format!("{ACCURACY_WORDS} most accurately typed words"),
            "Error-free %",
            &most_accurate(&stats, min, ACCURACY_WORDS),
            error_free,
        ),
        word_bar(
            "low_accuracy_words.html",
            format!("{ACCURACY_WORDS} least accurately typed words"),
            "Error-free %",
            &least_accurate(&stats, min, ACCURACY_WORDS),
            error_free,
        ),
        ChartSpec::new(
            "word_accuracy_WPM_scatter.html",
            "Word accuracy vs. speed",
            ChartKind::Scatter,
        )
        .axes("Error-free %", "Mean WPM")
        .series(Series::new(
            "Words",
            scatter_points(&stats, min)
                .iter()
                .map(|w| (w.error_free_pct, w.mean_wpm)),
        )),
        word_bar(
            "words_typed_most_frequently.html",
            format!("{FREQUENT_WORDS} most frequently typed words"),
            "Times typed",
            &most_frequent(&stats, FREQUENT_WORDS),
            |w| w.count as f64,
        ),
    ]
}

fn progress_charts(catalog: &[VerseRecord]) -> Vec<ChartSpec> {
    let books = progress_by_book(catalog);
    // the overall total would dwarf every book
    let per_book = || books.iter().filter(|b| b.book != OVERALL);
    let grid = verse_grid(catalog);
    let cells = |typed: bool| {
        grid.iter()
            .filter(move |c| c.typed == typed)
            .map(|c| (c.column, c.row as f64))
    };
    vec![
        ChartSpec::new("progress_percentage.html", "Percent of each book typed", ChartKind::Bar)
            .axes("Book", "% of characters typed")
            .series(Series::new(
                "% typed",
                books.iter().map(|b| (b.book.clone(), b.percent_typed())),
            )),
        ChartSpec::new("progress_nominal.html", "Characters typed per book", ChartKind::Bar)
            .axes("Book", "Characters")
            .series(Series::new(
                "Typed",
                per_book().map(|b| (b.book.clone(), b.typed_characters as f64)),
            ))
            .series(Series::new(
                "Total",
                per_book().map(|b| (b.book.clone(), b.total_characters as f64)),
            )),
        ChartSpec::new("Typed_verses.html", "Typed verses", ChartKind::Scatter)
            .series(Series::new("Typed", cells(true)))
            .series(Series::new("Untyped", cells(false))),
    ]
}

/// The full single-player catalog. Word and progress charts only appear
/// when their inputs were supplied.
pub fn single_player_charts(data: &SinglePlayerData, cfg: &ReportConfig) -> Vec<ChartSpec> {
    let mut charts = speed_charts(&data.log, cfg);
    charts.extend(endurance_charts(&data.log, cfg));
    charts.extend(accuracy_charts(&data.log));
    if let Some(words) = &data.words {
        charts.extend(word_charts(words, cfg));
    }
    if let Some(catalog) = &data.catalog {
        charts.extend(progress_charts(catalog));
    }
    charts
}

fn read_optional<T: serde::de::DeserializeOwned>(path: Option<&Path>) -> Result<Option<Vec<T>>> {
    match path {
        Some(path) if path.is_file() => read_headered(path).map(Some),
        Some(path) => {
            info!("{} not found, skipping its charts", path.display());
            Ok(None)
        }
        None => Ok(None),
    }
}

pub fn load_single_player_data(
    test_results: &Path,
    word_results: Option<&Path>,
    catalog: Option<&Path>,
) -> Result<SinglePlayerData> {
    Ok(SinglePlayerData {
        log: TestLog::from_records(read_test_results(test_results)?, test_results)?,
        words: read_optional(word_results)?,
        catalog: read_optional(catalog)?,
    })
}

pub fn write_single_player_report(
    data: &SinglePlayerData,
    cfg: &ReportConfig,
    out_dir: &Path,
) -> Result<ReportSummary> {
    write_catalog(
        out_dir,
        &format!("Single-player results ({} tests)", data.log.len()),
        &single_player_charts(data, cfg),
    )
}
