use super::{write_catalog, ReportSummary};
use crate::analysis::multiplayer::{
    highest_wpm_by_player, mean_wpm_by_player_and_round, player_progress, wins_by_player,
    MultiplayerLog, OVERALL,
};
use crate::chart::{ChartKind, ChartSpec, Series};
use crate::loader::read_test_results;
use crate::locate::results_name;
use crate::error::Result;
use itertools::Itertools;
use std::collections::BTreeSet;
use std::path::Path;

/// Every multiplayer chart for one results file. `name` prefixes each
/// chart's file name.
pub fn multiplayer_charts(log: &MultiplayerLog, name: &str) -> Vec<ChartSpec> {
    let progress = player_progress(log);
    let mut by_test = ChartSpec::new(
        format!("{name}_mean_WPM_by_player_and_test.html"),
        "WPM by player and test",
        ChartKind::Line,
    )
    .axes("Player test number", "WPM");
    for player in log.players() {
        let mine: Vec<_> = progress.iter().filter(|p| p.player == player).collect();
        by_test = by_test
            .series(Series::new(
                format!("{player} Test WPM"),
                mine.iter().map(|p| (p.player_test_number, p.wpm)),
            ))
            .series(Series::new(
                format!("{player} Cumulative WPM"),
                mine.iter().map(|p| (p.player_test_number, p.cumulative_wpm)),
            ));
    }

    let means = mean_wpm_by_player_and_round(log);
    let rounds: BTreeSet<i64> = means
        .iter()
        .flat_map(|m| m.rounds.iter().map(|(round, _)| *round))
        .collect();
    let label = |rank: usize, player: &str| format!("{rank}. {player}");
    let mut by_round = ChartSpec::new(
        format!("{name}_mean_WPM_by_player_and_round.html"),
        "Mean WPM by player and round",
        ChartKind::Bar,
    )
    .axes("Player (overall rank)", "Mean WPM");
    for round in rounds {
        by_round = by_round.series(Series::new(
            format!("Round {round}"),
            means.iter().map(|m| {
                let wpm = m.rounds.iter().find(|(r, _)| *r == round).map(|(_, w)| *w);
                (label(m.rank, &m.player), wpm)
            }),
        ));
    }
    by_round = by_round.series(Series::new(
        OVERALL,
        means.iter().map(|m| (label(m.rank, &m.player), m.overall)),
    ));

    let wins = wins_by_player(log);
    let wins_chart = ChartSpec::new(
        format!("{name}_wins_by_player.html"),
        "Wins by player",
        ChartKind::Bar,
    )
    .axes("Player", "Wins")
    .series(Series::new(
        "Wins",
        wins.iter().map(|w| (w.player.clone(), w.wins as f64)),
    ));

    let highest = highest_wpm_by_player(log);
    let highest_chart = ChartSpec::new(
        format!("{name}_highest_WPM_by_player.html"),
        "Highest WPM by player",
        ChartKind::Bar,
    )
    .axes("Player", "WPM")
    .series(Series::new(
        "Highest WPM",
        highest.iter().map(|h| (h.player.clone(), h.wpm)),
    ));

    vec![by_test, by_round, wins_chart, highest_chart]
}

/// Load a multiplayer results file and chart it into `out_dir`.
pub fn write_multiplayer_report(results: &Path, out_dir: &Path) -> Result<ReportSummary> {
    let log = MultiplayerLog::from_records(read_test_results(results)?, results)?;
    let name = results_name(results);
    let players = log.players().into_iter().join(", ");
    write_catalog(
        out_dir,
        &format!("{name} multiplayer results ({players})"),
        &multiplayer_charts(&log, &name),
    )
}
