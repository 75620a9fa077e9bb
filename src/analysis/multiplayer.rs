//! Head-to-head tables for one multiplayer results file. Tag slots are
//! read as round, test within round and player test number.

use crate::error::{ReportError, Result};
use crate::record::TestRecord;
use crate::util::{cumulative_mean, group_indices, mean, transform_by_group};
use itertools::Itertools;
use std::collections::BTreeMap;
use std::path::Path;

pub const OVERALL: &str = "Overall";

/// Rows in game order with each row's player test number resolved.
#[derive(Debug, Clone)]
pub struct MultiplayerLog {
    records: Vec<TestRecord>,
    slots: Vec<i64>,
}

impl MultiplayerLog {
    pub fn from_records(records: Vec<TestRecord>, source: &Path) -> Result<Self> {
        if records.is_empty() {
            return Err(ReportError::no_usable_data(format!(
                "{} contains no tests",
                source.display()
            )));
        }
        let records: Vec<TestRecord> = records
            .into_iter()
            .sorted_by(|a, b| {
                a.within_session_test_number
                    .unwrap_or(a.test_number)
                    .cmp(&b.within_session_test_number.unwrap_or(b.test_number))
                    .then(a.unix_start.total_cmp(&b.unix_start))
            })
            .collect();

        // Files without a player test number fall back to each player's
        // running count.
        let running: Vec<i64> = transform_by_group(
            &records,
            |r| r.player.clone(),
            |indices| (1..=indices.len() as i64).collect(),
        );
        let slots = records
            .iter()
            .zip(running)
            .map(|(r, count)| r.player_test_number().unwrap_or(count))
            .collect();
        Ok(Self { records, slots })
    }

    pub fn records(&self) -> &[TestRecord] {
        &self.records
    }

    pub fn player_test_numbers(&self) -> &[i64] {
        &self.slots
    }

    /// Players in alphabetical order.
    pub fn players(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|r| r.player.clone())
            .unique()
            .sorted()
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressPoint {
    pub player: String,
    pub player_test_number: i64,
    pub wpm: f64,
    pub cumulative_wpm: f64,
}

pub fn player_progress(log: &MultiplayerLog) -> Vec<ProgressPoint> {
    let records = log.records();
    let cumulative = transform_by_group(
        records,
        |r| r.player.clone(),
        |indices| {
            let wpm: Vec<f64> = indices.iter().map(|&i| records[i].wpm).collect();
            cumulative_mean(&wpm)
        },
    );
    records
        .iter()
        .zip(log.player_test_numbers())
        .zip(cumulative)
        .map(|((r, slot), cumulative_wpm)| ProgressPoint {
            player: r.player.clone(),
            player_test_number: *slot,
            wpm: r.wpm,
            cumulative_wpm,
        })
        .collect()
}

/// True for every row that matches the highest WPM in its slot.
pub fn best_in_slot(log: &MultiplayerLog) -> Vec<bool> {
    let records = log.records();
    let slots = log.player_test_numbers();
    let mut flags = vec![false; records.len()];
    let indices: Vec<usize> = (0..records.len()).collect();
    for (_, members) in group_indices(&indices, |&i| slots[i]) {
        let best = members
            .iter()
            .map(|&i| records[i].wpm)
            .fold(f64::NEG_INFINITY, f64::max);
        for i in members {
            flags[i] = records[i].wpm == best;
        }
    }
    flags
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerWins {
    pub player: String,
    pub wins: usize,
}

/// Slots won per player, most wins first. Every tied winner is credited
/// and players without a win are listed with zero.
pub fn wins_by_player(log: &MultiplayerLog) -> Vec<PlayerWins> {
    let mut wins: BTreeMap<String, usize> =
        log.players().into_iter().map(|p| (p, 0)).collect();
    for (r, best) in log.records().iter().zip(best_in_slot(log)) {
        if best {
            *wins.entry(r.player.clone()).or_default() += 1;
        }
    }
    wins.into_iter()
        .map(|(player, wins)| PlayerWins { player, wins })
        .sorted_by(|a, b| b.wins.cmp(&a.wins).then_with(|| a.player.cmp(&b.player)))
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerBest {
    pub player: String,
    pub wpm: f64,
}

pub fn highest_wpm_by_player(log: &MultiplayerLog) -> Vec<PlayerBest> {
    let mut best: BTreeMap<String, f64> = BTreeMap::new();
    for r in log.records() {
        let entry = best.entry(r.player.clone()).or_insert(f64::NEG_INFINITY);
        *entry = entry.max(r.wpm);
    }
    best.into_iter()
        .map(|(player, wpm)| PlayerBest { player, wpm })
        .sorted_by(|a, b| b.wpm.total_cmp(&a.wpm).then_with(|| a.player.cmp(&b.player)))
        .collect()
}

/// Mean WPM per round for one player, plus their overall mean and rank.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerRoundMeans {
    pub player: String,
    /// 1 is the fastest overall mean.
    pub rank: usize,
    pub rounds: Vec<(i64, f64)>,
    pub overall: f64,
}

/// Rows without a round tag are treated as round 1.
pub fn mean_wpm_by_player_and_round(log: &MultiplayerLog) -> Vec<PlayerRoundMeans> {
    let mut by_player: BTreeMap<String, BTreeMap<i64, Vec<f64>>> = BTreeMap::new();
    for r in log.records() {
        by_player
            .entry(r.player.clone())
            .or_default()
            .entry(r.round().unwrap_or(1))
            .or_default()
            .push(r.wpm);
    }
    by_player
        .into_iter()
        .map(|(player, rounds)| {
            let all: Vec<f64> = rounds.values().flatten().copied().collect();
            PlayerRoundMeans {
                player,
                rank: 0,
                rounds: rounds
                    .iter()
                    .map(|(round, wpm)| (*round, mean(wpm).unwrap_or_default()))
                    .collect(),
                overall: mean(&all).unwrap_or_default(),
            }
        })
        .sorted_by(|a, b| b.overall.total_cmp(&a.overall).then_with(|| a.player.cmp(&b.player)))
        .enumerate()
        .map(|(idx, means)| PlayerRoundMeans {
            rank: idx + 1,
            ..means
        })
        .collect()
}
