//! Per-player running totals folded from completed rounds.
//!
//! Totals accumulate monotonically: every result is applied exactly once
//! and nothing is ever recomputed from the results log.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::model::{GameResult, PlayerStats};

/// Fold one result into a stats map, returning the updated map.
pub fn apply(
    result: &GameResult,
    mut stats: HashMap<String, PlayerStats>,
    now: DateTime<Utc>,
) -> HashMap<String, PlayerStats> {
    let entry = stats
        .entry(result.username.clone())
        .or_insert_with(|| PlayerStats::new(&result.username));
    fold(entry, result, now);
    stats
}

fn fold(stats: &mut PlayerStats, result: &GameResult, now: DateTime<Utc>) {
    stats.total_games += 1;
    stats.total_score += result.score;
    stats.total_questions_answered += result.total_questions;
    stats.total_correct += result.score;
    stats.last_played = Some(now);
    stats.streak_record = stats.streak_record.max(result.streak_max);
    // First category played wins and is never revisited.
    if stats.best_category.is_none() {
        stats.best_category = Some(result.config.category);
    }
}

/// The stats store, keyed by username.
///
/// Passed explicitly to whoever records results; there is no global map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatsBook {
    players: HashMap<String, PlayerStats>,
}

impl StatsBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(players: HashMap<String, PlayerStats>) -> Self {
        Self { players }
    }

    pub fn as_map(&self) -> &HashMap<String, PlayerStats> {
        &self.players
    }

    pub fn into_map(self) -> HashMap<String, PlayerStats> {
        self.players
    }

    pub fn get(&self, username: &str) -> Option<&PlayerStats> {
        self.players.get(username)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Fold a completed round into its player's totals.
    pub fn apply(&mut self, result: &GameResult, now: DateTime<Utc>) -> &PlayerStats {
        let entry = self
            .players
            .entry(result.username.clone())
            .or_insert_with(|| PlayerStats::new(&result.username));
        fold(entry, result, now);
        entry
    }

    /// Players ordered by total score, then accuracy, then name.
    pub fn leaderboard(&self) -> Vec<&PlayerStats> {
        let mut players: Vec<&PlayerStats> = self.players.values().collect();
        players.sort_by(|a, b| {
            b.total_score
                .cmp(&a.total_score)
                .then_with(|| {
                    b.accuracy()
                        .partial_cmp(&a.accuracy())
                        .unwrap_or(Ordering::Equal)
                })
                .then_with(|| a.username.cmp(&b.username))
        });
        players
    }
}
