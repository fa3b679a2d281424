//! High score leaderboard
//!
//! Persisted to LocalStorage, tracks the top 10 rounds.

use serde::{Deserialize, Serialize};

use crate::storage;

/// Maximum number of high scores to keep
pub const MAX_HIGH_SCORES: usize = 10;

/// A single high score entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HighScoreEntry {
    pub score: u64,
    /// Size the fish had grown to
    pub size: f32,
    /// Unix timestamp (ms) when achieved
    pub timestamp: f64,
}

/// High score leaderboard, sorted by score descending
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HighScores {
    pub entries: Vec<HighScoreEntry>,
}

impl HighScores {
    const STORAGE_KEY: &'static str = "fish_frenzy_highscores";

    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// A round scores onto the board if it beats the lowest kept entry.
    /// Zero never counts.
    pub fn qualifies(&self, score: u64) -> bool {
        score > 0
            && (self.entries.len() < MAX_HIGH_SCORES
                || self.entries.last().is_none_or(|e| score > e.score))
    }

    /// Record a finished round. Returns its 1-based rank, or None if it
    /// didn't make the board.
    pub fn add_score(&mut self, score: u64, size: f32, timestamp: f64) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }

        // Ties keep the older entry ahead
        let index = self.entries.partition_point(|e| e.score >= score);
        self.entries.insert(
            index,
            HighScoreEntry {
                score,
                size,
                timestamp,
            },
        );
        self.entries.truncate(MAX_HIGH_SCORES);
        Some(index + 1)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }

    /// Load the leaderboard from LocalStorage
    pub fn load() -> Self {
        let scores: Self = storage::load_json(Self::STORAGE_KEY).unwrap_or_default();
        log::info!("Loaded {} high scores", scores.entries.len());
        scores
    }

    pub fn save(&self) {
        storage::save_json(Self::STORAGE_KEY, self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_never_qualifies() {
        let mut scores = HighScores::new();
        assert_eq!(scores.add_score(0, 2.5, 0.0), None);
        assert!(scores.is_empty());
    }

    #[test]
    fn test_sorted_descending() {
        let mut scores = HighScores::new();
        assert_eq!(scores.add_score(50, 3.0, 1.0), Some(1));
        assert_eq!(scores.add_score(120, 4.1, 2.0), Some(1));
        assert_eq!(scores.add_score(80, 3.5, 3.0), Some(2));
        assert_eq!(scores.add_score(80, 3.6, 4.0), Some(3));
        let order: Vec<u64> = scores.entries.iter().map(|e| e.score).collect();
        assert_eq!(order, vec![120, 80, 80, 50]);
        assert_eq!(scores.top_score(), Some(120));
    }

    #[test]
    fn test_keeps_top_ten() {
        let mut scores = HighScores::new();
        for i in 1..=12 {
            scores.add_score(i * 10, 2.5, i as f64);
        }
        assert_eq!(scores.entries.len(), MAX_HIGH_SCORES);
        assert_eq!(scores.entries.last().map(|e| e.score), Some(30));
        assert!(!scores.qualifies(30));
        assert!(scores.qualifies(31));
    }
}
