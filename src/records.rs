//! Personal bests per mini-game
//!
//! Each board keeps one entry per trainee, their best score, ranked highest
//! first. Ties go to whoever set the score on the earlier day.

use serde::{Deserialize, Serialize};

use crate::minigame::MiniGameKind;

/// Maximum number of trainees kept per board
pub const MAX_RECORDS: usize = 10;

/// A trainee's best score on one mini-game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordEntry {
    pub score: u64,
    /// Game day it was set on
    pub day: u32,
    /// Dog or student it was set with
    pub trainee: String,
}

impl RecordEntry {
    /// True if `self` ranks above `other`
    fn outranks(&self, other: &RecordEntry) -> bool {
        self.score > other.score || (self.score == other.score && self.day < other.day)
    }
}

/// One mini-game's board of personal bests
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Leaderboard {
    entries: Vec<RecordEntry>,
}

impl Leaderboard {
    pub fn entries(&self) -> &[RecordEntry] {
        &self.entries
    }

    /// Best entry on the board
    pub fn leader(&self) -> Option<&RecordEntry> {
        self.entries.first()
    }

    pub fn best_for(&self, trainee: &str) -> Option<&RecordEntry> {
        self.entries.iter().find(|e| e.trainee == trainee)
    }

    /// Submit a finished session. Returns the 1-indexed rank when it becomes
    /// the trainee's new best and stays on the board.
    pub fn submit(&mut self, entry: RecordEntry) -> Option<usize> {
        if entry.score == 0 {
            return None;
        }
        if let Some(i) = self.entries.iter().position(|e| e.trainee == entry.trainee) {
            if entry.score <= self.entries[i].score {
                return None;
            }
            self.entries.remove(i);
        }

        let idx = self.entries.partition_point(|e| e.outranks(&entry));
        if idx >= MAX_RECORDS {
            return None;
        }
        self.entries.insert(idx, entry);
        self.entries.truncate(MAX_RECORDS);
        Some(idx + 1)
    }
}

/// Boards for every mini-game
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Records {
    pub rhythm: Leaderboard,
    pub paddle: Leaderboard,
}

impl Records {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn board(&self, kind: MiniGameKind) -> &Leaderboard {
        match kind {
            MiniGameKind::Rhythm => &self.rhythm,
            MiniGameKind::Paddle => &self.paddle,
        }
    }

    /// Record a finished mini-game; returns the rank if it is a new personal best on the board
    pub fn record(&mut self, kind: MiniGameKind, score: u64, day: u32, trainee: &str) -> Option<usize> {
        let board = match kind {
            MiniGameKind::Rhythm => &mut self.rhythm,
            MiniGameKind::Paddle => &mut self.paddle,
        };
        let rank = board.submit(RecordEntry {
            score,
            day,
            trainee: trainee.to_string(),
        });
        if let Some(rank) = rank {
            log::info!("New {:?} best for {}: {} (#{})", kind, trainee, score, rank);
        }
        rank
    }
}
