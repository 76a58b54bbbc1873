//! Time-decayed popularity ranking.
//!
//! `score = (votes + 0.5 * comments) * 0.9^age_days`, where `age_days` is
//! measured back from the newest submission, not from the wall clock, so
//! replaying the same log always ranks the same way.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, Utc};

use super::models::Submission;

/// Submissions per frontpage window.
pub const FRONTPAGE_SIZE: usize = 10;

const COMMENT_WEIGHT: f64 = 0.5;
const DAILY_DECAY: f64 = 0.9;
const SECONDS_PER_DAY: f64 = 86_400.0;

pub fn score(votes: usize, comments: usize, age_days: f64) -> f64 {
    (votes as f64 + COMMENT_WEIGHT * comments as f64) * DAILY_DECAY.powf(age_days.max(0.0))
}

fn age_days(newest: DateTime<Utc>, submitted_at: DateTime<Utc>) -> f64 {
    (newest - submitted_at).num_milliseconds() as f64 / 1000.0 / SECONDS_PER_DAY
}

/// Highest score first; equal scores put the newer submission first.
fn compare(a: &(f64, &Submission), b: &(f64, &Submission)) -> Ordering {
    b.0.total_cmp(&a.0)
        .then_with(|| b.1.submitted_at.cmp(&a.1.submitted_at))
        .then_with(|| a.1.item_id.cmp(&b.1.item_id))
}

/// Cached ranking, recomputed on the first read after it is invalidated.
#[derive(Debug)]
pub struct Ranking {
    dirty: bool,
    order: Vec<String>,
    scores: HashMap<String, f64>,
}

impl Ranking {
    pub fn new() -> Self {
        Self {
            dirty: true,
            order: Vec::new(),
            scores: HashMap::new(),
        }
    }

    pub fn invalidate(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Recompute if anything changed since the last read.
    pub fn refresh<'a>(&mut self, submissions: impl Iterator<Item = &'a Submission>) {
        if !self.dirty {
            return;
        }

        let submissions: Vec<&Submission> = submissions.collect();
        let newest = submissions.iter().map(|s| s.submitted_at).max();

        let mut scored: Vec<(f64, &Submission)> = submissions
            .into_iter()
            .map(|s| {
                let age = newest.map(|newest| age_days(newest, s.submitted_at)).unwrap_or(0.0);
                (score(s.vote_count, s.comment_count, age), s)
            })
            .collect();
        scored.sort_by(compare);

        self.scores = scored.iter().map(|(score, s)| (s.item_id.clone(), *score)).collect();
        self.order = scored.into_iter().map(|(_, s)| s.item_id.clone()).collect();
        self.dirty = false;
    }

    /// Item ids, best first.
    pub fn order(&self) -> &[String] {
        &self.order
    }

    pub fn score_of(&self, item_id: &str) -> f64 {
        self.scores.get(item_id).copied().unwrap_or(0.0)
    }
}

impl Default for Ranking {
    fn default() -> Self {
        Self::new()
    }
}
