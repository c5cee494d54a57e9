//! Writing statistics: word counts, daily goal and streak.

use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::config::WritingConfig;
use crate::entry::Entry;

/// Count whitespace-separated words.
#[must_use]
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Consecutive writing days ending today.
///
/// Walks back from `today` over at most `window_days` days. A day counts if
/// any entry for it has non-blank content. A blank today does not break the
/// streak (the day is not over yet); the first blank day before it does.
#[must_use]
pub fn current_streak(entries: &[Entry], today: NaiveDate, window_days: u32) -> u32 {
    let wrote_on = |date: NaiveDate| entries.iter().any(|e| e.date == date && !e.is_blank());

    let mut streak = 0;
    for offset in 0..window_days {
        let Some(date) = today.checked_sub_days(Days::new(u64::from(offset))) else {
            break;
        };
        if wrote_on(date) {
            streak += 1;
        } else if offset > 0 {
            break;
        }
    }
    streak
}

/// Encouragement for a streak length.
#[must_use]
pub fn streak_message(streak: u32) -> &'static str {
    match streak {
        0 => "Start your writing journey today! ✨",
        1 => "Great start! Keep the momentum going! 🚀",
        2..=3 => "Building a habit! You're doing great! 💪",
        4..=7 => "Amazing streak! You're on fire! 🔥",
        8..=30 => "Incredible dedication! Keep it up! 🌟",
        _ => "Writing master! Your consistency is inspiring! 👑",
    }
}

/// Progress toward `goal` words as a percentage, capped at 100.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn goal_progress(words: usize, goal: usize) -> f64 {
    if goal == 0 {
        return 100.0;
    }
    (words as f64 / goal as f64 * 100.0).min(100.0)
}

/// Snapshot of the writing statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WritingStats {
    /// Words in today's entry.
    pub todays_words: usize,
    /// Words across every entry.
    pub total_words: usize,
    /// Current streak in days.
    pub streak: u32,
    /// Message for the streak.
    pub streak_message: &'static str,
    /// Daily word goal.
    pub daily_goal: usize,
    /// Percent of the daily goal reached.
    pub goal_progress: f64,
}

impl WritingStats {
    /// Compute stats over `entries` (in insertion order) as of `today`.
    ///
    /// Today's count uses the first entry dated today.
    #[must_use]
    pub fn compute(entries: &[Entry], today: NaiveDate, config: &WritingConfig) -> Self {
        let todays_words = entries
            .iter()
            .find(|e| e.date == today)
            .map_or(0, |e| word_count(&e.content));
        let total_words = entries.iter().map(|e| word_count(&e.content)).sum();
        let streak = current_streak(entries, today, config.streak_window_days);

        Self {
            todays_words,
            total_words,
            streak,
            streak_message: streak_message(streak),
            daily_goal: config.daily_word_goal,
            goal_progress: goal_progress(todays_words, config.daily_word_goal),
        }
    }
}
