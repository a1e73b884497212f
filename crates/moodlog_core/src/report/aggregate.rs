//! Mood frequency aggregation.
//!
//! # Responsibility
//! - Tally entries per palette mood over an in-memory snapshot.
//! - Derive total and most frequent mood.
//!
//! # Invariants
//! - Every palette mood is present, in declaration order, even at 0.
//! - Labels that are not exact palette labels are dropped, not errors.
//! - Ties for the most frequent mood go to the earliest palette mood.

use crate::model::entry::MoodEntry;
use crate::model::mood::Mood;
use chrono::{Days, NaiveDateTime};
use log::debug;
use serde::{Deserialize, Serialize};

/// Trailing window used by the weekly report.
pub const DEFAULT_REPORT_DAYS: u32 = 7;

/// Per-mood counts seeded with the full palette.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoodTally {
    counts: [u32; Mood::ALL.len()],
}

impl MoodTally {
    /// Tallies raw persisted labels; unknown labels are skipped.
    pub fn from_labels<'a>(labels: impl IntoIterator<Item = &'a str>) -> Self {
        let mut tally = Self::default();
        for label in labels {
            if let Some(mood) = Mood::from_label(label) {
                tally.record(mood);
            }
        }
        tally
    }

    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a MoodEntry>) -> Self {
        let mut tally = Self::default();
        for entry in entries {
            tally.record(entry.mood);
        }
        tally
    }

    pub fn record(&mut self, mood: Mood) {
        self.counts[mood.palette_index()] += 1;
    }

    pub fn count(&self, mood: Mood) -> u32 {
        self.counts[mood.palette_index()]
    }

    /// `(mood, count)` pairs in palette order.
    pub fn iter(&self) -> impl Iterator<Item = (Mood, u32)> + '_ {
        Mood::ALL.into_iter().map(|mood| (mood, self.count(mood)))
    }

    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }

    /// Most frequent mood; `None` when nothing was tallied.
    pub fn top(&self) -> Option<Mood> {
        let mut best: Option<(Mood, u32)> = None;
        for (mood, count) in self.iter() {
            if count == 0 {
                continue;
            }
            match best {
                Some((_, best_count)) if best_count >= count => {}
                _ => best = Some((mood, count)),
            }
        }
        best.map(|(mood, _)| mood)
    }
}

/// Which part of the snapshot a report covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportWindow {
    AllTime,
    /// Entries logged on or after local midnight `n` days before now.
    TrailingDays(u32),
}

impl ReportWindow {
    pub fn weekly() -> Self {
        Self::TrailingDays(DEFAULT_REPORT_DAYS)
    }

    /// Earliest included instant, or `None` for an unbounded window.
    pub fn cutoff(self, now: NaiveDateTime) -> Option<NaiveDateTime> {
        match self {
            Self::AllTime => None,
            Self::TrailingDays(days) => now
                .date()
                .checked_sub_days(Days::new(u64::from(days)))
                .and_then(|day| day.and_hms_opt(0, 0, 0))
                .or(Some(NaiveDateTime::MIN)),
        }
    }

    /// Whether `entry` falls inside the window.
    ///
    /// Entries with unparseable timestamps only count toward `AllTime`.
    pub fn contains(self, entry: &MoodEntry, now: NaiveDateTime) -> bool {
        match self.cutoff(now) {
            None => true,
            Some(cutoff) => entry.logged_at().is_some_and(|at| at >= cutoff),
        }
    }
}

/// One palette bucket of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoodCount {
    pub mood: Mood,
    pub count: u32,
}

/// Frequency report over a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoodReport {
    pub window: ReportWindow,
    /// Every palette mood, in palette order.
    pub counts: Vec<MoodCount>,
    pub total: u32,
    pub top: Option<Mood>,
}

impl MoodReport {
    pub fn from_tally(window: ReportWindow, tally: &MoodTally) -> Self {
        Self {
            window,
            counts: tally
                .iter()
                .map(|(mood, count)| MoodCount { mood, count })
                .collect(),
            total: tally.total(),
            top: tally.top(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    pub fn count(&self, mood: Mood) -> u32 {
        self.counts
            .iter()
            .find(|bucket| bucket.mood == mood)
            .map_or(0, |bucket| bucket.count)
    }
}

/// Builds a report over `entries` restricted to `window`, relative to `now`.
pub fn build_report(entries: &[MoodEntry], window: ReportWindow, now: NaiveDateTime) -> MoodReport {
    let tally = MoodTally::from_entries(entries.iter().filter(|entry| window.contains(entry, now)));
    let report = MoodReport::from_tally(window, &tally);
    debug!(
        "event=report_build module=report status=ok window={:?} snapshot={} total={}",
        window,
        entries.len(),
        report.total
    );
    report
}

#[cfg(test)]
mod tests {
    use super::{build_report, MoodTally, ReportWindow};
    use crate::model::entry::MoodEntry;
    use crate::model::mood::Mood;
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn entry(id: i64, mood: Mood, timestamp: &str) -> MoodEntry {
        MoodEntry::with_fields(id, mood, timestamp, "").unwrap()
    }

    #[test]
    fn empty_tally_lists_full_palette_at_zero() {
        let tally = MoodTally::from_labels([]);
        assert_eq!(tally.total(), 0);
        assert_eq!(tally.top(), None);
        let moods: Vec<Mood> = tally.iter().map(|(mood, _)| mood).collect();
        assert_eq!(moods, Mood::ALL.to_vec());
        assert!(tally.iter().all(|(_, count)| count == 0));
    }

    #[test]
    fn tally_counts_exact_labels() {
        let tally = MoodTally::from_labels(["Happy 😊", "Happy 😊", "Calm 🙂"]);
        assert_eq!(tally.count(Mood::Happy), 2);
        assert_eq!(tally.count(Mood::Calm), 1);
        assert_eq!(tally.count(Mood::Neutral), 0);
        assert_eq!(tally.count(Mood::Sad), 0);
        assert_eq!(tally.count(Mood::Anxious), 0);
        assert_eq!(tally.total(), 3);
        assert_eq!(tally.top(), Some(Mood::Happy));
    }

    #[test]
    fn tally_drops_unknown_labels() {
        let tally = MoodTally::from_labels(["Happy", "Excited 🤩", "Sad 😟"]);
        assert_eq!(tally.total(), 1);
        assert_eq!(tally.top(), Some(Mood::Sad));
    }

    #[test]
    fn tie_goes_to_first_palette_mood() {
        let tally = MoodTally::from_labels(["Calm 🙂", "Happy 😊"]);
        assert_eq!(tally.total(), 2);
        assert_eq!(tally.top(), Some(Mood::Happy));

        let tally = MoodTally::from_labels(["Anxious 😬", "Sad 😟", "Sad 😟", "Anxious 😬"]);
        assert_eq!(tally.top(), Some(Mood::Sad));
    }

    #[test]
    fn weekly_window_starts_at_midnight_seven_days_back() {
        let now = at(10, 15);
        assert_eq!(ReportWindow::weekly().cutoff(now), Some(at(3, 0)));
        assert_eq!(ReportWindow::AllTime.cutoff(now), None);
    }

    #[test]
    fn weekly_report_ignores_older_entries() {
        let entries = vec![
            entry(3, Mood::Calm, "09 Mar 2025, 08:00 AM"),
            entry(2, Mood::Happy, "03 Mar 2025, 12:05 AM"),
            entry(1, Mood::Sad, "02 Mar 2025, 11:59 PM"),
        ];
        let now = at(10, 15);

        let weekly = build_report(&entries, ReportWindow::weekly(), now);
        assert_eq!(weekly.total, 2);
        assert_eq!(weekly.count(Mood::Sad), 0);
        assert_eq!(weekly.top, Some(Mood::Happy));

        let all_time = build_report(&entries, ReportWindow::AllTime, now);
        assert_eq!(all_time.total, 3);
        assert_eq!(all_time.counts.len(), Mood::ALL.len());
    }
}
