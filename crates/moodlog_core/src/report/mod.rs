//! Mood frequency reports.
//!
//! # Responsibility
//! - Aggregate snapshots into palette-ordered frequency tables.
//! - Render the summary insight, including the empty state.

pub mod aggregate;
pub mod insight;

pub use aggregate::{
    build_report, MoodCount, MoodReport, MoodTally, ReportWindow, DEFAULT_REPORT_DAYS,
};
pub use insight::ReportInsight;
