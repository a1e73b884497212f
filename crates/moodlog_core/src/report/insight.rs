//! Human-readable report summary.

use crate::model::mood::Mood;
use crate::report::aggregate::{MoodReport, ReportWindow, DEFAULT_REPORT_DAYS};
use std::fmt::{Display, Formatter};

pub const EMPTY_REPORT_MESSAGE: &str = "No mood data available yet.\nStart logging your moods!";

/// Summary line shown under the frequency chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportInsight {
    /// Nothing logged in the window; no ratio or top-mood claim is made.
    Empty,
    Summary {
        window: ReportWindow,
        total: u32,
        top: Mood,
    },
}

impl ReportInsight {
    pub fn from_report(report: &MoodReport) -> Self {
        match report.top {
            Some(top) if report.total > 0 => Self::Summary {
                window: report.window,
                total: report.total,
                top,
            },
            _ => Self::Empty,
        }
    }
}

impl Display for ReportInsight {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => f.write_str(EMPTY_REPORT_MESSAGE),
            Self::Summary { window, total, top } => {
                write!(f, "You logged {total} mood entries ")?;
                match window {
                    ReportWindow::AllTime => f.write_str("in total")?,
                    ReportWindow::TrailingDays(DEFAULT_REPORT_DAYS) => f.write_str("this week")?,
                    ReportWindow::TrailingDays(days) => write!(f, "in the last {days} days")?,
                }
                write!(
                    f,
                    ". Your most frequent mood was {} {}.",
                    top.name(),
                    top.symbol()
                )
            }
        }
    }
}

impl MoodReport {
    pub fn insight(&self) -> ReportInsight {
        ReportInsight::from_report(self)
    }
}
