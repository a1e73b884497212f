//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `moodlog_core` linkage and print the mood palette.
//! - Print the all-time report of a journal database when a path is given.

use moodlog_core::{Journal, MoodReport};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("moodlog_core ping={}", moodlog_core::ping());
    println!("moodlog_core version={}", moodlog_core::core_version());
    let palette: Vec<&str> = moodlog_core::Mood::ALL
        .iter()
        .map(|mood| mood.label())
        .collect();
    println!("palette={}", palette.join(" | "));

    let Some(db_path) = std::env::args().nth(1) else {
        return ExitCode::SUCCESS;
    };

    let report = Journal::open(&db_path).and_then(|journal| {
        journal.flush()?;
        journal.all_time_report()
    });
    match report {
        Ok(report) => {
            print_report(&report);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("failed to read journal `{db_path}`: {err}");
            ExitCode::FAILURE
        }
    }
}

fn print_report(report: &MoodReport) {
    for bucket in &report.counts {
        println!("{:<12} {}", bucket.mood.label(), bucket.count);
    }
    println!("total={}", report.total);
    println!("{}", report.insight());
}
