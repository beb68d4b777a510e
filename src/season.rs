//! Calendar-quarter anime season labels.

use chrono::{Datelike, Local};
use strum::Display;

/// Broadcast season, one per calendar quarter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Season {
    /// January through March.
    Winter,
    /// April through June.
    Spring,
    /// July through September.
    Summer,
    /// October through December.
    Fall,
}

impl Season {
    /// Season for a 1-based calendar month.
    pub fn from_month(month: u32) -> Self {
        match month {
            1..=3 => Season::Winter,
            4..=6 => Season::Spring,
            7..=9 => Season::Summer,
            _ => Season::Fall,
        }
    }
}

/// Season label such as `"Fall 2024"` for the given date.
pub fn season_label<D: Datelike>(date: &D) -> String {
    format!("{} {}", Season::from_month(date.month()), date.year())
}

/// Season label for the local wall clock.
pub fn current_season() -> String {
    season_label(&Local::now())
}
