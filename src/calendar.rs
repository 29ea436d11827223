use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

const MONTH_NAMES_ID: [&str; 12] = [
    "Januari",
    "Februari",
    "Maret",
    "April",
    "Mei",
    "Juni",
    "Juli",
    "Agustus",
    "September",
    "Oktober",
    "November",
    "Desember",
];

const MONTH_ABBREVIATIONS_ID: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "Mei", "Jun", "Jul", "Agu", "Sep", "Okt", "Nov", "Des",
];

/// Calendar month, rendered as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn parse(input: &str) -> Option<Self> {
        let (year, month) = input.trim().split_once('-')?;
        if year.len() != 4 || month.len() != 2 {
            return None;
        }
        let year = year.parse::<i32>().ok()?;
        let month = month.parse::<u32>().ok()?;
        if !(1..=12).contains(&month) {
            return None;
        }
        Some(Self { year, month })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    pub fn as_string(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Which dates the grid shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MonthFilter {
    #[default]
    All,
    Month(MonthKey),
}

impl MonthFilter {
    /// Empty input and `all` select every month; anything else must be `YYYY-MM`.
    pub fn parse(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            return Some(MonthFilter::All);
        }
        MonthKey::parse(trimmed).map(MonthFilter::Month)
    }

    pub fn accepts(&self, date: NaiveDate) -> bool {
        match self {
            MonthFilter::All => true,
            MonthFilter::Month(key) => key.contains(date),
        }
    }
}

impl fmt::Display for MonthFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonthFilter::All => f.write_str("all"),
            MonthFilter::Month(key) => write!(f, "{key}"),
        }
    }
}

/// Indonesian month name for a 1-based month number.
pub fn month_name_id(month: u32) -> Option<&'static str> {
    month
        .checked_sub(1)
        .and_then(|idx| MONTH_NAMES_ID.get(idx as usize).copied())
}

/// Long `Oktober 2025` style label for the month containing `date`.
pub fn month_year_label(date: NaiveDate) -> String {
    let name = month_name_id(date.month()).unwrap_or_default();
    format!("{name} {}", date.year())
}

/// Column header label, `05 Okt`.
pub fn short_date_label(date: NaiveDate) -> String {
    let abbreviation = MONTH_ABBREVIATIONS_ID[date.month0() as usize];
    format!("{:02} {abbreviation}", date.day())
}

pub fn parse_iso_date(input: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").ok()
}

pub fn format_iso_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
