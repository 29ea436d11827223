use crate::calendar::MonthFilter;
use crate::record::{Role, ScheduleKey, ScheduleRecord};
use crate::section::{SECTIONS, is_known_section};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

/// How a role cell should be highlighted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CellTone {
    /// Nobody is assigned (or no record exists for the cell).
    Missing,
    /// The column is today's date.
    Today,
    Filled,
}

/// Dense-grid projection of a sparse list of schedule records.
///
/// Rows are the catalog sections, columns are the distinct record dates in
/// calendar order. Records whose section is not in the catalog are kept
/// aside as orphans and never rendered.
#[derive(Debug, Clone)]
pub struct GridView<'a> {
    dates: Vec<NaiveDate>,
    index: HashMap<ScheduleKey, &'a ScheduleRecord>,
    orphans: Vec<&'a ScheduleRecord>,
}

impl<'a> GridView<'a> {
    pub fn from_records(records: &'a [ScheduleRecord]) -> Self {
        let mut dates = BTreeSet::new();
        let mut index = HashMap::with_capacity(records.len());
        let mut orphans = Vec::new();
        for record in records {
            if is_known_section(&record.section) {
                dates.insert(record.date);
                index.insert(record.key(), record);
            } else {
                tracing::warn!(
                    record_id = record.id,
                    date = %record.date,
                    section = %record.section,
                    "schedule record has a section outside the catalog; not rendered"
                );
                orphans.push(record);
            }
        }
        Self {
            dates: dates.into_iter().collect(),
            index,
            orphans,
        }
    }

    /// Distinct record dates, ascending.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn sections(&self) -> &'static [&'static str] {
        &SECTIONS
    }

    /// `None` means nothing was recorded for the cell, which is different from
    /// a record whose role lists are all empty.
    pub fn lookup(&self, date: NaiveDate, section: &str) -> Option<&'a ScheduleRecord> {
        self.index
            .get(&ScheduleKey::new(date, section))
            .copied()
    }

    pub fn view_dates(&self, filter: MonthFilter) -> Vec<NaiveDate> {
        self.dates
            .iter()
            .copied()
            .filter(|date| filter.accepts(*date))
            .collect()
    }

    pub fn orphans(&self) -> &[&'a ScheduleRecord] {
        &self.orphans
    }

    pub fn cell_tone(&self, date: NaiveDate, section: &str, role: Role, today: NaiveDate) -> CellTone {
        if is_role_empty(self.lookup(date, section), role) {
            CellTone::Missing
        } else if date == today {
            CellTone::Today
        } else {
            CellTone::Filled
        }
    }
}

/// A role counts as empty when there is no record, the list is empty, or
/// every entry is blank.
pub fn is_role_empty(record: Option<&ScheduleRecord>, role: Role) -> bool {
    match record {
        None => true,
        Some(record) => record
            .role(role)
            .iter()
            .all(|id| id.as_str().trim().is_empty()),
    }
}
