use super::{PersistenceError, PersistenceResult, sort_records, validate_records};
use crate::calendar::{format_iso_date, parse_iso_date};
use crate::person::{Person, PersonId};
use crate::record::ScheduleRecord;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

/// Full snapshot of the directory and the schedule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterSnapshot {
    #[serde(default)]
    pub people: Vec<Person>,
    #[serde(default)]
    pub schedules: Vec<ScheduleRecord>,
}

pub fn save_roster_to_json<P: AsRef<Path>>(
    people: &[Person],
    schedules: &[ScheduleRecord],
    path: P,
) -> PersistenceResult<()> {
    validate_records(schedules)?;
    let snapshot = RosterSnapshot {
        people: people.to_vec(),
        schedules: schedules.to_vec(),
    };
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, &snapshot)?;
    Ok(())
}

pub fn load_roster_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<RosterSnapshot> {
    let file = File::open(path)?;
    let mut snapshot: RosterSnapshot = serde_json::from_reader(file)?;
    validate_records(&snapshot.schedules)?;
    sort_records(&mut snapshot.schedules);
    Ok(snapshot)
}

#[derive(Serialize, Deserialize)]
struct ScheduleCsvRecord {
    id: i64,
    date: String,
    section: String,
    wl: String,
    singer: String,
    musik: String,
    tari: String,
}

impl From<&ScheduleRecord> for ScheduleCsvRecord {
    fn from(record: &ScheduleRecord) -> Self {
        Self {
            id: record.id,
            date: format_iso_date(record.date),
            section: record.section.clone(),
            wl: join_ids(&record.wl),
            singer: join_ids(&record.singer),
            musik: join_ids(&record.musik),
            tari: join_ids(&record.tari),
        }
    }
}

impl ScheduleCsvRecord {
    fn into_record(self) -> PersistenceResult<ScheduleRecord> {
        let date = parse_iso_date(&self.date).ok_or_else(|| {
            PersistenceError::InvalidData(format!("invalid date '{}'", self.date))
        })?;
        if self.section.trim().is_empty() {
            return Err(PersistenceError::InvalidData(format!(
                "schedule {} has no section",
                self.id
            )));
        }
        Ok(ScheduleRecord {
            id: self.id,
            date,
            section: self.section.trim().to_string(),
            wl: split_ids(&self.wl),
            singer: split_ids(&self.singer),
            musik: split_ids(&self.musik),
            tari: split_ids(&self.tari),
        })
    }
}

pub fn save_schedules_to_csv<P: AsRef<Path>>(
    schedules: &[ScheduleRecord],
    path: P,
) -> PersistenceResult<()> {
    validate_records(schedules)?;
    let file = File::create(path)?;
    let mut writer = csv::Writer::from_writer(file);
    for record in schedules {
        writer.serialize(ScheduleCsvRecord::from(record))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn load_schedules_from_csv<P: AsRef<Path>>(path: P) -> PersistenceResult<Vec<ScheduleRecord>> {
    let file = File::open(path)?;
    let mut reader = csv::Reader::from_reader(file);
    let mut records = Vec::new();
    for row in reader.deserialize::<ScheduleCsvRecord>() {
        records.push(row?.into_record()?);
    }
    validate_records(&records)?;
    sort_records(&mut records);
    Ok(records)
}

fn join_ids(ids: &[PersonId]) -> String {
    ids.iter()
        .map(PersonId::as_str)
        .collect::<Vec<_>>()
        .join(";")
}

fn split_ids(input: &str) -> Vec<PersonId> {
    input
        .split(';')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(PersonId::new)
        .collect()
}
