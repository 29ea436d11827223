use crate::person::{NewPeople, Person, PersonId, PersonUpdate};
use crate::record::{ScheduleDraft, ScheduleKey, ScheduleRecord};
use crate::record_validation::{self, ValidationError};
use crate::section::section_position;
use std::collections::HashSet;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[cfg(feature = "sqlite")]
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid data: {0}")]
    InvalidData(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{0} not found")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Directory of assignable people.
pub trait PersonStore {
    /// Active people ordered by name.
    fn list_people(&self) -> PersistenceResult<Vec<Person>>;

    /// Everyone, including inactive people, for resolving stored ids to names.
    fn all_people(&self) -> PersistenceResult<Vec<Person>>;

    /// Creates every name in the batch or none of them. A name that already
    /// exists fails the whole batch with [`PersistenceError::Conflict`].
    fn create_people(&self, batch: &NewPeople) -> PersistenceResult<Vec<Person>>;

    fn create_person(&self, name: &str) -> PersistenceResult<Person> {
        record_validation::validate_person_name(name)?;
        let batch = NewPeople::from_names([name]).ok_or(ValidationError::EmptyName)?;
        self.create_people(&batch)?
            .into_iter()
            .next()
            .ok_or_else(|| PersistenceError::InvalidData("person was not created".into()))
    }

    fn update_person(&self, id: &PersonId, update: &PersonUpdate) -> PersistenceResult<Person>;

    fn delete_person(&self, id: &PersonId) -> PersistenceResult<()>;
}

/// Schedule records keyed by (date, section).
pub trait ScheduleStore {
    /// All records ordered by date, then catalog position, then id.
    fn list_schedules(&self) -> PersistenceResult<Vec<ScheduleRecord>>;

    /// Inserts the draft or replaces the role lists of the record with the
    /// same natural key. The store alone decides which of the two happens.
    fn upsert_schedule(&self, draft: &ScheduleDraft) -> PersistenceResult<ScheduleRecord>;

    /// Deletes by natural key. Returns `false` when no record matched.
    fn delete_schedule(&self, key: &ScheduleKey) -> PersistenceResult<bool>;
}

/// Everything the roster needs from a backend.
pub trait RosterStore: PersonStore + ScheduleStore + Send + Sync {}

impl<T> RosterStore for T where T: PersonStore + ScheduleStore + Send + Sync {}

pub(crate) fn validate_update(update: &PersonUpdate) -> PersistenceResult<()> {
    if update.is_empty() {
        return Err(ValidationError::EmptyUpdate.into());
    }
    if let Some(name) = &update.name {
        record_validation::validate_person_name(name)?;
    }
    Ok(())
}

pub(crate) fn sort_records(records: &mut [ScheduleRecord]) {
    records.sort_by(|a, b| {
        a.date
            .cmp(&b.date)
            .then_with(|| {
                let pa = section_position(&a.section).unwrap_or(usize::MAX);
                let pb = section_position(&b.section).unwrap_or(usize::MAX);
                pa.cmp(&pb)
            })
            .then_with(|| a.id.cmp(&b.id))
    });
}

pub(crate) fn sort_people(people: &mut [Person]) {
    people.sort_by(|a, b| a.name.cmp(&b.name));
}

pub fn validate_records(records: &[ScheduleRecord]) -> PersistenceResult<()> {
    record_validation::validate_record_collection(records)
        .map_err(|err| PersistenceError::InvalidData(err.to_string()))
}

/// Inserts the names that are not in the directory yet; existing names are
/// left alone. Returns the people that were created.
pub fn seed_people<S, I, N>(store: &S, names: I) -> PersistenceResult<Vec<Person>>
where
    S: PersonStore + ?Sized,
    I: IntoIterator<Item = N>,
    N: AsRef<str>,
{
    let existing: HashSet<String> = store
        .all_people()?
        .into_iter()
        .map(|person| person.name)
        .collect();
    let missing: Vec<String> = names
        .into_iter()
        .map(|name| name.as_ref().trim().to_string())
        .filter(|name| !existing.contains(name))
        .collect();
    match NewPeople::from_names(missing) {
        Some(batch) => {
            let created = store.create_people(&batch)?;
            tracing::info!(created = created.len(), "seeded people directory");
            Ok(created)
        }
        None => Ok(Vec::new()),
    }
}

pub mod file;
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use file::{
    load_roster_from_json, load_schedules_from_csv, save_roster_to_json, save_schedules_to_csv,
};
