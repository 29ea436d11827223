use super::{
    PersistenceError, PersistenceResult, PersonStore, ScheduleStore, sort_people, sort_records,
    validate_records, validate_update,
};
use crate::person::{NewPeople, Person, PersonId, PersonUpdate};
use crate::record::{RecordId, ScheduleDraft, ScheduleKey, ScheduleRecord};
use crate::record_validation;
use parking_lot::Mutex;
use std::collections::BTreeMap;

#[derive(Debug, Default)]
struct MemoryState {
    people: Vec<Person>,
    records: BTreeMap<RecordId, ScheduleRecord>,
    next_record_id: RecordId,
}

impl MemoryState {
    fn record_id_for(&self, key: &ScheduleKey) -> Option<RecordId> {
        self.records
            .values()
            .find(|record| record.matches(key))
            .map(|record| record.id)
    }

    fn allocate_id(&mut self) -> RecordId {
        self.next_record_id += 1;
        self.next_record_id
    }
}

/// Process-local store. Records are addressed by id internally, so deletes by
/// natural key resolve the id first while holding the same lock.
#[derive(Debug, Default)]
pub struct InMemoryRosterStore {
    state: Mutex<MemoryState>,
}

impl InMemoryRosterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(people: Vec<Person>, records: Vec<ScheduleRecord>) -> PersistenceResult<Self> {
        validate_records(&records)?;
        let next_record_id = records.iter().map(|record| record.id).max().unwrap_or(0);
        let records = records
            .into_iter()
            .map(|record| (record.id, record))
            .collect();
        Ok(Self {
            state: Mutex::new(MemoryState {
                people,
                records,
                next_record_id,
            }),
        })
    }

    fn delete_by_id(state: &mut MemoryState, id: RecordId) -> bool {
        state.records.remove(&id).is_some()
    }
}

impl PersonStore for InMemoryRosterStore {
    fn list_people(&self) -> PersistenceResult<Vec<Person>> {
        let state = self.state.lock();
        let mut people: Vec<Person> = state.people.iter().filter(|p| p.active).cloned().collect();
        sort_people(&mut people);
        Ok(people)
    }

    fn all_people(&self) -> PersistenceResult<Vec<Person>> {
        let state = self.state.lock();
        let mut people = state.people.clone();
        sort_people(&mut people);
        Ok(people)
    }

    fn create_people(&self, batch: &NewPeople) -> PersistenceResult<Vec<Person>> {
        let mut state = self.state.lock();
        if let Some(taken) = batch
            .names()
            .iter()
            .find(|name| state.people.iter().any(|p| &p.name == *name))
        {
            return Err(PersistenceError::Conflict(format!(
                "person '{taken}' already exists"
            )));
        }
        let created: Vec<Person> = batch
            .names()
            .iter()
            .map(|name| Person::new(PersonId::generate(), name.clone()))
            .collect();
        state.people.extend(created.iter().cloned());
        Ok(created)
    }

    fn update_person(&self, id: &PersonId, update: &PersonUpdate) -> PersistenceResult<Person> {
        validate_update(update)?;
        let mut state = self.state.lock();
        if let Some(name) = &update.name {
            let name = name.trim();
            if state.people.iter().any(|p| p.name == name && &p.id != id) {
                return Err(PersistenceError::Conflict(format!(
                    "person '{name}' already exists"
                )));
            }
        }
        let person = state
            .people
            .iter_mut()
            .find(|person| &person.id == id)
            .ok_or_else(|| PersistenceError::NotFound(format!("person {id}")))?;
        update.apply_to(person);
        Ok(person.clone())
    }

    fn delete_person(&self, id: &PersonId) -> PersistenceResult<()> {
        let mut state = self.state.lock();
        let before = state.people.len();
        state.people.retain(|person| &person.id != id);
        if state.people.len() == before {
            return Err(PersistenceError::NotFound(format!("person {id}")));
        }
        Ok(())
    }
}

impl ScheduleStore for InMemoryRosterStore {
    fn list_schedules(&self) -> PersistenceResult<Vec<ScheduleRecord>> {
        let state = self.state.lock();
        let mut records: Vec<ScheduleRecord> = state.records.values().cloned().collect();
        sort_records(&mut records);
        Ok(records)
    }

    fn upsert_schedule(&self, draft: &ScheduleDraft) -> PersistenceResult<ScheduleRecord> {
        record_validation::validate_draft(draft)?;
        let mut state = self.state.lock();
        let record = match state.record_id_for(&draft.key()) {
            Some(id) => {
                let record = state
                    .records
                    .get_mut(&id)
                    .ok_or_else(|| PersistenceError::NotFound(format!("schedule {id}")))?;
                record.assign_roles_from(draft.clone());
                record.clone()
            }
            None => {
                let id = state.allocate_id();
                let record = ScheduleRecord::from_draft(id, draft.clone());
                state.records.insert(id, record.clone());
                record
            }
        };
        tracing::debug!(record_id = record.id, key = %record.key(), "upserted schedule");
        Ok(record)
    }

    fn delete_schedule(&self, key: &ScheduleKey) -> PersistenceResult<bool> {
        let mut state = self.state.lock();
        let Some(id) = state.record_id_for(key) else {
            return Ok(false);
        };
        let removed = Self::delete_by_id(&mut state, id);
        tracing::debug!(record_id = id, %key, "deleted schedule");
        Ok(removed)
    }
}
