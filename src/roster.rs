use crate::form::AssignmentForm;
use crate::grid::GridView;
use crate::persistence::{PersistenceError, PersistenceResult, PersonStore, ScheduleStore};
use crate::person::{Person, PersonDirectory, PersonId};
use crate::record::{ScheduleDraft, ScheduleKey, ScheduleRecord};
use crate::record_validation::ValidationError;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RosterError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error("a save for {0} is still in flight")]
    SavePending(ScheduleKey),
    #[error("deleting {0} was not confirmed")]
    NotConfirmed(ScheduleKey),
}

/// Explicit answer to "really delete?".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    Declined,
}

impl Confirmation {
    /// `y` and `yes` (any case) confirm, anything else declines.
    pub fn from_answer(answer: &str) -> Self {
        match answer.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" => Confirmation::Confirmed,
            _ => Confirmation::Declined,
        }
    }
}

/// A save that has been validated and marked pending but not yet sent.
///
/// Hand the draft to the store, then give the outcome back to
/// [`Roster::complete_save`] so the key is released.
#[derive(Debug)]
#[must_use = "a pending save keeps its key locked until completed"]
pub struct SaveTicket {
    draft: ScheduleDraft,
}

impl SaveTicket {
    pub fn draft(&self) -> &ScheduleDraft {
        &self.draft
    }

    pub fn key(&self) -> ScheduleKey {
        self.draft.key()
    }
}

/// Client-side state: the person directory plus a write-through copy of the
/// stored schedule records.
///
/// Local records only change after the store has confirmed a write. A second
/// save for a key whose save is still in flight is refused.
#[derive(Debug, Default)]
pub struct Roster {
    people: PersonDirectory,
    records: Vec<ScheduleRecord>,
    pending: HashSet<ScheduleKey>,
}

impl Roster {
    pub fn new(people: Vec<Person>, records: Vec<ScheduleRecord>) -> Self {
        Self {
            people: PersonDirectory::new(people),
            records,
            pending: HashSet::new(),
        }
    }

    pub fn load<S>(store: &S) -> Result<Self, RosterError>
    where
        S: PersonStore + ScheduleStore + ?Sized,
    {
        let people = store.all_people()?;
        let records = store.list_schedules()?;
        tracing::debug!(
            people = people.len(),
            records = records.len(),
            "loaded roster"
        );
        Ok(Self::new(people, records))
    }

    pub fn records(&self) -> &[ScheduleRecord] {
        &self.records
    }

    pub fn people(&self) -> &PersonDirectory {
        &self.people
    }

    pub fn view(&self) -> GridView<'_> {
        GridView::from_records(&self.records)
    }

    pub fn is_pending(&self, key: &ScheduleKey) -> bool {
        self.pending.contains(key)
    }

    pub fn begin_save(&mut self, form: &AssignmentForm) -> Result<SaveTicket, RosterError> {
        let draft = form.to_draft()?;
        let key = draft.key();
        if !self.pending.insert(key.clone()) {
            return Err(RosterError::SavePending(key));
        }
        Ok(SaveTicket { draft })
    }

    /// Releases the ticket's key and, on success, replaces any local record
    /// with the same id or natural key by the stored one.
    pub fn complete_save(
        &mut self,
        ticket: SaveTicket,
        outcome: PersistenceResult<ScheduleRecord>,
    ) -> Result<ScheduleRecord, RosterError> {
        let key = ticket.key();
        self.pending.remove(&key);
        let saved = outcome?;
        let saved_key = saved.key();
        self.records
            .retain(|record| record.id != saved.id && !record.matches(&saved_key));
        self.records.push(saved.clone());
        Ok(saved)
    }

    /// Upserts the form's entry through the store and folds the result into
    /// local state. On success the form's role lists are cleared.
    pub fn save<S>(&mut self, store: &S, form: &mut AssignmentForm) -> Result<ScheduleRecord, RosterError>
    where
        S: ScheduleStore + ?Sized,
    {
        let ticket = self.begin_save(form)?;
        let outcome = store.upsert_schedule(ticket.draft());
        if let Err(err) = &outcome {
            tracing::warn!(key = %ticket.key(), error = %err, "saving schedule failed");
        }
        let saved = self.complete_save(ticket, outcome)?;
        form.reset_roles();
        Ok(saved)
    }

    /// Deletes by natural key. Local state is only touched after the store
    /// reports success; a key with no record is a no-op returning `false`.
    pub fn delete<S>(
        &mut self,
        store: &S,
        key: &ScheduleKey,
        confirmation: Confirmation,
    ) -> Result<bool, RosterError>
    where
        S: ScheduleStore + ?Sized,
    {
        if confirmation != Confirmation::Confirmed {
            return Err(RosterError::NotConfirmed(key.clone()));
        }
        let removed = store.delete_schedule(key).inspect_err(|err| {
            tracing::warn!(%key, error = %err, "deleting schedule failed");
        })?;
        self.records.retain(|record| !record.matches(key));
        Ok(removed)
    }

    pub fn reload_people<S>(&mut self, store: &S) -> Result<(), RosterError>
    where
        S: PersonStore + ?Sized,
    {
        self.people = PersonDirectory::new(store.all_people()?);
        Ok(())
    }

    pub fn apply_person(&mut self, person: Person) {
        self.people.upsert(person);
    }

    pub fn forget_person(&mut self, id: &PersonId) {
        self.people.remove(id);
    }
}
