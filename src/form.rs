use crate::person::PersonId;
use crate::record::{Role, ScheduleDraft, ScheduleKey, ScheduleRecord};
use crate::record_validation::{self, ValidationError};
use crate::section::SECTIONS;
use chrono::NaiveDate;

/// Pending selections for one (date, section) entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentForm {
    date: Option<NaiveDate>,
    section: String,
    wl: Vec<PersonId>,
    singer: Vec<PersonId>,
    musik: Vec<PersonId>,
    tari: Vec<PersonId>,
}

impl Default for AssignmentForm {
    fn default() -> Self {
        Self::new()
    }
}

impl AssignmentForm {
    pub fn new() -> Self {
        Self {
            date: None,
            section: SECTIONS[0].to_string(),
            wl: Vec::new(),
            singer: Vec::new(),
            musik: Vec::new(),
            tari: Vec::new(),
        }
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    pub fn section(&self) -> &str {
        &self.section
    }

    pub fn role(&self, role: Role) -> &[PersonId] {
        match role {
            Role::Wl => &self.wl,
            Role::Singer => &self.singer,
            Role::Musik => &self.musik,
            Role::Tari => &self.tari,
        }
    }

    fn role_mut(&mut self, role: Role) -> &mut Vec<PersonId> {
        match role {
            Role::Wl => &mut self.wl,
            Role::Singer => &mut self.singer,
            Role::Musik => &mut self.musik,
            Role::Tari => &mut self.tari,
        }
    }

    pub fn set_date(&mut self, date: Option<NaiveDate>) {
        self.date = date;
    }

    pub fn set_section(&mut self, section: &str) -> Result<(), ValidationError> {
        record_validation::validate_section(section)?;
        self.section = section.to_string();
        Ok(())
    }

    /// Adds `id` to the role when absent, removes it otherwise. Returns whether
    /// the person is selected afterwards.
    pub fn toggle(&mut self, role: Role, id: PersonId) -> bool {
        let selected = self.role_mut(role);
        if let Some(pos) = selected.iter().position(|existing| *existing == id) {
            selected.remove(pos);
            false
        } else {
            selected.push(id);
            true
        }
    }

    pub fn set_role(&mut self, role: Role, ids: Vec<PersonId>) {
        let selected = self.role_mut(role);
        selected.clear();
        for id in ids {
            if !selected.contains(&id) {
                selected.push(id);
            }
        }
    }

    pub fn clear_role(&mut self, role: Role) {
        self.role_mut(role).clear();
    }

    /// Clears the four role lists and keeps date and section, so the next
    /// section of the same date can be entered straight away.
    pub fn reset_roles(&mut self) {
        for role in Role::ALL {
            self.clear_role(role);
        }
    }

    /// Prefills the form from a stored record.
    pub fn load_record(&mut self, record: &ScheduleRecord) {
        self.date = Some(record.date);
        self.section = record.section.clone();
        for role in Role::ALL {
            *self.role_mut(role) = record.role(role).to_vec();
        }
    }

    pub fn key(&self) -> Option<ScheduleKey> {
        self.date
            .map(|date| ScheduleKey::new(date, self.section.clone()))
    }

    pub fn to_draft(&self) -> Result<ScheduleDraft, ValidationError> {
        let date = self.date.ok_or(ValidationError::MissingField("date"))?;
        let mut draft = ScheduleDraft::new(date, self.section.clone());
        for role in Role::ALL {
            *draft.role_mut(role) = self.role(role).to_vec();
        }
        record_validation::validate_draft(&draft)?;
        Ok(draft)
    }
}
