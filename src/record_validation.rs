use crate::calendar::parse_iso_date;
use crate::record::{ScheduleDraft, ScheduleKey, ScheduleRecord};
use crate::section::is_known_section;
use chrono::NaiveDate;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("invalid date '{0}' (expected YYYY-MM-DD)")]
    InvalidDate(String),
    #[error("unknown section '{0}'")]
    UnknownSection(String),
    #[error("person name must not be empty")]
    EmptyName,
    #[error("names must be a non-empty array")]
    NoNames,
    #[error("no fields to update")]
    EmptyUpdate,
    #[error("duplicate schedule for {0}")]
    DuplicateKey(ScheduleKey),
    #[error("duplicate record id {0}")]
    DuplicateId(i64),
}

pub fn require_date(input: Option<&str>) -> Result<NaiveDate, ValidationError> {
    let raw = input
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(ValidationError::MissingField("date"))?;
    parse_iso_date(raw).ok_or_else(|| ValidationError::InvalidDate(raw.to_string()))
}

pub fn require_section(input: Option<&str>) -> Result<String, ValidationError> {
    let section = input
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(ValidationError::MissingField("section"))?;
    validate_section(section)?;
    Ok(section.to_string())
}

pub fn validate_section(section: &str) -> Result<(), ValidationError> {
    if section.trim().is_empty() {
        return Err(ValidationError::MissingField("section"));
    }
    if !is_known_section(section) {
        return Err(ValidationError::UnknownSection(section.to_string()));
    }
    Ok(())
}

pub fn validate_draft(draft: &ScheduleDraft) -> Result<(), ValidationError> {
    validate_section(&draft.section)
}

pub fn validate_person_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    Ok(())
}

/// Checks that a loaded record set keeps one record per natural key and per id.
pub fn validate_record_collection(records: &[ScheduleRecord]) -> Result<(), ValidationError> {
    let mut keys = HashSet::with_capacity(records.len());
    let mut ids = HashSet::with_capacity(records.len());
    for record in records {
        if !ids.insert(record.id) {
            return Err(ValidationError::DuplicateId(record.id));
        }
        let key = record.key();
        if !keys.insert(key.clone()) {
            return Err(ValidationError::DuplicateKey(key));
        }
    }
    Ok(())
}
