use crate::calendar::parse_iso_date;
use crate::person::PersonId;
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Persistent identifier of a stored schedule record.
pub type RecordId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Wl,
    Singer,
    Musik,
    Tari,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Wl, Role::Singer, Role::Musik, Role::Tari];

    /// Column header used in the grid and the workbook.
    pub fn label(self) -> &'static str {
        match self {
            Role::Wl => "WL",
            Role::Singer => "SINGER",
            Role::Musik => "MUSIK",
            Role::Tari => "TARI",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Wl => "wl",
            Role::Singer => "singer",
            Role::Musik => "musik",
            Role::Tari => "tari",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "wl" => Ok(Role::Wl),
            "singer" => Ok(Role::Singer),
            "musik" => Ok(Role::Musik),
            "tari" => Ok(Role::Tari),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

/// Natural key of a schedule record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScheduleKey {
    pub date: NaiveDate,
    pub section: String,
}

impl ScheduleKey {
    pub fn new(date: NaiveDate, section: impl Into<String>) -> Self {
        Self {
            date,
            section: section.into(),
        }
    }

    /// Parses an ISO date plus section name, e.g. from a request body.
    pub fn parse(date: &str, section: &str) -> Option<Self> {
        let date = parse_iso_date(date)?;
        let section = section.trim();
        if section.is_empty() {
            return None;
        }
        Some(Self::new(date, section))
    }
}

impl fmt::Display for ScheduleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.date.format("%Y-%m-%d"), self.section)
    }
}

/// Role lists accept `null`, a single string, a number, or a list; they
/// always come out as a list of non-blank ids.
pub(crate) fn deserialize_role_list<'de, D>(deserializer: D) -> Result<Vec<PersonId>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawRole {
        One(PersonId),
        Many(Vec<Option<PersonId>>),
    }

    let raw: Option<RawRole> = Option::deserialize(deserializer)?;
    let ids = match raw {
        None => Vec::new(),
        Some(RawRole::One(id)) => vec![id],
        Some(RawRole::Many(ids)) => ids.into_iter().flatten().collect(),
    };
    Ok(ids
        .into_iter()
        .filter(|id| !id.as_str().trim().is_empty())
        .collect())
}

/// Candidate record built from user selections, before the store assigns an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleDraft {
    pub date: NaiveDate,
    pub section: String,
    #[serde(default, deserialize_with = "deserialize_role_list")]
    pub wl: Vec<PersonId>,
    #[serde(default, deserialize_with = "deserialize_role_list")]
    pub singer: Vec<PersonId>,
    #[serde(default, deserialize_with = "deserialize_role_list")]
    pub musik: Vec<PersonId>,
    #[serde(default, deserialize_with = "deserialize_role_list")]
    pub tari: Vec<PersonId>,
}

impl ScheduleDraft {
    pub fn new(date: NaiveDate, section: impl Into<String>) -> Self {
        Self {
            date,
            section: section.into(),
            wl: Vec::new(),
            singer: Vec::new(),
            musik: Vec::new(),
            tari: Vec::new(),
        }
    }

    pub fn with_role(mut self, role: Role, ids: Vec<PersonId>) -> Self {
        *self.role_mut(role) = ids;
        self
    }

    pub fn key(&self) -> ScheduleKey {
        ScheduleKey::new(self.date, self.section.clone())
    }

    pub fn role(&self, role: Role) -> &[PersonId] {
        match role {
            Role::Wl => &self.wl,
            Role::Singer => &self.singer,
            Role::Musik => &self.musik,
            Role::Tari => &self.tari,
        }
    }

    pub fn role_mut(&mut self, role: Role) -> &mut Vec<PersonId> {
        match role {
            Role::Wl => &mut self.wl,
            Role::Singer => &mut self.singer,
            Role::Musik => &mut self.musik,
            Role::Tari => &mut self.tari,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRecord {
    pub id: RecordId,
    pub date: NaiveDate,
    pub section: String,
    #[serde(default, deserialize_with = "deserialize_role_list")]
    pub wl: Vec<PersonId>,
    #[serde(default, deserialize_with = "deserialize_role_list")]
    pub singer: Vec<PersonId>,
    #[serde(default, deserialize_with = "deserialize_role_list")]
    pub musik: Vec<PersonId>,
    #[serde(default, deserialize_with = "deserialize_role_list")]
    pub tari: Vec<PersonId>,
}

impl ScheduleRecord {
    pub fn from_draft(id: RecordId, draft: ScheduleDraft) -> Self {
        Self {
            id,
            date: draft.date,
            section: draft.section,
            wl: draft.wl,
            singer: draft.singer,
            musik: draft.musik,
            tari: draft.tari,
        }
    }

    pub fn key(&self) -> ScheduleKey {
        ScheduleKey::new(self.date, self.section.clone())
    }

    /// Draft with the same key and roles, for writing the record back through
    /// a store that assigns its own ids.
    pub fn to_draft(&self) -> ScheduleDraft {
        ScheduleDraft {
            date: self.date,
            section: self.section.clone(),
            wl: self.wl.clone(),
            singer: self.singer.clone(),
            musik: self.musik.clone(),
            tari: self.tari.clone(),
        }
    }

    pub fn matches(&self, key: &ScheduleKey) -> bool {
        self.date == key.date && self.section == key.section
    }

    pub fn role(&self, role: Role) -> &[PersonId] {
        match role {
            Role::Wl => &self.wl,
            Role::Singer => &self.singer,
            Role::Musik => &self.musik,
            Role::Tari => &self.tari,
        }
    }

    pub(crate) fn assign_roles_from(&mut self, draft: ScheduleDraft) {
        self.wl = draft.wl;
        self.singer = draft.singer;
        self.musik = draft.musik;
        self.tari = draft.tari;
    }
}
