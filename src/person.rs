use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Opaque person identifier.
///
/// Backends disagree on whether identifiers are numeric or textual, so the
/// wire form accepts either and the crate only ever sees the string form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PersonId(String);

impl PersonId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PersonId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for PersonId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPersonId {
    Text(String),
    Number(i64),
}

impl<'de> Deserialize<'de> for PersonId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match RawPersonId::deserialize(deserializer)? {
            RawPersonId::Text(text) => PersonId(text.trim().to_string()),
            RawPersonId::Number(number) => PersonId(number.to_string()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    pub name: String,
    #[serde(default = "default_active")]
    pub active: bool,
    /// Free-form tags describing what the person usually serves as.
    #[serde(default)]
    pub roles: Vec<String>,
}

fn default_active() -> bool {
    true
}

impl Person {
    pub fn new(id: impl Into<PersonId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            active: true,
            roles: Vec::new(),
        }
    }
}

/// A batch of names to create, trimmed and de-duplicated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPeople {
    names: Vec<String>,
}

impl NewPeople {
    /// Trims every name, drops blanks and keeps the first occurrence of each
    /// duplicate. Returns `None` when nothing usable remains.
    pub fn from_names<I, S>(names: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let names: Vec<String> = names
            .into_iter()
            .map(|name| name.as_ref().trim().to_string())
            .filter(|name| !name.is_empty())
            .filter(|name| seen.insert(name.clone()))
            .collect();
        if names.is_empty() {
            None
        } else {
            Some(Self { names })
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<String>>,
}

impl PersonUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.active.is_none() && self.roles.is_none()
    }

    pub(crate) fn apply_to(&self, person: &mut Person) {
        if let Some(name) = &self.name {
            person.name = name.trim().to_string();
        }
        if let Some(active) = self.active {
            person.active = active;
        }
        if let Some(roles) = &self.roles {
            person.roles = roles.clone();
        }
    }
}

/// In-memory lookup of people by identifier, used to turn stored role lists
/// into display names.
#[derive(Debug, Clone, Default)]
pub struct PersonDirectory {
    people: Vec<Person>,
    names: HashMap<PersonId, String>,
}

impl PersonDirectory {
    pub fn new(people: Vec<Person>) -> Self {
        let names = people
            .iter()
            .map(|person| (person.id.clone(), person.name.clone()))
            .collect();
        Self { people, names }
    }

    pub fn people(&self) -> &[Person] {
        &self.people
    }

    /// Name for `id`, or the raw identifier when nobody with that id is known.
    pub fn resolve<'a>(&'a self, id: &'a PersonId) -> &'a str {
        self.names
            .get(id)
            .map(String::as_str)
            .unwrap_or_else(|| id.as_str())
    }

    /// Resolved names joined with `", "`.
    pub fn resolve_all(&self, ids: &[PersonId]) -> String {
        ids.iter()
            .map(|id| self.resolve(id))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Active people ordered by name, for populating selection lists.
    pub fn active_sorted(&self) -> Vec<&Person> {
        let mut active: Vec<&Person> = self.people.iter().filter(|p| p.active).collect();
        active.sort_by(|a, b| a.name.cmp(&b.name));
        active
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Person> {
        self.people.iter().find(|person| person.name == name)
    }

    pub(crate) fn upsert(&mut self, person: Person) {
        self.names.insert(person.id.clone(), person.name.clone());
        match self.people.iter_mut().find(|p| p.id == person.id) {
            Some(existing) => *existing = person,
            None => self.people.push(person),
        }
    }

    pub(crate) fn remove(&mut self, id: &PersonId) {
        self.people.retain(|person| &person.id != id);
        self.names.remove(id);
    }
}
