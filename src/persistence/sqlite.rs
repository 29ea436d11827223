use super::{
    PersistenceError, PersistenceResult, PersonStore, ScheduleStore, sort_records, validate_update,
};
use crate::calendar::{format_iso_date, parse_iso_date};
use crate::person::{NewPeople, Person, PersonId, PersonUpdate};
use crate::record::{ScheduleDraft, ScheduleKey, ScheduleRecord};
use crate::record_validation;
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, Row, Transaction, params};
use std::path::Path;

const SCHEDULE_COLUMNS: &str = "id, date, section, wl_json, singer_json, musik_json, tari_json";

pub struct SqliteRosterStore {
    connection: Mutex<Connection>,
}

struct PersonRow {
    id: String,
    name: String,
    active: bool,
    roles_json: String,
}

impl PersonRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            active: row.get(2)?,
            roles_json: row.get(3)?,
        })
    }

    fn into_person(self) -> PersistenceResult<Person> {
        Ok(Person {
            id: PersonId::new(self.id),
            name: self.name,
            active: self.active,
            roles: serde_json::from_str(&self.roles_json)?,
        })
    }
}

struct ScheduleRow {
    id: i64,
    date: String,
    section: String,
    wl_json: String,
    singer_json: String,
    musik_json: String,
    tari_json: String,
}

impl ScheduleRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            date: row.get(1)?,
            section: row.get(2)?,
            wl_json: row.get(3)?,
            singer_json: row.get(4)?,
            musik_json: row.get(5)?,
            tari_json: row.get(6)?,
        })
    }

    fn into_record(self) -> PersistenceResult<ScheduleRecord> {
        let date = parse_iso_date(&self.date).ok_or_else(|| {
            PersistenceError::InvalidData(format!(
                "schedule {} has invalid date '{}'",
                self.id, self.date
            ))
        })?;
        Ok(ScheduleRecord {
            id: self.id,
            date,
            section: self.section,
            wl: serde_json::from_str(&self.wl_json)?,
            singer: serde_json::from_str(&self.singer_json)?,
            musik: serde_json::from_str(&self.musik_json)?,
            tari: serde_json::from_str(&self.tari_json)?,
        })
    }
}

impl SqliteRosterStore {
    pub fn new<P: AsRef<Path>>(path: P) -> PersistenceResult<Self> {
        let connection = Connection::open(path)?;
        Self::from_connection(connection)
    }

    pub fn in_memory() -> PersistenceResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(connection: Connection) -> PersistenceResult<Self> {
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn initialize_schema(connection: &Connection) -> PersistenceResult<()> {
        let ddl = r#"
            CREATE TABLE IF NOT EXISTS person (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                active INTEGER NOT NULL DEFAULT 1,
                roles_json TEXT NOT NULL DEFAULT '[]',
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            CREATE TABLE IF NOT EXISTS schedule (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                date TEXT NOT NULL,
                section TEXT NOT NULL,
                wl_json TEXT NOT NULL DEFAULT '[]',
                singer_json TEXT NOT NULL DEFAULT '[]',
                musik_json TEXT NOT NULL DEFAULT '[]',
                tari_json TEXT NOT NULL DEFAULT '[]',
                updated_at TEXT NOT NULL DEFAULT (datetime('now')),
                UNIQUE (date, section)
            );
        "#;
        connection.execute_batch(ddl)?;
        Ok(())
    }

    fn query_people(conn: &Connection, active_only: bool) -> PersistenceResult<Vec<Person>> {
        let sql = if active_only {
            "SELECT id, name, active, roles_json FROM person WHERE active = 1 ORDER BY name ASC"
        } else {
            "SELECT id, name, active, roles_json FROM person ORDER BY name ASC"
        };
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map([], PersonRow::from_row)?;
        let mut people = Vec::new();
        for row in rows {
            people.push(row?.into_person()?);
        }
        Ok(people)
    }

    fn find_person(tx: &Transaction, id: &PersonId) -> PersistenceResult<Option<Person>> {
        tx.query_row(
            "SELECT id, name, active, roles_json FROM person WHERE id = ?1",
            params![id.as_str()],
            PersonRow::from_row,
        )
        .optional()?
        .map(PersonRow::into_person)
        .transpose()
    }

    fn name_taken(tx: &Transaction, name: &str, except: Option<&PersonId>) -> PersistenceResult<bool> {
        let owner: Option<String> = tx
            .query_row(
                "SELECT id FROM person WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(match (owner, except) {
            (Some(owner), Some(except)) => owner != except.as_str(),
            (Some(_), None) => true,
            (None, _) => false,
        })
    }
}

impl PersonStore for SqliteRosterStore {
    fn list_people(&self) -> PersistenceResult<Vec<Person>> {
        let conn = self.connection.lock();
        Self::query_people(&conn, true)
    }

    fn all_people(&self) -> PersistenceResult<Vec<Person>> {
        let conn = self.connection.lock();
        Self::query_people(&conn, false)
    }

    fn create_people(&self, batch: &NewPeople) -> PersistenceResult<Vec<Person>> {
        let mut conn = self.connection.lock();
        let tx = conn.transaction()?;
        let mut created = Vec::with_capacity(batch.len());
        {
            let mut insert = tx.prepare(
                "INSERT INTO person (id, name, active, roles_json) VALUES (?1, ?2, 1, '[]')",
            )?;
            for name in batch.names() {
                if Self::name_taken(&tx, name, None)? {
                    return Err(PersistenceError::Conflict(format!(
                        "person '{name}' already exists"
                    )));
                }
                let person = Person::new(PersonId::generate(), name.clone());
                insert.execute(params![person.id.as_str(), person.name])?;
                created.push(person);
            }
        }
        tx.commit()?;
        tracing::debug!(count = created.len(), "created people");
        Ok(created)
    }

    fn update_person(&self, id: &PersonId, update: &PersonUpdate) -> PersistenceResult<Person> {
        validate_update(update)?;
        let mut conn = self.connection.lock();
        let tx = conn.transaction()?;
        let mut person = Self::find_person(&tx, id)?
            .ok_or_else(|| PersistenceError::NotFound(format!("person {id}")))?;
        update.apply_to(&mut person);
        if Self::name_taken(&tx, &person.name, Some(id))? {
            return Err(PersistenceError::Conflict(format!(
                "person '{}' already exists",
                person.name
            )));
        }
        tx.execute(
            "UPDATE person SET name = ?2, active = ?3, roles_json = ?4 WHERE id = ?1",
            params![
                id.as_str(),
                person.name,
                person.active,
                serde_json::to_string(&person.roles)?
            ],
        )?;
        tx.commit()?;
        Ok(person)
    }

    fn delete_person(&self, id: &PersonId) -> PersistenceResult<()> {
        let conn = self.connection.lock();
        let removed = conn.execute("DELETE FROM person WHERE id = ?1", params![id.as_str()])?;
        if removed == 0 {
            return Err(PersistenceError::NotFound(format!("person {id}")));
        }
        Ok(())
    }
}

impl ScheduleStore for SqliteRosterStore {
    fn list_schedules(&self) -> PersistenceResult<Vec<ScheduleRecord>> {
        let conn = self.connection.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {SCHEDULE_COLUMNS} FROM schedule ORDER BY date ASC, id ASC"
        ))?;
        let rows = stmt.query_map([], ScheduleRow::from_row)?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row?.into_record()?);
        }
        sort_records(&mut records);
        Ok(records)
    }

    fn upsert_schedule(&self, draft: &ScheduleDraft) -> PersistenceResult<ScheduleRecord> {
        record_validation::validate_draft(draft)?;
        let conn = self.connection.lock();
        // One statement, so there is no window between the existence check and the write.
        let sql = format!(
            "INSERT INTO schedule (date, section, wl_json, singer_json, musik_json, tari_json)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(date, section) DO UPDATE SET
                wl_json = excluded.wl_json,
                singer_json = excluded.singer_json,
                musik_json = excluded.musik_json,
                tari_json = excluded.tari_json,
                updated_at = datetime('now')
             RETURNING {SCHEDULE_COLUMNS}"
        );
        let row = conn.query_row(
            &sql,
            params![
                format_iso_date(draft.date),
                draft.section,
                serde_json::to_string(&draft.wl)?,
                serde_json::to_string(&draft.singer)?,
                serde_json::to_string(&draft.musik)?,
                serde_json::to_string(&draft.tari)?,
            ],
            ScheduleRow::from_row,
        )?;
        let record = row.into_record()?;
        tracing::debug!(record_id = record.id, key = %record.key(), "upserted schedule");
        Ok(record)
    }

    fn delete_schedule(&self, key: &ScheduleKey) -> PersistenceResult<bool> {
        let conn = self.connection.lock();
        let removed = conn.execute(
            "DELETE FROM schedule WHERE date = ?1 AND section = ?2",
            params![format_iso_date(key.date), key.section],
        )?;
        tracing::debug!(%key, removed, "deleted schedule");
        Ok(removed > 0)
    }
}
