pub mod calendar;
pub mod config;
pub mod export;
pub mod form;
pub mod grid;
#[cfg(feature = "http_api")]
pub mod http_api;
pub mod person;
pub mod persistence;
pub mod record;
pub(crate) mod record_validation;
pub mod roster;
pub mod section;

pub use calendar::{MonthFilter, MonthKey};
pub use config::{AppConfig, ConfigError, init_tracing};
pub use export::{ExportError, SheetPlan, WorkbookPlan, export_workbook, render_workbook};
pub use form::AssignmentForm;
pub use grid::{CellTone, GridView, is_role_empty};
pub use person::{NewPeople, Person, PersonDirectory, PersonId, PersonUpdate};
#[cfg(feature = "sqlite")]
pub use persistence::sqlite::SqliteRosterStore;
pub use persistence::{
    PersistenceError, PersonStore, RosterStore, ScheduleStore, load_roster_from_json,
    load_schedules_from_csv, memory::InMemoryRosterStore, save_roster_to_json,
    save_schedules_to_csv, seed_people,
};
pub use record::{RecordId, Role, ScheduleDraft, ScheduleKey, ScheduleRecord};
pub use record_validation::ValidationError;
pub use roster::{Confirmation, Roster, RosterError, SaveTicket};
pub use section::SECTIONS;
