#![cfg(feature = "sqlite")]

use chrono::NaiveDate;
use service_roster::{
    NewPeople, PersistenceError, PersonId, PersonStore, PersonUpdate, Role, Roster, ScheduleDraft,
    ScheduleKey, ScheduleStore, SqliteRosterStore, seed_people,
};
use tempfile::NamedTempFile;

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn upsert_replaces_roles_and_keeps_the_record_id() {
    let store = SqliteRosterStore::in_memory().unwrap();
    let first = store
        .upsert_schedule(
            &ScheduleDraft::new(d(2025, 10, 5), "KG Umum 1")
                .with_role(Role::Wl, vec![PersonId::new("p1")]),
        )
        .unwrap();
    let second = store
        .upsert_schedule(
            &ScheduleDraft::new(d(2025, 10, 5), "KG Umum 1")
                .with_role(Role::Musik, vec![PersonId::new("p2"), PersonId::new("p3")]),
        )
        .unwrap();

    assert_eq!(first.id, second.id);
    let records = store.list_schedules().unwrap();
    assert_eq!(records.len(), 1);
    assert!(records[0].wl.is_empty());
    assert_eq!(records[0].musik, vec![PersonId::new("p2"), PersonId::new("p3")]);
}

#[test]
fn records_are_listed_by_date_then_catalog_position() {
    let store = SqliteRosterStore::in_memory().unwrap();
    for (date, section) in [
        (d(2025, 10, 12), "KG Umum 1"),
        (d(2025, 10, 5), "Kopo Youth"),
        (d(2025, 10, 5), "KG Umum 2"),
        (d(2025, 10, 5), "BTC Umum"),
    ] {
        store
            .upsert_schedule(&ScheduleDraft::new(date, section))
            .unwrap();
    }
    let keys: Vec<String> = store
        .list_schedules()
        .unwrap()
        .iter()
        .map(|record| record.key().to_string())
        .collect();
    assert_eq!(
        keys,
        vec![
            "2025-10-05|KG Umum 2",
            "2025-10-05|BTC Umum",
            "2025-10-05|Kopo Youth",
            "2025-10-12|KG Umum 1",
        ]
    );
}

#[test]
fn unknown_section_is_rejected() {
    let store = SqliteRosterStore::in_memory().unwrap();
    let err = store
        .upsert_schedule(&ScheduleDraft::new(d(2025, 10, 5), "Somewhere Else"))
        .unwrap_err();
    assert!(matches!(err, PersistenceError::Validation(_)));
    assert!(store.list_schedules().unwrap().is_empty());
}

#[test]
fn delete_by_key_reports_whether_a_row_matched() {
    let store = SqliteRosterStore::in_memory().unwrap();
    store
        .upsert_schedule(&ScheduleDraft::new(d(2025, 10, 5), "KG Youth"))
        .unwrap();

    let key = ScheduleKey::new(d(2025, 10, 5), "KG Youth");
    assert!(store.delete_schedule(&key).unwrap());
    assert!(!store.delete_schedule(&key).unwrap());
    assert!(store.list_schedules().unwrap().is_empty());
}

#[test]
fn bulk_create_is_all_or_nothing() {
    let store = SqliteRosterStore::in_memory().unwrap();
    store.create_person("Anggiat").unwrap();

    let batch = NewPeople::from_names(["Sorta", "Anggiat", "Yohana"]).unwrap();
    let err = store.create_people(&batch).unwrap_err();
    assert!(matches!(err, PersistenceError::Conflict(_)));

    let names: Vec<String> = store
        .all_people()
        .unwrap()
        .into_iter()
        .map(|person| person.name)
        .collect();
    assert_eq!(names, vec!["Anggiat"]);
}

#[test]
fn person_updates_and_inactive_listing() {
    let store = SqliteRosterStore::in_memory().unwrap();
    let created = store
        .create_people(&NewPeople::from_names(["Budi", "Anggiat"]).unwrap())
        .unwrap();
    let budi = created.iter().find(|p| p.name == "Budi").unwrap().id.clone();

    let update = PersonUpdate {
        active: Some(false),
        roles: Some(vec!["musik".into()]),
        ..Default::default()
    };
    let updated = store.update_person(&budi, &update).unwrap();
    assert!(!updated.active);
    assert_eq!(updated.roles, vec!["musik".to_string()]);

    let active: Vec<String> = store
        .list_people()
        .unwrap()
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(active, vec!["Anggiat"]);
    assert_eq!(store.all_people().unwrap().len(), 2);

    let rename = PersonUpdate {
        name: Some("Anggiat".into()),
        ..Default::default()
    };
    assert!(matches!(
        store.update_person(&budi, &rename),
        Err(PersistenceError::Conflict(_))
    ));
    assert!(matches!(
        store.update_person(&budi, &PersonUpdate::default()),
        Err(PersistenceError::Validation(_))
    ));
}

#[test]
fn missing_people_are_not_found() {
    let store = SqliteRosterStore::in_memory().unwrap();
    let ghost = PersonId::new("ghost");
    assert!(matches!(
        store.delete_person(&ghost),
        Err(PersistenceError::NotFound(_))
    ));
    let update = PersonUpdate {
        active: Some(true),
        ..Default::default()
    };
    assert!(matches!(
        store.update_person(&ghost, &update),
        Err(PersistenceError::NotFound(_))
    ));
}

#[test]
fn seeding_skips_existing_names() {
    let store = SqliteRosterStore::in_memory().unwrap();
    store.create_person("Anggiat").unwrap();
    let created = seed_people(&store, ["Anggiat", "Sorta", " Sorta "]).unwrap();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].name, "Sorta");
    assert!(seed_people(&store, ["Anggiat", "Sorta"]).unwrap().is_empty());
}

#[test]
fn file_backed_store_survives_reopen() {
    let file = NamedTempFile::new().unwrap();
    {
        let store = SqliteRosterStore::new(file.path()).unwrap();
        let person = store.create_person("Anggiat").unwrap();
        store
            .upsert_schedule(
                &ScheduleDraft::new(d(2025, 10, 5), "KG Umum 1")
                    .with_role(Role::Wl, vec![person.id]),
            )
            .unwrap();
    }

    let store = SqliteRosterStore::new(file.path()).unwrap();
    let roster = Roster::load(&store).unwrap();
    assert_eq!(roster.records().len(), 1);
    assert_eq!(
        roster.people().resolve_all(&roster.records()[0].wl),
        "Anggiat"
    );
}
