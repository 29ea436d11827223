use chrono::NaiveDate;
use service_roster::persistence::PersistenceResult;
use service_roster::{
    AssignmentForm, Confirmation, InMemoryRosterStore, PersistenceError, Person, PersonId, Role,
    Roster, RosterError, ScheduleDraft, ScheduleKey, ScheduleRecord, ScheduleStore,
    ValidationError,
};

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn form_for(date: NaiveDate, section: &str) -> AssignmentForm {
    let mut form = AssignmentForm::new();
    form.set_date(Some(date));
    form.set_section(section).unwrap();
    form
}

/// Store whose writes always fail.
struct FailingStore;

impl ScheduleStore for FailingStore {
    fn list_schedules(&self) -> PersistenceResult<Vec<ScheduleRecord>> {
        Ok(Vec::new())
    }

    fn upsert_schedule(&self, _draft: &ScheduleDraft) -> PersistenceResult<ScheduleRecord> {
        Err(PersistenceError::InvalidData("backend unavailable".into()))
    }

    fn delete_schedule(&self, _key: &ScheduleKey) -> PersistenceResult<bool> {
        Err(PersistenceError::InvalidData("backend unavailable".into()))
    }
}

#[test]
fn saving_same_key_twice_keeps_one_record_with_latest_roles() {
    let store = InMemoryRosterStore::new();
    let mut roster = Roster::load(&store).unwrap();

    let mut form = form_for(d(2025, 10, 5), "KG Umum 1");
    form.toggle(Role::Wl, PersonId::new("p1"));
    let first = roster.save(&store, &mut form).unwrap();

    form.toggle(Role::Wl, PersonId::new("p2"));
    form.toggle(Role::Tari, PersonId::new("p3"));
    let second = roster.save(&store, &mut form).unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(roster.records().len(), 1);
    assert_eq!(roster.records()[0].wl, vec![PersonId::new("p2")]);
    assert_eq!(roster.records()[0].tari, vec![PersonId::new("p3")]);
    assert_eq!(store.list_schedules().unwrap(), roster.records());
}

#[test]
fn save_resets_roles_but_keeps_date_and_section() {
    let store = InMemoryRosterStore::new();
    let mut roster = Roster::default();
    let mut form = form_for(d(2025, 10, 5), "BTC Umum");
    form.toggle(Role::Singer, PersonId::new("p1"));
    form.toggle(Role::Musik, PersonId::new("p2"));

    roster.save(&store, &mut form).unwrap();

    assert_eq!(form.date(), Some(d(2025, 10, 5)));
    assert_eq!(form.section(), "BTC Umum");
    assert!(Role::ALL.iter().all(|role| form.role(*role).is_empty()));
}

#[test]
fn failed_save_leaves_local_state_and_form_untouched() {
    let mut roster = Roster::default();
    let mut form = form_for(d(2025, 10, 5), "KG Umum 1");
    form.toggle(Role::Wl, PersonId::new("p1"));

    let err = roster.save(&FailingStore, &mut form).unwrap_err();
    assert!(matches!(err, RosterError::Persistence(_)));
    assert!(roster.records().is_empty());
    assert_eq!(form.role(Role::Wl), &[PersonId::new("p1")]);
    assert!(!roster.is_pending(&form.key().unwrap()));
}

#[test]
fn missing_date_is_rejected_before_the_store_is_called() {
    let mut roster = Roster::default();
    let mut form = AssignmentForm::new();
    let err = roster.save(&FailingStore, &mut form).unwrap_err();
    assert!(matches!(
        err,
        RosterError::Validation(ValidationError::MissingField("date"))
    ));
    assert!(form.set_section("Nowhere").is_err());
}

#[test]
fn second_save_for_pending_key_is_refused() {
    let store = InMemoryRosterStore::new();
    let mut roster = Roster::default();
    let form = form_for(d(2025, 10, 5), "KG Umum 1");

    let ticket = roster.begin_save(&form).unwrap();
    assert!(roster.is_pending(&ticket.key()));
    assert!(matches!(
        roster.begin_save(&form),
        Err(RosterError::SavePending(_))
    ));

    let other = roster.begin_save(&form_for(d(2025, 10, 5), "KG Umum 2")).unwrap();

    let outcome = store.upsert_schedule(ticket.draft());
    roster.complete_save(ticket, outcome).unwrap();
    let outcome = store.upsert_schedule(other.draft());
    roster.complete_save(other, outcome).unwrap();

    assert_eq!(roster.records().len(), 2);
    assert!(roster.begin_save(&form).is_ok());
}

#[test]
fn delete_requires_confirmation_and_ignores_missing_keys() {
    let store = InMemoryRosterStore::new();
    let mut roster = Roster::default();
    let mut form = form_for(d(2025, 10, 5), "KG Umum 1");
    roster.save(&store, &mut form).unwrap();
    let key = ScheduleKey::new(d(2025, 10, 5), "KG Umum 1");

    let err = roster
        .delete(&store, &key, Confirmation::from_answer("n"))
        .unwrap_err();
    assert!(matches!(err, RosterError::NotConfirmed(_)));
    assert_eq!(roster.records().len(), 1);

    let missing = ScheduleKey::new(d(2025, 10, 12), "KG Umum 1");
    let before = roster.records().to_vec();
    assert!(!roster.delete(&store, &missing, Confirmation::Confirmed).unwrap());
    assert_eq!(roster.records(), before.as_slice());

    assert!(roster.delete(&store, &key, Confirmation::from_answer("YES")).unwrap());
    assert!(roster.records().is_empty());
    assert!(store.list_schedules().unwrap().is_empty());
}

#[test]
fn failed_delete_keeps_the_local_record() {
    let record = ScheduleRecord::from_draft(7, ScheduleDraft::new(d(2025, 10, 5), "KG Youth"));
    let mut roster = Roster::new(Vec::new(), vec![record.clone()]);
    let err = roster
        .delete(&FailingStore, &record.key(), Confirmation::Confirmed)
        .unwrap_err();
    assert!(matches!(err, RosterError::Persistence(_)));
    assert_eq!(roster.records(), &[record]);
}

#[test]
fn deleted_people_resolve_to_their_raw_id() {
    let people = vec![Person::new("p1", "Anggiat"), Person::new("p2", "Sorta")];
    let mut roster = Roster::new(people, Vec::new());
    let ids = vec![PersonId::new("p1"), PersonId::new("p2")];
    assert_eq!(roster.people().resolve_all(&ids), "Anggiat, Sorta");

    roster.forget_person(&PersonId::new("p2"));
    assert_eq!(roster.people().resolve_all(&ids), "Anggiat, p2");

    let mut budi = Person::new("p3", "Budi");
    budi.active = false;
    roster.apply_person(budi);
    roster.apply_person(Person::new("p4", "Abdi"));
    let active: Vec<&str> = roster
        .people()
        .active_sorted()
        .into_iter()
        .map(|person| person.name.as_str())
        .collect();
    assert_eq!(active, vec!["Abdi", "Anggiat"]);
    assert_eq!(roster.people().resolve(&PersonId::new("p3")), "Budi");
}

#[test]
fn schedule_keys_parse_from_request_fields() {
    let key = ScheduleKey::parse(" 2025-10-05 ", " KG Umum 1 ").unwrap();
    assert_eq!(key, ScheduleKey::new(d(2025, 10, 5), "KG Umum 1"));
    assert_eq!(key.to_string(), "2025-10-05|KG Umum 1");
    assert!(ScheduleKey::parse("2025-10-05", "  ").is_none());
    assert!(ScheduleKey::parse("", "KG Umum 1").is_none());
}

#[test]
fn form_toggle_and_load_record() {
    let mut form = AssignmentForm::new();
    assert_eq!(form.section(), "KG Umum 1");
    assert!(form.toggle(Role::Singer, PersonId::new("p1")));
    assert!(form.toggle(Role::Singer, PersonId::new("p2")));
    assert!(!form.toggle(Role::Singer, PersonId::new("p1")));
    assert_eq!(form.role(Role::Singer), &[PersonId::new("p2")]);

    form.set_role(
        Role::Musik,
        vec![PersonId::new("p4"), PersonId::new("p4"), PersonId::new("p5")],
    );
    assert_eq!(form.role(Role::Musik).len(), 2);

    let stored = ScheduleRecord::from_draft(
        3,
        ScheduleDraft::new(d(2025, 11, 2), "Kopo Youth")
            .with_role(Role::Wl, vec![PersonId::new("p9")]),
    );
    form.load_record(&stored);
    assert_eq!(form.key(), Some(stored.key()));
    assert_eq!(form.role(Role::Wl), &[PersonId::new("p9")]);
    assert!(form.role(Role::Singer).is_empty());
}
