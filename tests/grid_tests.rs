use chrono::NaiveDate;
use service_roster::{
    CellTone, GridView, MonthFilter, MonthKey, PersonId, Role, ScheduleRecord, is_role_empty,
};

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn record(id: i64, date: NaiveDate, section: &str) -> ScheduleRecord {
    ScheduleRecord {
        id,
        date,
        section: section.to_string(),
        wl: Vec::new(),
        singer: Vec::new(),
        musik: Vec::new(),
        tari: Vec::new(),
    }
}

#[test]
fn distinct_dates_are_unique_and_in_calendar_order() {
    let records = vec![
        record(1, d(2026, 1, 4), "KG Umum 1"),
        record(2, d(2025, 12, 28), "KG Umum 1"),
        record(3, d(2026, 1, 4), "KG Youth"),
        record(4, d(2025, 2, 9), "BTC Umum"),
        record(5, d(2025, 12, 28), "Kopo Umum"),
    ];
    let view = GridView::from_records(&records);
    assert_eq!(
        view.dates(),
        &[d(2025, 2, 9), d(2025, 12, 28), d(2026, 1, 4)]
    );
}

#[test]
fn zero_records_keep_sections_without_dates() {
    let view = GridView::from_records(&[]);
    assert!(view.dates().is_empty());
    assert_eq!(view.sections().len(), 10);
    assert!(view.view_dates(MonthFilter::All).is_empty());
}

#[test]
fn absent_cell_differs_from_empty_record() {
    let records = vec![record(1, d(2025, 10, 5), "KG Umum 1")];
    let view = GridView::from_records(&records);

    let present = view.lookup(d(2025, 10, 5), "KG Umum 1");
    assert_eq!(present.map(|r| r.id), Some(1));
    assert!(Role::ALL.iter().all(|role| is_role_empty(present, *role)));

    assert!(view.lookup(d(2025, 10, 5), "KG Umum 2").is_none());
    assert!(view.lookup(d(2025, 10, 12), "KG Umum 1").is_none());
}

#[test]
fn month_filter_selects_matching_dates() {
    let records = vec![
        record(1, d(2025, 10, 5), "KG Umum 1"),
        record(2, d(2025, 10, 12), "KG Umum 1"),
        record(3, d(2025, 11, 2), "KG Umum 1"),
        record(4, d(2024, 10, 6), "KG Umum 1"),
    ];
    let view = GridView::from_records(&records);

    let october = MonthFilter::parse("2025-10").unwrap();
    assert_eq!(view.view_dates(october), vec![d(2025, 10, 5), d(2025, 10, 12)]);
    assert_eq!(view.view_dates(MonthFilter::parse("").unwrap()).len(), 4);
    assert_eq!(view.view_dates(MonthFilter::parse("all").unwrap()).len(), 4);
    assert!(view.view_dates(MonthFilter::parse("2023-01").unwrap()).is_empty());
    assert!(MonthFilter::parse("2025-13").is_none());
    assert!(MonthFilter::parse("October").is_none());
    assert_eq!(MonthKey::of(d(2025, 3, 9)).to_string(), "2025-03");
}

#[test]
fn orphaned_sections_are_excluded_but_reported() {
    let records = vec![
        record(1, d(2025, 10, 5), "KG Umum 1"),
        record(2, d(2025, 10, 5), "Old Section"),
    ];
    let view = GridView::from_records(&records);
    assert!(view.lookup(d(2025, 10, 5), "Old Section").is_none());
    assert_eq!(view.orphans().len(), 1);
    assert_eq!(view.orphans()[0].id, 2);

    let only_orphans = vec![record(3, d(2025, 11, 2), "Old Section")];
    assert!(GridView::from_records(&only_orphans).dates().is_empty());
}

#[test]
fn cell_tone_prefers_missing_over_today() {
    let mut filled = record(1, d(2025, 10, 5), "KG Umum 1");
    filled.wl = vec![PersonId::new("p1")];
    let records = vec![filled];
    let view = GridView::from_records(&records);
    let today = d(2025, 10, 5);

    assert_eq!(
        view.cell_tone(today, "KG Umum 1", Role::Wl, today),
        CellTone::Today
    );
    assert_eq!(
        view.cell_tone(today, "KG Umum 1", Role::Singer, today),
        CellTone::Missing
    );
    assert_eq!(
        view.cell_tone(today, "KG Umum 1", Role::Wl, d(2025, 10, 6)),
        CellTone::Filled
    );
    assert_eq!(
        view.cell_tone(today, "KG Youth", Role::Wl, today),
        CellTone::Missing
    );
}
