use chrono::NaiveDate;
use service_roster::calendar::{
    format_iso_date, month_name_id, month_year_label, parse_iso_date, short_date_label,
};
use service_roster::section::{resolve_section, section_by_index};
use service_roster::{MonthFilter, MonthKey};

#[test]
fn indonesian_labels() {
    let date = NaiveDate::from_ymd_opt(2025, 10, 5).unwrap();
    assert_eq!(month_year_label(date), "Oktober 2025");
    assert_eq!(short_date_label(date), "05 Okt");
    assert_eq!(
        short_date_label(NaiveDate::from_ymd_opt(2025, 8, 17).unwrap()),
        "17 Agu"
    );
    assert_eq!(month_name_id(1), Some("Januari"));
    assert_eq!(month_name_id(12), Some("Desember"));
    assert_eq!(month_name_id(0), None);
    assert_eq!(month_name_id(13), None);
}

#[test]
fn iso_dates_round_trip() {
    let date = parse_iso_date(" 2025-02-09 ").unwrap();
    assert_eq!(format_iso_date(date), "2025-02-09");
    assert!(parse_iso_date("2025-02-30").is_none());
    assert!(parse_iso_date("09/02/2025").is_none());
}

#[test]
fn month_keys_order_chronologically() {
    let mut keys = vec![
        MonthKey::parse("2026-01").unwrap(),
        MonthKey::parse("2025-12").unwrap(),
        MonthKey::parse("2025-02").unwrap(),
    ];
    keys.sort();
    let rendered: Vec<String> = keys.iter().map(MonthKey::as_string).collect();
    assert_eq!(rendered, vec!["2025-02", "2025-12", "2026-01"]);
    assert!(MonthKey::parse("2025-1").is_none());
    assert_eq!(MonthFilter::default(), MonthFilter::All);
}

#[test]
fn sections_resolve_by_position_or_name() {
    assert_eq!(section_by_index(1), Some("KG Umum 1"));
    assert_eq!(section_by_index(10), Some("IR Gabungan Gereja"));
    assert_eq!(section_by_index(0), None);
    assert_eq!(resolve_section("7"), Some("BTC Youth Gabungan"));
    assert_eq!(resolve_section("kopo youth"), Some("Kopo Youth"));
    assert_eq!(resolve_section("Kopo"), None);
}
