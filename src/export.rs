//! Workbook export of the whole schedule.
//!
//! Export happens in two steps. [`WorkbookPlan::build`] turns records plus
//! the person directory into plain sheet contents: one sheet per calendar
//! month, one row per catalog section, and four role columns per date with
//! ids resolved to names. [`render_workbook`] then lays a plan out as an XLSX
//! file with the merged date header, frozen panes and cell styling.
//!
//! ```text
//! Sheet: Oktober
//! | Tanggal/ Bagian | 05 Okt                     | 12 Okt                     |
//! |                 | WL | SINGER | MUSIK | TARI | WL | SINGER | MUSIK | TARI |
//! | KG Umum 1       | .. | ..     | ..    | ..   | .. | ..     | ..    | ..   |
//! ```

use crate::calendar::{MonthKey, month_year_label, short_date_label};
use crate::grid::GridView;
use crate::person::PersonDirectory;
use crate::record::{Role, ScheduleRecord};
use crate::section::SECTIONS;
use chrono::NaiveDate;
use rust_xlsxwriter::{Color, ColNum, Format, FormatAlign, FormatBorder, RowNum, Workbook, Worksheet};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_EXPORT_FILE: &str = "Laporan_Pelayanan_Ibadah.xlsx";
/// Longest sheet name an XLSX workbook accepts.
pub const SHEET_NAME_LIMIT: usize = 31;
/// Name of the placeholder sheet written when there is nothing to export.
pub const EMPTY_SHEET_NAME: &str = "Jadwal";
pub const CORNER_LABEL: &str = "Tanggal/ Bagian";

const SECTION_COLUMN_WIDTH: f64 = 22.0;
const ROLE_COLUMN_WIDTH: f64 = 18.0;
const HEADER_ROW_HEIGHT: f64 = 28.0;
const SUB_HEADER_ROW_HEIGHT: f64 = 22.0;
const HEADER_FILL: u32 = 0xE5E7EB;
const SUB_HEADER_FILL: u32 = 0xF3F4F6;
const BORDER_COLOR: u32 = 0x888888;
const HEADER_ROWS: RowNum = 2;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("xlsx error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SheetRow {
    pub section: String,
    /// Four cells per date, in `Role::ALL` order.
    pub cells: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SheetPlan {
    pub name: String,
    pub month: MonthKey,
    pub dates: Vec<NaiveDate>,
    pub rows: Vec<SheetRow>,
}

impl SheetPlan {
    pub fn date_labels(&self) -> Vec<String> {
        self.dates.iter().copied().map(short_date_label).collect()
    }

    pub fn row(&self, section: &str) -> Option<&SheetRow> {
        self.rows.iter().find(|row| row.section == section)
    }

    pub fn cell(&self, section: &str, date: NaiveDate, role: Role) -> Option<&str> {
        let date_idx = self.dates.iter().position(|d| *d == date)?;
        let role_idx = Role::ALL.iter().position(|r| *r == role)?;
        self.row(section)?
            .cells
            .get(date_idx * Role::ALL.len() + role_idx)
            .map(String::as_str)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WorkbookPlan {
    pub sheets: Vec<SheetPlan>,
}

impl WorkbookPlan {
    pub fn build(records: &[ScheduleRecord], people: &PersonDirectory) -> Self {
        let grid = GridView::from_records(records);
        let mut months: BTreeMap<MonthKey, Vec<NaiveDate>> = BTreeMap::new();
        for date in grid.dates() {
            months.entry(MonthKey::of(*date)).or_default().push(*date);
        }

        let mut used_names = HashSet::new();
        let sheets = months
            .into_iter()
            .map(|(month, dates)| {
                let base = month_year_label(dates[0])
                    .split_whitespace()
                    .next()
                    .unwrap_or_default()
                    .to_string();
                let name = unique_sheet_name(&base, &mut used_names);
                let rows = SECTIONS
                    .iter()
                    .map(|section| SheetRow {
                        section: section.to_string(),
                        cells: dates
                            .iter()
                            .flat_map(|date| {
                                let record = grid.lookup(*date, section);
                                Role::ALL.map(|role| {
                                    record
                                        .map(|record| people.resolve_all(record.role(role)))
                                        .unwrap_or_default()
                                })
                            })
                            .collect(),
                    })
                    .collect();
                SheetPlan {
                    name,
                    month,
                    dates,
                    rows,
                }
            })
            .collect();
        Self { sheets }
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|sheet| sheet.name.as_str()).collect()
    }
}

fn truncate_chars(input: &str, limit: usize) -> String {
    input.chars().take(limit).collect()
}

fn unique_sheet_name(base: &str, used: &mut HashSet<String>) -> String {
    let base = if base.trim().is_empty() {
        EMPTY_SHEET_NAME
    } else {
        base
    };
    let mut name = truncate_chars(base, SHEET_NAME_LIMIT);
    let mut idx = 2;
    while used.contains(&name) {
        let suffix = format!(" ({idx})");
        let room = SHEET_NAME_LIMIT.saturating_sub(suffix.chars().count());
        name = format!("{}{suffix}", truncate_chars(base, room));
        idx += 1;
    }
    used.insert(name.clone());
    name
}

struct SheetFormats {
    header_corner: Format,
    header: Format,
    sub_header_corner: Format,
    sub_header: Format,
    section: Format,
    cell: Format,
}

impl SheetFormats {
    fn new() -> Self {
        let bordered = Format::new()
            .set_border(FormatBorder::Thin)
            .set_border_color(Color::RGB(BORDER_COLOR));
        let header_base = bordered
            .clone()
            .set_bold()
            .set_align(FormatAlign::VerticalCenter);
        let cell = bordered
            .set_text_wrap()
            .set_align(FormatAlign::Left)
            .set_align(FormatAlign::VerticalCenter);

        Self {
            header_corner: header_base
                .clone()
                .set_align(FormatAlign::Left)
                .set_background_color(Color::RGB(HEADER_FILL)),
            header: header_base
                .clone()
                .set_align(FormatAlign::Center)
                .set_background_color(Color::RGB(HEADER_FILL)),
            sub_header_corner: header_base
                .clone()
                .set_align(FormatAlign::Left)
                .set_background_color(Color::RGB(SUB_HEADER_FILL)),
            sub_header: header_base
                .set_align(FormatAlign::Center)
                .set_background_color(Color::RGB(SUB_HEADER_FILL)),
            section: cell.clone().set_bold(),
            cell,
        }
    }
}

/// A sheet holds one month, so at most 1 + 31 * 4 columns.
fn column(index: usize) -> ColNum {
    index as ColNum
}

fn write_sheet(
    worksheet: &mut Worksheet,
    sheet: &SheetPlan,
    formats: &SheetFormats,
) -> Result<(), ExportError> {
    worksheet.set_name(sheet.name.as_str())?;
    let roles = Role::ALL.len();

    worksheet.write_string_with_format(0, 0, CORNER_LABEL, &formats.header_corner)?;
    worksheet.write_blank(1, 0, &formats.sub_header_corner)?;
    for (date_idx, label) in sheet.date_labels().iter().enumerate() {
        let first = column(1 + date_idx * roles);
        let last = column(date_idx * roles + roles);
        worksheet.merge_range(0, first, 0, last, label, &formats.header)?;
        for (role_idx, role) in Role::ALL.iter().enumerate() {
            let col = column(1 + date_idx * roles + role_idx);
            worksheet.write_string_with_format(1, col, role.label(), &formats.sub_header)?;
        }
    }

    for (row_idx, row) in sheet.rows.iter().enumerate() {
        let excel_row = HEADER_ROWS + row_idx as RowNum;
        worksheet.write_string_with_format(excel_row, 0, row.section.as_str(), &formats.section)?;
        for (cell_idx, value) in row.cells.iter().enumerate() {
            let col = column(1 + cell_idx);
            if value.is_empty() {
                worksheet.write_blank(excel_row, col, &formats.cell)?;
            } else {
                worksheet.write_string_with_format(excel_row, col, value.as_str(), &formats.cell)?;
            }
        }
    }

    worksheet.set_column_width(0, SECTION_COLUMN_WIDTH)?;
    for idx in 0..sheet.dates.len() * roles {
        worksheet.set_column_width(column(1 + idx), ROLE_COLUMN_WIDTH)?;
    }
    worksheet.set_row_height(0, HEADER_ROW_HEIGHT)?;
    worksheet.set_row_height(1, SUB_HEADER_ROW_HEIGHT)?;
    worksheet.set_freeze_panes(HEADER_ROWS, 1)?;
    Ok(())
}

/// Lays the plan out as XLSX bytes. A plan without sheets yields a single
/// empty sheet, since a workbook needs at least one.
pub fn render_workbook(plan: &WorkbookPlan) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let formats = SheetFormats::new();
    if plan.sheets.is_empty() {
        workbook.add_worksheet().set_name(EMPTY_SHEET_NAME)?;
    }
    for sheet in &plan.sheets {
        write_sheet(workbook.add_worksheet(), sheet, &formats)?;
    }
    Ok(workbook.save_to_buffer()?)
}

pub fn export_workbook(
    records: &[ScheduleRecord],
    people: &PersonDirectory,
) -> Result<Vec<u8>, ExportError> {
    let plan = WorkbookPlan::build(records, people);
    let bytes = render_workbook(&plan)?;
    tracing::info!(
        sheets = plan.sheets.len(),
        records = records.len(),
        bytes = bytes.len(),
        "exported schedule workbook"
    );
    Ok(bytes)
}

/// Writes the workbook to `path` and returns the number of month sheets.
pub fn export_workbook_to_path<P: AsRef<Path>>(
    records: &[ScheduleRecord],
    people: &PersonDirectory,
    path: P,
) -> Result<usize, ExportError> {
    let plan = WorkbookPlan::build(records, people);
    let bytes = render_workbook(&plan)?;
    std::fs::write(path, bytes)?;
    Ok(plan.sheets.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sheet_names_get_numeric_suffix_and_stay_within_limit() {
        let mut used = HashSet::new();
        assert_eq!(unique_sheet_name("Oktober", &mut used), "Oktober");
        assert_eq!(unique_sheet_name("Oktober", &mut used), "Oktober (2)");
        assert_eq!(unique_sheet_name("Oktober", &mut used), "Oktober (3)");

        let long = "A".repeat(40);
        let first = unique_sheet_name(&long, &mut used);
        let second = unique_sheet_name(&long, &mut used);
        assert_eq!(first.chars().count(), SHEET_NAME_LIMIT);
        assert_eq!(second.chars().count(), SHEET_NAME_LIMIT);
        assert!(second.ends_with(" (2)"));
    }
}
