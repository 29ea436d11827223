/// Service sections in grid order. Each section is one row of the roster grid.
pub const SECTIONS: [&str; 10] = [
    "KG Umum 1",
    "KG Umum 2",
    "KG Youth",
    "BTC Umum",
    "BTC Youth 1",
    "BTC Youth 2",
    "BTC Youth Gabungan",
    "Kopo Umum",
    "Kopo Youth",
    "IR Gabungan Gereja",
];

pub fn is_known_section(name: &str) -> bool {
    section_position(name).is_some()
}

/// Zero-based row position of a section in the catalog.
pub fn section_position(name: &str) -> Option<usize> {
    SECTIONS.iter().position(|section| *section == name)
}

/// Looks up a section by its 1-based index as shown to users.
pub fn section_by_index(index: usize) -> Option<&'static str> {
    index.checked_sub(1).and_then(|idx| SECTIONS.get(idx).copied())
}

/// Resolves user input that is either a 1-based index or an exact section name
/// (case-insensitive).
pub fn resolve_section(input: &str) -> Option<&'static str> {
    let trimmed = input.trim();
    if let Ok(index) = trimmed.parse::<usize>() {
        return section_by_index(index);
    }
    SECTIONS
        .iter()
        .copied()
        .find(|section| section.eq_ignore_ascii_case(trimmed))
}
