use chrono::{Local, NaiveDate};
use service_roster::calendar::{parse_iso_date, short_date_label};
use service_roster::export::export_workbook_to_path;
use service_roster::section::resolve_section;
use service_roster::{
    AppConfig, AssignmentForm, CellTone, Confirmation, MonthFilter, NewPeople, PersistenceError,
    PersonId, PersonStore, PersonUpdate, Role, Roster, ScheduleKey, ScheduleRecord,
    ScheduleStore, SECTIONS, SqliteRosterStore, init_tracing, load_roster_from_json,
    load_schedules_from_csv, save_roster_to_json, save_schedules_to_csv, seed_people,
};
use std::io::{self, BufRead, Write};

fn print_help() {
    println!(
        "Commands:\n  help                               Show this help\n  show                               Show the roster grid\n  month <YYYY-MM|all>                Filter grid columns by month\n  people                             List active people\n  person add <name>[, <name>...]     Create people (all or nothing)\n  person rename <id> <name...>       Rename a person\n  person active <id> <true|false>    Activate or deactivate a person\n  person delete <id>                 Delete a person\n  seed <name>[, <name>...]           Add names not yet in the directory\n  sections                           List service sections\n  date <YYYY-MM-DD>                  Set the form date\n  section <index|name...>            Set the form section\n  toggle <role> <id|name...>         Toggle a person in a role (wl, singer, musik, tari)\n  clear <role>                       Clear a role\n  form                               Show pending selections\n  edit                               Load the stored entry for the form date/section\n  save                               Save the form entry\n  delete <YYYY-MM-DD> <section...>   Delete an entry (asks for confirmation)\n  export [path]                      Write the XLSX workbook\n  snapshot <json|csv> <path>         Write a JSON roster snapshot or a CSV of entries\n  import <json|csv> <path>           Upsert entries from a snapshot (people are not imported)\n  quit|exit                          Exit"
    );
}

fn render_grid(roster: &Roster, filter: MonthFilter, today: NaiveDate) -> String {
    let view = roster.view();
    let dates = view.view_dates(filter);

    let mut header = vec!["Bagian".to_string()];
    for date in &dates {
        let marker = if *date == today { "*" } else { "" };
        for role in Role::ALL {
            header.push(format!("{}{marker} {}", short_date_label(*date), role.label()));
        }
    }

    let mut rows = Vec::with_capacity(SECTIONS.len());
    for section in SECTIONS {
        let mut row = vec![section.to_string()];
        for date in &dates {
            let record = view.lookup(*date, section);
            for role in Role::ALL {
                let cell = match view.cell_tone(*date, section, role, today) {
                    CellTone::Missing => "-".to_string(),
                    CellTone::Today | CellTone::Filled => record
                        .map(|record| roster.people().resolve_all(record.role(role)))
                        .unwrap_or_default(),
                };
                row.push(cell);
            }
        }
        rows.push(row);
    }

    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(cell.chars().count());
        }
    }

    let mut sep = String::from("+");
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let format_row = |cells: &[String]| {
        let mut line = String::from("|");
        for (idx, cell) in cells.iter().enumerate() {
            let pad = widths[idx].saturating_sub(cell.chars().count());
            line.push(' ');
            line.push_str(cell);
            line.push_str(&" ".repeat(pad));
            line.push_str(" |");
        }
        line
    };

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    out.push_str(&format_row(&header));
    out.push('\n');
    out.push_str(&sep);
    out.push('\n');
    for row in &rows {
        out.push_str(&format_row(row));
        out.push('\n');
    }
    out.push_str(&sep);
    if dates.is_empty() {
        out.push_str("\n(no dates recorded)");
    }
    for orphan in view.orphans() {
        out.push_str(&format!(
            "\n(unknown section '{}' on {} not shown)",
            orphan.section, orphan.date
        ));
    }
    out
}

fn print_form(roster: &Roster, form: &AssignmentForm) {
    let date = form
        .date()
        .map(|d| d.to_string())
        .unwrap_or_else(|| "(not set)".to_string());
    println!("Date   : {date}");
    println!("Section: {}", form.section());
    for role in Role::ALL {
        println!(
            "{:<7}: {}",
            role.label(),
            roster.people().resolve_all(form.role(role))
        );
    }
    if let Some(key) = form.key() {
        if roster.is_pending(&key) {
            println!("(save in progress for {key})");
        }
    }
}

fn split_names(input: &str) -> Vec<String> {
    input.split(',').map(|name| name.trim().to_string()).collect()
}

fn resolve_person(roster: &Roster, input: &str) -> PersonId {
    let input = input.trim();
    match roster.people().find_by_name(input) {
        Some(person) => person.id.clone(),
        None => PersonId::new(input),
    }
}

/// Upserts every record by key; the store keeps or assigns ids.
fn import_schedules(
    store: &SqliteRosterStore,
    records: &[ScheduleRecord],
) -> Result<usize, PersistenceError> {
    for record in records {
        store.upsert_schedule(&record.to_draft())?;
    }
    Ok(records.len())
}

fn rest_of_line<'a>(input: &'a str, skip: usize) -> &'a str {
    let mut rest = input.trim_start();
    for _ in 0..skip {
        rest = rest
            .split_once(char::is_whitespace)
            .map(|(_, tail)| tail.trim_start())
            .unwrap_or("");
    }
    rest.trim()
}

fn main() {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Configuration error: {err}");
            std::process::exit(2);
        }
    };
    init_tracing(&config.log_filter);

    let store = match SqliteRosterStore::new(&config.database_path) {
        Ok(store) => store,
        Err(err) => {
            eprintln!("Could not open {}: {err}", config.database_path.display());
            std::process::exit(1);
        }
    };
    let mut roster = match Roster::load(&store) {
        Ok(roster) => roster,
        Err(err) => {
            eprintln!("Could not load roster: {err}");
            std::process::exit(1);
        }
    };
    let mut form = AssignmentForm::new();
    let mut filter = MonthFilter::All;
    let today = Local::now().date_naive();

    println!("Service Roster (CLI) - type 'help' for commands\n");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        let line = match lines.next() {
            Some(Ok(line)) => line,
            _ => break,
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let mut parts = input.split_whitespace();
        let cmd = parts.next().unwrap_or("");

        match cmd {
            "help" => print_help(),
            "quit" | "exit" => break,
            "show" => println!("{}", render_grid(&roster, filter, today)),
            "month" => match parts.next().map(MonthFilter::parse) {
                Some(Some(parsed)) => {
                    filter = parsed;
                    println!("Showing {filter}.");
                }
                Some(None) => println!("Invalid month (YYYY-MM or all)"),
                None => println!("Usage: month <YYYY-MM|all>"),
            },
            "sections" => {
                for (idx, section) in SECTIONS.iter().enumerate() {
                    println!("  {:>2}. {section}", idx + 1);
                }
            }
            "people" => {
                for person in roster.people().active_sorted() {
                    println!("  {}  {}", person.id, person.name);
                }
            }
            "person" => match parts.next() {
                Some("add") => {
                    let names = split_names(rest_of_line(input, 2));
                    match NewPeople::from_names(names) {
                        Some(batch) => match store.create_people(&batch) {
                            Ok(created) => {
                                for person in created {
                                    println!("Added {} ({}).", person.name, person.id);
                                    roster.apply_person(person);
                                }
                            }
                            Err(e) => println!("Error: {e}"),
                        },
                        None => println!("Usage: person add <name>[, <name>...]"),
                    }
                }
                Some("rename") => match parts.next() {
                    Some(id) => {
                        let update = PersonUpdate {
                            name: Some(rest_of_line(input, 3).to_string()),
                            ..PersonUpdate::default()
                        };
                        match store.update_person(&PersonId::new(id), &update) {
                            Ok(person) => {
                                println!("Renamed {} to {}.", person.id, person.name);
                                roster.apply_person(person);
                            }
                            Err(e) => println!("Error: {e}"),
                        }
                    }
                    None => println!("Usage: person rename <id> <name...>"),
                },
                Some("active") => match (parts.next(), parts.next()) {
                    (Some(id), Some(flag)) => {
                        let active = match flag.to_ascii_lowercase().as_str() {
                            "true" => true,
                            "false" => false,
                            _ => {
                                println!("Invalid bool (true|false)");
                                continue;
                            }
                        };
                        let update = PersonUpdate {
                            active: Some(active),
                            ..PersonUpdate::default()
                        };
                        match store.update_person(&PersonId::new(id), &update) {
                            Ok(person) => {
                                println!("{} active={}.", person.name, person.active);
                                roster.apply_person(person);
                            }
                            Err(e) => println!("Error: {e}"),
                        }
                    }
                    _ => println!("Usage: person active <id> <true|false>"),
                },
                Some("delete") => match parts.next() {
                    Some(id) => {
                        let id = PersonId::new(id);
                        match store.delete_person(&id) {
                            Ok(()) => {
                                println!("Deleted person {id}.");
                                roster.forget_person(&id);
                            }
                            Err(e) => println!("Error: {e}"),
                        }
                    }
                    None => println!("Usage: person delete <id>"),
                },
                _ => println!("Usage: person <add|rename|active|delete> ..."),
            },
            "seed" => {
                let names = split_names(rest_of_line(input, 1));
                match seed_people(&store, names) {
                    Ok(created) => {
                        println!("Seeded {} new people.", created.len());
                        if let Err(e) = roster.reload_people(&store) {
                            println!("Error: {e}");
                        }
                    }
                    Err(e) => println!("Error: {e}"),
                }
            }
            "date" => match parts.next().map(parse_iso_date) {
                Some(Some(date)) => {
                    form.set_date(Some(date));
                    println!("Date set to {date}.");
                }
                Some(None) => println!("Invalid date (YYYY-MM-DD)"),
                None => println!("Usage: date <YYYY-MM-DD>"),
            },
            "section" => match resolve_section(rest_of_line(input, 1)) {
                Some(section) => match form.set_section(section) {
                    Ok(()) => println!("Section set to {section}."),
                    Err(e) => println!("Error: {e}"),
                },
                None => println!("Unknown section (see 'sections')"),
            },
            "toggle" => {
                let role = parts.next().map(str::parse::<Role>);
                let who = rest_of_line(input, 2);
                match role {
                    Some(Ok(role)) if !who.is_empty() => {
                        let id = resolve_person(&roster, who);
                        let name = roster.people().resolve(&id).to_string();
                        if form.toggle(role, id) {
                            println!("{name} selected as {role}.");
                        } else {
                            println!("{name} removed from {role}.");
                        }
                    }
                    Some(Err(e)) => println!("Error: {e}"),
                    _ => println!("Usage: toggle <role> <id|name...>"),
                }
            }
            "clear" => match parts.next().map(str::parse::<Role>) {
                Some(Ok(role)) => {
                    form.clear_role(role);
                    println!("{role} cleared.");
                }
                Some(Err(e)) => println!("Error: {e}"),
                None => println!("Usage: clear <role>"),
            },
            "form" => print_form(&roster, &form),
            "edit" => {
                let existing = form.key().and_then(|key| {
                    roster
                        .view()
                        .lookup(key.date, &key.section)
                        .cloned()
                });
                match existing {
                    Some(record) => {
                        form.load_record(&record);
                        println!("Loaded {}.", record.key());
                    }
                    None => println!("No stored entry for the form date/section."),
                }
            }
            "save" => match roster.save(&store, &mut form) {
                Ok(record) => println!("Saved {} (id {}).", record.key(), record.id),
                Err(e) => println!("Error: {e}"),
            },
            "delete" => {
                let date = parts.next().map(parse_iso_date);
                let section = resolve_section(rest_of_line(input, 2));
                match (date, section) {
                    (Some(Some(date)), Some(section)) => {
                        let key = ScheduleKey::new(date, section);
                        print!("Delete {key}? [y/N] ");
                        let _ = io::stdout().flush();
                        let answer = match lines.next() {
                            Some(Ok(answer)) => answer,
                            _ => String::new(),
                        };
                        match roster.delete(&store, &key, Confirmation::from_answer(&answer)) {
                            Ok(true) => println!("Deleted {key}."),
                            Ok(false) => println!("No entry for {key}."),
                            Err(e) => println!("{e}"),
                        }
                    }
                    _ => println!("Usage: delete <YYYY-MM-DD> <section index|name...>"),
                }
            }
            "export" => {
                let path = parts
                    .next()
                    .map(str::to_string)
                    .unwrap_or_else(|| config.export_file_name.clone());
                match export_workbook_to_path(roster.records(), roster.people(), &path) {
                    Ok(sheets) => println!("Exported {sheets} month sheet(s) to {path}."),
                    Err(e) => println!("Export error: {e}"),
                }
            }
            "snapshot" => match (parts.next(), parts.next()) {
                (Some(format), Some(path)) => {
                    let written = match format {
                        "json" => {
                            save_roster_to_json(roster.people().people(), roster.records(), path)
                        }
                        "csv" => save_schedules_to_csv(roster.records(), path),
                        _ => {
                            println!("Usage: snapshot <json|csv> <path>");
                            continue;
                        }
                    };
                    match written {
                        Ok(()) => println!(
                            "Wrote {} schedule(s) to {path}.",
                            roster.records().len()
                        ),
                        Err(e) => println!("Error: {e}"),
                    }
                }
                _ => println!("Usage: snapshot <json|csv> <path>"),
            },
            "import" => match (parts.next(), parts.next()) {
                (Some(format), Some(path)) => {
                    let loaded = match format {
                        "json" => load_roster_from_json(path).map(|snapshot| snapshot.schedules),
                        "csv" => load_schedules_from_csv(path),
                        _ => {
                            println!("Usage: import <json|csv> <path>");
                            continue;
                        }
                    };
                    match loaded.and_then(|records| import_schedules(&store, &records)) {
                        Ok(count) => {
                            println!("Imported {count} schedule(s).");
                            match Roster::load(&store) {
                                Ok(reloaded) => roster = reloaded,
                                Err(e) => println!("Error: {e}"),
                            }
                        }
                        Err(e) => println!("Error: {e}"),
                    }
                }
                _ => println!("Usage: import <json|csv> <path>"),
            },
            _ => println!("Unknown command. Type 'help'."),
        }
    }
}
