use std::collections::HashSet;

use colored::Colorize;
use serde::Deserialize;

use crate::error::Result;
use crate::expenses::{normalize_row, RawExpenseRow};
use crate::merge::apply_sync;
use crate::models::FetchedEvent;
use crate::store::{DataDir, DISTANCES_FILE};

#[derive(Debug, Deserialize)]
struct CalendarPayload {
    #[serde(default)]
    events: Vec<FetchedEvent>,
}

#[derive(Debug, Deserialize)]
struct ExpensesPayload {
    #[serde(default)]
    rows: Vec<RawExpenseRow>,
}

fn stamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

pub fn calendar(file: &str) -> Result<()> {
    let data = DataDir::open()?;
    let content = std::fs::read_to_string(file)?;
    let payload: CalendarPayload = serde_json::from_str(&content)?;

    let deleted: HashSet<String> = data.deleted_events()?.into_iter().collect();
    let mut doc = data.events()?;
    let stats = apply_sync(&mut doc, &payload.events, &deleted);
    doc.last_sync = Some(stamp());
    data.save_events(&doc)?;

    println!(
        "Calendar sync: {} added, {} updated, {} skipped (deleted locally)",
        stats.added, stats.updated, stats.skipped_deleted
    );
    Ok(())
}

pub fn expenses(file: &str) -> Result<()> {
    let data = DataDir::open()?;
    let content = std::fs::read_to_string(file)?;
    let payload: ExpensesPayload = serde_json::from_str(&content)?;

    let mut doc = data.expenses()?;
    // The sheet is the source of truth for rows; category corrections live
    // in the override store and survive this replacement.
    doc.rows = payload.rows.iter().map(normalize_row).collect();
    doc.rows.retain(|r| !r.invoice_date.is_empty() || !r.supplier.is_empty());
    doc.last_sync = Some(stamp());
    data.save_expenses(&doc)?;

    println!("Expense sync: {} rows", doc.rows.len());
    Ok(())
}

pub fn distances(file: &str) -> Result<()> {
    let data = DataDir::open()?;
    let content = std::fs::read_to_string(file)?;
    let one_way: std::collections::BTreeMap<String, f64> = serde_json::from_str(&content)?;

    let mut cache = crate::distance::load_migrated(&data)?;
    let mut loaded = 0usize;
    for (location, km) in &one_way {
        if *km <= 0.0 {
            eprintln!(
                "{}",
                format!("Skipping {location}: non-positive distance {km}").yellow()
            );
            continue;
        }
        cache.put_one_way(location, *km);
        loaded += 1;
    }
    data.write_doc(DISTANCES_FILE, &cache)?;

    println!("Distance sync: {loaded} locations (stored as round trips)");
    Ok(())
}
