use colored::Colorize;
use comfy_table::{Cell, Table};
use rand::Rng;

use crate::error::{PalcoError, Result};
use crate::merge::{merged_concerts, LOCAL_ID_PREFIX};
use crate::models::EventRecord;
use crate::store::DataDir;

pub fn list(year: Option<i32>) -> Result<()> {
    let data = DataDir::open()?;
    let events = data.events()?;
    let overrides = data.concert_overrides()?;
    let agencies = data.agencies()?;
    let distances = crate::distance::load_migrated(&data)?;

    let (concerts, warnings) = merged_concerts(&events, &overrides, &agencies, &distances);
    for w in &warnings {
        eprintln!("{}", w.yellow());
    }

    let mut table = Table::new();
    table.set_header(vec![
        "ID", "Date", "Time", "Artist", "Event", "Location", "Substitute", "Fee", "Km",
    ]);
    let mut shown = 0usize;
    for c in &concerts {
        if let Some(y) = year {
            if c.year != y {
                continue;
            }
        }
        let km = c.km.map(|v| format!("{v:.1}")).unwrap_or_default();
        let substitute = if c.substitute.is_empty() {
            Cell::new("")
        } else {
            Cell::new(c.substitute.red().to_string())
        };
        table.add_row(vec![
            Cell::new(&c.id),
            Cell::new(&c.date),
            Cell::new(&c.time),
            Cell::new(&c.artist),
            Cell::new(&c.event),
            Cell::new(&c.location),
            substitute,
            Cell::new(&c.fee),
            Cell::new(km),
        ]);
        shown += 1;
    }
    println!("Concerts ({shown})\n{table}");
    if let Some(ts) = &events.last_sync {
        println!("Last calendar sync: {ts}");
    }
    Ok(())
}

pub fn set(id: &str, field: &str, value: &str) -> Result<()> {
    let data = DataDir::open()?;
    data.set_concert_override_field(id, field, value)?;
    if value.trim().is_empty() {
        println!("Cleared {field} override on {id}");
    } else {
        println!("Set {field} = {value} on {id}");
    }
    Ok(())
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

#[allow(clippy::too_many_arguments)]
pub fn add(
    date: &str,
    time: Option<&str>,
    artist: &str,
    event: &str,
    location: &str,
    substitute: &str,
    fee: Option<&str>,
) -> Result<()> {
    chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| PalcoError::Other(format!("Invalid date '{date}' (expected YYYY-MM-DD)")))?;
    let start = match time {
        Some(t) => {
            chrono::NaiveTime::parse_from_str(t, "%H:%M")
                .map_err(|_| PalcoError::Other(format!("Invalid time '{t}' (expected HH:MM)")))?;
            format!("{date}T{t}:00")
        }
        None => date.to_string(),
    };

    let data = DataDir::open()?;
    let id = format!("{LOCAL_ID_PREFIX}{:08x}", rand::thread_rng().gen::<u32>());

    // A local concert has no calendar title; every field lives in the
    // override store, same as a correction on a synced concert.
    let mut events = data.events()?;
    events.events.insert(
        id.clone(),
        EventRecord {
            start,
            title: String::new(),
        },
    );
    data.save_events(&events)?;

    let mut overrides = data.concert_overrides()?;
    overrides.insert(
        id.clone(),
        crate::models::ConcertOverride {
            artist: non_empty(artist),
            event: non_empty(event),
            location: non_empty(location),
            substitute: non_empty(substitute),
            fee: fee.and_then(non_empty),
        },
    );
    data.save_concert_overrides(&overrides)?;

    println!("Added concert {id} on {date}");
    Ok(())
}

pub fn delete(id: &str) -> Result<()> {
    let data = DataDir::open()?;
    let mut events = data.events()?;
    if events.events.remove(id).is_none() {
        return Err(PalcoError::Other(format!("No concert with id {id}")));
    }
    data.save_events(&events)?;

    // Synced ids come back on the next sync unless tombstoned. Local ids
    // exist nowhere else, so removal is enough.
    if !id.starts_with(LOCAL_ID_PREFIX) {
        let mut deleted = data.deleted_events()?;
        if !deleted.iter().any(|d| d == id) {
            deleted.push(id.to_string());
            data.save_deleted_events(&deleted)?;
        }
    }

    let mut overrides = data.concert_overrides()?;
    if overrides.remove(id).is_some() {
        data.save_concert_overrides(&overrides)?;
    }

    println!("Deleted concert {id}");
    Ok(())
}
