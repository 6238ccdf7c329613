use comfy_table::{Cell, Table};
use rand::Rng;

use crate::error::{PalcoError, Result};
use crate::models::{Agency, Artist};
use crate::store::DataDir;

pub fn list() -> Result<()> {
    let data = DataDir::open()?;
    let doc = data.agencies()?;

    let mut table = Table::new();
    table.set_header(vec!["Agency", "NIF", "Artist", "Base Fee"]);
    for agency in &doc.agencies {
        if agency.artists.is_empty() {
            table.add_row(vec![
                Cell::new(&agency.name),
                Cell::new(&agency.tax_id),
                Cell::new(""),
                Cell::new(""),
            ]);
        }
        for artist in &agency.artists {
            table.add_row(vec![
                Cell::new(&agency.name),
                Cell::new(&agency.tax_id),
                Cell::new(&artist.name),
                Cell::new(&artist.base_fee),
            ]);
        }
    }
    println!("Agencies ({})\n{table}", doc.agencies.len());

    // Artists appearing in concerts but booked through no agency yet.
    let events = data.events()?;
    let overrides = data.concert_overrides()?;
    let distances = crate::distance::load_migrated(&data)?;
    let (concerts, _) = crate::merge::merged_concerts(&events, &overrides, &doc, &distances);
    let known: std::collections::HashSet<&str> = doc
        .agencies
        .iter()
        .flat_map(|a| a.artists.iter().map(|ar| ar.name.as_str()))
        .collect();
    let mut unattached: Vec<&str> = concerts
        .iter()
        .map(|c| c.artist.as_str())
        .filter(|a| !a.is_empty() && !known.contains(a))
        .collect();
    unattached.sort_unstable();
    unattached.dedup();
    if !unattached.is_empty() {
        println!("Artists without an agency: {}", unattached.join(", "));
    }
    Ok(())
}

pub fn add(name: &str, tax_id: &str) -> Result<()> {
    let data = DataDir::open()?;
    let mut doc = data.agencies()?;
    if doc.agencies.iter().any(|a| a.name == name) {
        return Err(PalcoError::Other(format!("Agency {name} already exists")));
    }
    let id = format!("ag_{:08x}", rand::thread_rng().gen::<u32>());
    doc.agencies.push(Agency {
        id,
        name: name.to_string(),
        tax_id: tax_id.to_string(),
        artists: Vec::new(),
    });
    data.save_agencies(&doc)?;
    println!("Added agency: {name}");
    Ok(())
}

fn find_agency<'a>(
    doc: &'a mut crate::models::AgenciesDoc,
    name: &str,
) -> Result<&'a mut Agency> {
    doc.agencies
        .iter_mut()
        .find(|a| a.name == name)
        .ok_or_else(|| PalcoError::UnknownAgency(name.to_string()))
}

pub fn add_artist(agency: &str, artist: &str, base_fee: &str) -> Result<()> {
    let data = DataDir::open()?;
    let mut doc = data.agencies()?;
    let entry = find_agency(&mut doc, agency)?;
    if entry.artists.iter().any(|a| a.name == artist) {
        return Err(PalcoError::Other(format!(
            "Artist {artist} already listed under {agency}"
        )));
    }
    entry.artists.push(Artist {
        name: artist.to_string(),
        base_fee: base_fee.to_string(),
    });
    data.save_agencies(&doc)?;
    println!("Added artist {artist} to {agency}");
    Ok(())
}

/// Change a base fee. With `refresh_future`, the new fee is also written as
/// a fee override onto the artist's concerts from today on, pinning it there
/// (past concerts keep whatever was agreed at the time).
pub fn set_fee(agency: &str, artist: &str, fee: &str, refresh_future: bool) -> Result<()> {
    let data = DataDir::open()?;
    let mut doc = data.agencies()?;
    let entry = find_agency(&mut doc, agency)?;
    let slot = entry
        .artists
        .iter_mut()
        .find(|a| a.name == artist)
        .ok_or_else(|| PalcoError::Other(format!("No artist {artist} under {agency}")))?;
    slot.base_fee = fee.to_string();
    data.save_agencies(&doc)?;
    println!("Set base fee {fee} for {artist} ({agency})");

    if refresh_future {
        let events = data.events()?;
        let mut overrides = data.concert_overrides()?;
        let distances = crate::distance::load_migrated(&data)?;
        let (concerts, _) = crate::merge::merged_concerts(&events, &overrides, &doc, &distances);

        let today = chrono::Local::now().date_naive();
        let mut refreshed = 0usize;
        for c in &concerts {
            let future = c.day.map(|d| d >= today).unwrap_or(false);
            if !future || c.artist != artist || !c.substitute.is_empty() {
                continue;
            }
            overrides.entry(c.id.clone()).or_default().fee = Some(fee.to_string());
            refreshed += 1;
        }
        if refreshed > 0 {
            data.save_concert_overrides(&overrides)?;
        }
        println!("Refreshed {refreshed} future concert(s)");
    }
    Ok(())
}
