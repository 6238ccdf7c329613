use std::collections::{HashMap, HashSet};

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::distance::DistanceCache;
use crate::models::{
    AgenciesDoc, CanonicalConcert, ConcertOverridesDoc, EventsDoc, FetchedEvent,
};
use crate::title::parse_title;

/// Prefix marking concerts created locally rather than by the sync source.
pub const LOCAL_ID_PREFIX: &str = "local_";

// ---------------------------------------------------------------------------
// Sync application
// ---------------------------------------------------------------------------

pub struct SyncStats {
    pub added: usize,
    pub updated: usize,
    pub skipped_deleted: usize,
}

/// Fold a fetched calendar payload into the synced-events document.
///
/// Existing ids get their start/title refreshed (they may have changed in
/// the calendar), new ids are appended, tombstoned ids are skipped so a
/// user deletion survives re-sync. Locally-created events are untouched.
/// This function only ever sees the events document — overrides live in a
/// separate store that sync has no handle to.
pub fn apply_sync(
    doc: &mut EventsDoc,
    fetched: &[FetchedEvent],
    deleted: &HashSet<String>,
) -> SyncStats {
    let mut stats = SyncStats {
        added: 0,
        updated: 0,
        skipped_deleted: 0,
    };
    for ev in fetched {
        if deleted.contains(&ev.id) {
            stats.skipped_deleted += 1;
            continue;
        }
        match doc.events.get_mut(&ev.id) {
            Some(existing) => {
                existing.start = ev.start.clone();
                existing.title = ev.title.clone();
                stats.updated += 1;
            }
            None => {
                doc.events.insert(
                    ev.id.clone(),
                    crate::models::EventRecord {
                        start: ev.start.clone(),
                        title: ev.title.clone(),
                    },
                );
                stats.added += 1;
            }
        }
    }
    stats
}

// ---------------------------------------------------------------------------
// Canonical concerts
// ---------------------------------------------------------------------------

/// Artist name → base fee, for artists that have one configured.
pub fn artist_base_fees(agencies: &AgenciesDoc) -> HashMap<String, String> {
    let mut lookup = HashMap::new();
    for agency in &agencies.agencies {
        for artist in &agency.artists {
            if !artist.name.is_empty() && !artist.base_fee.is_empty() {
                lookup.insert(artist.name.clone(), artist.base_fee.clone());
            }
        }
    }
    lookup
}

/// Parse an event start into (day, time-of-day string).
pub fn parse_start(start: &str) -> Option<(NaiveDate, String)> {
    if start.contains('T') {
        if let Ok(dt) = DateTime::parse_from_rfc3339(start) {
            return Some((dt.date_naive(), dt.format("%H:%M").to_string()));
        }
        // Locally-created events carry no offset.
        let dt = NaiveDateTime::parse_from_str(start, "%Y-%m-%dT%H:%M:%S").ok()?;
        Some((dt.date(), dt.format("%H:%M").to_string()))
    } else {
        let d = NaiveDate::parse_from_str(start, "%Y-%m-%d").ok()?;
        Some((d, String::new()))
    }
}

fn pick(overridden: Option<&String>, parsed: String) -> String {
    match overridden {
        Some(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => parsed,
    }
}

/// Merge synced events with user overrides into the canonical concert set.
///
/// Per field: the override wins only when non-empty. A still-empty fee
/// defaults to the matching agency artist's base fee. A non-empty
/// substitute forces the fee to "0" regardless of any other source.
/// Distance comes from the cache only — a miss stays unknown.
///
/// Sorted by the raw start string; lexicographic order matches time order
/// because all starts share the fixed-width ISO format with offset (the
/// sync payload comes from a single calendar).
pub fn merged_concerts(
    events: &EventsDoc,
    overrides: &ConcertOverridesDoc,
    agencies: &AgenciesDoc,
    distances: &DistanceCache,
) -> (Vec<CanonicalConcert>, Vec<String>) {
    let base_fees = artist_base_fees(agencies);
    let mut warnings = Vec::new();

    let mut ordered: Vec<(&String, &crate::models::EventRecord)> = events.events.iter().collect();
    ordered.sort_by(|a, b| a.1.start.cmp(&b.1.start));

    let mut concerts = Vec::with_capacity(ordered.len());
    for (id, record) in ordered {
        let (day, date, time, year, month) = match parse_start(&record.start) {
            Some((d, time)) => (
                Some(d),
                d.format("%d/%m/%Y").to_string(),
                time,
                chrono::Datelike::year(&d),
                chrono::Datelike::month(&d),
            ),
            None => {
                warnings.push(format!(
                    "concert {id}: unparsable start '{}'",
                    record.start
                ));
                (None, record.start.clone(), String::new(), 0, 0)
            }
        };

        let parsed = parse_title(&record.title);
        let ov = overrides.get(id).cloned().unwrap_or_default();

        let artist = pick(ov.artist.as_ref(), parsed.artist);
        let event = pick(ov.event.as_ref(), parsed.event);
        let location = pick(ov.location.as_ref(), parsed.location);
        let substitute = pick(ov.substitute.as_ref(), parsed.substitute);
        let mut fee = pick(ov.fee.as_ref(), String::new());
        if fee.is_empty() {
            if let Some(base) = base_fees.get(&artist) {
                fee = base.clone();
            }
        }
        if !substitute.is_empty() {
            fee = "0".to_string();
        }

        let km = if location.is_empty() {
            None
        } else {
            distances.get(&location)
        };

        concerts.push(CanonicalConcert {
            id: id.clone(),
            start: record.start.clone(),
            day,
            date,
            time,
            year,
            month,
            artist,
            event,
            location,
            substitute,
            fee,
            km,
        });
    }

    (concerts, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Agency, Artist, ConcertOverride, EventRecord};

    fn fetched(id: &str, start: &str, title: &str) -> FetchedEvent {
        FetchedEvent {
            id: id.to_string(),
            start: start.to_string(),
            title: title.to_string(),
        }
    }

    fn events_doc(entries: &[(&str, &str, &str)]) -> EventsDoc {
        let mut doc = EventsDoc::default();
        for (id, start, title) in entries {
            doc.events.insert(
                id.to_string(),
                EventRecord {
                    start: start.to_string(),
                    title: title.to_string(),
                },
            );
        }
        doc
    }

    fn merged(
        events: &EventsDoc,
        overrides: &ConcertOverridesDoc,
        agencies: &AgenciesDoc,
    ) -> Vec<CanonicalConcert> {
        merged_concerts(events, overrides, agencies, &DistanceCache::default()).0
    }

    #[test]
    fn test_apply_sync_adds_updates_and_skips_deleted() {
        let mut doc = events_doc(&[("ev1", "2025-03-01", "Old | Title, Porto")]);
        let deleted: HashSet<String> = ["gone".to_string()].into_iter().collect();
        let payload = vec![
            fetched("ev1", "2025-03-02", "New | Title, Porto"),
            fetched("ev2", "2025-04-05", "Banda X | Festa, Braga"),
            fetched("gone", "2025-05-01", "Deleted | Event, Faro"),
        ];
        let stats = apply_sync(&mut doc, &payload, &deleted);
        assert_eq!(stats.added, 1);
        assert_eq!(stats.updated, 1);
        assert_eq!(stats.skipped_deleted, 1);
        assert_eq!(doc.events["ev1"].start, "2025-03-02");
        assert_eq!(doc.events["ev1"].title, "New | Title, Porto");
        assert!(!doc.events.contains_key("gone"));
    }

    #[test]
    fn test_apply_sync_leaves_local_events_alone() {
        let mut doc = events_doc(&[("local_abc", "2025-07-01", "")]);
        apply_sync(&mut doc, &[fetched("ev1", "2025-08-01", "A | B, C")], &HashSet::new());
        assert_eq!(doc.events["local_abc"].start, "2025-07-01");
        assert_eq!(doc.events.len(), 2);
    }

    #[test]
    fn test_override_wins_only_when_non_empty() {
        let events = events_doc(&[("ev1", "2025-03-01", "Banda X | Festa, Porto")]);
        let mut overrides = ConcertOverridesDoc::new();
        overrides.insert(
            "ev1".to_string(),
            ConcertOverride {
                artist: Some("Banda Y".to_string()),
                location: Some("  ".to_string()),
                ..Default::default()
            },
        );
        let list = merged(&events, &overrides, &AgenciesDoc::default());
        assert_eq!(list[0].artist, "Banda Y");
        assert_eq!(list[0].location, "Porto"); // blank override does not clobber
        assert_eq!(list[0].event, "Festa");
    }

    #[test]
    fn test_overrides_survive_resync() {
        let mut events = events_doc(&[("ev1", "2025-03-01", "Banda X | Festa, Porto")]);
        let mut overrides = ConcertOverridesDoc::new();
        overrides.insert(
            "ev1".to_string(),
            ConcertOverride {
                fee: Some("500".to_string()),
                ..Default::default()
            },
        );
        // Re-sync refreshes the event; the override store is not an input.
        apply_sync(
            &mut events,
            &[fetched("ev1", "2025-03-01", "Banda X | Festa Maior, Porto")],
            &HashSet::new(),
        );
        let list = merged(&events, &overrides, &AgenciesDoc::default());
        assert_eq!(list[0].event, "Festa Maior");
        assert_eq!(list[0].fee, "500");
        assert_eq!(overrides["ev1"].fee.as_deref(), Some("500"));
    }

    #[test]
    fn test_fee_defaults_from_agency_artist() {
        let events = events_doc(&[("ev1", "2025-03-01", "Banda X | Festa, Porto")]);
        let agencies = AgenciesDoc {
            agencies: vec![Agency {
                id: "ag1".to_string(),
                name: "Agência Norte".to_string(),
                tax_id: "500100200".to_string(),
                artists: vec![Artist {
                    name: "Banda X".to_string(),
                    base_fee: "750".to_string(),
                }],
            }],
        };
        let list = merged(&events, &ConcertOverridesDoc::new(), &agencies);
        assert_eq!(list[0].fee, "750");
    }

    #[test]
    fn test_substitute_forces_fee_zero() {
        let events = events_doc(&[(
            "ev1",
            "2025-03-01",
            "Banda X | Festival Y, Porto SUB João Silva",
        )]);
        let mut overrides = ConcertOverridesDoc::new();
        overrides.insert(
            "ev1".to_string(),
            ConcertOverride {
                fee: Some("900".to_string()),
                ..Default::default()
            },
        );
        let list = merged(&events, &overrides, &AgenciesDoc::default());
        assert_eq!(list[0].artist, "Banda X");
        assert_eq!(list[0].event, "Festival Y");
        assert_eq!(list[0].location, "Porto");
        assert_eq!(list[0].substitute, "João Silva");
        assert_eq!(list[0].fee, "0");
    }

    #[test]
    fn test_sorted_by_start() {
        let events = events_doc(&[
            ("b", "2025-06-01T21:30:00+01:00", "B | E, L"),
            ("a", "2025-02-01", "A | E, L"),
            ("c", "2025-06-01T18:00:00+01:00", "C | E, L"),
        ]);
        let list = merged(&events, &ConcertOverridesDoc::new(), &AgenciesDoc::default());
        let ids: Vec<&str> = list.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["a", "c", "b"]);
    }

    #[test]
    fn test_unparsable_start_warns_but_keeps_row() {
        let events = events_doc(&[("ev1", "not-a-date", "Banda X | Festa, Porto")]);
        let (list, warnings) = merged_concerts(
            &events,
            &ConcertOverridesDoc::new(),
            &AgenciesDoc::default(),
            &DistanceCache::default(),
        );
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].year, 0);
        assert_eq!(list[0].date, "not-a-date");
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_km_comes_from_cache_only() {
        let events = events_doc(&[("ev1", "2025-03-01", "Banda X | Festa, Porto")]);
        let mut cache = DistanceCache::default();
        cache.put_one_way("Porto", 60.0);
        let (list, _) = merged_concerts(
            &events,
            &ConcertOverridesDoc::new(),
            &AgenciesDoc::default(),
            &cache,
        );
        assert_eq!(list[0].km, Some(120.0));

        let (list, _) = merged_concerts(
            &events,
            &ConcertOverridesDoc::new(),
            &AgenciesDoc::default(),
            &DistanceCache::default(),
        );
        assert_eq!(list[0].km, None);
    }

    #[test]
    fn test_timed_event_date_and_time() {
        let events = events_doc(&[("ev1", "2025-06-01T21:30:00+01:00", "A | B, C")]);
        let list = merged(&events, &ConcertOverridesDoc::new(), &AgenciesDoc::default());
        assert_eq!(list[0].date, "01/06/2025");
        assert_eq!(list[0].time, "21:30");
        assert_eq!(list[0].year, 2025);
        assert_eq!(list[0].month, 6);
    }
}
