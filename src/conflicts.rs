use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::models::CanonicalConcert;

/// Days in `year` where the musician is double-booked, with the concerts
/// involved. Substituted concerts are not the musician's problem and are
/// left out before grouping.
pub fn overlap_days(
    concerts: &[CanonicalConcert],
    year: i32,
) -> BTreeMap<NaiveDate, Vec<CanonicalConcert>> {
    let mut by_day: BTreeMap<NaiveDate, Vec<CanonicalConcert>> = BTreeMap::new();
    for c in concerts {
        let Some(day) = c.day else { continue };
        if c.year != year || !c.substitute.is_empty() {
            continue;
        }
        by_day.entry(day).or_default().push(c.clone());
    }
    by_day.retain(|_, v| v.len() >= 2);
    by_day
}

/// Total number of conflicting concerts in `year`: each double-booked day
/// counts every concert on it, not one per day.
pub fn count_overlaps(concerts: &[CanonicalConcert], year: i32) -> usize {
    overlap_days(concerts, year).values().map(Vec::len).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn concert(id: &str, start: &str, substitute: &str) -> CanonicalConcert {
        let (day, time) = crate::merge::parse_start(start)
            .map(|(d, t)| (Some(d), t))
            .unwrap_or((None, String::new()));
        let (year, month) = day
            .map(|d| (chrono::Datelike::year(&d), chrono::Datelike::month(&d)))
            .unwrap_or((0, 0));
        CanonicalConcert {
            id: id.to_string(),
            start: start.to_string(),
            day,
            date: String::new(),
            time,
            year,
            month,
            artist: "Banda X".to_string(),
            event: "Festa".to_string(),
            location: "Porto".to_string(),
            substitute: substitute.to_string(),
            fee: "500".to_string(),
            km: None,
        }
    }

    #[test]
    fn test_two_concerts_same_day_both_count() {
        let concerts = vec![
            concert("a", "2025-06-01T18:00:00+01:00", ""),
            concert("b", "2025-06-01T22:00:00+01:00", ""),
            concert("c", "2025-06-02", ""),
        ];
        assert_eq!(count_overlaps(&concerts, 2025), 2);
        let days = overlap_days(&concerts, 2025);
        assert_eq!(days.len(), 1);
    }

    #[test]
    fn test_triple_booking_counts_three() {
        let concerts = vec![
            concert("a", "2025-06-01", ""),
            concert("b", "2025-06-01T20:00:00+01:00", ""),
            concert("c", "2025-06-01T23:00:00+01:00", ""),
        ];
        assert_eq!(count_overlaps(&concerts, 2025), 3);
    }

    #[test]
    fn test_substituted_concert_resolves_the_overlap() {
        let concerts = vec![
            concert("a", "2025-06-01T18:00:00+01:00", ""),
            concert("b", "2025-06-01T22:00:00+01:00", "Maria"),
        ];
        assert_eq!(count_overlaps(&concerts, 2025), 0);
    }

    #[test]
    fn test_other_years_are_ignored() {
        let concerts = vec![
            concert("a", "2024-06-01", ""),
            concert("b", "2024-06-01T21:00:00+01:00", ""),
        ];
        assert_eq!(count_overlaps(&concerts, 2025), 0);
        assert_eq!(count_overlaps(&concerts, 2024), 2);
    }
}
