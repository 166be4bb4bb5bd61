//! Name-keyed reconciliation between the shift set and the directory, and
//! the grouped view models built on top of it.
//!
//! Joins are exact string equality on the NFC-normalized display name.
//! Names are assumed unique among active personnel; when duplicates slip
//! in anyway, the first directory row wins and nothing is deduplicated.

use serde::Serialize;

use crate::classify::{self, Bucket, BucketKind};
use crate::types::{venue_wire, PersonRecord, ShiftEntry, Tier, Venue};
use crate::{shift_time, util};

/// Exact-name directory lookup. First match wins.
pub fn find_person<'a>(directory: &'a [PersonRecord], name: &str) -> Option<&'a PersonRecord> {
    let key = util::name_key(name);
    directory.iter().find(|p| p.name == key)
}

/// Main-venue filter shared by every view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VenueFilter {
    #[default]
    All,
    Only(Venue),
}

impl VenueFilter {
    /// `"all"`, empty, or unrecognized input means no filtering.
    pub fn from_wire(raw: Option<&str>) -> VenueFilter {
        raw.and_then(Venue::from_wire)
            .map(VenueFilter::Only)
            .unwrap_or(VenueFilter::All)
    }

    pub fn admits(self, main_venue: Option<Venue>) -> bool {
        match self {
            VenueFilter::All => true,
            VenueFilter::Only(venue) => main_venue == Some(venue),
        }
    }
}

/// Upload-time enrichment: copy each matched person's venue URLs onto the
/// shift row before it is persisted. Unmatched rows are kept as-is — an
/// attendee missing from the directory still belongs on the roster.
pub fn enrich_with_links(mut rows: Vec<ShiftEntry>, directory: &[PersonRecord]) -> Vec<ShiftEntry> {
    for row in &mut rows {
        match find_person(directory, &row.name) {
            Some(person) => {
                for venue in Venue::ALL {
                    row.set_venue_url(venue, person.venue_url(venue));
                }
            }
            None => log::debug!("No directory entry for {:?}; keeping placeholders", row.name),
        }
    }
    rows
}

/// One row of the today view: shift entry joined with its directory state.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedShiftRow {
    pub name: String,
    pub time: String,
    pub venue_a_url: String,
    pub venue_b_url: String,
    pub venue_c_url: String,
    pub signed_off_a: bool,
    pub signed_off_b: bool,
    pub signed_off_c: bool,
    #[serde(with = "venue_wire")]
    pub main_venue: Option<Venue>,
    /// False when the name had no directory match; the view renders
    /// "unregistered" placeholders instead of dropping the row.
    pub registered: bool,
    pub ordering_key: u32,
}

/// Render-time join of the shift set against the directory.
///
/// The directory is the fresh source for URLs and sign-off state; the
/// persisted copy on the shift row only backs up unmatched names. The
/// result is resorted by ordering key then name, independent of either
/// input's order.
pub fn merge_today(
    shift: &[ShiftEntry],
    directory: &[PersonRecord],
    filter: VenueFilter,
) -> Vec<MergedShiftRow> {
    let mut rows: Vec<MergedShiftRow> = shift
        .iter()
        .filter_map(|entry| {
            let person = find_person(directory, &entry.name);
            let main_venue = person.and_then(|p| p.main_venue);
            if !filter.admits(main_venue) {
                return None;
            }
            let url = |venue: Venue| -> String {
                match person {
                    Some(p) if !p.venue_url(venue).is_empty() => p.venue_url(venue).to_string(),
                    _ => entry.venue_url(venue).to_string(),
                }
            };
            Some(MergedShiftRow {
                name: entry.name.clone(),
                time: entry.time.clone(),
                venue_a_url: url(Venue::A),
                venue_b_url: url(Venue::B),
                venue_c_url: url(Venue::C),
                signed_off_a: person.map(|p| p.signed_off_a).unwrap_or(false),
                signed_off_b: person.map(|p| p.signed_off_b).unwrap_or(false),
                signed_off_c: person.map(|p| p.signed_off_c).unwrap_or(false),
                main_venue,
                registered: person.is_some(),
                ordering_key: shift_time::ordering_key(&entry.time),
            })
        })
        .collect();

    rows.sort_by(|a, b| {
        a.ordering_key
            .cmp(&b.ordering_key)
            .then_with(|| classify::compare_names(&a.name, &b.name))
    });
    rows
}

/// One display section of a grouped view.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Section<T> {
    pub kind: BucketKind,
    pub label: String,
    pub rows: Vec<T>,
}

pub(crate) fn sections_from_buckets<'a, T, F>(buckets: Vec<Bucket<'a>>, build: F) -> Vec<Section<T>>
where
    F: Fn(&'a PersonRecord) -> T,
{
    buckets
        .into_iter()
        .map(|bucket| Section {
            kind: bucket.kind,
            label: bucket.label,
            rows: bucket.members.into_iter().map(&build).collect(),
        })
        .collect()
}

/// Full-roster card: the same link/sign-off layout as the today view,
/// minus the time column.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterCard {
    pub name: String,
    pub tier: Tier,
    #[serde(with = "venue_wire")]
    pub main_venue: Option<Venue>,
    pub venue_a_url: String,
    pub venue_b_url: String,
    pub venue_c_url: String,
    pub signed_off_a: bool,
    pub signed_off_b: bool,
    pub signed_off_c: bool,
}

/// Grouped full-roster view (staff bucket included, always last).
pub fn roster_sections(
    directory: &[PersonRecord],
    filter: VenueFilter,
) -> Vec<Section<RosterCard>> {
    let filtered: Vec<&PersonRecord> = directory
        .iter()
        .filter(|p| filter.admits(p.main_venue))
        .collect();
    sections_from_buckets(classify::bucket_directory(filtered, true), |p| RosterCard {
        name: p.name.clone(),
        tier: p.tier,
        main_venue: p.main_venue,
        venue_a_url: p.venue_a_url.clone(),
        venue_b_url: p.venue_b_url.clone(),
        venue_c_url: p.venue_c_url.clone(),
        signed_off_a: p.signed_off_a,
        signed_off_b: p.signed_off_b,
        signed_off_c: p.signed_off_c,
    })
}

/// Link-management row: everything the edit dialog needs to prefill.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkRow {
    pub name: String,
    pub tier: Tier,
    #[serde(with = "venue_wire")]
    pub main_venue: Option<Venue>,
    pub venue_a_name: String,
    pub venue_a_url: String,
    pub venue_b_name: String,
    pub venue_b_url: String,
    pub venue_c_name: String,
    pub venue_c_url: String,
}

/// Grouped link-management view. Same classification as the roster view —
/// the grouping must never diverge between views.
pub fn link_sections(directory: &[PersonRecord], filter: VenueFilter) -> Vec<Section<LinkRow>> {
    let filtered: Vec<&PersonRecord> = directory
        .iter()
        .filter(|p| filter.admits(p.main_venue))
        .collect();
    sections_from_buckets(classify::bucket_directory(filtered, true), |p| LinkRow {
        name: p.name.clone(),
        tier: p.tier,
        main_venue: p.main_venue,
        venue_a_name: p.venue_a_name.clone(),
        venue_a_url: p.venue_a_url.clone(),
        venue_b_name: p.venue_b_name.clone(),
        venue_b_url: p.venue_b_url.clone(),
        venue_c_name: p.venue_c_name.clone(),
        venue_c_url: p.venue_c_url.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(name: &str) -> PersonRecord {
        PersonRecord {
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn entry(name: &str, time: &str) -> ShiftEntry {
        ShiftEntry {
            name: name.to_string(),
            time: time.to_string(),
            status: "present-confirmed".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_unmatched_entry_keeps_placeholders() {
        let merged = merge_today(&[entry("ふゆ", "22:00")], &[], VenueFilter::All);
        assert_eq!(merged.len(), 1);
        assert!(!merged[0].registered);
        assert_eq!(merged[0].venue_a_url, "");
        assert!(!merged[0].signed_off_a);
    }

    #[test]
    fn test_merge_joins_urls_and_ordering_key() {
        // Serial 0.5 normalizes to 12:00 upstream; here the canonical
        // form arrives already.
        let mut p = person("Aiko");
        p.venue_a_url = "https://a.example/aiko".to_string();
        let merged = merge_today(&[entry("Aiko", "12:00")], &[p], VenueFilter::All);
        assert_eq!(merged[0].time, "12:00");
        assert_eq!(merged[0].ordering_key, 720);
        assert!(!merged[0].venue_a_url.is_empty());
        assert!(merged[0].registered);
    }

    #[test]
    fn test_merge_resorts_with_overnight_rule() {
        let shift = vec![entry("あい", "01:00"), entry("みく", "23:30"), entry("るな", "18:00")];
        let merged = merge_today(&shift, &[], VenueFilter::All);
        let names: Vec<&str> = merged.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["るな", "みく", "あい"]);
    }

    #[test]
    fn test_equal_times_break_ties_by_name() {
        let shift = vec![entry("みく", "20:00"), entry("あい", "20:00")];
        let merged = merge_today(&shift, &[], VenueFilter::All);
        let names: Vec<&str> = merged.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["あい", "みく"]);
    }

    #[test]
    fn test_duplicate_directory_names_first_match_wins() {
        let mut first = person("あい");
        first.venue_a_url = "https://a.example/first".to_string();
        let mut second = person("あい");
        second.venue_a_url = "https://a.example/second".to_string();
        let directory = [first, second];
        let found = find_person(&directory, "あい").unwrap();
        assert_eq!(found.venue_a_url, "https://a.example/first");
    }

    #[test]
    fn test_venue_filter_via_directory_main_venue() {
        let mut p = person("あい");
        p.main_venue = Some(Venue::B);
        let directory = vec![p];
        let shift = vec![entry("あい", "20:00"), entry("unregistered", "21:00")];

        let only_b = merge_today(&shift, &directory, VenueFilter::Only(Venue::B));
        assert_eq!(only_b.len(), 1);
        assert_eq!(only_b[0].name, "あい");

        // Unmatched rows surface only under the unfiltered view.
        let all = merge_today(&shift, &directory, VenueFilter::All);
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_directory_urls_override_persisted_copies() {
        let mut p = person("あい");
        p.venue_a_url = "https://a.example/fresh".to_string();
        let mut e = entry("あい", "20:00");
        e.venue_a_url = "https://a.example/stale".to_string();
        e.venue_b_url = "https://b.example/persisted".to_string();
        let merged = merge_today(&[e], &[p], VenueFilter::All);
        assert_eq!(merged[0].venue_a_url, "https://a.example/fresh");
        // No fresh value for venue B — the persisted copy stands in.
        assert_eq!(merged[0].venue_b_url, "https://b.example/persisted");
    }

    #[test]
    fn test_enrich_copies_links_at_upload_time() {
        let mut p = person("あい");
        p.venue_c_url = "https://c.example/ai".to_string();
        let rows = enrich_with_links(vec![entry("あい", "20:00"), entry("みく", "21:00")], &[p]);
        assert_eq!(rows[0].venue_c_url, "https://c.example/ai");
        assert_eq!(rows[1].venue_c_url, "");
    }
}
