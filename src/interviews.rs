//! Interview history: the per-person comment cache and the follow-up view.
//!
//! The store returns each person's entries newest-first and the cache
//! preserves that order without re-sorting — index 0 is "latest", the rest
//! is history. After any single add/update/delete the affected person's
//! list is refetched whole rather than patched, so `rowIndex` handles
//! never go stale locally.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::alerts::{self, AlertPair};
use crate::classify;
use crate::roster::{sections_from_buckets, Section, VenueFilter};
use crate::types::{venue_wire, InterviewEntry, PersonRecord, Tier, Venue};
use crate::util;

/// In-memory mirror of the interview log, keyed by person name.
#[derive(Debug, Default)]
pub struct CommentCache {
    entries: HashMap<String, Vec<InterviewEntry>>,
}

impl CommentCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole cache from a bulk fetch.
    pub fn replace_all(&mut self, entries: HashMap<String, Vec<InterviewEntry>>) {
        self.entries = entries;
    }

    /// Replace one person's list after a per-name refetch. An empty list
    /// simply drops the key — a person whose last comment was deleted is
    /// indistinguishable from one who never had any.
    pub fn replace_for(&mut self, name: &str, list: Vec<InterviewEntry>) {
        let key = util::name_key(name);
        if list.is_empty() {
            self.entries.remove(&key);
        } else {
            self.entries.insert(key, list);
        }
    }

    pub fn remove(&mut self, name: &str) {
        self.entries.remove(&util::name_key(name));
    }

    pub fn for_name(&self, name: &str) -> &[InterviewEntry] {
        self.entries
            .get(&util::name_key(name))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The newest entry, if any.
    pub fn latest(&self, name: &str) -> Option<&InterviewEntry> {
        self.for_name(name).first()
    }

    /// Everything but the newest entry.
    pub fn history(&self, name: &str) -> &[InterviewEntry] {
        let all = self.for_name(name);
        if all.is_empty() {
            &[]
        } else {
            &all[1..]
        }
    }

    pub fn person_count(&self) -> usize {
        self.entries.len()
    }
}

/// One row of the follow-up view: directory dates, both staleness
/// signals, and the latest interview note.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowupRow {
    pub name: String,
    pub tier: Tier,
    #[serde(with = "venue_wire")]
    pub main_venue: Option<Venue>,
    /// Display dates (`YYYY/MM/DD`, empty when unset).
    pub last_work_date: String,
    pub last_interview_date: String,
    pub last_photo_date: String,
    pub last_video_date: String,
    pub days_since_work: Option<i64>,
    pub days_since_interview: Option<i64>,
    pub alerts: AlertPair,
    pub interview_staff_name: String,
    pub latest: Option<InterviewEntry>,
    pub history_count: usize,
}

fn display_date(date: Option<NaiveDate>) -> String {
    date.map(util::format_date_slash).unwrap_or_default()
}

/// Grouped follow-up view. This view has no staff bucket: staff names
/// classify into the default tier like any other non-priority entry.
pub fn followup_sections(
    directory: &[PersonRecord],
    cache: &CommentCache,
    filter: VenueFilter,
    today: NaiveDate,
) -> Vec<Section<FollowupRow>> {
    let filtered: Vec<&PersonRecord> = directory
        .iter()
        .filter(|p| filter.admits(p.main_venue))
        .collect();
    sections_from_buckets(classify::bucket_directory(filtered, false), |p| {
        FollowupRow {
            name: p.name.clone(),
            tier: p.tier,
            main_venue: p.main_venue,
            last_work_date: display_date(p.last_work_date),
            last_interview_date: display_date(p.last_interview_date),
            last_photo_date: display_date(p.last_photo_date),
            last_video_date: display_date(p.last_video_date),
            days_since_work: p.last_work_date.map(|d| alerts::days_since(d, today)),
            days_since_interview: p.last_interview_date.map(|d| alerts::days_since(d, today)),
            alerts: alerts::evaluate(p, today),
            interview_staff_name: p.interview_staff_name.clone(),
            latest: cache.latest(&p.name).cloned(),
            history_count: cache.history(&p.name).len(),
        }
    })
}
