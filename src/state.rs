//! Process-wide application state and the user-initiated workflows.
//!
//! The directory, shift set, and comment cache are shared mutable caches.
//! Every load is a full-collection replace-on-success; a failed load logs
//! and leaves the previous snapshot in place, so "no data" is always a
//! recoverable state. There is no mutual exclusion across independent
//! triggers (a poll tick and a user edit can interleave) — last write
//! wins on the caches, which bounds the damage from interleaving but does
//! not eliminate lost updates on individual field edits.

use std::sync::Mutex;

use chrono::{Local, NaiveDate};
use serde::Serialize;

use crate::config::Config;
use crate::error::{EditError, GatewayError, UploadError, ValidationError};
use crate::ingest;
use crate::interviews::{self, CommentCache, FollowupRow};
use crate::roster::{self, LinkRow, MergedShiftRow, RosterCard, Section, VenueFilter};
use crate::store::RemoteStore;
use crate::types::{InterviewEntry, PersonRecord, ShiftEntry, Tier, Venue};
use crate::util;

pub struct AppState {
    pub config: Config,
    store: RemoteStore,
    directory: Mutex<Vec<PersonRecord>>,
    shift: Mutex<Vec<ShiftEntry>>,
    comments: Mutex<CommentCache>,
    shift_date: Mutex<Option<NaiveDate>>,
}

/// Summary returned to the UI after a successful upload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadOutcome {
    pub row_count: usize,
    /// Japanese display form of the recovered shift date, when the file
    /// name carried one.
    pub shift_date: Option<String>,
}

/// Cache counters for the status endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatus {
    pub directory_count: usize,
    pub shift_count: usize,
    pub comment_person_count: usize,
    pub shift_date: Option<String>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, GatewayError> {
        let store = RemoteStore::new(&config.api_url)?;
        Ok(Self {
            config,
            store,
            directory: Mutex::new(Vec::new()),
            shift: Mutex::new(Vec::new()),
            comments: Mutex::new(CommentCache::new()),
            shift_date: Mutex::new(None),
        })
    }

    // --- cache access ---
    //
    // std Mutex guards are never held across an await; callers take a
    // clone and the caches are replaced wholesale on success.

    pub fn directory_snapshot(&self) -> Vec<PersonRecord> {
        self.directory.lock().map(|g| g.clone()).unwrap_or_default()
    }

    pub fn shift_snapshot(&self) -> Vec<ShiftEntry> {
        self.shift.lock().map(|g| g.clone()).unwrap_or_default()
    }

    pub fn shift_date(&self) -> Option<NaiveDate> {
        self.shift_date.lock().map(|g| *g).unwrap_or(None)
    }

    pub(crate) fn set_directory(&self, people: Vec<PersonRecord>) {
        if let Ok(mut guard) = self.directory.lock() {
            *guard = people;
        }
    }

    pub(crate) fn set_shift(&self, rows: Vec<ShiftEntry>) {
        if let Ok(mut guard) = self.shift.lock() {
            *guard = rows;
        }
    }

    pub(crate) fn set_shift_date_local(&self, date: Option<NaiveDate>) {
        if let Ok(mut guard) = self.shift_date.lock() {
            *guard = date;
        }
    }

    pub fn status(&self) -> CacheStatus {
        CacheStatus {
            directory_count: self.directory.lock().map(|g| g.len()).unwrap_or(0),
            shift_count: self.shift.lock().map(|g| g.len()).unwrap_or(0),
            comment_person_count: self
                .comments
                .lock()
                .map(|g| g.person_count())
                .unwrap_or(0),
            shift_date: self.shift_date_display(),
        }
    }

    /// `YYYY年MM月DD日`, or None while no date is known.
    pub fn shift_date_display(&self) -> Option<String> {
        self.shift_date().map(util::format_date_jp)
    }

    // --- loads ---

    /// Refresh every cache. Individual failures are logged and skipped;
    /// whatever loaded replaces its cache, whatever failed keeps the
    /// previous snapshot.
    pub async fn load_all(&self) {
        if let Err(e) = self.refresh_shift().await {
            log::warn!("Shift refresh failed: {e}");
        }
        if let Err(e) = self.refresh_directory().await {
            log::warn!("Directory refresh failed: {e}");
        }
        if let Err(e) = self.refresh_comments().await {
            log::warn!("Interview log refresh failed: {e}");
        }
        if let Err(e) = self.refresh_shift_date().await {
            log::warn!("Shift date refresh failed: {e}");
        }
    }

    pub async fn refresh_shift(&self) -> Result<usize, GatewayError> {
        let rows = self.store.fetch_shift_rows().await?;
        let count = rows.len();
        self.set_shift(rows);
        log::info!("Loaded {count} shift rows");
        Ok(count)
    }

    pub async fn refresh_directory(&self) -> Result<usize, GatewayError> {
        let people = self.store.fetch_directory().await?;
        let count = people.len();
        self.set_directory(people);
        log::info!("Loaded {count} directory entries");
        Ok(count)
    }

    /// Bulk interview-log reload — one round trip for every person, used
    /// at startup and by the follow-up grid render path.
    pub async fn refresh_comments(&self) -> Result<usize, GatewayError> {
        let logs = self.store.fetch_all_interview_logs().await?;
        let count = logs.len();
        if let Ok(mut guard) = self.comments.lock() {
            guard.replace_all(logs);
        }
        log::info!("Loaded interview logs for {count} people");
        Ok(count)
    }

    pub async fn refresh_shift_date(&self) -> Result<(), GatewayError> {
        let date = self.store.fetch_shift_date().await?;
        self.set_shift_date_local(date);
        Ok(())
    }

    // --- views ---

    pub fn today_view(&self, filter: VenueFilter) -> Vec<MergedShiftRow> {
        let shift = self.shift_snapshot();
        let directory = self.directory_snapshot();
        roster::merge_today(&shift, &directory, filter)
    }

    pub fn roster_view(&self, filter: VenueFilter) -> Vec<Section<RosterCard>> {
        let directory = self.directory_snapshot();
        roster::roster_sections(&directory, filter)
    }

    pub fn links_view(&self, filter: VenueFilter) -> Vec<Section<LinkRow>> {
        let directory = self.directory_snapshot();
        roster::link_sections(&directory, filter)
    }

    pub fn followup_view(&self, filter: VenueFilter) -> Vec<Section<FollowupRow>> {
        self.followup_view_at(filter, Local::now().date_naive())
    }

    pub(crate) fn followup_view_at(
        &self,
        filter: VenueFilter,
        today: NaiveDate,
    ) -> Vec<Section<FollowupRow>> {
        let directory = self.directory_snapshot();
        self.comments
            .lock()
            .map(|cache| interviews::followup_sections(&directory, &cache, filter, today))
            .unwrap_or_default()
    }

    pub fn interview_log(&self, name: &str) -> Vec<InterviewEntry> {
        self.comments
            .lock()
            .map(|cache| cache.for_name(name).to_vec())
            .unwrap_or_default()
    }

    // --- workflows ---

    /// Upload workflow: decode → filter/normalize → enrich against the
    /// directory → persist wholesale → reload. Decode and shape failures
    /// abort before anything is sent; partial uploads never happen.
    pub async fn upload_workbook(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
    ) -> Result<UploadOutcome, UploadError> {
        let parsed = ingest::parse_workbook(bytes, file_name)?;

        // A failed directory fetch degrades to an empty directory: every
        // row uploads with placeholders rather than blocking the day.
        let directory = match self.store.fetch_directory().await {
            Ok(people) => {
                self.set_directory(people.clone());
                people
            }
            Err(e) => {
                log::warn!("Directory fetch during upload failed: {e}; uploading without links");
                Vec::new()
            }
        };

        let rows = roster::enrich_with_links(parsed.rows, &directory);
        self.store.replace_shift_rows(&rows).await?;
        log::info!("Uploaded {} shift rows from {file_name:?}", rows.len());

        if let Some(date) = parsed.shift_date {
            self.set_shift_date_local(Some(date));
            if let Err(e) = self.store.set_shift_date(date).await {
                log::warn!("Failed to persist shift date: {e}");
            }
        }

        self.refresh_shift().await?;
        Ok(UploadOutcome {
            row_count: rows.len(),
            shift_date: parsed.shift_date.map(util::format_date_jp),
        })
    }

    /// Save a directory entry. Validation runs before any network call
    /// and a rejected edit leaves every cache untouched.
    pub async fn save_person(
        &self,
        mut person: PersonRecord,
        is_new: bool,
    ) -> Result<String, EditError> {
        person.normalize();
        validate_person(&person)?;

        let message = if is_new {
            self.store.add_person(&person).await?
        } else {
            self.store.update_person(&person).await?
        };
        self.refresh_directory().await?;
        Ok(message)
    }

    pub async fn delete_person(&self, name: &str) -> Result<String, GatewayError> {
        let message = self.store.delete_person(&util::name_key(name)).await?;
        self.refresh_directory().await?;
        Ok(message)
    }

    /// Sign-off toggle: optimistic local flip, then persist. A store
    /// failure is surfaced but the local flip stands — the next reload
    /// reconciles (last write wins).
    pub async fn toggle_sign_off(
        &self,
        name: &str,
        venue: Venue,
        signed_off: bool,
    ) -> Result<(), GatewayError> {
        let key = self.apply_sign_off_local(name, venue, signed_off);
        if let Err(e) = self.store.toggle_sign_off(&key, venue, signed_off).await {
            log::warn!("Sign-off persist failed for {key:?}/{venue:?}: {e}");
            return Err(e);
        }
        Ok(())
    }

    fn apply_sign_off_local(&self, name: &str, venue: Venue, signed_off: bool) -> String {
        let key = util::name_key(name);
        if let Ok(mut guard) = self.directory.lock() {
            if let Some(person) = guard.iter_mut().find(|p| p.name == key) {
                person.set_signed_off(venue, signed_off);
            }
        }
        key
    }

    pub async fn reset_sign_offs(&self) -> Result<String, GatewayError> {
        let message = self.store.reset_sign_offs().await?;
        self.refresh_directory().await?;
        Ok(message)
    }

    /// The "day closed" action: stamp `lastWorkDate` for everyone on
    /// today's shift in one call.
    pub async fn mark_worked(&self, date: Option<NaiveDate>) -> Result<String, GatewayError> {
        let date = date.unwrap_or_else(|| Local::now().date_naive());
        let mut names: Vec<String> = Vec::new();
        for entry in self.shift_snapshot() {
            if !entry.name.is_empty() && !names.contains(&entry.name) {
                names.push(entry.name);
            }
        }
        let message = self.store.mark_worked(&names, date).await?;
        self.refresh_directory().await?;
        Ok(message)
    }

    pub async fn set_shift_date(&self, date: NaiveDate) -> Result<String, GatewayError> {
        let message = self.store.set_shift_date(date).await?;
        self.set_shift_date_local(Some(date));
        Ok(message)
    }

    // --- interview log edits ---
    //
    // Each edit refetches the affected person's list whole instead of
    // patching in place, so locally-held row indices never go stale.

    pub async fn add_interview(&self, mut entry: InterviewEntry) -> Result<String, EditError> {
        entry.name = util::name_key(&entry.name);
        if entry.name.is_empty() {
            return Err(ValidationError::NameRequired.into());
        }
        let message = self.store.add_interview(&entry).await?;
        self.refetch_comments_for(&entry.name).await;
        Ok(message)
    }

    pub async fn update_interview(&self, mut entry: InterviewEntry) -> Result<String, EditError> {
        entry.name = util::name_key(&entry.name);
        if entry.name.is_empty() {
            return Err(ValidationError::NameRequired.into());
        }
        let message = self.store.update_interview(&entry).await?;
        self.refetch_comments_for(&entry.name).await;
        Ok(message)
    }

    pub async fn delete_interview(
        &self,
        row_index: i64,
        name: &str,
    ) -> Result<String, GatewayError> {
        let key = util::name_key(name);
        let message = self.store.delete_interview(row_index, &key).await?;
        self.refetch_comments_for(&key).await;
        Ok(message)
    }

    async fn refetch_comments_for(&self, name: &str) {
        match self.store.fetch_interview_log(name).await {
            Ok(list) => {
                if let Ok(mut guard) = self.comments.lock() {
                    guard.replace_for(name, list);
                }
            }
            Err(e) => log::warn!("Interview log refetch failed for {name:?}: {e}"),
        }
    }
}

/// Directory-edit validation. Runs before any network call.
pub fn validate_person(person: &PersonRecord) -> Result<(), ValidationError> {
    if person.name.trim().is_empty() {
        return Err(ValidationError::NameRequired);
    }
    if let Some(venue) = person.main_venue {
        if person.venue_url(venue).is_empty() {
            return Err(ValidationError::MainVenueWithoutUrl(venue.wire_id()));
        }
    }
    if person.tier == Tier::Priority && person.main_venue.is_none() {
        return Err(ValidationError::PriorityWithoutMainVenue);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> AppState {
        AppState::new(Config {
            api_url: "https://sheets.example/exec".to_string(),
            listen_port: 0,
            poll_interval_minutes: 5,
            poll_on_start: false,
        })
        .unwrap()
    }

    #[test]
    fn test_validate_person_main_venue_needs_url() {
        let person = PersonRecord {
            name: "あい".to_string(),
            main_venue: Some(Venue::A),
            ..Default::default()
        };
        assert!(matches!(
            validate_person(&person),
            Err(ValidationError::MainVenueWithoutUrl("a"))
        ));
    }

    #[test]
    fn test_validate_person_priority_needs_main_venue() {
        let person = PersonRecord {
            name: "ひめ".to_string(),
            tier: Tier::Priority,
            ..Default::default()
        };
        assert!(matches!(
            validate_person(&person),
            Err(ValidationError::PriorityWithoutMainVenue)
        ));
    }

    #[test]
    fn test_validate_person_accepts_complete_record() {
        let person = PersonRecord {
            name: "ひめ".to_string(),
            tier: Tier::Priority,
            main_venue: Some(Venue::B),
            venue_b_url: "https://b.example/hime".to_string(),
            ..Default::default()
        };
        assert!(validate_person(&person).is_ok());
    }

    #[test]
    fn test_today_view_reads_caches() {
        let state = state();
        state.set_shift(vec![ShiftEntry {
            name: "あい".to_string(),
            time: "01:00".to_string(),
            ..Default::default()
        }]);
        state.set_directory(vec![PersonRecord {
            name: "あい".to_string(),
            venue_a_url: "https://a.example/ai".to_string(),
            ..Default::default()
        }]);
        let rows = state.today_view(VenueFilter::All);
        assert_eq!(rows.len(), 1);
        assert!(rows[0].registered);
        assert_eq!(rows[0].ordering_key, 25 * 60);
    }

    #[test]
    fn test_optimistic_sign_off_flips_cache() {
        let state = state();
        state.set_directory(vec![PersonRecord {
            name: "あい".to_string(),
            venue_a_url: "https://a.example/ai".to_string(),
            ..Default::default()
        }]);
        state.apply_sign_off_local("あい", Venue::A, true);
        assert!(state.directory_snapshot()[0].signed_off_a);
    }

    #[test]
    fn test_shift_date_display_is_japanese_form() {
        let state = state();
        state.set_shift_date_local(NaiveDate::from_ymd_opt(2026, 8, 7));
        assert_eq!(
            state.shift_date_display().as_deref(),
            Some("2026年08月07日")
        );
    }
}
