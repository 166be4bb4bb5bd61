//! Core data model: the personnel directory, the day's shift set, and the
//! interview log, as they cross the wire to and from the sheet store.
//!
//! Wire structs are flat camelCase with `#[serde(default)]` throughout —
//! the store is a spreadsheet and omits any column that was never written.
//! URLs and labels are always `String` (empty when absent, never null) so
//! the view layer can branch on `is_empty()` alone.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::util;

/// The three external platforms a person may hold a profile link on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Venue {
    A,
    B,
    C,
}

impl Venue {
    pub const ALL: [Venue; 3] = [Venue::A, Venue::B, Venue::C];

    pub fn wire_id(self) -> &'static str {
        match self {
            Venue::A => "a",
            Venue::B => "b",
            Venue::C => "c",
        }
    }

    pub fn from_wire(raw: &str) -> Option<Venue> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "a" => Some(Venue::A),
            "b" => Some(Venue::B),
            "c" => Some(Venue::C),
            _ => None,
        }
    }
}

/// Display-grouping classification. Stored as text in the sheet; anything
/// the wire layer does not recognize collapses to `Default` here, once,
/// so read sites never re-interpret free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Tier {
    Priority,
    Newcomer,
    Staff,
    #[default]
    Default,
}

impl Tier {
    pub fn wire_id(self) -> &'static str {
        match self {
            Tier::Priority => "priority",
            Tier::Newcomer => "newcomer",
            Tier::Staff => "staff",
            Tier::Default => "default",
        }
    }
}

impl From<String> for Tier {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "priority" => Tier::Priority,
            "newcomer" => Tier::Newcomer,
            "staff" => Tier::Staff,
            _ => Tier::Default,
        }
    }
}

impl From<Tier> for String {
    fn from(tier: Tier) -> Self {
        tier.wire_id().to_string()
    }
}

/// Serde helpers for `Option<Venue>` carried as `"a" | "b" | "c" | ""`.
pub mod venue_wire {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::Venue;

    pub fn serialize<S: Serializer>(v: &Option<Venue>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(v.map(Venue::wire_id).unwrap_or(""))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Venue>, D::Error> {
        let raw = String::deserialize(d)?;
        Ok(Venue::from_wire(&raw))
    }
}

/// Serde helpers for optional dates carried as free-text date strings.
/// Empty and unparseable values read back as `None`.
pub mod date_wire {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::util;

    pub fn serialize<S: Serializer>(v: &Option<NaiveDate>, s: S) -> Result<S::Ok, S::Error> {
        match v {
            Some(d) => s.serialize_str(&util::format_date_input(*d)),
            None => s.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
        let raw = String::deserialize(d)?;
        Ok(util::parse_wire_date(&raw))
    }
}

/// One directory entry. `name` is the de facto primary key for every join
/// in the system; it is NFC-normalized on the way in (see [`PersonRecord::normalize`]).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonRecord {
    pub name: String,
    pub tier: Tier,
    pub venue_a_name: String,
    pub venue_a_url: String,
    pub venue_b_name: String,
    pub venue_b_url: String,
    pub venue_c_name: String,
    pub venue_c_url: String,
    /// At most one main venue per person; the edit surface enforces the
    /// exclusivity, validation enforces the matching URL.
    #[serde(with = "venue_wire")]
    pub main_venue: Option<Venue>,
    pub signed_off_a: bool,
    pub signed_off_b: bool,
    pub signed_off_c: bool,
    #[serde(with = "date_wire")]
    pub last_work_date: Option<NaiveDate>,
    #[serde(with = "date_wire")]
    pub last_interview_date: Option<NaiveDate>,
    #[serde(with = "date_wire")]
    pub last_photo_date: Option<NaiveDate>,
    #[serde(with = "date_wire")]
    pub last_video_date: Option<NaiveDate>,
    /// Soft reference to a staff-tier PersonRecord by display name.
    pub interview_staff_name: String,
}

impl PersonRecord {
    pub fn venue_url(&self, venue: Venue) -> &str {
        match venue {
            Venue::A => &self.venue_a_url,
            Venue::B => &self.venue_b_url,
            Venue::C => &self.venue_c_url,
        }
    }

    pub fn venue_label(&self, venue: Venue) -> &str {
        match venue {
            Venue::A => &self.venue_a_name,
            Venue::B => &self.venue_b_name,
            Venue::C => &self.venue_c_name,
        }
    }

    pub fn signed_off(&self, venue: Venue) -> bool {
        match venue {
            Venue::A => self.signed_off_a,
            Venue::B => self.signed_off_b,
            Venue::C => self.signed_off_c,
        }
    }

    pub fn set_signed_off(&mut self, venue: Venue, on: bool) {
        match venue {
            Venue::A => self.signed_off_a = on,
            Venue::B => self.signed_off_b = on,
            Venue::C => self.signed_off_c = on,
        }
    }

    /// Normalize the join keys in place. Applied to everything the
    /// gateway loads and everything an edit submits.
    pub fn normalize(&mut self) {
        self.name = util::name_key(&self.name);
        self.interview_staff_name = util::name_key(&self.interview_staff_name);
    }
}

/// One expected attendee for the day, as parsed from the uploaded sheet
/// and persisted to the store. Per-venue URLs are copied from the matching
/// directory entry at upload time; unmatched entries keep empty strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShiftEntry {
    pub name: String,
    /// Canonical `HH:MM` (see `shift_time::normalize`).
    pub time: String,
    pub status: String,
    pub venue_a_name: String,
    pub venue_a_url: String,
    pub venue_b_name: String,
    pub venue_b_url: String,
    pub venue_c_name: String,
    pub venue_c_url: String,
}

impl ShiftEntry {
    pub fn venue_url(&self, venue: Venue) -> &str {
        match venue {
            Venue::A => &self.venue_a_url,
            Venue::B => &self.venue_b_url,
            Venue::C => &self.venue_c_url,
        }
    }

    pub fn set_venue_url(&mut self, venue: Venue, url: &str) {
        match venue {
            Venue::A => self.venue_a_url = url.to_string(),
            Venue::B => self.venue_b_url = url.to_string(),
            Venue::C => self.venue_c_url = url.to_string(),
        }
    }
}

/// One interview-history row. `row_index` is assigned by the store and is
/// the only handle for update/delete — it is never reassigned locally.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InterviewEntry {
    pub row_index: i64,
    pub name: String,
    pub date: String,
    pub staff_name: String,
    pub comment_text: String,
    pub created_at: String,
}
