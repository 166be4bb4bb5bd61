//! Attendance workbook ingestion.
//!
//! The upload is a tabular export from the scheduling tool. Only rows
//! whose status is on the retained allow-list survive; retained rows map
//! to [`ShiftEntry`] with the start time normalized at this boundary, and
//! come out sorted by the business-day ordering key. Any shape problem is
//! fatal to the whole upload — nothing is persisted after a partial parse.

use std::io::Cursor;
use std::sync::OnceLock;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use chrono::NaiveDate;
use regex::Regex;

use crate::classify;
use crate::error::IngestError;
use crate::types::{ShiftEntry, Venue};
use crate::{shift_time, util};

/// Attendance statuses that put a row on today's roster. Everything else
/// (day off, cancelled, on hold) is logged and dropped.
const RETAINED_STATUSES: &[&str] = &["present-confirmed"];

const COL_NAME: &str = "name";
const COL_TIME: &str = "time";
const COL_STATUS: &str = "status";
const VENUE_COLS: [(&str, Venue); 3] = [
    ("venueA", Venue::A),
    ("venueB", Venue::B),
    ("venueC", Venue::C),
];

/// Result of decoding one uploaded workbook.
#[derive(Debug)]
pub struct ParsedUpload {
    pub rows: Vec<ShiftEntry>,
    /// Shift date recovered from a `YYYYMMDD` run in the file name, when
    /// present.
    pub shift_date: Option<NaiveDate>,
}

/// Decode an uploaded workbook from its raw bytes.
pub fn parse_workbook(bytes: Vec<u8>, file_name: &str) -> Result<ParsedUpload, IngestError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| IngestError::Decode(e.to_string()))?;
    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(IngestError::NoSheet)?;
    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|e| IngestError::Decode(e.to_string()))?;

    let rows = entries_from_rows(range.rows())?;
    Ok(ParsedUpload {
        rows,
        shift_date: shift_date_from_file_name(file_name),
    })
}

/// Map raw sheet rows (header row first) to sorted shift entries.
fn entries_from_rows<'a, I>(mut rows: I) -> Result<Vec<ShiftEntry>, IngestError>
where
    I: Iterator<Item = &'a [Data]>,
{
    let header = rows.next().ok_or(IngestError::NoSheet)?;
    let columns: Vec<String> = header.iter().map(cell_to_string).collect();
    let col = |name: &'static str| -> Result<usize, IngestError> {
        columns
            .iter()
            .position(|c| c.trim() == name)
            .ok_or(IngestError::MissingColumn(name))
    };

    let name_col = col(COL_NAME)?;
    let time_col = col(COL_TIME)?;
    let status_col = col(COL_STATUS)?;
    // Venue name-hint columns are optional; exports older than the
    // three-venue era omit them.
    let venue_cols: Vec<(usize, Venue)> = VENUE_COLS
        .iter()
        .filter_map(|(header_name, venue)| {
            columns
                .iter()
                .position(|c| c.trim() == *header_name)
                .map(|idx| (idx, *venue))
        })
        .collect();

    fn cell(row: &[Data], idx: usize) -> String {
        row.get(idx).map(cell_to_string).unwrap_or_default()
    }

    let mut entries = Vec::new();
    for row in rows {
        let status = cell(row, status_col);
        let name = util::name_key(&cell(row, name_col));
        if !RETAINED_STATUSES.contains(&status.trim()) {
            log::debug!("Filtered out {name:?} with status {status:?}");
            continue;
        }

        let time = row
            .get(time_col)
            .map(normalize_time_cell)
            .unwrap_or_default();

        let mut entry = ShiftEntry {
            name,
            time,
            status,
            ..Default::default()
        };
        for (idx, venue) in &venue_cols {
            let hint = cell(row, *idx);
            match venue {
                Venue::A => entry.venue_a_name = hint,
                Venue::B => entry.venue_b_name = hint,
                Venue::C => entry.venue_c_name = hint,
            }
        }
        entries.push(entry);
    }

    if entries.is_empty() {
        return Err(IngestError::NoRetainedRows);
    }

    entries.sort_by(|a, b| {
        shift_time::ordering_key(&a.time)
            .cmp(&shift_time::ordering_key(&b.time))
            .then_with(|| classify::compare_names(&a.name, &b.name))
    });
    Ok(entries)
}

/// Canonicalize one time cell, whatever the export encoded it as.
fn normalize_time_cell(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::Float(f) => shift_time::normalize_serial(*f),
        Data::Int(i) => shift_time::normalize_serial(*i as f64),
        Data::DateTime(dt) => shift_time::normalize_serial(dt.as_f64()),
        Data::String(s) | Data::DateTimeIso(s) => shift_time::normalize_str(s),
        other => shift_time::normalize_str(&cell_to_string(other)),
    }
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(n) => n.to_string(),
        Data::Float(f) => format!("{}", f),
        Data::Bool(b) => b.to_string(),
        Data::Error(e) => format!("#ERR({:?})", e),
        Data::DateTime(dt) => format!("{}", dt),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
    }
}

/// Extract the shift date from the uploaded file's name.
///
/// Exports are named like `roster_20260807.xlsx`; the first valid
/// `YYYYMMDD` run wins. No match leaves the stored date untouched.
pub fn shift_date_from_file_name(file_name: &str) -> Option<NaiveDate> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let re = PATTERN.get_or_init(|| Regex::new(r"(\d{4})(\d{2})(\d{2})").expect("valid regex"));
    for caps in re.captures_iter(file_name) {
        let year: i32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let day: u32 = caps[3].parse().ok()?;
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            return Some(date);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(text: &str) -> Data {
        Data::String(text.to_string())
    }

    fn header() -> Vec<Data> {
        vec![
            s("name"),
            s("time"),
            s("status"),
            s("venueA"),
            s("venueB"),
            s("venueC"),
        ]
    }

    fn parse(rows: &[Vec<Data>]) -> Result<Vec<ShiftEntry>, IngestError> {
        entries_from_rows(rows.iter().map(|r| r.as_slice()))
    }

    #[test]
    fn test_retains_only_allow_listed_statuses() {
        let rows = vec![
            header(),
            vec![s("あい"), s("20:00"), s("present-confirmed")],
            vec![s("みく"), s("21:00"), s("day-off")],
            vec![s("るな"), s("19:00"), s("cancelled")],
        ];
        let entries = parse(&rows).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "あい");
    }

    #[test]
    fn test_serial_time_and_ordering() {
        let rows = vec![
            header(),
            vec![s("あい"), Data::Float(0.5), s("present-confirmed")],
            // 01:00 — late-night carry-over, must sort last.
            vec![s("みく"), s("1:00"), s("present-confirmed")],
            vec![s("るな"), s("23:30"), s("present-confirmed")],
        ];
        let entries = parse(&rows).unwrap();
        assert_eq!(entries[0].time, "12:00");
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["あい", "るな", "みく"]);
    }

    #[test]
    fn test_venue_hints_are_captured() {
        let rows = vec![
            header(),
            vec![
                s("あい"),
                s("20:00"),
                s("present-confirmed"),
                s("アイ"),
                s(""),
                s("愛"),
            ],
        ];
        let entries = parse(&rows).unwrap();
        assert_eq!(entries[0].venue_a_name, "アイ");
        assert_eq!(entries[0].venue_b_name, "");
        assert_eq!(entries[0].venue_c_name, "愛");
    }

    #[test]
    fn test_missing_required_column_is_fatal() {
        let rows = vec![
            vec![s("name"), s("status")],
            vec![s("あい"), s("present-confirmed")],
        ];
        assert!(matches!(
            parse(&rows),
            Err(IngestError::MissingColumn("time"))
        ));
    }

    #[test]
    fn test_all_rows_filtered_is_fatal() {
        let rows = vec![header(), vec![s("あい"), s("20:00"), s("day-off")]];
        assert!(matches!(parse(&rows), Err(IngestError::NoRetainedRows)));
    }

    #[test]
    fn test_upload_row_flows_into_merged_view() {
        use crate::roster::{self, VenueFilter};
        use crate::types::PersonRecord;

        let rows = vec![
            header(),
            vec![s("Aiko"), Data::Float(0.5), s("present-confirmed")],
        ];
        let entries = parse(&rows).unwrap();

        let person = PersonRecord {
            name: "Aiko".to_string(),
            venue_a_url: "https://a.example/aiko".to_string(),
            ..Default::default()
        };
        let enriched = roster::enrich_with_links(entries, std::slice::from_ref(&person));
        assert_eq!(enriched[0].venue_a_url, "https://a.example/aiko");

        let merged = roster::merge_today(&enriched, &[person], VenueFilter::All);
        assert_eq!(merged[0].time, "12:00");
        assert_eq!(merged[0].ordering_key, 720);
        assert!(!merged[0].venue_a_url.is_empty());
    }

    #[test]
    fn test_shift_date_from_file_name() {
        assert_eq!(
            shift_date_from_file_name("roster_20260807.xlsx"),
            NaiveDate::from_ymd_opt(2026, 8, 7)
        );
        assert_eq!(shift_date_from_file_name("roster_today.xlsx"), None);
        // An eight-digit run that is not a calendar date is not a match.
        assert_eq!(shift_date_from_file_name("export_20269999.xlsx"), None);
    }
}
