use chrono::NaiveDate;
use unicode_normalization::UnicodeNormalization;

/// Canonical join key for a display name.
///
/// Names arrive from three independent sources (shift sheet, directory,
/// interview log) and the join is exact string equality, so every name is
/// NFC-normalized and trimmed before it is compared or stored.
pub fn name_key(name: &str) -> String {
    name.trim().nfc().collect()
}

/// Parse a date that crossed the wire as free text.
///
/// The store hands back either a bare `YYYY-MM-DD` or a full ISO timestamp
/// depending on how the cell was last written. Only the calendar day
/// matters downstream, so anything after the first ten characters is
/// dropped. Empty or unparseable input is treated as "no date".
pub fn parse_wire_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    // get() rather than a range index: multi-byte text must not panic here.
    let head = s.get(..10)?;
    NaiveDate::parse_from_str(head, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(head, "%Y/%m/%d"))
        .ok()
}

/// `2026年08月07日` — on-screen Japanese display of the shift date.
pub fn format_date_jp(date: NaiveDate) -> String {
    date.format("%Y年%m月%d日").to_string()
}

/// `2026/08/07` — on-screen display of individual record dates.
pub fn format_date_slash(date: NaiveDate) -> String {
    date.format("%Y/%m/%d").to_string()
}

/// `2026-08-07` — value format for editable date inputs.
pub fn format_date_input(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_key_trims_and_normalizes() {
        assert_eq!(name_key("  あい "), "あい");
        // A decomposed voiced kana (か + combining dakuten) folds to the
        // precomposed form.
        assert_eq!(name_key("か\u{3099}な"), "がな");
    }

    #[test]
    fn test_parse_wire_date_bare() {
        assert_eq!(
            parse_wire_date("2026-08-07"),
            NaiveDate::from_ymd_opt(2026, 8, 7)
        );
    }

    #[test]
    fn test_parse_wire_date_timestamp() {
        assert_eq!(
            parse_wire_date("2026-08-07T15:00:00.000Z"),
            NaiveDate::from_ymd_opt(2026, 8, 7)
        );
    }

    #[test]
    fn test_parse_wire_date_slash_form() {
        assert_eq!(
            parse_wire_date("2026/08/07"),
            NaiveDate::from_ymd_opt(2026, 8, 7)
        );
    }

    #[test]
    fn test_parse_wire_date_rejects_junk() {
        assert_eq!(parse_wire_date(""), None);
        assert_eq!(parse_wire_date("yesterday"), None);
        assert_eq!(parse_wire_date("08-07"), None);
    }

    #[test]
    fn test_display_formats() {
        let d = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        assert_eq!(format_date_jp(d), "2026年01月05日");
        assert_eq!(format_date_slash(d), "2026/01/05");
        assert_eq!(format_date_input(d), "2026-01-05");
    }
}
