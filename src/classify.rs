//! Display classification: tier buckets and gojūon initial grouping.
//!
//! Three views group personnel (full roster, follow-up tracking, link
//! management) and all of them call into this module, so bucket
//! boundaries and ordering can never drift between views.

use serde::Serialize;
use unicode_normalization::UnicodeNormalization;

use crate::types::{PersonRecord, Tier};

/// Gojūon rows for initial grouping, in display order. Voiced and
/// semi-voiced variants group with their base row.
const KANA_GROUPS: [(&str, &[char]); 10] = [
    ("あ", &['あ', 'い', 'う', 'え', 'お']),
    (
        "か",
        &['か', 'き', 'く', 'け', 'こ', 'が', 'ぎ', 'ぐ', 'げ', 'ご'],
    ),
    (
        "さ",
        &['さ', 'し', 'す', 'せ', 'そ', 'ざ', 'じ', 'ず', 'ぜ', 'ぞ'],
    ),
    (
        "た",
        &['た', 'ち', 'つ', 'て', 'と', 'だ', 'ぢ', 'づ', 'で', 'ど'],
    ),
    ("な", &['な', 'に', 'ぬ', 'ね', 'の']),
    (
        "は",
        &[
            'は', 'ひ', 'ふ', 'へ', 'ほ', 'ば', 'び', 'ぶ', 'べ', 'ぼ', 'ぱ', 'ぴ', 'ぷ', 'ぺ',
            'ぽ',
        ],
    ),
    ("ま", &['ま', 'み', 'む', 'め', 'も']),
    ("や", &['や', 'ゆ', 'よ']),
    ("ら", &['ら', 'り', 'る', 'れ', 'ろ']),
    ("わ", &['わ', 'を', 'ん']),
];

/// Catch-all group for initials outside the kana table, appended last.
pub const OTHER_GROUP: &str = "その他";

/// Fold a katakana character to its hiragana counterpart so both scripts
/// land in the same gojūon row. Everything else passes through.
fn fold_kana(c: char) -> char {
    match c {
        'ァ'..='ヶ' => char::from_u32(c as u32 - 0x60).unwrap_or(c),
        _ => c,
    }
}

/// Collation key: NFC + kana folding, compared by code point. The
/// hiragana block is laid out in gojūon order, which matches how the
/// sheets sort Japanese names.
pub fn sort_key(name: &str) -> String {
    name.nfc().map(fold_kana).collect()
}

/// Locale-aware name ordering used everywhere two names are compared.
pub fn compare_names(a: &str, b: &str) -> std::cmp::Ordering {
    sort_key(a).cmp(&sort_key(b)).then_with(|| a.cmp(b))
}

/// The gojūon group label for a name, from its first character.
pub fn kana_group(name: &str) -> &'static str {
    let Some(first) = name.nfc().next().map(fold_kana) else {
        return OTHER_GROUP;
    };
    KANA_GROUPS
        .iter()
        .find(|(_, members)| members.contains(&first))
        .map(|(label, _)| *label)
        .unwrap_or(OTHER_GROUP)
}

/// What a display bucket holds, for renderers that style by kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BucketKind {
    Priority,
    Newcomer,
    Kana,
    Staff,
}

/// One display section of a grouped view, in final render order.
#[derive(Debug)]
pub struct Bucket<'a> {
    pub kind: BucketKind,
    pub label: String,
    pub members: Vec<&'a PersonRecord>,
}

/// Bucket a filtered directory slice for display.
///
/// Output order is fixed: priority, newcomer, then the default tier split
/// into gojūon sections (empty sections skipped, catch-all last), then —
/// only when `staff_bucket` is set — staff as the always-last bucket.
/// When the view has no staff bucket, staff rows fall through to the
/// default tier like any other unrecognized classification.
pub fn bucket_directory<'a>(
    people: Vec<&'a PersonRecord>,
    staff_bucket: bool,
) -> Vec<Bucket<'a>> {
    let mut priority: Vec<&PersonRecord> = Vec::new();
    let mut newcomer: Vec<&PersonRecord> = Vec::new();
    let mut staff: Vec<&PersonRecord> = Vec::new();
    let mut default: Vec<&PersonRecord> = Vec::new();

    for person in people {
        match person.tier {
            Tier::Priority => priority.push(person),
            Tier::Newcomer => newcomer.push(person),
            Tier::Staff if staff_bucket => staff.push(person),
            Tier::Staff | Tier::Default => default.push(person),
        }
    }

    for group in [&mut priority, &mut newcomer, &mut staff, &mut default] {
        group.sort_by(|a, b| compare_names(&a.name, &b.name));
    }

    let mut buckets = Vec::new();
    if !priority.is_empty() {
        buckets.push(Bucket {
            kind: BucketKind::Priority,
            label: Tier::Priority.wire_id().to_string(),
            members: priority,
        });
    }
    if !newcomer.is_empty() {
        buckets.push(Bucket {
            kind: BucketKind::Newcomer,
            label: Tier::Newcomer.wire_id().to_string(),
            members: newcomer,
        });
    }

    // Default tier: stable-partition the name-sorted members into gojūon
    // sections so each section stays internally sorted.
    for label in KANA_GROUPS.iter().map(|(label, _)| *label).chain([OTHER_GROUP]) {
        let members: Vec<&PersonRecord> = default
            .iter()
            .copied()
            .filter(|p| kana_group(&p.name) == label)
            .collect();
        if !members.is_empty() {
            buckets.push(Bucket {
                kind: BucketKind::Kana,
                label: format!("{label}行"),
                members,
            });
        }
    }

    if !staff.is_empty() {
        buckets.push(Bucket {
            kind: BucketKind::Staff,
            label: Tier::Staff.wire_id().to_string(),
            members: staff,
        });
    }

    buckets
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(name: &str, tier: Tier) -> PersonRecord {
        PersonRecord {
            name: name.to_string(),
            tier,
            ..Default::default()
        }
    }

    #[test]
    fn test_kana_group_base_and_voiced() {
        assert_eq!(kana_group("かな"), "か");
        assert_eq!(kana_group("きりこ"), "か");
        assert_eq!(kana_group("ぐみ"), "か");
        assert_eq!(kana_group("ばら"), "は");
        assert_eq!(kana_group("ぱる"), "は");
    }

    #[test]
    fn test_kana_group_folds_katakana() {
        assert_eq!(kana_group("カナ"), "か");
        assert_eq!(kana_group("リコ"), "ら");
    }

    #[test]
    fn test_kana_group_other_for_non_kana() {
        assert_eq!(kana_group("Momo"), OTHER_GROUP);
        assert_eq!(kana_group("雅"), OTHER_GROUP);
        assert_eq!(kana_group(""), OTHER_GROUP);
    }

    #[test]
    fn test_priority_bucket_wins_over_name() {
        let people = vec![person("かな", Tier::Priority)];
        let buckets = bucket_directory(people.iter().collect(), true);
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].kind, BucketKind::Priority);
    }

    #[test]
    fn test_bucket_order_and_empty_group_skipping() {
        let people = vec![
            person("まり", Tier::Default),
            person("あい", Tier::Default),
            person("ひめ", Tier::Priority),
            person("Zoe", Tier::Default),
            person("ふた", Tier::Newcomer),
            person("てん", Tier::Staff),
        ];
        let buckets = bucket_directory(people.iter().collect(), true);
        let labels: Vec<&str> = buckets.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["priority", "newcomer", "あ行", "ま行", "その他行", "staff"]
        );
    }

    #[test]
    fn test_staff_folds_into_default_without_staff_bucket() {
        let people = vec![person("てん", Tier::Staff)];
        let buckets = bucket_directory(people.iter().collect(), false);
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].kind, BucketKind::Kana);
        assert_eq!(buckets[0].label, "た行");
    }

    #[test]
    fn test_members_sorted_by_gojuon_within_bucket() {
        let people = vec![
            person("ゆめ", Tier::Default),
            person("やよい", Tier::Default),
            person("ヨル", Tier::Default),
        ];
        let buckets = bucket_directory(people.iter().collect(), true);
        let names: Vec<&str> = buckets[0].members.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["やよい", "ゆめ", "ヨル"]);
    }
}
