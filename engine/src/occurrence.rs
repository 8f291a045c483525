//! Occurrence identity and per-occurrence override records.
//!
//! A shift occurrence has a composite identity derived from the shift and the
//! date its recurrence rule generates: `shiftId---yyyy-mm-dd`. Once an edit
//! moves the occurrence off its rule-derived date (or two occurrences would
//! otherwise share a date), the identity gains a third, opaque segment that
//! stays with the occurrence for the rest of its life:
//! `shiftId---yyyy-mm-dd---detachedId`. The date segment always reflects the
//! current effective date, so the id alone locates the owning series.
//!
//! [`decode_occurrence_id`] is deliberately non-throwing: call sites probe
//! optional ids all the time, and a `None` keeps them simple.

use crate::position::{Position, PositionSetUpdate};
use crate::{OccurrenceId, ShiftId};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Segment separator inside an occurrence id.
pub const OCCURRENCE_ID_DELIM: &str = "---";

const DATE_FMT: &str = "%Y-%m-%d";

/// The decoded segments of an occurrence id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OccurrenceIdParts {
    /// Owning shift
    pub shift_id: ShiftId,
    /// Current effective date of the occurrence
    pub date: NaiveDate,
    /// Opaque suffix, present once the occurrence has been detached
    pub detached_id: Option<String>,
}

impl OccurrenceIdParts {
    /// Whether the id carries a detached suffix.
    pub fn is_detached(&self) -> bool {
        self.detached_id.is_some()
    }
}

/// Build an occurrence id from its parts.
pub fn encode_occurrence_id(
    shift_id: &str,
    date: NaiveDate,
    detached_id: Option<&str>,
) -> OccurrenceId {
    let date = date.format(DATE_FMT);
    match detached_id {
        Some(suffix) => format!("{shift_id}{OCCURRENCE_ID_DELIM}{date}{OCCURRENCE_ID_DELIM}{suffix}"),
        None => format!("{shift_id}{OCCURRENCE_ID_DELIM}{date}"),
    }
}

/// Split an occurrence id into its parts.
///
/// Returns `None` for empty or malformed input instead of failing; callers
/// that cannot proceed without the parts map the `None` to
/// [`Error::MalformedOccurrenceId`](crate::Error::MalformedOccurrenceId).
pub fn decode_occurrence_id(id: &str) -> Option<OccurrenceIdParts> {
    if id.is_empty() {
        return None;
    }

    let segments: Vec<&str> = id.split(OCCURRENCE_ID_DELIM).collect();
    let (shift_id, date_str, detached_id) = match segments.as_slice() {
        [shift_id, date_str] => (*shift_id, *date_str, None),
        [shift_id, date_str, detached] if !detached.is_empty() => {
            (*shift_id, *date_str, Some((*detached).to_string()))
        }
        _ => return None,
    };

    let date = NaiveDate::parse_from_str(date_str, DATE_FMT).ok()?;
    Some(OccurrenceIdParts {
        shift_id: shift_id.to_string(),
        date,
        detached_id,
    })
}

/// A daily time window, independent of any particular date.
///
/// An `end` at or before `start` means the window crosses midnight and ends
/// on the following day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeOfDayRange {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeOfDayRange {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// Anchor the window on a concrete date.
    pub fn on_date(&self, date: NaiveDate) -> DateTimeRange {
        let end_date = if self.end > self.start {
            date
        } else {
            date.succ_opt().unwrap_or(date)
        };
        DateTimeRange {
            start: date.and_time(self.start),
            end: end_date.and_time(self.end),
        }
    }
}

/// A concrete start/end instant pair for one occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateTimeRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

/// Scalar replacements for one occurrence.
///
/// One `Option` field per replaceable scalar; a populated `start_date` is the
/// one change that can alter the occurrence's derived identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OccurrencePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub time: Option<TimeOfDayRange>,
}

impl OccurrencePatch {
    /// Overwrite each populated field of `self` from `other`.
    ///
    /// Last-merge-wins per field; absent fields in `other` leave `self`
    /// untouched.
    pub fn merge(&mut self, other: &OccurrencePatch) {
        if let Some(title) = &other.title {
            self.title = Some(title.clone());
        }
        if let Some(description) = &other.description {
            self.description = Some(description.clone());
        }
        if let Some(start_date) = other.start_date {
            self.start_date = Some(start_date);
        }
        if let Some(time) = other.time {
            self.time = Some(time);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.start_date.is_none()
            && self.time.is_none()
    }
}

/// Minimal override record for one occurrence of a shift.
///
/// Stored on the owning series, keyed by the occurrence id — undetached ids
/// in `projected_diffs`, full detached ids in `detached_diffs`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftOccurrenceDiff {
    pub id: OccurrenceId,
    pub shift_id: ShiftId,
    pub patch: OccurrencePatch,
    pub position_updates: PositionSetUpdate,
}

impl ShiftOccurrenceDiff {
    /// Create an empty override for the given occurrence.
    pub fn new(id: impl Into<OccurrenceId>, shift_id: impl Into<ShiftId>) -> Self {
        Self {
            id: id.into(),
            shift_id: shift_id.into(),
            patch: OccurrencePatch::default(),
            position_updates: PositionSetUpdate::default(),
        }
    }
}

/// One displayable occurrence, computed from the owning series and any
/// override filed for its id. Never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftOccurrence {
    pub id: OccurrenceId,
    pub shift_id: ShiftId,
    pub title: String,
    pub description: String,
    pub positions: Vec<Position>,
    pub when: DateTimeRange,
    pub chat_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn encode_projected_id() {
        let id = encode_occurrence_id("shift_1", date(2024, 4, 1), None);
        assert_eq!(id, "shift_1---2024-04-01");
    }

    #[test]
    fn encode_detached_id() {
        let id = encode_occurrence_id("shift_1", date(2024, 4, 1), Some("d4f2"));
        assert_eq!(id, "shift_1---2024-04-01---d4f2");
    }

    #[test]
    fn decode_projected_id() {
        let parts = decode_occurrence_id("shift_1---2024-04-01").unwrap();
        assert_eq!(parts.shift_id, "shift_1");
        assert_eq!(parts.date, date(2024, 4, 1));
        assert_eq!(parts.detached_id, None);
        assert!(!parts.is_detached());
    }

    #[test]
    fn decode_detached_id() {
        let parts = decode_occurrence_id("shift_1---2024-04-01---d4f2").unwrap();
        assert_eq!(parts.shift_id, "shift_1");
        assert_eq!(parts.date, date(2024, 4, 1));
        assert_eq!(parts.detached_id.as_deref(), Some("d4f2"));
        assert!(parts.is_detached());
    }

    #[test]
    fn decode_empty_is_none() {
        assert_eq!(decode_occurrence_id(""), None);
    }

    #[test]
    fn decode_malformed_is_none() {
        assert_eq!(decode_occurrence_id("no-delimiter"), None);
        assert_eq!(decode_occurrence_id("shift_1---not-a-date"), None);
        assert_eq!(decode_occurrence_id("shift_1---2024-04-01---"), None);
        assert_eq!(decode_occurrence_id("a---2024-04-01---b---c"), None);
    }

    #[test]
    fn roundtrip_both_shapes() {
        for detached in [None, Some("suffix_9")] {
            let id = encode_occurrence_id("shift_7", date(2025, 12, 31), detached);
            let parts = decode_occurrence_id(&id).unwrap();
            assert_eq!(parts.shift_id, "shift_7");
            assert_eq!(parts.date, date(2025, 12, 31));
            assert_eq!(parts.detached_id.as_deref(), detached);
        }
    }

    #[test]
    fn time_range_same_day() {
        let range = TimeOfDayRange::new(
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
        );
        let when = range.on_date(date(2024, 4, 1));
        assert_eq!(when.start.date(), date(2024, 4, 1));
        assert_eq!(when.end.date(), date(2024, 4, 1));
    }

    #[test]
    fn time_range_overnight() {
        let range = TimeOfDayRange::new(
            NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
        );
        let when = range.on_date(date(2024, 4, 1));
        assert_eq!(when.start.date(), date(2024, 4, 1));
        assert_eq!(when.end.date(), date(2024, 4, 2));
    }

    #[test]
    fn patch_merge_last_wins_per_field() {
        let mut patch = OccurrencePatch {
            title: Some("first".into()),
            description: Some("keep".into()),
            ..Default::default()
        };
        patch.merge(&OccurrencePatch {
            title: Some("second".into()),
            start_date: Some(date(2024, 5, 1)),
            ..Default::default()
        });

        assert_eq!(patch.title.as_deref(), Some("second"));
        assert_eq!(patch.description.as_deref(), Some("keep"));
        assert_eq!(patch.start_date, Some(date(2024, 5, 1)));
        assert_eq!(patch.time, None);
    }

    #[test]
    fn diff_serialization_roundtrip() {
        let mut diff = ShiftOccurrenceDiff::new("shift_1---2024-04-01", "shift_1");
        diff.patch.title = Some("Covered".into());

        let json = serde_json::to_string(&diff).unwrap();
        assert!(json.contains("shiftId"));
        assert!(json.contains("positionUpdates"));

        let parsed: ShiftOccurrenceDiff = serde_json::from_str(&json).unwrap();
        assert_eq!(diff, parsed);
    }

    // Property-based tests using proptest
    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        fn arb_date() -> impl Strategy<Value = NaiveDate> {
            (2000i32..2100, 1u32..=12, 1u32..=28)
                .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap())
        }

        proptest! {
            #[test]
            fn prop_roundtrip(
                shift_id in "[a-z0-9_]{1,12}",
                date in arb_date(),
                detached in proptest::option::of("[a-z0-9]{1,8}"),
            ) {
                let id = encode_occurrence_id(&shift_id, date, detached.as_deref());
                let parts = decode_occurrence_id(&id).unwrap();
                prop_assert_eq!(parts.shift_id, shift_id);
                prop_assert_eq!(parts.date, date);
                prop_assert_eq!(parts.detached_id, detached);
            }
        }
    }
}
