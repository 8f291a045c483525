//! Error types for the Rota engine.

use crate::{OccurrenceId, SeriesId, ShiftId};
use chrono::NaiveDate;
use thiserror::Error;

/// All possible errors from the Rota engine.
///
/// The occurrence id codec itself never fails (probing call sites get
/// `None`); these errors surface when a caller *requires* a decoded id or a
/// resolved series and cannot proceed without one.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("malformed occurrence id: {0:?}")]
    MalformedOccurrenceId(String),

    #[error("no series in shift {shift_id} covers {date}")]
    OccurrenceUnreachable { shift_id: ShiftId, date: NaiveDate },

    #[error("series index {index} out of bounds for {len} series")]
    SeriesIndexOutOfBounds { index: usize, len: usize },

    #[error("detach seed required to move occurrence {0}")]
    DetachSeedRequired(OccurrenceId),

    #[error("series id seed required to split series {0}")]
    SplitSeedRequired(SeriesId),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = Error::MalformedOccurrenceId("not-an-id".into());
        assert_eq!(err.to_string(), "malformed occurrence id: \"not-an-id\"");

        let err = Error::OccurrenceUnreachable {
            shift_id: "shift_1".into(),
            date: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
        };
        assert_eq!(
            err.to_string(),
            "no series in shift shift_1 covers 2024-04-01"
        );

        let err = Error::SeriesIndexOutOfBounds { index: 3, len: 2 };
        assert_eq!(err.to_string(), "series index 3 out of bounds for 2 series");
    }
}
