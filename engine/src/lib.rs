//! # Rota Engine
//!
//! A deterministic diff/merge engine for offline-tolerant shift scheduling.
//!
//! This crate provides the core logic for accumulating local edits to shift
//! schedules and keyed collections against an unsynced server baseline, and
//! for projecting a displayable view out of canonical data plus pending
//! diffs. The same inputs always produce the same outputs.
//!
//! ## Design Principles
//!
//! - **No IO**: the engine has no knowledge of files, network, platform, or
//!   the system clock
//! - **Diffs, not mutations**: edits are expressed as diff structures that
//!   merge, cancel, and project; canonical state is only touched through them
//! - **No randomness**: unique ids (detached suffixes, cloned series ids)
//!   are supplied by the caller
//! - **Testable**: pure logic, no mocks needed
//!
//! ## Core Concepts
//!
//! ### Collection diffs
//!
//! [`ArrayCollectionUpdate`] describes a change to an id-keyed collection as
//! added and removed items. Merging is cancellation-based: add-then-remove of
//! the same identity collapses to nothing, so an outbound diff stays minimal
//! however many edits fed it. See [`project_array_updates`] and
//! [`merge_array_collection_updates`].
//!
//! ### Positions
//!
//! A [`Position`] is one staffable slot. [`PositionSetUpdate`] carries edits
//! to a whole position set; [`merge_position_set_updates`] folds fresh local
//! edits into the outbound diff, with special handling for positions the
//! server has never seen.
//!
//! ### Shifts, series, occurrences
//!
//! A [`Shift`] is an ordered list of [`ShiftSeries`], each governing a span
//! of the timeline with one recurrence rule. Concrete occurrences are never
//! stored — they are materialized from the owning series plus any
//! per-occurrence override ([`ShiftOccurrenceDiff`]). An occurrence's
//! identity encodes its shift and date ([`encode_occurrence_id`]); an edit
//! that moves the date *detaches* the occurrence under a permanent opaque
//! suffix.
//!
//! ### The orchestrator
//!
//! [`apply_update_to_shift`] routes an incoming edit to single-occurrence,
//! bulk, or bulk-this-and-future handling, splitting series and detaching
//! occurrences as needed.
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::{NaiveDate, NaiveTime};
//! use rota_engine::{
//!     apply_update_to_shift, encode_occurrence_id, occurrences_in_range,
//!     OccurrenceEdit, OccurrencePatch, Recurrence, Shift, ShiftSeries,
//!     ShiftUpdates, TimeOfDayRange,
//! };
//!
//! // 1. A shift with one weekly series
//! let start = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
//! let time = TimeOfDayRange::new(
//!     NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
//!     NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
//! );
//! let mut shift = Shift::new("shift_1", "org_1");
//! shift.push_series(ShiftSeries::new(
//!     "series_1",
//!     "Front desk",
//!     start,
//!     time,
//!     Recurrence::weekly(1),
//! ));
//!
//! // 2. Rename one occurrence; its derived identity is unchanged
//! let occurrence_id = encode_occurrence_id("shift_1", start, None);
//! let updates = ShiftUpdates {
//!     occurrence: Some(OccurrenceEdit {
//!         patch: OccurrencePatch {
//!             title: Some("Front desk (covered)".into()),
//!             ..Default::default()
//!         },
//!         ..Default::default()
//!     }),
//!     ..Default::default()
//! };
//! apply_update_to_shift(&mut shift, &updates, Some(&occurrence_id), None).unwrap();
//!
//! // 3. Project the displayable week
//! let week = occurrences_in_range(&shift, start, start + chrono::Days::new(6));
//! assert_eq!(week.len(), 1);
//! assert_eq!(week[0].title, "Front desk (covered)");
//! ```
//!
//! ## Serialization
//!
//! Every public data type derives camelCase serde; collaborators own the
//! wire format, persistence, and transport.

pub mod collection;
pub mod error;
pub mod help_request;
pub mod occurrence;
pub mod position;
pub mod series;
pub mod shift;

// Re-export main types at crate root
pub use collection::{
    merge_array_collection_updates, project_array_updates, ArrayCollectionUpdate,
};
pub use error::{Error, Result};
pub use help_request::{
    apply_update_to_help_request, merge_help_request_updates, HelpRequest, HelpRequestPatch,
    HelpRequestUpdates,
};
pub use occurrence::{
    decode_occurrence_id, encode_occurrence_id, DateTimeRange, OccurrenceIdParts, OccurrencePatch,
    ShiftOccurrence, ShiftOccurrenceDiff, TimeOfDayRange, OCCURRENCE_ID_DELIM,
};
pub use position::{
    apply_update_to_position, merge_position_set_updates, merge_position_updates,
    project_position_updates, CategorizedItem, Position, PositionPatch, PositionSetUpdate,
    PositionUpdate,
};
pub use series::{
    find_owning_series, split_series_at, Recurrence, RecurrenceEnd, RecurrenceEvery, ShiftSeries,
};
pub use shift::{
    apply_update_to_shift, materialize_occurrence, occurrences_in_range, OccurrenceEdit,
    SeriesPatch, Shift, ShiftUpdates,
};

/// Type aliases for clarity
pub type ShiftId = String;
pub type SeriesId = String;
pub type PositionId = String;
pub type OccurrenceId = String;
pub type UserId = String;
pub type OrgId = String;
