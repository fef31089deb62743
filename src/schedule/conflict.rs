use crate::limits::SLOTS_PER_DAY;
use crate::model::{ScheduleEntry, Slot, SlotRange, Weekday};

use super::ScheduleError;

/// Standard half-open overlap test: `[s, e)` conflicts with `[s', e')` on
/// the same day iff `max(s, s') < min(e, e')`. Adjacent ranges sharing an
/// endpoint do not conflict; other days never conflict. O(n) over the
/// entries: a day holds at most 48 non-overlapping entries, so nothing
/// cleverer is warranted.
pub fn has_conflict(day: Weekday, range: &SlotRange, entries: &[ScheduleEntry]) -> bool {
    entries
        .iter()
        .any(|e| e.day == day && e.range.overlaps(range))
}

/// Gate raw slot indices from the outside world into a well-formed range.
/// Both indices must be addressable grid slots, so the latest possible end
/// is 47 (23:30) and the last half-hour of the day stays unschedulable.
pub fn validate_range(start: Slot, end: Slot) -> Result<SlotRange, ScheduleError> {
    if start >= end {
        return Err(ScheduleError::InvalidRange("start must be before end"));
    }
    if end >= SLOTS_PER_DAY {
        return Err(ScheduleError::InvalidRange("range extends past the end of the grid"));
    }
    Ok(SlotRange::new(start, end))
}
