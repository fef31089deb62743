use jiff::tz::TimeZone;
use jiff::Timestamp;

use crate::model::{ScheduleEntry, Slot, Weekday};

/// Floor an instant to its `(weekday, slot)` address on the grid, in the
/// given zone's civil time.
pub fn day_slot_at(ts: Timestamp, tz: &TimeZone) -> (Weekday, Slot) {
    let zoned = ts.to_zoned(tz.clone());
    let day = Weekday::from_civil(zoned.weekday());
    let slot = (zoned.hour() as Slot) * 2 + if zoned.minute() >= 30 { 1 } else { 0 };
    (day, slot)
}

/// The single active entry for a day/slot, if any.
///
/// Under the no-overlap invariant at most one active entry covers any slot.
/// The invariant is advisory (an out-of-band writer can violate it), so
/// when several entries cover the slot this returns the FIRST match in
/// iteration order. Callers load entries sorted by (day, start), making the
/// tie-break the earliest-starting entry: deterministic and documented, not
/// a guarantee worth relying on.
pub fn resolve_active<'a>(
    entries: &'a [ScheduleEntry],
    day: Weekday,
    slot: Slot,
) -> Option<&'a ScheduleEntry> {
    entries
        .iter()
        .find(|e| e.active && e.day == day && e.range.contains(slot))
}
