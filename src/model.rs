use std::fmt;

use serde::{Deserialize, Serialize};

use crate::grid;

/// Half-hour slot index within a day — the only unit of scheduling time.
/// Valid values are `0..48`; slot `i` covers `[i * 30min, (i + 1) * 30min)`
/// counted from midnight.
pub type Slot = u8;

/// Half-open slot interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotRange {
    pub start: Slot,
    pub end: Slot,
}

impl SlotRange {
    pub fn new(start: Slot, end: Slot) -> Self {
        debug_assert!(start < end, "SlotRange start must be before end");
        Self { start, end }
    }

    pub fn overlaps(&self, other: &SlotRange) -> bool {
        self.start.max(other.start) < self.end.min(other.end)
    }

    pub fn contains(&self, slot: Slot) -> bool {
        self.start <= slot && slot < self.end
    }

    pub fn len(&self) -> Slot {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

impl fmt::Display for SlotRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}",
            grid::slot_to_label(self.start),
            grid::slot_to_label(self.end)
        )
    }
}

/// Day of week, Monday-first, locale-independent. Serialized as the
/// three-letter name, which is also the persisted row format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Weekday {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Weekday::Mon => "Mon",
            Weekday::Tue => "Tue",
            Weekday::Wed => "Wed",
            Weekday::Thu => "Thu",
            Weekday::Fri => "Fri",
            Weekday::Sat => "Sat",
            Weekday::Sun => "Sun",
        }
    }

    pub fn parse(s: &str) -> Option<Weekday> {
        Weekday::ALL.into_iter().find(|d| d.as_str() == s)
    }

    pub fn from_civil(day: jiff::civil::Weekday) -> Weekday {
        use jiff::civil::Weekday as C;
        match day {
            C::Monday => Weekday::Mon,
            C::Tuesday => Weekday::Tue,
            C::Wednesday => Weekday::Wed,
            C::Thursday => Weekday::Thu,
            C::Friday => Weekday::Fri,
            C::Saturday => Weekday::Sat,
            C::Sunday => Weekday::Sun,
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque restaurant identifier, the unit of data isolation. Assigned by
/// the auth provider (one authenticated user = one restaurant).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TenantId(String);

impl TenantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A stored video: its object name plus the resolved playback URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    pub name: String,
    pub url: String,
}

/// One assignment of a video to a day/time range for a tenant.
///
/// `id` is assigned by the persistence layer on commit and absent on
/// not-yet-persisted entries. For a given tenant and day, the ranges of all
/// active persisted entries must be pairwise non-overlapping: an advisory
/// invariant enforced at proposal time only, never by the store itself.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleEntry {
    pub id: Option<String>,
    pub tenant: TenantId,
    pub day: Weekday,
    pub range: SlotRange,
    pub media: MediaRef,
    pub active: bool,
}

impl ScheduleEntry {
    pub fn new(tenant: TenantId, day: Weekday, range: SlotRange, media: MediaRef) -> Self {
        Self {
            id: None,
            tenant,
            day,
            range,
            media,
            active: true,
        }
    }
}

/// The persisted form of an entry, field-for-field the `schedules` relation.
/// Times are stored as `HH:MM` grid labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub restaurant_id: String,
    pub day_of_week: Weekday,
    pub start_time: String,
    pub end_time: String,
    pub video_name: String,
    pub video_url: String,
    pub is_active: bool,
}

impl ScheduleRow {
    pub fn from_entry(entry: &ScheduleEntry) -> Self {
        Self {
            id: entry.id.clone(),
            restaurant_id: entry.tenant.as_str().to_string(),
            day_of_week: entry.day,
            start_time: grid::slot_to_label(entry.range.start),
            end_time: grid::slot_to_label(entry.range.end),
            video_name: entry.media.name.clone(),
            video_url: entry.media.url.clone(),
            is_active: entry.active,
        }
    }

    /// Decode a persisted row. Rows whose labels don't land on the grid or
    /// whose range is inverted were written by something that bypassed the
    /// proposal checks; they are reported, not silently repaired.
    pub fn into_entry(self) -> Result<ScheduleEntry, String> {
        let start = grid::label_to_slot(&self.start_time)
            .ok_or_else(|| format!("row has malformed start_time {:?}", self.start_time))?;
        let end = grid::label_to_slot(&self.end_time)
            .ok_or_else(|| format!("row has malformed end_time {:?}", self.end_time))?;
        if start >= end {
            return Err(format!(
                "row has inverted range {}-{}",
                self.start_time, self.end_time
            ));
        }
        Ok(ScheduleEntry {
            id: self.id,
            tenant: TenantId::new(self.restaurant_id),
            day: self.day_of_week,
            range: SlotRange::new(start, end),
            media: MediaRef {
                name: self.video_name,
                url: self.video_url,
            },
            active: self.is_active,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn media() -> MediaRef {
        MediaRef {
            name: "lunch.mp4".into(),
            url: "memory://videos/public/lunch.mp4".into(),
        }
    }

    #[test]
    fn range_basics() {
        let r = SlotRange::new(16, 20);
        assert_eq!(r.len(), 4);
        assert!(r.contains(16));
        assert!(r.contains(19));
        assert!(!r.contains(20)); // half-open
        assert!(!r.contains(15));
    }

    #[test]
    fn range_overlap() {
        let a = SlotRange::new(16, 20);
        let b = SlotRange::new(18, 24);
        let c = SlotRange::new(20, 22);
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(!a.overlaps(&c)); // adjacent, not overlapping
        assert!(!c.overlaps(&a));
    }

    #[test]
    fn range_contained_overlap() {
        let outer = SlotRange::new(10, 40);
        let inner = SlotRange::new(20, 22);
        assert!(outer.overlaps(&inner));
        assert!(inner.overlaps(&outer));
    }

    #[test]
    fn weekday_roundtrip() {
        for day in Weekday::ALL {
            assert_eq!(Weekday::parse(day.as_str()), Some(day));
        }
        assert_eq!(Weekday::parse("Monday"), None);
        assert_eq!(Weekday::parse(""), None);
    }

    #[test]
    fn weekday_monday_first() {
        assert_eq!(Weekday::ALL[0], Weekday::Mon);
        assert_eq!(Weekday::ALL[6], Weekday::Sun);
        assert_eq!(Weekday::from_civil(jiff::civil::Weekday::Sunday), Weekday::Sun);
        assert_eq!(Weekday::from_civil(jiff::civil::Weekday::Monday), Weekday::Mon);
    }

    #[test]
    fn row_roundtrip() {
        let entry = ScheduleEntry::new(
            TenantId::new("t1"),
            Weekday::Mon,
            SlotRange::new(32, 36),
            media(),
        );
        let row = ScheduleRow::from_entry(&entry);
        assert_eq!(row.start_time, "16:00");
        assert_eq!(row.end_time, "18:00");
        assert_eq!(row.day_of_week, Weekday::Mon);
        assert!(row.id.is_none());

        let back = row.into_entry().unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn row_malformed_labels_rejected() {
        let mut row = ScheduleRow::from_entry(&ScheduleEntry::new(
            TenantId::new("t1"),
            Weekday::Tue,
            SlotRange::new(0, 1),
            media(),
        ));
        row.start_time = "16:17".into();
        assert!(row.into_entry().is_err());
    }

    #[test]
    fn row_inverted_range_rejected() {
        let mut row = ScheduleRow::from_entry(&ScheduleEntry::new(
            TenantId::new("t1"),
            Weekday::Tue,
            SlotRange::new(0, 1),
            media(),
        ));
        row.start_time = "18:00".into();
        row.end_time = "16:00".into();
        let err = row.into_entry().unwrap_err();
        assert!(err.contains("inverted"));
    }

    #[test]
    fn weekday_serde_is_short_name() {
        let json = serde_json::to_string(&Weekday::Wed).unwrap();
        assert_eq!(json, "\"Wed\"");
        let back: Weekday = serde_json::from_str("\"Sun\"").unwrap();
        assert_eq!(back, Weekday::Sun);
    }
}
