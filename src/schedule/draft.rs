use crate::model::{MediaRef, ScheduleEntry, Slot, TenantId, Weekday};

use super::conflict::{has_conflict, validate_range};
use super::ScheduleError;

/// The unsaved working copy of a tenant's weekly schedule.
///
/// Seeded from the persisted set at edit-session start, mutated through
/// conflict-checked staging and day removals, and either committed
/// wholesale through [`super::ScheduleService::commit`] or simply dropped
/// (navigating away discards the draft; there is nothing to undo).
#[derive(Debug, Clone)]
pub struct Draft {
    tenant: TenantId,
    entries: Vec<ScheduleEntry>,
    dirty: bool,
}

impl Draft {
    pub fn seed(tenant: TenantId, entries: Vec<ScheduleEntry>) -> Self {
        Self {
            tenant,
            entries,
            dirty: false,
        }
    }

    pub fn tenant(&self) -> &TenantId {
        &self.tenant
    }

    pub fn entries(&self) -> &[ScheduleEntry] {
        &self.entries
    }

    /// False while the draft still equals the last-known persisted set.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Validate and stage one assignment. The range is checked against the
    /// draft's current contents (not the persisted set: staged entries
    /// occupy their slots immediately). A rejected staging leaves the
    /// draft exactly as it was.
    pub fn stage(
        &mut self,
        day: Weekday,
        start: Slot,
        end: Slot,
        media: MediaRef,
    ) -> Result<(), ScheduleError> {
        let range = validate_range(start, end)?;
        if has_conflict(day, &range, &self.entries) {
            metrics::counter!(crate::observability::CONFLICTS_REJECTED_TOTAL).increment(1);
            return Err(ScheduleError::Conflict);
        }
        self.entries
            .push(ScheduleEntry::new(self.tenant.clone(), day, range, media));
        self.dirty = true;
        Ok(())
    }

    /// Drop every staged entry for a day. Returns how many were removed.
    pub fn remove_day(&mut self, day: Weekday) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.day != day);
        let removed = before - self.entries.len();
        if removed > 0 {
            self.dirty = true;
        }
        removed
    }

    /// Replace the buffer with a freshly persisted set; Dirty → Clean.
    pub(super) fn reseed(&mut self, entries: Vec<ScheduleEntry>) {
        self.entries = entries;
        self.dirty = false;
    }
}
