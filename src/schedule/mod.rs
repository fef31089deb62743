//! The schedule core: week grid entries, conflict-checked drafting, the
//! replace-all commit, and resolution of "what should play right now".

mod conflict;
mod draft;
mod error;
mod resolver;

pub use conflict::{has_conflict, validate_range};
pub use draft::Draft;
pub use error::ScheduleError;
pub use resolver::{day_slot_at, resolve_active};

use std::sync::Arc;

use jiff::tz::TimeZone;
use jiff::Timestamp;
use tracing::{debug, info, warn};

use crate::backend::{BackendError, RowFilter, RowStore};
use crate::model::{ScheduleEntry, ScheduleRow, TenantId, Weekday};
use crate::observability;

/// Request orchestration over the `schedules` relation. Stateless apart
/// from the injected row store; all tenant state lives behind it.
pub struct ScheduleService {
    rows: Arc<dyn RowStore>,
}

impl ScheduleService {
    pub fn new(rows: Arc<dyn RowStore>) -> Self {
        Self { rows }
    }

    /// The tenant's persisted entries, sorted for display and for the
    /// resolver's documented first-match tie-break: by day, then start.
    pub async fn load(&self, tenant: &TenantId) -> Result<Vec<ScheduleEntry>, ScheduleError> {
        let rows = self.rows.select(&RowFilter::Tenant(tenant.clone())).await?;
        let mut entries = rows
            .into_iter()
            .map(|row| {
                row.into_entry()
                    .map_err(|e| ScheduleError::Backend(BackendError::new("rows.select", e)))
            })
            .collect::<Result<Vec<_>, _>>()?;
        entries.sort_by_key(|e| (e.day as u8, e.range.start));
        debug!(tenant = %tenant, entries = entries.len(), "loaded schedule");
        Ok(entries)
    }

    /// Start an edit session: a draft seeded from the persisted set.
    pub async fn edit(&self, tenant: &TenantId) -> Result<Draft, ScheduleError> {
        let entries = self.load(tenant).await?;
        Ok(Draft::seed(tenant.clone(), entries))
    }

    /// Replace the tenant's persisted schedule with the draft: delete all,
    /// insert all (ids stripped, the store assigns fresh ones), refetch.
    ///
    /// The two steps are NOT atomic. A failure between them leaves the
    /// tenant with zero persisted entries, which is why the insert error is
    /// surfaced as [`ScheduleError::SaveIncomplete`] rather than a generic
    /// failure: the caller must know that retrying the save is required,
    /// not optional. The draft stays dirty until a commit succeeds.
    pub async fn commit(&self, draft: &mut Draft) -> Result<Vec<ScheduleEntry>, ScheduleError> {
        let tenant = draft.tenant().clone();
        self.rows.delete(&RowFilter::Tenant(tenant.clone())).await?;

        if !draft.entries().is_empty() {
            let rows: Vec<ScheduleRow> = draft
                .entries()
                .iter()
                .map(|entry| {
                    let mut row = ScheduleRow::from_entry(entry);
                    row.id = None;
                    row
                })
                .collect();
            if let Err(e) = self.rows.insert(rows).await {
                metrics::counter!(observability::COMMITS_TOTAL, "status" => "incomplete")
                    .increment(1);
                warn!(tenant = %tenant, error = %e, "commit insert failed after delete");
                return Err(ScheduleError::SaveIncomplete {
                    message: e.to_string(),
                });
            }
        }

        let fresh = self.load(&tenant).await?;
        draft.reseed(fresh.clone());
        metrics::counter!(observability::COMMITS_TOTAL, "status" => "ok").increment(1);
        info!(tenant = %tenant, entries = fresh.len(), "schedule committed");
        Ok(fresh)
    }

    /// Remove the tenant's persisted entries for one day, immediately.
    /// Independent of any edit session; a caller holding a draft removes
    /// the day from it separately via [`Draft::remove_day`].
    pub async fn delete_day(
        &self,
        tenant: &TenantId,
        day: Weekday,
    ) -> Result<u64, ScheduleError> {
        let removed = self
            .rows
            .delete(&RowFilter::TenantDay(tenant.clone(), day))
            .await?;
        info!(tenant = %tenant, day = %day, removed, "deleted day schedule");
        Ok(removed)
    }

    /// Clear the tenant's entire persisted schedule, immediately.
    pub async fn delete_all(&self, tenant: &TenantId) -> Result<u64, ScheduleError> {
        let removed = self.rows.delete(&RowFilter::Tenant(tenant.clone())).await?;
        info!(tenant = %tenant, removed, "deleted all schedules");
        Ok(removed)
    }

    /// What should play right now: persisted entries only, never a draft.
    pub async fn resolve_now(
        &self,
        tenant: &TenantId,
        now: Timestamp,
        tz: &TimeZone,
    ) -> Result<Option<ScheduleEntry>, ScheduleError> {
        let entries = self.load(tenant).await?;
        let (day, slot) = day_slot_at(now, tz);
        Ok(resolve_active(&entries, day, slot).cloned())
    }
}
