//! Slot Materializer — expands a niche schedule into discrete daily slots.

use chrono::{Days, NaiveDate};

use autoblog_core::error::Result;
use autoblog_core::types::{NicheSchedule, ScheduledSlot};
use autoblog_store::BlogStore;

/// Materialize one pending slot per calendar day from the schedule's start
/// date to `min(end_date, today + horizon_days)` inclusive. Days that already
/// have a slot for this schedule are skipped, so re-invocation is idempotent
/// and only fills the gaps (including days newly inside the rolling horizon).
///
/// Each new slot is persisted immediately, not batched: a crash mid-way
/// leaves a consistent partial set that the next invocation completes.
///
/// Returns the slots created by this call.
pub fn materialize(
    store: &BlogStore,
    schedule: &NicheSchedule,
    today: NaiveDate,
    horizon_days: u32,
) -> Result<Vec<ScheduledSlot>> {
    let cap = today
        .checked_add_days(Days::new(horizon_days as u64))
        .unwrap_or(today);
    let last = schedule.end_date.min(cap);

    let mut created = Vec::new();
    let mut day = schedule.start_date;
    while day <= last {
        if !store.slot_exists(&schedule.id, day)? {
            let slot = ScheduledSlot::for_schedule(schedule, day);
            store.upsert_slot(&slot)?;
            created.push(slot);
        }
        match day.succ_opt() {
            Some(next) => day = next,
            None => break,
        }
    }

    if !created.is_empty() {
        tracing::info!(
            "📅 Materialized {} slot(s) for schedule '{}' ({})",
            created.len(),
            schedule.niche,
            schedule.id
        );
    }
    Ok(created)
}
