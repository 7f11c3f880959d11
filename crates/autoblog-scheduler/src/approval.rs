//! Approval Gate — human (or fallback) topic selection for a slot.
//!
//! Direct single-record operations, persisted immediately. No concurrency
//! guard: these are user-triggered and never call the generator. The only
//! hard rule is that a published slot is terminal.

use autoblog_core::error::{AutoblogError, Result};
use autoblog_core::types::{GeneratedTopic, ScheduledSlot, SlotStatus};
use autoblog_store::BlogStore;

/// Lock `topic` in for the slot: `selected_topic = topic`, status `ready`.
pub fn select_topic(
    store: &BlogStore,
    slot_id: &str,
    topic: GeneratedTopic,
) -> Result<ScheduledSlot> {
    let mut slot = store.get_slot(slot_id)?;
    if slot.status == SlotStatus::Published {
        return Err(AutoblogError::SlotPublished(slot_id.to_string()));
    }
    slot.selected_topic = Some(topic);
    slot.status = SlotStatus::Ready;
    store.upsert_slot(&slot)?;
    tracing::info!("✅ Slot {slot_id} locked: '{}'", slot.selected_topic.as_ref().map(|t| t.topic.as_str()).unwrap_or(""));
    Ok(slot)
}

/// Revert a ready slot to `pending_selection`, clearing the selection.
/// Suggested topics are kept so re-selection needs no new generation round.
pub fn unlock(store: &BlogStore, slot_id: &str) -> Result<ScheduledSlot> {
    let mut slot = store.get_slot(slot_id)?;
    if slot.status == SlotStatus::Published {
        return Err(AutoblogError::SlotPublished(slot_id.to_string()));
    }
    slot.selected_topic = None;
    slot.status = SlotStatus::PendingSelection;
    store.upsert_slot(&slot)?;
    tracing::info!("🔓 Slot {slot_id} unlocked");
    Ok(slot)
}

/// Select a topic typed by the user rather than one of the suggestions.
/// The topic carries only a title; content is generated lazily when the slot
/// is published.
pub fn add_custom_topic(store: &BlogStore, slot_id: &str, title: &str) -> Result<ScheduledSlot> {
    select_topic(store, slot_id, GeneratedTopic::bare(title))
}

#[cfg(test)]
mod tests {
    use super::*;
    use autoblog_core::types::NicheSchedule;
    use chrono::{NaiveDate, NaiveTime};

    fn seed_slot(store: &BlogStore) -> ScheduledSlot {
        let sched = NicheSchedule::new(
            "Travel",
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        );
        let mut slot = ScheduledSlot::for_schedule(&sched, sched.start_date);
        slot.suggested_topics = vec![GeneratedTopic::bare("A"), GeneratedTopic::bare("B")];
        store.upsert_slot(&slot).unwrap();
        slot
    }

    #[test]
    fn select_locks_slot() {
        let store = BlogStore::open_in_memory().unwrap();
        let slot = seed_slot(&store);
        let updated = select_topic(&store, &slot.id, slot.suggested_topics[1].clone()).unwrap();
        assert_eq!(updated.status, SlotStatus::Ready);
        assert_eq!(updated.selected_topic.unwrap().topic, "B");

        let persisted = store.get_slot(&slot.id).unwrap();
        assert_eq!(persisted.status, SlotStatus::Ready);
    }

    #[test]
    fn unlock_restores_pending_and_keeps_suggestions() {
        let store = BlogStore::open_in_memory().unwrap();
        let slot = seed_slot(&store);
        select_topic(&store, &slot.id, slot.suggested_topics[0].clone()).unwrap();

        let unlocked = unlock(&store, &slot.id).unwrap();
        assert_eq!(unlocked.status, SlotStatus::PendingSelection);
        assert!(unlocked.selected_topic.is_none());
        assert_eq!(unlocked.suggested_topics.len(), 2);
    }

    #[test]
    fn custom_topic_is_bare_and_selected() {
        let store = BlogStore::open_in_memory().unwrap();
        let slot = seed_slot(&store);
        let updated = add_custom_topic(&store, &slot.id, "My own angle").unwrap();
        assert_eq!(updated.status, SlotStatus::Ready);
        let topic = updated.selected_topic.unwrap();
        assert_eq!(topic.topic, "My own angle");
        assert!(topic.content.is_none());
        assert!(topic.excerpt.is_none());
    }

    #[test]
    fn published_slot_rejects_selection() {
        let store = BlogStore::open_in_memory().unwrap();
        let mut slot = seed_slot(&store);
        slot.status = SlotStatus::Published;
        store.upsert_slot(&slot).unwrap();

        let err = select_topic(&store, &slot.id, GeneratedTopic::bare("X")).unwrap_err();
        assert!(matches!(err, AutoblogError::SlotPublished(_)));
        let err = unlock(&store, &slot.id).unwrap_err();
        assert!(matches!(err, AutoblogError::SlotPublished(_)));

        // Slot unchanged
        let persisted = store.get_slot(&slot.id).unwrap();
        assert_eq!(persisted.status, SlotStatus::Published);
        assert!(persisted.selected_topic.is_none());
    }

    #[test]
    fn select_missing_slot_is_not_found() {
        let store = BlogStore::open_in_memory().unwrap();
        let err = select_topic(&store, "ghost", GeneratedTopic::bare("X")).unwrap_err();
        assert!(matches!(err, AutoblogError::NotFound { .. }));
    }
}
