//! Topic Prefetcher — fills empty slots with topic candidates ahead of time.
//!
//! One slot per tick, earliest date first. That bounds generation load by
//! construction: no process-wide flag is needed, and a persistently failing
//! niche just retries on a later tick (logged, never escalated).

use std::sync::Arc;

use autoblog_core::error::Result;
use autoblog_core::types::{SlotStatus, training_context};
use autoblog_generator::ContentGenerator;
use autoblog_store::BlogStore;

/// Background topic prefetch sweep.
pub struct TopicPrefetcher {
    store: Arc<BlogStore>,
    generator: Arc<dyn ContentGenerator>,
}

impl TopicPrefetcher {
    pub fn new(store: Arc<BlogStore>, generator: Arc<dyn ContentGenerator>) -> Self {
        Self { store, generator }
    }

    /// One sweep: pick at most one pending slot with no suggestions yet
    /// (earliest date, then insertion order), request a batch of candidates,
    /// attach and persist. Returns the slot id processed, if any.
    ///
    /// Suggestions are populated at most once per slot: a slot with a
    /// non-empty batch is never re-requested.
    pub async fn tick(&self) -> Result<Option<String>> {
        let slot = self
            .store
            .list_slots()?
            .into_iter()
            .find(|s| s.status == SlotStatus::PendingSelection && s.suggested_topics.is_empty());
        let Some(mut slot) = slot else {
            return Ok(None);
        };

        tracing::debug!(
            "💡 Generating topics for slot {} ({} on {})",
            slot.id,
            slot.niche,
            slot.date
        );
        let context = training_context(&self.store.list_training()?);
        let topics = self
            .generator
            .suggest_topics(&slot.niche, &context, slot.suggestion_count)
            .await?;

        slot.suggested_topics = topics;
        self.store.upsert_slot(&slot)?;
        Ok(Some(slot.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FailingGenerator, MockGenerator};
    use autoblog_core::error::AutoblogError;
    use autoblog_core::types::{GeneratedTopic, NicheSchedule, ScheduledSlot, TrainingData};
    use chrono::{NaiveDate, NaiveTime, Utc};

    fn schedule(niche: &str, day: u32) -> (NicheSchedule, ScheduledSlot) {
        let sched = NicheSchedule {
            suggestion_count: 3,
            ..NicheSchedule::new(
                niche,
                NaiveDate::from_ymd_opt(2024, 6, day).unwrap(),
                NaiveDate::from_ymd_opt(2024, 6, day).unwrap(),
                NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            )
        };
        let slot = ScheduledSlot::for_schedule(&sched, sched.start_date);
        (sched, slot)
    }

    #[tokio::test]
    async fn fills_earliest_empty_slot_only() {
        let store = Arc::new(BlogStore::open_in_memory().unwrap());
        let (_, later) = schedule("Finance", 2);
        let (_, earlier) = schedule("Travel", 1);
        store.upsert_slot(&later).unwrap();
        store.upsert_slot(&earlier).unwrap();

        let generator = Arc::new(MockGenerator::new());
        let prefetcher = TopicPrefetcher::new(store.clone(), generator.clone());

        let processed = prefetcher.tick().await.unwrap();
        assert_eq!(processed.as_deref(), Some(earlier.id.as_str()));

        let filled = store.get_slot(&earlier.id).unwrap();
        assert_eq!(filled.suggested_topics.len(), 3);
        assert_eq!(filled.status, SlotStatus::PendingSelection);
        // One slot per tick: the later slot is untouched
        assert!(store.get_slot(&later.id).unwrap().suggested_topics.is_empty());
        assert_eq!(generator.topic_calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn skips_slots_that_already_have_suggestions() {
        let store = Arc::new(BlogStore::open_in_memory().unwrap());
        let (_, mut slot) = schedule("Travel", 1);
        slot.suggested_topics = vec![GeneratedTopic::bare("existing")];
        store.upsert_slot(&slot).unwrap();

        let prefetcher = TopicPrefetcher::new(store.clone(), Arc::new(MockGenerator::new()));
        assert!(prefetcher.tick().await.unwrap().is_none());

        // Populated at most once: the original batch is untouched
        let unchanged = store.get_slot(&slot.id).unwrap();
        assert_eq!(unchanged.suggested_topics.len(), 1);
        assert_eq!(unchanged.suggested_topics[0].topic, "existing");
    }

    #[tokio::test]
    async fn failure_leaves_slot_empty_for_retry() {
        let store = Arc::new(BlogStore::open_in_memory().unwrap());
        let (_, slot) = schedule("Travel", 1);
        store.upsert_slot(&slot).unwrap();

        let prefetcher = TopicPrefetcher::new(store.clone(), Arc::new(FailingGenerator));
        let err = prefetcher.tick().await.unwrap_err();
        assert!(matches!(err, AutoblogError::HardGeneration(_)));

        // Still empty and pending — eligible on the next tick
        let unchanged = store.get_slot(&slot.id).unwrap();
        assert!(unchanged.suggested_topics.is_empty());
        assert_eq!(unchanged.status, SlotStatus::PendingSelection);

        // A later tick with a healthy generator succeeds
        let prefetcher = TopicPrefetcher::new(store.clone(), Arc::new(MockGenerator::new()));
        assert!(prefetcher.tick().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn no_pending_slots_is_a_noop() {
        let store = Arc::new(BlogStore::open_in_memory().unwrap());
        let generator = Arc::new(MockGenerator::new());
        let prefetcher = TopicPrefetcher::new(store, generator.clone());
        assert!(prefetcher.tick().await.unwrap().is_none());
        assert_eq!(generator.topic_calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn passes_training_context_through() {
        let store = Arc::new(BlogStore::open_in_memory().unwrap());
        store
            .upsert_training(&TrainingData {
                id: "t1".into(),
                title: "Voice".into(),
                content: "Second person.".into(),
                kind: "style".into(),
                date_added: Utc::now(),
            })
            .unwrap();
        let (_, slot) = schedule("Travel", 1);
        store.upsert_slot(&slot).unwrap();

        let generator = Arc::new(MockGenerator::new());
        let prefetcher = TopicPrefetcher::new(store.clone(), generator.clone());
        assert!(prefetcher.tick().await.unwrap().is_some());

        let (niche, context, count) = generator.last_topic_request.lock().unwrap().clone().unwrap();
        assert_eq!(niche, "Travel");
        assert_eq!(context, "[STYLE] Voice: Second person.");
        assert_eq!(count, 3);
    }
}
