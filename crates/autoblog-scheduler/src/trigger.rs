//! Niche-Trigger Sweep — launch-time auto-publish, independent of slots.
//!
//! Once per minute, each active schedule is checked against the wall clock:
//! if today is inside the schedule's date range and the current HH:MM equals
//! its launch time, one ad-hoc pipeline runs (topics → random choice → full
//! post → cover → published post). A per-(day, schedule) key guarantees a
//! schedule fires at most once per calendar day, and only the first matching
//! schedule in a given minute fires.
//!
//! Dates are calendar dates compared against the *local* calendar day; there
//! is no timezone conversion anywhere in the containment check, so a schedule
//! starting "today" matches today regardless of UTC offset.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use chrono::{NaiveDateTime, Timelike};
use rand::Rng;
use tokio::sync::Semaphore;

use autoblog_core::error::{AutoblogError, Result};
use autoblog_core::types::{Post, training_context};
use autoblog_generator::{ContentGenerator, cover};
use autoblog_store::BlogStore;

use crate::publisher::assemble_post;

/// How many candidates the ad-hoc pipeline asks for before picking one at
/// random.
const TRIGGER_TOPIC_COUNT: u32 = 3;

/// Background launch-time trigger sweep.
pub struct NicheTrigger {
    store: Arc<BlogStore>,
    generator: Arc<dyn ContentGenerator>,
    /// Same single-flight token as the Due-Slot Publisher.
    guard: Arc<Semaphore>,
    tone: String,
    /// "{date}-{schedule_id}" keys that already fired. In-memory only: a
    /// restart may re-fire a schedule, matching the at-least-once posture of
    /// the rest of the system.
    fired: Mutex<HashSet<String>>,
}

impl NicheTrigger {
    pub fn new(
        store: Arc<BlogStore>,
        generator: Arc<dyn ContentGenerator>,
        guard: Arc<Semaphore>,
        tone: &str,
    ) -> Self {
        Self {
            store,
            generator,
            guard,
            tone: tone.to_string(),
            fired: Mutex::new(HashSet::new()),
        }
    }

    /// One sweep against the given local wall-clock time. Returns the post
    /// published by a fired trigger, if any.
    pub async fn tick(&self, now: NaiveDateTime) -> Result<Option<Post>> {
        let today = now.date();
        for schedule in self.store.list_schedules()? {
            if !schedule.covers(today) {
                continue;
            }
            if now.hour() != schedule.launch_time.hour()
                || now.minute() != schedule.launch_time.minute()
            {
                continue;
            }

            let key = format!("{today}-{}", schedule.id);
            {
                let mut fired = self
                    .fired
                    .lock()
                    .map_err(|e| AutoblogError::Store(format!("dedup lock: {e}")))?;
                if fired.contains(&key) {
                    continue;
                }
                // Marked before the pipeline runs: a failing pipeline does
                // not re-fire until the next calendar day.
                fired.insert(key);
            }

            tracing::info!(
                "🔔 Launch time hit for schedule '{}' ({})",
                schedule.niche,
                schedule.id
            );
            // Only the first matching schedule fires this minute.
            return self.auto_publish(&schedule.niche).await.map(Some);
        }
        Ok(None)
    }

    /// The ad-hoc generate-and-publish pipeline, under the shared guard.
    /// Nothing is persisted unless every generation step succeeds.
    async fn auto_publish(&self, niche: &str) -> Result<Post> {
        let Ok(_permit) = self.guard.try_acquire() else {
            tracing::warn!("⏳ Publish pipeline busy, skipping trigger for '{niche}'");
            return Err(AutoblogError::Busy);
        };

        let context = training_context(&self.store.list_training()?);
        let topics = self
            .generator
            .suggest_topics(niche, &context, TRIGGER_TOPIC_COUNT)
            .await?;
        if topics.is_empty() {
            return Err(AutoblogError::HardGeneration(
                "no topics generated for trigger".into(),
            ));
        }
        let pick = rand::thread_rng().gen_range(0..topics.len());
        let topic = &topics[pick];

        let draft = self
            .generator
            .write_full_post(&topic.topic, &self.tone, &context)
            .await?;
        let cover_image = match self.generator.render_cover_art(&topic.topic).await {
            Ok(uri) => uri,
            Err(_) => cover::fallback_cover_art(&topic.topic),
        };

        let post = assemble_post(&topic.topic, draft, Some(cover_image));
        self.store.upsert_post(&post)?;
        tracing::info!("📰 Trigger published '{}' for niche '{niche}'", post.title);
        Ok(post)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FailingGenerator, MockGenerator};
    use autoblog_core::types::NicheSchedule;
    use chrono::{NaiveDate, NaiveTime};

    fn schedule(niche: &str) -> NicheSchedule {
        NicheSchedule::new(
            niche,
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        )
    }

    fn at(day: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, day)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn trigger(store: &Arc<BlogStore>, generator: Arc<dyn ContentGenerator>) -> NicheTrigger {
        NicheTrigger::new(
            store.clone(),
            generator,
            Arc::new(Semaphore::new(1)),
            "Professional & Engaging",
        )
    }

    #[tokio::test]
    async fn fires_on_launch_minute_inside_range() {
        let store = Arc::new(BlogStore::open_in_memory().unwrap());
        store.upsert_schedule(&schedule("Travel")).unwrap();

        let t = trigger(&store, Arc::new(MockGenerator::new()));
        let post = t.tick(at(2, 9, 0)).await.unwrap().expect("should fire");
        assert_eq!(post.status, autoblog_core::types::PostStatus::Published);
        assert_eq!(store.list_posts().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn quiet_outside_launch_minute_or_range() {
        let store = Arc::new(BlogStore::open_in_memory().unwrap());
        store.upsert_schedule(&schedule("Travel")).unwrap();
        let generator = Arc::new(MockGenerator::new());
        let t = trigger(&store, generator.clone());

        assert!(t.tick(at(2, 9, 1)).await.unwrap().is_none()); // wrong minute
        assert!(t.tick(at(2, 8, 59)).await.unwrap().is_none());
        assert!(t.tick(at(4, 9, 0)).await.unwrap().is_none()); // past end date
        assert_eq!(generator.topic_calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn range_bounds_are_inclusive_calendar_days() {
        let store = Arc::new(BlogStore::open_in_memory().unwrap());
        store.upsert_schedule(&schedule("Travel")).unwrap();
        let t = trigger(&store, Arc::new(MockGenerator::new()));

        // First and last day both fire (separate days, separate dedup keys)
        assert!(t.tick(at(1, 9, 0)).await.unwrap().is_some());
        assert!(t.tick(at(3, 9, 0)).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn fires_at_most_once_per_day_per_schedule() {
        let store = Arc::new(BlogStore::open_in_memory().unwrap());
        store.upsert_schedule(&schedule("Travel")).unwrap();
        let t = trigger(&store, Arc::new(MockGenerator::new()));

        assert!(t.tick(at(2, 9, 0)).await.unwrap().is_some());
        // Same minute again, and later the same day: deduplicated
        assert!(t.tick(at(2, 9, 0)).await.unwrap().is_none());
        assert_eq!(store.list_posts().unwrap().len(), 1);
        // Next day fires again
        assert!(t.tick(at(3, 9, 0)).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn only_first_matching_schedule_fires_per_minute() {
        let store = Arc::new(BlogStore::open_in_memory().unwrap());
        store.upsert_schedule(&schedule("Travel")).unwrap();
        store.upsert_schedule(&schedule("Finance")).unwrap();
        let generator = Arc::new(MockGenerator::new());
        let t = trigger(&store, generator.clone());

        t.tick(at(2, 9, 0)).await.unwrap().expect("first fires");
        assert_eq!(store.list_posts().unwrap().len(), 1);

        // The second schedule gets its turn on a later sweep of that minute
        t.tick(at(2, 9, 0)).await.unwrap().expect("second fires next sweep");
        assert_eq!(store.list_posts().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn pipeline_failure_persists_nothing_and_frees_guard() {
        let store = Arc::new(BlogStore::open_in_memory().unwrap());
        store.upsert_schedule(&schedule("Travel")).unwrap();

        let guard = Arc::new(Semaphore::new(1));
        let t = NicheTrigger::new(
            store.clone(),
            Arc::new(FailingGenerator),
            guard.clone(),
            "Professional & Engaging",
        );
        assert!(t.tick(at(2, 9, 0)).await.is_err());
        assert!(store.list_posts().unwrap().is_empty());
        assert_eq!(guard.available_permits(), 1);
        // Dedup key stays marked: no re-fire until the next day
        assert!(t.tick(at(2, 9, 0)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn busy_guard_makes_trigger_a_noop() {
        let store = Arc::new(BlogStore::open_in_memory().unwrap());
        store.upsert_schedule(&schedule("Travel")).unwrap();

        let guard = Arc::new(Semaphore::new(1));
        let t = NicheTrigger::new(
            store.clone(),
            Arc::new(MockGenerator::new()),
            guard.clone(),
            "Professional & Engaging",
        );

        let held = guard.clone().acquire_owned().await.unwrap();
        assert!(matches!(t.tick(at(2, 9, 0)).await, Err(AutoblogError::Busy)));
        assert!(store.list_posts().unwrap().is_empty());
        drop(held);
    }
}
