//! Due-Slot Publisher — converts a due slot into a published post.
//!
//! One slot per tick, earliest (date, time) first, the whole cycle under the
//! shared single-flight guard. Subsequent overdue slots wait for later ticks;
//! that serializes AI generation load and guarantees at most one publish in
//! flight system-wide.

use std::sync::Arc;

use chrono::{NaiveDateTime, Utc};
use tokio::sync::Semaphore;

use autoblog_core::error::{AutoblogError, Result};
use autoblog_core::types::{
    GeneratedTopic, Post, PostStatus, ScheduledSlot, SlotStatus, new_id, slugify,
    training_context,
};
use autoblog_generator::{ContentGenerator, DraftContent, cover};
use autoblog_store::BlogStore;

/// Background due-slot publish sweep.
pub struct DuePublisher {
    store: Arc<BlogStore>,
    generator: Arc<dyn ContentGenerator>,
    /// Single-flight token shared with the niche trigger: the two publish
    /// pipelines never run concurrently.
    guard: Arc<Semaphore>,
    tone: String,
}

impl DuePublisher {
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
        }
    }

    /// One sweep: if no publish cycle is in flight, advance the earliest due
    /// unpublished slot. Returns the published post, if any.
    ///
    /// On generation failure the cycle aborts: the slot stays unpublished,
    /// the guard is released, and the next sweep retries.
    pub async fn tick(&self, now: NaiveDateTime) -> Result<Option<Post>> {
        // Guard first: skip the whole tick while a cycle is in flight.
        let Ok(_permit) = self.guard.try_acquire() else {
            return Ok(None);
        };

        let due = self
            .store
            .list_slots()?
            .into_iter()
            .find(|s| s.status != SlotStatus::Published && s.is_due(now));
        let Some(slot) = due else {
            return Ok(None);
        };

        tracing::info!("⏱️ Processing due slot {} ({})", slot.id, slot.niche);
        let post = self.publish(&slot).await?;
        Ok(Some(post))
        // _permit drops here, releasing the guard on success and error alike
    }

    /// Manual "publish now" for a specific slot, same pipeline as the sweep.
    pub async fn force_publish(&self, slot_id: &str) -> Result<Post> {
        let slot = self.store.get_slot(slot_id)?;
        if slot.status == SlotStatus::Published {
            return Err(AutoblogError::SlotPublished(slot_id.to_string()));
        }
        let Ok(_permit) = self.guard.try_acquire() else {
            return Err(AutoblogError::Busy);
        };
        self.publish(&slot).await
    }

    /// Steps 4-7 of the publish cycle: resolve the topic, generate content
    /// and cover, persist the post, then mark the slot published.
    async fn publish(&self, slot: &ScheduledSlot) -> Result<Post> {
        // Selected topic, else first suggestion, else the bare niche.
        let topic = slot
            .selected_topic
            .clone()
            .or_else(|| slot.suggested_topics.first().cloned())
            .unwrap_or_else(|| GeneratedTopic::bare(&slot.niche));

        tracing::info!("🚀 Auto-publishing slot {} with topic '{}'", slot.id, topic.topic);
        let context = training_context(&self.store.list_training()?);
        let draft = self
            .generator
            .write_full_post(&topic.topic, &self.tone, &context)
            .await?;
        // Cover art is best-effort: fall back to the literal URI pattern.
        let cover_image = match self.generator.render_cover_art(&topic.topic).await {
            Ok(uri) => uri,
            Err(e) => {
                tracing::warn!("⚠️ Cover art failed for '{}', using fallback: {e}", topic.topic);
                cover::fallback_cover_art(&topic.topic)
            }
        };

        let post = assemble_post(&topic.topic, draft, Some(cover_image));
        self.store.upsert_post(&post)?;

        let mut published_slot = slot.clone();
        published_slot.status = SlotStatus::Published;
        self.store.upsert_slot(&published_slot)?;
        tracing::info!("📰 Published post '{}' ({})", post.title, post.id);
        Ok(post)
    }
}

/// Build a published post from generated content, applying the literal
/// fallback defaults for anything the model left out.
pub(crate) fn assemble_post(
    topic_title: &str,
    draft: DraftContent,
    cover_image: Option<String>,
) -> Post {
    let title = draft
        .title
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| topic_title.to_string());
    Post {
        id: new_id("post"),
        slug: slugify(&title),
        title: title.clone(),
        excerpt: draft.excerpt.unwrap_or_default(),
        content: draft.content.unwrap_or_default(),
        keywords: draft.keywords.unwrap_or_default(),
        category: draft.category.unwrap_or_else(|| "Auto-Generated".into()),
        date_created: Utc::now(),
        status: PostStatus::Published,
        read_time: draft.read_time.unwrap_or_else(|| "3 min read".into()),
        cover_image,
        scheduled_date: None,
        geo_targeting: Some(draft.geo_targeting.unwrap_or_else(|| "Global".into())),
        aeo_questions: Some(draft.aeo_questions.unwrap_or_default()),
        seo_score: Some(draft.seo_score.unwrap_or(85)),
    }
}
