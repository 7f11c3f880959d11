//! Due-post promoter — flips `scheduled` posts to `published` when their
//! scheduled instant passes.
//!
//! This sweep handles posts scheduled directly (outside the slot pipeline).
//! It runs every second so a post goes live within a second of its time.

use chrono::{DateTime, Utc};

use autoblog_core::error::Result;
use autoblog_core::types::PostStatus;
use autoblog_store::BlogStore;

/// One sweep: every `scheduled` post whose `scheduled_date` is at or before
/// `now` becomes `published`, with `date_created` set to the promotion
/// instant and the scheduled date cleared. Returns the promoted post ids.
pub fn promote_due_posts(store: &BlogStore, now: DateTime<Utc>) -> Result<Vec<String>> {
    let mut promoted = Vec::new();
    for mut post in store.list_posts()? {
        if post.status != PostStatus::Scheduled {
            continue;
        }
        let Some(due) = post.scheduled_date else {
            continue;
        };
        if due > now {
            continue;
        }
        post.status = PostStatus::Published;
        post.date_created = now;
        post.scheduled_date = None;
        store.upsert_post(&post)?;
        tracing::info!("🚀 Published scheduled post '{}'", post.title);
        promoted.push(post.id);
    }
    Ok(promoted)
}
