//! Domain types — the core data model for scheduled blog publishing.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// A "People Also Ask" style question/answer pair attached to a post
/// (Answer Engine Optimization).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AeoQuestion {
    pub question: String,
    pub answer: String,
}

/// A topic candidate produced by the Content Generator.
///
/// Suggestions come back as complete candidate posts: the generator fills the
/// optional fields so a suggestion can be previewed or published without a
/// second generation round. Immutable once attached to a slot or post.
///
/// Serialized camelCase: this struct is decoded directly from the generative
/// API's JSON-schema output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedTopic {
    /// Catchy, SEO-friendly blog post title.
    pub topic: String,
    /// Brief rationale for why this topic is trending or relevant.
    pub relevance: String,
    /// Full blog post body in Markdown.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Short summary, under 160 characters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Estimated read time, e.g. "5 min read".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_time: Option<String>,
    /// Cover image URI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    /// Primary geographic target, e.g. "Global", "USA".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geo_targeting: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aeo_questions: Option<Vec<AeoQuestion>>,
    /// 0-100.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seo_score: Option<u8>,
}

impl GeneratedTopic {
    /// A minimal topic carrying only a title — used for custom topics typed
    /// by the user and for the bare-niche publishing fallback. Content is
    /// generated lazily when the slot is published.
    pub fn bare(title: &str) -> Self {
        Self {
            topic: title.to_string(),
            relevance: String::new(),
            content: None,
            excerpt: None,
            keywords: None,
            category: None,
            read_time: None,
            cover_image: None,
            geo_targeting: None,
            aeo_questions: None,
            seo_score: None,
        }
    }
}

/// Publication status of a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Draft,
    Published,
    /// Waiting for `scheduled_date`; promoted to `Published` by the due-post
    /// sweep.
    Scheduled,
}

/// A blog post — authored manually, produced by the Due-Slot Publisher, or by
/// the Niche-Trigger Sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    /// URL-safe identifier derived from the title unless overridden.
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    /// Markdown body.
    pub content: String,
    pub keywords: Vec<String>,
    pub category: String,
    pub date_created: DateTime<Utc>,
    pub status: PostStatus,
    pub read_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    /// Only meaningful while `status == Scheduled`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geo_targeting: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aeo_questions: Option<Vec<AeoQuestion>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seo_score: Option<u8>,
}

/// A recurring niche publishing schedule created by the user.
///
/// Immutable once slots exist for it, except for deletion. Deleting a
/// schedule does not delete already-materialized slots — orphaned slots stay
/// actionable through their denormalized niche copy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NicheSchedule {
    pub id: String,
    /// Subject driving topic generation, e.g. "Personal Finance".
    pub niche: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Daily launch time (HH:MM wall clock).
    pub launch_time: NaiveTime,
    /// How many topic candidates to prefetch per slot.
    #[serde(default = "default_suggestion_count")]
    pub suggestion_count: u32,
}

pub(crate) fn default_suggestion_count() -> u32 {
    5
}

impl NicheSchedule {
    pub fn new(niche: &str, start: NaiveDate, end: NaiveDate, launch: NaiveTime) -> Self {
        Self {
            id: new_id("sched"),
            niche: niche.to_string(),
            start_date: start,
            end_date: end,
            launch_time: launch,
            suggestion_count: default_suggestion_count(),
        }
    }

    /// Date-range containment against a calendar day (local midnight
    /// semantics: both sides are plain calendar dates, no timezone).
    pub fn covers(&self, day: NaiveDate) -> bool {
        self.start_date <= day && day <= self.end_date
    }
}

/// Lifecycle state of a scheduled slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotStatus {
    /// Waiting for topic suggestions and/or a human choice.
    PendingSelection,
    /// A topic is locked in; will be published when due.
    Ready,
    /// Terminal. No further mutation.
    Published,
}

/// A single scheduled publishing opportunity (one date + time) belonging to a
/// niche schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledSlot {
    pub id: String,
    /// Owning schedule; slots survive schedule deletion (orphanable).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule_id: Option<String>,
    /// Denormalized niche copy — survives schedule deletion.
    pub niche: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub status: SlotStatus,
    /// Populated at most once per slot by the Topic Prefetcher.
    #[serde(default)]
    pub suggested_topics: Vec<GeneratedTopic>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_topic: Option<GeneratedTopic>,
    #[serde(default = "default_suggestion_count")]
    pub suggestion_count: u32,
}

impl ScheduledSlot {
    /// Create a fresh pending slot for one day of a schedule.
    pub fn for_schedule(schedule: &NicheSchedule, date: NaiveDate) -> Self {
        Self {
            id: new_id("slot"),
            schedule_id: Some(schedule.id.clone()),
            niche: schedule.niche.clone(),
            date,
            time: schedule.launch_time,
            status: SlotStatus::PendingSelection,
            suggested_topics: Vec::new(),
            selected_topic: None,
            suggestion_count: schedule.suggestion_count,
        }
    }

    /// Whether the slot's publish instant has been reached.
    pub fn is_due(&self, now: chrono::NaiveDateTime) -> bool {
        self.date.and_time(self.time) <= now
    }
}

/// A style-guide / fact-sheet / example entry that conditions generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingData {
    pub id: String,
    pub title: String,
    /// The training text itself.
    pub content: String,
    /// "style", "knowledge", or "example".
    pub kind: String,
    pub date_added: DateTime<Utc>,
}

/// Format the accumulated training entries into the style-context string fed
/// to every generator call: `[TYPE] Title: Content`, joined by blank lines.
pub fn training_context(entries: &[TrainingData]) -> String {
    entries
        .iter()
        .map(|d| format!("[{}] {}: {}", d.kind.to_uppercase(), d.title, d.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Derive a URL-safe slug from a title: lowercase, drop non-word characters,
/// collapse whitespace/underscores/hyphens into single hyphens.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut last_was_sep = true;
    for c in title.chars() {
        if c.is_alphanumeric() {
            for lc in c.to_lowercase() {
                slug.push(lc);
            }
            last_was_sep = false;
        } else if c.is_whitespace() || c == '-' || c == '_' {
            if !last_was_sep {
                slug.push('-');
                last_was_sep = true;
            }
        }
        // Other punctuation is dropped entirely.
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Generate a fresh unique record id with a readable prefix.
pub fn new_id(prefix: &str) -> String {
    format!("{prefix}-{}", uuid::Uuid::new_v4())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_basic() {
        assert_eq!(slugify("The Future of AI!"), "the-future-of-ai");
        assert_eq!(slugify("  spaced   out  "), "spaced-out");
        assert_eq!(slugify("Under_scores and-hyphens"), "under-scores-and-hyphens");
        assert_eq!(slugify("C'est déjà ça"), "cest-déjà-ça");
    }

    #[test]
    fn training_context_format() {
        let entries = vec![
            TrainingData {
                id: "t1".into(),
                title: "Voice".into(),
                content: "Write in second person.".into(),
                kind: "style".into(),
                date_added: Utc::now(),
            },
            TrainingData {
                id: "t2".into(),
                title: "Facts".into(),
                content: "Founded 2020.".into(),
                kind: "knowledge".into(),
                date_added: Utc::now(),
            },
        ];
        let ctx = training_context(&entries);
        assert_eq!(
            ctx,
            "[STYLE] Voice: Write in second person.\n\n[KNOWLEDGE] Facts: Founded 2020."
        );
    }

    #[test]
    fn schedule_covers_range_inclusive() {
        let s = NicheSchedule::new(
            "Travel",
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        );
        assert!(s.covers(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()));
        assert!(s.covers(NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()));
        assert!(!s.covers(NaiveDate::from_ymd_opt(2024, 5, 31).unwrap()));
        assert!(!s.covers(NaiveDate::from_ymd_opt(2024, 6, 4).unwrap()));
    }

    #[test]
    fn slot_due_check() {
        let sched = NicheSchedule::new(
            "Travel",
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        );
        let slot = ScheduledSlot::for_schedule(&sched, sched.start_date);
        let before = NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(8, 59, 0)
            .unwrap();
        let at = NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        assert!(!slot.is_due(before));
        assert!(slot.is_due(at));
    }

    #[test]
    fn slot_serde_roundtrip_keeps_suggestions() {
        let sched = NicheSchedule::new(
            "Tech",
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            NaiveTime::from_hms_opt(7, 30, 0).unwrap(),
        );
        let mut slot = ScheduledSlot::for_schedule(&sched, sched.start_date);
        slot.suggested_topics.push(GeneratedTopic::bare("A"));
        let json = serde_json::to_string(&slot).unwrap();
        let back: ScheduledSlot = serde_json::from_str(&json).unwrap();
        assert_eq!(back.suggested_topics.len(), 1);
        assert_eq!(back.status, SlotStatus::PendingSelection);
        assert_eq!(back.time, sched.launch_time);
    }
}
