//! # AutoBlog Generator
//!
//! The Content Generator contract and its Gemini-backed implementation.
//!
//! Three capabilities, each an opaque async call that may fail transiently:
//! - `suggest_topics` — batch of complete candidate posts for a niche
//! - `write_full_post` — one full article for a chosen topic
//! - `render_cover_art` — cover image URI, best-effort
//!
//! Transient failures (rate limit / overload) are retried internally with
//! exponential backoff before surfacing to the scheduler.

pub mod cover;
pub mod gemini;
pub mod retry;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use autoblog_core::error::Result;
use autoblog_core::types::{AeoQuestion, GeneratedTopic};

/// Everything the generator returns for a full article. Fields the model
/// leaves out get literal fallback defaults at publish time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftContent {
    #[serde(default)]
    pub title: Option<String>,
    /// Markdown body (H2/H3 headings, no H1, no FAQ section).
    #[serde(default)]
    pub content: Option<String>,
    /// Meta description, under 160 characters.
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub keywords: Option<Vec<String>>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub read_time: Option<String>,
    #[serde(default)]
    pub geo_targeting: Option<String>,
    #[serde(default)]
    pub aeo_questions: Option<Vec<AeoQuestion>>,
    #[serde(default)]
    pub seo_score: Option<u8>,
}

/// The external generative capability consumed by the scheduler.
///
/// Implementations own their retry policy; callers treat every method as a
/// single opaque call that either succeeds or fails for this cycle.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Generate `count` topic candidates for a niche, conditioned on the
    /// accumulated training context.
    async fn suggest_topics(
        &self,
        niche: &str,
        style_context: &str,
        count: u32,
    ) -> Result<Vec<GeneratedTopic>>;

    /// Write a complete article about `topic` in the given tone.
    async fn write_full_post(
        &self,
        topic: &str,
        tone: &str,
        style_context: &str,
    ) -> Result<DraftContent>;

    /// Produce a cover image URI for `topic`. Best-effort: no retry, and
    /// callers fall back to [`cover::fallback_cover_art`] on failure.
    async fn render_cover_art(&self, topic: &str) -> Result<String>;
}
