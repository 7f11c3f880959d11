//! Test support: a scriptable in-memory Content Generator.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;

use autoblog_core::error::{AutoblogError, Result};
use autoblog_core::types::GeneratedTopic;
use autoblog_generator::{ContentGenerator, DraftContent};

/// A generator whose responses are scripted per call. When a script queue is
/// empty the mock falls back to a minimal successful response, so tests only
/// script the interesting calls.
#[derive(Default)]
pub struct MockGenerator {
    topic_script: Mutex<VecDeque<Result<Vec<GeneratedTopic>>>>,
    post_script: Mutex<VecDeque<Result<DraftContent>>>,
    pub topic_calls: AtomicU32,
    pub post_calls: AtomicU32,
    /// Last (topic, tone, context) passed to `write_full_post`.
    pub last_post_request: Mutex<Option<(String, String, String)>>,
    /// Last (niche, context, count) passed to `suggest_topics`.
    pub last_topic_request: Mutex<Option<(String, String, u32)>>,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script_topics(&self, result: Result<Vec<GeneratedTopic>>) {
        self.topic_script.lock().unwrap().push_back(result);
    }

    pub fn script_post(&self, result: Result<DraftContent>) {
        self.post_script.lock().unwrap().push_back(result);
    }

    pub fn draft(title: &str) -> DraftContent {
        DraftContent {
            title: Some(title.to_string()),
            content: Some(format!("## {title}\n\nBody.")),
            excerpt: Some("An excerpt.".to_string()),
            keywords: Some(vec!["k1".into(), "k2".into()]),
            category: Some("Tech".to_string()),
            read_time: Some("4 min read".to_string()),
            geo_targeting: Some("Global".to_string()),
            aeo_questions: Some(vec![]),
            seo_score: Some(90),
        }
    }
}

#[async_trait]
impl ContentGenerator for MockGenerator {
    async fn suggest_topics(
        &self,
        niche: &str,
        style_context: &str,
        count: u32,
    ) -> Result<Vec<GeneratedTopic>> {
        self.topic_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_topic_request.lock().unwrap() =
            Some((niche.to_string(), style_context.to_string(), count));
        if let Some(scripted) = self.topic_script.lock().unwrap().pop_front() {
            return scripted;
        }
        Ok((0..count)
            .map(|i| GeneratedTopic::bare(&format!("{niche} idea {i}")))
            .collect())
    }

    async fn write_full_post(
        &self,
        topic: &str,
        tone: &str,
        style_context: &str,
    ) -> Result<DraftContent> {
        self.post_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_post_request.lock().unwrap() =
            Some((topic.to_string(), tone.to_string(), style_context.to_string()));
        if let Some(scripted) = self.post_script.lock().unwrap().pop_front() {
            return scripted;
        }
        Ok(Self::draft(topic))
    }

    async fn render_cover_art(&self, topic: &str) -> Result<String> {
        Ok(format!("https://img.test/{topic}"))
    }
}

/// A generator that always fails hard — for abort-path tests.
pub struct FailingGenerator;

#[async_trait]
impl ContentGenerator for FailingGenerator {
    async fn suggest_topics(&self, _: &str, _: &str, _: u32) -> Result<Vec<GeneratedTopic>> {
        Err(AutoblogError::HardGeneration("down".into()))
    }

    async fn write_full_post(&self, _: &str, _: &str, _: &str) -> Result<DraftContent> {
        Err(AutoblogError::HardGeneration("down".into()))
    }

    async fn render_cover_art(&self, _: &str) -> Result<String> {
        Err(AutoblogError::HardGeneration("down".into()))
    }
}
