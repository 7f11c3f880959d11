//! Gemini-backed Content Generator.
//!
//! Uses `generateContent` with a JSON response schema so the model returns
//! machine-readable candidates instead of prose. Rate-limit and overload
//! responses (429/503/"overloaded") are retried with exponential backoff; a
//! request that outlives the configured timeout is a hard failure.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use autoblog_core::config::GeneratorConfig;
use autoblog_core::error::{AutoblogError, Result};
use autoblog_core::types::GeneratedTopic;

use crate::retry::retry_with_backoff;
use crate::{ContentGenerator, DraftContent, cover};

/// Content generator talking to the Gemini `generateContent` API.
#[derive(Debug)]
pub struct GeminiGenerator {
    api_key: String,
    model: String,
    base_url: String,
    max_retries: u32,
    retry_base: Duration,
    client: reqwest::Client,
}

impl GeminiGenerator {
    /// Build from configuration. API key falls back to `GEMINI_API_KEY`.
    pub fn new(config: &GeneratorConfig) -> Result<Self> {
        let api_key = if !config.api_key.is_empty() {
            config.api_key.clone()
        } else {
            std::env::var("GEMINI_API_KEY").unwrap_or_default()
        };
        if api_key.is_empty() {
            return Err(AutoblogError::Config(
                "No generator API key: set [generator].api_key or GEMINI_API_KEY".into(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AutoblogError::Http(format!("HTTP client: {e}")))?;

        Ok(Self {
            api_key,
            model: config.model.clone(),
            base_url: config.endpoint.trim_end_matches('/').to_string(),
            max_retries: config.max_retries,
            retry_base: Duration::from_millis(config.retry_base_ms),
            client,
        })
    }

    /// One `generateContent` round trip in JSON mode. Returns the raw JSON
    /// text of the first candidate.
    async fn generate_json(&self, prompt: &str, schema: Value, temperature: f32) -> Result<String> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": schema,
                "temperature": temperature,
            }
        });

        let resp = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    // A hung upstream call must not pin the publish guard.
                    AutoblogError::HardGeneration(format!("generator call timed out: {e}"))
                } else {
                    AutoblogError::Http(format!("gemini connection failed: {e}"))
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            let transient = status.as_u16() == 429
                || status.as_u16() == 503
                || text.contains("overloaded");
            return if transient {
                Err(AutoblogError::TransientGeneration(format!(
                    "gemini {status}: {text}"
                )))
            } else {
                Err(AutoblogError::HardGeneration(format!(
                    "gemini {status}: {text}"
                )))
            };
        }

        let payload: Value = resp
            .json()
            .await
            .map_err(|e| AutoblogError::HardGeneration(format!("gemini response: {e}")))?;
        payload["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| AutoblogError::HardGeneration("no content generated".into()))
    }

    async fn generate_with_retry(
        &self,
        prompt: &str,
        schema: &Value,
        temperature: f32,
    ) -> Result<String> {
        retry_with_backoff(self.max_retries, self.retry_base, || {
            self.generate_json(prompt, schema.clone(), temperature)
        })
        .await
    }
}

#[async_trait]
impl ContentGenerator for GeminiGenerator {
    async fn suggest_topics(
        &self,
        niche: &str,
        style_context: &str,
        count: u32,
    ) -> Result<Vec<GeneratedTopic>> {
        let context_prompt = if style_context.is_empty() {
            String::new()
        } else {
            format!(
                "\n\n[USER TRAINING/STYLE GUIDE]:\n{style_context}\n\nApply the above style/context to the topic suggestions."
            )
        };
        let prompt = format!(
            "Generate {count} varied, high-impact, and click-worthy complete blog posts for the niche: \"{niche}\". {context_prompt}\n\
             For each post, provide the full content, title, excerpt, and SEO/AEO metadata.\n\
             Ensure a mix of content types."
        );

        let text = self
            .generate_with_retry(&prompt, &topics_schema(), 0.7)
            .await?;
        let mut topics: Vec<GeneratedTopic> = serde_json::from_str(&text)
            .map_err(|e| AutoblogError::HardGeneration(format!("topic payload: {e}")))?;

        // The model returns an image *prompt*; swap in a real thumbnail URI.
        for topic in &mut topics {
            topic.cover_image = Some(cover::suggestion_thumbnail(&topic.topic));
        }
        tracing::debug!("💡 Generated {} topics for niche '{niche}'", topics.len());
        Ok(topics)
    }

    async fn write_full_post(
        &self,
        topic: &str,
        tone: &str,
        style_context: &str,
    ) -> Result<DraftContent> {
        let context_prompt = if style_context.is_empty() {
            String::new()
        } else {
            format!(
                "\n\n[USER TRAINING/STYLE GUIDE]:\n{style_context}\n\nSTRICTLY ADHERE to the above style guide, facts, and rules in the content generation."
            )
        };
        let geo = if tone.contains("UK") { "UK" } else { "Global/US" };
        let prompt = format!(
            "You are an expert content writer. Write a complete, high-quality blog post about \"{topic}\". {context_prompt}\n\n\
             Requirements:\n\
             1. **Content**: Comprehensive, engaging, and well-structured. **DO NOT include an H1 title**. Use H2 and H3 for headings. **DO NOT include the FAQ or \"People Also Ask\" section in this marked-down content**; providing it in the JSON aeoQuestions is sufficient.\n\
             2. **Tags**: Generate 5-7 relevant keywords/tags.\n\
             3. **People Also Ask**: Generate 4-6 conversational Q&A pairs for the \"People Also Ask\" section. **MUST include both \"question\" and \"answer\" keys for EVERY item.** DO NOT leave the answer empty.\n\
             4. **Geo**: Target {geo} audience unless specified otherwise.\n\
             5. **Tone**: {tone}.\n\n\
             Ensure the JSON output is valid and complete."
        );

        let text = self
            .generate_with_retry(&prompt, &full_post_schema(), 0.4)
            .await?;
        serde_json::from_str(&text)
            .map_err(|e| AutoblogError::HardGeneration(format!("post payload: {e}")))
    }

    async fn render_cover_art(&self, topic: &str) -> Result<String> {
        Ok(cover::cover_art_url(topic))
    }
}

/// Response schema for topic suggestion: an array of complete candidate posts.
fn topics_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "topic": { "type": "STRING", "description": "A catchy, SEO-friendly blog post title" },
                "relevance": { "type": "STRING", "description": "Brief explanation of why this is trending or relevant" },
                "content": { "type": "STRING", "description": "Full blog post in Markdown" },
                "excerpt": { "type": "STRING", "description": "Short summary under 160 characters" },
                "keywords": { "type": "ARRAY", "items": { "type": "STRING" }, "description": "5-7 keywords" },
                "category": { "type": "STRING" },
                "readTime": { "type": "STRING" },
                "geoTargeting": { "type": "STRING" },
                "aeoQuestions": {
                    "type": "ARRAY",
                    "items": {
                        "type": "OBJECT",
                        "properties": {
                            "question": { "type": "STRING" },
                            "answer": { "type": "STRING" }
                        },
                        "required": ["question", "answer"]
                    }
                },
                "seoScore": { "type": "NUMBER" },
                "coverImage": { "type": "STRING", "description": "A descriptive prompt for generating a relevant cover image for this topic." }
            },
            "required": ["topic", "relevance", "content", "excerpt", "keywords", "category",
                         "readTime", "geoTargeting", "aeoQuestions", "seoScore", "coverImage"]
        }
    })
}

/// Response schema for a single full article.
fn full_post_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "title": { "type": "STRING" },
            "content": { "type": "STRING", "description": "The full blog article in Markdown format. Use headers, bullet points, and clear paragraphs." },
            "excerpt": { "type": "STRING", "description": "A short, engaging summary (meta description) under 160 characters." },
            "keywords": { "type": "ARRAY", "items": { "type": "STRING" }, "description": "5-7 relevant tags/keywords for the post." },
            "category": { "type": "STRING", "description": "A general category for this post." },
            "readTime": { "type": "STRING", "description": "Estimated read time, e.g., '5 min read'" },
            "geoTargeting": { "type": "STRING", "description": "The primary geographic target (e.g., 'Global', 'USA')." },
            "aeoQuestions": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "question": { "type": "STRING" },
                        "answer": { "type": "STRING" }
                    },
                    "required": ["question", "answer"]
                },
                "description": "Strictly generate between 4 to 6 'People Also Ask' style Q&A pairs."
            },
            "seoScore": { "type": "NUMBER", "description": "SEO score (0-100)." }
        },
        "required": ["title", "content", "excerpt", "keywords", "category", "readTime",
                     "geoTargeting", "aeoQuestions", "seoScore"]
    })
}
