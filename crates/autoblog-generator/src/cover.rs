//! Cover-art URI construction.
//!
//! Cover images are produced by a prompt-to-image CDN: the topic title is the
//! prompt, so "rendering" is URL construction plus a random seed to defeat
//! caching. Best-effort by contract — callers use [`fallback_cover_art`] if
//! the generator path fails.

use rand::Rng;

const IMAGE_BASE: &str = "https://image.pollinations.ai/prompt";

/// Build a cover image URI for a topic with a fresh random seed.
pub fn cover_art_url(topic: &str) -> String {
    let seed = rand::thread_rng().gen_range(0..1000);
    format!(
        "{IMAGE_BASE}/{}?width=800&height=400&nologo=true&seed={seed}",
        urlencoding::encode(topic)
    )
}

/// Literal fallback pattern used when cover generation fails: same CDN,
/// no seed.
pub fn fallback_cover_art(topic: &str) -> String {
    format!(
        "{IMAGE_BASE}/{}?width=800&height=400&nologo=true",
        urlencoding::encode(topic)
    )
}

/// Seeded placeholder thumbnail attached to topic suggestions (stable-ish per
/// topic, varied across batches).
pub fn suggestion_thumbnail(topic: &str) -> String {
    let seed = rand::thread_rng().gen_range(0..1000);
    let prefix: String = urlencoding::encode(topic).chars().take(10).collect();
    format!("https://picsum.photos/seed/{prefix}{seed}/800/400")
}
