//! # AutoBlog Core
//!
//! Shared foundation for the AutoBlog engine: domain types (posts, niche
//! schedules, scheduled slots, training data), the error taxonomy, and the
//! TOML configuration system.
//!
//! Everything here is plain data + helpers; the interesting behavior lives in
//! `autoblog-store` (persistence), `autoblog-generator` (AI calls), and
//! `autoblog-scheduler` (the autonomous publishing loop).

pub mod config;
pub mod error;
pub mod types;

pub use config::AutoblogConfig;
pub use error::{AutoblogError, Result};
pub use types::{
    AeoQuestion, GeneratedTopic, NicheSchedule, Post, PostStatus, ScheduledSlot, SlotStatus,
    TrainingData,
};
