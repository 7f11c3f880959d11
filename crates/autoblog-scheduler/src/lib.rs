//! # AutoBlog Scheduler
//!
//! The autonomous scheduling and publication loop.
//!
//! ## Architecture
//! ```text
//! NicheSchedule ──materialize──▶ ScheduledSlot(s)      [pending_selection]
//!                                     │
//!                     prefetch fills suggestedTopics   [still pending]
//!                                     │
//!                     approval locks a chosen topic    [ready]
//!                                     │
//!                     due-slot publisher at date+time  [published] ──▶ Post
//!
//! NicheSchedule ──launch-time trigger──▶ Post          (bypasses slots)
//! Post(scheduled) ──due-post promoter──▶ Post(published)
//! ```
//!
//! The Due-Slot Publisher and the Niche-Trigger Sweep share one single-slot
//! semaphore, so at most one AI publish pipeline is in flight system-wide.
//! The Topic Prefetcher deliberately runs outside that guard to stay
//! responsive (it is single-flight by construction: one slot per tick).
//!
//! All periodic tasks live under the [`supervisor::Supervisor`], each
//! independently cancellable on shutdown. A failed tick never stops
//! subsequent ticks.

pub mod approval;
pub mod materialize;
pub mod prefetch;
pub mod promoter;
pub mod publisher;
pub mod supervisor;
pub mod trigger;

#[cfg(test)]
pub(crate) mod testing;

pub use approval::{add_custom_topic, select_topic, unlock};
pub use materialize::materialize;
pub use prefetch::TopicPrefetcher;
pub use promoter::promote_due_posts;
pub use publisher::DuePublisher;
pub use supervisor::Supervisor;
pub use trigger::NicheTrigger;
