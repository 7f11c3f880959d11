//! Supervisor — owns the periodic background loops.
//!
//! Five loops, each on its own tokio::interval:
//! - due-post promoter (1s)
//! - topic prefetch (5s)
//! - due-slot publish (5s)
//! - niche-trigger sweep (60s)
//! - slot materializer sweep (60s, 7-day rolling horizon)
//!
//! Every loop listens on a shared watch channel so `shutdown()` stops them
//! all cleanly. A failed tick is logged and never stops subsequent ticks.

use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use tokio::sync::{Semaphore, watch};
use tokio::task::JoinHandle;

use autoblog_core::config::SchedulerConfig;
use autoblog_generator::ContentGenerator;
use autoblog_store::BlogStore;

use crate::materialize::materialize;
use crate::prefetch::TopicPrefetcher;
use crate::promoter::promote_due_posts;
use crate::publisher::DuePublisher;
use crate::trigger::NicheTrigger;

/// Handle over the running background loops.
pub struct Supervisor {
    shutdown: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl Supervisor {
    /// Spawn all periodic loops and return a handle to stop them.
    pub fn start(
        store: Arc<BlogStore>,
        generator: Arc<dyn ContentGenerator>,
        config: &SchedulerConfig,
        tone: &str,
    ) -> Self {
        let (shutdown, _) = watch::channel(false);
        // One permit shared by the due-slot publisher and the niche trigger:
        // at most one AI publish pipeline in flight system-wide.
        let guard = Arc::new(Semaphore::new(1));

        let publisher = Arc::new(DuePublisher::new(
            store.clone(),
            generator.clone(),
            guard.clone(),
            tone,
        ));
        let prefetcher = Arc::new(TopicPrefetcher::new(store.clone(), generator.clone()));
        let trigger = Arc::new(NicheTrigger::new(
            store.clone(),
            generator.clone(),
            guard,
            tone,
        ));

        tracing::info!(
            "⏰ Scheduler started (promote {}s, prefetch {}s, publish {}s, trigger {}s, materialize {}s)",
            config.promote_interval_secs,
            config.prefetch_interval_secs,
            config.publish_interval_secs,
            config.trigger_interval_secs,
            config.materialize_interval_secs,
        );

        let mut handles = Vec::new();

        {
            let store = store.clone();
            handles.push(spawn_loop(
                "promoter",
                config.promote_interval_secs,
                shutdown.subscribe(),
                move || {
                    let store = store.clone();
                    async move {
                        let promoted = promote_due_posts(&store, chrono::Utc::now())?;
                        for id in &promoted {
                            tracing::debug!("🚀 Promoted {id}");
                        }
                        Ok(())
                    }
                },
            ));
        }

        handles.push(spawn_loop(
            "prefetch",
            config.prefetch_interval_secs,
            shutdown.subscribe(),
            move || {
                let prefetcher = prefetcher.clone();
                async move {
                    prefetcher.tick().await?;
                    Ok(())
                }
            },
        ));

        handles.push(spawn_loop(
            "publisher",
            config.publish_interval_secs,
            shutdown.subscribe(),
            move || {
                let publisher = publisher.clone();
                async move {
                    publisher.tick(Local::now().naive_local()).await?;
                    Ok(())
                }
            },
        ));

        handles.push(spawn_loop(
            "trigger",
            config.trigger_interval_secs,
            shutdown.subscribe(),
            move || {
                let trigger = trigger.clone();
                async move {
                    match trigger.tick(Local::now().naive_local()).await {
                        // A busy pipeline is an expected skip, not a failure.
                        Err(autoblog_core::error::AutoblogError::Busy) => Ok(()),
                        other => other.map(|_| ()),
                    }
                }
            },
        ));

        {
            let horizon = config.horizon_days;
            handles.push(spawn_loop(
                "materialize",
                config.materialize_interval_secs,
                shutdown.subscribe(),
                move || {
                    let store = store.clone();
                    async move {
                        let today = Local::now().date_naive();
                        for schedule in store.list_schedules()? {
                            materialize(&store, &schedule, today, horizon)?;
                        }
                        Ok(())
                    }
                },
            ));
        }

        Self { shutdown, handles }
    }

    /// Stop every loop and wait for them to finish.
    pub async fn shutdown(self) {
        tracing::info!("🛑 Scheduler shutting down");
        let _ = self.shutdown.send(true);
        for handle in self.handles {
            let _ = handle.await;
        }
    }
}

/// Spawn one periodic loop: run `tick` every `secs` seconds until the
/// shutdown flag flips. Tick errors are logged, never fatal.
fn spawn_loop<F, Fut>(
    name: &'static str,
    secs: u64,
    mut shutdown: watch::Receiver<bool>,
    tick: F,
) -> JoinHandle<()>
where
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = autoblog_core::error::Result<()>> + Send + 'static,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(secs.max(1)));
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = tick().await {
                        tracing::warn!("⚠️ {name} tick failed: {e}");
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        tracing::debug!("{name} loop stopped");
                        break;
                    }
                }
            }
        }
    })
}
