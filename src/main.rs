//! # AutoBlog — autonomous blog scheduling and publishing engine
//!
//! Usage:
//!   autoblog run                                  # Start the scheduler daemon
//!   autoblog schedule add --niche "Travel" \
//!       --start 2026-09-01 --end 2026-09-30 --launch 09:00
//!   autoblog slots                                # Inspect upcoming slots
//!   autoblog select <slot-id> <index>             # Lock in a suggested topic
//!   autoblog publish <slot-id>                    # Publish a slot right now

use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use chrono::{Local, NaiveDate, NaiveTime, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use autoblog_core::config::AutoblogConfig;
use autoblog_core::types::{NicheSchedule, TrainingData, new_id};
use autoblog_generator::gemini::GeminiGenerator;
use autoblog_scheduler::{
    DuePublisher, Supervisor, add_custom_topic, materialize, select_topic, unlock,
};
use autoblog_store::BlogStore;

#[derive(Parser)]
#[command(name = "autoblog", version, about = "📰 AutoBlog — autonomous blog publishing engine")]
struct Cli {
    /// Config file path (default: ~/.autoblog/config.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the scheduler daemon (all background loops)
    Run,
    /// Manage niche publishing schedules
    Schedule {
        #[command(subcommand)]
        action: ScheduleAction,
    },
    /// List upcoming scheduled slots
    Slots,
    /// Lock in one of a slot's suggested topics (by zero-based index)
    Select { slot_id: String, index: usize },
    /// Revert a ready slot to pending selection
    Unlock { slot_id: String },
    /// Lock in a custom topic typed by hand
    Topic { slot_id: String, title: String },
    /// Generate and publish a slot immediately
    Publish { slot_id: String },
    /// List published and scheduled posts
    Posts,
    /// Manage training data that conditions generation
    Training {
        #[command(subcommand)]
        action: TrainingAction,
    },
}

#[derive(Subcommand)]
enum ScheduleAction {
    /// Create a schedule and materialize its first slots
    Add {
        #[arg(long)]
        niche: String,
        /// First publishing day (YYYY-MM-DD)
        #[arg(long)]
        start: NaiveDate,
        /// Last publishing day, inclusive (YYYY-MM-DD)
        #[arg(long)]
        end: NaiveDate,
        /// Daily launch time (HH:MM)
        #[arg(long)]
        launch: String,
        /// Topic candidates to prefetch per slot
        #[arg(long, default_value = "5")]
        suggestions: u32,
    },
    /// List schedules
    List,
    /// Delete a schedule (already-materialized slots are kept)
    Remove { id: String },
}

#[derive(Subcommand)]
enum TrainingAction {
    /// Add a training entry ("style", "knowledge", or "example")
    Add {
        #[arg(long)]
        kind: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: String,
    },
    /// List training entries
    List,
    /// Remove a training entry
    Remove { id: String },
}

fn expand_path(p: &str) -> String {
    shellexpand::tilde(p).to_string()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "autoblog=debug,autoblog_scheduler=debug,autoblog_generator=debug"
    } else {
        "autoblog=info,autoblog_scheduler=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let config = match &cli.config {
        Some(path) => AutoblogConfig::load_from(std::path::Path::new(path))?,
        None => AutoblogConfig::load()?,
    };

    let db_path = expand_path(&config.store.db_path);
    if let Some(parent) = std::path::Path::new(&db_path).parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating store directory for {db_path}"))?;
    }
    let store = Arc::new(BlogStore::open(std::path::Path::new(&db_path))?);

    match cli.command {
        Command::Run => run_daemon(store, &config, &db_path).await,
        Command::Schedule { action } => schedule_command(&store, &config, action),
        Command::Slots => {
            for slot in store.list_slots()? {
                let topic = slot
                    .selected_topic
                    .as_ref()
                    .map(|t| t.topic.as_str())
                    .unwrap_or("—");
                println!(
                    "{}  {} {}  [{:?}]  {} suggestion(s)  topic: {}",
                    slot.id,
                    slot.date,
                    slot.time.format("%H:%M"),
                    slot.status,
                    slot.suggested_topics.len(),
                    topic,
                );
            }
            Ok(())
        }
        Command::Select { slot_id, index } => {
            let slot = store.get_slot(&slot_id)?;
            let topic = slot
                .suggested_topics
                .get(index)
                .cloned()
                .ok_or_else(|| anyhow!("slot has no suggestion at index {index}"))?;
            let updated = select_topic(&store, &slot_id, topic)?;
            println!("✅ Locked '{}'", updated.selected_topic.map(|t| t.topic).unwrap_or_default());
            Ok(())
        }
        Command::Unlock { slot_id } => {
            unlock(&store, &slot_id)?;
            println!("🔓 Slot {slot_id} back to pending selection");
            Ok(())
        }
        Command::Topic { slot_id, title } => {
            add_custom_topic(&store, &slot_id, &title)?;
            println!("✅ Locked custom topic '{title}'");
            Ok(())
        }
        Command::Publish { slot_id } => {
            let generator = Arc::new(GeminiGenerator::new(&config.generator)?);
            let guard = Arc::new(tokio::sync::Semaphore::new(1));
            let publisher =
                DuePublisher::new(store.clone(), generator, guard, &config.generator.tone);
            let post = publisher.force_publish(&slot_id).await?;
            println!("🚀 Published '{}' ({})", post.title, post.slug);
            Ok(())
        }
        Command::Posts => {
            for post in store.list_posts()? {
                println!(
                    "{}  [{:?}]  {}  ({})",
                    post.id, post.status, post.title, post.category
                );
            }
            Ok(())
        }
        Command::Training { action } => training_command(&store, action),
    }
}

async fn run_daemon(store: Arc<BlogStore>, config: &AutoblogConfig, db_path: &str) -> Result<()> {
    let generator = Arc::new(GeminiGenerator::new(&config.generator)?);

    println!("📰 AutoBlog v{}", env!("CARGO_PKG_VERSION"));
    println!("   🗄️  Database: {db_path}");
    println!("   🤖 Model:    {}", config.generator.model);
    println!("   📅 Horizon:  {} days", config.scheduler.horizon_days);
    println!();

    let supervisor = Supervisor::start(
        store,
        generator,
        &config.scheduler,
        &config.generator.tone,
    );

    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;
    supervisor.shutdown().await;
    Ok(())
}

fn schedule_command(
    store: &Arc<BlogStore>,
    config: &AutoblogConfig,
    action: ScheduleAction,
) -> Result<()> {
    match action {
        ScheduleAction::Add {
            niche,
            start,
            end,
            launch,
            suggestions,
        } => {
            if end < start {
                return Err(anyhow!("end date is before start date"));
            }
            let launch_time = NaiveTime::parse_from_str(&launch, "%H:%M")
                .with_context(|| format!("invalid launch time '{launch}', expected HH:MM"))?;
            let schedule = NicheSchedule {
                suggestion_count: suggestions,
                ..NicheSchedule::new(&niche, start, end, launch_time)
            };
            store.upsert_schedule(&schedule)?;
            // Materialize immediately so slots show up without waiting for the
            // next daemon sweep.
            let created = materialize(
                store,
                &schedule,
                Local::now().date_naive(),
                config.scheduler.horizon_days,
            )?;
            println!(
                "📅 Schedule {} created for '{niche}', {} slot(s) materialized",
                schedule.id,
                created.len()
            );
            Ok(())
        }
        ScheduleAction::List => {
            for s in store.list_schedules()? {
                println!(
                    "{}  {}  {} → {}  at {}",
                    s.id,
                    s.niche,
                    s.start_date,
                    s.end_date,
                    s.launch_time.format("%H:%M"),
                );
            }
            Ok(())
        }
        ScheduleAction::Remove { id } => {
            store.delete_schedule(&id)?;
            println!("🗑️  Schedule {id} removed (existing slots kept)");
            Ok(())
        }
    }
}

fn training_command(store: &Arc<BlogStore>, action: TrainingAction) -> Result<()> {
    match action {
        TrainingAction::Add { kind, title, content } => {
            let entry = TrainingData {
                id: new_id("train"),
                title,
                content,
                kind,
                date_added: Utc::now(),
            };
            store.upsert_training(&entry)?;
            println!("💾 Training entry {} added", entry.id);
            Ok(())
        }
        TrainingAction::List => {
            for t in store.list_training()? {
                println!("{}  [{}]  {}", t.id, t.kind, t.title);
            }
            Ok(())
        }
        TrainingAction::Remove { id } => {
            store.delete_training(&id)?;
            println!("🗑️  Training entry {id} removed");
            Ok(())
        }
    }
}
