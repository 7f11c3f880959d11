//! # AutoBlog Store
//!
//! SQLite-backed persistence for all AutoBlog records. The store is the
//! single source of truth: every scheduler state transition is written
//! through here before it counts as committed.
//!
//! Upserts are update-or-insert keyed by id. Writes are serialized per
//! connection via a mutex; no transaction spans multiple records, so callers
//! must tolerate e.g. a post existing while its slot is still unpublished
//! after a crash between the two writes.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rusqlite::{Connection, params};

use autoblog_core::error::{AutoblogError, Result};
use autoblog_core::types::{
    GeneratedTopic, NicheSchedule, Post, PostStatus, ScheduledSlot, SlotStatus, TrainingData,
};

/// The AutoBlog database — posts, niche schedules, scheduled slots, and
/// training data.
pub struct BlogStore {
    conn: Mutex<Connection>,
}

impl BlogStore {
    /// Open or create the database at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .map_err(|e| AutoblogError::Store(format!("DB open: {e}")))?;
        // WAL for better concurrent read performance
        conn.execute_batch("PRAGMA journal_mode=WAL;").ok();
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.migrate()?;
        Ok(store)
    }

    /// Open an in-memory database (tests and dry runs).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| AutoblogError::Store(format!("DB open: {e}")))?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.migrate()?;
        Ok(store)
    }

    /// Run schema migrations.
    fn migrate(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS posts (
                id TEXT PRIMARY KEY,
                slug TEXT NOT NULL,
                title TEXT NOT NULL,
                excerpt TEXT NOT NULL DEFAULT '',
                content TEXT NOT NULL DEFAULT '',
                keywords_json TEXT NOT NULL DEFAULT '[]',
                category TEXT NOT NULL DEFAULT '',
                date_created TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'draft',
                read_time TEXT NOT NULL DEFAULT '',
                cover_image TEXT,
                scheduled_date TEXT,
                geo_targeting TEXT,
                aeo_questions_json TEXT,
                seo_score INTEGER,
                seq INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS niche_schedules (
                id TEXT PRIMARY KEY,
                niche TEXT NOT NULL,
                start_date TEXT NOT NULL,
                end_date TEXT NOT NULL,
                launch_time TEXT NOT NULL,
                suggestion_count INTEGER NOT NULL DEFAULT 5,
                seq INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS scheduled_slots (
                id TEXT PRIMARY KEY,
                schedule_id TEXT,
                niche TEXT NOT NULL,
                date TEXT NOT NULL,
                time TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending_selection',
                suggested_topics_json TEXT NOT NULL DEFAULT '[]',
                selected_topic_json TEXT,
                suggestion_count INTEGER NOT NULL DEFAULT 5,
                seq INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS training_data (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                kind TEXT NOT NULL DEFAULT 'knowledge',
                date_added TEXT NOT NULL,
                seq INTEGER NOT NULL
            );
            ",
        )
        .map_err(|e| AutoblogError::Store(format!("Migration: {e}")))?;
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| AutoblogError::Store(format!("Lock: {e}")))
    }

    /// Next insertion sequence number for a table. Preserved across upserts
    /// so "stored order" stays stable for tie-breaks.
    fn next_seq(conn: &Connection, table: &str) -> i64 {
        conn.query_row(
            &format!("SELECT COALESCE(MAX(seq), 0) + 1 FROM {table}"),
            [],
            |row| row.get(0),
        )
        .unwrap_or(1)
    }

    // ─── Posts ──────────────────────────────────────

    /// Insert or update a post.
    pub fn upsert_post(&self, post: &Post) -> Result<()> {
        let conn = self.lock()?;
        let seq = Self::next_seq(&conn, "posts");
        conn.execute(
            "INSERT INTO posts
             (id, slug, title, excerpt, content, keywords_json, category, date_created,
              status, read_time, cover_image, scheduled_date, geo_targeting,
              aeo_questions_json, seo_score, seq)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
             ON CONFLICT(id) DO UPDATE SET
               slug = excluded.slug, title = excluded.title, excerpt = excluded.excerpt,
               content = excluded.content, keywords_json = excluded.keywords_json,
               category = excluded.category, date_created = excluded.date_created,
               status = excluded.status, read_time = excluded.read_time,
               cover_image = excluded.cover_image, scheduled_date = excluded.scheduled_date,
               geo_targeting = excluded.geo_targeting,
               aeo_questions_json = excluded.aeo_questions_json,
               seo_score = excluded.seo_score",
            params![
                post.id,
                post.slug,
                post.title,
                post.excerpt,
                post.content,
                json_string(&post.keywords)?,
                post.category,
                post.date_created.to_rfc3339(),
                status_str(post.status),
                post.read_time,
                post.cover_image,
                post.scheduled_date.map(|t| t.to_rfc3339()),
                post.geo_targeting,
                post.aeo_questions
                    .as_ref()
                    .map(|q| json_string(q))
                    .transpose()?,
                post.seo_score,
                seq,
            ],
        )
        .map_err(|e| AutoblogError::Store(format!("Save post: {e}")))?;
        Ok(())
    }

    /// Load all posts, newest first.
    pub fn list_posts(&self) -> Result<Vec<Post>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, slug, title, excerpt, content, keywords_json, category,
                        date_created, status, read_time, cover_image, scheduled_date,
                        geo_targeting, aeo_questions_json, seo_score
                 FROM posts ORDER BY date_created DESC",
            )
            .map_err(|e| AutoblogError::Store(format!("List posts: {e}")))?;
        let rows = stmt
            .query_map([], row_to_post)
            .map_err(|e| AutoblogError::Store(format!("List posts: {e}")))?;
        collect_rows(rows)
    }

    /// Load one post by id.
    pub fn get_post(&self, id: &str) -> Result<Post> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT id, slug, title, excerpt, content, keywords_json, category,
                    date_created, status, read_time, cover_image, scheduled_date,
                    geo_targeting, aeo_questions_json, seo_score
             FROM posts WHERE id = ?1",
            [id],
            row_to_post,
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => AutoblogError::NotFound {
                entity: "post",
                id: id.to_string(),
            },
            other => AutoblogError::Store(format!("Get post: {other}")),
        })
    }

    /// Delete a post.
    pub fn delete_post(&self, id: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM posts WHERE id = ?1", [id])
            .map_err(|e| AutoblogError::Store(format!("Delete post: {e}")))?;
        Ok(())
    }

    // ─── Niche Schedules ──────────────────────────────────────

    /// Insert or update a niche schedule.
    pub fn upsert_schedule(&self, schedule: &NicheSchedule) -> Result<()> {
        let conn = self.lock()?;
        let seq = Self::next_seq(&conn, "niche_schedules");
        conn.execute(
            "INSERT INTO niche_schedules
             (id, niche, start_date, end_date, launch_time, suggestion_count, seq)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(id) DO UPDATE SET
               niche = excluded.niche, start_date = excluded.start_date,
               end_date = excluded.end_date, launch_time = excluded.launch_time,
               suggestion_count = excluded.suggestion_count",
            params![
                schedule.id,
                schedule.niche,
                schedule.start_date.to_string(),
                schedule.end_date.to_string(),
                schedule.launch_time.format("%H:%M").to_string(),
                schedule.suggestion_count,
                seq,
            ],
        )
        .map_err(|e| AutoblogError::Store(format!("Save schedule: {e}")))?;
        Ok(())
    }

    /// Load all schedules in stored (insertion) order.
    pub fn list_schedules(&self) -> Result<Vec<NicheSchedule>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, niche, start_date, end_date, launch_time, suggestion_count
                 FROM niche_schedules ORDER BY seq",
            )
            .map_err(|e| AutoblogError::Store(format!("List schedules: {e}")))?;
        let rows = stmt
            .query_map([], row_to_schedule)
            .map_err(|e| AutoblogError::Store(format!("List schedules: {e}")))?;
        collect_rows(rows)
    }

    /// Delete a schedule. Already-materialized slots are left in place — they
    /// keep a denormalized niche copy and stay actionable.
    pub fn delete_schedule(&self, id: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM niche_schedules WHERE id = ?1", [id])
            .map_err(|e| AutoblogError::Store(format!("Delete schedule: {e}")))?;
        Ok(())
    }

    // ─── Scheduled Slots ──────────────────────────────────────

    /// Insert or update a slot.
    pub fn upsert_slot(&self, slot: &ScheduledSlot) -> Result<()> {
        let conn = self.lock()?;
        let seq = Self::next_seq(&conn, "scheduled_slots");
        conn.execute(
            "INSERT INTO scheduled_slots
             (id, schedule_id, niche, date, time, status, suggested_topics_json,
              selected_topic_json, suggestion_count, seq)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT(id) DO UPDATE SET
               schedule_id = excluded.schedule_id, niche = excluded.niche,
               date = excluded.date, time = excluded.time, status = excluded.status,
               suggested_topics_json = excluded.suggested_topics_json,
               selected_topic_json = excluded.selected_topic_json,
               suggestion_count = excluded.suggestion_count",
            params![
                slot.id,
                slot.schedule_id,
                slot.niche,
                slot.date.to_string(),
                slot.time.format("%H:%M").to_string(),
                slot_status_str(slot.status),
                json_string(&slot.suggested_topics)?,
                slot.selected_topic
                    .as_ref()
                    .map(|t| json_string(t))
                    .transpose()?,
                slot.suggestion_count,
                seq,
            ],
        )
        .map_err(|e| AutoblogError::Store(format!("Save slot: {e}")))?;
        Ok(())
    }

    /// Load all slots ordered by (date, time), insertion order as tie-break.
    pub fn list_slots(&self) -> Result<Vec<ScheduledSlot>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, schedule_id, niche, date, time, status, suggested_topics_json,
                        selected_topic_json, suggestion_count
                 FROM scheduled_slots ORDER BY date, time, seq",
            )
            .map_err(|e| AutoblogError::Store(format!("List slots: {e}")))?;
        let rows = stmt
            .query_map([], row_to_slot)
            .map_err(|e| AutoblogError::Store(format!("List slots: {e}")))?;
        collect_rows(rows)
    }

    /// Load one slot by id.
    pub fn get_slot(&self, id: &str) -> Result<ScheduledSlot> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT id, schedule_id, niche, date, time, status, suggested_topics_json,
                    selected_topic_json, suggestion_count
             FROM scheduled_slots WHERE id = ?1",
            [id],
            row_to_slot,
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => AutoblogError::NotFound {
                entity: "slot",
                id: id.to_string(),
            },
            other => AutoblogError::Store(format!("Get slot: {other}")),
        })
    }

    /// Whether a slot already exists for this (schedule, date) pair.
    pub fn slot_exists(&self, schedule_id: &str, date: NaiveDate) -> Result<bool> {
        let conn = self.lock()?;
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM scheduled_slots WHERE schedule_id = ?1 AND date = ?2",
                params![schedule_id, date.to_string()],
                |row| row.get(0),
            )
            .map_err(|e| AutoblogError::Store(format!("Slot exists: {e}")))?;
        Ok(count > 0)
    }

    /// Delete a slot.
    pub fn delete_slot(&self, id: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM scheduled_slots WHERE id = ?1", [id])
            .map_err(|e| AutoblogError::Store(format!("Delete slot: {e}")))?;
        Ok(())
    }

    // ─── Training Data ──────────────────────────────────────

    /// Insert or update a training entry.
    pub fn upsert_training(&self, data: &TrainingData) -> Result<()> {
        let conn = self.lock()?;
        let seq = Self::next_seq(&conn, "training_data");
        conn.execute(
            "INSERT INTO training_data (id, title, content, kind, date_added, seq)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(id) DO UPDATE SET
               title = excluded.title, content = excluded.content,
               kind = excluded.kind, date_added = excluded.date_added",
            params![
                data.id,
                data.title,
                data.content,
                data.kind,
                data.date_added.to_rfc3339(),
                seq,
            ],
        )
        .map_err(|e| AutoblogError::Store(format!("Save training data: {e}")))?;
        Ok(())
    }

    /// Load all training entries in stored order.
    pub fn list_training(&self) -> Result<Vec<TrainingData>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, title, content, kind, date_added FROM training_data ORDER BY seq",
            )
            .map_err(|e| AutoblogError::Store(format!("List training data: {e}")))?;
        let rows = stmt
            .query_map([], |row| {
                Ok(TrainingData {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    content: row.get(2)?,
                    kind: row.get(3)?,
                    date_added: parse_instant(&row.get::<_, String>(4)?),
                })
            })
            .map_err(|e| AutoblogError::Store(format!("List training data: {e}")))?;
        collect_rows(rows)
    }

    /// Delete a training entry.
    pub fn delete_training(&self, id: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM training_data WHERE id = ?1", [id])
            .map_err(|e| AutoblogError::Store(format!("Delete training data: {e}")))?;
        Ok(())
    }
}

// ─── Row mapping helpers ──────────────────────────────────────

fn row_to_post(row: &rusqlite::Row<'_>) -> rusqlite::Result<Post> {
    let keywords_json: String = row.get(5)?;
    let aeo_json: Option<String> = row.get(13)?;
    Ok(Post {
        id: row.get(0)?,
        slug: row.get(1)?,
        title: row.get(2)?,
        excerpt: row.get(3)?,
        content: row.get(4)?,
        keywords: serde_json::from_str(&keywords_json).unwrap_or_default(),
        category: row.get(6)?,
        date_created: parse_instant(&row.get::<_, String>(7)?),
        status: parse_status(&row.get::<_, String>(8)?),
        read_time: row.get(9)?,
        cover_image: row.get(10)?,
        scheduled_date: row
            .get::<_, Option<String>>(11)?
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|d| d.with_timezone(&Utc)),
        geo_targeting: row.get(12)?,
        aeo_questions: aeo_json.and_then(|j| serde_json::from_str(&j).ok()),
        seo_score: row.get(14)?,
    })
}

fn row_to_schedule(row: &rusqlite::Row<'_>) -> rusqlite::Result<NicheSchedule> {
    Ok(NicheSchedule {
        id: row.get(0)?,
        niche: row.get(1)?,
        start_date: parse_date(&row.get::<_, String>(2)?),
        end_date: parse_date(&row.get::<_, String>(3)?),
        launch_time: parse_time(&row.get::<_, String>(4)?),
        suggestion_count: row.get(5)?,
    })
}

fn row_to_slot(row: &rusqlite::Row<'_>) -> rusqlite::Result<ScheduledSlot> {
    let topics_json: String = row.get(6)?;
    let selected_json: Option<String> = row.get(7)?;
    Ok(ScheduledSlot {
        id: row.get(0)?,
        schedule_id: row.get(1)?,
        niche: row.get(2)?,
        date: parse_date(&row.get::<_, String>(3)?),
        time: parse_time(&row.get::<_, String>(4)?),
        status: parse_slot_status(&row.get::<_, String>(5)?),
        suggested_topics: serde_json::from_str::<Vec<GeneratedTopic>>(&topics_json)
            .unwrap_or_default(),
        selected_topic: selected_json.and_then(|j| serde_json::from_str(&j).ok()),
        suggestion_count: row.get(8)?,
    })
}

fn collect_rows<T>(
    rows: impl Iterator<Item = rusqlite::Result<T>>,
) -> Result<Vec<T>> {
    rows.collect::<rusqlite::Result<Vec<T>>>()
        .map_err(|e| AutoblogError::Store(format!("Row decode: {e}")))
}

fn json_string<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|e| AutoblogError::Store(format!("Serialize: {e}")))
}

fn status_str(status: PostStatus) -> &'static str {
    match status {
        PostStatus::Draft => "draft",
        PostStatus::Published => "published",
        PostStatus::Scheduled => "scheduled",
    }
}

fn parse_status(s: &str) -> PostStatus {
    match s {
        "published" => PostStatus::Published,
        "scheduled" => PostStatus::Scheduled,
        _ => PostStatus::Draft,
    }
}

fn slot_status_str(status: SlotStatus) -> &'static str {
    match status {
        SlotStatus::PendingSelection => "pending_selection",
        SlotStatus::Ready => "ready",
        SlotStatus::Published => "published",
    }
}

fn parse_slot_status(s: &str) -> SlotStatus {
    match s {
        "ready" => SlotStatus::Ready,
        "published" => SlotStatus::Published,
        _ => SlotStatus::PendingSelection,
    }
}

fn parse_instant(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|d| d.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn parse_date(s: &str) -> NaiveDate {
    s.parse()
        .unwrap_or_else(|_| Utc::now().date_naive())
}

fn parse_time(s: &str) -> NaiveTime {
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .unwrap_or_default()
}
