//! PostgreSQL store for persisting agent data.
//!
//! One pool backs both the checkpoint log and the domain tables the
//! built-in tools write to. Provisioning happens in
//! [`CheckpointStore::initialize`]; the DDL is idempotent so concurrent
//! startup of several replicas is safe.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deadpool_postgres::{Config, Pool, Runtime};
use tokio_postgres::NoTls;
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::db::{CheckpointStore, Database};
use crate::error::DatabaseError;
use crate::history::Checkpoint;

/// A user's career profile row.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ProfileRecord {
    pub user_id: String,
    pub role_preference: Option<String>,
    pub trinity: Option<String>,
    pub experience_years: Option<i32>,
    pub industries: Vec<String>,
    pub location: Option<String>,
    pub remote_preference: Option<String>,
    pub day_rate_min: Option<i32>,
    pub day_rate_max: Option<i32>,
    pub availability: Option<String>,
    pub current_step: i32,
    pub onboarding_completed: bool,
    pub updated_at: DateTime<Utc>,
}

/// Partial profile update; unset fields keep their current values.
#[derive(Debug, Clone, Default)]
pub struct ProfilePatch {
    pub role_preference: Option<String>,
    pub trinity: Option<String>,
    pub experience_years: Option<i32>,
    pub industries: Option<Vec<String>>,
    pub location: Option<String>,
    pub remote_preference: Option<String>,
    pub day_rate_min: Option<i32>,
    pub day_rate_max: Option<i32>,
    pub availability: Option<String>,
    pub current_step: Option<i32>,
    pub onboarding_completed: Option<bool>,
}

/// A job opportunity, from the web or seeded locally.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct JobListing {
    pub id: Uuid,
    pub title: String,
    pub company: Option<String>,
    pub role_type: Option<String>,
    pub engagement_type: Option<String>,
    pub location: Option<String>,
    pub remote: Option<String>,
    pub day_rate_min: Option<i32>,
    pub day_rate_max: Option<i32>,
    pub industries: Vec<String>,
    pub url: Option<String>,
    pub source: String,
    pub posted_at: Option<DateTime<Utc>>,
}

/// Filters for searching job listings.
#[derive(Debug, Clone, Default)]
pub struct JobFilter {
    pub role_type: Option<String>,
    pub engagement_type: Option<String>,
    pub location: Option<String>,
    pub remote_preference: Option<String>,
    pub min_day_rate: Option<i32>,
    pub max_day_rate: Option<i32>,
    pub industries: Option<Vec<String>>,
    pub limit: i64,
}

/// A job a user saved, joined with its listing title.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SavedJobRecord {
    pub job_id: Uuid,
    pub title: String,
    pub status: String,
    pub notes: Option<String>,
    pub saved_at: DateTime<Utc>,
}

/// An executive coach profile.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CoachRecord {
    pub id: Uuid,
    pub name: String,
    pub specialty: String,
    pub industries: Vec<String>,
    pub rating: f64,
    pub bio: String,
    pub rate_per_session: i32,
}

/// Filters for coach discovery.
#[derive(Debug, Clone, Default)]
pub struct CoachFilter {
    pub specialty: Option<String>,
    pub industry: Option<String>,
    pub min_rating: Option<f64>,
    pub limit: i64,
}

/// A scheduled (or cancelled) coaching session.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SessionRecord {
    pub id: Uuid,
    pub user_id: String,
    pub coach_id: Uuid,
    pub session_type: String,
    pub status: String,
    pub preferred_date: Option<String>,
    pub preferred_time: Option<String>,
    pub topic: Option<String>,
    pub cancelled_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A remembered preference or fact about a user.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct MemoryRecord {
    pub id: i64,
    pub user_id: String,
    pub kind: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Database store for the agent.
pub struct Store {
    pool: Pool,
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS checkpoints (
    id          BIGSERIAL PRIMARY KEY,
    thread_id   TEXT NOT NULL,
    payload     JSONB NOT NULL,
    created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
CREATE INDEX IF NOT EXISTS checkpoints_thread_idx ON checkpoints (thread_id, id DESC);

CREATE TABLE IF NOT EXISTS user_profiles (
    user_id              TEXT PRIMARY KEY,
    role_preference      TEXT,
    trinity              TEXT,
    experience_years     INT4,
    industries           TEXT[] NOT NULL DEFAULT '{}',
    location             TEXT,
    remote_preference    TEXT,
    day_rate_min         INT4,
    day_rate_max         INT4,
    availability         TEXT,
    current_step         INT4 NOT NULL DEFAULT 0,
    onboarding_completed BOOL NOT NULL DEFAULT FALSE,
    updated_at           TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS job_listings (
    id              UUID PRIMARY KEY,
    title           TEXT NOT NULL,
    company         TEXT,
    role_type       TEXT,
    engagement_type TEXT,
    location        TEXT,
    remote          TEXT,
    day_rate_min    INT4,
    day_rate_max    INT4,
    industries      TEXT[] NOT NULL DEFAULT '{}',
    url             TEXT,
    source          TEXT NOT NULL DEFAULT 'web',
    posted_at       TIMESTAMPTZ,
    created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS saved_jobs (
    user_id   TEXT NOT NULL,
    job_id    UUID NOT NULL REFERENCES job_listings (id),
    status    TEXT NOT NULL DEFAULT 'saved',
    notes     TEXT,
    saved_at  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    PRIMARY KEY (user_id, job_id)
);

CREATE TABLE IF NOT EXISTS coaches (
    id               UUID PRIMARY KEY,
    name             TEXT NOT NULL,
    specialty        TEXT NOT NULL,
    industries       TEXT[] NOT NULL DEFAULT '{}',
    rating           FLOAT8 NOT NULL DEFAULT 0,
    bio              TEXT NOT NULL DEFAULT '',
    rate_per_session INT4 NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS coaching_sessions (
    id               UUID PRIMARY KEY,
    user_id          TEXT NOT NULL,
    coach_id         UUID NOT NULL REFERENCES coaches (id),
    session_type     TEXT NOT NULL,
    status           TEXT NOT NULL DEFAULT 'scheduled',
    preferred_date   TEXT,
    preferred_time   TEXT,
    topic            TEXT,
    cancelled_reason TEXT,
    created_at       TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS user_memories (
    id         BIGSERIAL PRIMARY KEY,
    user_id    TEXT NOT NULL,
    kind       TEXT NOT NULL,
    content    TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
CREATE INDEX IF NOT EXISTS user_memories_user_idx ON user_memories (user_id, id);
"#;

impl Store {
    /// Create a new store and connect to the database.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let mut cfg = Config::new();
        cfg.url = Some(config.url().to_string());
        cfg.pool = Some(deadpool_postgres::PoolConfig {
            max_size: config.pool_size,
            ..Default::default()
        });

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| DatabaseError::Pool(e.to_string()))?;

        // Test connection
        let _ = pool.get().await?;

        Ok(Self { pool })
    }

    /// Get a connection from the pool.
    async fn conn(&self) -> Result<deadpool_postgres::Object, DatabaseError> {
        Ok(self.pool.get().await?)
    }

    /// Insert the default coach catalog if the table is empty.
    async fn seed_coaches(&self) -> Result<(), DatabaseError> {
        let conn = self.conn().await?;

        let row = conn.query_one("SELECT COUNT(*) FROM coaches", &[]).await?;
        let existing: i64 = row.get(0);
        if existing > 0 {
            return Ok(());
        }

        let seeds: [(&str, &str, &[&str], f64, &str, i32); 4] = [
            (
                "Alexandra Reid",
                "leadership",
                &["tech", "finance"],
                4.9,
                "Former VP Engineering turned leadership coach for scaling CTOs.",
                350,
            ),
            (
                "Marcus Oduya",
                "career_transition",
                &["tech", "retail"],
                4.7,
                "Specialises in corporate-to-fractional pivots for C-level operators.",
                300,
            ),
            (
                "Priya Nair",
                "executive_presence",
                &["finance", "healthcare"],
                4.8,
                "Board communication and public speaking for senior executives.",
                320,
            ),
            (
                "Tom Vandermeer",
                "strategy",
                &["tech", "manufacturing"],
                4.6,
                "Growth strategy and exit planning for founder-led businesses.",
                400,
            ),
        ];

        for (name, specialty, industries, rating, bio, rate) in seeds {
            let industries: Vec<String> = industries.iter().map(|s| s.to_string()).collect();
            conn.execute(
                r#"
                INSERT INTO coaches (id, name, specialty, industries, rating, bio, rate_per_session)
                VALUES (gen_random_uuid(), $1, $2, $3, $4, $5, $6)
                ON CONFLICT DO NOTHING
                "#,
                &[&name, &specialty, &industries, &rating, &bio, &rate],
            )
            .await?;
        }

        Ok(())
    }

    fn row_to_profile(row: &tokio_postgres::Row) -> ProfileRecord {
        ProfileRecord {
            user_id: row.get("user_id"),
            role_preference: row.get("role_preference"),
            trinity: row.get("trinity"),
            experience_years: row.get("experience_years"),
            industries: row.get("industries"),
            location: row.get("location"),
            remote_preference: row.get("remote_preference"),
            day_rate_min: row.get("day_rate_min"),
            day_rate_max: row.get("day_rate_max"),
            availability: row.get("availability"),
            current_step: row.get("current_step"),
            onboarding_completed: row.get("onboarding_completed"),
            updated_at: row.get("updated_at"),
        }
    }

    fn row_to_listing(row: &tokio_postgres::Row) -> JobListing {
        JobListing {
            id: row.get("id"),
            title: row.get("title"),
            company: row.get("company"),
            role_type: row.get("role_type"),
            engagement_type: row.get("engagement_type"),
            location: row.get("location"),
            remote: row.get("remote"),
            day_rate_min: row.get("day_rate_min"),
            day_rate_max: row.get("day_rate_max"),
            industries: row.get("industries"),
            url: row.get("url"),
            source: row.get("source"),
            posted_at: row.get("posted_at"),
        }
    }

    fn row_to_coach(row: &tokio_postgres::Row) -> CoachRecord {
        CoachRecord {
            id: row.get("id"),
            name: row.get("name"),
            specialty: row.get("specialty"),
            industries: row.get("industries"),
            rating: row.get("rating"),
            bio: row.get("bio"),
            rate_per_session: row.get("rate_per_session"),
        }
    }

    fn row_to_session(row: &tokio_postgres::Row) -> SessionRecord {
        SessionRecord {
            id: row.get("id"),
            user_id: row.get("user_id"),
            coach_id: row.get("coach_id"),
            session_type: row.get("session_type"),
            status: row.get("status"),
            preferred_date: row.get("preferred_date"),
            preferred_time: row.get("preferred_time"),
            topic: row.get("topic"),
            cancelled_reason: row.get("cancelled_reason"),
            created_at: row.get("created_at"),
        }
    }
}

#[async_trait]
impl CheckpointStore for Store {
    async fn initialize(&self) -> Result<(), DatabaseError> {
        let conn = self.conn().await?;

        if let Err(e) = conn.batch_execute(SCHEMA).await {
            // Concurrent replicas can race on identical DDL; "already
            // exists" means another writer won and the schema is in place.
            if e.to_string().to_lowercase().contains("already exists") {
                tracing::debug!("Schema already provisioned by a concurrent writer");
            } else {
                return Err(DatabaseError::InitializationFailed {
                    reason: e.to_string(),
                });
            }
        }
        drop(conn);

        self.seed_coaches().await?;

        tracing::info!("Checkpoint storage initialized");
        Ok(())
    }

    async fn load(&self, thread_id: &str) -> Result<Option<Checkpoint>, DatabaseError> {
        let conn = self.conn().await?;
        let row = conn
            .query_opt(
                "SELECT payload FROM checkpoints WHERE thread_id = $1 ORDER BY id DESC LIMIT 1",
                &[&thread_id],
            )
            .await?;

        match row {
            Some(row) => {
                let payload: serde_json::Value = row.get("payload");
                let checkpoint = serde_json::from_value(payload)
                    .map_err(|e| DatabaseError::Serialization(e.to_string()))?;
                Ok(Some(checkpoint))
            }
            None => Ok(None),
        }
    }

    async fn append(&self, thread_id: &str, checkpoint: &Checkpoint) -> Result<(), DatabaseError> {
        let payload = serde_json::to_value(checkpoint)
            .map_err(|e| DatabaseError::Serialization(e.to_string()))?;

        let conn = self.conn().await?;
        conn.execute(
            "INSERT INTO checkpoints (thread_id, payload) VALUES ($1, $2)",
            &[&thread_id, &payload],
        )
        .await?;

        tracing::debug!(
            thread_id,
            messages = checkpoint.messages.len(),
            interrupted = checkpoint.pending_interrupt.is_some(),
            "checkpoint appended"
        );
        Ok(())
    }

    async fn close(&self) {
        self.pool.close();
    }
}

#[async_trait]
impl Database for Store {
    async fn get_profile(&self, user_id: &str) -> Result<Option<ProfileRecord>, DatabaseError> {
        let conn = self.conn().await?;
        let row = conn
            .query_opt("SELECT * FROM user_profiles WHERE user_id = $1", &[&user_id])
            .await?;
        Ok(row.map(|r| Self::row_to_profile(&r)))
    }

    async fn upsert_profile(
        &self,
        user_id: &str,
        patch: ProfilePatch,
    ) -> Result<ProfileRecord, DatabaseError> {
        let conn = self.conn().await?;
        let row = conn
            .query_one(
                r#"
                INSERT INTO user_profiles (
                    user_id, role_preference, trinity, experience_years, industries,
                    location, remote_preference, day_rate_min, day_rate_max,
                    availability, current_step, onboarding_completed, updated_at
                ) VALUES (
                    $1, $2, $3, $4, COALESCE($5, '{}'::TEXT[]), $6, $7, $8, $9, $10,
                    COALESCE($11, 0), COALESCE($12, FALSE), NOW()
                )
                ON CONFLICT (user_id) DO UPDATE SET
                    role_preference      = COALESCE($2,  user_profiles.role_preference),
                    trinity              = COALESCE($3,  user_profiles.trinity),
                    experience_years     = COALESCE($4,  user_profiles.experience_years),
                    industries           = COALESCE($5,  user_profiles.industries),
                    location             = COALESCE($6,  user_profiles.location),
                    remote_preference    = COALESCE($7,  user_profiles.remote_preference),
                    day_rate_min         = COALESCE($8,  user_profiles.day_rate_min),
                    day_rate_max         = COALESCE($9,  user_profiles.day_rate_max),
                    availability         = COALESCE($10, user_profiles.availability),
                    current_step         = COALESCE($11, user_profiles.current_step),
                    onboarding_completed = COALESCE($12, user_profiles.onboarding_completed),
                    updated_at           = NOW()
                RETURNING *
                "#,
                &[
                    &user_id,
                    &patch.role_preference,
                    &patch.trinity,
                    &patch.experience_years,
                    &patch.industries,
                    &patch.location,
                    &patch.remote_preference,
                    &patch.day_rate_min,
                    &patch.day_rate_max,
                    &patch.availability,
                    &patch.current_step,
                    &patch.onboarding_completed,
                ],
            )
            .await?;
        Ok(Self::row_to_profile(&row))
    }

    async fn upsert_job_listings(&self, listings: &[JobListing]) -> Result<u64, DatabaseError> {
        let conn = self.conn().await?;
        let mut inserted = 0;
        for job in listings {
            inserted += conn
                .execute(
                    r#"
                    INSERT INTO job_listings (
                        id, title, company, role_type, engagement_type, location,
                        remote, day_rate_min, day_rate_max, industries, url, source, posted_at
                    ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
                    ON CONFLICT (id) DO NOTHING
                    "#,
                    &[
                        &job.id,
                        &job.title,
                        &job.company,
                        &job.role_type,
                        &job.engagement_type,
                        &job.location,
                        &job.remote,
                        &job.day_rate_min,
                        &job.day_rate_max,
                        &job.industries,
                        &job.url,
                        &job.source,
                        &job.posted_at,
                    ],
                )
                .await?;
        }
        Ok(inserted)
    }

    async fn search_job_listings(
        &self,
        filter: &JobFilter,
    ) -> Result<Vec<JobListing>, DatabaseError> {
        let conn = self.conn().await?;
        let limit = if filter.limit > 0 { filter.limit } else { 10 };
        let rows = conn
            .query(
                r#"
                SELECT * FROM job_listings
                WHERE ($1::TEXT IS NULL OR role_type = $1)
                  AND ($2::TEXT IS NULL OR engagement_type = $2)
                  AND ($3::TEXT IS NULL OR location ILIKE '%' || $3 || '%')
                  AND ($4::TEXT IS NULL OR remote = $4)
                  AND ($5::INT4 IS NULL OR day_rate_max IS NULL OR day_rate_max >= $5)
                  AND ($6::INT4 IS NULL OR day_rate_min IS NULL OR day_rate_min <= $6)
                  AND ($7::TEXT[] IS NULL OR industries && $7)
                ORDER BY posted_at DESC NULLS LAST, created_at DESC
                LIMIT $8
                "#,
                &[
                    &filter.role_type,
                    &filter.engagement_type,
                    &filter.location,
                    &filter.remote_preference,
                    &filter.min_day_rate,
                    &filter.max_day_rate,
                    &filter.industries,
                    &limit,
                ],
            )
            .await?;
        Ok(rows.iter().map(Self::row_to_listing).collect())
    }

    async fn get_job_listing(&self, id: Uuid) -> Result<Option<JobListing>, DatabaseError> {
        let conn = self.conn().await?;
        let row = conn
            .query_opt("SELECT * FROM job_listings WHERE id = $1", &[&id])
            .await?;
        Ok(row.map(|r| Self::row_to_listing(&r)))
    }

    async fn save_job(
        &self,
        user_id: &str,
        job_id: Uuid,
        notes: Option<&str>,
    ) -> Result<(), DatabaseError> {
        let conn = self.conn().await?;
        conn.execute(
            r#"
            INSERT INTO saved_jobs (user_id, job_id, status, notes)
            VALUES ($1, $2, 'saved', $3)
            ON CONFLICT (user_id, job_id) DO UPDATE SET
                notes = COALESCE($3, saved_jobs.notes)
            "#,
            &[&user_id, &job_id, &notes],
        )
        .await?;
        Ok(())
    }

    async fn list_saved_jobs(
        &self,
        user_id: &str,
        status: Option<&str>,
    ) -> Result<Vec<SavedJobRecord>, DatabaseError> {
        let conn = self.conn().await?;
        let rows = conn
            .query(
                r#"
                SELECT s.job_id, j.title, s.status, s.notes, s.saved_at
                FROM saved_jobs s
                JOIN job_listings j ON j.id = s.job_id
                WHERE s.user_id = $1 AND ($2::TEXT IS NULL OR s.status = $2)
                ORDER BY s.saved_at DESC
                "#,
                &[&user_id, &status],
            )
            .await?;
        Ok(rows
            .iter()
            .map(|r| SavedJobRecord {
                job_id: r.get("job_id"),
                title: r.get("title"),
                status: r.get("status"),
                notes: r.get("notes"),
                saved_at: r.get("saved_at"),
            })
            .collect())
    }

    async fn update_saved_job_status(
        &self,
        user_id: &str,
        job_id: Uuid,
        status: &str,
    ) -> Result<bool, DatabaseError> {
        let conn = self.conn().await?;
        let updated = conn
            .execute(
                "UPDATE saved_jobs SET status = $3 WHERE user_id = $1 AND job_id = $2",
                &[&user_id, &job_id, &status],
            )
            .await?;
        Ok(updated > 0)
    }

    async fn find_coaches(&self, filter: &CoachFilter) -> Result<Vec<CoachRecord>, DatabaseError> {
        let conn = self.conn().await?;
        let limit = if filter.limit > 0 { filter.limit } else { 5 };
        let rows = conn
            .query(
                r#"
                SELECT * FROM coaches
                WHERE ($1::TEXT IS NULL OR specialty = $1)
                  AND ($2::TEXT IS NULL OR $2 = ANY(industries))
                  AND ($3::FLOAT8 IS NULL OR rating >= $3)
                ORDER BY rating DESC
                LIMIT $4
                "#,
                &[
                    &filter.specialty,
                    &filter.industry,
                    &filter.min_rating,
                    &limit,
                ],
            )
            .await?;
        Ok(rows.iter().map(Self::row_to_coach).collect())
    }

    async fn get_coach(&self, id: Uuid) -> Result<Option<CoachRecord>, DatabaseError> {
        let conn = self.conn().await?;
        let row = conn
            .query_opt("SELECT * FROM coaches WHERE id = $1", &[&id])
            .await?;
        Ok(row.map(|r| Self::row_to_coach(&r)))
    }

    async fn insert_session(&self, session: &SessionRecord) -> Result<(), DatabaseError> {
        let conn = self.conn().await?;
        conn.execute(
            r#"
            INSERT INTO coaching_sessions (
                id, user_id, coach_id, session_type, status,
                preferred_date, preferred_time, topic, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
            &[
                &session.id,
                &session.user_id,
                &session.coach_id,
                &session.session_type,
                &session.status,
                &session.preferred_date,
                &session.preferred_time,
                &session.topic,
                &session.created_at,
            ],
        )
        .await?;
        Ok(())
    }

    async fn list_sessions(
        &self,
        user_id: &str,
        status: Option<&str>,
    ) -> Result<Vec<SessionRecord>, DatabaseError> {
        let conn = self.conn().await?;
        let rows = conn
            .query(
                r#"
                SELECT * FROM coaching_sessions
                WHERE user_id = $1 AND ($2::TEXT IS NULL OR status = $2)
                ORDER BY created_at DESC
                "#,
                &[&user_id, &status],
            )
            .await?;
        Ok(rows.iter().map(Self::row_to_session).collect())
    }

    async fn cancel_session(
        &self,
        session_id: Uuid,
        user_id: &str,
        reason: Option<&str>,
    ) -> Result<bool, DatabaseError> {
        let conn = self.conn().await?;
        let updated = conn
            .execute(
                r#"
                UPDATE coaching_sessions SET
                    status = 'cancelled',
                    cancelled_reason = $3
                WHERE id = $1 AND user_id = $2 AND status = 'scheduled'
                "#,
                &[&session_id, &user_id, &reason],
            )
            .await?;
        Ok(updated > 0)
    }

    async fn list_memories(&self, user_id: &str) -> Result<Vec<MemoryRecord>, DatabaseError> {
        let conn = self.conn().await?;
        let rows = conn
            .query(
                "SELECT * FROM user_memories WHERE user_id = $1 ORDER BY id",
                &[&user_id],
            )
            .await?;
        Ok(rows
            .iter()
            .map(|r| MemoryRecord {
                id: r.get("id"),
                user_id: r.get("user_id"),
                kind: r.get("kind"),
                content: r.get("content"),
                created_at: r.get("created_at"),
            })
            .collect())
    }

    async fn save_memory(
        &self,
        user_id: &str,
        kind: &str,
        content: &str,
    ) -> Result<(), DatabaseError> {
        let conn = self.conn().await?;
        conn.execute(
            "INSERT INTO user_memories (user_id, kind, content) VALUES ($1, $2, $3)",
            &[&user_id, &kind, &content],
        )
        .await?;
        Ok(())
    }
}
