use async_trait::async_trait;
use uuid::Uuid;

use crate::error::DatabaseError;
use crate::history::{
    Checkpoint, CoachFilter, CoachRecord, JobFilter, JobListing, MemoryRecord, ProfilePatch,
    ProfileRecord, SavedJobRecord, SessionRecord,
};

mod memory;

pub use memory::MemoryStore;

/// Durable, append-only checkpoint storage keyed by thread id.
///
/// The run controller assumes at most one writer per thread at a time;
/// the store does not enforce that.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Idempotently provision the underlying storage.
    ///
    /// "Already exists" is success. Any other failure is fatal: callers
    /// must abort startup rather than run memory-only.
    async fn initialize(&self) -> Result<(), DatabaseError>;

    /// Return the most recent checkpoint for a thread, if any.
    async fn load(&self, thread_id: &str) -> Result<Option<Checkpoint>, DatabaseError>;

    /// Durably append a new checkpoint. All-or-nothing.
    async fn append(&self, thread_id: &str, checkpoint: &Checkpoint) -> Result<(), DatabaseError>;

    /// Release underlying connections. Safe even after a failed
    /// `initialize()`.
    async fn close(&self);
}

/// Domain persistence used by the built-in tools.
#[async_trait]
pub trait Database: Send + Sync {
    // --- User profiles ---

    async fn get_profile(&self, user_id: &str) -> Result<Option<ProfileRecord>, DatabaseError>;

    /// Create or update a profile; unset patch fields keep existing values.
    async fn upsert_profile(
        &self,
        user_id: &str,
        patch: ProfilePatch,
    ) -> Result<ProfileRecord, DatabaseError>;

    // --- Job listings & saves ---

    async fn upsert_job_listings(&self, listings: &[JobListing]) -> Result<u64, DatabaseError>;

    async fn search_job_listings(&self, filter: &JobFilter)
        -> Result<Vec<JobListing>, DatabaseError>;

    async fn get_job_listing(&self, id: Uuid) -> Result<Option<JobListing>, DatabaseError>;

    async fn save_job(
        &self,
        user_id: &str,
        job_id: Uuid,
        notes: Option<&str>,
    ) -> Result<(), DatabaseError>;

    async fn list_saved_jobs(
        &self,
        user_id: &str,
        status: Option<&str>,
    ) -> Result<Vec<SavedJobRecord>, DatabaseError>;

    /// Returns false if the user has not saved the job.
    async fn update_saved_job_status(
        &self,
        user_id: &str,
        job_id: Uuid,
        status: &str,
    ) -> Result<bool, DatabaseError>;

    // --- Coaches & sessions ---

    async fn find_coaches(&self, filter: &CoachFilter) -> Result<Vec<CoachRecord>, DatabaseError>;

    async fn get_coach(&self, id: Uuid) -> Result<Option<CoachRecord>, DatabaseError>;

    async fn insert_session(&self, session: &SessionRecord) -> Result<(), DatabaseError>;

    async fn list_sessions(
        &self,
        user_id: &str,
        status: Option<&str>,
    ) -> Result<Vec<SessionRecord>, DatabaseError>;

    /// Returns false if no scheduled session matched for this user.
    async fn cancel_session(
        &self,
        session_id: Uuid,
        user_id: &str,
        reason: Option<&str>,
    ) -> Result<bool, DatabaseError>;

    // --- User memory ---

    async fn list_memories(&self, user_id: &str) -> Result<Vec<MemoryRecord>, DatabaseError>;

    async fn save_memory(
        &self,
        user_id: &str,
        kind: &str,
        content: &str,
    ) -> Result<(), DatabaseError>;
}
