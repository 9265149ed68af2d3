//! In-memory storage backend.
//!
//! Implements the same traits as the PostgreSQL store for tests and
//! `--memory-store` runs. State dies with the process; the checkpoint log
//! is still append-only so resume semantics behave identically.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::db::{CheckpointStore, Database};
use crate::error::DatabaseError;
use crate::history::{
    Checkpoint, CoachFilter, CoachRecord, JobFilter, JobListing, MemoryRecord, ProfilePatch,
    ProfileRecord, SavedJobRecord, SessionRecord,
};

#[derive(Default)]
struct Inner {
    checkpoints: HashMap<String, Vec<Checkpoint>>,
    profiles: HashMap<String, ProfileRecord>,
    listings: HashMap<Uuid, JobListing>,
    saved_jobs: HashMap<(String, Uuid), SavedJobRecord>,
    coaches: Vec<CoachRecord>,
    sessions: Vec<SessionRecord>,
    memories: Vec<MemoryRecord>,
    next_memory_id: i64,
}

/// In-memory store.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-load a job listing (test fixture helper).
    pub async fn insert_listing(&self, listing: JobListing) {
        self.inner
            .write()
            .await
            .listings
            .insert(listing.id, listing);
    }

    /// Number of checkpoints appended for a thread (test observability).
    pub async fn checkpoint_count(&self, thread_id: &str) -> usize {
        self.inner
            .read()
            .await
            .checkpoints
            .get(thread_id)
            .map_or(0, Vec::len)
    }
}

fn seed_coaches() -> Vec<CoachRecord> {
    let coach = |name: &str, specialty: &str, industries: &[&str], rating, bio: &str, rate| {
        CoachRecord {
            id: Uuid::new_v4(),
            name: name.to_string(),
            specialty: specialty.to_string(),
            industries: industries.iter().map(|s| s.to_string()).collect(),
            rating,
            bio: bio.to_string(),
            rate_per_session: rate,
        }
    };
    vec![
        coach(
            "Alexandra Reid",
            "leadership",
            &["tech", "finance"],
            4.9,
            "Former VP Engineering turned leadership coach for scaling CTOs.",
            350,
        ),
        coach(
            "Marcus Oduya",
            "career_transition",
            &["tech", "retail"],
            4.7,
            "Specialises in corporate-to-fractional pivots for C-level operators.",
            300,
        ),
        coach(
            "Priya Nair",
            "executive_presence",
            &["finance", "healthcare"],
            4.8,
            "Board communication and public speaking for senior executives.",
            320,
        ),
        coach(
            "Tom Vandermeer",
            "strategy",
            &["tech", "manufacturing"],
            4.6,
            "Growth strategy and exit planning for founder-led businesses.",
            400,
        ),
    ]
}

#[async_trait]
impl CheckpointStore for MemoryStore {
    async fn initialize(&self) -> Result<(), DatabaseError> {
        let mut inner = self.inner.write().await;
        if inner.coaches.is_empty() {
            inner.coaches = seed_coaches();
        }
        Ok(())
    }

    async fn load(&self, thread_id: &str) -> Result<Option<Checkpoint>, DatabaseError> {
        Ok(self
            .inner
            .read()
            .await
            .checkpoints
            .get(thread_id)
            .and_then(|v| v.last())
            .cloned())
    }

    async fn append(&self, thread_id: &str, checkpoint: &Checkpoint) -> Result<(), DatabaseError> {
        self.inner
            .write()
            .await
            .checkpoints
            .entry(thread_id.to_string())
            .or_default()
            .push(checkpoint.clone());
        Ok(())
    }

    async fn close(&self) {}
}

#[async_trait]
impl Database for MemoryStore {
    async fn get_profile(&self, user_id: &str) -> Result<Option<ProfileRecord>, DatabaseError> {
        Ok(self.inner.read().await.profiles.get(user_id).cloned())
    }

    async fn upsert_profile(
        &self,
        user_id: &str,
        patch: ProfilePatch,
    ) -> Result<ProfileRecord, DatabaseError> {
        let mut inner = self.inner.write().await;
        let profile = inner
            .profiles
            .entry(user_id.to_string())
            .or_insert_with(|| ProfileRecord {
                user_id: user_id.to_string(),
                role_preference: None,
                trinity: None,
                experience_years: None,
                industries: Vec::new(),
                location: None,
                remote_preference: None,
                day_rate_min: None,
                day_rate_max: None,
                availability: None,
                current_step: 0,
                onboarding_completed: false,
                updated_at: Utc::now(),
            });

        if let Some(v) = patch.role_preference {
            profile.role_preference = Some(v);
        }
        if let Some(v) = patch.trinity {
            profile.trinity = Some(v);
        }
        if let Some(v) = patch.experience_years {
            profile.experience_years = Some(v);
        }
        if let Some(v) = patch.industries {
            profile.industries = v;
        }
        if let Some(v) = patch.location {
            profile.location = Some(v);
        }
        if let Some(v) = patch.remote_preference {
            profile.remote_preference = Some(v);
        }
        if let Some(v) = patch.day_rate_min {
            profile.day_rate_min = Some(v);
        }
        if let Some(v) = patch.day_rate_max {
            profile.day_rate_max = Some(v);
        }
        if let Some(v) = patch.availability {
            profile.availability = Some(v);
        }
        if let Some(v) = patch.current_step {
            profile.current_step = v;
        }
        if let Some(v) = patch.onboarding_completed {
            profile.onboarding_completed = v;
        }
        profile.updated_at = Utc::now();

        Ok(profile.clone())
    }

    async fn upsert_job_listings(&self, listings: &[JobListing]) -> Result<u64, DatabaseError> {
        let mut inner = self.inner.write().await;
        let mut inserted = 0;
        for job in listings {
            if !inner.listings.contains_key(&job.id) {
                inner.listings.insert(job.id, job.clone());
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn search_job_listings(
        &self,
        filter: &JobFilter,
    ) -> Result<Vec<JobListing>, DatabaseError> {
        let inner = self.inner.read().await;
        let limit = if filter.limit > 0 {
            filter.limit as usize
        } else {
            10
        };

        let mut results: Vec<JobListing> = inner
            .listings
            .values()
            .filter(|j| {
                filter
                    .role_type
                    .as_deref()
                    .is_none_or(|r| j.role_type.as_deref() == Some(r))
                    && filter
                        .engagement_type
                        .as_deref()
                        .is_none_or(|e| j.engagement_type.as_deref() == Some(e))
                    && filter.location.as_ref().is_none_or(|l| {
                        j.location
                            .as_deref()
                            .is_some_and(|jl| jl.to_lowercase().contains(&l.to_lowercase()))
                    })
                    && filter
                        .remote_preference
                        .as_deref()
                        .is_none_or(|r| j.remote.as_deref() == Some(r))
                    && filter
                        .min_day_rate
                        .is_none_or(|min| j.day_rate_max.is_none_or(|max| max >= min))
                    && filter
                        .max_day_rate
                        .is_none_or(|max| j.day_rate_min.is_none_or(|min| min <= max))
                    && filter
                        .industries
                        .as_ref()
                        .is_none_or(|wanted| wanted.iter().any(|w| j.industries.contains(w)))
            })
            .cloned()
            .collect();

        results.sort_by(|a, b| b.posted_at.cmp(&a.posted_at));
        results.truncate(limit);
        Ok(results)
    }

    async fn get_job_listing(&self, id: Uuid) -> Result<Option<JobListing>, DatabaseError> {
        Ok(self.inner.read().await.listings.get(&id).cloned())
    }

    async fn save_job(
        &self,
        user_id: &str,
        job_id: Uuid,
        notes: Option<&str>,
    ) -> Result<(), DatabaseError> {
        let mut inner = self.inner.write().await;
        let title = inner
            .listings
            .get(&job_id)
            .map(|j| j.title.clone())
            .unwrap_or_default();
        inner
            .saved_jobs
            .entry((user_id.to_string(), job_id))
            .and_modify(|s| {
                if notes.is_some() {
                    s.notes = notes.map(String::from);
                }
            })
            .or_insert(SavedJobRecord {
                job_id,
                title,
                status: "saved".to_string(),
                notes: notes.map(String::from),
                saved_at: Utc::now(),
            });
        Ok(())
    }

    async fn list_saved_jobs(
        &self,
        user_id: &str,
        status: Option<&str>,
    ) -> Result<Vec<SavedJobRecord>, DatabaseError> {
        let inner = self.inner.read().await;
        let mut results: Vec<SavedJobRecord> = inner
            .saved_jobs
            .iter()
            .filter(|((uid, _), s)| {
                uid == user_id && status.is_none_or(|wanted| s.status == wanted)
            })
            .map(|(_, s)| s.clone())
            .collect();
        results.sort_by(|a, b| b.saved_at.cmp(&a.saved_at));
        Ok(results)
    }

    async fn update_saved_job_status(
        &self,
        user_id: &str,
        job_id: Uuid,
        status: &str,
    ) -> Result<bool, DatabaseError> {
        let mut inner = self.inner.write().await;
        match inner.saved_jobs.get_mut(&(user_id.to_string(), job_id)) {
            Some(saved) => {
                saved.status = status.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn find_coaches(&self, filter: &CoachFilter) -> Result<Vec<CoachRecord>, DatabaseError> {
        let inner = self.inner.read().await;
        let limit = if filter.limit > 0 {
            filter.limit as usize
        } else {
            5
        };

        let mut results: Vec<CoachRecord> = inner
            .coaches
            .iter()
            .filter(|c| {
                filter.specialty.as_ref().is_none_or(|s| &c.specialty == s)
                    && filter
                        .industry
                        .as_ref()
                        .is_none_or(|i| c.industries.contains(i))
                    && filter.min_rating.is_none_or(|r| c.rating >= r)
            })
            .cloned()
            .collect();
        results.sort_by(|a, b| b.rating.total_cmp(&a.rating));
        results.truncate(limit);
        Ok(results)
    }

    async fn get_coach(&self, id: Uuid) -> Result<Option<CoachRecord>, DatabaseError> {
        Ok(self
            .inner
            .read()
            .await
            .coaches
            .iter()
            .find(|c| c.id == id)
            .cloned())
    }

    async fn insert_session(&self, session: &SessionRecord) -> Result<(), DatabaseError> {
        self.inner.write().await.sessions.push(session.clone());
        Ok(())
    }

    async fn list_sessions(
        &self,
        user_id: &str,
        status: Option<&str>,
    ) -> Result<Vec<SessionRecord>, DatabaseError> {
        Ok(self
            .inner
            .read()
            .await
            .sessions
            .iter()
            .filter(|s| s.user_id == user_id && status.is_none_or(|wanted| s.status == wanted))
            .cloned()
            .collect())
    }

    async fn cancel_session(
        &self,
        session_id: Uuid,
        user_id: &str,
        reason: Option<&str>,
    ) -> Result<bool, DatabaseError> {
        let mut inner = self.inner.write().await;
        match inner
            .sessions
            .iter_mut()
            .find(|s| s.id == session_id && s.user_id == user_id && s.status == "scheduled")
        {
            Some(session) => {
                session.status = "cancelled".to_string();
                session.cancelled_reason = reason.map(String::from);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_memories(&self, user_id: &str) -> Result<Vec<MemoryRecord>, DatabaseError> {
        Ok(self
            .inner
            .read()
            .await
            .memories
            .iter()
            .filter(|m| m.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn save_memory(
        &self,
        user_id: &str,
        kind: &str,
        content: &str,
    ) -> Result<(), DatabaseError> {
        let mut inner = self.inner.write().await;
        inner.next_memory_id += 1;
        let record = MemoryRecord {
            id: inner.next_memory_id,
            user_id: user_id.to_string(),
            kind: kind.to_string(),
            content: content.to_string(),
            created_at: Utc::now(),
        };
        inner.memories.push(record);
        Ok(())
    }
}
