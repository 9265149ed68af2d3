//! Job search and tracking tools.
//!
//! `search_jobs` is a hybrid search: the database answers first, then the
//! web provider tops results up and fresh listings are saved back for
//! future queries. Saving and status updates mutate user state and are
//! gated.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::db::Database;
use crate::history::JobFilter;
use crate::search::JobSearchClient;
use crate::tools::tool::{Tool, ToolContext, ToolError, ToolOutput, optional_str, required_str};

pub const VALID_SAVE_STATUS: &[&str] =
    &["saved", "applied", "interviewing", "rejected", "accepted"];

fn parse_job_id(params: &serde_json::Value) -> Result<Result<Uuid, ToolOutput>, ToolError> {
    let raw = required_str(params, "job_id")?;
    Ok(Uuid::parse_str(raw).map_err(|_| {
        ToolOutput::failure(format!("'{raw}' is not a valid job id. Use an id from search_jobs."))
    }))
}

fn filter_from_params(params: &serde_json::Value) -> JobFilter {
    JobFilter {
        role_type: optional_str(params, "role_type").map(|s| s.to_lowercase()),
        engagement_type: optional_str(params, "engagement_type").map(|s| s.to_lowercase()),
        location: optional_str(params, "location"),
        remote_preference: optional_str(params, "remote_preference").map(|s| s.to_lowercase()),
        min_day_rate: params
            .get("min_day_rate")
            .and_then(|v| v.as_i64())
            .map(|v| v as i32),
        max_day_rate: params
            .get("max_day_rate")
            .and_then(|v| v.as_i64())
            .map(|v| v as i32),
        industries: optional_str(params, "industries").map(|raw| {
            raw.split(',')
                .map(|i| i.trim().to_string())
                .filter(|i| !i.is_empty())
                .collect()
        }),
        limit: params
            .get("limit")
            .and_then(|v| v.as_i64())
            .unwrap_or(10)
            .clamp(1, 50),
    }
}

/// Hybrid search across the local database and the web provider.
pub struct SearchJobsTool {
    db: Arc<dyn Database>,
    search: Option<Arc<JobSearchClient>>,
}

impl SearchJobsTool {
    pub fn new(db: Arc<dyn Database>, search: Option<Arc<JobSearchClient>>) -> Self {
        Self { db, search }
    }
}

#[async_trait]
impl Tool for SearchJobsTool {
    fn name(&self) -> &str {
        "search_jobs"
    }

    fn description(&self) -> &str {
        "Search for job opportunities by role, engagement type, location, rate, and industry. \
         Checks saved listings first and tops up with fresh web results."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "role_type": {
                    "type": "string",
                    "description": "C-level role type: cto, cfo, cmo, coo, cpo"
                },
                "engagement_type": {
                    "type": "string",
                    "description": "Engagement type: fractional, interim, advisory"
                },
                "location": {
                    "type": "string",
                    "description": "Location to search in (city or 'Remote')"
                },
                "remote_preference": {
                    "type": "string",
                    "description": "Remote work preference: remote, hybrid, onsite, flexible"
                },
                "min_day_rate": {
                    "type": "integer",
                    "description": "Minimum day rate in GBP"
                },
                "max_day_rate": {
                    "type": "integer",
                    "description": "Maximum day rate in GBP"
                },
                "industries": {
                    "type": "string",
                    "description": "Comma-separated list of industries to filter by"
                },
                "limit": {
                    "type": "integer",
                    "description": "Maximum number of results to return (1-50)",
                    "default": 10
                }
            }
        })
    }

    async fn execute(
        &self,
        params: serde_json::Value,
        _ctx: &ToolContext,
    ) -> Result<ToolOutput, ToolError> {
        let filter = filter_from_params(&params);
        let limit = filter.limit as usize;

        // Database first: instant and free.
        let mut jobs = self.db.search_job_listings(&filter).await?;

        // Top up from the web when local results are thin. Provider
        // failures degrade to database-only results.
        if jobs.len() < limit {
            if let Some(search) = self.search.as_ref().filter(|s| s.is_configured()) {
                match search.search(&filter).await {
                    Ok(fresh) => {
                        let saved = self.db.upsert_job_listings(&fresh).await?;
                        tracing::debug!(fetched = fresh.len(), saved, "web results cached");
                        jobs = self.db.search_job_listings(&filter).await?;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "web search unavailable, using local results");
                    }
                }
            }
        }

        jobs.truncate(limit);
        let count = jobs.len();
        Ok(ToolOutput::success(serde_json::json!({
            "jobs": jobs,
            "count": count,
            "message": if count == 0 {
                "No jobs found matching your criteria. Try broadening the search.".to_string()
            } else {
                format!("Found {count} job(s) matching your criteria.")
            },
        })))
    }
}

/// Get the full details of one listing. Free.
pub struct GetJobDetailsTool {
    db: Arc<dyn Database>,
}

impl GetJobDetailsTool {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Tool for GetJobDetailsTool {
    fn name(&self) -> &str {
        "get_job_details"
    }

    fn description(&self) -> &str {
        "Get the full details of a job listing by its id."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "job_id": {"type": "string", "description": "The job listing id"}
            },
            "required": ["job_id"]
        })
    }

    async fn execute(
        &self,
        params: serde_json::Value,
        _ctx: &ToolContext,
    ) -> Result<ToolOutput, ToolError> {
        let job_id = match parse_job_id(&params)? {
            Ok(id) => id,
            Err(failure) => return Ok(failure),
        };

        Ok(match self.db.get_job_listing(job_id).await? {
            Some(job) => ToolOutput::success(serde_json::json!({"job": job})),
            None => ToolOutput::failure(format!("No job found with id {job_id}.")),
        })
    }
}

/// Save a job to the user's list. Gated.
pub struct SaveJobTool {
    db: Arc<dyn Database>,
}

impl SaveJobTool {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Tool for SaveJobTool {
    fn name(&self) -> &str {
        "save_job"
    }

    fn description(&self) -> &str {
        "Save a job to the user's saved list, optionally with notes."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "job_id": {"type": "string", "description": "The job listing id to save"},
                "notes": {"type": "string", "description": "Optional notes about this job"}
            },
            "required": ["job_id"]
        })
    }

    async fn execute(
        &self,
        params: serde_json::Value,
        ctx: &ToolContext,
    ) -> Result<ToolOutput, ToolError> {
        let user_id = match ctx.require_user() {
            Ok(user_id) => user_id,
            Err(failure) => return Ok(failure),
        };
        let job_id = match parse_job_id(&params)? {
            Ok(id) => id,
            Err(failure) => return Ok(failure),
        };
        let notes = optional_str(&params, "notes");

        if self.db.get_job_listing(job_id).await?.is_none() {
            return Ok(ToolOutput::failure(format!("No job found with id {job_id}.")));
        }

        self.db.save_job(user_id, job_id, notes.as_deref()).await?;

        Ok(ToolOutput::success(serde_json::json!({
            "job_id": job_id,
            "message": "Job saved successfully! You can view it in your saved jobs.",
        })))
    }
}

/// List the user's saved jobs. Free.
pub struct GetSavedJobsTool {
    db: Arc<dyn Database>,
}

impl GetSavedJobsTool {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Tool for GetSavedJobsTool {
    fn name(&self) -> &str {
        "get_saved_jobs"
    }

    fn description(&self) -> &str {
        "List the user's saved jobs, optionally filtered by status."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "status": {
                    "type": "string",
                    "description": "Filter by status: saved, applied, interviewing, rejected, accepted",
                    "enum": VALID_SAVE_STATUS
                }
            }
        })
    }

    async fn execute(
        &self,
        params: serde_json::Value,
        ctx: &ToolContext,
    ) -> Result<ToolOutput, ToolError> {
        let user_id = match ctx.require_user() {
            Ok(user_id) => user_id,
            Err(failure) => return Ok(failure),
        };
        let status = optional_str(&params, "status");

        let saved = self.db.list_saved_jobs(user_id, status.as_deref()).await?;
        let count = saved.len();
        Ok(ToolOutput::success(serde_json::json!({
            "saved_jobs": saved,
            "count": count,
        })))
    }
}

/// Move a saved job through the pipeline. Gated.
pub struct UpdateJobStatusTool {
    db: Arc<dyn Database>,
}

impl UpdateJobStatusTool {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Tool for UpdateJobStatusTool {
    fn name(&self) -> &str {
        "update_job_status"
    }

    fn description(&self) -> &str {
        "Update the status of a saved job (saved, applied, interviewing, rejected, accepted)."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "job_id": {"type": "string", "description": "The saved job's id"},
                "status": {
                    "type": "string",
                    "description": "New status",
                    "enum": VALID_SAVE_STATUS
                }
            },
            "required": ["job_id", "status"]
        })
    }

    async fn execute(
        &self,
        params: serde_json::Value,
        ctx: &ToolContext,
    ) -> Result<ToolOutput, ToolError> {
        let user_id = match ctx.require_user() {
            Ok(user_id) => user_id,
            Err(failure) => return Ok(failure),
        };
        let job_id = match parse_job_id(&params)? {
            Ok(id) => id,
            Err(failure) => return Ok(failure),
        };
        let status = required_str(&params, "status")?.to_lowercase();
        let status = status.trim();

        if !VALID_SAVE_STATUS.contains(&status) {
            return Ok(ToolOutput::failure(format!(
                "Invalid status. Choose from: {}",
                VALID_SAVE_STATUS.join(", ")
            )));
        }

        if !self
            .db
            .update_saved_job_status(user_id, job_id, status)
            .await?
        {
            return Ok(ToolOutput::failure(
                "That job isn't in your saved list. Save it first with save_job.",
            ));
        }

        Ok(ToolOutput::success(serde_json::json!({
            "job_id": job_id,
            "status": status,
            "message": format!("Job moved to '{status}'."),
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::history::JobListing;

    fn ctx() -> ToolContext {
        ToolContext {
            thread_id: "t1".to_string(),
            user_id: Some("u1".to_string()),
        }
    }

    fn listing(title: &str, role: &str) -> JobListing {
        JobListing {
            id: Uuid::new_v4(),
            title: title.to_string(),
            company: Some("Acme".to_string()),
            role_type: Some(role.to_string()),
            engagement_type: Some("fractional".to_string()),
            location: Some("London".to_string()),
            remote: Some("hybrid".to_string()),
            day_rate_min: Some(700),
            day_rate_max: Some(900),
            industries: vec!["tech".to_string()],
            url: None,
            source: "seed".to_string(),
            posted_at: None,
        }
    }

    #[tokio::test]
    async fn test_search_filters_by_role() {
        let store = Arc::new(MemoryStore::new());
        store.insert_listing(listing("Fractional CTO", "cto")).await;
        store.insert_listing(listing("Fractional CFO", "cfo")).await;

        let tool = SearchJobsTool::new(store, None);
        let output = tool
            .execute(serde_json::json!({"role_type": "CTO"}), &ctx())
            .await
            .unwrap();

        assert_eq!(output.result["count"], 1);
        assert_eq!(output.result["jobs"][0]["title"], "Fractional CTO");
    }

    #[tokio::test]
    async fn test_search_empty_suggests_broadening() {
        let tool = SearchJobsTool::new(Arc::new(MemoryStore::new()), None);
        let output = tool.execute(serde_json::json!({}), &ctx()).await.unwrap();
        assert_eq!(output.result["count"], 0);
        assert!(output.result["message"]
            .as_str()
            .unwrap()
            .contains("broadening"));
    }

    #[tokio::test]
    async fn test_save_then_update_status() {
        let store = Arc::new(MemoryStore::new());
        let job = listing("Fractional CTO", "cto");
        let job_id = job.id;
        store.insert_listing(job).await;

        let save = SaveJobTool::new(store.clone());
        let output = save
            .execute(
                serde_json::json!({"job_id": job_id.to_string(), "notes": "looks great"}),
                &ctx(),
            )
            .await
            .unwrap();
        assert_eq!(output.result["success"], true);

        let update = UpdateJobStatusTool::new(store.clone());
        let output = update
            .execute(
                serde_json::json!({"job_id": job_id.to_string(), "status": "applied"}),
                &ctx(),
            )
            .await
            .unwrap();
        assert_eq!(output.result["success"], true);

        let list = GetSavedJobsTool::new(store);
        let output = list
            .execute(serde_json::json!({"status": "applied"}), &ctx())
            .await
            .unwrap();
        assert_eq!(output.result["count"], 1);
    }

    #[tokio::test]
    async fn test_save_unknown_job_fails_in_envelope() {
        let tool = SaveJobTool::new(Arc::new(MemoryStore::new()));
        let output = tool
            .execute(
                serde_json::json!({"job_id": Uuid::new_v4().to_string()}),
                &ctx(),
            )
            .await
            .unwrap();
        assert_eq!(output.result["success"], false);
    }

    #[tokio::test]
    async fn test_update_status_rejects_invalid_enum() {
        let store = Arc::new(MemoryStore::new());
        let job = listing("Fractional CTO", "cto");
        let job_id = job.id;
        store.insert_listing(job).await;

        let tool = UpdateJobStatusTool::new(store);
        let output = tool
            .execute(
                serde_json::json!({"job_id": job_id.to_string(), "status": "ghosted"}),
                &ctx(),
            )
            .await
            .unwrap();
        assert_eq!(output.result["success"], false);
    }

    #[tokio::test]
    async fn test_save_requires_login() {
        let tool = SaveJobTool::new(Arc::new(MemoryStore::new()));
        let anonymous = ToolContext::default();
        let output = tool
            .execute(
                serde_json::json!({"job_id": Uuid::new_v4().to_string()}),
                &anonymous,
            )
            .await
            .unwrap();
        assert_eq!(output.result["success"], false);
        assert!(output.result["error"]
            .as_str()
            .unwrap()
            .contains("logged in"));
    }
}
