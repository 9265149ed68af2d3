//! Coaching tools: coach discovery and session booking.
//!
//! Booking and cancelling touch real-world calendars, so
//! `schedule_session` and `cancel_session` are gated.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::db::Database;
use crate::history::{CoachFilter, SessionRecord};
use crate::tools::tool::{Tool, ToolContext, ToolError, ToolOutput, optional_str, required_str};

pub const VALID_SESSION_TYPES: &[&str] =
    &["intro_call", "coaching_session", "strategy_deep_dive"];

fn parse_uuid(params: &serde_json::Value, key: &str) -> Result<Result<Uuid, ToolOutput>, ToolError> {
    let raw = required_str(params, key)?;
    Ok(Uuid::parse_str(raw)
        .map_err(|_| ToolOutput::failure(format!("'{raw}' is not a valid {key}."))))
}

/// Find coaches by specialty, industry, and rating. Free.
pub struct FindCoachesTool {
    db: Arc<dyn Database>,
}

impl FindCoachesTool {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Tool for FindCoachesTool {
    fn name(&self) -> &str {
        "find_coaches"
    }

    fn description(&self) -> &str {
        "Find executive coaches by specialty (leadership, career_transition, \
         executive_presence, strategy), industry, and minimum rating."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "specialty": {
                    "type": "string",
                    "description": "Coach specialty (leadership, career_transition, executive_presence, strategy)"
                },
                "industry": {
                    "type": "string",
                    "description": "Industry expertise (tech, finance, healthcare, retail, etc.)"
                },
                "min_rating": {
                    "type": "number",
                    "description": "Minimum rating (1.0-5.0)"
                },
                "limit": {
                    "type": "integer",
                    "description": "Maximum number of coaches to return",
                    "default": 5
                }
            }
        })
    }

    async fn execute(
        &self,
        params: serde_json::Value,
        _ctx: &ToolContext,
    ) -> Result<ToolOutput, ToolError> {
        let filter = CoachFilter {
            specialty: optional_str(&params, "specialty").map(|s| s.to_lowercase()),
            industry: optional_str(&params, "industry").map(|s| s.to_lowercase()),
            min_rating: params.get("min_rating").and_then(|v| v.as_f64()),
            limit: params.get("limit").and_then(|v| v.as_i64()).unwrap_or(5),
        };

        let coaches = self.db.find_coaches(&filter).await?;
        let count = coaches.len();

        if count == 0 {
            return Ok(ToolOutput::success(serde_json::json!({
                "coaches": [],
                "count": 0,
                "message": "No coaches found matching your criteria. Try broadening your search.",
                "suggestions": [
                    "Try removing the specialty filter",
                    "Consider coaches from related industries",
                    "Lower the minimum rating requirement"
                ],
            })));
        }

        Ok(ToolOutput::success(serde_json::json!({
            "coaches": coaches,
            "count": count,
            "message": format!("Found {count} coach(es) matching your criteria"),
        })))
    }
}

/// Full profile of one coach. Free.
pub struct GetCoachDetailsTool {
    db: Arc<dyn Database>,
}

impl GetCoachDetailsTool {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Tool for GetCoachDetailsTool {
    fn name(&self) -> &str {
        "get_coach_details"
    }

    fn description(&self) -> &str {
        "Get the full profile of a specific coach by id."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "coach_id": {"type": "string", "description": "The coach's unique identifier"}
            },
            "required": ["coach_id"]
        })
    }

    async fn execute(
        &self,
        params: serde_json::Value,
        _ctx: &ToolContext,
    ) -> Result<ToolOutput, ToolError> {
        let coach_id = match parse_uuid(&params, "coach_id")? {
            Ok(id) => id,
            Err(failure) => return Ok(failure),
        };

        Ok(match self.db.get_coach(coach_id).await? {
            Some(coach) => ToolOutput::success(serde_json::json!({"coach": coach})),
            None => ToolOutput::failure(format!("No coach found with id {coach_id}.")),
        })
    }
}

/// Book a coaching session. Gated.
pub struct ScheduleSessionTool {
    db: Arc<dyn Database>,
}

impl ScheduleSessionTool {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Tool for ScheduleSessionTool {
    fn name(&self) -> &str {
        "schedule_session"
    }

    fn description(&self) -> &str {
        "Book a session with a coach: intro_call (free 15min), coaching_session (60min), \
         or strategy_deep_dive (90min)."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "coach_id": {"type": "string", "description": "The coach's unique identifier"},
                "session_type": {
                    "type": "string",
                    "description": "Type of session",
                    "enum": VALID_SESSION_TYPES
                },
                "preferred_date": {
                    "type": "string",
                    "description": "Preferred date in ISO format (YYYY-MM-DD)"
                },
                "preferred_time": {
                    "type": "string",
                    "description": "Preferred time slot (morning, afternoon, evening)"
                },
                "topic": {
                    "type": "string",
                    "description": "Topic or challenge to discuss"
                }
            },
            "required": ["coach_id", "session_type"]
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
        let coach_id = match parse_uuid(&params, "coach_id")? {
            Ok(id) => id,
            Err(failure) => return Ok(failure),
        };
        let session_type = required_str(&params, "session_type")?.to_lowercase();
        let session_type = session_type.trim();

        if !VALID_SESSION_TYPES.contains(&session_type) {
            return Ok(ToolOutput::failure(format!(
                "Invalid session type. Choose from: {}",
                VALID_SESSION_TYPES.join(", ")
            )));
        }

        let Some(coach) = self.db.get_coach(coach_id).await? else {
            return Ok(ToolOutput::failure(format!("No coach found with id {coach_id}.")));
        };

        let session = SessionRecord {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            coach_id,
            session_type: session_type.to_string(),
            status: "scheduled".to_string(),
            preferred_date: optional_str(&params, "preferred_date"),
            preferred_time: optional_str(&params, "preferred_time"),
            topic: optional_str(&params, "topic"),
            cancelled_reason: None,
            created_at: Utc::now(),
        };
        // Awaited before the envelope is returned; a resumed run must
        // never read a booking that hasn't landed.
        self.db.insert_session(&session).await?;

        Ok(ToolOutput::success(serde_json::json!({
            "session_id": session.id,
            "coach_name": coach.name,
            "session_type": session_type,
            "message": format!(
                "Booked a {} with {}. They'll confirm the exact time by email.",
                session_type.replace('_', " "),
                coach.name
            ),
        })))
    }
}

/// List the user's sessions. Free.
pub struct GetMySessionsTool {
    db: Arc<dyn Database>,
}

impl GetMySessionsTool {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Tool for GetMySessionsTool {
    fn name(&self) -> &str {
        "get_my_sessions"
    }

    fn description(&self) -> &str {
        "List the user's coaching sessions, optionally filtered by status \
         (scheduled, completed, cancelled)."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "status": {
                    "type": "string",
                    "description": "Filter by status: scheduled, completed, cancelled",
                    "enum": ["scheduled", "completed", "cancelled"]
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

        let sessions = self.db.list_sessions(user_id, status.as_deref()).await?;
        let count = sessions.len();
        Ok(ToolOutput::success(serde_json::json!({
            "sessions": sessions,
            "count": count,
        })))
    }
}

/// Cancel an upcoming session. Gated.
pub struct CancelSessionTool {
    db: Arc<dyn Database>,
}

impl CancelSessionTool {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Tool for CancelSessionTool {
    fn name(&self) -> &str {
        "cancel_session"
    }

    fn description(&self) -> &str {
        "Cancel an upcoming coaching session."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "session_id": {"type": "string", "description": "Session id to cancel"},
                "reason": {"type": "string", "description": "Cancellation reason"}
            },
            "required": ["session_id"]
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
        let session_id = match parse_uuid(&params, "session_id")? {
            Ok(id) => id,
            Err(failure) => return Ok(failure),
        };
        let reason = optional_str(&params, "reason");

        if !self
            .db
            .cancel_session(session_id, user_id, reason.as_deref())
            .await?
        {
            return Ok(ToolOutput::failure(
                "No scheduled session with that id was found for this user.",
            ));
        }

        Ok(ToolOutput::success(serde_json::json!({
            "session_id": session_id,
            "message": "Session cancelled. The coach has been notified.",
        })))
    }
}
