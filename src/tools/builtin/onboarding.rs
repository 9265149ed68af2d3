//! Onboarding tools.
//!
//! Six steps build a user's profile: role, engagement type, experience,
//! location, search preferences, completion. Each tool validates and
//! normalizes its input, persists the profile change (awaited, so a
//! resumed run never reads stale state), and reports the next step.
//!
//! All six are gated: the user confirms before their profile is written.

use std::sync::Arc;

use async_trait::async_trait;

use crate::db::Database;
use crate::history::ProfilePatch;
use crate::tools::tool::{Tool, ToolContext, ToolError, ToolOutput, required_str};

pub const VALID_ROLES: &[&str] = &["cto", "cfo", "cmo", "coo", "cpo", "other"];
pub const VALID_TRINITY: &[&str] = &["fractional", "interim", "advisory", "open"];
pub const VALID_REMOTE: &[&str] = &["remote", "hybrid", "onsite", "flexible"];
pub const VALID_AVAILABILITY: &[&str] = &["immediately", "1_month", "3_months", "flexible"];

fn invalid_choice(field: &str, valid: &[&str]) -> ToolOutput {
    ToolOutput::failure(format!(
        "Invalid {field}. Please choose from: {}",
        valid.join(", ")
    ))
}

/// Persist a profile patch for the logged-in user, if any.
///
/// Anonymous users still get the conversational flow; nothing is saved.
async fn apply_patch(
    db: &Arc<dyn Database>,
    ctx: &ToolContext,
    patch: ProfilePatch,
) -> Result<bool, ToolError> {
    match ctx.user_id.as_deref() {
        Some(user_id) => {
            db.upsert_profile(user_id, patch).await?;
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Step 1: C-level role preference.
pub struct ConfirmRolePreferenceTool {
    db: Arc<dyn Database>,
}

impl ConfirmRolePreferenceTool {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Tool for ConfirmRolePreferenceTool {
    fn name(&self) -> &str {
        "confirm_role_preference"
    }

    fn description(&self) -> &str {
        "Confirm the user's C-level role preference (step 1 of onboarding)."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "role": {
                    "type": "string",
                    "description": "C-level role type: cto, cfo, cmo, coo, cpo, or other",
                    "enum": VALID_ROLES
                }
            },
            "required": ["role"]
        })
    }

    async fn execute(
        &self,
        params: serde_json::Value,
        ctx: &ToolContext,
    ) -> Result<ToolOutput, ToolError> {
        let role = required_str(&params, "role")?.to_lowercase();
        let role = role.trim();

        if !VALID_ROLES.contains(&role) {
            return Ok(invalid_choice("role", VALID_ROLES));
        }

        let persisted = apply_patch(
            &self.db,
            ctx,
            ProfilePatch {
                role_preference: Some(role.to_string()),
                current_step: Some(1),
                ..Default::default()
            },
        )
        .await?;

        Ok(ToolOutput::success(serde_json::json!({
            "role_preference": role,
            "current_step": 1,
            "next_step": "trinity",
            "persisted": persisted,
            "message": format!("Great! I've noted your preference for {} roles.", role.to_uppercase()),
        })))
    }
}

/// Step 2: engagement type (the "trinity").
pub struct ConfirmTrinityTool {
    db: Arc<dyn Database>,
}

impl ConfirmTrinityTool {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Tool for ConfirmTrinityTool {
    fn name(&self) -> &str {
        "confirm_trinity"
    }

    fn description(&self) -> &str {
        "Confirm the engagement type: fractional, interim, advisory, or open (step 2)."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "engagement_type": {
                    "type": "string",
                    "description": "Engagement type: fractional, interim, advisory, or open",
                    "enum": VALID_TRINITY
                }
            },
            "required": ["engagement_type"]
        })
    }

    async fn execute(
        &self,
        params: serde_json::Value,
        ctx: &ToolContext,
    ) -> Result<ToolOutput, ToolError> {
        let engagement = required_str(&params, "engagement_type")?.to_lowercase();
        let engagement = engagement.trim();

        if !VALID_TRINITY.contains(&engagement) {
            return Ok(invalid_choice("type", VALID_TRINITY));
        }

        let persisted = apply_patch(
            &self.db,
            ctx,
            ProfilePatch {
                trinity: Some(engagement.to_string()),
                current_step: Some(2),
                ..Default::default()
            },
        )
        .await?;

        Ok(ToolOutput::success(serde_json::json!({
            "trinity": engagement,
            "current_step": 2,
            "next_step": "experience",
            "persisted": persisted,
            "message": format!("Perfect! You're looking for {engagement} opportunities."),
        })))
    }
}

/// Step 3: years of experience and industries.
pub struct ConfirmExperienceTool {
    db: Arc<dyn Database>,
}

impl ConfirmExperienceTool {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Tool for ConfirmExperienceTool {
    fn name(&self) -> &str {
        "confirm_experience"
    }

    fn description(&self) -> &str {
        "Confirm years of executive experience and industries (step 3)."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "years": {
                    "type": "integer",
                    "description": "Years of executive experience",
                    "minimum": 0
                },
                "industries": {
                    "type": "string",
                    "description": "Comma-separated list of industries (e.g., 'Tech, Finance, Gaming')"
                }
            },
            "required": ["years", "industries"]
        })
    }

    async fn execute(
        &self,
        params: serde_json::Value,
        ctx: &ToolContext,
    ) -> Result<ToolOutput, ToolError> {
        let years = params
            .get("years")
            .and_then(|v| v.as_i64())
            .ok_or_else(|| ToolError::InvalidParameters("missing 'years' parameter".into()))?;
        let industries_raw = required_str(&params, "industries")?;

        if years < 0 {
            return Ok(ToolOutput::failure("Years of experience must be positive."));
        }

        let industries: Vec<String> = industries_raw
            .split(',')
            .map(|i| i.trim().to_string())
            .filter(|i| !i.is_empty())
            .collect();

        let persisted = apply_patch(
            &self.db,
            ctx,
            ProfilePatch {
                experience_years: Some(years as i32),
                industries: Some(industries.clone()),
                current_step: Some(3),
                ..Default::default()
            },
        )
        .await?;

        Ok(ToolOutput::success(serde_json::json!({
            "experience_years": years,
            "industries": industries,
            "current_step": 3,
            "next_step": "location",
            "persisted": persisted,
            "message": format!("Got it! {years} years across {}.", industries.join(", ")),
        })))
    }
}

/// Step 4: location and remote preference.
pub struct ConfirmLocationTool {
    db: Arc<dyn Database>,
}

impl ConfirmLocationTool {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Tool for ConfirmLocationTool {
    fn name(&self) -> &str {
        "confirm_location"
    }

    fn description(&self) -> &str {
        "Confirm location and remote work preference (step 4)."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "location": {
                    "type": "string",
                    "description": "City/country (e.g., 'London', 'New York', 'Remote')"
                },
                "remote_preference": {
                    "type": "string",
                    "description": "Remote work preference: remote, hybrid, onsite, or flexible",
                    "enum": VALID_REMOTE
                }
            },
            "required": ["location", "remote_preference"]
        })
    }

    async fn execute(
        &self,
        params: serde_json::Value,
        ctx: &ToolContext,
    ) -> Result<ToolOutput, ToolError> {
        let location = required_str(&params, "location")?.trim().to_string();
        let remote = required_str(&params, "remote_preference")?.to_lowercase();
        let remote = remote.trim();

        if !VALID_REMOTE.contains(&remote) {
            return Ok(invalid_choice("preference", VALID_REMOTE));
        }

        let persisted = apply_patch(
            &self.db,
            ctx,
            ProfilePatch {
                location: Some(location.clone()),
                remote_preference: Some(remote.to_string()),
                current_step: Some(4),
                ..Default::default()
            },
        )
        .await?;

        Ok(ToolOutput::success(serde_json::json!({
            "location": location,
            "remote_preference": remote,
            "current_step": 4,
            "next_step": "search_prefs",
            "persisted": persisted,
            "message": format!("Location: {location}, preference: {remote}."),
        })))
    }
}

/// Step 5: day rate range and availability.
pub struct ConfirmSearchPrefsTool {
    db: Arc<dyn Database>,
}

impl ConfirmSearchPrefsTool {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Tool for ConfirmSearchPrefsTool {
    fn name(&self) -> &str {
        "confirm_search_prefs"
    }

    fn description(&self) -> &str {
        "Confirm compensation range and availability (step 5)."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "day_rate_min": {
                    "type": "integer",
                    "description": "Minimum day rate in GBP",
                    "minimum": 0
                },
                "day_rate_max": {
                    "type": "integer",
                    "description": "Maximum day rate in GBP",
                    "minimum": 0
                },
                "availability": {
                    "type": "string",
                    "description": "Availability: immediately, 1_month, 3_months, or flexible",
                    "enum": VALID_AVAILABILITY
                }
            },
            "required": ["day_rate_min", "day_rate_max", "availability"]
        })
    }

    async fn execute(
        &self,
        params: serde_json::Value,
        ctx: &ToolContext,
    ) -> Result<ToolOutput, ToolError> {
        let min = params
            .get("day_rate_min")
            .and_then(|v| v.as_i64())
            .ok_or_else(|| {
                ToolError::InvalidParameters("missing 'day_rate_min' parameter".into())
            })?;
        let max = params
            .get("day_rate_max")
            .and_then(|v| v.as_i64())
            .ok_or_else(|| {
                ToolError::InvalidParameters("missing 'day_rate_max' parameter".into())
            })?;
        let availability = required_str(&params, "availability")?.to_lowercase();
        let availability = availability.trim();

        if !VALID_AVAILABILITY.contains(&availability) {
            return Ok(invalid_choice("availability", VALID_AVAILABILITY));
        }
        if min > max {
            return Ok(ToolOutput::failure(
                "Minimum rate cannot exceed maximum rate.",
            ));
        }

        let persisted = apply_patch(
            &self.db,
            ctx,
            ProfilePatch {
                day_rate_min: Some(min as i32),
                day_rate_max: Some(max as i32),
                availability: Some(availability.to_string()),
                current_step: Some(5),
                ..Default::default()
            },
        )
        .await?;

        Ok(ToolOutput::success(serde_json::json!({
            "day_rate_min": min,
            "day_rate_max": max,
            "availability": availability,
            "current_step": 5,
            "next_step": "complete",
            "persisted": persisted,
            "message": format!("Rate range: {min}-{max}/day, available: {availability}."),
        })))
    }
}

/// Step 6: mark onboarding complete.
pub struct CompleteOnboardingTool {
    db: Arc<dyn Database>,
}

impl CompleteOnboardingTool {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Tool for CompleteOnboardingTool {
    fn name(&self) -> &str {
        "complete_onboarding"
    }

    fn description(&self) -> &str {
        "Mark onboarding as complete once all profile steps are confirmed (step 6)."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({"type": "object", "properties": {}})
    }

    async fn execute(
        &self,
        _params: serde_json::Value,
        ctx: &ToolContext,
    ) -> Result<ToolOutput, ToolError> {
        let persisted = apply_patch(
            &self.db,
            ctx,
            ProfilePatch {
                onboarding_completed: Some(true),
                current_step: Some(6),
                ..Default::default()
            },
        )
        .await?;

        Ok(ToolOutput::success(serde_json::json!({
            "completed": true,
            "current_step": 6,
            "persisted": persisted,
            "message": "Your profile is complete! I can now help you find opportunities.",
        })))
    }
}

/// Tool for reading the user's profile and onboarding progress.
///
/// The orchestrator calls this at the start of every conversation to
/// route from the database instead of conversation context. Free.
pub struct GetProfileStatusTool {
    db: Arc<dyn Database>,
}

impl GetProfileStatusTool {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Tool for GetProfileStatusTool {
    fn name(&self) -> &str {
        "get_profile_status"
    }

    fn description(&self) -> &str {
        "Get the user's profile and onboarding progress. Call this at the start of every \
         conversation; the database, not conversation context, is the source of truth."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({"type": "object", "properties": {}})
    }

    async fn execute(
        &self,
        _params: serde_json::Value,
        ctx: &ToolContext,
    ) -> Result<ToolOutput, ToolError> {
        let Some(user_id) = ctx.user_id.as_deref() else {
            return Ok(ToolOutput::success(serde_json::json!({
                "onboarding_completed": false,
                "current_step": 0,
                "profile": null,
                "message": "The user is not logged in; help them, but data won't persist.",
            })));
        };

        let profile = self.db.get_profile(user_id).await?;
        Ok(match profile {
            Some(profile) => ToolOutput::success(serde_json::json!({
                "onboarding_completed": profile.onboarding_completed,
                "current_step": profile.current_step,
                "profile": profile,
            })),
            None => ToolOutput::success(serde_json::json!({
                "onboarding_completed": false,
                "current_step": 0,
                "profile": null,
            })),
        })
    }
}
