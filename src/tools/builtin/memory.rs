//! Cross-session user memory tools.
//!
//! Preferences and facts persist in the relational store and survive
//! across conversations. Reads are free; writes are gated.

use std::sync::Arc;

use async_trait::async_trait;

use crate::db::Database;
use crate::tools::tool::{Tool, ToolContext, ToolError, ToolOutput, required_str};

pub const VALID_PREFERENCE_TYPES: &[&str] = &[
    "role_type",
    "engagement_type",
    "location",
    "industry",
    "day_rate",
    "availability",
];

/// Fetch everything remembered about the user. Free.
pub struct GetUserMemoryTool {
    db: Arc<dyn Database>,
}

impl GetUserMemoryTool {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Tool for GetUserMemoryTool {
    fn name(&self) -> &str {
        "get_user_memory"
    }

    fn description(&self) -> &str {
        "Get the user's remembered preferences and facts from previous conversations."
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
                "preferences": {},
                "facts": [],
                "is_returning": false,
            })));
        };

        let memories = self.db.list_memories(user_id).await?;

        let mut preferences = serde_json::Map::new();
        let mut facts: Vec<String> = Vec::new();
        for memory in &memories {
            if memory.kind == "fact" {
                facts.push(memory.content.clone());
            } else {
                // Later preference writes win.
                preferences.insert(
                    memory.kind.clone(),
                    serde_json::Value::String(memory.content.clone()),
                );
            }
        }

        Ok(ToolOutput::success(serde_json::json!({
            "preferences": preferences,
            "facts": facts,
            "is_returning": !memories.is_empty(),
        })))
    }
}

/// Save one typed preference. Gated.
pub struct SaveUserPreferenceTool {
    db: Arc<dyn Database>,
}

impl SaveUserPreferenceTool {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Tool for SaveUserPreferenceTool {
    fn name(&self) -> &str {
        "save_user_preference"
    }

    fn description(&self) -> &str {
        "Save an important user preference (role_type, engagement_type, location, industry, \
         day_rate, availability) for future conversations."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "preference_type": {
                    "type": "string",
                    "description": "Type of preference",
                    "enum": VALID_PREFERENCE_TYPES
                },
                "value": {"type": "string", "description": "The preference value to save"}
            },
            "required": ["preference_type", "value"]
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
        let kind = required_str(&params, "preference_type")?.to_lowercase();
        let kind = kind.trim();
        let value = required_str(&params, "value")?.trim();

        if !VALID_PREFERENCE_TYPES.contains(&kind) {
            return Ok(ToolOutput::failure(format!(
                "Invalid preference type. Choose from: {}",
                VALID_PREFERENCE_TYPES.join(", ")
            )));
        }
        if value.is_empty() {
            return Ok(ToolOutput::failure("Preference value cannot be empty."));
        }

        self.db.save_memory(user_id, kind, value).await?;

        Ok(ToolOutput::success(serde_json::json!({
            "preference_type": kind,
            "value": value,
            "message": format!("Remembered: {kind} = {value}."),
        })))
    }
}

/// Save a free-form fact about the user. Gated.
pub struct SaveUserFactTool {
    db: Arc<dyn Database>,
}

impl SaveUserFactTool {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Tool for SaveUserFactTool {
    fn name(&self) -> &str {
        "save_user_fact"
    }

    fn description(&self) -> &str {
        "Remember an interesting fact the user shared about themselves."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "fact": {"type": "string", "description": "A fact about the user to remember"}
            },
            "required": ["fact"]
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
        let fact = required_str(&params, "fact")?.trim();

        if fact.is_empty() {
            return Ok(ToolOutput::failure("Fact cannot be empty."));
        }

        self.db.save_memory(user_id, "fact", fact).await?;

        Ok(ToolOutput::success(serde_json::json!({
            "message": "Noted, I'll remember that.",
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    fn ctx() -> ToolContext {
        ToolContext {
            thread_id: "t1".to_string(),
            user_id: Some("u1".to_string()),
        }
    }

    #[tokio::test]
    async fn test_memory_round_trip() {
        let store: Arc<dyn Database> = Arc::new(MemoryStore::new());

        SaveUserPreferenceTool::new(store.clone())
            .execute(
                serde_json::json!({"preference_type": "role_type", "value": "CTO"}),
                &ctx(),
            )
            .await
            .unwrap();
        SaveUserFactTool::new(store.clone())
            .execute(
                serde_json::json!({"fact": "Spent ten years in gaming."}),
                &ctx(),
            )
            .await
            .unwrap();

        let output = GetUserMemoryTool::new(store)
            .execute(serde_json::json!({}), &ctx())
            .await
            .unwrap();

        assert_eq!(output.result["is_returning"], true);
        assert_eq!(output.result["preferences"]["role_type"], "CTO");
        assert_eq!(output.result["facts"][0], "Spent ten years in gaming.");
    }

    #[tokio::test]
    async fn test_later_preference_wins() {
        let store: Arc<dyn Database> = Arc::new(MemoryStore::new());
        let tool = SaveUserPreferenceTool::new(store.clone());

        for value in ["London", "Berlin"] {
            tool.execute(
                serde_json::json!({"preference_type": "location", "value": value}),
                &ctx(),
            )
            .await
            .unwrap();
        }

        let output = GetUserMemoryTool::new(store)
            .execute(serde_json::json!({}), &ctx())
            .await
            .unwrap();
        assert_eq!(output.result["preferences"]["location"], "Berlin");
    }

    #[tokio::test]
    async fn test_invalid_preference_type() {
        let store: Arc<dyn Database> = Arc::new(MemoryStore::new());
        let output = SaveUserPreferenceTool::new(store)
            .execute(
                serde_json::json!({"preference_type": "favourite_colour", "value": "teal"}),
                &ctx(),
            )
            .await
            .unwrap();
        assert_eq!(output.result["success"], false);
    }

    #[tokio::test]
    async fn test_anonymous_memory_is_empty() {
        let store: Arc<dyn Database> = Arc::new(MemoryStore::new());
        let output = GetUserMemoryTool::new(store)
            .execute(serde_json::json!({}), &ToolContext::default())
            .await
            .unwrap();
        assert_eq!(output.result["is_returning"], false);
    }
}
