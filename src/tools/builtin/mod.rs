//! Built-in tools that come with the agent.

mod coaching;
mod jobs;
mod memory;
mod onboarding;

pub use coaching::{
    CancelSessionTool, FindCoachesTool, GetCoachDetailsTool, GetMySessionsTool,
    ScheduleSessionTool, VALID_SESSION_TYPES,
};
pub use jobs::{
    GetJobDetailsTool, GetSavedJobsTool, SaveJobTool, SearchJobsTool, UpdateJobStatusTool,
    VALID_SAVE_STATUS,
};
pub use memory::{
    GetUserMemoryTool, SaveUserFactTool, SaveUserPreferenceTool, VALID_PREFERENCE_TYPES,
};
pub use onboarding::{
    CompleteOnboardingTool, ConfirmExperienceTool, ConfirmLocationTool,
    ConfirmRolePreferenceTool, ConfirmSearchPrefsTool, ConfirmTrinityTool, GetProfileStatusTool,
    VALID_AVAILABILITY, VALID_REMOTE, VALID_ROLES, VALID_TRINITY,
};

use std::sync::Arc;

use crate::db::Database;
use crate::search::JobSearchClient;
use crate::tools::ToolRegistry;

/// Build the full registry of built-in tools.
pub fn builtin_registry(
    db: Arc<dyn Database>,
    search: Option<Arc<JobSearchClient>>,
) -> ToolRegistry {
    let mut registry = ToolRegistry::new();

    // Onboarding
    registry.register(Arc::new(GetProfileStatusTool::new(db.clone())));
    registry.register(Arc::new(ConfirmRolePreferenceTool::new(db.clone())));
    registry.register(Arc::new(ConfirmTrinityTool::new(db.clone())));
    registry.register(Arc::new(ConfirmExperienceTool::new(db.clone())));
    registry.register(Arc::new(ConfirmLocationTool::new(db.clone())));
    registry.register(Arc::new(ConfirmSearchPrefsTool::new(db.clone())));
    registry.register(Arc::new(CompleteOnboardingTool::new(db.clone())));

    // Jobs
    registry.register(Arc::new(SearchJobsTool::new(db.clone(), search)));
    registry.register(Arc::new(GetJobDetailsTool::new(db.clone())));
    registry.register(Arc::new(SaveJobTool::new(db.clone())));
    registry.register(Arc::new(GetSavedJobsTool::new(db.clone())));
    registry.register(Arc::new(UpdateJobStatusTool::new(db.clone())));

    // Coaching
    registry.register(Arc::new(FindCoachesTool::new(db.clone())));
    registry.register(Arc::new(GetCoachDetailsTool::new(db.clone())));
    registry.register(Arc::new(ScheduleSessionTool::new(db.clone())));
    registry.register(Arc::new(GetMySessionsTool::new(db.clone())));
    registry.register(Arc::new(CancelSessionTool::new(db.clone())));

    // Memory
    registry.register(Arc::new(GetUserMemoryTool::new(db.clone())));
    registry.register(Arc::new(SaveUserPreferenceTool::new(db.clone())));
    registry.register(Arc::new(SaveUserFactTool::new(db)));

    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_gated_tools;
    use crate::db::MemoryStore;

    #[test]
    fn test_registry_has_all_tools() {
        let registry = builtin_registry(Arc::new(MemoryStore::new()), None);
        assert_eq!(registry.len(), 20);
        assert!(registry.get("search_jobs").is_some());
        assert!(registry.get("confirm_role_preference").is_some());
        assert!(registry.get("schedule_session").is_some());
    }

    #[test]
    fn test_every_gated_name_resolves_to_a_tool() {
        let registry = builtin_registry(Arc::new(MemoryStore::new()), None);
        for name in default_gated_tools() {
            assert!(
                registry.get(&name).is_some(),
                "gated tool '{name}' is not registered"
            );
        }
    }
}
