//! Configuration loaded from the environment.
//!
//! Every knob has a default so a `.env` with just `DATABASE_URL` and
//! `GOOGLE_API_KEY` is enough for a local run.

use secrecy::SecretString;

use crate::error::ConfigError;

/// Top-level configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub llm: LlmConfig,
    pub server: ServerConfig,
    pub governor: GovernorConfig,
    pub compaction: CompactionConfig,
    pub turn: TurnConfig,
    pub search: SearchConfig,
    /// Tool names that require human confirmation before execution.
    pub gated_tools: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            database: DatabaseConfig::from_env()?,
            llm: LlmConfig::from_env(),
            server: ServerConfig::from_env()?,
            governor: GovernorConfig::from_env()?,
            compaction: CompactionConfig::from_env()?,
            turn: TurnConfig::from_env()?,
            search: SearchConfig::from_env(),
            gated_tools: default_gated_tools(),
        })
    }
}

/// PostgreSQL connection settings.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    url: String,
    pub pool_size: usize,
}

impl DatabaseConfig {
    pub fn new(url: impl Into<String>, pool_size: usize) -> Self {
        Self {
            url: url.into(),
            pool_size,
        }
    }

    fn from_env() -> Result<Self, ConfigError> {
        let url = std::env::var("DATABASE_URL").map_err(|_| ConfigError::Missing {
            name: "DATABASE_URL",
        })?;
        Ok(Self {
            url,
            pool_size: parse_env("DATABASE_POOL_SIZE", 10)?,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// LLM provider settings (Google Gemini, OpenAI-compatible endpoint).
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: Option<SecretString>,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl LlmConfig {
    fn from_env() -> Self {
        Self {
            api_key: std::env::var("GOOGLE_API_KEY")
                .ok()
                .filter(|k| !k.is_empty())
                .map(SecretString::from),
            base_url: std::env::var("GOOGLE_BASE_URL").unwrap_or_else(|_| {
                "https://generativelanguage.googleapis.com/v1beta/openai".to_string()
            }),
            model: std::env::var("GOOGLE_MODEL")
                .unwrap_or_else(|_| "gemini-2.0-flash".to_string()),
            temperature: 0.7,
            max_tokens: 4096,
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            host: std::env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_env("SERVER_PORT", 8123)?,
        })
    }
}

/// Tool-call budget settings.
#[derive(Debug, Clone, Copy)]
pub struct GovernorConfig {
    /// Hard cap on tool calls per thread.
    pub max_calls: u32,
    /// Percentage of the cap at which a one-time warning is logged.
    pub warn_at_percentage: u32,
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            max_calls: 50,
            warn_at_percentage: 80,
        }
    }
}

impl GovernorConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            max_calls: parse_env("TOOL_CALL_LIMIT", 50)?,
            warn_at_percentage: parse_env("TOOL_CALL_WARN_PCT", 80)?,
        })
    }
}

/// History compaction settings.
#[derive(Debug, Clone, Copy)]
pub struct CompactionConfig {
    /// Approximate token budget for the model view.
    pub max_tokens: usize,
    /// Recency floor: never hand the model fewer messages than this.
    pub keep_recent_messages: usize,
    /// Preserve a leading system message in full.
    pub keep_system_message: bool,
}

impl Default for CompactionConfig {
    fn default() -> Self {
        Self {
            max_tokens: 8000,
            keep_recent_messages: 6,
            keep_system_message: true,
        }
    }
}

impl CompactionConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            max_tokens: parse_env("CONTEXT_MAX_TOKENS", 8000)?,
            keep_recent_messages: parse_env("CONTEXT_KEEP_RECENT", 6)?,
            keep_system_message: true,
        })
    }
}

/// Turn-protocol settings for the run controller.
#[derive(Debug, Clone, Copy)]
pub struct TurnConfig {
    /// Ceiling on model invocations per turn, distinct from the tool budget.
    pub max_iterations: u32,
    /// Per-tool execution timeout in seconds.
    pub tool_timeout_secs: u64,
}

impl Default for TurnConfig {
    fn default() -> Self {
        Self {
            max_iterations: 25,
            tool_timeout_secs: 30,
        }
    }
}

impl TurnConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            max_iterations: parse_env("TURN_MAX_ITERATIONS", 25)?,
            tool_timeout_secs: parse_env("TOOL_TIMEOUT_SECS", 30)?,
        })
    }
}

/// External job-search provider settings.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub api_key: Option<SecretString>,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.tavily.com".to_string(),
            timeout_secs: 15,
        }
    }
}

impl SearchConfig {
    fn from_env() -> Self {
        Self {
            api_key: std::env::var("TAVILY_API_KEY")
                .ok()
                .filter(|k| !k.is_empty())
                .map(SecretString::from),
            base_url: std::env::var("TAVILY_BASE_URL")
                .unwrap_or_else(|_| "https://api.tavily.com".to_string()),
            timeout_secs: 15,
        }
    }
}

/// Tools that mutate persistent state or book real-world resources.
///
/// Users must confirm these before they run. The set is fixed at
/// configuration time, never inferred from tool metadata at call time.
pub fn default_gated_tools() -> Vec<String> {
    [
        // Onboarding: profile writes
        "confirm_role_preference",
        "confirm_trinity",
        "confirm_experience",
        "confirm_location",
        "confirm_search_prefs",
        "complete_onboarding",
        // Jobs: saves and status updates
        "save_job",
        "update_job_status",
        // Memory: preference writes
        "save_user_preference",
        "save_user_fact",
        // Coaching: real-world bookings
        "schedule_session",
        "cancel_session",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn parse_env<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_gated_tools_cover_all_mutating_tools() {
        let gated = default_gated_tools();
        assert!(gated.contains(&"confirm_role_preference".to_string()));
        assert!(gated.contains(&"save_job".to_string()));
        assert!(gated.contains(&"schedule_session".to_string()));
        assert!(gated.contains(&"cancel_session".to_string()));
        // Read-only tools must never be gated.
        assert!(!gated.contains(&"search_jobs".to_string()));
        assert!(!gated.contains(&"find_coaches".to_string()));
        assert!(!gated.contains(&"get_user_memory".to_string()));
    }

    #[test]
    fn test_defaults() {
        let governor = GovernorConfig::default();
        assert_eq!(governor.max_calls, 50);
        assert_eq!(governor.warn_at_percentage, 80);

        let compaction = CompactionConfig::default();
        assert_eq!(compaction.max_tokens, 8000);
        assert_eq!(compaction.keep_recent_messages, 6);
        assert!(compaction.keep_system_message);
    }
}
