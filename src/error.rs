//! Error types shared across the crate.
//!
//! Domain-tool failures are not represented here: tools report expected
//! failures inside their result envelope (`success: false`) and only raise
//! `ToolError` (see `tools::tool`) for infrastructure problems.

use std::time::Duration;

use thiserror::Error;

/// Errors from the storage layer.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Connection pool could not be built.
    #[error("Pool error: {0}")]
    Pool(String),

    /// Failed to check out a connection.
    #[error("Pool checkout failed: {0}")]
    Checkout(#[from] deadpool_postgres::PoolError),

    /// Query or statement failure.
    #[error("Database error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    /// Checkpoint payload could not be (de)serialized.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Storage provisioning failed for a reason other than "already exists".
    #[error("Initialization failed: {reason}")]
    InitializationFailed { reason: String },
}

/// Errors from LLM providers.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Authentication failed for provider '{provider}'")]
    AuthFailed { provider: String },

    #[error("Request to provider '{provider}' failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Rate limited by provider '{provider}'")]
    RateLimited {
        provider: String,
        retry_after: Option<Duration>,
    },

    #[error("Invalid response from provider '{provider}': {reason}")]
    InvalidResponse { provider: String, reason: String },
}

/// Errors from the external job-search provider.
#[derive(Debug, Error)]
pub enum SearchError {
    /// No API key configured; the caller should fall back to local data.
    #[error("Search provider not configured")]
    NotConfigured,

    #[error("Search request failed: {0}")]
    Request(String),

    #[error("Search response could not be parsed: {0}")]
    InvalidResponse(String),
}

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable {name}")]
    Missing { name: &'static str },

    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Faults surfaced by the run controller.
///
/// These abort the current turn and propagate to the transport layer.
/// Tool execution failures never appear here: the controller folds them
/// into the conversation as tool-result messages.
#[derive(Debug, Error)]
pub enum RunError {
    /// The per-thread tool-call budget was exhausted.
    #[error(
        "Tool call limit exceeded: {current} calls (limit: {limit}). \
         This prevents runaway costs. Consider starting a new conversation."
    )]
    ToolBudgetExceeded { limit: u32, current: u32 },

    /// The model kept requesting work past the per-turn step ceiling.
    #[error("Step ceiling of {limit} model invocations reached without a final answer")]
    StepLimitExceeded { limit: u32 },

    /// Checkpoint I/O failed; nothing was persisted for this turn.
    #[error("Checkpoint failure: {0}")]
    Checkpoint(#[from] DatabaseError),

    #[error("Model invocation failed: {0}")]
    Llm(#[from] LlmError),

    /// A confirmation arrived for a call other than the persisted one.
    #[error("Confirmation for call '{got}' does not match pending call '{expected}'")]
    ConfirmationMismatch { expected: String, got: String },

    /// A confirmation arrived but no interrupt is pending on the thread.
    #[error("No confirmation is pending for this thread")]
    NoPendingConfirmation,

    /// A plain message arrived while a gated call is awaiting confirmation.
    #[error("Call '{call_id}' is awaiting confirmation; approve or deny it first")]
    ConfirmationRequired { call_id: String },
}

impl RunError {
    /// Whether this fault may be shown verbatim to the end user.
    ///
    /// Budget exhaustion is always surfaced explicitly; everything else is
    /// rendered as a generic failure by the transport layer.
    pub fn is_user_visible(&self) -> bool {
        matches!(
            self,
            RunError::ToolBudgetExceeded { .. }
                | RunError::ConfirmationRequired { .. }
                | RunError::NoPendingConfirmation
        )
    }
}
