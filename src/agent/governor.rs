//! Tool-call budget enforcement.
//!
//! Tool calls cost money, and a bad routing decision can loop forever.
//! The governor caps tool calls per thread with an early warning. The
//! counter is never trusted on its own: [`ToolCallGovernor::before_turn`]
//! re-derives it from the durable message history, so a resumed run after
//! a process restart reconstructs the true cumulative count.

use std::sync::Mutex;

use crate::config::GovernorConfig;
use crate::error::RunError;
use crate::history::Message;

#[derive(Debug, Default)]
struct ThreadState {
    thread_id: Option<String>,
    call_count: u32,
    warned: bool,
}

/// Per-thread tool-call counter with a hard cap and warning threshold.
pub struct ToolCallGovernor {
    config: GovernorConfig,
    state: Mutex<ThreadState>,
}

/// Count tool-call requests across all assistant messages.
pub fn count_tool_calls(messages: &[Message]) -> u32 {
    messages.iter().map(|m| m.tool_calls.len() as u32).sum()
}

impl ToolCallGovernor {
    pub fn new(config: GovernorConfig) -> Self {
        Self {
            config,
            state: Mutex::new(ThreadState::default()),
        }
    }

    fn warn_threshold(&self) -> u32 {
        // ceil(max * pct / 100)
        (self.config.max_calls * self.config.warn_at_percentage).div_ceil(100)
    }

    /// Recompute the counter from history before a model invocation.
    ///
    /// Errors if the thread has already exhausted its budget, before the
    /// model is invoked again.
    pub fn before_turn(&self, thread_id: &str, history: &[Message]) -> Result<(), RunError> {
        let mut state = self.state.lock().expect("governor state poisoned");

        // Switching threads resets to zero state before recomputation.
        if state.thread_id.as_deref() != Some(thread_id) {
            *state = ThreadState {
                thread_id: Some(thread_id.to_string()),
                call_count: 0,
                warned: false,
            };
        }

        state.call_count = count_tool_calls(history);
        self.check(&mut state, thread_id, false)
    }

    /// Account for one dispatched tool call.
    ///
    /// Errors if the call would exceed the budget; the caller must not
    /// dispatch it in that case.
    pub fn on_tool_call(&self, thread_id: &str) -> Result<(), RunError> {
        let mut state = self.state.lock().expect("governor state poisoned");

        if state.thread_id.as_deref() != Some(thread_id) {
            *state = ThreadState {
                thread_id: Some(thread_id.to_string()),
                call_count: 0,
                warned: false,
            };
        }

        state.call_count += 1;
        self.check(&mut state, thread_id, true)
    }

    fn check(
        &self,
        state: &mut ThreadState,
        thread_id: &str,
        dispatching: bool,
    ) -> Result<(), RunError> {
        let max = self.config.max_calls;

        // A dispatch is allowed to land exactly on the cap; the turn is
        // then stopped at the next before_turn. Recomputation at or past
        // the cap blocks the turn outright.
        let over = if dispatching {
            state.call_count > max
        } else {
            state.call_count >= max
        };
        if over {
            tracing::error!(
                thread_id,
                count = state.call_count,
                limit = max,
                "tool call limit exceeded"
            );
            return Err(RunError::ToolBudgetExceeded {
                limit: max,
                current: state.call_count,
            });
        }

        if !state.warned && state.call_count >= self.warn_threshold() {
            state.warned = true;
            tracing::warn!(
                thread_id,
                count = state.call_count,
                limit = max,
                threshold_pct = self.config.warn_at_percentage,
                "approaching tool call limit"
            );
        }

        Ok(())
    }
}
