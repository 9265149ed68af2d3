//! The turn protocol: model loop, tool dispatch, and interrupt/resume.
//!
//! One `run_turn` drives a single external input to one of two outcomes:
//! a final assistant answer, or a suspension awaiting human confirmation
//! of a gated tool call. State is checkpointed at every suspension point
//! so a process restart resumes exactly where the thread left off.
//!
//! The caller is responsible for serializing turns per thread id; the
//! controller assumes at most one in-flight turn per thread.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crate::agent::compactor::HistoryCompactor;
use crate::agent::governor::ToolCallGovernor;
use crate::config::{CompactionConfig, GovernorConfig, TurnConfig};
use crate::db::CheckpointStore;
use crate::error::RunError;
use crate::history::{Checkpoint, Message, MessageRole, PendingInterrupt, ToolCallRequest};
use crate::llm::{ChatMessage, LlmProvider, ToolCompletionRequest};
use crate::tools::{ToolContext, ToolRegistry};

/// System prompt for the orchestrator.
const ORCHESTRATOR_PROMPT: &str = "You are the orchestrator for Questline, a platform helping \
fractional executives (CTO, CFO, CMO, COO, CPO) find roles. Route the conversation to the right \
capability: onboarding tools while the profile is incomplete, job-search tools for finding and \
saving opportunities, coaching tools for finding coaches and booking sessions. Check \
get_user_memory and the profile before re-asking for information the user already gave. Be warm, \
professional, and concise.";

/// Control-plane configuration for the run controller.
#[derive(Debug, Clone)]
pub struct ControlPlaneConfig {
    pub governor: GovernorConfig,
    pub compaction: CompactionConfig,
    pub turn: TurnConfig,
    /// Tool names requiring human confirmation before execution.
    pub gated_tools: HashSet<String>,
}

/// One external input for a thread.
#[derive(Debug, Clone)]
pub enum TurnInput {
    /// A new human message.
    Message(String),
    /// Resolution of a pending gated call.
    Confirmation { call_id: String, approved: bool },
}

/// A full turn invocation.
#[derive(Debug, Clone)]
pub struct TurnRequest {
    pub thread_id: String,
    pub input: TurnInput,
    pub user_id: Option<String>,
    /// Per-request override of the gated-tool set.
    pub gated_override: Option<HashSet<String>>,
}

/// Result of a completed turn.
#[derive(Debug, Clone)]
pub enum TurnOutcome {
    /// The model produced a final answer with no pending tool calls.
    FinalAnswer(String),
    /// A gated call was requested; the thread is suspended until a
    /// confirmation arrives.
    AwaitingConfirmation(PendingInterrupt),
}

/// Drives the turn-taking protocol for all threads.
pub struct RunController {
    store: Arc<dyn CheckpointStore>,
    llm: Arc<dyn LlmProvider>,
    tools: Arc<ToolRegistry>,
    governor: ToolCallGovernor,
    compactor: HistoryCompactor,
    gated: HashSet<String>,
    turn: TurnConfig,
}

impl RunController {
    pub fn new(
        store: Arc<dyn CheckpointStore>,
        llm: Arc<dyn LlmProvider>,
        tools: Arc<ToolRegistry>,
        config: ControlPlaneConfig,
    ) -> Self {
        Self {
            store,
            llm,
            tools,
            governor: ToolCallGovernor::new(config.governor),
            compactor: HistoryCompactor::new(config.compaction),
            gated: config.gated_tools,
            turn: config.turn,
        }
    }

    /// Run one turn for a thread.
    pub async fn run_turn(&self, req: TurnRequest) -> Result<TurnOutcome, RunError> {
        let thread_id = req.thread_id.clone();
        let gated = req.gated_override.as_ref().unwrap_or(&self.gated);
        let ctx = ToolContext {
            thread_id: thread_id.clone(),
            user_id: req.user_id.clone(),
        };

        let (mut messages, mut step, pending) = match self.store.load(&thread_id).await? {
            Some(checkpoint) => (
                checkpoint.messages,
                checkpoint.step,
                checkpoint.pending_interrupt,
            ),
            None => (vec![Message::system(ORCHESTRATOR_PROMPT)], 0, None),
        };

        match (req.input, pending) {
            (TurnInput::Confirmation { call_id, approved }, Some(interrupt)) => {
                if interrupt.call_id != call_id {
                    // Executing the wrong gated call would be a safety
                    // violation; nothing is persisted, the interrupt stays.
                    return Err(RunError::ConfirmationMismatch {
                        expected: interrupt.call_id,
                        got: call_id,
                    });
                }

                // Seed the governor from the state that preceded the
                // suspended model turn; the resumed dispatches below then
                // count toward the cap normally.
                if let Some(idx) = last_assistant_index(&messages) {
                    self.governor.before_turn(&thread_id, &messages[..idx])?;
                }

                let payload = if approved {
                    tracing::info!(%thread_id, tool = %interrupt.tool_name, "gated call approved");
                    self.governor.on_tool_call(&thread_id)?;
                    // Execute with the arguments captured at suspension,
                    // verbatim.
                    let call = ToolCallRequest {
                        call_id: interrupt.call_id.clone(),
                        name: interrupt.tool_name.clone(),
                        arguments: interrupt.arguments.clone(),
                    };
                    self.execute_tool(&call, &ctx).await
                } else {
                    tracing::info!(%thread_id, tool = %interrupt.tool_name, "gated call denied");
                    serde_json::json!({
                        "success": false,
                        "declined": true,
                        "message": format!(
                            "The user declined to run '{}'. Do not retry it without asking.",
                            interrupt.tool_name
                        ),
                    })
                    .to_string()
                };
                messages.push(Message::tool_result(&interrupt.call_id, payload));

                // The first gated call blocked the rest of its turn;
                // re-evaluate the remaining requests now.
                if let Some(outcome) = self
                    .dispatch_unanswered(&thread_id, &mut messages, step, gated, &ctx)
                    .await?
                {
                    return Ok(outcome);
                }
            }
            (TurnInput::Confirmation { .. }, None) => {
                return Err(RunError::NoPendingConfirmation);
            }
            (TurnInput::Message(_), Some(interrupt)) => {
                // An unanswered gated request blocks a new human turn.
                return Err(RunError::ConfirmationRequired {
                    call_id: interrupt.call_id,
                });
            }
            (TurnInput::Message(text), None) => {
                messages.push(Message::human(text));
            }
        }

        for _ in 0..self.turn.max_iterations {
            self.governor.before_turn(&thread_id, &messages)?;

            // Ephemeral view for this call only; `messages` stays intact.
            let view = self.compactor.compact(&messages);
            let request = ToolCompletionRequest::new(
                view.iter().map(ChatMessage::from).collect(),
                self.tools.definitions(),
            )
            .with_tool_choice("auto");

            let response = self.llm.complete_with_tools(request).await?;
            step += 1;

            let calls: Vec<ToolCallRequest> = response
                .tool_calls
                .into_iter()
                .map(|tc| ToolCallRequest {
                    call_id: tc.id,
                    name: tc.name,
                    arguments: tc.arguments,
                })
                .collect();
            let content = response.content.unwrap_or_default();
            messages.push(Message::assistant_with_calls(content.clone(), calls.clone()));

            if calls.is_empty() {
                self.checkpoint(&thread_id, &messages, None, step).await?;
                return Ok(TurnOutcome::FinalAnswer(content));
            }

            if let Some(outcome) = self
                .dispatch_unanswered(&thread_id, &mut messages, step, gated, &ctx)
                .await?
            {
                return Ok(outcome);
            }
            // All requested calls were free and executed; the model may
            // want to react to their results.
        }

        self.checkpoint(&thread_id, &messages, None, step).await?;
        Err(RunError::StepLimitExceeded {
            limit: self.turn.max_iterations,
        })
    }

    /// Dispatch the unanswered tool calls of the last assistant message,
    /// in request order.
    ///
    /// Returns a suspension outcome if a gated call is encountered; the
    /// remaining calls stay unanswered until it resolves.
    async fn dispatch_unanswered(
        &self,
        thread_id: &str,
        messages: &mut Vec<Message>,
        step: u32,
        gated: &HashSet<String>,
        ctx: &ToolContext,
    ) -> Result<Option<TurnOutcome>, RunError> {
        for call in unanswered_calls(messages) {
            if gated.contains(&call.name) {
                let interrupt = PendingInterrupt {
                    call_id: call.call_id.clone(),
                    tool_name: call.name.clone(),
                    arguments: call.arguments.clone(),
                    captured_at_step: step,
                };
                self.checkpoint(thread_id, messages, Some(interrupt.clone()), step)
                    .await?;
                tracing::info!(thread_id, tool = %call.name, call_id = %call.call_id,
                    "suspended for confirmation");
                return Ok(Some(TurnOutcome::AwaitingConfirmation(interrupt)));
            }

            if let Err(e) = self.governor.on_tool_call(thread_id) {
                // Results of already-executed calls must not be lost:
                // their side effects happened.
                self.checkpoint(thread_id, messages, None, step).await?;
                return Err(e);
            }

            let payload = self.execute_tool(&call, ctx).await;
            messages.push(Message::tool_result(&call.call_id, payload));
        }

        self.checkpoint(thread_id, messages, None, step).await?;
        Ok(None)
    }

    /// Execute one tool call, folding every failure into a result payload
    /// the model can react to.
    async fn execute_tool(&self, call: &ToolCallRequest, ctx: &ToolContext) -> String {
        let Some(tool) = self.tools.get(&call.name) else {
            return failure_payload(format!("Unknown tool '{}'", call.name));
        };

        let timeout = Duration::from_secs(self.turn.tool_timeout_secs);
        match tokio::time::timeout(timeout, tool.execute(call.arguments.clone(), ctx)).await {
            Ok(Ok(output)) => output.result.to_string(),
            Ok(Err(e)) => {
                tracing::warn!(tool = %call.name, error = %e, "tool execution failed");
                failure_payload(e.to_string())
            }
            Err(_) => {
                tracing::warn!(tool = %call.name, ?timeout, "tool execution timed out");
                failure_payload(format!("Tool '{}' timed out after {timeout:?}", call.name))
            }
        }
    }

    async fn checkpoint(
        &self,
        thread_id: &str,
        messages: &[Message],
        pending_interrupt: Option<PendingInterrupt>,
        step: u32,
    ) -> Result<(), RunError> {
        let checkpoint = Checkpoint::new(thread_id, messages.to_vec(), pending_interrupt, step);
        self.store.append(thread_id, &checkpoint).await?;
        Ok(())
    }
}

fn failure_payload(error: String) -> String {
    serde_json::json!({"success": false, "error": error}).to_string()
}

fn last_assistant_index(messages: &[Message]) -> Option<usize> {
    messages
        .iter()
        .rposition(|m| m.role == MessageRole::Assistant)
}

/// Tool calls of the last assistant message that have no tool result yet,
/// in request order.
fn unanswered_calls(messages: &[Message]) -> Vec<ToolCallRequest> {
    let Some(idx) = last_assistant_index(messages) else {
        return Vec::new();
    };

    let answered: HashSet<&str> = messages
        .iter()
        .filter_map(|m| m.tool_call_id.as_deref())
        .collect();

    messages[idx]
        .tool_calls
        .iter()
        .filter(|c| !answered.contains(c.call_id.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::error::LlmError;
    use crate::llm::{ToolCall, ToolCompletionResponse};
    use crate::tools::{Tool, ToolError, ToolOutput};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Provider that replays a fixed script of responses.
    struct ScriptedLlm {
        script: Mutex<Vec<ToolCompletionResponse>>,
        calls: AtomicUsize,
    }

    impl ScriptedLlm {
        fn new(mut responses: Vec<ToolCompletionResponse>) -> Self {
            responses.reverse();
            Self {
                script: Mutex::new(responses),
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedLlm {
        async fn complete_with_tools(
            &self,
            _req: ToolCompletionRequest,
        ) -> Result<ToolCompletionResponse, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| LlmError::RequestFailed {
                    provider: "scripted".to_string(),
                    reason: "script exhausted".to_string(),
                })
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    struct CountingTool {
        executions: AtomicUsize,
    }

    #[async_trait]
    impl Tool for CountingTool {
        fn name(&self) -> &str {
            "counting_tool"
        }

        fn description(&self) -> &str {
            "Counts executions."
        }

        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({"type": "object", "properties": {}})
        }

        async fn execute(
            &self,
            _params: serde_json::Value,
            _ctx: &ToolContext,
        ) -> Result<ToolOutput, ToolError> {
            self.executions.fetch_add(1, Ordering::SeqCst);
            Ok(ToolOutput::success(serde_json::json!({"message": "ok"})))
        }
    }

    fn text_response(content: &str) -> ToolCompletionResponse {
        ToolCompletionResponse {
            content: Some(content.to_string()),
            tool_calls: vec![],
            input_tokens: 0,
            output_tokens: 0,
        }
    }

    fn call_response(id: &str, name: &str, args: serde_json::Value) -> ToolCompletionResponse {
        ToolCompletionResponse {
            content: None,
            tool_calls: vec![ToolCall {
                id: id.to_string(),
                name: name.to_string(),
                arguments: args,
            }],
            input_tokens: 0,
            output_tokens: 0,
        }
    }

    fn controller(
        llm: Arc<ScriptedLlm>,
        store: Arc<MemoryStore>,
        gated: &[&str],
    ) -> (RunController, Arc<CountingTool>) {
        let tool = Arc::new(CountingTool {
            executions: AtomicUsize::new(0),
        });
        let mut registry = ToolRegistry::new();
        registry.register(tool.clone());

        let config = ControlPlaneConfig {
            governor: GovernorConfig::default(),
            compaction: CompactionConfig::default(),
            turn: TurnConfig::default(),
            gated_tools: gated.iter().map(|s| s.to_string()).collect(),
        };
        (
            RunController::new(store, llm, Arc::new(registry), config),
            tool,
        )
    }

    #[tokio::test]
    async fn test_plain_answer_checkpoints_and_returns() {
        let llm = Arc::new(ScriptedLlm::new(vec![text_response("Hello there!")]));
        let store = Arc::new(MemoryStore::new());
        let (runner, _) = controller(llm, store.clone(), &[]);

        let outcome = runner
            .run_turn(TurnRequest {
                thread_id: "t1".to_string(),
                input: TurnInput::Message("hi".to_string()),
                user_id: None,
                gated_override: None,
            })
            .await
            .unwrap();

        assert!(matches!(outcome, TurnOutcome::FinalAnswer(ref a) if a == "Hello there!"));

        let checkpoint = store.load("t1").await.unwrap().unwrap();
        assert_eq!(checkpoint.step, 1);
        assert!(checkpoint.pending_interrupt.is_none());
        // system + human + assistant
        assert_eq!(checkpoint.messages.len(), 3);
        assert_eq!(checkpoint.messages[0].role, MessageRole::System);
    }

    #[tokio::test]
    async fn test_free_tool_executes_then_model_reacts() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            call_response("c1", "counting_tool", serde_json::json!({})),
            text_response("Done."),
        ]));
        let store = Arc::new(MemoryStore::new());
        let (runner, tool) = controller(llm.clone(), store.clone(), &[]);

        let outcome = runner
            .run_turn(TurnRequest {
                thread_id: "t1".to_string(),
                input: TurnInput::Message("go".to_string()),
                user_id: None,
                gated_override: None,
            })
            .await
            .unwrap();

        assert!(matches!(outcome, TurnOutcome::FinalAnswer(_)));
        assert_eq!(tool.executions.load(Ordering::SeqCst), 1);
        assert_eq!(llm.call_count(), 2);

        let checkpoint = store.load("t1").await.unwrap().unwrap();
        // system, human, assistant(call), tool result, assistant
        assert_eq!(checkpoint.messages.len(), 5);
        assert_eq!(checkpoint.messages[3].tool_call_id.as_deref(), Some("c1"));
    }

    #[tokio::test]
    async fn test_gated_call_suspends_without_executing() {
        let llm = Arc::new(ScriptedLlm::new(vec![call_response(
            "c1",
            "counting_tool",
            serde_json::json!({"x": 1}),
        )]));
        let store = Arc::new(MemoryStore::new());
        let (runner, tool) = controller(llm, store.clone(), &["counting_tool"]);

        let outcome = runner
            .run_turn(TurnRequest {
                thread_id: "t1".to_string(),
                input: TurnInput::Message("go".to_string()),
                user_id: None,
                gated_override: None,
            })
            .await
            .unwrap();

        let TurnOutcome::AwaitingConfirmation(interrupt) = outcome else {
            panic!("expected suspension");
        };
        assert_eq!(interrupt.tool_name, "counting_tool");
        assert_eq!(interrupt.arguments, serde_json::json!({"x": 1}));
        assert_eq!(tool.executions.load(Ordering::SeqCst), 0);

        // The interrupt is durably persisted.
        let checkpoint = store.load("t1").await.unwrap().unwrap();
        assert_eq!(checkpoint.pending_interrupt, Some(interrupt));
    }

    #[tokio::test]
    async fn test_approve_executes_with_captured_arguments() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            call_response("c1", "counting_tool", serde_json::json!({"x": 1})),
            text_response("Saved."),
        ]));
        let store = Arc::new(MemoryStore::new());
        let (runner, tool) = controller(llm, store.clone(), &["counting_tool"]);

        let outcome = runner
            .run_turn(TurnRequest {
                thread_id: "t1".to_string(),
                input: TurnInput::Message("go".to_string()),
                user_id: None,
                gated_override: None,
            })
            .await
            .unwrap();
        let TurnOutcome::AwaitingConfirmation(interrupt) = outcome else {
            panic!("expected suspension");
        };

        let outcome = runner
            .run_turn(TurnRequest {
                thread_id: "t1".to_string(),
                input: TurnInput::Confirmation {
                    call_id: interrupt.call_id.clone(),
                    approved: true,
                },
                user_id: None,
                gated_override: None,
            })
            .await
            .unwrap();

        assert!(matches!(outcome, TurnOutcome::FinalAnswer(ref a) if a == "Saved."));
        assert_eq!(tool.executions.load(Ordering::SeqCst), 1);

        let checkpoint = store.load("t1").await.unwrap().unwrap();
        assert!(checkpoint.pending_interrupt.is_none());
    }

    #[tokio::test]
    async fn test_deny_never_executes_and_synthesizes_decline() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            call_response("c1", "counting_tool", serde_json::json!({})),
            text_response("Understood."),
        ]));
        let store = Arc::new(MemoryStore::new());
        let (runner, tool) = controller(llm, store.clone(), &["counting_tool"]);

        runner
            .run_turn(TurnRequest {
                thread_id: "t1".to_string(),
                input: TurnInput::Message("go".to_string()),
                user_id: None,
                gated_override: None,
            })
            .await
            .unwrap();

        let outcome = runner
            .run_turn(TurnRequest {
                thread_id: "t1".to_string(),
                input: TurnInput::Confirmation {
                    call_id: "c1".to_string(),
                    approved: false,
                },
                user_id: None,
                gated_override: None,
            })
            .await
            .unwrap();

        assert!(matches!(outcome, TurnOutcome::FinalAnswer(_)));
        assert_eq!(tool.executions.load(Ordering::SeqCst), 0);

        let checkpoint = store.load("t1").await.unwrap().unwrap();
        let decline = checkpoint
            .messages
            .iter()
            .find(|m| m.tool_call_id.as_deref() == Some("c1"))
            .unwrap();
        let payload: serde_json::Value = serde_json::from_str(&decline.content).unwrap();
        assert_eq!(payload["success"], false);
        assert_eq!(payload["declined"], true);
    }

    #[tokio::test]
    async fn test_confirmation_mismatch_is_fatal_and_preserves_interrupt() {
        let llm = Arc::new(ScriptedLlm::new(vec![call_response(
            "c1",
            "counting_tool",
            serde_json::json!({}),
        )]));
        let store = Arc::new(MemoryStore::new());
        let (runner, _) = controller(llm, store.clone(), &["counting_tool"]);

        runner
            .run_turn(TurnRequest {
                thread_id: "t1".to_string(),
                input: TurnInput::Message("go".to_string()),
                user_id: None,
                gated_override: None,
            })
            .await
            .unwrap();

        let err = runner
            .run_turn(TurnRequest {
                thread_id: "t1".to_string(),
                input: TurnInput::Confirmation {
                    call_id: "bogus".to_string(),
                    approved: true,
                },
                user_id: None,
                gated_override: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, RunError::ConfirmationMismatch { .. }));

        // The interrupt survives for a correct retry.
        let checkpoint = store.load("t1").await.unwrap().unwrap();
        assert!(checkpoint.pending_interrupt.is_some());
    }

    #[tokio::test]
    async fn test_message_while_suspended_is_rejected() {
        let llm = Arc::new(ScriptedLlm::new(vec![call_response(
            "c1",
            "counting_tool",
            serde_json::json!({}),
        )]));
        let store = Arc::new(MemoryStore::new());
        let (runner, _) = controller(llm, store, &["counting_tool"]);

        runner
            .run_turn(TurnRequest {
                thread_id: "t1".to_string(),
                input: TurnInput::Message("go".to_string()),
                user_id: None,
                gated_override: None,
            })
            .await
            .unwrap();

        let err = runner
            .run_turn(TurnRequest {
                thread_id: "t1".to_string(),
                input: TurnInput::Message("are you there?".to_string()),
                user_id: None,
                gated_override: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, RunError::ConfirmationRequired { .. }));
    }

    #[tokio::test]
    async fn test_confirmation_without_interrupt_is_rejected() {
        let llm = Arc::new(ScriptedLlm::new(vec![]));
        let store = Arc::new(MemoryStore::new());
        let (runner, _) = controller(llm, store, &[]);

        let err = runner
            .run_turn(TurnRequest {
                thread_id: "t1".to_string(),
                input: TurnInput::Confirmation {
                    call_id: "c1".to_string(),
                    approved: true,
                },
                user_id: None,
                gated_override: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, RunError::NoPendingConfirmation));
    }

    #[tokio::test]
    async fn test_step_ceiling_bounds_the_loop() {
        // The model requests a free tool forever.
        let responses: Vec<ToolCompletionResponse> = (0..30)
            .map(|i| call_response(&format!("c{i}"), "counting_tool", serde_json::json!({})))
            .collect();
        let llm = Arc::new(ScriptedLlm::new(responses));
        let store = Arc::new(MemoryStore::new());
        let (mut runner, _tool) = controller(llm, store, &[]);
        runner.turn.max_iterations = 5;

        let err = runner
            .run_turn(TurnRequest {
                thread_id: "t1".to_string(),
                input: TurnInput::Message("loop".to_string()),
                user_id: None,
                gated_override: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, RunError::StepLimitExceeded { limit: 5 }));
    }

    #[tokio::test]
    async fn test_unknown_tool_becomes_failure_payload() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            call_response("c1", "no_such_tool", serde_json::json!({})),
            text_response("Sorry about that."),
        ]));
        let store = Arc::new(MemoryStore::new());
        let (runner, _) = controller(llm, store.clone(), &[]);

        let outcome = runner
            .run_turn(TurnRequest {
                thread_id: "t1".to_string(),
                input: TurnInput::Message("go".to_string()),
                user_id: None,
                gated_override: None,
            })
            .await
            .unwrap();
        assert!(matches!(outcome, TurnOutcome::FinalAnswer(_)));

        let checkpoint = store.load("t1").await.unwrap().unwrap();
        let result = checkpoint
            .messages
            .iter()
            .find(|m| m.tool_call_id.as_deref() == Some("c1"))
            .unwrap();
        let payload: serde_json::Value = serde_json::from_str(&result.content).unwrap();
        assert_eq!(payload["success"], false);
        assert!(payload["error"].as_str().unwrap().contains("no_such_tool"));
    }

    #[test]
    fn test_unanswered_calls_ordering() {
        let calls = vec![
            ToolCallRequest {
                call_id: "c1".to_string(),
                name: "a".to_string(),
                arguments: serde_json::json!({}),
            },
            ToolCallRequest {
                call_id: "c2".to_string(),
                name: "b".to_string(),
                arguments: serde_json::json!({}),
            },
        ];
        let messages = vec![
            Message::human("go"),
            Message::assistant_with_calls("", calls),
            Message::tool_result("c1", "{}"),
        ];

        let unanswered = unanswered_calls(&messages);
        assert_eq!(unanswered.len(), 1);
        assert_eq!(unanswered[0].call_id, "c2");
    }
}
