//! Bounded reasoning loop over the tool catalog.
//!
//! One query is resolved as an explicit state machine: each `Thinking`
//! step asks the model for either an action or a final answer, parsed
//! into a typed [`AgentStep`]. Unknown tool names and malformed step
//! output are recorded as observations and retried — the loop never
//! crashes on the model's free-form output. When the iteration ceiling is
//! reached, the agent degrades to a best-effort synthesis over the
//! transcript instead of failing.
//!
//! [`guard_output`] is a separate boundary contract: whatever termination
//! path produced the final text, a leaked reasoning transcript is
//! replaced with a fixed user-facing message before the caller sees it.

use std::sync::Arc;

use crate::error::{LlmError, ToolError};
use crate::llm::ChatModel;
use crate::prompts;
use crate::tools::ToolCatalog;

/// Typed result of one reasoning iteration.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentStep {
    /// Invoke `tool` with `input` and continue thinking.
    Act { tool: String, input: String },
    /// Terminate with `answer`.
    Finish { answer: String },
}

/// Parse a raw reasoning step. `None` means the output matched neither
/// form; the loop records that as an observation rather than erroring.
pub fn parse_step(output: &str) -> Option<AgentStep> {
    if let Some(pos) = output.find("Final Answer:") {
        let answer = output[pos + "Final Answer:".len()..].trim();
        return Some(AgentStep::Finish {
            answer: answer.to_string(),
        });
    }

    let action_pos = output.find("Action:")?;
    let after_action = &output[action_pos + "Action:".len()..];
    let tool = after_action.lines().next()?.trim().trim_matches('"');
    if tool.is_empty() {
        return None;
    }

    let input_pos = after_action.find("Action Input:")?;
    let raw_input = &after_action[input_pos + "Action Input:".len()..];
    // Models sometimes hallucinate the observation; everything past that
    // marker is not input.
    let input = match raw_input.find("\nObservation") {
        Some(end) => &raw_input[..end],
        None => raw_input,
    };

    Some(AgentStep::Act {
        tool: tool.to_string(),
        input: input.trim().trim_matches('"').to_string(),
    })
}

/// Replace a leaked reasoning transcript with the fixed fallback message.
/// Clean answers pass through unchanged.
pub fn guard_output(answer: &str) -> String {
    if answer.contains("Action:") && !answer.contains("Final Answer") {
        prompts::SEARCH_INCOMPLETE_MESSAGE.to_string()
    } else {
        answer.to_string()
    }
}

/// The reasoning agent: a `ChatModel`, the fixed catalog, and an
/// iteration ceiling.
pub struct Agent {
    llm: Arc<dyn ChatModel>,
    catalog: Arc<ToolCatalog>,
    max_iterations: usize,
}

impl Agent {
    pub fn new(llm: Arc<dyn ChatModel>, catalog: Arc<ToolCatalog>, max_iterations: usize) -> Self {
        Self {
            llm,
            catalog,
            max_iterations,
        }
    }

    /// Resolve one query. Tool-level failures are absorbed into the
    /// transcript; only a failing `Thinking` completion — the reasoning
    /// model itself being unreachable — propagates.
    pub async fn run(&self, input: &str) -> Result<String, LlmError> {
        let system = prompts::REACT_SYSTEM_TEMPLATE
            .replace("{tools}", &self.catalog.descriptions())
            .replace("{tool_names}", &self.catalog.names());

        let mut transcript = format!("Question: {}\n", input);

        for iteration in 1..=self.max_iterations {
            let output = self.llm.complete(Some(&system), &transcript).await?;

            match parse_step(&output) {
                Some(AgentStep::Finish { answer }) => {
                    tracing::debug!(iteration, "agent finished");
                    return Ok(answer);
                }
                Some(AgentStep::Act { tool, input: tool_input }) => {
                    tracing::debug!(iteration, tool = %tool, "agent action");
                    let observation = match self.catalog.invoke(&tool, &tool_input).await {
                        Ok(text) => text,
                        Err(ToolError::Unknown(name)) => {
                            tracing::debug!(tool = %name, "unknown tool requested");
                            format!(
                                "「{}」というツールはありません。[{}] のいずれかを使うか、Final Answerで回答してください。",
                                name,
                                self.catalog.names()
                            )
                        }
                        Err(ToolError::Invocation(detail)) => {
                            tracing::warn!(tool = %tool, detail = %detail, "tool invocation failed");
                            format!("ツールの実行に失敗しました: {}", detail)
                        }
                    };
                    push_step(&mut transcript, &output, &observation);
                }
                None => {
                    tracing::debug!(iteration, "unparseable agent step");
                    push_step(
                        &mut transcript,
                        &output,
                        "出力の形式を解釈できませんでした。Action と Action Input、または Final Answer の形式で出力してください。",
                    );
                }
            }
        }

        // Ceiling reached: synthesize a best-effort answer from whatever
        // the transcript holds. If even that completion fails, fall back
        // to the fixed message — the conversation must not crash.
        tracing::info!(max_iterations = self.max_iterations, "iteration ceiling reached");
        match self
            .llm
            .complete(Some(prompts::SYNTHESIZE_SYSTEM_PROMPT), &transcript)
            .await
        {
            Ok(answer) => Ok(answer),
            Err(e) => {
                tracing::warn!(error = %e, "degraded synthesis failed");
                Ok(prompts::SEARCH_INCOMPLETE_MESSAGE.to_string())
            }
        }
    }
}

fn push_step(transcript: &mut String, output: &str, observation: &str) {
    transcript.push_str(output.trim());
    transcript.push('\n');
    transcript.push_str("Observation: ");
    transcript.push_str(observation);
    transcript.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RetrievalConfig, SearchConfig};
    use crate::embedding::Embedder;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_parse_final_answer() {
        let step = parse_step("Thought: わかった\nFinal Answer: 株式会社の設立には定款が必要です。");
        assert_eq!(
            step,
            Some(AgentStep::Finish {
                answer: "株式会社の設立には定款が必要です。".to_string()
            })
        );
    }

    #[test]
    fn test_parse_action() {
        let step = parse_step(
            "Thought: 条文を調べる\nAction: 会社法の専門家AI\nAction Input: 取締役の員数",
        );
        assert_eq!(
            step,
            Some(AgentStep::Act {
                tool: "会社法の専門家AI".to_string(),
                input: "取締役の員数".to_string()
            })
        );
    }

    #[test]
    fn test_parse_action_stops_at_hallucinated_observation() {
        let step = parse_step(
            "Action: Wikipedia検索\nAction Input: 会社法\nObservation: （勝手な想像）",
        );
        assert_eq!(
            step,
            Some(AgentStep::Act {
                tool: "Wikipedia検索".to_string(),
                input: "会社法".to_string()
            })
        );
    }

    #[test]
    fn test_parse_malformed_is_none() {
        assert_eq!(parse_step("考え中です……"), None);
        assert_eq!(parse_step("Action: ツール名だけで入力がない"), None);
    }

    #[test]
    fn test_guard_replaces_leaked_transcript() {
        assert_eq!(
            guard_output("Action: foo"),
            prompts::SEARCH_INCOMPLETE_MESSAGE
        );
    }

    #[test]
    fn test_guard_passes_clean_answers() {
        assert_eq!(guard_output("Final Answer: foo"), "Final Answer: foo");
        assert_eq!(guard_output("普通の回答です。"), "普通の回答です。");
    }

    /// Scripted reasoner: always requests a tool missing from the
    /// catalog, except for the synthesis prompt.
    struct AlwaysUnknownTool {
        thinking_calls: AtomicUsize,
        synthesis_calls: AtomicUsize,
    }

    #[async_trait]
    impl ChatModel for AlwaysUnknownTool {
        async fn complete(&self, system: Option<&str>, _user: &str) -> Result<String, LlmError> {
            if system == Some(prompts::SYNTHESIZE_SYSTEM_PROMPT) {
                self.synthesis_calls.fetch_add(1, Ordering::SeqCst);
                Ok("現時点で分かる範囲の回答です。".to_string())
            } else {
                self.thinking_calls.fetch_add(1, Ordering::SeqCst);
                Ok("Action: 存在しないツール\nAction Input: 何か".to_string())
            }
        }
    }

    struct NoopEmbedder;

    #[async_trait]
    impl Embedder for NoopEmbedder {
        fn model_name(&self) -> &str {
            "noop"
        }
        fn dims(&self) -> usize {
            4
        }
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
            Ok(texts.iter().map(|_| vec![0.0; 4]).collect())
        }
    }

    fn agent_with(llm: Arc<dyn ChatModel>, max_iterations: usize) -> Agent {
        let catalog = Arc::new(ToolCatalog::new(
            llm.clone(),
            Arc::new(NoopEmbedder),
            None,
            &RetrievalConfig::default(),
            &SearchConfig::default(),
        ));
        Agent::new(llm, catalog, max_iterations)
    }

    #[tokio::test]
    async fn test_unknown_tool_terminates_after_ceiling() {
        let llm = Arc::new(AlwaysUnknownTool {
            thinking_calls: AtomicUsize::new(0),
            synthesis_calls: AtomicUsize::new(0),
        });
        let agent = agent_with(llm.clone(), 3);

        let answer = agent.run("取締役とは?").await.unwrap();

        assert_eq!(llm.thinking_calls.load(Ordering::SeqCst), 3);
        assert_eq!(llm.synthesis_calls.load(Ordering::SeqCst), 1);
        assert_eq!(answer, "現時点で分かる範囲の回答です。");
    }

    /// Finishes immediately without any tool.
    struct DirectAnswer;

    #[async_trait]
    impl ChatModel for DirectAnswer {
        async fn complete(&self, _system: Option<&str>, _user: &str) -> Result<String, LlmError> {
            Ok("Thought: ツールは不要\nFinal Answer: 直接の回答です。".to_string())
        }
    }

    #[tokio::test]
    async fn test_direct_answer_single_iteration() {
        let agent = agent_with(Arc::new(DirectAnswer), 3);
        let answer = agent.run("こんにちは").await.unwrap();
        assert_eq!(answer, "直接の回答です。");
    }

    /// First step is garbage, second step recovers with a final answer.
    struct RecoversAfterGarbage {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ChatModel for RecoversAfterGarbage {
        async fn complete(&self, _system: Option<&str>, user: &str) -> Result<String, LlmError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n == 0 {
                Ok("意味のない出力".to_string())
            } else {
                // The parse-failure observation must be in the transcript.
                assert!(user.contains("出力の形式を解釈できませんでした"));
                Ok("Final Answer: 立て直しました。".to_string())
            }
        }
    }

    #[tokio::test]
    async fn test_parse_failure_recovers_within_ceiling() {
        let llm = Arc::new(RecoversAfterGarbage {
            calls: AtomicUsize::new(0),
        });
        let agent = agent_with(llm, 3);
        let answer = agent.run("質問").await.unwrap();
        assert_eq!(answer, "立て直しました。");
    }

    /// The reasoning model itself is unreachable.
    struct Unreachable;

    #[async_trait]
    impl ChatModel for Unreachable {
        async fn complete(&self, _system: Option<&str>, _user: &str) -> Result<String, LlmError> {
            Err(LlmError::Transport("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn test_thinking_failure_propagates() {
        let agent = agent_with(Arc::new(Unreachable), 3);
        assert!(agent.run("質問").await.is_err());
    }
}
