//! ISCRY1: the reflective agent.
//!
//! The task text selects a mode:
//! - mentions "evolve" or "neuron"  → evolution plan
//! - mentions "diagnos" or "scan"   → self-diagnostics
//! - anything else                  → plain reasoning

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tracing::info;

use super::state::AgentState;
use super::traits::{Agent, AgentEnv};
use crate::error::Result;
use crate::llm::{is_error_sentinel, prompts, ChatModel};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReflectionMode {
    Default,
    Diagnostics,
    Evolution,
}

impl ReflectionMode {
    pub fn from_task(task: &str) -> Self {
        let task = task.to_lowercase();
        if task.contains("evolve") || task.contains("neuron") {
            ReflectionMode::Evolution
        } else if task.contains("diagnos") || task.contains("scan") {
            ReflectionMode::Diagnostics
        } else {
            ReflectionMode::Default
        }
    }
}

impl fmt::Display for ReflectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReflectionMode::Default => write!(f, "default"),
            ReflectionMode::Diagnostics => write!(f, "diagnostics"),
            ReflectionMode::Evolution => write!(f, "evolution"),
        }
    }
}

pub struct ReflectiveAgent {
    state: AgentState,
    model: Arc<dyn ChatModel>,
}

impl ReflectiveAgent {
    pub const NAME: &'static str = "ISCRY1";

    pub fn new(env: &AgentEnv) -> Self {
        Self {
            state: AgentState::open(Self::NAME, &env.storage),
            model: env.model.clone(),
        }
    }

    pub fn state(&self) -> &AgentState {
        &self.state
    }

    async fn reason(&self, task: &str) -> String {
        let prompt = format!(
            "User request:\n{}\n\nAnswer logically and in a structured way, without file operations.",
            task
        );
        self.model.ask(prompts::REFLECTIVE_PROMPT, &prompt).await
    }

    async fn self_diagnose(&self) -> String {
        let prompt = "Run a self-diagnosis of the Spark system.\n\n\
            Response format:\n\
            - Overall state\n\
            - ISCRY1 memory state\n\
            - Model pipeline state\n\
            - Agents state\n\
            - Integrations state\n\
            - Recommendations\n\n\
            Do not use file blocks. Do not generate code.";
        self.model.ask(prompts::REFLECTIVE_PROMPT, prompt).await
    }

    async fn evolve(&self, task: &str) -> String {
        let prompt = format!(
            "You are the internal neural architect of ISCRY1.\n\
             Goal: design new \"neurons\" (fragments of logic, functions, modules).\n\n\
             User request:\n{}\n\n\
             Response format:\n\n\
             [NEURON_PLAN]\n\
             goal: ...\n\
             context: ...\n\
             steps:\n  - ...\n\
             risks:\n  - ...\n\
             next_action: code | reflect | log_only\n\
             [/NEURON_PLAN]\n\n\
             If next_action = code, also add a [NEURON_CODE] ... [/NEURON_CODE] block.",
            task
        );

        let raw = self.model.ask(prompts::REFLECTIVE_PROMPT, &prompt).await;
        if is_error_sentinel(&raw) {
            return raw;
        }
        render_evolution(&raw)
    }
}

/// Summarize the neuron blocks in a model answer. Code blocks are reported,
/// never written anywhere.
fn render_evolution(raw: &str) -> String {
    let plan = extract_block(raw, "NEURON_PLAN");
    let code = extract_block(raw, "NEURON_CODE");

    let mut output = String::new();
    if let Some(plan) = &plan {
        output.push_str("NEURON PLAN:\n");
        output.push_str(plan);
        output.push_str("\n\n");
    }
    if let Some(code) = &code {
        output.push_str(&format!(
            "NEURON CODE detected ({} lines), not applied: file writes are disabled.\n",
            code.lines().count()
        ));
    }
    if plan.is_none() && code.is_none() {
        output.push_str("The model returned no neuron blocks.");
    }
    output
}

/// Text between `[NAME]` and `[/NAME]`, trimmed
pub fn extract_block(text: &str, name: &str) -> Option<String> {
    let open = format!("[{}]", name);
    let close = format!("[/{}]", name);

    let start = text.find(&open)? + open.len();
    let end = text[start..].find(&close)? + start;
    Some(text[start..end].trim().to_string())
}

#[async_trait]
impl Agent for ReflectiveAgent {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Self-reflective agent: reasoning, self-diagnostics and evolution plans"
    }

    async fn run(&self, task: &str) -> Result<String> {
        let mode = ReflectionMode::from_task(task);
        info!(agent = Self::NAME, %mode, "Running reflective task");
        self.state.log(&format!("Mode {}: {}", mode, task));

        let answer = match mode {
            ReflectionMode::Evolution => self.evolve(task).await,
            ReflectionMode::Diagnostics => self.self_diagnose().await,
            ReflectionMode::Default => self.reason(task).await,
        };

        self.state.record_run(task, &answer).await;
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageConfig;

    struct FixedModel(&'static str);

    #[async_trait]
    impl ChatModel for FixedModel {
        async fn ask(&self, _system_prompt: &str, _prompt: &str) -> String {
            self.0.to_string()
        }
    }

    #[test]
    fn test_mode_selection() {
        assert_eq!(ReflectionMode::from_task("Evolve the planner"), ReflectionMode::Evolution);
        assert_eq!(ReflectionMode::from_task("new NEURON please"), ReflectionMode::Evolution);
        assert_eq!(ReflectionMode::from_task("run diagnostics"), ReflectionMode::Diagnostics);
        assert_eq!(ReflectionMode::from_task("scan yourself"), ReflectionMode::Diagnostics);
        assert_eq!(ReflectionMode::from_task("[MODE=short] hello"), ReflectionMode::Default);
    }

    #[test]
    fn test_extract_block() {
        let text = "intro\n[NEURON_PLAN]\ngoal: x\n[/NEURON_PLAN]\ntrailer";
        assert_eq!(extract_block(text, "NEURON_PLAN"), Some("goal: x".to_string()));
        assert_eq!(extract_block(text, "NEURON_CODE"), None);
        assert_eq!(extract_block("[NEURON_PLAN] unterminated", "NEURON_PLAN"), None);
    }

    #[test]
    fn test_render_evolution_reports_code_without_applying() {
        let raw = "[NEURON_PLAN]goal: g[/NEURON_PLAN]\n[NEURON_CODE]\nfn a() {}\nfn b() {}\n[/NEURON_CODE]";
        let output = render_evolution(raw);
        assert!(output.starts_with("NEURON PLAN:\ngoal: g"));
        assert!(output.contains("NEURON CODE detected (2 lines)"));
        assert_eq!(render_evolution("nothing here"), "The model returned no neuron blocks.");
    }

    #[tokio::test]
    async fn test_run_evolution_mode() {
        let dir = tempfile::tempdir().unwrap();
        let env = AgentEnv::new(
            Arc::new(FixedModel("[NEURON_PLAN]goal: learn[/NEURON_PLAN]")),
            StorageConfig::rooted_at(dir.path()),
        );
        let agent = ReflectiveAgent::new(&env);

        let output = agent.run("evolve memory handling").await.unwrap();
        assert!(output.contains("goal: learn"));
        assert_eq!(agent.state().memory().await.tasks_completed, 1);
    }

    #[tokio::test]
    async fn test_run_passes_sentinel_through() {
        let dir = tempfile::tempdir().unwrap();
        let env = AgentEnv::new(
            Arc::new(FixedModel(crate::llm::LLM_ERROR_SENTINEL)),
            StorageConfig::rooted_at(dir.path()),
        );
        let agent = ReflectiveAgent::new(&env);

        let output = agent.run("evolve").await.unwrap();
        assert!(is_error_sentinel(&output));
    }
}
