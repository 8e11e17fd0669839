use async_trait::async_trait;
use serde_json::{json, Value};
use spark::agent::{AgentState, MarketAnalystAgent};
use spark::config::StorageConfig;
use spark::llm::{PipelineSettings, TransportResponse};
use spark::{
    Agent, AgentDescriptor, AgentManifest, AppConfig, Capability, LlmPipeline, LlmTransport,
    Result, Runtime, SparkError, LLM_ERROR_SENTINEL,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Transport that answers the chat endpoint with a canned reply and records
/// every URL it was asked to call
struct ScriptedTransport {
    chat_status: u16,
    generate_status: u16,
    calls: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    fn new(chat_status: u16, generate_status: u16) -> Self {
        Self {
            chat_status,
            generate_status,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls_to(&self, suffix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.ends_with(suffix))
            .count()
    }
}

#[async_trait]
impl LlmTransport for ScriptedTransport {
    async fn post_json(&self, url: &str, payload: &Value) -> Result<TransportResponse> {
        self.calls.lock().unwrap().push(url.to_string());

        if url.ends_with("/api/chat") {
            let body = json!({ "message": { "role": "assistant", "content": "chat answer" } });
            return Ok(TransportResponse::new(self.chat_status, body.to_string()));
        }

        let prompt = payload["prompt"].as_str().unwrap_or_default();
        let body = json!({ "response": format!("generated ({} chars)", prompt.len()) });
        Ok(TransportResponse::new(self.generate_status, body.to_string()))
    }
}

fn settings(retries: u32) -> PipelineSettings {
    let mut settings = PipelineSettings::from(&AppConfig::default().llm);
    settings.retries = retries;
    settings.retry_delay = Duration::ZERO;
    settings
}

fn config_in(dir: &std::path::Path) -> AppConfig {
    AppConfig {
        storage: StorageConfig::rooted_at(dir),
        ..AppConfig::default()
    }
}

#[tokio::test]
async fn every_listed_agent_is_reachable_in_any_casing() {
    let dir = tempfile::tempdir().unwrap();
    let transport = Arc::new(ScriptedTransport::new(200, 200));
    let model = Arc::new(LlmPipeline::new(transport, settings(0)));

    let runtime = Runtime::build(config_in(dir.path()), model, AgentManifest::builtin()).await;
    let dispatcher = runtime.dispatcher();

    let names = dispatcher.list_agents();
    assert_eq!(names.len(), 4);

    for name in &names {
        for variant in [name.clone(), name.to_lowercase(), name.to_uppercase()] {
            assert!(runtime.registry().get(&variant).is_some(), "lookup {}", variant);
            let output = dispatcher.run_agent(&variant, "status").await;
            assert!(!output.starts_with("[ERROR]"), "{} -> {}", variant, output);
        }
    }
}

#[tokio::test]
async fn unknown_agent_yields_text_not_error() {
    let dir = tempfile::tempdir().unwrap();
    let model = Arc::new(LlmPipeline::new(
        Arc::new(ScriptedTransport::new(200, 200)),
        settings(0),
    ));
    let runtime = Runtime::build(config_in(dir.path()), model, AgentManifest::builtin()).await;

    let output = runtime.dispatcher().run_agent("Oracle", "predict").await;
    assert!(output.starts_with("[ERROR]"));
    assert!(output.contains("Oracle"));
}

#[tokio::test]
async fn one_broken_agent_does_not_block_the_rest() {
    let dir = tempfile::tempdir().unwrap();
    let model = Arc::new(LlmPipeline::new(
        Arc::new(ScriptedTransport::new(200, 200)),
        settings(0),
    ));

    let manifest = AgentManifest::builtin().with(AgentDescriptor::new(
        "Broken",
        &[Capability::Run],
        |_| -> Result<Arc<dyn Agent>> { Err(SparkError::Internal("no weights".into())) },
    ));
    let runtime = Runtime::build(config_in(dir.path()), model, manifest).await;

    assert_eq!(runtime.dispatcher().list_agents().len(), 4);
    assert_eq!(runtime.load_report().skipped.len(), 1);
    assert_eq!(runtime.load_report().skipped[0].0, "Broken");
}

#[tokio::test]
async fn failing_chat_endpoint_falls_back_after_all_retries() {
    let dir = tempfile::tempdir().unwrap();
    let transport = Arc::new(ScriptedTransport::new(503, 200));
    let model = Arc::new(LlmPipeline::new(transport.clone(), settings(2)));

    let runtime = Runtime::build(config_in(dir.path()), model, AgentManifest::builtin()).await;
    let output = runtime.dispatcher().run_agent("marketanalyst", "BTC outlook").await;

    assert!(output.starts_with("generated"));
    assert_eq!(transport.calls_to("/api/chat"), 3);
    assert_eq!(transport.calls_to("/api/generate"), 1);

    let calls = transport.calls.lock().unwrap();
    assert!(calls[..3].iter().all(|u| u.ends_with("/api/chat")));
}

#[tokio::test]
async fn exhausted_endpoints_return_sentinel_through_dispatch() {
    let dir = tempfile::tempdir().unwrap();
    let transport = Arc::new(ScriptedTransport::new(500, 500));
    let model = Arc::new(LlmPipeline::new(transport.clone(), settings(1)));

    let runtime = Runtime::build(config_in(dir.path()), model, AgentManifest::builtin()).await;
    let output = runtime.dispatcher().run_agent("Strategist", "BULLISH").await;

    assert_eq!(output, LLM_ERROR_SENTINEL);
    assert_eq!(transport.calls_to("/api/chat"), 2);
    assert_eq!(transport.calls_to("/api/generate"), 2);
}

#[tokio::test]
async fn agent_memory_survives_reload() {
    let dir = tempfile::tempdir().unwrap();
    let storage = StorageConfig::rooted_at(dir.path());
    let model = Arc::new(LlmPipeline::new(
        Arc::new(ScriptedTransport::new(200, 200)),
        settings(0),
    ));

    let runtime = Runtime::build(config_in(dir.path()), model, AgentManifest::builtin()).await;
    let dispatcher = runtime.dispatcher();
    for task in ["first", "second", "third"] {
        dispatcher.run_agent(MarketAnalystAgent::NAME, task).await;
    }

    let reloaded = AgentState::open(MarketAnalystAgent::NAME, &storage);
    let memory = reloaded.memory().await;
    assert_eq!(memory.history.len(), 3);
    assert_eq!(memory.tasks_completed, 3);
    assert_eq!(memory.last_task, "third");
    assert_eq!(memory.context.last_output, "chat answer");
}
