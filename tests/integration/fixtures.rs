//! Mock tools shared by the integration tests.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use analyst_executor::{
    CoreError, CoreResult, ExecutorConfig, PlanExecutor, ToolCapability, ToolContext,
    ToolDefinition, ToolExecutable, ToolRegistry,
};
use async_trait::async_trait;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

type Respond = Box<dyn Fn(u32, &Value) -> CoreResult<Value> + Send + Sync>;

/// Configurable tool. `respond` receives the 1-based call number and the input.
pub struct MockTool {
    name: String,
    capabilities: Vec<ToolCapability>,
    delay: Option<Duration>,
    cancel_on_call: Option<CancellationToken>,
    calls: AtomicU32,
    respond: Respond,
}

impl MockTool {
    pub fn new(
        name: &str,
        respond: impl Fn(u32, &Value) -> CoreResult<Value> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.to_string(),
            capabilities: Vec::new(),
            delay: None,
            cancel_on_call: None,
            calls: AtomicU32::new(0),
            respond: Box::new(respond),
        }
    }

    pub fn ok(name: &str, output: Value) -> Self {
        Self::new(name, move |_, _| Ok(output.clone()))
    }

    /// Returns the given insights on every call.
    pub fn with_insights(name: &str, insights: &[&str]) -> Self {
        Self::ok(name, json!({ "insights": insights }))
    }

    pub fn failing(name: &str, message: &str) -> Self {
        let message = message.to_string();
        Self::new(name, move |_, _| Err(CoreError::tool(message.clone())))
    }

    /// Fails the first `failures` calls, then returns `output`.
    pub fn flaky(name: &str, failures: u32, output: Value) -> Self {
        Self::new(name, move |call, _| {
            if call <= failures {
                Err(CoreError::tool(format!("transient failure #{}", call)))
            } else {
                Ok(output.clone())
            }
        })
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_capability(mut self, capability: ToolCapability) -> Self {
        self.capabilities.push(capability);
        self
    }

    /// Cancel `token` when the tool runs.
    pub fn cancelling(mut self, token: CancellationToken) -> Self {
        self.cancel_on_call = Some(token);
        self
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ToolDefinition for MockTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "mock tool"
    }

    fn capabilities(&self) -> Vec<ToolCapability> {
        self.capabilities.clone()
    }
}

#[async_trait]
impl ToolExecutable for MockTool {
    async fn execute(&self, _ctx: &ToolContext, input: Value) -> CoreResult<Value> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(token) = &self.cancel_on_call {
            token.cancel();
        }
        (self.respond)(call, &input)
    }
}

/// Config without retries, so failing tools fail fast.
pub fn no_retry_config() -> ExecutorConfig {
    ExecutorConfig {
        retry_attempts: 0,
        ..ExecutorConfig::default()
    }
}

pub fn executor(tools: Vec<Arc<MockTool>>, config: ExecutorConfig) -> PlanExecutor {
    let mut registry = ToolRegistry::new();
    for tool in tools {
        registry.register(tool);
    }
    PlanExecutor::new(Arc::new(registry), config)
}
