//! Tool Registry
//!
//! The [`ToolRegistry`] binds tool names to factories and implements
//! [`ToolExecutorPort`]. Factories close over a port, the approval broker and
//! the run context; they run once in [`ToolRegistry::build`], so a
//! misconfigured provider surfaces at startup rather than mid-run.
//!
//! # Usage
//!
//! ```ignore
//! let mut registry = ToolRegistry::new(propagator)
//!     .with_toggles(config.tools.clone())
//!     .register("delete_artifacts", move || Ok(Arc::new(DeleteArtifactsTool::new(ctx.clone())) as _));
//!
//! registry.build();
//!
//! let call = ToolCall::new("delete_artifacts").with_arg("category", "audio");
//! let result = registry.execute(&call, &cancel).await;
//! ```
//!
//! # Execution
//!
//! Each call runs inside the current run's context refined with the call id,
//! so progress events can be attributed to the tool call. Errors never escape:
//! cancellation becomes a cancelled result, everything else a failed one.

use crate::config::FileToolsConfig;
use async_trait::async_trait;
use mmagent_application::{
    InferenceError, RunContextPropagator, Tool, ToolExecutorPort, ToolInvocationError,
};
use mmagent_domain::{ToolCall, ToolDefinition, ToolError, ToolResult};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Builds a tool. Fails when its port cannot be created.
pub type ToolFactory = Arc<dyn Fn() -> Result<Arc<dyn Tool>, InferenceError> + Send + Sync>;

pub struct ToolRegistry {
    propagator: Arc<RunContextPropagator>,
    toggles: FileToolsConfig,
    /// Registration order is the order definitions are reported in
    factories: Vec<(String, ToolFactory)>,
    tools: HashMap<String, Arc<dyn Tool>>,
    failed: Vec<String>,
    built: bool,
}

impl ToolRegistry {
    pub fn new(propagator: Arc<RunContextPropagator>) -> Self {
        Self {
            propagator,
            toggles: FileToolsConfig::default(),
            factories: Vec::new(),
            tools: HashMap::new(),
            failed: Vec::new(),
            built: false,
        }
    }

    pub fn with_toggles(mut self, toggles: FileToolsConfig) -> Self {
        self.toggles = toggles;
        self.built = false;
        self
    }

    /// Register a factory under `name`. A later registration replaces an earlier one.
    pub fn register<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn Tool>, InferenceError> + Send + Sync + 'static,
    {
        let name = name.into();
        self.factories.retain(|(existing, _)| existing != &name);
        self.factories.push((name, Arc::new(factory)));
        self.built = false;
        self
    }

    /// Instantiate every enabled tool. Returns how many are available.
    ///
    /// A factory that fails is logged and skipped; the remaining tools stay usable.
    pub fn build(&mut self) -> usize {
        let mut tools = HashMap::new();
        let mut failed = Vec::new();

        for (name, factory) in &self.factories {
            if !self.toggles.is_enabled(name) {
                debug!(tool = %name, "Tool disabled by configuration");
                continue;
            }
            match factory() {
                Ok(tool) => {
                    debug!(tool = %name, "Registered tool");
                    tools.insert(name.clone(), tool);
                }
                Err(e) => {
                    warn!(tool = %name, error = %e, "Failed to create tool");
                    failed.push(name.clone());
                }
            }
        }

        info!(tools = tools.len(), failed = failed.len(), "Tool registry built");
        self.tools = tools;
        self.failed = failed;
        self.built = true;
        self.tools.len()
    }

    /// Run the factory for `name` on demand, ignoring toggles.
    pub fn create_tool(&self, name: &str) -> Result<Arc<dyn Tool>, InferenceError> {
        let (_, factory) = self
            .factories
            .iter()
            .find(|(registered, _)| registered == name)
            .ok_or_else(|| InferenceError::Configuration(format!("Unknown tool: {}", name)))?;
        factory()
    }

    pub fn tool(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            registered: self.factories.len(),
            available: self.tools.len(),
            disabled: self
                .factories
                .iter()
                .map(|(name, _)| name)
                .filter(|name| !self.toggles.is_enabled(name))
                .cloned()
                .collect(),
            failed: self.failed.clone(),
        }
    }

    async fn invoke_in_run(
        &self,
        tool: &dyn Tool,
        call: &ToolCall,
        cancel: &CancellationToken,
    ) -> Result<ToolResult, ToolInvocationError> {
        let Some(ctx) = self.propagator.current() else {
            return tool.invoke(call, cancel).await;
        };
        if call.id.is_none() && call.message_id.is_none() {
            return self.propagator.scope(ctx, tool.invoke(call, cancel)).await;
        }
        self.propagator.update_tool_call(
            &ctx.thread_id,
            call.message_id.clone(),
            call.id.clone(),
        );
        let mut ctx = ctx;
        if let Some(message_id) = &call.message_id {
            ctx = ctx.with_message_id(message_id.clone());
        }
        ctx.tool_call_id = call.id.clone();
        self.propagator.scope(ctx, tool.invoke(call, cancel)).await
    }
}

/// Statistics about the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryStats {
    pub registered: usize,
    pub available: usize,
    pub disabled: Vec<String>,
    pub failed: Vec<String>,
}

#[async_trait]
impl ToolExecutorPort for ToolRegistry {
    fn definitions(&self) -> Vec<ToolDefinition> {
        self.factories
            .iter()
            .filter_map(|(name, _)| self.tools.get(name))
            .map(|tool| tool.definition().clone())
            .collect()
    }

    fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    async fn execute(&self, call: &ToolCall, cancel: &CancellationToken) -> ToolResult {
        if !self.built {
            return ToolResult::failure(
                &call.tool_name,
                ToolError::execution_failed("Registry not initialized. Call build() first."),
            );
        }
        let Some(tool) = self.tools.get(&call.tool_name) else {
            return ToolResult::failure(
                &call.tool_name,
                ToolError::not_found(format!("Tool not found: {}", call.tool_name)),
            );
        };

        let started = Instant::now();
        let result = match self.invoke_in_run(tool.as_ref(), call, cancel).await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => {
                info!(tool = %call.tool_name, "Tool call cancelled");
                ToolResult::cancelled(&call.tool_name, &call.tool_name, None)
            }
            Err(e) => {
                warn!(tool = %call.tool_name, error = %e, "Tool call failed");
                ToolResult::failure(&call.tool_name, e.to_tool_error())
            }
        };
        result.with_duration(started.elapsed().as_millis() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mmagent_domain::RunContext;

    /// Echoes the run context's tool call id, or fails as configured.
    struct EchoTool {
        definition: ToolDefinition,
        propagator: Arc<RunContextPropagator>,
        error: Option<ToolInvocationError>,
    }

    fn echo_tool(
        name: &str,
        propagator: &Arc<RunContextPropagator>,
        error: Option<ToolInvocationError>,
    ) -> impl Fn() -> Result<Arc<dyn Tool>, InferenceError> + Send + Sync + 'static {
        let name = name.to_string();
        let propagator = propagator.clone();
        move || {
            Ok(Arc::new(EchoTool {
                definition: ToolDefinition::new(name.clone(), "echo"),
                propagator: propagator.clone(),
                error: error.clone(),
            }) as Arc<dyn Tool>)
        }
    }

    #[async_trait]
    impl Tool for EchoTool {
        fn definition(&self) -> &ToolDefinition {
            &self.definition
        }

        async fn invoke(
            &self,
            call: &ToolCall,
            _cancel: &CancellationToken,
        ) -> Result<ToolResult, ToolInvocationError> {
            if let Some(error) = &self.error {
                return Err(error.clone());
            }
            let seen = self
                .propagator
                .current()
                .and_then(|ctx| ctx.tool_call_id)
                .unwrap_or_default();
            Ok(ToolResult::success(&call.tool_name, seen))
        }
    }

    fn failing() -> Result<Arc<dyn Tool>, InferenceError> {
        Err(InferenceError::Configuration("no api key".to_string()))
    }

    #[tokio::test]
    async fn test_not_built() {
        let propagator = Arc::new(RunContextPropagator::new());
        let registry = ToolRegistry::new(propagator.clone()).register("a", echo_tool("a", &propagator, None));

        let result = registry.execute(&ToolCall::new("a"), &CancellationToken::new()).await;
        assert!(!result.is_success());
        assert!(result.error().unwrap().message.contains("not initialized"));
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let propagator = Arc::new(RunContextPropagator::new());
        let mut registry = ToolRegistry::new(propagator);
        registry.build();

        let result = registry
            .execute(&ToolCall::new("unknown_tool"), &CancellationToken::new())
            .await;
        assert_eq!(result.error().unwrap().code, "NOT_FOUND");
    }

    #[test]
    fn test_toggles_and_failed_factories() {
        let propagator = Arc::new(RunContextPropagator::new());
        let mut toggles = FileToolsConfig::default();
        toggles.enabled.insert("b".to_string(), false);

        let mut registry = ToolRegistry::new(propagator.clone())
            .with_toggles(toggles)
            .register("a", echo_tool("a", &propagator, None))
            .register("b", echo_tool("b", &propagator, None))
            .register("c", failing);

        assert_eq!(registry.build(), 1);
        assert!(registry.has_tool("a"));
        assert!(!registry.has_tool("b"));
        assert!(!registry.has_tool("c"));
        assert_eq!(
            registry.stats(),
            RegistryStats {
                registered: 3,
                available: 1,
                disabled: vec!["b".to_string()],
                failed: vec!["c".to_string()],
            }
        );
        assert!(registry.create_tool("b").is_ok());
        assert!(registry.create_tool("zzz").is_err());
    }

    #[test]
    fn test_definitions_in_registration_order() {
        let propagator = Arc::new(RunContextPropagator::new());
        let mut registry = ToolRegistry::new(propagator.clone())
            .register("z", echo_tool("z", &propagator, None))
            .register("a", echo_tool("a", &propagator, None));
        registry.build();

        let names: Vec<_> = registry.definitions().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["z", "a"]);
    }

    #[tokio::test]
    async fn test_call_id_reaches_tool() {
        let propagator = Arc::new(RunContextPropagator::new());
        let mut registry =
            ToolRegistry::new(propagator.clone()).register("a", echo_tool("a", &propagator, None));
        registry.build();

        let _run = propagator.begin_run(RunContext::new("t-1"));
        let call = ToolCall::new("a").with_id("call-7");
        let result = registry.execute(&call, &CancellationToken::new()).await;

        assert_eq!(result.output(), Some("call-7"));
        assert!(result.metadata.duration_ms.is_some());
        assert_eq!(
            propagator.for_thread("t-1").unwrap().tool_call_id.as_deref(),
            Some("call-7")
        );
    }

    #[tokio::test]
    async fn test_message_id_refined_at_call_boundary() {
        let propagator = Arc::new(RunContextPropagator::new());
        let mut registry =
            ToolRegistry::new(propagator.clone()).register("a", echo_tool("a", &propagator, None));
        registry.build();

        let _run = propagator.begin_run(RunContext::new("t-1").with_message_id("m-1"));
        let call = ToolCall::new("a").with_id("call-8").with_message_id("m-2");
        let result = registry.execute(&call, &CancellationToken::new()).await;

        assert_eq!(result.output(), Some("call-8"));
        let fallback = propagator.for_thread("t-1").unwrap();
        assert_eq!(fallback.message_id.as_deref(), Some("m-2"));
        assert_eq!(fallback.tool_call_id.as_deref(), Some("call-8"));
    }

    #[tokio::test]
    async fn test_errors_become_results() {
        let propagator = Arc::new(RunContextPropagator::new());
        let mut registry = ToolRegistry::new(propagator.clone())
            .register(
                "bad",
                echo_tool(
                    "bad",
                    &propagator,
                    Some(ToolInvocationError::InvalidArgument("prompt".to_string())),
                ),
            )
            .register(
                "stopped",
                echo_tool("stopped", &propagator, Some(ToolInvocationError::Cancelled)),
            );
        registry.build();
        let cancel = CancellationToken::new();

        let bad = registry.execute(&ToolCall::new("bad"), &cancel).await;
        assert_eq!(bad.error().unwrap().code, "INVALID_ARGUMENT");

        let stopped = registry.execute(&ToolCall::new("stopped"), &cancel).await;
        assert!(stopped.is_cancelled());
    }
}
