//! Name-indexed, schema-validated tool dispatch.

use std::collections::HashMap;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use jsonschema::Validator;
use outlet_catalog::CatalogService;
use rig::tool::Tool;
use serde_json::Value;

use super::schema::{compile, validate};
use super::{
    ListOutletsTool, NearbyOutletsTool, OutletDetailsTool, OutletTool, SemanticSearchTool,
    ToolCall, ToolDefinition, ToolResult, definition_of,
};
use crate::rag::RetrievalEngine;
use crate::{Error, Result, TRACING_TARGET};

/// Type-erased tool invocation taking already validated JSON arguments.
pub type ToolHandler =
    Arc<dyn Fn(Value) -> BoxFuture<'static, std::result::Result<Value, String>> + Send + Sync>;

struct RegisteredTool {
    definition: ToolDefinition,
    validator: Validator,
    handler: ToolHandler,
}

/// Registry of the tools exposed to the model.
///
/// Arguments are validated against the tool's parameter schema before the
/// tool runs. Every outcome, including unknown tools and invalid
/// arguments, is reported as a [`ToolResult`].
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, RegisteredTool>,
    order: Vec<String>,
}

impl ToolRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the four outlet tools.
    pub fn with_outlet_tools(engine: RetrievalEngine, catalog: CatalogService) -> Result<Self> {
        let mut registry = Self::new();
        registry.register(SemanticSearchTool::new(engine))?;
        registry.register(ListOutletsTool::new(catalog.clone()))?;
        registry.register(OutletDetailsTool::new(catalog.clone()))?;
        registry.register(NearbyOutletsTool::new(catalog))?;
        Ok(registry)
    }

    /// Registers a tool under its [`Tool::NAME`].
    pub fn register<T: OutletTool>(&mut self, tool: T) -> Result<()> {
        let definition = definition_of::<T>()?;
        if self.tools.contains_key(&definition.name) {
            return Err(Error::tool(&definition.name, "already registered"));
        }

        let validator = compile(&definition.name, &definition.parameters)?;
        let tool = Arc::new(tool);
        let handler: ToolHandler = Arc::new(move |arguments: Value| {
            let tool = Arc::clone(&tool);
            async move {
                let args: T::Args =
                    serde_json::from_value(arguments).map_err(|e| format!("invalid arguments: {e}"))?;
                let output = tool.call(args).await.map_err(|e| e.to_string())?;
                serde_json::to_value(output).map_err(|e| e.to_string())
            }
            .boxed()
        });

        tracing::debug!(target: TRACING_TARGET, tool = %definition.name, "Registered tool");

        self.order.push(definition.name.clone());
        self.tools.insert(
            definition.name.clone(),
            RegisteredTool {
                definition,
                validator,
                handler,
            },
        );
        Ok(())
    }

    /// Tool definitions in registration order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| tool.definition.clone())
            .collect()
    }

    /// Returns `true` if a tool with this name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Returns `true` if no tools are registered.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Executes one tool call.
    ///
    /// The tool is never invoked when its arguments fail validation.
    pub async fn execute(&self, call: &ToolCall) -> ToolResult {
        let Some(tool) = self.tools.get(&call.name) else {
            tracing::warn!(target: TRACING_TARGET, tool = %call.name, "Unknown tool requested");
            return ToolResult::failure(call, format!("Unknown tool: {}", call.name));
        };

        let arguments = match normalize_arguments(&call.arguments) {
            Ok(arguments) => arguments,
            Err(message) => return ToolResult::failure(call, message),
        };

        let errors = validate(&tool.validator, &arguments);
        if !errors.is_empty() {
            tracing::debug!(
                target: TRACING_TARGET,
                tool = %call.name,
                errors = ?errors,
                "Rejected tool arguments"
            );
            return ToolResult::failure(call, format!("invalid arguments: {}", errors.join("; ")));
        }

        match (tool.handler)(arguments).await {
            Ok(output) => ToolResult::success(call, output),
            Err(message) => {
                tracing::debug!(
                    target: TRACING_TARGET,
                    tool = %call.name,
                    error = %message,
                    "Tool call failed"
                );
                ToolResult::failure(call, message)
            }
        }
    }
}

/// Providers sometimes send arguments as a JSON-encoded string.
fn normalize_arguments(arguments: &Value) -> std::result::Result<Value, String> {
    match arguments {
        Value::Null => Ok(Value::Object(Default::default())),
        Value::String(raw) if raw.trim().is_empty() => Ok(Value::Object(Default::default())),
        Value::String(raw) => {
            serde_json::from_str(raw).map_err(|e| format!("arguments are not valid JSON: {e}"))
        }
        other => Ok(other.clone()),
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.order)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use outlet_catalog::InMemoryCatalog;
    use schemars::JsonSchema;
    use serde::Deserialize;
    use serde_json::json;

    use super::*;
    use crate::mock::{HashingEmbedder, sample_outlets};
    use crate::rag::RagConfig;
    use crate::tool::ToolError;

    #[derive(Debug, Deserialize, JsonSchema)]
    struct EchoArgs {
        text: String,
    }

    #[derive(Debug, Clone, Default)]
    struct EchoTool {
        calls: Arc<AtomicUsize>,
    }

    impl Tool for EchoTool {
        type Args = EchoArgs;
        type Error = ToolError;
        type Output = Value;

        const NAME: &'static str = "echo";

        async fn definition(&self, _prompt: String) -> ToolDefinition {
            definition_of::<Self>().unwrap()
        }

        async fn call(&self, args: Self::Args) -> std::result::Result<Self::Output, Self::Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(json!({ "echo": args.text }))
        }
    }

    impl OutletTool for EchoTool {
        const DESCRIPTION: &'static str = "Echo the text back";
    }

    fn echo_registry() -> (ToolRegistry, Arc<AtomicUsize>) {
        let tool = EchoTool::default();
        let calls = Arc::clone(&tool.calls);
        let mut registry = ToolRegistry::new();
        registry.register(tool).unwrap();
        (registry, calls)
    }

    async fn outlet_registry() -> ToolRegistry {
        let catalog = InMemoryCatalog::new(sample_outlets()).into_service();
        let engine = RetrievalEngine::new(
            Arc::new(HashingEmbedder::default()),
            RagConfig::default().with_min_similarity(0.2),
        );
        engine.build(&sample_outlets()).await.unwrap();
        ToolRegistry::with_outlet_tools(engine, catalog).unwrap()
    }

    #[tokio::test]
    async fn test_valid_call() {
        let (registry, calls) = echo_registry();
        let call = ToolCall::new("call_1", "echo", json!({"text": "hi"}));

        let result = registry.execute(&call).await;
        assert!(!result.is_error);
        assert_eq!(result.call_id, "call_1");
        assert_eq!(result.output, json!({"echo": "hi"}));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalid_arguments_never_invoke_tool() {
        let (registry, calls) = echo_registry();

        for arguments in [json!({}), json!({"text": 7}), json!("not json"), json!([1])] {
            let call = ToolCall::new("call_1", "echo", arguments);
            let result = registry.execute(&call).await;
            assert!(result.is_error);
            assert!(result.output["error"].is_string());
        }

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_string_encoded_arguments() {
        let (registry, calls) = echo_registry();
        let call = ToolCall::new("call_1", "echo", json!("{\"text\": \"hi\"}"));

        let result = registry.execute(&call).await;
        assert!(!result.is_error);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let (registry, _) = echo_registry();
        let call = ToolCall::new("call_1", "orderPizza", json!({}));

        let result = registry.execute(&call).await;
        assert!(result.is_error);
        assert_eq!(result.output, json!({"error": "Unknown tool: orderPizza"}));
    }

    #[tokio::test]
    async fn test_duplicate_registration() {
        let (mut registry, _) = echo_registry();
        assert!(registry.register(EchoTool::default()).is_err());
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_outlet_tools_in_order() {
        let registry = outlet_registry().await;
        let names: Vec<String> = registry.definitions().into_iter().map(|d| d.name).collect();
        assert_eq!(
            names,
            vec!["semanticSearch", "listOutlets", "outletDetails", "nearbyOutlets"]
        );
    }

    #[tokio::test]
    async fn test_outlet_tool_errors_are_structured() {
        let registry = outlet_registry().await;

        let result = registry
            .execute(&ToolCall::new("c", "outletDetails", json!({"id": 99})))
            .await;
        assert_eq!(result.output, json!({"error": "Outlet 99 not found"}));

        let result = registry
            .execute(&ToolCall::new("c", "outletDetails", json!({"id": "one"})))
            .await;
        assert!(result.is_error);

        let result = registry
            .execute(&ToolCall::new("c", "nearbyOutlets", json!({"lat": 3.1})))
            .await;
        assert!(result.is_error);
    }

    #[tokio::test]
    async fn test_outlet_details_accepts_float_id() {
        let registry = outlet_registry().await;
        let result = registry
            .execute(&ToolCall::new("c", "outletDetails", json!({"id": 1.0})))
            .await;

        assert!(!result.is_error, "{}", result.output);
        assert_eq!(result.output["outlet"]["name"], "Subway Menara UOA Bangsar");

        let result = registry
            .execute(&ToolCall::new("c", "outletDetails", json!({"id": 1.5})))
            .await;
        assert!(result.is_error);
    }

    #[tokio::test]
    async fn test_list_outlets_accepts_null_arguments() {
        let registry = outlet_registry().await;
        let result = registry
            .execute(&ToolCall::new("c", "listOutlets", Value::Null))
            .await;

        assert!(!result.is_error);
        assert_eq!(result.output["outlets"].as_array().map(Vec::len), Some(2));
    }
}
