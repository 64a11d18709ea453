//! Tool Trait & Registry
//!
//! Defines the tool abstraction consumed by the plan executor, with split
//! definition/execution traits:
//!
//! - `ToolDefinition` - Identity, description, declared capabilities
//! - `ToolExecutable` - Execution capability
//! - `AnalysisTool` - Combined trait (auto-implemented via blanket impl)
//! - `ToolRegistry` - O(1) lookup by id, ordered iteration, capability resolution
//!
//! Data requirements are resolved to tools by capability tag first. Tools that
//! declare no capabilities are still reachable through the name-substring
//! fallback, which keeps older tool sets working unchanged.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::ToolContext;
use crate::error::CoreResult;

// ============================================================================
// Capabilities
// ============================================================================

/// Kind of external data a requirement asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSourceKind {
    /// Structured query against a relational store
    DatabaseQuery,
    /// Similarity search over a knowledge/vector index
    SemanticSearch,
    /// Call to an external HTTP API
    ApiCall,
    /// Direct execution of a named tool
    ToolExecution,
}

impl DataSourceKind {
    /// Name fragments used by the substring fallback for this kind.
    ///
    /// `ToolExecution` additionally matches the requirement's source name,
    /// which is handled in [`ToolRegistry::resolve`].
    pub fn fallback_keywords(&self) -> &'static [&'static str] {
        match self {
            DataSourceKind::DatabaseQuery => &["supabase", "postgres", "sql"],
            DataSourceKind::SemanticSearch => &["search", "knowledge", "vector"],
            DataSourceKind::ApiCall => &["api", "fetch", "http"],
            DataSourceKind::ToolExecution => &["execute"],
        }
    }
}

impl std::fmt::Display for DataSourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataSourceKind::DatabaseQuery => write!(f, "database_query"),
            DataSourceKind::SemanticSearch => write!(f, "semantic_search"),
            DataSourceKind::ApiCall => write!(f, "api_call"),
            DataSourceKind::ToolExecution => write!(f, "tool_execution"),
        }
    }
}

/// A capability tag declared by a tool.
///
/// `source` optionally binds the capability to one named data source; an
/// unbound capability serves any source of that kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ToolCapability {
    pub kind: DataSourceKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl ToolCapability {
    /// Capability serving any source of `kind`.
    pub fn any(kind: DataSourceKind) -> Self {
        Self { kind, source: None }
    }

    /// Capability serving exactly one named source.
    pub fn for_source(kind: DataSourceKind, source: impl Into<String>) -> Self {
        Self {
            kind,
            source: Some(source.into()),
        }
    }
}

/// How a tool was chosen for a data requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStrategy {
    /// Matched a declared capability tag
    Capability,
    /// Matched by tool-name substring
    SubstringFallback,
}

/// Result of resolving a data requirement to a tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResolution {
    pub tool_id: String,
    pub strategy: ResolutionStrategy,
}

// ============================================================================
// Trait Definitions
// ============================================================================

/// Tool definition metadata trait.
pub trait ToolDefinition: Send + Sync {
    /// Unique id of this tool (e.g., "supabase_query", "knowledge_search").
    fn name(&self) -> &str;

    /// Human-readable description of what this tool does.
    fn description(&self) -> &str;

    /// Capability tags this tool serves during data collection.
    fn capabilities(&self) -> Vec<ToolCapability> {
        vec![]
    }

    /// Whether this tool is potentially long-running.
    fn is_long_running(&self) -> bool {
        false
    }
}

/// Tool execution trait.
///
/// Tools receive a JSON object as input and return a JSON value. Outputs
/// that are objects may carry the conventional fields `success` (bool),
/// `result` (string), `insights` (string array), `recommendations`
/// (string array), and `visualization` (any); the executor reads these when
/// scoring and synthesizing.
#[async_trait]
pub trait ToolExecutable: Send + Sync {
    /// Execute the tool.
    ///
    /// # Returns
    /// - `Ok(Value)` - The tool's output
    /// - `Err(CoreError)` - If the call failed; the executor records it and moves on
    async fn execute(&self, ctx: &ToolContext, input: Value) -> CoreResult<Value>;
}

/// Combined trait for tools that provide both definition and execution.
pub trait AnalysisTool: ToolDefinition + ToolExecutable {}

// Blanket implementation: anything that implements both traits is an AnalysisTool
impl<T: ToolDefinition + ToolExecutable> AnalysisTool for T {}

// ============================================================================
// ToolRegistry
// ============================================================================

/// Registry of tools available to one executor.
///
/// Provides O(1) lookup by id and deterministic (insertion-ordered)
/// iteration, which makes requirement resolution reproducible.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn AnalysisTool>>,
    /// Insertion order for deterministic iteration.
    order: Vec<String>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Register a tool. Replaces any existing tool with the same id.
    pub fn register(&mut self, tool: Arc<dyn AnalysisTool>) {
        let name = tool.name().to_string();
        if !self.tools.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.tools.insert(name, tool);
    }

    /// Register a tool via builder pattern.
    pub fn with_tool(mut self, tool: Arc<dyn AnalysisTool>) -> Self {
        self.register(tool);
        self
    }

    /// Look up a tool by id.
    pub fn get(&self, name: &str) -> Option<Arc<dyn AnalysisTool>> {
        self.tools.get(name).cloned()
    }

    /// Get all tool ids in registration order.
    pub fn names(&self) -> Vec<String> {
        self.order.clone()
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Resolve a data requirement to a tool id.
    ///
    /// Resolution order:
    /// 1. a capability of `kind` bound to exactly `source`
    /// 2. an unbound capability of `kind`
    /// 3. the first tool (registration order) whose id contains one of the
    ///    kind's fallback keywords, case-insensitively; `ToolExecution` also
    ///    matches on `source` itself
    pub fn resolve(&self, kind: DataSourceKind, source: &str) -> Option<ToolResolution> {
        let capability_match = |bound: bool| {
            self.order.iter().find(|name| {
                self.tools.get(*name).is_some_and(|tool| {
                    tool.capabilities().iter().any(|cap| {
                        cap.kind == kind
                            && match &cap.source {
                                Some(s) => bound && s == source,
                                None => !bound,
                            }
                    })
                })
            })
        };

        if let Some(name) = capability_match(true).or_else(|| capability_match(false)) {
            return Some(ToolResolution {
                tool_id: name.clone(),
                strategy: ResolutionStrategy::Capability,
            });
        }

        let source_lower = source.to_lowercase();
        let mut keywords: Vec<&str> = Vec::new();
        if kind == DataSourceKind::ToolExecution && !source_lower.is_empty() {
            keywords.push(&source_lower);
        }
        keywords.extend(kind.fallback_keywords());

        self.order
            .iter()
            .find(|name| {
                let lower = name.to_lowercase();
                keywords.iter().any(|kw| lower.contains(kw))
            })
            .map(|name| ToolResolution {
                tool_id: name.clone(),
                strategy: ResolutionStrategy::SubstringFallback,
            })
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
