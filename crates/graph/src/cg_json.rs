//! JSON export for call graphs.
//!
//! The document groups nodes and edges per contract, in discovery order:
//!
//! ```json
//! { "entry": {..}, "contracts": [ { "name": "Token", "nodes": [..], "edges": [..] } ] }
//! ```

use crate::cg::{CallGraph, Edge};
use crate::ignore::IgnoreSet;
use crate::model::{Call, FunctionKind};
use serde::{Deserialize, Serialize};

/// Configuration options for JSON export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonExportConfig {
    /// If true, the JSON output will be pretty-printed with indentation.
    pub pretty_print: bool,
    /// If true, node and edge totals are included under `metadata`.
    pub include_metadata: bool,
}

impl Default for JsonExportConfig {
    fn default() -> Self {
        Self {
            pretty_print: true,
            include_metadata: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonGraph {
    pub entry: JsonNode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<JsonMetadata>,
    pub contracts: Vec<JsonContract>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonMetadata {
    pub node_count: usize,
    pub edge_count: usize,
    pub contract_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonContract {
    pub name: String,
    pub nodes: Vec<JsonNode>,
    pub edges: Vec<JsonEdge>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonNode {
    /// `Contract:name:params`, the same id the DOT export uses.
    pub id: String,
    pub contract: String,
    pub name: String,
    pub label: String,
    pub params: usize,
    pub kind: FunctionKind,
    pub context: String,
    pub ignored: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonEdge {
    pub caller: String,
    pub callee: String,
    pub cross_context: bool,
}

impl JsonNode {
    fn from_call(call: &Call, ignore: &IgnoreSet) -> Self {
        Self {
            id: call.to_string(),
            contract: call.contract.clone(),
            name: call.function.name.clone(),
            label: call.function.display_name().to_string(),
            params: call.function.params,
            kind: call.function.kind,
            context: call.context.clone(),
            ignored: ignore.contains(call),
        }
    }
}

impl From<&Edge> for JsonEdge {
    fn from(edge: &Edge) -> Self {
        Self {
            caller: edge.caller.to_string(),
            callee: edge.callee.to_string(),
            cross_context: edge.crosses_context(),
        }
    }
}

pub trait CgToJson {
    /// Builds the serializable document.
    fn to_json_graph(&self, ignore: &IgnoreSet, config: &JsonExportConfig) -> JsonGraph;

    /// Exports the graph as a JSON string.
    fn to_json(&self, ignore: &IgnoreSet, config: &JsonExportConfig) -> String {
        let graph = self.to_json_graph(ignore, config);
        let rendered = if config.pretty_print {
            serde_json::to_string_pretty(&graph)
        } else {
            serde_json::to_string(&graph)
        };
        rendered.unwrap_or_else(|e| format!("{{\"error\": \"Failed to serialize to JSON: {}\"}}", e))
    }
}

impl CgToJson for CallGraph {
    fn to_json_graph(&self, ignore: &IgnoreSet, config: &JsonExportConfig) -> JsonGraph {
        let contracts: Vec<JsonContract> = self
            .contracts()
            .map(|name| JsonContract {
                name: name.to_string(),
                nodes: self
                    .nodes
                    .get(name)
                    .into_iter()
                    .flatten()
                    .map(|call| JsonNode::from_call(call, ignore))
                    .collect(),
                edges: self
                    .edges
                    .get(name)
                    .into_iter()
                    .flatten()
                    .map(JsonEdge::from)
                    .collect(),
            })
            .collect();

        let metadata = config.include_metadata.then(|| JsonMetadata {
            node_count: self.node_count(),
            edge_count: self.edge_count(),
            contract_count: contracts.len(),
        });

        JsonGraph {
            entry: JsonNode::from_call(&self.entry, ignore),
            metadata,
            contracts,
        }
    }
}

pub fn to_json(graph: &CallGraph, ignore: &IgnoreSet, config: &JsonExportConfig) -> String {
    graph.to_json(ignore, config)
}
