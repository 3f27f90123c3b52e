//! DOT (Graphviz) export for call graphs.
//!
//! Every contract becomes a cluster holding its nodes and the edges between
//! them. Edges between contracts are drawn outside the clusters; those that
//! stay within one execution context get the intra-cluster colour, the rest
//! keep the graph-wide default edge colour.

use crate::cg::{CallGraph, Edge};
use crate::ignore::IgnoreSet;
use crate::model::{Call, FunctionKind};
use std::fmt::Write;

/// Configuration options for DOT export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DotExportConfig {
    pub graph_name: String,
    pub cluster_color: String,
    /// Colour of edges inside a cluster and of cross-contract edges that keep
    /// the caller's context.
    pub edge_color: String,
    pub cross_context_edge_color: String,
}

impl Default for DotExportConfig {
    fn default() -> Self {
        Self {
            graph_name: "function_graph".to_string(),
            cluster_color: "blue".to_string(),
            edge_color: "black".to_string(),
            cross_context_edge_color: "red".to_string(),
        }
    }
}

pub trait ToDotLabel {
    fn to_dot_label(&self) -> String;
}

impl ToDotLabel for Call {
    fn to_dot_label(&self) -> String {
        escape_dot_string(self.function.display_name())
    }
}

/// Graphviz node shape for each function kind.
pub fn node_shape(kind: FunctionKind) -> &'static str {
    match kind {
        FunctionKind::Function => "box",
        FunctionKind::Modifier => "house",
        FunctionKind::Event => "oval",
    }
}

pub trait CgToDot {
    /// Renders the graph; calls in `ignore` are drawn dashed.
    fn to_dot(&self, ignore: &IgnoreSet, config: &DotExportConfig) -> String;
}

impl CgToDot for CallGraph {
    fn to_dot(&self, ignore: &IgnoreSet, config: &DotExportConfig) -> String {
        let mut dot_output = String::new();
        let _ = writeln!(dot_output, "digraph \"{}\" {{", escape_dot_string(&config.graph_name));
        let _ = writeln!(dot_output, "    concentrate = true;");
        let _ = writeln!(dot_output, "    newrank = true;");
        let _ = writeln!(dot_output, "    overlap = false;");
        let _ = writeln!(
            dot_output,
            "    edge [color=\"{}\"];",
            escape_dot_string(&config.cross_context_edge_color)
        );

        for contract in self.contracts() {
            let _ = writeln!(dot_output);
            let _ = writeln!(
                dot_output,
                "    subgraph \"cluster_{}\" {{",
                escape_dot_string(contract)
            );
            let _ = writeln!(dot_output, "        label = \"{}\";", escape_dot_string(contract));
            let _ = writeln!(
                dot_output,
                "        color = \"{}\";",
                escape_dot_string(&config.cluster_color)
            );
            let _ = writeln!(
                dot_output,
                "        edge [color=\"{}\"];",
                escape_dot_string(&config.edge_color)
            );

            for node in self.nodes.get(contract).into_iter().flatten() {
                let style = if ignore.contains(node) { "dashed" } else { "solid" };
                let _ = writeln!(
                    dot_output,
                    "        {} [label=\"{}\", style={}, shape={}];",
                    node_id(node),
                    node.to_dot_label(),
                    style,
                    node_shape(node.function.kind)
                );
            }
            for edge in self
                .edges
                .get(contract)
                .into_iter()
                .flatten()
                .filter(|e| !e.crosses_contracts())
            {
                let _ = writeln!(
                    dot_output,
                    "        {} -> {};",
                    node_id(&edge.caller),
                    node_id(&edge.callee)
                );
            }
            let _ = writeln!(dot_output, "    }}");
        }

        let cross: Vec<&Edge> = self.iter_edges().filter(|e| e.crosses_contracts()).collect();
        if !cross.is_empty() {
            let _ = writeln!(dot_output);
        }
        for edge in cross {
            let attrs = if edge.crosses_context() {
                String::new()
            } else {
                format!(" [color=\"{}\"]", escape_dot_string(&config.edge_color))
            };
            let _ = writeln!(
                dot_output,
                "    {} -> {}{};",
                node_id(&edge.caller),
                node_id(&edge.callee),
                attrs
            );
        }

        let _ = writeln!(dot_output, "}}");
        dot_output
    }
}

pub fn to_dot(graph: &CallGraph, ignore: &IgnoreSet, config: &DotExportConfig) -> String {
    graph.to_dot(ignore, config)
}

/// Quoted node identifier, `"Contract:name:params"`.
fn node_id(call: &Call) -> String {
    format!("\"{}\"", escape_dot_string(&call.to_string()))
}

/// Escapes characters in a string to be valid within a quoted DOT id or label.
pub fn escape_dot_string(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "")
        .replace('\t', "\\t")
        .replace('{', "\\{")
        .replace('}', "\\}")
        .replace('<', "\\<")
        .replace('>', "\\>")
}
