use crate::ignore::IgnoreSet;
use crate::model::{Call, CallTarget, ContractRegistry, Function, RawCall};
use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Edge {
    pub caller: Call,
    pub callee: Call,
}

impl Edge {
    pub fn new(caller: Call, callee: Call) -> Self {
        Self { caller, callee }
    }

    pub fn crosses_contracts(&self) -> bool {
        self.caller.contract != self.callee.contract
    }

    /// True when the callee runs in a different execution context than the caller.
    pub fn crosses_context(&self) -> bool {
        self.caller.context != self.callee.context
    }
}

// --- Call Graph ---

/// Function-level call graph reachable from one entry call.
///
/// Nodes are grouped by the contract defining them, edges by the contract of
/// the caller. Both keep discovery order.
#[derive(Debug, Clone)]
pub struct CallGraph {
    pub entry: Call,
    pub nodes: IndexMap<String, IndexSet<Call>>,
    pub edges: IndexMap<String, IndexSet<Edge>>,
}

impl CallGraph {
    pub fn new(entry: Call) -> Self {
        Self {
            entry,
            nodes: IndexMap::new(),
            edges: IndexMap::new(),
        }
    }

    pub(crate) fn add_node(&mut self, call: Call) -> bool {
        self.nodes
            .entry(call.contract.clone())
            .or_default()
            .insert(call)
    }

    pub(crate) fn add_edge(&mut self, edge: Edge) -> bool {
        self.edges
            .entry(edge.caller.contract.clone())
            .or_default()
            .insert(edge)
    }

    pub fn iter_nodes(&self) -> impl Iterator<Item = &Call> {
        self.nodes.values().flatten()
    }

    pub fn iter_edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values().flatten()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.values().map(IndexSet::len).sum()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(IndexSet::len).sum()
    }

    pub fn contains_node(&self, call: &Call) -> bool {
        self.nodes
            .get(&call.contract)
            .is_some_and(|set| set.contains(call))
    }

    /// Outgoing edges of `call`, in discovery order.
    pub fn edges_from<'a>(&'a self, call: &'a Call) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges
            .get(&call.contract)
            .into_iter()
            .flatten()
            .filter(move |edge| &edge.caller == call)
    }

    /// Contracts owning nodes or edges, in discovery order.
    pub fn contracts(&self) -> impl Iterator<Item = &str> {
        let mut names: IndexSet<&str> = self.nodes.keys().map(String::as_str).collect();
        names.extend(self.edges.keys().map(String::as_str));
        names.into_iter()
    }
}

/// Expands an entry call into its transitive call graph.
///
/// The registry is only read, so one resolver per traversal can share it.
pub struct CallGraphResolver<'a> {
    registry: &'a ContractRegistry,
    ignore: &'a IgnoreSet,
}

impl<'a> CallGraphResolver<'a> {
    pub fn new(registry: &'a ContractRegistry, ignore: &'a IgnoreSet) -> Self {
        Self { registry, ignore }
    }

    pub fn resolve(&self, entry: Call) -> CallGraph {
        let mut graph = CallGraph::new(entry.clone());
        // Visited set and worklist in one: every call is queued at most once
        // and expanded in discovery order.
        let mut worklist: IndexSet<Call> = IndexSet::new();
        worklist.insert(entry);

        let mut cursor = 0;
        while let Some(callee) = worklist.get_index(cursor).cloned() {
            cursor += 1;
            graph.add_node(callee.clone());

            if self.ignore.contains(&callee) {
                debug!("Not expanding ignored call {}", callee);
                continue;
            }
            let Some(calls) = self.registry.calls_of(&callee.contract, &callee.function) else {
                continue;
            };

            for call in calls {
                let Some(target) = self.resolve_call(&callee, call) else {
                    debug!(
                        "Dropping unresolved call {}.{} from {}",
                        call.target, call.function, callee
                    );
                    continue;
                };
                debug!("{} -> {} (context {})", callee, target, target.context);
                graph.add_edge(Edge::new(callee.clone(), target.clone()));
                worklist.insert(target);
            }
        }
        graph
    }

    /// Resolves one raw call made from inside `callee`.
    pub fn resolve_call(&self, callee: &Call, call: &RawCall) -> Option<Call> {
        let function = &call.function;
        match &call.target {
            CallTarget::This => {
                let owner = self
                    .registry
                    .find_base(&callee.context, |c| c.defines(function))?;
                Some(Call::with_context(
                    owner.name.clone(),
                    function.clone(),
                    callee.context.clone(),
                ))
            }
            CallTarget::Super => {
                let owner = self.registry.find_base(&callee.contract, |c| {
                    c.name != callee.contract && c.defines(function)
                })?;
                Some(Call::with_context(
                    owner.name.clone(),
                    function.clone(),
                    callee.context.clone(),
                ))
            }
            CallTarget::Named(name) => {
                if let Some(target) = self.resolve_in_base(callee, name, function) {
                    return Some(target);
                }
                self.resolve_through_state_var(callee, name, function)
            }
        }
    }

    /// `Base.f()` where `Base` is in the caller's own linearization.
    fn resolve_in_base(&self, callee: &Call, base: &str, function: &Function) -> Option<Call> {
        let is_ancestor = self
            .registry
            .linearization(&callee.contract)?
            .iter()
            .any(|name| name == base);
        if !is_ancestor {
            return None;
        }
        let owner = self.registry.find_base(base, |c| c.defines(function))?;
        Some(Call::with_context(owner.name.clone(), function.clone(), base))
    }

    /// `var.f()` where `var` is a state variable of a user-defined type.
    fn resolve_through_state_var(
        &self,
        callee: &Call,
        var: &str,
        function: &Function,
    ) -> Option<Call> {
        let holder = self
            .registry
            .find_base(&callee.contract, |c| c.state_user_vars.contains_key(var))?;
        let var_type = holder.state_user_vars.get(var)?;

        if self.registry.contains(var_type) {
            let owner = self
                .registry
                .find_base(var_type, |c| c.defines(function))
                .map(|c| c.name.clone())
                .unwrap_or_else(|| var_type.clone());
            return Some(Call::with_context(owner, function.clone(), holder.name.clone()));
        }

        let attaching = self
            .registry
            .find_base(&holder.name, |c| c.using_fors.contains_key(var_type))?;
        let library = attaching.using_fors.get(var_type)?;
        Some(Call::with_context(
            library.clone(),
            function.with_attached_receiver(),
            holder.name.clone(),
        ))
    }
}
