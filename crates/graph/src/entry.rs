//! Picks the function a traversal starts from.

use crate::error::{GraphError, GraphResult};
use crate::model::{Call, ContractRegistry, Function, FunctionKind};
use tracing::{debug, warn};

/// Resolves the entry call for `function_name` on `contract`.
///
/// Candidates are the plain functions with that name found along the
/// contract's linearization, most derived first. The first candidate wins.
/// The returned call is defined in the contract that declares the function
/// but executes in the context of `contract`.
pub fn select_entry(
    registry: &ContractRegistry,
    contract: &str,
    function_name: &str,
    param_count: Option<usize>,
) -> GraphResult<Call> {
    let linearization = registry
        .linearization(contract)
        .ok_or_else(|| GraphError::UnknownContract(contract.to_string()))?;

    let mut candidates: Vec<(&str, &Function)> = linearization
        .iter()
        .filter_map(|name| registry.get(name))
        .flat_map(|base| {
            base.functions
                .keys()
                .filter(move |f| f.kind == FunctionKind::Function && f.name == function_name)
                .map(move |f| (base.name.as_str(), f))
        })
        .collect();

    if candidates.is_empty() {
        return Err(GraphError::FunctionNotFound(function_name.to_string()));
    }
    if let Some(count) = param_count {
        candidates.retain(|(_, f)| f.params == count);
        if candidates.is_empty() {
            return Err(GraphError::FunctionArityNotFound {
                function: function_name.to_string(),
                param_count: count,
            });
        }
    }

    if let [(first, _), (second, _), ..] = candidates.as_slice() {
        if first == second {
            warn!(
                "More than one function named '{}' found in {}; pass a parameter count to disambiguate",
                function_name, first
            );
        }
    }

    let (owner, function) = candidates[0];
    debug!("Entry point {}:{} in context {}", owner, function, contract);
    Ok(Call::with_context(owner, function.clone(), contract))
}
