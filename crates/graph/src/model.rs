//! Contract model: functions, calls and the contract registry.
//!
//! The registry is built once from the lowered source units and is read-only
//! afterwards, so it can be shared between any number of graph traversals.

use crate::ast::{ContractDecl, DeclKind, Member, SourceUnit};
use crate::error::GraphResult;
use crate::extract::extract_calls;
use crate::linearize::Linearizer;
use crate::loader::LoadedSource;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use tracing::{debug, warn};

/// Display name used for the unnamed fallback function.
pub const FALLBACK_DISPLAY_NAME: &str = "Fallback Function";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FunctionKind {
    Function,
    Modifier,
    Event,
}

impl From<DeclKind> for FunctionKind {
    fn from(kind: DeclKind) -> Self {
        match kind {
            DeclKind::Function => FunctionKind::Function,
            DeclKind::Modifier => FunctionKind::Modifier,
            DeclKind::Event => FunctionKind::Event,
        }
    }
}

/// A function, modifier or event, identified by name, parameter count and kind.
///
/// Parameter types are not part of the identity, so overloads with the same
/// arity are indistinguishable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    pub params: usize,
    pub kind: FunctionKind,
}

impl Function {
    pub fn new(name: impl Into<String>, params: usize, kind: FunctionKind) -> Self {
        Self {
            name: name.into(),
            params,
            kind,
        }
    }

    pub fn function(name: impl Into<String>, params: usize) -> Self {
        Self::new(name, params, FunctionKind::Function)
    }

    /// Label shown for this function in rendered graphs.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            FALLBACK_DISPLAY_NAME
        } else {
            &self.name
        }
    }

    /// Identity of the library function reached through a using-for attachment.
    ///
    /// `value.f(a, b)` with `using L for T` calls `L.f(value, a, b)`: the
    /// attached value becomes the implicit first argument, so the library
    /// function takes one parameter more than the call site passes.
    pub fn with_attached_receiver(&self) -> Function {
        Function::new(self.name.clone(), self.params + 1, FunctionKind::Function)
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.params)
    }
}

/// Receiver of a call as written at the call site.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallTarget {
    /// Unqualified call (or `this.f()`), dispatched through the context's bases.
    This,
    /// `super.f()`, dispatched to a strict base of the calling contract.
    Super,
    /// `name.f()`: a base contract, a state variable, or a contract name.
    Named(String),
}

impl CallTarget {
    pub fn from_name(name: &str) -> Self {
        match name {
            "this" => CallTarget::This,
            "super" => CallTarget::Super,
            other => CallTarget::Named(other.to_string()),
        }
    }
}

impl fmt::Display for CallTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallTarget::This => write!(f, "this"),
            CallTarget::Super => write!(f, "super"),
            CallTarget::Named(name) => write!(f, "{}", name),
        }
    }
}

/// An unresolved call recorded against a function body.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawCall {
    pub target: CallTarget,
    pub function: Function,
}

impl RawCall {
    pub fn new(target: CallTarget, function: Function) -> Self {
        Self { target, function }
    }

    pub fn internal(function: Function) -> Self {
        Self::new(CallTarget::This, function)
    }
}

/// A resolved call: the contract defining `function`, plus the contract whose
/// declarations govern calls made from inside it.
///
/// Equality and hashing cover `contract` and `function` only; the context is
/// carried along but never distinguishes two calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Call {
    pub contract: String,
    pub function: Function,
    pub context: String,
}

impl Call {
    /// A call executing in the context of its own contract.
    pub fn new(contract: impl Into<String>, function: Function) -> Self {
        let contract = contract.into();
        Self {
            context: contract.clone(),
            contract,
            function,
        }
    }

    pub fn with_context(
        contract: impl Into<String>,
        function: Function,
        context: impl Into<String>,
    ) -> Self {
        Self {
            contract: contract.into(),
            function,
            context: context.into(),
        }
    }
}

impl PartialEq for Call {
    fn eq(&self, other: &Self) -> bool {
        self.contract == other.contract && self.function == other.function
    }
}

impl Eq for Call {}

impl Hash for Call {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.contract.hash(state);
        self.function.hash(state);
    }
}

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.contract, self.function)
    }
}

#[derive(Debug, Clone)]
pub struct Contract {
    pub name: String,
    /// Direct bases in evaluation order: declaration order reversed.
    pub base_contracts: Vec<String>,
    /// State variable name to declared user-defined type name.
    pub state_user_vars: IndexMap<String, String>,
    /// Attached type name to library name.
    pub using_fors: IndexMap<String, String>,
    pub functions: IndexMap<Function, Vec<RawCall>>,
    linearization: Vec<String>,
}

impl Contract {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            linearization: vec![name.clone()],
            name,
            base_contracts: Vec::new(),
            state_user_vars: IndexMap::new(),
            using_fors: IndexMap::new(),
            functions: IndexMap::new(),
        }
    }

    /// Builds the model of one declaration. Constructors are renamed to the
    /// contract's own name.
    pub fn from_decl(decl: &ContractDecl) -> Self {
        let mut contract = Contract::new(decl.name.clone());
        contract.base_contracts = decl.bases.iter().rev().cloned().collect();

        for member in &decl.members {
            match member {
                Member::StateVariable(var) => {
                    if let Some(ty) = &var.user_type {
                        contract
                            .state_user_vars
                            .insert(var.name.clone(), ty.clone());
                    }
                }
                Member::UsingFor(using) => {
                    if let Some(ty) = &using.user_type {
                        contract
                            .using_fors
                            .insert(ty.clone(), using.library.clone());
                    }
                }
                Member::Function(func) => {
                    let name = if func.is_constructor {
                        decl.name.clone()
                    } else {
                        func.name.clone()
                    };
                    let function = Function::new(name, func.param_count, func.kind.into());
                    let calls = extract_calls(func);
                    if contract.functions.contains_key(&function) {
                        warn!(
                            "Overloaded function {} detected in {}: functions are told apart by parameter count only, the last definition wins",
                            function.display_name(),
                            decl.name
                        );
                    }
                    contract.functions.insert(function, calls);
                }
            }
        }
        contract
    }

    pub fn defines(&self, function: &Function) -> bool {
        self.functions.contains_key(function)
    }

    /// The contract followed by all transitive bases, most derived first.
    pub fn linearization(&self) -> &[String] {
        &self.linearization
    }
}

/// All modeled contracts, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct ContractRegistry {
    contracts: IndexMap<String, Contract>,
}

impl ContractRegistry {
    pub fn from_sources(sources: &[LoadedSource]) -> GraphResult<Self> {
        Self::from_units(sources.iter().map(|s| &s.unit))
    }

    /// Models every contract, interface and library of `units`, then
    /// linearizes each of them.
    pub fn from_units<'a>(units: impl IntoIterator<Item = &'a SourceUnit>) -> GraphResult<Self> {
        let mut contracts = IndexMap::new();
        for unit in units {
            for decl in &unit.contracts {
                if contracts.contains_key(&decl.name) {
                    warn!("Contract {} declared more than once; using the last declaration", decl.name);
                }
                debug!("Modeling {:?} {}", decl.kind, decl.name);
                contracts.insert(decl.name.clone(), Contract::from_decl(decl));
            }
        }
        Self::from_contracts(contracts.into_values())
    }

    pub fn from_contracts(contracts: impl IntoIterator<Item = Contract>) -> GraphResult<Self> {
        let mut contracts: IndexMap<String, Contract> = contracts
            .into_iter()
            .map(|c| (c.name.clone(), c))
            .collect();

        let bases: HashMap<String, Vec<String>> = contracts
            .values()
            .map(|c| (c.name.clone(), c.base_contracts.clone()))
            .collect();
        let mut linearizer = Linearizer::new(&bases);
        for contract in contracts.values_mut() {
            contract.linearization = linearizer.linearize(&contract.name)?;
            debug!(
                "Linearized {}: [{}]",
                contract.name,
                contract.linearization.join(", ")
            );
        }
        Ok(Self { contracts })
    }

    pub fn get(&self, name: &str) -> Option<&Contract> {
        self.contracts.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.contracts.contains_key(name)
    }

    pub fn contracts(&self) -> impl Iterator<Item = &Contract> {
        self.contracts.values()
    }

    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }

    pub fn linearization(&self, name: &str) -> Option<&[String]> {
        self.get(name).map(Contract::linearization)
    }

    /// Scans `start`'s linearization and returns the first modeled contract
    /// satisfying `predicate`.
    pub fn find_base<P>(&self, start: &str, predicate: P) -> Option<&Contract>
    where
        P: Fn(&Contract) -> bool,
    {
        self.linearization(start)?
            .iter()
            .filter_map(|name| self.get(name))
            .find(|contract| predicate(contract))
    }

    /// Calls recorded against `function` in `contract`.
    pub fn calls_of(&self, contract: &str, function: &Function) -> Option<&[RawCall]> {
        self.get(contract)?
            .functions
            .get(function)
            .map(Vec::as_slice)
    }
}
