//! Calls that become graph nodes but are never expanded.

use crate::error::{GraphError, GraphResult};
use crate::model::{Call, Function};
use std::collections::HashSet;

/// Membership compares contract and function only; the context of the queried
/// call does not matter.
#[derive(Debug, Clone, Default)]
pub struct IgnoreSet {
    calls: HashSet<Call>,
}

impl IgnoreSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the set from `Contract:FunctionName:ParamCount` specifiers.
    pub fn from_specs<I, S>(specs: I) -> GraphResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        specs
            .into_iter()
            .map(|spec| Self::parse_spec(spec.as_ref()))
            .collect()
    }

    /// Parses one `Contract:FunctionName:ParamCount` specifier. The function
    /// name may be empty to address the fallback function.
    pub fn parse_spec(spec: &str) -> GraphResult<Call> {
        let invalid = || GraphError::InvalidIgnoreSpec {
            spec: spec.to_string(),
        };
        let parts: Vec<&str> = spec.split(':').collect();
        let [contract, function, count] = parts.as_slice() else {
            return Err(invalid());
        };
        if contract.is_empty() {
            return Err(invalid());
        }
        let params = count.trim().parse::<usize>().map_err(|_| invalid())?;
        Ok(Call::new(*contract, Function::function(*function, params)))
    }

    pub fn insert(&mut self, call: Call) -> bool {
        self.calls.insert(call)
    }

    pub fn contains(&self, call: &Call) -> bool {
        self.calls.contains(call)
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }
}

impl FromIterator<Call> for IgnoreSet {
    fn from_iter<T: IntoIterator<Item = Call>>(iter: T) -> Self {
        Self {
            calls: iter.into_iter().collect(),
        }
    }
}
