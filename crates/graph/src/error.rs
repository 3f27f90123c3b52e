//! Fatal conditions of model construction and entry selection.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("Couldn't find file {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("Couldn't find contract {0}")]
    UnknownContract(String),

    #[error("Couldn't find function {0}")]
    FunctionNotFound(String),

    #[error("Couldn't find function {function} with {param_count} parameters")]
    FunctionArityNotFound { function: String, param_count: usize },

    #[error("Couldn't linearize contract {contract}: inheritance order of its bases is contradictory")]
    Linearization { contract: String },

    #[error("Cyclic inheritance detected while linearizing contract {contract}")]
    CyclicInheritance { contract: String },

    #[error("Bad ignore specifier '{spec}': expected Contract:Function:ParamCount")]
    InvalidIgnoreSpec { spec: String },
}

pub type GraphResult<T> = std::result::Result<T, GraphError>;
