//! Typed syntax model consumed by the contract model builder.
//!
//! Only the node shapes that matter for call resolution are represented.
//! Everything else in a function body is kept as [`Node::Other`] so that the
//! call extractor can still descend into it.

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SourceUnit {
    pub imports: Vec<ImportDirective>,
    pub contracts: Vec<ContractDecl>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDirective {
    /// Import path exactly as written, without quotes.
    pub path: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContractKind {
    Contract,
    Interface,
    Library,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractDecl {
    pub name: String,
    pub kind: ContractKind,
    /// Base names in declaration order (left to right as written after `is`).
    pub bases: Vec<String>,
    pub members: Vec<Member>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Member {
    Function(FunctionDecl),
    StateVariable(StateVariableDecl),
    UsingFor(UsingForDecl),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclKind {
    Function,
    Modifier,
    Event,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDecl {
    /// Empty for the fallback function.
    pub name: String,
    pub kind: DeclKind,
    pub param_count: usize,
    pub is_constructor: bool,
    pub modifiers: Vec<ModifierInvocation>,
    /// Statements of the body; `None` for declarations without one.
    pub body: Option<Vec<Node>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModifierInvocation {
    pub name: String,
    pub arg_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateVariableDecl {
    pub name: String,
    /// Set only when the declared type is a user-defined type path.
    pub user_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsingForDecl {
    pub library: String,
    /// Set only when the attached type is a user-defined type path.
    pub user_type: Option<String>,
}

/// Expression and statement tree of a body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Invocation(Invocation),
    /// `emit E(...)`: an invocation in event-emission position.
    Emit(Invocation),
    MemberAccess { object: Box<Node>, member: String },
    Identifier(String),
    Other(Vec<Node>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub callee: Box<Node>,
    pub args: Vec<Node>,
}

impl Invocation {
    pub fn arg_count(&self) -> usize {
        self.args.len()
    }
}
