//! Lowers a tree-sitter Solidity tree into the typed [`crate::ast`] model.
//!
//! The lowering is deliberately shallow: declarations are read field by
//! field, while function bodies are mapped node by node onto the small
//! closed set of [`Node`] variants.

use crate::ast::{
    ContractDecl, ContractKind, DeclKind, FunctionDecl, ImportDirective, Invocation, Member,
    ModifierInvocation, Node, SourceUnit, StateVariableDecl, UsingForDecl,
};
use crate::parser::{get_node_text, SolidityAST};
use tracing::{debug, warn};
use tree_sitter::Node as TsNode;

/// Lowers a whole parsed file.
pub fn lower_source_unit(ast: &SolidityAST) -> SourceUnit {
    let root = ast.tree.root_node();
    if ast.has_errors() {
        warn!("Syntax errors found while parsing; the recovered tree is used as-is");
    }
    let source = ast.source.as_str();
    let mut unit = SourceUnit::default();

    for child in named_children(root) {
        match child.kind() {
            "import_directive" => {
                if let Some(import) = lower_import(child, source) {
                    unit.imports.push(import);
                }
            }
            "contract_declaration" => {
                unit.contracts
                    .extend(lower_contract(child, source, ContractKind::Contract));
            }
            "interface_declaration" => {
                unit.contracts
                    .extend(lower_contract(child, source, ContractKind::Interface));
            }
            "library_declaration" => {
                unit.contracts
                    .extend(lower_contract(child, source, ContractKind::Library));
            }
            _ => {}
        }
    }
    unit
}

fn lower_import(node: TsNode<'_>, source: &str) -> Option<ImportDirective> {
    let path_node = node
        .child_by_field_name("source")
        .or_else(|| named_children(node).into_iter().find(|n| n.kind() == "string"))?;
    let path = get_node_text(&path_node, source)
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .to_string();
    if path.is_empty() {
        return None;
    }
    Some(ImportDirective { path })
}

fn lower_contract(node: TsNode<'_>, source: &str, kind: ContractKind) -> Option<ContractDecl> {
    let name_node = node.child_by_field_name("name")?;
    let name = get_node_text(&name_node, source).to_string();

    let bases = named_children(node)
        .into_iter()
        .filter(|n| n.kind() == "inheritance_specifier")
        .filter_map(|spec| {
            spec.child_by_field_name("ancestor")
                .or_else(|| spec.named_child(0))
                .map(|ancestor| compact(get_node_text(&ancestor, source)))
        })
        .collect();

    let members = node
        .child_by_field_name("body")
        .or_else(|| {
            named_children(node)
                .into_iter()
                .find(|n| n.kind() == "contract_body")
        })
        .map(|body| {
            named_children(body)
                .into_iter()
                .filter_map(|member| lower_member(member, source))
                .collect()
        })
        .unwrap_or_default();

    Some(ContractDecl {
        name,
        kind,
        bases,
        members,
    })
}

fn lower_member(node: TsNode<'_>, source: &str) -> Option<Member> {
    match node.kind() {
        "function_definition" => {
            let name = field_text(node, "name", source).unwrap_or_default();
            Some(Member::Function(lower_callable(
                node,
                source,
                name,
                DeclKind::Function,
                false,
            )))
        }
        "constructor_definition" => Some(Member::Function(lower_callable(
            node,
            source,
            String::new(),
            DeclKind::Function,
            true,
        ))),
        "fallback_receive_definition" => {
            let text = get_node_text(&node, source).trim_start();
            let text = text.strip_prefix("function").unwrap_or(text).trim_start();
            let name = if text.starts_with("receive") {
                "receive".to_string()
            } else {
                String::new()
            };
            Some(Member::Function(lower_callable(
                node,
                source,
                name,
                DeclKind::Function,
                false,
            )))
        }
        "modifier_definition" => {
            let name = field_text(node, "name", source)?;
            Some(Member::Function(lower_callable(
                node,
                source,
                name,
                DeclKind::Modifier,
                false,
            )))
        }
        "event_definition" => {
            let name = field_text(node, "name", source)?;
            // The grammar spells this node `event_paramater` in some releases.
            let param_count = named_children(node)
                .iter()
                .filter(|n| n.kind().starts_with("event_param"))
                .count();
            Some(Member::Function(FunctionDecl {
                name,
                kind: DeclKind::Event,
                param_count,
                is_constructor: false,
                modifiers: Vec::new(),
                body: None,
            }))
        }
        "state_variable_declaration" => {
            let children = named_children(node);
            let name = field_text(node, "name", source).or_else(|| {
                children
                    .iter()
                    .rev()
                    .find(|n| n.kind() == "identifier")
                    .map(|n| get_node_text(n, source).to_string())
            })?;
            let user_type = node
                .child_by_field_name("type")
                .or_else(|| children.iter().copied().find(|n| n.kind() == "type_name"))
                .and_then(|ty| user_type_of(ty, source));
            Some(Member::StateVariable(StateVariableDecl { name, user_type }))
        }
        "using_directive" => {
            let library = named_children(node)
                .into_iter()
                .find(|n| n.kind() == "type_alias")
                .map(|alias| compact(get_node_text(&alias, source)))?;
            let user_type = node
                .child_by_field_name("source")
                .and_then(|ty| user_type_of(ty, source));
            Some(Member::UsingFor(UsingForDecl { library, user_type }))
        }
        _ => None,
    }
}

fn lower_callable(
    node: TsNode<'_>,
    source: &str,
    name: String,
    kind: DeclKind,
    is_constructor: bool,
) -> FunctionDecl {
    let children = named_children(node);
    let param_count = children.iter().filter(|n| n.kind() == "parameter").count();
    let modifiers = children
        .iter()
        .filter(|n| n.kind() == "modifier_invocation")
        .map(|m| lower_modifier_invocation(*m, source))
        .collect();
    let body = node
        .child_by_field_name("body")
        .or_else(|| children.iter().copied().find(|n| n.kind() == "function_body"))
        .map(|body| lower_children(body, source));

    FunctionDecl {
        name,
        kind,
        param_count,
        is_constructor,
        modifiers,
        body,
    }
}

fn lower_modifier_invocation(node: TsNode<'_>, source: &str) -> ModifierInvocation {
    let name = named_children(node)
        .iter()
        .filter(|n| n.kind() == "identifier")
        .map(|n| get_node_text(n, source))
        .collect::<Vec<_>>()
        .join(".");
    ModifierInvocation {
        name,
        arg_count: call_arguments(node).len(),
    }
}

/// Maps one body node onto the closed [`Node`] set.
fn lower_node(node: TsNode<'_>, source: &str) -> Node {
    match node.kind() {
        "call_expression" => {
            let callee = node
                .child_by_field_name("function")
                .map(|f| lower_node(f, source))
                .unwrap_or(Node::Other(Vec::new()));
            Node::Invocation(lower_invocation(node, callee, source))
        }
        "emit_statement" => {
            let callee = node
                .child_by_field_name("name")
                .map(|n| lower_node(n, source))
                .unwrap_or(Node::Other(Vec::new()));
            Node::Emit(lower_invocation(node, callee, source))
        }
        "member_expression" => {
            match (
                node.child_by_field_name("object"),
                node.child_by_field_name("property"),
            ) {
                (Some(object), Some(property)) => Node::MemberAccess {
                    object: Box::new(lower_node(object, source)),
                    member: get_node_text(&property, source).to_string(),
                },
                _ => Node::Other(lower_children(node, source)),
            }
        }
        "identifier" => Node::Identifier(get_node_text(&node, source).to_string()),
        "expression" | "parenthesized_expression" if node.named_child_count() == 1 => node
            .named_child(0)
            .map(|inner| lower_node(inner, source))
            .unwrap_or(Node::Other(Vec::new())),
        _ => {
            // `super` and `this` surface as leaf tokens rather than identifiers.
            let text = get_node_text(&node, source);
            if node.named_child_count() == 0 && is_plain_name(text) {
                Node::Identifier(text.to_string())
            } else {
                Node::Other(lower_children(node, source))
            }
        }
    }
}

fn lower_invocation(node: TsNode<'_>, callee: Node, source: &str) -> Invocation {
    Invocation {
        callee: Box::new(callee),
        args: call_arguments(node)
            .into_iter()
            .map(|arg| lower_node(arg, source))
            .collect(),
    }
}

fn lower_children(node: TsNode<'_>, source: &str) -> Vec<Node> {
    named_children(node)
        .into_iter()
        .filter(|n| !n.is_extra() && n.kind() != "comment")
        .map(|n| lower_node(n, source))
        .collect()
}

/// `call_argument` children, either direct or under an `*arguments` wrapper.
fn call_arguments<'t>(node: TsNode<'t>) -> Vec<TsNode<'t>> {
    let mut args = Vec::new();
    for child in named_children(node) {
        if child.kind() == "call_argument" {
            args.push(child);
        } else if child.kind().ends_with("arguments") {
            args.extend(
                named_children(child)
                    .into_iter()
                    .filter(|n| n.kind() == "call_argument"),
            );
        }
    }
    args
}

/// Returns the type path when `node` names a user-defined type and nothing else.
fn user_type_of(node: TsNode<'_>, source: &str) -> Option<String> {
    match node.kind() {
        "user_defined_type" => Some(compact(get_node_text(&node, source))),
        "type_name" => {
            let children = named_children(node);
            match children.as_slice() {
                [only] if only.kind() == "user_defined_type" => {
                    Some(compact(get_node_text(only, source)))
                }
                [] => None,
                parts if parts.iter().all(|n| n.kind() == "identifier") => Some(
                    parts
                        .iter()
                        .map(|n| get_node_text(n, source))
                        .collect::<Vec<_>>()
                        .join("."),
                ),
                _ => None,
            }
        }
        other => {
            debug!("Ignoring non user-defined type node '{}'", other);
            None
        }
    }
}

fn field_text(node: TsNode<'_>, field: &str, source: &str) -> Option<String> {
    node.child_by_field_name(field)
        .map(|n| get_node_text(&n, source).to_string())
}

fn named_children<'t>(node: TsNode<'t>) -> Vec<TsNode<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

fn compact(text: &str) -> String {
    text.split_whitespace().collect()
}

fn is_plain_name(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_solidity;

    fn lower(source: &str) -> SourceUnit {
        let ast = parse_solidity(source).expect("parse");
        lower_source_unit(&ast)
    }

    fn function<'a>(contract: &'a ContractDecl, name: &str) -> &'a FunctionDecl {
        contract
            .members
            .iter()
            .find_map(|m| match m {
                Member::Function(f) if f.name == name => Some(f),
                _ => None,
            })
            .unwrap_or_else(|| panic!("function {} not lowered", name))
    }

    #[test]
    fn test_contract_shapes() {
        let unit = lower(
            r#"
            pragma solidity ^0.8.0;
            import "./Base.sol";
            interface IToken { function transfer(address to, uint256 amount) external returns (bool); }
            library SafeOps { function add(uint256 a, uint256 b) internal pure returns (uint256) { return a + b; } }
            contract Vault is Base, Ownable {
                IToken token;
                uint256 total;
                using SafeOps for Counter;
                event Deposited(address indexed who, uint256 amount);
                modifier onlyOwner() { _; }
                constructor(IToken t) { token = t; }
                function deposit(uint256 amount) public onlyOwner { }
            }
            "#,
        );

        assert_eq!(unit.imports, vec![ImportDirective { path: "./Base.sol".to_string() }]);
        assert_eq!(unit.contracts.len(), 3);
        assert_eq!(unit.contracts[0].kind, ContractKind::Interface);
        assert_eq!(unit.contracts[1].kind, ContractKind::Library);

        let vault = &unit.contracts[2];
        assert_eq!(vault.name, "Vault");
        assert_eq!(vault.bases, vec!["Base".to_string(), "Ownable".to_string()]);

        let vars: Vec<_> = vault
            .members
            .iter()
            .filter_map(|m| match m {
                Member::StateVariable(v) => Some(v.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(vars.len(), 2);
        assert_eq!(vars[0].user_type.as_deref(), Some("IToken"));
        assert_eq!(vars[1].user_type, None);

        let using = vault
            .members
            .iter()
            .find_map(|m| match m {
                Member::UsingFor(u) => Some(u.clone()),
                _ => None,
            })
            .expect("using-for lowered");
        assert_eq!(using.library, "SafeOps");
        assert_eq!(using.user_type.as_deref(), Some("Counter"));

        let event = function(vault, "Deposited");
        assert_eq!(event.kind, DeclKind::Event);
        assert_eq!(event.param_count, 2);

        let ctor = vault
            .members
            .iter()
            .find_map(|m| match m {
                Member::Function(f) if f.is_constructor => Some(f),
                _ => None,
            })
            .expect("constructor lowered");
        assert_eq!(ctor.param_count, 1);

        let deposit = function(vault, "deposit");
        assert_eq!(deposit.param_count, 1);
        assert_eq!(
            deposit.modifiers,
            vec![ModifierInvocation { name: "onlyOwner".to_string(), arg_count: 0 }]
        );
        assert_eq!(function(vault, "onlyOwner").kind, DeclKind::Modifier);
    }

    #[test]
    fn test_body_invocations() {
        let unit = lower(
            r#"
            contract C {
                event E(uint256 v);
                function f(uint256 a) public {
                    g(a, 1);
                    token.transfer(a);
                    emit E(a);
                }
            }
            "#,
        );
        let body = function(&unit.contracts[0], "f").body.clone().expect("body");

        let mut invocations = Vec::new();
        fn collect(node: &Node, out: &mut Vec<Node>) {
            match node {
                Node::Invocation(_) | Node::Emit(_) => out.push(node.clone()),
                Node::Other(children) => children.iter().for_each(|c| collect(c, out)),
                _ => {}
            }
        }
        body.iter().for_each(|n| collect(n, &mut invocations));

        assert_eq!(invocations.len(), 3);
        match &invocations[0] {
            Node::Invocation(inv) => {
                assert_eq!(*inv.callee, Node::Identifier("g".to_string()));
                assert_eq!(inv.arg_count(), 2);
            }
            other => panic!("unexpected {:?}", other),
        }
        match &invocations[1] {
            Node::Invocation(inv) => match inv.callee.as_ref() {
                Node::MemberAccess { object, member } => {
                    assert_eq!(**object, Node::Identifier("token".to_string()));
                    assert_eq!(member, "transfer");
                }
                other => panic!("unexpected callee {:?}", other),
            },
            other => panic!("unexpected {:?}", other),
        }
        match &invocations[2] {
            Node::Emit(inv) => {
                assert_eq!(*inv.callee, Node::Identifier("E".to_string()));
                assert_eq!(inv.arg_count(), 1);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_fallback_and_receive_names() {
        let unit = lower(
            r#"
            contract C {
                fallback() external payable { }
                receive() external payable { }
            }
            "#,
        );
        let names: Vec<_> = unit.contracts[0]
            .members
            .iter()
            .filter_map(|m| match m {
                Member::Function(f) => Some(f.name.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(names, vec!["".to_string(), "receive".to_string()]);
    }

    #[test]
    fn test_plain_name() {
        assert!(is_plain_name("super"));
        assert!(is_plain_name("_x1"));
        assert!(!is_plain_name("1x"));
        assert!(!is_plain_name("a.b"));
        assert!(!is_plain_name(""));
    }
}
