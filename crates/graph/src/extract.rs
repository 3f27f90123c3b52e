//! Collects the raw calls made by a function, modifier or event body.

use crate::ast::{DeclKind, FunctionDecl, Invocation, Node};
use crate::model::{CallTarget, Function, FunctionKind, RawCall};

/// Raw calls of `decl` in source order.
///
/// For plain functions (constructors included) the modifier invocations come
/// first, as internal calls to modifiers. Body calls follow in pre-order, so
/// an outer invocation is recorded before the invocations in its arguments.
pub fn extract_calls(decl: &FunctionDecl) -> Vec<RawCall> {
    let mut calls = Vec::new();
    if decl.kind == DeclKind::Function {
        calls.extend(decl.modifiers.iter().map(|m| {
            RawCall::internal(Function::new(
                m.name.clone(),
                m.arg_count,
                FunctionKind::Modifier,
            ))
        }));
    }
    if let Some(body) = &decl.body {
        for node in body {
            visit(node, &mut calls);
        }
    }
    calls
}

fn visit(node: &Node, calls: &mut Vec<RawCall>) {
    match node {
        Node::Invocation(invocation) => visit_invocation(invocation, FunctionKind::Function, calls),
        Node::Emit(invocation) => visit_invocation(invocation, FunctionKind::Event, calls),
        Node::MemberAccess { object, .. } => visit(object, calls),
        Node::Identifier(_) => {}
        Node::Other(children) => {
            for child in children {
                visit(child, calls);
            }
        }
    }
}

fn visit_invocation(invocation: &Invocation, kind: FunctionKind, calls: &mut Vec<RawCall>) {
    if let Some(call) = classify(invocation, kind) {
        calls.push(call);
    }
    visit(&invocation.callee, calls);
    for arg in &invocation.args {
        visit(arg, calls);
    }
}

/// `name(..)` is an internal call; `base.name(..)` is a call through `base`.
/// Any other callee shape (indexed access, call results, `new`) is not a call
/// the graph can follow.
fn classify(invocation: &Invocation, kind: FunctionKind) -> Option<RawCall> {
    let argc = invocation.arg_count();
    match invocation.callee.as_ref() {
        Node::Identifier(name) => Some(RawCall::internal(Function::new(name.clone(), argc, kind))),
        Node::MemberAccess { object, member } => match object.as_ref() {
            Node::Identifier(base) => Some(RawCall::new(
                CallTarget::from_name(base),
                Function::function(member.clone(), argc),
            )),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ModifierInvocation;

    fn ident(name: &str) -> Node {
        Node::Identifier(name.to_string())
    }

    fn member(object: Node, name: &str) -> Node {
        Node::MemberAccess {
            object: Box::new(object),
            member: name.to_string(),
        }
    }

    fn invoke(callee: Node, args: Vec<Node>) -> Node {
        Node::Invocation(Invocation {
            callee: Box::new(callee),
            args,
        })
    }

    fn decl(kind: DeclKind, modifiers: Vec<ModifierInvocation>, body: Vec<Node>) -> FunctionDecl {
        FunctionDecl {
            name: "f".to_string(),
            kind,
            param_count: 0,
            is_constructor: false,
            modifiers,
            body: Some(body),
        }
    }

    #[test]
    fn test_modifiers_then_preorder_body() {
        // onlyOwner; a(b(1), x.c()); super.d();
        let body = vec![
            invoke(
                ident("a"),
                vec![
                    invoke(ident("b"), vec![ident("one")]),
                    invoke(member(ident("x"), "c"), vec![]),
                ],
            ),
            Node::Other(vec![invoke(member(ident("super"), "d"), vec![])]),
        ];
        let modifiers = vec![ModifierInvocation {
            name: "onlyOwner".to_string(),
            arg_count: 0,
        }];
        let calls = extract_calls(&decl(DeclKind::Function, modifiers, body));

        assert_eq!(
            calls,
            vec![
                RawCall::internal(Function::new("onlyOwner", 0, FunctionKind::Modifier)),
                RawCall::internal(Function::function("a", 2)),
                RawCall::internal(Function::function("b", 1)),
                RawCall::new(CallTarget::Named("x".to_string()), Function::function("c", 0)),
                RawCall::new(CallTarget::Super, Function::function("d", 0)),
            ]
        );
    }

    #[test]
    fn test_emit_is_event_kind() {
        let body = vec![Node::Emit(Invocation {
            callee: Box::new(ident("Transfer")),
            args: vec![ident("a"), invoke(ident("g"), vec![])],
        })];
        let calls = extract_calls(&decl(DeclKind::Function, Vec::new(), body));
        assert_eq!(
            calls,
            vec![
                RawCall::internal(Function::new("Transfer", 2, FunctionKind::Event)),
                RawCall::internal(Function::function("g", 0)),
            ]
        );
    }

    #[test]
    fn test_unfollowable_callees_are_skipped_but_descended() {
        // handlers[i].run(h()) and this.f()
        let indexed = Node::Other(vec![ident("handlers"), ident("i")]);
        let body = vec![
            invoke(member(indexed, "run"), vec![invoke(ident("h"), vec![])]),
            invoke(member(ident("this"), "f"), vec![]),
        ];
        let calls = extract_calls(&decl(DeclKind::Function, Vec::new(), body));
        assert_eq!(
            calls,
            vec![
                RawCall::internal(Function::function("h", 0)),
                RawCall::internal(Function::function("f", 0)),
            ]
        );
    }

    #[test]
    fn test_modifier_bodies_skip_modifier_list() {
        let modifiers = vec![ModifierInvocation {
            name: "other".to_string(),
            arg_count: 0,
        }];
        let calls = extract_calls(&decl(DeclKind::Modifier, modifiers, Vec::new()));
        assert!(calls.is_empty());
    }
}
