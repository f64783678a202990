//! Shape inferencer: best-effort static recovery of erased return types.
//!
//! When a method is declared to return the erased marker (`object` or
//! `Task<object>`), scan its body for the first return expression with an
//! inferable concrete type. Returns inside lambdas and local functions were
//! already excluded by the parser, so they can never be attributed to the
//! enclosing method. This is not type inference proper: divergent returns
//! are not unified, the first qualifying one wins.

use super::compilation::{Compilation, MemberId, MemberKind};
use super::types::Ty;
use crate::frontend::ast::{Block, Body, Expr, Stmt};
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

/// The effective return type of a method: the declared type, or for erased
/// markers the recovered concrete shape with the declared nullability.
pub fn method_return_type(comp: &Compilation, id: MemberId) -> Ty {
    let member = comp.member(id);
    let MemberKind::Method {
        return_type,
        params,
        body,
    } = &member.kind
    else {
        return Ty::named("void");
    };

    let namespace = comp.ty(member.owner).namespace.clone();
    let declared = Ty::from_ref(comp, &namespace, return_type);
    if !declared.is_erased_marker() {
        return declared;
    }
    let Some(body) = body else {
        return declared; // nothing to scan, stays opaque
    };

    // Parameters and simple locals are the only bindings the bounded
    // expression scan can see.
    let mut env: FxHashMap<SmolStr, Ty> = params
        .iter()
        .map(|p| (p.name.clone(), Ty::from_ref(comp, &namespace, &p.ty)))
        .collect();

    let recovered = match body {
        Body::Expr(expr) => infer_expr(comp, &namespace, &env, expr),
        Body::Block(block) => {
            collect_locals(comp, &namespace, block, &mut env);
            first_concrete_return(comp, &namespace, &env, block)
        }
    };

    match recovered {
        // Nullability comes from the declared signature, not from the
        // expression that happened to be scanned.
        Some(ty) if !ty.is_erased_marker() => ty.with_nullability(declared.is_nullable()),
        _ => declared,
    }
}

/// Walks statements (descending into nested scopes) and records local
/// bindings with an inferable type. Flat, declaration order; shadowing is
/// last-wins, which is close enough for a best-effort scan.
fn collect_locals(
    comp: &Compilation,
    namespace: &str,
    block: &Block,
    env: &mut FxHashMap<SmolStr, Ty>,
) {
    for stmt in &block.statements {
        match stmt {
            Stmt::Local { name, ty, init } => {
                let bound = match (ty, init) {
                    (Some(t), _) => Some(Ty::from_ref(comp, namespace, t)),
                    (None, Some(e)) => infer_expr(comp, namespace, env, e),
                    (None, None) => None,
                };
                if let Some(bound) = bound {
                    env.insert(name.clone(), bound);
                }
            }
            Stmt::Block(inner) => collect_locals(comp, namespace, inner, env),
            _ => {}
        }
    }
}

/// The first return expression whose inferred type is concrete (not the
/// erased marker), in source order.
fn first_concrete_return(
    comp: &Compilation,
    namespace: &str,
    env: &FxHashMap<SmolStr, Ty>,
    block: &Block,
) -> Option<Ty> {
    for stmt in &block.statements {
        match stmt {
            Stmt::Return(Some(expr)) => {
                if let Some(ty) = infer_expr(comp, namespace, env, expr) {
                    if !ty.is_erased_marker() {
                        return Some(ty);
                    }
                }
            }
            Stmt::Block(inner) => {
                if let Some(ty) = first_concrete_return(comp, namespace, env, inner) {
                    return Some(ty);
                }
            }
            _ => {}
        }
    }
    None
}

/// Bounded expression typing. `None` means "no idea" and the scan moves on.
fn infer_expr(
    comp: &Compilation,
    namespace: &str,
    env: &FxHashMap<SmolStr, Ty>,
    expr: &Expr,
) -> Option<Ty> {
    match expr {
        Expr::Int(_) => Some(Ty::named("int")),
        Expr::Float(_) => Some(Ty::named("double")),
        Expr::Str(_) => Some(Ty::named("string")),
        Expr::Char(_) => Some(Ty::named("char")),
        Expr::Bool(_) => Some(Ty::named("bool")),
        Expr::Null => None,
        Expr::New(ty) => Some(Ty::from_ref(comp, namespace, ty)),
        Expr::Cast(ty, _) => Some(Ty::from_ref(comp, namespace, ty)),
        Expr::Ident(name) => env.get(name).cloned(),
        Expr::AnonObject(props) => Some(Ty::Anonymous {
            props: props
                .iter()
                .map(|(name, value)| {
                    let ty = infer_expr(comp, namespace, env, value)
                        .unwrap_or_else(|| Ty::named("object"));
                    (name.clone(), ty)
                })
                .collect(),
            nullable: false,
        }),
        Expr::Lambda | Expr::Unknown => None,
    }
}
