//! Member resolver: the flattened, de-duplicated member view of a type
//! across its single-inheritance chain.
//!
//! Two passes over the chain in base-to-derived order. Pass one collects
//! the identities of all overridden base declarations; pass two emits
//! members base-first, skipping suppressed declarations so each overridden
//! member appears exactly once, at its most-derived override site.

use super::compilation::{Compilation, MemberId, MemberKind, TypeId};
use rustc_hash::FxHashSet;

/// Flattened public instance methods of `ty`, base-first.
pub fn flattened_methods(comp: &Compilation, ty: TypeId) -> Vec<MemberId> {
    flattened(comp, ty, |kind| matches!(kind, MemberKind::Method { .. }), false)
}

/// Flattened public non-static properties of `ty`, base-first.
pub fn flattened_properties(comp: &Compilation, ty: TypeId) -> Vec<MemberId> {
    flattened(comp, ty, |kind| matches!(kind, MemberKind::Property { .. }), true)
}

fn flattened(
    comp: &Compilation,
    ty: TypeId,
    select: impl Fn(&MemberKind) -> bool,
    exclude_static: bool,
) -> Vec<MemberId> {
    let mut chain = comp.inheritance_chain(ty);
    chain.reverse(); // base declarations are visited, and emitted, first

    // Pass 1: every override suppresses the declaration it overrides.
    // Interface redeclarations carry no override link, so they are never
    // suppressed here.
    let mut suppressed: FxHashSet<MemberId> = FxHashSet::default();
    for &t in &chain {
        for &m in &comp.ty(t).members {
            if let Some(target) = comp.member(m).overridden {
                suppressed.insert(target);
            }
        }
    }

    // Pass 2: emit base-first, skipping suppressed declarations.
    let mut out = Vec::new();
    for &t in &chain {
        for &m in &comp.ty(t).members {
            let member = comp.member(m);
            if !select(&member.kind) {
                continue;
            }
            if !comp.member_is_public(m) {
                continue;
            }
            if exclude_static && member.modifiers.is_static {
                continue;
            }
            if suppressed.contains(&m) {
                continue;
            }
            out.push(m);
        }
    }
    out
}
