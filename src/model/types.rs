//! Resolved type references.
//!
//! [`Ty`] is what templates ultimately see: a type reference resolved
//! against a compilation, or an anonymous shape recovered by inference.

use super::anon::AnonNames;
use super::compilation::{Compilation, TypeId, is_simple_type_name};
use crate::frontend::ast::{TypeKind, TypeRef};
use smol_str::SmolStr;

#[derive(Debug, Clone, PartialEq)]
pub enum Ty {
    Named {
        /// Arena id when the name resolves to a declared type.
        id: Option<TypeId>,
        name: SmolStr,
        args: Vec<Ty>,
        nullable: bool,
        is_array: bool,
    },
    /// An anonymous object shape, recovered from `new { ... }`.
    Anonymous {
        props: Vec<(SmolStr, Ty)>,
        nullable: bool,
    },
}

impl Ty {
    pub fn named(name: impl Into<SmolStr>) -> Self {
        Ty::Named {
            id: None,
            name: name.into(),
            args: Vec::new(),
            nullable: false,
            is_array: false,
        }
    }

    /// Resolves a written type reference against the compilation, seen
    /// from the given namespace.
    pub fn from_ref(comp: &Compilation, namespace: &str, r: &TypeRef) -> Self {
        let simple: SmolStr = r.name.rsplit('.').next().unwrap_or(&r.name).into();
        let id = if is_simple_type_name(&simple) {
            None
        } else {
            comp.resolve_name(namespace, &r.name)
        };
        Ty::Named {
            id,
            name: simple,
            args: r
                .args
                .iter()
                .map(|a| Ty::from_ref(comp, namespace, a))
                .collect(),
            nullable: r.nullable,
            is_array: r.is_array,
        }
    }

    pub fn name(&self, anon: &mut AnonNames) -> SmolStr {
        match self {
            Ty::Named { name, .. } => name.clone(),
            Ty::Anonymous { props, .. } => anon.name_for(props),
        }
    }

    pub fn is_nullable(&self) -> bool {
        match self {
            Ty::Named { nullable, .. } | Ty::Anonymous { nullable, .. } => *nullable,
        }
    }

    /// Nullability is a signature-level contract; inference propagates the
    /// declared annotation onto recovered types through this.
    pub fn with_nullability(mut self, value: bool) -> Self {
        match &mut self {
            Ty::Named { nullable, .. } | Ty::Anonymous { nullable, .. } => *nullable = value,
        }
        self
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Ty::Anonymous { .. })
    }

    pub fn is_generic(&self) -> bool {
        matches!(self, Ty::Named { args, .. } if !args.is_empty())
    }

    /// The deliberately erased marker: `object`, or a single-level
    /// `Task<object>` wrapper.
    pub fn is_erased_marker(&self) -> bool {
        match self {
            Ty::Named {
                name,
                args,
                is_array: false,
                ..
            } => {
                if name == "object" && args.is_empty() {
                    return true;
                }
                name == "Task"
                    && args.len() == 1
                    && matches!(
                        &args[0],
                        Ty::Named { name, args, .. } if name == "object" && args.is_empty()
                    )
            }
            _ => false,
        }
    }

    pub fn is_enum(&self, comp: &Compilation) -> bool {
        match self {
            Ty::Named { id: Some(id), .. } => comp.ty(*id).is_enum(),
            _ => false,
        }
    }

    /// Simple types map to primitive target-language values; complex types
    /// need structural treatment. `Nullable<T>` classifies as its argument.
    pub fn is_complex(&self, comp: &Compilation) -> bool {
        match self {
            Ty::Anonymous { .. } => true,
            Ty::Named { name, args, .. } => {
                if name == "Nullable" && args.len() == 1 {
                    return args[0].is_complex(comp);
                }
                if is_simple_type_name(name) || self.is_enum(comp) {
                    return false;
                }
                true
            }
        }
    }

    /// Coarse classification for templates.
    pub fn kind(&self, comp: &Compilation) -> &'static str {
        match self {
            Ty::Anonymous { .. } => "anonymous",
            Ty::Named { id: Some(id), .. } => match comp.ty(*id).kind {
                TypeKind::Class => "class",
                TypeKind::Interface => "interface",
                TypeKind::Enum => "enum",
            },
            Ty::Named { name, .. } if super::compilation::is_primitive_name(name) => "primitive",
            Ty::Named { .. } => "unknown",
        }
    }
}
