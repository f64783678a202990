//! Semantic compilation: the resolved, whole-project view derived from all
//! compiled units.
//!
//! Rebuilt from scratch whenever a project's unit set changes; a stale
//! compilation is never queried (the solution index enforces this).

use crate::frontend::ast::{
    AttrValue, Body, MemberDecl, Modifiers, ParamDecl, SourceFile, TypeDecl, TypeKind, TypeRef,
};
use rustc_hash::FxHashMap;
use serde_json::Value;
use smol_str::SmolStr;
use std::path::{Path, PathBuf};

/// Unique identifier for a type in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeId(pub u32);

impl TypeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Unique identifier for a member in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemberId(pub u32);

impl MemberId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A named type declared in the project.
#[derive(Debug, Clone)]
pub struct TypeSym {
    pub kind: TypeKind,
    pub name: SmolStr,
    /// Empty for the global namespace.
    pub namespace: SmolStr,
    pub type_params: Vec<SmolStr>,
    pub modifiers: Modifiers,
    pub attributes: Vec<AttrSym>,
    /// Base list as written, kept for syntax-level queries.
    pub base_refs: Vec<TypeRef>,
    pub base_class: Option<TypeId>,
    pub interfaces: Vec<TypeId>,
    pub members: Vec<MemberId>,
    pub enum_values: Vec<EnumValueSym>,
    /// Path of the declaring unit.
    pub unit: PathBuf,
}

impl TypeSym {
    pub fn qualified_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.to_string()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }

    pub fn is_enum(&self) -> bool {
        self.kind == TypeKind::Enum
    }
}

#[derive(Debug, Clone)]
pub struct EnumValueSym {
    pub name: SmolStr,
    pub attributes: Vec<AttrSym>,
    pub value: i64,
}

/// A method, property, or field declaration with resolution context.
#[derive(Debug, Clone)]
pub struct MemberSym {
    pub name: SmolStr,
    pub kind: MemberKind,
    pub owner: TypeId,
    pub modifiers: Modifiers,
    pub attributes: Vec<AttrSym>,
    /// For `override` members: the nearest base declaration this overrides.
    pub overridden: Option<MemberId>,
}

#[derive(Debug, Clone)]
pub enum MemberKind {
    Method {
        return_type: TypeRef,
        params: Vec<ParamDecl>,
        body: Option<Body>,
    },
    Property {
        ty: TypeRef,
    },
    Field {
        ty: TypeRef,
        value: Option<String>,
    },
}

impl MemberKind {
    fn discriminant(&self) -> u8 {
        match self {
            MemberKind::Method { .. } => 0,
            MemberKind::Property { .. } => 1,
            MemberKind::Field { .. } => 2,
        }
    }
}

/// A resolved applied attribute: positional and named constant values.
#[derive(Debug, Clone)]
pub struct AttrSym {
    /// Name as written (convention suffix not stripped here).
    pub name: SmolStr,
    pub positional: Vec<Value>,
    pub named: Vec<(SmolStr, Value)>,
}

/// The resolved whole-project symbol view.
#[derive(Debug, Clone, Default)]
pub struct Compilation {
    types: Vec<TypeSym>,
    members: Vec<MemberSym>,
    by_qualified: FxHashMap<SmolStr, TypeId>,
    by_simple: FxHashMap<SmolStr, TypeId>,
}

impl Compilation {
    /// Builds a compilation from every unit of a project.
    pub fn build<'a>(units: impl IntoIterator<Item = (&'a Path, &'a SourceFile)>) -> Self {
        let mut comp = Compilation::default();
        for (path, file) in units {
            for decl in &file.types {
                comp.add_type(path, "", decl);
            }
            for ns in &file.namespaces {
                for decl in &ns.types {
                    comp.add_type(path, &ns.name, decl);
                }
            }
        }
        comp.resolve_bases();
        comp.resolve_overrides();
        comp
    }

    // =========================================================================
    // Construction
    // =========================================================================

    fn add_type(&mut self, unit: &Path, namespace: &str, decl: &TypeDecl) {
        let id = TypeId(self.types.len() as u32);

        let mut enum_values = Vec::new();
        if decl.kind == TypeKind::Enum {
            // C#-style auto-increment: explicit values restart the counter.
            let mut next = 0i64;
            for v in &decl.enum_values {
                let value = v.value.unwrap_or(next);
                next = value + 1;
                enum_values.push(EnumValueSym {
                    name: v.name.clone(),
                    attributes: v.attributes.iter().map(resolve_attr).collect(),
                    value,
                });
            }
        }

        let mut sym = TypeSym {
            kind: decl.kind,
            name: decl.name.clone(),
            namespace: namespace.into(),
            type_params: decl.type_params.clone(),
            modifiers: decl.modifiers,
            attributes: decl.attributes.iter().map(resolve_attr).collect(),
            base_refs: decl.bases.clone(),
            base_class: None,
            interfaces: Vec::new(),
            members: Vec::new(),
            enum_values,
            unit: unit.to_path_buf(),
        };

        for member in &decl.members {
            let member_id = MemberId(self.members.len() as u32);
            let (name, kind, modifiers, attributes) = match member {
                MemberDecl::Method(m) => (
                    m.name.clone(),
                    MemberKind::Method {
                        return_type: m.return_type.clone(),
                        params: m.params.clone(),
                        body: m.body.clone(),
                    },
                    m.modifiers,
                    &m.attributes,
                ),
                MemberDecl::Property(p) => (
                    p.name.clone(),
                    MemberKind::Property { ty: p.ty.clone() },
                    p.modifiers,
                    &p.attributes,
                ),
                MemberDecl::Field(f) => (
                    f.name.clone(),
                    MemberKind::Field {
                        ty: f.ty.clone(),
                        value: f.value.clone(),
                    },
                    f.modifiers,
                    &f.attributes,
                ),
            };
            self.members.push(MemberSym {
                name,
                kind,
                owner: id,
                modifiers,
                attributes: attributes.iter().map(resolve_attr).collect(),
                overridden: None,
            });
            sym.members.push(member_id);
        }

        let qualified: SmolStr = sym.qualified_name().into();
        self.by_qualified.entry(qualified).or_insert(id);
        self.by_simple.entry(sym.name.clone()).or_insert(id);
        self.types.push(sym);
    }

    fn resolve_bases(&mut self) {
        for i in 0..self.types.len() {
            let (namespace, base_refs) = {
                let t = &self.types[i];
                (t.namespace.clone(), t.base_refs.clone())
            };
            let mut base_class = None;
            let mut interfaces = Vec::new();
            for base in &base_refs {
                let Some(target) = self.resolve_name(&namespace, &base.name) else {
                    continue;
                };
                match self.types[target.index()].kind {
                    TypeKind::Class if base_class.is_none() => base_class = Some(target),
                    TypeKind::Interface => interfaces.push(target),
                    _ => {}
                }
            }
            let t = &mut self.types[i];
            t.base_class = base_class;
            t.interfaces = interfaces;
        }
    }

    fn resolve_overrides(&mut self) {
        for i in 0..self.members.len() {
            if !self.members[i].modifiers.is_override {
                continue;
            }
            let member = &self.members[i];
            let name = member.name.clone();
            let disc = member.kind.discriminant();
            let params = method_params(&member.kind).map(<[ParamDecl]>::to_vec);

            let mut base = self.types[member.owner.index()].base_class;
            let mut found = None;
            while let Some(ty) = base {
                for &candidate in &self.types[ty.index()].members {
                    let c = &self.members[candidate.index()];
                    let overridable =
                        c.modifiers.is_virtual || c.modifiers.is_abstract || c.modifiers.is_override;
                    if c.name == name
                        && c.kind.discriminant() == disc
                        && signatures_match(params.as_deref(), method_params(&c.kind))
                        && overridable
                    {
                        found = Some(candidate);
                        break;
                    }
                }
                if found.is_some() {
                    break;
                }
                base = self.types[ty.index()].base_class;
            }
            if found.is_none() {
                tracing::debug!(
                    member = %name,
                    "override member has no resolvable base declaration"
                );
            }
            self.members[i].overridden = found;
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Resolves a (possibly qualified) type name seen from `namespace`.
    pub fn resolve_name(&self, namespace: &str, name: &str) -> Option<TypeId> {
        if !namespace.is_empty() {
            let scoped: SmolStr = format!("{namespace}.{name}").into();
            if let Some(&id) = self.by_qualified.get(&scoped) {
                return Some(id);
            }
        }
        if let Some(&id) = self.by_qualified.get(name) {
            return Some(id);
        }
        self.by_simple.get(name).copied()
    }

    pub fn type_ids(&self) -> impl Iterator<Item = TypeId> + '_ {
        (0..self.types.len() as u32).map(TypeId)
    }

    pub fn ty(&self, id: TypeId) -> &TypeSym {
        &self.types[id.index()]
    }

    pub fn member(&self, id: MemberId) -> &MemberSym {
        &self.members[id.index()]
    }

    /// True if the member is visible in flattened views: public, where
    /// interface members are implicitly public.
    pub fn member_is_public(&self, id: MemberId) -> bool {
        let m = self.member(id);
        m.modifiers.is_public || self.ty(m.owner).kind == TypeKind::Interface
    }

    /// Walks the base-class chain starting at (and including) `ty`, in
    /// derived-to-base order. The universal root is never part of the
    /// arena, so it is excluded by construction.
    pub fn inheritance_chain(&self, ty: TypeId) -> Vec<TypeId> {
        let mut chain = vec![ty];
        let mut current = self.ty(ty).base_class;
        while let Some(id) = current {
            // Defensive cycle guard for malformed inheritance.
            if chain.contains(&id) {
                break;
            }
            chain.push(id);
            current = self.ty(id).base_class;
        }
        chain
    }

    /// All interfaces implemented by `ty`, transitively through the base
    /// chain and through interface inheritance.
    pub fn all_interfaces(&self, ty: TypeId) -> Vec<TypeId> {
        let mut seen = Vec::new();
        let mut work: Vec<TypeId> = self
            .inheritance_chain(ty)
            .iter()
            .flat_map(|t| self.ty(*t).interfaces.iter().copied())
            .collect();
        while let Some(i) = work.pop() {
            if seen.contains(&i) {
                continue;
            }
            work.extend(self.ty(i).interfaces.iter().copied());
            seen.push(i);
        }
        seen
    }

    /// True if `ty` implements an interface with the given simple name,
    /// checking both resolved interfaces and unresolved base-list names.
    pub fn implements(&self, ty: TypeId, interface_name: &str) -> bool {
        if self
            .all_interfaces(ty)
            .iter()
            .any(|i| self.ty(*i).name == interface_name)
        {
            return true;
        }
        self.inheritance_chain(ty)
            .iter()
            .flat_map(|t| self.ty(*t).base_refs.iter())
            .any(|b| b.name == interface_name)
    }

    /// Number of members with this name in the containing type (overload
    /// detection).
    pub fn overload_count(&self, id: MemberId) -> usize {
        let m = self.member(id);
        self.ty(m.owner)
            .members
            .iter()
            .filter(|&&other| self.member(other).name == m.name)
            .count()
    }
}

fn method_params(kind: &MemberKind) -> Option<&[ParamDecl]> {
    match kind {
        MemberKind::Method { params, .. } => Some(params),
        _ => None,
    }
}

/// Overload selection for override resolution: parameter lists match when
/// every written type matches structurally. Methods compare against
/// methods only; properties and fields have no parameter list.
fn signatures_match(a: Option<&[ParamDecl]>, b: Option<&[ParamDecl]>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| type_refs_match(&x.ty, &y.ty))
        }
        (None, None) => true,
        _ => false,
    }
}

/// Written types match on their simple name plus nullability, array and
/// argument shape. Qualification is ignored, mirroring how references
/// resolve elsewhere in the model.
fn type_refs_match(a: &TypeRef, b: &TypeRef) -> bool {
    simple_name(&a.name) == simple_name(&b.name)
        && a.nullable == b.nullable
        && a.is_array == b.is_array
        && a.args.len() == b.args.len()
        && a.args.iter().zip(&b.args).all(|(x, y)| type_refs_match(x, y))
}

fn simple_name(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

/// Converts a parsed attribute into its resolved constant form.
/// Array values convert recursively; value types pass through natively.
fn resolve_attr(attr: &crate::frontend::ast::AttributeDecl) -> AttrSym {
    AttrSym {
        name: attr.name.clone(),
        positional: attr.positional.iter().map(attr_value).collect(),
        named: attr
            .named
            .iter()
            .map(|(k, v)| (k.clone(), attr_value(v)))
            .collect(),
    }
}

fn attr_value(value: &AttrValue) -> Value {
    match value {
        AttrValue::Int(v) => Value::from(*v),
        AttrValue::Float(v) => Value::from(*v),
        AttrValue::Str(v) => Value::from(v.clone()),
        AttrValue::Bool(v) => Value::from(*v),
        AttrValue::Null => Value::Null,
        AttrValue::Symbol(v) => Value::from(v.as_str()),
        AttrValue::Array(items) => Value::Array(items.iter().map(attr_value).collect()),
    }
}

/// Primitive names of the managed language (map to simple target-language
/// values).
pub fn is_primitive_name(name: &str) -> bool {
    matches!(
        name,
        "int"
            | "uint"
            | "long"
            | "ulong"
            | "short"
            | "ushort"
            | "byte"
            | "sbyte"
            | "float"
            | "double"
            | "decimal"
            | "bool"
            | "string"
            | "char"
            | "void"
            | "object"
    )
}

/// Simple types are primitives plus date-like and identifier types;
/// everything else (and anything unresolved) is complex.
pub fn is_simple_type_name(name: &str) -> bool {
    is_primitive_name(name)
        || matches!(
            name,
            "DateTime" | "DateTimeOffset" | "TimeOnly" | "DateOnly" | "TimeSpan" | "Guid"
        )
}
