//! Symbol overlay: named, typed facades over the compilation arenas.
//!
//! Every declaration kind (type, method, property, field, enum value)
//! exposes the same capability surface through [`ModelSymbol`]: name,
//! modifier predicates, and attribute lookup. Pure read projections;
//! attribute absence is a normal outcome, never an error.

use super::compilation::{AttrSym, Compilation, MemberId, MemberKind, TypeId};
use super::infer;
use super::types::Ty;
use crate::frontend::ast::Modifiers;
use serde_json::Value;

/// The uniform capability surface of a declaration.
pub trait ModelSymbol {
    fn name(&self) -> &str;
    fn modifiers(&self) -> Modifiers;
    fn attrs(&self) -> &[AttrSym];

    fn is_abstract(&self) -> bool {
        self.modifiers().is_abstract
    }
    fn is_virtual(&self) -> bool {
        self.modifiers().is_virtual
    }
    fn is_override(&self) -> bool {
        self.modifiers().is_override
    }
    fn is_new(&self) -> bool {
        self.modifiers().is_new
    }
    fn is_public(&self) -> bool {
        self.modifiers().is_public
    }
    fn is_private(&self) -> bool {
        self.modifiers().is_private
    }
    fn is_protected(&self) -> bool {
        self.modifiers().is_protected
    }
    fn is_static(&self) -> bool {
        self.modifiers().is_static
    }

    fn has_attribute(&self, name: &str) -> bool {
        lookup_attr(self.attrs(), name).is_some()
    }

    /// First attribute matching the logical name, or none.
    fn attribute(&self, name: &str) -> Option<AttributeView<'_>> {
        lookup_attr(self.attrs(), name).map(AttributeView::new)
    }
}

/// Case-sensitive lookup tolerating the `Attribute` convention suffix on
/// either side: `Foo` and `FooAttribute` are the same logical name.
pub fn lookup_attr<'a>(attrs: &'a [AttrSym], name: &str) -> Option<&'a AttrSym> {
    let key = strip_suffix(name);
    attrs.iter().find(|a| strip_suffix(&a.name) == key)
}

fn strip_suffix(name: &str) -> &str {
    name.strip_suffix("Attribute")
        .filter(|s| !s.is_empty())
        .unwrap_or(name)
}

/// A resolved applied attribute.
#[derive(Debug, Clone, Copy)]
pub struct AttributeView<'a> {
    attr: &'a AttrSym,
}

impl<'a> AttributeView<'a> {
    pub fn new(attr: &'a AttrSym) -> Self {
        Self { attr }
    }

    /// Logical name with the convention suffix stripped.
    pub fn name(&self) -> &str {
        strip_suffix(&self.attr.name)
    }

    /// First positional argument value, if any.
    pub fn value(&self) -> Option<&Value> {
        self.attr.positional.first()
    }

    pub fn positional(&self) -> &[Value] {
        &self.attr.positional
    }

    pub fn named(&self) -> &[(smol_str::SmolStr, Value)] {
        &self.attr.named
    }
}

/// A declared type.
#[derive(Debug, Clone, Copy)]
pub struct TypeView<'a> {
    pub comp: &'a Compilation,
    pub id: TypeId,
}

impl<'a> TypeView<'a> {
    pub fn new(comp: &'a Compilation, id: TypeId) -> Self {
        Self { comp, id }
    }

    pub fn namespace(&self) -> &str {
        &self.comp.ty(self.id).namespace
    }

    pub fn qualified_name(&self) -> String {
        self.comp.ty(self.id).qualified_name()
    }

    /// Flattened public instance methods, base-first, override-suppressed.
    pub fn methods(&self) -> impl Iterator<Item = MethodView<'a>> + '_ {
        super::members::flattened_methods(self.comp, self.id)
            .into_iter()
            .map(|id| MethodView::new(self.comp, id))
    }

    /// Flattened public non-static properties, base-first,
    /// override-suppressed.
    pub fn properties(&self) -> impl Iterator<Item = PropertyView<'a>> + '_ {
        super::members::flattened_properties(self.comp, self.id)
            .into_iter()
            .map(|id| PropertyView::new(self.comp, id))
    }

    /// Constant fields declared directly on this type.
    pub fn consts(&self) -> impl Iterator<Item = FieldView<'a>> + '_ {
        let comp = self.comp;
        comp.ty(self.id)
            .members
            .iter()
            .copied()
            .filter(move |&m| {
                matches!(comp.member(m).kind, MemberKind::Field { .. })
                    && comp.member(m).modifiers.is_const
            })
            .map(move |m| FieldView::new(comp, m))
    }

    pub fn implements(&self, interface_name: &str) -> bool {
        self.comp.implements(self.id, interface_name)
    }

    /// Syntax-only check of the written base list, no inheritance.
    pub fn directly_implements(&self, interface_name: &str) -> bool {
        self.comp
            .ty(self.id)
            .base_refs
            .iter()
            .any(|b| b.name == interface_name)
    }
}

impl ModelSymbol for TypeView<'_> {
    fn name(&self) -> &str {
        &self.comp.ty(self.id).name
    }
    fn modifiers(&self) -> Modifiers {
        self.comp.ty(self.id).modifiers
    }
    fn attrs(&self) -> &[AttrSym] {
        &self.comp.ty(self.id).attributes
    }
}

macro_rules! member_view {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy)]
        pub struct $name<'a> {
            pub comp: &'a Compilation,
            pub id: MemberId,
        }

        impl<'a> $name<'a> {
            pub fn new(comp: &'a Compilation, id: MemberId) -> Self {
                Self { comp, id }
            }
        }

        impl ModelSymbol for $name<'_> {
            fn name(&self) -> &str {
                &self.comp.member(self.id).name
            }
            fn modifiers(&self) -> Modifiers {
                self.comp.member(self.id).modifiers
            }
            fn attrs(&self) -> &[AttrSym] {
                &self.comp.member(self.id).attributes
            }
        }
    };
}

member_view!(MethodView);
member_view!(PropertyView);
member_view!(FieldView);

impl<'a> MethodView<'a> {
    /// More than one declaration with this name in the containing type.
    pub fn is_overload(&self) -> bool {
        self.comp.overload_count(self.id) > 1
    }

    pub fn parameters(&self) -> Vec<ParameterView> {
        let member = self.comp.member(self.id);
        let namespace = self.comp.ty(member.owner).namespace.clone();
        match &member.kind {
            MemberKind::Method { params, .. } => params
                .iter()
                .map(|p| ParameterView {
                    name: p.name.clone(),
                    ty: Ty::from_ref(self.comp, &namespace, &p.ty),
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Effective return type, shape-inferred for erased markers.
    pub fn returns(&self) -> Ty {
        infer::method_return_type(self.comp, self.id)
    }
}

impl PropertyView<'_> {
    pub fn ty(&self) -> Ty {
        let member = self.comp.member(self.id);
        let namespace = &self.comp.ty(member.owner).namespace;
        match &member.kind {
            MemberKind::Property { ty } => Ty::from_ref(self.comp, namespace, ty),
            _ => Ty::named("void"),
        }
    }
}

impl FieldView<'_> {
    pub fn ty(&self) -> Ty {
        let member = self.comp.member(self.id);
        let namespace = &self.comp.ty(member.owner).namespace;
        match &member.kind {
            MemberKind::Field { ty, .. } => Ty::from_ref(self.comp, namespace, ty),
            _ => Ty::named("void"),
        }
    }

    /// Initializer text, if the declaration had one.
    pub fn value(&self) -> Option<&str> {
        match &self.comp.member(self.id).kind {
            MemberKind::Field { value, .. } => value.as_deref(),
            _ => None,
        }
    }
}

/// A method parameter: name and type only.
#[derive(Debug, Clone)]
pub struct ParameterView {
    pub name: smol_str::SmolStr,
    pub ty: Ty,
}

/// An enum member: name, constant value, attributes.
#[derive(Debug, Clone, Copy)]
pub struct EnumValueView<'a> {
    comp: &'a Compilation,
    ty: TypeId,
    index: usize,
}

impl<'a> EnumValueView<'a> {
    pub fn new(comp: &'a Compilation, ty: TypeId, index: usize) -> Self {
        Self { comp, ty, index }
    }

    pub fn value(&self) -> i64 {
        self.comp.ty(self.ty).enum_values[self.index].value
    }
}

impl ModelSymbol for EnumValueView<'_> {
    fn name(&self) -> &str {
        &self.comp.ty(self.ty).enum_values[self.index].name
    }
    fn modifiers(&self) -> Modifiers {
        Modifiers::default()
    }
    fn attrs(&self) -> &[AttrSym] {
        &self.comp.ty(self.ty).enum_values[self.index].attributes
    }
}
