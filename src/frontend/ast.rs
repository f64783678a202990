//! AST for the managed source language.
//!
//! Deliberately shallow: declarations are modeled precisely, method bodies
//! only as far as the shape inferencer needs (return statements, local
//! declarations, nested scopes). Everything else is an opaque statement.

use smol_str::SmolStr;

/// One parsed source file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceFile {
    pub usings: Vec<SmolStr>,
    pub namespaces: Vec<NamespaceDecl>,
    /// Types declared outside any namespace.
    pub types: Vec<TypeDecl>,
}

/// A namespace declaration. Nested namespaces are flattened by the parser
/// into dotted names, so this never nests.
#[derive(Debug, Clone, PartialEq)]
pub struct NamespaceDecl {
    pub name: SmolStr,
    pub types: Vec<TypeDecl>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Class,
    Interface,
    Enum,
}

/// A class, interface, or enum declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDecl {
    pub kind: TypeKind,
    pub name: SmolStr,
    pub type_params: Vec<SmolStr>,
    pub modifiers: Modifiers,
    pub attributes: Vec<AttributeDecl>,
    /// Base list as written; classified into base class vs interfaces
    /// during semantic resolution.
    pub bases: Vec<TypeRef>,
    pub members: Vec<MemberDecl>,
    /// Only populated for `TypeKind::Enum`.
    pub enum_values: Vec<EnumValueDecl>,
}

/// Declaration modifiers, queried (not cached) by the symbol overlay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub is_public: bool,
    pub is_private: bool,
    pub is_protected: bool,
    pub is_internal: bool,
    pub is_static: bool,
    pub is_abstract: bool,
    pub is_virtual: bool,
    pub is_override: bool,
    pub is_new: bool,
    pub is_sealed: bool,
    pub is_const: bool,
    pub is_readonly: bool,
    pub is_async: bool,
    pub is_partial: bool,
}

impl Modifiers {
    /// Applies one modifier keyword; returns false if the word is not a
    /// modifier.
    pub fn apply(&mut self, word: &str) -> bool {
        match word {
            "public" => self.is_public = true,
            "private" => self.is_private = true,
            "protected" => self.is_protected = true,
            "internal" => self.is_internal = true,
            "static" => self.is_static = true,
            "abstract" => self.is_abstract = true,
            "virtual" => self.is_virtual = true,
            "override" => self.is_override = true,
            "new" => self.is_new = true,
            "sealed" => self.is_sealed = true,
            "const" => self.is_const = true,
            "readonly" => self.is_readonly = true,
            "async" => self.is_async = true,
            "partial" => self.is_partial = true,
            _ => return false,
        }
        true
    }
}

/// An applied attribute, e.g. `[Route("api", Name = "r")]`.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeDecl {
    pub name: SmolStr,
    pub positional: Vec<AttrValue>,
    pub named: Vec<(SmolStr, AttrValue)>,
}

/// A constant attribute argument value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Null,
    /// `typeof(X)`, enum references (`Color.Red`) and other symbolic
    /// constants, kept as their source text.
    Symbol(SmolStr),
    Array(Vec<AttrValue>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum MemberDecl {
    Method(MethodDecl),
    Property(PropertyDecl),
    Field(FieldDecl),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodDecl {
    pub name: SmolStr,
    pub modifiers: Modifiers,
    pub attributes: Vec<AttributeDecl>,
    pub return_type: TypeRef,
    pub params: Vec<ParamDecl>,
    /// None for abstract/interface declarations without a body.
    pub body: Option<Body>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDecl {
    pub name: SmolStr,
    pub modifiers: Modifiers,
    pub attributes: Vec<AttributeDecl>,
    pub ty: TypeRef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub name: SmolStr,
    pub modifiers: Modifiers,
    pub attributes: Vec<AttributeDecl>,
    pub ty: TypeRef,
    /// Initializer source text, if any.
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamDecl {
    pub name: SmolStr,
    pub ty: TypeRef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumValueDecl {
    pub name: SmolStr,
    pub attributes: Vec<AttributeDecl>,
    /// Explicit constant, if written. Auto-increment is applied during
    /// semantic resolution.
    pub value: Option<i64>,
}

/// A type reference as written, e.g. `Task<List<int>?>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRef {
    pub name: SmolStr,
    pub args: Vec<TypeRef>,
    pub nullable: bool,
    pub is_array: bool,
}

impl TypeRef {
    pub fn named(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
            nullable: false,
            is_array: false,
        }
    }
}

/// A method body: a single expression (`=> e`) or a statement block.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Expr(Expr),
    Block(Block),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Block {
    pub statements: Vec<Stmt>,
}

/// Statements, as far as shape inference cares.
///
/// Lambda bodies and local functions are consumed by the parser without
/// producing statements, so returns inside them can never be attributed to
/// the enclosing method.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Return(Option<Expr>),
    Local {
        name: SmolStr,
        /// None for `var`.
        ty: Option<TypeRef>,
        init: Option<Expr>,
    },
    /// A nested scope (block, `if`/`while`/`for` body). Scanned for returns.
    Block(Block),
    /// Anything else.
    Other,
}

/// Expressions, bounded to the forms the shape inferencer can type.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Int(i64),
    Float(f64),
    Str(String),
    Char(char),
    Bool(bool),
    Null,
    /// `new T(...)`, optionally with an object initializer.
    New(TypeRef),
    /// `new { A = e, B = f }`
    AnonObject(Vec<(SmolStr, Expr)>),
    /// `(T)e`
    Cast(TypeRef, Box<Expr>),
    /// A bare identifier (parameter or local reference).
    Ident(SmolStr),
    /// A lambda expression; its body is never scanned.
    Lambda,
    /// Anything the inferencer cannot type.
    Unknown,
}
