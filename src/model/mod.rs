//! The code model: per-project compilations and the read-only views the
//! template evaluator binds against.
//!
//! `compilation` owns the symbol arenas, `overlay` the typed facades,
//! `members` the inheritance-flattened member views, `infer` the
//! best-effort return-shape recovery, `anon` the synthetic names for
//! anonymous shapes, and `json` the projection handed to templates.

pub mod anon;
pub mod compilation;
pub mod infer;
pub mod json;
pub mod members;
pub mod overlay;
pub mod types;

pub use anon::AnonNames;
pub use compilation::{Compilation, MemberId, MemberKind, TypeId};
pub use overlay::{
    AttributeView, EnumValueView, FieldView, MethodView, ModelSymbol, ParameterView,
    PropertyView, TypeView,
};
pub use types::Ty;
