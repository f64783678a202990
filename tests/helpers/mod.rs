//! Shared fixtures and assertion helpers.

pub mod source_fixtures;

use regen::frontend;
use regen::model::{Compilation, MemberId, ModelSymbol, TypeId, TypeView};
use std::path::PathBuf;

/// Compiles a set of (path, text) units into one project compilation.
pub fn compile(units: &[(&str, &str)]) -> Compilation {
    let parsed: Vec<(PathBuf, frontend::Parse)> = units
        .iter()
        .map(|(path, text)| (PathBuf::from(path), frontend::parse(text)))
        .collect();
    Compilation::build(parsed.iter().map(|(path, parse)| (path.as_path(), &parse.file)))
}

pub fn compile_one(text: &str) -> Compilation {
    compile(&[("test.cs", text)])
}

pub fn type_named(comp: &Compilation, name: &str) -> TypeId {
    comp.type_ids()
        .find(|&id| comp.ty(id).name == name)
        .unwrap_or_else(|| panic!("no type named {name}"))
}

pub fn method_named(comp: &Compilation, ty: TypeId, name: &str) -> MemberId {
    comp.ty(ty)
        .members
        .iter()
        .copied()
        .find(|&m| comp.member(m).name == name)
        .unwrap_or_else(|| panic!("no member named {name}"))
}

/// Flattened method names of a type, in emission order.
pub fn flattened_method_names(comp: &Compilation, name: &str) -> Vec<String> {
    let view = TypeView::new(comp, type_named(comp, name));
    view.methods().map(|m| m.name().to_string()).collect()
}

/// Flattened property names of a type, in emission order.
pub fn flattened_property_names(comp: &Compilation, name: &str) -> Vec<String> {
    let view = TypeView::new(comp, type_named(comp, name));
    view.properties().map(|p| p.name().to_string()).collect()
}
