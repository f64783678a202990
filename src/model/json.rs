//! JSON projection of the code model for template binding.
//!
//! The evaluator sees plain data: projects, classes, namespaces, files.
//! Type entries embed only shallow information (name, kind, nullability,
//! enum values, anonymous shapes one level deep) so cyclic type graphs
//! cannot recurse; templates drill into named types through their class
//! entries instead.

use super::anon::AnonNames;
use super::compilation::{AttrSym, Compilation, TypeId};
use super::overlay::{
    AttributeView, EnumValueView, FieldView, MethodView, ModelSymbol, PropertyView, TypeView,
};
use super::types::Ty;
use crate::frontend::ast::TypeKind;
use crate::solution::Solution;
use serde_json::{Map, Value, json};
use std::path::Path;

/// The rooted code-model object bound into the evaluator's scope.
pub fn code_json(solution: &Solution, anon: &mut AnonNames) -> Value {
    let mut projects = Vec::new();
    let mut all_classes = Vec::new();
    let mut all_files = Vec::new();
    // namespace name -> (classes, enums), merged across projects
    let mut namespaces: indexmap::IndexMap<String, (Vec<Value>, Vec<Value>)> =
        indexmap::IndexMap::new();

    for project in solution.projects() {
        let comp = project.compilation();
        let mut classes = Vec::new();
        let mut enums = Vec::new();
        for id in comp.type_ids() {
            match comp.ty(id).kind {
                TypeKind::Class => {
                    let class = class_json(comp, id, anon);
                    let entry = namespaces
                        .entry(comp.ty(id).namespace.to_string())
                        .or_default();
                    entry.0.push(class.clone());
                    all_classes.push(class.clone());
                    classes.push(class);
                }
                TypeKind::Enum => {
                    let value = enum_json(comp, id);
                    let entry = namespaces
                        .entry(comp.ty(id).namespace.to_string())
                        .or_default();
                    entry.1.push(value.clone());
                    enums.push(value);
                }
                TypeKind::Interface => {}
            }
        }
        let files = files_json(solution.root(), project, anon);
        all_files.extend(files.iter().cloned());
        projects.push(json!({
            "name": project.name(),
            "classes": classes,
            "enums": enums,
            "files": files,
        }));
    }

    let namespaces: Vec<Value> = namespaces
        .into_iter()
        .map(|(name, (classes, enums))| {
            json!({ "name": name, "classes": classes, "enums": enums })
        })
        .collect();

    json!({
        "projects": projects,
        "classes": all_classes,
        "namespaces": namespaces,
        "files": all_files,
    })
}

fn files_json(solution_root: &Path, project: &crate::solution::Project, anon: &mut AnonNames) -> Vec<Value> {
    let comp = project.compilation();
    project
        .unit_paths()
        .map(|path| {
            let name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default();
            let directory = path
                .parent()
                .and_then(|dir| dir.strip_prefix(solution_root).ok())
                .map(|dir| dir.to_string_lossy().replace('\\', "/"))
                .unwrap_or_default();
            let classes: Vec<Value> = comp
                .type_ids()
                .filter(|&id| comp.ty(id).kind == TypeKind::Class && comp.ty(id).unit == path)
                .map(|id| class_json(comp, id, anon))
                .collect();
            json!({
                "name": name,
                "directory": directory,
                "classes": classes,
            })
        })
        .collect()
}

fn class_json(comp: &Compilation, id: TypeId, anon: &mut AnonNames) -> Value {
    let view = TypeView::new(comp, id);
    let sym = comp.ty(id);

    let methods: Vec<Value> = view.methods().map(|m| method_json(&m, anon)).collect();
    let properties: Vec<Value> = view.properties().map(|p| property_json(&p, anon)).collect();
    let consts: Vec<Value> = view.consts().map(|f| field_json(&f, anon)).collect();
    let implements: Vec<Value> = comp
        .all_interfaces(id)
        .into_iter()
        .map(|i| Value::from(comp.ty(i).name.as_str()))
        .collect();

    json!({
        "name": view.name(),
        "full_name": view.qualified_name(),
        "namespace": view.namespace(),
        "is_abstract": view.is_abstract(),
        "is_public": view.is_public(),
        "is_static": view.is_static(),
        "base": sym.base_class.map(|b| Value::from(comp.ty(b).name.as_str())).unwrap_or(Value::Null),
        "implements": implements,
        "attributes": attrs_json(&sym.attributes),
        "consts": consts,
        "properties": properties,
        "methods": methods,
    })
}

fn enum_json(comp: &Compilation, id: TypeId) -> Value {
    let sym = comp.ty(id);
    let values: Vec<Value> = (0..sym.enum_values.len())
        .map(|index| {
            let view = EnumValueView::new(comp, id, index);
            json!({
                "name": view.name(),
                "value": view.value(),
                "attributes": attrs_json(view.attrs()),
            })
        })
        .collect();
    json!({
        "name": sym.name.as_str(),
        "full_name": sym.qualified_name(),
        "namespace": sym.namespace.as_str(),
        "values": values,
    })
}

fn method_json(view: &MethodView<'_>, anon: &mut AnonNames) -> Value {
    let parameters: Vec<Value> = view
        .parameters()
        .into_iter()
        .map(|p| {
            json!({
                "name": p.name.as_str(),
                "type": type_json(view.comp, &p.ty, anon),
            })
        })
        .collect();
    json!({
        "name": view.name(),
        "is_abstract": view.is_abstract(),
        "is_virtual": view.is_virtual(),
        "is_override": view.is_override(),
        "is_new": view.is_new(),
        "is_public": view.is_public(),
        "is_static": view.is_static(),
        "is_overload": view.is_overload(),
        "attributes": attrs_json(view.attrs()),
        "parameters": parameters,
        "returns": type_json(view.comp, &view.returns(), anon),
    })
}

fn property_json(view: &PropertyView<'_>, anon: &mut AnonNames) -> Value {
    json!({
        "name": view.name(),
        "is_abstract": view.is_abstract(),
        "is_virtual": view.is_virtual(),
        "is_override": view.is_override(),
        "is_public": view.is_public(),
        "attributes": attrs_json(view.attrs()),
        "type": type_json(view.comp, &view.ty(), anon),
    })
}

fn field_json(view: &FieldView<'_>, anon: &mut AnonNames) -> Value {
    json!({
        "name": view.name(),
        "value": view.value().map(Value::from).unwrap_or(Value::Null),
        "attributes": attrs_json(view.attrs()),
        "type": type_json(view.comp, &view.ty(), anon),
    })
}

fn attrs_json(attrs: &[AttrSym]) -> Vec<Value> {
    attrs
        .iter()
        .map(|a| {
            let view = AttributeView::new(a);
            let named: Map<String, Value> = view
                .named()
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect();
            json!({
                "name": view.name(),
                "value": view.value().cloned().unwrap_or(Value::Null),
                "values": view.positional(),
                "named": named,
            })
        })
        .collect()
}

/// Shallow type entry. Anonymous shapes include their properties one level
/// deep; named types only identifying info.
pub fn type_json(comp: &Compilation, ty: &Ty, anon: &mut AnonNames) -> Value {
    let mut object = Map::new();
    object.insert("name".into(), Value::from(ty.name(anon).as_str()));
    object.insert("is_nullable".into(), Value::from(ty.is_nullable()));
    object.insert("is_enum".into(), Value::from(ty.is_enum(comp)));
    object.insert("is_anonymous".into(), Value::from(ty.is_anonymous()));
    object.insert("is_complex".into(), Value::from(ty.is_complex(comp)));
    object.insert("is_generic".into(), Value::from(ty.is_generic()));
    object.insert("kind".into(), Value::from(ty.kind(comp)));

    match ty {
        Ty::Named {
            id,
            args,
            is_array,
            ..
        } => {
            object.insert("is_array".into(), Value::from(*is_array));
            let full_name = id
                .map(|id| comp.ty(id).qualified_name())
                .unwrap_or_else(|| ty.name(anon).to_string());
            object.insert("full_name".into(), Value::from(full_name));
            let args: Vec<Value> = args.iter().map(|a| type_json(comp, a, anon)).collect();
            object.insert("arguments".into(), Value::Array(args));
            if let Some(id) = id {
                if comp.ty(*id).is_enum() {
                    let values: Vec<Value> = comp
                        .ty(*id)
                        .enum_values
                        .iter()
                        .map(|v| json!({ "name": v.name.as_str(), "value": v.value }))
                        .collect();
                    object.insert("enum_values".into(), Value::Array(values));
                }
            }
        }
        Ty::Anonymous { props, .. } => {
            let name = ty.name(anon);
            object.insert("full_name".into(), Value::from(name.as_str()));
            object.insert("is_array".into(), Value::from(false));
            let properties: Vec<Value> = props
                .iter()
                .map(|(name, prop_ty)| {
                    json!({
                        "name": name.as_str(),
                        "type": {
                            "name": prop_ty.name(anon).as_str(),
                            "is_nullable": prop_ty.is_nullable(),
                            "is_complex": prop_ty.is_complex(comp),
                            "is_enum": prop_ty.is_enum(comp),
                        },
                    })
                })
                .collect();
            object.insert("properties".into(), Value::Array(properties));
        }
    }
    Value::Object(object)
}
