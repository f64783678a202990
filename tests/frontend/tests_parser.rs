//! Parser coverage for the managed source language.

use regen::frontend::ast::{Body, MemberDecl, Stmt, TypeKind};
use regen::frontend::parse;
use rstest::rstest;

#[test]
fn parses_block_namespace_with_class() {
    let parse = parse(
        r#"
namespace Shop.Billing
{
    public class Invoice { }
}
"#,
    );
    assert!(parse.errors.is_empty());
    assert_eq!(parse.file.namespaces.len(), 1);
    let ns = &parse.file.namespaces[0];
    assert_eq!(ns.name, "Shop.Billing");
    assert_eq!(ns.types[0].name, "Invoice");
    assert_eq!(ns.types[0].kind, TypeKind::Class);
    assert!(ns.types[0].modifiers.is_public);
}

#[test]
fn parses_file_scoped_namespace() {
    let parse = parse(crate::helpers::source_fixtures::FILE_SCOPED_NAMESPACE);
    assert!(parse.errors.is_empty());
    assert_eq!(parse.file.namespaces[0].name, "Billing.Core");
    assert_eq!(parse.file.namespaces[0].types[0].name, "Invoice");
}

#[rstest]
#[case("class", TypeKind::Class)]
#[case("struct", TypeKind::Class)]
#[case("record", TypeKind::Class)]
#[case("interface", TypeKind::Interface)]
#[case("enum", TypeKind::Enum)]
fn type_keywords_map_to_kinds(#[case] keyword: &str, #[case] kind: TypeKind) {
    let text = format!("public {keyword} Thing {{ }}");
    let parse = parse(&text);
    assert_eq!(parse.file.types[0].kind, kind);
}

#[test]
fn parses_methods_properties_and_fields() {
    let parse = parse(
        r#"
public class Widget
{
    private int count = 3;

    public string Name { get; set; }

    public int Count() { return count; }
}
"#,
    );
    assert!(parse.errors.is_empty());
    let members = &parse.file.types[0].members;
    assert_eq!(members.len(), 3);

    let MemberDecl::Field(field) = &members[0] else {
        panic!("expected field");
    };
    assert_eq!(field.name, "count");
    assert_eq!(field.value.as_deref(), Some("3"));

    let MemberDecl::Property(prop) = &members[1] else {
        panic!("expected property");
    };
    assert_eq!(prop.name, "Name");
    assert_eq!(prop.ty.name, "string");

    let MemberDecl::Method(method) = &members[2] else {
        panic!("expected method");
    };
    assert_eq!(method.name, "Count");
    assert_eq!(method.return_type.name, "int");
}

#[test]
fn parses_nullable_generic_and_array_types() {
    let parse = parse(
        r#"
public class Api
{
    public Task<List<int>?> Batch(string[] names, Customer? who) { return null; }
}
"#,
    );
    assert!(parse.errors.is_empty());
    let MemberDecl::Method(method) = &parse.file.types[0].members[0] else {
        panic!("expected method");
    };
    assert_eq!(method.return_type.name, "Task");
    let list = &method.return_type.args[0];
    assert_eq!(list.name, "List");
    assert!(list.nullable);
    assert_eq!(list.args[0].name, "int");

    assert_eq!(method.params.len(), 2);
    assert!(method.params[0].ty.is_array);
    assert!(method.params[1].ty.nullable);
}

#[test]
fn parses_attributes_with_arguments() {
    let parse = parse(
        r#"
[Route("api/orders", Name = "orders")]
[Tags(new[] { "a", "b" })]
public class Orders { }
"#,
    );
    assert!(parse.errors.is_empty());
    let attrs = &parse.file.types[0].attributes;
    assert_eq!(attrs.len(), 2);
    assert_eq!(attrs[0].name, "Route");
    assert_eq!(attrs[0].positional.len(), 1);
    assert_eq!(attrs[0].named[0].0, "Name");
    assert_eq!(attrs[1].name, "Tags");
}

#[test]
fn parses_modifier_combinations() {
    let parse = parse(
        r#"
public abstract class Base
{
    public static readonly int Limit = 10;
    protected virtual void Touch() { }
    public abstract string Render();
}
"#,
    );
    assert!(parse.errors.is_empty());
    let decl = &parse.file.types[0];
    assert!(decl.modifiers.is_abstract);

    let MemberDecl::Field(field) = &decl.members[0] else {
        panic!("expected field");
    };
    assert!(field.modifiers.is_static && field.modifiers.is_readonly);

    let MemberDecl::Method(touch) = &decl.members[1] else {
        panic!("expected method");
    };
    assert!(touch.modifiers.is_protected && touch.modifiers.is_virtual);

    let MemberDecl::Method(render) = &decl.members[2] else {
        panic!("expected method");
    };
    assert!(render.modifiers.is_abstract);
    assert!(render.body.is_none());
}

#[test]
fn parses_expression_bodied_members() {
    let parse = parse(
        r#"
public class Invoice
{
    public string Render() => "invoice";
    public decimal Total => 10m;
}
"#,
    );
    let MemberDecl::Method(method) = &parse.file.types[0].members[0] else {
        panic!("expected method");
    };
    assert!(matches!(method.body, Some(Body::Expr(_))));

    let MemberDecl::Property(prop) = &parse.file.types[0].members[1] else {
        panic!("expected property");
    };
    assert_eq!(prop.name, "Total");
}

#[test]
fn parses_enum_values_with_explicit_constants() {
    let parse = parse(
        r#"
public enum Status
{
    Open,
    Held = 5,
    Closed,
}
"#,
    );
    let values = &parse.file.types[0].enum_values;
    assert_eq!(values.len(), 3);
    assert_eq!(values[0].value, None);
    assert_eq!(values[1].value, Some(5));
    assert_eq!(values[2].value, None);
}

#[test]
fn lambda_bodies_produce_no_return_statements() {
    let parse = parse(
        r#"
public class Handler
{
    public object Go()
    {
        var f = (int x) => { return x; };
        Run(() => { return 1; });
    }
}
"#,
    );
    let MemberDecl::Method(method) = &parse.file.types[0].members[0] else {
        panic!("expected method");
    };
    let Some(Body::Block(block)) = &method.body else {
        panic!("expected block body");
    };
    assert!(count_returns(block) == 0);
}

fn count_returns(block: &regen::frontend::ast::Block) -> usize {
    block
        .statements
        .iter()
        .map(|s| match s {
            Stmt::Return(_) => 1,
            Stmt::Block(inner) => count_returns(inner),
            _ => 0,
        })
        .sum()
}

#[test]
fn control_flow_bodies_are_scanned_for_returns() {
    let parse = parse(
        r#"
public class Handler
{
    public object Go(bool flag)
    {
        if (flag)
            return 1;
        while (flag)
        {
            return 2;
        }
        return null;
    }
}
"#,
    );
    let MemberDecl::Method(method) = &parse.file.types[0].members[0] else {
        panic!("expected method");
    };
    let Some(Body::Block(block)) = &method.body else {
        panic!("expected block body");
    };
    assert_eq!(count_returns(block), 3);
}

#[test]
fn malformed_declarations_still_yield_following_types() {
    let parse = parse(
        r#"
public class Broken {
    public int Bad(( { }
}

public class Fine { }
"#,
    );
    assert!(!parse.errors.is_empty());
    let names: Vec<&str> = parse.file.types.iter().map(|t| t.name.as_str()).collect();
    assert!(names.contains(&"Fine"));
}

#[test]
fn usings_are_collected() {
    let parse = parse(
        r#"
using System;
using System.Collections.Generic;

public class A { }
"#,
    );
    assert_eq!(parse.file.usings.len(), 2);
    assert_eq!(parse.file.usings[1], "System.Collections.Generic");
}
