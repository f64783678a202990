//! Recovery of concrete return shapes from erased signatures.

use crate::helpers::{self, compile_one, method_named, source_fixtures};
use regen::model::{infer, AnonNames, Ty};

fn returns(comp: &regen::model::Compilation, owner: &str, method: &str) -> Ty {
    let ty = helpers::type_named(comp, owner);
    infer::method_return_type(comp, method_named(comp, ty, method))
}

#[test]
fn object_return_recovers_constructed_type() {
    let comp = compile_one(source_fixtures::SHAPE_RECOVERY);
    let ty = returns(&comp, "Handler", "Find");
    let mut anon = AnonNames::new();
    assert_eq!(ty.name(&mut anon), "Customer");
    assert!(!ty.is_nullable());
}

#[test]
fn nullability_comes_from_the_declared_signature() {
    let comp = compile_one(source_fixtures::SHAPE_RECOVERY);
    let ty = returns(&comp, "Handler", "FindMaybe");
    let mut anon = AnonNames::new();
    assert_eq!(ty.name(&mut anon), "Customer");
    assert!(ty.is_nullable());
}

#[test]
fn task_wrapper_is_treated_as_erased() {
    let comp = compile_one(source_fixtures::SHAPE_RECOVERY);
    let ty = returns(&comp, "AsyncHandler", "FindAsync");
    let mut anon = AnonNames::new();
    assert_eq!(ty.name(&mut anon), "Customer");
}

#[test]
fn erased_parameter_flow_keeps_the_declared_type() {
    let comp = compile_one(source_fixtures::SHAPE_RECOVERY);
    let ty = returns(&comp, "Handler", "Opaque");
    let mut anon = AnonNames::new();
    // `return input;` where input is object stays opaque.
    assert_eq!(ty.name(&mut anon), "object");
}

#[test]
fn typed_local_binding_is_recovered() {
    let comp = compile_one(source_fixtures::SHAPE_RECOVERY);
    let mut anon = AnonNames::new();
    assert_eq!(returns(&comp, "Handler", "FromLocal").name(&mut anon), "Customer");
    assert_eq!(returns(&comp, "Handler", "FromVar").name(&mut anon), "Customer");
}

#[test]
fn anonymous_object_yields_shaped_type() {
    let comp = compile_one(source_fixtures::SHAPE_RECOVERY);
    let ty = returns(&comp, "Handler", "Shaped");
    assert!(ty.is_anonymous());
    let Ty::Anonymous { props, .. } = &ty else {
        panic!("expected anonymous shape");
    };
    let names: Vec<&str> = props.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["Id", "Name"]);
}

#[test]
fn returns_inside_lambdas_are_invisible() {
    let comp = compile_one(source_fixtures::SHAPE_RECOVERY);
    let ty = returns(&comp, "Handler", "LambdaOnly");
    let mut anon = AnonNames::new();
    // The only `return 42` lives inside the lambda body.
    assert_eq!(ty.name(&mut anon), "object");
}

#[test]
fn first_concrete_return_wins() {
    let comp = compile_one(
        r#"
namespace Api
{
    public class Customer { }

    public class Handler
    {
        public object Pick(bool flag)
        {
            if (flag)
            {
                return new Customer();
            }
            return 42;
        }
    }
}
"#,
    );
    let ty = returns(&comp, "Handler", "Pick");
    let mut anon = AnonNames::new();
    assert_eq!(ty.name(&mut anon), "Customer");
}

#[test]
fn declared_concrete_type_is_never_replaced() {
    let comp = compile_one(
        r#"
public class Handler
{
    public string Name() { return "x"; }
}
"#,
    );
    let ty = returns(&comp, "Handler", "Name");
    let mut anon = AnonNames::new();
    assert_eq!(ty.name(&mut anon), "string");
}
