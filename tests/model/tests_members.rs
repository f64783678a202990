//! Flattened member views across the inheritance chain.

use crate::helpers::{
    self, compile_one, flattened_method_names, flattened_property_names, source_fixtures,
};
use regen::model::{AnonNames, ModelSymbol, TypeView};

#[test]
fn members_are_emitted_base_first() {
    let comp = compile_one(source_fixtures::INHERITANCE_CHAIN);
    let names = flattened_method_names(&comp, "Customer");
    // Label comes from Entity, Key is overridden in Customer, Email is own.
    assert_eq!(names, vec!["Label", "Key", "Email"]);
}

#[test]
fn overridden_member_appears_once_at_most_derived_site() {
    let comp = compile_one(source_fixtures::INHERITANCE_CHAIN);
    let names = flattened_method_names(&comp, "VipCustomer");
    let keys = names.iter().filter(|n| *n == "Key").count();
    assert_eq!(keys, 1);

    let vip = helpers::type_named(&comp, "VipCustomer");
    let view = TypeView::new(&comp, vip);
    let key = view
        .methods()
        .find(|m| m.name() == "Key")
        .expect("Key must survive flattening");
    assert_eq!(comp.member(key.id).owner, vip);
}

#[test]
fn new_modifier_hides_without_suppressing() {
    let comp = compile_one(source_fixtures::INHERITANCE_CHAIN);
    let names = flattened_method_names(&comp, "VipCustomer");
    // `new` carries no override link, so both declarations survive.
    let labels = names.iter().filter(|n| *n == "Label").count();
    assert_eq!(labels, 2);
}

#[test]
fn override_of_a_same_arity_overload_suppresses_the_matching_sibling() {
    let comp = compile_one(
        r#"
namespace Shop
{
    public class Widget
    {
        public virtual void Render(int depth) { }
        public virtual void Render(string format) { }
    }

    public class FancyWidget : Widget
    {
        public override void Render(string format) { }
    }
}
"#,
    );
    let widget = helpers::type_named(&comp, "Widget");
    let fancy = helpers::type_named(&comp, "FancyWidget");
    let view = TypeView::new(&comp, fancy);
    let renders: Vec<_> = view.methods().filter(|m| m.name() == "Render").collect();
    assert_eq!(renders.len(), 2);

    let mut anon = AnonNames::new();
    let surviving_base = renders
        .iter()
        .find(|m| comp.member(m.id).owner == widget)
        .expect("the non-overridden overload must survive at its base site");
    assert_eq!(surviving_base.parameters()[0].ty.name(&mut anon), "int");

    let most_derived = renders
        .iter()
        .find(|m| comp.member(m.id).owner == fancy)
        .expect("the override must survive at its most-derived site");
    assert_eq!(most_derived.parameters()[0].ty.name(&mut anon), "string");
}

#[test]
fn interface_reimplementations_are_not_deduplicated() {
    let comp = compile_one(
        r#"
namespace Shop
{
    public interface IAuditable
    {
        void Audit();
    }

    public class Ledger : IAuditable
    {
        public void Audit() { }
    }

    public class SignedLedger : Ledger, IAuditable
    {
        public void Audit() { }
    }
}
"#,
    );
    // Neither declaration carries an override link, so neither suppresses
    // the other.
    let names = flattened_method_names(&comp, "SignedLedger");
    assert_eq!(names.iter().filter(|n| *n == "Audit").count(), 2);
}

#[test]
fn non_public_members_are_excluded() {
    let comp = compile_one(source_fixtures::INHERITANCE_CHAIN);
    let names = flattened_method_names(&comp, "Customer");
    assert!(!names.contains(&"Secret".to_string()));
}

#[test]
fn static_properties_are_excluded_but_static_methods_kept() {
    let comp = compile_one(source_fixtures::PROPERTIES_AND_STATICS);
    let properties = flattened_property_names(&comp, "Derived");
    assert_eq!(properties, vec!["Plain", "Count"]);

    let methods = flattened_method_names(&comp, "Derived");
    assert!(methods.contains(&"Version".to_string()));
}

#[test]
fn property_override_is_suppressed_like_methods() {
    let comp = compile_one(source_fixtures::PROPERTIES_AND_STATICS);
    let properties = flattened_property_names(&comp, "Derived");
    assert_eq!(properties.iter().filter(|n| *n == "Count").count(), 1);
}

#[test]
fn interface_members_are_implicitly_public() {
    let comp = compile_one(source_fixtures::INTERFACES);
    let names = flattened_method_names(&comp, "IRepository");
    assert_eq!(names, vec!["Save"]);
}

#[test]
fn class_implements_transitively_inherited_interfaces() {
    let comp = compile_one(source_fixtures::INTERFACES);
    let store = helpers::type_named(&comp, "Store");
    let view = TypeView::new(&comp, store);
    assert!(view.implements("IAuditable"));
    assert!(view.implements("IRepository"));
    assert!(view.directly_implements("IAuditable"));
    assert!(!view.directly_implements("IRepository"));
}

#[test]
fn flattening_is_deterministic() {
    let comp = compile_one(source_fixtures::INHERITANCE_CHAIN);
    let first = flattened_method_names(&comp, "VipCustomer");
    let second = flattened_method_names(&comp, "VipCustomer");
    assert_eq!(first, second);
}
