use std::sync::Arc;

use rope_api_core::config::Config;
use rope_api_core::Value;
use rope_field_core::{fields, FieldTree, Problem, Slot};

#[test]
fn it_should_keep_trees_from_one_blueprint_apart() {
    let shared = fields::int();
    let blueprint = Problem::new("<<a>> and <<b>>")
        .field("a", shared.clone())
        .field("b", shared)
        .build();
    let config = Arc::new(Config::default());

    let mut first = FieldTree::instantiate(&blueprint, config.clone()).expect("first");
    let second = FieldTree::instantiate(&blueprint, config).expect("second");

    first.set("a", Slot::Value, Some(Value::Int(7))).expect("set");
    assert_eq!(first.get("a", Slot::Value).expect("get"), Some(Value::Int(7)));
    assert_eq!(first.get("b", Slot::Value).expect("get"), None);
    assert_eq!(second.get("a", Slot::Value).expect("get"), None);

    let ids_first = first.widgets();
    let ids_second = second.widgets();
    assert_eq!(ids_first.len(), 2);
    assert_ne!(ids_first[0], ids_first[1]);
    assert!(ids_first.iter().all(|id| !ids_second.contains(id)));
    assert_ne!(first.root_id(), second.root_id());
}

#[test]
fn it_should_refuse_oversized_widget_text() {
    let blueprint = Problem::new("<<e>>").field("e", fields::expression("x")).build();
    let mut tree = FieldTree::instantiate(&blueprint, Arc::new(Config::default())).expect("tree");
    let widget = tree.widgets()[0];
    let huge = "(".repeat(10_000);
    tree.set_widget_text(widget, Some(huge)).expect("write");
    let err = tree.validation_error("e").expect("rejected");
    assert!(err.message.starts_with("Input too long"));
    assert_eq!(tree.widget_valid(widget), Some(false));
}
