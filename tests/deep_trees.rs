use jsonnet_codec::api::{format, manifest_value, parse};
use serde_json::Value;
use std::thread;

const CHAIN_TERMS: usize = 10_000;

fn sum_chain(terms: usize) -> String {
    vec!["1"; terms].join(" + ")
}

fn on_thread(stack_size: usize, f: impl FnOnce() + Send + 'static) {
    thread::Builder::new()
        .stack_size(stack_size)
        .spawn(f)
        .unwrap()
        .join()
        .unwrap();
}

/// serde_json drops documents recursively; unwind the operator chain first.
fn unwind(mut document: Value) {
    while let Some(left) = document.get_mut("left").map(Value::take) {
        document = left;
    }
}

#[test]
fn test_format_long_operator_chain() {
    let source = sum_chain(CHAIN_TERMS);
    let formatted = format(&source).unwrap();
    assert_eq!(formatted, format!("{source}\n"));
}

#[test]
fn test_long_operator_chain_through_the_document() {
    let source = sum_chain(CHAIN_TERMS);
    let document = parse(&source).unwrap();

    let mut depth = 0;
    let mut node = &document;
    while node["__kind__"] == "Binary" {
        depth += 1;
        node = &node["left"];
    }
    assert_eq!(depth, CHAIN_TERMS - 1);

    let manifested = manifest_value(&document).unwrap();
    assert_eq!(manifested, format!("{source}\n"));
    unwind(document);
}

#[test]
fn test_nested_source_on_a_small_stack() {
    on_thread(2 * 1024 * 1024, || {
        let arrays = format!("{}1{}", "[".repeat(64), "]".repeat(64));
        assert_eq!(format(&arrays).unwrap(), format!("{arrays}\n"));

        let parens = format!("{}1{}", "(".repeat(64), ")".repeat(64));
        assert_eq!(format(&parens).unwrap(), "(1)\n");

        let document = parse(&arrays).unwrap();
        assert_eq!(manifest_value(&document).unwrap(), format!("{arrays}\n"));
    });
}
