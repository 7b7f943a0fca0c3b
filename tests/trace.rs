use heapscope::model::{Trace, VarKind, VarValue};
use std::io::Write;

const LIST_TRACE: &str = r#"{
  "steps": [
    {
      "globals": [
        {"name": "count", "kind": "scalar", "type": "int", "value": "2"}
      ],
      "stack": [
        {
          "frame_id": 1,
          "func_name": "main(int, char**)",
          "is_highlighted": true,
          "unique_hash": "main_1",
          "ordered_varnames": ["head", "n"],
          "locals": {
            "n": {"kind": "scalar", "type": "int", "value": "2"},
            "head": {"kind": "pointer", "type": "node*", "value": 4096}
          }
        }
      ],
      "heap": [
        {
          "kind": "tree-node",
          "type": "node",
          "address": 4096,
          "value": {
            "val": {"kind": "scalar", "type": "int", "value": "1"},
            "next": {"kind": "pointer", "type": "node*", "value": 8192}
          }
        },
        {
          "kind": "tree-node",
          "type": "node",
          "address": 8192,
          "value": {
            "val": {"kind": "scalar", "type": "int", "value": "2"},
            "next": {"kind": "pointer", "type": "node*", "value": null}
          }
        }
      ]
    }
  ]
}"#;

#[test]
fn loads_and_normalizes_a_trace() {
    let trace = Trace::from_json_str(LIST_TRACE).expect("valid trace");
    assert_eq!(trace.steps.len(), 1);
    let step = &trace.steps[0];

    assert_eq!(step.globals[0].identity, "global/count");

    let main = step.current_frame().expect("a frame");
    assert_eq!(main.unique_hash, "main_1");
    let names: Vec<&str> = main.local_variables().iter().map(|v| v.name.as_str()).collect();
    assert_eq!(names, vec!["head", "n"]);
    let head = &main.locals["head"];
    assert_eq!(head.kind(), VarKind::Pointer);
    assert_eq!(head.identity, "main_1/head");
    assert_eq!(head.value_string(), "0x00001000");

    let first = &step.heap[0];
    assert_eq!(first.kind(), VarKind::TreeNode);
    assert_eq!(first.identity, "heap@0x1000");
    assert_eq!(first.pointer_targets(), vec![8192]);
    let VarValue::Tree(fields) = &first.value else {
        panic!("expected tree node");
    };
    assert_eq!(fields["next"].name, "next");
    assert_eq!(fields["next"].identity, "heap@0x1000.next");
    assert_eq!(step.heap[1].pointer_targets(), Vec::<u64>::new());
}

#[test]
fn load_reads_from_disk() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(LIST_TRACE.as_bytes()).expect("write");
    let path = camino::Utf8Path::from_path(file.path()).expect("utf-8 temp path");
    let trace = Trace::load(path).expect("load");
    assert_eq!(trace.steps[0].heap.len(), 2);
}

#[test]
fn missing_file_is_an_error() {
    let err = Trace::load("/definitely/not/here.json").unwrap_err();
    assert!(format!("{:#}", err).contains("Failed to read"));
}

fn single_step(step: &str) -> String {
    format!(r#"{{"steps": [{}]}}"#, step)
}

#[test]
fn kind_and_value_must_agree() {
    let doc = single_step(
        r#"{"globals": [{"name": "s", "kind": "struct", "type": "struct s", "value": "5"}]}"#,
    );
    assert!(Trace::from_json_str(&doc).is_err());
}

#[test]
fn unknown_kind_is_rejected() {
    let doc = single_step(
        r#"{"globals": [{"name": "s", "kind": "union", "type": "union u", "value": "5"}]}"#,
    );
    assert!(Trace::from_json_str(&doc).is_err());
}

#[test]
fn ragged_matrix_is_rejected() {
    let doc = single_step(
        r#"{"globals": [{"name": "m", "kind": "multi-dim-array", "type": "int[2][2]", "value": [
            [{"kind": "scalar", "type": "int", "value": "1"}, {"kind": "scalar", "type": "int", "value": "2"}],
            [{"kind": "scalar", "type": "int", "value": "3"}]
        ]}]}"#,
    );
    let err = Trace::from_json_str(&doc).unwrap_err();
    assert!(format!("{:#}", err).contains("ragged matrix"));
}

#[test]
fn heap_values_need_an_address() {
    let doc = single_step(r#"{"heap": [{"kind": "scalar", "type": "int", "value": "1"}]}"#);
    let err = Trace::from_json_str(&doc).unwrap_err();
    assert!(format!("{:#}", err).contains("has no address"));
}

#[test]
fn heap_addresses_are_unique() {
    let doc = single_step(
        r#"{"heap": [
            {"kind": "scalar", "type": "int", "value": "1", "address": 16},
            {"kind": "scalar", "type": "int", "value": "2", "address": 16}
        ]}"#,
    );
    let err = Trace::from_json_str(&doc).unwrap_err();
    assert!(format!("{:#}", err).contains("0x10"));
}

#[test]
fn ordered_names_need_a_local() {
    let doc = single_step(
        r#"{"stack": [{"func_name": "f()", "unique_hash": "f_1", "ordered_varnames": ["x"], "locals": {}}]}"#,
    );
    let err = Trace::from_json_str(&doc).unwrap_err();
    assert!(format!("{:#}", err).contains("'x'"));
}

#[test]
fn frame_hashes_are_unique_within_a_step() {
    let doc = single_step(
        r#"{"stack": [
            {"func_name": "f()", "unique_hash": "f_1"},
            {"func_name": "g()", "unique_hash": "f_1"}
        ]}"#,
    );
    assert!(Trace::from_json_str(&doc).is_err());
}

#[test]
fn empty_step_is_valid() {
    let trace = Trace::from_json_str(&single_step("{}")).expect("empty step");
    assert!(trace.steps[0].globals.is_empty());
    assert!(trace.steps[0].current_frame().is_none());
}

#[test]
fn encoded_locals_alias_and_default_order() {
    let doc = single_step(
        r#"{"stack": [{"func_name": "f()", "unique_hash": "f_1", "encoded_locals": {
            "b": {"kind": "scalar", "type": "int", "value": "1"},
            "a": {"kind": "scalar", "type": "int", "value": "2"}
        }}]}"#,
    );
    let trace = Trace::from_json_str(&doc).expect("valid");
    let frame = &trace.steps[0].stack[0];
    assert_eq!(frame.ordered_varnames, vec!["b", "a"]);
    assert_eq!(frame.locals["a"].name, "a");
}
