use heapscope::config::Sizing;
use heapscope::dimensions::{dimensions_of, matrix_cell_size};
use heapscope::model::{VarValue, Variable};
use indexmap::IndexMap;
use proptest::prelude::*;

fn int(name: &str, value: &str) -> Variable {
    Variable::scalar(name, "int", value)
}

fn fields(vars: Vec<Variable>) -> IndexMap<String, Variable> {
    vars.into_iter().map(|v| (v.name.clone(), v)).collect()
}

#[test]
fn scalar_width_from_longest_text() {
    let s = Sizing::default();
    // "int" + "x" + 2 = 6 chars beats value "1" (3.25) and the floor (5)
    let d = dimensions_of(&int("x", "1"), &s);
    assert_eq!(d.width, 6.0 * 10.0 + 7.0);
    assert_eq!(d.height, s.base_height);
    assert_eq!(d.center_offset, 20.0 + 15.0);

    // value "1234567890" -> 10 * 1.25 + 2 = 14.5 chars
    let d = dimensions_of(&int("x", "1234567890"), &s);
    assert_eq!(d.width, 14.5 * 10.0 + 7.0);

    // everything short: floored at min_width
    let d = dimensions_of(&Variable::scalar("", "", ""), &s);
    assert_eq!(d.width, 5.0 * 10.0 + 7.0);
}

#[test]
fn pointer_width_ignores_target() {
    let s = Sizing::default();
    let null = dimensions_of(&Variable::pointer("next", "node*", None), &s);
    let set = dimensions_of(&Variable::pointer("next", "node*", Some(0xdead_beef)), &s);
    assert_eq!(null, set);
    assert_eq!(null.width, 11.0 * 10.0 + 7.0);
    assert_eq!(null.height, s.base_height);
}

#[test]
fn struct_with_two_fields_is_150_high() {
    let s = Sizing::default();
    let node = Variable::new(
        "n",
        "struct node",
        VarValue::Struct(fields(vec![
            int("a", "4"),
            Variable::pointer("next", "node*", None),
        ])),
    );
    let d = dimensions_of(&node, &s);
    assert_eq!(d.height, 20.0 + (50.0 + 15.0) + (50.0 + 15.0));
    assert_eq!(d.height, 150.0);
    // widest field is `next` (117) plus insets; title "struct node" + "n" is 14 chars = 147
    assert_eq!(d.width, 147.0f32.max(117.0 + 14.0));
    assert_eq!(d.center_offset, 20.0 + (150.0 - 20.0) / 2.0);
}

#[test]
fn removing_a_field_removes_its_contribution() {
    let s = Sizing::default();
    let inner = Variable::new(
        "p",
        "struct point",
        VarValue::Struct(fields(vec![int("x", "1"), int("y", "2")])),
    );
    let full = Variable::new(
        "o",
        "struct outer",
        VarValue::Struct(fields(vec![int("a", "1"), inner.clone(), int("b", "2")])),
    );
    let without_inner = Variable::new(
        "o",
        "struct outer",
        VarValue::Struct(fields(vec![int("a", "1"), int("b", "2")])),
    );
    let full_h = dimensions_of(&full, &s).height;
    let inner_h = dimensions_of(&inner, &s).height;
    assert_eq!(
        full_h - dimensions_of(&without_inner, &s).height,
        inner_h + s.space_between
    );
}

#[test]
fn empty_collections_are_finite() {
    let s = Sizing::default();
    let arr = Variable::new("arr", "struct point[0]", VarValue::StructArray(vec![]));
    let d = dimensions_of(&arr, &s);
    assert_eq!(d.width, 2.0 * s.inset);
    assert_eq!(d.height, s.title_height + s.space_between);

    let empty_struct = Variable::new("e", "struct empty", VarValue::Struct(IndexMap::new()));
    let d = dimensions_of(&empty_struct, &s);
    assert_eq!(d.height, s.title_height);
    assert!(d.width.is_finite() && d.width > 0.0);

    let empty_tree = Variable::new("t", "node", VarValue::Tree(IndexMap::new()));
    let d = dimensions_of(&empty_tree, &s);
    assert_eq!(d.height, s.title_height + s.space_between);

    let empty_matrix = Variable::new("m", "int[0][0]", VarValue::Matrix(vec![]));
    let d = dimensions_of(&empty_matrix, &s);
    assert_eq!(d.width, 0.0);
    assert_eq!(d.height, s.title_height + s.space_between);
}

#[test]
fn struct_array_lays_fields_side_by_side() {
    let s = Sizing::default();
    let arr = Variable::new(
        "xs",
        "int[3]",
        VarValue::StructArray(vec![int("0", "1"), int("1", "2"), int("2", "3")]),
    );
    let d = dimensions_of(&arr, &s);
    let cell = dimensions_of(&int("0", "1"), &s);
    assert_eq!(d.width, 3.0 * cell.width + 2.0 * s.array_space_between + 2.0 * s.inset);
    assert_eq!(d.height, s.title_height + s.space_between + cell.height);
}

#[test]
fn tree_node_puts_pointers_in_a_row() {
    let s = Sizing::default();
    let left = Variable::pointer("left", "tree*", Some(0x10));
    let right = Variable::pointer("right", "tree*", None);
    let node = Variable::new(
        "t",
        "tree",
        VarValue::Tree(fields(vec![int("key", "7"), left.clone(), right.clone()])),
    );
    let d = dimensions_of(&node, &s);
    let key = dimensions_of(&int("key", "7"), &s);
    let l = dimensions_of(&left, &s);
    let r = dimensions_of(&right, &s);
    assert_eq!(
        d.height,
        s.title_height + key.height + s.space_between + l.height + s.space_between
    );
    let row = l.width + r.width + s.array_space_between;
    assert_eq!(d.width, row.max(key.width) + 2.0 * s.inset);
}

#[test]
fn matrix_uses_largest_cell() {
    let s = Sizing::default();
    let rows = vec![
        vec![int("[0][0]", "1"), int("[0][1]", "123456789012")],
        vec![int("[1][0]", "3"), int("[1][1]", "4")],
    ];
    let (cw, ch) = matrix_cell_size(&rows, &s);
    assert_eq!(cw, dimensions_of(&rows[0][1], &s).width);
    assert_eq!(ch, s.base_height);

    let m = Variable::new("m", "int[2][2]", VarValue::Matrix(rows));
    let d = dimensions_of(&m, &s);
    assert_eq!(d.width, 2.0 * cw);
    assert_eq!(d.height, 2.0 * ch + s.title_height + s.space_between);
}

proptest! {
    #[test]
    fn scalar_width_is_monotonic(
        ty in "[a-z]{0,12}",
        name in "[a-z]{0,12}",
        value in "[0-9]{0,20}",
        extra in "[a-z0-9]{1,4}",
    ) {
        let s = Sizing::default();
        let chars = |t: &str, n: &str, v: &str| {
            ((t.len() + n.len() + 2) as f32)
                .max(v.len() as f32 * s.value_char_scale + 2.0)
                .max(s.min_width)
        };
        let base = dimensions_of(&Variable::scalar(&name, &ty, &value), &s).width;
        let grown = [
            (format!("{ty}{extra}"), name.clone(), value.clone()),
            (ty.clone(), format!("{name}{extra}"), value.clone()),
            (ty.clone(), name.clone(), format!("{value}{extra}")),
        ];
        for (t, n, v) in grown {
            let w = dimensions_of(&Variable::scalar(&n, &t, &v), &s).width;
            prop_assert!(w >= base);
            if chars(&t, &n, &v) > chars(&ty, &name, &value) {
                prop_assert!(w > base);
            } else {
                prop_assert_eq!(w, base);
            }
        }
    }
}
