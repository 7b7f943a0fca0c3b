use heapscope::geometry::{Dimensions, Vec2f};
use heapscope::layout::{LaidOutNode, NodeRef, SizedNode};
use heapscope::registry::{ArrowOwner, RenderRegistry};

fn var_at(identity: &str, addr: u64, x: f32, y: f32) -> LaidOutNode {
    SizedNode::new(
        Dimensions::new(100.0, 50.0, 20.0),
        NodeRef::Variable {
            identity: identity.to_string(),
            name: identity.to_string(),
            type_name: "int".to_string(),
            address: Some(addr),
        },
    )
    .place(x, y)
}

fn frame_at(hash: &str, x: f32, y: f32) -> LaidOutNode {
    SizedNode::new(
        Dimensions::new(120.0, 40.0, 30.0),
        NodeRef::Frame {
            unique_hash: hash.to_string(),
            frame_id: 1,
            label: "main (1)".to_string(),
        },
    )
    .place(x, y)
}

#[test]
fn first_identity_wins_within_a_pass() {
    let mut reg = RenderRegistry::new();
    reg.begin_pass();
    let x = var_at("X", 0x1000, 0.0, 0.0);
    let y = var_at("Y", 0x1000, 200.0, 0.0);
    reg.register(&[x.clone()]);
    reg.register(&[y.clone()]);
    let entry = reg.lookup_by_address(0x1000).expect("registered");
    assert_eq!(entry.identity(), "X");
    assert_eq!(entry.node, x);

    // A new pass lets Y take over the address.
    reg.begin_pass();
    reg.register(&[y.clone()]);
    assert_eq!(reg.lookup_by_address(0x1000).map(|e| e.identity()), Some("Y"));
}

#[test]
fn clear_releases_every_address() {
    let mut reg = RenderRegistry::new();
    reg.register(&[var_at("X", 0x1000, 0.0, 0.0)]);
    reg.clear();
    assert!(reg.is_empty());
    reg.register(&[var_at("Y", 0x1000, 5.0, 5.0)]);
    assert_eq!(reg.lookup_by_address(0x1000).map(|e| e.identity()), Some("Y"));
}

#[test]
fn same_identity_updates_its_position() {
    let mut reg = RenderRegistry::new();
    reg.register(&[var_at("X", 0x1000, 0.0, 0.0)]);
    reg.register(&[var_at("X", 0x1000, 30.0, 40.0)]);
    let entry = reg.lookup_by_address(0x1000).expect("registered");
    assert_eq!((entry.node.x, entry.node.y), (30.0, 40.0));
}

#[test]
fn unaddressed_variables_are_not_tracked() {
    let mut reg = RenderRegistry::new();
    let node = SizedNode::new(
        Dimensions::new(10.0, 10.0, 5.0),
        NodeRef::Variable {
            identity: "main/x".to_string(),
            name: "x".to_string(),
            type_name: "int".to_string(),
            address: None,
        },
    )
    .place(0.0, 0.0);
    reg.register(&[node]);
    assert!(reg.is_empty());
}

#[test]
fn frames_are_keyed_by_hash() {
    let mut reg = RenderRegistry::new();
    reg.register(&[frame_at("main_1", 10.0, 40.0), frame_at("f_2", 10.0, 95.0)]);
    assert_eq!(reg.lookup_by_frame("f_2").map(|e| e.node.y), Some(95.0));
    reg.clear_frame("f_2");
    assert!(reg.lookup_by_frame("f_2").is_none());
    assert!(reg.lookup_by_frame("main_1").is_some());
}

#[test]
fn arrows_resolve_to_the_incoming_anchor() {
    let mut reg = RenderRegistry::new();
    reg.begin_pass();
    let target = var_at("heap@0x1000", 0x1000, 300.0, 100.0);
    reg.register(&[target.clone()]);
    let owner = ArrowOwner::Frame("main_1".to_string());
    reg.register_arrow(&owner, Vec2f::new(120.0, 75.0), 0x1000);
    reg.register_arrow(&owner, Vec2f::new(120.0, 140.0), 0x9999);

    let arrows = reg.resolve_arrows();
    assert_eq!(arrows.len(), 1);
    assert_eq!(arrows[0].owner, owner);
    assert_eq!(arrows[0].from, Vec2f::new(120.0, 75.0));
    // left edge, level with the body center: 100 + 20 + (50 - 20) / 2
    assert_eq!(arrows[0].to, Vec2f::new(300.0, 135.0));
    assert_eq!(arrows[0].to, target.anchor_in());
    // the unresolved one is kept, just not drawn
    assert_eq!(reg.arrow_count(&owner), 2);
}

#[test]
fn arrows_from_earlier_passes_are_replaced() {
    let mut reg = RenderRegistry::new();
    let owner = ArrowOwner::Heap("heap@0x1000".to_string());
    reg.begin_pass();
    reg.register_arrow(&owner, Vec2f::ZERO, 0x2000);
    reg.register_arrow(&owner, Vec2f::ZERO, 0x3000);
    reg.begin_pass();
    reg.register_arrow(&owner, Vec2f::ZERO, 0x2000);
    assert_eq!(reg.arrow_count(&owner), 1);
}

#[test]
fn clear_frame_keeps_heap_arrows() {
    let mut reg = RenderRegistry::new();
    let frame = ArrowOwner::Frame("main_1".to_string());
    let heap = ArrowOwner::Heap("heap@0x1000".to_string());
    reg.register_arrow(&frame, Vec2f::ZERO, 0x1000);
    reg.register_arrow(&heap, Vec2f::ZERO, 0x2000);

    reg.clear_frame("main_1");
    assert_eq!(reg.arrow_count(&frame), 0);
    assert_eq!(reg.arrow_count(&heap), 1);

    reg.clear();
    assert_eq!(reg.arrow_count(&heap), 0);
}

#[test]
fn arrows_skip_targets_from_earlier_passes() {
    let mut reg = RenderRegistry::new();
    let owner = ArrowOwner::Frame("main_1".to_string());
    reg.begin_pass();
    reg.register(&[var_at("heap@0x1000", 0x1000, 300.0, 100.0)]);
    reg.begin_pass();
    reg.register_arrow(&owner, Vec2f::ZERO, 0x1000);
    assert!(reg.resolve_arrows().is_empty());
}

#[test]
fn prune_stale_keeps_only_the_current_pass() {
    let mut reg = RenderRegistry::new();
    let heap = ArrowOwner::Heap("heap@0x1000".to_string());
    reg.begin_pass();
    reg.register(&[var_at("A", 0x1000, 0.0, 0.0), frame_at("f_2", 0.0, 0.0)]);
    reg.register_arrow(&heap, Vec2f::ZERO, 0x2000);
    reg.begin_pass();
    reg.register(&[var_at("B", 0x2000, 0.0, 0.0), frame_at("main_1", 0.0, 0.0)]);

    assert_eq!(reg.prune_stale(), 2);
    assert!(reg.lookup_by_address(0x1000).is_none());
    assert!(reg.lookup_by_frame("f_2").is_none());
    assert!(reg.lookup_by_address(0x2000).is_some());
    assert!(reg.lookup_by_frame("main_1").is_some());
    assert_eq!(reg.arrow_count(&heap), 0);
}
