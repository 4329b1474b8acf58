//! Layout behaviour across strategies.
//!
//! - Right-only siblings are stacked top to bottom in sibling order with at
//!   least one vertical spacing between neighbours.
//! - Every strategy is deterministic.
//! - No two nodes of a laid-out tree overlap, whatever the shape.

use arbor_core::{Bounds, LayoutType, Node, Side, Size};
use arbor_layout::{LayoutOptions, assign_sides, layout_tree, strategy_for};
use proptest::prelude::*;

fn bounds(node: &Node, options: &LayoutOptions) -> Bounds {
    Bounds::new(node.position, options.size_of(node.measured))
}

#[test]
fn right_only_siblings_follow_order_with_spacing() {
    let options = LayoutOptions::default();
    let root = Node::root("root").with_layout_type(LayoutType::RightOnly);
    let kids: Vec<Node> = (0..3)
        .map(|i| {
            Node::branch(format!("k{i}").as_str(), "root")
                .with_side(Side::Right)
                .with_level(1)
                .with_sibling_order(i)
                .at(400.0, f64::from(i) * 10.0)
        })
        .collect();

    let result = layout_tree(&root, &kids, &[], &options);
    let mut placed: Vec<&Node> = result.nodes.iter().filter(|n| !n.is_root()).collect();
    placed.sort_by_key(|n| n.sibling_order);

    for pair in placed.windows(2) {
        let upper = bounds(pair[0], &options);
        let lower = bounds(pair[1], &options);
        assert!(upper.top() < lower.top());
        assert!(lower.top() - upper.bottom() >= options.vertical_spacing - 1e-9);
    }
}

#[test]
fn measured_sizes_are_respected() {
    let options = LayoutOptions::default();
    let root = Node::root("root")
        .with_layout_type(LayoutType::BottomOnly)
        .with_measured(Size::new(300.0, 120.0));
    let kids = vec![
        Node::branch("wide", "root")
            .with_sibling_order(0)
            .with_measured(Size::new(500.0, 40.0)),
        Node::branch("narrow", "root").with_sibling_order(1),
    ];
    let result = layout_tree(&root, &kids, &[], &options);
    let wide = &result.nodes[1];
    let narrow = &result.nodes[2];
    assert_eq!(wide.position.y, 120.0 + options.vertical_spacing);
    assert!(narrow.position.x - (wide.position.x + 500.0) >= options.horizontal_spacing - 1e-9);
}

// ── Strategies ────────────────────────────────────────────────────────────

/// A random tree under a root: node `i` attaches to some earlier node.
fn tree_strategy() -> impl Strategy<Value = Vec<Node>> {
    prop::collection::vec(
        (
            any::<prop::sample::Index>(),
            prop::option::of(20.0f64..400.0),
            prop::option::of(10.0f64..120.0),
            -500.0f64..500.0,
        ),
        0..25,
    )
    .prop_map(|draws| {
        let mut nodes = vec![Node::root("n0")];
        for (i, (parent, width, height, y)) in draws.into_iter().enumerate() {
            let parent = nodes[parent.index(nodes.len())].id.clone();
            let mut node = Node::branch(format!("n{}", i + 1).as_str(), parent).at(0.0, y);
            if let (Some(w), Some(h)) = (width, height) {
                node = node.with_measured(Size::new(w, h));
            }
            nodes.push(node);
        }
        nodes
    })
}

fn layout_strategy() -> impl Strategy<Value = LayoutType> {
    prop::sample::select(LayoutType::ALL.to_vec())
}

proptest! {
    #[test]
    fn strategies_are_deterministic(nodes in tree_strategy(), layout in layout_strategy()) {
        let options = LayoutOptions::default();
        let (root, rest) = nodes.split_first().unwrap();
        let strategy = strategy_for(layout);
        let first = strategy.calculate(root, rest, &[], &options);
        let second = strategy.calculate(root, rest, &[], &options);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn laid_out_nodes_never_overlap(nodes in tree_strategy(), layout in layout_strategy()) {
        let options = LayoutOptions::default();
        let mut nodes = nodes;
        nodes[0] = nodes[0].clone().with_layout_type(layout);
        let root_id = nodes[0].id.clone();
        assign_sides(&mut nodes, &root_id, layout);
        let (root, rest) = nodes.split_first().unwrap();
        let result = layout_tree(root, rest, &[], &options);

        for (i, a) in result.nodes.iter().enumerate() {
            for b in result.nodes.iter().skip(i + 1) {
                prop_assert!(
                    !bounds(a, &options).overlaps(&bounds(b, &options)),
                    "{} overlaps {}", a.id, b.id
                );
            }
        }
    }
}
