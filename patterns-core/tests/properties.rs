use std::collections::HashSet;

use patterns_core::geometry::{Bounds2D, Point2, Vector2};
use patterns_core::identity::{UuidIdProvider, renew_resource_ids};
use patterns_core::sanitize::sanitize;
use patterns_core::shape::{SerializedShape, ShapeBounds, ShapePoint, collect_resource_ids};
use patterns_core::transform::{correction_vector, translate};
use proptest::prelude::*;

#[derive(Clone, Debug)]
struct EdgePlan {
    source: usize,
    target: usize,
    targets_edge: bool,
}

fn edge_strategy() -> impl Strategy<Value = EdgePlan> {
    (0usize..10, 0usize..10, any::<bool>()).prop_map(|(source, target, targets_edge)| EdgePlan {
        source,
        target,
        targets_edge,
    })
}

fn coord() -> impl Strategy<Value = f64> {
    (-500i32..500).prop_map(f64::from)
}

fn build_selection(
    node_count: usize,
    edges: &[EdgePlan],
    origins: &[(f64, f64)],
) -> Vec<SerializedShape> {
    let mut nodes: Vec<SerializedShape> = (0..node_count)
        .map(|i| {
            let (x, y) = origins[i % origins.len()];
            let mut node =
                SerializedShape::node(format!("n{i}"), ShapeBounds::from_coords(x, y, x + 40.0, y + 20.0));
            if i % 3 == 0 {
                node = node.with_child(SerializedShape::node(
                    format!("c{i}"),
                    ShapeBounds::from_coords(x + 1.0, y + 1.0, x + 10.0, y + 10.0),
                ));
            }
            node
        })
        .collect();

    let mut result = Vec::new();
    for (j, plan) in edges.iter().enumerate() {
        let edge_id = format!("e{j}");
        if plan.source < nodes.len() {
            nodes[plan.source] = nodes[plan.source].clone().with_outgoing(edge_id.clone());
        } else if let Some(first) = nodes.first_mut() {
            first.outgoing.push(patterns_core::shape::ResourceRef::new(format!("x{}", plan.source)));
        }
        let target = if plan.targets_edge {
            format!("e{}", plan.target)
        } else {
            format!("n{}", plan.target)
        };
        let (x, y) = origins[j % origins.len()];
        result.push(SerializedShape::edge(
            edge_id,
            target,
            vec![
                ShapePoint::new(x, y),
                ShapePoint::new(x + 5.0, y - 3.0),
                ShapePoint::new(x + 9.0, y + 2.0),
            ],
        ));
    }
    nodes.extend(result);
    nodes
}

fn selection_strategy() -> impl Strategy<Value = Vec<SerializedShape>> {
    (
        1usize..8,
        prop::collection::vec(edge_strategy(), 0..8),
        prop::collection::vec((coord(), coord()), 1..8),
    )
        .prop_map(|(nodes, edges, origins)| build_selection(nodes, &edges, &origins))
}

fn all_references(shapes: &[SerializedShape], refs: &mut Vec<String>) {
    for shape in shapes {
        if let Some(target) = &shape.target {
            refs.push(target.resource_id.clone());
        }
        refs.extend(shape.outgoing.iter().map(|out| out.resource_id.clone()));
        all_references(&shape.child_shapes, refs);
    }
}

fn references_resolve(shapes: &[SerializedShape]) -> bool {
    let ids: HashSet<String> = collect_resource_ids(shapes).into_iter().collect();
    let mut refs = Vec::new();
    all_references(shapes, &mut refs);
    refs.iter().all(|reference| ids.contains(reference))
}

proptest! {
    #[test]
    fn sanitizing_twice_changes_nothing(selection in selection_strategy()) {
        let once = sanitize(selection);
        let twice = sanitize(once.clone());
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn sanitized_references_resolve(selection in selection_strategy()) {
        let cleaned = sanitize(selection);
        prop_assert!(references_resolve(&cleaned));
    }

    #[test]
    fn renewal_yields_disjoint_ids_with_intact_references(selection in selection_strategy()) {
        let cleaned = sanitize(selection);
        let renewed = renew_resource_ids(&cleaned, &mut UuidIdProvider).unwrap();

        let old: HashSet<String> = collect_resource_ids(&cleaned).into_iter().collect();
        let new: HashSet<String> = collect_resource_ids(&renewed).into_iter().collect();
        prop_assert_eq!(old.len(), new.len());
        prop_assert!(old.is_disjoint(&new));
        prop_assert!(references_resolve(&renewed));
    }

    #[test]
    fn translate_there_and_back_restores_geometry(
        selection in selection_strategy(),
        dx in coord(),
        dy in coord(),
    ) {
        let original = selection.clone();
        let mut moved = selection;
        let vector = Vector2::new(dx, dy);
        translate(&mut moved, vector);
        for (before, after) in original.iter().zip(moved.iter()) {
            if let (Some(first), Some(last)) = (before.dockers.first(), before.dockers.last()) {
                prop_assert_eq!(Some(first), after.dockers.first());
                prop_assert_eq!(Some(last), after.dockers.last());
            }
        }
        translate(&mut moved, vector.negate());
        prop_assert_eq!(original, moved);
    }

    #[test]
    fn correction_keeps_shapes_inside_container(
        selection in selection_strategy(),
        left in coord(),
        top in coord(),
    ) {
        let container = Bounds2D::new(Point2::new(left, top), Point2::new(left + 2000.0, top + 2000.0));
        let mut shapes = selection;
        let correction = correction_vector(&container, &shapes);
        prop_assert!(correction.x() >= 0.0 && correction.y() >= 0.0);
        translate(&mut shapes, correction);
        for shape in &shapes {
            prop_assert!(shape.bounds.upper_left.x >= left);
            prop_assert!(shape.bounds.upper_left.y >= top);
        }
    }
}
