//! 将选区快照清理为自包含的模式载荷。

use std::collections::HashSet;

use crate::shape::{SerializedShape, collect_resource_ids};

/// 先移除悬空连线，再裁剪失效的 `outgoing` 引用。
pub fn sanitize(shapes: Vec<SerializedShape>) -> Vec<SerializedShape> {
    let shapes = remove_dangling_edges(shapes);
    remove_obsolete_references(shapes)
}

/// 移除 `target` 不在序列中的连线（含嵌套的 `childShapes`）。
///
/// 移除一条连线可能让以它为目标的其他连线悬空，因此反复执行直到不再变化。
pub fn remove_dangling_edges(mut shapes: Vec<SerializedShape>) -> Vec<SerializedShape> {
    loop {
        let known = id_set(&shapes);
        if retain_resolved_edges(&mut shapes, &known) == 0 {
            return shapes;
        }
    }
}

/// 只保留指向序列内现存形状的 `outgoing` 项。
pub fn remove_obsolete_references(mut shapes: Vec<SerializedShape>) -> Vec<SerializedShape> {
    let known = id_set(&shapes);
    prune_outgoing(&mut shapes, &known);
    shapes
}

fn id_set(shapes: &[SerializedShape]) -> HashSet<String> {
    collect_resource_ids(shapes).into_iter().collect()
}

fn retain_resolved_edges(shapes: &mut Vec<SerializedShape>, known: &HashSet<String>) -> usize {
    let before = shapes.len();
    shapes.retain(|shape| match &shape.target {
        Some(target) => known.contains(&target.resource_id),
        None => true,
    });
    let mut removed = before - shapes.len();
    for shape in shapes.iter_mut() {
        removed += retain_resolved_edges(&mut shape.child_shapes, known);
    }
    removed
}

fn prune_outgoing(shapes: &mut [SerializedShape], known: &HashSet<String>) {
    for shape in shapes {
        shape
            .outgoing
            .retain(|out| known.contains(&out.resource_id));
        prune_outgoing(&mut shape.child_shapes, known);
    }
}
