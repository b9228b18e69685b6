//! 模式落点计算：中心点、平移与越界修正。

use crate::geometry::{Bounds2D, Point2, Vector2};
use crate::shape::SerializedShape;

/// 覆盖所有顶层形状的最小包围盒的中心。序列为空时返回 `None`。
pub fn central_point(shapes: &[SerializedShape]) -> Option<Point2> {
    let (first, rest) = shapes.split_first()?;
    let mut bounds = first.bounds.to_bounds();
    for shape in rest {
        bounds.include(&shape.bounds.to_bounds());
    }
    Some(bounds.center())
}

/// 把放置点对齐到模式中心所需的平移向量。
pub fn placement_vector(shapes: &[SerializedShape], drop_point: Point2) -> Option<Vector2> {
    central_point(shapes).map(|center| center.vector_to(drop_point))
}

/// 递归平移形状的边界与中间折点。
///
/// 首尾 docker 是以被连接形状为参照的锚点，不参与平移。
pub fn translate(shapes: &mut [SerializedShape], vector: Vector2) -> &mut [SerializedShape] {
    for shape in shapes.iter_mut() {
        shape.bounds.shift(vector);
        let docker_count = shape.dockers.len();
        if docker_count > 2 {
            for docker in &mut shape.dockers[1..docker_count - 1] {
                docker.shift(vector);
            }
        }
        translate(&mut shape.child_shapes, vector);
    }
    shapes
}

/// 计算使所有形状左上角都不越过容器左上角的最小非负修正向量。
///
/// 两个轴独立取各形状所需修正的最大值；已在范围内时为零向量。
pub fn correction_vector(container: &Bounds2D, shapes: &[SerializedShape]) -> Vector2 {
    let limit = container.upper_left();
    let mut x: f64 = 0.0;
    let mut y: f64 = 0.0;
    for shape in shapes {
        let upper_left = shape.bounds.upper_left;
        if upper_left.x < limit.x() {
            x = x.max(limit.x() - upper_left.x);
        }
        if upper_left.y < limit.y() {
            y = y.max(limit.y() - upper_left.y);
        }
    }
    Vector2::new(x, y)
}
