//! 编辑器序列化形状（`toJSON` 结果）的强类型表示。

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::geometry::{Bounds2D, Point2, Vector2};

/// 序列化 JSON 中的 `{x, y}` 坐标。
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ShapePoint {
    pub x: f64,
    pub y: f64,
}

impl ShapePoint {
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn shift(&mut self, vector: Vector2) {
        self.x += vector.x();
        self.y += vector.y();
    }
}

impl From<ShapePoint> for Point2 {
    fn from(value: ShapePoint) -> Self {
        Point2::new(value.x, value.y)
    }
}

impl From<Point2> for ShapePoint {
    fn from(value: Point2) -> Self {
        ShapePoint::new(value.x(), value.y())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeBounds {
    pub upper_left: ShapePoint,
    pub lower_right: ShapePoint,
}

impl ShapeBounds {
    pub fn new(upper_left: ShapePoint, lower_right: ShapePoint) -> Self {
        Self {
            upper_left,
            lower_right,
        }
    }

    pub fn from_coords(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self::new(ShapePoint::new(x1, y1), ShapePoint::new(x2, y2))
    }

    pub fn to_bounds(&self) -> Bounds2D {
        Bounds2D::new(self.upper_left.into(), self.lower_right.into())
    }

    pub fn shift(&mut self, vector: Vector2) {
        self.upper_left.shift(vector);
        self.lower_right.shift(vector);
    }
}

/// 对另一个形状的引用，序列化为 `{"resourceId": "..."}`。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRef {
    pub resource_id: String,
}

impl ResourceRef {
    pub fn new(resource_id: impl Into<String>) -> Self {
        Self {
            resource_id: resource_id.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StencilRef {
    pub id: String,
}

/// 图中的一个节点或连线。
///
/// 带有 `target` 的是连线。`dockers` 的首尾两个点是连接锚点，
/// 其余为中间折点。未建模的键（`properties` 等）保存在 `extra` 中原样往返。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedShape {
    pub resource_id: String,
    #[serde(default)]
    pub bounds: ShapeBounds,
    #[serde(default)]
    pub dockers: Vec<ShapePoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<ResourceRef>,
    #[serde(default)]
    pub outgoing: Vec<ResourceRef>,
    #[serde(default)]
    pub child_shapes: Vec<SerializedShape>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stencil: Option<StencilRef>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SerializedShape {
    pub fn node(resource_id: impl Into<String>, bounds: ShapeBounds) -> Self {
        Self {
            resource_id: resource_id.into(),
            bounds,
            dockers: Vec::new(),
            target: None,
            outgoing: Vec::new(),
            child_shapes: Vec::new(),
            stencil: None,
            extra: Map::new(),
        }
    }

    pub fn edge(
        resource_id: impl Into<String>,
        target: impl Into<String>,
        dockers: Vec<ShapePoint>,
    ) -> Self {
        let mut bounds = Bounds2D::empty();
        for docker in &dockers {
            bounds.include_point((*docker).into());
        }
        let bounds = if bounds.is_empty() {
            ShapeBounds::default()
        } else {
            ShapeBounds::new(bounds.upper_left().into(), bounds.lower_right().into())
        };
        Self {
            target: Some(ResourceRef::new(target)),
            dockers,
            ..Self::node(resource_id, bounds)
        }
    }

    pub fn with_stencil(mut self, stencil: impl Into<String>) -> Self {
        self.stencil = Some(StencilRef { id: stencil.into() });
        self
    }

    pub fn with_outgoing(mut self, resource_id: impl Into<String>) -> Self {
        self.outgoing.push(ResourceRef::new(resource_id));
        self
    }

    pub fn with_child(mut self, child: SerializedShape) -> Self {
        self.child_shapes.push(child);
        self
    }

    #[inline]
    pub fn is_edge(&self) -> bool {
        self.target.is_some()
    }

    pub fn stencil_id(&self) -> Option<&str> {
        self.stencil.as_ref().map(|stencil| stencil.id.as_str())
    }
}

/// 深度优先收集所有 `resourceId`，子形状先于父形状。
pub fn collect_resource_ids(shapes: &[SerializedShape]) -> Vec<String> {
    let mut ids = Vec::new();
    collect_into(shapes, &mut ids);
    ids
}

fn collect_into(shapes: &[SerializedShape], ids: &mut Vec<String>) {
    for shape in shapes {
        collect_into(&shape.child_shapes, ids);
        ids.push(shape.resource_id.clone());
    }
}

/// 查找任意层级上的形状。
pub fn find_shape<'a>(shapes: &'a [SerializedShape], resource_id: &str) -> Option<&'a SerializedShape> {
    for shape in shapes {
        if shape.resource_id == resource_id {
            return Some(shape);
        }
        if let Some(found) = find_shape(&shape.child_shapes, resource_id) {
            return Some(found);
        }
    }
    None
}

/// 以 `(source, edge, target)` 形式列出载荷内的所有连接。
///
/// 来源是在 `outgoing` 中引用该连线的形状；没有来源或目标不在载荷内的连线不会出现。
pub fn connections(shapes: &[SerializedShape]) -> Vec<(&SerializedShape, &SerializedShape, &SerializedShape)> {
    let mut edges = Vec::new();
    collect_edges(shapes, &mut edges);

    let mut result = Vec::new();
    for edge in edges {
        let Some(target) = edge
            .target
            .as_ref()
            .and_then(|target| find_shape(shapes, &target.resource_id))
        else {
            continue;
        };
        let mut sources = Vec::new();
        collect_sources(shapes, &edge.resource_id, &mut sources);
        for source in sources {
            result.push((source, edge, target));
        }
    }
    result
}

fn collect_edges<'a>(shapes: &'a [SerializedShape], edges: &mut Vec<&'a SerializedShape>) {
    for shape in shapes {
        if shape.is_edge() {
            edges.push(shape);
        }
        collect_edges(&shape.child_shapes, edges);
    }
}

fn collect_sources<'a>(
    shapes: &'a [SerializedShape],
    edge_id: &str,
    sources: &mut Vec<&'a SerializedShape>,
) {
    for shape in shapes {
        if shape.outgoing.iter().any(|out| out.resource_id == edge_id) {
            sources.push(shape);
        }
        collect_sources(&shape.child_shapes, edge_id, sources);
    }
}
