pub mod action;
pub mod command;
pub mod editor;
pub mod host;
pub mod rules;

pub mod errors {
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum EngineError {
        #[error("shape with handle {0} not found")]
        ShapeNotFound(u64),
        #[error("resource id {0} already exists in the diagram")]
        DuplicateResource(String),
        #[error("command {0} has already been executed")]
        AlreadyExecuted(&'static str),
        #[error("rollback left {} shape(s) in the diagram", failed.len())]
        RollbackIncomplete { failed: Vec<u64> },
        #[error("host rejected {operation}: {reason}")]
        HostRejected {
            operation: &'static str,
            reason: String,
        },
        #[error("nothing to undo")]
        NothingToUndo,
        #[error("unknown action: {0}")]
        UnknownAction(String),
        #[error("action {name} needs at least {required} selected shapes, got {actual}")]
        SelectionTooSmall {
            name: String,
            required: usize,
            actual: usize,
        },
    }
}

pub mod scene {
    use std::collections::{BTreeMap, HashMap, HashSet};
    use std::fmt;

    use patterns_core::geometry::{Bounds2D, Vector2};
    use patterns_core::shape::{SerializedShape, ShapeBounds, ShapePoint};
    use tracing::debug;

    use crate::errors::EngineError;
    use crate::host::{DiagramHost, EditorEvent};

    /// 活动图表中形状的句柄。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct ShapeHandle(u64);

    impl ShapeHandle {
        #[inline]
        pub fn new(raw: u64) -> Self {
            Self(raw)
        }

        #[inline]
        pub fn get(self) -> u64 {
            self.0
        }
    }

    impl fmt::Display for ShapeHandle {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "#{}", self.0)
        }
    }

    /// 图表中已实例化的形状。`data.child_shapes` 始终为空，子形状通过 `children` 关联。
    #[derive(Debug, Clone)]
    pub struct LiveShape {
        pub handle: ShapeHandle,
        pub parent: Option<ShapeHandle>,
        pub children: Vec<ShapeHandle>,
        pub data: SerializedShape,
    }

    /// 内存中的活动图表：形状树、选中集与待分发事件。
    #[derive(Debug, Default)]
    pub struct Scene {
        shapes: BTreeMap<ShapeHandle, LiveShape>,
        roots: Vec<ShapeHandle>,
        by_resource: HashMap<String, ShapeHandle>,
        selected: Vec<ShapeHandle>,
        next_handle: u64,
        events: Vec<EditorEvent>,
        canvas_updates: usize,
        selection_refreshes: usize,
    }

    #[derive(Debug, Clone, Copy)]
    pub struct DemoShapes {
        pub start: ShapeHandle,
        pub task: ShapeHandle,
        pub end: ShapeHandle,
        pub flow_in: ShapeHandle,
        pub flow_out: ShapeHandle,
        pub pool: ShapeHandle,
    }

    impl Scene {
        pub fn new() -> Self {
            Self::default()
        }

        /// 清空图表与选中集。
        pub fn reset(&mut self) {
            *self = Self::new();
        }

        #[inline]
        pub fn len(&self) -> usize {
            self.shapes.len()
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.shapes.is_empty()
        }

        #[inline]
        pub fn roots(&self) -> &[ShapeHandle] {
            &self.roots
        }

        pub fn shape(&self, handle: ShapeHandle) -> Option<&LiveShape> {
            self.shapes.get(&handle)
        }

        pub fn shapes(&self) -> impl Iterator<Item = &LiveShape> {
            self.shapes.values()
        }

        pub fn handle_of(&self, resource_id: &str) -> Option<ShapeHandle> {
            self.by_resource.get(resource_id).copied()
        }

        #[inline]
        pub fn contains_resource(&self, resource_id: &str) -> bool {
            self.by_resource.contains_key(resource_id)
        }

        /// 画布刷新次数，供前端判断是否需要重绘。
        #[inline]
        pub fn canvas_updates(&self) -> usize {
            self.canvas_updates
        }

        #[inline]
        pub fn selection_refreshes(&self) -> usize {
            self.selection_refreshes
        }

        #[inline]
        pub fn selection_len(&self) -> usize {
            self.selected.len()
        }

        #[inline]
        pub fn is_selected(&self, handle: ShapeHandle) -> bool {
            self.selected.contains(&handle)
        }

        /// 将形状追加到选中集。
        pub fn select(&mut self, handle: ShapeHandle) -> Result<(), EngineError> {
            if !self.shapes.contains_key(&handle) {
                return Err(EngineError::ShapeNotFound(handle.get()));
            }
            if !self.selected.contains(&handle) {
                self.selected.push(handle);
                self.raise_selection_changed();
            }
            Ok(())
        }

        pub fn clear_selection(&mut self) {
            if !self.selected.is_empty() {
                self.selected.clear();
                self.raise_selection_changed();
            }
        }

        /// 形状在画布上的绝对边界（子形状的边界相对父形状）。
        pub fn absolute_bounds(&self, handle: ShapeHandle) -> Option<Bounds2D> {
            let shape = self.shapes.get(&handle)?;
            let mut bounds = shape.data.bounds;
            let mut parent = shape.parent;
            while let Some(parent_handle) = parent {
                let parent_shape = self.shapes.get(&parent_handle)?;
                let offset = parent_shape.data.bounds.upper_left;
                bounds.shift(Vector2::new(offset.x, offset.y));
                parent = parent_shape.parent;
            }
            Some(bounds.to_bounds())
        }

        /// 当前选中形状的包围盒。
        pub fn selection_bounds(&self) -> Option<Bounds2D> {
            let mut bounds = Bounds2D::empty();
            let mut has = false;
            for handle in &self.selected {
                if let Some(shape_bounds) = self.absolute_bounds(*handle) {
                    bounds.include(&shape_bounds);
                    has = true;
                }
            }
            if has { Some(bounds) } else { None }
        }

        /// 按编辑器 `toJSON` 的格式导出形状及其子形状。
        pub fn serialize(&self, handle: ShapeHandle) -> Option<SerializedShape> {
            let shape = self.shapes.get(&handle)?;
            let mut data = shape.data.clone();
            data.child_shapes = shape
                .children
                .iter()
                .filter_map(|child| self.serialize(*child))
                .collect();
            Some(data)
        }

        pub fn serialize_selection(&self) -> Vec<SerializedShape> {
            self.selected
                .iter()
                .filter_map(|handle| self.serialize(*handle))
                .collect()
        }

        pub fn drain_events(&mut self) -> Vec<EditorEvent> {
            std::mem::take(&mut self.events)
        }

        fn raise_selection_changed(&mut self) {
            self.events.push(EditorEvent::SelectionChanged {
                selected: self.selected.len(),
            });
        }

        fn allocate_handle(&mut self) -> ShapeHandle {
            self.next_handle += 1;
            ShapeHandle::new(self.next_handle)
        }

        fn check_insertable(
            &self,
            shapes: &[SerializedShape],
            batch: &mut HashSet<String>,
        ) -> Result<(), EngineError> {
            for shape in shapes {
                if self.by_resource.contains_key(&shape.resource_id)
                    || !batch.insert(shape.resource_id.clone())
                {
                    return Err(EngineError::DuplicateResource(shape.resource_id.clone()));
                }
                self.check_insertable(&shape.child_shapes, batch)?;
            }
            Ok(())
        }

        fn insert_shape(&mut self, shape: &SerializedShape, parent: Option<ShapeHandle>) -> ShapeHandle {
            let handle = self.allocate_handle();
            let mut data = shape.clone();
            data.child_shapes = Vec::new();
            self.by_resource.insert(data.resource_id.clone(), handle);
            self.shapes.insert(
                handle,
                LiveShape {
                    handle,
                    parent,
                    children: Vec::new(),
                    data,
                },
            );

            let children: Vec<ShapeHandle> = shape
                .child_shapes
                .iter()
                .map(|child| self.insert_shape(child, Some(handle)))
                .collect();
            if let Some(live) = self.shapes.get_mut(&handle) {
                live.children = children;
            }
            handle
        }

        fn remove_subtree(&mut self, handle: ShapeHandle, removed: &mut Vec<String>) {
            let Some(shape) = self.shapes.remove(&handle) else {
                return;
            };
            self.by_resource.remove(&shape.data.resource_id);
            self.selected.retain(|selected| *selected != handle);
            removed.push(shape.data.resource_id);
            for child in shape.children {
                self.remove_subtree(child, removed);
            }
        }

        /// 填充一个小型流程图示例，返回关键形状句柄。
        pub fn populate_demo(&mut self) -> DemoShapes {
            let shapes = vec![
                SerializedShape::node("start", ShapeBounds::from_coords(60.0, 100.0, 90.0, 130.0))
                    .with_stencil("StartNoneEvent")
                    .with_outgoing("flow_in"),
                SerializedShape::edge(
                    "flow_in",
                    "task",
                    vec![
                        ShapePoint::new(15.0, 15.0),
                        ShapePoint::new(130.0, 115.0),
                        ShapePoint::new(50.0, 40.0),
                    ],
                )
                .with_stencil("SequenceFlow")
                .with_outgoing("task"),
                SerializedShape::node("task", ShapeBounds::from_coords(170.0, 75.0, 270.0, 155.0))
                    .with_stencil("Task")
                    .with_outgoing("flow_out"),
                SerializedShape::edge(
                    "flow_out",
                    "end",
                    vec![ShapePoint::new(50.0, 40.0), ShapePoint::new(14.0, 14.0)],
                )
                .with_stencil("SequenceFlow")
                .with_outgoing("end"),
                SerializedShape::node("end", ShapeBounds::from_coords(330.0, 101.0, 358.0, 129.0))
                    .with_stencil("EndNoneEvent"),
                SerializedShape::node("pool", ShapeBounds::from_coords(30.0, 250.0, 630.0, 450.0))
                    .with_stencil("Pool")
                    .with_child(
                        SerializedShape::node("lane", ShapeBounds::from_coords(30.0, 0.0, 600.0, 200.0))
                            .with_stencil("Lane"),
                    ),
            ];

            self.reset();
            let mut handles = Vec::with_capacity(shapes.len());
            for shape in &shapes {
                let handle = self.insert_shape(shape, None);
                self.roots.push(handle);
                handles.push(handle);
            }

            let demo = DemoShapes {
                start: handles[0],
                flow_in: handles[1],
                task: handles[2],
                flow_out: handles[3],
                end: handles[4],
                pool: handles[5],
            };
            debug!(
                start = demo.start.get(),
                task = demo.task.get(),
                end = demo.end.get(),
                pool = demo.pool.get(),
                "已创建演示图表"
            );
            demo
        }
    }

    impl DiagramHost for Scene {
        fn add_shape_objects(
            &mut self,
            shapes: &[SerializedShape],
        ) -> Result<Vec<ShapeHandle>, EngineError> {
            let mut batch = HashSet::new();
            self.check_insertable(shapes, &mut batch)?;

            let mut created = Vec::with_capacity(shapes.len());
            for shape in shapes {
                let handle = self.insert_shape(shape, None);
                self.roots.push(handle);
                created.push(handle);
            }
            debug!(count = created.len(), total = self.shapes.len(), "已实例化形状");
            Ok(created)
        }

        fn delete_shape(&mut self, handle: ShapeHandle) -> Result<(), EngineError> {
            let Some(parent) = self.shapes.get(&handle).map(|shape| shape.parent) else {
                return Err(EngineError::ShapeNotFound(handle.get()));
            };
            match parent.and_then(|parent| self.shapes.get_mut(&parent)) {
                Some(parent_shape) => parent_shape.children.retain(|child| *child != handle),
                None => self.roots.retain(|root| *root != handle),
            }

            let selected_before = self.selected.len();
            let mut removed = Vec::new();
            self.remove_subtree(handle, &mut removed);

            let removed: HashSet<String> = removed.into_iter().collect();
            for shape in self.shapes.values_mut() {
                shape
                    .data
                    .outgoing
                    .retain(|out| !removed.contains(&out.resource_id));
            }
            if self.selected.len() != selected_before {
                self.raise_selection_changed();
            }
            debug!(handle = handle.get(), removed = removed.len(), "已删除形状");
            Ok(())
        }

        fn selection(&self) -> Vec<ShapeHandle> {
            self.selected.clone()
        }

        fn set_selection(&mut self, shapes: Vec<ShapeHandle>) {
            let mut next: Vec<ShapeHandle> = Vec::with_capacity(shapes.len());
            for handle in shapes {
                if self.shapes.contains_key(&handle) && !next.contains(&handle) {
                    next.push(handle);
                }
            }
            if next != self.selected {
                self.selected = next;
                self.raise_selection_changed();
            }
        }

        fn layout(&mut self, shapes: &[ShapeHandle]) {
            self.events.push(EditorEvent::LayoutRequested {
                shapes: shapes.to_vec(),
            });
        }

        fn update_selection(&mut self) {
            self.selection_refreshes += 1;
        }

        fn update_canvas(&mut self) {
            self.canvas_updates += 1;
        }
    }

}
