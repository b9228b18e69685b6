//! 插件与编辑器宿主之间的窄接口。

use patterns_core::geometry::Bounds2D;
use patterns_core::identity::IdProvider;
use patterns_core::shape::SerializedShape;

use crate::action::ActionDescriptor;
use crate::command::Command;
use crate::errors::EngineError;
use crate::rules::StencilRules;
use crate::scene::ShapeHandle;

/// 插件可订阅的编辑器事件种类。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    SelectionChanged,
    LayoutRequested,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorEvent {
    SelectionChanged { selected: usize },
    LayoutRequested { shapes: Vec<ShapeHandle> },
}

impl EditorEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            EditorEvent::SelectionChanged { .. } => EventKind::SelectionChanged,
            EditorEvent::LayoutRequested { .. } => EventKind::LayoutRequested,
        }
    }
}

/// 命令执行时可见的图表操作。
pub trait DiagramHost {
    /// 实例化序列化形状（含子形状），返回顶层形状句柄。
    fn add_shape_objects(
        &mut self,
        shapes: &[SerializedShape],
    ) -> Result<Vec<ShapeHandle>, EngineError>;

    fn delete_shape(&mut self, handle: ShapeHandle) -> Result<(), EngineError>;

    fn selection(&self) -> Vec<ShapeHandle>;

    fn set_selection(&mut self, shapes: Vec<ShapeHandle>);

    fn update_selection(&mut self) {}

    /// 宿主相关的布局处理，例如连线重新布线。
    fn layout(&mut self, _shapes: &[ShapeHandle]) {}

    fn update_canvas(&mut self) {}
}

/// 插件通过依赖注入获得的编辑器门面。
pub trait EditorFacade: DiagramHost + IdProvider {
    fn canvas_bounds(&self) -> Bounds2D;

    fn stencil_set_namespaces(&self) -> Vec<String>;

    fn rules(&self) -> &StencilRules;

    fn selection_bounds(&self) -> Option<Bounds2D>;

    /// 当前选中形状的 `toJSON` 结果，保持选中顺序。
    fn serialize_selection(&self) -> Vec<SerializedShape>;

    fn register_on_event(&mut self, kind: EventKind);

    /// 注册工具栏动作。
    fn offer(&mut self, action: ActionDescriptor);

    /// 通过撤销栈执行一批命令。
    fn execute_commands(&mut self, commands: Vec<Box<dyn Command>>) -> Result<(), EngineError>;
}
