use std::collections::HashSet;

use patterns_core::geometry::Bounds2D;
use patterns_core::identity::{IdProvider, UuidIdProvider};
use patterns_core::shape::SerializedShape;
use tracing::{debug, info};

use crate::action::{ActionDescriptor, ActionRegistry};
use crate::command::{Command, CommandHistory};
use crate::errors::EngineError;
use crate::host::{DiagramHost, EditorEvent, EditorFacade, EventKind};
use crate::rules::StencilRules;
use crate::scene::{Scene, ShapeHandle};

/// 编辑器门面的内存实现：图表、撤销栈、工具栏动作与事件订阅。
pub struct Editor {
    scene: Scene,
    history: CommandHistory,
    actions: ActionRegistry,
    rules: StencilRules,
    canvas: Bounds2D,
    namespaces: Vec<String>,
    subscriptions: HashSet<EventKind>,
    ids: UuidIdProvider,
}

impl Editor {
    pub fn new(namespace: impl Into<String>, canvas: Bounds2D) -> Self {
        Self {
            scene: Scene::new(),
            history: CommandHistory::new(),
            actions: ActionRegistry::new(),
            rules: StencilRules::new(),
            canvas,
            namespaces: vec![namespace.into()],
            subscriptions: HashSet::new(),
            ids: UuidIdProvider,
        }
    }

    pub fn with_rules(mut self, rules: StencilRules) -> Self {
        self.rules = rules;
        self
    }

    #[inline]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    #[inline]
    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    #[inline]
    pub fn actions(&self) -> &ActionRegistry {
        &self.actions
    }

    #[inline]
    pub fn history(&self) -> &CommandHistory {
        &self.history
    }

    pub fn undo(&mut self) -> Result<(), EngineError> {
        self.history.undo(&mut self.scene)?;
        info!(remaining = self.history.len(), "已撤销最近一次操作");
        Ok(())
    }

    #[inline]
    pub fn is_subscribed(&self, kind: EventKind) -> bool {
        self.subscriptions.contains(&kind)
    }

    /// 取出已订阅种类的待分发事件，未订阅的事件被丢弃。
    pub fn poll_events(&mut self) -> Vec<EditorEvent> {
        self.scene
            .drain_events()
            .into_iter()
            .filter(|event| self.subscriptions.contains(&event.kind()))
            .collect()
    }
}

impl DiagramHost for Editor {
    fn add_shape_objects(
        &mut self,
        shapes: &[SerializedShape],
    ) -> Result<Vec<ShapeHandle>, EngineError> {
        self.scene.add_shape_objects(shapes)
    }

    fn delete_shape(&mut self, handle: ShapeHandle) -> Result<(), EngineError> {
        self.scene.delete_shape(handle)
    }

    fn selection(&self) -> Vec<ShapeHandle> {
        self.scene.selection()
    }

    fn set_selection(&mut self, shapes: Vec<ShapeHandle>) {
        self.scene.set_selection(shapes);
    }

    fn update_selection(&mut self) {
        self.scene.update_selection();
    }

    fn layout(&mut self, shapes: &[ShapeHandle]) {
        self.scene.layout(shapes);
    }

    fn update_canvas(&mut self) {
        self.scene.update_canvas();
    }
}

impl IdProvider for Editor {
    fn provide_id(&mut self) -> String {
        self.ids.provide_id()
    }

    fn is_taken(&self, id: &str) -> bool {
        self.scene.contains_resource(id)
    }
}

impl EditorFacade for Editor {
    fn canvas_bounds(&self) -> Bounds2D {
        self.canvas
    }

    fn stencil_set_namespaces(&self) -> Vec<String> {
        self.namespaces.clone()
    }

    fn rules(&self) -> &StencilRules {
        &self.rules
    }

    fn selection_bounds(&self) -> Option<Bounds2D> {
        self.scene.selection_bounds()
    }

    fn serialize_selection(&self) -> Vec<SerializedShape> {
        self.scene.serialize_selection()
    }

    fn register_on_event(&mut self, kind: EventKind) {
        debug!(?kind, "已订阅编辑器事件");
        self.subscriptions.insert(kind);
    }

    fn offer(&mut self, action: ActionDescriptor) {
        debug!(name = %action.name, min_shape = action.min_shape, "已注册工具栏动作");
        self.actions.register(action);
    }

    fn execute_commands(&mut self, commands: Vec<Box<dyn Command>>) -> Result<(), EngineError> {
        self.history.execute_commands(commands, &mut self.scene)
    }
}
