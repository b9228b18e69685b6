//! 模式插件：把选区保存为模式，并把面板中的模式拖放回画布。
//!
//! 插件不持有编辑器，每个入口都以参数接收 [`EditorFacade`]。
//! 仓库事件通过通道送达，由 [`PatternsPlugin::pump_events`] 在插件自己的回合中处理。

use patterns_config::{AppConfig, PluginConfig};
use patterns_core::geometry::{Point2, ScreenTransform, Vector2};
use patterns_core::identity::{IdentityError, renew_resource_ids};
use patterns_core::sanitize::sanitize;
use patterns_core::shape::SerializedShape;
use patterns_core::transform::{central_point, correction_vector, translate};
use patterns_engine::action::{ActionDescriptor, ActionResponse};
use patterns_engine::command::MaterializePatternCommand;
use patterns_engine::host::{EditorEvent, EditorFacade, EventKind};
use patterns_repo::repository::PatternTransport;
use patterns_repo::{Notification, Pattern, PatternRepository, RepositoryEvent};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::button::PatternButton;
use crate::errors::PluginError;
use crate::panel::{NodeId, PatternPanel};

pub const SELECTION_AS_PATTERN: &str = "Selection as Pattern";
pub const TOOLBAR_GROUP: &str = "Patterns";
const TOOLBAR_DESCRIPTION: &str = "Save the selected shapes as a reusable pattern";
const PANEL_TITLE: &str = "Patterns";

/// 一次放置的结果。
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedPattern {
    /// 画布坐标系下的放置点。
    pub drop_point: Point2,
    /// 平移前的模式中心。
    pub central_point: Point2,
    pub correction: Vector2,
    pub shape_count: usize,
}

pub struct PatternsPlugin<T> {
    config: PluginConfig,
    repository: PatternRepository<T>,
    events: mpsc::UnboundedReceiver<RepositoryEvent>,
    panel: PatternPanel,
    button: PatternButton,
    notifications: Vec<Notification>,
}

impl<T: PatternTransport> PatternsPlugin<T> {
    /// 订阅选区变化、注册工具栏动作，并为首个模板集命名空间创建仓库。
    pub fn new<F: EditorFacade>(
        facade: &mut F,
        transport: T,
        config: &AppConfig,
    ) -> Result<Self, PluginError> {
        facade.register_on_event(EventKind::SelectionChanged);
        facade.offer(ActionDescriptor {
            name: SELECTION_AS_PATTERN.to_string(),
            group: TOOLBAR_GROUP.to_string(),
            description: TOOLBAR_DESCRIPTION.to_string(),
            icon: config.plugin.icon.clone(),
            min_shape: config.plugin.min_selection,
        });

        let namespace = config
            .repository
            .namespace
            .clone()
            .or_else(|| facade.stencil_set_namespaces().into_iter().next())
            .ok_or(PluginError::NoNamespace)?;
        let (repository, events) =
            PatternRepository::with_channel(namespace, &config.repository.root_path, transport);
        info!(namespace = repository.namespace(), "模式插件已初始化");

        Ok(Self {
            config: config.plugin.clone(),
            repository,
            events,
            panel: PatternPanel::new(PANEL_TITLE),
            button: PatternButton::new(),
            notifications: Vec::new(),
        })
    }

    #[inline]
    pub fn repository(&self) -> &PatternRepository<T> {
        &self.repository
    }

    #[inline]
    pub fn panel(&self) -> &PatternPanel {
        &self.panel
    }

    #[inline]
    pub fn button(&self) -> &PatternButton {
        &self.button
    }

    #[inline]
    pub fn button_mut(&mut self) -> &mut PatternButton {
        &mut self.button
    }

    /// 取出尚未展示的错误提示。
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    /// 从服务器加载全部模式并加入面板。
    pub async fn load_all_patterns(&mut self) -> Result<usize, PluginError> {
        let result = self.repository.load_patterns().await;
        self.pump_events()?;
        Ok(result?.len())
    }

    /// 处理已到达的仓库事件，返回处理的事件数。
    pub fn pump_events(&mut self) -> Result<usize, PluginError> {
        let mut handled = 0;
        while let Ok(event) = self.events.try_recv() {
            handled += 1;
            match event {
                RepositoryEvent::Loaded(patterns) => {
                    for pattern in patterns {
                        self.panel.add_pattern(pattern).map_err(PluginError::Payload)?;
                    }
                }
                RepositoryEvent::Added(pattern) => {
                    let node = self.panel.add_pattern(pattern).map_err(PluginError::Payload)?;
                    debug!(node = node.0, "已添加模式节点");
                }
                RepositoryEvent::Removed(pattern) => match pattern.tree_node {
                    Some(node) => {
                        self.panel.remove_node(node);
                    }
                    None => warn!(id = ?pattern.id, "被删除的模式没有对应节点"),
                },
                RepositoryEvent::Notification(notification) => {
                    warn!(
                        title = %notification.title,
                        message = %notification.message,
                        "模式仓库提示"
                    );
                    self.notifications.push(notification);
                }
            }
        }
        Ok(handled)
    }

    pub fn on_editor_event<F: EditorFacade>(&mut self, facade: &mut F, event: &EditorEvent) {
        if let EditorEvent::SelectionChanged { .. } = event {
            self.toggle_button(facade);
        }
    }

    /// 选中数量达到阈值时显示或移动按钮，否则隐藏。
    pub fn toggle_button<F: EditorFacade>(&mut self, facade: &mut F) {
        let selected = facade.selection().len();
        let bounds = facade.selection_bounds();
        match bounds {
            Some(bounds) if selected >= self.config.min_selection => {
                if self.button.is_visible() {
                    self.button.relocate(&bounds, self.config.selected_area_padding);
                } else {
                    self.button
                        .show_beside(&bounds, self.config.selected_area_padding);
                    facade.update_canvas();
                }
            }
            _ => {
                if self.button.is_visible() {
                    self.button.hide();
                    facade.update_canvas();
                }
            }
        }
    }

    /// 点击按钮：把当前选区保存为模式。
    pub async fn press_button<F: EditorFacade>(
        &mut self,
        facade: &F,
    ) -> Result<Pattern, PluginError> {
        self.button.activate();
        self.button.release();
        self.capture_selection(facade).await
    }

    /// 执行插件提供的工具栏动作。
    pub async fn invoke_action<F: EditorFacade>(
        &mut self,
        facade: &F,
        name: &str,
    ) -> ActionResponse {
        if name != SELECTION_AS_PATTERN {
            return ActionResponse::err(format!("未知动作: {name}"));
        }
        let selected = facade.selection().len();
        if selected < self.config.min_selection {
            return ActionResponse::err(format!(
                "至少需要选中 {} 个形状，当前 {selected} 个",
                self.config.min_selection
            ));
        }
        match self.capture_selection(facade).await {
            Ok(pattern) => ActionResponse::ok(format!("已保存模式 {}", pattern.name)),
            Err(err) => ActionResponse::err(err.to_string()),
        }
    }

    /// 序列化选区、清理悬空引用，并以默认名称保存到仓库。
    pub async fn capture_selection<F: EditorFacade>(
        &mut self,
        facade: &F,
    ) -> Result<Pattern, PluginError> {
        let shapes = sanitize(facade.serialize_selection());
        let pattern = Pattern::new(self.config.default_pattern_name.clone(), shapes);
        debug!(shapes = pattern.ser_pattern.len(), "捕获选区为模式");

        let result = self.repository.add_pattern(&pattern).await;
        self.pump_events()?;
        let created = result?;
        // 返回带节点标识的副本
        Ok(self
            .panel
            .nodes()
            .iter()
            .rev()
            .find(|node| node.pattern.id == created.id)
            .map_or(created, |node| node.pattern.clone()))
    }

    /// 重命名节点对应的模式；不属于仓库的模式保持不变并返回 `false`。
    pub async fn rename_node(&mut self, node: NodeId, name: &str) -> Result<bool, PluginError> {
        let mut pattern = self
            .panel
            .node(node)
            .map(|node| node.pattern.clone())
            .ok_or(PluginError::UnknownNode(node))?;
        let renamed = self.repository.rename_pattern(&mut pattern, name).await;
        self.pump_events()?;
        if renamed? {
            self.panel.rename(node, name);
            return Ok(true);
        }
        Ok(false)
    }

    /// 从服务器删除节点对应的模式，成功后移除该节点。
    pub async fn remove_node(&mut self, node: NodeId) -> Result<(), PluginError> {
        let pattern = self
            .panel
            .node(node)
            .map(|node| node.pattern.clone())
            .ok_or(PluginError::UnknownNode(node))?;
        let result = self.repository.remove_pattern(&pattern).await;
        self.pump_events()?;
        result?;
        Ok(())
    }

    /// 把节点中的模式放置到屏幕坐标 `screen` 处。
    ///
    /// 载荷违反连接规则时拒绝放置，图表保持不变。
    pub fn drop_pattern<F: EditorFacade>(
        &self,
        facade: &mut F,
        node: NodeId,
        screen: Point2,
        transform: &ScreenTransform,
    ) -> Result<PlacedPattern, PluginError> {
        let payload = &self
            .panel
            .node(node)
            .ok_or(PluginError::UnknownNode(node))?
            .payload;
        let template: Vec<SerializedShape> =
            serde_json::from_str(payload).map_err(IdentityError::Syntax)?;

        if let Some(rule) = facade.rules().first_violation(&template) {
            warn!(
                source = %rule.source,
                edge = %rule.edge,
                target = %rule.target,
                "模式包含不允许的连接，拒绝放置"
            );
            return Err(PluginError::ForbiddenConnection {
                source_stencil: rule.source,
                edge: rule.edge,
                target: rule.target,
            });
        }

        let mut shapes = renew_resource_ids(&template, facade)?;
        let drop_point = transform.to_canvas(screen);
        let center = central_point(&shapes).ok_or(PluginError::EmptyPattern)?;

        translate(&mut shapes, center.vector_to(drop_point));
        let correction = correction_vector(&facade.canvas_bounds(), &shapes);
        translate(&mut shapes, correction);

        let shape_count = shapes.len();
        let command = MaterializePatternCommand::new(shapes, Some(center), drop_point);
        facade.execute_commands(vec![Box::new(command)])?;
        info!(
            node = node.0,
            x = drop_point.x(),
            y = drop_point.y(),
            shape_count,
            "已放置模式"
        );

        Ok(PlacedPattern {
            drop_point,
            central_point: center,
            correction,
            shape_count,
        })
    }
}
