use patterns_config::AppConfig;
use patterns_core::geometry::{Bounds2D, Point2, ScreenTransform};
use patterns_engine::editor::Editor;
use patterns_engine::host::{DiagramHost, EditorFacade};
use patterns_engine::rules::StencilRules;
use patterns_repo::InMemoryPatternStore;
use tracing::{info, warn};

use crate::errors::PluginError;
use crate::plugin::{PatternsPlugin, PlacedPattern, SELECTION_AS_PATTERN};

pub const DEFAULT_NAMESPACE: &str = "http://b3mn.org/stencilset/bpmn2.0#";
const DEMO_PATTERN_NAME: &str = "Approval step";

/// 演示参数。
#[derive(Debug, Clone)]
pub struct DemoOptions {
    /// 放置点的屏幕坐标。
    pub drop_point: Point2,
    /// 演示结束时撤销放置。
    pub undo: bool,
}

impl Default for DemoOptions {
    fn default() -> Self {
        Self {
            drop_point: Point2::new(400.0, 300.0),
            undo: false,
        }
    }
}

/// 演示的结果摘要。
#[derive(Debug, Clone)]
pub struct DemoReport {
    pub shapes_before: usize,
    pub shapes_after: usize,
    pub panel_nodes: usize,
    pub placed: PlacedPattern,
    pub undone: bool,
}

/// 在内存编辑器与内存模式服务器上走一遍完整流程并打印概览。
pub async fn run_demo(config: &AppConfig, options: &DemoOptions) -> Result<DemoReport, PluginError> {
    let namespace = config
        .repository
        .namespace
        .clone()
        .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());
    let canvas = Bounds2D::from_size(config.canvas.width, config.canvas.height);
    let mut editor = Editor::new(namespace, canvas).with_rules(StencilRules::bpmn_sequence_flow());
    let demo = editor.scene_mut().populate_demo();

    let mut plugin = PatternsPlugin::new(&mut editor, InMemoryPatternStore::new(), config)?;
    let loaded = plugin.load_all_patterns().await?;
    println!("模式仓库 {} 中已有 {loaded} 个模式", plugin.repository().namespace());

    editor.set_selection(vec![demo.start, demo.flow_in, demo.task, demo.flow_out]);
    for event in editor.poll_events() {
        plugin.on_editor_event(&mut editor, &event);
    }
    match plugin.button().position() {
        Some(position) if plugin.button().is_visible() => {
            println!("模式按钮位置=({:.2}, {:.2})", position.x(), position.y());
        }
        _ => println!("模式按钮未显示"),
    }

    let actions: Vec<&str> = editor
        .actions()
        .enabled_actions(editor.selection().len())
        .map(|action| action.name.as_str())
        .collect();
    println!("可用的工具栏动作: {}", actions.join(", "));

    let response = plugin.invoke_action(&editor, SELECTION_AS_PATTERN).await;
    let message = response.message.unwrap_or_default();
    if !response.success {
        warn!(%message, "保存模式失败");
        return Err(PluginError::ActionFailed {
            action: SELECTION_AS_PATTERN.to_string(),
            message,
        });
    }
    println!("{message}");

    let node = plugin
        .panel()
        .last_node()
        .map(|node| node.id)
        .ok_or_else(|| PluginError::ActionFailed {
            action: SELECTION_AS_PATTERN.to_string(),
            message: "模式面板中没有新节点".to_string(),
        })?;
    plugin.rename_node(node, DEMO_PATTERN_NAME).await?;

    println!("模式面板 \"{}\"：", plugin.panel().title());
    for node in plugin.panel().nodes() {
        let id = node
            .pattern
            .id
            .as_ref()
            .map_or_else(|| "-".to_string(), ToString::to_string);
        println!(
            "  - 节点 #{} {} (id={}, 形状数={})",
            node.id.0,
            node.text,
            id,
            node.pattern.ser_pattern.len()
        );
    }

    let shapes_before = editor.scene().len();
    let placed = plugin.drop_pattern(
        &mut editor,
        node,
        options.drop_point,
        &ScreenTransform::default(),
    )?;
    println!(
        "已在 ({:.2}, {:.2}) 放置 {} 个形状，中心=({:.2}, {:.2})，修正=({:.2}, {:.2})",
        placed.drop_point.x(),
        placed.drop_point.y(),
        placed.shape_count,
        placed.central_point.x(),
        placed.central_point.y(),
        placed.correction.x(),
        placed.correction.y()
    );

    let mut undone = false;
    if options.undo {
        editor.undo()?;
        undone = true;
        println!("已撤销放置");
    }

    let shapes_after = editor.scene().len();
    info!(shapes_before, shapes_after, undone, "CLI 演示完成");
    println!("图表形状数: {shapes_before} -> {shapes_after}");
    if let Some(bounds) = editor.selection_bounds() {
        println!(
            "选区范围=({:.2}, {:.2})-({:.2}, {:.2})",
            bounds.upper_left().x(),
            bounds.upper_left().y(),
            bounds.lower_right().x(),
            bounds.lower_right().y()
        );
    } else {
        println!("当前尚未选中任何形状。");
    }

    Ok(DemoReport {
        shapes_before,
        shapes_after,
        panel_nodes: plugin.panel().len(),
        placed,
        undone,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn demo_places_and_undoes_pattern() {
        let report = run_demo(
            &AppConfig::default(),
            &DemoOptions {
                drop_point: Point2::new(400.0, 300.0),
                undo: true,
            },
        )
        .await
        .unwrap();
        assert_eq!(report.panel_nodes, 1);
        assert_eq!(report.placed.shape_count, 3);
        assert_eq!(report.shapes_before, 7);
        assert_eq!(report.shapes_after, 7);
        assert!(report.undone);
    }

    #[tokio::test]
    async fn demo_keeps_pattern_without_undo() {
        let report = run_demo(&AppConfig::default(), &DemoOptions::default())
            .await
            .unwrap();
        assert_eq!(report.shapes_after, report.shapes_before + 3);
        assert_eq!(report.placed.drop_point, Point2::new(400.0, 300.0));
    }

    #[tokio::test]
    async fn demo_reports_why_the_capture_failed() {
        let mut config = AppConfig::default();
        config.plugin.min_selection = 5;
        let err = run_demo(&config, &DemoOptions::default()).await.unwrap_err();
        match err {
            PluginError::ActionFailed { action, message } => {
                assert_eq!(action, SELECTION_AS_PATTERN);
                assert!(message.contains('5'), "{message}");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
