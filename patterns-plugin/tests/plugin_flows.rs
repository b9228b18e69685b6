use patterns_config::AppConfig;
use patterns_core::geometry::{Bounds2D, Point2, ScreenTransform};
use patterns_core::shape::SerializedShape;
use patterns_engine::editor::Editor;
use patterns_engine::host::DiagramHost;
use patterns_engine::rules::StencilRules;
use patterns_engine::scene::DemoShapes;
use patterns_plugin::{PatternsPlugin, PluginError, SELECTION_AS_PATTERN};
use patterns_repo::InMemoryPatternStore;

const BPMN: &str = "http://b3mn.org/stencilset/bpmn2.0#";

fn editor() -> (Editor, DemoShapes) {
    let mut editor = Editor::new(BPMN, Bounds2D::from_size(1485.0, 1050.0))
        .with_rules(StencilRules::bpmn_sequence_flow());
    let demo = editor.scene_mut().populate_demo();
    (editor, demo)
}

fn plugin(editor: &mut Editor) -> PatternsPlugin<InMemoryPatternStore> {
    PatternsPlugin::new(editor, InMemoryPatternStore::new(), &AppConfig::default()).unwrap()
}

#[tokio::test]
async fn capture_sanitizes_and_adds_panel_node() {
    let (mut editor, demo) = editor();
    let mut plugin = plugin(&mut editor);
    editor.set_selection(vec![demo.start, demo.flow_in, demo.task, demo.flow_out]);

    let pattern = plugin.capture_selection(&editor).await.unwrap();
    assert_eq!(pattern.name, "New Pattern");
    assert!(pattern.is_persisted());
    let ids: Vec<&str> = pattern
        .ser_pattern
        .iter()
        .map(|shape| shape.resource_id.as_str())
        .collect();
    assert_eq!(ids, vec!["start", "flow_in", "task"]);

    let node = plugin.panel().last_node().unwrap();
    assert_eq!(pattern.tree_node, Some(node.id));
    let payload: Vec<SerializedShape> = serde_json::from_str(&node.payload).unwrap();
    assert_eq!(payload.len(), 3);
}

#[tokio::test]
async fn action_requires_minimum_selection() {
    let (mut editor, demo) = editor();
    let mut plugin = plugin(&mut editor);
    editor.set_selection(vec![demo.task]);

    let response = plugin.invoke_action(&editor, SELECTION_AS_PATTERN).await;
    assert!(!response.success);
    assert!(plugin.panel().is_empty());

    let response = plugin.invoke_action(&editor, "unknown").await;
    assert!(!response.success);

    editor.set_selection(vec![demo.task, demo.end]);
    let response = plugin.invoke_action(&editor, SELECTION_AS_PATTERN).await;
    assert!(response.success);
    assert_eq!(plugin.panel().len(), 1);
}

#[tokio::test]
async fn loading_after_capture_shows_the_server_copy_once() {
    let (mut editor, demo) = editor();
    let mut plugin = plugin(&mut editor);
    editor.set_selection(vec![demo.start, demo.task]);
    let captured = plugin.capture_selection(&editor).await.unwrap();

    assert_eq!(plugin.load_all_patterns().await.unwrap(), 1);
    assert_eq!(plugin.panel().len(), 2);
    let ids: Vec<_> = plugin
        .panel()
        .nodes()
        .iter()
        .map(|node| node.pattern.id.clone())
        .collect();
    assert_eq!(ids, vec![captured.id.clone(), captured.id]);
}

#[tokio::test]
async fn reloading_appends_the_accumulated_list_again() {
    let (mut editor, demo) = editor();
    let mut plugin = plugin(&mut editor);
    editor.set_selection(vec![demo.start, demo.task]);
    plugin.capture_selection(&editor).await.unwrap();
    plugin.load_all_patterns().await.unwrap();

    assert_eq!(plugin.load_all_patterns().await.unwrap(), 2);
    assert_eq!(plugin.panel().len(), 1 + 1 + 2);
}

#[tokio::test]
async fn removing_a_node_leaves_equally_named_sibling() {
    let (mut editor, demo) = editor();
    let mut plugin = plugin(&mut editor);
    editor.set_selection(vec![demo.start, demo.task]);
    let first = plugin.capture_selection(&editor).await.unwrap();
    let second = plugin.capture_selection(&editor).await.unwrap();
    assert_eq!(first.name, second.name);

    let target = second.tree_node.unwrap();
    plugin.remove_node(target).await.unwrap();
    assert_eq!(plugin.panel().len(), 1);
    assert!(plugin.panel().node(target).is_none());
    assert!(plugin.panel().node(first.tree_node.unwrap()).is_some());
    assert_eq!(plugin.repository().transport().pattern_count(BPMN), 1);
}

#[tokio::test]
async fn rename_updates_node_and_server() {
    let (mut editor, demo) = editor();
    let mut plugin = plugin(&mut editor);
    editor.set_selection(vec![demo.start, demo.task]);
    let pattern = plugin.capture_selection(&editor).await.unwrap();
    let node = pattern.tree_node.unwrap();

    assert!(plugin.rename_node(node, "Review").await.unwrap());
    assert_eq!(plugin.panel().node(node).unwrap().text, "Review");
    assert_eq!(
        plugin.repository().transport().stored_names(BPMN),
        vec!["Review"]
    );
}

#[tokio::test]
async fn drop_materializes_pattern_with_fresh_ids() {
    let (mut editor, demo) = editor();
    let mut plugin = plugin(&mut editor);
    editor.set_selection(vec![demo.start, demo.flow_in, demo.task]);
    let node = plugin
        .capture_selection(&editor)
        .await
        .unwrap()
        .tree_node
        .unwrap();

    let transform = ScreenTransform {
        a: 2.0,
        d: 2.0,
        e: 100.0,
        f: 50.0,
        scroll_left: 0.0,
        scroll_top: 0.0,
    };
    let placed = plugin
        .drop_pattern(&mut editor, node, Point2::new(900.0, 650.0), &transform)
        .unwrap();
    assert_eq!(placed.drop_point, Point2::new(400.0, 300.0));
    assert_eq!(placed.shape_count, 3);
    assert_eq!(editor.scene().len(), 10);
    assert_eq!(editor.selection().len(), 3);
    assert!(editor.scene().contains_resource("start"));

    editor.undo().unwrap();
    assert_eq!(editor.scene().len(), 7);
}

#[tokio::test]
async fn drop_near_origin_is_pushed_inside_canvas() {
    let (mut editor, demo) = editor();
    let mut plugin = plugin(&mut editor);
    editor.set_selection(vec![demo.start, demo.task]);
    let node = plugin
        .capture_selection(&editor)
        .await
        .unwrap()
        .tree_node
        .unwrap();

    let placed = plugin
        .drop_pattern(&mut editor, node, Point2::new(0.0, 0.0), &ScreenTransform::default())
        .unwrap();
    assert!(placed.correction.x() > 0.0);
    assert!(placed.correction.y() > 0.0);
    for handle in editor.selection() {
        let bounds = editor.scene().absolute_bounds(handle).unwrap();
        assert!(bounds.upper_left().x() >= 0.0);
        assert!(bounds.upper_left().y() >= 0.0);
    }
}

#[tokio::test]
async fn forbidden_connection_is_rejected_without_changes() {
    let (mut editor, demo) = editor();
    let mut plugin = plugin(&mut editor);
    editor.set_selection(vec![demo.start, demo.flow_in, demo.task]);
    let node = plugin
        .capture_selection(&editor)
        .await
        .unwrap()
        .tree_node
        .unwrap();

    let mut strict = Editor::new(BPMN, Bounds2D::from_size(1485.0, 1050.0)).with_rules({
        let mut rules = StencilRules::new();
        rules.allow(patterns_engine::rules::ConnectionRule::new(
            "Task",
            "SequenceFlow",
            "EndNoneEvent",
        ));
        rules
    });
    let err = plugin
        .drop_pattern(&mut strict, node, Point2::new(400.0, 300.0), &ScreenTransform::default())
        .unwrap_err();
    assert!(matches!(err, PluginError::ForbiddenConnection { .. }));
    assert!(strict.scene().is_empty());
    assert!(!strict.history().can_undo());
}

#[tokio::test]
async fn offline_capture_reports_notification() {
    let (mut editor, demo) = editor();
    let mut plugin = plugin(&mut editor);
    plugin.repository().transport().set_offline(true);
    editor.set_selection(vec![demo.start, demo.task]);

    let err = plugin.capture_selection(&editor).await.unwrap_err();
    assert!(matches!(err, PluginError::Repository(_)));
    assert!(plugin.panel().is_empty());
    let notifications = plugin.take_notifications();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].title, "Pattern Repository");
}
