use std::collections::HashSet;

use patterns_core::shape::{SerializedShape, connections};

/// 允许的连接：`source` 通过 `edge` 连线连接到 `target`。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionRule {
    pub source: String,
    pub edge: String,
    pub target: String,
}

impl ConnectionRule {
    pub fn new(source: impl Into<String>, edge: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            edge: edge.into(),
            target: target.into(),
        }
    }
}

/// 模板集的连接规则。未配置任何规则时一律放行。
#[derive(Debug, Clone, Default)]
pub struct StencilRules {
    connections: HashSet<ConnectionRule>,
}

impl StencilRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allow(&mut self, rule: ConnectionRule) -> &mut Self {
        self.connections.insert(rule);
        self
    }

    #[inline]
    pub fn is_unrestricted(&self) -> bool {
        self.connections.is_empty()
    }

    pub fn can_connect(&self, source: &str, edge: &str, target: &str) -> bool {
        if self.is_unrestricted() {
            return true;
        }
        self.connections
            .contains(&ConnectionRule::new(source, edge, target))
    }

    /// 返回载荷中第一条违反规则的连接。缺少模板信息的形状不参与检查。
    pub fn first_violation(&self, shapes: &[SerializedShape]) -> Option<ConnectionRule> {
        if self.is_unrestricted() {
            return None;
        }
        connections(shapes)
            .into_iter()
            .find_map(|(source, edge, target)| {
                let (Some(s), Some(e), Some(t)) =
                    (source.stencil_id(), edge.stencil_id(), target.stencil_id())
                else {
                    return None;
                };
                if self.can_connect(s, e, t) {
                    None
                } else {
                    Some(ConnectionRule::new(s, e, t))
                }
            })
    }

    /// 演示用的 BPMN 顺序流规则。
    pub fn bpmn_sequence_flow() -> Self {
        let mut rules = Self::new();
        let flow_nodes = ["StartNoneEvent", "Task", "EndNoneEvent"];
        for source in flow_nodes.iter().filter(|stencil| **stencil != "EndNoneEvent") {
            for target in flow_nodes.iter().filter(|stencil| **stencil != "StartNoneEvent") {
                rules.allow(ConnectionRule::new(*source, "SequenceFlow", *target));
            }
        }
        rules
    }
}
