//! 模式面板：根节点下每个模式一个树节点。

use patterns_repo::{Pattern, TreeNodeId};

pub type NodeId = TreeNodeId;

/// 面板中的一个模式节点，携带拖拽时使用的载荷。
#[derive(Debug, Clone, PartialEq)]
pub struct PatternNode {
    pub id: NodeId,
    pub text: String,
    /// 序列化后的形状数组文本。
    pub payload: String,
    pub pattern: Pattern,
}

#[derive(Debug)]
pub struct PatternPanel {
    title: String,
    nodes: Vec<PatternNode>,
    next_id: u64,
    expanded: bool,
}

impl PatternPanel {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            nodes: Vec::new(),
            next_id: 1,
            expanded: false,
        }
    }

    #[inline]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[inline]
    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    pub fn nodes(&self) -> &[PatternNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Option<&PatternNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn last_node(&self) -> Option<&PatternNode> {
        self.nodes.last()
    }

    /// 为模式追加节点并把节点标识写回模式，根节点随之展开。
    pub fn add_pattern(&mut self, mut pattern: Pattern) -> Result<NodeId, serde_json::Error> {
        let payload = pattern.drag_payload()?;
        let id = TreeNodeId(self.next_id);
        self.next_id += 1;
        pattern.tree_node = Some(id);
        self.nodes.push(PatternNode {
            id,
            text: pattern.name.clone(),
            payload,
            pattern,
        });
        self.expanded = true;
        Ok(id)
    }

    pub fn rename(&mut self, id: NodeId, name: &str) -> bool {
        match self.nodes.iter_mut().find(|node| node.id == id) {
            Some(node) => {
                node.text = name.to_string();
                node.pattern.name = name.to_string();
                true
            }
            None => false,
        }
    }

    /// 按节点标识移除，同名节点互不影响。
    pub fn remove_node(&mut self, id: NodeId) -> Option<PatternNode> {
        let index = self.nodes.iter().position(|node| node.id == id)?;
        Some(self.nodes.remove(index))
    }
}
