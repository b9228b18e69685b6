use std::collections::HashMap;

use crate::errors::EngineError;

/// 工具栏动作的描述。
#[derive(Debug, Clone, PartialEq)]
pub struct ActionDescriptor {
    pub name: String,
    pub group: String,
    pub description: String,
    pub icon: String,
    /// 动作可用所需的最少选中形状数。
    pub min_shape: usize,
}

#[derive(Debug, Clone)]
pub struct ActionResponse {
    pub success: bool,
    pub message: Option<String>,
}

impl ActionResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

/// 按名称登记的工具栏动作，保持注册顺序。
#[derive(Debug, Default)]
pub struct ActionRegistry {
    actions: HashMap<String, ActionDescriptor>,
    order: Vec<String>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, action: ActionDescriptor) {
        if !self.actions.contains_key(&action.name) {
            self.order.push(action.name.clone());
        }
        self.actions.insert(action.name.clone(), action);
    }

    pub fn get(&self, name: &str) -> Option<&ActionDescriptor> {
        self.actions.get(name)
    }

    /// 校验动作存在且当前选中数量满足要求。
    pub fn check(&self, name: &str, selection_len: usize) -> Result<&ActionDescriptor, EngineError> {
        let action = self
            .actions
            .get(name)
            .ok_or_else(|| EngineError::UnknownAction(name.to_string()))?;
        if selection_len < action.min_shape {
            return Err(EngineError::SelectionTooSmall {
                name: name.to_string(),
                required: action.min_shape,
                actual: selection_len,
            });
        }
        Ok(action)
    }

    pub fn available_actions(&self) -> impl Iterator<Item = &ActionDescriptor> {
        self.order.iter().filter_map(|name| self.actions.get(name))
    }

    pub fn enabled_actions(&self, selection_len: usize) -> impl Iterator<Item = &ActionDescriptor> {
        self.available_actions()
            .filter(move |action| selection_len >= action.min_shape)
    }
}
