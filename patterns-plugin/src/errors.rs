use patterns_config::ConfigError;
use patterns_core::identity::IdentityError;
use patterns_engine::errors::EngineError;
use patterns_repo::TreeNodeId;
use patterns_repo::errors::RepositoryError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PluginError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Identity(#[from] IdentityError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("编码拖拽载荷失败: {0}")]
    Payload(#[source] serde_json::Error),
    #[error("模式面板中不存在节点 {0:?}")]
    UnknownNode(TreeNodeId),
    #[error("编辑器未提供模板集命名空间")]
    NoNamespace,
    #[error("模式不包含任何形状")]
    EmptyPattern,
    #[error("动作 {action} 执行失败: {message}")]
    ActionFailed { action: String, message: String },
    #[error("连接规则不允许 {source_stencil} -[{edge}]-> {target}")]
    ForbiddenConnection {
        source_stencil: String,
        edge: String,
        target: String,
    },
}
