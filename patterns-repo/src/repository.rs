//! 按命名空间划分的模式仓库客户端。
//!
//! 每个操作都是一次独立的异步请求/响应。仓库不保证彼此独立的请求按发出顺序完成，
//! 需要顺序时由调用方在前一个请求完成后再发出下一个。
//! 完成通知同时通过返回值和 [`RepositoryEvent`] 通道给出。

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::errors::{RepositoryError, TransportError};
use crate::pattern::{Pattern, PatternRecord};
use crate::protocol::{NAMESPACE_PARAM, PATTERN_PARAM, PatternRequest, WireMethod};

pub const DEFAULT_ROOT_PATH: &str = "/oryx";
const NOTIFICATION_TITLE: &str = "Pattern Repository";
const COMMUNICATION_FAILED: &str = "Communication with the pattern server failed.";

/// 发送模式请求的异步传输层，返回响应正文。
#[trait_variant::make(Send)]
pub trait PatternTransport: Send + Sync {
    async fn send(&self, request: &PatternRequest) -> Result<String, TransportError>;
}

/// 调用方提供的失败处理；缺省时走默认提示路径。
pub type FailureHandler = Box<dyn FnOnce(&TransportError) + Send>;

/// 需要界面展示的错误提示。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RepositoryEvent {
    /// 加载完成，携带仓库中的全部模式。
    Loaded(Vec<Pattern>),
    Added(Pattern),
    Removed(Pattern),
    Notification(Notification),
}

pub struct PatternRepository<T> {
    namespace: String,
    root_path: String,
    transport: T,
    patterns: Mutex<Vec<Pattern>>,
    events: Option<mpsc::UnboundedSender<RepositoryEvent>>,
}

impl<T: PatternTransport> PatternRepository<T> {
    pub fn new(namespace: impl Into<String>, root_path: impl Into<String>, transport: T) -> Self {
        Self {
            namespace: namespace.into(),
            root_path: root_path.into(),
            transport,
            patterns: Mutex::new(Vec::new()),
            events: None,
        }
    }

    /// 创建仓库以及接收其事件的通道。
    pub fn with_channel(
        namespace: impl Into<String>,
        root_path: impl Into<String>,
        transport: T,
    ) -> (Self, mpsc::UnboundedReceiver<RepositoryEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let mut repository = Self::new(namespace, root_path, transport);
        repository.events = Some(sender);
        (repository, receiver)
    }

    #[inline]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    #[inline]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn owns(&self, pattern: &Pattern) -> bool {
        pattern.repository() == Some(self.namespace.as_str())
    }

    /// 已加载模式的快照。新增的模式只通过 `Added` 事件交出，不进入此列表。
    pub fn patterns(&self) -> Vec<Pattern> {
        self.list().clone()
    }

    /// 拉取命名空间下的全部模式并追加到内存列表。
    ///
    /// 不与已加载的模式去重，重复调用会产生重复条目。
    pub async fn load_patterns(&self) -> Result<Vec<Pattern>, RepositoryError> {
        let body = self
            .send_request(WireMethod::FetchAll, BTreeMap::new(), None)
            .await?;
        let records: Vec<PatternRecord> = decode(&body)?;

        let loaded = {
            let mut list = self.list();
            for record in records {
                let mut pattern = Pattern::from_record(record);
                pattern.attach(&self.namespace);
                list.push(pattern);
            }
            list.clone()
        };
        info!(namespace = %self.namespace, count = loaded.len(), "已加载模式");
        self.emit(RepositoryEvent::Loaded(loaded.clone()));
        Ok(loaded)
    }

    /// 在服务器上新建模式，返回带有服务器分配 `id` 的新实例。
    ///
    /// 已加载列表保持不变，之后的 [`load_patterns`](Self::load_patterns) 只会带回服务器上的这一份。
    pub async fn add_pattern(&self, pattern: &Pattern) -> Result<Pattern, RepositoryError> {
        let params = self.pattern_params(pattern)?;
        let body = self.send_request(WireMethod::Create, params, None).await?;
        let record: PatternRecord = decode(&body)?;

        let mut created = Pattern::from_record(record);
        created.attach(&self.namespace);
        debug!(
            namespace = %self.namespace,
            id = ?created.id,
            name = %created.name,
            "已新增模式"
        );
        self.emit(RepositoryEvent::Added(created.clone()));
        Ok(created)
    }

    /// 更新服务器上的模式。成功时不产生事件，失败时走默认提示路径。
    pub async fn save_pattern(&self, pattern: &Pattern) -> Result<(), RepositoryError> {
        let params = self.pattern_params(pattern)?;
        self.send_request(WireMethod::Update, params, None).await?;

        if let Some(id) = &pattern.id {
            let mut list = self.list();
            for stored in list.iter_mut().filter(|stored| stored.id.as_ref() == Some(id)) {
                stored.name = pattern.name.clone();
                stored.image_url = pattern.image_url.clone();
                stored.ser_pattern = pattern.ser_pattern.clone();
            }
        }
        Ok(())
    }

    /// 改名并保存。模式不属于任何仓库时不做任何事并返回 `false`。
    pub async fn rename_pattern(
        &self,
        pattern: &mut Pattern,
        name: impl Into<String>,
    ) -> Result<bool, RepositoryError> {
        match pattern.repository() {
            None => return Ok(false),
            Some(owner) if owner != self.namespace => {
                return Err(RepositoryError::NotOwned {
                    namespace: self.namespace.clone(),
                });
            }
            Some(_) => {}
        }
        pattern.name = name.into();
        self.save_pattern(pattern).await?;
        Ok(true)
    }

    /// 从服务器删除模式，成功后从已加载列表移除第一条 `id` 相同的记录并发出 `Removed` 事件。
    pub async fn remove_pattern(&self, pattern: &Pattern) -> Result<(), RepositoryError> {
        if !self.owns(pattern) {
            return Err(RepositoryError::NotOwned {
                namespace: self.namespace.clone(),
            });
        }
        let id = pattern.id.clone().ok_or(RepositoryError::MissingId)?;
        let params = self.pattern_params(pattern)?;
        self.send_request(WireMethod::Delete, params, None).await?;

        {
            let mut list = self.list();
            if let Some(index) = list.iter().position(|stored| stored.id.as_ref() == Some(&id)) {
                list.remove(index);
            }
        }
        debug!(namespace = %self.namespace, %id, "已删除模式");
        self.emit(RepositoryEvent::Removed(pattern.clone()));
        Ok(())
    }

    /// 发送一次请求。传输失败时若提供了 `on_failure` 则交给调用方，
    /// 否则记录警告并发出错误提示；两种情况都返回错误，且不会自动重试。
    pub async fn send_request(
        &self,
        method: WireMethod,
        mut params: BTreeMap<String, String>,
        on_failure: Option<FailureHandler>,
    ) -> Result<String, RepositoryError> {
        params.insert(NAMESPACE_PARAM.to_string(), self.namespace.clone());
        let request = PatternRequest::new(&self.root_path, method, params);
        debug!(
            method = method.logical_verb(),
            url = %request.url,
            "发送模式请求"
        );

        match self.transport.send(&request).await {
            Ok(body) => Ok(body),
            Err(err) => {
                match on_failure {
                    Some(handler) => handler(&err),
                    None => {
                        warn!(method = method.logical_verb(), error = %err, "communication failed");
                        self.emit(RepositoryEvent::Notification(Notification {
                            title: NOTIFICATION_TITLE.to_string(),
                            message: COMMUNICATION_FAILED.to_string(),
                        }));
                    }
                }
                Err(err.into())
            }
        }
    }

    fn pattern_params(&self, pattern: &Pattern) -> Result<BTreeMap<String, String>, RepositoryError> {
        let json = pattern.to_json_string().map_err(RepositoryError::Encode)?;
        let mut params = BTreeMap::new();
        params.insert(PATTERN_PARAM.to_string(), json);
        Ok(params)
    }

    fn list(&self) -> MutexGuard<'_, Vec<Pattern>> {
        self.patterns.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: RepositoryEvent) {
        if let Some(sender) = &self.events {
            // 接收端已关闭时丢弃事件
            let _ = sender.send(event);
        }
    }
}

fn decode<V: serde::de::DeserializeOwned>(body: &str) -> Result<V, RepositoryError> {
    serde_json::from_str(body).map_err(|source| RepositoryError::Decode {
        source,
        body: body.to_string(),
    })
}
