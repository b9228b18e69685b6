use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde_json::{Value, json};
use tracing::trace;

use crate::errors::TransportError;
use crate::pattern::PatternRecord;
use crate::protocol::{PATTERN_PARAM, PatternRequest, WireMethod};
use crate::repository::PatternTransport;

#[derive(Debug, Clone)]
struct StoredPattern {
    id: u64,
    name: String,
    /// 与服务器一致，以文本形式保存。
    ser_pattern: String,
    image_url: Option<String>,
}

impl StoredPattern {
    fn to_json(&self) -> Value {
        json!({
            "id": self.id,
            "name": self.name,
            "serPattern": self.ser_pattern,
            "imageUrl": self.image_url,
        })
    }
}

#[derive(Debug, Default)]
struct StoreState {
    namespaces: HashMap<String, Vec<StoredPattern>>,
    next_id: u64,
    offline: bool,
    requests: Vec<PatternRequest>,
}

/// 进程内的模式服务器，按命名空间保存模式，依次分配数字 id。
#[derive(Debug, Default)]
pub struct InMemoryPatternStore {
    state: Mutex<StoreState>,
}

impl InMemoryPatternStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 模拟网络中断：所有请求返回 [`TransportError::Offline`]。
    pub fn set_offline(&self, offline: bool) {
        self.state().offline = offline;
    }

    pub fn requests(&self) -> Vec<PatternRequest> {
        self.state().requests.clone()
    }

    pub fn pattern_count(&self, namespace: &str) -> usize {
        self.state()
            .namespaces
            .get(namespace)
            .map_or(0, Vec::len)
    }

    pub fn stored_names(&self, namespace: &str) -> Vec<String> {
        self.state()
            .namespaces
            .get(namespace)
            .map(|patterns| patterns.iter().map(|p| p.name.clone()).collect())
            .unwrap_or_default()
    }

    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn handle(&self, request: &PatternRequest) -> Result<String, TransportError> {
        let mut state = self.state();
        state.requests.push(request.clone());
        if state.offline {
            return Err(TransportError::Offline);
        }

        let method = request.method().ok_or_else(|| bad_request("unsupported method"))?;
        let namespace = request
            .namespace()
            .ok_or_else(|| bad_request("missing namespace"))?
            .to_string();
        trace!(?method, %namespace, "pattern store request");

        match method {
            WireMethod::FetchAll => {
                let patterns = state
                    .namespaces
                    .get(&namespace)
                    .map(|patterns| patterns.iter().map(StoredPattern::to_json).collect())
                    .unwrap_or_else(Vec::new);
                Ok(Value::Array(patterns).to_string())
            }
            WireMethod::Create => {
                let record = parse_pattern(request)?;
                let ser_pattern = encode_shapes(&record)?;
                state.next_id += 1;
                let stored = StoredPattern {
                    id: state.next_id,
                    name: record.name,
                    ser_pattern,
                    image_url: record.image_url,
                };
                let body = stored.to_json().to_string();
                state.namespaces.entry(namespace).or_default().push(stored);
                Ok(body)
            }
            WireMethod::Update => {
                let record = parse_pattern(request)?;
                let ser_pattern = encode_shapes(&record)?;
                let id = stored_id(&record)?;
                let stored = state
                    .namespaces
                    .get_mut(&namespace)
                    .and_then(|patterns| patterns.iter_mut().find(|p| p.id == id))
                    .ok_or_else(|| not_found(id))?;
                stored.name = record.name;
                stored.ser_pattern = ser_pattern;
                stored.image_url = record.image_url;
                Ok(String::new())
            }
            WireMethod::Delete => {
                let record = parse_pattern(request)?;
                let id = stored_id(&record)?;
                let patterns = state
                    .namespaces
                    .get_mut(&namespace)
                    .ok_or_else(|| not_found(id))?;
                let index = patterns
                    .iter()
                    .position(|p| p.id == id)
                    .ok_or_else(|| not_found(id))?;
                patterns.remove(index);
                Ok(String::new())
            }
        }
    }
}

impl PatternTransport for InMemoryPatternStore {
    async fn send(&self, request: &PatternRequest) -> Result<String, TransportError> {
        self.handle(request)
    }
}

fn parse_pattern(request: &PatternRequest) -> Result<PatternRecord, TransportError> {
    let raw = request
        .param(PATTERN_PARAM)
        .ok_or_else(|| bad_request("missing pattern"))?;
    serde_json::from_str(raw).map_err(|err| bad_request(format!("malformed pattern: {err}")))
}

fn encode_shapes(record: &PatternRecord) -> Result<String, TransportError> {
    serde_json::to_string(&record.ser_pattern)
        .map_err(|err| bad_request(format!("malformed serPattern: {err}")))
}

fn stored_id(record: &PatternRecord) -> Result<u64, TransportError> {
    record
        .id
        .as_ref()
        .and_then(|id| id.as_str().parse().ok())
        .ok_or_else(|| bad_request("missing or unknown pattern id"))
}

fn bad_request(message: impl Into<String>) -> TransportError {
    TransportError::Status {
        status: 400,
        body: message.into(),
    }
}

fn not_found(id: u64) -> TransportError {
    TransportError::Status {
        status: 404,
        body: format!("pattern {id} not found"),
    }
}
