pub mod memory;
pub mod pattern;
pub mod protocol;
pub mod repository;

pub use memory::InMemoryPatternStore;
pub use pattern::{Pattern, PatternId, PatternRecord, TreeNodeId};
pub use protocol::{HttpVerb, PatternRequest, WireMethod};
pub use repository::{Notification, PatternRepository, RepositoryEvent};

pub mod errors {
    use thiserror::Error;

    /// 传输层错误。
    #[derive(Debug, Clone, Error, PartialEq, Eq)]
    pub enum TransportError {
        #[error("pattern server is unreachable")]
        Offline,
        #[error("pattern server answered {status}: {body}")]
        Status { status: u16, body: String },
    }

    #[derive(Debug, Error)]
    pub enum RepositoryError {
        #[error(transparent)]
        Transport(#[from] TransportError),
        #[error("failed to encode pattern: {0}")]
        Encode(#[source] serde_json::Error),
        #[error("malformed server response: {source}")]
        Decode {
            #[source]
            source: serde_json::Error,
            body: String,
        },
        #[error("pattern is not owned by repository {namespace}")]
        NotOwned { namespace: String },
        #[error("pattern has not been saved yet")]
        MissingId,
    }
}
