//! 模式服务器的线协议：四个逻辑方法复用同一个集合端点。
//!
//! 只支持 GET/POST 的宿主通过 `_method` 参数携带 PUT 与 DELETE。

use std::collections::BTreeMap;

pub const PATTERN_ENDPOINT: &str = "/pattern";
pub const NAMESPACE_PARAM: &str = "ssNameSpace";
pub const PATTERN_PARAM: &str = "pattern";
pub const METHOD_OVERRIDE_PARAM: &str = "_method";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireMethod {
    FetchAll,
    Create,
    Update,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpVerb {
    Get,
    Post,
}

impl WireMethod {
    /// 逻辑上的 HTTP 方法名。
    pub fn logical_verb(self) -> &'static str {
        match self {
            WireMethod::FetchAll => "GET",
            WireMethod::Create => "PUT",
            WireMethod::Update => "POST",
            WireMethod::Delete => "DELETE",
        }
    }

    /// 实际发送时使用的 HTTP 方法。
    pub fn http_verb(self) -> HttpVerb {
        match self {
            WireMethod::FetchAll => HttpVerb::Get,
            WireMethod::Create | WireMethod::Update | WireMethod::Delete => HttpVerb::Post,
        }
    }

    pub fn override_param(self) -> Option<&'static str> {
        match self {
            WireMethod::Create => Some("put"),
            WireMethod::Delete => Some("delete"),
            WireMethod::FetchAll | WireMethod::Update => None,
        }
    }

    /// 从 HTTP 方法与 `_method` 参数还原逻辑方法。
    pub fn from_wire(verb: HttpVerb, override_param: Option<&str>) -> Option<Self> {
        match (verb, override_param.map(str::to_ascii_lowercase).as_deref()) {
            (HttpVerb::Get, None) => Some(WireMethod::FetchAll),
            (HttpVerb::Post, None) | (HttpVerb::Post, Some("post")) => Some(WireMethod::Update),
            (HttpVerb::Post, Some("put")) => Some(WireMethod::Create),
            (HttpVerb::Post, Some("delete")) => Some(WireMethod::Delete),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternRequest {
    pub url: String,
    pub verb: HttpVerb,
    pub params: BTreeMap<String, String>,
}

impl PatternRequest {
    /// 构造请求，自动补全端点路径与 `_method` 参数。
    pub fn new(root_path: &str, method: WireMethod, mut params: BTreeMap<String, String>) -> Self {
        if let Some(value) = method.override_param() {
            params.insert(METHOD_OVERRIDE_PARAM.to_string(), value.to_string());
        }
        Self {
            url: format!("{}{}", root_path.trim_end_matches('/'), PATTERN_ENDPOINT),
            verb: method.http_verb(),
            params,
        }
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn method(&self) -> Option<WireMethod> {
        WireMethod::from_wire(self.verb, self.param(METHOD_OVERRIDE_PARAM))
    }

    pub fn namespace(&self) -> Option<&str> {
        self.param(NAMESPACE_PARAM)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_and_delete_are_tunnelled_through_post() {
        let create = PatternRequest::new("/oryx/", WireMethod::Create, BTreeMap::new());
        assert_eq!(create.url, "/oryx/pattern");
        assert_eq!(create.verb, HttpVerb::Post);
        assert_eq!(create.param(METHOD_OVERRIDE_PARAM), Some("put"));
        assert_eq!(create.method(), Some(WireMethod::Create));

        let delete = PatternRequest::new("/oryx", WireMethod::Delete, BTreeMap::new());
        assert_eq!(delete.method(), Some(WireMethod::Delete));

        let fetch = PatternRequest::new("/oryx", WireMethod::FetchAll, BTreeMap::new());
        assert_eq!(fetch.verb, HttpVerb::Get);
        assert!(fetch.param(METHOD_OVERRIDE_PARAM).is_none());

        let update = PatternRequest::new("/oryx", WireMethod::Update, BTreeMap::new());
        assert_eq!(update.method(), Some(WireMethod::Update));
    }

    #[test]
    fn unknown_override_is_rejected() {
        assert_eq!(WireMethod::from_wire(HttpVerb::Post, Some("patch")), None);
        assert_eq!(WireMethod::from_wire(HttpVerb::Get, Some("delete")), None);
        assert_eq!(WireMethod::from_wire(HttpVerb::Post, Some("DELETE")), Some(WireMethod::Delete));
    }
}
