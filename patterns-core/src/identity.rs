//! 为模式载荷生成新的 `resourceId` 并同步改写内部引用。

use std::collections::{HashMap, HashSet};

use thiserror::Error;
use uuid::Uuid;

use crate::shape::{SerializedShape, collect_resource_ids};

const MAX_ATTEMPTS_PER_ID: usize = 64;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("malformed pattern payload: {0}")]
    Syntax(#[from] serde_json::Error),
    #[error("no fresh resource id for {old} after {attempts} attempts")]
    Exhausted { old: String, attempts: usize },
}

/// 宿主提供的新标识生成器。
pub trait IdProvider {
    fn provide_id(&mut self) -> String;

    /// 标识是否已被活动图表占用。
    fn is_taken(&self, _id: &str) -> bool {
        false
    }
}

/// 与编辑器一致的 `oryx_<UUID>` 标识。
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIdProvider;

impl IdProvider for UuidIdProvider {
    fn provide_id(&mut self) -> String {
        format!("oryx_{}", Uuid::new_v4().to_string().to_uppercase())
    }
}

/// 旧标识到新标识的映射。
pub type IdMapping = HashMap<String, String>;

/// 解码拖拽载荷后再更新标识。格式错误的输入直接返回 [`IdentityError::Syntax`]。
pub fn renew_resource_ids_json<P>(
    payload: &str,
    provider: &mut P,
) -> Result<Vec<SerializedShape>, IdentityError>
where
    P: IdProvider + ?Sized,
{
    let shapes: Vec<SerializedShape> = serde_json::from_str(payload)?;
    renew_resource_ids(&shapes, provider)
}

/// 返回结构相同、所有标识均已替换的新序列。
pub fn renew_resource_ids<P>(
    shapes: &[SerializedShape],
    provider: &mut P,
) -> Result<Vec<SerializedShape>, IdentityError>
where
    P: IdProvider + ?Sized,
{
    let mapping = build_mapping(shapes, provider)?;
    let mut renewed = shapes.to_vec();
    apply_mapping(&mut renewed, &mapping);
    Ok(renewed)
}

/// 为载荷中每个旧标识分配一个新标识。
///
/// 新标识不会与活动图表、本批次已分配的标识或任何旧标识重复。
pub fn build_mapping<P>(
    shapes: &[SerializedShape],
    provider: &mut P,
) -> Result<IdMapping, IdentityError>
where
    P: IdProvider + ?Sized,
{
    let old_ids = collect_resource_ids(shapes);
    let old_set: HashSet<&str> = old_ids.iter().map(String::as_str).collect();
    let mut issued: HashSet<String> = HashSet::new();
    let mut mapping = IdMapping::with_capacity(old_ids.len());

    for old in &old_ids {
        if mapping.contains_key(old) {
            continue;
        }
        let mut fresh = None;
        for _ in 0..MAX_ATTEMPTS_PER_ID {
            let candidate = provider.provide_id();
            if old_set.contains(candidate.as_str())
                || issued.contains(&candidate)
                || provider.is_taken(&candidate)
            {
                continue;
            }
            fresh = Some(candidate);
            break;
        }
        let Some(fresh) = fresh else {
            return Err(IdentityError::Exhausted {
                old: old.clone(),
                attempts: MAX_ATTEMPTS_PER_ID,
            });
        };
        issued.insert(fresh.clone());
        mapping.insert(old.clone(), fresh);
    }
    Ok(mapping)
}

/// 按映射改写 `resourceId`、`target` 与 `outgoing`，映射外的引用保持不变。
pub fn apply_mapping(shapes: &mut [SerializedShape], mapping: &IdMapping) {
    for shape in shapes {
        if let Some(fresh) = mapping.get(&shape.resource_id) {
            shape.resource_id = fresh.clone();
        }
        if let Some(target) = shape.target.as_mut() {
            if let Some(fresh) = mapping.get(&target.resource_id) {
                target.resource_id = fresh.clone();
            }
        }
        for out in &mut shape.outgoing {
            if let Some(fresh) = mapping.get(&out.resource_id) {
                out.resource_id = fresh.clone();
            }
        }
        apply_mapping(&mut shape.child_shapes, mapping);
    }
}
