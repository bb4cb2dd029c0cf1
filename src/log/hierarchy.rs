use dashmap::DashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::log::backend::ErrorReporter;
use crate::log::bridge::Bridge;
use crate::log::error::{validate_logger_name, LogError};

/// 父名称
///
/// root（空名称）没有父名称；不含 `.` 的名称的父节点就是 root
pub fn parent_name(name: &str) -> Option<&str> {
    if name.is_empty() {
        return None;
    }
    Some(name.rfind('.').map_or("", |idx| &name[..idx]))
}

/// 名称到配置节点的索引
///
/// 节点只在第一次写配置时创建；读取（解析日志名称）从不创建节点。
/// 所有结构性修改都在 tree lock 下进行，日志调用的读路径不加锁。
/// 对外只读，修改通过 [`LoggerRegistry`](crate::log::LoggerRegistry) 进行
pub struct HierarchyIndex {
    root: Arc<Bridge>,
    nodes: DashMap<String, Arc<Bridge>>,
    tree_lock: Mutex<()>,
    errors: Arc<ErrorReporter>,
}

impl HierarchyIndex {
    pub(crate) fn new(errors: Arc<ErrorReporter>) -> Self {
        Self {
            root: Arc::new(Bridge::new("", None, Arc::clone(&errors))),
            nodes: DashMap::new(),
            tree_lock: Mutex::new(()),
            errors,
        }
    }

    pub fn root(&self) -> &Arc<Bridge> {
        &self.root
    }

    /// 返回管辖 `name` 的节点：名称本身或最近的已配置祖先，都没有时为 root
    pub fn resolve(&self, name: &str) -> Arc<Bridge> {
        let mut current = Some(name);
        while let Some(candidate) = current {
            if candidate.is_empty() {
                break;
            }
            if let Some(node) = self.nodes.get(candidate) {
                return Arc::clone(node.value());
            }
            current = parent_name(candidate);
        }
        Arc::clone(&self.root)
    }

    /// 精确查找节点，不做祖先解析
    pub fn get(&self, name: &str) -> Option<Arc<Bridge>> {
        if name.is_empty() {
            return Some(Arc::clone(&self.root));
        }
        self.nodes.get(name).map(|node| Arc::clone(node.value()))
    }

    /// 名称是否已有节点（root 总是存在）
    pub fn contains(&self, name: &str) -> bool {
        name.is_empty() || self.nodes.contains_key(name)
    }

    /// 已创建节点的名称（不含 root），按字典序排列
    pub fn node_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.nodes.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// 获取 tree lock
    pub(crate) fn lock(&self) -> TreeGuard<'_> {
        TreeGuard {
            index: self,
            _guard: self.tree_lock.lock().unwrap_or_else(PoisonError::into_inner),
            changed: false,
        }
    }

    /// 返回 `name` 的节点，不存在时创建
    ///
    /// 只在 registry 内部使用：插入节点后必须刷新已获取的 logger
    pub(crate) fn materialize(&self, name: &str) -> Result<Arc<Bridge>, LogError> {
        self.lock().materialize(name)
    }

    // 重新计算每个节点的父节点
    fn relink(&self) {
        let nodes: Vec<(String, Arc<Bridge>)> = self
            .nodes
            .iter()
            .map(|e| (e.key().clone(), Arc::clone(e.value())))
            .collect();
        for (name, node) in &nodes {
            let parent = self.resolve(parent_name(name).unwrap_or(""));
            node.set_parent(Some(parent));
        }
        tracing::debug!(nodes = nodes.len(), "relinked logger hierarchy");
    }
}

/// 持有 tree lock 期间可进行的结构性修改
pub(crate) struct TreeGuard<'a> {
    index: &'a HierarchyIndex,
    _guard: MutexGuard<'a, ()>,
    changed: bool,
}

impl TreeGuard<'_> {
    /// 返回 `name` 的节点，不存在时创建并重新计算所有节点的父节点
    ///
    /// 名称格式错误时返回 [`LogError::InvalidLoggerName`]
    pub(crate) fn materialize(&mut self, name: &str) -> Result<Arc<Bridge>, LogError> {
        validate_logger_name(name)?;
        if let Some(node) = self.index.get(name) {
            return Ok(node);
        }

        let parent = self.index.resolve(parent_name(name).unwrap_or(""));
        tracing::debug!(name, parent = parent.name(), "materialized logger node");
        let node = Arc::new(Bridge::new(name, Some(parent), Arc::clone(&self.index.errors)));
        self.index.nodes.insert(name.to_string(), Arc::clone(&node));
        self.index.relink();
        self.changed = true;
        Ok(node)
    }

    /// 删除所有节点，并把 root 恢复为初始配置
    pub(crate) fn reset(&mut self) {
        self.index.nodes.clear();
        let root = &self.index.root;
        root.set_level(None);
        root.set_filter(Arc::new(crate::log::filter::AlwaysNeutralFilter));
        root.set_include_location(false);
        root.set_log_to_parent(true);
        root.set_backends(Vec::new());
        tracing::debug!("reset logger hierarchy");
        self.changed = true;
    }

    /// 本次持锁期间节点集合是否发生了变化
    pub(crate) fn changed(&self) -> bool {
        self.changed
    }

    pub(crate) fn index(&self) -> &HierarchyIndex {
        self.index
    }
}
