use arc_swap::{ArcSwap, ArcSwapOption};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

use crate::log::backend::{panic_to_error, Backend, ErrorReporter};
use crate::log::filter::{AlwaysNeutralFilter, FilterResult, LoggerFilter};
use crate::log::level::LogLevel;
use crate::log::marker::Marker;
use crate::log::record::{LogRecord, Thrown};

// 未设置级别（继承父节点）
const LEVEL_UNSET: u8 = u8::MAX;

/// 配置节点
///
/// 每个显式配置过的 logger 名称对应一个节点，持有级别、过滤器、位置标志、
/// 向父节点传递标志以及后端列表。节点之间的父子关系由 [`HierarchyIndex`](crate::log::HierarchyIndex)
/// 在节点集合变化时重新计算，节点本身只缓存当前父节点。
///
/// 所有字段都可以在日志调用进行中被修改：每个字段单独原子读写，
/// 调用方可能在同一次日志调用中观察到新旧两个配置的混合
pub struct Bridge {
    name: String,
    level: AtomicU8,
    filter: ArcSwap<Arc<dyn LoggerFilter>>,
    include_location: AtomicBool,
    log_to_parent: AtomicBool,
    parent: ArcSwapOption<Bridge>,
    backends: ArcSwap<Vec<Arc<dyn Backend>>>,
    errors: Arc<ErrorReporter>,
}

impl Bridge {
    pub(crate) fn new(name: &str, parent: Option<Arc<Bridge>>, errors: Arc<ErrorReporter>) -> Self {
        Self {
            name: name.to_string(),
            level: AtomicU8::new(LEVEL_UNSET),
            filter: ArcSwap::from_pointee(Arc::new(AlwaysNeutralFilter) as Arc<dyn LoggerFilter>),
            include_location: AtomicBool::new(false),
            log_to_parent: AtomicBool::new(true),
            parent: ArcSwapOption::new(parent),
            backends: ArcSwap::from_pointee(Vec::new()),
            errors,
        }
    }

    /// 节点名称，root 为空字符串
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_root(&self) -> bool {
        self.name.is_empty()
    }

    /// 节点自身的级别，None 表示继承
    pub fn level(&self) -> Option<LogLevel> {
        LogLevel::from_u8(self.level.load(Ordering::Acquire))
    }

    pub(crate) fn set_level(&self, level: Option<LogLevel>) {
        let value = level.map_or(LEVEL_UNSET, LogLevel::as_u8);
        self.level.store(value, Ordering::Release);
    }

    /// 沿父节点链找到的第一个级别，root 也未设置时为 `None`
    pub fn effective_level(&self) -> LogLevel {
        if let Some(level) = self.level() {
            return level;
        }
        let mut next = self.parent();
        while let Some(node) = next {
            if let Some(level) = node.level() {
                return level;
            }
            next = node.parent();
        }
        LogLevel::None
    }

    pub fn filter(&self) -> Arc<dyn LoggerFilter> {
        Arc::clone(&self.filter.load())
    }

    pub(crate) fn set_filter(&self, filter: Arc<dyn LoggerFilter>) {
        self.filter.store(Arc::new(filter));
    }

    /// 节点自身的位置标志
    pub fn include_location(&self) -> bool {
        self.include_location.load(Ordering::Acquire)
    }

    pub(crate) fn set_include_location(&self, include_location: bool) {
        self.include_location.store(include_location, Ordering::Release);
    }

    /// 自身或任一祖先要求记录调用位置
    ///
    /// 需要遍历父节点链，只在级别检查通过后调用
    pub fn should_include_location(&self) -> bool {
        if self.include_location() {
            return true;
        }
        let mut next = self.parent();
        while let Some(node) = next {
            if node.include_location() {
                return true;
            }
            next = node.parent();
        }
        false
    }

    pub fn log_to_parent(&self) -> bool {
        self.log_to_parent.load(Ordering::Acquire)
    }

    pub(crate) fn set_log_to_parent(&self, log_to_parent: bool) {
        self.log_to_parent.store(log_to_parent, Ordering::Release);
    }

    pub fn parent(&self) -> Option<Arc<Bridge>> {
        self.parent.load_full()
    }

    pub(crate) fn set_parent(&self, parent: Option<Arc<Bridge>>) {
        self.parent.store(parent);
    }

    /// 当前后端列表（快照）
    pub fn backends(&self) -> Vec<Arc<dyn Backend>> {
        Vec::clone(&self.backends.load())
    }

    pub(crate) fn add_backend(&self, backend: Arc<dyn Backend>) {
        self.backends.rcu(|backends| {
            let mut next = Vec::clone(backends);
            next.push(Arc::clone(&backend));
            next
        });
    }

    /// 按名称移除后端，返回是否有后端被移除
    pub(crate) fn remove_backend(&self, name: &str) -> bool {
        let previous = self.backends.rcu(|backends| {
            backends
                .iter()
                .filter(|b| b.name() != name)
                .cloned()
                .collect::<Vec<_>>()
        });
        previous.iter().any(|b| b.name() == name)
    }

    pub(crate) fn set_backends(&self, backends: Vec<Arc<dyn Backend>>) {
        self.backends.store(Arc::new(backends));
    }

    /// 判断 `logger_name` 在 `level` 上的日志是否可以输出
    ///
    /// 级别不满足时直接返回 `Deny`，否则交给过滤器，`Neutral` 视为 `Accept`
    pub fn is_loggable(
        &self,
        logger_name: &str,
        level: LogLevel,
        marker: Option<&Marker>,
        thrown: Option<&Thrown>,
    ) -> FilterResult {
        if !self.effective_level().admits(level) {
            return FilterResult::Deny;
        }
        self.filter
            .load()
            .is_loggable(logger_name, level, marker, thrown)
            .accept_if_neutral()
    }

    /// 把记录交给自身的后端，log_to_parent 为 true 时继续交给父节点
    ///
    /// 祖先节点不再做级别检查，后端可以通过 [`Backend::is_loggable`] 自行过滤。
    /// 后端的错误和 panic 都被捕获并报告给 registry 的错误出口
    pub fn emit(&self, record: &LogRecord) {
        self.dispatch(record);
        if !self.log_to_parent() {
            return;
        }
        let mut next = self.parent();
        while let Some(node) = next {
            node.dispatch(record);
            if !node.log_to_parent() {
                break;
            }
            next = node.parent();
        }
    }

    fn dispatch(&self, record: &LogRecord) {
        let backends = self.backends.load();
        for backend in backends.iter() {
            if !backend.is_loggable(record.logger_name(), record.level()) {
                continue;
            }
            let error = match panic::catch_unwind(AssertUnwindSafe(|| backend.accept(record))) {
                Ok(Ok(())) => continue,
                Ok(Err(err)) => err,
                Err(payload) => panic_to_error(payload),
            };
            self.errors.report(&self.name, backend.name(), &error);
        }
    }

    /// 刷新自身的后端
    pub fn flush(&self) {
        for backend in self.backends.load().iter() {
            if let Err(err) = backend.flush() {
                self.errors.report(&self.name, backend.name(), &err);
            }
        }
    }
}

impl fmt::Debug for Bridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bridge")
            .field("name", &self.name)
            .field("level", &self.level())
            .field("include_location", &self.include_location())
            .field("log_to_parent", &self.log_to_parent())
            .field("parent", &self.parent().map(|p| p.name.clone()))
            .field("backends", &self.backends.load().len())
            .finish()
    }
}
