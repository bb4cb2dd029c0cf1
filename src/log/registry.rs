use anyhow::Result;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Once};

use crate::cfg::TypeOptions;
use crate::log::backend::{Backend, BackendConfig, ErrorReporter, ErrorSink, FormattingBackend};
use crate::log::bridge::Bridge;
use crate::log::error::LogError;
use crate::log::filter::{create_filter_from_options, LoggerFilter};
use crate::log::hierarchy::HierarchyIndex;
use crate::log::level::LogLevel;
use crate::log::logger::Logger;
use crate::log::marker::Marker;
use crate::log::record::RecordPool;

/// 单个 logger 名称的配置，未设置的项保持原状
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerNodeConfig {
    /// 日志级别（大小写不敏感）
    pub level: Option<LogLevel>,

    /// 过滤器
    pub filter: Option<TypeOptions>,

    /// 是否记录调用位置
    pub include_location: Option<bool>,

    /// 是否继续交给父节点的后端
    pub log_to_parent: Option<bool>,

    /// 后端列表，非空时替换节点原有的后端
    pub backends: Vec<BackendConfig>,
}

/// LoggerRegistry 配置
///
/// # 示例
///
/// ```ignore
/// let config = LoggerRegistryConfig::from_json(r#"
///     {
///         root: { level: "info", backends: [{}] },
///         loggers: {
///             "app.db": { level: "debug", include_location: true },
///         },
///     }
/// "#)?;
/// let registry = LoggerRegistry::from_config(&config)?;
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerRegistryConfig {
    /// root 节点配置
    pub root: LoggerNodeConfig,

    /// 按名称配置的节点
    pub loggers: HashMap<String, LoggerNodeConfig>,

    /// 线程缓存记录的消息缓冲区容量上限（进程级），未设置时保持当前值
    pub max_message_capacity: Option<usize>,
}

impl LoggerRegistryConfig {
    /// 从 JSON 字符串解析（支持 JSON5 格式）
    pub fn from_json(json_str: &str) -> Result<Self> {
        Ok(json5::from_str(json_str)?)
    }

    pub fn from_yaml(yaml_str: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml_str)?)
    }

    pub fn from_toml(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }
}

/// 注册所有日志组件（只执行一次）
static REGISTER_ONCE: Once = Once::new();

pub(crate) fn register_components() {
    REGISTER_ONCE.call_once(|| {
        let result = crate::log::filter::register_filters()
            .and_then(|_| crate::log::formatter::register_formatters())
            .and_then(|_| crate::log::appender::register_appenders());
        if let Err(err) = result {
            tracing::error!(error = %err, "failed to register log components");
        }
    });
}

pub(crate) struct RegistryInner {
    hierarchy: HierarchyIndex,
    loggers: DashMap<String, Arc<Logger>>,
    errors: Arc<ErrorReporter>,
}

impl RegistryInner {
    /// 在 tree lock 下对 `name` 的节点执行修改，节点集合变化时刷新所有 logger
    pub(crate) fn with_node(&self, name: &str, f: impl FnOnce(&Bridge)) -> Result<(), LogError> {
        let mut tree = self.hierarchy.lock();
        let node = tree.materialize(name)?;
        f(&node);
        if tree.changed() {
            self.refresh_loggers();
        }
        Ok(())
    }

    pub(crate) fn set_level(&self, name: &str, level: Option<LogLevel>) -> Result<(), LogError> {
        self.with_node(name, |node| node.set_level(level))
    }

    // 调用方必须持有 tree lock
    fn refresh_loggers(&self) {
        for entry in self.loggers.iter() {
            entry.value().set_bridge(self.hierarchy.resolve(entry.key()));
        }
    }
}

/// Logger 注册表
///
/// 按名称缓存 [`Logger`]，持有名称层级。可以廉价克隆，所有克隆共享同一份状态
#[derive(Clone)]
pub struct LoggerRegistry {
    inner: Arc<RegistryInner>,
}

impl Default for LoggerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl LoggerRegistry {
    /// 创建空的 registry：root 未设置级别（不输出任何日志），没有后端
    pub fn new() -> Self {
        Self::with_error_sink(Box::new(crate::log::backend::TracingErrorSink))
    }

    /// 使用指定的错误出口创建 registry
    pub fn with_error_sink(sink: Box<dyn ErrorSink>) -> Self {
        let errors = Arc::new(ErrorReporter::new(sink));
        Self {
            inner: Arc::new(RegistryInner {
                hierarchy: HierarchyIndex::new(Arc::clone(&errors)),
                loggers: DashMap::new(),
                errors,
            }),
        }
    }

    /// 按配置创建 registry
    pub fn from_config(config: &LoggerRegistryConfig) -> Result<Self, LogError> {
        let registry = Self::new();
        registry.apply(config)?;
        Ok(registry)
    }

    /// 应用配置
    ///
    /// 所有组件先构造完成再写入节点，某个名称出错时之前的名称已经生效。
    /// 重复应用同一份配置得到相同的状态
    pub fn apply(&self, config: &LoggerRegistryConfig) -> Result<(), LogError> {
        register_components();
        if let Some(max) = config.max_message_capacity {
            RecordPool::set_max_message_capacity(max);
        }

        self.apply_node("", &config.root)?;
        let mut names: Vec<&String> = config.loggers.keys().collect();
        names.sort();
        for name in names {
            self.apply_node(name, &config.loggers[name])?;
        }
        Ok(())
    }

    fn apply_node(&self, name: &str, config: &LoggerNodeConfig) -> Result<(), LogError> {
        crate::log::error::validate_logger_name(name)?;

        let filter: Option<Arc<dyn LoggerFilter>> = match &config.filter {
            Some(options) => Some(Arc::from(
                create_filter_from_options(options).map_err(LogError::from_component)?,
            )),
            None => None,
        };
        let backends = config
            .backends
            .iter()
            .map(|backend| {
                FormattingBackend::new(backend.clone()).map(|b| Arc::new(b) as Arc<dyn Backend>)
            })
            .collect::<Result<Vec<_>>>()
            .map_err(LogError::from_component)?;

        self.inner.with_node(name, |node| {
            if let Some(level) = config.level {
                node.set_level(Some(level));
            }
            if let Some(filter) = filter {
                node.set_filter(filter);
            }
            if let Some(include_location) = config.include_location {
                node.set_include_location(include_location);
            }
            if let Some(log_to_parent) = config.log_to_parent {
                node.set_log_to_parent(log_to_parent);
            }
            if !backends.is_empty() {
                node.set_backends(backends);
            }
        })
    }

    // ========== Logger ==========

    /// 获取 `name` 的 logger，不存在时创建
    ///
    /// 任何名称都可以获取，获取本身不会创建配置节点
    pub fn get(&self, name: &str) -> Arc<Logger> {
        if let Some(logger) = self.inner.loggers.get(name) {
            return Arc::clone(logger.value());
        }

        // 持有 tree lock，避免与并发的配置修改交错导致 logger 指向过期节点
        let tree = self.inner.hierarchy.lock();
        let logger = self
            .inner
            .loggers
            .entry(name.to_string())
            .or_insert_with(|| {
                Arc::new(Logger::new(
                    name,
                    tree.index().resolve(name),
                    Arc::downgrade(&self.inner),
                ))
            })
            .clone();
        drop(tree);
        logger
    }

    /// 获取 logger 并设置默认 marker；`include_location` 为 true 时为该名称创建节点并开启位置记录
    pub fn get_with(
        &self,
        name: &str,
        marker: Option<Marker>,
        include_location: bool,
    ) -> Result<Arc<Logger>, LogError> {
        if include_location {
            self.set_include_location(name, true)?;
        }
        let logger = self.get(name);
        if marker.is_some() {
            logger.set_marker(marker);
        }
        Ok(logger)
    }

    /// root logger（名称为空字符串）
    pub fn root(&self) -> Arc<Logger> {
        self.get("")
    }

    /// 是否已经获取过 `name` 的 logger（与是否存在配置节点无关）
    pub fn has_logger(&self, name: &str) -> bool {
        self.inner.loggers.contains_key(name)
    }

    /// 已获取过的 logger 名称，按字典序排列
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.loggers.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// 已创建配置节点的名称（不含 root）
    pub fn node_names(&self) -> Vec<String> {
        self.inner.hierarchy.node_names()
    }

    /// 名称层级
    pub fn hierarchy(&self) -> &HierarchyIndex {
        &self.inner.hierarchy
    }

    /// 管辖 `name` 的节点
    pub fn resolve(&self, name: &str) -> Arc<Bridge> {
        self.inner.hierarchy.resolve(name)
    }

    // ========== 配置 ==========

    pub fn set_level(&self, name: &str, level: LogLevel) -> Result<(), LogError> {
        self.inner.set_level(name, Some(level))
    }

    pub fn clear_level(&self, name: &str) -> Result<(), LogError> {
        self.inner.set_level(name, None)
    }

    /// `name` 节点自身的级别，节点不存在或未设置时为 None
    pub fn level(&self, name: &str) -> Option<LogLevel> {
        self.inner.hierarchy.get(name).and_then(|node| node.level())
    }

    pub fn effective_level(&self, name: &str) -> LogLevel {
        self.resolve(name).effective_level()
    }

    pub fn set_filter(&self, name: &str, filter: Arc<dyn LoggerFilter>) -> Result<(), LogError> {
        self.inner.with_node(name, |node| node.set_filter(filter))
    }

    pub fn set_include_location(&self, name: &str, include_location: bool) -> Result<(), LogError> {
        self.inner
            .with_node(name, |node| node.set_include_location(include_location))
    }

    pub fn set_log_to_parent(&self, name: &str, log_to_parent: bool) -> Result<(), LogError> {
        self.inner
            .with_node(name, |node| node.set_log_to_parent(log_to_parent))
    }

    pub fn add_backend(&self, name: &str, backend: Arc<dyn Backend>) -> Result<(), LogError> {
        self.inner.with_node(name, |node| node.add_backend(backend))
    }

    /// 按名称移除 `name` 节点上的后端，返回是否有后端被移除
    pub fn remove_backend(&self, name: &str, backend_name: &str) -> Result<bool, LogError> {
        let mut removed = false;
        self.inner
            .with_node(name, |node| removed = node.remove_backend(backend_name))?;
        Ok(removed)
    }

    pub fn clear_backends(&self, name: &str) -> Result<(), LogError> {
        self.inner.with_node(name, |node| node.set_backends(Vec::new()))
    }

    /// 删除所有节点并恢复 root 的初始配置，已获取的 logger 改为指向 root
    pub fn reset(&self) {
        self.reset_with(|_| {});
    }

    /// 在同一次持锁期间清空节点并重新配置 root
    pub(crate) fn reset_with(&self, configure_root: impl FnOnce(&Bridge)) {
        let mut tree = self.inner.hierarchy.lock();
        tree.reset();
        configure_root(tree.index().root());
        self.inner.refresh_loggers();
    }

    // ========== 错误与刷新 ==========

    pub fn set_error_sink(&self, sink: Box<dyn ErrorSink>) {
        self.inner.errors.set_sink(sink);
    }

    /// 已报告的后端错误次数
    pub fn emit_failures(&self) -> u64 {
        self.inner.errors.failures()
    }

    /// 刷新所有节点的后端
    pub fn flush(&self) {
        self.inner.hierarchy.root().flush();
        for name in self.node_names() {
            if let Some(node) = self.inner.hierarchy.get(&name) {
                node.flush();
            }
        }
    }
}
