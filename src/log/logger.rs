use arc_swap::{ArcSwap, ArcSwapOption};
use std::fmt;
use std::panic::Location;
use std::sync::{Arc, Weak};

use crate::log::backend::Backend;
use crate::log::bridge::Bridge;
use crate::log::error::LogError;
use crate::log::filter::LoggerFilter;
use crate::log::level::LogLevel;
use crate::log::marker::Marker;
use crate::log::record::{LogRecord, MetadataValue, RecordPool, Thrown};
use crate::log::registry::RegistryInner;

/// Logger 门面
///
/// 应用代码持有的按名称缓存的句柄，只缓存自己的 marker 和当前管辖节点。
/// 层级变化时 registry 更新节点引用，已持有的 `Arc<Logger>` 始终有效
pub struct Logger {
    name: String,
    marker: ArcSwapOption<Marker>,
    bridge: ArcSwap<Bridge>,
    registry: Weak<RegistryInner>,
}

impl Logger {
    pub(crate) fn new(name: &str, bridge: Arc<Bridge>, registry: Weak<RegistryInner>) -> Self {
        Self {
            name: name.to_string(),
            marker: ArcSwapOption::empty(),
            bridge: ArcSwap::new(bridge),
            registry,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 附加到每条日志的默认 marker
    pub fn marker(&self) -> Option<Marker> {
        self.marker.load().as_deref().cloned()
    }

    pub fn set_marker(&self, marker: Option<Marker>) {
        self.marker.store(marker.map(Arc::new));
    }

    /// 当前管辖此 logger 的节点
    pub fn bridge(&self) -> Arc<Bridge> {
        self.bridge.load_full()
    }

    pub(crate) fn set_bridge(&self, bridge: Arc<Bridge>) {
        self.bridge.store(bridge);
    }

    fn registry(&self) -> Result<Arc<RegistryInner>, LogError> {
        self.registry.upgrade().ok_or(LogError::RegistryDropped)
    }

    // ========== 配置 ==========

    /// 自身名称的节点上设置的级别；名称未配置过时为 None
    pub fn level(&self) -> Option<LogLevel> {
        let bridge = self.bridge.load();
        if bridge.name() == self.name {
            bridge.level()
        } else {
            None
        }
    }

    pub fn effective_level(&self) -> LogLevel {
        self.bridge.load().effective_level()
    }

    pub fn set_level(&self, level: LogLevel) -> Result<(), LogError> {
        self.registry()?.set_level(&self.name, Some(level))
    }

    /// 清除自身级别，改为继承祖先
    pub fn clear_level(&self) -> Result<(), LogError> {
        self.registry()?.set_level(&self.name, None)
    }

    /// 管辖节点上的过滤器
    pub fn filter(&self) -> Arc<dyn LoggerFilter> {
        self.bridge.load().filter()
    }

    pub fn set_filter(&self, filter: Arc<dyn LoggerFilter>) -> Result<(), LogError> {
        self.registry()?
            .with_node(&self.name, |node| node.set_filter(filter))
    }

    /// 是否记录调用位置（自身或任一祖先开启即为 true）
    pub fn include_location(&self) -> bool {
        self.bridge.load().should_include_location()
    }

    pub fn set_include_location(&self, include_location: bool) -> Result<(), LogError> {
        self.registry()?
            .with_node(&self.name, |node| node.set_include_location(include_location))
    }

    pub fn log_to_parent(&self) -> bool {
        self.bridge.load().log_to_parent()
    }

    pub fn set_log_to_parent(&self, log_to_parent: bool) -> Result<(), LogError> {
        self.registry()?
            .with_node(&self.name, |node| node.set_log_to_parent(log_to_parent))
    }

    pub fn add_backend(&self, backend: Arc<dyn Backend>) -> Result<(), LogError> {
        self.registry()?
            .with_node(&self.name, |node| node.add_backend(backend))
    }

    // ========== 级别检查 ==========

    /// 使用默认 marker 判断 `level` 的日志是否会输出
    #[inline]
    pub fn is_loggable(&self, level: LogLevel) -> bool {
        self.is_loggable_with(level, None, None)
    }

    /// 判断日志是否会输出，`marker` 为 None 时使用默认 marker
    pub fn is_loggable_with(&self, level: LogLevel, marker: Option<&Marker>, thrown: Option<&Thrown>) -> bool {
        let own = self.marker.load();
        let marker = marker.or(own.as_deref());
        self.bridge
            .load()
            .is_loggable(&self.name, level, marker, thrown)
            .should_proceed()
    }

    // ========== 输出 ==========

    #[track_caller]
    fn emit_with(
        &self,
        level: LogLevel,
        marker: Option<&Marker>,
        thrown: Option<Thrown>,
        fill: impl FnOnce(&mut LogRecord),
    ) {
        let bridge = self.bridge.load();
        let own = self.marker.load();
        let marker = marker.or(own.as_deref());
        if !bridge
            .is_loggable(&self.name, level, marker, thrown.as_ref())
            .should_proceed()
        {
            return;
        }

        let mut record = RecordPool::acquire();
        record.prepare(level, &self.name, marker.cloned(), thrown);
        if bridge.should_include_location() {
            record.set_location(Location::caller());
        }
        fill(&mut record);
        bridge.emit(&record);
        record.release();
    }

    #[track_caller]
    pub fn log(&self, level: LogLevel, message: &str) {
        self.emit_with(level, None, None, |record| {
            record.append(message);
        });
    }

    /// 格式化参数只在日志可以输出时才写入记录的缓冲区
    #[track_caller]
    pub fn log_fmt(&self, level: LogLevel, args: fmt::Arguments<'_>) {
        self.emit_with(level, None, None, |record| {
            record.append_fmt(args);
        });
    }

    /// 消息与参数分开保存，由 formatter 决定如何输出参数
    #[track_caller]
    pub fn log_params<I>(&self, level: LogLevel, message: &str, parameters: I)
    where
        I: IntoIterator,
        I::Item: Into<MetadataValue>,
    {
        self.emit_with(level, None, None, |record| {
            record.append(message).set_parameters(parameters);
        });
    }

    #[track_caller]
    pub fn log_marker(&self, level: LogLevel, marker: &Marker, message: &str) {
        self.emit_with(level, Some(marker), None, |record| {
            record.append(message);
        });
    }

    #[track_caller]
    pub fn log_thrown(&self, level: LogLevel, thrown: Thrown, message: &str) {
        self.emit_with(level, None, Some(thrown), |record| {
            record.append(message);
        });
    }

    /// 直接填充池化记录，闭包只在日志可以输出时调用
    #[track_caller]
    pub fn log_with(
        &self,
        level: LogLevel,
        marker: Option<&Marker>,
        thrown: Option<Thrown>,
        fill: impl FnOnce(&mut LogRecord),
    ) {
        self.emit_with(level, marker, thrown, fill);
    }

    #[track_caller]
    pub fn trace(&self, message: &str) {
        self.log(LogLevel::Trace, message);
    }

    #[track_caller]
    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    #[track_caller]
    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    #[track_caller]
    pub fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, message);
    }

    #[track_caller]
    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }

    #[track_caller]
    pub fn critical(&self, message: &str) {
        self.log(LogLevel::Critical, message);
    }

    /// 记录一个已被捕获处理的错误
    #[track_caller]
    pub fn caught(&self, level: LogLevel, thrown: Thrown) {
        self.log_thrown(level, thrown, "Caught");
    }

    /// 记录即将返回给调用方的错误，并原样返回它
    #[track_caller]
    pub fn throwing(&self, level: LogLevel, thrown: Thrown) -> Thrown {
        self.log_thrown(level, Arc::clone(&thrown), "Throwing");
        thrown
    }

    /// 刷新管辖节点的后端
    pub fn flush(&self) {
        self.bridge.load().flush();
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name)
            .field("marker", &self.marker())
            .field("bridge", &self.bridge.load().name())
            .finish()
    }
}
