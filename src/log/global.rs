use once_cell::sync::Lazy;
use std::sync::Arc;

use crate::log::appender::{ConsoleAppender, ConsoleAppenderConfig};
use crate::log::backend::FormattingBackend;
use crate::log::bridge::Bridge;
use crate::log::error::LogError;
use crate::log::formatter::{TextFormatter, TextFormatterConfig};
use crate::log::level::LogLevel;
use crate::log::logger::Logger;
use crate::log::registry::{LoggerRegistry, LoggerRegistryConfig};

/// 全局 LoggerRegistry 单例
///
/// 默认 root 级别为 INFO，输出到终端的文本后端
static GLOBAL_REGISTRY: Lazy<LoggerRegistry> = Lazy::new(|| {
    let registry = LoggerRegistry::new();
    registry.reset_with(install_defaults);
    registry
});

fn install_defaults(root: &Bridge) {
    root.set_level(Some(LogLevel::Info));
    root.add_backend(Arc::new(FormattingBackend::from_parts(
        "console",
        Box::new(TextFormatter::new(TextFormatterConfig::default())),
        Box::new(ConsoleAppender::new(ConsoleAppenderConfig::default())),
    )));
}

/// 全局 registry
pub fn registry() -> &'static LoggerRegistry {
    &GLOBAL_REGISTRY
}

/// 从全局 registry 获取 logger
pub fn logger(name: &str) -> Arc<Logger> {
    GLOBAL_REGISTRY.get(name)
}

/// 全局 root logger
pub fn root() -> Arc<Logger> {
    GLOBAL_REGISTRY.root()
}

/// 用配置替换全局 registry 的当前配置
///
/// 先清空所有节点（包括默认的终端后端）再应用配置，已获取的 logger 继续有效。
/// 配置出错时全局 registry 恢复为默认配置
///
/// # 示例
///
/// ```ignore
/// let config = LoggerRegistryConfig::from_yaml(r#"
/// root:
///   level: warn
///   backends:
///     - formatter: { type: JsonFormatter }
/// "#)?;
/// logfacade::log::global::init(&config)?;
/// ```
pub fn init(config: &LoggerRegistryConfig) -> Result<(), LogError> {
    GLOBAL_REGISTRY.reset();
    if let Err(err) = GLOBAL_REGISTRY.apply(config) {
        GLOBAL_REGISTRY.reset_with(install_defaults);
        return Err(err);
    }
    Ok(())
}

/// 恢复全局 registry 的默认配置
pub fn reset() {
    GLOBAL_REGISTRY.reset_with(install_defaults);
}
